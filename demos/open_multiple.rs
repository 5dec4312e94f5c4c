use portal_file_dialog::{DialogOptions, FilterSpec, Outcome};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(err) = portal_file_dialog::init() {
        eprintln!("could not reach the session bus: {err}");
        std::process::exit(1);
    }

    let options = DialogOptions {
        filters: FilterSpec::Windows {
            packed: "Images\0*.png;*.jpg\0Everything\0*\0\0",
            index: 1,
        },
        ..DialogOptions::default()
    };

    match portal_file_dialog::open_dialog_multiple_set(&options) {
        Outcome::Ok(set) => {
            println!("{} file(s) selected", set.count());
            for path in &set {
                match path {
                    Ok(path) => println!("  {}", path.display()),
                    Err(err) => eprintln!("  undecodable entry: {err}"),
                }
            }
        }
        Outcome::Cancel => println!("dismissed"),
        Outcome::Error(err) => {
            eprintln!("dialog failed: {err}");
            if let Some(message) = portal_file_dialog::last_error() {
                eprintln!("last error: {message}");
            }
        }
    }

    portal_file_dialog::quit();
}

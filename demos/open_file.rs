use portal_file_dialog::{DialogOptions, FileManagerMode, FilterItem, FilterSpec, Outcome};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(err) = portal_file_dialog::init() {
        eprintln!("could not reach the session bus: {err}");
        std::process::exit(1);
    }

    let filters = [
        FilterItem {
            name: "Rust sources",
            spec: "rs",
        },
        FilterItem {
            name: "Manifests",
            spec: "toml,lock",
        },
    ];
    let options = DialogOptions {
        filters: FilterSpec::Native(&filters),
        ..DialogOptions::default()
    };

    match portal_file_dialog::open_dialog(&options) {
        Outcome::Ok(path) => {
            println!("picked {}", path.display());
            if let Err(err) =
                portal_file_dialog::show_in_file_manager(&path, FileManagerMode::Item, false)
            {
                eprintln!("could not reveal it: {err}");
            }
        }
        Outcome::Cancel => println!("dismissed"),
        Outcome::Error(err) => eprintln!("dialog failed: {err}"),
    }

    portal_file_dialog::quit();
}

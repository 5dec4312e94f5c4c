use std::path::Path;

use portal_file_dialog::{DialogOptions, FilterItem, FilterSpec, Outcome};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    if let Err(err) = portal_file_dialog::init() {
        eprintln!("could not reach the session bus: {err}");
        std::process::exit(1);
    }

    let filters = [FilterItem {
        name: "Text",
        spec: "txt,md",
    }];
    let options = DialogOptions {
        title: Some("Save the notes"),
        default_path: Some(Path::new("/tmp")),
        default_name: Some("notes.txt"),
        filters: FilterSpec::Native(&filters),
        append_missing_extension: true,
        ..DialogOptions::default()
    };

    // Poll-style flavor: the dialog runs on a worker while we idle here.
    let handle = match portal_file_dialog::save_dialog_async(&options) {
        Ok(handle) => handle,
        Err(err) => {
            eprintln!("dialog failed to start: {err}");
            std::process::exit(1);
        }
    };
    while !handle.has_completed() {
        std::thread::sleep(std::time::Duration::from_millis(50));
    }

    match handle.take_result() {
        Outcome::Ok(Some(buffer)) => {
            for path in buffer.paths() {
                println!("saving to {}", path.display());
            }
        }
        Outcome::Ok(None) => unreachable!("result was already taken"),
        Outcome::Cancel => println!("dismissed"),
        Outcome::Error(err) => eprintln!("dialog failed: {err}"),
    }

    portal_file_dialog::quit();
}

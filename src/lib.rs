//! Native file dialogs for Linux desktops, spoken through the XDG Desktop
//! Portal over D-Bus.
//!
//! The portal renders the dialogs; this crate builds the
//! `org.freedesktop.portal.FileChooser` requests, drives the
//! request/response signal protocol, and decodes the returned `file://`
//! URIs into plain paths. Call [`init`] once to attach to the session bus,
//! then open dialogs from any thread — one at a time per process.
//!
//! ```no_run
//! use portal_file_dialog::{DialogOptions, FilterItem, FilterSpec, Outcome};
//!
//! portal_file_dialog::init()?;
//! let filters = [FilterItem { name: "Source", spec: "c,cpp" }];
//! let options = DialogOptions {
//!     filters: FilterSpec::Native(&filters),
//!     ..DialogOptions::default()
//! };
//! match portal_file_dialog::open_dialog(&options) {
//!     Outcome::Ok(path) => println!("picked {}", path.display()),
//!     Outcome::Cancel => println!("dismissed"),
//!     Outcome::Error(err) => eprintln!("{err}"),
//! }
//! portal_file_dialog::quit();
//! # Ok::<(), portal_file_dialog::Error>(())
//! ```

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use zbus::names::OwnedUniqueName;

mod dialog;
mod error;
mod file_chooser;
mod file_manager;
mod filter;
mod monitor;
mod path_set;
mod request;
mod response;
mod uri;

pub use error::Error;
pub use file_chooser::DialogOptions;
pub use file_manager::FileManagerMode;
pub use filter::{FilterItem, FilterSpec};
pub use monitor::DialogHandle;
pub use path_set::{PathSet, PathSetIter};
pub use response::PathBuffer;

use response::PortalResponse;

pub(crate) static PORTAL_BUS_NAME: &str = "org.freedesktop.portal.Desktop";
pub(crate) static PORTAL_PATH: &str = "/org/freedesktop/portal/desktop";
pub(crate) static FILE_CHOOSER_INTERFACE: &str = "org.freedesktop.portal.FileChooser";
pub(crate) static REQUEST_INTERFACE: &str = "org.freedesktop.portal.Request";
pub(crate) static RESPONSE_MEMBER: &str = "Response";

/// The process-wide portal attachment built by [`init`].
#[derive(Clone)]
pub(crate) struct Portal {
    pub(crate) conn: zbus::blocking::Connection,
    pub(crate) unique_name: OwnedUniqueName,
}

static PORTAL: Mutex<Option<Portal>> = Mutex::new(None);
static LAST_ERROR: Mutex<Option<String>> = Mutex::new(None);

// Tests asserting on the process-wide error slot take this to keep out of
// each other's way.
#[cfg(test)]
pub(crate) static ERROR_SLOT_LOCK: Mutex<()> = Mutex::new(());

/// How a dialog call ended. The user dismissing the dialog is its own
/// terminal state, never folded into [`Outcome::Error`].
#[derive(Debug)]
#[must_use]
pub enum Outcome<T> {
    /// The user confirmed a selection.
    Ok(T),
    /// The user dismissed the dialog.
    Cancel,
    /// Something else went wrong; the message is also kept for
    /// [`last_error`].
    Error(Error),
}

impl<T> Outcome<T> {
    /// The selection, if there was one.
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Ok(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_cancel(&self) -> bool {
        matches!(self, Self::Cancel)
    }
}

/// Connect to the user's session bus and remember the connection for all
/// following calls. Must be called before any dialog is opened.
pub fn init() -> Result<(), Error> {
    let connect = || -> Result<Portal, Error> {
        let conn = zbus::blocking::Connection::session()?;
        let unique_name = conn
            .unique_name()
            .cloned()
            .ok_or(Error::Protocol("session bus did not assign a unique name"))?;
        Ok(Portal { conn, unique_name })
    };
    match connect() {
        Ok(portal) => {
            log::debug!("connected to the session bus as {}", portal.unique_name);
            *PORTAL.lock().unwrap() = Some(portal);
            Ok(())
        }
        Err(err) => {
            record_error(&err);
            Err(err)
        }
    }
}

/// Drop the bus connection. Further dialog calls fail until [`init`] runs
/// again; async dialogs still in flight keep their own reference and finish
/// undisturbed.
pub fn quit() {
    PORTAL.lock().unwrap().take();
}

/// The message of the most recent error, if any call failed since the last
/// [`clear_error`]. Cancelled dialogs leave this untouched.
pub fn last_error() -> Option<String> {
    LAST_ERROR.lock().unwrap().clone()
}

/// Forget the stored error message.
pub fn clear_error() {
    LAST_ERROR.lock().unwrap().take();
}

pub(crate) fn record_error(err: &Error) {
    *LAST_ERROR.lock().unwrap() = Some(err.to_string());
}

pub(crate) fn fail<T>(err: Error) -> Outcome<T> {
    record_error(&err);
    Outcome::Error(err)
}

fn portal() -> Result<Portal, Error> {
    PORTAL.lock().unwrap().clone().ok_or(Error::NotInitialized)
}

fn complete<T>(result: Result<PortalResponse<T>, Error>) -> Outcome<T> {
    match result {
        Ok(PortalResponse::Success(value)) => Outcome::Ok(value),
        Ok(PortalResponse::Cancelled) => Outcome::Cancel,
        Err(err) => fail(err),
    }
}

fn run<T>(f: impl FnOnce(&Portal) -> Result<PortalResponse<T>, Error>) -> Outcome<T> {
    match portal() {
        Ok(portal) => complete(f(&portal)),
        Err(err) => fail(err),
    }
}

/// Ask the user to pick one existing file. Blocks until the dialog closes.
pub fn open_dialog(options: &DialogOptions<'_>) -> Outcome<PathBuf> {
    run(|portal| {
        let msg = dialog::show_open_file(portal, options, false, false)?.wait_for_response()?;
        response::single_path(&msg)
    })
}

/// Ask the user to pick any number of existing files, packed into a
/// [`PathBuffer`]. Blocks until the dialog closes.
pub fn open_dialog_multiple(options: &DialogOptions<'_>) -> Outcome<PathBuffer> {
    run(|portal| {
        let msg = dialog::show_open_file(portal, options, true, false)?.wait_for_response()?;
        response::packed_multi(&msg)
    })
}

/// Like [`open_dialog_multiple`], but hand back the selection as a lazily
/// decoded [`PathSet`] instead of one packed buffer.
pub fn open_dialog_multiple_set(options: &DialogOptions<'_>) -> Outcome<PathSet> {
    run(|portal| {
        let msg = dialog::show_open_file(portal, options, true, false)?.wait_for_response()?;
        Ok(response::validated_selection(&msg)?.map(|()| PathSet::new(msg)))
    })
}

/// Ask the user for a destination to save to. Blocks until the dialog
/// closes.
pub fn save_dialog(options: &DialogOptions<'_>) -> Outcome<PathBuf> {
    run(|portal| {
        let msg = dialog::show_save_file(portal, options)?.wait_for_response()?;
        if options.append_missing_extension {
            response::single_path_appending_extension(&msg)
        } else {
            response::single_path(&msg)
        }
    })
}

/// Ask the user to pick a folder. Blocks until the dialog closes.
pub fn pick_folder(options: &DialogOptions<'_>) -> Outcome<PathBuf> {
    run(|portal| {
        let msg = dialog::show_open_file(portal, options, false, true)?.wait_for_response()?;
        response::single_path(&msg)
    })
}

#[derive(Clone, Copy)]
enum DecodeMode {
    Single,
    SingleAppendExtension,
    Multi,
}

fn async_dialog(
    show: impl FnOnce(&Portal) -> Result<request::ResponseListener, Error>,
    mode: DecodeMode,
) -> Result<DialogHandle, Error> {
    let start = || -> Result<DialogHandle, Error> {
        let portal = portal()?;
        // Subscribe, call, and rebind on the caller's thread so immediate
        // failures surface here; only the pump runs on the worker.
        let listener = show(&portal)?;
        DialogHandle::spawn(move || {
            let msg = listener.wait_for_response()?;
            match mode {
                DecodeMode::Single => response::packed_single(&msg, false),
                DecodeMode::SingleAppendExtension => response::packed_single(&msg, true),
                DecodeMode::Multi => response::packed_multi(&msg),
            }
        })
    };
    start().inspect_err(|err| record_error(err))
}

/// Start [`open_dialog`] on a background worker and return immediately.
pub fn open_dialog_async(options: &DialogOptions<'_>) -> Result<DialogHandle, Error> {
    async_dialog(
        |portal| dialog::show_open_file(portal, options, false, false),
        DecodeMode::Single,
    )
}

/// Start [`open_dialog_multiple`] on a background worker.
pub fn open_dialog_multiple_async(options: &DialogOptions<'_>) -> Result<DialogHandle, Error> {
    async_dialog(
        |portal| dialog::show_open_file(portal, options, true, false),
        DecodeMode::Multi,
    )
}

/// Start [`save_dialog`] on a background worker.
pub fn save_dialog_async(options: &DialogOptions<'_>) -> Result<DialogHandle, Error> {
    let mode = if options.append_missing_extension {
        DecodeMode::SingleAppendExtension
    } else {
        DecodeMode::Single
    };
    async_dialog(|portal| dialog::show_save_file(portal, options), mode)
}

/// Start [`pick_folder`] on a background worker.
pub fn pick_folder_async(options: &DialogOptions<'_>) -> Result<DialogHandle, Error> {
    async_dialog(
        |portal| dialog::show_open_file(portal, options, false, true),
        DecodeMode::Single,
    )
}

/// Reveal `path` in the desktop's file manager.
///
/// With `resolve_real_path`, symlinks and relative components are resolved
/// before the path is handed over.
pub fn show_in_file_manager(
    path: &Path,
    mode: FileManagerMode,
    resolve_real_path: bool,
) -> Result<(), Error> {
    let show = || -> Result<(), Error> {
        let portal = portal()?;
        file_manager::show(&portal, path, mode, resolve_real_path)
    };
    show().inspect_err(|err| record_error(err))
}

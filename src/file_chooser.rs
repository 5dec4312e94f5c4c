//! Request records and the option dictionaries sent to the file chooser.

use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use zbus::zvariant;

use crate::filter::{self, EncodedFilters, Filter, FilterSpec, Filters};

static OPEN_FILE_TITLE: &str = "Open File";
static OPEN_FILES_TITLE: &str = "Open Files";
static SAVE_FILE_TITLE: &str = "Save File";
static SELECT_FOLDER_TITLE: &str = "Select Folder";

/// Everything a dialog request can carry. A default-constructed value asks
/// for a plain untitled dialog with no filters.
///
/// Requests are read once when the dialog is submitted; changing the record
/// afterwards has no effect on a dialog already on screen.
#[derive(Debug, Default, Clone, Copy)]
pub struct DialogOptions<'a> {
    /// Dialog title; a mode-appropriate default is used when absent.
    pub title: Option<&'a str>,
    /// X11 window id of the parent, passed to the portal as `x11:<hex>`.
    pub parent_window: Option<u64>,
    /// Folder the dialog should start in. Only save dialogs honor this;
    /// the portal offers no starting folder for open dialogs.
    pub default_path: Option<&'a Path>,
    /// Pre-filled file name for save dialogs.
    pub default_name: Option<&'a str>,
    /// File filters in either supported shape.
    pub filters: FilterSpec<'a>,
    /// For save dialogs: when the chosen name lacks an extension and the
    /// dialog's active filter implies one, append it to the returned path.
    pub append_missing_extension: bool,
}

#[derive(zvariant::SerializeDict, zvariant::Type, Debug)]
#[zvariant(signature = "a{sv}")]
pub(crate) struct OpenFileOptions {
    handle_token: String,
    multiple: Option<bool>,
    directory: Option<bool>,
    filters: Option<Filters>,
    current_filter: Option<Filter>,
}

#[derive(zvariant::SerializeDict, zvariant::Type, Debug)]
#[zvariant(signature = "a{sv}")]
pub(crate) struct SaveFileOptions {
    handle_token: String,
    filters: Option<Filters>,
    current_filter: Option<Filter>,
    current_name: Option<String>,
    current_folder: Option<Vec<u8>>,
    current_file: Option<Vec<u8>>,
}

pub(crate) fn open_options(
    handle_token: String,
    options: &DialogOptions<'_>,
    multiple: bool,
    directory: bool,
) -> OpenFileOptions {
    // Folder picks take no filters; everything would match anyway.
    let encoded = if directory {
        None
    } else {
        filter::for_open(&options.filters)
    };
    let (filters, current_filter) = split_encoded(encoded);
    OpenFileOptions {
        handle_token,
        multiple: multiple.then_some(true),
        directory: directory.then_some(true),
        filters,
        current_filter,
    }
}

pub(crate) fn save_options(handle_token: String, options: &DialogOptions<'_>) -> SaveFileOptions {
    let (filters, current_filter) =
        split_encoded(filter::for_save(&options.filters, options.default_name));
    SaveFileOptions {
        handle_token,
        filters,
        current_filter,
        current_name: options.default_name.map(str::to_owned),
        current_folder: options.default_path.map(nul_terminated),
        current_file: existing_default_file(options.default_path, options.default_name),
    }
}

fn split_encoded(encoded: Option<EncodedFilters>) -> (Option<Filters>, Option<Filter>) {
    match encoded {
        Some(encoded) => (Some(encoded.filters), Some(encoded.current)),
        None => (None, None),
    }
}

/// The portal wants folder and file paths as byte arrays that include the
/// terminating NUL.
fn nul_terminated(path: &Path) -> Vec<u8> {
    let mut bytes = path.as_os_str().as_bytes().to_vec();
    bytes.push(0);
    bytes
}

/// `current_file` is only sent when the joined default location names a file
/// that exists right now; the portal rejects dangling ones.
fn existing_default_file(path: Option<&Path>, name: Option<&str>) -> Option<Vec<u8>> {
    let (path, name) = path.zip(name)?;
    let joined = path.join(name);
    joined.exists().then(|| nul_terminated(&joined))
}

pub(crate) fn open_title<'a>(
    options: &DialogOptions<'a>,
    multiple: bool,
    directory: bool,
) -> &'a str {
    options.title.unwrap_or(match (multiple, directory) {
        (false, false) => OPEN_FILE_TITLE,
        (true, false) => OPEN_FILES_TITLE,
        (_, true) => SELECT_FOLDER_TITLE,
    })
}

pub(crate) fn save_title<'a>(options: &DialogOptions<'a>) -> &'a str {
    options.title.unwrap_or(SAVE_FILE_TITLE)
}

pub(crate) fn parent_window(options: &DialogOptions<'_>) -> String {
    options
        .parent_window
        .map(|id| format!("x11:{id:08x}"))
        .unwrap_or_default()
}

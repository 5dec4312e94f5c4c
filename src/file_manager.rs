//! Revealing paths in the desktop's file manager.

use std::path::Path;

use crate::Portal;
use crate::error::Error;
use crate::uri;

/// How a path should be shown in the file manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileManagerMode {
    /// Open the folder itself.
    Folder,
    /// Open the containing folder with the item selected.
    Item,
}

#[zbus::proxy(
    interface = "org.freedesktop.FileManager1",
    default_service = "org.freedesktop.FileManager1",
    default_path = "/org/freedesktop/FileManager1",
    gen_async = false,
    blocking_name = "FileManager1ProxyBlocking"
)]
trait FileManager1 {
    fn show_folders(&self, uris: &[&str], startup_id: &str) -> zbus::Result<()>;

    fn show_items(&self, uris: &[&str], startup_id: &str) -> zbus::Result<()>;
}

pub(crate) fn show(
    portal: &Portal,
    path: &Path,
    mode: FileManagerMode,
    resolve_real_path: bool,
) -> Result<(), Error> {
    let resolved;
    let path = if resolve_real_path {
        resolved = std::fs::canonicalize(path)
            .map_err(|err| Error::Argument(format!("cannot resolve {}: {err}", path.display())))?;
        resolved.as_path()
    } else {
        path
    };
    let Some(path) = path.to_str() else {
        return Err(Error::Argument(format!(
            "path {} is not valid UTF-8",
            path.display()
        )));
    };
    let target = uri::to_file_uri(path);
    log::debug!("revealing {target} in the file manager");

    let proxy = FileManager1ProxyBlocking::new(&portal.conn)?;
    match mode {
        FileManagerMode::Folder => proxy.show_folders(&[target.as_str()], "")?,
        FileManagerMode::Item => proxy.show_items(&[target.as_str()], "")?,
    }
    Ok(())
}

//! The synchronous dialog driver.
//!
//! One request runs through: generate a handle, subscribe to its `Response`
//! signal, call the file chooser method, re-subscribe if the portal
//! allocated a different request path, then pump the subscription until the
//! signal arrives.

use zbus::zvariant::{self, OwnedObjectPath};

use crate::error::Error;
use crate::file_chooser::{self, DialogOptions};
use crate::request::{self, RequestHandle, ResponseListener};
use crate::{FILE_CHOOSER_INTERFACE, PORTAL_BUS_NAME, PORTAL_PATH, Portal};

static METHOD_OPEN_FILE: &str = "OpenFile";
static METHOD_SAVE_FILE: &str = "SaveFile";

/// Run stages one to four of an open or folder dialog: after this returns,
/// the dialog is on screen and the listener only needs pumping.
pub(crate) fn show_open_file(
    portal: &Portal,
    options: &DialogOptions<'_>,
    multiple: bool,
    directory: bool,
) -> Result<ResponseListener, Error> {
    let handle = request::request_handle(&portal.unique_name)?;
    let query = file_chooser::open_options(handle.token.clone(), options, multiple, directory);
    let title = file_chooser::open_title(options, multiple, directory);
    submit(portal, METHOD_OPEN_FILE, options, title, &handle, query)
}

/// Same as [`show_open_file`], for the save flavor.
pub(crate) fn show_save_file(
    portal: &Portal,
    options: &DialogOptions<'_>,
) -> Result<ResponseListener, Error> {
    let handle = request::request_handle(&portal.unique_name)?;
    let query = file_chooser::save_options(handle.token.clone(), options);
    let title = file_chooser::save_title(options);
    submit(portal, METHOD_SAVE_FILE, options, title, &handle, query)
}

fn submit<O>(
    portal: &Portal,
    method: &str,
    options: &DialogOptions<'_>,
    title: &str,
    handle: &RequestHandle,
    query: O,
) -> Result<ResponseListener, Error>
where
    O: serde::Serialize + zvariant::Type,
{
    let mut listener =
        ResponseListener::subscribe(&portal.conn, &portal.unique_name, &handle.path)?;
    log::debug!("calling {method} with request handle {}", handle.path);

    let parent = file_chooser::parent_window(options);
    let reply = portal.conn.call_method(
        Some(PORTAL_BUS_NAME),
        PORTAL_PATH,
        Some(FILE_CHOOSER_INTERFACE),
        method,
        &(parent.as_str(), title, query),
    )?;
    let returned: OwnedObjectPath = reply
        .body()
        .deserialize()
        .map_err(|_| Error::Protocol("method reply does not carry a request object path"))?;

    if returned.as_str() != handle.path.as_str() {
        // Portals from before the predictable-handle era answer with their
        // own request path; the response will be emitted there.
        log::debug!("portal allocated request path {returned}, resubscribing");
        listener.rebind(&returned)?;
    }
    Ok(listener)
}

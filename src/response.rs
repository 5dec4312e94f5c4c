//! Decoding of the portal's `Response` signal into caller-visible paths.
//!
//! The signal body is `(u, a{sv})`: a response code and a results
//! dictionary. Code 0 carries a `uris` array of `file://` strings and,
//! depending on the dialog, a `current_filter`; code 1 is the user pressing
//! Cancel; anything else means the dialog was torn down on us.

use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::{OsStrExt, OsStringExt};
use std::path::{Path, PathBuf};

use zbus::message::{Body, Message};
use zbus::zvariant::Value;

use crate::error::Error;
use crate::uri;

pub(crate) const PORTAL_RESPONSE_SUCCESS: u32 = 0;
pub(crate) const PORTAL_RESPONSE_CANCELLED: u32 = 1;

/// What a finished dialog produced. Mirrors the two non-error response
/// codes; an abnormal code becomes [`Error::PortalAbort`] instead.
pub(crate) enum PortalResponse<T> {
    Success(T),
    Cancelled,
}

impl<T> PortalResponse<T> {
    pub(crate) fn map<U>(self, f: impl FnOnce(T) -> U) -> PortalResponse<U> {
        match self {
            Self::Success(value) => PortalResponse::Success(f(value)),
            Self::Cancelled => PortalResponse::Cancelled,
        }
    }
}

type ResultsDict<'d> = HashMap<&'d str, Value<'d>>;

fn read_results<'d>(body: &'d Body) -> Result<PortalResponse<ResultsDict<'d>>, Error> {
    let (code, results): (u32, ResultsDict<'_>) = body
        .deserialize()
        .map_err(|_| Error::Protocol("response signal body does not match (ua{sv})"))?;
    match code {
        PORTAL_RESPONSE_SUCCESS => Ok(PortalResponse::Success(results)),
        PORTAL_RESPONSE_CANCELLED => Ok(PortalResponse::Cancelled),
        _ => Err(Error::PortalAbort),
    }
}

/// Unknown result keys are skipped; `uris` must be present and hold strings.
fn read_uris<'a, 'd>(results: &'a ResultsDict<'d>) -> Result<Vec<&'a str>, Error> {
    let Some(value) = results.get("uris") else {
        return Err(Error::Protocol("response signal has no URI field"));
    };
    let Value::Array(uris) = value else {
        return Err(Error::Protocol("response signal URI entry is not an array"));
    };
    uris.iter()
        .map(|element| match element {
            Value::Str(s) => Ok(s.as_str()),
            _ => Err(Error::Protocol("response signal URI element is not a string")),
        })
        .collect()
}

fn first_uri<'a>(uris: &[&'a str]) -> Result<&'a str, Error> {
    uris.first()
        .copied()
        .ok_or(Error::Protocol("response signal URI array is empty"))
}

/// Best effort: the extension implied by the selected filter, already
/// stripped of its `*.` prefix. Any shape mismatch yields `None`.
fn current_filter_extension<'a>(results: &'a ResultsDict<'_>) -> Option<&'a str> {
    let Value::Structure(filter) = results.get("current_filter")? else {
        return None;
    };
    let [_, Value::Array(patterns)] = filter.fields() else {
        return None;
    };
    let Value::Structure(first) = patterns.iter().next()? else {
        return None;
    };
    let [Value::U32(kind), Value::Str(glob)] = first.fields() else {
        return None;
    };
    if *kind != 0 {
        return None;
    }
    glob.strip_prefix("*.")
}

fn decoded_path(uri: &str) -> Result<PathBuf, Error> {
    Ok(PathBuf::from(OsString::from_vec(uri::decode_file_uri(uri)?)))
}

/// Decode the lone selected path of a single-selection dialog.
pub(crate) fn single_path(msg: &Message) -> Result<PortalResponse<PathBuf>, Error> {
    let body = msg.body();
    let results = match read_results(&body)? {
        PortalResponse::Success(results) => results,
        PortalResponse::Cancelled => return Ok(PortalResponse::Cancelled),
    };
    let uris = read_uris(&results)?;
    decoded_path(first_uri(&uris)?).map(PortalResponse::Success)
}

/// Like [`single_path`], but when the chosen name has no extension and the
/// selected filter implies one, the extension is appended.
pub(crate) fn single_path_appending_extension(
    msg: &Message,
) -> Result<PortalResponse<PathBuf>, Error> {
    let body = msg.body();
    let results = match read_results(&body)? {
        PortalResponse::Success(results) => results,
        PortalResponse::Cancelled => return Ok(PortalResponse::Cancelled),
    };
    let uris = read_uris(&results)?;
    let mut decoded = uri::decode_file_uri(first_uri(&uris)?)?;
    if let Some(extn) = current_filter_extension(&results)
        && !has_extension(&decoded)
    {
        decoded.push(b'.');
        decoded.extend_from_slice(extn.as_bytes());
    }
    Ok(PortalResponse::Success(PathBuf::from(OsString::from_vec(
        decoded,
    ))))
}

/// Scan backwards from the file name; a `.` before any `/` means the name
/// already has an extension.
fn has_extension(path: &[u8]) -> bool {
    for &byte in path.iter().rev() {
        match byte {
            b'/' => return false,
            b'.' => return true,
            _ => {}
        }
    }
    false
}

/// A flat buffer of NUL-separated path records, the form dialog results are
/// handed to the application in.
///
/// Multi-selection dialogs pack the directory of the first path followed by
/// the bare names of the remaining ones, and close the buffer with a second
/// NUL. A single selection is one full path record.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PathBuffer {
    buf: Vec<u8>,
}

impl PathBuffer {
    pub(crate) fn new() -> Self {
        Self {
            buf: Vec::with_capacity(256),
        }
    }

    /// Append one record and its NUL separator.
    pub(crate) fn push_record(&mut self, record: &[u8]) {
        self.buf.reserve(record.len() + 1);
        self.buf.extend_from_slice(record);
        self.buf.push(0);
    }

    /// Close the buffer with the second terminating NUL.
    pub(crate) fn terminate(&mut self) {
        self.buf.push(0);
    }

    /// The raw packed bytes, separators included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// The records as borrowed paths, in the order they were selected.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.buf
            .split(|&byte| byte == 0)
            .filter(|record| !record.is_empty())
            .map(|record| Path::new(OsStr::from_bytes(record)))
    }
}

/// Decode a single-selection response into a one-record buffer.
pub(crate) fn packed_single(
    msg: &Message,
    append_extension: bool,
) -> Result<PortalResponse<PathBuffer>, Error> {
    let decoded = if append_extension {
        single_path_appending_extension(msg)?
    } else {
        single_path(msg)?
    };
    Ok(decoded.map(|path| {
        let mut out = PathBuffer::new();
        out.push_record(path.as_os_str().as_bytes());
        out
    }))
}

/// Decode a multi-selection response into the packed dirname/basenames
/// form described on [`PathBuffer`].
pub(crate) fn packed_multi(msg: &Message) -> Result<PortalResponse<PathBuffer>, Error> {
    let body = msg.body();
    let results = match read_results(&body)? {
        PortalResponse::Success(results) => results,
        PortalResponse::Cancelled => return Ok(PortalResponse::Cancelled),
    };
    let uris = read_uris(&results)?;
    let mut out = PathBuffer::new();
    match uris.split_first() {
        None => return Err(Error::Protocol("response signal URI array is empty")),
        Some((only, [])) => {
            out.push_record(&uri::decode_file_uri(only)?);
        }
        Some((first, rest)) => {
            let decoded = uri::decode_file_uri(first)?;
            out.push_record(dirname(&decoded));
            for uri_str in rest {
                let decoded = uri::decode_file_uri(uri_str)?;
                out.push_record(basename(&decoded));
            }
        }
    }
    out.terminate();
    Ok(PortalResponse::Success(out))
}

/// Shape check for callers that retain the message: the response must be a
/// successful selection carrying a URI array.
pub(crate) fn validated_selection(msg: &Message) -> Result<PortalResponse<()>, Error> {
    let body = msg.body();
    match read_results(&body)? {
        PortalResponse::Success(results) => {
            read_uris(&results)?;
            Ok(PortalResponse::Success(()))
        }
        PortalResponse::Cancelled => Ok(PortalResponse::Cancelled),
    }
}

/// Number of URIs in a retained successful response.
pub(crate) fn uri_count(msg: &Message) -> usize {
    let body = msg.body();
    match read_results(&body) {
        Ok(PortalResponse::Success(results)) => {
            read_uris(&results).map(|uris| uris.len()).unwrap_or(0)
        }
        _ => 0,
    }
}

/// Decode the URI at `index` from a retained successful response.
pub(crate) fn uri_at(msg: &Message, index: usize) -> Result<PathBuf, Error> {
    let body = msg.body();
    let PortalResponse::Success(results) = read_results(&body)? else {
        return Err(Error::Protocol("retained response is not a selection"));
    };
    let uris = read_uris(&results)?;
    let uri_str = uris
        .get(index)
        .copied()
        .ok_or_else(|| Error::Argument(format!("index {index} out of bounds")))?;
    decoded_path(uri_str)
}

/// POSIX dirname over raw path bytes.
pub(crate) fn dirname(path: &[u8]) -> &[u8] {
    let trimmed = trim_trailing_slashes(path);
    if trimmed.is_empty() {
        return if path.is_empty() { b"." } else { b"/" };
    }
    match trimmed.iter().rposition(|&byte| byte == b'/') {
        None => b".",
        Some(pos) => {
            let parent = trim_trailing_slashes(&trimmed[..pos]);
            if parent.is_empty() { b"/" } else { parent }
        }
    }
}

/// POSIX basename over raw path bytes.
pub(crate) fn basename(path: &[u8]) -> &[u8] {
    let trimmed = trim_trailing_slashes(path);
    if trimmed.is_empty() {
        return if path.is_empty() { b"." } else { b"/" };
    }
    match trimmed.iter().rposition(|&byte| byte == b'/') {
        None => trimmed,
        Some(pos) => &trimmed[pos + 1..],
    }
}

fn trim_trailing_slashes(path: &[u8]) -> &[u8] {
    let mut end = path.len();
    while end > 0 && path[end - 1] == b'/' {
        end -= 1;
    }
    &path[..end]
}

#[cfg(test)]
mod tests {
    use zbus::zvariant;

    use super::*;
    use crate::filter::Filter;

    #[derive(zvariant::SerializeDict, zvariant::Type, Default)]
    #[zvariant(signature = "a{sv}")]
    struct CannedResults {
        uris: Option<Vec<String>>,
        current_filter: Option<Filter>,
    }

    fn canned(code: u32, results: CannedResults) -> Message {
        Message::signal(
            "/org/freedesktop/portal/desktop/request/1_42/TOKEN",
            "org.freedesktop.portal.Request",
            "Response",
        )
        .unwrap()
        .sender(":1.99")
        .unwrap()
        .build(&(code, results))
        .unwrap()
    }

    fn selected(uris: &[&str]) -> Message {
        canned(
            0,
            CannedResults {
                uris: Some(uris.iter().map(|s| s.to_string()).collect()),
                current_filter: None,
            },
        )
    }

    #[test]
    fn cancel_code_is_not_an_error() {
        let msg = canned(1, CannedResults::default());
        assert!(matches!(
            single_path(&msg).unwrap(),
            PortalResponse::Cancelled
        ));
        assert!(matches!(
            packed_multi(&msg).unwrap(),
            PortalResponse::Cancelled
        ));
    }

    #[test]
    fn abnormal_codes_are_aborts() {
        for code in [2, 3, 7] {
            let msg = canned(code, CannedResults::default());
            assert!(matches!(single_path(&msg), Err(Error::PortalAbort)));
        }
    }

    #[test]
    fn single_path_is_percent_decoded() {
        let msg = selected(&["file:///tmp/a%20b.txt"]);
        let PortalResponse::Success(path) = single_path(&msg).unwrap() else {
            panic!("expected a selection");
        };
        assert_eq!(path, Path::new("/tmp/a b.txt"));
    }

    #[test]
    fn packed_single_is_one_nul_terminated_record() {
        let msg = selected(&["file:///tmp/a%20b.txt"]);
        let PortalResponse::Success(buffer) = packed_single(&msg, false).unwrap() else {
            panic!("expected a selection");
        };
        assert_eq!(buffer.as_bytes(), b"/tmp/a b.txt\0");
    }

    #[test]
    fn packed_multi_is_dirname_then_basenames() {
        let msg = selected(&[
            "file:///home/u/a.c",
            "file:///home/u/sub/b.c",
            "file:///home/u/sub/c.c",
        ]);
        let PortalResponse::Success(buffer) = packed_multi(&msg).unwrap() else {
            panic!("expected a selection");
        };
        assert_eq!(buffer.as_bytes(), b"/home/u\0a.c\0b.c\0c.c\0\0");
        let paths: Vec<_> = buffer.paths().collect();
        assert_eq!(
            paths,
            vec![
                Path::new("/home/u"),
                Path::new("a.c"),
                Path::new("b.c"),
                Path::new("c.c")
            ]
        );
    }

    #[test]
    fn packed_multi_with_one_path_is_the_full_path() {
        let msg = selected(&["file:///home/u/a.c"]);
        let PortalResponse::Success(buffer) = packed_multi(&msg).unwrap() else {
            panic!("expected a selection");
        };
        assert_eq!(buffer.as_bytes(), b"/home/u/a.c\0\0");
    }

    #[test]
    fn missing_uris_is_a_protocol_error() {
        let msg = canned(0, CannedResults::default());
        assert!(matches!(single_path(&msg), Err(Error::Protocol(_))));
        assert!(matches!(validated_selection(&msg), Err(Error::Protocol(_))));
    }

    #[test]
    fn malformed_uris_fail_decoding() {
        let msg = selected(&["file:///tmp/bad%4"]);
        assert!(matches!(single_path(&msg), Err(Error::MalformedUri)));
        let msg = selected(&["http://not-a-file"]);
        assert!(matches!(single_path(&msg), Err(Error::NotAFileUri)));
    }

    fn with_filter(uris: &[&str], filter: Filter) -> Message {
        canned(
            0,
            CannedResults {
                uris: Some(uris.iter().map(|s| s.to_string()).collect()),
                current_filter: Some(filter),
            },
        )
    }

    #[test]
    fn filter_extension_is_appended_when_missing() {
        let filter = ("Src (cpp, c)".to_owned(), vec![(0, "*.cpp".to_owned())]);
        let msg = with_filter(&["file:///tmp/noext"], filter);
        let PortalResponse::Success(path) = single_path_appending_extension(&msg).unwrap() else {
            panic!("expected a selection");
        };
        assert_eq!(path, Path::new("/tmp/noext.cpp"));
    }

    #[test]
    fn filter_extension_is_not_appended_twice() {
        let filter = ("Src".to_owned(), vec![(0, "*.cpp".to_owned())]);
        let msg = with_filter(&["file:///tmp/x.cc"], filter);
        let PortalResponse::Success(path) = single_path_appending_extension(&msg).unwrap() else {
            panic!("expected a selection");
        };
        assert_eq!(path, Path::new("/tmp/x.cc"));
    }

    #[test]
    fn wildcard_and_mime_filters_yield_no_extension() {
        for filter in [
            ("All files".to_owned(), vec![(0, "*".to_owned())]),
            ("SVG".to_owned(), vec![(1, "*.svg".to_owned())]),
            ("Empty".to_owned(), vec![]),
        ] {
            let msg = with_filter(&["file:///tmp/noext"], filter);
            let PortalResponse::Success(path) =
                single_path_appending_extension(&msg).unwrap()
            else {
                panic!("expected a selection");
            };
            assert_eq!(path, Path::new("/tmp/noext"));
        }
    }

    #[test]
    fn retained_message_access() {
        let msg = selected(&["file:///a/x", "file:///a/y%20z"]);
        assert_eq!(uri_count(&msg), 2);
        assert_eq!(uri_at(&msg, 1).unwrap(), Path::new("/a/y z"));
        assert!(matches!(uri_at(&msg, 2), Err(Error::Argument(_))));
    }

    #[test]
    fn dirname_and_basename_follow_posix() {
        assert_eq!(dirname(b"/usr/lib"), b"/usr");
        assert_eq!(dirname(b"/usr/"), b"/");
        assert_eq!(dirname(b"usr"), b".");
        assert_eq!(dirname(b"/"), b"/");
        assert_eq!(dirname(b"//a///b//"), b"//a");
        assert_eq!(dirname(b""), b".");

        assert_eq!(basename(b"/usr/lib"), b"lib");
        assert_eq!(basename(b"/usr/"), b"usr");
        assert_eq!(basename(b"/"), b"/");
        assert_eq!(basename(b"lib"), b"lib");
        assert_eq!(basename(b""), b".");
    }
}

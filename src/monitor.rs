//! The poll/retrieve side of asynchronous dialogs.
//!
//! Each async dialog owns one worker thread that drives the response pump
//! and decodes the result. The handle and the worker share a single
//! mutex-guarded record; the worker writes it exactly once, readers take
//! the lock on every access and never hold it across bus I/O.

use std::sync::{Arc, Mutex};
use std::thread;

use crate::Outcome;
use crate::error::Error;
use crate::response::{PathBuffer, PortalResponse};

struct MonitorState {
    completed: bool,
    result: Option<Result<PortalResponse<PathBuffer>, Error>>,
}

/// A dialog running on a background worker.
///
/// Poll [`has_completed`](Self::has_completed) until it turns true, then
/// call [`take_result`](Self::take_result) once to claim the outcome. A
/// repeated call reports `Ok` with no buffer, so dropping the handle at any
/// point after retrieval is safe; the worker has already exited by the time
/// completion is observable.
pub struct DialogHandle {
    state: Arc<Mutex<MonitorState>>,
}

impl DialogHandle {
    pub(crate) fn spawn(
        work: impl FnOnce() -> Result<PortalResponse<PathBuffer>, Error> + Send + 'static,
    ) -> Result<Self, Error> {
        let state = Arc::new(Mutex::new(MonitorState {
            completed: false,
            result: None,
        }));
        let shared = Arc::clone(&state);
        thread::Builder::new()
            .name("portal-dialog".into())
            .spawn(move || {
                let result = work();
                let mut state = shared.lock().unwrap();
                state.result = Some(result);
                state.completed = true;
            })
            .map_err(Error::Worker)?;
        Ok(Self { state })
    }

    /// Whether the dialog has produced its result.
    pub fn has_completed(&self) -> bool {
        self.state.lock().unwrap().completed
    }

    /// Claim the result of a completed dialog.
    ///
    /// Ownership of the path buffer moves to the caller; asking again
    /// yields `Ok(None)`. Calling before completion is an error and leaves
    /// the result in place.
    pub fn take_result(&self) -> Outcome<Option<PathBuffer>> {
        let mut state = self.state.lock().unwrap();
        if !state.completed {
            return crate::fail(Error::Argument("dialog has not completed yet".into()));
        }
        match state.result.take() {
            Some(Ok(PortalResponse::Success(buffer))) => Outcome::Ok(Some(buffer)),
            Some(Ok(PortalResponse::Cancelled)) => Outcome::Cancel,
            Some(Err(err)) => crate::fail(err),
            None => Outcome::Ok(None),
        }
    }
}

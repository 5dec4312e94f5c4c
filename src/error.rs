use std::io;

/// Everything that can go wrong while talking to the portal.
///
/// A user pressing Cancel is not an error; dialog calls report that through
/// [`Outcome::Cancel`](crate::Outcome::Cancel) instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The session bus rejected a connection, call, or subscription.
    #[error("D-Bus error: {0}")]
    Bus(#[from] zbus::Error),

    /// A reply or signal did not have the expected shape.
    #[error("unexpected portal reply: {0}")]
    Protocol(&'static str),

    /// The portal returned a URI with an invalid percent-encoded sequence.
    #[error("portal returned a malformed URI")]
    MalformedUri,

    /// The portal returned a URI that does not start with `file://`.
    #[error("portal returned a URI that is not a file URI")]
    NotAFileUri,

    /// The portal reported that the dialog ended abnormally.
    #[error("file dialog interaction was ended abruptly")]
    PortalAbort,

    /// The bus shut down before a response signal arrived.
    #[error("portal did not give us a reply")]
    NoReply,

    /// The caller passed something unusable.
    #[error("invalid argument: {0}")]
    Argument(String),

    /// The worker thread for an async dialog could not be started.
    #[error("failed to spawn dialog worker: {0}")]
    Worker(io::Error),

    /// [`init`](crate::init) has not been called, or [`quit`](crate::quit)
    /// already tore the connection down.
    #[error("portal connection is not initialized")]
    NotInitialized,
}

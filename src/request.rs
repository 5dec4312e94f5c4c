//! The portal request/response plumbing: unique request handles and the
//! signal subscription that carries the answer back.
//!
//! Before calling a file chooser method we predict the object path the
//! portal will emit its `Response` signal on and subscribe to it; older
//! portals return a different path in the method reply, in which case a
//! second subscription is installed on the returned path.

use rand::RngCore;
use zbus::MatchRule;
use zbus::blocking::{Connection, MessageIterator};
use zbus::message::{Message, Type};
use zbus::names::OwnedUniqueName;
use zbus::zvariant::{ObjectPath, OwnedObjectPath};

use crate::error::Error;
use crate::{PORTAL_BUS_NAME, REQUEST_INTERFACE, RESPONSE_MEMBER};

static REQUEST_PATH_PREFIX: &str = "/org/freedesktop/portal/desktop/request/";

/// Response signals queued between the method reply and our first read.
const MAX_QUEUED: usize = 16;

/// The predicted request object path plus the token that makes the portal
/// use it.
pub(crate) struct RequestHandle {
    pub(crate) path: OwnedObjectPath,
    pub(crate) token: String,
}

/// 64 characters drawn from `A..=P`, two per byte of OS randomness.
pub(crate) fn random_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    let mut token = String::with_capacity(2 * bytes.len());
    for byte in bytes {
        token.push((b'A' + (byte & 15)) as char);
        token.push((b'A' + (byte >> 4)) as char);
    }
    token
}

/// Build the request path the portal derives from our connection: the
/// unique name with its leading `:` stripped and `.` replaced by `_`,
/// followed by a fresh token.
pub(crate) fn request_handle(sender: &OwnedUniqueName) -> Result<RequestHandle, Error> {
    let token = random_token();
    let sanitized = sender.as_str().trim_start_matches(':').replace('.', "_");
    let path = format!("{REQUEST_PATH_PREFIX}{sanitized}/{token}");
    let path = OwnedObjectPath::try_from(path).map_err(zbus::Error::from)?;
    Ok(RequestHandle { path, token })
}

/// Match rule for the `Response` signal on one request object.
pub(crate) fn response_rule<'m>(
    handle_path: &'m str,
    destination: &'m str,
) -> Result<MatchRule<'m>, Error> {
    let rule = MatchRule::builder()
        .msg_type(Type::Signal)
        .sender(PORTAL_BUS_NAME)?
        .path(handle_path)?
        .interface(REQUEST_INTERFACE)?
        .member(RESPONSE_MEMBER)?
        .destination(destination)?
        .build();
    Ok(rule)
}

/// A live subscription for one request. Dropping it deregisters every
/// installed match rule with the broker; deregistration failures are part
/// of teardown and stay silent.
pub(crate) struct ResponseListener {
    conn: Connection,
    destination: OwnedUniqueName,
    primary: MessageIterator,
    rebound: Option<MessageIterator>,
}

impl ResponseListener {
    pub(crate) fn subscribe(
        conn: &Connection,
        destination: &OwnedUniqueName,
        handle_path: &ObjectPath<'_>,
    ) -> Result<Self, Error> {
        let rule = response_rule(handle_path.as_str(), destination.as_str())?;
        let primary = MessageIterator::for_match_rule(rule, conn, Some(MAX_QUEUED))?;
        Ok(Self {
            conn: conn.clone(),
            destination: destination.clone(),
            primary,
            rebound: None,
        })
    }

    /// Subscribe to the request path the portal actually allocated. The
    /// original subscription stays in place until the listener is dropped.
    pub(crate) fn rebind(&mut self, handle_path: &ObjectPath<'_>) -> Result<(), Error> {
        let rule = response_rule(handle_path.as_str(), self.destination.as_str())?;
        self.rebound = Some(MessageIterator::for_match_rule(
            rule,
            &self.conn,
            Some(MAX_QUEUED),
        )?);
        Ok(())
    }

    /// Block until the `Response` signal arrives and hand the raw message
    /// over. The stream ending first means the bus went away.
    pub(crate) fn wait_for_response(mut self) -> Result<Message, Error> {
        let stream = self.rebound.as_mut().unwrap_or(&mut self.primary);
        for msg in stream {
            let msg = msg?;
            if is_response_signal(&msg) {
                return Ok(msg);
            }
        }
        Err(Error::NoReply)
    }
}

fn is_response_signal(msg: &Message) -> bool {
    if msg.primary_header().msg_type() != Type::Signal {
        return false;
    }
    let header = msg.header();
    header
        .interface()
        .is_some_and(|interface| interface.as_str() == REQUEST_INTERFACE)
        && header
            .member()
            .is_some_and(|member| member.as_str() == RESPONSE_MEMBER)
}

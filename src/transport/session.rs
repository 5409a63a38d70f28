//! Session handles and fire-and-forget sends.

use std::fmt;

use serde::Deserialize;

use crate::error::Result;
use crate::protocol::Message;

/// Opaque handle to a transport association.
///
/// The registration core stores and compares handles but never interprets
/// them; their lifecycle belongs to the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct SessionHandle(pub u64);

impl fmt::Display for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session#{}", self.0)
    }
}

/// Fire-and-forget message delivery.
pub trait Transport {
    /// Serialize and send a message on a session.
    fn send(&mut self, session: SessionHandle, message: Message) -> Result<()>;
}

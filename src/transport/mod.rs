//! Transport module - collaborator seams for delivering messages.
//!
//! The registration core never frames or sends bytes itself. It talks to:
//! - a [`Transport`] for fire-and-forget sends on a session
//! - a [`TransactionLayer`] for confirmable requests whose reply is
//!   delivered later through a [`Completion`]

mod session;
mod transaction;

pub use session::{SessionHandle, Transport};
pub use transaction::{reply_channel, Completion, ReplyEvent, ReplySink, TransactionLayer};

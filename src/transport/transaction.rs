//! Transaction layer seam and reply delivery.
//!
//! Replies to confirmable requests arrive asynchronously. The client hands
//! a [`ReplySink`] to the transaction layer with every request; the layer
//! turns it into a [`Completion`] bound to the assigned message id and
//! resolves it exactly once, either with the matched reply or with `None`
//! on timeout or failure.
//!
//! ```text
//! RegistrationClient ──submit──► TransactionLayer ──► wire
//!        ▲                              │
//!        └──── mpsc<ReplyEvent> ◄── Completion::complete
//! ```
//!
//! # Example
//!
//! ```
//! use m2m_registration::client::ServerId;
//! use m2m_registration::transport::reply_channel;
//!
//! let (sink, mut rx) = reply_channel();
//! let completion = sink.completion(ServerId(1), 42);
//! completion.complete(None);
//!
//! let event = rx.try_recv().unwrap();
//! assert_eq!(event.request_mid, 42);
//! assert!(event.reply.is_none());
//! ```

use tokio::sync::mpsc;

use super::SessionHandle;
use crate::client::ServerId;
use crate::error::Result;
use crate::protocol::Message;

/// A resolved transaction, delivered to the registration client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyEvent {
    /// Server the request was sent to.
    pub server: ServerId,
    /// Message id assigned to the request.
    pub request_mid: u16,
    /// Matched reply, or `None` on timeout/failure.
    pub reply: Option<Message>,
}

/// Create a reply channel.
pub fn reply_channel() -> (ReplySink, mpsc::UnboundedReceiver<ReplyEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ReplySink { tx }, rx)
}

/// Sending half of the reply channel.
///
/// Cheaply cloneable; the transaction layer may keep a clone.
#[derive(Debug, Clone)]
pub struct ReplySink {
    tx: mpsc::UnboundedSender<ReplyEvent>,
}

impl ReplySink {
    /// Create a completion for a request sent to `server` with `request_mid`.
    pub fn completion(&self, server: ServerId, request_mid: u16) -> Completion {
        Completion {
            server,
            request_mid,
            tx: Some(self.tx.clone()),
        }
    }
}

/// Exactly-once resolution of one transaction.
///
/// Dropping an unresolved completion resolves it with `None`.
#[derive(Debug)]
pub struct Completion {
    server: ServerId,
    request_mid: u16,
    tx: Option<mpsc::UnboundedSender<ReplyEvent>>,
}

impl Completion {
    /// Server this completion belongs to.
    #[inline]
    pub fn server(&self) -> ServerId {
        self.server
    }

    /// Message id of the request.
    #[inline]
    pub fn request_mid(&self) -> u16 {
        self.request_mid
    }

    /// Resolve with a reply (or `None` for timeout/failure).
    pub fn complete(mut self, reply: Option<Message>) {
        self.resolve(reply);
    }

    fn resolve(&mut self, reply: Option<Message>) {
        if let Some(tx) = self.tx.take() {
            let event = ReplyEvent {
                server: self.server,
                request_mid: self.request_mid,
                reply,
            };
            if tx.send(event).is_err() {
                tracing::debug!(
                    "Reply for {} mid {} dropped, client is gone",
                    self.server,
                    self.request_mid
                );
            }
        }
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        self.resolve(None);
    }
}

/// Confirmable request delivery with reply correlation.
///
/// Owns message-id assignment and retransmission/timeout policy.
pub trait TransactionLayer {
    /// Allocate a message id for an untracked message.
    fn next_mid(&mut self) -> u16;

    /// Send a confirmable request to `server` over `session`.
    ///
    /// On success returns the message id assigned to the request and
    /// eventually resolves one completion obtained from `replies` for it.
    fn submit(
        &mut self,
        server: ServerId,
        session: SessionHandle,
        request: Message,
        replies: &ReplySink,
    ) -> Result<u16>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Method, Status};

    #[test]
    fn test_complete_delivers_once() {
        let (sink, mut rx) = reply_channel();
        let completion = sink.completion(ServerId(3), 7);
        assert_eq!(completion.server(), ServerId(3));
        assert_eq!(completion.request_mid(), 7);

        let request = Message::request(Method::Post, "/rd").with_mid(7);
        completion.complete(Some(Message::response(&request, Status::Created)));

        let event = rx.try_recv().unwrap();
        assert_eq!(event.server, ServerId(3));
        assert_eq!(event.reply.unwrap().status(), Some(Status::Created));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_drop_resolves_as_absent() {
        let (sink, mut rx) = reply_channel();
        drop(sink.completion(ServerId(1), 9));

        let event = rx.try_recv().unwrap();
        assert_eq!(event.request_mid, 9);
        assert!(event.reply.is_none());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_complete_after_receiver_closed() {
        let (sink, rx) = reply_channel();
        drop(rx);

        // Must not panic
        sink.completion(ServerId(1), 1).complete(None);
    }

    #[tokio::test]
    async fn test_completion_across_tasks() {
        let (sink, mut rx) = reply_channel();
        let completion = sink.completion(ServerId(2), 11);

        tokio::spawn(async move {
            completion.complete(None);
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.server, ServerId(2));
        assert_eq!(event.request_mid, 11);
    }
}

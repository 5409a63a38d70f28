//! Monitoring notifications for registry changes.
//!
//! A monitor is told about every successful registration (`2.01`) and
//! de-registration (`2.02`) after the registry change has been committed.
//!
//! # Example
//!
//! ```
//! use m2m_registration::server::{ChannelMonitor, RegistrationServer};
//!
//! let (monitor, mut events) = ChannelMonitor::new();
//! let server = RegistrationServer::with_monitor(monitor);
//! # let _ = (server, events.try_recv());
//! ```

use tokio::sync::mpsc;

use super::ClientId;
use crate::protocol::Status;

/// Receiver of registry change notifications.
pub trait Monitor: Send {
    /// Called after a client was created or deleted.
    fn notify(&mut self, client: ClientId, status: Status);
}

impl<F> Monitor for F
where
    F: FnMut(ClientId, Status) + Send,
{
    fn notify(&mut self, client: ClientId, status: Status) {
        self(client, status)
    }
}

/// A registry change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorEvent {
    pub client: ClientId,
    pub status: Status,
}

/// Monitor forwarding notifications over a channel.
#[derive(Debug, Clone)]
pub struct ChannelMonitor {
    tx: mpsc::UnboundedSender<MonitorEvent>,
}

impl ChannelMonitor {
    /// Create a monitor and the receiving end of its channel.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<MonitorEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Monitor for ChannelMonitor {
    fn notify(&mut self, client: ClientId, status: Status) {
        if self.tx.send(MonitorEvent { client, status }).is_err() {
            tracing::debug!("Monitor receiver closed, dropping {} {}", status, client);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[test]
    fn test_closure_monitor() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut monitor = move |client: ClientId, status: Status| {
            sink.lock().unwrap().push((client, status));
        };

        monitor.notify(ClientId(4), Status::Created);
        assert_eq!(*seen.lock().unwrap(), vec![(ClientId(4), Status::Created)]);
    }

    #[tokio::test]
    async fn test_channel_monitor() {
        let (mut monitor, mut rx) = ChannelMonitor::new();
        monitor.notify(ClientId(1), Status::Deleted);

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            MonitorEvent {
                client: ClientId(1),
                status: Status::Deleted
            }
        );
    }

    #[test]
    fn test_channel_monitor_closed_receiver() {
        let (mut monitor, rx) = ChannelMonitor::new();
        drop(rx);
        monitor.notify(ClientId(1), Status::Created);
    }
}

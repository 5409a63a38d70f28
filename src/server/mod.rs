//! Server role - registration handling and the client registry.
//!
//! Provides:
//! - [`RegistrationServer`] - handles register / update / de-register requests
//! - [`ClientRegistry`] - owns the records of registered clients
//! - [`Monitor`] - notified of every registry change
//!
//! # Example
//!
//! ```
//! use m2m_registration::protocol::{Message, Method, Status};
//! use m2m_registration::server::{ChannelMonitor, RegistrationServer};
//! use m2m_registration::transport::SessionHandle;
//!
//! let (monitor, mut events) = ChannelMonitor::new();
//! let mut server = RegistrationServer::with_monitor(monitor);
//!
//! let request = Message::request(Method::Post, "/rd")
//!     .with_query("ep=node-1")
//!     .with_payload("</3>");
//! server.handle_request(SessionHandle(1), &request);
//!
//! let event = events.try_recv().unwrap();
//! assert_eq!(event.status, Status::Created);
//! ```

mod handler;
mod monitor;
mod registry;

pub use handler::{RegistrationOutcome, RegistrationServer};
pub use monitor::{ChannelMonitor, Monitor, MonitorEvent};
pub use registry::{ClientId, ClientRecord, ClientRegistry, Observation};

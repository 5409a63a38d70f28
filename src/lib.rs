//! # m2m-registration
//!
//! Registration phase of a lightweight CoAP-based M2M device-management
//! protocol.
//!
//! A client announces its endpoint name and object tree to one or more
//! management servers, and withdraws it on shutdown. A server keeps a live
//! registry of connected clients.
//!
//! ## Architecture
//!
//! - **Client role** ([`client`]): builds `POST /rd?ep=<name>` and
//!   `DELETE <location>` requests and tracks one registration per server
//! - **Server role** ([`server`]): validates requests, keeps the client
//!   registry and notifies a monitor
//! - **Codec** ([`codec`]): link-format object list shared by both roles
//!
//! Framing, retransmission and sessions are external; see [`transport`].
//!
//! ## Example
//!
//! ```
//! use m2m_registration::protocol::{Message, Method, Status};
//! use m2m_registration::server::RegistrationServer;
//! use m2m_registration::transport::SessionHandle;
//!
//! let mut server = RegistrationServer::new();
//!
//! let register = Message::request(Method::Post, "/rd")
//!     .with_query("ep=node-1")
//!     .with_payload("</1/0>,</3>");
//! let reply = server.handle_request(SessionHandle(1), &register);
//! assert_eq!(reply.location_path.as_deref(), Some("/rd/0"));
//!
//! let deregister = Message::request(Method::Delete, "/rd/0");
//! let reply = server.handle_request(SessionHandle(1), &deregister);
//! assert_eq!(reply.status(), Some(Status::Deleted));
//! ```

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod objects;
pub mod protocol;
pub mod server;
pub mod transport;

pub use client::{ClientBuilder, RegistrationClient};
pub use error::RegistrationError;
pub use server::RegistrationServer;

//! Registration request handler.
//!
//! | Method | Target      | Result                                  |
//! |--------|-------------|-----------------------------------------|
//! | POST   | `/rd`       | `2.01 Created`, location `/rd/<id>`     |
//! | PUT    | any         | `5.01 Not Implemented`                  |
//! | DELETE | `/rd/<id>`  | `2.02 Deleted`                          |
//! | other  | any         | `4.00 Bad Request`                      |
//!
//! # Example
//!
//! ```
//! use m2m_registration::protocol::{Message, Method, Status};
//! use m2m_registration::server::RegistrationServer;
//! use m2m_registration::transport::SessionHandle;
//!
//! let mut server = RegistrationServer::new();
//!
//! let request = Message::request(Method::Post, "/rd")
//!     .with_query("ep=node-1")
//!     .with_payload("</1/0>,</3>");
//! let response = server.handle_request(SessionHandle(1), &request);
//!
//! assert_eq!(response.status(), Some(Status::Created));
//! assert_eq!(response.location_path.as_deref(), Some("/rd/0"));
//! ```

use super::{ClientId, ClientRegistry, Monitor};
use crate::codec::LinkFormatCodec;
use crate::error::{RegistrationError, Result};
use crate::protocol::{endpoint_name, render_location, Message, Method, RequestUri, Status};
use crate::transport::SessionHandle;

/// Outcome of a successfully handled request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationOutcome {
    /// Status to reply with.
    pub status: Status,
    /// Affected client.
    pub client: ClientId,
    /// Location to attach to the reply (registration only).
    pub location: Option<String>,
}

/// Server side of the registration interface.
///
/// Owns the client registry and the optional monitor.
pub struct RegistrationServer {
    registry: ClientRegistry,
    monitor: Option<Box<dyn Monitor>>,
}

impl RegistrationServer {
    /// Create a server with an empty registry and no monitor.
    pub fn new() -> Self {
        Self {
            registry: ClientRegistry::new(),
            monitor: None,
        }
    }

    /// Create a server notifying `monitor` of registry changes.
    pub fn with_monitor<M: Monitor + 'static>(monitor: M) -> Self {
        Self {
            registry: ClientRegistry::new(),
            monitor: Some(Box::new(monitor)),
        }
    }

    /// Install or replace the monitor.
    pub fn set_monitor<M: Monitor + 'static>(&mut self, monitor: M) {
        self.monitor = Some(Box::new(monitor));
    }

    /// Remove the monitor.
    pub fn clear_monitor(&mut self) {
        self.monitor = None;
    }

    #[inline]
    pub fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    #[inline]
    pub fn registry_mut(&mut self) -> &mut ClientRegistry {
        &mut self.registry
    }

    /// Handle a request and build the piggybacked response.
    ///
    /// Errors never escape: they become `4.00`, `5.00` or `5.01` replies.
    pub fn handle_request(&mut self, session: SessionHandle, request: &Message) -> Message {
        match self.handle(session, request) {
            Ok(outcome) => {
                let response = Message::response(request, outcome.status);
                match outcome.location {
                    Some(location) => response.with_location(location),
                    None => response,
                }
            }
            Err(e) => {
                tracing::debug!(
                    "Registration request {} from {} rejected: {}",
                    request.mid,
                    session,
                    e
                );
                Message::response(request, e.status())
            }
        }
    }

    /// Handle a request and return the typed outcome.
    pub fn handle(&mut self, session: SessionHandle, request: &Message) -> Result<RegistrationOutcome> {
        match request.method() {
            Some(Method::Post) => self.register(session, request),
            Some(Method::Put) => Err(RegistrationError::NotImplemented("registration update")),
            Some(Method::Delete) => self.deregister(request),
            _ => Err(RegistrationError::BadRequest(format!(
                "unsupported code {:#04x}",
                request.code
            ))),
        }
    }

    fn register(&mut self, session: SessionHandle, request: &Message) -> Result<RegistrationOutcome> {
        let uri = RequestUri::parse(&request.uri_path)?;
        if !uri.is_root() {
            return Err(RegistrationError::BadRequest(format!(
                "registration must target the root, got {:?}",
                request.uri_path
            )));
        }

        let name = endpoint_name(&request.uri_query)
            .ok_or_else(|| RegistrationError::BadRequest("missing endpoint name".to_string()))?;
        let objects = LinkFormatCodec::decode(&request.payload)?;

        // Location is rendered before the registry is touched so a failure
        // leaves nothing to roll back.
        let id = self.registry.next_id_for(name)?;
        let location = render_location(id.0)?;

        let (record, is_new) = self.registry.upsert(name, objects, session)?;
        debug_assert_eq!(record.id(), id);

        if is_new {
            tracing::info!("Registered {} as {} at {}", name, id, location);
        } else {
            tracing::info!("Re-registered {} as {}", name, id);
        }

        self.notify(id, Status::Created);

        Ok(RegistrationOutcome {
            status: Status::Created,
            client: id,
            location: Some(location),
        })
    }

    fn deregister(&mut self, request: &Message) -> Result<RegistrationOutcome> {
        let uri = RequestUri::parse(&request.uri_path)?;
        let id = uri.record_id().map(ClientId).ok_or_else(|| {
            RegistrationError::BadRequest(format!(
                "de-registration must target one client, got {:?}",
                request.uri_path
            ))
        })?;

        let record = self
            .registry
            .remove_by_id(id)
            .ok_or_else(|| RegistrationError::BadRequest(format!("unknown {}", id)))?;

        tracing::info!("De-registered {} ({})", record.name(), id);
        self.notify(id, Status::Deleted);

        Ok(RegistrationOutcome {
            status: Status::Deleted,
            client: id,
            location: None,
        })
    }

    fn notify(&mut self, client: ClientId, status: Status) {
        if let Some(monitor) = self.monitor.as_mut() {
            monitor.notify(client, status);
        }
    }
}

impl Default for RegistrationServer {
    fn default() -> Self {
        Self::new()
    }
}

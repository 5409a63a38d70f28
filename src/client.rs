//! Registration client and builder.
//!
//! The [`ClientBuilder`] provides a fluent API for configuring the endpoint
//! name, object tree and servers. The [`RegistrationClient`] drives the
//! per-server state machine:
//! 1. `register()` sends `POST /rd?ep=<name>` to every server
//! 2. replies arrive on the reply channel and are applied
//! 3. `deregister()` sends `DELETE <location>` and resets the server
//!
//! # Example
//!
//! ```ignore
//! use m2m_registration::client::{RegistrationClient, ServerId};
//! use m2m_registration::transport::SessionHandle;
//!
//! let mut client = RegistrationClient::builder()
//!     .endpoint_name("node-1")
//!     .instance(1, 0)
//!     .object(3)
//!     .server(ServerId(1), SessionHandle(100))
//!     .build()?;
//!
//! client.register(&mut transactions)?;
//! while let Some(server) = client.next_reply().await {
//!     println!("{} is now {:?}", server, client.target(server).unwrap().status());
//! }
//! ```

mod target;

pub use target::{RegistrationStatus, RegistrationTarget, ServerId};

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::codec::{LinkFormatCodec, MAX_REGISTER_PAYLOAD};
use crate::config::{ClientConfig, ServerConfig};
use crate::error::{RegistrationError, Result};
use crate::objects::{ObjectEntry, ObjectTree};
use crate::protocol::{registration_root, Message, Method, Status, ENDPOINT_QUERY};
use crate::transport::{reply_channel, ReplyEvent, ReplySink, SessionHandle, TransactionLayer, Transport};

/// Builder for configuring and creating a registration client.
pub struct ClientBuilder {
    config: ClientConfig,
    objects: ObjectTree,
}

impl ClientBuilder {
    /// Create a new client builder.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::new(""),
            objects: ObjectTree::new(),
        }
    }

    /// Set the endpoint name announced to servers.
    pub fn endpoint_name(mut self, name: impl Into<String>) -> Self {
        self.config.endpoint_name = name.into();
        self
    }

    /// Add a management server.
    pub fn server(mut self, id: ServerId, session: SessionHandle) -> Self {
        self.config.servers.push(ServerConfig { id, session });
        self
    }

    /// Announce an object (without instances unless added separately).
    pub fn object(mut self, id: u16) -> Self {
        self.objects.insert_object(id);
        self
    }

    /// Announce an object instance.
    pub fn instance(mut self, id: u16, instance: u16) -> Self {
        self.objects.insert_instance(id, instance);
        self
    }

    /// Announce a whole object entry.
    pub fn entry(mut self, entry: ObjectEntry) -> Self {
        self.objects.insert_entry(entry);
        self
    }

    /// Replace the announced object tree.
    pub fn objects(mut self, objects: ObjectTree) -> Self {
        self.objects = objects;
        self
    }

    /// Validate the configuration and build the client.
    pub fn build(self) -> Result<RegistrationClient> {
        RegistrationClient::from_config(self.config, self.objects)
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Client side of the registration interface.
///
/// Holds one [`RegistrationTarget`] per configured server and the receiving
/// end of the reply channel. All transitions happen synchronously inside
/// `register`, `apply_reply` and `deregister`.
pub struct RegistrationClient {
    endpoint_name: String,
    objects: ObjectTree,
    targets: Vec<RegistrationTarget>,
    /// Handed to the transaction layer with every request.
    replies: ReplySink,
    reply_rx: mpsc::UnboundedReceiver<ReplyEvent>,
}

impl RegistrationClient {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Create a client from a validated configuration.
    pub fn from_config(config: ClientConfig, objects: ObjectTree) -> Result<Self> {
        config.validate()?;

        let targets = config
            .servers
            .iter()
            .map(|s| RegistrationTarget::new(s.id, s.session))
            .collect();
        let (replies, reply_rx) = reply_channel();

        Ok(Self {
            endpoint_name: config.endpoint_name,
            objects,
            targets,
            replies,
            reply_rx,
        })
    }

    #[inline]
    pub fn endpoint_name(&self) -> &str {
        &self.endpoint_name
    }

    /// Object tree announced on the next registration.
    #[inline]
    pub fn objects(&self) -> &ObjectTree {
        &self.objects
    }

    /// Replace the object tree announced on the next registration.
    pub fn set_objects(&mut self, objects: ObjectTree) {
        self.objects = objects;
    }

    /// All configured targets.
    #[inline]
    pub fn targets(&self) -> &[RegistrationTarget] {
        &self.targets
    }

    /// Get a target by server id.
    pub fn target(&self, server: ServerId) -> Option<&RegistrationTarget> {
        self.targets.iter().find(|t| t.server() == server)
    }

    fn target_mut(&mut self, server: ServerId) -> Option<&mut RegistrationTarget> {
        self.targets.iter_mut().find(|t| t.server() == server)
    }

    /// Add a server. Fails if the id is already configured.
    pub fn add_server(&mut self, config: ServerConfig) -> Result<()> {
        if self.target(config.id).is_some() {
            return Err(RegistrationError::Config(format!("duplicate {}", config.id)));
        }
        self.targets
            .push(RegistrationTarget::new(config.id, config.session));
        Ok(())
    }

    /// Remove a server and return its final state.
    ///
    /// No de-registration is sent; call [`deregister`](Self::deregister)
    /// first if needed.
    pub fn remove_server(&mut self, server: ServerId) -> Option<RegistrationTarget> {
        let index = self.targets.iter().position(|t| t.server() == server)?;
        Some(self.targets.remove(index))
    }

    /// Send a registration request to every configured server.
    ///
    /// Fails without sending anything if the object tree cannot be encoded.
    /// A failed handoff for one server leaves that server's state as it was
    /// and does not stop the others. Returns the number of requests handed
    /// off.
    pub fn register<L: TransactionLayer>(&mut self, layer: &mut L) -> Result<usize> {
        let payload = LinkFormatCodec::encode_bounded(&self.objects, MAX_REGISTER_PAYLOAD)
            .map_err(|e| RegistrationError::ServerError(format!("registration payload: {}", e)))?;
        let payload = Bytes::from(payload);
        let query = format!("{}{}", ENDPOINT_QUERY, self.endpoint_name);

        let mut sent = 0;
        for target in &mut self.targets {
            let request = Message::request(Method::Post, registration_root())
                .with_query(query.clone())
                .with_payload(payload.clone());

            match layer.submit(target.server(), target.session(), request, &self.replies) {
                Ok(mid) => {
                    tracing::debug!("Registration sent to {} (mid {})", target.server(), mid);
                    target.mark_pending(mid);
                    sent += 1;
                }
                Err(e) => {
                    tracing::warn!("Registration handoff to {} failed: {}", target.server(), e);
                }
            }
        }

        Ok(sent)
    }

    /// Apply a resolved transaction to its target.
    ///
    /// Only admitted while the target is `Pending` with a matching message
    /// id. Returns `true` if the target's state changed.
    pub fn apply_reply(&mut self, event: ReplyEvent) -> bool {
        let ReplyEvent {
            server,
            request_mid,
            reply,
        } = event;

        let Some(target) = self.target_mut(server) else {
            tracing::debug!("Reply for unconfigured {} ignored", server);
            return false;
        };

        if !target.awaits(request_mid) {
            tracing::debug!(
                "Stale reply for {} (mid {}, state {:?}) ignored",
                server,
                request_mid,
                target.status()
            );
            return false;
        }

        let Some(reply) = reply else {
            tracing::info!("Registration with {} timed out", server);
            target.reset();
            return true;
        };

        if reply.mid != request_mid || !reply.is_ack() {
            tracing::debug!("Reply for {} does not acknowledge mid {}", server, request_mid);
            return false;
        }

        let Some(location) = reply.location_path else {
            tracing::debug!("Reply for {} carries no location", server);
            return false;
        };

        match Status::from_code(reply.code) {
            Some(Status::Created) => {
                tracing::info!("Registered with {} at {}", server, location);
                target.mark_registered(location);
                true
            }
            Some(Status::BadRequest) => {
                tracing::warn!("Registration rejected by {}", server);
                target.reset();
                true
            }
            _ => {
                tracing::debug!("Unhandled reply code {:#04x} from {}", reply.code, server);
                false
            }
        }
    }

    /// Apply every reply already waiting on the channel.
    ///
    /// Returns the number of replies that changed a target.
    pub fn process_replies(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.reply_rx.try_recv() {
            if self.apply_reply(event) {
                applied += 1;
            }
        }
        applied
    }

    /// Wait for the next reply and apply it.
    ///
    /// Returns the server the reply belonged to, or `None` once no reply is
    /// queued and no target is `Pending`.
    pub async fn next_reply(&mut self) -> Option<ServerId> {
        let event = match self.reply_rx.try_recv() {
            Ok(event) => event,
            Err(_) if !self.has_pending() => return None,
            Err(_) => self.reply_rx.recv().await?,
        };
        let server = event.server;
        self.apply_reply(event);
        Some(server)
    }

    /// Whether any target is waiting for a registration reply.
    pub fn has_pending(&self) -> bool {
        self.targets
            .iter()
            .any(|t| t.status() == RegistrationStatus::Pending)
    }

    /// De-register from a server.
    ///
    /// Only acts on a `Registered` target: sends `DELETE <location>`
    /// fire-and-forget and resets the target whatever the send outcome.
    /// Returns `true` if a de-registration was issued.
    pub fn deregister<C>(&mut self, server: ServerId, ctx: &mut C) -> bool
    where
        C: TransactionLayer + Transport,
    {
        let Some(target) = self.target_mut(server) else {
            return false;
        };
        if target.status() != RegistrationStatus::Registered {
            return false;
        }

        if let Some(location) = target.location() {
            let request = Message::request(Method::Delete, location).with_mid(ctx.next_mid());
            if let Err(e) = ctx.send(target.session(), request) {
                tracing::warn!("De-registration from {} failed to send: {}", server, e);
            }
        }

        tracing::info!("De-registered from {}", server);
        target.reset();
        true
    }

    /// De-register from every registered server.
    ///
    /// Returns the number of de-registrations issued.
    pub fn deregister_all<C>(&mut self, ctx: &mut C) -> usize
    where
        C: TransactionLayer + Transport,
    {
        let servers: Vec<ServerId> = self.targets.iter().map(|t| t.server()).collect();

        let mut issued = 0;
        for server in servers {
            if self.deregister(server, &mut *ctx) {
                issued += 1;
            }
        }
        issued
    }
}

//! Per-server registration state.

use std::fmt;

use serde::Deserialize;

use crate::transport::SessionHandle;

/// Short identifier of a configured management server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct ServerId(pub u16);

impl fmt::Display for ServerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "server#{}", self.0)
    }
}

/// Registration state of one target.
///
/// ```text
/// Unknown ──register──► Pending ──2.01──► Registered
///    ▲                     │                  │
///    └── timeout / 4.00 ───┘                  │
///    └──────────────── deregister ────────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegistrationStatus {
    /// Not registered, or the last attempt failed.
    #[default]
    Unknown,
    /// Registration request sent, awaiting reply.
    Pending,
    /// Server accepted the registration.
    Registered,
}

/// A configured management server and the client's registration with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationTarget {
    server: ServerId,
    session: SessionHandle,
    status: RegistrationStatus,
    pending_mid: Option<u16>,
    location: Option<String>,
}

impl RegistrationTarget {
    /// Create a target in the `Unknown` state.
    pub fn new(server: ServerId, session: SessionHandle) -> Self {
        Self {
            server,
            session,
            status: RegistrationStatus::Unknown,
            pending_mid: None,
            location: None,
        }
    }

    #[inline]
    pub fn server(&self) -> ServerId {
        self.server
    }

    #[inline]
    pub fn session(&self) -> SessionHandle {
        self.session
    }

    #[inline]
    pub fn status(&self) -> RegistrationStatus {
        self.status
    }

    /// Message id of the in-flight registration, only while `Pending`.
    #[inline]
    pub fn pending_mid(&self) -> Option<u16> {
        self.pending_mid
    }

    /// Location assigned by the server on successful registration.
    #[inline]
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub(crate) fn mark_pending(&mut self, mid: u16) {
        self.status = RegistrationStatus::Pending;
        self.pending_mid = Some(mid);
    }

    pub(crate) fn mark_registered(&mut self, location: String) {
        self.status = RegistrationStatus::Registered;
        self.pending_mid = None;
        self.location = Some(location);
    }

    pub(crate) fn reset(&mut self) {
        self.status = RegistrationStatus::Unknown;
        self.pending_mid = None;
        self.location = None;
    }

    /// Check whether a resolved transaction may be applied to this target.
    pub(crate) fn awaits(&self, mid: u16) -> bool {
        self.status == RegistrationStatus::Pending && self.pending_mid == Some(mid)
    }
}

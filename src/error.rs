//! Error types for m2m-registration.

use thiserror::Error;

use crate::codec::ParseError;
use crate::protocol::Status;

/// Main error type for all registration operations.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// Request is malformed (missing endpoint name, bad target id, ...).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Registration payload could not be decoded.
    #[error("Payload error: {0}")]
    Parse(#[from] ParseError),

    /// Internal failure while serving or building a request.
    #[error("Server error: {0}")]
    ServerError(String),

    /// Method is recognised but not supported by this core.
    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),

    /// Handoff to the transport or transaction layer failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON configuration could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RegistrationError {
    /// Protocol status this error is reported as.
    pub fn status(&self) -> Status {
        match self {
            RegistrationError::BadRequest(_) | RegistrationError::Parse(_) => Status::BadRequest,
            RegistrationError::NotImplemented(_) => Status::NotImplemented,
            RegistrationError::ServerError(_)
            | RegistrationError::Transport(_)
            | RegistrationError::Config(_)
            | RegistrationError::Json(_) => Status::InternalServerError,
        }
    }
}

/// Result type alias using RegistrationError.
pub type Result<T> = std::result::Result<T, RegistrationError>;

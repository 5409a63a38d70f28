//! Request/response message model.
//!
//! Framing and serialization of messages belong to the transport; this
//! module only models the fields the registration core reads and writes.
//! The `code` byte uses the CoAP layout:
//!
//! ```text
//! ┌───────┬──────────┐
//! │ class │  detail  │
//! │ 3 bits│  5 bits  │
//! └───────┴──────────┘
//! ```
//!
//! Class 0 carries request methods, classes 2, 4 and 5 carry response
//! statuses (`2.01` = `0x41`).

use std::fmt;

use bytes::Bytes;

/// Code constants for the protocol.
pub mod codes {
    /// Empty message (ping / bare ACK).
    pub const EMPTY: u8 = 0x00;

    pub const GET: u8 = 0x01;
    pub const POST: u8 = 0x02;
    pub const PUT: u8 = 0x03;
    pub const DELETE: u8 = 0x04;

    /// 2.01
    pub const CREATED: u8 = 0x41;
    /// 2.02
    pub const DELETED: u8 = 0x42;
    /// 2.04
    pub const CHANGED: u8 = 0x44;
    /// 2.05
    pub const CONTENT: u8 = 0x45;
    /// 4.00
    pub const BAD_REQUEST: u8 = 0x80;
    /// 4.04
    pub const NOT_FOUND: u8 = 0x84;
    /// 4.05
    pub const METHOD_NOT_ALLOWED: u8 = 0x85;
    /// 5.00
    pub const INTERNAL_SERVER_ERROR: u8 = 0xA0;
    /// 5.01
    pub const NOT_IMPLEMENTED: u8 = 0xA1;

    /// Class part of a code (the `2` in `2.01`).
    #[inline]
    pub fn class(code: u8) -> u8 {
        code >> 5
    }

    /// Detail part of a code (the `01` in `2.01`).
    #[inline]
    pub fn detail(code: u8) -> u8 {
        code & 0x1F
    }

    /// Check whether a code is a request method.
    #[inline]
    pub fn is_request(code: u8) -> bool {
        class(code) == 0 && code != EMPTY
    }
}

/// Message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    /// Confirmable, expects an acknowledgement.
    Confirmable,
    /// Non-confirmable.
    NonConfirmable,
    /// Acknowledgement, may carry a piggybacked response.
    Acknowledgement,
    /// Reset.
    Reset,
}

/// Request methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Raw code byte.
    pub fn code(self) -> u8 {
        match self {
            Method::Get => codes::GET,
            Method::Post => codes::POST,
            Method::Put => codes::PUT,
            Method::Delete => codes::DELETE,
        }
    }

    /// Parse a raw code byte.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            codes::GET => Some(Method::Get),
            codes::POST => Some(Method::Post),
            codes::PUT => Some(Method::Put),
            codes::DELETE => Some(Method::Delete),
            _ => None,
        }
    }
}

/// Response statuses used by the registration interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Created,
    Deleted,
    Changed,
    Content,
    BadRequest,
    NotFound,
    MethodNotAllowed,
    InternalServerError,
    NotImplemented,
}

impl Status {
    /// Raw code byte.
    pub fn code(self) -> u8 {
        match self {
            Status::Created => codes::CREATED,
            Status::Deleted => codes::DELETED,
            Status::Changed => codes::CHANGED,
            Status::Content => codes::CONTENT,
            Status::BadRequest => codes::BAD_REQUEST,
            Status::NotFound => codes::NOT_FOUND,
            Status::MethodNotAllowed => codes::METHOD_NOT_ALLOWED,
            Status::InternalServerError => codes::INTERNAL_SERVER_ERROR,
            Status::NotImplemented => codes::NOT_IMPLEMENTED,
        }
    }

    /// Parse a raw code byte.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            codes::CREATED => Some(Status::Created),
            codes::DELETED => Some(Status::Deleted),
            codes::CHANGED => Some(Status::Changed),
            codes::CONTENT => Some(Status::Content),
            codes::BAD_REQUEST => Some(Status::BadRequest),
            codes::NOT_FOUND => Some(Status::NotFound),
            codes::METHOD_NOT_ALLOWED => Some(Status::MethodNotAllowed),
            codes::INTERNAL_SERVER_ERROR => Some(Status::InternalServerError),
            codes::NOT_IMPLEMENTED => Some(Status::NotImplemented),
            _ => None,
        }
    }

    /// Check if this is a 2.xx status.
    #[inline]
    pub fn is_success(self) -> bool {
        codes::class(self.code()) == 2
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self.code();
        write!(f, "{}.{:02}", codes::class(code), codes::detail(code))
    }
}

/// A decoded request or response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Message type.
    pub message_type: MessageType,
    /// Method or status code (see `codes`).
    pub code: u8,
    /// Message id used to match acknowledgements.
    pub mid: u16,
    /// Target path, with leading `/` (e.g. `/rd/0`).
    pub uri_path: String,
    /// Query options in order (e.g. `ep=node-1`).
    pub uri_query: Vec<String>,
    /// Location path of a created resource.
    pub location_path: Option<String>,
    /// Payload bytes.
    pub payload: Bytes,
}

impl Message {
    /// Create a new confirmable request.
    pub fn request(method: Method, uri_path: impl Into<String>) -> Self {
        Self {
            message_type: MessageType::Confirmable,
            code: method.code(),
            mid: 0,
            uri_path: uri_path.into(),
            uri_query: Vec::new(),
            location_path: None,
            payload: Bytes::new(),
        }
    }

    /// Create a piggybacked response to `request`.
    pub fn response(request: &Message, status: Status) -> Self {
        Self {
            message_type: MessageType::Acknowledgement,
            code: status.code(),
            mid: request.mid,
            uri_path: String::new(),
            uri_query: Vec::new(),
            location_path: None,
            payload: Bytes::new(),
        }
    }

    /// Set the message id.
    pub fn with_mid(mut self, mid: u16) -> Self {
        self.mid = mid;
        self
    }

    /// Set the message type.
    pub fn with_type(mut self, message_type: MessageType) -> Self {
        self.message_type = message_type;
        self
    }

    /// Append a query option.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.uri_query.push(query.into());
        self
    }

    /// Set the location path.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location_path = Some(location.into());
        self
    }

    /// Set the payload.
    pub fn with_payload(mut self, payload: impl Into<Bytes>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Request method, if this is a request with a known method.
    #[inline]
    pub fn method(&self) -> Option<Method> {
        Method::from_code(self.code)
    }

    /// Response status, if this is a response with a known status.
    #[inline]
    pub fn status(&self) -> Option<Status> {
        Status::from_code(self.code)
    }

    /// Check if this is a request.
    #[inline]
    pub fn is_request(&self) -> bool {
        codes::is_request(self.code)
    }

    /// Check if this is an acknowledgement.
    #[inline]
    pub fn is_ack(&self) -> bool {
        self.message_type == MessageType::Acknowledgement
    }
}

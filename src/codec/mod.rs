//! Codec module - registration payload encoding/decoding.
//!
//! - [`LinkFormatCodec`] - the compact link-format list of objects and
//!   object instances carried in a registration request.
//!
//! # Design
//!
//! Codecs are marker structs with static methods. Both the client role
//! (encode) and the server role (decode) share this module.
//!
//! # Example
//!
//! ```
//! use m2m_registration::codec::{LinkFormatCodec, ParseError};
//!
//! assert!(LinkFormatCodec::decode(b"</1/0>").is_ok());
//! assert_eq!(LinkFormatCodec::decode(b"garbage"), Err(ParseError::Empty));
//! ```

mod link_format;

pub use link_format::{LinkFormatCodec, ParseError, MAX_REGISTER_PAYLOAD};

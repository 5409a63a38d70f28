//! Protocol module - message model and registration interface paths.
//!
//! This module models the parts of the request/response protocol the
//! registration core works with:
//! - [`Message`] with a raw code byte and typed accessors
//! - [`Method`] / [`Status`] views of the code byte
//! - registration paths, endpoint query and location rendering

mod message;
mod uri;

pub use message::{codes, Message, MessageType, Method, Status};
pub use uri::{
    endpoint_name, registration_root, render_location, RequestUri, ENDPOINT_QUERY,
    MAX_LOCATION_LENGTH, REGISTRATION_SEGMENT,
};

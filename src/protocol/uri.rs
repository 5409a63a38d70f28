//! Registration interface paths and query parameters.
//!
//! ```text
//! POST   /rd?ep=<name>     register (root)
//! DELETE /rd/<id>          de-register one record
//! ```

use crate::error::{RegistrationError, Result};
use crate::objects::MAX_ID;

/// Root path segment of the registration interface.
pub const REGISTRATION_SEGMENT: &str = "rd";

/// Query prefix carrying the endpoint name.
pub const ENDPOINT_QUERY: &str = "ep=";

/// Size of the location buffer, including one byte of terminator slack.
pub const MAX_LOCATION_LENGTH: usize = 10;

/// Path of the registration root, as sent by clients.
pub fn registration_root() -> String {
    format!("/{}", REGISTRATION_SEGMENT)
}

/// Parsed target of a request under the registration root.
///
/// Up to three numeric segments may follow the root; a de-registration
/// must carry exactly one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestUri {
    pub object_id: Option<u16>,
    pub instance_id: Option<u16>,
    pub resource_id: Option<u16>,
}

impl RequestUri {
    /// Parse a request path such as `/rd` or `/rd/3`.
    pub fn parse(path: &str) -> Result<Self> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());

        match segments.next() {
            Some(REGISTRATION_SEGMENT) => {}
            other => {
                return Err(RegistrationError::BadRequest(format!(
                    "path {:?} is not under /{} (first segment {:?})",
                    path, REGISTRATION_SEGMENT, other
                )))
            }
        }

        let mut ids = [None; 3];
        for (index, segment) in segments.enumerate() {
            let slot = ids.get_mut(index).ok_or_else(|| {
                RegistrationError::BadRequest(format!("too many segments in {:?}", path))
            })?;
            *slot = Some(parse_segment(segment)?);
        }

        Ok(Self {
            object_id: ids[0],
            instance_id: ids[1],
            resource_id: ids[2],
        })
    }

    /// Check if the URI addresses the registration root itself.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.object_id.is_none() && self.instance_id.is_none() && self.resource_id.is_none()
    }

    /// Record id, if the URI addresses exactly one record.
    #[inline]
    pub fn record_id(&self) -> Option<u16> {
        match (self.object_id, self.instance_id, self.resource_id) {
            (Some(id), None, None) => Some(id),
            _ => None,
        }
    }
}

fn parse_segment(segment: &str) -> Result<u16> {
    segment
        .parse::<u16>()
        .ok()
        .filter(|&id| id <= MAX_ID)
        .ok_or_else(|| RegistrationError::BadRequest(format!("invalid id segment {:?}", segment)))
}

/// Extract the endpoint name from the query options.
///
/// The first `ep=` option with a non-empty value wins.
pub fn endpoint_name(queries: &[String]) -> Option<&str> {
    queries
        .iter()
        .filter(|q| q.len() > ENDPOINT_QUERY.len())
        .find_map(|q| q.strip_prefix(ENDPOINT_QUERY))
}

/// Render the location path of a record (`/rd/<id>`).
///
/// Fails with a server error if the rendering does not fit the location
/// buffer.
pub fn render_location(id: u16) -> Result<String> {
    format_location(REGISTRATION_SEGMENT, id, MAX_LOCATION_LENGTH)
}

fn format_location(segment: &str, id: u16, max: usize) -> Result<String> {
    let location = format!("/{}/{}", segment, id);
    if location.is_empty() || location.len() >= max {
        return Err(RegistrationError::ServerError(format!(
            "location {:?} does not fit {} bytes",
            location, max
        )));
    }
    Ok(location)
}

//! Link-format codec for registration payloads.
//!
//! Implements the subset of CoRE Link Format (RFC 6690) used to announce
//! a client's objects and object instances:
//!
//! ```text
//! </1/0>,</3>,</4/0>,</4/1>
//! ```
//!
//! Each entry is `<path>` where `path` is `/<objectId>` or
//! `/<objectId>/<instanceId>`. Text after a space inside the brackets is
//! attribute text and is ignored.
//!
//! # Example
//!
//! ```
//! use m2m_registration::codec::LinkFormatCodec;
//!
//! let tree = LinkFormatCodec::decode(b"</3>,</4/0>,</4/1>,</1/0>").unwrap();
//! assert_eq!(tree.len(), 3);
//! assert_eq!(LinkFormatCodec::encode(&tree), "</1/0>,</3>,</4/0>,</4/1>");
//! ```

use thiserror::Error;

use crate::objects::{ObjectTree, MAX_ID};

/// Maximum size of an outbound registration payload in bytes.
pub const MAX_REGISTER_PAYLOAD: usize = 512;

/// Errors produced by the link-format codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// No entry yielded a valid object id.
    #[error("payload contains no object")]
    Empty,

    /// Encoded payload does not fit the outbound bound.
    #[error("payload of {len} bytes exceeds maximum {max}")]
    TooLarge { len: usize, max: usize },
}

/// Codec for the registration object list.
pub struct LinkFormatCodec;

impl LinkFormatCodec {
    /// Decode a registration payload into an object tree.
    ///
    /// Malformed entries are skipped. Fails with [`ParseError::Empty`] only
    /// when no entry produced an object.
    pub fn decode(payload: &[u8]) -> Result<ObjectTree, ParseError> {
        let mut tree = ObjectTree::new();

        for raw in payload.split(|&b| b == b',') {
            let entry = trim_spaces(raw);
            if entry.is_empty() {
                continue;
            }

            match parse_entry(entry) {
                Some((object, Some(instance))) => {
                    tree.insert_instance(object, instance);
                }
                Some((object, None)) => {
                    tree.insert_object(object);
                }
                None => {
                    tracing::trace!(
                        "Skipping malformed link entry {:?}",
                        String::from_utf8_lossy(entry)
                    );
                }
            }
        }

        if tree.is_empty() {
            return Err(ParseError::Empty);
        }
        Ok(tree)
    }

    /// Encode an object tree as a link-format list.
    ///
    /// Objects without instances render as `</id>`, others as one
    /// `</id/instance>` per instance. Ordering is ascending.
    pub fn encode(tree: &ObjectTree) -> String {
        let mut links: Vec<String> = Vec::with_capacity(tree.len());

        for entry in tree.iter() {
            if entry.instances().is_empty() {
                links.push(format!("</{}>", entry.id()));
            } else {
                for instance in entry.instances() {
                    links.push(format!("</{}/{}>", entry.id(), instance));
                }
            }
        }

        links.join(",")
    }

    /// Encode a tree for an outbound registration request.
    ///
    /// Fails if the tree is empty or the result exceeds `max` bytes.
    pub fn encode_bounded(tree: &ObjectTree, max: usize) -> Result<String, ParseError> {
        if tree.is_empty() {
            return Err(ParseError::Empty);
        }

        let payload = Self::encode(tree);
        if payload.len() > max {
            return Err(ParseError::TooLarge {
                len: payload.len(),
                max,
            });
        }
        Ok(payload)
    }
}

fn trim_spaces(mut data: &[u8]) -> &[u8] {
    while let [b' ', rest @ ..] = data {
        data = rest;
    }
    while let [rest @ .., b' '] = data {
        data = rest;
    }
    data
}

/// Parse one `<...>` entry into an object id and optional instance id.
fn parse_entry(entry: &[u8]) -> Option<(u16, Option<u16>)> {
    let inner = entry.strip_prefix(b"<")?.strip_suffix(b">")?;
    let inner = inner.strip_prefix(b"/").unwrap_or(inner);

    let object_end = inner
        .iter()
        .position(|&b| b == b'/' || b == b' ')
        .unwrap_or(inner.len());
    let object = parse_id(&inner[..object_end])?;

    let instance = match inner.get(object_end) {
        Some(b'/') => {
            let rest = &inner[object_end + 1..];
            let end = rest.iter().position(|&b| b == b' ').unwrap_or(rest.len());
            parse_id(&rest[..end])
        }
        _ => None,
    };

    Some((object, instance))
}

/// Parse a run of ASCII digits into an id in `0..=MAX_ID`.
fn parse_id(digits: &[u8]) -> Option<u16> {
    if digits.is_empty() {
        return None;
    }

    let mut value: u16 = 0;
    for &b in digits {
        if !b.is_ascii_digit() {
            return None;
        }
        value = value.checked_mul(10)?.checked_add(u16::from(b - b'0'))?;
    }

    (value <= MAX_ID).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::ObjectEntry;

    #[test]
    fn test_decode_mixed_payload() {
        let tree = LinkFormatCodec::decode(b"</3>,</4/0>,</4/1>,</1/0>").unwrap();

        assert_eq!(tree.len(), 3);
        assert!(tree.get(3).unwrap().instances().is_empty());
        assert_eq!(
            tree.get(4).unwrap().instances().iter().copied().collect::<Vec<_>>(),
            vec![0, 1]
        );
        assert!(tree.get(1).unwrap().has_instance(0));
    }

    #[test]
    fn test_decode_missing_open_bracket_rejected() {
        assert_eq!(LinkFormatCodec::decode(b"1/0>"), Err(ParseError::Empty));
    }

    #[test]
    fn test_decode_leading_slash_optional() {
        let tree = LinkFormatCodec::decode(b"<1/0>").unwrap();
        assert!(tree.get(1).unwrap().has_instance(0));
    }

    #[test]
    fn test_decode_empty_payload() {
        assert_eq!(LinkFormatCodec::decode(b""), Err(ParseError::Empty));
        assert_eq!(LinkFormatCodec::decode(b"   "), Err(ParseError::Empty));
        assert_eq!(LinkFormatCodec::decode(b",,,"), Err(ParseError::Empty));
    }

    #[test]
    fn test_decode_only_garbage() {
        assert_eq!(
            LinkFormatCodec::decode(b"</abc>,<>,</>,<,>,hello"),
            Err(ParseError::Empty)
        );
    }

    #[test]
    fn test_decode_skips_bad_entries_keeps_good() {
        let tree = LinkFormatCodec::decode(b"garbage,</2/0>,</x/1>").unwrap();
        assert_eq!(tree.len(), 1);
        assert!(tree.get(2).unwrap().has_instance(0));
    }

    #[test]
    fn test_decode_tolerates_spaces() {
        let tree = LinkFormatCodec::decode(b"  </1/0> ,   </3>  ").unwrap();
        assert!(tree.get(1).unwrap().has_instance(0));
        assert!(tree.contains(3));
    }

    #[test]
    fn test_decode_ignores_attribute_text() {
        let tree = LinkFormatCodec::decode(b"</1/0 ct=11543>,</3 rt=\"oma\">").unwrap();
        assert!(tree.get(1).unwrap().has_instance(0));
        assert!(tree.get(3).unwrap().instances().is_empty());
    }

    #[test]
    fn test_decode_invalid_instance_keeps_object() {
        let tree = LinkFormatCodec::decode(b"</5/abc>,</6/>").unwrap();
        assert!(tree.get(5).unwrap().instances().is_empty());
        assert!(tree.get(6).unwrap().instances().is_empty());
    }

    #[test]
    fn test_decode_id_bounds() {
        let tree = LinkFormatCodec::decode(b"</65534/65534>").unwrap();
        assert!(tree.get(65534).unwrap().has_instance(65534));

        assert_eq!(LinkFormatCodec::decode(b"</65535>"), Err(ParseError::Empty));

        let tree = LinkFormatCodec::decode(b"</7/65535>").unwrap();
        assert!(tree.get(7).unwrap().instances().is_empty());
    }

    #[test]
    fn test_decode_overflow_not_wrapped() {
        // 65536 + 3 would wrap to 3 in 16 bits
        assert_eq!(LinkFormatCodec::decode(b"</65539>"), Err(ParseError::Empty));
        assert_eq!(
            LinkFormatCodec::decode(b"</99999999999999999999>"),
            Err(ParseError::Empty)
        );
    }

    #[test]
    fn test_decode_duplicate_instance_is_noop() {
        let tree = LinkFormatCodec::decode(b"</4/1>,</4/1>,</4>").unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get(4).unwrap().instances().len(), 1);
    }

    #[test]
    fn test_decode_entry_without_closing_bracket() {
        assert_eq!(LinkFormatCodec::decode(b"</1/0"), Err(ParseError::Empty));
    }

    #[test]
    fn test_encode_ordering() {
        let tree: ObjectTree = vec![
            ObjectEntry::with_instances(4, [1, 0]),
            ObjectEntry::new(3),
            ObjectEntry::with_instances(1, [0]),
        ]
        .into_iter()
        .collect();

        assert_eq!(LinkFormatCodec::encode(&tree), "</1/0>,</3>,</4/0>,</4/1>");
    }

    #[test]
    fn test_encode_bounded_empty_tree() {
        assert_eq!(
            LinkFormatCodec::encode_bounded(&ObjectTree::new(), MAX_REGISTER_PAYLOAD),
            Err(ParseError::Empty)
        );
    }

    #[test]
    fn test_encode_bounded_too_large() {
        let tree: ObjectTree = (0..200).map(ObjectEntry::new).collect();
        let result = LinkFormatCodec::encode_bounded(&tree, MAX_REGISTER_PAYLOAD);

        assert!(matches!(result, Err(ParseError::TooLarge { max: 512, .. })));
    }

    #[test]
    fn test_encoded_payload_decodes_to_same_tree() {
        let tree: ObjectTree = vec![ObjectEntry::with_instances(1, [0]), ObjectEntry::new(3)]
            .into_iter()
            .collect();
        let payload = LinkFormatCodec::encode_bounded(&tree, MAX_REGISTER_PAYLOAD).unwrap();

        assert_eq!(LinkFormatCodec::decode(payload.as_bytes()).unwrap(), tree);
    }
}

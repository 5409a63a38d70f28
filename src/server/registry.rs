//! Client registry for the server role.
//!
//! The registry owns every [`ClientRecord`] and the id allocator. Records
//! are keyed by a server-assigned [`ClientId`] and indexed by the
//! client-supplied endpoint name. Ids come from a monotonic counter that
//! skips ids still held by live records.
//!
//! # Example
//!
//! ```
//! use m2m_registration::objects::ObjectTree;
//! use m2m_registration::server::ClientRegistry;
//! use m2m_registration::transport::SessionHandle;
//!
//! let mut registry = ClientRegistry::new();
//!
//! let mut tree = ObjectTree::new();
//! tree.insert_object(3);
//!
//! let (record, is_new) = registry.upsert("node-1", tree, SessionHandle(1)).unwrap();
//! assert!(is_new);
//! assert_eq!(record.id().0, 0);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::error::{RegistrationError, Result};
use crate::objects::{ObjectTree, MAX_ID};
use crate::transport::SessionHandle;

/// Server-assigned client identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u16);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client#{}", self.0)
    }
}

/// An active observation on one of the client's resources.
///
/// Opaque to the registration logic; kept so the record can drop it when
/// the object tree it refers to is replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    /// Token identifying the subscription.
    pub token: u64,
    /// Observed path (e.g. `/3/0/1`).
    pub path: String,
}

/// A registered client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientRecord {
    id: ClientId,
    name: String,
    objects: ObjectTree,
    session: SessionHandle,
    observations: Vec<Observation>,
}

impl ClientRecord {
    fn new(id: ClientId, name: &str, objects: ObjectTree, session: SessionHandle) -> Self {
        Self {
            id,
            name: name.to_string(),
            objects,
            session,
            observations: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Endpoint name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Announced object tree.
    #[inline]
    pub fn objects(&self) -> &ObjectTree {
        &self.objects
    }

    /// Session the client registered from.
    #[inline]
    pub fn session(&self) -> SessionHandle {
        self.session
    }

    #[inline]
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn add_observation(&mut self, observation: Observation) {
        self.observations.push(observation);
    }

    /// Remove an observation by token.
    pub fn remove_observation(&mut self, token: u64) -> Option<Observation> {
        let index = self.observations.iter().position(|o| o.token == token)?;
        Some(self.observations.remove(index))
    }

    /// Replace the registration in place.
    ///
    /// Observations refer to the old tree and are dropped with it.
    fn replace(&mut self, objects: ObjectTree, session: SessionHandle) {
        self.objects = objects;
        self.session = session;
        self.observations.clear();
    }
}

/// Registry of active clients.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    /// Records by id.
    clients: BTreeMap<ClientId, ClientRecord>,
    /// Endpoint name to id mapping.
    by_name: HashMap<String, ClientId>,
    /// Next id to try.
    next_id: u16,
}

impl ClientRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered clients.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Get a record by id.
    pub fn get(&self, id: ClientId) -> Option<&ClientRecord> {
        self.clients.get(&id)
    }

    /// Get a mutable record by id.
    pub fn get_mut(&mut self, id: ClientId) -> Option<&mut ClientRecord> {
        self.clients.get_mut(&id)
    }

    /// Find a record by endpoint name (exact match).
    pub fn find_by_name(&self, name: &str) -> Option<&ClientRecord> {
        self.by_name.get(name).and_then(|id| self.clients.get(id))
    }

    /// Iterate over records in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &ClientRecord> {
        self.clients.values()
    }

    /// Id an [`upsert`](Self::upsert) of `name` would use, without mutating.
    pub fn next_id_for(&self, name: &str) -> Result<ClientId> {
        match self.by_name.get(name) {
            Some(&id) => Ok(id),
            None => self.peek_free_id(),
        }
    }

    /// Insert a new record or replace the one registered under `name`.
    ///
    /// A replaced record keeps its id; its object tree and session are
    /// swapped and its observations cleared. Returns the record and whether
    /// it was newly created.
    pub fn upsert(
        &mut self,
        name: &str,
        objects: ObjectTree,
        session: SessionHandle,
    ) -> Result<(&mut ClientRecord, bool)> {
        if let Some(&id) = self.by_name.get(name) {
            let record = self.clients.get_mut(&id).ok_or_else(|| {
                RegistrationError::ServerError(format!("name index points at missing {}", id))
            })?;
            record.replace(objects, session);
            return Ok((record, false));
        }

        let id = self.peek_free_id()?;
        self.next_id = id.0.checked_add(1).filter(|&n| n <= MAX_ID).unwrap_or(0);
        self.by_name.insert(name.to_string(), id);

        let record = self
            .clients
            .entry(id)
            .or_insert_with(|| ClientRecord::new(id, name, objects, session));
        Ok((record, true))
    }

    /// Remove a record by id.
    pub fn remove_by_id(&mut self, id: ClientId) -> Option<ClientRecord> {
        let record = self.clients.remove(&id)?;
        self.by_name.remove(&record.name);
        Some(record)
    }

    /// First id at or after the counter not held by a live record.
    fn peek_free_id(&self) -> Result<ClientId> {
        let span = u32::from(MAX_ID) + 1;
        (0..span)
            .map(|offset| ((u32::from(self.next_id) + offset) % span) as u16)
            .map(ClientId)
            .find(|id| !self.clients.contains_key(id))
            .ok_or_else(|| RegistrationError::ServerError("client ids exhausted".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(ids: &[u16]) -> ObjectTree {
        let mut tree = ObjectTree::new();
        for &id in ids {
            tree.insert_object(id);
        }
        tree
    }

    #[test]
    fn test_upsert_new_records() {
        let mut registry = ClientRegistry::new();

        let (a, is_new) = registry.upsert("a", tree(&[1]), SessionHandle(1)).unwrap();
        assert!(is_new);
        assert_eq!(a.id(), ClientId(0));

        let (b, is_new) = registry.upsert("b", tree(&[1]), SessionHandle(2)).unwrap();
        assert!(is_new);
        assert_eq!(b.id(), ClientId(1));

        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_id_exhaustion() {
        let mut registry = ClientRegistry::new();
        for n in 0..=MAX_ID {
            registry
                .upsert(&format!("c{}", n), tree(&[3]), SessionHandle(1))
                .unwrap();
        }
        assert_eq!(registry.len(), usize::from(MAX_ID) + 1);

        assert!(matches!(
            registry.next_id_for("extra"),
            Err(RegistrationError::ServerError(_))
        ));
        assert!(matches!(
            registry.upsert("extra", tree(&[3]), SessionHandle(2)),
            Err(RegistrationError::ServerError(_))
        ));
        assert!(registry.find_by_name("extra").is_none());
        assert_eq!(registry.len(), usize::from(MAX_ID) + 1);

        // Known names still re-register
        let (record, is_new) = registry.upsert("c7", tree(&[4]), SessionHandle(3)).unwrap();
        assert!(!is_new);
        assert_eq!(record.id(), ClientId(7));

        // A freed id is handed out again
        registry.remove_by_id(ClientId(100)).unwrap();
        let (record, is_new) = registry.upsert("extra", tree(&[3]), SessionHandle(2)).unwrap();
        assert!(is_new);
        assert_eq!(record.id(), ClientId(100));
    }

    #[test]
    fn test_reregistration_replaces_in_place() {
        let mut registry = ClientRegistry::new();
        registry.upsert("a", tree(&[1, 3]), SessionHandle(1)).unwrap();

        let (record, is_new) = registry.upsert("a", tree(&[5]), SessionHandle(9)).unwrap();
        assert!(!is_new);
        assert_eq!(record.id(), ClientId(0));
        assert_eq!(record.session(), SessionHandle(9));
        assert!(record.objects().contains(5));
        assert!(!record.objects().contains(1));

        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_reregistration_clears_observations() {
        let mut registry = ClientRegistry::new();
        let (record, _) = registry.upsert("a", tree(&[3]), SessionHandle(1)).unwrap();
        record.add_observation(Observation {
            token: 42,
            path: "/3/0/1".to_string(),
        });
        assert_eq!(registry.get(ClientId(0)).unwrap().observations().len(), 1);

        registry.upsert("a", tree(&[3]), SessionHandle(1)).unwrap();
        assert!(registry.get(ClientId(0)).unwrap().observations().is_empty());
    }

    #[test]
    fn test_remove_observation() {
        let mut registry = ClientRegistry::new();
        let (record, _) = registry.upsert("a", tree(&[3]), SessionHandle(1)).unwrap();
        record.add_observation(Observation {
            token: 1,
            path: "/3/0".to_string(),
        });

        let record = registry.get_mut(ClientId(0)).unwrap();
        assert_eq!(record.remove_observation(1).unwrap().path, "/3/0");
        assert!(record.remove_observation(1).is_none());
    }

    #[test]
    fn test_remove_keeps_others() {
        let mut registry = ClientRegistry::new();
        registry.upsert("a", tree(&[1]), SessionHandle(1)).unwrap();
        registry.upsert("b", tree(&[2]), SessionHandle(2)).unwrap();

        let removed = registry.remove_by_id(ClientId(0)).unwrap();
        assert_eq!(removed.name(), "a");

        assert!(registry.find_by_name("a").is_none());
        assert!(registry.get(ClientId(0)).is_none());
        assert_eq!(registry.find_by_name("b").unwrap().id(), ClientId(1));
        assert_eq!(registry.get(ClientId(1)).unwrap().name(), "b");

        assert!(registry.remove_by_id(ClientId(0)).is_none());
    }

    #[test]
    fn test_ids_are_monotonic() {
        let mut registry = ClientRegistry::new();
        registry.upsert("a", tree(&[1]), SessionHandle(1)).unwrap();
        registry.upsert("b", tree(&[1]), SessionHandle(1)).unwrap();
        registry.remove_by_id(ClientId(0));

        let (c, _) = registry.upsert("c", tree(&[1]), SessionHandle(1)).unwrap();
        assert_eq!(c.id(), ClientId(2));
    }

    #[test]
    fn test_name_reusable_after_removal() {
        let mut registry = ClientRegistry::new();
        registry.upsert("a", tree(&[1]), SessionHandle(1)).unwrap();
        registry.remove_by_id(ClientId(0));

        let (record, is_new) = registry.upsert("a", tree(&[1]), SessionHandle(1)).unwrap();
        assert!(is_new);
        assert_eq!(record.id(), ClientId(1));
    }

    #[test]
    fn test_counter_wraps_and_skips_live_ids() {
        let mut registry = ClientRegistry::new();
        registry.upsert("first", tree(&[1]), SessionHandle(1)).unwrap();
        registry.next_id = MAX_ID;

        let (last, _) = registry.upsert("last", tree(&[1]), SessionHandle(1)).unwrap();
        assert_eq!(last.id(), ClientId(MAX_ID));

        // Wraps to 0, which is still held by "first"
        let (wrapped, _) = registry.upsert("wrapped", tree(&[1]), SessionHandle(1)).unwrap();
        assert_eq!(wrapped.id(), ClientId(1));
    }

    #[test]
    fn test_next_id_for() {
        let mut registry = ClientRegistry::new();
        assert_eq!(registry.next_id_for("a").unwrap(), ClientId(0));

        registry.upsert("a", tree(&[1]), SessionHandle(1)).unwrap();
        assert_eq!(registry.next_id_for("a").unwrap(), ClientId(0));
        assert_eq!(registry.next_id_for("b").unwrap(), ClientId(1));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_iter_in_id_order() {
        let mut registry = ClientRegistry::new();
        for name in ["x", "y", "z"] {
            registry.upsert(name, tree(&[1]), SessionHandle(1)).unwrap();
        }

        let names: Vec<&str> = registry.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["x", "y", "z"]);
    }
}

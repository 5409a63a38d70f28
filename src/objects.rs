//! Object tree announced by a client at registration.
//!
//! A client exposes a set of objects, each with zero or more instances.
//! Both roles share this model: the client encodes its own tree into the
//! registration payload and the server stores the decoded tree per record.
//!
//! # Example
//!
//! ```
//! use m2m_registration::objects::ObjectTree;
//!
//! let mut tree = ObjectTree::new();
//! tree.insert_instance(1, 0);
//! tree.insert_object(3);
//!
//! assert_eq!(tree.len(), 2);
//! assert!(tree.get(3).unwrap().instances().is_empty());
//! ```

use std::collections::{BTreeMap, BTreeSet};

/// Highest valid object or instance id (65535 is reserved).
pub const MAX_ID: u16 = 65534;

/// One announced object and its instance ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectEntry {
    id: u16,
    instances: BTreeSet<u16>,
}

impl ObjectEntry {
    /// Create an entry with no instances.
    pub fn new(id: u16) -> Self {
        Self {
            id,
            instances: BTreeSet::new(),
        }
    }

    /// Create an entry from an iterator of instance ids.
    pub fn with_instances(id: u16, instances: impl IntoIterator<Item = u16>) -> Self {
        Self {
            id,
            instances: instances.into_iter().collect(),
        }
    }

    #[inline]
    pub fn id(&self) -> u16 {
        self.id
    }

    /// Instance ids in ascending order.
    #[inline]
    pub fn instances(&self) -> &BTreeSet<u16> {
        &self.instances
    }

    /// Check whether an instance is present.
    pub fn has_instance(&self, instance: u16) -> bool {
        self.instances.contains(&instance)
    }

    /// Add an instance. Returns `false` if it was already present.
    pub fn insert_instance(&mut self, instance: u16) -> bool {
        self.instances.insert(instance)
    }
}

/// Ordered-by-id set of object entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectTree {
    objects: BTreeMap<u16, ObjectEntry>,
}

impl ObjectTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure an object exists. Existing entries are left untouched.
    pub fn insert_object(&mut self, id: u16) -> &mut ObjectEntry {
        self.objects.entry(id).or_insert_with(|| ObjectEntry::new(id))
    }

    /// Add an instance, creating the object entry if needed.
    ///
    /// Returns `false` if the instance was already present.
    pub fn insert_instance(&mut self, id: u16, instance: u16) -> bool {
        self.insert_object(id).insert_instance(instance)
    }

    /// Insert a whole entry, merging instances into an existing one.
    pub fn insert_entry(&mut self, entry: ObjectEntry) {
        let target = self.insert_object(entry.id);
        target.instances.extend(entry.instances);
    }

    /// Get an object by id.
    pub fn get(&self, id: u16) -> Option<&ObjectEntry> {
        self.objects.get(&id)
    }

    /// Check whether an object is present.
    pub fn contains(&self, id: u16) -> bool {
        self.objects.contains_key(&id)
    }

    /// Number of objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Iterate over entries in ascending object id order.
    pub fn iter(&self) -> impl Iterator<Item = &ObjectEntry> {
        self.objects.values()
    }
}

impl FromIterator<ObjectEntry> for ObjectTree {
    fn from_iter<I: IntoIterator<Item = ObjectEntry>>(iter: I) -> Self {
        let mut tree = ObjectTree::new();
        for entry in iter {
            tree.insert_entry(entry);
        }
        tree
    }
}

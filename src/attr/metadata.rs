//! Attribute metadata lookup.
//!
//! The codec never guesses a value's shape from its payload; the kind for
//! every `(object type, attribute id)` pair comes from a metadata table
//! owned by whoever embeds the codec. [`MetadataLookup`] is that seam;
//! [`AttrRegistry`] is the plain table implementation the bundled server
//! and the tests use.
use std::collections::HashMap;

use super::{AttrId, ObjectType, ValueKind};

/// Resolves the value kind for an attribute, or reports it unknown.
pub trait MetadataLookup {
    fn value_kind(&self, object_type: ObjectType, id: AttrId) -> Option<ValueKind>;
}

/// An in-memory `(object type, attribute id) -> kind` table.
#[derive(Debug, Default, Clone)]
pub struct AttrRegistry {
    entries: HashMap<(ObjectType, AttrId), ValueKind>,
}

impl AttrRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a kind, replacing any previous entry for the pair.
    pub fn register(&mut self, object_type: ObjectType, id: AttrId, kind: ValueKind) -> &mut Self {
        self.entries.insert((object_type, id), kind);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MetadataLookup for AttrRegistry {
    fn value_kind(&self, object_type: ObjectType, id: AttrId) -> Option<ValueKind> {
        self.entries.get(&(object_type, id)).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_hits_and_misses() {
        let mut registry = AttrRegistry::new();
        registry.register(1, 10, ValueKind::Bool);
        registry.register(1, 11, ValueKind::ObjectList);

        assert_eq!(registry.value_kind(1, 10), Some(ValueKind::Bool));
        assert_eq!(registry.value_kind(1, 11), Some(ValueKind::ObjectList));
        assert_eq!(registry.value_kind(1, 12), None);
        assert_eq!(registry.value_kind(2, 10), None);
    }

    #[test]
    fn register_replaces() {
        let mut registry = AttrRegistry::new();
        registry.register(3, 1, ValueKind::U8).register(3, 1, ValueKind::U32);
        assert_eq!(registry.value_kind(3, 1), Some(ValueKind::U32));
        assert_eq!(registry.len(), 1);
    }
}

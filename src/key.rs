//! Cache regions and key construction.

use crate::entity::EntityKind;
use std::fmt::{self, Display};

/// Result cardinality a region holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// One representation per key.
    Single,
    /// Lists and pages, keyed by query shape.
    Collection,
}

/// Named partition of the cache scoped to one entity type and one cardinality.
///
/// Any write to an entity type must invalidate both of its regions, since a
/// single-item change can affect previously cached lists and pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheRegion {
    pub kind: EntityKind,
    pub cardinality: Cardinality,
}

impl CacheRegion {
    pub fn single(kind: EntityKind) -> Self {
        CacheRegion {
            kind,
            cardinality: Cardinality::Single,
        }
    }

    pub fn collection(kind: EntityKind) -> Self {
        CacheRegion {
            kind,
            cardinality: Cardinality::Collection,
        }
    }

    /// Both regions of an entity type.
    pub fn both(kind: EntityKind) -> [CacheRegion; 2] {
        [CacheRegion::single(kind), CacheRegion::collection(kind)]
    }

    /// Region name as seen by the backend.
    pub fn name(&self) -> &'static str {
        match (self.kind, self.cardinality) {
            (EntityKind::Task, Cardinality::Single) => "cacheOneTask",
            (EntityKind::Task, Cardinality::Collection) => "cacheManyTasks",
            (EntityKind::Person, Cardinality::Single) => "cacheOnePerson",
            (EntityKind::Person, Cardinality::Collection) => "cacheManyPersons",
        }
    }
}

impl Display for CacheRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Builder for cache keys within a region.
pub struct CacheKeyBuilder;

impl CacheKeyBuilder {
    /// Key of a single entity looked up by identifier.
    pub fn for_id(id: &dyn Display) -> String {
        format!("id:{}", id)
    }

    /// Key of a single entity looked up by another attribute.
    pub fn for_lookup(attribute: &str, value: &dyn Display) -> String {
        format!("{}:{}", attribute, value)
    }

    /// Build composite key from multiple parts.
    ///
    /// Used for collection results: every query parameter that changes the
    /// result must be one of the parts.
    pub fn build_composite(parts: &[&str]) -> String {
        parts.join(":")
    }

    /// Parse a composite key into parts.
    pub fn parse(key: &str) -> Vec<&str> {
        key.split(':').collect()
    }
}

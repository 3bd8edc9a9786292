//! Core entity trait that every stored record implements.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::hash::Hash;

/// Tag naming the entity type a value belongs to.
///
/// Carried as plain data by sort fields and cache regions so that a
/// mismatch can be detected with an equality comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Task,
    Person,
}

impl EntityKind {
    /// Upper-case label used in error messages, e.g. `TASK_ID_NOT_FOUND`.
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Task => "TASK",
            EntityKind::Person => "PERSON",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Task => write!(f, "Task"),
            EntityKind::Person => write!(f, "Person"),
        }
    }
}

/// Trait that all storage-layer records implement.
///
/// Services treat entities as opaque apart from the identifier, which they
/// may overwrite when updating.
///
/// # Example
///
/// ```
/// use taskhub::entity::{Entity, EntityKind};
///
/// #[derive(Clone)]
/// pub struct Note {
///     pub id: Option<u64>,
///     pub text: String,
/// }
///
/// impl Entity for Note {
///     type Id = u64;
///
///     fn id(&self) -> Option<u64> {
///         self.id
///     }
///
///     fn set_id(&mut self, id: u64) {
///         self.id = Some(id);
///     }
///
///     fn kind() -> EntityKind {
///         EntityKind::Task
///     }
/// }
/// ```
pub trait Entity: Send + Sync + Clone + 'static {
    /// Type of the entity's identifier.
    type Id: Display + Clone + Send + Sync + Eq + Hash + 'static;

    /// Identifier, `None` until the store has assigned one.
    fn id(&self) -> Option<Self::Id>;

    /// Overwrite the identifier.
    fn set_id(&mut self, id: Self::Id);

    /// Entity type tag for this record type.
    fn kind() -> EntityKind;

    /// Business defaults applied right before a new record is persisted.
    fn on_create(&mut self) {}
}

//! Concrete entities, their representations and mappers.

pub mod person;
pub mod task;

pub use person::{
    Address, Gender, Person, PersonDto, PersonMapper, PersonStore, Role, UserAccess,
    UserAccessDto,
};
pub use task::{Task, TaskDto, TaskMapper, TaskStatus, TaskStore};

use crate::error::{Error, Result};

/// Overwrite `target` when the representation carries a value.
pub(crate) fn merge_field<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *target = value.clone();
    }
}

/// Value of a field that the entity cannot exist without.
pub(crate) fn required<T: Clone>(value: &Option<T>, field: &str) -> Result<T> {
    value
        .clone()
        .ok_or_else(|| Error::MappingError(format!("missing required field '{}'", field)))
}

/// Case-insensitive substring test used by the filter queries.
pub(crate) fn contains_ignore_case(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

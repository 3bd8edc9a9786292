//! Sort field registry.
//!
//! Field names are plain strings at the store boundary, so nothing in the
//! type system stops a caller from sorting persons by a task column. Every
//! [`SortField`] therefore carries the [`EntityKind`] it belongs to, and
//! [`validate_sort_field`] checks it against the entity type being queried
//! before any query runs.
//!
//! ```
//! use taskhub::entity::EntityKind;
//! use taskhub::sort::{validate_sort_field, SortField};
//!
//! assert!(validate_sort_field(Some(SortField::TaskTitle), EntityKind::Task).is_ok());
//! assert!(validate_sort_field(Some(SortField::TaskTitle), EntityKind::Person).is_err());
//! assert!(validate_sort_field(None, EntityKind::Task).is_err());
//! ```

use crate::entity::EntityKind;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Message used for every rejected sort request.
pub const SORT_FIELD_NOT_FOUND: &str = "ENTITY_SORT_BY_NOT_FOUND";

/// Sortable attribute of a task or a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortField {
    TaskTitle,
    TaskDescription,
    TaskStatus,
    TaskIsCompleted,
    TaskPriority,
    TaskDateOfCreation,
    TaskDateOfFinished,
    PersonFirstName,
    PersonLastName,
    PersonDni,
    PersonEmail,
    PersonGender,
    PersonDateOfBirth,
    PersonImportant,
}

impl SortField {
    /// Every registered field.
    pub const ALL: [SortField; 14] = [
        SortField::TaskTitle,
        SortField::TaskDescription,
        SortField::TaskStatus,
        SortField::TaskIsCompleted,
        SortField::TaskPriority,
        SortField::TaskDateOfCreation,
        SortField::TaskDateOfFinished,
        SortField::PersonFirstName,
        SortField::PersonLastName,
        SortField::PersonDni,
        SortField::PersonEmail,
        SortField::PersonGender,
        SortField::PersonDateOfBirth,
        SortField::PersonImportant,
    ];

    /// Literal field name used by the store.
    pub fn field_name(&self) -> &'static str {
        match self {
            SortField::TaskTitle => "title",
            SortField::TaskDescription => "description",
            SortField::TaskStatus => "taskStatus",
            SortField::TaskIsCompleted => "isCompleted",
            SortField::TaskPriority => "priority",
            SortField::TaskDateOfCreation => "taskDateCreation",
            SortField::TaskDateOfFinished => "taskDateFinished",
            SortField::PersonFirstName => "firstName",
            SortField::PersonLastName => "lastName",
            SortField::PersonDni => "dni",
            SortField::PersonEmail => "email",
            SortField::PersonGender => "gender",
            SortField::PersonDateOfBirth => "dateOfBirth",
            SortField::PersonImportant => "important",
        }
    }

    /// Entity type the field is valid for.
    pub fn entity_kind(&self) -> EntityKind {
        match self {
            SortField::TaskTitle
            | SortField::TaskDescription
            | SortField::TaskStatus
            | SortField::TaskIsCompleted
            | SortField::TaskPriority
            | SortField::TaskDateOfCreation
            | SortField::TaskDateOfFinished => EntityKind::Task,
            _ => EntityKind::Person,
        }
    }

    /// Registry name, e.g. `TASK_TITLE`.
    pub fn name(&self) -> &'static str {
        match self {
            SortField::TaskTitle => "TASK_TITLE",
            SortField::TaskDescription => "TASK_DESCRIPTION",
            SortField::TaskStatus => "TASK_STATUS",
            SortField::TaskIsCompleted => "TASK_IS_COMPLETED",
            SortField::TaskPriority => "TASK_PRIORITY",
            SortField::TaskDateOfCreation => "TASK_DATE_OF_CREATION",
            SortField::TaskDateOfFinished => "TASK_DATE_OF_FINISHED",
            SortField::PersonFirstName => "PERSON_FIRST_NAME",
            SortField::PersonLastName => "PERSON_LAST_NAME",
            SortField::PersonDni => "PERSON_DNI",
            SortField::PersonEmail => "PERSON_EMAIL",
            SortField::PersonGender => "PERSON_GENDER",
            SortField::PersonDateOfBirth => "PERSON_DATE_OF_BIRTH",
            SortField::PersonImportant => "PERSON_IMPORTANT",
        }
    }

    /// Fields registered for one entity type.
    pub fn for_kind(kind: EntityKind) -> impl Iterator<Item = SortField> {
        SortField::ALL
            .into_iter()
            .filter(move |field| field.entity_kind() == kind)
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SortField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SortField::ALL
            .into_iter()
            .find(|field| field.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::BadRequest(SORT_FIELD_NOT_FOUND.to_string()))
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(Error::BadRequest(format!("INVALID_SORT_DIRECTION: {}", other))),
        }
    }
}

/// Confirm a caller-selected field is legal for `kind`.
///
/// # Errors
///
/// Returns `Error::BadRequest` when the field is absent, belongs to another
/// entity type, or is not part of the registry.
pub fn validate_sort_field(field: Option<SortField>, kind: EntityKind) -> Result<SortField> {
    let field = field.ok_or_else(|| {
        debug!("Rejected sort request for {}: no field given", kind);
        Error::BadRequest(SORT_FIELD_NOT_FOUND.to_string())
    })?;

    if field.entity_kind() != kind {
        debug!(
            "Rejected sort request for {}: {} belongs to {}",
            kind,
            field,
            field.entity_kind()
        );
        return Err(Error::BadRequest(SORT_FIELD_NOT_FOUND.to_string()));
    }

    if !SortField::ALL.contains(&field) {
        return Err(Error::BadRequest(SORT_FIELD_NOT_FOUND.to_string()));
    }

    Ok(field)
}

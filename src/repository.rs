//! Store port for abstracting persistence.
//!
//! The [`Store`] trait decouples services from a specific database. Any
//! backend with transactional create/read/update/delete and ordered,
//! paged reads can implement it: SQLx, Diesel, an ORM, or the
//! [`InMemoryStore`] provided here for tests and demos.
//!
//! # Error Handling
//!
//! Implementations return `Err` (usually `Error::RepositoryError`) for
//! connectivity problems, unknown sort fields, constraint violations and
//! any other storage failure. Services translate those into
//! `Error::Internal` once, at their boundary.

use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::page::{Page, PageQuery, Sort};
use crate::sort::SortDirection;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering as AtomicOrdering};

/// Persistence port used by entity services.
///
/// Each method is expected to run in its own storage transaction.
#[allow(async_fn_in_trait)]
pub trait Store<E: Entity>: Send + Sync {
    /// Fetch one entity.
    ///
    /// # Returns
    /// - `Ok(Some(entity))` - Entity found
    /// - `Ok(None)` - Entity not found (not an error)
    /// - `Err(e)` - Storage error
    async fn find_by_id(&self, id: &E::Id) -> Result<Option<E>>;

    /// Fetch every entity in storage order.
    async fn find_all(&self) -> Result<Vec<E>>;

    /// Fetch every entity ordered by `sort`.
    ///
    /// # Errors
    /// Returns `Err` if the field is unknown to the store.
    async fn find_all_sorted(&self, sort: &Sort) -> Result<Vec<E>>;

    /// Fetch one page, optionally ordered.
    async fn find_all_paged(&self, query: &PageQuery) -> Result<Page<E>>;

    /// Insert or replace an entity, returning the persisted record.
    ///
    /// Assigns an identifier when the entity has none.
    async fn save(&self, entity: E) -> Result<E>;

    /// Persist a batch in one transaction, preserving input order.
    async fn save_all(&self, entities: Vec<E>) -> Result<Vec<E>>;

    /// Remove an entity. Removing a missing id is not an error here.
    async fn delete_by_id(&self, id: &E::Id) -> Result<()>;

    /// Check existence (optional optimization).
    async fn exists_by_id(&self, id: &E::Id) -> Result<bool> {
        Ok(self.find_by_id(id).await?.is_some())
    }

    /// Count stored entities (optional optimization).
    async fn count(&self) -> Result<u64> {
        Ok(self.find_all().await?.len() as u64)
    }
}

// ============================================================================
// Field access for ordering
// ============================================================================

/// Comparable value of a single entity field.
///
/// Variants are ordered so that `Null` sorts first in ascending order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(v: NaiveDate) -> Self {
        FieldValue::Date(v)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(v: NaiveDateTime) -> Self {
        FieldValue::DateTime(v)
    }
}

/// Lets an in-process store order entities by a store-level field name.
pub trait Sortable {
    /// Value of `field`, or `None` if the entity has no such field.
    fn field_value(&self, field: &str) -> Option<FieldValue>;
}

/// Audit timestamps maintained by the store on every save.
pub trait Audited {
    /// Stamp `now`, keeping the creation stamp of `previous` when present.
    fn audit(&mut self, previous: Option<&Self>, now: DateTime<Utc>);
}

// ============================================================================
// In-Memory Store
// ============================================================================

/// In-memory store with `u64` identifiers.
///
/// Thread-safe; suitable for tests, demos and single-process use where
/// durability is not needed.
///
/// - Identifiers are assigned from a monotonically increasing sequence.
/// - Sorting is stable; ties keep identifier order.
/// - [`InMemoryStore::set_failure`] makes every call fail, to exercise
///   error translation.
/// - [`InMemoryStore::calls`] counts every store call, so tests can tell a
///   cache hit from a store read.
pub struct InMemoryStore<E: Entity<Id = u64>> {
    data: RwLock<BTreeMap<u64, E>>,
    sequence: AtomicU64,
    calls: AtomicUsize,
    failure: Mutex<Option<String>>,
}

impl<E: Entity<Id = u64>> InMemoryStore<E> {
    /// Create a new empty store.
    pub fn new() -> Self {
        InMemoryStore {
            data: RwLock::new(BTreeMap::new()),
            sequence: AtomicU64::new(0),
            calls: AtomicUsize::new(0),
            failure: Mutex::new(None),
        }
    }

    /// Make every subsequent call fail with `message`, or clear with `None`.
    pub fn set_failure(&self, message: Option<&str>) {
        *self.failure.lock() = message.map(str::to_string);
    }

    /// Number of store calls made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(AtomicOrdering::SeqCst)
    }

    /// Number of stored entities.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Remove all entities. The id sequence keeps counting.
    pub fn clear(&self) {
        self.data.write().clear();
    }

    /// All entities matching `predicate`, in identifier order.
    pub fn find_matching<P>(&self, predicate: P) -> Result<Vec<E>>
    where
        P: Fn(&E) -> bool,
    {
        self.enter()?;
        Ok(self
            .data
            .read()
            .values()
            .filter(|e| predicate(e))
            .cloned()
            .collect())
    }

    /// First entity matching `predicate`, in identifier order.
    pub fn find_first_matching<P>(&self, predicate: P) -> Result<Option<E>>
    where
        P: Fn(&E) -> bool,
    {
        self.enter()?;
        Ok(self.data.read().values().find(|e| predicate(e)).cloned())
    }

    fn enter(&self) -> Result<()> {
        self.calls.fetch_add(1, AtomicOrdering::SeqCst);
        match self.failure.lock().as_ref() {
            Some(message) => Err(Error::RepositoryError(message.clone())),
            None => Ok(()),
        }
    }

    fn next_id(&self) -> u64 {
        self.sequence.fetch_add(1, AtomicOrdering::SeqCst) + 1
    }
}

impl<E: Entity<Id = u64> + Sortable + Audited> InMemoryStore<E> {
    fn persist(&self, data: &mut BTreeMap<u64, E>, mut entity: E, now: DateTime<Utc>) -> E {
        let id = match entity.id() {
            Some(id) => {
                // Keep the sequence ahead of caller-chosen ids.
                self.sequence.fetch_max(id, AtomicOrdering::SeqCst);
                id
            }
            None => {
                let id = self.next_id();
                entity.set_id(id);
                id
            }
        };
        entity.audit(data.get(&id), now);
        data.insert(id, entity.clone());
        entity
    }

    /// Order `entities` by `sort` with a stable sort.
    ///
    /// # Errors
    /// Returns `Error::RepositoryError` if the field does not exist on `E`.
    pub fn sort_entities(entities: &mut [E], sort: &Sort) -> Result<()> {
        if let Some(first) = entities.first() {
            if first.field_value(&sort.field).is_none() {
                return Err(Error::RepositoryError(format!(
                    "No property '{}' found for type '{}'",
                    sort.field,
                    E::kind()
                )));
            }
        }

        entities.sort_by(|a, b| {
            let ordering = compare_field(a, b, &sort.field);
            match sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
        Ok(())
    }
}

fn compare_field<E: Sortable>(a: &E, b: &E, field: &str) -> Ordering {
    let left = a.field_value(field).unwrap_or(FieldValue::Null);
    let right = b.field_value(field).unwrap_or(FieldValue::Null);
    left.cmp(&right)
}

impl<E: Entity<Id = u64>> Default for InMemoryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity<Id = u64> + Sortable + Audited> Store<E> for InMemoryStore<E> {
    async fn find_by_id(&self, id: &u64) -> Result<Option<E>> {
        self.enter()?;
        Ok(self.data.read().get(id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<E>> {
        self.enter()?;
        Ok(self.data.read().values().cloned().collect())
    }

    async fn find_all_sorted(&self, sort: &Sort) -> Result<Vec<E>> {
        self.enter()?;
        let mut all: Vec<E> = self.data.read().values().cloned().collect();
        Self::sort_entities(&mut all, sort)?;
        Ok(all)
    }

    async fn find_all_paged(&self, query: &PageQuery) -> Result<Page<E>> {
        self.enter()?;
        let mut all: Vec<E> = self.data.read().values().cloned().collect();
        if let Some(sort) = &query.sort {
            Self::sort_entities(&mut all, sort)?;
        }
        Ok(Page::from_all(all, query.request))
    }

    async fn save(&self, entity: E) -> Result<E> {
        self.enter()?;
        let mut data = self.data.write();
        Ok(self.persist(&mut data, entity, Utc::now()))
    }

    async fn save_all(&self, entities: Vec<E>) -> Result<Vec<E>> {
        self.enter()?;
        let now = Utc::now();
        let mut data = self.data.write();
        Ok(entities
            .into_iter()
            .map(|entity| self.persist(&mut data, entity, now))
            .collect())
    }

    async fn delete_by_id(&self, id: &u64) -> Result<()> {
        self.enter()?;
        self.data.write().remove(id);
        Ok(())
    }

    async fn exists_by_id(&self, id: &u64) -> Result<bool> {
        self.enter()?;
        Ok(self.data.read().contains_key(id))
    }

    async fn count(&self) -> Result<u64> {
        self.enter()?;
        Ok(self.data.read().len() as u64)
    }
}

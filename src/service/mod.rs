//! Entity services: CRUD, sorting and paging with cache-aside reads.
//!
//! A [`GenericEntityService`] is assembled from three parts injected at
//! construction: a [`Store`] for persistence, a [`Mapper`] for the
//! API-facing representation and a [`CacheService`] for the two cache
//! regions of the entity type.
//!
//! Reads go through the cache. Every write runs against the store first
//! and then invalidates both regions of the entity type before returning.
//! Lower-layer failures are translated into [`Error::Internal`] exactly
//! once, on the way out of the service.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use taskhub::backend::InMemoryBackend;
//! use taskhub::cache::CacheService;
//! use taskhub::model::{TaskDto, TaskMapper};
//! use taskhub::repository::InMemoryStore;
//! use taskhub::service::{EntityService, TaskService};
//!
//! # async fn demo() -> taskhub::Result<()> {
//! let tasks: TaskService<_, _> = TaskService::new(
//!     Arc::new(InMemoryStore::new()),
//!     TaskMapper,
//!     CacheService::new(InMemoryBackend::new()),
//! );
//!
//! let created = tasks.save(&TaskDto::new("t1", "first task")).await?;
//! let id = created.id.unwrap_or_default();
//! assert_eq!(tasks.get_by_id(&id).await?.title.as_deref(), Some("t1"));
//! # Ok(())
//! # }
//! ```

pub mod person;
pub mod task;

pub use person::PersonService;
pub use task::TaskService;

use crate::backend::CacheBackend;
use crate::cache::CacheService;
use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::key::{CacheKeyBuilder, CacheRegion};
use crate::mapper::Mapper;
use crate::page::{Page, PageQuery, PageRequest, Sort};
use crate::repository::Store;
use crate::sort::{validate_sort_field, SortDirection, SortField};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

/// Message used when a batch create receives no input.
pub const LIST_IS_EMPTY: &str = "LIST_IS_EMPTY";

/// Uniform CRUD and query API over one entity type.
///
/// Callers only ever see the representation `R`, never the stored entity.
/// Errors are always one of `NotFound`, `BadRequest` or `Internal`.
#[allow(async_fn_in_trait)]
pub trait EntityService<Id, R> {
    /// Fetch one entity.
    ///
    /// # Errors
    /// `NotFound` if `id` does not exist.
    async fn get_by_id(&self, id: &Id) -> Result<R>;

    /// Every entity, in store order.
    async fn get_all(&self) -> Result<Vec<R>>;

    /// Every entity, ordered by `field`.
    ///
    /// # Errors
    /// `BadRequest` if `field` is missing or belongs to another entity type.
    async fn get_all_sorted(&self, field: Option<SortField>, direction: SortDirection)
        -> Result<Vec<R>>;

    /// One page, in store order.
    async fn get_all_paged(&self, request: PageRequest) -> Result<Page<R>>;

    /// One page, ordered by `field`.
    ///
    /// # Errors
    /// `BadRequest` if `field` is missing or belongs to another entity type.
    async fn get_all_sorted_and_paged(
        &self,
        field: Option<SortField>,
        direction: SortDirection,
        request: PageRequest,
    ) -> Result<Page<R>>;

    /// Create (or overwrite, when it carries an existing identifier) one entity.
    async fn save(&self, representation: &R) -> Result<R>;

    /// Create several entities, returning them in input order.
    ///
    /// # Errors
    /// `BadRequest` if `representations` is empty.
    async fn save_all(&self, representations: &[R]) -> Result<Vec<R>>;

    /// Replace an entity. The result always carries `id`.
    ///
    /// # Errors
    /// `NotFound` if `id` does not exist.
    async fn update(&self, id: &Id, representation: &R) -> Result<R>;

    /// Copy the fields set in `representation` onto the stored entity.
    ///
    /// # Errors
    /// `NotFound` if `id` does not exist.
    async fn patch(&self, id: &Id, representation: &R) -> Result<R>;

    /// # Errors
    /// `NotFound` if `id` does not exist.
    async fn delete_by_id(&self, id: &Id) -> Result<()>;

    /// Number of stored entities. Never cached.
    async fn count(&self) -> Result<u64>;
}

/// [`EntityService`] built from a store, a mapper and a cache.
pub struct GenericEntityService<E, R, S, M, B>
where
    B: CacheBackend,
{
    store: Arc<S>,
    mapper: M,
    cache: CacheService<B>,
    _marker: PhantomData<fn() -> (E, R)>,
}

impl<E, R, S, M, B> Clone for GenericEntityService<E, R, S, M, B>
where
    M: Clone,
    B: CacheBackend,
{
    fn clone(&self) -> Self {
        GenericEntityService {
            store: Arc::clone(&self.store),
            mapper: self.mapper.clone(),
            cache: self.cache.clone(),
            _marker: PhantomData,
        }
    }
}

impl<E, R, S, M, B> GenericEntityService<E, R, S, M, B>
where
    E: Entity,
    R: Serialize + DeserializeOwned,
    S: Store<E>,
    M: Mapper<E, R>,
    B: CacheBackend,
{
    pub fn new(store: Arc<S>, mapper: M, cache: CacheService<B>) -> Self {
        GenericEntityService {
            store,
            mapper,
            cache,
            _marker: PhantomData,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn mapper(&self) -> &M {
        &self.mapper
    }

    pub fn cache(&self) -> &CacheService<B> {
        &self.cache
    }

    pub(crate) fn not_found(&self, id: &E::Id) -> Error {
        Error::NotFound(format!("{}_ID_NOT_FOUND: {}", E::kind().label(), id))
    }

    /// Read through the collection region of this entity type.
    pub(crate) async fn cached_collection<V, F, Fut>(&self, key: &str, compute: F) -> Result<V>
    where
        V: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        self.cache
            .get_or_compute(CacheRegion::collection(E::kind()), key, compute)
            .await
    }

    /// Read through the single-item region of this entity type.
    pub(crate) async fn cached_single<V, F, Fut>(&self, key: &str, compute: F) -> Result<V>
    where
        V: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        self.cache
            .get_or_compute(CacheRegion::single(E::kind()), key, compute)
            .await
    }

    /// Drop both regions of this entity type after a write.
    ///
    /// A failure leaves stale entries until they expire; the write itself
    /// has already succeeded and is reported as such.
    pub(crate) async fn invalidate(&self) {
        if let Err(e) = self.cache.invalidate_kind(E::kind()).await {
            warn!(
                "[Service] Failed to invalidate {} cache (non-critical): {}",
                E::kind(),
                e
            );
        }
    }

    pub(crate) fn represent_all(&self, entities: Vec<E>) -> Result<Vec<R>> {
        self.mapper.to_representations(&entities)
    }

    pub(crate) fn represent_page(&self, page: Page<E>) -> Result<Page<R>> {
        page.try_map(|entity| self.mapper.to_representation(&entity))
    }

    /// Load an entity, apply `change` and persist it under the same identifier.
    ///
    /// Errors are returned untranslated.
    pub(crate) async fn modify<F>(&self, id: &E::Id, change: F) -> Result<R>
    where
        F: FnOnce(&mut E) -> Result<()>,
    {
        let mut entity = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| self.not_found(id))?;
        change(&mut entity)?;
        entity.set_id(id.clone());

        let saved = self.store.save(entity).await?;
        self.invalidate().await;
        info!("[Service] Modified {}: {}", E::kind(), id);
        self.mapper.to_representation(&saved)
    }
}

impl<E, R, S, M, B> EntityService<E::Id, R> for GenericEntityService<E, R, S, M, B>
where
    E: Entity,
    R: Serialize + DeserializeOwned,
    S: Store<E>,
    M: Mapper<E, R>,
    B: CacheBackend,
{
    async fn get_by_id(&self, id: &E::Id) -> Result<R> {
        debug!("[Service] Getting {}: {}", E::kind(), id);
        self.cached_single(&CacheKeyBuilder::for_id(id), || async {
            let entity = self
                .store
                .find_by_id(id)
                .await?
                .ok_or_else(|| self.not_found(id))?;
            self.mapper.to_representation(&entity)
        })
        .await
        .map_err(Error::at_service_boundary)
    }

    async fn get_all(&self) -> Result<Vec<R>> {
        self.cached_collection("all", || async {
            let all = self.store.find_all().await?;
            self.represent_all(all)
        })
        .await
        .map_err(Error::at_service_boundary)
    }

    async fn get_all_sorted(
        &self,
        field: Option<SortField>,
        direction: SortDirection,
    ) -> Result<Vec<R>> {
        let field = validate_sort_field(field, E::kind())?;
        let dir = direction.to_string();
        let key = CacheKeyBuilder::build_composite(&["sorted", field.field_name(), &dir]);

        self.cached_collection(&key, || async {
            let sorted = self.store.find_all_sorted(&Sort::by(field, direction)).await?;
            self.represent_all(sorted)
        })
        .await
        .map_err(Error::at_service_boundary)
    }

    async fn get_all_paged(&self, request: PageRequest) -> Result<Page<R>> {
        let (page, size) = (request.page().to_string(), request.size().to_string());
        let key = CacheKeyBuilder::build_composite(&["paged", &page, &size]);

        self.cached_collection(&key, || async {
            let found = self.store.find_all_paged(&PageQuery::unsorted(request)).await?;
            self.represent_page(found)
        })
        .await
        .map_err(Error::at_service_boundary)
    }

    async fn get_all_sorted_and_paged(
        &self,
        field: Option<SortField>,
        direction: SortDirection,
        request: PageRequest,
    ) -> Result<Page<R>> {
        let field = validate_sort_field(field, E::kind())?;
        let dir = direction.to_string();
        let (page, size) = (request.page().to_string(), request.size().to_string());
        let key = CacheKeyBuilder::build_composite(&[
            "sorted_paged",
            field.field_name(),
            &dir,
            &page,
            &size,
        ]);

        self.cached_collection(&key, || async {
            let query = PageQuery::sorted(field, direction, request);
            let found = self.store.find_all_paged(&query).await?;
            self.represent_page(found)
        })
        .await
        .map_err(Error::at_service_boundary)
    }

    async fn save(&self, representation: &R) -> Result<R> {
        async {
            let mut entity = self.mapper.to_entity(representation)?;
            entity.on_create();

            let saved = self.store.save(entity).await?;
            self.invalidate().await;
            if let Some(id) = saved.id() {
                info!("[Service] Created {}: {}", E::kind(), id);
            }
            self.mapper.to_representation(&saved)
        }
        .await
        .map_err(Error::at_service_boundary)
    }

    async fn save_all(&self, representations: &[R]) -> Result<Vec<R>> {
        if representations.is_empty() {
            return Err(Error::BadRequest(LIST_IS_EMPTY.to_string()));
        }

        async {
            let entities = representations
                .iter()
                .map(|r| {
                    let mut entity = self.mapper.to_entity(r)?;
                    entity.on_create();
                    Ok(entity)
                })
                .collect::<Result<Vec<E>>>()?;

            let saved = self.store.save_all(entities).await?;
            self.invalidate().await;
            info!("[Service] Created {} {} records", saved.len(), E::kind());
            self.represent_all(saved)
        }
        .await
        .map_err(Error::at_service_boundary)
    }

    async fn update(&self, id: &E::Id, representation: &R) -> Result<R> {
        async {
            // Existence check and save are separate store calls; a concurrent
            // delete in between lets the save recreate the row.
            self.store
                .find_by_id(id)
                .await?
                .ok_or_else(|| self.not_found(id))?;

            let mut entity = self.mapper.to_entity(representation)?;
            entity.set_id(id.clone());

            let saved = self.store.save(entity).await?;
            self.invalidate().await;
            info!("[Service] Updated {}: {}", E::kind(), id);
            self.mapper.to_representation(&saved)
        }
        .await
        .map_err(Error::at_service_boundary)
    }

    async fn patch(&self, id: &E::Id, representation: &R) -> Result<R> {
        self.modify(id, |entity| self.mapper.merge_into(representation, entity))
            .await
            .map_err(Error::at_service_boundary)
    }

    async fn delete_by_id(&self, id: &E::Id) -> Result<()> {
        async {
            if !self.store.exists_by_id(id).await? {
                return Err(self.not_found(id));
            }
            self.store.delete_by_id(id).await?;
            self.invalidate().await;
            info!("[Service] Deleted {}: {}", E::kind(), id);
            Ok(())
        }
        .await
        .map_err(Error::at_service_boundary)
    }

    async fn count(&self) -> Result<u64> {
        self.store.count().await.map_err(Error::at_service_boundary)
    }
}

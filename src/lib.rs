//! # taskhub
//!
//! Generic entity-service layer for task and person management.
//!
//! ## Features
//!
//! - **Generic services:** one [`EntityService`] implementation reused for every entity type
//! - **Validated sorting:** sort fields carry their entity type and are checked before any query
//! - **Pagination:** page requests translated into store-level descriptors
//! - **Cache-aside:** named single-item and collection regions, invalidated on every write
//! - **Pluggable ports:** bring your own [`Store`], [`Mapper`] and [`CacheBackend`]
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use taskhub::backend::InMemoryBackend;
//! use taskhub::model::{TaskDto, TaskMapper};
//! use taskhub::repository::InMemoryStore;
//! use taskhub::sort::{SortDirection, SortField};
//! use taskhub::{CacheService, EntityService, TaskService};
//!
//! # async fn demo() -> taskhub::Result<()> {
//! let tasks: TaskService<_, _> = TaskService::new(
//!     Arc::new(InMemoryStore::new()),
//!     TaskMapper,
//!     CacheService::new(InMemoryBackend::new()),
//! );
//!
//! tasks.save(&TaskDto::new("Beta", "second")).await?;
//! tasks.save(&TaskDto::new("Alpha", "first")).await?;
//!
//! let sorted = tasks
//!     .get_all_sorted(Some(SortField::TaskTitle), SortDirection::Asc)
//!     .await?;
//! assert_eq!(sorted[0].title.as_deref(), Some("Alpha"));
//! # Ok(())
//! # }
//! ```
//!
//! Caching can be switched off through configuration without changing any
//! result:
//!
//! ```no_run
//! use taskhub::config::Config;
//! use taskhub::CacheService;
//!
//! # fn main() -> taskhub::Result<()> {
//! let config = Config::from_toml_str("[cache]\nenabled = false\n")?;
//! let cache = CacheService::from_config(&config.cache);
//! assert!(!cache.backend().is_enabled());
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate log;

pub mod backend;
pub mod cache;
pub mod config;
pub mod entity;
pub mod error;
pub mod key;
pub mod mapper;
pub mod model;
pub mod observability;
pub mod page;
pub mod repository;
pub mod serialization;
pub mod service;
pub mod sort;

// Re-exports for convenience
pub use backend::CacheBackend;
pub use cache::CacheService;
pub use entity::{Entity, EntityKind};
pub use error::{Error, ErrorResponse, Result};
pub use mapper::Mapper;
pub use page::{Page, PageRequest};
pub use repository::Store;
pub use service::{EntityService, GenericEntityService, PersonService, TaskService};
pub use sort::{SortDirection, SortField};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

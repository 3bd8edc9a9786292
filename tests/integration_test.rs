//! Integration tests for taskhub
//!
//! These tests drive the task and person services end to end: in-memory
//! store, mapper, region cache and error translation together.

use std::sync::Arc;
use taskhub::backend::{CacheBackend, ConfiguredBackend, InMemoryBackend, NoOpBackend};
use taskhub::config::Config;
use taskhub::key::CacheRegion;
use taskhub::model::{PersonDto, PersonMapper, Task, TaskDto, TaskMapper, TaskStatus};
use taskhub::repository::InMemoryStore;
use taskhub::{
    CacheService, EntityKind, EntityService, Error, PageRequest, PersonService, SortDirection,
    SortField, TaskService,
};

type Tasks<B> = TaskService<InMemoryStore<Task>, B>;

fn tasks_with<B: CacheBackend>(backend: B) -> (Tasks<B>, Arc<InMemoryStore<Task>>) {
    let store = Arc::new(InMemoryStore::new());
    let service = TaskService::new(Arc::clone(&store), TaskMapper, CacheService::new(backend));
    (service, store)
}

fn tasks() -> (Tasks<InMemoryBackend>, Arc<InMemoryStore<Task>>) {
    tasks_with(InMemoryBackend::new())
}

fn titles(list: &[TaskDto]) -> Vec<String> {
    list.iter().filter_map(|t| t.title.clone()).collect()
}

/// Test 1: Create, read, delete
///
/// - created task is readable by id
/// - after deletion the id is NotFound, with the id in the message
#[tokio::test]
async fn test_create_get_delete_flow() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (service, _) = tasks();

    let created = service
        .save(&TaskDto::new("t1", "first task").with_priority(1))
        .await
        .expect("Failed to create task");
    let id = created.id.expect("store assigns an id");

    let fetched = service.get_by_id(&id).await.expect("Failed to get task");
    assert_eq!(fetched.title.as_deref(), Some("t1"));
    assert_eq!(fetched.priority, Some(1));

    service.delete_by_id(&id).await.expect("Failed to delete task");

    match service.get_by_id(&id).await {
        Err(Error::NotFound(msg)) => assert!(msg.contains(&id.to_string())),
        other => panic!("expected NotFound, got {:?}", other),
    }
    match service.delete_by_id(&id).await {
        Err(Error::NotFound(msg)) => assert!(msg.contains(&id.to_string())),
        other => panic!("expected NotFound on second delete, got {:?}", other),
    }
}

/// Test 2: Sorting by title in both directions
#[tokio::test]
async fn test_sorted_by_title() {
    let (service, _) = tasks();
    service.save(&TaskDto::new("Beta", "second")).await.unwrap();
    service.save(&TaskDto::new("Alpha", "first")).await.unwrap();

    let asc = service
        .get_all_sorted(Some(SortField::TaskTitle), SortDirection::Asc)
        .await
        .unwrap();
    assert_eq!(titles(&asc), vec!["Alpha", "Beta"]);

    let desc = service
        .get_all_sorted(Some(SortField::TaskTitle), SortDirection::Desc)
        .await
        .unwrap();
    assert_eq!(titles(&desc), vec!["Beta", "Alpha"]);
}

/// Test 3: Paging over three tasks
#[tokio::test]
async fn test_paged_over_three_tasks() {
    let (service, _) = tasks();
    service
        .save_all(&[
            TaskDto::new("one", "1"),
            TaskDto::new("two", "2"),
            TaskDto::new("three", "3"),
        ])
        .await
        .unwrap();

    let page = service
        .get_all_paged(PageRequest::new(0, 1).unwrap())
        .await
        .unwrap();
    assert_eq!(page.content.len(), 1);
    assert_eq!(page.total_elements, 3);
    assert_eq!(page.total_pages, 3);

    let last = service
        .get_all_sorted_and_paged(
            Some(SortField::TaskTitle),
            SortDirection::Asc,
            PageRequest::new(2, 1).unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(titles(&last.content), vec!["two"]);
    assert!(!last.has_next());

    let beyond = service
        .get_all_paged(PageRequest::new(5, 2).unwrap())
        .await
        .unwrap();
    assert!(beyond.is_empty());
    assert_eq!(beyond.total_elements, 3);
}

/// Test 4: Empty batch is rejected before the store is touched
#[tokio::test]
async fn test_empty_batch_rejected() {
    let (service, store) = tasks();
    let empty: Vec<TaskDto> = Vec::new();

    let err = service.save_all(&empty).await.unwrap_err();
    assert!(matches!(err, Error::BadRequest(_)));
    assert_eq!(err.status_code(), 400);
    assert_eq!(store.calls(), 0);
}

/// Test 5: Identifier stability on update
#[tokio::test]
async fn test_update_keeps_path_identifier() {
    let (service, _) = tasks();
    let a = service.save(&TaskDto::new("a", "first")).await.unwrap();
    let b = service.save(&TaskDto::new("b", "second")).await.unwrap();
    let a_id = a.id.unwrap();

    // Representation claims b's id; the path id wins.
    let updated = service
        .update(&a_id, &TaskDto::new("a2", "rewritten").with_id(b.id.unwrap()))
        .await
        .unwrap();
    assert_eq!(updated.id, Some(a_id));

    let b_after = service.get_by_id(&b.id.unwrap()).await.unwrap();
    assert_eq!(b_after.title.as_deref(), Some("b"));
    assert_eq!(service.count().await.unwrap(), 2);
}

/// Test 6: Every write invalidates previously cached reads
#[tokio::test]
async fn test_invalidation_after_each_write() {
    let (service, _) = tasks();
    let first = service.save(&TaskDto::new("first", "1")).await.unwrap();
    let id = first.id.unwrap();

    // Warm both regions.
    assert_eq!(service.get_all().await.unwrap().len(), 1);
    service.get_by_id(&id).await.unwrap();

    service.save(&TaskDto::new("second", "2")).await.unwrap();
    assert_eq!(service.get_all().await.unwrap().len(), 2);

    service
        .save_all(&[TaskDto::new("third", "3")])
        .await
        .unwrap();
    assert_eq!(service.get_all().await.unwrap().len(), 3);

    service
        .update(&id, &TaskDto::new("first v2", "1"))
        .await
        .unwrap();
    assert_eq!(
        service.get_by_id(&id).await.unwrap().title.as_deref(),
        Some("first v2")
    );

    service.update_status(&id, TaskStatus::Late).await.unwrap();
    assert_eq!(
        service.get_by_id(&id).await.unwrap().task_status,
        Some(TaskStatus::Late)
    );

    service.delete_by_id(&id).await.unwrap();
    assert_eq!(service.get_all().await.unwrap().len(), 2);
    assert!(matches!(
        service.get_by_id(&id).await,
        Err(Error::NotFound(_))
    ));
}

/// Test 7: Sort field from another entity type is rejected
#[tokio::test]
async fn test_sort_field_isolation() {
    let (service, store) = tasks();
    for field in SortField::for_kind(EntityKind::Person) {
        let result = service.get_all_sorted(Some(field), SortDirection::Asc).await;
        assert!(
            matches!(result, Err(Error::BadRequest(_))),
            "{} accepted for tasks",
            field
        );
    }
    assert_eq!(store.calls(), 0);
}

/// Test 8: A disabled cache gives the same answers
#[tokio::test]
async fn test_disabled_cache_is_transparent() {
    let (cached, _) = tasks();
    let (uncached, uncached_store) = tasks_with(NoOpBackend);

    for t in ["b", "a", "c"] {
        cached.save(&TaskDto::new(t, "x")).await.unwrap();
        uncached.save(&TaskDto::new(t, "x")).await.unwrap();
    }

    let strip = |mut list: Vec<TaskDto>| {
        for t in &mut list {
            t.task_date_creation = None;
        }
        list
    };

    for _ in 0..2 {
        let a = cached
            .get_all_sorted(Some(SortField::TaskTitle), SortDirection::Desc)
            .await
            .unwrap();
        let b = uncached
            .get_all_sorted(Some(SortField::TaskTitle), SortDirection::Desc)
            .await
            .unwrap();
        assert_eq!(strip(a), strip(b));
    }

    // Without a cache every read reaches the store.
    let before = uncached_store.calls();
    uncached.get_all().await.unwrap();
    uncached.get_all().await.unwrap();
    assert_eq!(uncached_store.calls(), before + 2);
}

/// Test 9: Store failures surface as Internal with the original message
#[tokio::test]
async fn test_store_failure_translation() {
    let (service, store) = tasks();
    store.set_failure(Some("database is locked"));

    let err = service.get_by_id(&1).await.unwrap_err();
    assert_eq!(err.status_code(), 500);
    let body = err.to_response();
    assert!(body.message.contains("database is locked"));

    store.set_failure(None);
    assert!(matches!(
        service.get_by_id(&1).await,
        Err(Error::NotFound(_))
    ));
}

/// Test 10: Configuration decides the backend
#[tokio::test]
async fn test_services_from_config() {
    let config = Config::from_toml_str(
        r#"
        [cache]
        enabled = true
        max_entries_per_region = 2
        ttl_secs = 600
        "#,
    )
    .unwrap();
    let cache = CacheService::from_config(&config.cache);
    let (service, _) = {
        let store = Arc::new(InMemoryStore::new());
        let service: TaskService<_, ConfiguredBackend> =
            TaskService::new(Arc::clone(&store), TaskMapper, cache.clone());
        (service, store)
    };

    let mut ids = Vec::new();
    for t in ["a", "b", "c"] {
        ids.push(service.save(&TaskDto::new(t, "x")).await.unwrap().id.unwrap());
    }
    for id in &ids {
        service.get_by_id(id).await.unwrap();
    }

    let single = CacheRegion::single(EntityKind::Task);
    match cache.backend() {
        ConfiguredBackend::InMemory(backend) => {
            assert_eq!(backend.region_len(single.name()).await, 2);
        }
        ConfiguredBackend::Disabled(_) => panic!("cache should be enabled"),
    }
}

/// Test 11: Person service shares the same generic contract
#[tokio::test]
async fn test_person_service_crud() {
    let store = Arc::new(InMemoryStore::new());
    let persons: PersonService<_, InMemoryBackend> = PersonService::new(
        Arc::clone(&store),
        PersonMapper,
        CacheService::new(InMemoryBackend::new()),
    );

    let saved = persons
        .save(&PersonDto::new("Ana", "García", "12345678Z", "ana@example.com"))
        .await
        .unwrap();
    let id = saved.id.unwrap();

    let renamed = persons
        .patch(
            &id,
            &PersonDto {
                last_name: Some("García López".into()),
                ..PersonDto::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.first_name.as_deref(), Some("Ana"));
    assert_eq!(renamed.last_name.as_deref(), Some("García López"));

    let paged = persons
        .get_all_sorted_and_paged(
            Some(SortField::PersonLastName),
            SortDirection::Asc,
            PageRequest::new(0, 10).unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(paged.total_elements, 1);

    assert!(matches!(
        persons
            .get_all_sorted(Some(SortField::TaskPriority), SortDirection::Asc)
            .await,
        Err(Error::BadRequest(_))
    ));

    persons.delete_by_id(&id).await.unwrap();
    match persons.get_by_id(&id).await {
        Err(Error::NotFound(msg)) => assert_eq!(msg, format!("PERSON_ID_NOT_FOUND: {}", id)),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

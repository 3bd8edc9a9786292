//! Walkthrough of the task and person services over an in-memory store.

use std::sync::Arc;
use taskhub::backend::ConfiguredBackend;
use taskhub::config::Config;
use taskhub::model::{PersonDto, PersonMapper, TaskDto, TaskMapper, TaskStatus};
use taskhub::repository::InMemoryStore;
use taskhub::{
    CacheService, EntityService, PageRequest, PersonService, Result, SortDirection, SortField,
    TaskService,
};

const CONFIG: &str = r#"
[cache]
enabled = true
max_entries_per_region = 100
ttl_secs = 300
"#;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .try_init()
        .ok();

    println!("\n=== taskhub - Task Service Example ===\n");

    // 1. Build services from configuration
    println!("1. Loading configuration and building services...");
    let config = Config::from_toml_str(CONFIG)?;
    let cache = CacheService::from_config(&config.cache);
    let task_store = Arc::new(InMemoryStore::new());
    let tasks: TaskService<_, _> = TaskService::new(Arc::clone(&task_store), TaskMapper, cache.clone());
    let persons: PersonService<_, _> =
        PersonService::new(Arc::new(InMemoryStore::new()), PersonMapper, cache);
    println!("   ✓ Services ready (cache enabled: {})\n", config.cache.enabled);

    // 2. Create
    println!("2. Creating tasks:");
    let created = tasks
        .save_all(&[
            TaskDto::new("Write report", "quarterly numbers").with_priority(2),
            TaskDto::new("Buy milk", "from the corner shop"),
            TaskDto::new("Call plumber", "kitchen leak").with_priority(3),
        ])
        .await?;
    for task in &created {
        println!("   ✓ #{:?} {:?}", task.id, task.title);
    }
    let first = created.first().and_then(|t| t.id).unwrap_or_default();
    println!();

    // 3. Cached read
    println!("3. Reading task #{} twice:", first);
    tasks.get_by_id(&first).await?;
    let calls = task_store.calls();
    let task = tasks.get_by_id(&first).await?;
    println!(
        "   ✓ {:?} (store calls on second read: {})\n",
        task.title,
        task_store.calls() - calls
    );

    // 4. Sorted and paged
    println!("4. Sorted by priority, descending, page 0 of size 2:");
    let page = tasks
        .get_all_sorted_and_paged(
            Some(SortField::TaskPriority),
            SortDirection::Desc,
            PageRequest::new(0, 2)?,
        )
        .await?;
    for task in &page.content {
        println!("   - {:?} (priority {:?})", task.title, task.priority);
    }
    println!(
        "   ✓ {} of {} tasks, {} pages\n",
        page.len(),
        page.total_elements,
        page.total_pages
    );

    // 5. Single-field writes
    println!("5. Marking #{} late and completed:", first);
    tasks.update_status(&first, TaskStatus::Late).await?;
    let done = tasks.mark_as_completed(&first).await?;
    println!(
        "   ✓ status {:?}, completed {:?}\n",
        done.task_status, done.is_completed
    );

    // 6. Rejected requests
    println!("6. Requests the service rejects:");
    let errors = [
        tasks
            .get_all_sorted(Some(SortField::PersonDni), SortDirection::Asc)
            .await
            .err(),
        tasks.get_by_id(&999).await.err(),
        tasks.save_all(&Vec::<TaskDto>::new()).await.err(),
    ];
    for err in errors.into_iter().flatten() {
        let side = if err.is_client_error() { "client" } else { "server" };
        println!("   ✓ {} error: {}", side, err.to_response().to_json()?);
    }
    println!();

    // 7. Persons share the same contract
    println!("7. Person lookups:");
    persons
        .save(&PersonDto::new("Ana", "García", "12345678Z", "ana@example.com").with_user_name("ana"))
        .await?;
    let ana = persons.get_by_username("ana").await?;
    println!("   ✓ {:?} {:?} <{:?}>", ana.first_name, ana.last_name, ana.email);
    println!("   ✓ {} persons, {} tasks\n", persons.count().await?, tasks.count().await?);

    // 8. Cache contents
    println!("8. Cache statistics:");
    if let ConfiguredBackend::InMemory(backend) = tasks.cache().backend() {
        backend.log_stats().await;
        let stats = backend.stats().await;
        println!(
            "   ✓ {} entries across {} regions ({} bytes)\n",
            stats.total_entries, stats.regions, stats.total_bytes
        );
    }

    println!("=== Example Complete ===\n");
    Ok(())
}

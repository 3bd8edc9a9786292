//! Performance benchmarks for taskhub
//!
//! This benchmark suite measures:
//! - InMemory backend operations per region (set, get, clear)
//! - Task service reads served from cache vs from the store
//! - Sorted and paged collection reads
//!
//! Run with: cargo bench
//! View results: open target/criterion/report/index.html

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::sync::Arc;
use taskhub::backend::{CacheBackend, InMemoryBackend, NoOpBackend};
use taskhub::model::{Task, TaskDto, TaskMapper};
use taskhub::repository::InMemoryStore;
use taskhub::{CacheService, EntityService, PageRequest, SortDirection, SortField, TaskService};

// ============================================================================
// Benchmark Fixtures
// ============================================================================

fn task_service<B: CacheBackend>(backend: B) -> TaskService<InMemoryStore<Task>, B> {
    TaskService::new(
        Arc::new(InMemoryStore::new()),
        TaskMapper,
        CacheService::new(backend),
    )
}

async fn seed<B: CacheBackend>(service: &TaskService<InMemoryStore<Task>, B>, count: usize) {
    let batch: Vec<TaskDto> = (0..count)
        .map(|i| TaskDto::new(format!("task {:05}", count - i), "benchmark").with_priority(i as i32))
        .collect();
    service.save_all(&batch).await.expect("Failed to seed");
}

// ============================================================================
// Group 1: InMemory Backend Benchmarks
// ============================================================================

fn backend_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("inmemory_backend");
    let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");

    for size in [100, 1_000, 10_000].iter() {
        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("set", size), size, |b, &size| {
                let backend = InMemoryBackend::new();
                let value = vec![1u8; size];
                b.to_async(&rt).iter(|| async {
                    backend
                        .set("cacheOneTask", black_box("id:1"), black_box(value.clone()), None)
                        .await
                        .expect("Failed to set")
                });
            });

        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("get_hit", size), size, |b, &size| {
                let backend = InMemoryBackend::new();
                rt.block_on(async {
                    backend
                        .set("cacheOneTask", "id:1", vec![1u8; size], None)
                        .await
                        .expect("Failed to set");
                });
                b.to_async(&rt)
                    .iter(|| async { backend.get("cacheOneTask", black_box("id:1")).await });
            });
    }

    group.bench_function("get_miss", |b| {
        let backend = InMemoryBackend::new();
        b.to_async(&rt)
            .iter(|| async { backend.get("cacheOneTask", black_box("id:missing")).await });
    });

    // Invalidation cost grows with the region size.
    for entries in [10, 200].iter() {
        group.bench_with_input(
            BenchmarkId::new("clear_region", entries),
            entries,
            |b, &entries| {
                let backend = InMemoryBackend::new();
                b.to_async(&rt).iter(|| async {
                    for i in 0..entries {
                        backend
                            .set("cacheManyTasks", &format!("paged:{}:10", i), vec![0u8; 64], None)
                            .await
                            .expect("Failed to set");
                    }
                    backend.clear_region(black_box("cacheManyTasks")).await
                });
            },
        );
    }

    group.finish();
}

// ============================================================================
// Group 2: Service Read Benchmarks
// ============================================================================

fn service_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("task_service");
    let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");

    // Cache hit: lookup + envelope decode
    group.bench_function("get_by_id_hit", |b| {
        let service = task_service(InMemoryBackend::new());
        rt.block_on(async {
            seed(&service, 100).await;
            service.get_by_id(&1).await.expect("Failed to warm cache");
        });
        b.to_async(&rt)
            .iter(|| async { service.get_by_id(black_box(&1)).await });
    });

    // Cache miss: store fetch + mapping, nothing retained
    group.bench_function("get_by_id_uncached", |b| {
        let service = task_service(NoOpBackend);
        rt.block_on(seed(&service, 100));
        b.to_async(&rt)
            .iter(|| async { service.get_by_id(black_box(&1)).await });
    });

    for count in [100, 1_000].iter() {
        group.bench_with_input(
            BenchmarkId::new("sorted_paged_hit", count),
            count,
            |b, &count| {
                let service = task_service(InMemoryBackend::new());
                let request = PageRequest::new(0, 20).expect("valid page request");
                rt.block_on(seed(&service, count));
                b.to_async(&rt).iter(|| async {
                    service
                        .get_all_sorted_and_paged(
                            Some(SortField::TaskTitle),
                            SortDirection::Asc,
                            black_box(request),
                        )
                        .await
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("sorted_paged_uncached", count),
            count,
            |b, &count| {
                let service = task_service(NoOpBackend);
                let request = PageRequest::new(0, 20).expect("valid page request");
                rt.block_on(seed(&service, count));
                b.to_async(&rt).iter(|| async {
                    service
                        .get_all_sorted_and_paged(
                            Some(SortField::TaskTitle),
                            SortDirection::Asc,
                            black_box(request),
                        )
                        .await
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, backend_benchmarks, service_benchmarks);
criterion_main!(benches);

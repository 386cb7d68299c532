use std::sync::Arc;
use std::time::Duration;

use cache::{CacheStore, InMemoryCacheStore};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{
    AssetsBulkDeletedPayload, ChangeKind, DecodedEvent, DomainEvent, StaffEventPayload,
};
use invalidation::{EventHandler, InvalidationProcessor, StaffCacheHandler};
use serde_json::json;

const TTL: Duration = Duration::from_secs(300);

/// Populate a cache with N doctor composites, N blog list pages and N assets.
async fn populate_cache(cache: &InMemoryCacheStore, n: usize) {
    for i in 0..n {
        let doc = json!({ "id": format!("d{i}") });
        cache.set(&format!("doctors:d{i}"), doc, TTL).await.unwrap();
        cache
            .set(&format!("blogs:list:page={i}:limit=10"), json!([]), TTL)
            .await
            .unwrap();
        cache
            .set(&format!("assets:a{i}"), json!({ "id": i }), TTL)
            .await
            .unwrap();
    }
}

fn staff_updated() -> DecodedEvent {
    DecodedEvent::now(DomainEvent::Staff(
        ChangeKind::Updated,
        StaffEventPayload {
            id: Some("s1".into()),
        },
    ))
}

fn bench_plan_targets(c: &mut Criterion) {
    let handler = StaffCacheHandler;
    let event = staff_updated().event;

    c.bench_function("invalidation/plan_staff_targets", |b| {
        b.iter(|| handler.targets(&event));
    });
}

fn bench_decode_enveloped_event(c: &mut Criterion) {
    let raw = json!({
        "timestamp": "2026-03-01T10:00:00Z",
        "data": { "assetIds": ["a1", "a2", "a3"], "entityType": "DOCTOR", "entityId": "d1" }
    });

    c.bench_function("invalidation/decode_enveloped_event", |b| {
        b.iter(|| DecodedEvent::decode("assets.bulk.deleted", raw.clone()).unwrap());
    });
}

fn bench_staff_event_1000_entries(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let cache = InMemoryCacheStore::new();
    let processor = InvalidationProcessor::with_default_handlers(Arc::new(cache.clone()));
    let event = staff_updated();

    c.bench_function("invalidation/staff_event_over_3000_keys", |b| {
        b.iter(|| {
            rt.block_on(async {
                cache.clear().await;
                populate_cache(&cache, 1000).await;
                processor.process(&event).await;
            });
        });
    });
}

fn bench_bulk_delete_100_assets(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let cache = InMemoryCacheStore::new();
    let processor = InvalidationProcessor::with_default_handlers(Arc::new(cache.clone()));
    let event = DecodedEvent::now(DomainEvent::AssetsBulkDeleted(AssetsBulkDeletedPayload {
        asset_ids: (0..100).map(|i| format!("a{i}")).collect(),
        entity_type: Some("DOCTOR".into()),
        entity_id: Some("d1".into()),
    }));

    rt.block_on(populate_cache(&cache, 100));

    c.bench_function("invalidation/bulk_delete_100_assets", |b| {
        b.iter(|| {
            rt.block_on(async {
                processor.process(&event).await;
            });
        });
    });
}

criterion_group!(
    benches,
    bench_plan_targets,
    bench_decode_enveloped_event,
    bench_staff_event_1000_entries,
    bench_bulk_delete_100_assets,
);
criterion_main!(benches);

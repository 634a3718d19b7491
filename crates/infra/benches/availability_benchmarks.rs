use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use serde_json::Value as JsonValue;

use shelfkit_availability::{CountdownAvailability, FixedClock};
use shelfkit_core::AvailabilityId;
use shelfkit_events::{EventBus, EventEnvelope, InMemoryEventBus};
use shelfkit_infra::projections::{SkuAvailabilityProjection, SkuAvailabilityView};
use shelfkit_infra::read_model::InMemoryReadStore;
use shelfkit_infra::{AvailabilityService, InMemoryAvailabilityStore};

type Bus = Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>;
type Service = AvailabilityService<InMemoryAvailabilityStore, Bus, FixedClock>;

fn setup(stock: u32) -> (Arc<Service>, AvailabilityId) {
    let svc = AvailabilityService::with_clock(
        InMemoryAvailabilityStore::default(),
        Arc::new(InMemoryEventBus::new()),
        FixedClock(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()),
    );
    let id = svc
        .create("countdown", Some(CountdownAvailability::new(stock).into()))
        .unwrap()
        .id_typed();
    (Arc::new(svc), id)
}

fn bench_purchase_latency(c: &mut Criterion) {
    let mut group = c.benchmark_group("purchase_latency");

    group.bench_function("record_purchase", |b| {
        let (svc, id) = setup(u32::MAX);
        b.iter(|| svc.record_purchase(id, black_box(1)).unwrap());
    });

    group.bench_function("rejected_purchase", |b| {
        let (svc, id) = setup(0);
        b.iter(|| black_box(svc.record_purchase(id, 1).is_err()));
    });

    group.bench_function("is_purchasable", |b| {
        let (svc, id) = setup(1_000);
        b.iter(|| svc.is_purchasable(id, black_box(3)).unwrap());
    });

    group.finish();
}

/// Many threads buying from one availability versus each buying from its own.
fn bench_purchase_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("purchase_contention");
    const PER_THREAD: u64 = 200;

    for threads in [1usize, 2, 4, 8] {
        group.throughput(Throughput::Elements(threads as u64 * PER_THREAD));

        group.bench_with_input(BenchmarkId::new("same_id", threads), &threads, |b, &threads| {
            b.iter_custom(|iters| {
                let mut total = Duration::ZERO;
                for _ in 0..iters {
                    let (svc, id) = setup(u32::MAX);
                    total += run_buyers(&svc, vec![id; threads], PER_THREAD);
                }
                total
            });
        });

        group.bench_with_input(BenchmarkId::new("distinct_ids", threads), &threads, |b, &threads| {
            b.iter_custom(|iters| {
                let mut total = Duration::ZERO;
                for _ in 0..iters {
                    let (svc, first) = setup(u32::MAX);
                    let mut ids = vec![first];
                    for _ in 1..threads {
                        ids.push(
                            svc.create("countdown", Some(CountdownAvailability::new(u32::MAX).into()))
                                .unwrap()
                                .id_typed(),
                        );
                    }
                    total += run_buyers(&svc, ids, PER_THREAD);
                }
                total
            });
        });
    }

    group.finish();
}

fn run_buyers(svc: &Arc<Service>, ids: Vec<AvailabilityId>, per_thread: u64) -> Duration {
    let barrier = Arc::new(Barrier::new(ids.len() + 1));
    let handles: Vec<_> = ids
        .into_iter()
        .map(|id| {
            let svc = Arc::clone(svc);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..per_thread {
                    svc.record_purchase(id, 1).unwrap();
                }
            })
        })
        .collect();

    barrier.wait();
    let start = Instant::now();
    for h in handles {
        h.join().unwrap();
    }
    start.elapsed()
}

fn bench_projection_rebuild_speed(c: &mut Criterion) {
    let mut group = c.benchmark_group("projection_rebuild_speed");

    for event_count in [100u32, 1_000, 10_000] {
        let (svc, id) = setup(u32::MAX);
        let sub = svc.bus().subscribe();
        for _ in 0..event_count {
            svc.record_purchase(id, 1).unwrap();
        }
        let envelopes = sub.drain();

        group.throughput(Throughput::Elements(u64::from(event_count)));
        group.bench_with_input(BenchmarkId::new("rebuild", event_count), &envelopes, |b, envs| {
            let projection = SkuAvailabilityProjection::new(InMemoryReadStore::<AvailabilityId, SkuAvailabilityView>::new());
            b.iter(|| projection.rebuild_from_scratch(envs.iter().cloned()).unwrap());
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_purchase_latency,
    bench_purchase_contention,
    bench_projection_rebuild_speed
);
criterion_main!(benches);

//! # Registry Performance Benchmark
//!
//! Measures the operations an engine frame leans on:
//! - Object churn through the free list
//! - Moving a parent with a deep or wide subtree
//! - Full snapshot save/load
//!
//! Run with: `cargo bench --package arbor_core`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use arbor_core::{EngineContext, ObjectId, Registry, RegistryConfig};
use arbor_shared::{Quaternion, Vec3};

fn spawn(registry: &mut Registry, x: f32) -> ObjectId {
    registry.create_object(Vec3::new(x, 0.0, 0.0), Quaternion::IDENTITY)
}

/// Benchmark: Create N objects, destroy every other one, refill.
fn bench_object_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("object_churn");

    for count in [1_000, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let mut registry = Registry::with_config(RegistryConfig::production());
                let ids: Vec<_> = (0..count).map(|i| spawn(&mut registry, i as f32)).collect();
                for id in ids.iter().step_by(2) {
                    registry.destroy_object(*id);
                }
                for i in 0..count / 2 {
                    black_box(spawn(&mut registry, i as f32));
                }
                registry.object_count()
            });
        });
    }

    group.finish();
}

/// Benchmark: Move the root of a chain (deep) or a star (wide).
fn bench_propagation(c: &mut Criterion) {
    let mut group = c.benchmark_group("propagation");

    for count in [100, 1_000] {
        let mut chain = Registry::new();
        let chain_root = spawn(&mut chain, 0.0);
        let mut parent = chain_root;
        for i in 1..count {
            let child = spawn(&mut chain, i as f32);
            let _ = chain.set_parent(parent, child);
            parent = child;
        }

        let mut star = Registry::new();
        let star_root = spawn(&mut star, 0.0);
        for i in 1..count {
            let child = spawn(&mut star, i as f32);
            let _ = star.set_parent(star_root, child);
        }

        group.bench_with_input(BenchmarkId::new("chain", count), &count, |b, _| {
            let mut x = 0.0;
            b.iter(|| {
                x += 1.0;
                chain.set_position(chain_root, Vec3::new(x, 0.0, 0.0));
            });
        });
        group.bench_with_input(BenchmarkId::new("star", count), &count, |b, _| {
            let mut x = 0.0;
            b.iter(|| {
                x += 1.0;
                star.set_position(star_root, Vec3::new(x, 0.0, 0.0));
            });
        });
    }

    group.finish();
}

/// Benchmark: Save and load a 10K object snapshot with a shallow hierarchy.
fn bench_snapshot(c: &mut Criterion) {
    let mut context = EngineContext::new(RegistryConfig::production());
    let registry = context.registry_mut();
    let mut parent = ObjectId::NULL;
    for i in 0..10_000 {
        let id = spawn(registry, i as f32);
        if i % 16 == 0 {
            parent = id;
        } else {
            let _ = registry.set_parent(parent, id);
        }
        if i % 4 == 0 {
            registry.set_name(id, "object");
        }
    }

    let bytes = context.save_snapshot();

    c.bench_function("snapshot_save_10K", |b| {
        b.iter(|| black_box(context.save_snapshot()));
    });

    c.bench_function("snapshot_load_10K", |b| {
        let mut target = EngineContext::new(RegistryConfig::production());
        b.iter(|| target.load_snapshot(black_box(&bytes)).ok());
    });
}

criterion_group!(benches, bench_object_churn, bench_propagation, bench_snapshot);
criterion_main!(benches);

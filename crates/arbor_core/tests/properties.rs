//! # Randomized Registry Properties
//!
//! Drives the registry with long deterministic sequences of random
//! operations and checks the structural invariants after each step.
//!
//! Run with: cargo test --package arbor_core --test properties

use std::collections::HashSet;

use arbor_core::{ObjectId, Registry, SnapshotReader, SnapshotWriter};
use arbor_shared::{Quaternion, Transform, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const SEEDS: [u64; 4] = [1, 7, 42, 1234];
const STEPS: usize = 400;

fn random_vec(rng: &mut ChaCha8Rng) -> Vec3 {
    Vec3::new(
        rng.gen_range(-10.0..10.0),
        rng.gen_range(-10.0..10.0),
        rng.gen_range(-10.0..10.0),
    )
}

fn random_rotation(rng: &mut ChaCha8Rng) -> Quaternion {
    let axis = [Vec3::X, Vec3::Y, Vec3::Z][rng.gen_range(0..3)];
    Quaternion::from_axis_angle(axis, rng.gen_range(-3.0..3.0))
}

fn random_live(rng: &mut ChaCha8Rng, registry: &Registry) -> Option<ObjectId> {
    let live: Vec<_> = registry.objects().collect();
    if live.is_empty() {
        None
    } else {
        Some(live[rng.gen_range(0..live.len())])
    }
}

/// Applies one random operation.
fn step(rng: &mut ChaCha8Rng, registry: &mut Registry) {
    let Some(object) = random_live(rng, registry) else {
        registry.create_object(random_vec(rng), random_rotation(rng));
        return;
    };

    match rng.gen_range(0..10) {
        0 | 1 => {
            registry.create_object(random_vec(rng), random_rotation(rng));
        }
        2 => registry.destroy_object(object),
        3 | 4 => {
            let parent = if rng.gen_bool(0.2) {
                ObjectId::NULL
            } else {
                random_live(rng, registry).unwrap_or(ObjectId::NULL)
            };
            // cycles are rejected and leave everything as it was
            let _ = registry.set_parent(parent, object);
        }
        5 => registry.set_position(object, random_vec(rng)),
        6 => registry.set_rotation(object, random_rotation(rng)),
        7 => registry.set_scale(object, rng.gen_range(0.8..1.25)),
        8 => registry.set_local_position(object, random_vec(rng)),
        _ => registry.set_name(object, if rng.gen_bool(0.5) { "node" } else { "" }),
    }
}

fn close(a: Transform, b: Transform) -> bool {
    let tolerance = 1e-3 * (1.0 + a.position.length().max(b.position.length()));
    a.position.distance(b.position) <= tolerance
        && a.rotation.approx_eq(b.rotation, 1e-3)
        && (a.scale - b.scale).abs() <= 1e-3 * a.scale.abs().max(1.0)
}

fn assert_free_list_sound(registry: &Registry) {
    let table = registry.object_table();
    let walked: Vec<_> = table.iter_free().collect();
    let dead: HashSet<_> = table
        .slots()
        .iter()
        .enumerate()
        .filter(|(_, slot)| !slot.is_alive())
        .map(|(index, _)| ObjectId::new(index as u32))
        .collect();

    assert_eq!(walked.len(), dead.len(), "free list misses or repeats a slot");
    assert_eq!(walked.iter().copied().collect::<HashSet<_>>(), dead);
    assert_eq!(table.alive_count() + dead.len(), table.len());
    table.check_free_list().unwrap();
}

fn assert_transforms_consistent(registry: &Registry) {
    for object in registry.objects() {
        let parent = registry.parent(object);
        if parent.is_null() {
            continue;
        }
        let expected = registry.transform(parent) * registry.local_transform(object);
        assert!(
            close(registry.transform(object), expected),
            "object {object} drifted from parent {parent}"
        );
    }
}

fn assert_names_linked(registry: &Registry) {
    for (index, record) in registry.name_table().records().iter().enumerate() {
        let owner = registry.object_table().get(record.object()).unwrap();
        assert_eq!(owner.name_index, Some(index as u32));
    }
}

#[test]
fn free_list_stays_sound() {
    for seed in SEEDS {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut registry = Registry::new();
        for _ in 0..STEPS {
            step(&mut rng, &mut registry);
            assert_free_list_sound(&registry);
        }
    }
}

#[test]
fn dead_slots_are_filled_before_the_table_grows() {
    for seed in SEEDS {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut registry = Registry::new();
        for _ in 0..STEPS {
            step(&mut rng, &mut registry);
        }

        let slots = registry.slot_count();
        let dead: HashSet<_> = registry.object_table().iter_free().collect();
        let reused: HashSet<_> = (0..dead.len())
            .map(|_| registry.create_object(Vec3::ZERO, Quaternion::IDENTITY))
            .collect();
        assert_eq!(reused, dead);
        assert_eq!(registry.slot_count(), slots);

        let grown = registry.create_object(Vec3::ZERO, Quaternion::IDENTITY);
        assert_eq!(grown, ObjectId::new(slots as u32));
    }
}

#[test]
fn hierarchy_stays_acyclic_and_linked() {
    for seed in SEEDS {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut registry = Registry::new();
        for _ in 0..STEPS {
            step(&mut rng, &mut registry);
            registry.check_hierarchy().unwrap();
            for node in registry.hierarchy_table().nodes() {
                assert!(registry.has_object(node.object));
                assert!(!node.is_unused(), "unused node for {} was not collected", node.object);
            }
            assert_names_linked(&registry);
        }
    }
}

#[test]
fn world_and_local_transforms_agree() {
    for seed in SEEDS {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut registry = Registry::new();
        for _ in 0..STEPS {
            step(&mut rng, &mut registry);
            assert_transforms_consistent(&registry);
        }
    }
}

#[test]
fn snapshot_round_trip_is_exact() {
    for seed in SEEDS {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut registry = Registry::new();
        for _ in 0..STEPS {
            step(&mut rng, &mut registry);
        }

        let mut writer = SnapshotWriter::new();
        registry.serialize(&mut writer);
        let bytes = writer.into_inner();

        let mut loaded = Registry::new();
        loaded.deserialize(&mut SnapshotReader::new(&bytes)).unwrap();

        assert_eq!(loaded.object_table().slots(), registry.object_table().slots());
        assert_eq!(loaded.object_table().first_free(), registry.object_table().first_free());
        assert_eq!(loaded.hierarchy_table().nodes(), registry.hierarchy_table().nodes());
        assert_eq!(loaded.name_table().records(), registry.name_table().records());

        // both continue identically
        let mut replay = rng.clone();
        for _ in 0..50 {
            step(&mut rng, &mut registry);
            step(&mut replay, &mut loaded);
        }
        assert_eq!(loaded.object_table().slots(), registry.object_table().slots());
    }
}

#[test]
fn destroy_is_idempotent() {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let mut registry = Registry::new();
    for _ in 0..STEPS {
        step(&mut rng, &mut registry);
    }

    while let Some(object) = random_live(&mut rng, &registry) {
        registry.destroy_object(object);
        let slots = registry.object_table().slots().to_vec();
        registry.destroy_object(object);
        assert_eq!(registry.object_table().slots(), slots.as_slice());
    }
    assert!(registry.hierarchy_table().is_empty());
    assert!(registry.name_table().is_empty());
}

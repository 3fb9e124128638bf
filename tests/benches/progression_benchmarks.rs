//! # Progression Benchmarks
//!
//! Throughput of the hot paths on the in-memory store: purchase, task
//! completion, and a full shared quest.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use ql_01_progression::ProgressionApi;
use ql_tests::integration::fixtures::{quest_form, World};

fn bench_purchase(c: &mut Criterion) {
    c.bench_function("purchase", |b| {
        b.iter_batched(
            || {
                let world = World::new();
                let user = world.user("ada", 1_000);
                let quest = world.quest("Morning routine", 10, 3, 10);
                (world, user.id, quest.id)
            },
            |(world, user, quest)| black_box(world.service.purchase(user, quest)),
            BatchSize::SmallInput,
        )
    });
}

fn bench_quest_lifecycle(c: &mut Criterion) {
    let world = World::new();
    let user = world.user("ada", u64::MAX / 2);

    c.bench_function("purchase_complete_tasks_and_quest", |b| {
        b.iter(|| {
            let quest = world
                .service
                .register_quest(quest_form("Morning routine", 10, 5, 10, true))
                .unwrap();
            world.service.purchase(user.id, quest.id).unwrap();
            for task in &quest.tasks {
                world.service.complete_task(user.id, quest.id, task.id).unwrap();
            }
            black_box(world.service.complete_quest(user.id, quest.id).unwrap())
        })
    });
}

fn bench_shared_quest(c: &mut Criterion) {
    let world = World::new();
    let ada = world.user("ada", u64::MAX / 2);
    let bob = world.user("bob", u64::MAX / 2);
    world.friendships.befriend(ada.id, bob.id);

    c.bench_function("shared_quest_round_trip", |b| {
        b.iter(|| {
            let quest = world.quest("Couch to 5k", 10, 3, 10);
            world
                .service
                .create_shared_quest(ada.id, bob.id, quest.id)
                .unwrap();
            for user in [ada.id, bob.id] {
                for task in &quest.tasks {
                    world.service.complete_task(user, quest.id, task.id).unwrap();
                }
            }
            black_box(world.service.complete_quest(ada.id, quest.id).unwrap())
        })
    });
}

criterion_group!(benches, bench_purchase, bench_quest_lifecycle, bench_shared_quest);
criterion_main!(benches);

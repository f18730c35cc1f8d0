//! Performance benchmarks for per-event server work

use rand::rngs::StdRng;
use rand::SeedableRng;
use server::levels::{BuiltinLevels, LevelCatalog};
use server::registry::PlayerRegistry;
use server::router::{EventRouter, InboundEvent};
use server::spawn::spawn_position;
use shared::Vec3;
use std::time::Instant;

fn full_registry(players: u32) -> PlayerRegistry {
    let mut registry =
        PlayerRegistry::with_rng(Box::new(BuiltinLevels::new()), "arena", StdRng::seed_from_u64(42))
            .unwrap();
    for id in 1..=players {
        registry.create_player(id, Some("Duplicate"));
    }
    registry
}

/// Benchmarks spawn point selection on the most cluttered level
#[test]
fn benchmark_spawn_placement() {
    let catalog = BuiltinLevels::new();
    let level = catalog.geometry_for("warehouse").unwrap();
    let mut rng = StdRng::seed_from_u64(1);

    let iterations = 100_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let _ = spawn_position(level, &mut rng);
    }

    let duration = start.elapsed();
    println!(
        "Spawn placement: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 2000);
}

/// Benchmarks joins when every player asks for the same name
#[test]
fn benchmark_colliding_joins() {
    let start = Instant::now();
    let registry = full_registry(500);
    let duration = start.elapsed();

    println!("500 colliding joins in {:?}", duration);

    assert_eq!(registry.len(), 500);
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks scoreboard projection with a crowded server
#[test]
fn benchmark_scoreboard() {
    let mut registry = full_registry(256);
    for id in 1..=256 {
        let player = registry.get_mut(id).unwrap();
        player.kills = id % 17;
        player.deaths = id % 5;
    }

    let iterations = 1_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let board = registry.scoreboard();
        assert_eq!(board.len(), 256);
    }

    let duration = start.elapsed();
    println!(
        "Scoreboard: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 3000);
}

/// Benchmarks the move relay, the most frequent event
#[test]
fn benchmark_move_dispatch() {
    let mut router = EventRouter::new(full_registry(32));

    let iterations = 100_000;
    let start = Instant::now();

    for i in 0..iterations {
        let id = (i % 32) as u32 + 1;
        let dispatch = router.handle(
            id,
            InboundEvent::Move {
                position: Vec3::new(i as f32 * 0.001, 1.6, 0.0),
                rotation: Vec3::default(),
            },
        );
        assert_eq!(dispatch.messages.len(), 1);
    }

    let duration = start.elapsed();
    println!(
        "Move dispatch: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 2000);
}

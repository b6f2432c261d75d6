//! Performance benchmarks for the hot paths of the relay and the client frame

use client::game::{Controls, Simulation};
use client::world::{generate_fruits, place_fruit, World, FRUIT_COUNT};
use rand::rngs::StdRng;
use rand::SeedableRng;
use server::relay::Relay;
use shared::{check_collision, ClientPacket, Direction, Rect, ServerPacket, WORLD_HEIGHT, WORLD_WIDTH};
use std::time::{Duration, Instant};

/// Benchmarks the AABB test used for obstacles, plates and the anaconda
#[test]
fn benchmark_collision_detection() {
    let a = Rect::new(100.0, 100.0, 50.0, 40.0);
    let b = Rect::new(110.0, 110.0, 60.0, 30.0);

    let iterations = 100_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let _ = check_collision(&a, &b);
    }

    let duration = start.elapsed();
    println!(
        "Collision detection: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    // Should complete in under 100ms for 100k iterations
    assert!(duration.as_millis() < 100);
}

/// Benchmarks position updates with a full room; each one rebuilds the snapshot
#[test]
fn benchmark_position_updates() {
    let mut relay = Relay::new();
    let now = Instant::now();
    for id in 1..=64 {
        relay.on_connect(id);
        relay.handle_packet(
            id,
            ClientPacket::PlayerJoin {
                x: id as f32,
                y: 100.0,
                direction: Direction::Right,
                pseudo: format!("player{}", id),
            },
            now,
        );
    }

    let iterations = 10_000;
    let start = Instant::now();

    for i in 0..iterations {
        let id = (i % 64) as u32 + 1;
        let out = relay.handle_packet(
            id,
            ClientPacket::UpdatePosition {
                x: i as f32,
                y: 200.0,
                direction: Direction::Left,
            },
            now,
        );
        assert_eq!(out.len(), 1);
    }

    let duration = start.elapsed();
    println!(
        "Position updates (64 players): {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // Should complete in under 2 seconds
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks snapshot encoding as it goes over the wire
#[test]
fn benchmark_snapshot_serialization() {
    let mut relay = Relay::new();
    let now = Instant::now();
    for id in 1..=64 {
        relay.handle_packet(
            id,
            ClientPacket::PlayerJoin {
                x: id as f32,
                y: 100.0,
                direction: Direction::Right,
                pseudo: format!("player{}", id),
            },
            now,
        );
    }
    let packet = ServerPacket::PlayerUpdate(relay.registry().snapshot());

    let iterations = 1_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let json = packet.to_json().unwrap();
        assert!(json.len() > 64);
    }

    let duration = start.elapsed();
    println!(
        "Snapshot serialization: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 2000);
}

/// Benchmarks fruit placement, which rejection-samples against the whole layout
#[test]
fn benchmark_fruit_placement() {
    let world = World::new(WORLD_WIDTH, WORLD_HEIGHT);
    let mut rng = StdRng::seed_from_u64(2024);
    let mut fruits = generate_fruits(&mut rng, &world, FRUIT_COUNT);

    let iterations = 1_000;
    let start = Instant::now();

    for i in 0..iterations {
        let index = i % fruits.len();
        fruits[index] = place_fruit(&mut rng, &world, &fruits, Some(index));
    }

    let duration = start.elapsed();
    println!(
        "Fruit placement: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 1000);
}

/// Benchmarks a full client frame: movement, pickups, hazards, the anaconda and particles
#[test]
fn benchmark_simulation_frames() {
    let start_time = Instant::now();
    let mut sim = Simulation::new(WORLD_WIDTH, WORLD_HEIGHT, "Bench", Some(1), start_time);
    let controls = Controls {
        left: true,
        up: true,
        ..Default::default()
    };

    let frames = 10_000u64;
    let start = Instant::now();

    for frame in 0..frames {
        let now = start_time + Duration::from_millis(frame * 16);
        if sim.step(&controls, now).is_none() {
            sim.reset(now);
        }
        if frame % 60 == 0 {
            sim.tick_second();
        }
    }

    let duration = start.elapsed();
    println!(
        "Simulation frames: {} frames in {:?} ({:.2} μs/frame)",
        frames,
        duration,
        duration.as_micros() as f64 / frames as f64
    );

    // A 60 fps budget is 16ms per frame; stay far below it
    assert!(duration.as_millis() < 5000);
}

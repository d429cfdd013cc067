//! # Streaming Window Integration Test
//!
//! Drives a whole `RunnerWorld` and checks the window, pools and reset
//! behave over long runs, not just single calls.

use strider::{
    DynamicObstaclePool, EventBus, ObstaclePoolConfig, RunnerWorld, StriderConfig, TickInput,
    WorldEvent,
};
use strider_core::PoolError;

const DT: f32 = 1.0 / 60.0;

fn world(toml: &str) -> RunnerWorld {
    let config = StriderConfig::from_toml_str(toml).unwrap();
    RunnerWorld::new(&config).unwrap()
}

fn window_starts(world: &RunnerWorld) -> Vec<f32> {
    world
        .spawner()
        .active_chunks()
        .map(|h| world.chunks().chunk(h).unwrap().start_z())
        .collect()
}

/// Test: five chunks at 0, 20, 40, 60, 80 before anything retires.
#[test]
fn test_initial_window_layout() {
    let mut world = world("");
    let stats = world.tick(TickInput::new(0.0, 0.0));

    assert_eq!(stats.spawned, 5);
    assert_eq!(stats.retired, 0);
    assert_eq!(window_starts(&world), vec![0.0, 20.0, 40.0, 60.0, 80.0]);
}

/// Test: chunks stay end-to-end through ten thousand ticks of scrolling.
#[test]
fn test_window_stays_contiguous() {
    let mut world = world(
        r#"
        [[templates]]
        id = 1
        name = "short"
        chunk_length = 15.0
        [[templates]]
        id = 2
        name = "long"
        difficulty = "hard"
        chunk_length = 35.0
        "#,
    );
    let events = world.events();
    let mut retired = 0;

    for tick in 0..10_000 {
        let stats = world.tick(TickInput::new(0.0, DT));
        retired += stats.retired;
        events.drain();

        let chunks: Vec<_> = world
            .spawner()
            .active_chunks()
            .map(|h| world.chunks().chunk(h).unwrap())
            .collect();
        assert!(chunks.len() >= 5, "tick {tick}: window shrank to {}", chunks.len());
        for pair in chunks.windows(2) {
            let gap = (pair[1].start_z() - pair[0].end_z()).abs();
            assert!(gap < 0.05, "tick {tick}: gap {gap} between chunks");
        }
    }

    assert!(retired > 50, "only {retired} chunks retired");
    assert!(world.chunks().created_count() <= 2 * 50);
}

/// Test: as the player advances over a still world, retirement only ever
/// moves forward and nothing behind the despawn line survives a tick.
#[test]
fn test_retirement_is_monotonic() {
    let mut world = world("");
    let behind = world.spawner().config().despawn_distance_behind;
    let events = world.events();
    let mut nearest_start = f32::MIN;

    for step in 0..2_000 {
        let player_z = step as f32 * 0.5;
        world.tick(TickInput::new(player_z, 0.0));
        events.drain();

        for handle in world.spawner().active_chunks() {
            let chunk = world.chunks().chunk(handle).unwrap();
            assert!(
                chunk.end_z() >= player_z - behind,
                "chunk ending at {} survived player at {player_z}",
                chunk.end_z()
            );
        }
        let start = window_starts(&world)[0];
        assert!(start >= nearest_start, "window moved backwards at z={player_z}");
        nearest_start = start;
    }
}

/// Test: 60 checkouts against a cap of 50 leave ten refusals.
#[test]
fn test_obstacle_pool_exhaustion() {
    let bus = EventBus::default();
    let mut pool = DynamicObstaclePool::new(ObstaclePoolConfig::default(), bus.sender());

    let results: Vec<_> = (0..60).map(|_| pool.get()).collect();
    let granted = results.iter().filter(|r| r.is_ok()).count();
    let refused = results
        .iter()
        .filter(|r| matches!(r, Err(PoolError::Exhausted { max_size: 50 })))
        .count();

    assert_eq!(granted, 50);
    assert_eq!(refused, 10);
    assert_eq!(pool.created(), 50);
    assert!(results[50..].iter().all(Result::is_err));
}

/// Test: chunk pool exhaustion skips spawns without breaking the window.
#[test]
fn test_chunk_pool_exhaustion_skips() {
    let mut world = world(
        r#"
        [chunk_pool]
        initial_pool_size = 2
        max_pool_size = 3
        "#,
    );
    let stats = world.tick(TickInput::new(0.0, 0.0));
    assert_eq!(stats.spawned, 3);
    assert_eq!(window_starts(&world), vec![0.0, 20.0, 40.0]);

    // Next tick retries and still cannot grow.
    let stats = world.tick(TickInput::new(0.0, 0.0));
    assert_eq!(stats.spawned, 0);
    assert_eq!(world.chunks().created_count(), 3);
}

/// Test: reset returns chunks first, then obstacles, and ends with the reset
/// notice; a second reset has nothing left to return.
#[test]
fn test_reset_world_order_and_idempotence() {
    let mut world = world(
        r#"
        [[templates]]
        id = 1
        name = "traffic"
        rows = ["M..", "...", ".M.", "..M"]
        "#,
    );
    let events = world.events();
    for _ in 0..120 {
        world.tick(TickInput::new(0.0, DT));
    }
    events.drain();

    world.reset_world(0.0);
    let first = events.drain();
    assert_eq!(first.last(), Some(&WorldEvent::WorldReset));
    let last_chunk = first
        .iter()
        .rposition(|e| matches!(e, WorldEvent::ChunkDeactivated { .. }))
        .unwrap();
    let first_recycle = first
        .iter()
        .position(|e| matches!(e, WorldEvent::ObstacleRecycled { .. }))
        .unwrap();
    let last_recycle = first
        .iter()
        .rposition(|e| matches!(e, WorldEvent::ObstacleRecycled { .. }))
        .unwrap();
    assert!(first_recycle > 0);
    assert!(last_chunk < last_recycle);
    assert_eq!(world.stats().obstacles_active, 0);
    assert_eq!(world.stats().chunks_in_use, 0);

    world.reset_world(0.0);
    assert_eq!(events.drain(), vec![WorldEvent::WorldReset]);
}

/// Test: the same seed and inputs produce the same event stream.
#[test]
fn test_same_seed_same_world() {
    let toml = include_str!("../../../data/world.toml");
    let run = |seed: u64| {
        let mut config = StriderConfig::from_toml_str(toml).unwrap();
        config.seed = seed;
        let mut world = RunnerWorld::new(&config).unwrap();
        let events = world.events();
        let mut log = Vec::new();
        for _ in 0..900 {
            world.tick(TickInput::new(0.0, DT));
            log.extend(events.drain());
        }
        assert_eq!(world.dropped_events(), 0);
        log
    };

    let a = run(7);
    let b = run(7);
    let c = run(8);
    assert_eq!(a, b);
    assert_ne!(a, c);
}

//! # Headless Run
//!
//! Drives a `RunnerWorld` at a fixed tick rate with no engine attached. The
//! player stands in the center lane at z = 0 and the world scrolls past.
//!
//! ## Usage
//!
//! ```bash
//! headless_run --config data/world.toml --ticks 3600 --seed 42
//! ```

use std::process::ExitCode;

use strider::{OverlapTarget, RunnerWorld, StriderConfig, TickInput, WorldEvent, WorldStats};
use strider_procedural::ObjectId;
use strider_shared::{Lane, LaneLayout, PLAYER_TAG, TICK_RATE};

const DEFAULT_CONFIG_PATH: &str = "data/world.toml";

/// Half-depth of the player's overlap box along Z.
const PLAYER_REACH: f32 = 0.75;

struct Options {
    config: Option<String>,
    ticks: u64,
    seed: Option<u64>,
    no_collision: bool,
}

fn parse_args() -> Option<Options> {
    let args: Vec<String> = std::env::args().collect();
    let mut options = Options {
        config: None,
        ticks: u64::from(TICK_RATE) * 60,
        seed: None,
        no_collision: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    options.config = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--ticks" | "-t" => {
                if i + 1 < args.len() {
                    options.ticks = args[i + 1].parse().unwrap_or(options.ticks);
                    i += 1;
                }
            }
            "--seed" | "-s" => {
                if i + 1 < args.len() {
                    options.seed = args[i + 1].parse().ok();
                    i += 1;
                }
            }
            "--no-collision" => options.no_collision = true,
            "--help" | "-h" => {
                println!("Usage: headless_run [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>   World config (default: {DEFAULT_CONFIG_PATH} if present)");
                println!("  -t, --ticks <N>       Ticks to run (default: one minute at {TICK_RATE} Hz)");
                println!("  -s, --seed <SEED>     Override the config seed");
                println!("      --no-collision    Disable moving obstacle colliders");
                println!("  -h, --help            Show this help");
                return None;
            }
            other => tracing::warn!("Ignoring unknown argument {}", other),
        }
        i += 1;
    }
    Some(options)
}

fn load_config(options: &Options) -> Result<StriderConfig, strider::ConfigError> {
    let mut config = match &options.config {
        Some(path) => StriderConfig::load(path)?,
        None if std::path::Path::new(DEFAULT_CONFIG_PATH).exists() => {
            StriderConfig::load(DEFAULT_CONFIG_PATH)?
        }
        None => {
            tracing::info!("No config file, using defaults");
            StriderConfig::default()
        }
    };
    if let Some(seed) = options.seed {
        config.seed = seed;
    }
    Ok(config)
}

/// Objects and obstacles inside the player's box this tick.
fn overlaps(world: &RunnerWorld, lanes: &LaneLayout, player_x: f32) -> Vec<OverlapTarget> {
    let in_reach = |x: f32, z: f32| {
        lanes.nearest_lane(x) == lanes.nearest_lane(player_x) && z.abs() <= PLAYER_REACH
    };

    let mut hits: Vec<OverlapTarget> = world
        .spawner()
        .active_chunks()
        .filter_map(|h| world.chunks().chunk(h))
        .flat_map(|c| c.objects().iter())
        .filter(|o| o.active && in_reach(o.position.x, o.position.z))
        .map(|o| OverlapTarget::Object(o.id))
        .collect();
    hits.extend(
        world
            .obstacles()
            .iter_active()
            .filter(|(_, o)| in_reach(o.position().x, o.position().z))
            .map(|(h, _)| OverlapTarget::Obstacle(h)),
    );
    hits
}

fn print_stats(stats: &WorldStats, hits: u64, picked: u64, events: u64, dropped: u64) {
    println!("┌─ RUN SUMMARY ───────────────────────────────────────────────────┐");
    println!("│ Ticks:              {}", stats.ticks);
    println!("│ Distance:           {:.1}", stats.distance);
    println!("│ Final speed:        {:.2}", stats.speed);
    println!("│ Active chunks:      {}", stats.active_chunks);
    println!("│ Chunk instances:    {} ({} in use)", stats.chunks_created, stats.chunks_in_use);
    println!("│ Obstacle instances: {} ({} active)", stats.obstacles_created, stats.obstacles_active);
    println!("│ Score:              {} ({} pickup(s))", stats.score, picked);
    println!("│ Contact events:     {hits}");
    println!("│ Events:             {events} ({dropped} dropped)");
    println!("└─────────────────────────────────────────────────────────────────┘");
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .init();

    let Some(options) = parse_args() else {
        return ExitCode::SUCCESS;
    };
    let config = match load_config(&options) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Could not load config: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let mut world = match RunnerWorld::new(&config) {
        Ok(world) => world,
        Err(e) => {
            tracing::error!("Could not build world: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let receiver = world.events();
    let lanes = config.lanes.layout();
    let player_x = lanes.lateral_x(Lane::Center);
    let dt = 1.0 / TICK_RATE as f32;
    let mut collected: Vec<ObjectId> = Vec::new();
    let (mut hits, mut events) = (0u64, 0u64);

    for _ in 0..options.ticks {
        world.tick(TickInput {
            player_z: 0.0,
            dt,
            no_collision: options.no_collision,
        });
        for target in overlaps(&world, &lanes, player_x) {
            world.on_overlap(target, PLAYER_TAG);
        }
        for event in receiver.drain() {
            events += 1;
            match event {
                WorldEvent::PlayerHit { .. } => hits += 1,
                WorldEvent::CollectiblePicked { id, .. } => collected.push(id),
                _ => {}
            }
        }
    }

    print_stats(
        &world.stats(),
        hits,
        collected.len() as u64,
        events,
        world.dropped_events(),
    );
    ExitCode::SUCCESS
}

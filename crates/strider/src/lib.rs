//! # STRIDER World Streaming
//!
//! Keeps a window of chunks ahead of the player, fills them from authored
//! layouts, and recycles everything the player has passed.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   tick(player_z, dt)   ┌──────────────────────────────┐
//! │  Game loop  │───────────────────────>│ RunnerWorld                  │
//! │  / engine   │<───── WorldEvent ──────│  WorldMover   (scroll)       │
//! └─────────────┘                        │  ChunkSpawner (window)       │
//!                                        │  ChunkPool    (per template) │
//!                                        │  DynamicObstaclePool         │
//!                                        │  ObstacleDriver (activation) │
//!                                        └──────────────────────────────┘
//! ```
//!
//! ## Rules
//!
//! 1. **Single writer**: all pool and chunk mutation happens inside `tick`
//! 2. **Recycle only**: chunks and moving obstacles are never destroyed
//! 3. **Skip, don't fail**: exhaustion and missing content skip one unit of
//!    work and retry next tick
//!
//! ## Example
//!
//! ```rust
//! use strider::{RunnerWorld, StriderConfig, TickInput};
//!
//! let config = StriderConfig::from_toml_str("seed = 7").unwrap();
//! let mut world = RunnerWorld::new(&config).unwrap();
//!
//! let stats = world.tick(TickInput::new(0.0, 1.0 / 60.0));
//! assert_eq!(stats.active_chunks, 5);
//! assert!(world.events().has_events());
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod activation;
pub mod chunk_pool;
pub mod config;
pub mod error;
pub mod events;
pub mod mover;
pub mod obstacle;
pub mod obstacle_pool;
pub mod physics;
pub mod spawner;
pub mod world;

pub use activation::{ActivationConfig, DriveReport, ObstacleDriver};
pub use chunk_pool::{ChunkHandle, ChunkPool, ChunkPoolConfig};
pub use config::{LaneConfig, StriderConfig, TemplateConfig};
pub use error::{ConfigError, ConfigResult, StreamError, StreamResult};
pub use events::{
    EventBus, EventReceiver, EventSender, HitSource, ObstacleHandle, WorldEvent,
    DEFAULT_EVENT_CAPACITY,
};
pub use mover::{MoverConfig, WorldMover};
pub use obstacle::{DynamicObstacle, ObstacleState};
pub use obstacle_pool::{DynamicObstaclePool, ObstaclePoolConfig, SweptObstacle};
pub use physics::{forward_probe, is_path_blocked, Aabb};
pub use spawner::{ChunkSpawner, PromotionReport, SpawnContext, SpawnReport, SpawnerConfig};
pub use world::{OverlapOutcome, OverlapTarget, RunnerWorld, TickInput, TickStats, WorldStats};

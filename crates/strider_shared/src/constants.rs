//! # Tuning Constants
//!
//! Defaults used when a config file leaves a value out.

// =============================================================================
// CHUNKS
// =============================================================================

/// Default forward length of a chunk.
pub const DEFAULT_CHUNK_LENGTH: f32 = 20.0;

/// Default layout cell size along Z.
pub const DEFAULT_CELL_SIZE: f32 = 5.0;

/// Height offset for collectibles (obstacles sit on the ground).
pub const COLLECTIBLE_HEIGHT: f32 = 0.5;

// =============================================================================
// SPAWNING
// =============================================================================

/// Distance ahead of the player that must be covered by chunks.
pub const DEFAULT_SPAWN_DISTANCE_AHEAD: f32 = 20.0;

/// Distance behind the player after which a chunk is retired.
pub const DEFAULT_DESPAWN_DISTANCE_BEHIND: f32 = 10.0;

/// Minimum number of active chunks.
pub const DEFAULT_CHUNKS_AHEAD: usize = 5;

/// Distance ahead at which moving cells are promoted to pooled obstacles.
pub const DEFAULT_MOVING_SPAWN_DISTANCE: f32 = 60.0;

/// Distance ahead at which promoted obstacles start moving.
pub const DEFAULT_MOVING_ACTIVATION_DISTANCE: f32 = 20.0;

/// Distance behind the player after which a moving obstacle is recycled.
pub const DEFAULT_OBSTACLE_DESPAWN_BEHIND: f32 = 5.0;

// =============================================================================
// POOLS
// =============================================================================

/// Instances created up front per pool.
pub const DEFAULT_INITIAL_POOL_SIZE: usize = 10;

/// Hard cap on instances per pool.
pub const DEFAULT_MAX_POOL_SIZE: usize = 50;

// =============================================================================
// WORLD MOVER
// =============================================================================

/// Starting scroll speed (units/second).
pub const DEFAULT_BASE_SPEED: f32 = 10.0;

/// Scroll acceleration (units/second²).
pub const DEFAULT_ACCELERATION: f32 = 0.1;

/// Scroll speed ceiling.
pub const DEFAULT_MAX_SPEED: f32 = 30.0;

/// Tick rate used by the headless driver.
pub const TICK_RATE: u32 = 60;

/// Tag carried by the player actor in overlap notifications.
pub const PLAYER_TAG: &str = "Player";

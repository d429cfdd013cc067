//! # Runner World
//!
//! The explicit context object the game loop owns. It holds both pools, the
//! spawner, the obstacle driver and the world mover, and runs them in a
//! fixed order every tick:
//!
//! 1. apply the no-collision toggle
//! 2. advance the world mover and scroll chunks by its displacement
//! 3. fill the window, promote Moving cells, retire passed chunks
//! 4. activate and drive moving obstacles
//! 5. recycle obstacles the player has left behind
//!
//! Activated obstacles never receive the scroll displacement; they run on
//! their own speed.

use strider_procedural::ObjectId;

use crate::activation::ObstacleDriver;
use crate::chunk_pool::{ChunkHandle, ChunkPool};
use crate::config::StriderConfig;
use crate::error::ConfigResult;
use crate::events::{EventBus, EventReceiver, EventSender, HitSource, ObstacleHandle, WorldEvent};
use crate::mover::WorldMover;
use crate::obstacle_pool::DynamicObstaclePool;
use crate::spawner::{ChunkSpawner, SpawnContext};

// =============================================================================
// TICK I/O
// =============================================================================

/// Inbound per-tick data from the engine.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickInput {
    /// Player forward position.
    pub player_z: f32,
    /// Elapsed time since the previous tick (seconds).
    pub dt: f32,
    /// Debug toggle: disable every moving obstacle collider.
    pub no_collision: bool,
}

impl TickInput {
    /// A tick at `player_z` lasting `dt` seconds, collisions on.
    #[must_use]
    pub const fn new(player_z: f32, dt: f32) -> Self {
        Self {
            player_z,
            dt,
            no_collision: false,
        }
    }
}

/// What one tick did.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TickStats {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// Scroll applied to chunks this tick.
    pub displacement: f32,
    /// Chunks that entered the window.
    pub spawned: usize,
    /// Chunks returned to their pool.
    pub retired: usize,
    /// Moving cells promoted to pooled obstacles.
    pub promoted: usize,
    /// Obstacles that started driving.
    pub activated: usize,
    /// Obstacles swept back into the pool.
    pub recycled: usize,
    /// Chunks in the window after the tick.
    pub active_chunks: usize,
    /// Obstacles checked out after the tick.
    pub active_obstacles: usize,
}

/// Snapshot of the whole world.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WorldStats {
    /// Current scroll speed.
    pub speed: f32,
    /// Distance scrolled since the last reset.
    pub distance: f32,
    /// Chunks in the window.
    pub active_chunks: usize,
    /// Chunk instances ever created, all templates.
    pub chunks_created: usize,
    /// Chunk instances checked out.
    pub chunks_in_use: usize,
    /// Obstacles checked out.
    pub obstacles_active: usize,
    /// Obstacle instances ever created.
    pub obstacles_created: usize,
    /// Collectible score this run.
    pub score: u64,
    /// Ticks since construction.
    pub ticks: u64,
}

// =============================================================================
// OVERLAPS
// =============================================================================

/// The entity on the other side of an overlap notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlapTarget {
    /// An object anchored to a chunk.
    Object(ObjectId),
    /// A pooled moving obstacle.
    Obstacle(ObstacleHandle),
}

/// How the world reacted to an overlap.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OverlapOutcome {
    /// A collectible was picked up.
    Collected {
        /// Score granted.
        score: u32,
    },
    /// The player was hurt.
    Hit {
        /// Contact damage.
        damage: f32,
    },
}

// =============================================================================
// WORLD
// =============================================================================

/// Top-level streaming world.
pub struct RunnerWorld {
    bus: EventBus,
    events: EventSender,
    chunks: ChunkPool,
    obstacles: DynamicObstaclePool,
    driver: ObstacleDriver,
    spawner: ChunkSpawner,
    mover: WorldMover,
    score: u64,
    ticks: u64,
}

impl RunnerWorld {
    /// Builds the world from a sanitized config.
    ///
    /// Nothing spawns until the first [`RunnerWorld::tick`].
    ///
    /// # Errors
    ///
    /// Returns a [`crate::ConfigError`] if a template is malformed or two
    /// templates share an id.
    pub fn new(config: &StriderConfig) -> ConfigResult<Self> {
        let templates = config.build_templates()?;
        let seed = config.world_seed();
        let bus = EventBus::new(config.event_capacity);
        let events = bus.sender();

        let mut chunks = ChunkPool::new(config.chunk_pool.clone(), events.clone());
        for template in &templates {
            chunks.register_template(template.clone());
        }
        let obstacles = DynamicObstaclePool::new(config.obstacle_pool.clone(), events.clone());
        let driver = ObstacleDriver::new(config.obstacles.clone(), seed, events.clone());
        let spawner = ChunkSpawner::new(config.spawner.clone(), templates, seed, events.clone())
            .with_lanes(config.lanes.layout())
            .with_catalogs(config.catalogs.clone())
            .with_generator(config.generator.clone());

        tracing::info!(
            "RunnerWorld ready: {} template(s), seed {}, {} chunk instance(s) prewarmed",
            chunks.template_count(),
            seed.value(),
            chunks.created_count()
        );

        Ok(Self {
            bus,
            events,
            chunks,
            obstacles,
            driver,
            spawner,
            mover: WorldMover::new(config.mover.clone()),
            score: 0,
            ticks: 0,
        })
    }

    /// Runs one tick.
    pub fn tick(&mut self, input: TickInput) -> TickStats {
        self.ticks += 1;
        self.obstacles.set_no_collision_mode(input.no_collision);

        let displacement = self.mover.tick(input.dt);
        self.spawner
            .move_chunks(&mut self.chunks, &mut self.obstacles, displacement);

        let spawn = {
            let mut ctx = SpawnContext {
                chunks: &mut self.chunks,
                obstacles: &mut self.obstacles,
                driver: &mut self.driver,
            };
            self.spawner.update(&mut ctx, input.player_z)
        };

        let drive = self.driver.drive_obstacles(
            &mut self.obstacles,
            &mut self.chunks,
            input.player_z,
            input.dt,
        );

        let behind = self.obstacles.config().despawn_behind_offset;
        let swept = self.obstacles.sweep_passed_obstacles(input.player_z, behind);
        for entry in &swept {
            if let Some(chunk) = entry.anchor.and_then(|h| self.chunks.chunk_mut(h)) {
                chunk.detach_dynamic(entry.obstacle);
            }
        }

        TickStats {
            tick: self.ticks,
            displacement,
            spawned: spawn.spawned,
            retired: spawn.retired,
            promoted: spawn.promoted,
            activated: spawn.activated + drive.activated,
            recycled: swept.len(),
            active_chunks: self.spawner.active_count(),
            active_obstacles: self.obstacles.active_count(),
        }
    }

    /// Reacts to an overlap between `target` and an actor tagged
    /// `other_tag`. Only the player tag does anything.
    pub fn on_overlap(&mut self, target: OverlapTarget, other_tag: &str) -> Option<OverlapOutcome> {
        if other_tag != strider_shared::PLAYER_TAG {
            return None;
        }
        match target {
            OverlapTarget::Object(id) => self.overlap_object(id),
            OverlapTarget::Obstacle(handle) => self.overlap_obstacle(handle),
        }
    }

    fn overlap_object(&mut self, id: ObjectId) -> Option<OverlapOutcome> {
        let handle = self.chunk_of(id)?;
        let no_collision = self.obstacles.no_collision_mode();
        let chunk = self.chunks.chunk_mut(handle)?;
        let object = chunk.object_mut(id)?;

        if object.kind.is_trigger() {
            let score = object.collect()?;
            chunk.remove_object(id);
            self.score += u64::from(score);
            tracing::debug!("Collected {:?} for {} (score {})", id, score, self.score);
            self.events.send(WorldEvent::CollectiblePicked { id, score });
            self.events.send(WorldEvent::ObjectDespawned { id });
            return Some(OverlapOutcome::Collected { score });
        }

        if !object.active || no_collision {
            return None;
        }
        let damage = object.damage;
        self.events.send(WorldEvent::PlayerHit {
            source: HitSource::Object(id),
            damage,
        });
        Some(OverlapOutcome::Hit { damage })
    }

    fn overlap_obstacle(&mut self, handle: ObstacleHandle) -> Option<OverlapOutcome> {
        let obstacle = self.obstacles.obstacle(handle)?;
        if !self.obstacles.is_active(handle) || !obstacle.collider_enabled() {
            return None;
        }
        let damage = obstacle.damage();
        self.events.send(WorldEvent::PlayerHit {
            source: HitSource::Obstacle(handle),
            damage,
        });
        Some(OverlapOutcome::Hit { damage })
    }

    fn chunk_of(&self, id: ObjectId) -> Option<ChunkHandle> {
        self.spawner.active_chunks().find(|&h| {
            self.chunks
                .chunk(h)
                .is_some_and(|c| c.id() == id.chunk)
        })
    }

    /// Recycles everything and restarts the window at `player_z`.
    ///
    /// Chunks go back first (restoring their baked props), then the mover
    /// is reset, then every remaining moving obstacle is recycled.
    pub fn reset_world(&mut self, player_z: f32) {
        let chunks = self
            .spawner
            .despawn_all(&mut self.chunks, &mut self.obstacles, player_z);
        self.mover.reset();
        let obstacles = self.obstacles.release_all();
        self.score = 0;
        self.events.send(WorldEvent::WorldReset);
        tracing::info!(
            "World reset at z={:.1}: {} chunk(s), {} loose obstacle(s) recycled",
            player_z,
            chunks,
            obstacles
        );
    }

    /// Current totals.
    #[must_use]
    pub fn stats(&self) -> WorldStats {
        WorldStats {
            speed: self.mover.current_speed(),
            distance: self.mover.distance(),
            active_chunks: self.spawner.active_count(),
            chunks_created: self.chunks.created_count(),
            chunks_in_use: self.chunks.active_count(),
            obstacles_active: self.obstacles.active_count(),
            obstacles_created: self.obstacles.created(),
            score: self.score,
            ticks: self.ticks,
        }
    }

    /// Receiving end of the outbound event bus.
    #[must_use]
    pub fn events(&self) -> EventReceiver {
        self.bus.receiver()
    }

    /// Events dropped because the bus was full.
    #[must_use]
    pub fn dropped_events(&self) -> u64 {
        self.bus.dropped()
    }

    /// Scroll controls.
    pub fn mover_mut(&mut self) -> &mut WorldMover {
        &mut self.mover
    }

    /// Scroll state.
    #[must_use]
    pub const fn mover(&self) -> &WorldMover {
        &self.mover
    }

    /// The lookahead window.
    #[must_use]
    pub const fn spawner(&self) -> &ChunkSpawner {
        &self.spawner
    }

    /// Chunk instances.
    #[must_use]
    pub const fn chunks(&self) -> &ChunkPool {
        &self.chunks
    }

    /// Moving obstacles.
    #[must_use]
    pub const fn obstacles(&self) -> &DynamicObstaclePool {
        &self.obstacles
    }

    /// Collectible score this run.
    #[must_use]
    pub const fn score(&self) -> u64 {
        self.score
    }
}

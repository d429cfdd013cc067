//! # Dynamic Obstacle Pool
//!
//! One shared pool of moving obstacles for the whole world. Obstacles are
//! never destroyed: a swept or released obstacle is reset and queued for
//! reuse.
//!
//! Every [`DynamicObstaclePool::get`] forces the obstacle through
//! [`DynamicObstacle::reset`], so nothing from a previous activation leaks
//! into the next one.

use serde::{Deserialize, Serialize};
use strider_core::{PoolError, PoolResult, SlotPool};
use strider_procedural::{ObjectData, PrefabRef};
use strider_shared::constants::{
    DEFAULT_INITIAL_POOL_SIZE, DEFAULT_MAX_POOL_SIZE, DEFAULT_OBSTACLE_DESPAWN_BEHIND,
};
use strider_shared::Vec3;

use crate::chunk_pool::ChunkHandle;
use crate::events::{EventSender, ObstacleHandle, WorldEvent};
use crate::obstacle::DynamicObstacle;

fn default_obstacle_prefab() -> PrefabRef {
    PrefabRef::new("moving_obstacle")
}

/// Obstacle pool sizing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstaclePoolConfig {
    /// Instances created up front.
    pub initial_size: usize,
    /// Hard cap on instances.
    pub max_size: usize,
    /// Trailing distance behind the player before a mover is recycled.
    pub despawn_behind_offset: f32,
    /// Visual template when the catalog entry names none.
    #[serde(default = "default_obstacle_prefab")]
    pub prefab: PrefabRef,
}

impl Default for ObstaclePoolConfig {
    fn default() -> Self {
        Self {
            initial_size: DEFAULT_INITIAL_POOL_SIZE,
            max_size: DEFAULT_MAX_POOL_SIZE,
            despawn_behind_offset: DEFAULT_OBSTACLE_DESPAWN_BEHIND,
            prefab: default_obstacle_prefab(),
        }
    }
}

impl ObstaclePoolConfig {
    /// Clamps sizes and distances into a usable range.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        self.max_size = self.max_size.max(1);
        self.initial_size = self.initial_size.min(self.max_size);
        self.despawn_behind_offset = self.despawn_behind_offset.max(0.0);
        self
    }
}

/// An obstacle recycled by a sweep.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SweptObstacle {
    /// Recycled instance.
    pub obstacle: ObstacleHandle,
    /// Chunk it was still anchored to, if any.
    pub anchor: Option<ChunkHandle>,
}

/// Shared pool of moving obstacles.
pub struct DynamicObstaclePool {
    config: ObstaclePoolConfig,
    slots: SlotPool<DynamicObstacle>,
    no_collision_mode: bool,
    events: EventSender,
}

impl DynamicObstaclePool {
    /// Creates the pool and pre-creates `initial_size` dormant obstacles.
    #[must_use]
    pub fn new(config: ObstaclePoolConfig, events: EventSender) -> Self {
        let config = config.sanitized();
        let mut slots = SlotPool::new(config.max_size);
        let created = slots.prewarm(config.initial_size, |handle| {
            events.send(WorldEvent::ObstacleInstantiated { obstacle: handle });
            DynamicObstacle::new(config.prefab.clone(), config.despawn_behind_offset)
        });
        tracing::debug!("Obstacle pool warmed with {} instance(s)", created);

        Self {
            config,
            slots,
            no_collision_mode: false,
            events,
        }
    }

    /// Checks out a dormant obstacle.
    ///
    /// # Errors
    ///
    /// Returns [`strider_core::PoolError::Exhausted`] once `max_size`
    /// obstacles are out. Nothing is created past the cap.
    pub fn get(&mut self) -> PoolResult<ObstacleHandle> {
        let prefab = &self.config.prefab;
        let despawn_behind = self.config.despawn_behind_offset;
        let acquired = self
            .slots
            .acquire_with(|_| DynamicObstacle::new(prefab.clone(), despawn_behind))?;

        if !acquired.reused {
            self.events.send(WorldEvent::ObstacleInstantiated {
                obstacle: acquired.handle,
            });
        }
        if let Some(obstacle) = self.slots.get_mut(acquired.handle) {
            obstacle.reset();
            obstacle.set_collision_allowed(!self.no_collision_mode);
        }
        Ok(acquired.handle)
    }

    /// Checks out an obstacle and places it dormant in one step. Returns the
    /// handle and the prefab the obstacle ended up with.
    ///
    /// # Errors
    ///
    /// Whatever [`get`](Self::get) returns. A checked-out slot that cannot
    /// be read back goes straight back to the pool and yields
    /// [`PoolError::InvalidHandle`]; nothing stays checked out.
    pub fn get_placed(
        &mut self,
        position: Vec3,
        config: Option<ObjectData>,
        anchor: Option<ChunkHandle>,
        default_activation_distance: f32,
    ) -> PoolResult<(ObstacleHandle, PrefabRef)> {
        let handle = self.get()?;
        if let Some(obstacle) = self.slots.get_mut(handle) {
            obstacle.place_dormant(position, config, anchor, default_activation_distance);
            return Ok((handle, obstacle.prefab().clone()));
        }
        tracing::warn!("Obstacle {:?} unreadable after checkout; returning it", handle);
        self.release(handle)?;
        Err(PoolError::InvalidHandle(handle))
    }

    /// Resets an obstacle and queues it for reuse.
    ///
    /// # Errors
    ///
    /// Returns [`strider_core::PoolError::NotInUse`] for an obstacle already
    /// in the pool; the free queue is left untouched.
    pub fn release(&mut self, handle: ObstacleHandle) -> PoolResult<()> {
        if !self.slots.is_active(handle) {
            tracing::warn!("Obstacle {:?} released while not in use; ignoring", handle);
        } else if let Some(obstacle) = self.slots.get_mut(handle) {
            obstacle.reset();
        }
        self.slots.release(handle)?;
        self.events
            .send(WorldEvent::ObstacleRecycled { obstacle: handle });
        Ok(())
    }

    /// Recycles every checked-out obstacle. Returns how many.
    pub fn release_all(&mut self) -> usize {
        let active = self.slots.active_handles();
        active
            .into_iter()
            .filter(|handle| self.release(*handle).is_ok())
            .count()
    }

    /// Recycles every mover more than `behind_offset` behind the player.
    ///
    /// Returns what was recycled together with any chunk the obstacle was
    /// still anchored to, so the caller can drop the anchor.
    pub fn sweep_passed_obstacles(
        &mut self,
        player_z: f32,
        behind_offset: f32,
    ) -> Vec<SweptObstacle> {
        let passed: Vec<SweptObstacle> = self
            .slots
            .iter_active_mut()
            .filter(|(_, o)| o.is_moving && o.is_behind_by(player_z, behind_offset))
            .map(|(handle, obstacle)| {
                let anchor = obstacle.anchor();
                obstacle.mark_despawned();
                SweptObstacle {
                    obstacle: handle,
                    anchor,
                }
            })
            .collect();

        for swept in &passed {
            if let Err(e) = self.release(swept.obstacle) {
                tracing::warn!("Sweep could not recycle {:?}: {}", swept.obstacle, e);
            }
        }
        if !passed.is_empty() {
            tracing::debug!("Swept {} obstacle(s) behind z={:.1}", passed.len(), player_z);
        }
        passed
    }

    /// Turns collision off (or back on) for every obstacle, now and on
    /// future checkouts.
    pub fn set_no_collision_mode(&mut self, enabled: bool) {
        if self.no_collision_mode == enabled {
            return;
        }
        self.no_collision_mode = enabled;
        tracing::info!("No-collision mode {}", if enabled { "on" } else { "off" });

        let toggled: Vec<(ObstacleHandle, bool)> = self
            .slots
            .iter_active_mut()
            .filter_map(|(handle, o)| o.set_collision_allowed(!enabled).map(|on| (handle, on)))
            .collect();
        for (obstacle, enabled) in toggled {
            self.events
                .send(WorldEvent::ColliderToggled { obstacle, enabled });
        }
    }

    /// Current no-collision setting.
    #[inline]
    #[must_use]
    pub const fn no_collision_mode(&self) -> bool {
        self.no_collision_mode
    }

    /// Obstacle behind a handle.
    #[must_use]
    pub fn obstacle(&self, handle: ObstacleHandle) -> Option<&DynamicObstacle> {
        self.slots.get(handle)
    }

    /// Mutable obstacle behind a handle.
    pub fn obstacle_mut(&mut self, handle: ObstacleHandle) -> Option<&mut DynamicObstacle> {
        self.slots.get_mut(handle)
    }

    /// Snapshot of checked-out handles.
    #[must_use]
    pub fn active_handles(&self) -> Vec<ObstacleHandle> {
        self.slots.active_handles()
    }

    /// Checked-out obstacles.
    pub fn iter_active(&self) -> impl Iterator<Item = (ObstacleHandle, &DynamicObstacle)> {
        self.slots.iter_active()
    }

    /// `true` if the handle is checked out.
    #[must_use]
    pub fn is_active(&self, handle: ObstacleHandle) -> bool {
        self.slots.is_active(handle)
    }

    /// Checked-out count.
    #[must_use]
    pub const fn active_count(&self) -> usize {
        self.slots.active_count()
    }

    /// Instances ever created.
    #[must_use]
    pub fn created(&self) -> usize {
        self.slots.created()
    }

    /// Sizing in effect.
    #[must_use]
    pub const fn config(&self) -> &ObstaclePoolConfig {
        &self.config
    }
}

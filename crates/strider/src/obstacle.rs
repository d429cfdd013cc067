//! # Dynamic Obstacle
//!
//! A pooled obstacle that rides a chunk until the player gets close, then
//! detaches and drives toward the player on its own clock.
//!
//! ## State Machine
//!
//! ```text
//!            place_dormant (anchored)         activate
//! ┌─────────┐ ─────────────► ┌─────────────┐ ─────────► ┌────────┐
//! │ Dormant │                │ Approaching │            │ Active │
//! └─────────┘ ◄───── reset ──└─────────────┘            └────────┘
//!      ▲                                                     │ is_behind
//!      │                 reset (pool release)           ┌───────────┐
//!      └─────────────────────────────────────────────── │ Despawned │
//!                                                       └───────────┘
//! ```

use strider_procedural::{ObjectData, PrefabRef, DEFAULT_ACTIVATION_DISTANCE};
use strider_shared::constants::DEFAULT_OBSTACLE_DESPAWN_BEHIND;
use strider_shared::Vec3;

use crate::chunk_pool::ChunkHandle;

/// Lifecycle of a pooled obstacle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ObstacleState {
    /// Resting in the pool or placed without an anchor.
    #[default]
    Dormant,
    /// Placed on a Moving cell, riding its chunk.
    Approaching,
    /// Detached and driving toward the player.
    Active,
    /// Fell behind the player; about to be recycled.
    Despawned,
}

impl ObstacleState {
    /// Waiting for the player to get close.
    #[inline]
    #[must_use]
    pub const fn is_waiting(self) -> bool {
        matches!(self, Self::Dormant | Self::Approaching)
    }
}

/// A pooled moving obstacle.
#[derive(Clone, Debug, PartialEq)]
pub struct DynamicObstacle {
    /// Pool-eligible mover. Sweeps only recycle obstacles with this set.
    pub is_moving: bool,
    /// Forward gap to the player at which it activates.
    pub activation_distance: f32,
    /// Speed toward the player once active.
    pub move_speed: f32,
    /// Trailing distance behind the player before it is recycled.
    pub despawn_behind_offset: f32,
    /// Catalog entry supplying damage, speed and activation distance.
    pub config: Option<ObjectData>,
    prefab: PrefabRef,
    position: Vec3,
    state: ObstacleState,
    collider_enabled: bool,
    collision_allowed: bool,
    anchor: Option<ChunkHandle>,
}

impl DynamicObstacle {
    /// A fresh dormant obstacle.
    #[must_use]
    pub fn new(prefab: PrefabRef, despawn_behind_offset: f32) -> Self {
        Self {
            is_moving: true,
            activation_distance: DEFAULT_ACTIVATION_DISTANCE,
            move_speed: 0.0,
            despawn_behind_offset,
            config: None,
            prefab,
            position: Vec3::ZERO,
            state: ObstacleState::Dormant,
            collider_enabled: false,
            collision_allowed: true,
            anchor: None,
        }
    }

    /// Clears every per-activation field: dormant, collider off, no speed,
    /// no anchor, no catalog entry.
    ///
    /// Calling it twice leaves the same state as calling it once.
    pub fn reset(&mut self) {
        self.state = ObstacleState::Dormant;
        self.collider_enabled = false;
        self.move_speed = 0.0;
        self.activation_distance = DEFAULT_ACTIVATION_DISTANCE;
        self.config = None;
        self.anchor = None;
        self.position = Vec3::ZERO;
    }

    /// Puts the obstacle on a Moving cell.
    ///
    /// With an anchor it becomes Approaching and scrolls with that chunk.
    /// The activation distance comes from `config` when present, else from
    /// `default_activation_distance`.
    pub fn place_dormant(
        &mut self,
        position: Vec3,
        config: Option<ObjectData>,
        anchor: Option<ChunkHandle>,
        default_activation_distance: f32,
    ) {
        self.position = position;
        self.activation_distance = config
            .as_ref()
            .map_or(default_activation_distance, |c| c.activation_distance);
        self.config = config;
        self.collider_enabled = false;
        self.move_speed = 0.0;
        self.anchor = anchor;
        self.state = if anchor.is_some() && self.is_moving {
            ObstacleState::Approaching
        } else {
            ObstacleState::Dormant
        };
    }

    /// `true` when waiting and within activation distance of the player.
    #[must_use]
    pub fn should_activate(&self, player_z: f32) -> bool {
        self.is_moving
            && self.state.is_waiting()
            && self.position.z - player_z <= self.activation_distance
    }

    /// Starts driving at `speed`. Returns the chunk it was anchored to, so
    /// the caller can drop it from that chunk's anchored set.
    ///
    /// The collider turns on unless collisions are disallowed.
    pub fn activate(&mut self, speed: f32) -> Option<ChunkHandle> {
        self.state = ObstacleState::Active;
        self.move_speed = speed.max(0.0);
        self.collider_enabled = self.collision_allowed;
        self.anchor.take()
    }

    /// Moves toward the player by `move_speed * dt` unless `blocked`.
    ///
    /// Returns `true` if it moved.
    pub fn advance(&mut self, dt: f32, blocked: bool) -> bool {
        if self.state != ObstacleState::Active || blocked {
            return false;
        }
        self.position.z -= self.move_speed * dt;
        true
    }

    /// Scrolls with the world. Active obstacles ignore the world.
    pub fn move_with_world(&mut self, delta: f32) {
        if self.state != ObstacleState::Active {
            self.position.z -= delta;
        }
    }

    /// `true` once more than `despawn_behind_offset` behind the player.
    #[inline]
    #[must_use]
    pub fn is_behind(&self, player_z: f32) -> bool {
        self.is_behind_by(player_z, self.despawn_behind_offset)
    }

    /// `true` once more than `offset` behind the player.
    #[inline]
    #[must_use]
    pub fn is_behind_by(&self, player_z: f32, offset: f32) -> bool {
        self.position.z < player_z - offset
    }

    /// Marks the obstacle as fallen behind.
    pub fn mark_despawned(&mut self) {
        self.state = ObstacleState::Despawned;
        self.collider_enabled = false;
    }

    /// Allows or forbids the collider. Returns the new collider state if it
    /// changed.
    pub fn set_collision_allowed(&mut self, allowed: bool) -> Option<bool> {
        self.collision_allowed = allowed;
        let enabled = allowed && self.state == ObstacleState::Active;
        if enabled == self.collider_enabled {
            return None;
        }
        self.collider_enabled = enabled;
        Some(enabled)
    }

    /// Contact damage from the catalog entry.
    #[must_use]
    pub fn damage(&self) -> f32 {
        self.config.as_ref().map_or(0.0, |c| c.damage)
    }

    /// Current state.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> ObstacleState {
        self.state
    }

    /// `true` while not driving.
    #[inline]
    #[must_use]
    pub const fn is_dormant(&self) -> bool {
        self.state.is_waiting()
    }

    /// `true` while driving toward the player.
    #[inline]
    #[must_use]
    pub fn movement_active(&self) -> bool {
        self.state == ObstacleState::Active
    }

    /// World position.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Visual template: the catalog entry's when set, else the pool's.
    #[must_use]
    pub fn prefab(&self) -> &PrefabRef {
        match &self.config {
            Some(config) if !config.prefab.is_unset() => &config.prefab,
            _ => &self.prefab,
        }
    }

    /// Collision volume state.
    #[inline]
    #[must_use]
    pub const fn collider_enabled(&self) -> bool {
        self.collider_enabled
    }

    /// Chunk it rides, if still anchored.
    #[inline]
    #[must_use]
    pub const fn anchor(&self) -> Option<ChunkHandle> {
        self.anchor
    }
}

impl Default for DynamicObstacle {
    fn default() -> Self {
        Self::new(PrefabRef::default(), DEFAULT_OBSTACLE_DESPAWN_BEHIND)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strider_core::PoolHandle;
    use strider_core::SlotPool;
    use strider_procedural::TemplateId;

    fn handle() -> ChunkHandle {
        let mut pool: SlotPool<u8> = SlotPool::new(1);
        let slot: PoolHandle = pool.acquire_with(|_| 0).unwrap().handle;
        ChunkHandle::new(TemplateId(1), slot)
    }

    fn placed() -> DynamicObstacle {
        let mut obstacle = DynamicObstacle::new(PrefabRef::new("truck"), 5.0);
        obstacle.place_dormant(Vec3::new(0.0, 0.0, 50.0), None, Some(handle()), 20.0);
        obstacle
    }

    #[test]
    fn test_place_with_anchor_approaches() {
        let obstacle = placed();
        assert_eq!(obstacle.state(), ObstacleState::Approaching);
        assert!(obstacle.is_dormant());
        assert!(!obstacle.collider_enabled());
        assert!(obstacle.anchor().is_some());
    }

    #[test]
    fn test_activation_threshold() {
        let obstacle = placed();
        assert!(!obstacle.should_activate(29.0));
        assert!(obstacle.should_activate(30.0));
        assert!(obstacle.should_activate(45.0));
    }

    #[test]
    fn test_config_overrides_activation_distance() {
        let mut obstacle = DynamicObstacle::default();
        let mut data = ObjectData::new("bus", PrefabRef::new("bus")).moving(7.0);
        data.activation_distance = 40.0;
        obstacle.place_dormant(Vec3::new(0.0, 0.0, 50.0), Some(data), None, 20.0);

        assert_eq!(obstacle.activation_distance, 40.0);
        assert_eq!(obstacle.prefab().as_str(), "bus");
        assert!(obstacle.should_activate(10.0));
    }

    #[test]
    fn test_activate_detaches_and_enables_collider() {
        let mut obstacle = placed();
        let anchor = obstacle.activate(6.0);

        assert!(anchor.is_some());
        assert!(obstacle.anchor().is_none());
        assert!(obstacle.movement_active());
        assert!(obstacle.collider_enabled());
        assert!(!obstacle.should_activate(50.0));
    }

    #[test]
    fn test_advance_moves_toward_player() {
        let mut obstacle = placed();
        assert!(!obstacle.advance(1.0, false));

        obstacle.activate(6.0);
        assert!(obstacle.advance(0.5, false));
        assert!((obstacle.position().z - 47.0).abs() < 1e-6);

        assert!(!obstacle.advance(0.5, true));
        assert!((obstacle.position().z - 47.0).abs() < 1e-6);
    }

    #[test]
    fn test_world_scroll_skips_active() {
        let mut obstacle = placed();
        obstacle.move_with_world(10.0);
        assert_eq!(obstacle.position().z, 40.0);

        obstacle.activate(6.0);
        obstacle.move_with_world(10.0);
        assert_eq!(obstacle.position().z, 40.0);
    }

    #[test]
    fn test_is_behind() {
        let obstacle = placed();
        assert!(!obstacle.is_behind(55.0));
        assert!(obstacle.is_behind(55.1));
        assert!(obstacle.is_behind(100.0));
    }

    #[test]
    fn test_reset_is_idempotent() {
        let mut obstacle = placed();
        obstacle.activate(6.0);
        obstacle.advance(1.0, false);

        obstacle.reset();
        let once = obstacle.clone();
        obstacle.reset();

        assert_eq!(obstacle, once);
        assert_eq!(obstacle.state(), ObstacleState::Dormant);
        assert!(!obstacle.collider_enabled());
        assert_eq!(obstacle.move_speed, 0.0);
        assert!(obstacle.anchor().is_none());
        assert!(obstacle.config.is_none());
    }

    #[test]
    fn test_collision_disallowed_keeps_collider_off() {
        let mut obstacle = placed();
        obstacle.set_collision_allowed(false);
        obstacle.activate(6.0);
        assert!(!obstacle.collider_enabled());

        assert_eq!(obstacle.set_collision_allowed(true), Some(true));
        assert_eq!(obstacle.set_collision_allowed(true), None);
    }
}

//! # Obstacle Activation
//!
//! Drives pooled obstacles through their state machine each tick:
//!
//! 1. Waiting obstacles within activation distance detach from their chunk
//!    and get a speed (catalog entry first, random range otherwise).
//! 2. Active obstacles move toward the player, unless the forward probe hits
//!    another collider, in which case they hold for this tick.
//!
//! Recycling obstacles that fell behind is the pool's sweep, run afterwards
//! by [`crate::RunnerWorld`].

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use strider_procedural::{ObjectCatalog, ObjectData, WorldSeed, STREAM_OBSTACLES};

use crate::chunk_pool::ChunkPool;
use crate::events::{EventSender, ObstacleHandle, WorldEvent};
use crate::obstacle_pool::DynamicObstaclePool;
use crate::physics::{forward_probe, is_path_blocked, Aabb};

/// Moving-obstacle tuning and catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivationConfig {
    /// Lower bound of the random speed used when no catalog speed applies.
    pub random_speed_min: f32,
    /// Upper bound of that range.
    pub random_speed_max: f32,
    /// Length of the forward probe. Zero disables it.
    pub probe_distance: f32,
    /// Collision box of one obstacle, `[width, height, depth]`.
    pub obstacle_size: [f32; 3],
    /// Entries promoted Moving cells are configured from.
    pub catalog: ObjectCatalog,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            random_speed_min: 4.0,
            random_speed_max: 8.0,
            probe_distance: 2.0,
            obstacle_size: [2.0, 2.0, 2.0],
            catalog: ObjectCatalog {
                entries: Vec::new(),
                is_moving: true,
            },
        }
    }
}

impl ActivationConfig {
    /// Orders the speed range and clamps distances.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        self.random_speed_min = self.random_speed_min.max(0.0);
        self.random_speed_max = self.random_speed_max.max(0.0);
        if self.random_speed_min > self.random_speed_max {
            std::mem::swap(&mut self.random_speed_min, &mut self.random_speed_max);
        }
        self.probe_distance = self.probe_distance.max(0.0);
        for extent in &mut self.obstacle_size {
            *extent = extent.max(0.0);
        }
        self.catalog.is_moving = true;
        self
    }
}

/// Counts from one [`ObstacleDriver::drive_obstacles`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DriveReport {
    /// Obstacles that started driving.
    pub activated: usize,
    /// Obstacles that moved.
    pub moved: usize,
    /// Obstacles held by the forward probe.
    pub blocked: usize,
}

/// Owns the obstacle random stream and the activation rules.
pub struct ObstacleDriver {
    config: ActivationConfig,
    rng: ChaCha8Rng,
    events: EventSender,
}

impl ObstacleDriver {
    /// Creates a driver with its own stream derived from `seed`.
    #[must_use]
    pub fn new(config: ActivationConfig, seed: WorldSeed, events: EventSender) -> Self {
        Self {
            config: config.sanitized(),
            rng: seed.rng(STREAM_OBSTACLES),
            events,
        }
    }

    /// Draws a catalog entry for a freshly promoted obstacle.
    pub fn pick_config(&mut self) -> Option<ObjectData> {
        self.config.catalog.pick_weighted(&mut self.rng).cloned()
    }

    /// Speed for an activation: the entry's speed if positive, else a draw
    /// from the configured range.
    pub fn pick_speed(&mut self, config: Option<&ObjectData>) -> f32 {
        match config {
            Some(data) if data.speed > 0.0 => data.speed,
            _ => {
                let (min, max) = (self.config.random_speed_min, self.config.random_speed_max);
                if max > min {
                    self.rng.gen_range(min..=max)
                } else {
                    min
                }
            }
        }
    }

    /// Activates one waiting obstacle: assigns a speed, enables its
    /// collider and drops it from its chunk's anchored set.
    ///
    /// Returns `false` if the handle is not a waiting obstacle.
    pub fn activate(
        &mut self,
        obstacles: &mut DynamicObstaclePool,
        chunks: &mut ChunkPool,
        handle: ObstacleHandle,
    ) -> bool {
        let Some(obstacle) = obstacles.obstacle(handle) else {
            return false;
        };
        if !obstacle.state().is_waiting() {
            return false;
        }
        let speed = self.pick_speed(obstacle.config.as_ref());

        let Some(obstacle) = obstacles.obstacle_mut(handle) else {
            return false;
        };
        let anchor = obstacle.activate(speed);
        let collider = obstacle.collider_enabled();

        if let Some(anchor) = anchor {
            let detached = chunks
                .chunk_mut(anchor)
                .is_some_and(|chunk| chunk.detach_dynamic(handle));
            if !detached {
                tracing::warn!("Obstacle {:?} was not anchored to {:?}", handle, anchor);
            }
        }

        tracing::debug!("Obstacle {:?} activated at speed {:.1}", handle, speed);
        self.events
            .send(WorldEvent::ObstacleActivated { obstacle: handle, speed });
        if collider {
            self.events.send(WorldEvent::ColliderToggled {
                obstacle: handle,
                enabled: true,
            });
        }
        true
    }

    /// Runs activation and movement for every checked-out obstacle.
    pub fn drive_obstacles(
        &mut self,
        obstacles: &mut DynamicObstaclePool,
        chunks: &mut ChunkPool,
        player_z: f32,
        dt: f32,
    ) -> DriveReport {
        let mut report = DriveReport::default();

        let due: Vec<ObstacleHandle> = obstacles
            .iter_active()
            .filter(|(_, o)| o.should_activate(player_z))
            .map(|(h, _)| h)
            .collect();
        for handle in due {
            if self.activate(obstacles, chunks, handle) {
                report.activated += 1;
            }
        }

        let movers: Vec<ObstacleHandle> = obstacles
            .iter_active()
            .filter(|(_, o)| o.movement_active())
            .map(|(h, _)| h)
            .collect();
        if movers.is_empty() {
            return report;
        }

        let colliders = self.collect_colliders(obstacles, chunks);
        for handle in movers {
            let blocked = self.is_blocked(obstacles, handle, &colliders);
            let Some(obstacle) = obstacles.obstacle_mut(handle) else {
                continue;
            };
            if obstacle.advance(dt, blocked) {
                report.moved += 1;
                self.events.send(WorldEvent::ObstacleMoved {
                    obstacle: handle,
                    position: obstacle.position(),
                });
            } else if blocked {
                report.blocked += 1;
                tracing::trace!("Obstacle {:?} held by forward probe", handle);
            }
        }
        report
    }

    /// Boxes of everything a mover can run into: active chunk obstacles and
    /// pooled obstacles with an enabled collider, tagged with the pooled
    /// handle. Dormant and approaching obstacles have no collider yet.
    fn collect_colliders(
        &self,
        obstacles: &DynamicObstaclePool,
        chunks: &ChunkPool,
    ) -> Vec<(Option<ObstacleHandle>, Aabb)> {
        if self.config.probe_distance <= 0.0 {
            return Vec::new();
        }
        let size = self.config.obstacle_size;

        let statics = chunks.iter_active().flat_map(|(_, chunk)| {
            chunk
                .objects()
                .iter()
                .filter(|o| o.active && o.kind.is_obstacle())
                .map(move |o| (None, Aabb::from_base(o.position, size)))
        });
        let pooled = obstacles
            .iter_active()
            .filter(|(_, o)| o.collider_enabled())
            .map(|(h, o)| (Some(h), Aabb::from_base(o.position(), size)));
        statics.chain(pooled).collect()
    }

    fn is_blocked(
        &self,
        obstacles: &DynamicObstaclePool,
        handle: ObstacleHandle,
        colliders: &[(Option<ObstacleHandle>, Aabb)],
    ) -> bool {
        if self.config.probe_distance <= 0.0 {
            return false;
        }
        let Some(obstacle) = obstacles.obstacle(handle) else {
            return false;
        };
        let probe = forward_probe(
            obstacle.position(),
            self.config.obstacle_size,
            self.config.probe_distance,
        );
        let others = colliders
            .iter()
            .filter(|(owner, _)| *owner != Some(handle))
            .map(|(_, aabb)| aabb);
        is_path_blocked(&probe, others)
    }

    /// Tuning in effect.
    #[must_use]
    pub const fn config(&self) -> &ActivationConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk_pool::ChunkPoolConfig;
    use crate::events::EventBus;
    use crate::obstacle::ObstacleState;
    use crate::obstacle_pool::ObstaclePoolConfig;
    use std::sync::Arc;
    use strider_procedural::{ChunkTemplate, Difficulty, PrefabRef, TemplateId};
    use strider_shared::Vec3;

    struct Rig {
        bus: EventBus,
        chunks: ChunkPool,
        obstacles: DynamicObstaclePool,
        driver: ObstacleDriver,
    }

    fn rig(config: ActivationConfig) -> Rig {
        let bus = EventBus::new(4096);
        let mut chunks = ChunkPool::new(ChunkPoolConfig::default(), bus.sender());
        chunks.register_template(Arc::new(ChunkTemplate::new(
            TemplateId(1),
            "street",
            Difficulty::Easy,
        )));
        let obstacles = DynamicObstaclePool::new(ObstaclePoolConfig::default(), bus.sender());
        let driver = ObstacleDriver::new(config, WorldSeed::new(5), bus.sender());
        Rig {
            bus,
            chunks,
            obstacles,
            driver,
        }
    }

    fn place(rig: &mut Rig, z: f32, x: f32) -> ObstacleHandle {
        let chunk = rig.chunks.get(TemplateId(1)).unwrap();
        rig.chunks.chunk_mut(chunk).unwrap().initialize(0.0);
        let handle = rig.obstacles.get().unwrap();
        rig.obstacles.obstacle_mut(handle).unwrap().place_dormant(
            Vec3::new(x, 0.0, z),
            None,
            Some(chunk),
            20.0,
        );
        rig.chunks.chunk_mut(chunk).unwrap().anchor_dynamic(handle);
        handle
    }

    #[test]
    fn test_activation_detaches_from_chunk() {
        let mut rig = rig(ActivationConfig::default());
        let handle = place(&mut rig, 15.0, 0.0);
        let anchor = rig.obstacles.obstacle(handle).unwrap().anchor().unwrap();

        let report = rig
            .driver
            .drive_obstacles(&mut rig.obstacles, &mut rig.chunks, 0.0, 0.0);
        assert_eq!(report.activated, 1);

        let obstacle = rig.obstacles.obstacle(handle).unwrap();
        assert_eq!(obstacle.state(), ObstacleState::Active);
        assert!((4.0..=8.0).contains(&obstacle.move_speed));
        assert!(rig.chunks.chunk(anchor).unwrap().dynamic_anchors().is_empty());
    }

    #[test]
    fn test_far_obstacle_stays_waiting() {
        let mut rig = rig(ActivationConfig::default());
        let handle = place(&mut rig, 25.0, 0.0);
        let report = rig
            .driver
            .drive_obstacles(&mut rig.obstacles, &mut rig.chunks, 0.0, 0.1);
        assert_eq!(report, DriveReport::default());
        assert_eq!(
            rig.obstacles.obstacle(handle).unwrap().state(),
            ObstacleState::Approaching
        );
    }

    #[test]
    fn test_catalog_speed_wins() {
        let mut rig = rig(ActivationConfig::default());
        let data = ObjectData::new("bus", PrefabRef::new("bus")).moving(12.0);
        assert_eq!(rig.driver.pick_speed(Some(&data)), 12.0);
        let still = ObjectData::new("cone", PrefabRef::new("cone"));
        assert!((4.0..=8.0).contains(&rig.driver.pick_speed(Some(&still))));
    }

    #[test]
    fn test_active_obstacle_moves_toward_player() {
        let mut rig = rig(ActivationConfig {
            random_speed_min: 5.0,
            random_speed_max: 5.0,
            ..ActivationConfig::default()
        });
        let handle = place(&mut rig, 10.0, 0.0);
        rig.driver
            .drive_obstacles(&mut rig.obstacles, &mut rig.chunks, 0.0, 0.0);
        rig.bus.receiver().drain();

        let report = rig
            .driver
            .drive_obstacles(&mut rig.obstacles, &mut rig.chunks, 0.0, 0.5);
        assert_eq!(report.moved, 1);
        let z = rig.obstacles.obstacle(handle).unwrap().position().z;
        assert!((z - 7.5).abs() < 1e-5);
        assert!(matches!(
            rig.bus.receiver().drain().as_slice(),
            [WorldEvent::ObstacleMoved { .. }]
        ));
    }

    #[test]
    fn test_probe_holds_mover_behind_another() {
        let mut rig = rig(ActivationConfig {
            random_speed_min: 5.0,
            random_speed_max: 5.0,
            ..ActivationConfig::default()
        });
        let front = place(&mut rig, 10.0, 0.0);
        let back = place(&mut rig, 12.5, 0.0);
        let side = place(&mut rig, 12.5, 5.0);
        rig.driver
            .drive_obstacles(&mut rig.obstacles, &mut rig.chunks, 0.0, 0.0);

        let report = rig
            .driver
            .drive_obstacles(&mut rig.obstacles, &mut rig.chunks, 0.0, 0.1);
        assert_eq!(report.moved, 2);
        assert_eq!(report.blocked, 1);
        assert!((rig.obstacles.obstacle(back).unwrap().position().z - 12.5).abs() < 1e-6);
        assert!(rig.obstacles.obstacle(front).unwrap().position().z < 10.0);
        assert!(rig.obstacles.obstacle(side).unwrap().position().z < 12.5);
    }

    #[test]
    fn test_dormant_obstacle_does_not_block() {
        let mut rig = rig(ActivationConfig {
            random_speed_min: 5.0,
            random_speed_max: 5.0,
            ..ActivationConfig::default()
        });
        let dormant = place(&mut rig, 10.0, 0.0);
        rig.obstacles.obstacle_mut(dormant).unwrap().activation_distance = 1.0;
        let mover = place(&mut rig, 12.5, 0.0);
        rig.driver
            .drive_obstacles(&mut rig.obstacles, &mut rig.chunks, 0.0, 0.0);
        assert!(!rig.obstacles.obstacle(dormant).unwrap().collider_enabled());

        let report = rig
            .driver
            .drive_obstacles(&mut rig.obstacles, &mut rig.chunks, 0.0, 0.1);
        assert_eq!(report.blocked, 0);
        assert_eq!(report.moved, 1);
        assert!(rig.obstacles.obstacle(mover).unwrap().position().z < 12.5);
        assert!((rig.obstacles.obstacle(dormant).unwrap().position().z - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_probe_disabled() {
        let mut rig = rig(ActivationConfig {
            probe_distance: 0.0,
            ..ActivationConfig::default()
        });
        place(&mut rig, 10.0, 0.0);
        place(&mut rig, 12.5, 0.0);
        rig.driver
            .drive_obstacles(&mut rig.obstacles, &mut rig.chunks, 0.0, 0.0);
        let report = rig
            .driver
            .drive_obstacles(&mut rig.obstacles, &mut rig.chunks, 0.0, 0.1);
        assert_eq!(report.moved, 2);
    }

    #[test]
    fn test_sanitized_orders_range() {
        let config = ActivationConfig {
            random_speed_min: 9.0,
            random_speed_max: 3.0,
            ..ActivationConfig::default()
        }
        .sanitized();
        assert_eq!((config.random_speed_min, config.random_speed_max), (3.0, 9.0));
        assert!(config.catalog.is_moving);
    }
}

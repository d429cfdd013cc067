//! # World Objects
//!
//! Everything a chunk carries: static obstacles, jump obstacles and
//! collectibles. Moving obstacles share the [`WorldObjectKind`] capability
//! table but live in the obstacle pool, not in a chunk.

use serde::{Deserialize, Serialize};
use strider_shared::Vec3;

use crate::catalog::PrefabRef;

/// Score granted by a collectible unless configured otherwise.
pub const DEFAULT_COLLECTIBLE_SCORE: u32 = 10;

/// Identity of a chunk instance. Unique across every template pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkId(pub u32);

/// Identity of an object anchored to a chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    /// Owning chunk.
    pub chunk: ChunkId,
    /// Serial within the chunk instance.
    pub serial: u32,
}

/// Object variant. Dispatch goes through the capability methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorldObjectKind {
    /// Ground obstacle.
    Static,
    /// Obstacle the player jumps over.
    Jump,
    /// Trigger volume that grants score once.
    Collectible,
    /// Pooled moving obstacle.
    Dynamic,
}

impl WorldObjectKind {
    /// Hurts the player on overlap.
    #[inline]
    #[must_use]
    pub const fn is_obstacle(self) -> bool {
        !matches!(self, Self::Collectible)
    }

    /// Overlap is a pickup rather than a hit.
    #[inline]
    #[must_use]
    pub const fn is_trigger(self) -> bool {
        matches!(self, Self::Collectible)
    }

    /// Drives itself once activated instead of riding a chunk.
    #[inline]
    #[must_use]
    pub const fn is_self_driven(self) -> bool {
        matches!(self, Self::Dynamic)
    }

    /// Height above the track surface the object is placed at.
    #[inline]
    #[must_use]
    pub fn height_offset(self) -> f32 {
        if self.is_trigger() {
            strider_shared::COLLECTIBLE_HEIGHT
        } else {
            0.0
        }
    }
}

/// Where an object came from. Decides what a chunk reset does with it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ObjectOrigin {
    /// Placed by the generator; despawned on reset.
    Generated,
    /// Authored into the template; restored to `local` on reset.
    Baked {
        /// Chunk-local position at authoring time.
        local: Vec3,
    },
}

/// Request to anchor a new object to a chunk.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectSpawn {
    /// Variant.
    pub kind: WorldObjectKind,
    /// Visual template.
    pub prefab: PrefabRef,
    /// World position.
    pub position: Vec3,
    /// Contact damage.
    pub damage: f32,
    /// Configured speed (informational for non-movers).
    pub speed: f32,
    /// Score for collectibles.
    pub score_value: u32,
}

impl ObjectSpawn {
    /// Spawn request with zeroed stats.
    #[must_use]
    pub fn new(kind: WorldObjectKind, prefab: PrefabRef, position: Vec3) -> Self {
        Self {
            kind,
            prefab,
            position,
            damage: 0.0,
            speed: 0.0,
            score_value: if kind.is_trigger() {
                DEFAULT_COLLECTIBLE_SCORE
            } else {
                0
            },
        }
    }
}

/// An object anchored to a chunk.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldObject {
    /// Identity.
    pub id: ObjectId,
    /// Variant.
    pub kind: WorldObjectKind,
    /// Visual template.
    pub prefab: PrefabRef,
    /// World position.
    pub position: Vec3,
    /// Contact damage.
    pub damage: f32,
    /// Configured speed.
    pub speed: f32,
    /// Score for collectibles.
    pub score_value: u32,
    /// Generated or baked.
    pub origin: ObjectOrigin,
    /// Visible and collidable.
    pub active: bool,
    /// Collectible already picked up.
    pub collected: bool,
}

impl WorldObject {
    /// Builds an object from a spawn request.
    #[must_use]
    pub fn from_spawn(id: ObjectId, spawn: ObjectSpawn, origin: ObjectOrigin) -> Self {
        Self {
            id,
            kind: spawn.kind,
            prefab: spawn.prefab,
            position: spawn.position,
            damage: spawn.damage,
            speed: spawn.speed,
            score_value: spawn.score_value,
            origin,
            active: true,
            collected: false,
        }
    }

    /// Shifts the object with the scrolling world.
    #[inline]
    pub fn move_with_world(&mut self, delta: f32) {
        self.position.z -= delta;
    }

    /// Hides the object.
    #[inline]
    pub fn on_despawn(&mut self) {
        self.active = false;
    }

    /// Picks up a collectible. Returns its score the first time only.
    pub fn collect(&mut self) -> Option<u32> {
        if !self.kind.is_trigger() || self.collected || !self.active {
            return None;
        }
        self.collected = true;
        self.on_despawn();
        Some(self.score_value)
    }

    /// Puts a baked prop back at its authored position.
    ///
    /// Returns `false` for generated objects, which are not restorable.
    pub fn restore(&mut self) -> bool {
        match self.origin {
            ObjectOrigin::Baked { local } => {
                self.position = local;
                self.active = true;
                self.collected = false;
                true
            }
            ObjectOrigin::Generated => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> ObjectId {
        ObjectId {
            chunk: ChunkId(1),
            serial: 0,
        }
    }

    #[test]
    fn test_capabilities() {
        assert!(WorldObjectKind::Static.is_obstacle());
        assert!(WorldObjectKind::Dynamic.is_self_driven());
        assert!(!WorldObjectKind::Jump.is_trigger());
        assert!(WorldObjectKind::Collectible.is_trigger());
        assert_eq!(WorldObjectKind::Collectible.height_offset(), 0.5);
        assert_eq!(WorldObjectKind::Static.height_offset(), 0.0);
    }

    #[test]
    fn test_collect_once() {
        let spawn = ObjectSpawn::new(
            WorldObjectKind::Collectible,
            PrefabRef::new("coin"),
            Vec3::new(0.0, 0.5, 10.0),
        );
        let mut coin = WorldObject::from_spawn(id(), spawn, ObjectOrigin::Generated);
        assert_eq!(coin.collect(), Some(DEFAULT_COLLECTIBLE_SCORE));
        assert_eq!(coin.collect(), None);
        assert!(!coin.active);
    }

    #[test]
    fn test_obstacles_are_not_collectible() {
        let spawn = ObjectSpawn::new(WorldObjectKind::Static, PrefabRef::new("cone"), Vec3::ZERO);
        let mut cone = WorldObject::from_spawn(id(), spawn, ObjectOrigin::Generated);
        assert_eq!(cone.collect(), None);
        assert!(cone.active);
    }

    #[test]
    fn test_restore_baked_only() {
        let local = Vec3::new(5.0, 0.0, 3.0);
        let spawn = ObjectSpawn::new(WorldObjectKind::Static, PrefabRef::new("rock"), local);
        let mut rock = WorldObject::from_spawn(id(), spawn.clone(), ObjectOrigin::Baked { local });
        rock.move_with_world(40.0);
        rock.on_despawn();
        assert!(rock.restore());
        assert_eq!(rock.position, local);
        assert!(rock.active);

        let mut generated = WorldObject::from_spawn(id(), spawn, ObjectOrigin::Generated);
        assert!(!generated.restore());
    }
}

//! # Object Catalogs
//!
//! A catalog is a list of [`ObjectData`] entries the generator and the
//! obstacle pool draw from. Entries configure the spawned instance (damage,
//! speed, activation distance); the prefab is an opaque reference handed to
//! the engine.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Default distance at which a moving obstacle starts driving.
pub const DEFAULT_ACTIVATION_DISTANCE: f32 = 20.0;

/// Opaque reference to an engine-side visual template.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrefabRef(String);

impl PrefabRef {
    /// Creates a prefab reference.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the reference as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A blank reference means "not assigned".
    #[must_use]
    pub fn is_unset(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for PrefabRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn default_activation_distance() -> f32 {
    DEFAULT_ACTIVATION_DISTANCE
}

fn default_weight() -> f32 {
    1.0
}

fn default_name() -> String {
    "New Object".to_owned()
}

/// One catalog entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectData {
    /// Display name, also the lookup key for [`ObjectCatalog::by_name`].
    #[serde(default = "default_name")]
    pub name: String,
    /// Visual template.
    pub prefab: PrefabRef,
    /// Move speed for moving obstacles (units/second).
    #[serde(default)]
    pub speed: f32,
    /// Damage dealt on contact.
    #[serde(default)]
    pub damage: f32,
    /// Whether this entry describes a pool-eligible mover.
    #[serde(default)]
    pub is_moving: bool,
    /// Forward gap to the player at which a mover starts driving.
    #[serde(default = "default_activation_distance")]
    pub activation_distance: f32,
    /// Relative pick weight.
    #[serde(default = "default_weight")]
    pub weight: f32,
}

impl ObjectData {
    /// Creates an entry with default stats.
    #[must_use]
    pub fn new(name: impl Into<String>, prefab: PrefabRef) -> Self {
        Self {
            name: name.into(),
            prefab,
            speed: 0.0,
            damage: 0.0,
            is_moving: false,
            activation_distance: DEFAULT_ACTIVATION_DISTANCE,
            weight: 1.0,
        }
    }

    /// Builder: sets speed and marks the entry as moving.
    #[must_use]
    pub fn moving(mut self, speed: f32) -> Self {
        self.speed = speed;
        self.is_moving = true;
        self
    }

    /// Builder: sets damage.
    #[must_use]
    pub fn with_damage(mut self, damage: f32) -> Self {
        self.damage = damage;
        self
    }

    /// Builder: sets the pick weight.
    #[must_use]
    pub fn with_weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }
}

/// A weighted list of object entries.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectCatalog {
    /// Entries in authoring order.
    #[serde(default)]
    pub entries: Vec<ObjectData>,
    /// Catalog of movers; speed queries only answer for these.
    #[serde(default)]
    pub is_moving: bool,
}

impl ObjectCatalog {
    /// Creates a catalog from entries.
    #[must_use]
    pub fn new(entries: Vec<ObjectData>) -> Self {
        Self {
            entries,
            is_moving: false,
        }
    }

    /// Returns `true` if the catalog has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Draws an entry with probability proportional to its weight.
    ///
    /// Non-positive weights never win. If every weight is non-positive the
    /// draw is uniform. Returns `None` only for an empty catalog.
    pub fn pick_weighted<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&ObjectData> {
        if self.entries.is_empty() {
            return None;
        }

        let total: f32 = self.entries.iter().map(|e| e.weight.max(0.0)).sum();
        if !(total > 0.0 && total.is_finite()) {
            return self.entries.get(rng.gen_range(0..self.entries.len()));
        }

        let mut roll = rng.gen_range(0.0..total);
        for entry in &self.entries {
            let weight = entry.weight.max(0.0);
            if roll < weight {
                return Some(entry);
            }
            roll -= weight;
        }
        // Rounding can leave a sliver past the last bucket.
        self.entries.iter().rev().find(|e| e.weight > 0.0)
    }

    /// Finds an entry by name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&ObjectData> {
        let found = self.entries.iter().find(|e| e.name == name);
        if found.is_none() {
            tracing::warn!(name, "catalog has no entry with this name");
        }
        found
    }

    /// Picks uniformly among entries with exactly this speed.
    ///
    /// Only moving catalogs answer; others return `None`.
    pub fn random_by_speed<R: Rng + ?Sized>(&self, speed: f32, rng: &mut R) -> Option<&ObjectData> {
        if !self.is_moving {
            return None;
        }
        let matching: Vec<&ObjectData> = self
            .entries
            .iter()
            .filter(|e| (e.speed - speed).abs() <= f32::EPSILON)
            .collect();
        if matching.is_empty() {
            tracing::warn!(speed, "catalog has no entry with this speed");
            return None;
        }
        Some(matching[rng.gen_range(0..matching.len())])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::WorldSeed;

    fn catalog() -> ObjectCatalog {
        ObjectCatalog::new(vec![
            ObjectData::new("cone", PrefabRef::new("cone")).with_weight(3.0),
            ObjectData::new("barrier", PrefabRef::new("barrier")).with_weight(1.0),
            ObjectData::new("never", PrefabRef::new("never")).with_weight(0.0),
        ])
    }

    #[test]
    fn test_weighted_pick_follows_weights() {
        let catalog = catalog();
        let mut rng = WorldSeed::new(3).rng(9);
        let mut cones = 0;
        let mut barriers = 0;
        for _ in 0..4000 {
            match catalog.pick_weighted(&mut rng).map(|e| e.name.as_str()) {
                Some("cone") => cones += 1,
                Some("barrier") => barriers += 1,
                other => panic!("unexpected pick {other:?}"),
            }
        }
        assert!(cones > barriers * 2, "cones={cones} barriers={barriers}");
    }

    #[test]
    fn test_empty_catalog_picks_nothing() {
        let mut rng = WorldSeed::new(1).rng(1);
        assert!(ObjectCatalog::default().pick_weighted(&mut rng).is_none());
    }

    #[test]
    fn test_all_zero_weights_is_uniform() {
        let catalog = ObjectCatalog::new(vec![
            ObjectData::new("a", PrefabRef::new("a")).with_weight(0.0),
            ObjectData::new("b", PrefabRef::new("b")).with_weight(0.0),
        ]);
        let mut rng = WorldSeed::new(5).rng(5);
        assert!(catalog.pick_weighted(&mut rng).is_some());
    }

    #[test]
    fn test_by_name() {
        let catalog = catalog();
        assert_eq!(catalog.by_name("barrier").map(|e| e.weight), Some(1.0));
        assert!(catalog.by_name("missing").is_none());
    }

    #[test]
    fn test_random_by_speed_only_for_moving_catalogs() {
        let mut catalog = ObjectCatalog::new(vec![
            ObjectData::new("slow", PrefabRef::new("car")).moving(4.0),
            ObjectData::new("fast", PrefabRef::new("car")).moving(9.0),
        ]);
        let mut rng = WorldSeed::new(11).rng(2);
        assert!(catalog.random_by_speed(9.0, &mut rng).is_none());

        catalog.is_moving = true;
        assert_eq!(
            catalog.random_by_speed(9.0, &mut rng).map(|e| e.name.as_str()),
            Some("fast")
        );
        assert!(catalog.random_by_speed(5.0, &mut rng).is_none());
    }

    #[test]
    fn test_entry_defaults_from_toml() {
        let entry: ObjectData = toml::from_str("prefab = \"truck\"").unwrap();
        assert_eq!(entry.name, "New Object");
        assert_eq!(entry.activation_distance, DEFAULT_ACTIVATION_DISTANCE);
        assert_eq!(entry.weight, 1.0);
        assert!(!entry.is_moving);
    }
}

//! # Collision Volumes
//!
//! Just enough geometry for the forward probe: boxes around obstacles and a
//! short box in front of a moving one.
//!
//! Overlap with the player is not computed here. The engine reports it
//! through [`crate::RunnerWorld::on_overlap`].

use strider_shared::Vec3;

// ============================================================================
// AABB (Axis-Aligned Bounding Box)
// ============================================================================

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner (x, y, z).
    pub min: [f32; 3],
    /// Maximum corner (x, y, z).
    pub max: [f32; 3],
}

impl Aabb {
    /// Creates a box from its corners.
    #[must_use]
    pub const fn new(min: [f32; 3], max: [f32; 3]) -> Self {
        Self { min, max }
    }

    /// Box with its base centered on `position`.
    ///
    /// `size` is `[width, height, depth]`; objects stand on the track, so
    /// the box grows upward from `position.y`.
    #[must_use]
    pub fn from_base(position: Vec3, size: [f32; 3]) -> Self {
        let half_w = size[0] / 2.0;
        let half_d = size[2] / 2.0;
        Self {
            min: [position.x - half_w, position.y, position.z - half_d],
            max: [position.x + half_w, position.y + size[1], position.z + half_d],
        }
    }

    /// Strict overlap test; touching faces do not count.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min[0] < other.max[0]
            && self.max[0] > other.min[0]
            && self.min[1] < other.max[1]
            && self.max[1] > other.min[1]
            && self.min[2] < other.max[2]
            && self.max[2] > other.min[2]
    }

    /// Moves the box by `delta`.
    #[must_use]
    pub fn translate(&self, delta: [f32; 3]) -> Self {
        Self {
            min: [
                self.min[0] + delta[0],
                self.min[1] + delta[1],
                self.min[2] + delta[2],
            ],
            max: [
                self.max[0] + delta[0],
                self.max[1] + delta[1],
                self.max[2] + delta[2],
            ],
        }
    }
}

// ============================================================================
// FORWARD PROBE
// ============================================================================

/// Box covering `distance` units in front of an obstacle moving toward -Z.
///
/// The probe starts at the obstacle's leading face, so the obstacle itself
/// never blocks its own probe.
#[must_use]
pub fn forward_probe(position: Vec3, size: [f32; 3], distance: f32) -> Aabb {
    let body = Aabb::from_base(position, size);
    Aabb::new(
        [body.min[0], body.min[1], body.min[2] - distance.max(0.0)],
        [body.max[0], body.max[1], body.min[2]],
    )
}

/// `true` if the probe overlaps any of the colliders.
#[must_use]
pub fn is_path_blocked<'a, I>(probe: &Aabb, colliders: I) -> bool
where
    I: IntoIterator<Item = &'a Aabb>,
{
    colliders.into_iter().any(|c| probe.intersects(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_intersection() {
        let a = Aabb::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        let b = Aabb::new([0.5, 0.5, 0.5], [1.5, 1.5, 1.5]);
        let c = Aabb::new([2.0, 2.0, 2.0], [3.0, 3.0, 3.0]);

        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(!a.intersects(&a.translate([1.0, 0.0, 0.0])));
    }

    #[test]
    fn test_from_base_stands_on_track() {
        let b = Aabb::from_base(Vec3::new(5.0, 0.0, 10.0), [2.0, 2.0, 2.0]);
        assert_eq!(b.min, [4.0, 0.0, 9.0]);
        assert_eq!(b.max, [6.0, 2.0, 11.0]);
    }

    #[test]
    fn test_probe_sees_obstacle_ahead_in_lane() {
        let size = [2.0, 2.0, 2.0];
        let mover = Vec3::new(0.0, 0.0, 30.0);
        let probe = forward_probe(mover, size, 2.0);

        let ahead = Aabb::from_base(Vec3::new(0.0, 0.0, 27.5), size);
        let far = Aabb::from_base(Vec3::new(0.0, 0.0, 20.0), size);
        let other_lane = Aabb::from_base(Vec3::new(5.0, 0.0, 27.5), size);
        let behind = Aabb::from_base(Vec3::new(0.0, 0.0, 33.0), size);

        assert!(is_path_blocked(&probe, [&ahead]));
        assert!(!is_path_blocked(&probe, [&far, &other_lane, &behind]));
    }

    #[test]
    fn test_probe_ignores_self() {
        let size = [2.0, 2.0, 2.0];
        let mover = Vec3::new(0.0, 0.0, 30.0);
        let own = Aabb::from_base(mover, size);
        assert!(!is_path_blocked(&forward_probe(mover, size, 2.0), [&own]));
    }
}

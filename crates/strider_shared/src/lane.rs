//! # Lane Model
//!
//! The track has exactly three lateral lanes. Each lane maps to a fixed
//! lateral (X) coordinate; the mapping is total and never changes at runtime.

use serde::{Deserialize, Serialize};

/// Number of lanes on the track.
pub const LANE_COUNT: usize = 3;

/// One of the three lateral lanes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Lane {
    /// Leftmost lane (index 0).
    Left,
    /// Middle lane (index 1).
    Center,
    /// Rightmost lane (index 2).
    Right,
}

impl Lane {
    /// All lanes, left to right.
    pub const ALL: [Self; LANE_COUNT] = [Self::Left, Self::Center, Self::Right];

    /// Returns the column index of this lane (0..3).
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Left => 0,
            Self::Center => 1,
            Self::Right => 2,
        }
    }

    /// Converts a column index to a lane, clamping out-of-range indices
    /// to the outermost lane.
    #[inline]
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        match index {
            0 => Self::Left,
            1 => Self::Center,
            _ => Self::Right,
        }
    }

    /// Signed lane number (-1, 0, 1).
    #[inline]
    #[must_use]
    pub const fn number(self) -> i8 {
        self.index() as i8 - 1
    }
}

/// Lateral extent of a single lane.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaneBounds {
    /// Left edge (X).
    pub left: f32,
    /// Right edge (X).
    pub right: f32,
}

impl LaneBounds {
    /// Creates bounds from edges.
    #[must_use]
    pub const fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    /// Lane width.
    #[must_use]
    pub fn width(self) -> f32 {
        self.right - self.left
    }

    /// Lane center.
    #[must_use]
    pub fn center(self) -> f32 {
        self.left + self.width() / 2.0
    }
}

/// Lane-to-lateral-coordinate mapping.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaneLayout {
    /// Center X of each lane, indexed by [`Lane::index`].
    pub centers: [f32; LANE_COUNT],
}

impl LaneLayout {
    /// Creates a layout from explicit lane centers.
    #[must_use]
    pub const fn new(centers: [f32; LANE_COUNT]) -> Self {
        Self { centers }
    }

    /// Creates a layout from per-lane bounds.
    #[must_use]
    pub fn from_bounds(bounds: [LaneBounds; LANE_COUNT]) -> Self {
        Self {
            centers: [bounds[0].center(), bounds[1].center(), bounds[2].center()],
        }
    }

    /// Lateral coordinate of a lane.
    #[inline]
    #[must_use]
    pub const fn lateral_x(&self, lane: Lane) -> f32 {
        self.centers[lane.index()]
    }

    /// Lateral coordinate for a grid column; columns past the last lane clamp.
    #[inline]
    #[must_use]
    pub const fn lateral_for_index(&self, index: usize) -> f32 {
        self.lateral_x(Lane::from_index(index))
    }

    /// Quantizes a lateral coordinate to the nearest lane.
    #[must_use]
    pub fn nearest_lane(&self, x: f32) -> Lane {
        let mut best = Lane::Center;
        let mut best_dist = f32::INFINITY;
        for lane in Lane::ALL {
            let dist = (self.lateral_x(lane) - x).abs();
            if dist < best_dist {
                best = lane;
                best_dist = dist;
            }
        }
        best
    }
}

impl Default for LaneLayout {
    /// Three 5-unit lanes spanning [-7.5, 7.5].
    fn default() -> Self {
        Self::from_bounds([
            LaneBounds::new(-7.5, -2.5),
            LaneBounds::new(-2.5, 2.5),
            LaneBounds::new(2.5, 7.5),
        ])
    }
}

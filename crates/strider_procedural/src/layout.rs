//! # Layout Grid
//!
//! A chunk template describes its contents as a segment × lane table of
//! [`CellKind`]s. Segment 0 is the near end of the chunk.
//!
//! ## Addressing
//!
//! ```text
//! index   = segment * lanes + lane
//! segment = floor(z_offset / cell_size)
//! center  = (segment + 0.5) * cell_size
//! ```
//!
//! Out-of-range reads clamp to the nearest valid cell instead of failing.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, LayoutResult};

/// Smallest cell size a grid accepts through [`LayoutGrid::set_cell_size`].
pub const MIN_CELL_SIZE: f32 = 0.1;

// =============================================================================
// CELL KINDS
// =============================================================================

/// What a layout cell holds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    /// Nothing.
    #[default]
    Empty,
    /// Marker for a pooled moving obstacle, promoted as the player nears.
    Moving,
    /// Ground obstacle.
    Static,
    /// Obstacle the player jumps over.
    Jump,
    /// Collectible.
    Collectible,
}

impl CellKind {
    /// Stable numeric code, as stored by authoring tools.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Moving => 1,
            Self::Static => 2,
            Self::Jump => 3,
            Self::Collectible => 10,
        }
    }

    /// Inverse of [`CellKind::code`].
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Empty),
            1 => Some(Self::Moving),
            2 => Some(Self::Static),
            3 => Some(Self::Jump),
            10 => Some(Self::Collectible),
            _ => None,
        }
    }

    /// Glyph used in config rows.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Empty => '.',
            Self::Moving => 'M',
            Self::Static => 'S',
            Self::Jump => 'J',
            Self::Collectible => 'C',
        }
    }

    /// Inverse of [`CellKind::glyph`]. Letters are case-insensitive.
    #[must_use]
    pub fn from_glyph(glyph: char) -> Option<Self> {
        match glyph.to_ascii_uppercase() {
            '.' | '-' | ' ' => Some(Self::Empty),
            'M' => Some(Self::Moving),
            'S' => Some(Self::Static),
            'J' => Some(Self::Jump),
            'C' => Some(Self::Collectible),
            _ => None,
        }
    }

    /// Static and jump cells are obstacles placed by the generator.
    #[must_use]
    pub const fn is_placed_obstacle(self) -> bool {
        matches!(self, Self::Static | Self::Jump)
    }
}

// =============================================================================
// DIFFICULTY
// =============================================================================

/// Difficulty tier of a chunk template.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// Rolled for r < 0.50.
    #[default]
    Easy,
    /// Rolled for r < 0.80.
    Medium,
    /// Rolled for r < 0.95.
    Hard,
    /// Everything else.
    Extreme,
}

impl Difficulty {
    /// All tiers, easiest first.
    pub const ALL: [Self; 4] = [Self::Easy, Self::Medium, Self::Hard, Self::Extreme];

    /// Maps a uniform roll in `[0, 1)` to a tier.
    #[must_use]
    pub fn from_roll(roll: f32) -> Self {
        if roll < 0.50 {
            Self::Easy
        } else if roll < 0.80 {
            Self::Medium
        } else if roll < 0.95 {
            Self::Hard
        } else {
            Self::Extreme
        }
    }

    /// Tiers to try, in order, when no template of this tier exists.
    #[must_use]
    pub const fn fallback_order(self) -> [Self; 3] {
        match self {
            Self::Easy => [Self::Medium, Self::Hard, Self::Extreme],
            Self::Medium => [Self::Easy, Self::Hard, Self::Extreme],
            Self::Hard => [Self::Medium, Self::Extreme, Self::Easy],
            Self::Extreme => [Self::Hard, Self::Medium, Self::Easy],
        }
    }
}

// =============================================================================
// GRID
// =============================================================================

/// Segment × lane table of cell kinds.
#[derive(Clone, Debug, PartialEq)]
pub struct LayoutGrid {
    segments: usize,
    lanes: usize,
    cell_size: f32,
    cells: Vec<CellKind>,
}

impl LayoutGrid {
    /// Creates an all-empty grid.
    ///
    /// # Errors
    ///
    /// Fails on zero segments/lanes or a non-positive cell size.
    pub fn new(segments: usize, lanes: usize, cell_size: f32) -> LayoutResult<Self> {
        if segments == 0 || lanes == 0 {
            return Err(LayoutError::EmptyGrid { segments, lanes });
        }
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(LayoutError::InvalidCellSize(cell_size));
        }
        Ok(Self {
            segments,
            lanes,
            cell_size,
            cells: vec![CellKind::Empty; segments * lanes],
        })
    }

    /// Parses a grid from one glyph row per segment, near end first.
    ///
    /// ```rust
    /// use strider_procedural::{CellKind, LayoutGrid};
    ///
    /// let grid = LayoutGrid::from_rows(&["S.C", "...", ".M."], 5.0).unwrap();
    /// assert_eq!(grid.cell(2, 1), CellKind::Moving);
    /// ```
    ///
    /// # Errors
    ///
    /// Fails on an empty row list, rows of differing width, or an unknown
    /// glyph.
    pub fn from_rows<S: AsRef<str>>(rows: &[S], cell_size: f32) -> LayoutResult<Self> {
        let lanes = rows.first().map_or(0, |r| r.as_ref().chars().count());
        let mut grid = Self::new(rows.len(), lanes, cell_size)?;

        for (segment, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let found = row.chars().count();
            if found != lanes {
                return Err(LayoutError::RaggedRow {
                    row: segment,
                    expected: lanes,
                    found,
                });
            }
            for (lane, glyph) in row.chars().enumerate() {
                let kind = CellKind::from_glyph(glyph).ok_or(LayoutError::UnknownGlyph {
                    row: segment,
                    column: lane,
                    glyph,
                })?;
                grid.cells[segment * lanes + lane] = kind;
            }
        }
        Ok(grid)
    }

    /// Renders the grid back to glyph rows.
    #[must_use]
    pub fn to_rows(&self) -> Vec<String> {
        self.cells
            .chunks(self.lanes)
            .map(|row| row.iter().map(|c| c.glyph()).collect())
            .collect()
    }

    /// Number of segments.
    #[inline]
    #[must_use]
    pub const fn segments(&self) -> usize {
        self.segments
    }

    /// Number of lanes.
    #[inline]
    #[must_use]
    pub const fn lanes(&self) -> usize {
        self.lanes
    }

    /// Cell length along Z.
    #[inline]
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Total cell count (always `segments * lanes`).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always `false`: a grid has at least one cell.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Flat index of a cell, with both coordinates clamped.
    #[inline]
    #[must_use]
    pub fn index_of(&self, segment: usize, lane: usize) -> usize {
        segment.min(self.segments - 1) * self.lanes + lane.min(self.lanes - 1)
    }

    /// Reads a cell. Out-of-range coordinates clamp.
    #[inline]
    #[must_use]
    pub fn cell(&self, segment: usize, lane: usize) -> CellKind {
        self.cells[self.index_of(segment, lane)]
    }

    /// Writes a cell. Out-of-range coordinates clamp.
    pub fn set_cell(&mut self, segment: usize, lane: usize, kind: CellKind) {
        let index = self.index_of(segment, lane);
        self.cells[index] = kind;
    }

    /// Changes the grid shape, keeping every cell inside both the old and
    /// the new shape. Zero dimensions are raised to one.
    pub fn resize(&mut self, segments: usize, lanes: usize) {
        let segments = segments.max(1);
        let lanes = lanes.max(1);
        if segments == self.segments && lanes == self.lanes {
            return;
        }

        let mut cells = vec![CellKind::Empty; segments * lanes];
        for seg in 0..segments.min(self.segments) {
            for lane in 0..lanes.min(self.lanes) {
                cells[seg * lanes + lane] = self.cells[seg * self.lanes + lane];
            }
        }
        self.segments = segments;
        self.lanes = lanes;
        self.cells = cells;
    }

    /// Sets the cell size, clamped to [`MIN_CELL_SIZE`]. Non-finite values
    /// are ignored.
    pub fn set_cell_size(&mut self, cell_size: f32) {
        if cell_size.is_finite() {
            self.cell_size = cell_size.max(MIN_CELL_SIZE);
        }
    }

    /// Segment containing a chunk-local Z offset, clamped to the grid.
    #[inline]
    #[must_use]
    pub fn segment_at(&self, z_offset: f32) -> usize {
        let raw = (z_offset / self.cell_size).floor();
        if raw <= 0.0 {
            0
        } else {
            (raw as usize).min(self.segments - 1)
        }
    }

    /// Chunk-local Z of a segment's center.
    #[inline]
    #[must_use]
    pub fn cell_center_offset(&self, segment: usize) -> f32 {
        (segment as f32 + 0.5) * self.cell_size
    }

    /// Iterates `(segment, lane)` for every cell of `kind`, near end first.
    pub fn cells_of_kind(&self, kind: CellKind) -> impl Iterator<Item = (usize, usize)> + '_ {
        let lanes = self.lanes;
        self.cells
            .iter()
            .enumerate()
            .filter(move |(_, c)| **c == kind)
            .map(move |(i, _)| (i / lanes, i % lanes))
    }

    /// Iterates every non-empty cell as `(segment, lane, kind)`.
    pub fn occupied_cells(&self) -> impl Iterator<Item = (usize, usize, CellKind)> + '_ {
        let lanes = self.lanes;
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| **c != CellKind::Empty)
            .map(move |(i, c)| (i / lanes, i % lanes, *c))
    }

    /// Sets every cell to [`CellKind::Empty`].
    pub fn clear(&mut self) {
        self.cells.fill(CellKind::Empty);
    }

    /// Refills the grid with random content.
    ///
    /// Each cell rolls `0..12`: 1 is Moving, 2 Static, 3 Jump, 10
    /// Collectible, anything else Empty.
    pub fn fill_random<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for cell in &mut self.cells {
            *cell = match rng.gen_range(0..12u8) {
                1 => CellKind::Moving,
                2 => CellKind::Static,
                3 => CellKind::Jump,
                10 => CellKind::Collectible,
                _ => CellKind::Empty,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::WorldSeed;

    #[test]
    fn test_codes_roundtrip() {
        for kind in [
            CellKind::Empty,
            CellKind::Moving,
            CellKind::Static,
            CellKind::Jump,
            CellKind::Collectible,
        ] {
            assert_eq!(CellKind::from_code(kind.code()), Some(kind));
            assert_eq!(CellKind::from_glyph(kind.glyph()), Some(kind));
        }
        assert_eq!(CellKind::Collectible.code(), 10);
        assert_eq!(CellKind::from_code(4), None);
    }

    #[test]
    fn test_difficulty_thresholds() {
        assert_eq!(Difficulty::from_roll(0.0), Difficulty::Easy);
        assert_eq!(Difficulty::from_roll(0.49), Difficulty::Easy);
        assert_eq!(Difficulty::from_roll(0.50), Difficulty::Medium);
        assert_eq!(Difficulty::from_roll(0.79), Difficulty::Medium);
        assert_eq!(Difficulty::from_roll(0.80), Difficulty::Hard);
        assert_eq!(Difficulty::from_roll(0.95), Difficulty::Extreme);
    }

    #[test]
    fn test_fallback_covers_every_other_tier() {
        for tier in Difficulty::ALL {
            let order = tier.fallback_order();
            assert!(!order.contains(&tier));
            for other in Difficulty::ALL.iter().filter(|d| **d != tier) {
                assert!(order.contains(other));
            }
        }
        assert_eq!(
            Difficulty::Extreme.fallback_order(),
            [Difficulty::Hard, Difficulty::Medium, Difficulty::Easy]
        );
    }

    #[test]
    fn test_from_rows_and_addressing() {
        let grid = LayoutGrid::from_rows(&["S..", "...", "..C", ".M."], 5.0).unwrap();
        assert_eq!(grid.len(), 12);
        assert_eq!(grid.index_of(3, 1), 10);
        assert_eq!(grid.cell(0, 0), CellKind::Static);
        assert_eq!(grid.cell(2, 2), CellKind::Collectible);
        assert_eq!(grid.cell(3, 1), CellKind::Moving);
        assert_eq!(grid.to_rows(), vec!["S..", "...", "..C", ".M."]);
    }

    #[test]
    fn test_reads_clamp() {
        let grid = LayoutGrid::from_rows(&["..S", "J.."], 5.0).unwrap();
        assert_eq!(grid.cell(0, 99), CellKind::Static);
        assert_eq!(grid.cell(99, 0), CellKind::Jump);
        assert_eq!(grid.segment_at(-3.0), 0);
        assert_eq!(grid.segment_at(7.5), 1);
        assert_eq!(grid.segment_at(1_000.0), 1);
    }

    #[test]
    fn test_from_rows_errors() {
        assert_eq!(
            LayoutGrid::from_rows(&["..", "..."], 5.0),
            Err(LayoutError::RaggedRow {
                row: 1,
                expected: 2,
                found: 3
            })
        );
        assert!(matches!(
            LayoutGrid::from_rows(&[".X."], 5.0),
            Err(LayoutError::UnknownGlyph { glyph: 'X', column: 1, .. })
        ));
        assert!(matches!(
            LayoutGrid::from_rows::<&str>(&[], 5.0),
            Err(LayoutError::EmptyGrid { .. })
        ));
        assert_eq!(
            LayoutGrid::new(1, 3, 0.0),
            Err(LayoutError::InvalidCellSize(0.0))
        );
    }

    #[test]
    fn test_resize_preserves_overlap() {
        let mut grid = LayoutGrid::from_rows(&["S.C", "J.M"], 5.0).unwrap();
        grid.resize(3, 2);
        assert_eq!(grid.len(), 6);
        assert_eq!(grid.to_rows(), vec!["S.", "J.", ".."]);

        grid.resize(1, 4);
        assert_eq!(grid.to_rows(), vec!["S..."]);

        grid.resize(0, 0);
        assert_eq!((grid.segments(), grid.lanes()), (1, 1));
    }

    #[test]
    fn test_cell_size_clamp_and_centers() {
        let mut grid = LayoutGrid::new(4, 3, 5.0).unwrap();
        assert_eq!(grid.cell_center_offset(3), 17.5);
        grid.set_cell_size(-2.0);
        assert_eq!(grid.cell_size(), MIN_CELL_SIZE);
        grid.set_cell_size(f32::NAN);
        assert_eq!(grid.cell_size(), MIN_CELL_SIZE);
    }

    #[test]
    fn test_cells_of_kind_and_clear() {
        let mut grid = LayoutGrid::from_rows(&["M..", "..M", "S.."], 5.0).unwrap();
        let moving: Vec<_> = grid.cells_of_kind(CellKind::Moving).collect();
        assert_eq!(moving, vec![(0, 0), (1, 2)]);
        assert_eq!(grid.occupied_cells().count(), 3);

        grid.clear();
        assert_eq!(grid.occupied_cells().count(), 0);
    }

    #[test]
    fn test_fill_random_only_known_kinds() {
        let mut grid = LayoutGrid::new(40, 3, 5.0).unwrap();
        let mut rng = WorldSeed::new(7).rng(1);
        grid.fill_random(&mut rng);
        let occupied = grid.occupied_cells().count();
        assert!(occupied > 0);
        assert!(occupied < grid.len());
    }
}

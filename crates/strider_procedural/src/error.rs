//! # Layout Errors

use thiserror::Error;

/// Errors raised while building a layout grid.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// Grid with zero segments or zero lanes.
    #[error("layout grid must have at least one segment and one lane (got {segments}x{lanes})")]
    EmptyGrid {
        /// Requested segment count.
        segments: usize,
        /// Requested lane count.
        lanes: usize,
    },

    /// Cell size that is zero, negative or not finite.
    #[error("cell size must be positive and finite (got {0})")]
    InvalidCellSize(f32),

    /// A row whose width differs from the first row.
    #[error("row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        /// Row (segment) index.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of this row.
        found: usize,
    },

    /// A glyph that does not name a cell kind.
    #[error("unknown cell glyph {glyph:?} at row {row}, column {column}")]
    UnknownGlyph {
        /// Row (segment) index.
        row: usize,
        /// Column (lane) index.
        column: usize,
        /// The offending character.
        glyph: char,
    },
}

/// Result type for layout construction.
pub type LayoutResult<T> = Result<T, LayoutError>;

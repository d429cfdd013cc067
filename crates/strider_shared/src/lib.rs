//! # STRIDER Shared
//!
//! Plain data used by every STRIDER crate.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on an engine, a renderer or another
//! STRIDER crate. It is the leaf of the workspace.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod lane;
pub mod math;

pub use constants::{
    COLLECTIBLE_HEIGHT, DEFAULT_CELL_SIZE, DEFAULT_CHUNK_LENGTH, PLAYER_TAG, TICK_RATE,
};
pub use lane::{Lane, LaneBounds, LaneLayout, LANE_COUNT};
pub use math::Vec3;

//! # STRIDER Procedural Generation
//!
//! Deterministic chunk content for an endless three-lane runner.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed always produces the same chunks
//! 2. **Chunked**: The track is built from fixed-length segments
//! 3. **Bounded**: Placement under-fills rather than over-fills or spins
//! 4. **Engine-free**: Objects are plain data, the engine mirrors them
//!
//! ## Core Components
//!
//! - `LayoutGrid`: segment × lane table of cell kinds
//! - `ChunkTemplate`: authored chunk description, pool key
//! - `ObjectCatalog`: weighted obstacle entries
//! - `Chunk`: a live world segment and its anchored objects
//! - `ChunkGenerator`: places objects into a chunk
//!
//! ## Example
//!
//! ```rust
//! use strider_procedural::{
//!     Chunk, ChunkGenerator, ChunkId, ChunkTemplate, Difficulty, GeneratorConfig, LayoutGrid,
//!     PlacementCatalogs, PrefabRef, TemplateId, WorldSeed,
//! };
//! use strider_shared::LaneLayout;
//!
//! let layout = LayoutGrid::from_rows(&["..C", "...", ".M.", "..."], 5.0).unwrap();
//! let template = ChunkTemplate::new(TemplateId(1), "street", Difficulty::Easy).with_layout(layout);
//!
//! let mut chunk = Chunk::new(ChunkId(0), &template);
//! chunk.initialize(100.0);
//! chunk.attach_layout(template.layout.clone());
//!
//! let catalogs = PlacementCatalogs {
//!     collectible: Some(PrefabRef::new("coin")),
//!     ..PlacementCatalogs::default()
//! };
//! let mut generator = ChunkGenerator::new(GeneratorConfig::default(), WorldSeed::new(42));
//! let report = generator.generate(&mut chunk, &LaneLayout::default(), &catalogs);
//! assert_eq!(report.collectibles, 1);
//! assert_eq!(report.moving_markers, 1);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod catalog;
pub mod chunk;
pub mod error;
pub mod generator;
pub mod layout;
pub mod object;
pub mod seed;
pub mod template;

pub use catalog::{ObjectCatalog, ObjectData, PrefabRef, DEFAULT_ACTIVATION_DISTANCE};
pub use chunk::{Chunk, ChunkReset};
pub use error::{LayoutError, LayoutResult};
pub use generator::{
    ChunkGenerator, GenerationReport, GeneratorConfig, Occupancy, Occupant, ObstaclePattern,
    PlacementCatalogs, MAX_OBSTACLES_IN_RADIUS, MAX_OCCUPANTS_PER_SEGMENT,
};
pub use layout::{CellKind, Difficulty, LayoutGrid};
pub use object::{
    ChunkId, ObjectId, ObjectOrigin, ObjectSpawn, WorldObject, WorldObjectKind,
    DEFAULT_COLLECTIBLE_SCORE,
};
pub use seed::{WorldSeed, STREAM_GENERATOR, STREAM_OBSTACLES, STREAM_SELECTION};
pub use template::{BakedProp, ChunkTemplate, TemplateId};

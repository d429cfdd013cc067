//! # World Configuration
//!
//! Everything tunable is read once from TOML at startup. Missing sections
//! take their defaults; out-of-range values are clamped by
//! [`StriderConfig::sanitized`] and never re-checked at runtime.
//!
//! ```toml
//! seed = 42
//!
//! [spawner]
//! chunks_to_keep_ahead = 5
//!
//! [[templates]]
//! id = 1
//! name = "crossing"
//! difficulty = "medium"
//! rows = ["S..", "...", ".M.", "..C"]
//! ```

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strider_procedural::{
    BakedProp, ChunkTemplate, Difficulty, GeneratorConfig, LayoutGrid, ObjectCatalog, ObjectData,
    PlacementCatalogs, PrefabRef, TemplateId, WorldSeed,
};
use strider_shared::{LaneBounds, LaneLayout, DEFAULT_CELL_SIZE, DEFAULT_CHUNK_LENGTH, LANE_COUNT};

use crate::activation::ActivationConfig;
use crate::chunk_pool::ChunkPoolConfig;
use crate::error::{ConfigError, ConfigResult};
use crate::events::DEFAULT_EVENT_CAPACITY;
use crate::mover::MoverConfig;
use crate::obstacle_pool::ObstaclePoolConfig;
use crate::spawner::SpawnerConfig;

// =============================================================================
// LANES
// =============================================================================

/// Lane geometry: explicit centers, or bounds the centers derive from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneConfig {
    /// Center X of each lane.
    pub centers: Option<[f32; LANE_COUNT]>,
    /// Left/right edges of each lane. Used when `centers` is absent.
    pub bounds: Option<[LaneBounds; LANE_COUNT]>,
}

impl LaneConfig {
    /// Resolved lane layout.
    #[must_use]
    pub fn layout(&self) -> LaneLayout {
        match (self.centers, self.bounds) {
            (Some(centers), _) => LaneLayout::new(centers),
            (None, Some(bounds)) => LaneLayout::from_bounds(bounds),
            (None, None) => LaneLayout::default(),
        }
    }
}

// =============================================================================
// TEMPLATES
// =============================================================================

fn is_positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

fn default_chunk_length() -> f32 {
    DEFAULT_CHUNK_LENGTH
}

fn default_cell_size() -> f32 {
    DEFAULT_CELL_SIZE
}

/// One `[[templates]]` entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Pool key; unique.
    pub id: TemplateId,
    /// Human-readable name.
    pub name: String,
    /// Selection tier.
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Chunk floor visual; defaults to the name.
    #[serde(default)]
    pub prefab: Option<PrefabRef>,
    /// Forward length.
    #[serde(default = "default_chunk_length")]
    pub chunk_length: f32,
    /// Forward size of one grid segment.
    #[serde(default = "default_cell_size")]
    pub cell_size: f32,
    /// One string per segment, nearest first, one glyph per lane. Empty
    /// means no grid (scattered placement).
    #[serde(default)]
    pub rows: Vec<String>,
    /// Static props authored at chunk-local positions.
    #[serde(default)]
    pub baked: Vec<BakedProp>,
}

impl TemplateConfig {
    /// Builds the runtime template.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Layout`] if the rows are malformed.
    pub fn build(&self) -> ConfigResult<ChunkTemplate> {
        let mut template = ChunkTemplate::new(self.id, self.name.clone(), self.difficulty)
            .with_length(self.chunk_length);
        if let Some(prefab) = &self.prefab {
            template.prefab = prefab.clone();
        }
        if !self.rows.is_empty() {
            let grid = LayoutGrid::from_rows(&self.rows, self.cell_size).map_err(|source| {
                ConfigError::Layout {
                    template: self.id,
                    source,
                }
            })?;
            template = template.with_layout(grid);
        }
        for prop in &self.baked {
            template = template.with_prop(prop.clone());
        }
        Ok(template)
    }
}

// =============================================================================
// ROOT
// =============================================================================

/// The whole world configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StriderConfig {
    /// Seed every random stream derives from.
    pub seed: u64,
    /// Events in flight before new ones are dropped.
    pub event_capacity: usize,
    /// Lane geometry.
    pub lanes: LaneConfig,
    /// Scroll speed.
    pub mover: MoverConfig,
    /// Lookahead window.
    pub spawner: SpawnerConfig,
    /// Per-template chunk pool sizing.
    pub chunk_pool: ChunkPoolConfig,
    /// Moving obstacle pool sizing.
    pub obstacle_pool: ObstaclePoolConfig,
    /// Moving obstacle catalog and activation tuning.
    pub obstacles: ActivationConfig,
    /// Placement tuning.
    pub generator: GeneratorConfig,
    /// Placement content.
    pub catalogs: PlacementCatalogs,
    /// Chunk templates.
    pub templates: Vec<TemplateConfig>,
}

impl Default for StriderConfig {
    fn default() -> Self {
        Self {
            seed: WorldSeed::default().value(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
            lanes: LaneConfig::default(),
            mover: MoverConfig::default(),
            spawner: SpawnerConfig::default(),
            chunk_pool: ChunkPoolConfig::default(),
            obstacle_pool: ObstaclePoolConfig::default(),
            obstacles: ActivationConfig {
                catalog: ObjectCatalog {
                    entries: vec![ObjectData::new("car", PrefabRef::new("car")).moving(6.0)],
                    is_moving: true,
                },
                ..ActivationConfig::default()
            },
            generator: GeneratorConfig::default(),
            catalogs: PlacementCatalogs {
                obstacles: ObjectCatalog::new(vec![
                    ObjectData::new("barrier", PrefabRef::new("barrier")).with_damage(1.0)
                ]),
                default_obstacle: Some(PrefabRef::new("obstacle")),
                collectible: Some(PrefabRef::new("coin")),
                ..PlacementCatalogs::default()
            },
            templates: vec![TemplateConfig {
                id: TemplateId(1),
                name: "open_road".to_owned(),
                difficulty: Difficulty::Easy,
                prefab: None,
                chunk_length: DEFAULT_CHUNK_LENGTH,
                cell_size: DEFAULT_CELL_SIZE,
                rows: Vec::new(),
                baked: Vec::new(),
            }],
        }
    }
}

impl StriderConfig {
    /// Parses and sanitizes a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for invalid TOML or schema mismatches.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        Ok(config.sanitized())
    }

    /// Reads, parses and sanitizes a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if it is not a valid config.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::info!(
            "Loaded world config from {} ({} template(s), seed {})",
            path.display(),
            config.templates.len(),
            config.seed
        );
        Ok(config)
    }

    /// Clamps every section into a usable range.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        self.event_capacity = self.event_capacity.max(1);
        self.mover = self.mover.sanitized();
        self.spawner = self.spawner.sanitized();
        self.chunk_pool = self.chunk_pool.sanitized();
        self.obstacle_pool = self.obstacle_pool.sanitized();
        self.obstacles = self.obstacles.sanitized();
        self.generator = self.generator.sanitized();
        for template in &mut self.templates {
            if !is_positive(template.chunk_length) {
                template.chunk_length = DEFAULT_CHUNK_LENGTH;
            }
            if !is_positive(template.cell_size) {
                template.cell_size = DEFAULT_CELL_SIZE;
            }
        }
        self
    }

    /// Builds every template, rejecting duplicates and malformed grids.
    ///
    /// # Errors
    ///
    /// [`ConfigError::DuplicateTemplate`] or [`ConfigError::Layout`].
    pub fn build_templates(&self) -> ConfigResult<Vec<Arc<ChunkTemplate>>> {
        let mut seen = HashSet::with_capacity(self.templates.len());
        self.templates
            .iter()
            .map(|t| {
                if !seen.insert(t.id) {
                    return Err(ConfigError::DuplicateTemplate(t.id));
                }
                t.build().map(Arc::new)
            })
            .collect()
    }

    /// World seed.
    #[must_use]
    pub const fn world_seed(&self) -> WorldSeed {
        WorldSeed::new(self.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strider_procedural::{CellKind, LayoutError};

    #[test]
    fn test_empty_document_is_default() {
        let config = StriderConfig::from_toml_str("").unwrap();
        assert_eq!(config, StriderConfig::default());
        assert_eq!(config.spawner.chunks_to_keep_ahead, 5);
        assert_eq!(config.chunk_pool.max_pool_size, 50);
        assert_eq!(config.lanes.layout().centers, [-5.0, 0.0, 5.0]);
    }

    #[test]
    fn test_partial_sections_keep_defaults() {
        let config = StriderConfig::from_toml_str(
            r#"
            seed = 7
            [mover]
            base_speed = 12.0
            [spawner]
            spawn_distance_ahead = 40.0
            "#,
        )
        .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.mover.base_speed, 12.0);
        assert_eq!(config.mover.max_speed, 30.0);
        assert_eq!(config.spawner.spawn_distance_ahead, 40.0);
        assert_eq!(config.spawner.despawn_distance_behind, 10.0);
    }

    #[test]
    fn test_templates_build_grids() {
        let config = StriderConfig::from_toml_str(
            r#"
            [[templates]]
            id = 3
            name = "crossing"
            difficulty = "hard"
            rows = ["S..", "...", ".M.", "..C"]
            "#,
        )
        .unwrap();
        let templates = config.build_templates().unwrap();
        assert_eq!(templates.len(), 1);
        let layout = templates[0].layout.as_ref().unwrap();
        assert_eq!(layout.segments(), 4);
        assert_eq!(layout.cell(2, 1), CellKind::Moving);
        assert_eq!(templates[0].difficulty, Difficulty::Hard);
    }

    #[test]
    fn test_bad_rows_name_the_template() {
        let config = StriderConfig::from_toml_str(
            r#"
            [[templates]]
            id = 9
            name = "broken"
            rows = ["S..", "X.."]
            "#,
        )
        .unwrap();
        match config.build_templates() {
            Err(ConfigError::Layout { template, source }) => {
                assert_eq!(template, TemplateId(9));
                assert!(matches!(source, LayoutError::UnknownGlyph { .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_template_ids() {
        let config = StriderConfig::from_toml_str(
            r#"
            [[templates]]
            id = 1
            name = "a"
            [[templates]]
            id = 1
            name = "b"
            "#,
        )
        .unwrap();
        assert!(matches!(
            config.build_templates(),
            Err(ConfigError::DuplicateTemplate(TemplateId(1)))
        ));
    }

    #[test]
    fn test_sanitize_clamps() {
        let config = StriderConfig::from_toml_str(
            r#"
            [chunk_pool]
            initial_pool_size = 80
            max_pool_size = 0
            [obstacles]
            random_speed_min = 9.0
            random_speed_max = 2.0
            [[templates]]
            id = 1
            name = "a"
            chunk_length = -4.0
            "#,
        )
        .unwrap();
        assert_eq!(config.chunk_pool.max_pool_size, 1);
        assert_eq!(config.chunk_pool.initial_pool_size, 1);
        assert_eq!(config.obstacles.random_speed_min, 2.0);
        assert_eq!(config.templates[0].chunk_length, DEFAULT_CHUNK_LENGTH);
    }

    #[test]
    fn test_segment_caps_clamped_to_two() {
        let config = StriderConfig::from_toml_str(
            r#"
            [generator]
            max_occupants_per_segment = 3
            max_obstacles_in_radius = 9
            "#,
        )
        .unwrap();
        assert_eq!(config.generator.max_occupants_per_segment, 2);
        assert_eq!(config.generator.max_obstacles_in_radius, 2);

        let zero = StriderConfig::from_toml_str(
            "[generator]\nmax_occupants_per_segment = 0\nmax_obstacles_in_radius = 0",
        )
        .unwrap();
        assert_eq!(zero.generator.max_occupants_per_segment, 1);
        assert_eq!(zero.generator.max_obstacles_in_radius, 1);
    }

    #[test]
    fn test_lane_bounds() {
        let config = StriderConfig::from_toml_str(
            r#"
            [lanes]
            bounds = [
                { left = -6.0, right = -2.0 },
                { left = -2.0, right = 2.0 },
                { left = 2.0, right = 6.0 },
            ]
            "#,
        )
        .unwrap();
        assert_eq!(config.lanes.layout().centers, [-4.0, 0.0, 4.0]);
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            StriderConfig::from_toml_str("seed = \"nope\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            StriderConfig::load("/definitely/not/here.toml"),
            Err(ConfigError::Io { .. })
        ));
    }
}

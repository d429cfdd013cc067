//! # Chunk Generator
//!
//! Populates a freshly initialized chunk with concrete objects.
//!
//! ## Modes
//!
//! - **Grid**: the chunk carries a [`LayoutGrid`]. Static/Jump cells become
//!   catalog obstacles, Collectible cells become collectibles, Moving cells
//!   are left alone (the spawner promotes them from the obstacle pool later).
//!   A segment never holds more than `max_occupants_per_segment` objects and
//!   no candidate is accepted if `max_obstacles_in_radius` obstacles already
//!   sit within `obstacle_radius_segments` of it.
//! - **Scattered**: no grid. Obstacles are rejection-sampled along Z with a
//!   minimum spacing and a bounded attempt budget; collectibles are spread
//!   evenly.
//!
//! Obstacle and collectible passes can run as separate calls: each pass
//! rebuilds the occupancy grid from what the chunk already holds.
//!
//! ## Determinism
//!
//! All draws come from the generator's own ChaCha stream.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use strider_shared::{Lane, LaneLayout, Vec3, COLLECTIBLE_HEIGHT, LANE_COUNT};

use crate::catalog::{ObjectCatalog, ObjectData, PrefabRef};
use crate::chunk::Chunk;
use crate::layout::{CellKind, LayoutGrid};
use crate::object::{ObjectSpawn, WorldObjectKind, DEFAULT_COLLECTIBLE_SCORE};
use crate::seed::{WorldSeed, STREAM_GENERATOR};

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Hard ceiling on objects (obstacles + collectibles) in one segment.
pub const MAX_OCCUPANTS_PER_SEGMENT: usize = 2;

/// Hard ceiling on obstacles inside one radius scan.
pub const MAX_OBSTACLES_IN_RADIUS: usize = 2;

/// Placement tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Height offset for collectibles.
    pub collectible_height: f32,
    /// Cap on objects (obstacles + collectibles) per segment, across lanes.
    /// Clamped to `1..=MAX_OCCUPANTS_PER_SEGMENT`.
    pub max_occupants_per_segment: usize,
    /// Neighbourhood, in segments, scanned before accepting an obstacle.
    pub obstacle_radius_segments: usize,
    /// Obstacles allowed inside that neighbourhood.
    /// Clamped to `1..=MAX_OBSTACLES_IN_RADIUS`.
    pub max_obstacles_in_radius: usize,
    /// Scattered mode: obstacles per unit of chunk length.
    pub density: f32,
    /// Scattered mode: minimum Z gap between obstacles.
    pub min_spacing: f32,
    /// Scattered mode: keep-out distance from both chunk ends.
    pub edge_margin: f32,
    /// Scattered mode: evenly spaced collectibles per chunk.
    pub collectibles_per_chunk: usize,
    /// Pattern helpers: segment length.
    pub pattern_segment_length: f32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            collectible_height: COLLECTIBLE_HEIGHT,
            max_occupants_per_segment: MAX_OCCUPANTS_PER_SEGMENT,
            obstacle_radius_segments: 1,
            max_obstacles_in_radius: MAX_OBSTACLES_IN_RADIUS,
            density: 0.3,
            min_spacing: 3.0,
            edge_margin: 2.0,
            collectibles_per_chunk: 5,
            pattern_segment_length: 5.0,
        }
    }
}

impl GeneratorConfig {
    /// Clamps caps and distances into their legal ranges.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        self.max_occupants_per_segment = self
            .max_occupants_per_segment
            .clamp(1, MAX_OCCUPANTS_PER_SEGMENT);
        self.max_obstacles_in_radius = self
            .max_obstacles_in_radius
            .clamp(1, MAX_OBSTACLES_IN_RADIUS);
        self.density = self.density.max(0.0);
        self.min_spacing = self.min_spacing.max(0.0);
        self.edge_margin = self.edge_margin.max(0.0);
        let length = self.pattern_segment_length;
        let usable = length.is_finite() && length > 0.0;
        if !usable {
            self.pattern_segment_length = Self::default().pattern_segment_length;
        }
        self
    }
}

fn default_collectible_score() -> u32 {
    DEFAULT_COLLECTIBLE_SCORE
}

/// Content the generator draws from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlacementCatalogs {
    /// Static obstacles.
    #[serde(default)]
    pub obstacles: ObjectCatalog,
    /// Jump obstacles (falls back to `obstacles`).
    #[serde(default)]
    pub jump: ObjectCatalog,
    /// Used when a catalog is empty.
    #[serde(default)]
    pub default_obstacle: Option<PrefabRef>,
    /// Collectible template.
    #[serde(default)]
    pub collectible: Option<PrefabRef>,
    /// Score per collectible.
    #[serde(default = "default_collectible_score")]
    pub collectible_score: u32,
}

impl Default for PlacementCatalogs {
    fn default() -> Self {
        Self {
            obstacles: ObjectCatalog::default(),
            jump: ObjectCatalog::default(),
            default_obstacle: None,
            collectible: None,
            collectible_score: DEFAULT_COLLECTIBLE_SCORE,
        }
    }
}

/// Fixed obstacle arrangements over 5-unit segments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstaclePattern {
    /// Coin flip per segment, random lane.
    Random,
    /// Alternating left and right.
    ZigZag,
    /// Every lane blocked but one random opening.
    Wall,
}

/// Counts from one generation call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GenerationReport {
    /// Obstacles anchored.
    pub obstacles: usize,
    /// Collectibles anchored.
    pub collectibles: usize,
    /// Moving markers left for promotion.
    pub moving_markers: usize,
    /// Candidates refused by the segment or radius cap.
    pub capped: usize,
    /// Candidates skipped for missing content.
    pub missing_content: usize,
}

impl GenerationReport {
    fn merge(mut self, other: Self) -> Self {
        self.obstacles += other.obstacles;
        self.collectibles += other.collectibles;
        self.moving_markers += other.moving_markers;
        self.capped += other.capped;
        self.missing_content += other.missing_content;
        self
    }
}

// =============================================================================
// OCCUPANCY
// =============================================================================

/// What already sits in a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Occupant {
    /// Any obstacle.
    Obstacle,
    /// A collectible.
    Collectible,
}

/// Segment × lane occupancy of one chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Occupancy {
    segments: usize,
    lanes: usize,
    cells: Vec<Option<Occupant>>,
}

impl Occupancy {
    /// Empty occupancy for a grid shape.
    #[must_use]
    pub fn new(segments: usize, lanes: usize) -> Self {
        let segments = segments.max(1);
        let lanes = lanes.max(1);
        Self {
            segments,
            lanes,
            cells: vec![None; segments * lanes],
        }
    }

    fn index(&self, segment: usize, lane: usize) -> usize {
        segment.min(self.segments - 1) * self.lanes + lane.min(self.lanes - 1)
    }

    /// Occupant of a cell. Coordinates clamp.
    #[must_use]
    pub fn get(&self, segment: usize, lane: usize) -> Option<Occupant> {
        self.cells[self.index(segment, lane)]
    }

    /// Records an occupant. Coordinates clamp.
    pub fn mark(&mut self, segment: usize, lane: usize, occupant: Occupant) {
        let index = self.index(segment, lane);
        self.cells[index] = Some(occupant);
    }

    /// Occupants in a segment, across lanes.
    #[must_use]
    pub fn segment_total(&self, segment: usize) -> usize {
        let start = segment.min(self.segments - 1) * self.lanes;
        self.cells[start..start + self.lanes]
            .iter()
            .filter(|c| c.is_some())
            .count()
    }

    /// Obstacles within `radius` segments of `segment`, inclusive.
    #[must_use]
    pub fn obstacles_within(&self, segment: usize, radius: usize) -> usize {
        let segment = segment.min(self.segments - 1);
        let lo = segment.saturating_sub(radius);
        let hi = (segment + radius).min(self.segments - 1);
        self.cells[lo * self.lanes..(hi + 1) * self.lanes]
            .iter()
            .filter(|c| **c == Some(Occupant::Obstacle))
            .count()
    }
}

// =============================================================================
// GENERATOR
// =============================================================================

fn has_obstacle_content(catalogs: &PlacementCatalogs) -> bool {
    catalogs.obstacles.entries.iter().any(|e| !e.prefab.is_unset())
        || catalogs.default_obstacle.as_ref().is_some_and(|p| !p.is_unset())
}

/// The placement algorithm.
#[derive(Debug)]
pub struct ChunkGenerator {
    config: GeneratorConfig,
    rng: ChaCha8Rng,
}

impl ChunkGenerator {
    /// Creates a generator on the seed's generator stream. The config is
    /// sanitized first, so the segment caps hold for hand-built configs too.
    #[must_use]
    pub fn new(config: GeneratorConfig, seed: WorldSeed) -> Self {
        Self {
            config: config.sanitized(),
            rng: seed.rng(STREAM_GENERATOR),
        }
    }

    /// Placement tuning.
    #[must_use]
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Populates a chunk. Call once per activation.
    ///
    /// Grid mode when the chunk has a layout attached, scattered mode
    /// otherwise.
    pub fn generate(
        &mut self,
        chunk: &mut Chunk,
        lanes: &LaneLayout,
        catalogs: &PlacementCatalogs,
    ) -> GenerationReport {
        if chunk.layout().is_some() {
            let obstacles = self.generate_obstacles(chunk, lanes, catalogs);
            let collectibles = self.generate_collectibles(chunk, lanes, catalogs);
            return obstacles.merge(collectibles);
        }

        let mut report = GenerationReport::default();
        if has_obstacle_content(catalogs) {
            let (density, min_spacing) = (self.config.density, self.config.min_spacing);
            report.obstacles = self
                .generate_scattered(chunk, lanes, catalogs, density, min_spacing)
                .len();
        } else {
            tracing::warn!(
                chunk = chunk.id().0,
                "no obstacle catalog or default obstacle, chunk left without obstacles"
            );
            report.missing_content += 1;
        }
        report.merge(self.spread_collectibles(chunk, lanes, catalogs))
    }

    fn spread_collectibles(
        &mut self,
        chunk: &mut Chunk,
        lanes: &LaneLayout,
        catalogs: &PlacementCatalogs,
    ) -> GenerationReport {
        let count = self.config.collectibles_per_chunk;
        GenerationReport {
            collectibles: self.generate_even_collectibles(chunk, lanes, catalogs, count, true),
            ..GenerationReport::default()
        }
    }

    /// Grid obstacle pass: Static and Jump cells.
    pub fn generate_obstacles(
        &mut self,
        chunk: &mut Chunk,
        lanes: &LaneLayout,
        catalogs: &PlacementCatalogs,
    ) -> GenerationReport {
        let mut report = GenerationReport::default();
        let Some(grid) = chunk.shared_layout() else {
            return report;
        };
        let mut occupancy = self.reconstruct_occupancy(chunk, &grid, lanes);

        for (segment, lane, kind) in grid.occupied_cells() {
            if kind == CellKind::Moving {
                report.moving_markers += 1;
                continue;
            }
            if !kind.is_placed_obstacle() || occupancy.get(segment, lane).is_some() {
                continue;
            }
            if occupancy.segment_total(segment) >= self.config.max_occupants_per_segment
                || occupancy.obstacles_within(segment, self.config.obstacle_radius_segments)
                    >= self.config.max_obstacles_in_radius
            {
                tracing::trace!(segment, lane, ?kind, "obstacle refused by cap");
                report.capped += 1;
                continue;
            }
            let Some(mut spawn) = self.resolve_obstacle(kind, catalogs) else {
                tracing::warn!(
                    chunk = chunk.id().0,
                    segment,
                    lane,
                    "no obstacle content for cell, skipped"
                );
                report.missing_content += 1;
                continue;
            };
            spawn.position = Vec3::new(
                lanes.lateral_for_index(lane),
                0.0,
                chunk.start_z() + grid.cell_center_offset(segment),
            );
            tracing::trace!(segment, lane, ?kind, prefab = %spawn.prefab, "obstacle placed");
            chunk.anchor_object(spawn);
            occupancy.mark(segment, lane, Occupant::Obstacle);
            report.obstacles += 1;
        }
        report
    }

    /// Grid collectible pass: Collectible cells.
    pub fn generate_collectibles(
        &mut self,
        chunk: &mut Chunk,
        lanes: &LaneLayout,
        catalogs: &PlacementCatalogs,
    ) -> GenerationReport {
        let mut report = GenerationReport::default();
        let Some(grid) = chunk.shared_layout() else {
            return report;
        };
        let cells: Vec<(usize, usize)> = grid.cells_of_kind(CellKind::Collectible).collect();
        if cells.is_empty() {
            return report;
        }
        let Some(prefab) = catalogs.collectible.as_ref().filter(|p| !p.is_unset()) else {
            tracing::warn!(
                chunk = chunk.id().0,
                "no collectible template, collectible cells skipped"
            );
            report.missing_content += cells.len();
            return report;
        };
        let mut occupancy = self.reconstruct_occupancy(chunk, &grid, lanes);

        for (segment, lane) in cells {
            if occupancy.get(segment, lane).is_some() {
                continue;
            }
            if occupancy.segment_total(segment) >= self.config.max_occupants_per_segment {
                tracing::trace!(segment, lane, "collectible refused by segment cap");
                report.capped += 1;
                continue;
            }
            let position = Vec3::new(
                lanes.lateral_for_index(lane),
                self.config.collectible_height,
                chunk.start_z() + grid.cell_center_offset(segment),
            );
            chunk.anchor_object(self.collectible_spawn(prefab, catalogs, position));
            occupancy.mark(segment, lane, Occupant::Collectible);
            report.collectibles += 1;
        }
        report
    }

    /// Buckets the chunk's active objects into a grid-shaped occupancy.
    #[must_use]
    pub fn reconstruct_occupancy(
        &self,
        chunk: &Chunk,
        grid: &LayoutGrid,
        lanes: &LaneLayout,
    ) -> Occupancy {
        let mut occupancy = Occupancy::new(grid.segments(), grid.lanes());
        for object in chunk.objects().iter().filter(|o| o.active) {
            let local_z = object.position.z - chunk.start_z();
            if local_z < 0.0 || local_z >= chunk.length() {
                continue;
            }
            let segment = grid.segment_at(local_z);
            let lane = lanes.nearest_lane(object.position.x).index();
            let occupant = if object.kind.is_trigger() {
                Occupant::Collectible
            } else {
                Occupant::Obstacle
            };
            occupancy.mark(segment, lane, occupant);
        }
        occupancy
    }

    /// Scattered obstacles by rejection sampling.
    ///
    /// Targets `round(length * density)` obstacles in
    /// `[edge_margin, length - edge_margin)`, refusing any candidate closer
    /// than `min_spacing` to an accepted one. Gives up after
    /// `6 * target + 20` attempts. Returns the accepted chunk-local offsets.
    pub fn generate_scattered(
        &mut self,
        chunk: &mut Chunk,
        lanes: &LaneLayout,
        catalogs: &PlacementCatalogs,
        density: f32,
        min_spacing: f32,
    ) -> Vec<f32> {
        let length = chunk.length();
        let margin = self.config.edge_margin;
        let target = (length * density.max(0.0)).round() as usize;
        let mut accepted: Vec<f32> = Vec::with_capacity(target);
        if target == 0 || length - margin <= margin {
            return accepted;
        }

        let budget = 6 * target + 20;
        let mut attempts = 0;
        while accepted.len() < target && attempts < budget {
            attempts += 1;
            let z = self.rng.gen_range(margin..length - margin);
            if accepted.iter().any(|used| (z - used).abs() < min_spacing) {
                continue;
            }
            let Some(mut spawn) = self.resolve_obstacle(CellKind::Static, catalogs) else {
                break;
            };
            let lane = self.random_lane();
            spawn.position = Vec3::new(lanes.lateral_x(lane), 0.0, chunk.start_z() + z);
            chunk.anchor_object(spawn);
            accepted.push(z);
        }

        if accepted.len() < target {
            tracing::debug!(
                chunk = chunk.id().0,
                placed = accepted.len(),
                target,
                attempts,
                "scattered placement under-filled"
            );
        }
        accepted
    }

    /// Evenly spaced collectibles at `length / (count + 1)` intervals.
    ///
    /// Lanes are random when `use_lanes` is set, otherwise all Center.
    pub fn generate_even_collectibles(
        &mut self,
        chunk: &mut Chunk,
        lanes: &LaneLayout,
        catalogs: &PlacementCatalogs,
        count: usize,
        use_lanes: bool,
    ) -> usize {
        let Some(prefab) = catalogs.collectible.as_ref().filter(|p| !p.is_unset()) else {
            return 0;
        };
        let spacing = chunk.length() / (count + 1) as f32;
        for i in 0..count {
            let lane = if use_lanes {
                self.random_lane()
            } else {
                Lane::Center
            };
            let position = Vec3::new(
                lanes.lateral_x(lane),
                self.config.collectible_height,
                chunk.start_z() + spacing * (i + 1) as f32,
            );
            chunk.anchor_object(self.collectible_spawn(prefab, catalogs, position));
        }
        count
    }

    /// One collectible per lane at a chunk-local offset.
    pub fn generate_collectible_line(
        &mut self,
        chunk: &mut Chunk,
        lanes: &LaneLayout,
        catalogs: &PlacementCatalogs,
        z_offset: f32,
    ) -> usize {
        let Some(prefab) = catalogs.collectible.as_ref().filter(|p| !p.is_unset()) else {
            return 0;
        };
        for lane in Lane::ALL {
            let position = Vec3::new(
                lanes.lateral_x(lane),
                self.config.collectible_height,
                chunk.start_z() + z_offset,
            );
            chunk.anchor_object(self.collectible_spawn(prefab, catalogs, position));
        }
        LANE_COUNT
    }

    /// Lays a fixed obstacle pattern over `round(length / 5)` segments.
    pub fn generate_pattern(
        &mut self,
        chunk: &mut Chunk,
        lanes: &LaneLayout,
        catalogs: &PlacementCatalogs,
        pattern: ObstaclePattern,
    ) -> usize {
        let segment_length = self.config.pattern_segment_length.max(f32::EPSILON);
        let segments = (chunk.length() / segment_length).round() as usize;
        let mut placed = 0;

        for i in 0..segments {
            let z = chunk.start_z() + (i as f32 + 0.5) * segment_length;
            let blocked: Vec<Lane> = match pattern {
                ObstaclePattern::ZigZag => {
                    vec![if i % 2 == 0 { Lane::Left } else { Lane::Right }]
                }
                ObstaclePattern::Wall => {
                    let open = self.random_lane();
                    Lane::ALL.into_iter().filter(|l| *l != open).collect()
                }
                ObstaclePattern::Random => {
                    if self.rng.gen::<f32>() > 0.5 {
                        vec![self.random_lane()]
                    } else {
                        Vec::new()
                    }
                }
            };
            for lane in blocked {
                let Some(mut spawn) = self.resolve_obstacle(CellKind::Static, catalogs) else {
                    return placed;
                };
                spawn.position = Vec3::new(lanes.lateral_x(lane), 0.0, z);
                chunk.anchor_object(spawn);
                placed += 1;
            }
        }
        placed
    }

    // =========================================================================
    // CONTENT RESOLUTION
    // =========================================================================

    /// Builds an obstacle spawn for a cell kind, position left at zero.
    ///
    /// Jump cells try the jump catalog, then the obstacle catalog. Both fall
    /// back to the default obstacle.
    fn resolve_obstacle(&mut self, kind: CellKind, catalogs: &PlacementCatalogs) -> Option<ObjectSpawn> {
        let object_kind = if kind == CellKind::Jump {
            WorldObjectKind::Jump
        } else {
            WorldObjectKind::Static
        };

        let mut entry: Option<&ObjectData> = None;
        if kind == CellKind::Jump {
            entry = catalogs.jump.pick_weighted(&mut self.rng);
        }
        if entry.is_none() {
            entry = catalogs.obstacles.pick_weighted(&mut self.rng);
        }

        match entry {
            Some(data) if !data.prefab.is_unset() => {
                let mut spawn = ObjectSpawn::new(object_kind, data.prefab.clone(), Vec3::ZERO);
                spawn.damage = data.damage;
                spawn.speed = data.speed;
                Some(spawn)
            }
            _ => catalogs
                .default_obstacle
                .as_ref()
                .filter(|p| !p.is_unset())
                .map(|p| ObjectSpawn::new(object_kind, p.clone(), Vec3::ZERO)),
        }
    }

    fn collectible_spawn(
        &self,
        prefab: &PrefabRef,
        catalogs: &PlacementCatalogs,
        position: Vec3,
    ) -> ObjectSpawn {
        let mut spawn = ObjectSpawn::new(WorldObjectKind::Collectible, prefab.clone(), position);
        spawn.score_value = catalogs.collectible_score;
        spawn
    }

    fn random_lane(&mut self) -> Lane {
        Lane::from_index(self.rng.gen_range(0..LANE_COUNT))
    }
}

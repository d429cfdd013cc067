//! # Chunk Spawner
//!
//! Keeps a window of chunks ahead of the player and retires chunks that
//! fell behind.
//!
//! ## Per-Tick Order
//!
//! ```text
//! 1. Fill the window     while fewer than N chunks, or the last one ends
//!                        short of player_z + spawn_distance_ahead
//! 2. Select + place      difficulty roll, tier fallback, start at the
//!                        previous chunk's end, generate content
//! 3. Promote Moving      cells within [player_z, player_z + moving_spawn]
//!                        get a pooled obstacle, once per cell per activation
//! 4. Retire              end_z < player_z - despawn_distance_behind
//! ```
//!
//! A tick that cannot get a chunk (no template, pool exhausted) stops
//! spawning for that tick and tries again on the next one.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use strider_procedural::{
    CellKind, ChunkGenerator, ChunkId, ChunkTemplate, Difficulty, GeneratorConfig,
    PlacementCatalogs, WorldSeed, STREAM_SELECTION,
};
use strider_shared::constants::{
    DEFAULT_CHUNKS_AHEAD, DEFAULT_DESPAWN_DISTANCE_BEHIND, DEFAULT_MOVING_ACTIVATION_DISTANCE,
    DEFAULT_MOVING_SPAWN_DISTANCE, DEFAULT_SPAWN_DISTANCE_AHEAD,
};
use strider_shared::{LaneLayout, Vec3};

use crate::activation::ObstacleDriver;
use crate::chunk_pool::{ChunkHandle, ChunkPool};
use crate::error::{StreamError, StreamResult};
use crate::events::{EventSender, WorldEvent};
use crate::obstacle_pool::DynamicObstaclePool;

/// Window tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerConfig {
    /// Keep chunks until at least this far ahead of the player.
    pub spawn_distance_ahead: f32,
    /// Retire chunks whose far end is this far behind the player.
    pub despawn_distance_behind: f32,
    /// Minimum number of active chunks.
    pub chunks_to_keep_ahead: usize,
    /// Moving cells this close ahead get a pooled obstacle.
    pub moving_spawn_distance: f32,
    /// Promoted obstacles this close activate immediately.
    pub moving_activation_distance: f32,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            spawn_distance_ahead: DEFAULT_SPAWN_DISTANCE_AHEAD,
            despawn_distance_behind: DEFAULT_DESPAWN_DISTANCE_BEHIND,
            chunks_to_keep_ahead: DEFAULT_CHUNKS_AHEAD,
            moving_spawn_distance: DEFAULT_MOVING_SPAWN_DISTANCE,
            moving_activation_distance: DEFAULT_MOVING_ACTIVATION_DISTANCE,
        }
    }
}

impl SpawnerConfig {
    /// Clamps distances to be non-negative.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        self.spawn_distance_ahead = self.spawn_distance_ahead.max(0.0);
        self.despawn_distance_behind = self.despawn_distance_behind.max(0.0);
        self.moving_spawn_distance = self.moving_spawn_distance.max(0.0);
        self.moving_activation_distance = self.moving_activation_distance.max(0.0);
        self
    }
}

/// Counts from one [`ChunkSpawner::update`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SpawnReport {
    /// Chunks placed.
    pub spawned: usize,
    /// Chunks returned to the pool.
    pub retired: usize,
    /// Moving cells that got a pooled obstacle.
    pub promoted: usize,
    /// Promoted obstacles that were already close enough to activate.
    pub activated: usize,
}

/// Counts from one [`ChunkSpawner::promote_moving_cells`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PromotionReport {
    /// Moving cells that got a pooled obstacle.
    pub promoted: usize,
    /// Of those, how many activated on the spot.
    pub activated: usize,
}

/// The pools a spawner works against, borrowed for one call.
pub struct SpawnContext<'a> {
    /// Chunk instances.
    pub chunks: &'a mut ChunkPool,
    /// Moving obstacles.
    pub obstacles: &'a mut DynamicObstaclePool,
    /// Activation rules and the obstacle random stream.
    pub driver: &'a mut ObstacleDriver,
}

/// Dedup key: one promotion per cell per chunk activation.
type PromotionKey = (ChunkId, usize);

/// Lookahead window of chunks.
pub struct ChunkSpawner {
    config: SpawnerConfig,
    templates: Vec<Arc<ChunkTemplate>>,
    active: VecDeque<ChunkHandle>,
    next_spawn_z: f32,
    promoted: HashSet<PromotionKey>,
    selection_rng: ChaCha8Rng,
    seed: WorldSeed,
    generator: ChunkGenerator,
    lanes: LaneLayout,
    catalogs: PlacementCatalogs,
    chunk_skip: Option<StreamError>,
    promotion_skip: Option<StreamError>,
    events: EventSender,
}

/// Warns when a skip reason first appears, then stays quiet while it
/// persists.
fn note_skip(last: &mut Option<StreamError>, what: &str, reason: StreamError) {
    if *last == Some(reason) {
        tracing::trace!("{} still skipped: {}", what, reason);
    } else {
        tracing::warn!("{} skipped: {}", what, reason);
    }
    *last = Some(reason);
}

impl ChunkSpawner {
    /// Creates a spawner over `templates` with default lanes, catalogs and
    /// generator tuning.
    #[must_use]
    pub fn new(
        config: SpawnerConfig,
        templates: Vec<Arc<ChunkTemplate>>,
        seed: WorldSeed,
        events: EventSender,
    ) -> Self {
        if templates.is_empty() {
            tracing::warn!("Chunk spawner has no templates; nothing will spawn");
        }
        Self {
            config: config.sanitized(),
            templates,
            active: VecDeque::new(),
            next_spawn_z: 0.0,
            promoted: HashSet::new(),
            selection_rng: seed.rng(STREAM_SELECTION),
            seed,
            generator: ChunkGenerator::new(GeneratorConfig::default(), seed),
            lanes: LaneLayout::default(),
            catalogs: PlacementCatalogs::default(),
            chunk_skip: None,
            promotion_skip: None,
            events,
        }
    }

    /// Builder: lane centers.
    #[must_use]
    pub fn with_lanes(mut self, lanes: LaneLayout) -> Self {
        self.lanes = lanes;
        self
    }

    /// Builder: generator content.
    #[must_use]
    pub fn with_catalogs(mut self, catalogs: PlacementCatalogs) -> Self {
        self.catalogs = catalogs;
        self
    }

    /// Builder: generator tuning. Restarts the generator stream.
    #[must_use]
    pub fn with_generator(mut self, config: GeneratorConfig) -> Self {
        self.generator = ChunkGenerator::new(config, self.seed);
        self
    }

    /// Runs one tick: fill the window, promote Moving cells, retire.
    pub fn update(&mut self, ctx: &mut SpawnContext<'_>, player_z: f32) -> SpawnReport {
        let spawned = self.fill_window(ctx.chunks, player_z);
        let promotion = self.promote_moving_cells(ctx, player_z);
        let retired = self.retire_passed_chunks(ctx.chunks, ctx.obstacles, player_z);
        SpawnReport {
            spawned,
            retired,
            promoted: promotion.promoted,
            activated: promotion.activated,
        }
    }

    fn fill_window(&mut self, chunks: &mut ChunkPool, player_z: f32) -> usize {
        let horizon = player_z + self.config.spawn_distance_ahead;
        let mut spawned = 0;

        loop {
            let far_end = self.far_end(chunks);
            let short = self.active.len() < self.config.chunks_to_keep_ahead;
            if !short && far_end.is_some_and(|end| end >= horizon) {
                break;
            }
            match self.spawn_chunk(chunks) {
                Ok(_) => {
                    spawned += 1;
                    self.chunk_skip = None;
                }
                Err(e) => {
                    note_skip(&mut self.chunk_skip, "Chunk spawn", e);
                    break;
                }
            }
        }
        spawned
    }

    fn far_end(&self, chunks: &ChunkPool) -> Option<f32> {
        self.active
            .back()
            .and_then(|h| chunks.chunk(*h))
            .map(strider_procedural::Chunk::end_z)
    }

    /// Shifts every active chunk, its objects and its still-anchored pooled
    /// obstacles by `-delta`.
    pub fn move_chunks(
        &mut self,
        chunks: &mut ChunkPool,
        obstacles: &mut DynamicObstaclePool,
        delta: f32,
    ) {
        if delta == 0.0 {
            return;
        }
        for &handle in &self.active {
            let Some(chunk) = chunks.chunk_mut(handle) else {
                continue;
            };
            chunk.move_chunk(delta);
            for &anchored in chunk.dynamic_anchors() {
                if let Some(obstacle) = obstacles.obstacle_mut(anchored) {
                    obstacle.move_with_world(delta);
                }
            }
            self.events.send(WorldEvent::ChunkMoved {
                chunk: chunk.id(),
                start_z: chunk.start_z(),
            });
        }
        self.next_spawn_z -= delta;
    }

    /// Draws a template: roll a tier, fall back through the tier's
    /// preference list, then uniformly over everything.
    ///
    /// Returns `None` only when no templates are configured.
    pub fn choose_layout_by_difficulty(&mut self) -> Option<Arc<ChunkTemplate>> {
        if self.templates.is_empty() {
            return None;
        }

        let rolled = Difficulty::from_roll(self.selection_rng.gen::<f32>());
        for tier in std::iter::once(rolled).chain(rolled.fallback_order()) {
            let matching: Vec<&Arc<ChunkTemplate>> = self
                .templates
                .iter()
                .filter(|t| t.difficulty == tier)
                .collect();
            if !matching.is_empty() {
                let pick = self.selection_rng.gen_range(0..matching.len());
                if tier != rolled {
                    tracing::trace!("No {:?} template, fell back to {:?}", rolled, tier);
                }
                return Some(Arc::clone(matching[pick]));
            }
        }

        let pick = self.selection_rng.gen_range(0..self.templates.len());
        self.templates.get(pick).cloned()
    }

    /// Places one chunk at the end of the window and generates its content.
    ///
    /// # Errors
    ///
    /// [`StreamError::NoTemplates`] without templates, or whatever the
    /// chunk pool refused with (usually exhaustion).
    pub fn spawn_chunk(&mut self, chunks: &mut ChunkPool) -> StreamResult<ChunkHandle> {
        let template = self
            .choose_layout_by_difficulty()
            .ok_or(StreamError::NoTemplates)?;
        if chunks.template(template.id).is_none() {
            chunks.register_template(Arc::clone(&template));
        }

        let start_z = self.far_end(chunks).unwrap_or(self.next_spawn_z);
        let handle = chunks.get(template.id)?;
        let Some(chunk) = chunks.chunk_mut(handle) else {
            return Err(StreamError::UnknownTemplate(template.id));
        };

        chunk.initialize(start_z);
        chunk.attach_layout(template.layout.clone());
        let report = self.generator.generate(chunk, &self.lanes, &self.catalogs);

        self.events.send(WorldEvent::ChunkActivated {
            chunk: chunk.id(),
            template: template.id,
            start_z,
        });
        for object in chunk.objects().iter().filter(|o| o.active) {
            self.events.send(WorldEvent::ObjectSpawned {
                id: object.id,
                kind: object.kind,
                prefab: object.prefab.clone(),
                position: object.position,
            });
        }
        tracing::debug!(
            "Spawned chunk {:?} ({}) at z={:.1}: {} obstacle(s), {} collectible(s), {} mover cell(s)",
            chunk.id(),
            template.name,
            start_z,
            report.obstacles,
            report.collectibles,
            report.moving_markers
        );

        self.next_spawn_z = chunk.end_z();
        self.active.push_back(handle);
        Ok(handle)
    }

    /// Gives every Moving cell in the promotion window a pooled obstacle.
    ///
    /// Each cell is promoted at most once per chunk activation. If the pool
    /// runs dry the scan stops; unpromoted cells are retried next tick.
    pub fn promote_moving_cells(
        &mut self,
        ctx: &mut SpawnContext<'_>,
        player_z: f32,
    ) -> PromotionReport {
        let window_end = player_z + self.config.moving_spawn_distance;
        let mut candidates = Vec::new();

        for &handle in &self.active {
            let Some(chunk) = ctx.chunks.chunk(handle) else {
                continue;
            };
            let Some(layout) = chunk.layout() else {
                continue;
            };
            for (segment, lane) in layout.cells_of_kind(CellKind::Moving) {
                let z = chunk.start_z() + layout.cell_center_offset(segment);
                if z < player_z || z > window_end {
                    continue;
                }
                let key = (chunk.id(), layout.index_of(segment, lane));
                if self.promoted.contains(&key) {
                    continue;
                }
                let position = Vec3::new(self.lanes.lateral_for_index(lane), 0.0, z);
                candidates.push((handle, key, position));
            }
        }

        let mut report = PromotionReport::default();
        for (chunk_handle, key, position) in candidates {
            let config = ctx.driver.pick_config();
            let placed = ctx.obstacles.get_placed(
                position,
                config,
                Some(chunk_handle),
                self.config.moving_activation_distance,
            );
            let (obstacle, prefab) = match placed {
                Ok(placed) => placed,
                Err(e) => {
                    note_skip(&mut self.promotion_skip, "Moving cell promotion", e.into());
                    break;
                }
            };
            self.promotion_skip = None;
            if let Some(chunk) = ctx.chunks.chunk_mut(chunk_handle) {
                chunk.anchor_dynamic(obstacle);
            }
            self.promoted.insert(key);
            report.promoted += 1;

            self.events.send(WorldEvent::ObstaclePlaced {
                obstacle,
                prefab,
                position,
                chunk: key.0,
            });
            tracing::debug!("Promoted Moving cell {:?} at z={:.1}", key, position.z);

            if position.z - player_z <= self.config.moving_activation_distance
                && ctx.driver.activate(ctx.obstacles, ctx.chunks, obstacle)
            {
                report.activated += 1;
            }
        }
        report
    }

    /// Returns every chunk whose far end is more than
    /// `despawn_distance_behind` behind the player to the pool. Returns how
    /// many were retired.
    pub fn retire_passed_chunks(
        &mut self,
        chunks: &mut ChunkPool,
        obstacles: &mut DynamicObstaclePool,
        player_z: f32,
    ) -> usize {
        let offset = self.config.despawn_distance_behind;
        let mut kept = VecDeque::with_capacity(self.active.len());
        let mut retired = 0;

        for handle in std::mem::take(&mut self.active) {
            let passed = chunks
                .chunk(handle)
                .map_or(true, |c| c.has_passed(player_z, offset));
            if passed {
                self.retire(chunks, obstacles, handle);
                retired += 1;
            } else {
                kept.push_back(handle);
            }
        }
        self.active = kept;
        retired
    }

    fn retire(
        &mut self,
        chunks: &mut ChunkPool,
        obstacles: &mut DynamicObstaclePool,
        handle: ChunkHandle,
    ) {
        if let Some(chunk) = chunks.chunk(handle) {
            let id = chunk.id();
            self.promoted.retain(|(chunk_id, _)| *chunk_id != id);
            tracing::debug!("Retiring chunk {:?} (end z={:.1})", id, chunk.end_z());
        }

        match chunks.release(handle) {
            Ok(reset) => {
                for anchored in reset.released_dynamic {
                    if let Err(e) = obstacles.release(anchored) {
                        tracing::debug!("Anchored obstacle {:?} already recycled: {}", anchored, e);
                    }
                }
            }
            Err(e) => tracing::warn!("Could not retire chunk {:?}: {}", handle, e),
        }
    }

    /// Returns every active chunk to the pool and restarts the window at
    /// `player_z`. Returns how many chunks were released.
    pub fn despawn_all(
        &mut self,
        chunks: &mut ChunkPool,
        obstacles: &mut DynamicObstaclePool,
        player_z: f32,
    ) -> usize {
        let handles = std::mem::take(&mut self.active);
        let count = handles.len();
        for handle in handles {
            self.retire(chunks, obstacles, handle);
        }
        self.promoted.clear();
        self.next_spawn_z = player_z;
        self.chunk_skip = None;
        self.promotion_skip = None;
        count
    }

    /// Active chunks, nearest first.
    pub fn active_chunks(&self) -> impl Iterator<Item = ChunkHandle> + '_ {
        self.active.iter().copied()
    }

    /// Number of active chunks.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Moving cells currently marked as promoted.
    #[must_use]
    pub fn promoted_count(&self) -> usize {
        self.promoted.len()
    }

    /// Where the next chunk starts when the window is empty.
    #[must_use]
    pub const fn next_spawn_z(&self) -> f32 {
        self.next_spawn_z
    }

    /// Configured templates.
    #[must_use]
    pub fn templates(&self) -> &[Arc<ChunkTemplate>] {
        &self.templates
    }

    /// Window tuning in effect.
    #[must_use]
    pub const fn config(&self) -> &SpawnerConfig {
        &self.config
    }
}

//! # Chunk Pool
//!
//! One bounded [`SlotPool`] per chunk template. Instances are created on
//! demand up to `max_pool_size` per template and never destroyed, only
//! activated and deactivated.
//!
//! A [`ChunkHandle`] names the template pool it came from, and every
//! [`Chunk`] remembers its template. Release checks that the two agree.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strider_core::{PoolError, PoolHandle, SlotPool};
use strider_procedural::{Chunk, ChunkId, ChunkReset, ChunkTemplate, TemplateId};
use strider_shared::constants::{DEFAULT_INITIAL_POOL_SIZE, DEFAULT_MAX_POOL_SIZE};

use crate::error::{StreamError, StreamResult};
use crate::events::{EventSender, WorldEvent};

/// Pool sizing, applied per template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkPoolConfig {
    /// Instances created up front when a template is registered.
    pub initial_pool_size: usize,
    /// Hard cap on instances per template.
    pub max_pool_size: usize,
}

impl Default for ChunkPoolConfig {
    fn default() -> Self {
        Self {
            initial_pool_size: DEFAULT_INITIAL_POOL_SIZE,
            max_pool_size: DEFAULT_MAX_POOL_SIZE,
        }
    }
}

impl ChunkPoolConfig {
    /// Clamps sizes into a usable range.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        self.max_pool_size = self.max_pool_size.max(1);
        self.initial_pool_size = self.initial_pool_size.min(self.max_pool_size);
        self
    }
}

/// A checked-out chunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChunkHandle {
    template: TemplateId,
    slot: PoolHandle,
}

impl ChunkHandle {
    /// Builds a handle for a slot of a template pool.
    #[must_use]
    pub const fn new(template: TemplateId, slot: PoolHandle) -> Self {
        Self { template, slot }
    }

    /// Template pool the chunk belongs to.
    #[inline]
    #[must_use]
    pub const fn template(self) -> TemplateId {
        self.template
    }

    /// Slot inside that pool.
    #[inline]
    #[must_use]
    pub const fn slot(self) -> PoolHandle {
        self.slot
    }
}

struct TemplatePool {
    template: Arc<ChunkTemplate>,
    slots: SlotPool<Chunk>,
}

/// Per-template chunk pools.
pub struct ChunkPool {
    config: ChunkPoolConfig,
    pools: HashMap<TemplateId, TemplatePool>,
    next_chunk_id: u32,
    events: EventSender,
}

impl ChunkPool {
    /// Creates an empty pool. Templates are added with
    /// [`ChunkPool::register_template`].
    #[must_use]
    pub fn new(config: ChunkPoolConfig, events: EventSender) -> Self {
        Self {
            config: config.sanitized(),
            pools: HashMap::new(),
            next_chunk_id: 0,
            events,
        }
    }

    /// Adds a template and pre-creates `initial_pool_size` instances.
    ///
    /// Registering the same id twice keeps the first registration.
    pub fn register_template(&mut self, template: Arc<ChunkTemplate>) -> bool {
        if self.pools.contains_key(&template.id) {
            tracing::warn!("Chunk template {:?} already registered", template.id);
            return false;
        }

        let mut slots = SlotPool::new(self.config.max_pool_size);
        let next_id = &mut self.next_chunk_id;
        let events = &self.events;
        let created = slots.prewarm(self.config.initial_pool_size, |_| {
            let chunk = Chunk::new(ChunkId(*next_id), &template);
            *next_id = next_id.wrapping_add(1);
            events.send(WorldEvent::ChunkInstantiated {
                chunk: chunk.id(),
                template: template.id,
            });
            chunk
        });

        tracing::debug!(
            "Chunk pool for template {:?} ({}) warmed with {} instance(s)",
            template.id,
            template.name,
            created
        );
        self.pools
            .insert(template.id, TemplatePool { template, slots });
        true
    }

    /// Checks out an inactive chunk of `template`.
    ///
    /// Reuses a free instance first, creates one while under the cap, and
    /// otherwise reports exhaustion. The chunk is returned inactive; the
    /// caller initializes it at its start position.
    ///
    /// # Errors
    ///
    /// [`StreamError::UnknownTemplate`] if the template was never registered,
    /// [`StreamError::Pool`] with [`PoolError::Exhausted`] at the cap.
    pub fn get(&mut self, template: TemplateId) -> StreamResult<ChunkHandle> {
        let Some(pool) = self.pools.get_mut(&template) else {
            return Err(StreamError::UnknownTemplate(template));
        };

        let next_id = &mut self.next_chunk_id;
        let source = &pool.template;
        let acquired = pool.slots.acquire_with(|_| {
            let chunk = Chunk::new(ChunkId(*next_id), source);
            *next_id = next_id.wrapping_add(1);
            chunk
        })?;

        if !acquired.reused {
            if let Some(chunk) = pool.slots.get(acquired.handle) {
                self.events.send(WorldEvent::ChunkInstantiated {
                    chunk: chunk.id(),
                    template,
                });
            }
        }
        Ok(ChunkHandle::new(template, acquired.handle))
    }

    /// Resets a chunk and puts it back in its template's free queue.
    ///
    /// Returns what the reset handed back (despawned objects, pooled
    /// obstacles still anchored). A handle whose template does not match the
    /// instance, or a chunk already in the pool, is logged and ignored.
    ///
    /// # Errors
    ///
    /// [`StreamError::UnknownTemplate`], [`StreamError::TemplateMismatch`],
    /// or [`StreamError::Pool`] for an invalid or already-released slot.
    pub fn release(&mut self, handle: ChunkHandle) -> StreamResult<ChunkReset> {
        let Some(pool) = self.pools.get_mut(&handle.template) else {
            tracing::warn!("Released chunk names unknown template {:?}", handle.template);
            return Err(StreamError::UnknownTemplate(handle.template));
        };

        let in_use = pool.slots.is_active(handle.slot);
        let Some(chunk) = pool.slots.get_mut(handle.slot) else {
            return Err(PoolError::InvalidHandle(handle.slot).into());
        };
        if chunk.template() != handle.template {
            tracing::warn!(
                "Chunk {:?} belongs to template {:?}, not {:?}; ignoring release",
                chunk.id(),
                chunk.template(),
                handle.template
            );
            return Err(StreamError::TemplateMismatch {
                claimed: handle.template,
                actual: chunk.template(),
            });
        }
        if !in_use {
            tracing::warn!("Chunk {:?} released twice; ignoring", chunk.id());
            return Err(PoolError::NotInUse(handle.slot).into());
        }

        let chunk_id = chunk.id();
        let reset = chunk.reset();
        pool.slots.release(handle.slot)?;

        for id in &reset.despawned {
            self.events.send(WorldEvent::ObjectDespawned { id: *id });
        }
        self.events
            .send(WorldEvent::ChunkDeactivated { chunk: chunk_id });
        Ok(reset)
    }

    /// Chunk behind a handle.
    #[must_use]
    pub fn chunk(&self, handle: ChunkHandle) -> Option<&Chunk> {
        self.pools
            .get(&handle.template)
            .and_then(|p| p.slots.get(handle.slot))
    }

    /// Mutable chunk behind a handle.
    pub fn chunk_mut(&mut self, handle: ChunkHandle) -> Option<&mut Chunk> {
        self.pools
            .get_mut(&handle.template)
            .and_then(|p| p.slots.get_mut(handle.slot))
    }

    /// Every checked-out chunk, across templates.
    pub fn iter_active(&self) -> impl Iterator<Item = (ChunkHandle, &Chunk)> {
        self.pools.iter().flat_map(|(id, pool)| {
            pool.slots
                .iter_active()
                .map(move |(slot, chunk)| (ChunkHandle::new(*id, slot), chunk))
        })
    }

    /// Registered template.
    #[must_use]
    pub fn template(&self, id: TemplateId) -> Option<&Arc<ChunkTemplate>> {
        self.pools.get(&id).map(|p| &p.template)
    }

    /// Checked-out chunks across templates.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.pools.values().map(|p| p.slots.active_count()).sum()
    }

    /// Instances ever created across templates.
    #[must_use]
    pub fn created_count(&self) -> usize {
        self.pools.values().map(|p| p.slots.created()).sum()
    }

    /// Instances ever created for one template.
    #[must_use]
    pub fn created_for(&self, template: TemplateId) -> usize {
        self.pools.get(&template).map_or(0, |p| p.slots.created())
    }

    /// Number of registered templates.
    #[must_use]
    pub fn template_count(&self) -> usize {
        self.pools.len()
    }

    /// Sizing in effect.
    #[must_use]
    pub const fn config(&self) -> &ChunkPoolConfig {
        &self.config
    }
}

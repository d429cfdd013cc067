//! # Chunk Entity
//!
//! A chunk is one fixed-length forward segment of the scrolling world. It
//! owns the static objects anchored to it and remembers which pooled moving
//! obstacles are still riding it.
//!
//! ## Lifecycle
//!
//! ```text
//! new (inactive) ─► initialize(z) ─► move_chunk(Δ)* ─► reset ─► (pool) ─► initialize(z) …
//! ```

use std::sync::Arc;

use strider_core::PoolHandle;
use strider_shared::Vec3;

use crate::layout::LayoutGrid;
use crate::object::{ChunkId, ObjectId, ObjectOrigin, ObjectSpawn, WorldObject, WorldObjectKind};
use crate::template::{ChunkTemplate, TemplateId};

/// What a [`Chunk::reset`] handed back.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChunkReset {
    /// Generated objects that were despawned.
    pub despawned: Vec<ObjectId>,
    /// Pooled obstacles that were still anchored and must go back to their pool.
    pub released_dynamic: Vec<PoolHandle>,
}

/// A live world segment.
#[derive(Clone, Debug)]
pub struct Chunk {
    id: ChunkId,
    template: TemplateId,
    length: f32,
    start_z: f32,
    active: bool,
    layout: Option<Arc<LayoutGrid>>,
    objects: Vec<WorldObject>,
    dynamic_anchors: Vec<PoolHandle>,
    next_serial: u32,
}

impl Chunk {
    /// Builds an inactive instance of a template, including its baked props.
    #[must_use]
    pub fn new(id: ChunkId, template: &ChunkTemplate) -> Self {
        let mut chunk = Self {
            id,
            template: template.id,
            length: template.chunk_length,
            start_z: 0.0,
            active: false,
            layout: None,
            objects: Vec::with_capacity(template.baked.len()),
            dynamic_anchors: Vec::new(),
            next_serial: 0,
        };

        for prop in &template.baked {
            if prop.kind.is_self_driven() {
                tracing::warn!(
                    template = template.id.0,
                    prefab = %prop.prefab,
                    "moving props cannot be baked, use a Moving layout cell"
                );
                continue;
            }
            let mut spawn = ObjectSpawn::new(prop.kind, prop.prefab.clone(), prop.local);
            spawn.damage = prop.damage;
            let object_id = chunk.next_object_id();
            chunk.objects.push(WorldObject::from_spawn(
                object_id,
                spawn,
                ObjectOrigin::Baked { local: prop.local },
            ));
        }
        chunk
    }

    /// Activates the chunk with its near end at `start_z`.
    ///
    /// Baked props are placed at their authored offsets from `start_z`.
    pub fn initialize(&mut self, start_z: f32) {
        self.start_z = start_z;
        self.active = true;
        for object in &mut self.objects {
            if let ObjectOrigin::Baked { local } = object.origin {
                object.position = local.offset_z(start_z);
            }
        }
    }

    /// Shifts the chunk and every anchored object by `-delta` along Z.
    ///
    /// Anchored pooled obstacles are not touched here; see
    /// [`Chunk::dynamic_anchors`].
    pub fn move_chunk(&mut self, delta: f32) {
        self.start_z -= delta;
        for object in &mut self.objects {
            object.move_with_world(delta);
        }
    }

    /// Anchors a new object and returns its id.
    pub fn anchor_object(&mut self, spawn: ObjectSpawn) -> ObjectId {
        let id = self.next_object_id();
        self.objects
            .push(WorldObject::from_spawn(id, spawn, ObjectOrigin::Generated));
        id
    }

    /// Records a pooled obstacle as riding this chunk.
    pub fn anchor_dynamic(&mut self, handle: PoolHandle) {
        if !self.dynamic_anchors.contains(&handle) {
            self.dynamic_anchors.push(handle);
        }
    }

    /// Forgets a pooled obstacle. Returns `false` if it was not anchored.
    pub fn detach_dynamic(&mut self, handle: PoolHandle) -> bool {
        match self.dynamic_anchors.iter().position(|h| *h == handle) {
            Some(index) => {
                self.dynamic_anchors.swap_remove(index);
                true
            }
            None => false,
        }
    }

    /// Despawns one anchored object.
    ///
    /// Generated objects are dropped. Baked props are hidden until the next
    /// reset. Returns `false` if no such object is anchored.
    pub fn remove_object(&mut self, id: ObjectId) -> bool {
        let Some(index) = self.objects.iter().position(|o| o.id == id) else {
            return false;
        };
        match self.objects[index].origin {
            ObjectOrigin::Generated => {
                self.objects.swap_remove(index);
            }
            ObjectOrigin::Baked { .. } => self.objects[index].on_despawn(),
        }
        true
    }

    /// Deactivates the chunk for return to its pool.
    ///
    /// Generated objects are despawned, baked props go back to their
    /// authored positions, the layout is detached and every anchored pooled
    /// obstacle is handed back to the caller.
    pub fn reset(&mut self) -> ChunkReset {
        let mut despawned = Vec::new();
        self.objects.retain_mut(|object| {
            if object.restore() {
                true
            } else {
                object.on_despawn();
                despawned.push(object.id);
                false
            }
        });

        self.active = false;
        self.start_z = 0.0;
        self.layout = None;
        ChunkReset {
            despawned,
            released_dynamic: std::mem::take(&mut self.dynamic_anchors),
        }
    }

    /// `true` once the far end is more than `offset` behind the player.
    #[inline]
    #[must_use]
    pub fn has_passed(&self, player_z: f32, offset: f32) -> bool {
        self.end_z() < player_z - offset
    }

    /// Attaches (or clears) the layout this activation was generated from.
    pub fn attach_layout(&mut self, layout: Option<Arc<LayoutGrid>>) {
        self.layout = layout;
    }

    /// Layout attached for this activation.
    #[must_use]
    pub fn layout(&self) -> Option<&LayoutGrid> {
        self.layout.as_deref()
    }

    /// Shared handle to the attached layout.
    #[must_use]
    pub fn shared_layout(&self) -> Option<Arc<LayoutGrid>> {
        self.layout.clone()
    }

    /// World position of a layout cell center, if a layout is attached.
    #[must_use]
    pub fn cell_world_z(&self, segment: usize) -> Option<f32> {
        self.layout
            .as_ref()
            .map(|l| self.start_z + l.cell_center_offset(segment))
    }

    /// Instance id.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> ChunkId {
        self.id
    }

    /// Template this instance was built from.
    #[inline]
    #[must_use]
    pub const fn template(&self) -> TemplateId {
        self.template
    }

    /// Near end.
    #[inline]
    #[must_use]
    pub const fn start_z(&self) -> f32 {
        self.start_z
    }

    /// Far end (`start_z + length`).
    #[inline]
    #[must_use]
    pub fn end_z(&self) -> f32 {
        self.start_z + self.length
    }

    /// Forward length.
    #[inline]
    #[must_use]
    pub const fn length(&self) -> f32 {
        self.length
    }

    /// Whether the chunk is in the world.
    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Anchored objects.
    #[must_use]
    pub fn objects(&self) -> &[WorldObject] {
        &self.objects
    }

    /// Looks up an anchored object.
    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut WorldObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    /// Active anchored objects of one kind.
    pub fn objects_of_kind(&self, kind: WorldObjectKind) -> impl Iterator<Item = &WorldObject> {
        self.objects
            .iter()
            .filter(move |o| o.active && o.kind == kind)
    }

    /// Pooled obstacles riding this chunk.
    #[must_use]
    pub fn dynamic_anchors(&self) -> &[PoolHandle] {
        &self.dynamic_anchors
    }

    /// Position of a baked prop relative to the chunk's near end.
    #[must_use]
    pub fn local_position(&self, world: Vec3) -> Vec3 {
        world.offset_z(-self.start_z)
    }

    fn next_object_id(&mut self) -> ObjectId {
        let id = ObjectId {
            chunk: self.id,
            serial: self.next_serial,
        };
        self.next_serial = self.next_serial.wrapping_add(1);
        id
    }
}

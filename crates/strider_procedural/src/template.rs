//! # Chunk Templates
//!
//! A template is the authored description a chunk instance is built from.
//! Its id is what the chunk pool keys on.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strider_shared::{Vec3, DEFAULT_CHUNK_LENGTH};

use crate::catalog::PrefabRef;
use crate::layout::{Difficulty, LayoutGrid};
use crate::object::WorldObjectKind;

/// Identity of a chunk template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(pub u32);

/// A static prop authored into a template at a chunk-local position.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BakedProp {
    /// Variant (`dynamic` props are rejected at chunk construction).
    pub kind: WorldObjectKind,
    /// Visual template.
    pub prefab: PrefabRef,
    /// Chunk-local position.
    pub local: Vec3,
    /// Contact damage.
    #[serde(default)]
    pub damage: f32,
}

/// Authored chunk description.
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkTemplate {
    /// Pool key.
    pub id: TemplateId,
    /// Human-readable name.
    pub name: String,
    /// Visual template for the chunk floor.
    pub prefab: PrefabRef,
    /// Selection tier.
    pub difficulty: Difficulty,
    /// Forward length of every instance.
    pub chunk_length: f32,
    /// Grid layout, shared by every instance.
    pub layout: Option<Arc<LayoutGrid>>,
    /// Props created once per instance.
    pub baked: Vec<BakedProp>,
}

impl ChunkTemplate {
    /// Creates a template with no layout and no props.
    #[must_use]
    pub fn new(id: TemplateId, name: impl Into<String>, difficulty: Difficulty) -> Self {
        let name = name.into();
        Self {
            id,
            prefab: PrefabRef::new(name.clone()),
            name,
            difficulty,
            chunk_length: DEFAULT_CHUNK_LENGTH,
            layout: None,
            baked: Vec::new(),
        }
    }

    /// Builder: attaches a layout grid.
    #[must_use]
    pub fn with_layout(mut self, layout: LayoutGrid) -> Self {
        self.layout = Some(Arc::new(layout));
        self
    }

    /// Builder: sets the chunk length (non-positive values keep the default).
    #[must_use]
    pub fn with_length(mut self, chunk_length: f32) -> Self {
        if chunk_length > 0.0 {
            self.chunk_length = chunk_length;
        }
        self
    }

    /// Builder: adds a baked prop.
    #[must_use]
    pub fn with_prop(mut self, prop: BakedProp) -> Self {
        self.baked.push(prop);
        self
    }
}

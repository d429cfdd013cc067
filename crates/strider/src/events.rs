//! # STRIDER Event System
//!
//! Everything the engine substrate has to mirror leaves the core as a
//! [`WorldEvent`] on a bounded channel.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐      ┌─────────────┐      ┌──────────────┐
//! │ Chunk pool   │─────>│             │      │              │
//! │ Obstacle pool│─────>│   Event     │─────>│   Engine     │
//! │ Spawner      │─────>│   Channel   │      │ (visuals,    │
//! │ RunnerWorld  │─────>│             │      │  colliders)  │
//! └──────────────┘      └─────────────┘      └──────────────┘
//! ```
//!
//! Sending never blocks the tick. A full channel drops the event and counts
//! the drop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use strider_core::PoolHandle;
use strider_procedural::{ChunkId, ObjectId, PrefabRef, TemplateId, WorldObjectKind};
use strider_shared::Vec3;

/// Default number of events in flight.
pub const DEFAULT_EVENT_CAPACITY: usize = 4096;

/// Drops between two "bus full" warnings.
const DROP_WARN_INTERVAL: u64 = 1024;

/// Handle of a pooled moving obstacle.
pub type ObstacleHandle = PoolHandle;

/// What the player ran into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HitSource {
    /// A static or jump obstacle anchored to a chunk.
    Object(ObjectId),
    /// A pooled moving obstacle.
    Obstacle(ObstacleHandle),
}

/// Requests and notifications for the engine substrate.
#[derive(Clone, Debug, PartialEq)]
pub enum WorldEvent {
    // =========================================================================
    // Chunk Events
    // =========================================================================
    /// A chunk instance was created for a template pool.
    ChunkInstantiated {
        /// New instance.
        chunk: ChunkId,
        /// Pool it belongs to.
        template: TemplateId,
    },

    /// A chunk entered the world.
    ChunkActivated {
        /// Instance.
        chunk: ChunkId,
        /// Template it was built from.
        template: TemplateId,
        /// Near end.
        start_z: f32,
    },

    /// A chunk scrolled to a new position.
    ChunkMoved {
        /// Instance.
        chunk: ChunkId,
        /// New near end.
        start_z: f32,
    },

    /// A chunk went back to its pool.
    ChunkDeactivated {
        /// Instance.
        chunk: ChunkId,
    },

    // =========================================================================
    // Object Events
    // =========================================================================
    /// An object anchored to a chunk became visible.
    ObjectSpawned {
        /// Object.
        id: ObjectId,
        /// Variant.
        kind: WorldObjectKind,
        /// Visual template.
        prefab: PrefabRef,
        /// World position.
        position: Vec3,
    },

    /// An anchored object was removed or hidden.
    ObjectDespawned {
        /// Object.
        id: ObjectId,
    },

    // =========================================================================
    // Moving Obstacle Events
    // =========================================================================
    /// The obstacle pool created an instance.
    ObstacleInstantiated {
        /// New instance.
        obstacle: ObstacleHandle,
    },

    /// A pooled obstacle was placed dormant on a Moving cell.
    ObstaclePlaced {
        /// Instance.
        obstacle: ObstacleHandle,
        /// Visual template.
        prefab: PrefabRef,
        /// World position.
        position: Vec3,
        /// Chunk it rides until activation.
        chunk: ChunkId,
    },

    /// An obstacle detached from its chunk and started driving.
    ObstacleActivated {
        /// Instance.
        obstacle: ObstacleHandle,
        /// Assigned speed.
        speed: f32,
    },

    /// An obstacle moved.
    ObstacleMoved {
        /// Instance.
        obstacle: ObstacleHandle,
        /// New world position.
        position: Vec3,
    },

    /// An obstacle went back to the pool.
    ObstacleRecycled {
        /// Instance.
        obstacle: ObstacleHandle,
    },

    /// An obstacle's collision volume was enabled or disabled.
    ColliderToggled {
        /// Instance.
        obstacle: ObstacleHandle,
        /// New state.
        enabled: bool,
    },

    // =========================================================================
    // Player Events
    // =========================================================================
    /// The player overlapped an obstacle.
    PlayerHit {
        /// What was hit.
        source: HitSource,
        /// Configured contact damage.
        damage: f32,
    },

    /// The player picked up a collectible.
    CollectiblePicked {
        /// Collectible.
        id: ObjectId,
        /// Score granted.
        score: u32,
    },

    /// Every chunk and obstacle was recycled.
    WorldReset,
}

/// Event bus between the core and the engine.
///
/// Pre-allocates a bounded channel so the hot path never grows memory.
pub struct EventBus {
    /// Producer side, cloned into every pool and the spawner.
    sender: Sender<WorldEvent>,
    /// Receiver end - held by the engine.
    receiver: Receiver<WorldEvent>,
    dropped: Arc<AtomicU64>,
}

impl EventBus {
    /// Creates a bus holding at most `capacity` undelivered events.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum events in flight before new ones are dropped.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity.max(1));
        Self {
            sender,
            receiver,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// A producer handle.
    #[must_use]
    pub fn sender(&self) -> EventSender {
        EventSender {
            sender: self.sender.clone(),
            dropped: Arc::clone(&self.dropped),
        }
    }

    /// Creates a receiver handle.
    #[must_use]
    pub fn receiver(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.receiver.clone(),
        }
    }

    /// A connected sender/receiver pair without keeping the bus around.
    #[must_use]
    pub fn create_pair(capacity: usize) -> (EventSender, EventReceiver) {
        let bus = Self::new(capacity);
        (bus.sender(), bus.receiver())
    }

    /// Events dropped so far because the channel was full or closed.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

/// Producer handle. Cheap to clone.
#[derive(Clone)]
pub struct EventSender {
    sender: Sender<WorldEvent>,
    dropped: Arc<AtomicU64>,
}

impl EventSender {
    /// Queues an event without blocking.
    ///
    /// Returns `false` if the channel is full or nobody listens. The event is
    /// dropped to keep the tick moving.
    #[inline]
    pub fn send(&self, event: WorldEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.record_drop("full");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                self.record_drop("disconnected");
                false
            }
        }
    }

    fn record_drop(&self, reason: &str) {
        let dropped = self.dropped.fetch_add(1, Ordering::Relaxed);
        if dropped % DROP_WARN_INTERVAL == 0 {
            tracing::warn!(
                "Event bus {}: dropped {} event(s) so far, drain the receiver every tick",
                reason,
                dropped + 1
            );
        }
    }
}

/// Consumer handle, normally held by the engine bridge.
#[derive(Clone)]
pub struct EventReceiver {
    receiver: Receiver<WorldEvent>,
}

impl EventReceiver {
    /// Receives all pending events (non-blocking). Also used to discard
    /// a backlog.
    pub fn drain(&self) -> Vec<WorldEvent> {
        let mut events = Vec::with_capacity(64);
        while let Ok(event) = self.receiver.try_recv() {
            events.push(event);
        }
        events
    }

    /// Receives a single event (non-blocking).
    #[must_use]
    pub fn try_recv(&self) -> Option<WorldEvent> {
        self.receiver.try_recv().ok()
    }

    /// Events waiting to be drained.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Returns `true` if there are pending events.
    #[must_use]
    pub fn has_events(&self) -> bool {
        !self.receiver.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_bus_creation() {
        let bus = EventBus::new(16);
        let sender = bus.sender();
        let receiver = bus.receiver();

        assert!(sender.send(WorldEvent::WorldReset));
        assert_eq!(receiver.pending_count(), 1);
        assert!(receiver.has_events());
    }

    #[test]
    fn test_event_drain_preserves_order() {
        let (sender, receiver) = EventBus::create_pair(64);

        for i in 0..10 {
            sender.send(WorldEvent::ChunkDeactivated { chunk: ChunkId(i) });
        }

        let events = receiver.drain();
        assert_eq!(events.len(), 10);
        assert_eq!(events[3], WorldEvent::ChunkDeactivated { chunk: ChunkId(3) });
        assert!(!receiver.has_events());
    }

    #[test]
    fn test_full_channel_drops_and_counts() {
        let bus = EventBus::new(2);
        let sender = bus.sender();

        assert!(sender.send(WorldEvent::WorldReset));
        assert!(sender.send(WorldEvent::WorldReset));
        assert!(!sender.send(WorldEvent::WorldReset));
        assert!(!sender.send(WorldEvent::WorldReset));

        assert_eq!(bus.dropped(), 2);
        assert_eq!(bus.receiver().drain().len(), 2);
        assert!(sender.send(WorldEvent::WorldReset));
    }

    #[test]
    fn test_try_recv_empty() {
        let (_sender, receiver) = EventBus::create_pair(4);
        assert!(receiver.try_recv().is_none());
    }
}

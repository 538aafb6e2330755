//! Collaborator interfaces the core talks to, and recording implementations.
//!
//! The core never renders, pays out rewards, or moves sprites itself. It
//! reports what happened through two injected interfaces:
//! - [`GameStateNotifier`]: enemy defeated, structure damaged, enemy spawned
//! - [`Movement`]: "move this entity to that point"
//!
//! Both are handed to the systems as `Arc<dyn _>` at construction time.
//! [`EventLog`] and [`MoveQueue`] record calls so the caller can drain them
//! at the end of a tick, the same way telemetry is drained.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use rampart_core::events::{EventLog, GameEvent, GameStateNotifier};
//! use rampart_core::entity::EntityId;
//!
//! let log = Arc::new(EventLog::new());
//! log.on_enemy_defeated(EntityId::new(4), 25);
//!
//! assert_eq!(
//!     log.take_events(),
//!     vec![GameEvent::EnemyDefeated { entity: EntityId::new(4), reward: 25 }]
//! );
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// Something the surrounding game state needs to hear about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A hostile's health reached zero.
    EnemyDefeated {
        /// The defeated hostile.
        entity: EntityId,
        /// Its configured reward.
        reward: u32,
    },
    /// A structure took a hit.
    StructureDamaged {
        /// The structure.
        entity: EntityId,
        /// Hit points removed.
        amount: f32,
    },
    /// The wave scheduler created a hostile.
    EnemySpawned {
        /// The new hostile.
        entity: EntityId,
        /// Spawn timestamp.
        time: u64,
    },
}

/// Receives game-state notifications from the combat resolver and the wave
/// scheduler.
pub trait GameStateNotifier: Send + Sync {
    /// A hostile died; pay out `reward`.
    fn on_enemy_defeated(&self, entity: EntityId, reward: u32);
    /// A structure lost `amount` hit points.
    fn on_structure_damaged(&self, entity: EntityId, amount: f32);
    /// A hostile entered the field at `time`.
    fn on_enemy_spawned(&self, entity: EntityId, time: u64);
}

/// Moves entities; pathfinding is entirely the collaborator's business.
pub trait Movement: Send + Sync {
    /// Requests that `entity` head to `point`.
    fn move_entity_to(&self, entity: EntityId, point: Vec2);
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Notifier that records every notification in order.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<GameEvent>>,
}

impl EventLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains and returns all recorded events in the order they happened.
    pub fn take_events(&self) -> Vec<GameEvent> {
        std::mem::take(&mut *lock(&self.events))
    }

    /// Returns a copy of the recorded events without draining them.
    #[must_use]
    pub fn events(&self) -> Vec<GameEvent> {
        lock(&self.events).clone()
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.events).len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.events).is_empty()
    }

    fn push(&self, event: GameEvent) {
        lock(&self.events).push(event);
    }
}

impl GameStateNotifier for EventLog {
    fn on_enemy_defeated(&self, entity: EntityId, reward: u32) {
        self.push(GameEvent::EnemyDefeated { entity, reward });
    }

    fn on_structure_damaged(&self, entity: EntityId, amount: f32) {
        self.push(GameEvent::StructureDamaged { entity, amount });
    }

    fn on_enemy_spawned(&self, entity: EntityId, time: u64) {
        self.push(GameEvent::EnemySpawned { entity, time });
    }
}

/// A recorded move request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveRequest {
    /// Entity to move.
    pub entity: EntityId,
    /// Destination.
    pub point: Vec2,
}

/// Movement collaborator that queues requests for the caller to execute.
#[derive(Debug, Default)]
pub struct MoveQueue {
    requests: Mutex<Vec<MoveRequest>>,
}

impl MoveQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drains queued requests in issue order.
    pub fn take_requests(&self) -> Vec<MoveRequest> {
        std::mem::take(&mut *lock(&self.requests))
    }

    /// Returns the most recent request for `entity`, if any is queued.
    #[must_use]
    pub fn last_for(&self, entity: EntityId) -> Option<MoveRequest> {
        lock(&self.requests)
            .iter()
            .rev()
            .find(|r| r.entity == entity)
            .copied()
    }

    /// Number of queued requests.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Returns true if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.requests).is_empty()
    }
}

impl Movement for MoveQueue {
    fn move_entity_to(&self, entity: EntityId, point: Vec2) {
        lock(&self.requests).push(MoveRequest { entity, point });
    }
}

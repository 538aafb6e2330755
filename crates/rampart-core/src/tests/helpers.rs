//! Test helper functions for setting up simulations and entities.
//!
//! This module provides factory functions and setup utilities that make
//! writing cross-module tests more ergonomic and consistent.

use std::sync::{Arc, Once};

use glam::Vec2;

use crate::arena::Arena;
use crate::config::EngineConfig;
use crate::entity::{
    Attack, Component, EntityId, Health, Structure, StructureTargetPriority, StructureType,
    Target, Unit,
};
use crate::events::{EventLog, GameEvent, MoveQueue};
use crate::simulation::{Simulation, TickReport};
use crate::targeting::Order;
use crate::waves::ArchetypeRegistry;

// =============================================================================
// Tracing
// =============================================================================

static TRACING: Once = Once::new();

/// Installs a test subscriber once. Set `RUST_LOG` to see output.
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

// =============================================================================
// Simulation Setup
// =============================================================================

/// A simulation together with its recording collaborators.
pub struct Harness {
    /// The simulation under test.
    pub sim: Simulation,
    /// Every notification, in order.
    pub events: Arc<EventLog>,
    /// Every move request, in order.
    pub moves: Arc<MoveQueue>,
}

impl Harness {
    /// Default-configured simulation.
    pub fn new() -> Self {
        init_test_tracing();
        let events = Arc::new(EventLog::new());
        let moves = Arc::new(MoveQueue::new());
        let sim = Simulation::new(EngineConfig::default(), events.clone(), moves.clone());
        Self { sim, events, moves }
    }

    /// Steps once, then executes queued moves by teleporting.
    pub fn step(&mut self, now: u64, orders: &[(EntityId, Order)]) -> TickReport {
        let report = self.sim.step(now, orders);
        apply_moves(self.sim.arena_mut(), &self.moves);
        report
    }

    /// Steps from `from` to `to` inclusive every `step_ms`, collecting reports.
    pub fn run(&mut self, from: u64, to: u64, step_ms: u64) -> Vec<TickReport> {
        (from..=to)
            .step_by(usize::try_from(step_ms).unwrap_or(1))
            .map(|now| self.step(now, &[]))
            .collect()
    }

    /// Events of the given kind recorded so far.
    pub fn events_matching(&self, pred: impl Fn(&GameEvent) -> bool) -> Vec<GameEvent> {
        self.events.events().into_iter().filter(|e| pred(e)).collect()
    }
}

/// Drains the queue and places every entity at its last requested point.
pub fn apply_moves(arena: &mut Arena, moves: &MoveQueue) {
    for request in moves.take_requests() {
        arena.set_position(request.entity, request.point);
    }
}

// =============================================================================
// Entity Factories
// =============================================================================

/// Spawns a structure with 1000 hit points.
pub fn spawn_structure(arena: &mut Arena, at: Vec2, kind: StructureType) -> EntityId {
    let id = arena.create_entity("structure", at, 1.0);
    arena.add_component(id, Component::Structure(Structure::new(kind)));
    arena.add_component(id, Component::Health(Health::new(1000.0)));
    id
}

/// Spawns a friendly unit with a direct weapon.
pub fn spawn_defender(arena: &mut Arena, at: Vec2, damage: f32, range: f32) -> EntityId {
    let id = arena.create_entity("defender", at, 1.0);
    arena.add_component(id, Component::Unit(Unit::new("archer")));
    arena.add_component(id, Component::Health(Health::new(100.0)));
    arena.add_component(id, Component::Attack(Attack::direct(damage, range, 1000)));
    arena.add_component(id, Component::Target(Target::new()));
    id
}

/// Spawns a built-in archetype at `at`.
pub fn spawn_hostile(
    arena: &mut Arena,
    enemy_type: &str,
    at: Vec2,
    priority: Option<StructureTargetPriority>,
) -> EntityId {
    arena.spawn(ArchetypeRegistry::builtin().build(enemy_type, priority, at, 0))
}

/// Current hit points of `id`.
pub fn get_hp(arena: &Arena, id: EntityId) -> f32 {
    arena
        .get(id)
        .and_then(|e| e.health.as_ref())
        .map_or(0.0, |h| h.current)
}

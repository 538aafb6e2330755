//! # Rampart Core
//!
//! Combat and wave core for the Rampart tower-defense game.
//!
//! This crate decides who attacks whom, applies the damage and paces enemy
//! waves. Rendering, rewards and pathfinding stay outside: the core talks to
//! them through the collaborator traits in [`events`].
//!
//! ## Architecture
//!
//! - **Entities**: hostiles, friendly units and structures in an [`Arena`]
//! - **Resolver**: the [`CombatResolver`], one damage path for every attack type
//! - **Targeting**: the [`TargetingSystem`] with switch arbitration and orders
//! - **Waves**: the [`WaveScheduler`] and its asynchronous [`WaveLoader`](waves::WaveLoader)
//!
//! The [`Simulation`] runs all of them in a fixed order each tick.
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use glam::Vec2;
//! use rampart_core::{EngineConfig, Simulation};
//! use rampart_core::entity::{Component, Health, Structure, StructureType};
//! use rampart_core::events::{EventLog, MoveQueue};
//!
//! let mut sim = Simulation::new(
//!     EngineConfig::default(),
//!     Arc::new(EventLog::new()),
//!     Arc::new(MoveQueue::new()),
//! );
//! let gate = sim.arena_mut().create_entity("gate", Vec2::new(200.0, 0.0), 1.0);
//! sim.arena_mut().add_component(gate, Component::Structure(Structure::new(StructureType::Gate)));
//! sim.arena_mut().add_component(gate, Component::Health(Health::new(1000.0)));
//!
//! sim.start_wave(1, 0).unwrap();
//! let report = sim.step(0, &[]);
//! assert_eq!(report.waves.spawned.len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod arena;
pub mod config;
pub mod entity;
pub mod error;
pub mod events;
pub mod resolver;
pub mod simulation;
pub mod targeting;
pub mod waves;

#[cfg(test)]
mod tests;

pub use arena::Arena;
pub use config::{EngineConfig, LoaderConfig};
pub use entity::{Entity, EntityId, Faction};
pub use error::{ConfigError, LoadError, WaveError};
pub use events::{GameStateNotifier, Movement};
pub use resolver::{AttackOutcome, CombatResolver};
pub use simulation::{Simulation, TickReport};
pub use targeting::{Order, SwitchDecision, TargetingSystem};
pub use waves::{WaveConfig, WaveScheduler};

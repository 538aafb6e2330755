//! Target acquisition, switch arbitration and player orders.
//!
//! - [`TargetingSystem`]: the per-tick orchestrator for both factions
//! - [`evaluator`]: whether a damaged hostile should switch to its attacker
//! - [`priority`]: the additive priority score and the distance best-match
//! - [`Order`]: standing player instructions for friendly entities
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use glam::Vec2;
//! use rampart_core::arena::Arena;
//! use rampart_core::config::EngineConfig;
//! use rampart_core::entity::{Attack, Component, Enemy, Health, Structure, StructureType, Target};
//! use rampart_core::events::{EventLog, MoveQueue};
//! use rampart_core::resolver::CombatResolver;
//! use rampart_core::targeting::TargetingSystem;
//!
//! let mut arena = Arena::new();
//! let gate = arena.create_entity("gate", Vec2::new(300.0, 0.0), 1.0);
//! arena.add_component(gate, Component::Structure(Structure::new(StructureType::Gate)));
//! arena.add_component(gate, Component::Health(Health::new(500.0)));
//!
//! let grunt = arena.create_entity("grunt", Vec2::ZERO, 1.0);
//! arena.add_component(grunt, Component::Enemy(Enemy::new("basic", 10)));
//! arena.add_component(grunt, Component::Health(Health::new(50.0)));
//! arena.add_component(grunt, Component::Attack(Attack::direct(5.0, 20.0, 1000)));
//! arena.add_component(grunt, Component::Target(Target::new()));
//!
//! let config = EngineConfig::default();
//! let moves = Arc::new(MoveQueue::new());
//! let combat = CombatResolver::new(Arc::new(EventLog::new()), &config);
//! let mut targeting = TargetingSystem::new(config, combat, moves.clone());
//!
//! targeting.update(&mut arena, &[], 0);
//!
//! assert_eq!(moves.last_for(grunt).map(|r| r.point), Some(Vec2::new(300.0, 0.0)));
//! ```

pub mod evaluator;
mod orchestrator;
mod orders;
pub mod priority;

pub use evaluator::SwitchDecision;
pub use orchestrator::{TargetSwitch, TargetingDebugInfo, TargetingReport, TargetingSystem};
pub use orders::Order;

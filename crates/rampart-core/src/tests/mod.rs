//! Cross-module tests.
//!
//! - `determinism.rs`: identical inputs replay to identical state
//! - `integration.rs`: end-to-end ticks through the [`Simulation`](crate::simulation::Simulation)
//! - `properties.rs`: proptest invariants of damage, cooldowns and pacing
//! - `helpers.rs`: setup utilities and factory functions

mod helpers;

pub use helpers::*;

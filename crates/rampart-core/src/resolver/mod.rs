//! Combat resolution.
//!
//! The resolver is where attacks turn into hit-point changes. It handles
//! three delivery mechanisms through a single entry point,
//! [`CombatResolver::execute_attack`]:
//!
//! - **Direct**: damage lands immediately
//! - **Homing projectile**: an in-flight record chases the target
//! - **Area**: a shell flies to where the target stood and explodes
//!
//! Deferred mechanisms are advanced by [`CombatResolver::resolve_impacts`].
//! Every mechanism ends in the same damage primitive, so provenance is
//! recorded and death is announced exactly once, at the moment of impact.
//!
//! # Invariants
//!
//! - Missing components never fail: the operation reports "no effect"
//! - Provenance (`last_damage_from`, `last_damage_time`) is written on every
//!   damage application, before clamping
//! - An enemy-defeated notification fires only on the alive → dead transition

mod combat;
mod impact;

pub use combat::{AttackOutcome, CombatResolver};
pub use impact::{AreaShell, HomingProjectile, ImpactReport, InFlight};

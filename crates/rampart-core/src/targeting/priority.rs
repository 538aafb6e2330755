//! Scoring functions shared by the evaluator and the orchestrator.
//!
//! Two scores exist and they answer different questions:
//! - [`priority_score`]: additive, higher wins. Used to decide whether an
//!   attacker is worth abandoning the current target for.
//! - [`best_match`]: `distance / weight`, lower wins. Used for plain target
//!   acquisition, where proximity dominates.

use crate::arena::Arena;
use crate::entity::EntityId;

/// Maximum contribution of proximity.
pub const DISTANCE_SCORE_MAX: f32 = 40.0;
/// Distance at which proximity stops contributing.
pub const DISTANCE_SATURATION: f32 = 200.0;
/// Damage is divided by this before capping.
pub const DAMAGE_DIVISOR: f32 = 10.0;
/// Maximum contribution of attack damage.
pub const DAMAGE_SCORE_CAP: f32 = 30.0;
/// Weight of missing health.
pub const VULNERABILITY_WEIGHT: f32 = 20.0;
/// Flat bonus for player units.
pub const UNIT_BONUS: f32 = 10.0;

/// The signals a candidate is scored on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriorityInputs {
    /// Distance from the scorer to the candidate.
    pub distance: f32,
    /// The candidate's attack damage, 0 if unarmed.
    pub attack_damage: f32,
    /// The candidate's `current / max` health, 1 if it has no Health.
    pub health_ratio: f32,
    /// Whether the candidate is a player unit.
    pub is_unit: bool,
}

/// Additive priority: proximity, firepower, vulnerability, and category.
#[must_use]
pub fn priority_score(inputs: &PriorityInputs) -> f32 {
    let distance = inputs.distance.max(0.0).min(DISTANCE_SATURATION);
    let distance_score = DISTANCE_SCORE_MAX * (1.0 - distance / DISTANCE_SATURATION);
    let damage_score = (inputs.attack_damage.max(0.0) / DAMAGE_DIVISOR).min(DAMAGE_SCORE_CAP);
    let vulnerability = (1.0 - inputs.health_ratio.clamp(0.0, 1.0)) * VULNERABILITY_WEIGHT;
    let category = if inputs.is_unit { UNIT_BONUS } else { 0.0 };

    distance_score + damage_score + vulnerability + category
}

/// Gathers [`PriorityInputs`] for `candidate` as seen from `scorer`.
///
/// Returns `None` if either entity is missing or lacks a position.
#[must_use]
pub fn candidate_inputs(arena: &Arena, scorer: EntityId, candidate: EntityId) -> Option<PriorityInputs> {
    let distance = arena.distance(scorer, candidate)?;
    let entity = arena.get(candidate)?;
    Some(PriorityInputs {
        distance,
        attack_damage: entity.attack.as_ref().map_or(0.0, |a| a.damage),
        health_ratio: entity.health.as_ref().map_or(1.0, |h| h.ratio()),
        is_unit: entity.unit.is_some(),
    })
}

/// [`priority_score`] of `candidate` as seen from `scorer`.
#[must_use]
pub fn candidate_priority(arena: &Arena, scorer: EntityId, candidate: EntityId) -> Option<f32> {
    candidate_inputs(arena, scorer, candidate).map(|inputs| priority_score(&inputs))
}

/// Picks the candidate minimizing `distance / weight`.
///
/// Candidates are `(id, distance, weight)`; a non-positive weight counts as 1.
/// Ties keep the first candidate seen.
pub fn best_match<I>(candidates: I) -> Option<EntityId>
where
    I: IntoIterator<Item = (EntityId, f32, f32)>,
{
    let mut best: Option<(EntityId, f32)> = None;
    for (id, distance, weight) in candidates {
        let weight = if weight > 0.0 { weight } else { 1.0 };
        let score = distance / weight;
        if best.map_or(true, |(_, current)| score < current) {
            best = Some((id, score));
        }
    }
    best.map(|(id, _)| id)
}

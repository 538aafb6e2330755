//! Target-switch evaluation.
//!
//! Given a hostile that has just been hit, decide whether it should drop its
//! current target and go after the attacker. The evaluation is a pure
//! function of the arena and `now`; it never mutates and never fails. Every
//! outcome carries the reason it was reached.
//!
//! Checks run in a fixed order, and the first one that rejects wins:
//!
//! 1. switching disabled for this hostile
//! 2. switch cooldown still running
//! 3. attacker missing or either side unpositioned
//! 4. attacker beyond pursuit range (`range × pursuit_range_multiplier`)
//! 5. attacker not enough of a threat compared to the current target

use serde::{Deserialize, Serialize};

use crate::arena::Arena;
use crate::entity::{Enemy, EntityId};

use super::priority::candidate_priority;

/// Outcome of one switch evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SwitchDecision {
    /// Switching is turned off for this hostile.
    Disabled,
    /// The last switch was too recent.
    Cooldown {
        /// Time until the next switch is allowed.
        remaining_ms: u64,
    },
    /// No attacker to switch to.
    NoAttacker,
    /// The attacker is beyond pursuit range.
    OutOfRange {
        /// Distance to the attacker.
        distance: f32,
        /// Pursuit range of the hostile.
        pursuit_range: f32,
    },
    /// The attacker does not outrank the current target by the threshold.
    LowerPriority {
        /// Priority of the attacker.
        attacker_priority: f32,
        /// Priority of the current target.
        current_priority: f32,
    },
    /// Switch to the attacker.
    SwitchApproved {
        /// The attacker to pursue.
        new_target_id: EntityId,
        /// Its priority.
        priority: f32,
    },
}

impl SwitchDecision {
    /// Returns true for [`SwitchDecision::SwitchApproved`].
    #[must_use]
    pub const fn is_approved(&self) -> bool {
        matches!(self, Self::SwitchApproved { .. })
    }

    /// Short name of the outcome, as used in logs.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Cooldown { .. } => "cooldown",
            Self::NoAttacker => "no_attacker",
            Self::OutOfRange { .. } => "out_of_range",
            Self::LowerPriority { .. } => "lower_priority",
            Self::SwitchApproved { .. } => "switch_approved",
        }
    }
}

/// Cooldown gate: true when the last switch is at least `cooldown_ms` ago.
#[must_use]
pub fn can_switch(enemy: &Enemy, now: u64) -> bool {
    remaining_cooldown(enemy, now) == 0
}

fn remaining_cooldown(enemy: &Enemy, now: u64) -> u64 {
    enemy.last_target_switch_time.map_or(0, |last| {
        let elapsed = now.saturating_sub(last);
        enemy.target_switching.cooldown_ms.saturating_sub(elapsed)
    })
}

/// Pursuit range of a hostile: weapon range times its pursuit multiplier.
///
/// An unarmed hostile has a pursuit range of 0.
#[must_use]
pub fn pursuit_range(arena: &Arena, enemy: EntityId) -> f32 {
    let Some(entity) = arena.get(enemy) else {
        return 0.0;
    };
    let base = entity.attack.as_ref().map_or(0.0, |a| a.range);
    let multiplier = entity
        .enemy
        .as_ref()
        .map_or(1.0, |e| e.target_switching.pursuit_range_multiplier);
    base * multiplier
}

/// Decides whether `enemy` should switch to `attacker`.
#[must_use]
pub fn evaluate(arena: &Arena, enemy: EntityId, attacker: Option<EntityId>, now: u64) -> SwitchDecision {
    let Some(enemy_data) = arena.get(enemy).and_then(|e| e.enemy.as_ref()) else {
        return SwitchDecision::Disabled;
    };
    if !enemy_data.target_switching.enabled {
        return SwitchDecision::Disabled;
    }

    let remaining_ms = remaining_cooldown(enemy_data, now);
    if remaining_ms > 0 {
        return SwitchDecision::Cooldown { remaining_ms };
    }

    let Some(attacker) = attacker else {
        return SwitchDecision::NoAttacker;
    };
    let Some(distance) = arena.distance(enemy, attacker) else {
        return SwitchDecision::NoAttacker;
    };

    let pursuit_range = pursuit_range(arena, enemy);
    if distance > pursuit_range {
        return SwitchDecision::OutOfRange {
            distance,
            pursuit_range,
        };
    }

    let Some(attacker_priority) = candidate_priority(arena, enemy, attacker) else {
        return SwitchDecision::NoAttacker;
    };

    let current_priority = arena
        .get(enemy)
        .and_then(|e| e.target.as_ref())
        .and_then(|t| t.target_entity_id)
        .filter(|current| arena.get(*current).is_some_and(|e| e.is_alive()))
        .and_then(|current| candidate_priority(arena, enemy, current));

    if let Some(current_priority) = current_priority {
        let required = enemy_data.target_switching.threat_threshold * 100.0;
        if attacker_priority - current_priority < required {
            return SwitchDecision::LowerPriority {
                attacker_priority,
                current_priority,
            };
        }
    }

    SwitchDecision::SwitchApproved {
        new_target_id: attacker,
        priority: attacker_priority,
    }
}

/// True when a hostile pursuing a switched target should go back to its
/// original one.
///
/// That is the case when the pursued target is beyond pursuit range, dead,
/// or gone, and the original target still exists and is alive.
#[must_use]
pub fn should_revert_to_original(arena: &Arena, enemy: EntityId) -> bool {
    let Some(target) = arena.get(enemy).and_then(|e| e.target.as_ref()) else {
        return false;
    };
    if !target.is_switched() {
        return false;
    }
    let original_alive = target
        .original_target_id
        .and_then(|id| arena.get(id))
        .is_some_and(|e| e.is_alive());
    if !original_alive {
        return false;
    }
    !pursued_in_range(arena, enemy)
}

/// True if the current target is alive and within pursuit range.
#[must_use]
pub fn pursued_in_range(arena: &Arena, enemy: EntityId) -> bool {
    let Some(pursued) = arena
        .get(enemy)
        .and_then(|e| e.target.as_ref())
        .and_then(|t| t.target_entity_id)
    else {
        return false;
    };
    if !arena.get(pursued).is_some_and(|e| e.is_alive()) {
        return false;
    }
    arena
        .distance(enemy, pursued)
        .is_some_and(|d| d <= pursuit_range(arena, enemy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Attack, Component, Health, Target, TargetSwitchConfig, Unit};
    use glam::Vec2;

    fn hostile(arena: &mut Arena, at: Vec2, range: f32, switching: TargetSwitchConfig) -> EntityId {
        let id = arena.create_entity("grunt", at, 1.0);
        let mut enemy = Enemy::new("basic", 10);
        enemy.target_switching = switching;
        arena.add_component(id, Component::Enemy(enemy));
        arena.add_component(id, Component::Health(Health::new(100.0)));
        arena.add_component(id, Component::Attack(Attack::direct(10.0, range, 1000)));
        arena.add_component(id, Component::Target(Target::new()));
        id
    }

    fn defender(arena: &mut Arena, at: Vec2, damage: f32) -> EntityId {
        let id = arena.create_entity("archer", at, 1.0);
        arena.add_component(id, Component::Unit(Unit::new("archer")));
        arena.add_component(id, Component::Health(Health::new(100.0)));
        arena.add_component(id, Component::Attack(Attack::direct(damage, 100.0, 1000)));
        id
    }

    #[test]
    fn disabled_wins_over_everything() {
        let mut arena = Arena::new();
        let e = hostile(&mut arena, Vec2::ZERO, 50.0, TargetSwitchConfig::disabled());
        let a = defender(&mut arena, Vec2::new(10.0, 0.0), 10.0);

        assert_eq!(evaluate(&arena, e, Some(a), 0), SwitchDecision::Disabled);
        assert_eq!(evaluate(&arena, e, None, 0), SwitchDecision::Disabled);
    }

    #[test]
    fn cooldown_rejects_until_elapsed() {
        let mut arena = Arena::new();
        let e = hostile(&mut arena, Vec2::ZERO, 50.0, TargetSwitchConfig::default());
        let a = defender(&mut arena, Vec2::new(10.0, 0.0), 10.0);
        arena.get_mut(e).unwrap().enemy.as_mut().unwrap().last_target_switch_time = Some(1000);

        assert_eq!(
            evaluate(&arena, e, Some(a), 3999),
            SwitchDecision::Cooldown { remaining_ms: 1 }
        );
        assert!(evaluate(&arena, e, Some(a), 4000).is_approved());
    }

    #[test]
    fn missing_attacker_is_no_attacker() {
        let mut arena = Arena::new();
        let e = hostile(&mut arena, Vec2::ZERO, 50.0, TargetSwitchConfig::default());

        assert_eq!(evaluate(&arena, e, None, 0), SwitchDecision::NoAttacker);
        assert_eq!(
            evaluate(&arena, e, Some(EntityId::new(404)), 0),
            SwitchDecision::NoAttacker
        );
    }

    #[test]
    fn beyond_pursuit_range_is_out_of_range() {
        let mut arena = Arena::new();
        let e = hostile(&mut arena, Vec2::ZERO, 50.0, TargetSwitchConfig::default());
        let a = defender(&mut arena, Vec2::new(80.0, 0.0), 10.0);

        let decision = evaluate(&arena, e, Some(a), 0);
        assert_eq!(decision.reason(), "out_of_range");
        match decision {
            SwitchDecision::OutOfRange { distance, pursuit_range } => {
                assert!((distance - 80.0).abs() < 1e-4);
                assert!((pursuit_range - 75.0).abs() < 1e-4);
            }
            other => panic!("unexpected decision {other:?}"),
        }
    }

    #[test]
    fn weak_attacker_is_lower_priority() {
        let mut arena = Arena::new();
        let e = hostile(&mut arena, Vec2::ZERO, 50.0, TargetSwitchConfig::default());
        let current = defender(&mut arena, Vec2::new(5.0, 0.0), 100.0);
        let a = defender(&mut arena, Vec2::new(60.0, 0.0), 10.0);
        arena.get_mut(e).unwrap().target = Some(Target::locked_on(current));

        assert_eq!(evaluate(&arena, e, Some(a), 0).reason(), "lower_priority");
    }

    #[test]
    fn dead_current_target_does_not_outrank_attacker() {
        let mut arena = Arena::new();
        let e = hostile(&mut arena, Vec2::ZERO, 50.0, TargetSwitchConfig::default());
        let corpse = defender(&mut arena, Vec2::new(5.0, 0.0), 100.0);
        arena.get_mut(corpse).unwrap().health.as_mut().unwrap().apply_damage(1000.0);
        let a = defender(&mut arena, Vec2::new(40.0, 0.0), 50.0);
        arena.get_mut(e).unwrap().target = Some(Target::locked_on(corpse));

        match evaluate(&arena, e, Some(a), 0) {
            SwitchDecision::SwitchApproved { new_target_id, .. } => assert_eq!(new_target_id, a),
            other => panic!("unexpected decision {other:?}"),
        }
    }

    #[test]
    fn strong_attacker_is_approved_over_current() {
        let mut arena = Arena::new();
        let e = hostile(&mut arena, Vec2::ZERO, 50.0, TargetSwitchConfig::default());
        let current = arena.create_entity("wall", Vec2::new(70.0, 0.0), 1.0);
        arena.add_component(current, Component::Health(Health::new(100.0)));
        let a = defender(&mut arena, Vec2::new(5.0, 0.0), 200.0);
        arena.get_mut(e).unwrap().target = Some(Target::locked_on(current));

        match evaluate(&arena, e, Some(a), 0) {
            SwitchDecision::SwitchApproved { new_target_id, priority } => {
                assert_eq!(new_target_id, a);
                assert!(priority > 50.0);
            }
            other => panic!("unexpected decision {other:?}"),
        }
    }

    #[test]
    fn can_switch_boundary() {
        let mut enemy = Enemy::new("basic", 1);
        enemy.target_switching.cooldown_ms = 3000;
        assert!(can_switch(&enemy, 0));

        enemy.last_target_switch_time = Some(1000);
        assert!(!can_switch(&enemy, 3999));
        assert!(can_switch(&enemy, 4000));
    }

    #[test]
    fn revert_when_pursued_leaves_range() {
        let mut arena = Arena::new();
        let e = hostile(&mut arena, Vec2::ZERO, 50.0, TargetSwitchConfig::default());
        let original = defender(&mut arena, Vec2::new(300.0, 0.0), 10.0);
        let pursued = defender(&mut arena, Vec2::new(40.0, 0.0), 10.0);
        let mut target = Target::locked_on(original);
        target.switch_to(pursued);
        arena.get_mut(e).unwrap().target = Some(target);

        assert!(!should_revert_to_original(&arena, e));

        arena.set_position(pursued, Vec2::new(200.0, 0.0));
        assert!(should_revert_to_original(&arena, e));

        arena.get_mut(original).unwrap().health.as_mut().unwrap().apply_damage(1000.0);
        assert!(!should_revert_to_original(&arena, e));
    }
}

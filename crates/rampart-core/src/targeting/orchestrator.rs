//! Per-tick target acquisition and maintenance.
//!
//! [`TargetingSystem::update`] visits every living entity carrying both
//! `Target` and `Attack`, in id order, and dispatches on faction.
//!
//! # Hostiles
//!
//! 1. Fresh damage provenance runs the switch evaluator once, then is cleared
//! 2. A switched target that is lost or out of pursuit range is reverted or dropped
//! 3. With no valid target, one is picked by structure-target priority
//! 4. The target is attacked when in range, otherwise pursued
//!
//! # Friendlies
//!
//! Special mission, then explicit order, then passive: attack the best hostile
//! within weapon range. Friendlies never chase passively.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::arena::Arena;
use crate::config::EngineConfig;
use crate::entity::{
    ComponentSet, Entity, EntityId, Faction, SpecialMission, StructureTargetPriority,
    StructureType, Target, TargetFlags,
};
use crate::events::Movement;
use crate::resolver::{AttackOutcome, CombatResolver};

use super::evaluator::{self, SwitchDecision};
use super::orders::Order;
use super::priority::{best_match, candidate_priority};

/// An approved target switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSwitch {
    /// The hostile that switched.
    pub entity: EntityId,
    /// Its target before the switch.
    pub from: Option<EntityId>,
    /// Its new target.
    pub to: EntityId,
}

/// What happened during one targeting pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetingReport {
    /// Attacks executed, by attacker.
    pub attacks: Vec<(EntityId, AttackOutcome)>,
    /// Every switch evaluation, by hostile.
    pub decisions: Vec<(EntityId, SwitchDecision)>,
    /// Approved switches.
    pub switches: Vec<TargetSwitch>,
    /// Hostiles that went back to their original target.
    pub reverted: Vec<EntityId>,
}

/// Debug view of one attacker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetingDebugInfo {
    /// The attacker.
    pub attacker_id: EntityId,
    /// Its current target.
    pub target_id: Option<EntityId>,
    /// Living opponents within weapon range.
    pub enemies_in_range: usize,
    /// Whether the current target can still be attacked.
    pub is_valid_target: bool,
}

/// Runs targeting for both factions and hands attacks to the combat resolver.
pub struct TargetingSystem {
    config: EngineConfig,
    combat: CombatResolver,
    movement: Arc<dyn Movement>,
}

impl fmt::Debug for TargetingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetingSystem")
            .field("config", &self.config)
            .field("combat", &self.combat)
            .finish_non_exhaustive()
    }
}

impl TargetingSystem {
    /// Creates a targeting system that attacks through `combat` and moves
    /// entities through `movement`.
    #[must_use]
    pub fn new(config: EngineConfig, combat: CombatResolver, movement: Arc<dyn Movement>) -> Self {
        Self {
            config,
            combat,
            movement,
        }
    }

    /// Returns the engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the combat resolver.
    #[must_use]
    pub const fn combat(&self) -> &CombatResolver {
        &self.combat
    }

    /// Returns the combat resolver mutably, e.g. to resolve impacts.
    pub fn combat_mut(&mut self) -> &mut CombatResolver {
        &mut self.combat
    }

    // =========================================================================
    // Tick
    // =========================================================================

    /// Applies `orders`, then runs one targeting pass at `now`.
    pub fn update(
        &mut self,
        arena: &mut Arena,
        orders: &[(EntityId, Order)],
        now: u64,
    ) -> TargetingReport {
        for (id, order) in orders {
            Self::apply_order(arena, *id, order);
        }

        let mut report = TargetingReport::default();
        for id in arena.query(ComponentSet::TARGET | ComponentSet::ATTACK) {
            let Some(entity) = arena.get(id) else {
                continue;
            };
            if entity.is_dead() {
                continue;
            }
            match entity.faction() {
                Some(Faction::Hostile) => self.update_hostile(arena, id, now, &mut report),
                Some(Faction::Friendly) => self.update_friendly(arena, id, now, &mut report),
                None => {}
            }
        }
        report
    }

    /// Picks which of several recent attackers a defender should answer.
    ///
    /// Scores each living candidate with the additive priority, adding the
    /// recent-attacker bonus when its hit is within the bonus window. Ties
    /// keep the first candidate.
    #[must_use]
    pub fn select_best_attacker_from_multiple(
        &self,
        arena: &Arena,
        defender: EntityId,
        candidates: &[EntityId],
        now: u64,
    ) -> Option<EntityId> {
        let log = arena
            .get(defender)
            .and_then(|e| e.health.as_ref())
            .map_or(&[][..], |h| h.damage_log.as_slice());

        let mut best: Option<(EntityId, f32)> = None;
        for &candidate in candidates {
            if !arena.get(candidate).is_some_and(|e| !e.is_dead()) {
                continue;
            }
            let Some(mut score) = candidate_priority(arena, defender, candidate) else {
                continue;
            };
            let recent = log.iter().any(|r| {
                r.attacker == candidate
                    && now.saturating_sub(r.time) <= self.config.recent_attacker_window_ms
            });
            if recent {
                score += self.config.recent_attacker_bonus;
            }
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((candidate, score));
            }
        }
        best.map(|(id, _)| id)
    }

    /// Debug view of every attacker, in id order.
    #[must_use]
    pub fn debug_snapshot(&self, arena: &Arena) -> Vec<TargetingDebugInfo> {
        arena
            .entities_sorted()
            .filter(|e| e.has(ComponentSet::TARGET | ComponentSet::ATTACK))
            .map(|e| {
                let target_id = e.target.as_ref().and_then(|t| t.target_entity_id);
                TargetingDebugInfo {
                    attacker_id: e.id(),
                    target_id,
                    enemies_in_range: opponents_in_range(arena, e).count(),
                    is_valid_target: target_id.is_some_and(|t| is_valid_target(arena, e.id(), t)),
                }
            })
            .collect()
    }

    // =========================================================================
    // Orders
    // =========================================================================

    fn apply_order(arena: &mut Arena, id: EntityId, order: &Order) {
        let destination = order.structure().and_then(|s| arena.position(s));
        let Some(entity) = arena.get_mut(id) else {
            warn!(entity = %id, "order for unknown entity ignored");
            return;
        };
        if entity.faction() != Some(Faction::Friendly) {
            warn!(entity = %id, "order for non-friendly entity ignored");
            return;
        }
        let Some(target) = entity.target.as_mut() else {
            warn!(entity = %id, "order for entity without targeting ignored");
            return;
        };

        target.end_mission();
        target.clear();
        target.enemy_type_by_order = None;
        target.order = Some(order.clone());

        match order {
            Order::AttackTarget { target: victim, enemy_type } => {
                target.enemy_type_by_order.clone_from(enemy_type);
                if let Some(victim) = victim {
                    target.acquire(*victim);
                    target.flags.insert(TargetFlags::ORDERED);
                }
            }
            Order::DefendStructure { .. } | Order::DeployToStructure { .. } => {
                let Some(destination) = destination else {
                    warn!(entity = %id, "order names a structure without position, ignored");
                    target.order = None;
                    return;
                };
                target.begin_mission(order.mission(), destination);
                Self::undeploy(arena, id);
            }
        }
        debug!(entity = %id, ?order, "order issued");
    }

    fn undeploy(arena: &mut Arena, id: EntityId) {
        let Some(unit) = arena.get_mut(id).and_then(|e| e.unit.as_mut()) else {
            return;
        };
        if !unit.is_deployed {
            return;
        }
        unit.is_deployed = false;
        let previous = unit.deployed_structure_id.take();
        debug!(entity = %id, "unit undeployed");

        let Some(previous) = previous else {
            return;
        };
        if let Some(structure) = arena.get_mut(previous).and_then(|e| e.structure.as_mut()) {
            if structure.deployed_unit_id == Some(id) {
                structure.deployed_unit_id = None;
            }
        }
    }

    // =========================================================================
    // Hostile flow
    // =========================================================================

    fn update_hostile(&mut self, arena: &mut Arena, id: EntityId, now: u64, report: &mut TargetingReport) {
        self.consume_provenance(arena, id, now, report);
        Self::maintain_switched(arena, id, report);

        let current = target_of(arena, id).filter(|t| is_valid_target(arena, id, *t));
        let current = match current {
            Some(current) => Some(current),
            None => {
                let acquired = acquire_structure_target(arena, id);
                if let Some(target) = arena.get_mut(id).and_then(|e| e.target.as_mut()) {
                    match acquired {
                        Some(new_target) => {
                            target.clear();
                            target.acquire(new_target);
                            debug!(entity = %id, target = %new_target, "target acquired");
                        }
                        None => target.clear(),
                    }
                }
                acquired
            }
        };

        if let Some(current) = current {
            self.engage(arena, id, current, true, now, report);
        }
    }

    /// Runs the evaluator on fresh provenance and clears it either way.
    fn consume_provenance(&self, arena: &mut Arena, id: EntityId, now: u64, report: &mut TargetingReport) {
        let Some(health) = arena.get(id).and_then(|e| e.health.as_ref()) else {
            return;
        };
        let Some(last_from) = health.last_damage_from else {
            return;
        };
        if health.recent_damage(now, self.config.damage_freshness_ms).is_none() {
            trace!(entity = %id, "stale damage provenance cleared");
            clear_provenance(arena, id);
            return;
        }

        let attackers = health.distinct_attackers();
        let candidate = if attackers.len() > 1 {
            self.select_best_attacker_from_multiple(arena, id, &attackers, now)
        } else {
            Some(last_from).filter(|a| arena.get(*a).is_some_and(|e| !e.is_dead()))
        };

        let current = target_of(arena, id);
        if candidate.is_some() && candidate == current {
            clear_provenance(arena, id);
            return;
        }

        let decision = evaluator::evaluate(arena, id, candidate, now);
        debug!(entity = %id, reason = decision.reason(), "target switch evaluated");
        report.decisions.push((id, decision));

        if let SwitchDecision::SwitchApproved { new_target_id, .. } = decision {
            let point = arena.position(new_target_id);
            if let Some(entity) = arena.get_mut(id) {
                if let Some(enemy) = entity.enemy.as_mut() {
                    enemy.last_target_switch_time = Some(now);
                }
                if let Some(target) = entity.target.as_mut() {
                    report.switches.push(TargetSwitch {
                        entity: id,
                        from: target.target_entity_id,
                        to: new_target_id,
                    });
                    target.switch_to(new_target_id);
                    target.last_pursuit_point = point;
                }
            }
            if let Some(point) = point {
                self.movement.move_entity_to(id, point);
            }
        }
        clear_provenance(arena, id);
    }

    fn maintain_switched(arena: &mut Arena, id: EntityId, report: &mut TargetingReport) {
        let switched = arena
            .get(id)
            .and_then(|e| e.target.as_ref())
            .is_some_and(Target::is_switched);
        if !switched || evaluator::pursued_in_range(arena, id) {
            return;
        }

        let revert = evaluator::should_revert_to_original(arena, id);
        let Some(target) = arena.get_mut(id).and_then(|e| e.target.as_mut()) else {
            return;
        };
        if revert {
            target.revert_to_original();
            report.reverted.push(id);
            debug!(entity = %id, target = ?target.target_entity_id, "reverted to original target");
        } else {
            target.clear();
            debug!(entity = %id, "switched target lost, target cleared");
        }
    }

    // =========================================================================
    // Friendly flow
    // =========================================================================

    fn update_friendly(&mut self, arena: &mut Arena, id: EntityId, now: u64, report: &mut TargetingReport) {
        let Some(target) = arena.get(id).and_then(|e| e.target.clone()) else {
            return;
        };
        if target.is_on_mission() {
            self.advance_mission(arena, id, &target);
            return;
        }
        let mobile = arena
            .get(id)
            .and_then(|e| e.unit.as_ref())
            .is_some_and(|u| !u.is_deployed);

        if let Some(Order::AttackTarget {
            target: Some(victim),
            ..
        }) = &target.order
        {
            let victim = *victim;
            if is_valid_target(arena, id, victim) {
                if target.target_entity_id != Some(victim) {
                    if let Some(t) = arena.get_mut(id).and_then(|e| e.target.as_mut()) {
                        t.acquire(victim);
                    }
                }
                self.engage(arena, id, victim, mobile, now, report);
                return;
            }
            if let Some(t) = arena.get_mut(id).and_then(|e| e.target.as_mut()) {
                t.order = None;
                t.target_entity_id = None;
                t.flags.remove(TargetFlags::ORDERED);
            }
            debug!(entity = %id, target = %victim, "attack order completed");
        }

        let best = self.select_passive_target(arena, id);
        if let Some(t) = arena.get_mut(id).and_then(|e| e.target.as_mut()) {
            if t.target_entity_id != best {
                match best {
                    Some(best) => t.acquire(best),
                    None => t.target_entity_id = None,
                }
            }
        }
        if let Some(best) = best {
            self.engage(arena, id, best, false, now, report);
        }
    }

    fn advance_mission(&self, arena: &mut Arena, id: EntityId, target: &Target) {
        let Some(destination) = target.mission_destination else {
            if let Some(t) = arena.get_mut(id).and_then(|e| e.target.as_mut()) {
                t.end_mission();
            }
            return;
        };
        let Some(position) = arena.position(id) else {
            return;
        };

        if position.distance(destination) <= self.config.arrival_radius {
            let structure = target.order.as_ref().and_then(Order::structure);
            Self::complete_mission(arena, id, target.special_mission, structure);
            return;
        }
        if target.last_pursuit_point != Some(destination) {
            self.movement.move_entity_to(id, destination);
            if let Some(t) = arena.get_mut(id).and_then(|e| e.target.as_mut()) {
                t.last_pursuit_point = Some(destination);
            }
        }
    }

    fn complete_mission(
        arena: &mut Arena,
        id: EntityId,
        mission: SpecialMission,
        structure: Option<EntityId>,
    ) {
        if let Some(t) = arena.get_mut(id).and_then(|e| e.target.as_mut()) {
            t.end_mission();
            t.order = None;
            t.last_pursuit_point = None;
        }
        if mission == SpecialMission::Deployment {
            if let Some(structure) = structure {
                if let Some(unit) = arena.get_mut(id).and_then(|e| e.unit.as_mut()) {
                    unit.is_deployed = true;
                    unit.deployed_structure_id = Some(structure);
                }
                if let Some(s) = arena.get_mut(structure).and_then(|e| e.structure.as_mut()) {
                    s.deployed_unit_id = Some(id);
                }
            }
        }
        debug!(entity = %id, ?mission, "mission completed");
    }

    fn select_passive_target(&self, arena: &Arena, id: EntityId) -> Option<EntityId> {
        let me = arena.get(id)?;
        let preferred = me
            .target
            .as_ref()
            .and_then(|t| t.enemy_type_by_order.as_deref());
        let weight = self.config.order_match_weight;

        best_match(opponents_in_range(arena, me).filter_map(|candidate| {
            let distance = me.distance_to(candidate)?;
            let matches = preferred.is_some_and(|p| {
                candidate.enemy.as_ref().is_some_and(|e| e.enemy_type == p)
            });
            Some((candidate.id(), distance, if matches { weight } else { 1.0 }))
        }))
    }

    // =========================================================================
    // Shared
    // =========================================================================

    /// Attacks `target` if in range and off cooldown; otherwise moves towards
    /// it when `mobile` and its position changed since the last request.
    fn engage(
        &mut self,
        arena: &mut Arena,
        id: EntityId,
        target: EntityId,
        mobile: bool,
        now: u64,
        report: &mut TargetingReport,
    ) {
        let Some(distance) = arena.distance(id, target) else {
            return;
        };
        let Some(attacker) = arena.get(id) else {
            return;
        };
        let Some(attack) = attacker.attack.as_ref() else {
            return;
        };

        if distance <= attack.range {
            if CombatResolver::is_attack_ready(attack, now) {
                let outcome = self.combat.execute_attack(arena, id, target, now);
                report.attacks.push((id, outcome));
            }
            return;
        }
        if !mobile {
            return;
        }

        let last_point = attacker.target.as_ref().and_then(|t| t.last_pursuit_point);
        let Some(point) = arena.position(target) else {
            return;
        };
        if last_point != Some(point) {
            self.movement.move_entity_to(id, point);
            if let Some(t) = arena.get_mut(id).and_then(|e| e.target.as_mut()) {
                t.last_pursuit_point = Some(point);
            }
            trace!(entity = %id, target = %target, "pursuit requested");
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn target_of(arena: &Arena, id: EntityId) -> Option<EntityId> {
    arena.get(id)?.target.as_ref()?.target_entity_id
}

fn clear_provenance(arena: &mut Arena, id: EntityId) {
    if let Some(health) = arena.get_mut(id).and_then(|e| e.health.as_mut()) {
        health.clear_provenance();
    }
}

fn is_valid_target(arena: &Arena, attacker: EntityId, target: EntityId) -> bool {
    match (arena.get(attacker), arena.get(target)) {
        (Some(a), Some(t)) => a.is_hostile_to(t) && CombatResolver::can_attack_target(t),
        _ => false,
    }
}

/// Living opponents within `me`'s weapon range, in id order.
fn opponents_in_range<'a>(arena: &'a Arena, me: &'a Entity) -> impl Iterator<Item = &'a Entity> + 'a {
    let range = me.attack.as_ref().map_or(0.0, |a| a.range);
    arena.entities_sorted().filter(move |candidate| {
        me.is_hostile_to(candidate)
            && CombatResolver::can_attack_target(candidate)
            && me.distance_to(candidate).is_some_and(|d| d <= range)
    })
}

fn is_selectable_by_hostiles(candidate: &Entity) -> bool {
    candidate.faction() == Some(Faction::Friendly)
        && CombatResolver::can_attack_target(candidate)
        && candidate.structure.as_ref().map_or(true, |s| s.is_attackable())
}

fn matches_priority(candidate: &Entity, priority: StructureTargetPriority) -> bool {
    let structure_type = candidate.structure.as_ref().map(|s| s.structure_type);
    match priority {
        StructureTargetPriority::Gate => structure_type == Some(StructureType::Gate),
        StructureTargetPriority::Defense => {
            structure_type == Some(StructureType::Defense) || candidate.unit.is_some()
        }
        StructureTargetPriority::Any => true,
    }
}

/// Nearest friendly matching the hostile's structure priority, degrading to
/// any friendly when nothing matches.
fn acquire_structure_target(arena: &Arena, id: EntityId) -> Option<EntityId> {
    let me = arena.get(id)?;
    let priority = me
        .enemy
        .as_ref()
        .map_or(StructureTargetPriority::Any, |e| e.structure_target_priority);

    let candidates: Vec<(&Entity, f32)> = arena
        .entities_sorted()
        .filter(|c| c.id() != id && is_selectable_by_hostiles(c))
        .filter_map(|c| Some((c, me.distance_to(c)?)))
        .collect();

    let preferred = best_match(
        candidates
            .iter()
            .filter(|(c, _)| matches_priority(c, priority))
            .map(|(c, d)| (c.id(), *d, 1.0)),
    );
    preferred.or_else(|| {
        if !candidates.is_empty() {
            trace!(entity = %id, ?priority, "no candidate matches priority, using any");
        }
        best_match(candidates.iter().map(|(c, d)| (c.id(), *d, 1.0)))
    })
}

// =============================================================================
// Tests
// =============================================================================

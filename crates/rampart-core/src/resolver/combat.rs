//! Combat resolver: attack execution and damage application.
//!
//! The `CombatResolver` handles:
//! - Direct attacks: damage applied on execution
//! - Homing projectiles: launched on execution, damage applied on impact
//! - Area attacks: shell launched on execution, splash damage on detonation
//!
//! # Death Handling
//!
//! When a defender's health reaches 0 its `is_dead` flag is set and, if it is
//! a hostile, the notifier hears about it once. The entity stays in the arena;
//! reaping corpses is the caller's decision.

use std::fmt;
use std::sync::Arc;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::arena::Arena;
use crate::config::EngineConfig;
use crate::entity::{Attack, AttackType, Entity, EntityId};
use crate::events::GameStateNotifier;

use super::impact::{AreaShell, HomingProjectile, ImpactReport, InFlight};

/// Result of [`CombatResolver::execute_attack`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttackOutcome {
    /// Whether the attack executed.
    pub success: bool,
    /// Hit points removed now. Always 0 for deferred attack types.
    pub damage_dealt: f32,
    /// Whether the target is dead after this attack.
    pub target_destroyed: bool,
    /// The entity that was attacked.
    pub target_id: EntityId,
}

impl AttackOutcome {
    const fn failed(target_id: EntityId) -> Self {
        Self {
            success: false,
            damage_dealt: 0.0,
            target_destroyed: false,
            target_id,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Hit {
    dealt: f32,
    killed: bool,
    dead: bool,
}

/// Applies damage and tracks attacks that are still in the air.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use glam::Vec2;
/// use rampart_core::arena::Arena;
/// use rampart_core::config::EngineConfig;
/// use rampart_core::entity::{Attack, Component, Health};
/// use rampart_core::events::EventLog;
/// use rampart_core::resolver::CombatResolver;
///
/// let mut arena = Arena::new();
/// let tower = arena.create_entity("tower", Vec2::ZERO, 1.0);
/// arena.add_component(tower, Component::Attack(Attack::direct(50.0, 100.0, 1000)));
/// let grunt = arena.create_entity("grunt", Vec2::new(30.0, 0.0), 1.0);
/// arena.add_component(grunt, Component::Health(Health::new(100.0)));
///
/// let mut combat = CombatResolver::new(Arc::new(EventLog::new()), &EngineConfig::default());
/// let outcome = combat.execute_attack(&mut arena, tower, grunt, 0);
///
/// assert!(outcome.success);
/// assert_eq!(outcome.damage_dealt, 50.0);
/// ```
pub struct CombatResolver {
    notifier: Arc<dyn GameStateNotifier>,
    projectile_hit_radius: f32,
    in_flight: Vec<InFlight>,
}

impl fmt::Debug for CombatResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombatResolver")
            .field("projectile_hit_radius", &self.projectile_hit_radius)
            .field("in_flight", &self.in_flight.len())
            .finish_non_exhaustive()
    }
}

impl CombatResolver {
    /// Creates a resolver that reports to `notifier`.
    #[must_use]
    pub fn new(notifier: Arc<dyn GameStateNotifier>, config: &EngineConfig) -> Self {
        Self {
            notifier,
            projectile_hit_radius: config.projectile_hit_radius,
            in_flight: Vec::new(),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// True iff `target` has Health, positive hit points, and is not dead.
    #[must_use]
    pub fn can_attack_target(target: &Entity) -> bool {
        target
            .health
            .as_ref()
            .is_some_and(|h| h.current > 0.0 && !h.is_dead)
    }

    /// Cooldown gate: `now - last_attack_time >= cooldown_ms / rate`.
    #[must_use]
    pub fn is_attack_ready(attack: &Attack, now: u64) -> bool {
        attack.is_ready(now)
    }

    /// Returns true if the entity has an Attack with a current target.
    #[must_use]
    pub fn is_entity_attacking(arena: &Arena, id: EntityId) -> bool {
        arena
            .get(id)
            .and_then(|e| e.attack.as_ref())
            .is_some_and(|a| a.target.is_some())
    }

    /// Clears the attacker's current target.
    ///
    /// Returns false if the entity or its Attack component is missing.
    pub fn stop_attack(arena: &mut Arena, id: EntityId) -> bool {
        match arena.get_mut(id).and_then(|e| e.attack.as_mut()) {
            Some(attack) => {
                attack.target = None;
                true
            }
            None => false,
        }
    }

    /// Attacks that have been launched but have not landed.
    #[must_use]
    pub fn in_flight(&self) -> &[InFlight] {
        &self.in_flight
    }

    // =========================================================================
    // Damage
    // =========================================================================

    /// Applies the attacker's weapon damage to `target`.
    ///
    /// A missing attacker or Attack component deals 0 damage, but provenance
    /// is still recorded. Returns the hit points actually removed.
    pub fn calculate_and_apply_damage(
        &self,
        arena: &mut Arena,
        attacker: EntityId,
        target: EntityId,
        now: u64,
    ) -> f32 {
        let damage = arena
            .get(attacker)
            .and_then(|e| e.attack.as_ref())
            .map_or(0.0, |a| a.damage);
        self.apply_damage(arena, attacker, target, damage, now)
            .map_or(0.0, |hit| hit.dealt)
    }

    /// The single damage primitive shared by every attack type.
    fn apply_damage(
        &self,
        arena: &mut Arena,
        attacker: EntityId,
        target: EntityId,
        amount: f32,
        now: u64,
    ) -> Option<Hit> {
        let entity = arena.get_mut(target)?;
        let hit = {
            let health = entity.health.as_mut()?;
            let was_alive = health.is_alive();
            health.record_damage(attacker, now);
            let dealt = health.apply_damage(amount);
            Hit {
                dealt,
                killed: was_alive && health.is_dead,
                dead: health.is_dead,
            }
        };

        trace!(attacker = %attacker, target = %target, dealt = hit.dealt, "damage applied");

        if hit.killed {
            if let Some(enemy) = &entity.enemy {
                debug!(entity = %target, reward = enemy.reward_value, "enemy defeated");
                self.notifier.on_enemy_defeated(target, enemy.reward_value);
            }
        }
        if entity.structure.is_some() {
            self.notifier.on_structure_damaged(target, hit.dealt);
        }
        Some(hit)
    }

    // =========================================================================
    // Attacks
    // =========================================================================

    /// Executes one attack from `attacker` on `target`.
    ///
    /// Fails without side effects if the attacker has no Attack component or
    /// the target has no Health. The cooldown gate is the caller's job.
    pub fn execute_attack(
        &mut self,
        arena: &mut Arena,
        attacker: EntityId,
        target: EntityId,
        now: u64,
    ) -> AttackOutcome {
        let Some(attacker_entity) = arena.get(attacker) else {
            return AttackOutcome::failed(target);
        };
        let Some(attack) = attacker_entity.attack.clone() else {
            return AttackOutcome::failed(target);
        };
        let attacker_position = attacker_entity.position;
        let attacker_faction = attacker_entity.faction();

        let Some(target_entity) = arena.get(target) else {
            return AttackOutcome::failed(target);
        };
        if target_entity.health.is_none() {
            return AttackOutcome::failed(target);
        }
        let target_position = target_entity.position;

        if let Some(stamp) = arena.get_mut(attacker).and_then(|e| e.attack.as_mut()) {
            stamp.last_attack_time = Some(now);
            stamp.target = Some(target);
        }

        match attack.attack_type {
            AttackType::Direct => {
                let hit = self.apply_damage(arena, attacker, target, attack.damage, now);
                AttackOutcome {
                    success: true,
                    damage_dealt: hit.map_or(0.0, |h| h.dealt),
                    target_destroyed: hit.is_some_and(|h| h.dead),
                    target_id: target,
                }
            }
            AttackType::HomingProjectile => {
                let position = attacker_position.or(target_position).unwrap_or(Vec2::ZERO);
                trace!(attacker = %attacker, target = %target, "projectile launched");
                self.in_flight.push(InFlight::Homing(HomingProjectile {
                    attacker,
                    target,
                    position,
                    speed: attack.projectile_speed,
                    damage: attack.damage,
                    last_update: now,
                }));
                Self::launched(target)
            }
            AttackType::Area => {
                let center = target_position.unwrap_or(Vec2::ZERO);
                let flight_ms = flight_time_ms(attacker_position, center, attack.projectile_speed);
                trace!(attacker = %attacker, target = %target, flight_ms, "shell launched");
                self.in_flight.push(InFlight::Shell(AreaShell {
                    attacker,
                    attacker_faction,
                    target,
                    center,
                    radius: attack.splash_radius,
                    damage: attack.damage,
                    detonate_at: now.saturating_add(flight_ms),
                }));
                Self::launched(target)
            }
        }
    }

    const fn launched(target: EntityId) -> AttackOutcome {
        AttackOutcome {
            success: true,
            damage_dealt: 0.0,
            target_destroyed: false,
            target_id: target,
        }
    }

    /// Living opponents inside the blast radius.
    ///
    /// A shell whose attacker had no faction has no opponents to tell apart,
    /// so it only hits the entity it was aimed at, if that is in the blast.
    fn splash_victims(arena: &Arena, shell: &AreaShell) -> Vec<EntityId> {
        let in_blast = arena.query_radius(shell.center, shell.radius);
        let Some(attacker_faction) = shell.attacker_faction else {
            return in_blast
                .into_iter()
                .filter(|id| *id == shell.target && arena.get(*id).is_some_and(|e| e.is_alive()))
                .collect();
        };
        in_blast
            .into_iter()
            .filter(|id| {
                arena.get(*id).is_some_and(|e| {
                    e.is_alive() && e.faction().is_some_and(|f| f != attacker_faction)
                })
            })
            .collect()
    }

    /// Advances in-flight attacks to `now` and applies the damage of every
    /// one that lands.
    ///
    /// Projectiles whose target is gone or dead fizzle without effect.
    /// Reports are ordered by launch order, then by victim id.
    pub fn resolve_impacts(&mut self, arena: &mut Arena, now: u64) -> Vec<ImpactReport> {
        let pending = std::mem::take(&mut self.in_flight);
        let mut reports = Vec::new();

        for flight in pending {
            match flight {
                InFlight::Homing(mut projectile) => {
                    let target_position = arena
                        .get(projectile.target)
                        .filter(|e| Self::can_attack_target(e))
                        .and_then(|e| e.position);
                    let Some(target_position) = target_position else {
                        debug!(target = %projectile.target, "projectile fizzled");
                        continue;
                    };
                    if !projectile.advance(target_position, now, self.projectile_hit_radius) {
                        self.in_flight.push(InFlight::Homing(projectile));
                        continue;
                    }
                    if let Some(hit) = self.apply_damage(
                        arena,
                        projectile.attacker,
                        projectile.target,
                        projectile.damage,
                        now,
                    ) {
                        reports.push(ImpactReport {
                            attacker: projectile.attacker,
                            victim: projectile.target,
                            damage_dealt: hit.dealt,
                            victim_destroyed: hit.killed,
                            attack_type: AttackType::HomingProjectile,
                        });
                    }
                }
                InFlight::Shell(shell) => {
                    if now < shell.detonate_at {
                        self.in_flight.push(InFlight::Shell(shell));
                        continue;
                    }
                    let victims = Self::splash_victims(arena, &shell);
                    debug!(
                        attacker = %shell.attacker,
                        victims = victims.len(),
                        "shell detonated"
                    );
                    for victim in victims {
                        if let Some(hit) =
                            self.apply_damage(arena, shell.attacker, victim, shell.damage, now)
                        {
                            reports.push(ImpactReport {
                                attacker: shell.attacker,
                                victim,
                                damage_dealt: hit.dealt,
                                victim_destroyed: hit.killed,
                                attack_type: AttackType::Area,
                            });
                        }
                    }
                }
            }
        }
        reports
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn flight_time_ms(from: Option<Vec2>, to: Vec2, speed: f32) -> u64 {
    match from {
        Some(from) if speed > 0.0 => (from.distance(to) / speed * 1000.0).round() as u64,
        _ => 0,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{
        Component, Enemy, Health, Structure, StructureType, Unit,
    };
    use crate::events::{EventLog, GameEvent};

    fn resolver() -> (CombatResolver, Arc<EventLog>) {
        let log = Arc::new(EventLog::new());
        let resolver = CombatResolver::new(log.clone(), &EngineConfig::default());
        (resolver, log)
    }

    fn tower(arena: &mut Arena, at: Vec2, attack: Attack) -> EntityId {
        let id = arena.create_entity("tower", at, 1.0);
        arena.add_component(id, Component::Unit(Unit::new("tower")));
        arena.add_component(id, Component::Health(Health::new(100.0)));
        arena.add_component(id, Component::Attack(attack));
        id
    }

    fn grunt(arena: &mut Arena, at: Vec2, health: Health, reward: u32) -> EntityId {
        let id = arena.create_entity("grunt", at, 1.0);
        arena.add_component(id, Component::Enemy(Enemy::new("basic", reward)));
        arena.add_component(id, Component::Health(health));
        id
    }

    mod direct_tests {
        use super::*;

        #[test]
        fn half_damage_hit_records_provenance() {
            let (mut combat, log) = resolver();
            let mut arena = Arena::new();
            let a = tower(&mut arena, Vec2::ZERO, Attack::direct(50.0, 100.0, 1000));
            let t = grunt(&mut arena, Vec2::new(10.0, 0.0), Health::new(100.0), 10);

            let outcome = combat.execute_attack(&mut arena, a, t, 500);

            assert!(outcome.success);
            assert!((outcome.damage_dealt - 50.0).abs() < f32::EPSILON);
            assert!(!outcome.target_destroyed);
            let health = arena.get(t).unwrap().health.as_ref().unwrap();
            assert!((health.current - 50.0).abs() < f32::EPSILON);
            assert!(!health.is_dead);
            assert_eq!(health.last_damage_from, Some(a));
            assert_eq!(health.last_damage_time, Some(500));
            assert!(log.is_empty());
        }

        #[test]
        fn overkill_defeats_and_notifies_reward() {
            let (mut combat, log) = resolver();
            let mut arena = Arena::new();
            let a = tower(&mut arena, Vec2::ZERO, Attack::direct(150.0, 100.0, 1000));
            let t = grunt(&mut arena, Vec2::new(10.0, 0.0), Health::with_current(40.0, 100.0), 25);

            let outcome = combat.execute_attack(&mut arena, a, t, 0);

            assert!(outcome.target_destroyed);
            assert!((outcome.damage_dealt - 40.0).abs() < f32::EPSILON);
            let health = arena.get(t).unwrap().health.as_ref().unwrap();
            assert_eq!(health.current, 0.0);
            assert!(health.is_dead);
            assert_eq!(
                log.take_events(),
                vec![GameEvent::EnemyDefeated { entity: t, reward: 25 }]
            );
        }

        #[test]
        fn defeat_notifies_only_once() {
            let (combat, log) = resolver();
            let mut arena = Arena::new();
            let a = tower(&mut arena, Vec2::ZERO, Attack::direct(150.0, 100.0, 0));
            let t = grunt(&mut arena, Vec2::ZERO, Health::new(100.0), 5);

            combat.calculate_and_apply_damage(&mut arena, a, t, 0);
            combat.calculate_and_apply_damage(&mut arena, a, t, 10);

            assert_eq!(log.len(), 1);
            let health = arena.get(t).unwrap().health.as_ref().unwrap();
            assert_eq!(health.last_damage_time, Some(10));
        }

        #[test]
        fn stamps_attack_bookkeeping() {
            let (mut combat, _) = resolver();
            let mut arena = Arena::new();
            let a = tower(&mut arena, Vec2::ZERO, Attack::direct(1.0, 100.0, 1000));
            let t = grunt(&mut arena, Vec2::ZERO, Health::new(100.0), 5);

            combat.execute_attack(&mut arena, a, t, 1234);

            let attack = arena.get(a).unwrap().attack.as_ref().unwrap();
            assert_eq!(attack.last_attack_time, Some(1234));
            assert_eq!(attack.target, Some(t));
            assert!(CombatResolver::is_entity_attacking(&arena, a));
        }

        #[test]
        fn structure_damage_is_reported() {
            let (mut combat, log) = resolver();
            let mut arena = Arena::new();
            let enemy = arena.create_entity("grunt", Vec2::ZERO, 1.0);
            arena.add_component(enemy, Component::Enemy(Enemy::new("basic", 1)));
            arena.add_component(enemy, Component::Attack(Attack::direct(12.0, 10.0, 1000)));
            let gate = arena.create_entity("gate", Vec2::ZERO, 1.0);
            arena.add_component(gate, Component::Structure(Structure::new(StructureType::Gate)));
            arena.add_component(gate, Component::Health(Health::new(500.0)));

            combat.execute_attack(&mut arena, enemy, gate, 0);

            assert_eq!(
                log.take_events(),
                vec![GameEvent::StructureDamaged { entity: gate, amount: 12.0 }]
            );
        }
    }

    mod missing_component_tests {
        use super::*;

        #[test]
        fn attacker_without_attack_fails() {
            let (mut combat, _) = resolver();
            let mut arena = Arena::new();
            let a = arena.create_entity("rock", Vec2::ZERO, 1.0);
            let t = grunt(&mut arena, Vec2::ZERO, Health::new(100.0), 5);

            let outcome = combat.execute_attack(&mut arena, a, t, 0);

            assert_eq!(outcome, AttackOutcome::failed(t));
            let health = arena.get(t).unwrap().health.as_ref().unwrap();
            assert!(health.last_damage_from.is_none());
        }

        #[test]
        fn target_without_health_fails() {
            let (mut combat, _) = resolver();
            let mut arena = Arena::new();
            let a = tower(&mut arena, Vec2::ZERO, Attack::direct(10.0, 100.0, 0));
            let t = arena.create_entity("flag", Vec2::ZERO, 1.0);

            assert!(!combat.execute_attack(&mut arena, a, t, 0).success);
            assert!(arena.get(a).unwrap().attack.as_ref().unwrap().last_attack_time.is_none());
        }

        #[test]
        fn zero_damage_still_records_provenance() {
            let (combat, _) = resolver();
            let mut arena = Arena::new();
            let a = arena.create_entity("rock", Vec2::ZERO, 1.0);
            let t = grunt(&mut arena, Vec2::ZERO, Health::new(100.0), 5);

            assert_eq!(combat.calculate_and_apply_damage(&mut arena, a, t, 77), 0.0);
            let health = arena.get(t).unwrap().health.as_ref().unwrap();
            assert_eq!(health.last_damage_from, Some(a));
            assert_eq!(health.last_damage_time, Some(77));
        }

        #[test]
        fn attack_queries_fail_silently() {
            let mut arena = Arena::new();
            let rock = arena.create_entity("rock", Vec2::ZERO, 1.0);

            assert!(!CombatResolver::is_entity_attacking(&arena, rock));
            assert!(!CombatResolver::stop_attack(&mut arena, rock));
            assert!(!CombatResolver::stop_attack(&mut arena, EntityId::new(99)));
        }

        #[test]
        fn stop_attack_clears_target() {
            let mut arena = Arena::new();
            let mut attack = Attack::direct(1.0, 1.0, 1);
            attack.target = Some(EntityId::new(5));
            let a = tower(&mut arena, Vec2::ZERO, attack);

            assert!(CombatResolver::stop_attack(&mut arena, a));
            assert!(!CombatResolver::is_entity_attacking(&arena, a));
        }

        #[test]
        fn can_attack_target_requires_living_health() {
            let mut arena = Arena::new();
            let alive = grunt(&mut arena, Vec2::ZERO, Health::new(10.0), 1);
            let dead = grunt(&mut arena, Vec2::ZERO, Health::with_current(0.0, 10.0), 1);
            let rock = arena.create_entity("rock", Vec2::ZERO, 1.0);

            assert!(CombatResolver::can_attack_target(arena.get(alive).unwrap()));
            assert!(!CombatResolver::can_attack_target(arena.get(dead).unwrap()));
            assert!(!CombatResolver::can_attack_target(arena.get(rock).unwrap()));
        }
    }

    mod deferred_tests {
        use super::*;

        #[test]
        fn projectile_damages_on_impact_not_launch() {
            let (mut combat, _) = resolver();
            let mut arena = Arena::new();
            let a = tower(&mut arena, Vec2::ZERO, Attack::homing(30.0, 200.0, 1000, 100.0));
            let t = grunt(&mut arena, Vec2::new(100.0, 0.0), Health::new(100.0), 5);

            let outcome = combat.execute_attack(&mut arena, a, t, 0);
            assert!(outcome.success);
            assert_eq!(outcome.damage_dealt, 0.0);
            assert_eq!(combat.in_flight().len(), 1);
            assert!(arena.get(t).unwrap().health.as_ref().unwrap().last_damage_from.is_none());

            assert!(combat.resolve_impacts(&mut arena, 500).is_empty());

            let reports = combat.resolve_impacts(&mut arena, 1000);
            assert_eq!(reports.len(), 1);
            assert_eq!(reports[0].victim, t);
            assert!((reports[0].damage_dealt - 30.0).abs() < f32::EPSILON);
            assert!(combat.in_flight().is_empty());

            let health = arena.get(t).unwrap().health.as_ref().unwrap();
            assert_eq!(health.last_damage_from, Some(a));
            assert_eq!(health.last_damage_time, Some(1000));
        }

        #[test]
        fn projectile_fizzles_when_target_dies() {
            let (mut combat, log) = resolver();
            let mut arena = Arena::new();
            let a = tower(&mut arena, Vec2::ZERO, Attack::homing(30.0, 200.0, 1000, 10.0));
            let t = grunt(&mut arena, Vec2::new(100.0, 0.0), Health::new(100.0), 5);

            combat.execute_attack(&mut arena, a, t, 0);
            arena.get_mut(t).unwrap().health.as_mut().unwrap().apply_damage(100.0);

            assert!(combat.resolve_impacts(&mut arena, 60_000).is_empty());
            assert!(combat.in_flight().is_empty());
            assert!(log.is_empty());
        }

        #[test]
        fn shell_splashes_opponents_only() {
            let (mut combat, _) = resolver();
            let mut arena = Arena::new();
            let a = tower(&mut arena, Vec2::ZERO, Attack::area(20.0, 300.0, 1000, 100.0, 30.0));
            let main = grunt(&mut arena, Vec2::new(200.0, 0.0), Health::new(100.0), 5);
            let near = grunt(&mut arena, Vec2::new(220.0, 0.0), Health::new(100.0), 5);
            let far = grunt(&mut arena, Vec2::new(260.0, 0.0), Health::new(100.0), 5);
            let ally = tower(&mut arena, Vec2::new(210.0, 0.0), Attack::direct(1.0, 1.0, 1));

            combat.execute_attack(&mut arena, a, main, 0);
            assert!(combat.resolve_impacts(&mut arena, 1999).is_empty());

            let reports = combat.resolve_impacts(&mut arena, 2000);
            let victims: Vec<EntityId> = reports.iter().map(|r| r.victim).collect();
            assert_eq!(victims, vec![main, near]);
            assert!(reports.iter().all(|r| r.attack_type == AttackType::Area));

            let untouched = |id: EntityId| {
                arena.get(id).unwrap().health.as_ref().unwrap().last_damage_from.is_none()
            };
            assert!(untouched(far));
            assert!(untouched(ally));
        }

        #[test]
        fn factionless_shell_spares_bystanders() {
            let (mut combat, _) = resolver();
            let mut arena = Arena::new();
            let mortar = arena.create_entity("mortar", Vec2::ZERO, 1.0);
            arena.add_component(mortar, Component::Attack(Attack::area(20.0, 300.0, 1000, 100.0, 30.0)));
            let aimed = grunt(&mut arena, Vec2::new(100.0, 0.0), Health::new(100.0), 5);
            let hostile = grunt(&mut arena, Vec2::new(110.0, 0.0), Health::new(100.0), 5);
            let friendly = tower(&mut arena, Vec2::new(90.0, 0.0), Attack::direct(1.0, 1.0, 1));

            combat.execute_attack(&mut arena, mortar, aimed, 0);
            assert_eq!(combat.in_flight().len(), 1);

            let reports = combat.resolve_impacts(&mut arena, 1000);
            let victims: Vec<EntityId> = reports.iter().map(|r| r.victim).collect();
            assert_eq!(victims, vec![aimed]);
            assert!(last_hit_from(&arena, hostile).is_none());
            assert!(last_hit_from(&arena, friendly).is_none());
        }

        fn last_hit_from(arena: &Arena, id: EntityId) -> Option<EntityId> {
            arena.get(id).unwrap().health.as_ref().unwrap().last_damage_from
        }

        #[test]
        fn shell_lands_after_attacker_dies() {
            let (mut combat, _) = resolver();
            let mut arena = Arena::new();
            let a = tower(&mut arena, Vec2::ZERO, Attack::area(20.0, 300.0, 1000, 100.0, 10.0));
            let t = grunt(&mut arena, Vec2::new(100.0, 0.0), Health::new(100.0), 5);

            combat.execute_attack(&mut arena, a, t, 0);
            arena.destroy_entity(a);

            let reports = combat.resolve_impacts(&mut arena, 1000);
            assert_eq!(reports.len(), 1);
            assert!((reports[0].damage_dealt - 20.0).abs() < f32::EPSILON);
        }
    }

    #[test]
    fn flight_time_handles_degenerate_speed() {
        assert_eq!(flight_time_ms(Some(Vec2::ZERO), Vec2::new(100.0, 0.0), 50.0), 2000);
        assert_eq!(flight_time_ms(Some(Vec2::ZERO), Vec2::new(100.0, 0.0), 0.0), 0);
        assert_eq!(flight_time_ms(None, Vec2::new(100.0, 0.0), 50.0), 0);
    }
}

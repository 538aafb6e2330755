//! Component structs attached to entities.
//!
//! Components are plain data mutated in place by the systems:
//! - [`Health`] by the combat resolver
//! - [`Target`] by the targeting system
//! - [`Enemy::last_target_switch_time`] when a switch is approved
//!
//! All timestamps are caller-supplied milliseconds.

use bitflags::bitflags;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::EntityId;
use crate::targeting::Order;

// =============================================================================
// Health
// =============================================================================

/// One hit recorded on a defender since its damage log was last consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageRecord {
    /// Who dealt the hit.
    pub attacker: EntityId,
    /// When it landed.
    pub time: u64,
}

/// Hit points and damage provenance.
///
/// # Invariants
///
/// - `0 <= current <= max`
/// - `is_dead == (current == 0)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    /// Current hit points.
    pub current: f32,
    /// Maximum hit points.
    pub max: f32,
    /// Set when `current` reaches zero.
    pub is_dead: bool,
    /// Last entity that hit this one.
    pub last_damage_from: Option<EntityId>,
    /// When the last hit landed.
    pub last_damage_time: Option<u64>,
    /// Every hit since provenance was last cleared, oldest first.
    #[serde(default)]
    pub damage_log: Vec<DamageRecord>,
}

impl Health {
    /// Most hits kept in `damage_log`; older ones are dropped first.
    pub const DAMAGE_LOG_CAPACITY: usize = 16;

    /// Full health.
    #[must_use]
    pub fn new(max: f32) -> Self {
        Self::with_current(max, max)
    }

    /// Partial health; `current` is clamped into `[0, max]`.
    #[must_use]
    pub fn with_current(current: f32, max: f32) -> Self {
        let max = max.max(0.0);
        let current = current.clamp(0.0, max);
        Self {
            current,
            max,
            is_dead: current <= 0.0,
            last_damage_from: None,
            last_damage_time: None,
            damage_log: Vec::new(),
        }
    }

    /// Returns true while hit points remain.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.is_dead && self.current > 0.0
    }

    /// Fraction of hit points remaining, `0.0` when `max` is zero.
    #[must_use]
    pub fn ratio(&self) -> f32 {
        if self.max > 0.0 {
            self.current / self.max
        } else {
            0.0
        }
    }

    /// Subtracts `amount`, clamping at zero, and returns the hit points
    /// actually removed.
    pub fn apply_damage(&mut self, amount: f32) -> f32 {
        let before = self.current;
        self.current = (self.current - amount.max(0.0)).max(0.0);
        if self.current <= 0.0 {
            self.current = 0.0;
            self.is_dead = true;
        }
        before - self.current
    }

    /// Records who hit this entity and when.
    pub fn record_damage(&mut self, attacker: EntityId, now: u64) {
        self.last_damage_from = Some(attacker);
        self.last_damage_time = Some(now);
        if self.damage_log.len() >= Self::DAMAGE_LOG_CAPACITY {
            self.damage_log.remove(0);
        }
        self.damage_log.push(DamageRecord {
            attacker,
            time: now,
        });
    }

    /// Returns the provenance pair if the last hit is within `window_ms` of `now`.
    #[must_use]
    pub fn recent_damage(&self, now: u64, window_ms: u64) -> Option<(EntityId, u64)> {
        let from = self.last_damage_from?;
        let time = self.last_damage_time?;
        (now.saturating_sub(time) <= window_ms).then_some((from, time))
    }

    /// Distinct attackers in the damage log, in first-hit order.
    #[must_use]
    pub fn distinct_attackers(&self) -> Vec<EntityId> {
        let mut seen = Vec::new();
        for record in &self.damage_log {
            if !seen.contains(&record.attacker) {
                seen.push(record.attacker);
            }
        }
        seen
    }

    /// Clears provenance and the damage log.
    pub fn clear_provenance(&mut self) {
        self.last_damage_from = None;
        self.last_damage_time = None;
        self.damage_log.clear();
    }
}

// =============================================================================
// Attack
// =============================================================================

/// How an attack delivers its damage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackType {
    /// Damage lands on execution.
    #[default]
    Direct,
    /// A projectile chases the target and damages it on impact.
    HomingProjectile,
    /// A shell explodes at the target's position and damages everything nearby.
    Area,
}

/// Weapon stats and attack bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attack {
    /// Damage per hit.
    pub damage: f32,
    /// Weapon range in world units.
    pub range: f32,
    /// Base cooldown between attacks.
    pub cooldown_ms: u64,
    /// Attack-speed multiplier; the effective cooldown is `cooldown_ms / rate`.
    pub rate: f32,
    /// Delivery mechanism.
    pub attack_type: AttackType,
    /// Travel speed for projectile and area attacks, units per second.
    pub projectile_speed: f32,
    /// Blast radius for area attacks.
    pub splash_radius: f32,
    /// When the last attack executed.
    pub last_attack_time: Option<u64>,
    /// Entity the last attack was aimed at.
    pub target: Option<EntityId>,
}

impl Attack {
    /// Instant-hit weapon.
    #[must_use]
    pub fn direct(damage: f32, range: f32, cooldown_ms: u64) -> Self {
        Self {
            damage,
            range,
            cooldown_ms,
            rate: 1.0,
            attack_type: AttackType::Direct,
            projectile_speed: 0.0,
            splash_radius: 0.0,
            last_attack_time: None,
            target: None,
        }
    }

    /// Homing projectile weapon.
    #[must_use]
    pub fn homing(damage: f32, range: f32, cooldown_ms: u64, projectile_speed: f32) -> Self {
        Self {
            attack_type: AttackType::HomingProjectile,
            projectile_speed,
            ..Self::direct(damage, range, cooldown_ms)
        }
    }

    /// Area-of-effect weapon.
    #[must_use]
    pub fn area(
        damage: f32,
        range: f32,
        cooldown_ms: u64,
        projectile_speed: f32,
        splash_radius: f32,
    ) -> Self {
        Self {
            attack_type: AttackType::Area,
            projectile_speed,
            splash_radius,
            ..Self::direct(damage, range, cooldown_ms)
        }
    }

    /// Cooldown after applying the attack-speed multiplier.
    ///
    /// A non-positive rate is treated as 1. Fractional results round up so
    /// the gate never opens before `cooldown_ms / rate` has elapsed.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn effective_cooldown_ms(&self) -> u64 {
        let rate = if self.rate > 0.0 { f64::from(self.rate) } else { 1.0 };
        (self.cooldown_ms as f64 / rate).ceil() as u64
    }

    /// Cooldown gate: true when `now - last_attack_time >= effective cooldown`.
    #[must_use]
    pub fn is_ready(&self, now: u64) -> bool {
        self.last_attack_time
            .map_or(true, |last| now.saturating_sub(last) >= self.effective_cooldown_ms())
    }
}

// =============================================================================
// Target
// =============================================================================

/// Directed movement that shields a friendly entity from interruption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialMission {
    /// No mission.
    #[default]
    None,
    /// Moving into a defensive position.
    Defense,
    /// Moving onto a structure to deploy as its turret.
    Deployment,
}

bitflags! {
    /// Target-switch bookkeeping.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct TargetFlags: u8 {
        /// Currently pursuing a target acquired through a damage-triggered switch.
        const SWITCHED = 1 << 0;
        /// The current target came from an explicit order.
        const ORDERED  = 1 << 1;
    }
}

/// Targeting state of an attacker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// Entity currently being attacked or pursued.
    pub target_entity_id: Option<EntityId>,
    /// Target held before a damage-triggered switch, restored on reversion.
    pub original_target_id: Option<EntityId>,
    /// Active special mission.
    pub special_mission: SpecialMission,
    /// Where the active mission is heading.
    pub mission_destination: Option<Vec2>,
    /// Command-driven preference for one enemy type.
    pub enemy_type_by_order: Option<String>,
    /// Standing order, kept until completed or replaced.
    pub order: Option<Order>,
    /// Switch bookkeeping.
    pub flags: TargetFlags,
    /// Point of the last pursuit move request.
    pub last_pursuit_point: Option<Vec2>,
}

impl Target {
    /// Empty targeting state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Targeting state already locked on `target`.
    #[must_use]
    pub fn locked_on(target: EntityId) -> Self {
        Self {
            target_entity_id: Some(target),
            ..Self::default()
        }
    }

    /// True while a special mission is in progress.
    #[must_use]
    pub fn is_on_mission(&self) -> bool {
        self.special_mission != SpecialMission::None
    }

    /// True while pursuing a damage-triggered switch target.
    #[must_use]
    pub fn is_switched(&self) -> bool {
        self.flags.contains(TargetFlags::SWITCHED)
    }

    /// Replaces the target after an approved switch, preserving the first
    /// pre-switch target for later reversion.
    pub fn switch_to(&mut self, new_target: EntityId) {
        if self.original_target_id.is_none() {
            self.original_target_id = self.target_entity_id;
        }
        self.target_entity_id = Some(new_target);
        self.flags.insert(TargetFlags::SWITCHED);
        self.last_pursuit_point = None;
    }

    /// Restores the pre-switch target and clears the stored original.
    pub fn revert_to_original(&mut self) {
        self.target_entity_id = self.original_target_id.take();
        self.flags.remove(TargetFlags::SWITCHED);
        self.last_pursuit_point = None;
    }

    /// Sets a freshly acquired target.
    pub fn acquire(&mut self, target: EntityId) {
        self.target_entity_id = Some(target);
        self.last_pursuit_point = None;
    }

    /// Drops the current target and all switch bookkeeping.
    pub fn clear(&mut self) {
        self.target_entity_id = None;
        self.original_target_id = None;
        self.flags.remove(TargetFlags::SWITCHED | TargetFlags::ORDERED);
        self.last_pursuit_point = None;
    }

    /// Starts a special mission towards `destination`.
    pub fn begin_mission(&mut self, mission: SpecialMission, destination: Vec2) {
        self.special_mission = mission;
        self.mission_destination = Some(destination);
        self.target_entity_id = None;
        self.last_pursuit_point = None;
    }

    /// Ends the active special mission.
    pub fn end_mission(&mut self) {
        self.special_mission = SpecialMission::None;
        self.mission_destination = None;
    }
}

// =============================================================================
// Enemy
// =============================================================================

/// Which structures a hostile heads for when nothing has drawn its attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureTargetPriority {
    /// Gate structures only.
    Gate,
    /// Defensive structures and friendly units.
    Defense,
    /// Anything friendly.
    #[default]
    Any,
}

impl StructureTargetPriority {
    /// Parses `gate`, `defense`/`defence` or `any`, ignoring case and whitespace.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gate" => Some(Self::Gate),
            "defense" | "defence" => Some(Self::Defense),
            "any" | "all" => Some(Self::Any),
            _ => None,
        }
    }
}

/// Target-switching behavior of a hostile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetSwitchConfig {
    /// Whether damage can pull this hostile off its current target.
    pub enabled: bool,
    /// Minimum time between two switches.
    pub cooldown_ms: u64,
    /// Pursuit range as a multiple of the weapon range.
    pub pursuit_range_multiplier: f32,
    /// Required priority advantage, scaled ×100 at evaluation time.
    pub threat_threshold: f32,
}

impl TargetSwitchConfig {
    /// Smallest accepted pursuit-range multiplier.
    pub const MIN_PURSUIT_MULTIPLIER: f32 = 0.1;

    /// Returns a copy with every field inside its accepted range.
    #[must_use]
    pub fn clamped(self) -> Self {
        let mut out = self;
        if out.pursuit_range_multiplier.is_nan()
            || out.pursuit_range_multiplier < Self::MIN_PURSUIT_MULTIPLIER
        {
            warn!(
                value = out.pursuit_range_multiplier,
                "pursuit range multiplier below minimum, clamping"
            );
            out.pursuit_range_multiplier = Self::MIN_PURSUIT_MULTIPLIER;
        }
        if !(0.0..=1.0).contains(&out.threat_threshold) {
            warn!(value = out.threat_threshold, "threat threshold outside [0, 1], clamping");
            out.threat_threshold = if out.threat_threshold.is_nan() {
                0.0
            } else {
                out.threat_threshold.clamp(0.0, 1.0)
            };
        }
        out
    }

    /// Configuration with switching turned off.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

impl Default for TargetSwitchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cooldown_ms: 3000,
            pursuit_range_multiplier: 1.5,
            threat_threshold: 0.2,
        }
    }
}

/// Hostile wave spawn data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    /// Lower-case type name, e.g. `basic`.
    pub enemy_type: String,
    /// Reward paid out when defeated.
    pub reward_value: u32,
    /// When the entity was spawned.
    pub spawn_time: u64,
    /// Structure preference when idle.
    pub structure_target_priority: StructureTargetPriority,
    /// Switch behavior.
    pub target_switching: TargetSwitchConfig,
    /// When the last approved switch happened.
    pub last_target_switch_time: Option<u64>,
}

impl Enemy {
    /// Enemy with global-default switching and `any` structure priority.
    #[must_use]
    pub fn new(enemy_type: impl Into<String>, reward_value: u32) -> Self {
        Self {
            enemy_type: enemy_type.into(),
            reward_value,
            spawn_time: 0,
            structure_target_priority: StructureTargetPriority::Any,
            target_switching: TargetSwitchConfig::default(),
            last_target_switch_time: None,
        }
    }
}

// =============================================================================
// Structure / Unit
// =============================================================================

/// Role of a structure, used by hostile structure-priority filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureType {
    /// Entry gate.
    Gate,
    /// Tower or other defensive building.
    Defense,
    /// Wall segment.
    Wall,
    /// Main base.
    Headquarters,
}

/// Whether hostiles may choose a structure as a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackableType {
    /// Can be targeted.
    #[default]
    Attackable,
    /// Ignored by target selection.
    Untargetable,
}

/// Player building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    /// Whether hostiles may target it.
    pub attackable_type: AttackableType,
    /// Unit deployed on this structure, if any.
    pub deployed_unit_id: Option<EntityId>,
    /// Losing this structure loses the game.
    pub is_critical_for_lose: bool,
    /// Role.
    pub structure_type: StructureType,
}

impl Structure {
    /// Attackable, non-critical structure of the given type.
    #[must_use]
    pub fn new(structure_type: StructureType) -> Self {
        Self {
            attackable_type: AttackableType::Attackable,
            deployed_unit_id: None,
            is_critical_for_lose: false,
            structure_type,
        }
    }

    /// Returns true if hostiles may target this structure.
    #[must_use]
    pub fn is_attackable(&self) -> bool {
        self.attackable_type == AttackableType::Attackable
    }
}

/// Player-directed unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    /// Unit type name.
    pub unit_type: String,
    /// Structure this unit is deployed on.
    pub deployed_structure_id: Option<EntityId>,
    /// Deployed units hold position as turrets.
    pub is_deployed: bool,
}

impl Unit {
    /// Undeployed unit.
    #[must_use]
    pub fn new(unit_type: impl Into<String>) -> Self {
        Self {
            unit_type: unit_type.into(),
            deployed_structure_id: None,
            is_deployed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod health_tests {
        use super::*;

        #[test]
        fn damage_reduces_current() {
            let mut health = Health::new(100.0);
            let dealt = health.apply_damage(50.0);
            assert!((health.current - 50.0).abs() < f32::EPSILON);
            assert!((dealt - 50.0).abs() < f32::EPSILON);
            assert!(!health.is_dead);
        }

        #[test]
        fn overkill_clamps_at_zero() {
            let mut health = Health::with_current(40.0, 100.0);
            let dealt = health.apply_damage(150.0);
            assert_eq!(health.current, 0.0);
            assert!(health.is_dead);
            assert!((dealt - 40.0).abs() < f32::EPSILON);
        }

        #[test]
        fn negative_damage_is_ignored() {
            let mut health = Health::new(100.0);
            assert_eq!(health.apply_damage(-20.0), 0.0);
            assert!((health.current - 100.0).abs() < f32::EPSILON);
        }

        #[test]
        fn with_current_clamps_into_range() {
            let health = Health::with_current(150.0, 100.0);
            assert!((health.current - 100.0).abs() < f32::EPSILON);

            let health = Health::with_current(-5.0, 100.0);
            assert_eq!(health.current, 0.0);
            assert!(health.is_dead);
        }

        #[test]
        fn recent_damage_respects_window() {
            let mut health = Health::new(100.0);
            health.record_damage(EntityId::new(3), 1000);

            assert_eq!(health.recent_damage(2000, 1000), Some((EntityId::new(3), 1000)));
            assert_eq!(health.recent_damage(2001, 1000), None);
        }

        #[test]
        fn distinct_attackers_keeps_first_hit_order() {
            let mut health = Health::new(100.0);
            health.record_damage(EntityId::new(5), 10);
            health.record_damage(EntityId::new(2), 11);
            health.record_damage(EntityId::new(5), 12);

            assert_eq!(health.distinct_attackers(), vec![EntityId::new(5), EntityId::new(2)]);

            health.clear_provenance();
            assert!(health.distinct_attackers().is_empty());
            assert!(health.last_damage_from.is_none());
            assert!(health.last_damage_time.is_none());
        }

        #[test]
        fn damage_log_is_bounded() {
            let mut health = Health::new(100.0);
            for t in 0..40 {
                health.record_damage(EntityId::new(t), t);
            }
            assert_eq!(health.damage_log.len(), Health::DAMAGE_LOG_CAPACITY);
            assert_eq!(health.damage_log[0].attacker, EntityId::new(24));
        }

        #[test]
        fn ratio_handles_zero_max() {
            assert_eq!(Health::new(0.0).ratio(), 0.0);
            assert!((Health::with_current(25.0, 100.0).ratio() - 0.25).abs() < f32::EPSILON);
        }
    }

    mod attack_tests {
        use super::*;

        #[test]
        fn never_fired_is_ready() {
            assert!(Attack::direct(10.0, 50.0, 1000).is_ready(0));
        }

        #[test]
        fn cooldown_gate_boundary() {
            let mut attack = Attack::direct(10.0, 50.0, 1000);
            attack.last_attack_time = Some(5000);

            assert!(!attack.is_ready(5999));
            assert!(attack.is_ready(6000));
        }

        #[test]
        fn rate_shortens_cooldown() {
            let mut attack = Attack::direct(10.0, 50.0, 1000);
            attack.rate = 2.0;
            attack.last_attack_time = Some(0);

            assert_eq!(attack.effective_cooldown_ms(), 500);
            assert!(attack.is_ready(500));
        }

        #[test]
        fn non_positive_rate_falls_back_to_base_cooldown() {
            let mut attack = Attack::direct(10.0, 50.0, 1000);
            attack.rate = 0.0;
            assert_eq!(attack.effective_cooldown_ms(), 1000);
        }

        #[test]
        fn fractional_cooldown_never_fires_early() {
            let mut attack = Attack::direct(10.0, 5.0, 1000);
            attack.rate = 3.0;
            attack.last_attack_time = Some(0);

            assert_eq!(attack.effective_cooldown_ms(), 334);
            assert!(!attack.is_ready(333));
            assert!(attack.is_ready(334));
        }

        #[test]
        fn constructors_set_attack_type() {
            assert_eq!(Attack::homing(5.0, 100.0, 800, 300.0).attack_type, AttackType::HomingProjectile);
            let area = Attack::area(5.0, 100.0, 800, 200.0, 40.0);
            assert_eq!(area.attack_type, AttackType::Area);
            assert!((area.splash_radius - 40.0).abs() < f32::EPSILON);
        }
    }

    mod target_tests {
        use super::*;

        #[test]
        fn switch_preserves_first_original() {
            let mut target = Target::locked_on(EntityId::new(1));
            target.switch_to(EntityId::new(2));
            target.switch_to(EntityId::new(3));

            assert_eq!(target.target_entity_id, Some(EntityId::new(3)));
            assert_eq!(target.original_target_id, Some(EntityId::new(1)));
            assert!(target.is_switched());
        }

        #[test]
        fn revert_restores_and_clears_original() {
            let mut target = Target::locked_on(EntityId::new(1));
            target.switch_to(EntityId::new(2));
            target.revert_to_original();

            assert_eq!(target.target_entity_id, Some(EntityId::new(1)));
            assert!(target.original_target_id.is_none());
            assert!(!target.is_switched());
        }

        #[test]
        fn mission_lifecycle() {
            let mut target = Target::locked_on(EntityId::new(1));
            target.begin_mission(SpecialMission::Deployment, Vec2::new(5.0, 5.0));

            assert!(target.is_on_mission());
            assert!(target.target_entity_id.is_none());

            target.end_mission();
            assert!(!target.is_on_mission());
            assert!(target.mission_destination.is_none());
        }
    }

    mod switch_config_tests {
        use super::*;

        #[test]
        fn clamped_enforces_ranges() {
            let config = TargetSwitchConfig {
                enabled: true,
                cooldown_ms: 0,
                pursuit_range_multiplier: 0.01,
                threat_threshold: 3.0,
            }
            .clamped();

            assert!((config.pursuit_range_multiplier - 0.1).abs() < f32::EPSILON);
            assert!((config.threat_threshold - 1.0).abs() < f32::EPSILON);
        }

        #[test]
        fn clamped_keeps_valid_values() {
            let config = TargetSwitchConfig::default();
            assert_eq!(config.clamped(), config);
        }

        #[test]
        fn deserializes_partial_documents() {
            let config: TargetSwitchConfig =
                serde_json::from_str(r#"{"cooldown_ms": 500}"#).unwrap();
            assert!(config.enabled);
            assert_eq!(config.cooldown_ms, 500);
        }
    }

    #[test]
    fn structure_priority_parse() {
        assert_eq!(StructureTargetPriority::parse(" GATE "), Some(StructureTargetPriority::Gate));
        assert_eq!(StructureTargetPriority::parse("defence"), Some(StructureTargetPriority::Defense));
        assert_eq!(StructureTargetPriority::parse("Any"), Some(StructureTargetPriority::Any));
        assert_eq!(StructureTargetPriority::parse("walls"), None);
    }
}

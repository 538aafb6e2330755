//! Enemy archetypes: per-type defaults used when spawning.
//!
//! Stats resolve instance → type default → global default, once, at spawn
//! time. The spawned entity carries complete components and nothing reads
//! the archetype again.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::entity::{
    Attack, AttackType, Component, Enemy, Entity, EntityId, Health, StructureTargetPriority,
    Target, TargetSwitchConfig,
};

/// Spawn template for one enemy type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyArchetype {
    /// Presentation key.
    pub visual_key: String,
    /// Presentation scale.
    pub scale: f32,
    /// Starting and maximum hit points.
    pub max_health: f32,
    /// Weapon stats.
    pub attack: Attack,
    /// Reward paid out on defeat.
    pub reward: u32,
    /// Structure preference.
    pub structure_target_priority: StructureTargetPriority,
    /// Type-level switch behavior; `None` uses the registry default.
    #[serde(default)]
    pub target_switching: Option<TargetSwitchConfig>,
}

impl EnemyArchetype {
    fn melee(visual_key: &str, max_health: f32, damage: f32, reward: u32) -> Self {
        Self {
            visual_key: visual_key.to_string(),
            scale: 1.0,
            max_health,
            attack: Attack::direct(damage, 30.0, 1000),
            reward,
            structure_target_priority: StructureTargetPriority::Any,
            target_switching: None,
        }
    }
}

/// Archetypes by lower-case type name, plus the global defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeRegistry {
    archetypes: BTreeMap<String, EnemyArchetype>,
    fallback: EnemyArchetype,
    global_switching: TargetSwitchConfig,
}

impl Default for ArchetypeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ArchetypeRegistry {
    /// Registry with no types; every spawn uses `fallback`.
    #[must_use]
    pub fn empty(fallback: EnemyArchetype, global_switching: TargetSwitchConfig) -> Self {
        Self {
            archetypes: BTreeMap::new(),
            fallback,
            global_switching: global_switching.clamped(),
        }
    }

    /// The stock roster: `basic`, `fast`, `tank`, `archer`, `bomber`.
    #[must_use]
    pub fn builtin() -> Self {
        let basic = EnemyArchetype::melee("enemy_basic", 100.0, 10.0, 10);
        let mut registry = Self::empty(basic.clone(), TargetSwitchConfig::default());
        registry.insert("basic", basic);

        let mut fast = EnemyArchetype::melee("enemy_fast", 60.0, 6.0, 15);
        fast.scale = 0.8;
        fast.attack.cooldown_ms = 600;
        fast.target_switching = Some(TargetSwitchConfig {
            cooldown_ms: 1500,
            ..TargetSwitchConfig::default()
        });
        registry.insert("fast", fast);

        let mut tank = EnemyArchetype::melee("enemy_tank", 400.0, 25.0, 40);
        tank.scale = 1.4;
        tank.attack.cooldown_ms = 2000;
        tank.structure_target_priority = StructureTargetPriority::Gate;
        tank.target_switching = Some(TargetSwitchConfig::disabled());
        registry.insert("tank", tank);

        let mut archer = EnemyArchetype::melee("enemy_archer", 70.0, 12.0, 20);
        archer.attack = Attack::homing(12.0, 150.0, 1500, 300.0);
        archer.structure_target_priority = StructureTargetPriority::Defense;
        registry.insert("archer", archer);

        let mut bomber = EnemyArchetype::melee("enemy_bomber", 120.0, 30.0, 30);
        bomber.attack = Attack::area(30.0, 120.0, 3000, 150.0, 40.0);
        bomber.structure_target_priority = StructureTargetPriority::Defense;
        registry.insert("bomber", bomber);

        registry
    }

    /// Adds or replaces a type; the name is normalized to lower case.
    pub fn insert(&mut self, enemy_type: &str, archetype: EnemyArchetype) {
        self.archetypes
            .insert(enemy_type.trim().to_ascii_lowercase(), archetype);
    }

    /// Returns true if `enemy_type` has its own archetype.
    #[must_use]
    pub fn is_known(&self, enemy_type: &str) -> bool {
        self.archetypes
            .contains_key(&enemy_type.trim().to_ascii_lowercase())
    }

    /// Known type names in order.
    pub fn types(&self) -> impl Iterator<Item = &str> + '_ {
        self.archetypes.keys().map(String::as_str)
    }

    /// Archetype for `enemy_type`, or the fallback.
    #[must_use]
    pub fn get(&self, enemy_type: &str) -> &EnemyArchetype {
        self.archetypes
            .get(enemy_type)
            .unwrap_or(&self.fallback)
    }

    /// Builds a complete hostile entity for `enemy_type` at `position`.
    ///
    /// `priority` is the instance-level override from the wave entry. The id
    /// of the returned entity is a placeholder; the arena assigns the real one.
    #[must_use]
    pub fn build(
        &self,
        enemy_type: &str,
        priority: Option<StructureTargetPriority>,
        position: Vec2,
        now: u64,
    ) -> Entity {
        let enemy_type = enemy_type.trim().to_ascii_lowercase();
        if !self.is_known(&enemy_type) {
            warn!(%enemy_type, "unknown enemy type, spawning with fallback stats");
        }
        let archetype = self.get(&enemy_type);

        let mut enemy = Enemy::new(enemy_type.clone(), archetype.reward);
        enemy.spawn_time = now;
        enemy.structure_target_priority = priority.unwrap_or(archetype.structure_target_priority);
        enemy.target_switching = archetype
            .target_switching
            .unwrap_or(self.global_switching)
            .clamped();

        let mut attack = archetype.attack.clone();
        attack.last_attack_time = None;
        attack.target = None;

        Entity::new(EntityId::new(0), archetype.visual_key.clone(), position, archetype.scale)
            .with(Component::Health(Health::new(archetype.max_health)))
            .with(Component::Attack(attack))
            .with(Component::Target(Target::new()))
            .with(Component::Enemy(enemy))
    }

    /// The attack type a spawned `enemy_type` will use.
    #[must_use]
    pub fn attack_type(&self, enemy_type: &str) -> AttackType {
        self.get(enemy_type).attack.attack_type
    }
}

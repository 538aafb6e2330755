//! In-flight attacks: homing projectiles and area shells.
//!
//! Both are plain records owned by the [`CombatResolver`](super::CombatResolver).
//! They carry the damage captured at launch, so an attacker that dies while
//! its shot is airborne still lands the hit.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::entity::{AttackType, EntityId, Faction};

/// A projectile that follows its target's current position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomingProjectile {
    /// Who fired.
    pub attacker: EntityId,
    /// Who it chases.
    pub target: EntityId,
    /// Current position.
    pub position: Vec2,
    /// Units per second.
    pub speed: f32,
    /// Damage captured at launch.
    pub damage: f32,
    /// Timestamp the position was last advanced to.
    pub last_update: u64,
}

impl HomingProjectile {
    /// Moves towards `target_position` for the time elapsed since the last
    /// update. Returns true when the projectile reaches `hit_radius`.
    #[allow(clippy::cast_precision_loss)]
    pub fn advance(&mut self, target_position: Vec2, now: u64, hit_radius: f32) -> bool {
        if self.speed <= 0.0 {
            return true;
        }
        let elapsed_s = now.saturating_sub(self.last_update) as f32 / 1000.0;
        self.last_update = self.last_update.max(now);

        let travel = self.speed * elapsed_s;
        let to_target = target_position - self.position;
        let distance = to_target.length();
        if distance <= hit_radius + travel {
            self.position = target_position;
            return true;
        }
        self.position += to_target / distance * travel;
        false
    }
}

/// A shell that explodes at a fixed point after its flight time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaShell {
    /// Who fired.
    pub attacker: EntityId,
    /// Faction of the attacker at launch; victims are its opponents.
    pub attacker_faction: Option<Faction>,
    /// Entity the shell was aimed at.
    pub target: EntityId,
    /// Blast center.
    pub center: Vec2,
    /// Blast radius.
    pub radius: f32,
    /// Damage captured at launch.
    pub damage: f32,
    /// When the shell explodes.
    pub detonate_at: u64,
}

/// An attack that has been launched but has not landed yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InFlight {
    /// Homing projectile.
    Homing(HomingProjectile),
    /// Area shell.
    Shell(AreaShell),
}

impl InFlight {
    /// The attacker that launched this attack.
    #[must_use]
    pub const fn attacker(&self) -> EntityId {
        match self {
            Self::Homing(p) => p.attacker,
            Self::Shell(s) => s.attacker,
        }
    }

    /// The entity this attack was aimed at.
    #[must_use]
    pub const fn target(&self) -> EntityId {
        match self {
            Self::Homing(p) => p.target,
            Self::Shell(s) => s.target,
        }
    }
}

/// Damage that landed while resolving in-flight attacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactReport {
    /// Who fired.
    pub attacker: EntityId,
    /// Who was hit.
    pub victim: EntityId,
    /// Hit points removed.
    pub damage_dealt: f32,
    /// Whether this hit killed the victim.
    pub victim_destroyed: bool,
    /// Delivery mechanism.
    pub attack_type: AttackType,
}

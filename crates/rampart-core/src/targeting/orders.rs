//! Player orders for friendly entities.

use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, SpecialMission};

/// A standing instruction given to a friendly entity.
///
/// Orders are stored on the entity's `Target` component until they complete
/// or a newer order replaces them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Order {
    /// Attack a specific hostile, or prefer hostiles of one type, or both.
    AttackTarget {
        /// Hostile to attack; the order completes when it dies.
        target: Option<EntityId>,
        /// Lower-case enemy type to favor when choosing among hostiles.
        enemy_type: Option<String>,
    },
    /// Move next to a structure and hold position there.
    DefendStructure {
        /// Structure to defend.
        structure: EntityId,
    },
    /// Move onto a structure and deploy as its turret.
    DeployToStructure {
        /// Structure to deploy on.
        structure: EntityId,
    },
}

impl Order {
    /// Order to attack one hostile.
    #[must_use]
    pub const fn attack(target: EntityId) -> Self {
        Self::AttackTarget {
            target: Some(target),
            enemy_type: None,
        }
    }

    /// Order to favor hostiles of `enemy_type`.
    #[must_use]
    pub fn attack_type(enemy_type: impl Into<String>) -> Self {
        Self::AttackTarget {
            target: None,
            enemy_type: Some(enemy_type.into().trim().to_ascii_lowercase()),
        }
    }

    /// The structure a movement order refers to.
    #[must_use]
    pub const fn structure(&self) -> Option<EntityId> {
        match self {
            Self::AttackTarget { .. } => None,
            Self::DefendStructure { structure } | Self::DeployToStructure { structure } => {
                Some(*structure)
            }
        }
    }

    /// The special mission this order starts, if any.
    #[must_use]
    pub const fn mission(&self) -> SpecialMission {
        match self {
            Self::AttackTarget { .. } => SpecialMission::None,
            Self::DefendStructure { .. } => SpecialMission::Defense,
            Self::DeployToStructure { .. } => SpecialMission::Deployment,
        }
    }
}

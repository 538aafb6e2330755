//! Entity module for the combat core.
//!
//! This module provides the shared vocabulary every system works with:
//! - [`EntityId`]: Stable identifier handed out by the [`Arena`](crate::arena::Arena)
//! - [`ComponentSet`]: Bit mask describing which components an entity carries
//! - [`Component`]: A single component value, used when attaching components
//! - [`Entity`]: An identifier plus typed component slots
//!
//! # Architecture
//!
//! Components are stored in typed optional slots rather than a map of
//! dynamically typed values. A system that needs Health reads
//! `entity.health` and gets a `Health` or nothing, never a value it has to
//! downcast. The [`Faction`] of an entity is derived from its components:
//! anything with an [`Enemy`] component is hostile, anything with a
//! [`Unit`] or [`Structure`] component is friendly.
//!
//! # Example
//!
//! ```
//! use rampart_core::entity::{Component, ComponentSet, Entity, EntityId, Health};
//! use glam::Vec2;
//!
//! let mut wall = Entity::new(EntityId::new(7), "wall", Vec2::new(10.0, 0.0), 1.0);
//! wall.insert(Component::Health(Health::new(500.0)));
//!
//! assert!(wall.components().contains(ComponentSet::POSITION | ComponentSet::HEALTH));
//! assert!(wall.is_alive());
//! ```

pub mod components;

use bitflags::bitflags;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use components::{
    Attack, AttackType, AttackableType, DamageRecord, Enemy, Health, SpecialMission, Structure,
    StructureTargetPriority, StructureType, Target, TargetFlags, TargetSwitchConfig, Unit,
};

/// Unique identifier for an entity.
///
/// `EntityId` is a newtype wrapper around `u64`. Ids are assigned
/// monotonically by the arena and never reused, so ordering by id is
/// ordering by creation time.
///
/// # Example
///
/// ```
/// use rampart_core::entity::EntityId;
///
/// let id1 = EntityId::new(1);
/// let id2 = EntityId::new(2);
///
/// assert!(id1 < id2);
/// assert_eq!(id1.as_u64(), 1);
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new `EntityId` from a raw `u64` value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<EntityId> for u64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

bitflags! {
    /// Set of component kinds attached to an entity.
    ///
    /// Used both to describe an entity ([`Entity::components`]) and to
    /// express query requirements ([`Arena::query`](crate::arena::Arena::query)).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ComponentSet: u16 {
        /// World position.
        const POSITION  = 1 << 0;
        /// Hit points and damage provenance.
        const HEALTH    = 1 << 1;
        /// Weapon stats and attack bookkeeping.
        const ATTACK    = 1 << 2;
        /// Current target, orders and missions.
        const TARGET    = 1 << 3;
        /// Hostile wave spawn.
        const ENEMY     = 1 << 4;
        /// Player building.
        const STRUCTURE = 1 << 5;
        /// Player-directed unit.
        const UNIT      = 1 << 6;
    }
}

/// Side an entity fights on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    /// Wave spawns.
    Hostile,
    /// Player units and structures.
    Friendly,
}

impl Faction {
    /// Returns the faction this one fights against.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Hostile => Self::Friendly,
            Self::Friendly => Self::Hostile,
        }
    }
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hostile => write!(f, "hostile"),
            Self::Friendly => write!(f, "friendly"),
        }
    }
}

/// A single component value, used with [`Entity::insert`] and
/// [`Arena::add_component`](crate::arena::Arena::add_component).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Component {
    /// World position.
    Position(Vec2),
    /// Hit points.
    Health(Health),
    /// Weapon.
    Attack(Attack),
    /// Targeting state.
    Target(Target),
    /// Hostile spawn data.
    Enemy(Enemy),
    /// Building data.
    Structure(Structure),
    /// Player unit data.
    Unit(Unit),
}

impl Component {
    /// Returns the mask bit for this component.
    #[must_use]
    pub const fn kind(&self) -> ComponentSet {
        match self {
            Self::Position(_) => ComponentSet::POSITION,
            Self::Health(_) => ComponentSet::HEALTH,
            Self::Attack(_) => ComponentSet::ATTACK,
            Self::Target(_) => ComponentSet::TARGET,
            Self::Enemy(_) => ComponentSet::ENEMY,
            Self::Structure(_) => ComponentSet::STRUCTURE,
            Self::Unit(_) => ComponentSet::UNIT,
        }
    }
}

/// An entity: identifier, presentation key, and typed component slots.
///
/// Slots are public so systems can borrow disjoint components of the same
/// entity at once (for example `Enemy` and `Target` during a switch).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    id: EntityId,
    visual_key: String,
    scale: f32,
    /// World position.
    pub position: Option<Vec2>,
    /// Hit points and damage provenance.
    pub health: Option<Health>,
    /// Weapon stats.
    pub attack: Option<Attack>,
    /// Targeting state.
    pub target: Option<Target>,
    /// Present on hostile spawns.
    pub enemy: Option<Enemy>,
    /// Present on player buildings.
    pub structure: Option<Structure>,
    /// Present on player units.
    pub unit: Option<Unit>,
}

impl Entity {
    /// Creates an entity with a position and no other components.
    #[must_use]
    pub fn new(id: EntityId, visual_key: impl Into<String>, position: Vec2, scale: f32) -> Self {
        Self {
            id,
            visual_key: visual_key.into(),
            scale,
            position: Some(position),
            health: None,
            attack: None,
            target: None,
            enemy: None,
            structure: None,
            unit: None,
        }
    }

    /// Returns the entity's unique identifier.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the key the presentation layer uses to pick a sprite.
    #[must_use]
    pub fn visual_key(&self) -> &str {
        &self.visual_key
    }

    /// Returns the presentation scale.
    #[must_use]
    pub const fn scale(&self) -> f32 {
        self.scale
    }

    /// Attaches a component, replacing any existing one of the same kind.
    pub fn insert(&mut self, component: Component) {
        match component {
            Component::Position(p) => self.position = Some(p),
            Component::Health(h) => self.health = Some(h),
            Component::Attack(a) => self.attack = Some(a),
            Component::Target(t) => self.target = Some(t),
            Component::Enemy(e) => self.enemy = Some(e),
            Component::Structure(s) => self.structure = Some(s),
            Component::Unit(u) => self.unit = Some(u),
        }
    }

    /// Builder-style variant of [`Entity::insert`].
    #[must_use]
    pub fn with(mut self, component: Component) -> Self {
        self.insert(component);
        self
    }

    /// Returns the set of components currently attached.
    #[must_use]
    pub fn components(&self) -> ComponentSet {
        let mut set = ComponentSet::empty();
        set.set(ComponentSet::POSITION, self.position.is_some());
        set.set(ComponentSet::HEALTH, self.health.is_some());
        set.set(ComponentSet::ATTACK, self.attack.is_some());
        set.set(ComponentSet::TARGET, self.target.is_some());
        set.set(ComponentSet::ENEMY, self.enemy.is_some());
        set.set(ComponentSet::STRUCTURE, self.structure.is_some());
        set.set(ComponentSet::UNIT, self.unit.is_some());
        set
    }

    /// Returns true if every component in `required` is attached.
    #[must_use]
    pub fn has(&self, required: ComponentSet) -> bool {
        self.components().contains(required)
    }

    /// Derives the faction from the attached components.
    ///
    /// Returns `None` for entities that are neither hostile nor friendly
    /// (scenery, markers).
    #[must_use]
    pub fn faction(&self) -> Option<Faction> {
        if self.enemy.is_some() {
            Some(Faction::Hostile)
        } else if self.unit.is_some() || self.structure.is_some() {
            Some(Faction::Friendly)
        } else {
            None
        }
    }

    /// Returns true if both entities have a faction and they differ.
    #[must_use]
    pub fn is_hostile_to(&self, other: &Self) -> bool {
        matches!((self.faction(), other.faction()), (Some(a), Some(b)) if a != b)
    }

    /// Returns true if the entity has Health and is not dead.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.health.as_ref().is_some_and(Health::is_alive)
    }

    /// Returns true if the entity carries Health and it is dead.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.health.as_ref().is_some_and(|h| h.is_dead)
    }

    /// Euclidean distance to another entity, if both have positions.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> Option<f32> {
        Some(self.position?.distance(other.position?))
    }
}

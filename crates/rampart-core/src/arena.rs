//! Arena module: the entity store the systems run against.
//!
//! The Arena owns every entity and provides:
//! - Entity storage with deterministic iteration order (`BTreeMap`)
//! - Entity creation/destruction and component attachment
//! - Component-mask queries and radius queries
//!
//! # Determinism
//!
//! Entity ids are monotonically increasing and never reused. Because storage
//! is a `BTreeMap`, every query returns ids in creation order, which is what
//! makes "ties favor the first-seen candidate" reproducible across runs.
//!
//! # Example
//!
//! ```
//! use rampart_core::arena::Arena;
//! use rampart_core::entity::{Component, ComponentSet, Health};
//! use glam::Vec2;
//!
//! let mut arena = Arena::new();
//! let id = arena.create_entity("gate", Vec2::new(100.0, 200.0), 1.0);
//! arena.add_component(id, Component::Health(Health::new(1000.0)));
//!
//! assert_eq!(arena.query(ComponentSet::HEALTH), vec![id]);
//! assert!(arena.query_radius(Vec2::new(100.0, 200.0), 5.0).contains(&id));
//! ```

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::entity::{Component, ComponentSet, Entity, EntityId, Faction};

/// Entity store with deterministic iteration order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Arena {
    /// Monotonically increasing entity ID counter.
    next_id: u64,
    /// Entity storage ordered by id.
    entities: BTreeMap<EntityId, Entity>,
}

impl Arena {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entities: BTreeMap::new(),
        }
    }

    /// Creates an entity at `position` with no components besides its position.
    ///
    /// # Returns
    ///
    /// The id assigned to the new entity.
    pub fn create_entity(&mut self, visual_key: &str, position: Vec2, scale: f32) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        self.entities
            .insert(id, Entity::new(id, visual_key, position, scale));
        trace!(entity = %id, visual_key, "entity created");
        id
    }

    /// Inserts a fully built entity under a freshly assigned id.
    ///
    /// The id stored inside `template` is ignored.
    pub fn spawn(&mut self, template: Entity) -> EntityId {
        let id = self.create_entity(
            template.visual_key(),
            template.position.unwrap_or(Vec2::ZERO),
            template.scale(),
        );
        if let Some(entity) = self.entities.get_mut(&id) {
            let Entity {
                position,
                health,
                attack,
                target,
                enemy,
                structure,
                unit,
                ..
            } = template;
            entity.position = position;
            entity.health = health;
            entity.attack = attack;
            entity.target = target;
            entity.enemy = enemy;
            entity.structure = structure;
            entity.unit = unit;
        }
        id
    }

    /// Attaches a component to an existing entity.
    ///
    /// Returns false if the entity does not exist.
    pub fn add_component(&mut self, id: EntityId, component: Component) -> bool {
        match self.entities.get_mut(&id) {
            Some(entity) => {
                entity.insert(component);
                true
            }
            None => false,
        }
    }

    /// Removes an entity from the arena.
    pub fn destroy_entity(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    /// Removes every dead entity and returns their ids in id order.
    ///
    /// The systems never call this; it is offered to the game logic that
    /// decides when corpses disappear.
    pub fn reap_dead(&mut self) -> Vec<EntityId> {
        let dead: Vec<EntityId> = self
            .entities
            .values()
            .filter(|e| e.is_dead())
            .map(Entity::id)
            .collect();
        for id in &dead {
            self.entities.remove(id);
        }
        dead
    }

    /// Returns a reference to an entity by ID.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Returns a mutable reference to an entity by ID.
    #[must_use]
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Returns the position of an entity, if it exists and has one.
    #[must_use]
    pub fn position(&self, id: EntityId) -> Option<Vec2> {
        self.entities.get(&id)?.position
    }

    /// Sets the position of an entity. Returns false if it does not exist.
    pub fn set_position(&mut self, id: EntityId, position: Vec2) -> bool {
        match self.entities.get_mut(&id) {
            Some(entity) => {
                entity.position = Some(position);
                true
            }
            None => false,
        }
    }

    /// Distance between two entities, if both exist and have positions.
    #[must_use]
    pub fn distance(&self, a: EntityId, b: EntityId) -> Option<f32> {
        Some(self.position(a)?.distance(self.position(b)?))
    }

    /// Returns ids of all entities carrying every component in `required`,
    /// in id order.
    #[must_use]
    pub fn query(&self, required: ComponentSet) -> Vec<EntityId> {
        self.entities
            .values()
            .filter(|e| e.has(required))
            .map(Entity::id)
            .collect()
    }

    /// Returns ids of all positioned entities within `radius` of `center`
    /// (boundary inclusive), in id order.
    #[must_use]
    pub fn query_radius(&self, center: Vec2, radius: f32) -> Vec<EntityId> {
        let radius_sq = radius * radius;
        self.entities
            .values()
            .filter(|e| {
                e.position
                    .is_some_and(|p| center.distance_squared(p) <= radius_sq)
            })
            .map(Entity::id)
            .collect()
    }

    /// Returns ids of living entities of `faction`, in id order.
    #[must_use]
    pub fn living(&self, faction: Faction) -> Vec<EntityId> {
        self.entities
            .values()
            .filter(|e| e.faction() == Some(faction) && e.is_alive())
            .map(Entity::id)
            .collect()
    }

    /// Returns an iterator over entity IDs in id order.
    pub fn entity_ids_sorted(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    /// Returns an iterator over entities in id order.
    pub fn entities_sorted(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.values()
    }

    /// Returns the number of entities in the arena.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Returns true if the arena has no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Enemy, Health, Structure, StructureType, Unit};

    #[test]
    fn new_creates_empty_arena() {
        let arena = Arena::new();
        assert!(arena.is_empty());
        assert_eq!(arena.entity_count(), 0);
    }

    #[test]
    fn create_assigns_sequential_ids() {
        let mut arena = Arena::new();
        let a = arena.create_entity("a", Vec2::ZERO, 1.0);
        let b = arena.create_entity("b", Vec2::ZERO, 1.0);
        let c = arena.create_entity("c", Vec2::ZERO, 1.0);

        assert_eq!(a, EntityId::new(0));
        assert_eq!(b, EntityId::new(1));
        assert_eq!(c, EntityId::new(2));
    }

    #[test]
    fn ids_are_not_reused_after_destroy() {
        let mut arena = Arena::new();
        let a = arena.create_entity("a", Vec2::ZERO, 1.0);
        arena.destroy_entity(a);
        let b = arena.create_entity("b", Vec2::ZERO, 1.0);
        assert_ne!(a, b);
    }

    #[test]
    fn add_component_to_missing_entity_fails() {
        let mut arena = Arena::new();
        assert!(!arena.add_component(EntityId::new(9), Component::Health(Health::new(1.0))));
    }

    #[test]
    fn spawn_copies_template_components() {
        let mut arena = Arena::new();
        let template = Entity::new(EntityId::new(999), "grunt", Vec2::new(1.0, 2.0), 0.5)
            .with(Component::Health(Health::new(30.0)))
            .with(Component::Enemy(Enemy::new("basic", 5)));

        let id = arena.spawn(template);
        let entity = arena.get(id).unwrap();

        assert_eq!(entity.id(), id);
        assert_eq!(entity.visual_key(), "grunt");
        assert!(entity.has(ComponentSet::HEALTH | ComponentSet::ENEMY));
        assert_eq!(entity.position, Some(Vec2::new(1.0, 2.0)));
    }

    #[test]
    fn query_filters_by_components_in_id_order() {
        let mut arena = Arena::new();
        let a = arena.create_entity("a", Vec2::ZERO, 1.0);
        let b = arena.create_entity("b", Vec2::ZERO, 1.0);
        let c = arena.create_entity("c", Vec2::ZERO, 1.0);
        arena.add_component(c, Component::Health(Health::new(1.0)));
        arena.add_component(a, Component::Health(Health::new(1.0)));

        assert_eq!(arena.query(ComponentSet::HEALTH), vec![a, c]);
        assert_eq!(arena.query(ComponentSet::POSITION), vec![a, b, c]);
        assert!(arena.query(ComponentSet::UNIT).is_empty());
    }

    #[test]
    fn query_radius_includes_boundary() {
        let mut arena = Arena::new();
        let near = arena.create_entity("near", Vec2::new(100.0, 0.0), 1.0);
        let far = arena.create_entity("far", Vec2::new(100.1, 0.0), 1.0);

        let hits = arena.query_radius(Vec2::ZERO, 100.0);
        assert!(hits.contains(&near));
        assert!(!hits.contains(&far));
    }

    #[test]
    fn living_filters_dead_and_faction() {
        let mut arena = Arena::new();
        let unit = arena.create_entity("u", Vec2::ZERO, 1.0);
        arena.add_component(unit, Component::Unit(Unit::new("archer")));
        arena.add_component(unit, Component::Health(Health::new(10.0)));

        let gate = arena.create_entity("g", Vec2::ZERO, 1.0);
        arena.add_component(gate, Component::Structure(Structure::new(StructureType::Gate)));
        arena.add_component(gate, Component::Health(Health::with_current(0.0, 10.0)));

        let enemy = arena.create_entity("e", Vec2::ZERO, 1.0);
        arena.add_component(enemy, Component::Enemy(Enemy::new("basic", 1)));
        arena.add_component(enemy, Component::Health(Health::new(10.0)));

        assert_eq!(arena.living(Faction::Friendly), vec![unit]);
        assert_eq!(arena.living(Faction::Hostile), vec![enemy]);
    }

    #[test]
    fn reap_dead_removes_only_dead() {
        let mut arena = Arena::new();
        let alive = arena.create_entity("a", Vec2::ZERO, 1.0);
        arena.add_component(alive, Component::Health(Health::new(10.0)));
        let dead = arena.create_entity("d", Vec2::ZERO, 1.0);
        arena.add_component(dead, Component::Health(Health::with_current(0.0, 10.0)));
        let scenery = arena.create_entity("s", Vec2::ZERO, 1.0);

        assert_eq!(arena.reap_dead(), vec![dead]);
        assert!(arena.get(alive).is_some());
        assert!(arena.get(scenery).is_some());
        assert!(arena.get(dead).is_none());
    }

    #[test]
    fn distance_and_positions() {
        let mut arena = Arena::new();
        let a = arena.create_entity("a", Vec2::ZERO, 1.0);
        let b = arena.create_entity("b", Vec2::new(0.0, 80.0), 1.0);

        assert!((arena.distance(a, b).unwrap() - 80.0).abs() < 1e-4);
        assert!(arena.set_position(b, Vec2::new(0.0, 10.0)));
        assert!((arena.distance(a, b).unwrap() - 10.0).abs() < 1e-4);
        assert!(arena.distance(a, EntityId::new(77)).is_none());
    }

    #[test]
    fn serialization_roundtrip_preserves_id_sequence() {
        let mut arena = Arena::new();
        arena.create_entity("a", Vec2::ZERO, 1.0);
        arena.create_entity("b", Vec2::ZERO, 1.0);

        let json = serde_json::to_string(&arena).unwrap();
        let mut restored: Arena = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.entity_count(), 2);
        assert_eq!(restored.create_entity("c", Vec2::ZERO, 1.0), EntityId::new(2));
    }
}

//! World state storage for the simulation.
//!
//! The [`World`] holds one typed store per registered component kind and a
//! membership map recording which kinds each entity holds. The membership map
//! is the single source of truth for entity existence: an entity exists iff it
//! has an entry there, even an empty one.
//!
//! ## Query cache
//!
//! Query results are cached under a canonical [`QueryKey`] and handed out as
//! shared `Arc<[Entity]>` slices. Any structural mutation (create, destroy,
//! add, remove) only sets a dirty flag. The cache is cleared in bulk by
//! [`World::flush_query_cache`], which the tick loop calls once per tick
//! before systems run. Within a tick, an entry cached earlier is therefore
//! not refreshed by later mutations, while a key that was not cached yet is
//! always computed from the live stores.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use survival_component::{
    AnyStore, Component, ComponentSet, ComponentStore, ComponentTypeId, Entity, EntityAllocator,
    QueryKey,
};
use tracing::debug;

use crate::error::WorldError;

/// The canonical world state owned by the simulation task.
pub struct World {
    /// Entity ID allocator.
    allocator: EntityAllocator,
    /// One store per registered component kind.
    stores: HashMap<ComponentTypeId, Box<dyn AnyStore>>,
    /// Component kinds held by each live entity.
    membership: HashMap<Entity, HashSet<ComponentTypeId>>,
    /// Cached query results keyed by canonical component set.
    query_cache: HashMap<QueryKey, Arc<[Entity]>>,
    /// Set by any structural mutation since the last flush.
    cache_dirty: bool,
}

impl World {
    /// Create a new empty world.
    #[must_use]
    pub fn new() -> Self {
        Self {
            allocator: EntityAllocator::new(),
            stores: HashMap::new(),
            membership: HashMap::new(),
            query_cache: HashMap::new(),
            cache_dirty: false,
        }
    }

    // -- Stores --

    /// Register the store for `T`, or return the existing one.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::NameCollision`] if another type already
    /// registered the same component name.
    pub fn register_component<T: Component>(
        &mut self,
    ) -> Result<&mut ComponentStore<T>, WorldError> {
        self.stores
            .entry(T::component_type_id())
            .or_insert_with(|| {
                debug!(component = T::type_name(), "registered component store");
                Box::new(ComponentStore::<T>::new())
            });
        Self::typed_store_mut::<T>(&mut self.stores)
    }

    /// Returns `true` if a store for `T` has been registered.
    #[must_use]
    pub fn is_registered<T: Component>(&self) -> bool {
        self.stores.contains_key(&T::component_type_id())
    }

    /// The store for `T`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnregisteredComponent`] if `T` was never registered.
    pub fn store<T: Component>(&self) -> Result<&ComponentStore<T>, WorldError> {
        self.stores
            .get(&T::component_type_id())
            .ok_or_else(|| WorldError::UnregisteredComponent(T::type_name().to_string()))?
            .as_any()
            .downcast_ref::<ComponentStore<T>>()
            .ok_or(WorldError::NameCollision(T::type_name()))
    }

    /// The store for `T`, mutably.
    ///
    /// Writing values through this handle does not touch membership, so it
    /// is only suitable for updating values of entities that already hold
    /// `T`. Use [`World::add_component`] to attach new components.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnregisteredComponent`] if `T` was never registered.
    pub fn store_mut<T: Component>(&mut self) -> Result<&mut ComponentStore<T>, WorldError> {
        Self::typed_store_mut::<T>(&mut self.stores)
    }

    fn typed_store_mut<T: Component>(
        stores: &mut HashMap<ComponentTypeId, Box<dyn AnyStore>>,
    ) -> Result<&mut ComponentStore<T>, WorldError> {
        stores
            .get_mut(&T::component_type_id())
            .ok_or_else(|| WorldError::UnregisteredComponent(T::type_name().to_string()))?
            .as_any_mut()
            .downcast_mut::<ComponentStore<T>>()
            .ok_or(WorldError::NameCollision(T::type_name()))
    }

    // -- Entity lifecycle --

    /// Allocate a new entity with no components.
    pub fn create_entity(&mut self) -> Entity {
        let entity = self.allocator.allocate();
        self.membership.insert(entity, HashSet::new());
        self.cache_dirty = true;
        entity
    }

    /// Destroy an entity, removing it from every store it appears in.
    ///
    /// Returns `false` (and changes nothing) if the entity does not exist.
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        let Some(members) = self.membership.remove(&entity) else {
            return false;
        };
        for ty in &members {
            if let Some(store) = self.stores.get_mut(ty) {
                store.remove_entity(entity);
            }
        }
        self.cache_dirty = true;
        true
    }

    /// Check if an entity exists.
    #[must_use]
    pub fn entity_exists(&self, entity: Entity) -> bool {
        self.membership.contains_key(&entity)
    }

    /// All live entities, in ascending ID order.
    #[must_use]
    pub fn all_entities(&self) -> Vec<Entity> {
        let mut all: Vec<Entity> = self.membership.keys().copied().collect();
        all.sort_unstable();
        all
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.membership.len()
    }

    /// Names of the component kinds an entity holds, sorted.
    #[must_use]
    pub fn component_names(&self, entity: Entity) -> Option<Vec<&'static str>> {
        let members = self.membership.get(&entity)?;
        let mut names: Vec<&'static str> = members
            .iter()
            .filter_map(|ty| self.stores.get(ty).map(|s| s.component_name()))
            .collect();
        names.sort_unstable();
        Some(names)
    }

    // -- Component operations --

    /// Attach (or overwrite) a component on an entity.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnregisteredComponent`] if `T` was never
    /// registered, or [`WorldError::EntityNotFound`] if the entity does not
    /// exist.
    pub fn add_component<T: Component>(
        &mut self,
        entity: Entity,
        value: T,
    ) -> Result<(), WorldError> {
        let store = Self::typed_store_mut::<T>(&mut self.stores)?;
        let members = self
            .membership
            .get_mut(&entity)
            .ok_or(WorldError::EntityNotFound(entity))?;
        store.set(entity, value);
        members.insert(T::component_type_id());
        self.cache_dirty = true;
        Ok(())
    }

    /// Get a component value. `None` if the entity, the component or the
    /// store is absent.
    #[must_use]
    pub fn get_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.store::<T>().ok()?.get(entity)
    }

    /// Get a component value mutably. `None` if absent.
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Option<&mut T> {
        Self::typed_store_mut::<T>(&mut self.stores)
            .ok()?
            .get_mut(entity)
    }

    /// Check if an entity has a component. `false` if the store is absent.
    #[must_use]
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.store::<T>().is_ok_and(|store| store.has(entity))
    }

    /// Detach a component, returning its value if there was one.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        let value = Self::typed_store_mut::<T>(&mut self.stores)
            .ok()?
            .take(entity)?;
        if let Some(members) = self.membership.get_mut(&entity) {
            members.remove(&T::component_type_id());
        }
        self.cache_dirty = true;
        Some(value)
    }

    // -- Query --

    /// Entities holding every component in `Q`, in ascending ID order.
    ///
    /// The returned slice may come from the tick cache and is shared; it
    /// stays valid while the world is mutated.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnregisteredComponent`] naming the first
    /// requested kind that has no store.
    pub fn query<Q: ComponentSet>(&mut self) -> Result<Arc<[Entity]>, WorldError> {
        let ids = Q::type_ids();
        let names = Q::type_names();
        self.cached_query(QueryKey::new(&ids)).map_err(|missing| {
            let name = ids
                .iter()
                .position(|id| *id == missing)
                .map_or_else(|| format!("{missing:?}"), |i| names[i].to_string());
            WorldError::UnregisteredComponent(name)
        })
    }

    /// Dynamic form of [`World::query`] over raw type ids.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnregisteredComponent`] if any kind has no store.
    pub fn query_ids(&mut self, types: &[ComponentTypeId]) -> Result<Arc<[Entity]>, WorldError> {
        self.cached_query(QueryKey::new(types))
            .map_err(|missing| WorldError::UnregisteredComponent(format!("{missing:?}")))
    }

    fn cached_query(&mut self, key: QueryKey) -> Result<Arc<[Entity]>, ComponentTypeId> {
        if let Some(hit) = self.query_cache.get(&key) {
            return Ok(Arc::clone(hit));
        }
        let result = self.compute_query(&key)?;
        self.query_cache.insert(key, Arc::clone(&result));
        Ok(result)
    }

    /// Scan the smallest requested store and membership-check each candidate
    /// against the remaining kinds.
    fn compute_query(&self, key: &QueryKey) -> Result<Arc<[Entity]>, ComponentTypeId> {
        let mut smallest: Option<&dyn AnyStore> = None;
        for ty in key.types() {
            let store = self.stores.get(ty).ok_or(*ty)?;
            if smallest.is_none_or(|s| store.len() < s.len()) {
                smallest = Some(&**store);
            }
        }
        let Some(driver) = smallest else {
            return Ok(Vec::<Entity>::new().into());
        };

        let mut matched: Vec<Entity> = driver
            .entity_slice()
            .iter()
            .copied()
            .filter(|entity| {
                self.membership
                    .get(entity)
                    .is_some_and(|members| key.types().iter().all(|ty| members.contains(ty)))
            })
            .collect();
        matched.sort_unstable();
        Ok(matched.into())
    }

    /// Clear the query cache if anything changed since the last flush.
    ///
    /// Returns `true` if the cache was cleared.
    pub fn flush_query_cache(&mut self) -> bool {
        if !self.cache_dirty {
            return false;
        }
        self.query_cache.clear();
        self.cache_dirty = false;
        true
    }

    /// Number of cached query results.
    #[must_use]
    pub fn cached_query_count(&self) -> usize {
        self.query_cache.len()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.membership.len())
            .field("stores", &self.stores.len())
            .field("cached_queries", &self.query_cache.len())
            .field("cache_dirty", &self.cache_dirty)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
        z: f32,
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Velocity {
        vx: f32,
        vy: f32,
        vz: f32,
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Frozen;

    impl Component for Position {
        fn type_name() -> &'static str {
            "Position"
        }
    }

    impl Component for Velocity {
        fn type_name() -> &'static str {
            "Velocity"
        }
    }

    impl Component for Frozen {
        fn type_name() -> &'static str {
            "Frozen"
        }
    }

    fn pos(x: f32, y: f32, z: f32) -> Position {
        Position { x, y, z }
    }

    fn vel(vx: f32) -> Velocity {
        Velocity {
            vx,
            vy: 0.0,
            vz: 0.0,
        }
    }

    fn make_world() -> World {
        let mut world = World::new();
        world.register_component::<Position>().unwrap();
        world.register_component::<Velocity>().unwrap();
        world.register_component::<Frozen>().unwrap();
        world
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut world = World::new();
        let e = world.create_entity();
        world.register_component::<Position>().unwrap();
        world.add_component(e, pos(1.0, 2.0, 3.0)).unwrap();

        let store = world.register_component::<Position>().unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(e), Some(&pos(1.0, 2.0, 3.0)));
    }

    #[test]
    fn test_create_and_exists() {
        let mut world = make_world();
        let e = world.create_entity();
        assert!(world.entity_exists(e));
        assert_eq!(world.entity_count(), 1);
        assert_eq!(world.component_names(e), Some(vec![]));
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut world = make_world();
        let a = world.create_entity();
        world.destroy_entity(a);
        let b = world.create_entity();
        assert_ne!(a, b);
        assert!(!world.entity_exists(a));
    }

    #[test]
    fn test_destroy_cascades_across_stores() {
        let mut world = make_world();
        let e = world.create_entity();
        world.add_component(e, pos(0.0, 0.0, 0.0)).unwrap();
        world.add_component(e, vel(1.0)).unwrap();

        assert!(world.destroy_entity(e));
        assert!(!world.entity_exists(e));
        assert!(!world.has_component::<Position>(e));
        assert!(world.store::<Velocity>().unwrap().is_empty());

        world.flush_query_cache();
        assert!(world.query::<(Position,)>().unwrap().is_empty());
        assert!(world.query::<(Position, Velocity)>().unwrap().is_empty());
    }

    #[test]
    fn test_destroy_unknown_is_noop() {
        let mut world = make_world();
        world.flush_query_cache();
        assert!(!world.destroy_entity(Entity::from_raw(42)));
        assert!(!world.flush_query_cache(), "no-op destroy must not dirty the cache");
    }

    #[test]
    fn test_add_requires_registration() {
        let mut world = World::new();
        let e = world.create_entity();
        let err = world.add_component(e, pos(0.0, 0.0, 0.0)).unwrap_err();
        assert!(matches!(err, WorldError::UnregisteredComponent(name) if name == "Position"));
    }

    #[test]
    fn test_add_to_missing_entity_fails() {
        let mut world = make_world();
        let err = world
            .add_component(Entity::from_raw(99), vel(1.0))
            .unwrap_err();
        assert!(matches!(err, WorldError::EntityNotFound(e) if e == Entity::from_raw(99)));
    }

    #[test]
    fn test_reads_on_unregistered_store_are_absent() {
        let mut world = World::new();
        let e = world.create_entity();
        assert!(world.get_component::<Position>(e).is_none());
        assert!(!world.has_component::<Position>(e));
        assert!(world.remove_component::<Position>(e).is_none());
    }

    #[test]
    fn test_remove_component_updates_membership() {
        let mut world = make_world();
        let e = world.create_entity();
        world.add_component(e, pos(1.0, 1.0, 1.0)).unwrap();
        world.add_component(e, Frozen).unwrap();
        assert_eq!(world.component_names(e), Some(vec!["Frozen", "Position"]));

        assert_eq!(world.remove_component::<Frozen>(e), Some(Frozen));
        assert_eq!(world.component_names(e), Some(vec!["Position"]));
        assert!(world.remove_component::<Frozen>(e).is_none());
        assert!(world.entity_exists(e));
    }

    #[test]
    fn test_get_component_mut() {
        let mut world = make_world();
        let e = world.create_entity();
        world.add_component(e, pos(0.0, 0.0, 0.0)).unwrap();
        world.get_component_mut::<Position>(e).unwrap().x = 4.0;
        assert_eq!(world.get_component::<Position>(e).unwrap().x, 4.0);
    }

    #[test]
    fn test_query_requires_all_components() {
        let mut world = make_world();
        let a = world.create_entity();
        world.add_component(a, pos(0.0, 0.0, 0.0)).unwrap();
        world.add_component(a, vel(1.0)).unwrap();
        let b = world.create_entity();
        world.add_component(b, pos(0.0, 0.0, 0.0)).unwrap();

        assert_eq!(&*world.query::<(Position, Velocity)>().unwrap(), &[a]);
        let mut both = world.query::<(Position,)>().unwrap().to_vec();
        both.sort();
        assert_eq!(both, vec![a, b]);
    }

    #[test]
    fn test_query_order_invariance() {
        let mut world = make_world();
        for i in 0..6 {
            let e = world.create_entity();
            world.add_component(e, pos(i as f32, 0.0, 0.0)).unwrap();
            if i % 2 == 0 {
                world.add_component(e, vel(1.0)).unwrap();
            }
        }
        let ab = world.query::<(Position, Velocity)>().unwrap();
        let ba = world.query::<(Velocity, Position)>().unwrap();
        assert_eq!(ab, ba);
        assert_eq!(ab.len(), 3);
        assert_eq!(world.cached_query_count(), 1);
    }

    #[test]
    fn test_query_results_are_ascending() {
        let mut world = make_world();
        let ids: Vec<Entity> = (0..5).map(|_| world.create_entity()).collect();
        for &e in ids.iter().rev() {
            world.add_component(e, vel(0.0)).unwrap();
        }
        world.remove_component::<Velocity>(ids[4]);
        world.add_component(ids[4], vel(0.0)).unwrap();
        assert_eq!(world.query::<(Velocity,)>().unwrap().to_vec(), ids);
    }

    #[test]
    fn test_query_unregistered_is_an_error() {
        let mut world = World::new();
        world.register_component::<Position>().unwrap();
        let err = world.query::<(Position, Velocity)>().unwrap_err();
        assert!(matches!(err, WorldError::UnregisteredComponent(name) if name == "Velocity"));
        assert!(
            world
                .query_ids(&[Velocity::component_type_id()])
                .is_err()
        );
    }

    #[test]
    fn test_query_before_and_after_add() {
        let mut world = make_world();
        let e = world.create_entity();
        world.add_component(e, pos(0.0, 0.0, 0.0)).unwrap();
        world.flush_query_cache();

        assert!(world.query::<(Position, Velocity)>().unwrap().is_empty());

        world.add_component(e, vel(1.0)).unwrap();
        world.flush_query_cache();
        assert_eq!(&*world.query::<(Position, Velocity)>().unwrap(), &[e]);
    }

    #[test]
    fn test_cached_entry_is_stale_until_flush() {
        let mut world = make_world();
        let e = world.create_entity();
        world.add_component(e, pos(0.0, 0.0, 0.0)).unwrap();
        world.flush_query_cache();

        let before = world.query::<(Position,)>().unwrap();
        assert_eq!(&*before, &[e]);

        let f = world.create_entity();
        world.add_component(f, pos(1.0, 0.0, 0.0)).unwrap();

        // Same key, same tick: the cached result is returned unchanged.
        assert_eq!(&*world.query::<(Position,)>().unwrap(), &[e]);
        // A key not cached yet reads the live stores.
        assert!(world.query::<(Position, Frozen)>().unwrap().is_empty());
        world.add_component(f, Frozen).unwrap();
        assert!(world.query::<(Frozen,)>().unwrap().contains(&f));

        assert!(world.flush_query_cache());
        assert_eq!(&*world.query::<(Position,)>().unwrap(), &[e, f]);
    }

    #[test]
    fn test_flush_twice_is_noop() {
        let mut world = make_world();
        let e = world.create_entity();
        world.add_component(e, vel(1.0)).unwrap();

        assert!(world.flush_query_cache());
        world.query::<(Velocity,)>().unwrap();
        assert!(!world.flush_query_cache());
        assert!(!world.flush_query_cache());
        assert_eq!(world.cached_query_count(), 1, "clean flush keeps entries");
    }

    #[test]
    fn test_value_updates_do_not_dirty_cache() {
        let mut world = make_world();
        let e = world.create_entity();
        world.add_component(e, pos(0.0, 0.0, 0.0)).unwrap();
        world.flush_query_cache();

        world.get_component_mut::<Position>(e).unwrap().y = 3.0;
        world.store_mut::<Position>().unwrap().get_mut(e).unwrap().z = 1.0;
        assert!(!world.flush_query_cache());
        assert_eq!(world.get_component::<Position>(e), Some(&pos(0.0, 3.0, 1.0)));
    }

    #[test]
    fn test_empty_query() {
        let mut world = make_world();
        world.create_entity();
        assert!(world.query_ids(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_all_entities_sorted() {
        let mut world = make_world();
        let ids: Vec<Entity> = (0..4).map(|_| world.create_entity()).collect();
        world.destroy_entity(ids[1]);
        assert_eq!(world.all_entities(), vec![ids[0], ids[2], ids[3]]);
        assert_eq!(world.entity_count(), 3);
    }
}

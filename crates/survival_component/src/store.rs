//! Typed sparse-set storage for a single component kind.
//!
//! Values live in a packed `Vec<T>` alongside a parallel `Vec<Entity>`, with
//! an entity → slot index for O(1) lookup. Removal swap-removes, so the dense
//! arrays never contain holes and iteration touches only live values.

use std::any::Any;
use std::collections::HashMap;

use crate::component::Component;
use crate::entity::Entity;

/// Type-erased view of a [`ComponentStore`], used by the world to cascade
/// entity destruction across stores without knowing their value types.
pub trait AnyStore: Send + Sync {
    /// Remove the entity's value, if any. Returns `true` if one was removed.
    fn remove_entity(&mut self, entity: Entity) -> bool;

    /// Returns `true` if the store holds a value for `entity`.
    fn contains(&self, entity: Entity) -> bool;

    /// Number of values in the store.
    fn len(&self) -> usize;

    /// Returns `true` if the store is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entities currently holding a value, in dense order.
    fn entity_slice(&self) -> &[Entity];

    /// Name of the stored component kind.
    fn component_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Entity → value storage for one component kind.
#[derive(Debug)]
pub struct ComponentStore<T> {
    index: HashMap<Entity, usize>,
    entities: Vec<Entity>,
    values: Vec<T>,
}

impl<T> ComponentStore<T> {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            entities: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Insert or overwrite the value for `entity`.
    pub fn set(&mut self, entity: Entity, value: T) {
        if let Some(&slot) = self.index.get(&entity) {
            self.values[slot] = value;
        } else {
            self.index.insert(entity, self.values.len());
            self.entities.push(entity);
            self.values.push(value);
        }
    }

    /// Returns the value for `entity`, if present.
    #[must_use]
    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.index.get(&entity).map(|&slot| &self.values[slot])
    }

    /// Returns a mutable reference to the value for `entity`, if present.
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        match self.index.get(&entity) {
            Some(&slot) => Some(&mut self.values[slot]),
            None => None,
        }
    }

    /// Returns `true` if `entity` has a value in this store.
    #[must_use]
    pub fn has(&self, entity: Entity) -> bool {
        self.index.contains_key(&entity)
    }

    /// Remove and return the value for `entity`.
    pub fn take(&mut self, entity: Entity) -> Option<T> {
        let slot = self.index.remove(&entity)?;
        let last = self.values.len() - 1;
        if slot != last {
            let moved = self.entities[last];
            self.index.insert(moved, slot);
        }
        self.entities.swap_remove(slot);
        Some(self.values.swap_remove(slot))
    }

    /// Remove the value for `entity`. Returns `false` if there was none.
    pub fn delete(&mut self, entity: Entity) -> bool {
        self.take(entity).is_some()
    }

    /// Iterate the entities holding a value.
    ///
    /// Every call starts a fresh pass over the live state.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter().copied()
    }

    /// Iterate `(entity, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> + '_ {
        self.entities.iter().copied().zip(self.values.iter())
    }

    /// Iterate `(entity, value)` pairs mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> + '_ {
        self.entities.iter().copied().zip(self.values.iter_mut())
    }

    /// Number of values in the store.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<T> Default for ComponentStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component> AnyStore for ComponentStore<T> {
    fn remove_entity(&mut self, entity: Entity) -> bool {
        self.delete(entity)
    }

    fn contains(&self, entity: Entity) -> bool {
        self.has(entity)
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn entity_slice(&self) -> &[Entity] {
        &self.entities
    }

    fn component_name(&self) -> &'static str {
        T::type_name()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

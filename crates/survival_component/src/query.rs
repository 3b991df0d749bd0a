//! Canonical component-set keys for cached queries.
//!
//! A [`QueryKey`] is the sorted, de-duplicated list of component kinds a query
//! asks for, so `(Position, Velocity)` and `(Velocity, Position)` share one
//! cache entry. [`ComponentSet`] lets a tuple of component types describe
//! itself as such a list.

use crate::component::{Component, ComponentTypeId};

/// Sorted, de-duplicated set of component kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(Box<[ComponentTypeId]>);

impl QueryKey {
    /// Build the canonical key for the given kinds, in any order.
    #[must_use]
    pub fn new(types: &[ComponentTypeId]) -> Self {
        let mut sorted = types.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        Self(sorted.into_boxed_slice())
    }

    /// The component kinds, in canonical order.
    #[must_use]
    pub fn types(&self) -> &[ComponentTypeId] {
        &self.0
    }

    /// Returns `true` if the key names no component kinds.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A static set of component types, implemented for tuples of up to eight
/// [`Component`]s.
pub trait ComponentSet {
    /// The type ids of the members, in declaration order.
    fn type_ids() -> Vec<ComponentTypeId>;

    /// The names of the members, in declaration order.
    fn type_names() -> Vec<&'static str>;
}

macro_rules! impl_component_set {
    ($($name:ident),+) => {
        impl<$($name: Component),+> ComponentSet for ($($name,)+) {
            fn type_ids() -> Vec<ComponentTypeId> {
                vec![$($name::component_type_id()),+]
            }

            fn type_names() -> Vec<&'static str> {
                vec![$($name::type_name()),+]
            }
        }
    };
}

impl_component_set!(A);
impl_component_set!(A, B);
impl_component_set!(A, B, C);
impl_component_set!(A, B, C, D);
impl_component_set!(A, B, C, D, E);
impl_component_set!(A, B, C, D, E, F);
impl_component_set!(A, B, C, D, E, F, G);
impl_component_set!(A, B, C, D, E, F, G, H);

//! # survival_component
//!
//! The storage primitives of the simulation ECS.
//!
//! This crate provides:
//!
//! - [`Entity`]: opaque `u64` entity identifiers, never reused.
//! - [`EntityAllocator`]: monotonically increasing ID allocator.
//! - [`Component`] trait: the contract all ECS data must satisfy.
//! - [`ComponentStore`]: typed sparse-set storage for one component kind.
//! - [`QueryKey`] / [`ComponentSet`]: canonical component-set keys for cached queries.

pub mod component;
pub mod entity;
pub mod query;
pub mod store;

pub use component::{Component, ComponentTypeId};
pub use entity::{Entity, EntityAllocator};
pub use query::{ComponentSet, QueryKey};
pub use store::{AnyStore, ComponentStore};

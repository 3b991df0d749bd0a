//! # survival_ecs
//!
//! The ECS world for the survival simulation.
//!
//! - [`World`]: store registry, entity lifecycle, membership map and the
//!   tick-granular query cache.
//! - [`WorldError`]: programmer errors surfaced by world operations.

pub mod error;
pub mod world;

pub use error::WorldError;
pub use world::World;

pub use survival_component::{Component, ComponentSet, ComponentStore, ComponentTypeId, Entity};

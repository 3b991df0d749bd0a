//! Built-in gameplay systems.
//!
//! Each module exposes a `run(world, ctx, dt)` function with the
//! [`SystemFn`](crate::registry::SystemFn) signature.

pub mod day_night;
pub mod death;
pub mod movement;
pub mod physics;
pub mod survival;

use crate::registry::{SystemRegistry, SystemStage};

/// Register the built-in systems in canonical order.
pub fn register_defaults(registry: &mut SystemRegistry) {
    registry.register("day_night", SystemStage::WorldClock, day_night::run);
    registry.register("physics", SystemStage::Physics, physics::run);
    registry.register("movement", SystemStage::Movement, movement::run);
    registry.register("survival", SystemStage::Survival, survival::run);
    registry.register("death", SystemStage::Death, death::run);
}

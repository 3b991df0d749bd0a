//! Gravity for bodies that collide with terrain.

use survival_ecs::{World, WorldError};

use crate::components::{Collider, Dead, Grounded, Velocity};
use crate::context::SimContext;

/// Accelerate every airborne collider downwards, capped at terminal velocity.
///
/// Grounded bodies keep their vertical velocity so a jump applied during
/// input processing survives into the movement pass.
pub fn run(world: &mut World, ctx: &mut SimContext, dt: f32) -> Result<(), WorldError> {
    let gravity = ctx.movement.gravity;
    let terminal = ctx.movement.terminal_velocity;

    for &entity in world.query::<(Velocity, Collider)>()?.iter() {
        if world.has_component::<Dead>(entity) {
            continue;
        }
        let grounded = world
            .get_component::<Grounded>(entity)
            .is_some_and(|g| g.0);
        if grounded {
            continue;
        }
        if let Some(velocity) = world.get_component_mut::<Velocity>(entity) {
            velocity.0.y = (velocity.0.y - gravity * dt).max(-terminal);
        }
    }
    Ok(())
}

//! Position integration and terrain collision.
//!
//! Bodies without a [`Collider`] move freely. Collider bodies are resolved
//! one axis at a time (Y, then X, then Z) so sliding along a wall keeps the
//! unobstructed components of the motion. Each axis advances in slices of
//! at most one block, so fast bodies cannot skip over a solid cell.

use glam::Vec3;
use survival_ecs::{Entity, World, WorldError};
use survival_math::Footprint;

use crate::components::{Collider, Dead, Grounded, Position, Velocity};
use crate::context::SimContext;
use crate::terrain::{collides, is_grounded};

pub fn run(world: &mut World, ctx: &mut SimContext, dt: f32) -> Result<(), WorldError> {
    let entities = world.query::<(Position, Velocity)>()?;
    for &entity in entities.iter() {
        if world.has_component::<Dead>(entity) {
            continue;
        }
        let (Some(position), Some(velocity)) = (
            world.get_component::<Position>(entity).map(|p| p.0),
            world.get_component::<Velocity>(entity).map(|v| v.0),
        ) else {
            continue;
        };

        match world.get_component::<Collider>(entity).map(|c| c.0) {
            Some(footprint) => move_colliding(world, ctx, entity, position, velocity, footprint, dt),
            None => {
                if let Some(p) = world.get_component_mut::<Position>(entity) {
                    p.0 = position + velocity * dt;
                }
            }
        }
    }
    Ok(())
}

fn move_colliding(
    world: &mut World,
    ctx: &SimContext,
    entity: Entity,
    mut position: Vec3,
    mut velocity: Vec3,
    footprint: Footprint,
    dt: f32,
) {
    let terrain = ctx.terrain.as_ref();
    let world_type = ctx.world_of(world, entity);

    for axis in [1, 0, 2] {
        let step = velocity[axis] * dt;
        if step == 0.0 {
            continue;
        }
        let slices = step.abs().ceil().max(1.0);
        let slice = step / slices;
        for _ in 0..slices as u32 {
            let mut candidate = position;
            candidate[axis] += slice;
            if !collides(terrain, world_type, candidate, &footprint) {
                position = candidate;
                continue;
            }
            // Blocked. Landing snaps the feet to the top of the block below.
            if axis == 1 && slice < 0.0 {
                let top = candidate.y.floor() + 1.0;
                if top <= position.y {
                    position.y = top;
                }
            }
            velocity[axis] = 0.0;
            break;
        }
    }

    let grounded = is_grounded(terrain, world_type, position, &footprint);
    if grounded && velocity.y < 0.0 {
        velocity.y = 0.0;
    }

    if let Some(p) = world.get_component_mut::<Position>(entity) {
        p.0 = position;
    }
    if let Some(v) = world.get_component_mut::<Velocity>(entity) {
        v.0 = velocity;
    }
    if let Some(g) = world.get_component_mut::<Grounded>(entity) {
        g.0 = grounded;
    }
}

//! Marks entities whose health ran out.

use survival_ecs::{World, WorldError};
use tracing::debug;

use crate::components::{Dead, Velocity, Vitals};
use crate::context::{SimContext, WorldEvent};

pub fn run(world: &mut World, ctx: &mut SimContext, _dt: f32) -> Result<(), WorldError> {
    let entities = world.query::<(Vitals,)>()?;
    for &entity in entities.iter() {
        let dying = world
            .get_component::<Vitals>(entity)
            .is_some_and(|v| v.health <= 0.0);
        if !dying || world.has_component::<Dead>(entity) {
            continue;
        }

        world.add_component(entity, Dead)?;
        if let Some(velocity) = world.get_component_mut::<Velocity>(entity) {
            *velocity = Velocity::ZERO;
        }
        debug!(%entity, tick = ctx.tick, "entity died");
        ctx.emit(WorldEvent::Died { entity });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::Vec3;
    use survival_net::WorldType;

    use super::*;
    use crate::components::register_components;
    use crate::terrain::FlatTerrain;

    #[test]
    fn test_death_is_recorded_once() {
        let mut world = World::new();
        register_components(&mut world).unwrap();
        let mut ctx = SimContext::new(Arc::new(FlatTerrain::new(0)), WorldType::Overworld);

        let alive = world.create_entity();
        world.add_component(alive, Vitals::default()).unwrap();
        let dying = world.create_entity();
        world
            .add_component(
                dying,
                Vitals {
                    health: 0.0,
                    ..Vitals::default()
                },
            )
            .unwrap();
        world.add_component(dying, Velocity(Vec3::X)).unwrap();

        run(&mut world, &mut ctx, 0.05).unwrap();
        assert!(world.has_component::<Dead>(dying));
        assert!(!world.has_component::<Dead>(alive));
        assert_eq!(world.get_component::<Velocity>(dying), Some(&Velocity::ZERO));
        assert_eq!(ctx.events, vec![WorldEvent::Died { entity: dying }]);

        run(&mut world, &mut ctx, 0.05).unwrap();
        assert_eq!(ctx.events.len(), 1);
    }
}

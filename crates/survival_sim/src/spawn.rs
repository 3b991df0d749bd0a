//! Entity templates.

use glam::Vec3;
use survival_ecs::{Entity, World, WorldError};
use survival_net::{PlayerId, WorldType};

use crate::components::{
    ActionState, Collider, Controlled, Facing, Grounded, InWorld, Position, Velocity, Vitals,
};

/// Create a player avatar standing at `position` in `world_type`.
///
/// The caller still has to bind `player` to the returned entity in its
/// [`PlayerDirectory`](crate::players::PlayerDirectory).
///
/// # Errors
///
/// Returns [`WorldError::UnregisteredComponent`] if the gameplay components
/// were not registered.
pub fn spawn_player(
    world: &mut World,
    player: PlayerId,
    world_type: WorldType,
    position: Vec3,
) -> Result<Entity, WorldError> {
    let entity = world.create_entity();
    world.add_component(entity, Position(position))?;
    world.add_component(entity, Velocity::ZERO)?;
    world.add_component(entity, Facing::default())?;
    world.add_component(entity, Collider::default())?;
    world.add_component(entity, Grounded(false))?;
    world.add_component(entity, Vitals::default())?;
    world.add_component(entity, ActionState::default())?;
    world.add_component(entity, Controlled { player })?;
    world.add_component(entity, InWorld(world_type))?;
    Ok(entity)
}

/// Remove `player`'s avatar. Returns `false` if `entity` no longer exists
/// or belongs to someone else.
pub fn despawn_player(world: &mut World, player: PlayerId, entity: Entity) -> bool {
    let owned = world
        .get_component::<Controlled>(entity)
        .is_some_and(|c| c.player == player);
    owned && world.destroy_entity(entity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::register_components;

    #[test]
    fn test_spawn_builds_full_avatar() {
        let mut world = World::new();
        register_components(&mut world).unwrap();
        let player = PlayerId::from_u128(5);

        let e = spawn_player(&mut world, player, WorldType::Underground, Vec3::new(1.0, 2.0, 3.0))
            .unwrap();
        assert_eq!(world.get_component::<Position>(e), Some(&Position(Vec3::new(1.0, 2.0, 3.0))));
        assert_eq!(world.get_component::<Controlled>(e).unwrap().player, player);
        assert_eq!(world.get_component::<InWorld>(e), Some(&InWorld(WorldType::Underground)));
        assert_eq!(world.component_names(e).unwrap().len(), 9);
    }

    #[test]
    fn test_spawn_requires_registration() {
        let mut world = World::new();
        let err = spawn_player(&mut world, PlayerId::from_u128(1), WorldType::Overworld, Vec3::ZERO)
            .unwrap_err();
        assert!(matches!(err, WorldError::UnregisteredComponent(_)));
    }

    #[test]
    fn test_despawn_checks_owner() {
        let mut world = World::new();
        register_components(&mut world).unwrap();
        let owner = PlayerId::from_u128(1);
        let e = spawn_player(&mut world, owner, WorldType::Overworld, Vec3::ZERO).unwrap();

        assert!(!despawn_player(&mut world, PlayerId::from_u128(2), e));
        assert!(despawn_player(&mut world, owner, e));
        assert!(!world.entity_exists(e));
        assert!(!despawn_player(&mut world, owner, e));
    }
}

//! Gameplay components attached to simulated entities.
//!
//! Kinematic state is split across [`Position`], [`Velocity`] and
//! [`Facing`] so systems can query exactly what they touch. Entities with a
//! [`Collider`] collide with terrain and fall under gravity.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use survival_ecs::{Component, World, WorldError};
use survival_math::Footprint;
use survival_net::{PlayerId, WorldType};

/// Feet position in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position(pub Vec3);

/// Linear velocity in blocks per second.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Velocity(pub Vec3);

impl Velocity {
    pub const ZERO: Self = Self(Vec3::ZERO);
}

/// Horizontal look direction in radians. See [`survival_math::heading`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Facing {
    pub yaw: f32,
}

/// Terrain collision volume.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Collider(pub Footprint);

/// Whether the entity ended the last movement pass standing on a solid block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Grounded(pub bool);

/// Survival meters. All values are in `[0, 100]` except temperature, which is
/// in degrees Celsius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vitals {
    pub health: f32,
    pub hunger: f32,
    pub thirst: f32,
    pub temperature: f32,
}

impl Vitals {
    /// Upper bound of every meter except temperature.
    pub const MAX: f32 = 100.0;
}

impl Default for Vitals {
    fn default() -> Self {
        Self {
            health: Self::MAX,
            hunger: Self::MAX,
            thirst: Self::MAX,
            temperature: 20.0,
        }
    }
}

/// Action buttons and hotbar selection from the player's latest input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionState {
    pub primary: bool,
    pub secondary: bool,
    pub selected_slot: u8,
    /// Sequence number of the input these values came from.
    pub seq: u32,
}

/// Marks an avatar as driven by a connected player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Controlled {
    pub player: PlayerId,
}

/// The world instance an entity lives in. Terrain queries for the entity
/// use it; entities without one belong to the tick loop's own world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InWorld(pub WorldType);

/// Tag: the entity has died and is ignored by survival and input processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Dead;

macro_rules! impl_component {
    ($($ty:ident),* $(,)?) => {
        $(
            impl Component for $ty {
                fn type_name() -> &'static str {
                    stringify!($ty)
                }
            }
        )*
    };
}

impl_component!(
    Position,
    Velocity,
    Facing,
    Collider,
    Grounded,
    Vitals,
    ActionState,
    Controlled,
    InWorld,
    Dead,
);

/// Register every gameplay component kind with `world`.
///
/// # Errors
///
/// Returns [`WorldError::NameCollision`] if another kind already claimed one
/// of the names.
pub fn register_components(world: &mut World) -> Result<(), WorldError> {
    world.register_component::<Position>()?;
    world.register_component::<Velocity>()?;
    world.register_component::<Facing>()?;
    world.register_component::<Collider>()?;
    world.register_component::<Grounded>()?;
    world.register_component::<Vitals>()?;
    world.register_component::<ActionState>()?;
    world.register_component::<Controlled>()?;
    world.register_component::<InWorld>()?;
    world.register_component::<Dead>()?;
    Ok(())
}

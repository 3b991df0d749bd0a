//! Player input queue and its application to avatars.
//!
//! Network tasks push through a cloneable [`InputSender`]; the simulation
//! task owns the [`InputQueue`] and drains it once per tick. Within a tick
//! only the most recent payload of each player is kept.

use std::collections::BTreeMap;

use survival_ecs::{Entity, World};
use survival_math::{Footprint, clamp_horizontal, planar_velocity};
use survival_net::{InputPayload, PlayerId, WorldType};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

use crate::components::{ActionState, Collider, Dead, Facing, InWorld, Position, Velocity};
use crate::context::SimContext;
use crate::players::PlayerDirectory;
use crate::terrain::is_grounded;

/// Cloneable, non-blocking handle for enqueueing player input.
#[derive(Debug, Clone)]
pub struct InputSender {
    tx: mpsc::UnboundedSender<(PlayerId, InputPayload)>,
}

impl InputSender {
    /// Queue `input` for `player`. It replaces anything the player queued
    /// earlier in the same tick.
    ///
    /// Input sent after the simulation has shut down is dropped.
    pub fn queue_input(&self, player: PlayerId, input: InputPayload) {
        if self.tx.send((player, input)).is_err() {
            debug!(%player, "input dropped: simulation is gone");
        }
    }
}

/// Receiving end of the input queue, owned by the simulation task.
#[derive(Debug)]
pub struct InputQueue {
    tx: mpsc::UnboundedSender<(PlayerId, InputPayload)>,
    rx: mpsc::UnboundedReceiver<(PlayerId, InputPayload)>,
}

impl InputQueue {
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    /// A new sender feeding this queue.
    #[must_use]
    pub fn sender(&self) -> InputSender {
        InputSender {
            tx: self.tx.clone(),
        }
    }

    /// Take everything queued so far, keeping the latest payload per
    /// player. The result iterates in ascending player order.
    pub fn drain(&mut self) -> BTreeMap<PlayerId, InputPayload> {
        let mut latest = BTreeMap::new();
        while let Ok((player, input)) = self.rx.try_recv() {
            latest.insert(player, input);
        }
        latest
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply a drained batch to the world. Returns the number of players whose
/// input reached an avatar.
///
/// Players without a live avatar are skipped. The directory's world type
/// for a player is copied onto the avatar's [`InWorld`] first, so input and
/// movement agree on which terrain the avatar stands in.
pub fn apply_inputs(
    world: &mut World,
    ctx: &SimContext,
    players: &dyn PlayerDirectory,
    batch: &BTreeMap<PlayerId, InputPayload>,
) -> usize {
    let mut applied = 0;
    for (&player, input) in batch {
        let Some(entity) = players.player_entity(player) else {
            trace!(%player, "input for unknown player");
            continue;
        };
        if !world.entity_exists(entity) || world.has_component::<Dead>(entity) {
            continue;
        }
        if let Some(world_type) = players.world_type(player) {
            place_in_world(world, entity, world_type);
        }
        let world_type = ctx.world_of(world, entity);
        if apply_input(world, ctx, entity, world_type, input) {
            applied += 1;
        }
    }
    applied
}

fn place_in_world(world: &mut World, entity: Entity, world_type: WorldType) {
    if let Some(current) = world.get_component_mut::<InWorld>(entity) {
        current.0 = world_type;
    } else if let Err(err) = world.add_component(entity, InWorld(world_type)) {
        warn!(%entity, error = %err, "cannot record avatar world");
    }
}

fn apply_input(
    world: &mut World,
    ctx: &SimContext,
    entity: Entity,
    world_type: WorldType,
    input: &InputPayload,
) -> bool {
    let Some(position) = world.get_component::<Position>(entity).map(|p| p.0) else {
        return false;
    };
    let footprint = world
        .get_component::<Collider>(entity)
        .map_or(Footprint::HUMANOID, |c| c.0);

    if let Some(facing) = world.get_component_mut::<Facing>(entity) {
        facing.yaw = input.rotation;
    }

    let movement = &ctx.movement;
    let speed = if input.sprint && !input.crouch {
        movement.sprint_speed
    } else if input.crouch {
        movement.crouch_speed
    } else {
        movement.walk_speed
    };
    let desired = planar_velocity(
        f32::from(input.forward.signum()),
        f32::from(input.right.signum()),
        input.rotation,
        speed,
    );
    let grounded = is_grounded(ctx.terrain.as_ref(), world_type, position, &footprint);

    let Some(velocity) = world.get_component_mut::<Velocity>(entity) else {
        return false;
    };
    velocity.0.x = desired.x;
    velocity.0.z = desired.z;
    if grounded {
        if input.jump {
            velocity.0.y = movement.jump_speed;
        }
    } else {
        velocity.0 = clamp_horizontal(velocity.0, movement.sprint_speed);
    }

    if let Some(actions) = world.get_component_mut::<ActionState>(entity) {
        *actions = ActionState {
            primary: input.primary_action,
            secondary: input.secondary_action,
            selected_slot: input.selected_slot,
            seq: input.seq,
        };
    }
    true
}

//! NATS ↔ simulation bridge.
//!
//! Ingress tasks decode client messages and hand them to the simulation
//! through a [`SchedulerHandle`]; they never touch the world themselves.
//! Egress runs the other way: a post-tick hook builds a [`TickDelta`] and a
//! publisher task sends it, so no network I/O happens inside a tick.

use std::sync::Arc;

use futures::StreamExt;
use glam::Vec3;
use survival_ecs::World;
use survival_net::{
    EntityState, InputPayload, NatsConnection, NetError, PlayerId, PlayerJoin, PlayerLeave,
    TickDelta, decode, subjects,
};
use survival_sim::components::{Facing, InWorld, Position, Velocity};
use survival_sim::{Players, SchedulerHandle, SimContext, despawn_player, spawn_player};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Deltas buffered between the simulation and the publisher.
pub const DELTA_BACKLOG: usize = 64;

/// Where players enter the world and how ingress reaches the simulation.
#[derive(Debug, Clone)]
pub struct Ingress {
    pub prefix: String,
    pub handle: SchedulerHandle,
    pub players: Players,
    pub spawn_point: Vec3,
}

impl Ingress {
    /// Queue an input received on `subject`.
    ///
    /// # Errors
    ///
    /// Returns [`NetError`] if the subject or payload is malformed.
    pub fn handle_input(&self, subject: &str, payload: &[u8]) -> Result<PlayerId, NetError> {
        let player = subjects::parse_input(&self.prefix, subject)?;
        let input: InputPayload = decode(payload)?;
        self.handle.queue_input(player, input);
        Ok(player)
    }

    /// Give a joining player an avatar. A repeated join for the same world
    /// is ignored; one naming another world moves the player there.
    ///
    /// The directory is only read and written inside the simulation task,
    /// so joins and leaves take effect in the order they arrived.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Decode`] if the payload is malformed.
    pub fn handle_join(&self, payload: &[u8]) -> Result<PlayerId, NetError> {
        let join: PlayerJoin = decode(payload)?;
        let player = join.player;
        let players = self.players.clone();
        let spawn_point = self.spawn_point;
        let world_type = join.world_type;
        let dispatched = self.handle.dispatch(move |tick_loop| {
            if let Some(entry) = players.get(player) {
                if entry.world_type == world_type {
                    debug!(%player, "duplicate join ignored");
                } else if players.set_world_type(player, world_type) {
                    if let Some(in_world) =
                        tick_loop.world_mut().get_component_mut::<InWorld>(entry.entity)
                    {
                        in_world.0 = world_type;
                    }
                    info!(%player, from = ?entry.world_type, to = ?world_type, "player changed world");
                }
                return;
            }
            match spawn_player(tick_loop.world_mut(), player, world_type, spawn_point) {
                Ok(entity) => {
                    players.insert(player, entity, world_type);
                    info!(%player, %entity, ?world_type, "player joined");
                }
                Err(err) => error!(%player, error = %err, "failed to spawn player"),
            }
        });
        if !dispatched {
            warn!(%player, "join dropped: simulation is gone");
        }
        Ok(player)
    }

    /// Remove a leaving player's avatar.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Decode`] if the payload is malformed.
    pub fn handle_leave(&self, payload: &[u8]) -> Result<PlayerId, NetError> {
        let leave: PlayerLeave = decode(payload)?;
        let player = leave.player;
        let players = self.players.clone();
        let dispatched = self.handle.dispatch(move |tick_loop| {
            let Some(entry) = players.remove(player) else {
                debug!(%player, "leave for unknown player");
                return;
            };
            if despawn_player(tick_loop.world_mut(), player, entry.entity) {
                info!(%player, entity = %entry.entity, "player left");
            }
        });
        if !dispatched {
            warn!(%player, "leave dropped: simulation is gone");
        }
        Ok(player)
    }

    /// Subscribe to the client subjects and spawn one task per subscription.
    ///
    /// # Errors
    ///
    /// Returns [`NetError::Subscribe`] if any subscription fails.
    pub async fn spawn(self, conn: &NatsConnection) -> Result<Vec<JoinHandle<()>>, NetError> {
        let inputs = conn.subscribe(&subjects::input_wildcard(&self.prefix)).await?;
        let joins = conn.subscribe(&subjects::player_join(&self.prefix)).await?;
        let leaves = conn.subscribe(&subjects::player_leave(&self.prefix)).await?;
        info!(prefix = %self.prefix, "listening for client messages");

        let ingress = Arc::new(self);
        let mut tasks = Vec::with_capacity(3);

        let this = Arc::clone(&ingress);
        tasks.push(tokio::spawn(async move {
            let mut inputs = inputs;
            while let Some(msg) = inputs.next().await {
                if let Err(err) = this.handle_input(msg.subject.as_str(), &msg.payload) {
                    warn!(subject = %msg.subject, error = %err, "dropping input");
                }
            }
        }));

        let this = Arc::clone(&ingress);
        tasks.push(tokio::spawn(async move {
            let mut joins = joins;
            while let Some(msg) = joins.next().await {
                if let Err(err) = this.handle_join(&msg.payload) {
                    warn!(error = %err, "dropping join");
                }
            }
        }));

        tasks.push(tokio::spawn(async move {
            let mut leaves = leaves;
            while let Some(msg) = leaves.next().await {
                if let Err(err) = ingress.handle_leave(&msg.payload) {
                    warn!(error = %err, "dropping leave");
                }
            }
        }));

        Ok(tasks)
    }
}

/// Kinematic state of every positioned entity, in ascending id order.
#[must_use]
pub fn build_delta(world: &World, ctx: &SimContext, tick: u64) -> TickDelta {
    let entities = world
        .all_entities()
        .into_iter()
        .filter_map(|entity| {
            let position = world.get_component::<Position>(entity)?.0;
            let velocity = world
                .get_component::<Velocity>(entity)
                .map_or(Vec3::ZERO, |v| v.0);
            let yaw = world.get_component::<Facing>(entity).map_or(0.0, |f| f.yaw);
            Some(EntityState {
                entity,
                position: position.to_array(),
                velocity: velocity.to_array(),
                yaw,
            })
        })
        .collect();
    TickDelta {
        tick,
        time_of_day: ctx.time_of_day,
        entities,
    }
}

/// Post-tick hook that forwards a [`TickDelta`] to the publisher.
///
/// Never blocks: if the publisher is behind, the delta is dropped.
pub fn delta_hook(tx: mpsc::Sender<TickDelta>) -> impl FnMut(&World, &SimContext, u64) + Send {
    move |world, ctx, tick| match tx.try_send(build_delta(world, ctx, tick)) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(_)) => debug!(tick, "publisher behind, delta dropped"),
        Err(mpsc::error::TrySendError::Closed(_)) => {}
    }
}

/// Publish every delta received on `rx` to `subject`.
pub fn spawn_egress(
    conn: NatsConnection,
    subject: String,
    mut rx: mpsc::Receiver<TickDelta>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(delta) = rx.recv().await {
            if let Err(err) = conn.publish(&subject, &delta).await {
                warn!(tick = delta.tick, error = %err, "failed to publish tick delta");
            }
        }
        debug!("tick delta publisher finished");
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use survival_net::{WorldType, encode};
    use survival_sim::{FlatTerrain, PlayerDirectory, Scheduler, TickConfig, TickLoop};

    use super::*;

    fn setup() -> (Scheduler, Ingress) {
        let players = Players::new();
        let tick_loop = TickLoop::new(
            TickConfig::default(),
            Arc::new(FlatTerrain::new(0)),
            Arc::new(players.clone()),
        )
        .unwrap()
        .with_default_systems();
        let scheduler = Scheduler::new(tick_loop);
        let ingress = Ingress {
            prefix: subjects::DEFAULT_PREFIX.to_string(),
            handle: scheduler.handle(),
            players,
            spawn_point: Vec3::new(0.5, 1.0, 0.5),
        };
        (scheduler, ingress)
    }

    #[tokio::test(start_paused = true)]
    async fn test_join_input_leave() {
        let (mut scheduler, ingress) = setup();
        let player = PlayerId::from_u128(11);
        scheduler.start();

        let join = encode(&PlayerJoin { player, world_type: WorldType::Overworld }).unwrap();
        ingress.handle_join(&join).unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        let entity = ingress.players.player_entity(player).unwrap();

        let input = encode(&InputPayload { forward: 1, ..Default::default() }).unwrap();
        let subject = subjects::input(&ingress.prefix, player);
        assert_eq!(ingress.handle_input(&subject, &input).unwrap(), player);
        tokio::time::sleep(Duration::from_millis(200)).await;

        let leave = encode(&PlayerLeave { player }).unwrap();
        ingress.handle_leave(&leave).unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        scheduler.stop().await.unwrap();

        assert!(ingress.players.is_empty());
        assert!(!scheduler.tick_loop().unwrap().world().entity_exists(entity));
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_join_spawns_once() {
        let (mut scheduler, ingress) = setup();
        let player = PlayerId::from_u128(3);
        let join = encode(&PlayerJoin { player, world_type: WorldType::Overworld }).unwrap();

        scheduler.start();
        ingress.handle_join(&join).unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        ingress.handle_join(&join).unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        scheduler.stop().await.unwrap();

        assert_eq!(scheduler.tick_loop().unwrap().world().entity_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_to_back_joins_spawn_once() {
        let (mut scheduler, ingress) = setup();
        let player = PlayerId::from_u128(4);
        let join = encode(&PlayerJoin { player, world_type: WorldType::Overworld }).unwrap();

        scheduler.start();
        ingress.handle_join(&join).unwrap();
        ingress.handle_join(&join).unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;
        scheduler.stop().await.unwrap();

        let world = scheduler.tick_loop().unwrap().world();
        assert_eq!(world.entity_count(), 1);
        assert_eq!(ingress.players.player_entity(player), Some(world.all_entities()[0]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_leave_right_after_join_removes_avatar() {
        let (mut scheduler, ingress) = setup();
        let player = PlayerId::from_u128(5);
        let join = encode(&PlayerJoin { player, world_type: WorldType::Overworld }).unwrap();
        let leave = encode(&PlayerLeave { player }).unwrap();

        scheduler.start();
        ingress.handle_join(&join).unwrap();
        ingress.handle_leave(&leave).unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;
        scheduler.stop().await.unwrap();

        assert_eq!(scheduler.tick_loop().unwrap().world().entity_count(), 0);
        assert!(ingress.players.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_join_into_another_world_moves_player() {
        let (mut scheduler, ingress) = setup();
        let player = PlayerId::from_u128(6);
        let overworld = encode(&PlayerJoin { player, world_type: WorldType::Overworld }).unwrap();
        let underground =
            encode(&PlayerJoin { player, world_type: WorldType::Underground }).unwrap();

        scheduler.start();
        ingress.handle_join(&overworld).unwrap();
        ingress.handle_join(&underground).unwrap();
        tokio::time::sleep(Duration::from_millis(120)).await;
        scheduler.stop().await.unwrap();

        let world = scheduler.tick_loop().unwrap().world();
        assert_eq!(world.entity_count(), 1);
        let entity = ingress.players.player_entity(player).unwrap();
        assert_eq!(world.get_component::<InWorld>(entity), Some(&InWorld(WorldType::Underground)));
        assert_eq!(ingress.players.world_type(player), Some(WorldType::Underground));
    }

    #[test]
    fn test_malformed_messages_are_rejected() {
        let (_scheduler, ingress) = setup();
        assert!(ingress.handle_input("survival.input.nope", &[]).is_err());
        let subject = subjects::input(&ingress.prefix, PlayerId::from_u128(1));
        assert!(ingress.handle_input(&subject, &[0xc1]).is_err());
        assert!(ingress.handle_join(b"junk").is_err());
    }

    #[test]
    fn test_delta_lists_positioned_entities() {
        let (scheduler, _) = setup();
        let tick_loop = scheduler.tick_loop().unwrap();
        let mut world = World::new();
        survival_sim::components::register_components(&mut world).unwrap();
        let moving = world.create_entity();
        world.add_component(moving, Position(Vec3::ONE)).unwrap();
        world.add_component(moving, Velocity(Vec3::X)).unwrap();
        let abstract_entity = world.create_entity();
        world.add_component(abstract_entity, Velocity(Vec3::X)).unwrap();

        let delta = build_delta(&world, tick_loop.context(), 5);
        assert_eq!(delta.tick, 5);
        assert_eq!(delta.entities.len(), 1);
        assert_eq!(delta.entities[0].entity, moving);
        assert_eq!(delta.entities[0].velocity, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_hook_drops_when_publisher_is_behind() {
        let (scheduler, _) = setup();
        let tick_loop = scheduler.tick_loop().unwrap();
        let (tx, mut rx) = mpsc::channel(1);
        let mut hook = delta_hook(tx);

        hook(tick_loop.world(), tick_loop.context(), 1);
        hook(tick_loop.world(), tick_loop.context(), 2);
        assert_eq!(rx.try_recv().unwrap().tick, 1);
        assert!(rx.try_recv().is_err());
    }
}

//! Per-world state handed to every system on every tick.

use std::fmt;
use std::sync::Arc;

use survival_ecs::{Entity, World};
use survival_net::WorldType;

use crate::components::InWorld;
use crate::config::MovementConfig;
use crate::terrain::Terrain;

/// Length of a full day-night cycle, in seconds.
pub const DEFAULT_DAY_LENGTH: f32 = 1200.0;

/// Something that happened during a tick, for post-tick consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldEvent {
    Dawn,
    Dusk,
    Died { entity: Entity },
}

/// Mutable state shared by the systems of one world.
///
/// Systems receive it alongside the [`World`](survival_ecs::World); nothing
/// here is global. Events accumulate during a tick and are cleared once the
/// post-tick hooks have seen them.
pub struct SimContext {
    /// Index of the tick being simulated.
    pub tick: u64,
    /// Normalised time of day in `[0, 1)`; 0.25 is dawn, 0.75 is dusk.
    pub time_of_day: f32,
    /// Seconds per day-night cycle.
    pub day_length: f32,
    pub world_type: WorldType,
    pub movement: MovementConfig,
    pub terrain: Arc<dyn Terrain>,
    pub events: Vec<WorldEvent>,
}

impl SimContext {
    /// A context starting at midnight of tick 0.
    #[must_use]
    pub fn new(terrain: Arc<dyn Terrain>, world_type: WorldType) -> Self {
        Self {
            tick: 0,
            time_of_day: 0.0,
            day_length: DEFAULT_DAY_LENGTH,
            world_type,
            movement: MovementConfig::default(),
            terrain,
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: WorldEvent) {
        self.events.push(event);
    }

    /// The world `entity` collides in: its [`InWorld`] if it has one,
    /// otherwise this context's world.
    #[must_use]
    pub fn world_of(&self, world: &World, entity: Entity) -> WorldType {
        world
            .get_component::<InWorld>(entity)
            .map_or(self.world_type, |w| w.0)
    }

    /// Whether the sun is down.
    #[must_use]
    pub fn is_night(&self) -> bool {
        !(0.25..0.75).contains(&self.time_of_day)
    }
}

impl fmt::Debug for SimContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimContext")
            .field("tick", &self.tick)
            .field("time_of_day", &self.time_of_day)
            .field("world_type", &self.world_type)
            .field("pending_events", &self.events.len())
            .finish_non_exhaustive()
    }
}

//! # survival_sim
//!
//! The authoritative simulation of a survival world.
//!
//! - [`TickLoop`]: one fixed timestep: input, systems, hooks, timing.
//! - [`Scheduler`]: runs a [`TickLoop`] on a timer in its own task and
//!   saves periodically.
//! - [`SystemRegistry`]: the fixed execution order of gameplay systems.
//! - [`InputSender`]: non-blocking, per-player-deduplicated input queue.
//! - [`components`] and [`systems`]: the built-in gameplay.
//! - [`Terrain`] / [`PlayerDirectory`]: what the simulation reads from
//!   outside.

pub mod components;
pub mod config;
pub mod context;
pub mod error;
pub mod input;
pub mod perf;
pub mod players;
pub mod registry;
pub mod scheduler;
pub mod spawn;
pub mod systems;
pub mod terrain;
pub mod tick;

pub use config::{MovementConfig, TickConfig};
pub use context::{SimContext, WorldEvent};
pub use error::SimError;
pub use input::{InputQueue, InputSender};
pub use perf::{PerfRing, TickStats};
pub use players::{PlayerDirectory, PlayerEntry, Players};
pub use registry::{SystemFn, SystemRegistry, SystemStage};
pub use scheduler::{SaveHook, Scheduler, SchedulerHandle};
pub use spawn::{despawn_player, spawn_player};
pub use terrain::{BlockId, FlatTerrain, Terrain};
pub use tick::{PostTickHook, TickLoop};

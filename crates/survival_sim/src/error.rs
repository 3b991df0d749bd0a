//! Simulation error types.

use survival_ecs::WorldError;

/// Errors that end a tick or the simulation task.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// World setup failed.
    #[error("world error: {0}")]
    World(#[from] WorldError),

    /// A system returned an error; the tick was aborted at that system.
    #[error("system '{system}' failed: {source}")]
    System {
        system: String,
        #[source]
        source: WorldError,
    },

    /// The simulation task panicked and its state is gone.
    #[error("simulation task panicked: {0}")]
    TaskPanicked(String),
}

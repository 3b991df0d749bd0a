//! System registry: the fixed execution order of gameplay systems.
//!
//! Systems run in registration order. Each declares the [`SystemStage`] it
//! belongs to so that a registration which breaks the canonical chain is
//! logged, but the registry never reorders anything on its own.

use std::fmt;

use survival_ecs::{World, WorldError};
use tracing::warn;

use crate::context::SimContext;
use crate::error::SimError;

/// Canonical position of a system in the tick.
///
/// Later stages observe the results of earlier ones within the same tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SystemStage {
    /// Time of day and scheduled world events.
    WorldClock,
    Ai,
    Combat,
    Projectiles,
    Physics,
    /// Movement, terrain collision and teleports.
    Movement,
    /// Hunger, thirst and temperature drains.
    Survival,
    Crafting,
    Death,
    ItemPickup,
    Building,
    /// Decay, respawns and other world upkeep.
    Maintenance,
    NpcPopulation,
    /// Journal entries and achievements.
    Journal,
    Endgame,
}

/// A gameplay system: mutates the world for one fixed timestep.
pub type SystemFn =
    Box<dyn FnMut(&mut World, &mut SimContext, f32) -> Result<(), WorldError> + Send>;

/// A system together with its name and stage.
pub struct RegisteredSystem {
    pub name: String,
    pub stage: SystemStage,
    run: SystemFn,
}

impl fmt::Debug for RegisteredSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredSystem")
            .field("name", &self.name)
            .field("stage", &self.stage)
            .finish_non_exhaustive()
    }
}

/// Ordered list of systems executed every tick.
#[derive(Debug, Default)]
pub struct SystemRegistry {
    systems: Vec<RegisteredSystem>,
}

impl SystemRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            systems: Vec::new(),
        }
    }

    /// Append a system to the execution order.
    pub fn register<F>(&mut self, name: impl Into<String>, stage: SystemStage, system: F)
    where
        F: FnMut(&mut World, &mut SimContext, f32) -> Result<(), WorldError> + Send + 'static,
    {
        let name = name.into();
        if let Some(last) = self.systems.last()
            && stage < last.stage
        {
            warn!(
                system = %name,
                ?stage,
                after = %last.name,
                after_stage = ?last.stage,
                "system registered out of canonical stage order"
            );
        }
        self.systems.push(RegisteredSystem {
            name,
            stage,
            run: Box::new(system),
        });
    }

    /// Run every system once, in registration order.
    ///
    /// # Errors
    ///
    /// Stops at the first failing system and returns [`SimError::System`];
    /// later systems do not run.
    pub fn run_all(
        &mut self,
        world: &mut World,
        ctx: &mut SimContext,
        dt: f32,
    ) -> Result<(), SimError> {
        for system in &mut self.systems {
            (system.run)(world, ctx, dt).map_err(|source| SimError::System {
                system: system.name.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// System names in execution order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.systems.iter().map(|s| s.name.as_str())
    }

    /// Returns the number of registered systems.
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.systems.len()
    }
}

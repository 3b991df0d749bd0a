//! The synchronous tick pipeline.
//!
//! One call to [`TickLoop::tick`] advances the world by exactly one fixed
//! timestep:
//!
//! 1. Drain the input queue and apply the latest input of each player.
//! 2. Flush the query cache if the previous tick changed membership.
//! 3. Run every registered system in registration order.
//! 4. Advance the tick counter.
//! 5. Call post-tick hooks, then clear the tick's events.
//! 6. Record the tick duration.
//!
//! [`Scheduler`](crate::scheduler::Scheduler) drives this on a timer; tests
//! and tools can call it directly.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use survival_ecs::World;
use survival_net::WorldType;
use tracing::{debug, info, warn};

use crate::components::register_components;
use crate::config::TickConfig;
use crate::context::SimContext;
use crate::error::SimError;
use crate::input::{InputQueue, InputSender, apply_inputs};
use crate::perf::{PerfRing, TickStats};
use crate::players::PlayerDirectory;
use crate::registry::SystemRegistry;
use crate::systems;
use crate::terrain::Terrain;

/// Called after every tick with the world, its context and the new tick count.
pub type PostTickHook = Box<dyn FnMut(&World, &SimContext, u64) + Send>;

/// World, systems and input queue of one simulated world.
pub struct TickLoop {
    tick_id: u64,
    config: TickConfig,
    world: World,
    ctx: SimContext,
    systems: SystemRegistry,
    inputs: InputQueue,
    players: Arc<dyn PlayerDirectory>,
    post_tick: Vec<PostTickHook>,
    perf: PerfRing,
    slow_ticks: u64,
}

impl TickLoop {
    /// Create a loop with every gameplay component registered and no systems.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::World`] if component registration fails.
    pub fn new(
        config: TickConfig,
        terrain: Arc<dyn Terrain>,
        players: Arc<dyn PlayerDirectory>,
    ) -> Result<Self, SimError> {
        let mut world = World::new();
        register_components(&mut world)?;
        let perf = PerfRing::new(config.perf_capacity);
        Ok(Self {
            tick_id: 0,
            config,
            world,
            ctx: SimContext::new(terrain, WorldType::Overworld),
            systems: SystemRegistry::new(),
            inputs: InputQueue::new(),
            players,
            post_tick: Vec::new(),
            perf,
            slow_ticks: 0,
        })
    }

    /// Register the built-in systems.
    #[must_use]
    pub fn with_default_systems(mut self) -> Self {
        systems::register_defaults(&mut self.systems);
        self
    }

    /// Returns the number of completed ticks.
    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    #[must_use]
    pub fn config(&self) -> &TickConfig {
        &self.config
    }

    /// Returns a reference to the world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Returns a mutable reference to the world.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    #[must_use]
    pub fn context(&self) -> &SimContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut SimContext {
        &mut self.ctx
    }

    /// Borrow the world and its context mutably at the same time.
    pub fn world_and_context_mut(&mut self) -> (&mut World, &mut SimContext) {
        (&mut self.world, &mut self.ctx)
    }

    pub fn systems_mut(&mut self) -> &mut SystemRegistry {
        &mut self.systems
    }

    /// A sender feeding this loop's input queue.
    #[must_use]
    pub fn input_sender(&self) -> InputSender {
        self.inputs.sender()
    }

    /// Add a hook called after every tick, after previously added hooks.
    pub fn on_post_tick<F>(&mut self, hook: F)
    where
        F: FnMut(&World, &SimContext, u64) + Send + 'static,
    {
        self.post_tick.push(Box::new(hook));
    }

    /// Number of ticks that used more than the warning share of their budget.
    #[must_use]
    pub fn slow_ticks(&self) -> u64 {
        self.slow_ticks
    }

    /// Duration statistics over the retained samples.
    #[must_use]
    pub fn performance_stats(&self) -> TickStats {
        self.perf.stats(self.tick_id)
    }

    /// Run one fixed timestep. Returns the new tick count.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::System`] if a system fails. The tick counter does
    /// not advance and post-tick hooks do not run.
    pub fn tick(&mut self) -> Result<u64, SimError> {
        let started = Instant::now();
        let dt = self.config.dt();
        self.ctx.tick = self.tick_id;

        let batch = self.inputs.drain();
        let applied = apply_inputs(&mut self.world, &self.ctx, self.players.as_ref(), &batch);

        let flushed = self.world.flush_query_cache();
        self.systems.run_all(&mut self.world, &mut self.ctx, dt)?;

        self.tick_id += 1;
        for hook in &mut self.post_tick {
            hook(&self.world, &self.ctx, self.tick_id);
        }
        self.ctx.events.clear();

        let elapsed = started.elapsed();
        self.perf.push(elapsed);

        let budget = self.config.budget();
        if elapsed.as_secs_f64() > budget.as_secs_f64() * self.config.warn_ratio {
            self.slow_ticks += 1;
            warn!(
                tick = self.tick_id,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                budget_ms = budget.as_secs_f64() * 1000.0,
                "slow tick"
            );
        }
        debug!(
            tick = self.tick_id,
            inputs = applied,
            flushed,
            entities = self.world.entity_count(),
            "tick complete"
        );
        Ok(self.tick_id)
    }

    /// Run `count` ticks back to back.
    ///
    /// # Errors
    ///
    /// Stops at the first failing tick.
    pub fn run_ticks(&mut self, count: u64) -> Result<u64, SimError> {
        for _ in 0..count {
            self.tick()?;
        }
        info!(tick = self.tick_id, count, "ran ticks");
        Ok(self.tick_id)
    }
}

impl fmt::Debug for TickLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickLoop")
            .field("tick_id", &self.tick_id)
            .field("config", &self.config)
            .field("world", &self.world)
            .field("ctx", &self.ctx)
            .field("systems", &self.systems)
            .field("post_tick_hooks", &self.post_tick.len())
            .field("slow_ticks", &self.slow_ticks)
            .finish_non_exhaustive()
    }
}

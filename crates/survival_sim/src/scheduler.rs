//! Timer-driven execution of a [`TickLoop`].
//!
//! [`Scheduler::start`] moves the loop into a dedicated task that owns the
//! world for as long as it runs. The task multiplexes three sources:
//!
//! - the tick timer, which runs [`TickLoop::tick`];
//! - the save timer, which spawns the save hook as a detached task;
//! - a command channel, through which anything else that needs the world
//!   (player joins, hook registration) is dispatched between ticks.
//!
//! [`Scheduler::stop`] hands the loop back, so a stopped scheduler can be
//! inspected and started again with its world intact.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use survival_ecs::World;
use survival_net::{InputPayload, PlayerId};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::context::SimContext;
use crate::error::SimError;
use crate::input::InputSender;
use crate::perf::TickStats;
use crate::tick::TickLoop;

/// Persists world state. Called with no arguments on every save period.
pub type SaveHook = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

type Command = Box<dyn FnOnce(&mut SimTask) + Send>;

/// Shortest timer period; `tokio::time::interval` rejects zero.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Everything the simulation task owns while running.
struct SimTask {
    tick_loop: TickLoop,
    save: Option<SaveHook>,
    stats: watch::Sender<TickStats>,
}

impl SimTask {
    fn spawn_save(&self) {
        let Some(save) = &self.save else {
            debug!("save timer fired without a save hook");
            return;
        };
        let tick = self.tick_loop.tick_id();
        let pending = save();
        tokio::spawn(async move {
            match pending.await {
                Ok(()) => debug!(tick, "save complete"),
                Err(err) => error!(tick, error = %err, "save failed"),
            }
        });
    }
}

/// A stopped simulation: its state plus the command backlog.
struct Parked {
    task: Box<SimTask>,
    commands: mpsc::UnboundedReceiver<Command>,
}

enum State {
    Stopped(Parked),
    Running {
        shutdown: oneshot::Sender<()>,
        handle: JoinHandle<(Parked, Result<(), SimError>)>,
    },
    /// The task panicked and took the world with it.
    Lost,
}

/// Cloneable handle for network tasks: queues input and dispatches work
/// into the simulation task.
#[derive(Clone)]
pub struct SchedulerHandle {
    inputs: InputSender,
    commands: mpsc::UnboundedSender<Command>,
}

impl SchedulerHandle {
    /// Queue `input` for `player`. Never blocks.
    pub fn queue_input(&self, player: PlayerId, input: InputPayload) {
        self.inputs.queue_input(player, input);
    }

    /// Run `f` against the loop between two ticks. While the scheduler is
    /// stopped, `f` waits for the next start.
    ///
    /// Returns `false` if the scheduler is gone.
    pub fn dispatch<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut TickLoop) + Send + 'static,
    {
        self.commands
            .send(Box::new(move |task: &mut SimTask| f(&mut task.tick_loop)))
            .is_ok()
    }
}

impl fmt::Debug for SchedulerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchedulerHandle")
            .field("closed", &self.commands.is_closed())
            .finish_non_exhaustive()
    }
}

/// Drives a [`TickLoop`] on a fixed-period timer.
pub struct Scheduler {
    state: State,
    handle: SchedulerHandle,
    stats: watch::Receiver<TickStats>,
    tick_period: Duration,
    save_interval: Duration,
}

impl Scheduler {
    /// Wrap `tick_loop`. Timer periods come from its [`TickConfig`](crate::config::TickConfig).
    #[must_use]
    pub fn new(tick_loop: TickLoop) -> Self {
        let tick_period = tick_loop.config().budget();
        let save_interval = tick_loop.config().save_interval;
        let (stats_tx, stats) = watch::channel(tick_loop.performance_stats());
        let (commands_tx, commands) = mpsc::unbounded_channel();
        let handle = SchedulerHandle {
            inputs: tick_loop.input_sender(),
            commands: commands_tx,
        };
        let task = Box::new(SimTask {
            tick_loop,
            save: None,
            stats: stats_tx,
        });
        Self {
            state: State::Stopped(Parked { task, commands }),
            handle,
            stats,
            tick_period,
            save_interval,
        }
    }

    #[must_use]
    pub fn handle(&self) -> SchedulerHandle {
        self.handle.clone()
    }

    /// Queue `input` for `player`. Never blocks.
    pub fn queue_input(&self, player: PlayerId, input: InputPayload) {
        self.handle.queue_input(player, input);
    }

    /// Add a hook called after every tick, after previously added hooks.
    pub fn on_post_tick<F>(&mut self, hook: F)
    where
        F: FnMut(&World, &SimContext, u64) + Send + 'static,
    {
        self.apply(move |task| task.tick_loop.on_post_tick(hook));
    }

    /// Set the save hook, replacing any previous one.
    pub fn on_save<F, Fut>(&mut self, save: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let hook: SaveHook = Arc::new(move || save().boxed());
        self.apply(move |task| task.save = Some(hook));
    }

    /// Run `f` against the loop: immediately if stopped, between two ticks
    /// if running.
    pub fn dispatch<F>(&mut self, f: F)
    where
        F: FnOnce(&mut TickLoop) + Send + 'static,
    {
        self.apply(move |task| f(&mut task.tick_loop));
    }

    fn apply<F>(&mut self, f: F)
    where
        F: FnOnce(&mut SimTask) + Send + 'static,
    {
        match &mut self.state {
            State::Stopped(parked) => f(&mut parked.task),
            State::Running { .. } => {
                if self.handle.commands.send(Box::new(f)).is_err() {
                    debug!("command dropped: simulation task is gone");
                }
            }
            State::Lost => warn!("command dropped: simulation state was lost"),
        }
    }

    /// The stopped loop, for inspection. `None` while running.
    #[must_use]
    pub fn tick_loop(&self) -> Option<&TickLoop> {
        match &self.state {
            State::Stopped(parked) => Some(&parked.task.tick_loop),
            _ => None,
        }
    }

    /// Duration statistics as of the last completed tick.
    #[must_use]
    pub fn performance_stats(&self) -> TickStats {
        *self.stats.borrow()
    }

    /// Whether the simulation task is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(&self.state, State::Running { handle, .. } if !handle.is_finished())
    }

    /// Start the tick and save timers. Returns `false` if already running.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start(&mut self) -> bool {
        let parked = match std::mem::replace(&mut self.state, State::Lost) {
            State::Stopped(parked) => parked,
            running @ State::Running { .. } => {
                self.state = running;
                debug!("start ignored: already running");
                return false;
            }
            State::Lost => {
                warn!("start ignored: simulation state was lost");
                return false;
            }
        };

        let (shutdown, shutdown_rx) = oneshot::channel();
        info!(
            tick = parked.task.tick_loop.tick_id(),
            tick_ms = self.tick_period.as_secs_f64() * 1000.0,
            save_secs = self.save_interval.as_secs_f64(),
            "simulation started"
        );
        let handle = tokio::spawn(run(
            parked,
            self.tick_period,
            self.save_interval,
            shutdown_rx,
        ));
        self.state = State::Running { shutdown, handle };
        true
    }

    /// Cancel both timers and take the loop back. No-op if not running.
    ///
    /// An in-flight save is left to finish on its own.
    ///
    /// # Errors
    ///
    /// Returns the error that ended the simulation task, if one did.
    pub async fn stop(&mut self) -> Result<(), SimError> {
        match std::mem::replace(&mut self.state, State::Lost) {
            State::Running { shutdown, handle } => {
                // The task may already have exited on its own.
                let _ = shutdown.send(());
                let joined = handle.await;
                self.finish(joined)
            }
            other => {
                self.state = other;
                Ok(())
            }
        }
    }

    /// Wait until the simulation task exits on its own, which only happens
    /// when a tick fails. Returns immediately if not running.
    ///
    /// Cancel-safe: dropping the future leaves the scheduler running.
    ///
    /// # Errors
    ///
    /// Returns the error that ended the simulation task.
    pub async fn wait(&mut self) -> Result<(), SimError> {
        let State::Running { handle, .. } = &mut self.state else {
            return Ok(());
        };
        let joined = handle.await;
        self.finish(joined)
    }

    fn finish(
        &mut self,
        joined: Result<(Parked, Result<(), SimError>), JoinError>,
    ) -> Result<(), SimError> {
        match joined {
            Ok((parked, outcome)) => {
                info!(tick = parked.task.tick_loop.tick_id(), "simulation stopped");
                self.state = State::Stopped(parked);
                outcome
            }
            Err(err) => {
                error!(error = %err, "simulation task panicked");
                self.state = State::Lost;
                Err(SimError::TaskPanicked(err.to_string()))
            }
        }
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            State::Stopped(_) => "stopped",
            State::Running { .. } => "running",
            State::Lost => "lost",
        };
        f.debug_struct("Scheduler")
            .field("state", &state)
            .field("tick_period", &self.tick_period)
            .field("save_interval", &self.save_interval)
            .finish_non_exhaustive()
    }
}

async fn run(
    mut parked: Parked,
    tick_period: Duration,
    save_interval: Duration,
    mut shutdown: oneshot::Receiver<()>,
) -> (Parked, Result<(), SimError>) {
    let tick_period = tick_period.max(MIN_PERIOD);
    let save_interval = save_interval.max(MIN_PERIOD);
    let mut ticks = time::interval_at(Instant::now() + tick_period, tick_period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut saves = time::interval_at(Instant::now() + save_interval, save_interval);
    saves.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let Parked { task, commands } = &mut parked;
    let outcome = loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => break Ok(()),
            Some(command) = commands.recv() => command(&mut **task),
            _ = ticks.tick() => {
                if let Err(err) = task.tick_loop.tick() {
                    error!(
                        tick = task.tick_loop.tick_id(),
                        error = %err,
                        "tick failed, simulation stopped"
                    );
                    break Err(err);
                }
                task.stats.send_replace(task.tick_loop.performance_stats());
            }
            _ = saves.tick() => task.spawn_save(),
        }
    };
    (parked, outcome)
}

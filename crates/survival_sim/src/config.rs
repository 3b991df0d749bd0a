//! Simulation configuration.

use std::time::Duration;

/// Configuration for the tick loop and its scheduler.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Simulation ticks per second.
    pub tick_rate: u32,
    /// Period of the save timer.
    pub save_interval: Duration,
    /// Number of tick durations kept for [`TickStats`](crate::perf::TickStats).
    pub perf_capacity: usize,
    /// Fraction of the tick budget above which a tick is logged as slow.
    pub warn_ratio: f64,
}

impl TickConfig {
    /// Fixed timestep handed to every system, in seconds.
    #[must_use]
    pub fn dt(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }

    /// Wall-clock period of one tick.
    #[must_use]
    pub fn budget(&self) -> Duration {
        Duration::from_secs(1) / self.tick_rate.max(1)
    }
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate: 20,
            save_interval: Duration::from_secs(60),
            perf_capacity: 128,
            warn_ratio: 0.8,
        }
    }
}

/// Player movement tuning, in blocks and seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementConfig {
    pub walk_speed: f32,
    pub sprint_speed: f32,
    pub crouch_speed: f32,
    /// Vertical velocity applied by a jump.
    pub jump_speed: f32,
    /// Downward acceleration while airborne.
    pub gravity: f32,
    /// Fastest downward speed gravity can reach.
    pub terminal_velocity: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            walk_speed: 4.317,
            sprint_speed: 5.612,
            crouch_speed: 1.31,
            jump_speed: 8.4,
            gravity: 32.0,
            terminal_velocity: 78.4,
        }
    }
}

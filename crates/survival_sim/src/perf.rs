//! Tick duration history.

use std::time::Duration;

use serde::Serialize;

/// Summary of recent tick durations.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct TickStats {
    /// Mean duration over the retained samples, in milliseconds.
    pub avg_tick_ms: f64,
    /// Longest retained duration, in milliseconds.
    pub max_tick_ms: f64,
    /// Ticks completed since the loop was created.
    pub tick_count: u64,
}

/// Fixed-capacity ring of tick durations.
///
/// Allocates once; new samples overwrite the oldest.
#[derive(Debug, Clone)]
pub struct PerfRing {
    samples: Box<[f64]>,
    next: usize,
    filled: usize,
}

impl PerfRing {
    /// A ring holding the last `capacity` samples (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: vec![0.0; capacity.max(1)].into_boxed_slice(),
            next: 0,
            filled: 0,
        }
    }

    pub fn push(&mut self, elapsed: Duration) {
        self.samples[self.next] = elapsed.as_secs_f64() * 1000.0;
        self.next = (self.next + 1) % self.samples.len();
        self.filled = (self.filled + 1).min(self.samples.len());
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    /// Number of slots holding a real sample.
    #[must_use]
    pub fn len(&self) -> usize {
        self.filled
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filled == 0
    }

    /// Retained samples in milliseconds, oldest first.
    pub fn samples_ms(&self) -> impl Iterator<Item = f64> + '_ {
        let start = if self.filled < self.samples.len() {
            0
        } else {
            self.next
        };
        (0..self.filled).map(move |i| self.samples[(start + i) % self.samples.len()])
    }

    /// Average and maximum over filled slots only.
    #[must_use]
    pub fn stats(&self, tick_count: u64) -> TickStats {
        if self.filled == 0 {
            return TickStats {
                tick_count,
                ..TickStats::default()
            };
        }
        let filled = &self.samples[..self.filled];
        let sum: f64 = filled.iter().sum();
        let max = filled.iter().copied().fold(0.0_f64, f64::max);
        TickStats {
            avg_tick_ms: sum / self.filled as f64,
            max_tick_ms: max,
            tick_count,
        }
    }
}

//! Fixed-step simulation clock
//!
//! Systems always see the same `dt`; the host loop accumulates wall time
//! and runs as many ticks as fit.

use std::time::Duration;

/// Fixed simulation tick rate.
pub const TICK_RATE_HZ: u32 = 60;
pub const TICK_DURATION: Duration = Duration::from_micros(16_666);

/// Longest backlog the clock will try to catch up in one frame.
const MAX_BACKLOG: Duration = Duration::from_millis(250);

pub struct SimulationTime {
    tick_count: u64,
    accumulated_time: Duration,
    backlog: Duration,
}

impl SimulationTime {
    pub fn new() -> Self {
        Self {
            tick_count: 0,
            accumulated_time: Duration::ZERO,
            backlog: Duration::ZERO,
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Seconds per tick, as systems consume it.
    #[inline]
    pub fn dt(&self) -> f32 {
        TICK_DURATION.as_secs_f32()
    }

    pub fn advance_tick(&mut self) {
        self.tick_count += 1;
        self.accumulated_time += TICK_DURATION;
    }

    pub fn total_time(&self) -> Duration {
        self.accumulated_time
    }

    /// Add `elapsed` wall time and return how many ticks are now due.
    /// Backlog beyond a quarter second is dropped.
    pub fn accumulate(&mut self, elapsed: Duration) -> u32 {
        self.backlog = (self.backlog + elapsed).min(MAX_BACKLOG);
        let mut due = 0;
        while self.backlog >= TICK_DURATION {
            self.backlog -= TICK_DURATION;
            due += 1;
        }
        due
    }

    /// Fraction of a tick left in the backlog, for render interpolation.
    pub fn alpha(&self) -> f32 {
        self.backlog.as_secs_f32() / TICK_DURATION.as_secs_f32()
    }
}

impl Default for SimulationTime {
    fn default() -> Self {
        Self::new()
    }
}

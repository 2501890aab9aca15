//! Wall-clock accounting for named systems

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

#[derive(Debug, Default, Clone, Copy)]
struct Timing {
    total: Duration,
    calls: u64,
}

#[derive(Debug, Default)]
pub struct SystemProfiler {
    timings: BTreeMap<&'static str, Timing>,
}

impl SystemProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn time_system<F, R>(&mut self, name: &'static str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        let timing = self.timings.entry(name).or_default();
        timing.total += start.elapsed();
        timing.calls += 1;
        result
    }

    pub fn total(&self, name: &str) -> Duration {
        self.timings.get(name).map_or(Duration::ZERO, |t| t.total)
    }

    pub fn calls(&self, name: &str) -> u64 {
        self.timings.get(name).map_or(0, |t| t.calls)
    }

    /// `(name, total, calls)` for every system, ordered by name.
    pub fn report(&self) -> Vec<(&'static str, Duration, u64)> {
        self.timings
            .iter()
            .map(|(name, t)| (*name, t.total, t.calls))
            .collect()
    }

    pub fn reset(&mut self) {
        self.timings.clear();
    }
}

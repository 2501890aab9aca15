//! Named event counters

use std::collections::BTreeMap;

/// Monotonic counters keyed by static names such as `"pool.realloc"`.
///
/// Keys are kept ordered so snapshots print deterministically.
#[derive(Debug, Default, Clone)]
pub struct Counter {
    counters: BTreeMap<&'static str, u64>,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, name: &'static str, value: u64) {
        *self.counters.entry(name).or_insert(0) += value;
    }

    pub fn set(&mut self, name: &'static str, value: u64) {
        self.counters.insert(name, value);
    }

    pub fn get(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn reset_all(&mut self) {
        self.counters.clear();
    }

    /// Copy of every counter, ordered by name.
    pub fn snapshot(&self) -> Vec<(&'static str, u64)> {
        self.counters.iter().map(|(k, v)| (*k, *v)).collect()
    }
}

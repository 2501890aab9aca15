//! Tessera Metrics - instrumentation for the simulation loop and the ECS
//!
//! Everything here disappears in production builds: without the `metrics`
//! feature each type is a zero-sized stub whose methods do nothing.
//!
//! # Feature Flags
//!
//! - `metrics` - Enable metrics collection (default: disabled)
//!
//! # Usage
//!
//! ```ignore
//! use tessera_metrics::{Counter, FrameTimer};
//!
//! let mut counters = Counter::new();
//! counters.increment("pool.realloc", 1);
//!
//! let mut timer = FrameTimer::new(60);
//! timer.begin();
//! // ... tick ...
//! timer.end();
//! ```

#[cfg(feature = "metrics")]
mod counter;
#[cfg(feature = "metrics")]
mod frame_timer;
#[cfg(feature = "metrics")]
mod ring_buffer;
#[cfg(feature = "metrics")]
mod system_profiler;

#[cfg(feature = "metrics")]
pub use counter::Counter;
#[cfg(feature = "metrics")]
pub use frame_timer::FrameTimer;
#[cfg(feature = "metrics")]
pub use ring_buffer::RingBuffer;
#[cfg(feature = "metrics")]
pub use system_profiler::SystemProfiler;

/// Whether this build collects metrics.
pub const ENABLED: bool = cfg!(feature = "metrics");

// ============================================================================
// Conditional timing
// ============================================================================

/// Time a named system (zero-cost when metrics disabled)
#[macro_export]
macro_rules! time_scope {
    ($profiler:expr, $name:expr, $body:block) => {{
        #[cfg(feature = "metrics")]
        {
            $profiler.time_system($name, || $body)
        }
        #[cfg(not(feature = "metrics"))]
        {
            let _ = &$profiler;
            $body
        }
    }};
}

// ============================================================================
// No-op stubs when metrics disabled
// ============================================================================

#[cfg(not(feature = "metrics"))]
#[derive(Debug, Default, Clone)]
pub struct Counter;

#[cfg(not(feature = "metrics"))]
impl Counter {
    pub fn new() -> Self { Self }
    pub fn increment(&mut self, _name: &'static str, _value: u64) {}
    pub fn set(&mut self, _name: &'static str, _value: u64) {}
    pub fn get(&self, _name: &str) -> u64 { 0 }
    pub fn reset_all(&mut self) {}
    pub fn snapshot(&self) -> Vec<(&'static str, u64)> { Vec::new() }
}

#[cfg(not(feature = "metrics"))]
#[derive(Debug, Default)]
pub struct FrameTimer;

#[cfg(not(feature = "metrics"))]
impl FrameTimer {
    pub fn new(_capacity: usize) -> Self { Self }
    pub fn begin(&mut self) {}
    pub fn end(&mut self) {}
    pub fn frames(&self) -> u64 { 0 }
    pub fn frame_time_ms(&self) -> f64 { 0.0 }
    pub fn frame_time_range_ms(&self) -> (f64, f64) { (0.0, 0.0) }
}

#[cfg(not(feature = "metrics"))]
#[derive(Debug)]
pub struct RingBuffer<T>(std::marker::PhantomData<T>);

#[cfg(not(feature = "metrics"))]
impl<T> RingBuffer<T> {
    pub fn new(_capacity: usize) -> Self { Self(std::marker::PhantomData) }
    pub fn push(&mut self, _value: T) {}
    pub fn len(&self) -> usize { 0 }
    pub fn is_empty(&self) -> bool { true }
}

#[cfg(not(feature = "metrics"))]
#[derive(Debug, Default)]
pub struct SystemProfiler;

#[cfg(not(feature = "metrics"))]
impl SystemProfiler {
    pub fn new() -> Self { Self }
    pub fn time_system<F, R>(&mut self, _name: &'static str, f: F) -> R where F: FnOnce() -> R { f() }
    pub fn total(&self, _name: &str) -> std::time::Duration { std::time::Duration::ZERO }
    pub fn calls(&self, _name: &str) -> u64 { 0 }
    pub fn report(&self) -> Vec<(&'static str, std::time::Duration, u64)> { Vec::new() }
    pub fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_scope_returns_body_value() {
        let mut profiler = SystemProfiler::new();
        let value = time_scope!(profiler, "physics", { 2 + 2 });
        assert_eq!(value, 4);
        if ENABLED {
            assert_eq!(profiler.calls("physics"), 1);
        } else {
            assert_eq!(profiler.calls("physics"), 0);
        }
    }

    #[test]
    fn counter_respects_feature() {
        let mut counter = Counter::new();
        counter.increment("pool.realloc", 3);
        counter.increment("pool.realloc", 2);
        let expected = if ENABLED { 5 } else { 0 };
        assert_eq!(counter.get("pool.realloc"), expected);
    }
}

//! Per-tick timing

use super::ring_buffer::RingBuffer;
use std::time::{Duration, Instant};

pub struct FrameTimer {
    frame_start: Instant,
    frames: u64,
    frame_times: RingBuffer<Duration>,
}

impl FrameTimer {
    pub fn new(capacity: usize) -> Self {
        Self {
            frame_start: Instant::now(),
            frames: 0,
            frame_times: RingBuffer::new(capacity),
        }
    }

    pub fn begin(&mut self) {
        self.frame_start = Instant::now();
    }

    pub fn end(&mut self) {
        self.frame_times.push(self.frame_start.elapsed());
        self.frames += 1;
    }

    /// Frames recorded since construction, not just the ones in the window.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn frame_time_ms(&self) -> f64 {
        self.frame_times.average().as_secs_f64() * 1000.0
    }

    pub fn frame_time_range_ms(&self) -> (f64, f64) {
        let (min, max) = self.frame_times.min_max();
        (min.as_secs_f64() * 1000.0, max.as_secs_f64() * 1000.0)
    }
}

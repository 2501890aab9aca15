//! Fixed-capacity sample window for rolling statistics

use std::time::Duration;

pub struct RingBuffer<T> {
    samples: Vec<T>,
    capacity: usize,
    next: usize,
}

impl<T> RingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be non-zero");
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
            next: 0,
        }
    }

    /// Store a sample, overwriting the oldest once full.
    pub fn push(&mut self, sample: T) {
        if self.samples.len() < self.capacity {
            self.samples.push(sample);
        } else {
            self.samples[self.next] = sample;
        }
        self.next = (self.next + 1) % self.capacity;
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl RingBuffer<Duration> {
    pub fn average(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }
        let sum: Duration = self.samples.iter().sum();
        sum / self.samples.len() as u32
    }

    pub fn min_max(&self) -> (Duration, Duration) {
        let min = self.samples.iter().min().copied().unwrap_or(Duration::ZERO);
        let max = self.samples.iter().max().copied().unwrap_or(Duration::ZERO);
        (min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrites_oldest_sample() {
        let mut rb = RingBuffer::new(2);
        rb.push(Duration::from_millis(10));
        rb.push(Duration::from_millis(20));
        rb.push(Duration::from_millis(40));
        assert_eq!(rb.len(), 2);
        assert_eq!(rb.average(), Duration::from_millis(30));
        assert_eq!(
            rb.min_max(),
            (Duration::from_millis(20), Duration::from_millis(40))
        );
    }
}

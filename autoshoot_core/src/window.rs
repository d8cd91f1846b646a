//! Fixed-capacity sliding window over shooter speed samples.
//!
//! The running sum is updated incrementally on every push (add the new
//! sample, subtract the evicted one) with Neumaier compensation, so the
//! average stays within floating-point noise of a full rescan even after
//! long runs.

use std::collections::VecDeque;

/// FIFO of the most recent `capacity` speed samples with an O(1) average.
#[derive(Debug, Clone)]
pub struct SlidingWindowFilter {
    buf: VecDeque<f64>,
    capacity: usize,
    sum: f64,
    compensation: f64,
    last_evicted: Option<f64>,
    total_pushed: u64,
}

impl SlidingWindowFilter {
    /// Create an empty window. A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            buf: VecDeque::with_capacity(capacity + 1),
            capacity,
            sum: 0.0,
            compensation: 0.0,
            last_evicted: None,
            total_pushed: 0,
        }
    }

    /// Append a sample, evicting the oldest one once the window is over capacity.
    pub fn push(&mut self, sample: f64) {
        self.buf.push_back(sample);
        self.accumulate(sample);
        self.total_pushed = self.total_pushed.saturating_add(1);
        if self.buf.len() > self.capacity
            && let Some(evicted) = self.buf.pop_front()
        {
            self.accumulate(-evicted);
            self.last_evicted = Some(evicted);
        }
        debug_assert!(self.buf.len() <= self.capacity);
    }

    /// Mean of the samples currently held; 0 when empty.
    pub fn average(&self) -> f64 {
        if self.buf.is_empty() {
            return 0.0;
        }
        (self.sum + self.compensation) / self.buf.len() as f64
    }

    /// True once the window has overflowed at least once (capacity + 1 pushes).
    pub fn is_full(&self) -> bool {
        self.last_evicted.is_some()
    }

    /// The most recently evicted sample, i.e. the reading one window-length ago.
    pub fn oldest(&self) -> Option<f64> {
        self.last_evicted
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of samples pushed since construction or the last `reset`.
    pub fn total_pushed(&self) -> u64 {
        self.total_pushed
    }

    /// Iterate samples from oldest to newest.
    pub fn samples(&self) -> impl Iterator<Item = f64> + '_ {
        self.buf.iter().copied()
    }

    /// Drop all samples and the eviction history; capacity is kept.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.sum = 0.0;
        self.compensation = 0.0;
        self.last_evicted = None;
        self.total_pushed = 0;
    }

    // Neumaier summation step.
    #[inline]
    fn accumulate(&mut self, x: f64) {
        let t = self.sum + x;
        if self.sum.abs() >= x.abs() {
            self.compensation += (self.sum - t) + x;
        } else {
            self.compensation += (x - t) + self.sum;
        }
        self.sum = t;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rescan_mean(w: &SlidingWindowFilter) -> f64 {
        let n = w.len();
        if n == 0 {
            return 0.0;
        }
        w.samples().sum::<f64>() / n as f64
    }

    #[test]
    fn empty_window_averages_to_zero() {
        let w = SlidingWindowFilter::new(50);
        assert_eq!(w.average(), 0.0);
        assert!(!w.is_full());
        assert_eq!(w.oldest(), None);
    }

    #[test]
    fn partial_window_is_mean_of_all_pushed() {
        let mut w = SlidingWindowFilter::new(5);
        for s in [1.0, 2.0, 3.0] {
            w.push(s);
        }
        assert!((w.average() - 2.0).abs() < 1e-12);
        assert_eq!(w.len(), 3);
    }

    #[test]
    fn exactly_full_window_has_not_overflowed() {
        let mut w = SlidingWindowFilter::new(3);
        for s in [1.0, 2.0, 3.0] {
            w.push(s);
        }
        assert!(!w.is_full());
        w.push(4.0);
        assert!(w.is_full());
        assert_eq!(w.oldest(), Some(1.0));
        assert!((w.average() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn oldest_tracks_most_recent_eviction() {
        let mut w = SlidingWindowFilter::new(2);
        for s in [10.0, 20.0, 30.0, 40.0] {
            w.push(s);
        }
        assert_eq!(w.oldest(), Some(20.0));
        assert_eq!(w.samples().collect::<Vec<_>>(), vec![30.0, 40.0]);
    }

    #[test]
    fn zero_capacity_is_clamped_to_one() {
        let mut w = SlidingWindowFilter::new(0);
        assert_eq!(w.capacity(), 1);
        w.push(5.0);
        w.push(7.0);
        assert_eq!(w.oldest(), Some(5.0));
        assert_eq!(w.average(), 7.0);
    }

    #[test]
    fn reset_clears_history() {
        let mut w = SlidingWindowFilter::new(2);
        for s in [1.0, 2.0, 3.0] {
            w.push(s);
        }
        w.reset();
        assert!(w.is_empty());
        assert!(!w.is_full());
        assert_eq!(w.total_pushed(), 0);
        assert_eq!(w.average(), 0.0);
    }

    #[test]
    fn no_drift_after_ten_thousand_pushes() {
        let mut w = SlidingWindowFilter::new(50);
        let mut state = 0x2545_f491_u32;
        for i in 0..10_000 {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let noise = (state as f64 / u32::MAX as f64) - 0.5;
            let ramp = (i as f64) * 0.37;
            w.push(4000.0 + ramp + noise * 25.0);
        }
        assert!((w.average() - rescan_mean(&w)).abs() < 1e-9);
    }
}

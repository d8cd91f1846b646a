//! Ready-to-feed detection: alignment gate plus speed consistency.
//!
//! A single reading is not trusted. The current speed must be close to both
//! the reading one window-length ago (short-term) and the window average
//! (medium-term), which rejects noise spikes as well as a wheel that is
//! still ramping.

use crate::window::SlidingWindowFilter;

/// Outcome of one stability evaluation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StabilityVerdict {
    pub aligned: bool,
    pub consistent: bool,
}

impl StabilityVerdict {
    /// Both gates passed; the feeder may run.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.aligned && self.consistent
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StabilityDetector {
    threshold: f64,
}

impl StabilityDetector {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Push `current_speed` into `window`, then judge it.
    ///
    /// `consistent` stays false until the window has overflowed once.
    pub fn evaluate(
        &self,
        current_speed: f64,
        aligned: bool,
        window: &mut SlidingWindowFilter,
    ) -> StabilityVerdict {
        window.push(current_speed);

        let consistent = match window.oldest() {
            Some(old) if window.is_full() => {
                let old_diff = (old - current_speed).abs();
                let avg_diff = (window.average() - current_speed).abs();
                tracing::trace!(
                    speed = current_speed,
                    average = window.average(),
                    old_diff,
                    avg_diff,
                    "stability check"
                );
                old_diff < self.threshold && avg_diff < self.threshold
            }
            _ => false,
        };

        StabilityVerdict {
            aligned,
            consistent,
        }
    }
}

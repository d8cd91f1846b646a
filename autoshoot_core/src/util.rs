//! Tick period helpers.

use std::time::Duration;

/// Length of one scheduler tick at `hz` ticks per second. A rate of 0 is
/// treated as 1 Hz.
#[inline]
pub fn period(hz: u32) -> Duration {
    Duration::from_secs(1) / hz.max(1)
}

/// Whole milliseconds per tick, never 0. Used to stamp recorded rows.
#[inline]
pub fn period_ms(hz: u32) -> u64 {
    (1_000 / u64::from(hz.max(1))).max(1)
}

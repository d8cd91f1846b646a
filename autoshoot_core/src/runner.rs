//! Fixed-period host loop for a single `Command`.
//!
//! Mirrors what a cooperative robot scheduler does for one command:
//! initialize, then tick/is_finished every period, then end exactly once.
//! Pacing goes through a `Clock`, so tests and offline replays can run on a
//! `ManualClock` without sleeping.

use std::sync::atomic::{AtomicBool, Ordering};

use autoshoot_traits::clock::Clock;
use eyre::WrapErr;

use crate::command::Command;
use crate::error::Result;

/// Host loop parameters.
#[derive(Debug, Clone)]
pub struct RunParams {
    /// Scheduler rate; the tick `dt` is the matching period.
    pub tick_rate_hz: u32,
    /// Cancel the command after this long. 0 disables the cap.
    pub max_run_ms: u64,
    /// Cancel the command after this many ticks, if set.
    pub max_ticks: Option<u64>,
}

impl Default for RunParams {
    fn default() -> Self {
        Self {
            tick_rate_hz: 50,
            max_run_ms: 0,
            max_ticks: None,
        }
    }
}

/// Why the host loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEnd {
    /// The command reported `is_finished`.
    Finished,
    /// Shutdown flag observed (e.g. ctrl-c).
    Cancelled,
    /// `max_run_ms` elapsed.
    MaxRuntime,
    /// `max_ticks` reached.
    TickLimit,
}

#[derive(Debug, Clone, Copy)]
pub struct RunReport {
    pub ticks: u64,
    pub elapsed_ms: u64,
    pub end: RunEnd,
}

/// Drive `cmd` until it finishes or the host cancels it.
pub fn run<C: Command + ?Sized>(
    cmd: &mut C,
    clock: &dyn Clock,
    params: &RunParams,
    shutdown: &AtomicBool,
) -> Result<RunReport> {
    run_with(cmd, clock, params, shutdown, |_, _| {})
}

/// Like `run`, calling `observe(cmd, tick)` after every successful tick.
pub fn run_with<C, O>(
    cmd: &mut C,
    clock: &dyn Clock,
    params: &RunParams,
    shutdown: &AtomicBool,
    mut observe: O,
) -> Result<RunReport>
where
    C: Command + ?Sized,
    O: FnMut(&C, u64),
{
    let period = crate::util::period(params.tick_rate_hz);
    let epoch = clock.now();
    let mut ticks: u64 = 0;

    if let Err(e) = cmd.initialize() {
        cmd.end(true);
        return Err(e).wrap_err_with(|| format!("initialize {}", cmd.name()));
    }
    tracing::info!(
        command = cmd.name(),
        period_us = period.as_micros() as u64,
        "command started"
    );

    let end = loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::debug!("shutdown flag observed");
            break RunEnd::Cancelled;
        }
        if params.max_run_ms > 0 && clock.ms_since(epoch) >= params.max_run_ms {
            break RunEnd::MaxRuntime;
        }
        if params.max_ticks.is_some_and(|max| ticks >= max) {
            break RunEnd::TickLimit;
        }

        let t_start = clock.now();
        if let Err(e) = cmd.tick(period) {
            cmd.end(true);
            return Err(e).wrap_err_with(|| format!("tick {} of {}", ticks + 1, cmd.name()));
        }
        ticks += 1;
        observe(cmd, ticks);

        if cmd.is_finished() {
            break RunEnd::Finished;
        }

        let spent = clock.now().saturating_duration_since(t_start);
        clock.sleep(period.saturating_sub(spent));
    };

    cmd.end(end != RunEnd::Finished);
    let elapsed_ms = clock.ms_since(epoch);
    tracing::info!(command = cmd.name(), ticks, elapsed_ms, end = ?end, "command ended");
    Ok(RunReport {
        ticks,
        elapsed_ms,
        end,
    })
}

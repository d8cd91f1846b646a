//! Lifecycle contract between a command and the host scheduler.
//!
//! The host calls `initialize` once on activation, then `tick` and
//! `is_finished` every period, and `end` exactly once on deactivation.
//! `tick` must return within one period; waiting is state, never blocking.

use std::time::Duration;

use crate::error::Result;

pub trait Command {
    /// Arm outputs and reset per-run state.
    fn initialize(&mut self) -> Result<()>;

    /// One scheduler period of work.
    fn tick(&mut self, dt: Duration) -> Result<()>;

    /// Pure query, checked after every `tick`.
    fn is_finished(&self) -> bool;

    /// Stop everything this command drives. Safe to call more than once and
    /// without a prior `initialize`.
    fn end(&mut self, interrupted: bool);

    fn name(&self) -> &'static str {
        "command"
    }
}

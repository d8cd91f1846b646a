//! Status returned from each control loop tick.

use crate::cycle::CycleState;
use crate::error::AbortReason;

/// Public status of a single tick of the shooting loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShootStatus {
    /// Keep ticking; carries the state the cycle is in after this tick.
    Running(CycleState),
    /// Cycle reached `Done`; feeder has already been told to stop.
    Finished(AbortReason),
}

impl ShootStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished(_))
    }
}

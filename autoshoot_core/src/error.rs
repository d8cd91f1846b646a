use thiserror::Error;

/// Why a shooting run ended before the host cancelled it normally.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    #[error("stability lost while feeding")]
    StabilityLost,
    #[error("timed out waiting for a stable shooter speed")]
    StabilityTimeout,
    #[error("interrupted by host")]
    Interrupted,
    #[error("max run time exceeded")]
    MaxRuntime,
}

#[derive(Debug, Error, Clone)]
pub enum ShootError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("timeout waiting for sensor")]
    Timeout,
    #[error("invalid state: {0}")]
    State(String),
    #[error("aborted: {0}")]
    Abort(AbortReason),
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing vision")]
    MissingVision,
    #[error("missing shooter")]
    MissingShooter,
    #[error("missing feeder")]
    MissingFeeder,
    #[error("missing heading sensor")]
    MissingHeading,
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;

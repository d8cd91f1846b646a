//! Host-side collaborators for the auto-shoot controller.
//!
//! `sim` models a shooter rig (flywheel, feeder, aiming camera and gyro)
//! sharing one state so the CLI and tests can drive full shooting cycles
//! without a robot. `trace` replays recorded shooter telemetry.
pub mod error;
pub mod sim;
pub mod trace;

pub use error::HwError;
pub use sim::{FaultKind, FeedState, RigSnapshot, SimFeeder, SimGyro, SimParams, SimRig, SimShooter, SimVision};
pub use trace::{TraceSample, TraceVision};

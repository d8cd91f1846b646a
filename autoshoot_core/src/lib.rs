#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::must_use_candidate
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Auto-shoot control core (hardware-agnostic).
//!
//! This crate sequences an "aim, stabilize, feed" shooting cycle. All
//! hardware interactions go through the `autoshoot_traits` collaborator
//! traits (`Vision`, `Shooter`, `Feeder`, `HeadingSensor`, `StatusBoard`).
//!
//! ## Architecture
//!
//! - **Filtering**: sliding-window running average of shooter speed (`window`)
//! - **Gating**: alignment + speed consistency verdict (`stability`)
//! - **Sequencing**: tick-driven Purge/Await/Feed/Pause machine (`cycle`)
//! - **Control**: collaborator orchestration and lifecycle (`ShootCore`)
//! - **Hosting**: `Command` lifecycle trait and fixed-period `runner`
//!
//! Nothing in this crate blocks: every wait is elapsed time accumulated per
//! tick, so a cooperative scheduler always gets control back.

pub mod builder;
pub mod command;
pub mod config;
pub mod controller;
pub mod conversions;
pub mod cycle;
pub mod error;
pub mod hw_error;
pub mod mocks;
pub mod runner;
pub mod stability;
pub mod status;
pub mod util;
pub mod window;

pub use builder::{
    AutoShoot, AutoShootBuilder, AutoShootG, Missing, Set, ShootParams, build_auto_shoot,
};
pub use command::Command;
pub use config::{CycleCfg, StabilityCfg, StatusCfg, WindowCfg};
pub use controller::ShootCore;
pub use cycle::{CycleState, FeedCommand, ShootCycleStateMachine, Transition};
pub use error::{AbortReason, BuildError, Result, ShootError};
pub use mocks::{MemoryStatusBoard, NullStatusBoard};
pub use stability::{StabilityDetector, StabilityVerdict};
pub use status::ShootStatus;
pub use window::SlidingWindowFilter;

//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();
/// Effective limits used for the current run (for JSON details).
pub static LAST_LIMITS: OnceLock<CliLimits> = OnceLock::new();

#[derive(Copy, Clone, Debug)]
pub struct CliLimits {
    pub max_run_ms: u64,
    pub max_ticks: Option<u64>,
    pub await_timeout_ms: Option<u64>,
}

#[derive(Parser, Debug)]
#[command(name = "autoshoot", version, about = "Auto-shoot controller CLI")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/autoshoot.toml")]
    pub config: PathBuf,

    /// Log and report as JSON instead of pretty text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); defaults to [logging].level or info
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the shooting cycle against the simulated rig
    Shoot {
        /// Cancel after this many ms (takes precedence over [scheduler].max_run_ms)
        #[arg(long, value_name = "MS")]
        max_run_ms: Option<u64>,
        /// Cancel after this many ticks
        #[arg(long, value_name = "N")]
        max_ticks: Option<u64>,
        /// Give up waiting for stability after this many ms
        #[arg(long, value_name = "MS")]
        await_timeout_ms: Option<u64>,
        /// Pace ticks against the wall clock instead of virtual time
        #[arg(
            long,
            action = ArgAction::SetTrue,
            long_help = "Pace ticks against the wall clock.\n\nBy default the simulated run uses virtual time: each tick advances a manual clock by one period and returns immediately, so a 10 s run finishes in milliseconds. With --realtime every tick sleeps out the rest of its period and Ctrl-C cancels the run."
        )]
        realtime: bool,
        /// Write a per-tick CSV trace (t_ms,speed,target_speed,aligned) for `replay`
        #[arg(long, value_name = "FILE")]
        trace_out: Option<PathBuf>,
    },
    /// Feed a recorded speed trace through the controller
    Replay {
        /// Trace CSV with headers t_ms,speed,target_speed,aligned
        #[arg(long, value_name = "FILE")]
        trace: PathBuf,
    },
    /// Quick health check (config ok, simulated rig answers)
    SelfCheck,
}

#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and speed-trace parsing for the auto-shoot system.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//!   Every section is optional; missing sections take their defaults.
//! - The speed-trace CSV loader enforces headers and rejects non-finite
//!   readings before they can reach the control core.
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WindowCfg {
    /// Samples in the sliding speed window
    pub capacity: usize,
}

impl Default for WindowCfg {
    fn default() -> Self {
        Self { capacity: 50 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StabilityCfg {
    /// Max |speed - oldest| and |speed - average| to call the wheel stable
    pub threshold: f64,
}

impl Default for StabilityCfg {
    fn default() -> Self {
        Self { threshold: 0.05 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CycleCfg {
    pub purge_ms: u64,
    pub feed_ms: u64,
    pub pause_ms: u64,
    /// Optional give-up time while waiting for stability (absent = wait forever)
    pub await_timeout_ms: Option<u64>,
}

impl Default for CycleCfg {
    fn default() -> Self {
        Self {
            purge_ms: 60,
            feed_ms: 500,
            pause_ms: 1000,
            await_timeout_ms: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SchedulerCfg {
    pub tick_rate_hz: u32,
    /// Host-side cap on one run in milliseconds (0 = unbounded)
    pub max_run_ms: u64,
}

impl Default for SchedulerCfg {
    fn default() -> Self {
        Self {
            tick_rate_hz: 50,
            max_run_ms: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StatusCfg {
    pub key: String,
    pub active: String,
    pub fallback: String,
}

impl Default for StatusCfg {
    fn default() -> Self {
        Self {
            key: "Robot Mode:".to_string(),
            active: "Auto Shoot".to_string(),
            fallback: "TeleOp".to_string(),
        }
    }
}

/// Parameters of the simulated shooter rig used by the CLI.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SimCfg {
    /// Speed the simulated vision solution asks for
    pub target_speed: f64,
    /// Fraction of the remaining speed error closed per tick, in (0, 1]
    pub spin_response: f64,
    /// Peak amplitude of the deterministic speed ripple
    pub ripple: f64,
    /// calc_align calls before the simulated target is centered
    pub align_after_ticks: u64,
    /// Drop alignment permanently after this many calc_align calls
    pub lose_alignment_after_ticks: Option<u64>,
    /// Constant heading reported by the simulated gyro (degrees)
    pub heading_deg: f64,
}

impl Default for SimCfg {
    fn default() -> Self {
        Self {
            target_speed: 60.0,
            spin_response: 0.15,
            ripple: 0.01,
            align_after_ticks: 10,
            lose_alignment_after_ticks: None,
            heading_deg: 0.0,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub window: WindowCfg,
    pub stability: StabilityCfg,
    pub cycle: CycleCfg,
    pub scheduler: SchedulerCfg,
    pub status: StatusCfg,
    pub sim: SimCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Window / stability
        if self.window.capacity == 0 {
            eyre::bail!("window.capacity must be >= 1");
        }
        if self.window.capacity > 10_000 {
            eyre::bail!("window.capacity is unreasonably large (>10000)");
        }
        if !self.stability.threshold.is_finite() || self.stability.threshold <= 0.0 {
            eyre::bail!("stability.threshold must be finite and > 0");
        }

        // Cycle
        if self.cycle.feed_ms == 0 {
            eyre::bail!("cycle.feed_ms must be >= 1");
        }
        if self.cycle.pause_ms == 0 {
            eyre::bail!("cycle.pause_ms must be >= 1");
        }
        if self.cycle.purge_ms > 60 * 1000 {
            eyre::bail!("cycle.purge_ms is unreasonably large (>1min)");
        }
        if self.cycle.await_timeout_ms == Some(0) {
            eyre::bail!("cycle.await_timeout_ms must be >= 1 when set");
        }

        // Scheduler
        if self.scheduler.tick_rate_hz == 0 || self.scheduler.tick_rate_hz > 1000 {
            eyre::bail!("scheduler.tick_rate_hz must be in [1, 1000]");
        }

        // Status
        if self.status.key.trim().is_empty() {
            eyre::bail!("status.key must not be empty");
        }

        // Sim
        if !(self.sim.spin_response > 0.0 && self.sim.spin_response <= 1.0) {
            eyre::bail!("sim.spin_response must be in (0.0, 1.0]");
        }
        if !self.sim.ripple.is_finite() || self.sim.ripple < 0.0 {
            eyre::bail!("sim.ripple must be >= 0");
        }
        if !self.sim.target_speed.is_finite() {
            eyre::bail!("sim.target_speed must be finite");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rot:?}");
        }

        Ok(())
    }
}

/// Recorded shooter telemetry, one row per control tick.
///
/// Expected headers:
/// t_ms,speed,target_speed,aligned
///
/// Example:
/// t_ms,speed,target_speed,aligned
/// 0,12.5,60.0,false
/// 20,18.9,60.0,false
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct TraceRow {
    pub t_ms: u64,
    pub speed: f64,
    pub target_speed: f64,
    pub aligned: bool,
}

pub fn load_trace_csv(path: &std::path::Path) -> eyre::Result<Vec<TraceRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open trace CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["t_ms", "speed", "target_speed", "aligned"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "trace CSV must have headers 't_ms,speed,target_speed,aligned', got: {}",
            actual.join(",")
        );
    }

    let mut rows: Vec<TraceRow> = Vec::new();
    for (idx, rec) in rdr.deserialize::<TraceRow>().enumerate() {
        let line = idx + 2;
        let row = rec.map_err(|e| eyre::eyre!("invalid CSV row {}: {}", line, e))?;
        if !row.speed.is_finite() || !row.target_speed.is_finite() {
            eyre::bail!("trace row {} has a non-finite speed", line);
        }
        if let Some(prev) = rows.last()
            && row.t_ms < prev.t_ms
        {
            eyre::bail!(
                "trace timestamps must be non-decreasing (row {}: {} < {})",
                line,
                row.t_ms,
                prev.t_ms
            );
        }
        rows.push(row);
    }

    if rows.is_empty() {
        eyre::bail!("trace CSV {:?} has no rows", path);
    }
    Ok(rows)
}

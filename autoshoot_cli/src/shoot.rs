//! Shooting runs: config mapping, rig assembly, run execution and replay.

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use autoshoot_core::error::{AbortReason, Result as CoreResult, ShootError};
use autoshoot_core::runner::{RunEnd, RunParams, run_with};
use autoshoot_core::{AutoShoot, CycleState, MemoryStatusBoard, ShootParams};
use autoshoot_hardware::{SimParams, SimRig, TraceSample, TraceVision};
use autoshoot_traits::clock::{Clock, ManualClock, MonotonicClock};
use eyre::WrapErr;

use crate::cli::{CliLimits, LAST_LIMITS};

/// Virtual-time runs with no configured bound stop here.
const DEFAULT_SIM_RUN_MS: u64 = 10_000;

pub fn abort_reason_name(r: &AbortReason) -> &'static str {
    use AbortReason::*;
    match r {
        StabilityLost => "StabilityLost",
        StabilityTimeout => "StabilityTimeout",
        Interrupted => "Interrupted",
        MaxRuntime => "MaxRuntime",
    }
}

/// CLI overrides for one `shoot` run.
#[derive(Debug, Default, Clone)]
pub struct ShootOpts {
    pub max_run_ms: Option<u64>,
    pub max_ticks: Option<u64>,
    pub await_timeout_ms: Option<u64>,
    pub realtime: bool,
    pub trace_out: Option<std::path::PathBuf>,
}

/// One state change, stamped with run time.
#[derive(Debug, Clone, Copy)]
pub struct TimelineEntry {
    pub t_ms: u64,
    pub from: CycleState,
    pub to: CycleState,
}

#[derive(Debug, Clone)]
pub struct ShootSummary {
    pub ticks: u64,
    pub elapsed_ms: u64,
    pub shots: u32,
    pub state: CycleState,
    pub end: RunEnd,
    pub reason: Option<AbortReason>,
    /// Tick on which the first feed started, if any.
    pub first_feed_tick: Option<u64>,
    pub timeline: Vec<TimelineEntry>,
}

impl ShootSummary {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "ticks": self.ticks,
            "elapsed_ms": self.elapsed_ms,
            "shots": self.shots,
            "state": self.state.name(),
            "end": format!("{:?}", self.end),
            "reason": self.reason.as_ref().map(abort_reason_name),
            "first_feed_tick": self.first_feed_tick,
            "timeline": self
                .timeline
                .iter()
                .map(|e| serde_json::json!({ "t_ms": e.t_ms, "from": e.from.name(), "to": e.to.name() }))
                .collect::<Vec<_>>(),
        })
    }
}

fn sim_params(cfg: &autoshoot_config::SimCfg) -> SimParams {
    SimParams {
        target_speed: cfg.target_speed,
        spin_response: cfg.spin_response,
        ripple: cfg.ripple,
        align_after_ticks: cfg.align_after_ticks,
        lose_alignment_after_ticks: cfg.lose_alignment_after_ticks,
        heading_deg: cfg.heading_deg,
    }
}

fn build_command(
    params: ShootParams,
    rig: &SimRig,
    vision: impl autoshoot_traits::Vision + 'static,
) -> CoreResult<AutoShoot> {
    AutoShoot::builder()
        .with_vision(vision)
        .with_shooter(rig.shooter())
        .with_feeder(rig.feeder())
        .with_heading(rig.gyro())
        .with_params(params)
        .with_status_board(MemoryStatusBoard::new())
        .build()
}

/// Turn how the run ended into the CLI outcome.
///
/// A host cap (time or ticks) is a normal way for a volley to end once at
/// least one ball went out; with nothing fired it is reported as `MaxRuntime`.
fn outcome(summary: ShootSummary) -> CoreResult<ShootSummary> {
    let reason = match summary.end {
        RunEnd::Finished => summary.reason,
        RunEnd::Cancelled => Some(AbortReason::Interrupted),
        RunEnd::MaxRuntime | RunEnd::TickLimit if summary.shots == 0 => {
            Some(AbortReason::MaxRuntime)
        }
        RunEnd::MaxRuntime | RunEnd::TickLimit => None,
    };
    match reason {
        Some(r) => {
            tracing::error!(reason = abort_reason_name(&r), shots = summary.shots, "shoot aborted");
            Err(ShootError::Abort(r).into())
        }
        None => Ok(summary),
    }
}

pub fn run_shoot(
    cfg: &autoshoot_config::Config,
    opts: &ShootOpts,
    shutdown: &AtomicBool,
) -> CoreResult<ShootSummary> {
    // Builder/config mapping via the From impls in autoshoot_core::conversions
    let mut params = ShootParams::from(cfg);
    if let Some(ms) = opts.await_timeout_ms {
        params.cycle.await_timeout_ms = Some(ms);
    }
    let mut run_params = RunParams::from(&cfg.scheduler);
    if let Some(ms) = opts.max_run_ms {
        run_params.max_run_ms = ms;
    }
    run_params.max_ticks = opts.max_ticks;
    if !opts.realtime && run_params.max_run_ms == 0 && run_params.max_ticks.is_none() {
        tracing::info!(max_run_ms = DEFAULT_SIM_RUN_MS, "bounding virtual-time run");
        run_params.max_run_ms = DEFAULT_SIM_RUN_MS;
    }
    let _ = LAST_LIMITS.set(CliLimits {
        max_run_ms: run_params.max_run_ms,
        max_ticks: run_params.max_ticks,
        await_timeout_ms: params.cycle.await_timeout_ms,
    });

    let rig = SimRig::new(sim_params(&cfg.sim));
    let mut cmd = build_command(params, &rig, rig.vision())?;

    let clock: Box<dyn Clock> = if opts.realtime {
        Box::new(MonotonicClock::new())
    } else {
        Box::new(ManualClock::new())
    };

    let period_ms = autoshoot_core::util::period_ms(run_params.tick_rate_hz);
    let mut trace = match &opts.trace_out {
        Some(path) => Some(
            csv::Writer::from_path(path)
                .wrap_err_with(|| format!("create trace file {}", path.display()))?,
        ),
        None => None,
    };
    if let Some(w) = trace.as_mut() {
        w.write_record(["t_ms", "speed", "target_speed", "aligned"])
            .wrap_err("write trace header")?;
    }
    let mut trace_err: Option<csv::Error> = None;
    let mut first_feed_tick = None;
    let mut timeline = Vec::new();

    tracing::info!(
        tick_rate_hz = run_params.tick_rate_hz,
        max_run_ms = run_params.max_run_ms,
        realtime = opts.realtime,
        "shoot start"
    );
    let report = run_with(&mut cmd, &*clock, &run_params, shutdown, |c, n| {
        let core = c.core();
        let t_ms = (n - 1) * period_ms;
        if first_feed_tick.is_none() && c.state() == CycleState::Feeding {
            first_feed_tick = Some(n);
        }
        if let Some(t) = core.last_transition() {
            timeline.push(TimelineEntry {
                t_ms,
                from: t.from,
                to: t.to,
            });
        }
        tracing::debug!(
            tick = n,
            state = %c.state(),
            speed = core.last_speed(),
            average = core.window().average(),
            aligned = core.last_verdict().aligned,
            "tick"
        );
        if let Some(w) = trace.as_mut()
            && trace_err.is_none()
        {
            let res = w.write_record([
                t_ms.to_string(),
                core.last_speed().to_string(),
                core.last_auto_speed().to_string(),
                core.last_verdict().aligned.to_string(),
            ]);
            if let Err(e) = res {
                trace_err = Some(e);
            }
        }
    })?;

    if let Some(e) = trace_err {
        return Err(eyre::Report::new(e).wrap_err("write trace row"));
    }
    if let Some(mut w) = trace {
        w.flush().wrap_err("flush trace file")?;
    }

    let summary = ShootSummary {
        ticks: report.ticks,
        elapsed_ms: report.elapsed_ms,
        shots: cmd.shots_fired(),
        state: cmd.state(),
        end: report.end,
        reason: cmd.finish_reason(),
        first_feed_tick,
        timeline,
    };
    tracing::info!(
        ticks = summary.ticks,
        shots = summary.shots,
        end = ?summary.end,
        "shoot finished"
    );
    outcome(summary)
}

/// Replay a recorded trace. Each row is one tick; `dt` comes from the
/// recorded timestamps. The command's own finish is reported, not raised.
pub fn run_replay(cfg: &autoshoot_config::Config, trace: &Path) -> CoreResult<ShootSummary> {
    let rows = autoshoot_config::load_trace_csv(trace)?;
    let samples: Vec<TraceSample> = rows
        .iter()
        .map(|r| TraceSample {
            speed: r.speed,
            target_speed: r.target_speed,
            aligned: r.aligned,
        })
        .collect();

    let rig = SimRig::new(sim_params(&cfg.sim));
    let mut cmd = build_command(ShootParams::from(cfg), &rig, TraceVision::new(samples))?;
    let period = autoshoot_core::util::period(cfg.scheduler.tick_rate_hz);

    cmd.initialize().wrap_err("initialize replay")?;
    let mut ticks = 0u64;
    let mut first_feed_tick = None;
    let mut timeline = Vec::new();
    let mut prev_t = None;
    for row in &rows {
        let dt = prev_t.map_or(period, |p| Duration::from_millis(row.t_ms - p));
        prev_t = Some(row.t_ms);
        if let Err(e) = cmd.tick(dt) {
            cmd.end(true);
            return Err(e).wrap_err_with(|| format!("replay tick at t_ms={}", row.t_ms));
        }
        ticks += 1;
        if let Some(t) = cmd.core().last_transition() {
            timeline.push(TimelineEntry {
                t_ms: row.t_ms,
                from: t.from,
                to: t.to,
            });
        }
        if first_feed_tick.is_none() && cmd.state() == CycleState::Feeding {
            first_feed_tick = Some(ticks);
            tracing::info!(t_ms = row.t_ms, "first feed");
        }
        if cmd.is_finished() {
            break;
        }
    }
    let finished = cmd.is_finished();
    cmd.end(!finished);

    let elapsed_ms = match (rows.first(), rows.last()) {
        (Some(first), Some(last)) => last.t_ms.saturating_sub(first.t_ms),
        _ => 0,
    };
    Ok(ShootSummary {
        ticks,
        elapsed_ms,
        shots: cmd.shots_fired(),
        state: cmd.state(),
        end: if finished {
            RunEnd::Finished
        } else {
            RunEnd::TickLimit
        },
        reason: cmd.finish_reason(),
        first_feed_tick,
        timeline,
    })
}

/// Build the command against the simulated rig and run one tick.
pub fn self_check(cfg: &autoshoot_config::Config) -> CoreResult<()> {
    let rig = SimRig::new(sim_params(&cfg.sim));
    let mut cmd = build_command(ShootParams::from(cfg), &rig, rig.vision())?;
    cmd.initialize().wrap_err("initialize")?;
    let step = cmd.tick(autoshoot_core::util::period(cfg.scheduler.tick_rate_hz));
    cmd.end(true);
    step.wrap_err("first tick")?;
    let snap = rig.snapshot();
    if snap.auto_mode || snap.indicator_on {
        return Err(ShootError::State("rig not released after end".into()).into());
    }
    Ok(())
}

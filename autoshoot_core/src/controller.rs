//! The auto-shoot controller (`ShootCore`).
//!
//! Owns the speed window, the stability detector and the cycle state
//! machine, and bridges them to the collaborators. Each `step` is one
//! scheduler tick: sample → evaluate → transition → actuate.

use std::time::Duration;

use autoshoot_traits::{Feeder, HeadingSensor, Shooter, StatusBoard, Vision};
use eyre::WrapErr;

use crate::command::Command;
use crate::config::StatusCfg;
use crate::cycle::{CycleState, FeedCommand, ShootCycleStateMachine, Transition};
use crate::error::{AbortReason, Result};
use crate::hw_error::map_hw_error;
use crate::stability::{StabilityDetector, StabilityVerdict};
use crate::status::ShootStatus;
use crate::window::SlidingWindowFilter;

/// Unified core for both dynamic (boxed) and generic (static dispatch) variants.
pub struct ShootCore<V: Vision, S: Shooter, F: Feeder, H: HeadingSensor> {
    pub(crate) vision: V,
    pub(crate) shooter: S,
    pub(crate) feeder: F,
    pub(crate) heading: H,
    pub(crate) status: Box<dyn StatusBoard>,
    pub(crate) status_cfg: StatusCfg,
    pub(crate) window: SlidingWindowFilter,
    pub(crate) detector: StabilityDetector,
    pub(crate) cycle: ShootCycleStateMachine,

    pub(crate) last_feed: Option<FeedCommand>,
    pub(crate) last_verdict: StabilityVerdict,
    pub(crate) last_speed: f64,
    pub(crate) last_auto_speed: f64,
    pub(crate) last_transition: Option<Transition>,
    pub(crate) prior_status: Option<String>,
    pub(crate) ticks: u64,
}

impl<V: Vision, S: Shooter, F: Feeder, H: HeadingSensor> core::fmt::Debug for ShootCore<V, S, F, H> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ShootCore")
            .field("state", &self.cycle.state())
            .field("ticks", &self.ticks)
            .field("last_speed", &self.last_speed)
            .field("last_verdict", &self.last_verdict)
            .finish()
    }
}

#[inline]
fn hw<T>(r: std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>) -> Result<T> {
    r.map_err(|e| eyre::Report::new(map_hw_error(&*e)))
}

impl<V: Vision, S: Shooter, F: Feeder, H: HeadingSensor> ShootCore<V, S, F, H> {
    pub fn state(&self) -> CycleState {
        self.cycle.state()
    }

    pub fn finish_reason(&self) -> Option<AbortReason> {
        self.cycle.finish_reason()
    }

    pub fn shots_fired(&self) -> u32 {
        self.cycle.shots_fired()
    }

    pub fn last_verdict(&self) -> StabilityVerdict {
        self.last_verdict
    }

    /// Last measured shooter speed.
    pub fn last_speed(&self) -> f64 {
        self.last_speed
    }

    /// Last auto target speed commanded to the shooter.
    pub fn last_auto_speed(&self) -> f64 {
        self.last_auto_speed
    }

    /// Transition taken on the most recent tick, if any.
    pub fn last_transition(&self) -> Option<Transition> {
        self.last_transition
    }

    pub fn window(&self) -> &SlidingWindowFilter {
        &self.window
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Arm the indicator and auto mode, reset all per-run state, publish status.
    pub fn begin(&mut self) -> Result<()> {
        self.window.reset();
        self.cycle.reset();
        self.last_feed = None;
        self.last_verdict = StabilityVerdict::default();
        self.last_speed = 0.0;
        self.last_auto_speed = 0.0;
        self.last_transition = None;
        self.prior_status = None;
        self.ticks = 0;

        hw(self.vision.enable_indicator()).wrap_err("enable targeting indicator")?;
        hw(self.shooter.set_auto_mode(true)).wrap_err("enable shooter auto mode")?;
        self.vision.reset_alignment();

        let key = self.status_cfg.key.as_str();
        self.prior_status = self
            .status
            .get_status(key)
            .filter(|prev| *prev != self.status_cfg.active);
        self.status.set_status(key, &self.status_cfg.active);

        tracing::info!(
            window = self.window.capacity(),
            threshold = self.detector.threshold(),
            "auto shoot initialized"
        );
        Ok(())
    }

    /// One scheduler tick of the shooting loop.
    pub fn step(&mut self, dt: Duration) -> Result<ShootStatus> {
        if let Some(reason) = self.done_reason() {
            return Ok(ShootStatus::Finished(reason));
        }
        self.ticks = self.ticks.saturating_add(1);

        // Sample
        let heading = hw(self.heading.current_heading()).wrap_err("read heading")?;
        hw(self.vision.calc_align(heading)).wrap_err("calc align")?;
        let speed = hw(self.vision.current_shooter_speed()).wrap_err("read shooter speed")?;
        let auto_speed = hw(self.vision.auto_target_speed()).wrap_err("read auto target speed")?;
        let aligned = self.vision.is_aligned();
        self.last_speed = speed;
        self.last_auto_speed = auto_speed;

        // Evaluate, then transition
        let verdict = self.detector.evaluate(speed, aligned, &mut self.window);
        self.last_verdict = verdict;
        self.last_transition = self.cycle.advance(dt, verdict.is_ready());

        // Actuate
        hw(self.shooter.spin(auto_speed)).wrap_err("spin shooter")?;
        match self.cycle.state().feed_command() {
            Some(cmd) => self.command_feed(cmd)?,
            None => {
                if self.last_transition.is_some() {
                    hw(self.feeder.stop()).wrap_err("feeder stop")?;
                    self.last_feed = Some(FeedCommand::Stop);
                }
            }
        }

        Ok(match self.done_reason() {
            Some(reason) => ShootStatus::Finished(reason),
            None => ShootStatus::Running(self.cycle.state()),
        })
    }

    /// Stop every owned actuator (best-effort) and hand the status display back.
    pub fn finish(&mut self, interrupted: bool) {
        if let Err(e) = hw(self.vision.disable_indicator()) {
            tracing::warn!(error = %e, "disable indicator failed on end");
        }
        if let Err(e) = hw(self.shooter.stop()) {
            tracing::warn!(error = %e, "shooter stop failed on end");
        }
        if let Err(e) = hw(self.feeder.stop()) {
            tracing::warn!(error = %e, "feeder stop failed on end");
        }
        self.last_feed = Some(FeedCommand::Stop);
        if let Err(e) = hw(self.shooter.set_auto_mode(false)) {
            tracing::warn!(error = %e, "disable auto mode failed on end");
        }

        // Only restore if nobody else replaced our status in the meantime.
        let key = self.status_cfg.key.as_str();
        if self.status.get_status(key).as_deref() == Some(self.status_cfg.active.as_str()) {
            let restore = self
                .prior_status
                .take()
                .unwrap_or_else(|| self.status_cfg.fallback.clone());
            self.status.set_status(key, &restore);
        }

        tracing::info!(
            interrupted,
            state = %self.cycle.state(),
            shots = self.cycle.shots_fired(),
            reason = ?self.cycle.finish_reason(),
            "auto shoot ended"
        );
    }

    fn done_reason(&self) -> Option<AbortReason> {
        if self.cycle.is_done() {
            Some(self.cycle.finish_reason().unwrap_or(AbortReason::StabilityLost))
        } else {
            None
        }
    }

    /// Edge-triggered: the feeder only hears about changes.
    fn command_feed(&mut self, cmd: FeedCommand) -> Result<()> {
        if self.last_feed == Some(cmd) {
            return Ok(());
        }
        match cmd {
            FeedCommand::Feed => hw(self.feeder.feed()).wrap_err("feeder feed")?,
            FeedCommand::Reverse => hw(self.feeder.reverse()).wrap_err("feeder reverse")?,
            FeedCommand::Stop => hw(self.feeder.stop()).wrap_err("feeder stop")?,
        }
        tracing::trace!(command = ?cmd, "feed command");
        self.last_feed = Some(cmd);
        Ok(())
    }
}

impl<V: Vision, S: Shooter, F: Feeder, H: HeadingSensor> Command for ShootCore<V, S, F, H> {
    fn initialize(&mut self) -> Result<()> {
        self.begin()
    }

    fn tick(&mut self, dt: Duration) -> Result<()> {
        self.step(dt).map(|_| ())
    }

    fn is_finished(&self) -> bool {
        self.cycle.is_done()
    }

    fn end(&mut self, interrupted: bool) {
        self.finish(interrupted);
    }

    fn name(&self) -> &'static str {
        "auto_shoot"
    }
}

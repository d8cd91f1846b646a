//! Type-state builder for `AutoShoot` and generic `build_auto_shoot` constructor.
//!
//! The builder enforces at compile time that Vision, Shooter, Feeder and the
//! heading sensor are provided before `build()` is available. `try_build()`
//! is always available for dynamic checks.

use std::marker::PhantomData;
use std::time::Duration;

use autoshoot_traits::{Feeder, HeadingSensor, Shooter, StatusBoard, Vision};

use crate::command::Command;
use crate::config::*;
use crate::controller::ShootCore;
use crate::cycle::{CycleState, ShootCycleStateMachine};
use crate::error::{AbortReason, BuildError, Result};
use crate::mocks::NullStatusBoard;
use crate::stability::{StabilityDetector, StabilityVerdict};
use crate::status::ShootStatus;
use crate::window::SlidingWindowFilter;

// ── Public dynamic-dispatch wrapper ──────────────────────────────────────────

type BoxedCore =
    ShootCore<Box<dyn Vision>, Box<dyn Shooter>, Box<dyn Feeder>, Box<dyn HeadingSensor>>;

/// Auto-shoot command over boxed collaborators.
pub struct AutoShoot {
    pub(crate) inner: BoxedCore,
}

impl core::fmt::Debug for AutoShoot {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AutoShoot")
            .field("state", &self.inner.state())
            .field("ticks", &self.inner.ticks())
            .finish()
    }
}

impl AutoShoot {
    /// Start building an AutoShoot command.
    pub fn builder() -> AutoShootBuilder<Missing, Missing, Missing, Missing> {
        AutoShootBuilder::default()
    }

    pub fn initialize(&mut self) -> Result<()> {
        self.inner.begin()
    }

    /// One scheduler tick.
    pub fn tick(&mut self, dt: Duration) -> Result<ShootStatus> {
        self.inner.step(dt)
    }

    pub fn is_finished(&self) -> bool {
        self.inner.cycle.is_done()
    }

    pub fn end(&mut self, interrupted: bool) {
        self.inner.finish(interrupted);
    }

    pub fn state(&self) -> CycleState {
        self.inner.state()
    }

    pub fn finish_reason(&self) -> Option<AbortReason> {
        self.inner.finish_reason()
    }

    pub fn shots_fired(&self) -> u32 {
        self.inner.shots_fired()
    }

    pub fn last_verdict(&self) -> StabilityVerdict {
        self.inner.last_verdict()
    }

    /// Borrow the generic core for telemetry that the wrapper does not forward.
    pub fn core(&self) -> &BoxedCore {
        &self.inner
    }
}

impl Command for AutoShoot {
    fn initialize(&mut self) -> Result<()> {
        self.inner.begin()
    }

    fn tick(&mut self, dt: Duration) -> Result<()> {
        self.inner.step(dt).map(|_| ())
    }

    fn is_finished(&self) -> bool {
        self.inner.cycle.is_done()
    }

    fn end(&mut self, interrupted: bool) {
        self.inner.finish(interrupted);
    }

    fn name(&self) -> &'static str {
        "auto_shoot"
    }
}

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

/// Parameters shared by both construction paths.
#[derive(Debug, Clone, Default)]
pub struct ShootParams {
    pub window: WindowCfg,
    pub stability: StabilityCfg,
    pub cycle: CycleCfg,
    pub status: StatusCfg,
}

/// Builder for `AutoShoot`. All fields are validated on `build()`.
pub struct AutoShootBuilder<V, S, F, H> {
    vision: Option<Box<dyn Vision>>,
    shooter: Option<Box<dyn Shooter>>,
    feeder: Option<Box<dyn Feeder>>,
    heading: Option<Box<dyn HeadingSensor>>,
    status_board: Option<Box<dyn StatusBoard>>,
    params: ShootParams,
    _v: PhantomData<V>,
    _s: PhantomData<S>,
    _f: PhantomData<F>,
    _h: PhantomData<H>,
}

impl Default for AutoShootBuilder<Missing, Missing, Missing, Missing> {
    fn default() -> Self {
        Self {
            vision: None,
            shooter: None,
            feeder: None,
            heading: None,
            status_board: None,
            params: ShootParams::default(),
            _v: PhantomData,
            _s: PhantomData,
            _f: PhantomData,
            _h: PhantomData,
        }
    }
}

/// Validate configuration and construct a `ShootCore`.
///
/// This is the single source of truth for validation and construction,
/// used by both `AutoShootBuilder::try_build()` and `build_auto_shoot()`.
fn validate_and_build<V: Vision, S: Shooter, F: Feeder, H: HeadingSensor>(
    vision: V,
    shooter: S,
    feeder: F,
    heading: H,
    status: Box<dyn StatusBoard>,
    params: ShootParams,
) -> Result<ShootCore<V, S, F, H>> {
    // ── Validation ───────────────────────────────────────────────────────────
    if params.window.capacity == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "window capacity must be >= 1",
        )));
    }
    if !params.stability.threshold.is_finite() || params.stability.threshold <= 0.0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "stability threshold must be finite and > 0",
        )));
    }
    if params.cycle.feed_ms == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "feed_ms must be > 0",
        )));
    }
    if params.cycle.pause_ms == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "pause_ms must be > 0",
        )));
    }
    if params.cycle.await_timeout_ms == Some(0) {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "await_timeout_ms must be > 0 when set",
        )));
    }
    if params.status.key.trim().is_empty() {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "status key must not be empty",
        )));
    }

    Ok(ShootCore {
        vision,
        shooter,
        feeder,
        heading,
        status,
        window: SlidingWindowFilter::new(params.window.capacity),
        detector: StabilityDetector::new(params.stability.threshold),
        cycle: ShootCycleStateMachine::new(&params.cycle),
        status_cfg: params.status,
        last_feed: None,
        last_verdict: StabilityVerdict::default(),
        last_speed: 0.0,
        last_auto_speed: 0.0,
        last_transition: None,
        prior_status: None,
        ticks: 0,
    })
}

impl<V, S, F, H> AutoShootBuilder<V, S, F, H> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<AutoShoot> {
        let vision = self
            .vision
            .ok_or_else(|| eyre::Report::new(BuildError::MissingVision))?;
        let shooter = self
            .shooter
            .ok_or_else(|| eyre::Report::new(BuildError::MissingShooter))?;
        let feeder = self
            .feeder
            .ok_or_else(|| eyre::Report::new(BuildError::MissingFeeder))?;
        let heading = self
            .heading
            .ok_or_else(|| eyre::Report::new(BuildError::MissingHeading))?;
        let status = self
            .status_board
            .unwrap_or_else(|| Box::new(NullStatusBoard));

        let inner = validate_and_build(vision, shooter, feeder, heading, status, self.params)?;
        Ok(AutoShoot { inner })
    }

    fn retype<V2, S2, F2, H2>(self) -> AutoShootBuilder<V2, S2, F2, H2> {
        AutoShootBuilder {
            vision: self.vision,
            shooter: self.shooter,
            feeder: self.feeder,
            heading: self.heading,
            status_board: self.status_board,
            params: self.params,
            _v: PhantomData,
            _s: PhantomData,
            _f: PhantomData,
            _h: PhantomData,
        }
    }
}

/// Chainable setters that do not affect type-state.
impl<V, S, F, H> AutoShootBuilder<V, S, F, H> {
    pub fn with_window(mut self, window: WindowCfg) -> Self {
        self.params.window = window;
        self
    }
    pub fn with_window_capacity(mut self, capacity: usize) -> Self {
        self.params.window.capacity = capacity;
        self
    }
    pub fn with_stability(mut self, stability: StabilityCfg) -> Self {
        self.params.stability = stability;
        self
    }
    pub fn with_cycle(mut self, cycle: CycleCfg) -> Self {
        self.params.cycle = cycle;
        self
    }
    pub fn with_status_cfg(mut self, status: StatusCfg) -> Self {
        self.params.status = status;
        self
    }
    pub fn with_params(mut self, params: ShootParams) -> Self {
        self.params = params;
        self
    }
    /// Status side channel; defaults to a board that discards everything.
    pub fn with_status_board(mut self, board: impl StatusBoard + 'static) -> Self {
        self.status_board = Some(Box::new(board));
        self
    }
}

// Setters that advance type-state
impl<S, F, H> AutoShootBuilder<Missing, S, F, H> {
    pub fn with_vision(mut self, vision: impl Vision + 'static) -> AutoShootBuilder<Set, S, F, H> {
        self.vision = Some(Box::new(vision));
        self.retype()
    }
}

impl<V, F, H> AutoShootBuilder<V, Missing, F, H> {
    pub fn with_shooter(
        mut self,
        shooter: impl Shooter + 'static,
    ) -> AutoShootBuilder<V, Set, F, H> {
        self.shooter = Some(Box::new(shooter));
        self.retype()
    }
}

impl<V, S, H> AutoShootBuilder<V, S, Missing, H> {
    pub fn with_feeder(mut self, feeder: impl Feeder + 'static) -> AutoShootBuilder<V, S, Set, H> {
        self.feeder = Some(Box::new(feeder));
        self.retype()
    }
}

impl<V, S, F> AutoShootBuilder<V, S, F, Missing> {
    pub fn with_heading(
        mut self,
        heading: impl HeadingSensor + 'static,
    ) -> AutoShootBuilder<V, S, F, Set> {
        self.heading = Some(Box::new(heading));
        self.retype()
    }
}

impl AutoShootBuilder<Set, Set, Set, Set> {
    /// Validate and build. Only available when every collaborator is set.
    pub fn build(self) -> Result<AutoShoot> {
        self.try_build()
    }
}

/// Generic, statically-dispatched alias using the unified core.
pub type AutoShootG<V, S, F, H> = ShootCore<V, S, F, H>;

/// Build a generic, statically-dispatched `AutoShootG` from concrete collaborators.
///
/// Delegates to the shared `validate_and_build`.
pub fn build_auto_shoot<V, S, F, H>(
    vision: V,
    shooter: S,
    feeder: F,
    heading: H,
    status: Option<Box<dyn StatusBoard>>,
    params: ShootParams,
) -> Result<AutoShootG<V, S, F, H>>
where
    V: Vision,
    S: Shooter,
    F: Feeder,
    H: HeadingSensor,
{
    validate_and_build(
        vision,
        shooter,
        feeder,
        heading,
        status.unwrap_or_else(|| Box::new(NullStatusBoard)),
        params,
    )
}

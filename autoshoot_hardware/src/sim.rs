//! Simulated shooter rig.
//!
//! One `SimRig` hands out a vision, shooter, feeder and gyro handle that all
//! share the same state. The flywheel follows a first-order response toward
//! the commanded speed, advanced once per speed read, with a deterministic
//! sinusoidal ripple on top.

use std::cell::RefCell;
use std::rc::Rc;

use autoshoot_traits::{Feeder, HeadingSensor, Shooter, Vision};

use crate::error::HwError;

type HwResult<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Rig behavior knobs.
#[derive(Debug, Clone)]
pub struct SimParams {
    /// Speed the aiming solution asks for.
    pub target_speed: f64,
    /// Fraction of the remaining speed error closed per read, in (0, 1].
    pub spin_response: f64,
    /// Peak ripple amplitude added to every reading.
    pub ripple: f64,
    /// `calc_align` calls before the target counts as centered.
    pub align_after_ticks: u64,
    /// Lose alignment for good after this many `calc_align` calls.
    pub lose_alignment_after_ticks: Option<u64>,
    pub heading_deg: f64,
}

impl Default for SimParams {
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

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedState {
    #[default]
    Idle,
    Feeding,
    Reversing,
}

/// Fault the rig raises on the next shooter speed read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    Timeout,
    Disconnected,
}

/// Observable rig state, for assertions and CLI summaries.
#[derive(Debug, Clone, Default)]
pub struct RigSnapshot {
    pub commanded_speed: f64,
    pub wheel_speed: f64,
    pub auto_mode: bool,
    pub indicator_on: bool,
    pub feed: FeedState,
    /// Number of feed/reverse/stop calls that reached the feeder.
    pub feed_commands: u64,
    pub feed_starts: u64,
    pub align_calls: u64,
    pub last_heading: f64,
}

#[derive(Debug, Default)]
struct RigState {
    params: SimParams,
    snap: RigSnapshot,
    reads: u64,
    pending_fault: Option<FaultKind>,
}

/// Shared simulated hardware. Cloning yields another handle to the same rig.
#[derive(Debug, Clone, Default)]
pub struct SimRig {
    state: Rc<RefCell<RigState>>,
}

impl SimRig {
    pub fn new(params: SimParams) -> Self {
        Self {
            state: Rc::new(RefCell::new(RigState {
                params,
                ..RigState::default()
            })),
        }
    }

    pub fn vision(&self) -> SimVision {
        SimVision { rig: self.clone() }
    }

    pub fn shooter(&self) -> SimShooter {
        SimShooter { rig: self.clone() }
    }

    pub fn feeder(&self) -> SimFeeder {
        SimFeeder { rig: self.clone() }
    }

    pub fn gyro(&self) -> SimGyro {
        SimGyro { rig: self.clone() }
    }

    pub fn snapshot(&self) -> RigSnapshot {
        self.state.borrow().snap.clone()
    }

    /// Make the next speed read fail with the given fault.
    pub fn inject_fault(&self, kind: FaultKind) {
        self.state.borrow_mut().pending_fault = Some(kind);
    }

    /// Nudge the wheel, e.g. to model a ball loading the flywheel.
    pub fn disturb(&self, delta: f64) {
        self.state.borrow_mut().snap.wheel_speed += delta;
    }

    fn aligned(&self) -> bool {
        let st = self.state.borrow();
        let calls = st.snap.align_calls;
        let lost = st
            .params
            .lose_alignment_after_ticks
            .is_some_and(|n| calls > n);
        calls >= st.params.align_after_ticks && !lost
    }
}

/// Aiming camera plus the flywheel encoder it reads through.
#[derive(Debug, Clone)]
pub struct SimVision {
    rig: SimRig,
}

impl Vision for SimVision {
    fn enable_indicator(&mut self) -> HwResult<()> {
        self.rig.state.borrow_mut().snap.indicator_on = true;
        Ok(())
    }

    fn disable_indicator(&mut self) -> HwResult<()> {
        self.rig.state.borrow_mut().snap.indicator_on = false;
        Ok(())
    }

    fn reset_alignment(&mut self) {
        self.rig.state.borrow_mut().snap.align_calls = 0;
    }

    fn calc_align(&mut self, heading: f64) -> HwResult<()> {
        let mut st = self.rig.state.borrow_mut();
        st.snap.align_calls += 1;
        st.snap.last_heading = heading;
        Ok(())
    }

    fn auto_target_speed(&mut self) -> HwResult<f64> {
        Ok(self.rig.state.borrow().params.target_speed)
    }

    fn is_aligned(&self) -> bool {
        self.rig.aligned()
    }

    fn current_shooter_speed(&mut self) -> HwResult<f64> {
        let mut st = self.rig.state.borrow_mut();
        if let Some(fault) = st.pending_fault.take() {
            tracing::warn!(?fault, "simulated speed read fault");
            return Err(Box::new(match fault {
                FaultKind::Timeout => HwError::Timeout,
                FaultKind::Disconnected => HwError::Disconnected("flywheel encoder".into()),
            }));
        }
        let k = st.params.spin_response;
        let err = st.snap.commanded_speed - st.snap.wheel_speed;
        st.snap.wheel_speed += k * err;
        st.reads += 1;
        let ripple = st.params.ripple * (st.reads as f64 * 0.7).sin();
        Ok(st.snap.wheel_speed + ripple)
    }
}

#[derive(Debug, Clone)]
pub struct SimShooter {
    rig: SimRig,
}

impl Shooter for SimShooter {
    fn spin(&mut self, speed: f64) -> HwResult<()> {
        self.rig.state.borrow_mut().snap.commanded_speed = speed;
        Ok(())
    }

    fn stop(&mut self) -> HwResult<()> {
        self.rig.state.borrow_mut().snap.commanded_speed = 0.0;
        tracing::debug!("simulated shooter stopped");
        Ok(())
    }

    fn set_auto_mode(&mut self, on: bool) -> HwResult<()> {
        self.rig.state.borrow_mut().snap.auto_mode = on;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SimFeeder {
    rig: SimRig,
}

impl SimFeeder {
    fn set(&self, feed: FeedState) {
        let mut st = self.rig.state.borrow_mut();
        if feed == FeedState::Feeding && st.snap.feed != FeedState::Feeding {
            st.snap.feed_starts += 1;
        }
        st.snap.feed = feed;
        st.snap.feed_commands += 1;
    }
}

impl Feeder for SimFeeder {
    fn feed(&mut self) -> HwResult<()> {
        self.set(FeedState::Feeding);
        Ok(())
    }

    fn reverse(&mut self) -> HwResult<()> {
        self.set(FeedState::Reversing);
        Ok(())
    }

    fn stop(&mut self) -> HwResult<()> {
        self.set(FeedState::Idle);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SimGyro {
    rig: SimRig,
}

impl HeadingSensor for SimGyro {
    fn current_heading(&mut self) -> HwResult<f64> {
        Ok(self.rig.state.borrow().params.heading_deg)
    }
}

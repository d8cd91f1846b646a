//! Tick-driven shoot cycle: Purge → AwaitStability → Feeding → Pause → ...
//!
//! Every wait is elapsed time accumulated per tick and compared against a
//! threshold; nothing here blocks. At most one transition happens per tick.
//! Elapsed time counts ticks already spent in the current state, so a
//! 60 ms purge at a 20 ms period occupies exactly three ticks.

use std::time::Duration;

use crate::config::CycleCfg;
use crate::error::AbortReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CycleState {
    /// Back the feeder off so nothing is touching the wheel during spin-up.
    Purge,
    AwaitStability,
    Feeding,
    /// Spacing between shots; stability is not checked here.
    Pause,
    Done,
}

impl CycleState {
    /// Feed mechanism command owned by this state; `None` for `Done`.
    pub fn feed_command(self) -> Option<FeedCommand> {
        match self {
            Self::Purge => Some(FeedCommand::Reverse),
            Self::AwaitStability | Self::Pause => Some(FeedCommand::Stop),
            Self::Feeding => Some(FeedCommand::Feed),
            Self::Done => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Purge => "purge",
            Self::AwaitStability => "await_stability",
            Self::Feeding => "feeding",
            Self::Pause => "pause",
            Self::Done => "done",
        }
    }
}

impl core::fmt::Display for CycleState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedCommand {
    Feed,
    Reverse,
    Stop,
}

/// A state change produced by one `advance` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: CycleState,
    pub to: CycleState,
    /// Time spent in `from` before leaving it.
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct ShootCycleStateMachine {
    state: CycleState,
    elapsed: Duration,
    purge: Duration,
    feed: Duration,
    pause: Duration,
    await_timeout: Option<Duration>,
    finish_reason: Option<AbortReason>,
    shots_fired: u32,
}

impl ShootCycleStateMachine {
    pub fn new(cfg: &CycleCfg) -> Self {
        Self {
            state: CycleState::Purge,
            elapsed: Duration::ZERO,
            purge: Duration::from_millis(cfg.purge_ms),
            feed: Duration::from_millis(cfg.feed_ms),
            pause: Duration::from_millis(cfg.pause_ms),
            await_timeout: cfg.await_timeout_ms.map(Duration::from_millis),
            finish_reason: None,
            shots_fired: 0,
        }
    }

    /// Back to `Purge` with all timers and counters cleared.
    pub fn reset(&mut self) {
        self.state = CycleState::Purge;
        self.elapsed = Duration::ZERO;
        self.finish_reason = None;
        self.shots_fired = 0;
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    /// Time spent in the current state so far.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn is_done(&self) -> bool {
        self.state == CycleState::Done
    }

    /// Why the machine reached `Done`, if it has.
    pub fn finish_reason(&self) -> Option<AbortReason> {
        self.finish_reason
    }

    /// Completed feed windows (Feeding → Pause transitions).
    pub fn shots_fired(&self) -> u32 {
        self.shots_fired
    }

    /// Advance by one tick of length `dt` given this tick's ready-to-feed verdict.
    pub fn advance(&mut self, dt: Duration, ready: bool) -> Option<Transition> {
        let next = match self.state {
            CycleState::Purge => (self.elapsed >= self.purge).then_some(CycleState::AwaitStability),
            CycleState::AwaitStability => {
                if ready {
                    Some(CycleState::Feeding)
                } else if self.await_timeout.is_some_and(|t| self.elapsed >= t) {
                    self.finish_reason = Some(AbortReason::StabilityTimeout);
                    Some(CycleState::Done)
                } else {
                    None
                }
            }
            // a feed window that ran its full length counts even if this tick is unstable
            CycleState::Feeding => {
                if self.elapsed >= self.feed {
                    self.shots_fired = self.shots_fired.saturating_add(1);
                    Some(CycleState::Pause)
                } else if !ready {
                    self.finish_reason = Some(AbortReason::StabilityLost);
                    Some(CycleState::Done)
                } else {
                    None
                }
            }
            CycleState::Pause => (self.elapsed >= self.pause).then_some(CycleState::AwaitStability),
            CycleState::Done => None,
        };

        let transition = next.map(|to| self.enter(to));
        if self.state != CycleState::Done {
            self.elapsed = self.elapsed.saturating_add(dt);
        }
        transition
    }

    fn enter(&mut self, to: CycleState) -> Transition {
        let t = Transition {
            from: self.state,
            to,
            elapsed: self.elapsed,
        };
        if to == CycleState::Done {
            tracing::info!(
                from = %t.from,
                reason = ?self.finish_reason,
                shots = self.shots_fired,
                "shoot cycle finished"
            );
        } else {
            tracing::debug!(
                from = %t.from,
                to = %t.to,
                elapsed_ms = t.elapsed.as_millis() as u64,
                "cycle transition"
            );
        }
        self.state = to;
        self.elapsed = Duration::ZERO;
        t
    }
}

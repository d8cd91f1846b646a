//! `From` implementations bridging `autoshoot_config` types to `autoshoot_core` types.

use crate::config::{CycleCfg, StabilityCfg, StatusCfg, WindowCfg};
use crate::runner::RunParams;

// ── WindowCfg ────────────────────────────────────────────────────────────────

impl From<&autoshoot_config::WindowCfg> for WindowCfg {
    fn from(c: &autoshoot_config::WindowCfg) -> Self {
        Self {
            capacity: c.capacity,
        }
    }
}

// ── StabilityCfg ─────────────────────────────────────────────────────────────

impl From<&autoshoot_config::StabilityCfg> for StabilityCfg {
    fn from(c: &autoshoot_config::StabilityCfg) -> Self {
        Self {
            threshold: c.threshold,
        }
    }
}

// ── CycleCfg ─────────────────────────────────────────────────────────────────

impl From<&autoshoot_config::CycleCfg> for CycleCfg {
    fn from(c: &autoshoot_config::CycleCfg) -> Self {
        Self {
            purge_ms: c.purge_ms,
            feed_ms: c.feed_ms,
            pause_ms: c.pause_ms,
            await_timeout_ms: c.await_timeout_ms,
        }
    }
}

// ── StatusCfg ────────────────────────────────────────────────────────────────

impl From<&autoshoot_config::StatusCfg> for StatusCfg {
    fn from(c: &autoshoot_config::StatusCfg) -> Self {
        Self {
            key: c.key.clone(),
            active: c.active.clone(),
            fallback: c.fallback.clone(),
        }
    }
}

// ── RunParams ────────────────────────────────────────────────────────────────

impl From<&autoshoot_config::SchedulerCfg> for RunParams {
    fn from(c: &autoshoot_config::SchedulerCfg) -> Self {
        Self {
            tick_rate_hz: c.tick_rate_hz,
            max_run_ms: c.max_run_ms,
            max_ticks: None,
        }
    }
}

// ── ShootParams ──────────────────────────────────────────────────────────────

impl From<&autoshoot_config::Config> for crate::builder::ShootParams {
    fn from(c: &autoshoot_config::Config) -> Self {
        Self {
            window: (&c.window).into(),
            stability: (&c.stability).into(),
            cycle: (&c.cycle).into(),
            status: (&c.status).into(),
        }
    }
}

//! Configuration types for the shooting core.
//!
//! These are the runtime configuration structs used by `ShootCore`.
//! They are separate from the TOML-deserialized config in `autoshoot_config`.

/// Sliding-window filter configuration.
#[derive(Debug, Clone)]
pub struct WindowCfg {
    /// Number of speed samples averaged; also the "one window ago" distance.
    pub capacity: usize,
}

impl Default for WindowCfg {
    fn default() -> Self {
        Self { capacity: 50 }
    }
}

/// Stability gate configuration.
#[derive(Debug, Clone)]
pub struct StabilityCfg {
    /// Max allowed |speed - oldest| and |speed - average|, in speed units.
    pub threshold: f64,
}

impl Default for StabilityCfg {
    fn default() -> Self {
        Self { threshold: 0.05 }
    }
}

/// Shoot cycle timing.
#[derive(Debug, Clone)]
pub struct CycleCfg {
    /// Feeder reverse time before the first shot.
    pub purge_ms: u64,
    /// Feeder run time per shot.
    pub feed_ms: u64,
    /// Gap between shots.
    pub pause_ms: u64,
    /// Give up waiting for stability after this long. `None` waits forever.
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

/// Status side-channel keys and values.
#[derive(Debug, Clone)]
pub struct StatusCfg {
    pub key: String,
    /// Published while the command runs.
    pub active: String,
    /// Restored on end when nothing was shown before initialize.
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

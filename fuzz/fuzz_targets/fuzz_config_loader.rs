#![no_main]
use autoshoot_traits::{Feeder, HeadingSensor, Shooter, Vision};
use libfuzzer_sys::fuzz_target;

type HwResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

struct Idle;

impl Vision for Idle {
    fn enable_indicator(&mut self) -> HwResult<()> {
        Ok(())
    }
    fn disable_indicator(&mut self) -> HwResult<()> {
        Ok(())
    }
    fn reset_alignment(&mut self) {}
    fn calc_align(&mut self, _heading: f64) -> HwResult<()> {
        Ok(())
    }
    fn auto_target_speed(&mut self) -> HwResult<f64> {
        Ok(0.0)
    }
    fn is_aligned(&self) -> bool {
        false
    }
    fn current_shooter_speed(&mut self) -> HwResult<f64> {
        Ok(0.0)
    }
}

impl Shooter for Idle {
    fn spin(&mut self, _speed: f64) -> HwResult<()> {
        Ok(())
    }
    fn stop(&mut self) -> HwResult<()> {
        Ok(())
    }
    fn set_auto_mode(&mut self, _on: bool) -> HwResult<()> {
        Ok(())
    }
}

impl Feeder for Idle {
    fn feed(&mut self) -> HwResult<()> {
        Ok(())
    }
    fn reverse(&mut self) -> HwResult<()> {
        Ok(())
    }
    fn stop(&mut self) -> HwResult<()> {
        Ok(())
    }
}

impl HeadingSensor for Idle {
    fn current_heading(&mut self) -> HwResult<f64> {
        Ok(0.0)
    }
}

fuzz_target!(|data: &str| {
    // Parse errors and validation errors are both fine; panics are not.
    if let Ok(cfg) = autoshoot_config::load_toml(data) {
        if cfg.validate().is_ok() {
            // Whatever the config layer accepts, the builder must accept too.
            let params = autoshoot_core::ShootParams::from(&cfg);
            if let Err(e) = autoshoot_core::build_auto_shoot(Idle, Idle, Idle, Idle, None, params) {
                panic!("validated config rejected by builder: {e:#}");
            }
        }
    }
});

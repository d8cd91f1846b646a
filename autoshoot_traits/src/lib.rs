pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// Aiming subsystem: owns the alignment controller and the speed lookup.
pub trait Vision {
    fn enable_indicator(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn disable_indicator(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    /// Clear the alignment controller's accumulated error state.
    fn reset_alignment(&mut self);
    /// Recompute the alignment correction for the given robot heading (degrees).
    fn calc_align(&mut self, heading: f64) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    /// Shooter speed the vision solution asks for at the current range.
    fn auto_target_speed(&mut self) -> Result<f64, Box<dyn std::error::Error + Send + Sync>>;
    fn is_aligned(&self) -> bool;
    /// Measured shooter wheel speed, same units as `auto_target_speed`.
    fn current_shooter_speed(&mut self) -> Result<f64, Box<dyn std::error::Error + Send + Sync>>;
}

pub trait Shooter {
    fn spin(&mut self, speed: f64) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn set_auto_mode(&mut self, on: bool)
    -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

pub trait Feeder {
    fn feed(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn reverse(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

pub trait HeadingSensor {
    fn current_heading(&mut self) -> Result<f64, Box<dyn std::error::Error + Send + Sync>>;
}

/// Best-effort key/value status display shared with other commands.
pub trait StatusBoard {
    fn set_status(&mut self, key: &str, value: &str);
    fn get_status(&self, key: &str) -> Option<String>;
}

// Boxed collaborators forward to the inner implementation so the core can be
// used with either static or dynamic dispatch.

impl<T: Vision + ?Sized> Vision for Box<T> {
    fn enable_indicator(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).enable_indicator()
    }
    fn disable_indicator(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).disable_indicator()
    }
    fn reset_alignment(&mut self) {
        (**self).reset_alignment();
    }
    fn calc_align(&mut self, heading: f64) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).calc_align(heading)
    }
    fn auto_target_speed(&mut self) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        (**self).auto_target_speed()
    }
    fn is_aligned(&self) -> bool {
        (**self).is_aligned()
    }
    fn current_shooter_speed(&mut self) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        (**self).current_shooter_speed()
    }
}

impl<T: Shooter + ?Sized> Shooter for Box<T> {
    fn spin(&mut self, speed: f64) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).spin(speed)
    }
    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).stop()
    }
    fn set_auto_mode(&mut self, on: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set_auto_mode(on)
    }
}

impl<T: Feeder + ?Sized> Feeder for Box<T> {
    fn feed(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).feed()
    }
    fn reverse(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).reverse()
    }
    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).stop()
    }
}

impl<T: HeadingSensor + ?Sized> HeadingSensor for Box<T> {
    fn current_heading(&mut self) -> Result<f64, Box<dyn std::error::Error + Send + Sync>> {
        (**self).current_heading()
    }
}

impl<T: StatusBoard + ?Sized> StatusBoard for Box<T> {
    fn set_status(&mut self, key: &str, value: &str) {
        (**self).set_status(key, value);
    }
    fn get_status(&self, key: &str) -> Option<String> {
        (**self).get_status(key)
    }
}

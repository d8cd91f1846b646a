//! Maps `Box<dyn Error>` from collaborator trait boundaries to typed `ShootError`.
//!
//! The traits in `autoshoot_traits` use `Box<dyn Error + Send + Sync>` so any
//! driver can plug in; this module converts those to our typed error enum,
//! with an optional feature-gated path for `autoshoot_hardware::HwError`.

use crate::error::ShootError;

/// Map a trait-boundary error to a typed `ShootError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> ShootError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<autoshoot_hardware::error::HwError>() {
            return match hw {
                autoshoot_hardware::error::HwError::Timeout => ShootError::Timeout,
                other => ShootError::HardwareFault(other.to_string()),
            };
        }
    }

    let s = e.to_string();
    if s.to_lowercase().contains("timeout") {
        ShootError::Timeout
    } else {
        ShootError::Hardware(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_timeout_maps_to_timeout() {
        let e: Box<dyn std::error::Error + Send + Sync> = "vision frame timeout".into();
        assert!(matches!(map_hw_error(&*e), ShootError::Timeout));
    }

    #[test]
    fn other_errors_keep_their_message() {
        let e: Box<dyn std::error::Error + Send + Sync> = "can bus off".into();
        match map_hw_error(&*e) {
            ShootError::Hardware(msg) => assert_eq!(msg, "can bus off"),
            other => panic!("unexpected mapping: {other:?}"),
        }
    }

    #[cfg(feature = "hardware-errors")]
    #[test]
    fn typed_hw_fault_is_downcast() {
        let e: Box<dyn std::error::Error + Send + Sync> =
            Box::new(autoshoot_hardware::error::HwError::Disconnected("feeder".into()));
        assert!(matches!(map_hw_error(&*e), ShootError::HardwareFault(_)));
    }
}

//! Human-readable error descriptions and structured JSON error formatting.

use crate::cli::LAST_LIMITS;
use crate::shoot::abort_reason_name;

fn find<T: std::error::Error + 'static>(err: &eyre::Report) -> Option<&T> {
    err.chain().find_map(|e| e.downcast_ref::<T>())
}

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use autoshoot_core::error::{AbortReason, BuildError, ShootError};

    // Typed matches first
    if let Some(be) = find::<BuildError>(err) {
        return match be {
            BuildError::MissingVision
            | BuildError::MissingShooter
            | BuildError::MissingFeeder
            | BuildError::MissingHeading => format!(
                "What happened: The shooting command was built without a collaborator ({be}).\nLikely causes: A subsystem failed to initialize or was not passed to the builder.\nHow to fix: Provide vision, shooter, feeder and heading via with_vision/with_shooter/with_feeder/with_heading."
            ),
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/autoshoot.toml for a sample."
            ),
        };
    }

    if let Some(se) = find::<ShootError>(err) {
        if matches!(se, ShootError::Timeout) {
            return "What happened: A sensor read timed out.\nLikely causes: Camera or flywheel encoder not responding, or a loose cable.\nHow to fix: Check the vision pipeline and encoder wiring, then rerun.".to_string();
        }
        if let ShootError::Abort(reason) = se {
            return match reason {
                AbortReason::StabilityLost => "What happened: stability lost while feeding; the feeder was stopped mid-shot.\nLikely causes: Robot lost alignment with the target, or the flywheel speed dipped.\nHow to fix: Hold the robot still while shooting; raise stability.threshold if the wheel is noisy.".to_string(),
                AbortReason::StabilityTimeout => "What happened: Timed out waiting for a stable shooter speed.\nLikely causes: Target never aligned, or the wheel never settled within the threshold.\nHow to fix: Check vision alignment; raise cycle.await_timeout_ms or stability.threshold.".to_string(),
                AbortReason::Interrupted => "What happened: Run was interrupted by the host (Ctrl-C).\nLikely causes: Operator cancelled the run.\nHow to fix: Start a new run when ready.".to_string(),
                AbortReason::MaxRuntime => "What happened: max run time was exceeded before any shot was fired.\nLikely causes: The wheel never stabilized, or the limit is too short for spin-up.\nHow to fix: Increase scheduler.max_run_ms (or --max-run-ms / --max-ticks), or check alignment.".to_string(),
            };
        }
        if let ShootError::HardwareFault(msg) = se {
            return format!(
                "What happened: Hardware fault ({msg}).\nLikely causes: A device disconnected or reported an error.\nHow to fix: Check connections and power, then rerun."
            );
        }
        // Fallback to generic for other domain errors
        return format!(
            "What happened: {se}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
        );
    }

    // String-based heuristics for errors coming from init or config
    let msg = format!("{err:#}");
    let lower = msg.to_ascii_lowercase();

    if lower.contains("read config") {
        return format!(
            "What happened: Could not read the config file.\nLikely causes: Wrong --config path or missing permissions.\nHow to fix: Pass --config with an existing TOML file. Original: {msg}"
        );
    }

    if lower.contains("invalid configuration") || lower.contains("parse config") {
        return format!(
            "What happened: Configuration is invalid or incomplete.\nLikely causes: Out-of-range or mistyped values.\nHow to fix: Edit the TOML config and try again. Details: {msg}"
        );
    }

    // Trace CSV header special-case
    if lower.contains("trace csv must have headers") {
        return "Invalid headers in trace CSV. Expected 't_ms,speed,target_speed,aligned'."
            .to_string();
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Map AbortReason (if present) to stable exit codes; non-abort errors return 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    use autoshoot_core::error::{AbortReason, ShootError};
    if let Some(ShootError::Abort(reason)) = find::<ShootError>(err) {
        return match reason {
            AbortReason::Interrupted => 2,
            AbortReason::StabilityLost => 3,
            AbortReason::StabilityTimeout => 4,
            AbortReason::MaxRuntime => 5,
        };
    }
    1
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use autoshoot_core::error::{AbortReason, ShootError};
    use serde_json::json;

    if let Some(ShootError::Abort(reason)) = find::<ShootError>(err) {
        let msg = humanize(err);
        let limits = LAST_LIMITS.get();
        let reason_name = abort_reason_name(reason);

        let detail_obj = match reason {
            AbortReason::MaxRuntime => {
                limits.map(|l| json!({ "max_run_ms": l.max_run_ms, "max_ticks": l.max_ticks }))
            }
            AbortReason::StabilityTimeout => {
                limits.map(|l| json!({ "await_timeout_ms": l.await_timeout_ms }))
            }
            _ => None,
        };

        let obj = if let Some(d) = detail_obj {
            json!({ "reason": reason_name, "details": d, "message": msg })
        } else {
            json!({ "reason": reason_name, "message": msg })
        };
        return obj.to_string();
    }

    // Generic error JSON
    json!({ "reason": "Error", "message": humanize(err) }).to_string()
}

//! Human-readable error descriptions and structured JSON error formatting.

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use quantctl_core::{BuildError, CoreError};

    if let Some(be) = err.downcast_ref::<BuildError>() {
        return format!(
            "What happened: The configuration could not be assembled ({be}).\nLikely causes: A required field was missing or a numeric field was not positive.\nHow to fix: Check the protocol/catalog/config file against the documented schema."
        );
    }

    if let Some(ce) = err.downcast_ref::<CoreError>() {
        return match ce {
            CoreError::Safety(faults) => {
                let lines: Vec<String> = faults.iter().map(|f| format!("  - {f}")).collect();
                format!(
                    "What happened: The safety kernel rejected this session.\nFaults:\n{}\nHow to fix: Adjust the protocol/catalog parameters or supply the missing patient confirmations.",
                    lines.join("\n")
                )
            }
            CoreError::Hardware(e) => format!(
                "What happened: A hardware call failed ({e}).\nLikely causes: Generator/oscilloscope not connected, wrong serial path, or a transient I/O error.\nHow to fix: Verify hardware.endpoint in the config and check physical cabling."
            ),
            CoreError::Busy => "What happened: A session is already active on this runner/worker.\nLikely causes: A previous run did not finish before this one started.\nHow to fix: Wait for the prior session to finish, or start a new process.".to_string(),
            CoreError::InvalidState { expected, actual } => format!(
                "What happened: Invalid state transition (expected {expected}, got {actual}).\nHow to fix: This is an internal sequencing error; re-run and report if it persists."
            ),
            CoreError::Aborted(reason) => format!(
                "What happened: The session was aborted ({reason}).\nHow to fix: Address the abort cause and start a new session."
            ),
        };
    }

    let msg = err.to_string();
    let lower = msg.to_ascii_lowercase();

    if lower.contains("must have headers") {
        return "Invalid headers in frequency catalog CSV. Expected 'frequency_hz,label'.".to_string();
    }

    if lower.contains("invalid configuration") || lower.contains("must be >") {
        return "What happened: Configuration is invalid or incomplete.\nLikely causes: A [safety]/[hardware]/[assessment] value is out of range.\nHow to fix: Edit the TOML config and try again.".to_string();
    }

    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Map `CoreError` variants to stable exit codes; non-domain errors return 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    use quantctl_core::CoreError;
    if let Some(ce) = err.downcast_ref::<CoreError>() {
        return match ce {
            CoreError::Safety(_) => 2,
            CoreError::Hardware(_) => 3,
            CoreError::Busy => 4,
            CoreError::InvalidState { .. } => 5,
            CoreError::Aborted(_) => 6,
        };
    }
    1
}

/// Structured JSON for errors when `--json` is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use quantctl_core::CoreError;
    use serde_json::json;

    if let Some(ce) = err.downcast_ref::<CoreError>() {
        let reason_name = match ce {
            CoreError::Safety(_) => "Safety",
            CoreError::Hardware(_) => "Hardware",
            CoreError::Busy => "Busy",
            CoreError::InvalidState { .. } => "InvalidState",
            CoreError::Aborted(_) => "Aborted",
        };
        let msg = humanize(err);
        let detail = if let CoreError::Safety(faults) = ce {
            Some(json!({ "faults": faults.iter().map(|f| f.to_string()).collect::<Vec<_>>() }))
        } else {
            None
        };
        let obj = if let Some(d) = detail {
            json!({ "reason": reason_name, "details": d, "message": msg })
        } else {
            json!({ "reason": reason_name, "message": msg })
        };
        return obj.to_string();
    }

    json!({ "reason": "Error", "message": humanize(err) }).to_string()
}

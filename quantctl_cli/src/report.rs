//! Stable JSONL line emitters for `--json` mode. Each function prints one
//! line to stdout; tracing output goes to stderr, so stdout stays a clean
//! stream of one JSON object per event for a downstream consumer to parse.

use quantctl_core::{AssessmentSummary, Event, LiveMetrics, ProtocolSummary};
use serde_json::json;

fn now_ms() -> u128 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis()).unwrap_or(0)
}

pub fn emit_live_metrics(m: &LiveMetrics) {
    let obj = json!({
        "timestamp": now_ms(),
        "kind": "live_metrics",
        "step_index": m.step_index,
        "total_steps": m.total_steps,
        "elapsed_ms": m.elapsed_ms,
        "step_progress": m.step_progress,
        "overall_progress": m.overall_progress,
        "current_frequency": m.current_frequency,
        "current_amplitude": m.current_amplitude,
        "remaining_s": m.remaining_s,
        "step_start_time": m.step_start_time,
        "protocol_start_time": m.protocol_start_time,
    });
    println!("{obj}");
}

pub fn emit_protocol_finished(summary: &ProtocolSummary) {
    let obj = json!({
        "timestamp": now_ms(),
        "kind": "protocol_finished",
        "steps_completed": summary.steps_completed,
        "total_elapsed_ms": summary.total_elapsed_ms,
    });
    println!("{obj}");
}

pub fn emit_assessment_finished(summary: &AssessmentSummary) {
    let ranked: Vec<_> = summary
        .ranked()
        .iter()
        .map(|r| {
            json!({
                "frequency_hz": r.frequency_hz,
                "score": r.score,
                "delta_z_percent": r.delta_z_percent,
                "delta_rms_percent": r.delta_rms_percent,
                "delta_vpp_percent": r.delta_vpp_percent,
                "delta_energy_01_5hz": r.delta_energy_01_5hz,
                "is_valid": r.is_valid,
                "test_duration_s": r.test_duration_s,
                "timestamp_ms": r.timestamp_ms,
            })
        })
        .collect();
    let obj = json!({
        "timestamp": now_ms(),
        "kind": "assessment_finished",
        "baseline_vrms": summary.baseline.measurement.vrms,
        "baseline_impedance_ohm": summary.baseline.measurement.impedance_ohm,
        "results": ranked,
    });
    println!("{obj}");
}

/// Drain every event currently buffered on `rx`, emitting JSONL lines for
/// the kinds a downstream consumer cares about and logging the rest.
pub fn drain_events(rx: &quantctl_core::EventReceiver, json: bool) {
    while let Ok(event) = rx.try_recv() {
        match event {
            Event::LiveMetrics(m) if json => emit_live_metrics(&m),
            Event::ErrorOccurred(msg) => tracing::error!(error = %msg, "session reported an error"),
            Event::StateChanged(state) => tracing::debug!(?state, "state changed"),
            _ => {}
        }
    }
}

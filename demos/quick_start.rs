//! Quick Start Example
//!
//! This example demonstrates how to set up and run a simulated stimulation
//! protocol using the controller library.

use quantctl_core::{event_channel, Event, ProtocolBuilder, ProtocolRunner, SafetyLimits, StepBuilder};
use quantctl_hardware::LoopbackHardware;
use quantctl_traits::MonotonicClock;
use std::collections::HashMap;

/// Runs a single-step simulated protocol at 440 Hz.
///
/// # Parameters
///
/// - No parameters; configuration is hardcoded for demonstration.
///
/// # Usage
///
/// This example is intended to be run as a standalone binary or via `cargo run --example quick_start`.
/// It demonstrates the minimal setup required to drive a `ProtocolRunner` against
/// an in-process `LoopbackHardware` target.
///
/// # Related Examples
///
/// - [`custom_strategy.rs`](custom_strategy.rs): Shows how to implement a custom scoring strategy.
/// - [`simulated_hardware.rs`](simulated_hardware.rs): Shows how to implement the `HardwareIo` trait.
///
/// # Errors
///
/// Returns an error if building the protocol or running the session fails, surfaced as an `eyre::Report`.
fn main() -> Result<(), eyre::Report> {
    let step = StepBuilder::new()
        .label("440 Hz tone")
        .frequency_hz(440.0)
        .amp_vpp(1.0)
        .duration_min(0.05)
        .build()?;
    let protocol = ProtocolBuilder::new().name("quick start").step(step).build()?;

    // All required confirmations must be supplied for the safety kernel to pass.
    let limits = SafetyLimits::default();
    let mut confirmations = HashMap::new();
    for key in &limits.required_confirmations {
        confirmations.insert(key.clone(), true);
    }
    let patient = HashMap::new();

    let (tx, rx) = event_channel();
    let mut runner = ProtocolRunner::new(LoopbackHardware::new(), MonotonicClock::new(), limits, tx);

    let summary = runner.start(protocol, &patient, &confirmations)?;

    while let Ok(event) = rx.try_recv() {
        if let Event::LiveMetrics(m) = event {
            println!("step {} progress: {:.0}%", m.step_index, m.step_progress * 100.0);
        }
    }

    println!("protocol finished: {} steps in {} ms", summary.steps_completed, summary.total_elapsed_ms);
    Ok(())
}

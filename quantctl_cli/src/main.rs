#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! CLI entrypoint for the therapy/assessment controller.
//!
//! Responsibilities:
//! - Parse config/flags and assemble a `HardwareIo` (loopback or, behind
//!   `feature = "hardware"`, a real SCPI-over-serial driver)
//! - Initialize tracing and manage log sinks
//! - Offer `--json` mode emitting stable JSONL lines to stdout (logs to stderr)
//! - Run a `ProtocolRunner`/`AssessmentWorker` session on a worker thread while
//!   the main thread drains events and watches for Ctrl-C
//! - Map domain errors to stable exit codes

mod cli;
mod error_fmt;
mod report;
mod tracing_setup;

use std::collections::HashMap;
use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use eyre::WrapErr;
use quantctl_config::Config;
use quantctl_core::{
    AssessmentConfig, AssessmentSummary, CoreError, PatientValue, Protocol, ProtocolSummary,
    SafetyLimits,
};
use quantctl_traits::clock::MonotonicClock;
use quantctl_traits::hardware::HardwareIo;

use cli::{Cli, Commands, JSON_MODE};
use error_fmt::{exit_code_for_error, format_error_json, humanize};
use tracing_setup::init_tracing;

fn main() -> eyre::Result<()> {
    let _ = color_eyre::install();

    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = Arc::clone(&shutdown);
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!("\nReceived shutdown signal, aborting gracefully...");
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        eprintln!("Warning: Failed to set signal handler: {e}");
    }

    if let Err(e) = real_main(shutdown) {
        let json = *JSON_MODE.get().unwrap_or(&false);
        let code = exit_code_for_error(&e);
        if json {
            println!("{}", format_error_json(&e));
        } else {
            eprintln!("{}", humanize(&e));
        }
        std::process::exit(code);
    }
    Ok(())
}

fn real_main(shutdown: Arc<AtomicBool>) -> eyre::Result<()> {
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    let cfg_text = fs::read_to_string(&cli.config).wrap_err_with(|| format!("read config {:?}", cli.config))?;
    let cfg: Config = toml::from_str(&cfg_text).wrap_err_with(|| format!("parse config {:?}", cli.config))?;
    cfg.validate().wrap_err("invalid configuration")?;

    init_tracing(cli.json, &cli.log_level, cfg.logging.file.as_deref(), cfg.logging.rotation.as_deref());

    match &cli.cmd {
        Commands::RunProtocol { protocol, confirmations, patient_flags } => {
            let hw = build_hardware(&cfg)?;
            let protocol_file = quantctl_config::protocol::load_protocol_file(protocol)?;
            let protocol: Protocol = protocol_file.try_into().map_err(|e: quantctl_core::BuildError| eyre::eyre!(e))?;
            let patient = parse_patient_flags(patient_flags)?;
            let confirmations = parse_confirmations(confirmations);
            run_protocol(&cli, &cfg, hw, protocol, patient, confirmations, shutdown)
        }
        Commands::Assess { catalog, name, confirmations, patient_flags } => {
            let hw = build_hardware(&cfg)?;
            let rows = quantctl_config::catalog::load_catalog_csv(catalog)?;
            let frequencies_hz: Vec<f64> = rows.iter().map(|r| r.frequency_hz).collect();
            let config = quantctl_core::conversions::assessment_config_from_parts(name.clone(), frequencies_hz, &cfg.assessment, &cfg.hardware)
                .map_err(|e| eyre::eyre!(e))?;
            let patient = parse_patient_flags(patient_flags)?;
            let confirmations = parse_confirmations(confirmations);
            run_assessment(&cli, &cfg, hw, config, patient, confirmations, shutdown)
        }
        Commands::SelfCheck => {
            tracing::info!("self-check starting");
            let mut hw = build_hardware(&cfg)?;
            if !hw.is_connected() {
                eyre::bail!("hardware reports not connected");
            }
            hw.start_stream(cfg.hardware.sample_rate_hz, cfg.hardware.voltage_range_v)
                .map_err(|e| eyre::eyre!("start_stream failed: {e}"))?;
            let samples = hw.read_stream(0.05).map_err(|e| eyre::eyre!("read_stream failed: {e}"))?;
            let _ = hw.stop_stream();
            println!("Self-check OK: captured {} CH1 samples, {} CH2 samples", samples.ch1.len(), samples.ch2.len());
            Ok(())
        }
        Commands::Health => {
            tracing::info!("health check starting");
            let hw = build_hardware(&cfg)?;
            if hw.is_connected() {
                println!("\u{2713} Hardware: responsive");
                println!("\nHealth check: OK");
                Ok(())
            } else {
                eprintln!("\u{2717} Hardware: not connected");
                Err(eyre::eyre!("Health check failed"))
            }
        }
    }
}

#[cfg(feature = "hardware")]
fn build_hardware(cfg: &Config) -> eyre::Result<Box<dyn HardwareIo + Send>> {
    if cfg.hardware.endpoint == "simulated" {
        Ok(Box::new(quantctl_hardware::LoopbackHardware::new()))
    } else {
        let hw = quantctl_hardware::scpi::ScpiHardware::open(&cfg.hardware.endpoint, cfg.hardware.baud, Duration::from_secs(1))
            .wrap_err("open SCPI hardware")?;
        Ok(Box::new(hw))
    }
}

#[cfg(not(feature = "hardware"))]
fn build_hardware(_cfg: &Config) -> eyre::Result<Box<dyn HardwareIo + Send>> {
    Ok(Box::new(quantctl_hardware::LoopbackHardware::new()))
}

fn parse_confirmations(keys: &[String]) -> HashMap<String, bool> {
    keys.iter().map(|k| (k.clone(), true)).collect()
}

fn parse_patient_flags(entries: &[String]) -> eyre::Result<HashMap<String, PatientValue>> {
    let mut out = HashMap::new();
    for entry in entries {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| eyre::eyre!("patient flag {entry:?} must be key=value"))?;
        let parsed = if let Ok(b) = value.parse::<bool>() {
            PatientValue::Bool(b)
        } else if let Ok(n) = value.parse::<f64>() {
            PatientValue::Number(n)
        } else {
            PatientValue::Text(value.to_string())
        };
        out.insert(key.to_string(), parsed);
    }
    Ok(out)
}

#[allow(clippy::too_many_arguments)]
fn run_protocol(
    cli: &Cli,
    cfg: &Config,
    hw: Box<dyn HardwareIo + Send>,
    protocol: Protocol,
    patient: HashMap<String, PatientValue>,
    confirmations: HashMap<String, bool>,
    shutdown: Arc<AtomicBool>,
) -> eyre::Result<()> {
    let limits: SafetyLimits = (&cfg.safety).into();
    let (tx, rx) = quantctl_core::event_channel();
    let clock = MonotonicClock::new();
    let mut runner = quantctl_core::ProtocolRunner::new(hw, clock, limits, tx);
    let abort_handle = runner.abort_handle();

    let handle = std::thread::spawn(move || runner.start(protocol, &patient, &confirmations));

    wait_for_session(&handle, &rx, &shutdown, cli.json, || abort_handle.abort());
    report::drain_events(&rx, cli.json);
    let summary: ProtocolSummary = join_session(handle)?;

    if cli.json {
        report::emit_protocol_finished(&summary);
    } else {
        println!("protocol finished: {} steps in {} ms", summary.steps_completed, summary.total_elapsed_ms);
    }
    Ok(())
}

fn run_assessment(
    cli: &Cli,
    cfg: &Config,
    hw: Box<dyn HardwareIo + Send>,
    config: AssessmentConfig,
    patient: HashMap<String, PatientValue>,
    confirmations: HashMap<String, bool>,
    shutdown: Arc<AtomicBool>,
) -> eyre::Result<()> {
    let limits: SafetyLimits = (&cfg.safety).into();
    let (tx, rx) = quantctl_core::event_channel();
    let clock = MonotonicClock::new();
    let mut worker = quantctl_core::AssessmentWorker::new(hw, clock, limits, tx);
    let abort_handle = worker.abort_handle();

    let handle = std::thread::spawn(move || worker.start(config, &patient, &confirmations));

    wait_for_session(&handle, &rx, &shutdown, cli.json, || abort_handle.abort());
    report::drain_events(&rx, cli.json);
    let summary: AssessmentSummary = join_session(handle)?;

    if cli.json {
        report::emit_assessment_finished(&summary);
    } else {
        println!("assessment finished: {} frequencies tested", summary.results.len());
        for r in summary.ranked() {
            println!("  {:>10.2} Hz  score={:.4}", r.frequency_hz, r.score);
        }
    }
    Ok(())
}

/// Poll the session thread until it finishes, draining events and watching
/// the shutdown flag on every tick; `on_shutdown` is invoked once when a
/// Ctrl-C is observed.
fn wait_for_session<T: Send + 'static>(
    handle: &std::thread::JoinHandle<Result<T, CoreError>>,
    rx: &quantctl_core::EventReceiver,
    shutdown: &Arc<AtomicBool>,
    json: bool,
    on_shutdown: impl FnOnce(),
) {
    let mut shutdown_sent = false;
    let mut on_shutdown = Some(on_shutdown);
    while !handle.is_finished() {
        if shutdown.load(Ordering::Relaxed) && !shutdown_sent {
            if let Some(f) = on_shutdown.take() {
                f();
            }
            shutdown_sent = true;
        }
        report::drain_events(rx, json);
        std::thread::sleep(Duration::from_millis(25));
    }
}

fn join_session<T>(handle: std::thread::JoinHandle<Result<T, CoreError>>) -> eyre::Result<T> {
    let result = handle.join().map_err(|_| eyre::eyre!("session thread panicked"))?;
    result.map_err(eyre::Report::from)
}

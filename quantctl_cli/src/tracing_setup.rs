//! Tracing subscriber setup: console output (pretty or JSON lines) plus an
//! optional rotating file sink.

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::FILE_GUARD;

fn rotation_from_str(s: &str) -> Rotation {
    match s.to_ascii_lowercase().as_str() {
        "hourly" => Rotation::HOURLY,
        "daily" => Rotation::DAILY,
        _ => Rotation::NEVER,
    }
}

fn open_file_sink(file: &str, rotation: Option<&str>) -> tracing_appender::non_blocking::NonBlocking {
    let path = std::path::Path::new(file);
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or_else(|| std::path::Path::new("."));
    let file_name = path.file_name().and_then(|f| f.to_str()).unwrap_or("quantctl.log");
    let appender = RollingFileAppender::new(rotation_from_str(rotation.unwrap_or("never")), dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    let _ = FILE_GUARD.set(guard);
    non_blocking
}

/// Install the global tracing subscriber. Console logs go to stderr so
/// `--json` stdout stays clean for structured command output; an optional
/// file sink gets the same events without ANSI color codes.
pub fn init_tracing(json: bool, level: &str, file: Option<&str>, rotation: Option<&str>) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match (json, file) {
        (true, Some(f)) => {
            let sink = open_file_sink(f, rotation);
            registry
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .with(fmt::layer().json().with_ansi(false).with_writer(sink))
                .init();
        }
        (true, None) => {
            registry.with(fmt::layer().json().with_writer(std::io::stderr)).init();
        }
        (false, Some(f)) => {
            let sink = open_file_sink(f, rotation);
            registry
                .with(fmt::layer().with_writer(std::io::stderr))
                .with(fmt::layer().json().with_ansi(false).with_writer(sink))
                .init();
        }
        (false, None) => {
            registry.with(fmt::layer().with_writer(std::io::stderr)).init();
        }
    }
}

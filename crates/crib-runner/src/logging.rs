use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use crib_core::AppInfo;
use tracing::Level;
use tracing_appender::non_blocking::{self, WorkerGuard};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LoggingConfig, ResolvedOutputs};

pub struct LoggingGuard {
    _guard: Option<WorkerGuard>,
    pub telemetry_path: Option<PathBuf>,
}

/// Installs console logging on stderr, plus a JSON event log next to the
/// games log when structured logging is enabled.
pub fn init_logging(
    logging: &LoggingConfig,
    outputs: &ResolvedOutputs,
    run_id: &str,
) -> Result<LoggingGuard> {
    let level = logging.level().unwrap_or(Level::INFO);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_span_events(FmtSpan::NONE);

    let (structured, guard, telemetry_path) = if logging.enable_structured {
        let telemetry_dir = outputs
            .jsonl
            .parent()
            .map(Path::to_path_buf)
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&telemetry_dir).with_context(|| {
            format!(
                "creating telemetry directory at {}",
                telemetry_dir.display()
            )
        })?;

        let telemetry_path = telemetry_dir.join("telemetry.jsonl");
        let file = File::create(&telemetry_path)
            .with_context(|| format!("creating telemetry file at {}", telemetry_path.display()))?;

        let (writer, guard) = non_blocking::NonBlockingBuilder::default()
            .lossy(false)
            .finish(file);

        let layer = fmt::layer()
            .json()
            .with_current_span(false)
            .with_span_events(FmtSpan::NONE)
            .with_writer(writer);
        (Some(layer), Some(guard), Some(telemetry_path))
    } else {
        (None, None, None)
    };

    // A subscriber may already be installed (e.g. when running in tests)
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(structured)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(
            target: "crib_runner::logging",
            app = AppInfo::name(),
            version = AppInfo::version(),
            run_id,
            structured = logging.enable_structured,
            "logging initialised"
        );
    }

    Ok(LoggingGuard {
        _guard: guard,
        telemetry_path,
    })
}

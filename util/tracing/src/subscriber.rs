use crate::{Config, LogFormat};
use anyhow::anyhow;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// The scope guard of the background log file writer.
///
/// Buffered events are flushed when this is dropped, so it must be kept alive until the end of
/// `main`.
#[must_use = "should be dropped at the end of the program scope"]
#[derive(Debug)]
pub struct ScopeGuard {
	_guard: Option<WorkerGuard>,
}

/// Sets up the tracing subscribers for a Tandem process. This should be
/// called at the beginning of a process' `main` function.
///
/// If successful, returns a guard object that should be dropped at the end
/// of the process' `main` function scope.
pub fn init_tracing_subscriber(
	service_name: &'static str,
	service_version: &'static str,
	config: &Config,
) -> Result<ScopeGuard, anyhow::Error> {
	let (layers, guard) = build_layers(config)?;
	Registry::default().with(layers).try_init()?;
	tracing::info!(
		service = service_name,
		version = service_version,
		format = %config.log_format,
		"Tracing initialized"
	);
	Ok(ScopeGuard { _guard: guard })
}

fn env_filter() -> EnvFilter {
	EnvFilter::builder().with_default_directive(LevelFilter::INFO.into()).from_env_lossy()
}

fn build_layers(config: &Config) -> Result<(Vec<BoxedLayer>, Option<WorkerGuard>), anyhow::Error> {
	let mut layers: Vec<BoxedLayer> = Vec::new();

	let stdout_layer: BoxedLayer = match config.log_format {
		LogFormat::Text => fmt::layer().with_filter(env_filter()).boxed(),
		LogFormat::Json => fmt::layer().json().with_filter(env_filter()).boxed(),
	};
	layers.push(stdout_layer);

	let mut guard = None;
	if let Some(path) = &config.log_file {
		let (writer, file_guard) = file_writer(path)?;
		// colors are ANSI codes and end up as gibberish in files
		let file_layer: BoxedLayer = match config.log_format {
			LogFormat::Text => {
				fmt::layer().with_ansi(false).with_writer(writer).with_filter(env_filter()).boxed()
			}
			LogFormat::Json => {
				fmt::layer().json().with_writer(writer).with_filter(env_filter()).boxed()
			}
		};
		layers.push(file_layer);
		guard = Some(file_guard);
	}

	Ok((layers, guard))
}

fn file_writer(path: &Path) -> Result<(NonBlocking, WorkerGuard), anyhow::Error> {
	let file_name = path
		.file_name()
		.ok_or_else(|| anyhow!("log file path {} has no file name", path.display()))?;
	let directory = match path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent,
		_ => Path::new("."),
	};
	std::fs::create_dir_all(directory).map_err(|e| {
		anyhow!("failed to create log directory {}: {e}", directory.display())
	})?;

	let appender = RollingFileAppender::builder()
		.rotation(Rotation::NEVER)
		.filename_prefix(file_name.to_string_lossy())
		.build(directory)
		.map_err(|e| anyhow!("failed to open log file {}: {e}", path.display()))?;
	Ok(tracing_appender::non_blocking(appender))
}

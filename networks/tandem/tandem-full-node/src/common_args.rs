use clap::Args;
use std::path::PathBuf;
use tandem_tracing::LogFormat;

/// Logging flags, overriding `TANDEM_LOG_FORMAT` and `TANDEM_LOG_FILE`.
#[derive(Debug, Clone, Default, Args)]
#[clap(rename_all = "kebab-case")]
pub struct LoggingArgs {
	/// Format of the events on standard output: text or json.
	#[clap(long)]
	pub log_format: Option<LogFormat>,

	/// Also append events to this file.
	#[clap(long)]
	pub log_file: Option<PathBuf>,
}

impl LoggingArgs {
	pub fn tracing_config(&self) -> Result<tandem_tracing::Config, anyhow::Error> {
		Ok(tandem_tracing::Config::from_env()?.with_overrides(self.log_format, self.log_file.clone()))
	}
}

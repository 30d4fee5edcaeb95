use anyhow::anyhow;
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

const LOG_FORMAT_ENV: &str = "TANDEM_LOG_FORMAT";
const LOG_FILE_ENV: &str = "TANDEM_LOG_FILE";

/// Format of the events written to standard output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
	/// Human readable lines with timestamps.
	#[default]
	Text,
	/// One JSON object per event.
	Json,
}

impl FromStr for LogFormat {
	type Err = anyhow::Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"text" => Ok(Self::Text),
			"json" => Ok(Self::Json),
			other => Err(anyhow!("unknown log format {other}, expected one of: text, json")),
		}
	}
}

impl fmt::Display for LogFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Text => f.write_str("text"),
			Self::Json => f.write_str("json"),
		}
	}
}

/// Options for tracing configuration.
#[derive(Debug, Default, Clone)]
pub struct Config {
	pub log_format: LogFormat,
	/// If set, events are also appended to this file, without ANSI colors.
	pub log_file: Option<PathBuf>,
}

impl Config {
	/// Get the tracing configuration from well-known environment variables.
	pub fn from_env() -> Result<Self, anyhow::Error> {
		let log_format = match read_env(LOG_FORMAT_ENV)? {
			Some(format) => format.parse()?,
			None => LogFormat::default(),
		};
		let log_file = read_env(LOG_FILE_ENV)?.filter(|s| !s.is_empty()).map(PathBuf::from);
		Ok(Self { log_format, log_file })
	}

	/// Replaces the values that were given explicitly, e.g. on the command line.
	pub fn with_overrides(mut self, log_format: Option<LogFormat>, log_file: Option<PathBuf>) -> Self {
		if let Some(log_format) = log_format {
			self.log_format = log_format;
		}
		if log_file.is_some() {
			self.log_file = log_file;
		}
		self
	}
}

fn read_env(name: &str) -> Result<Option<String>, anyhow::Error> {
	match env::var(name) {
		Ok(value) => Ok(Some(value)),
		Err(env::VarError::NotPresent) => Ok(None),
		Err(env::VarError::NotUnicode(s)) => Err(anyhow!(
			"value of environment variable {name} is not valid UTF-8: {}",
			s.to_string_lossy()
		)),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_log_format() -> Result<(), anyhow::Error> {
		assert_eq!("text".parse::<LogFormat>()?, LogFormat::Text);
		assert_eq!(" JSON ".parse::<LogFormat>()?, LogFormat::Json);
		assert!("fluentd".parse::<LogFormat>().is_err());
		Ok(())
	}

	#[test]
	fn test_from_env_and_overrides() -> Result<(), anyhow::Error> {
		env::set_var(LOG_FORMAT_ENV, "json");
		env::set_var(LOG_FILE_ENV, "/tmp/tandem.log");
		let config = Config::from_env()?;
		env::remove_var(LOG_FORMAT_ENV);
		env::remove_var(LOG_FILE_ENV);

		assert_eq!(config.log_format, LogFormat::Json);
		assert_eq!(config.log_file, Some(PathBuf::from("/tmp/tandem.log")));

		let config = config.with_overrides(Some(LogFormat::Text), None);
		assert_eq!(config.log_format, LogFormat::Text);
		assert_eq!(config.log_file, Some(PathBuf::from("/tmp/tandem.log")));
		Ok(())
	}
}

use std::path::PathBuf;

/// Errors raised while turning flags and config files into a [`crate::NodeConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("failed to determine the working directory: {0}")]
	WorkingDirectory(#[source] std::io::Error),

	#[error("failed to read {field} file {path}: {source}")]
	ReadFile {
		field: &'static str,
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to parse config file {path}: {reason}")]
	ParseFile { path: PathBuf, reason: String },

	#[error("config file {path} has an unsupported extension, expected .json, .toml, .yaml or .yml")]
	UnsupportedFormat { path: PathBuf },

	#[error("provided multiple network flags: {}", .0.join(", "))]
	ConflictingNetworks(Vec<&'static str>),

	#[error("{set} is set but {missing} is not, set both or neither")]
	ExecutionPairing { set: &'static str, missing: &'static str },

	#[error("{first} and {second} cannot be used together")]
	Conflict { first: &'static str, second: &'static str },

	#[error("{field} is required {reason}")]
	Missing { field: &'static str, reason: &'static str },

	#[error("invalid URL for {field} ({value}): {reason}")]
	InvalidUrl { field: &'static str, value: String, reason: String },

	#[error("genesis-state {value} is neither an existing file nor an http(s) URL: {reason}")]
	InvalidGenesisSource { value: String, reason: String },

	#[error("invalid value for {field}: {reason}")]
	InvalidValue { field: &'static str, reason: String },
}

impl ConfigError {
	/// The flag the error is about, if it is about a single one.
	pub fn field(&self) -> Option<&'static str> {
		match self {
			Self::ReadFile { field, .. }
			| Self::ExecutionPairing { missing: field, .. }
			| Self::Missing { field, .. }
			| Self::InvalidUrl { field, .. }
			| Self::InvalidValue { field, .. } => Some(field),
			Self::ParseFile { .. } | Self::UnsupportedFormat { .. } => Some("config-file"),
			Self::InvalidGenesisSource { .. } => Some("genesis-state"),
			Self::WorkingDirectory(_) | Self::ConflictingNetworks(_) | Self::Conflict { .. } => None,
		}
	}
}

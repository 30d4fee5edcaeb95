use commander::SupervisorError;
use std::fmt;
use tandem_config::ConfigError;

/// A producer failed to build its option set.
#[derive(Debug, thiserror::Error)]
#[error("{collaborator} options: {source:#}")]
pub struct CompositionError {
	pub collaborator: &'static str,
	#[source]
	pub source: anyhow::Error,
}

/// The service that failed to start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupStage {
	Node,
	Signer,
}

impl fmt::Display for StartupStage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Node => f.write_str("starting node"),
			Self::Signer => f.write_str("starting signer"),
		}
	}
}

/// Errors ending a run. Each names the stage it happened in.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
	#[error("resolving config: unexpected arguments: {}", .0.join(" "))]
	Usage(Vec<String>),

	#[error("resolving config: {0}")]
	Config(#[from] ConfigError),

	#[error("composing options: {0}")]
	Composition(#[from] CompositionError),

	#[error("{stage}: {source:#}")]
	Startup {
		stage: StartupStage,
		#[source]
		source: anyhow::Error,
	},

	#[error("running: {0}")]
	ServiceCrashed(#[source] SupervisorError),

	#[error("running: node stopped: {0:#}")]
	Node(#[source] anyhow::Error),

	#[error("shutting down: {0:#}")]
	Shutdown(#[source] anyhow::Error),
}

impl OrchestratorError {
	pub fn stage(&self) -> &'static str {
		match self {
			Self::Usage(_) | Self::Config(_) => "resolving config",
			Self::Composition(_) => "composing options",
			Self::Startup { stage: StartupStage::Node, .. } => "starting node",
			Self::Startup { stage: StartupStage::Signer, .. } => "starting signer",
			Self::ServiceCrashed(_) | Self::Node(_) => "running",
			Self::Shutdown(_) => "shutting down",
		}
	}
}

use crate::node::execution_client;
use crate::node::handle::{NodeFactory, NodeHandle};
use crate::node::options::execution::parse_jwt_secret;
use crate::node::options::ComposedPlan;
use crate::node::settings::NodeSettings;
use anyhow::Context;
use commander::{run_command, Cancellation, ManagedProcess, ProcessSpec, SupervisorError};
use std::path::Path;
use std::time::Duration;
use tandem_config::{ConsensusClientConfig, ExecutionClientConfig, NodeConfig};
use tokio::io::AsyncWriteExt;
use tracing::{error, info, warn};

pub const CONSENSUS_PROCESS_NAME: &str = "consensus client";

/// The consensus client launch: the composed settings as flags, then the passthrough arguments.
pub fn consensus_spec(config: &ConsensusClientConfig, settings: &NodeSettings) -> ProcessSpec {
	ProcessSpec::new(CONSENSUS_PROCESS_NAME, &config.binary)
		.args(settings.to_args())
		.args(config.extra_args.iter().cloned())
}

/// Builds [`ProcessNode`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessNodeFactory;

impl NodeFactory for ProcessNodeFactory {
	type Node = ProcessNode;

	fn build(
		&self,
		config: &NodeConfig,
		plan: ComposedPlan,
		cancel: Cancellation,
	) -> Result<ProcessNode, anyhow::Error> {
		Ok(ProcessNode::new(config, plan.settings(), cancel))
	}
}

/// A node made of external client processes: the execution client, if configured, and the
/// consensus client.
pub struct ProcessNode {
	settings: NodeSettings,
	consensus: ManagedProcess,
	execution: Option<(ExecutionClientConfig, ManagedProcess)>,
	cancel: Cancellation,
	shutdown_timeout: Duration,
}

impl ProcessNode {
	pub fn new(config: &NodeConfig, settings: NodeSettings, cancel: Cancellation) -> Self {
		let consensus = ManagedProcess::new(consensus_spec(&config.consensus_client, &settings));
		let execution = config.execution_client.clone().map(|client| {
			let spec = execution_client::process_spec(&client, settings.jwt_secret_file.as_deref());
			(client, ManagedProcess::new(spec))
		});
		Self {
			settings,
			consensus,
			execution,
			cancel,
			shutdown_timeout: config.shutdown_timeout,
		}
	}
}

impl NodeHandle for ProcessNode {
	async fn start(&mut self) -> Result<(), anyhow::Error> {
		if let (Some(secret), Some(path)) = (&self.settings.jwt_secret, &self.settings.jwt_secret_file)
		{
			write_jwt_secret(path, secret).await?;
		}

		if let Some((client, process)) = &mut self.execution {
			let chain_id = client.genesis_chain_id()?;
			info!("Execution genesis {} has chain id {chain_id}", client.genesis_file.display());
			if client.init_genesis {
				run_command(&client.binary, execution_client::init_args(client))
					.await
					.context("failed to initialize the execution client from genesis")?;
			}
			process.start()?;
		}

		self.consensus.start()?;
		Ok(())
	}

	async fn wait(&mut self) -> Result<(), anyhow::Error> {
		let Self { consensus, execution, cancel, .. } = self;
		let cancel: &Cancellation = cancel;
		let exited = tokio::select! {
			result = consensus.supervise(cancel) => result,
			result = supervise(execution.as_mut().map(|(_, process)| process), cancel) => result,
		};
		exited.map_err(|e| {
			error!("Node process failed: {e}");
			e.into()
		})
	}

	/// Stops the consensus client, then the execution client. Both are always attempted.
	async fn stop(&mut self) -> Result<(), anyhow::Error> {
		let consensus = self.consensus.shutdown(self.shutdown_timeout).await;
		let execution = match &mut self.execution {
			Some((_, process)) => process.shutdown(self.shutdown_timeout).await,
			None => Ok(()),
		};
		consensus.and(execution).map_err(anyhow::Error::new)
	}

	async fn release(&mut self) {
		if let Err(e) = self.stop().await {
			warn!("Failed to release node processes: {e}");
		}
	}
}

async fn supervise(
	process: Option<&mut ManagedProcess>,
	cancel: &Cancellation,
) -> Result<(), SupervisorError> {
	match process {
		Some(process) => process.supervise(cancel).await,
		None => std::future::pending().await,
	}
}

/// Writes the hex secret for the clients unless the file already holds it. Only the owner may
/// read the file.
async fn write_jwt_secret(path: &Path, secret: &[u8; 32]) -> Result<(), anyhow::Error> {
	if let Ok(existing) = tokio::fs::read_to_string(path).await {
		if parse_jwt_secret(existing.trim()).ok().as_ref() == Some(secret) {
			return Ok(());
		}
	}
	if let Some(parent) = path.parent() {
		tokio::fs::create_dir_all(parent)
			.await
			.with_context(|| format!("failed to create {}", parent.display()))?;
	}
	write_private(path, hex::encode(secret).as_bytes())
		.await
		.with_context(|| format!("failed to write JWT secret {}", path.display()))?;
	info!("Wrote JWT secret to {}", path.display());
	Ok(())
}

async fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
	let mut options = tokio::fs::OpenOptions::new();
	options.write(true).create(true).truncate(true);
	#[cfg(unix)]
	options.mode(0o600);
	let mut file = options.open(path).await?;

	// an existing file keeps its mode on open
	#[cfg(unix)]
	{
		use std::os::unix::fs::PermissionsExt;
		file.set_permissions(std::fs::Permissions::from_mode(0o600)).await?;
	}

	file.write_all(contents).await?;
	file.flush().await
}

#[cfg(all(test, unix))]
mod tests {
	use super::*;
	use crate::node::options::OptionComposer;
	use std::os::unix::fs::PermissionsExt;
	use std::path::PathBuf;
	use tandem_config::{ConfigResolver, RawConfig};

	const SECRET: &str = "f1d2d2f924e986ac86fdf7b36c94bcdf32beec15a3a1d9f1d9f3b8f9e3c3b2a1";

	/// A client stand-in that ignores its arguments.
	fn script(dir: &Path, name: &str, body: &str) -> Result<PathBuf, anyhow::Error> {
		let path = dir.join(name);
		std::fs::write(&path, format!("#!/bin/sh\n{body}\n"))?;
		std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
		Ok(path)
	}

	fn node(dir: &Path, raw: RawConfig, cancel: Cancellation) -> Result<ProcessNode, anyhow::Error> {
		let config = ConfigResolver::new(dir).resolve(raw)?;
		let plan = OptionComposer::standard().compose(&config)?;
		ProcessNodeFactory.build(&config, plan, cancel)
	}

	#[tokio::test]
	async fn test_start_and_cancel() -> Result<(), anyhow::Error> {
		let dir = tempfile::tempdir()?;
		let consensus = script(dir.path(), "consensus", "exec sleep 30")?;
		let raw = RawConfig {
			consensus_binary: Some(consensus.display().to_string()),
			shutdown_timeout_secs: Some(5),
			..Default::default()
		};
		let cancel = Cancellation::new();
		let mut node = node(dir.path(), raw, cancel.clone())?;

		node.start().await?;
		assert_eq!(node.consensus.state(), commander::ProcessState::Running);

		cancel.cancel();
		node.wait().await?;
		assert_eq!(node.consensus.state(), commander::ProcessState::Running);
		node.stop().await?;
		assert_eq!(node.consensus.state(), commander::ProcessState::Stopped);
		Ok(())
	}

	#[tokio::test]
	async fn test_consensus_exit_is_a_failure() -> Result<(), anyhow::Error> {
		let dir = tempfile::tempdir()?;
		let consensus = script(dir.path(), "consensus", "exit 2")?;
		let raw = RawConfig {
			consensus_binary: Some(consensus.display().to_string()),
			..Default::default()
		};
		let mut node = node(dir.path(), raw, Cancellation::new())?;

		node.start().await?;
		assert!(node.wait().await.is_err());
		node.stop().await?;
		Ok(())
	}

	#[tokio::test]
	async fn test_execution_client_runs_alongside() -> Result<(), anyhow::Error> {
		let dir = tempfile::tempdir()?;
		std::fs::write(dir.path().join("genesis.json"), r#"{"config": {"chainId": 12345}}"#)?;
		let consensus = script(dir.path(), "consensus", "exec sleep 30")?;
		let execution = script(dir.path(), "geth", "[ \"$3\" = init ] && exit 0\nexec sleep 30")?;
		let raw = RawConfig {
			consensus_binary: Some(consensus.display().to_string()),
			execution_endpoint: Some("http://127.0.0.1:8551".to_string()),
			jwt_secret: Some(SECRET.to_string()),
			execution_client: Some(true),
			execution_client_binary: Some(execution.display().to_string()),
			..Default::default()
		};
		let cancel = Cancellation::new();
		let mut node = node(dir.path(), raw, cancel.clone())?;

		node.start().await?;
		let written = std::fs::read_to_string(dir.path().join("data").join("jwtsecret"))?;
		assert_eq!(written, SECRET);
		let execution = &node.execution.as_ref().expect("execution client").1;
		assert_eq!(execution.state(), commander::ProcessState::Running);

		cancel.cancel();
		node.wait().await?;
		node.stop().await?;
		let execution = &node.execution.as_ref().expect("execution client").1;
		assert_eq!(execution.state(), commander::ProcessState::Stopped);
		Ok(())
	}

	#[tokio::test]
	async fn test_release_after_failed_start() -> Result<(), anyhow::Error> {
		let dir = tempfile::tempdir()?;
		std::fs::write(dir.path().join("genesis.json"), r#"{"config": {"chainId": 12345}}"#)?;
		let execution = script(dir.path(), "geth", "exec sleep 30")?;
		let raw = RawConfig {
			consensus_binary: Some(dir.path().join("missing").display().to_string()),
			execution_endpoint: Some("http://127.0.0.1:8551".to_string()),
			jwt_secret: Some(SECRET.to_string()),
			execution_client: Some(true),
			execution_client_binary: Some(execution.display().to_string()),
			execution_init_genesis: Some(false),
			shutdown_timeout_secs: Some(5),
			..Default::default()
		};
		let mut node = node(dir.path(), raw, Cancellation::new())?;

		assert!(node.start().await.is_err());
		let execution = &node.execution.as_ref().expect("execution client").1;
		assert_eq!(execution.state(), commander::ProcessState::Running);

		node.release().await;
		let execution = &node.execution.as_ref().expect("execution client").1;
		assert_eq!(execution.state(), commander::ProcessState::Stopped);
		Ok(())
	}

	#[tokio::test]
	async fn test_jwt_secret_is_private() -> Result<(), anyhow::Error> {
		let dir = tempfile::tempdir()?;
		let path = dir.path().join("data").join("jwtsecret");

		write_jwt_secret(&path, &[0xab; 32]).await?;
		assert_eq!(std::fs::read_to_string(&path)?, "ab".repeat(32));
		assert_eq!(std::fs::metadata(&path)?.permissions().mode() & 0o777, 0o600);

		std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644))?;
		write_jwt_secret(&path, &[0xcd; 32]).await?;
		assert_eq!(std::fs::read_to_string(&path)?, "cd".repeat(32));
		assert_eq!(std::fs::metadata(&path)?.permissions().mode() & 0o777, 0o600);
		Ok(())
	}

	#[test]
	fn test_consensus_spec_appends_passthrough_args() {
		let config = ConsensusClientConfig {
			binary: PathBuf::from("beacon-chain"),
			extra_args: vec!["--verbosity=debug".to_string()],
		};
		let settings = NodeSettings { chain_id: Some(7), ..Default::default() };
		assert_eq!(
			consensus_spec(&config, &settings).command_line(),
			"beacon-chain --chain-id 7 --verbosity=debug"
		);
	}
}

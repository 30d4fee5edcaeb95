use crate::common_args::LoggingArgs;
use anyhow::Context;
use clap::Parser;
use commander::{listen_for_shutdown, Cancellation, ManagedProcess, ProcessSpec};
use tandem_config::{ConfigResolver, NodeArgs, SignerConfig};
use tracing::{info, warn};

pub const PROCESS_NAME: &str = "signer";

/// The signer launch: keystore, chain id, IPC endpoint, config directory and rules file, in
/// that order.
pub fn process_spec(config: &SignerConfig) -> ProcessSpec {
	ProcessSpec::new(PROCESS_NAME, &config.binary).args([
		"--keystore".to_string(),
		config.keystore_dir.display().to_string(),
		"--chainid".to_string(),
		config.chain_id.to_string(),
		"--ipcpath".to_string(),
		config.ipc_path.display().to_string(),
		"--configdir".to_string(),
		config.config_dir.display().to_string(),
		"--rules".to_string(),
		config.rules_file.display().to_string(),
	])
}

#[derive(Debug, Parser, Clone)]
#[clap(rename_all = "kebab-case", about = "Runs the external transaction signer until a shutdown signal")]
pub struct Signer {
	#[clap(flatten)]
	pub logging: LoggingArgs,

	#[clap(flatten)]
	pub node_args: NodeArgs,
}

impl Signer {
	pub async fn execute(&self) -> Result<(), anyhow::Error> {
		let mut node_args = self.node_args.clone();
		node_args.signer = true;
		let config = ConfigResolver::from_current_dir()?.resolve_args(&node_args)?;
		let signer = config.signer.as_ref().context("signer is not configured")?;

		let cancel = Cancellation::new();
		let listener = listen_for_shutdown(cancel.clone())?;

		let mut process = ManagedProcess::launch(process_spec(signer))?;
		let supervised = process.supervise(&cancel).await;
		if supervised.is_ok() {
			info!("Received shutdown signal");
		}
		cancel.cancel();
		listener.abort();

		if let Err(e) = process.shutdown(config.shutdown_timeout).await {
			warn!("Signer did not shut down cleanly: {e}");
			return Err(e.into());
		}
		supervised?;
		Ok(())
	}
}

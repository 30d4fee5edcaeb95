use crate::common_args::LoggingArgs;
use crate::node::{NodeOrchestrator, SignerCrashPolicy};
use clap::Parser;
use commander::listen_for_shutdown;
use tandem_config::{ConfigResolver, NodeArgs};

#[derive(Debug, Parser, Clone)]
#[clap(rename_all = "kebab-case", about = "Runs the Tandem node until a shutdown signal")]
pub struct Run {
	#[clap(flatten)]
	pub logging: LoggingArgs,

	#[clap(flatten)]
	pub node_args: NodeArgs,

	/// Keep the node running when the signer exits instead of shutting everything down.
	#[clap(long, env = "TANDEM_KEEP_NODE_ON_SIGNER_CRASH")]
	pub keep_node_on_signer_crash: bool,

	/// Not accepted, every setting is a flag.
	#[clap(hide = true)]
	pub positional_args: Vec<String>,
}

impl Run {
	pub fn crash_policy(&self) -> SignerCrashPolicy {
		if self.keep_node_on_signer_crash {
			SignerCrashPolicy::KeepNode
		} else {
			SignerCrashPolicy::ShutdownNode
		}
	}

	pub async fn execute(&self) -> Result<(), anyhow::Error> {
		let resolver = ConfigResolver::from_current_dir()?;
		let orchestrator = NodeOrchestrator::standard().with_crash_policy(self.crash_policy());
		let listener = listen_for_shutdown(orchestrator.cancellation())?;

		let result = match orchestrator
			.resolve_and_run(&resolver, &self.node_args, &self.positional_args)
			.await
		{
			Ok(running) => running.wait().await,
			Err(e) => Err(e),
		};
		listener.abort();

		result?;
		Ok(())
	}
}

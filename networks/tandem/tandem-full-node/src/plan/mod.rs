use crate::common_args::LoggingArgs;
use crate::node::{execution_client, process_node, OptionComposer};
use crate::signer;
use clap::Parser;
use commander::ProcessSpec;
use tandem_config::{ConfigResolver, NodeArgs};
use tracing::info;

#[derive(Debug, Parser, Clone)]
#[clap(
	rename_all = "kebab-case",
	about = "Prints the client command lines a run would use, without starting anything"
)]
pub struct Plan {
	#[clap(flatten)]
	pub logging: LoggingArgs,

	#[clap(flatten)]
	pub node_args: NodeArgs,
}

impl Plan {
	pub async fn execute(&self) -> Result<(), anyhow::Error> {
		let config = ConfigResolver::from_current_dir()?.resolve_args(&self.node_args)?;
		let plan = OptionComposer::standard().compose(&config)?;
		info!("Options: {}", plan.option_names().join(", "));

		let settings = plan.settings();
		let mut launches = Vec::new();
		if let Some(client) = &config.execution_client {
			if client.init_genesis {
				launches.push(
					ProcessSpec::new("execution client init", &client.binary)
						.args(execution_client::init_args(client)),
				);
			}
			launches.push(execution_client::process_spec(client, settings.jwt_secret_file.as_deref()));
		}
		launches.push(process_node::consensus_spec(&config.consensus_client, &settings));
		if let Some(signer) = &config.signer {
			launches.push(signer::process_spec(signer));
		}

		for spec in launches {
			println!("{}: {}", spec.name, spec.command_line());
		}
		Ok(())
	}
}

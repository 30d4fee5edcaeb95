pub mod common_args;
pub mod node;
pub mod plan;
pub mod run;
pub mod signer;

#[cfg(test)]
pub mod tests;

use clap::Parser;
use common_args::LoggingArgs;

#[derive(Parser)]
#[clap(rename_all = "kebab-case", version)]
pub enum TandemFullNode {
	Run(run::Run),
	Signer(signer::Signer),
	Plan(plan::Plan),
}

impl TandemFullNode {
	pub fn logging(&self) -> &LoggingArgs {
		match self {
			Self::Run(run) => &run.logging,
			Self::Signer(signer) => &signer.logging,
			Self::Plan(plan) => &plan.logging,
		}
	}

	pub async fn execute(&self) -> Result<(), anyhow::Error> {
		match self {
			Self::Run(run) => run.execute().await,
			Self::Signer(signer) => signer.execute().await,
			Self::Plan(plan) => plan.execute().await,
		}
	}
}

#![forbid(unsafe_code)]

use clap::*;
use std::process::ExitCode;
use tandem_full_node::TandemFullNode;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
	let full_node = TandemFullNode::parse();

	let tracing_config = match full_node.logging().tracing_config() {
		Ok(config) => config,
		Err(e) => {
			eprintln!("Invalid logging configuration: {e:#}");
			return ExitCode::FAILURE;
		}
	};
	let _guard = match tandem_tracing::init_tracing_subscriber(
		env!("CARGO_BIN_NAME"),
		env!("CARGO_PKG_VERSION"),
		&tracing_config,
	) {
		Ok(guard) => guard,
		Err(e) => {
			eprintln!("Failed to set up logging: {e:#}");
			return ExitCode::FAILURE;
		}
	};

	match full_node.execute().await {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			error!("{e:#}");
			ExitCode::FAILURE
		}
	}
}

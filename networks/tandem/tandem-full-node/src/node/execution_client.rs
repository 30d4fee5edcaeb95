use commander::ProcessSpec;
use std::path::Path;
use tandem_config::ExecutionClientConfig;

pub const PROCESS_NAME: &str = "execution client";

/// Arguments initializing the execution client's database from the genesis JSON.
pub fn init_args(config: &ExecutionClientConfig) -> Vec<String> {
	vec![
		"--datadir".to_string(),
		config.data_dir.display().to_string(),
		"init".to_string(),
		config.genesis_file.display().to_string(),
	]
}

/// The long-running execution client. Discovery is off, peers are added explicitly.
pub fn process_spec(config: &ExecutionClientConfig, jwt_secret_file: Option<&Path>) -> ProcessSpec {
	let mut spec = ProcessSpec::new(PROCESS_NAME, &config.binary).args([
		"--datadir".to_string(),
		config.data_dir.display().to_string(),
		"--networkid".to_string(),
		config.network_id.to_string(),
		"--port".to_string(),
		config.p2p_port.to_string(),
		"--nodiscover".to_string(),
		"--http".to_string(),
		"--http.addr".to_string(),
		config.http_addr.clone(),
		"--http.port".to_string(),
		config.http_port.to_string(),
		"--http.corsdomain".to_string(),
		config.http_cors_domains.join(","),
		"--http.api".to_string(),
		config.http_modules.join(","),
		"--authrpc.addr".to_string(),
		config.authrpc_addr.clone(),
		"--authrpc.port".to_string(),
		config.authrpc_port.to_string(),
		"--authrpc.vhosts".to_string(),
		config.authrpc_vhosts.join(","),
	]);
	if let Some(path) = jwt_secret_file {
		spec = spec.arg("--authrpc.jwtsecret").arg(path.display().to_string());
	}
	spec
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::path::PathBuf;
	use tandem_config::{ConfigResolver, RawConfig};

	fn config() -> ExecutionClientConfig {
		let raw = RawConfig {
			execution_endpoint: Some("http://127.0.0.1:8551".to_string()),
			jwt_secret: Some("jwtsecret".to_string()),
			execution_client: Some(true),
			..Default::default()
		};
		ConfigResolver::new("/srv/tandem")
			.resolve(raw)
			.expect("config resolves")
			.execution_client
			.expect("execution client configured")
	}

	#[test]
	fn test_init_args() {
		assert_eq!(
			init_args(&config()),
			vec!["--datadir", "/srv/tandem/data/execution", "init", "/srv/tandem/genesis.json"]
		);
	}

	#[test]
	fn test_process_spec() {
		let spec = process_spec(&config(), Some(Path::new("/srv/tandem/jwtsecret")));
		assert_eq!(spec.program, PathBuf::from("geth"));
		assert_eq!(
			spec.command_line(),
			"geth --datadir /srv/tandem/data/execution --networkid 12345 --port 12345 --nodiscover \
			--http --http.addr 127.0.0.1 --http.port 8545 --http.corsdomain * --http.api eth,net,web3 \
			--authrpc.addr 127.0.0.1 --authrpc.port 8551 --authrpc.vhosts * \
			--authrpc.jwtsecret /srv/tandem/jwtsecret"
		);
	}
}

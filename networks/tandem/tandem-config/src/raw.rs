use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Unvalidated configuration, as given on the command line or in a config file.
///
/// Keys are the flag names, so a config file reads like the command line it replaces:
///
/// ```yaml
/// datadir: data
/// execution-endpoint: http://127.0.0.1:8551
/// jwt-secret: jwtsecret
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RawConfig {
	#[serde(rename = "datadir")]
	pub data_dir: Option<String>,
	pub chain_config_file: Option<String>,
	pub mainnet: Option<bool>,
	pub sepolia: Option<bool>,
	pub holesky: Option<bool>,
	pub chain_id: Option<u64>,
	pub network_id: Option<u64>,

	pub execution_endpoint: Option<String>,
	pub jwt_secret: Option<String>,
	pub jwt_id: Option<String>,
	pub execution_headers: Option<String>,

	pub genesis_state: Option<String>,

	pub checkpoint_sync_url: Option<String>,
	pub checkpoint_block: Option<String>,
	pub checkpoint_state: Option<String>,

	pub blob_path: Option<String>,
	pub blob_retention_epochs: Option<u64>,
	pub beacon_db_pruning: Option<bool>,
	pub pruner_retention_epochs: Option<u64>,

	pub enable_experimental_backfill: Option<bool>,
	pub backfill_batch_size: Option<u64>,
	pub backfill_worker_count: Option<u64>,
	pub backfill_oldest_slot: Option<u64>,

	pub http_mev_relay: Option<String>,
	pub max_builder_consecutive_missed_slots: Option<u64>,
	pub max_builder_epoch_missed_slots: Option<u64>,
	pub local_block_value_boost: Option<u64>,
	pub min_builder_bid: Option<u64>,

	pub suggested_fee_recipient: Option<String>,
	pub weak_subjectivity_checkpoint: Option<String>,

	pub consensus_binary: Option<String>,
	pub consensus_args: Option<Vec<String>>,

	pub execution_client: Option<bool>,
	pub execution_client_binary: Option<String>,
	pub execution_client_datadir: Option<String>,
	pub execution_genesis: Option<String>,
	pub execution_network_id: Option<u64>,
	pub execution_p2p_port: Option<u16>,
	pub execution_http_addr: Option<String>,
	pub execution_http_port: Option<u16>,
	pub execution_authrpc_addr: Option<String>,
	pub execution_authrpc_port: Option<u16>,
	pub execution_init_genesis: Option<bool>,

	pub signer: Option<bool>,
	pub signer_binary: Option<String>,
	pub signer_keystore: Option<String>,
	pub signer_chain_id: Option<u64>,
	pub signer_ipc_path: Option<String>,
	pub signer_config_dir: Option<String>,
	pub signer_rules: Option<String>,

	pub shutdown_timeout_secs: Option<u64>,
}

macro_rules! prefer_fields {
	($primary:ident, $fallback:ident; $($field:ident),* $(,)?) => {
		RawConfig { $($field: $primary.$field.or($fallback.$field)),* }
	};
}

impl RawConfig {
	/// Loads a config file, picking the format from the file extension.
	pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
		let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
			field: "config-file",
			path: path.to_path_buf(),
			source,
		})?;
		let parse_error =
			|reason: String| ConfigError::ParseFile { path: path.to_path_buf(), reason };

		let extension = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
		match extension.as_deref() {
			Some("json") => serde_json::from_str(&contents).map_err(|e| parse_error(e.to_string())),
			Some("toml") => toml::from_str(&contents).map_err(|e| parse_error(e.to_string())),
			Some("yaml") | Some("yml") => {
				serde_yaml::from_str(&contents).map_err(|e| parse_error(e.to_string()))
			}
			_ => Err(ConfigError::UnsupportedFormat { path: path.to_path_buf() }),
		}
	}

	/// Fills every unset value of `self` from `fallback`.
	pub fn or(self, fallback: RawConfig) -> RawConfig {
		let primary = self;
		prefer_fields!(primary, fallback;
			data_dir, chain_config_file, mainnet, sepolia, holesky, chain_id, network_id,
			execution_endpoint, jwt_secret, jwt_id, execution_headers,
			genesis_state,
			checkpoint_sync_url, checkpoint_block, checkpoint_state,
			blob_path, blob_retention_epochs, beacon_db_pruning, pruner_retention_epochs,
			enable_experimental_backfill, backfill_batch_size, backfill_worker_count, backfill_oldest_slot,
			http_mev_relay, max_builder_consecutive_missed_slots, max_builder_epoch_missed_slots,
			local_block_value_boost, min_builder_bid,
			suggested_fee_recipient, weak_subjectivity_checkpoint,
			consensus_binary, consensus_args,
			execution_client, execution_client_binary, execution_client_datadir, execution_genesis,
			execution_network_id, execution_p2p_port, execution_http_addr, execution_http_port,
			execution_authrpc_addr, execution_authrpc_port, execution_init_genesis,
			signer, signer_binary, signer_keystore, signer_chain_id, signer_ipc_path,
			signer_config_dir, signer_rules,
			shutdown_timeout_secs,
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
		let path = dir.join(name);
		let mut file = std::fs::File::create(&path).unwrap();
		file.write_all(contents.as_bytes()).unwrap();
		path
	}

	#[test]
	fn test_load_yaml_toml_and_json() -> Result<(), anyhow::Error> {
		let dir = tempfile::tempdir()?;
		let yaml = write_file(
			dir.path(),
			"node.yaml",
			"datadir: data\nexecution-endpoint: http://127.0.0.1:8551\nholesky: true\n",
		);
		let toml = write_file(
			dir.path(),
			"node.toml",
			"datadir = \"data\"\nexecution-endpoint = \"http://127.0.0.1:8551\"\nholesky = true\n",
		);
		let json = write_file(
			dir.path(),
			"node.json",
			r#"{"datadir": "data", "execution-endpoint": "http://127.0.0.1:8551", "holesky": true}"#,
		);

		let expected = RawConfig {
			data_dir: Some("data".to_string()),
			execution_endpoint: Some("http://127.0.0.1:8551".to_string()),
			holesky: Some(true),
			..Default::default()
		};
		assert_eq!(RawConfig::from_file(&yaml)?, expected);
		assert_eq!(RawConfig::from_file(&toml)?, expected);
		assert_eq!(RawConfig::from_file(&json)?, expected);
		Ok(())
	}

	#[test]
	fn test_unknown_keys_are_rejected() -> Result<(), anyhow::Error> {
		let dir = tempfile::tempdir()?;
		let path = write_file(dir.path(), "node.yaml", "data-dirr: data\n");
		let err = RawConfig::from_file(&path).unwrap_err();
		assert!(matches!(err, ConfigError::ParseFile { .. }), "{err}");
		Ok(())
	}

	#[test]
	fn test_unsupported_extension_and_missing_file() -> Result<(), anyhow::Error> {
		let dir = tempfile::tempdir()?;
		let path = write_file(dir.path(), "node.ini", "datadir=data\n");
		assert!(matches!(
			RawConfig::from_file(&path),
			Err(ConfigError::UnsupportedFormat { .. })
		));
		assert!(matches!(
			RawConfig::from_file(&dir.path().join("missing.yaml")),
			Err(ConfigError::ReadFile { field: "config-file", .. })
		));
		Ok(())
	}

	#[test]
	fn test_primary_values_win() {
		let cli = RawConfig { data_dir: Some("cli".to_string()), ..Default::default() };
		let file = RawConfig {
			data_dir: Some("file".to_string()),
			jwt_secret: Some("jwtsecret".to_string()),
			..Default::default()
		};

		let merged = cli.or(file);
		assert_eq!(merged.data_dir.as_deref(), Some("cli"));
		assert_eq!(merged.jwt_secret.as_deref(), Some("jwtsecret"));
	}
}

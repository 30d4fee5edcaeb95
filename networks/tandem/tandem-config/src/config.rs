use crate::ConfigError;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_CONSENSUS_BINARY: &str = "beacon-chain";
pub const DEFAULT_BLOB_RETENTION_EPOCHS: u64 = 4096;
pub const DEFAULT_BACKFILL_BATCH_SIZE: u64 = 32;
pub const DEFAULT_BACKFILL_WORKER_COUNT: u64 = 2;
pub const DEFAULT_MAX_BUILDER_CONSECUTIVE_MISSED_SLOTS: u64 = 3;
pub const DEFAULT_MAX_BUILDER_EPOCH_MISSED_SLOTS: u64 = 5;
pub const DEFAULT_LOCAL_BLOCK_VALUE_BOOST: u64 = 10;
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

pub const DEFAULT_EXECUTION_CLIENT_BINARY: &str = "geth";
pub const DEFAULT_EXECUTION_GENESIS: &str = "genesis.json";
pub const DEFAULT_EXECUTION_NETWORK_ID: u64 = 12345;
pub const DEFAULT_EXECUTION_P2P_PORT: u16 = 12345;
pub const DEFAULT_EXECUTION_HTTP_ADDR: &str = "127.0.0.1";
pub const DEFAULT_EXECUTION_HTTP_PORT: u16 = 8545;
pub const DEFAULT_EXECUTION_AUTHRPC_ADDR: &str = "127.0.0.1";
pub const DEFAULT_EXECUTION_AUTHRPC_PORT: u16 = 8551;

pub const DEFAULT_SIGNER_BINARY: &str = "clef";
pub const DEFAULT_SIGNER_CHAIN_ID: u64 = 12345;
pub const DEFAULT_SIGNER_RULES: &str = "config/signer_rules.js";

/// Network the consensus client joins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Network {
	#[default]
	Mainnet,
	Sepolia,
	Holesky,
}

impl Network {
	pub fn flag_name(&self) -> &'static str {
		match self {
			Self::Mainnet => "mainnet",
			Self::Sepolia => "sepolia",
			Self::Holesky => "holesky",
		}
	}
}

/// The shared secret authenticating the Engine API connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JwtSecret {
	/// A file holding the hex secret.
	File(PathBuf),
	/// The hex secret itself.
	Inline(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionEngine {
	pub endpoint: Url,
	pub jwt_secret: JwtSecret,
	pub jwt_id: Option<String>,
	pub headers: Vec<(String, String)>,
}

/// Where the genesis state comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenesisSource {
	File(PathBuf),
	Remote(Url),
}

/// Where checkpoint sync starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckpointSource {
	Remote(Url),
	/// Local block and state files. Both are needed; a missing side is reported when the
	/// checkpoint options are built.
	Files { block: Option<PathBuf>, state: Option<PathBuf> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
	pub blob_path: PathBuf,
	pub blob_retention_epochs: u64,
	pub db_pruning: bool,
	/// `None` leaves the client's own retention in place.
	pub pruner_retention_epochs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackfillConfig {
	pub enabled: bool,
	pub batch_size: u64,
	pub worker_count: u64,
	pub oldest_slot: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderConfig {
	pub relay_endpoint: Option<Url>,
	pub max_consecutive_missed_slots: u64,
	pub max_epoch_missed_slots: u64,
	pub local_block_value_boost: u64,
	pub min_bid: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockchainConfig {
	pub suggested_fee_recipient: Option<String>,
	pub weak_subjectivity_checkpoint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsensusClientConfig {
	/// Bare program names are looked up on `PATH`.
	pub binary: PathBuf,
	/// Appended verbatim after the generated flags.
	pub extra_args: Vec<String>,
}

/// The execution client launched next to the consensus client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionClientConfig {
	pub binary: PathBuf,
	pub data_dir: PathBuf,
	pub genesis_file: PathBuf,
	pub network_id: u64,
	pub p2p_port: u16,
	pub http_addr: String,
	pub http_port: u16,
	pub http_cors_domains: Vec<String>,
	pub http_modules: Vec<String>,
	pub authrpc_addr: String,
	pub authrpc_port: u16,
	pub authrpc_vhosts: Vec<String>,
	pub init_genesis: bool,
}

#[derive(Deserialize)]
struct GenesisHeader {
	config: ChainConfigHeader,
}

#[derive(Deserialize)]
struct ChainConfigHeader {
	#[serde(rename = "chainId")]
	chain_id: u64,
}

impl ExecutionClientConfig {
	/// Reads the chain id out of the genesis JSON, which also checks that the file is usable.
	pub fn genesis_chain_id(&self) -> Result<u64, ConfigError> {
		let contents = std::fs::read_to_string(&self.genesis_file).map_err(|source| {
			ConfigError::ReadFile {
				field: "execution-genesis",
				path: self.genesis_file.clone(),
				source,
			}
		})?;
		let genesis: GenesisHeader =
			serde_json::from_str(&contents).map_err(|e| ConfigError::InvalidValue {
				field: "execution-genesis",
				reason: format!("{}: {e}", self.genesis_file.display()),
			})?;
		Ok(genesis.config.chain_id)
	}
}

/// The external transaction signer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerConfig {
	/// Bare program names are looked up on `PATH`.
	pub binary: PathBuf,
	pub keystore_dir: PathBuf,
	pub chain_id: u64,
	pub ipc_path: PathBuf,
	pub config_dir: PathBuf,
	pub rules_file: PathBuf,
}

/// Resolved, immutable configuration for one run.
///
/// Every path is absolute. The execution endpoint and its JWT secret are either both present
/// (`execution` is `Some`) or both absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
	pub data_dir: PathBuf,
	pub chain_config_file: Option<PathBuf>,
	pub network: Network,
	pub chain_id: Option<u64>,
	pub network_id: Option<u64>,
	pub execution: Option<ExecutionEngine>,
	pub genesis: Option<GenesisSource>,
	pub checkpoint: Option<CheckpointSource>,
	pub storage: StorageConfig,
	pub backfill: BackfillConfig,
	pub builder: BuilderConfig,
	pub blockchain: BlockchainConfig,
	pub consensus_client: ConsensusClientConfig,
	pub execution_client: Option<ExecutionClientConfig>,
	pub signer: Option<SignerConfig>,
	pub shutdown_timeout: Duration,
}

#[cfg(test)]
mod tests {
	use super::*;

	fn execution_client(genesis_file: PathBuf) -> ExecutionClientConfig {
		ExecutionClientConfig {
			binary: PathBuf::from(DEFAULT_EXECUTION_CLIENT_BINARY),
			data_dir: PathBuf::from("/tmp/execution"),
			genesis_file,
			network_id: DEFAULT_EXECUTION_NETWORK_ID,
			p2p_port: DEFAULT_EXECUTION_P2P_PORT,
			http_addr: DEFAULT_EXECUTION_HTTP_ADDR.to_string(),
			http_port: DEFAULT_EXECUTION_HTTP_PORT,
			http_cors_domains: vec!["*".to_string()],
			http_modules: vec!["eth".to_string()],
			authrpc_addr: DEFAULT_EXECUTION_AUTHRPC_ADDR.to_string(),
			authrpc_port: DEFAULT_EXECUTION_AUTHRPC_PORT,
			authrpc_vhosts: vec!["*".to_string()],
			init_genesis: true,
		}
	}

	#[test]
	fn test_genesis_chain_id() -> Result<(), anyhow::Error> {
		let dir = tempfile::tempdir()?;
		let path = dir.path().join("genesis.json");
		std::fs::write(&path, r#"{"config": {"chainId": 12345, "homesteadBlock": 0}, "alloc": {}}"#)?;
		assert_eq!(execution_client(path).genesis_chain_id()?, 12345);
		Ok(())
	}

	#[test]
	fn test_genesis_without_chain_id_is_rejected() -> Result<(), anyhow::Error> {
		let dir = tempfile::tempdir()?;
		let path = dir.path().join("genesis.json");
		std::fs::write(&path, r#"{"config": {}, "alloc": {}}"#)?;
		let err = execution_client(path).genesis_chain_id().unwrap_err();
		assert_eq!(err.field(), Some("execution-genesis"));

		let missing = execution_client(dir.path().join("missing.json"));
		assert!(matches!(missing.genesis_chain_id(), Err(ConfigError::ReadFile { .. })));
		Ok(())
	}
}

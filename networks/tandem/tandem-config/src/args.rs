use crate::RawConfig;
use clap::Args;
use std::path::PathBuf;

/// Flags shared by every command that needs a [`crate::NodeConfig`].
///
/// This is the only place flags are mapped to configuration fields. Every flag can also be set
/// through its `TANDEM_*` environment variable or through `--config-file`, with the command line
/// taking precedence over the file.
#[derive(Debug, Clone, Default, Args)]
#[clap(rename_all = "kebab-case")]
pub struct NodeArgs {
	/// Load flag values from a JSON, TOML or YAML file.
	#[clap(long, env = "TANDEM_CONFIG_FILE")]
	pub config_file: Option<PathBuf>,

	/// Data directory for the databases.
	#[clap(long = "datadir", env = "TANDEM_DATADIR")]
	pub data_dir: Option<String>,

	/// Chain configuration file of a custom network.
	#[clap(long, env = "TANDEM_CHAIN_CONFIG_FILE")]
	pub chain_config_file: Option<String>,

	/// Run on Ethereum mainnet.
	#[clap(long, env = "TANDEM_MAINNET")]
	pub mainnet: bool,

	/// Run on the Sepolia test network.
	#[clap(long, env = "TANDEM_SEPOLIA")]
	pub sepolia: bool,

	/// Run on the Holesky test network.
	#[clap(long, env = "TANDEM_HOLESKY")]
	pub holesky: bool,

	#[clap(long, env = "TANDEM_CHAIN_ID")]
	pub chain_id: Option<u64>,

	#[clap(long, env = "TANDEM_NETWORK_ID")]
	pub network_id: Option<u64>,

	/// Engine API endpoint of the execution client, or a file containing it.
	#[clap(long, env = "TANDEM_EXECUTION_ENDPOINT")]
	pub execution_endpoint: Option<String>,

	/// Hex JWT secret shared with the execution client, or a file containing it.
	#[clap(long, env = "TANDEM_JWT_SECRET")]
	pub jwt_secret: Option<String>,

	/// Identifier sent in the JWT claims.
	#[clap(long, env = "TANDEM_JWT_ID")]
	pub jwt_id: Option<String>,

	/// Extra Engine API headers as comma-separated key=value pairs.
	#[clap(long, env = "TANDEM_EXECUTION_HEADERS")]
	pub execution_headers: Option<String>,

	/// Genesis state file, or a beacon API URL to fetch it from.
	#[clap(long, env = "TANDEM_GENESIS_STATE")]
	pub genesis_state: Option<String>,

	/// Beacon API URL to checkpoint sync from.
	#[clap(long, env = "TANDEM_CHECKPOINT_SYNC_URL")]
	pub checkpoint_sync_url: Option<String>,

	#[clap(long, env = "TANDEM_CHECKPOINT_BLOCK")]
	pub checkpoint_block: Option<String>,

	#[clap(long, env = "TANDEM_CHECKPOINT_STATE")]
	pub checkpoint_state: Option<String>,

	#[clap(long, env = "TANDEM_BLOB_PATH")]
	pub blob_path: Option<String>,

	#[clap(long, env = "TANDEM_BLOB_RETENTION_EPOCHS")]
	pub blob_retention_epochs: Option<u64>,

	#[clap(long, env = "TANDEM_BEACON_DB_PRUNING")]
	pub beacon_db_pruning: bool,

	#[clap(long, env = "TANDEM_PRUNER_RETENTION_EPOCHS")]
	pub pruner_retention_epochs: Option<u64>,

	#[clap(long, env = "TANDEM_ENABLE_EXPERIMENTAL_BACKFILL")]
	pub enable_experimental_backfill: bool,

	#[clap(long, env = "TANDEM_BACKFILL_BATCH_SIZE")]
	pub backfill_batch_size: Option<u64>,

	#[clap(long, env = "TANDEM_BACKFILL_WORKER_COUNT")]
	pub backfill_worker_count: Option<u64>,

	#[clap(long, env = "TANDEM_BACKFILL_OLDEST_SLOT")]
	pub backfill_oldest_slot: Option<u64>,

	/// Builder relay URL.
	#[clap(long, env = "TANDEM_HTTP_MEV_RELAY")]
	pub http_mev_relay: Option<String>,

	#[clap(long, env = "TANDEM_MAX_BUILDER_CONSECUTIVE_MISSED_SLOTS")]
	pub max_builder_consecutive_missed_slots: Option<u64>,

	#[clap(long, env = "TANDEM_MAX_BUILDER_EPOCH_MISSED_SLOTS")]
	pub max_builder_epoch_missed_slots: Option<u64>,

	#[clap(long, env = "TANDEM_LOCAL_BLOCK_VALUE_BOOST")]
	pub local_block_value_boost: Option<u64>,

	#[clap(long, env = "TANDEM_MIN_BUILDER_BID")]
	pub min_builder_bid: Option<u64>,

	#[clap(long, env = "TANDEM_SUGGESTED_FEE_RECIPIENT")]
	pub suggested_fee_recipient: Option<String>,

	/// Weak subjectivity checkpoint as `0x<block root>:<epoch>`.
	#[clap(long, env = "TANDEM_WEAK_SUBJECTIVITY_CHECKPOINT")]
	pub weak_subjectivity_checkpoint: Option<String>,

	/// Consensus client executable.
	#[clap(long, env = "TANDEM_CONSENSUS_BINARY")]
	pub consensus_binary: Option<String>,

	/// Extra arguments handed to the consensus client as-is.
	#[clap(
		long = "consensus-arg",
		env = "TANDEM_CONSENSUS_ARGS",
		value_delimiter = ',',
		allow_hyphen_values = true
	)]
	pub consensus_args: Vec<String>,

	/// Also launch and supervise the execution client.
	#[clap(long, env = "TANDEM_EXECUTION_CLIENT")]
	pub execution_client: bool,

	#[clap(long, env = "TANDEM_EXECUTION_CLIENT_BINARY")]
	pub execution_client_binary: Option<String>,

	#[clap(long, env = "TANDEM_EXECUTION_CLIENT_DATADIR")]
	pub execution_client_datadir: Option<String>,

	/// Genesis JSON of the execution chain.
	#[clap(long, env = "TANDEM_EXECUTION_GENESIS")]
	pub execution_genesis: Option<String>,

	#[clap(long, env = "TANDEM_EXECUTION_NETWORK_ID")]
	pub execution_network_id: Option<u64>,

	#[clap(long, env = "TANDEM_EXECUTION_P2P_PORT")]
	pub execution_p2p_port: Option<u16>,

	#[clap(long, env = "TANDEM_EXECUTION_HTTP_ADDR")]
	pub execution_http_addr: Option<String>,

	#[clap(long, env = "TANDEM_EXECUTION_HTTP_PORT")]
	pub execution_http_port: Option<u16>,

	#[clap(long, env = "TANDEM_EXECUTION_AUTHRPC_ADDR")]
	pub execution_authrpc_addr: Option<String>,

	#[clap(long, env = "TANDEM_EXECUTION_AUTHRPC_PORT")]
	pub execution_authrpc_port: Option<u16>,

	/// Initialize the execution client's database from the genesis JSON before starting it.
	#[clap(long, env = "TANDEM_EXECUTION_INIT_GENESIS")]
	pub execution_init_genesis: Option<bool>,

	/// Launch and supervise the external transaction signer.
	#[clap(long, env = "TANDEM_SIGNER")]
	pub signer: bool,

	#[clap(long, env = "TANDEM_SIGNER_BINARY")]
	pub signer_binary: Option<String>,

	#[clap(long, env = "TANDEM_SIGNER_KEYSTORE")]
	pub signer_keystore: Option<String>,

	#[clap(long, env = "TANDEM_SIGNER_CHAIN_ID")]
	pub signer_chain_id: Option<u64>,

	#[clap(long, env = "TANDEM_SIGNER_IPC_PATH")]
	pub signer_ipc_path: Option<String>,

	#[clap(long, env = "TANDEM_SIGNER_CONFIG_DIR")]
	pub signer_config_dir: Option<String>,

	/// Rules file evaluated by the signer for every request.
	#[clap(long, env = "TANDEM_SIGNER_RULES")]
	pub signer_rules: Option<String>,

	/// Seconds a process gets to exit after a termination request before it is killed.
	#[clap(long, env = "TANDEM_SHUTDOWN_TIMEOUT_SECS")]
	pub shutdown_timeout_secs: Option<u64>,
}

impl NodeArgs {
	/// The values set by these flags. Unset flags, including switches left off, stay `None` so
	/// a config file can still provide them.
	pub fn to_raw(&self) -> RawConfig {
		RawConfig {
			data_dir: self.data_dir.clone(),
			chain_config_file: self.chain_config_file.clone(),
			mainnet: self.mainnet.then_some(true),
			sepolia: self.sepolia.then_some(true),
			holesky: self.holesky.then_some(true),
			chain_id: self.chain_id,
			network_id: self.network_id,
			execution_endpoint: self.execution_endpoint.clone(),
			jwt_secret: self.jwt_secret.clone(),
			jwt_id: self.jwt_id.clone(),
			execution_headers: self.execution_headers.clone(),
			genesis_state: self.genesis_state.clone(),
			checkpoint_sync_url: self.checkpoint_sync_url.clone(),
			checkpoint_block: self.checkpoint_block.clone(),
			checkpoint_state: self.checkpoint_state.clone(),
			blob_path: self.blob_path.clone(),
			blob_retention_epochs: self.blob_retention_epochs,
			beacon_db_pruning: self.beacon_db_pruning.then_some(true),
			pruner_retention_epochs: self.pruner_retention_epochs,
			enable_experimental_backfill: self.enable_experimental_backfill.then_some(true),
			backfill_batch_size: self.backfill_batch_size,
			backfill_worker_count: self.backfill_worker_count,
			backfill_oldest_slot: self.backfill_oldest_slot,
			http_mev_relay: self.http_mev_relay.clone(),
			max_builder_consecutive_missed_slots: self.max_builder_consecutive_missed_slots,
			max_builder_epoch_missed_slots: self.max_builder_epoch_missed_slots,
			local_block_value_boost: self.local_block_value_boost,
			min_builder_bid: self.min_builder_bid,
			suggested_fee_recipient: self.suggested_fee_recipient.clone(),
			weak_subjectivity_checkpoint: self.weak_subjectivity_checkpoint.clone(),
			consensus_binary: self.consensus_binary.clone(),
			consensus_args: (!self.consensus_args.is_empty()).then(|| self.consensus_args.clone()),
			execution_client: self.execution_client.then_some(true),
			execution_client_binary: self.execution_client_binary.clone(),
			execution_client_datadir: self.execution_client_datadir.clone(),
			execution_genesis: self.execution_genesis.clone(),
			execution_network_id: self.execution_network_id,
			execution_p2p_port: self.execution_p2p_port,
			execution_http_addr: self.execution_http_addr.clone(),
			execution_http_port: self.execution_http_port,
			execution_authrpc_addr: self.execution_authrpc_addr.clone(),
			execution_authrpc_port: self.execution_authrpc_port,
			execution_init_genesis: self.execution_init_genesis,
			signer: self.signer.then_some(true),
			signer_binary: self.signer_binary.clone(),
			signer_keystore: self.signer_keystore.clone(),
			signer_chain_id: self.signer_chain_id,
			signer_ipc_path: self.signer_ipc_path.clone(),
			signer_config_dir: self.signer_config_dir.clone(),
			signer_rules: self.signer_rules.clone(),
			shutdown_timeout_secs: self.shutdown_timeout_secs,
		}
	}
}

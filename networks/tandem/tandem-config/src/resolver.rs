use crate::config::*;
use crate::{ConfigError, NodeArgs, RawConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use url::Url;

const ENDPOINT_SCHEMES: &[&str] = &["http", "https", "ws", "wss"];
const HTTP_SCHEMES: &[&str] = &["http", "https"];

/// Validates and normalizes flags and config files into a [`NodeConfig`].
///
/// Relative paths are resolved against the resolver's base directory.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
	base_dir: PathBuf,
}

impl ConfigResolver {
	pub fn new(base_dir: impl Into<PathBuf>) -> Self {
		Self { base_dir: base_dir.into() }
	}

	/// A resolver rooted at the process working directory.
	pub fn from_current_dir() -> Result<Self, ConfigError> {
		let base_dir = std::env::current_dir().map_err(ConfigError::WorkingDirectory)?;
		Ok(Self::new(base_dir))
	}

	/// Resolves parsed flags, loading `--config-file` first when one is given. Values set on
	/// the command line win over the file.
	pub fn resolve_args(&self, args: &NodeArgs) -> Result<NodeConfig, ConfigError> {
		let mut raw = args.to_raw();
		if let Some(config_file) = &args.config_file {
			let path = self.path(config_file);
			debug!("Loading config file {}", path.display());
			raw = raw.or(RawConfig::from_file(&path)?);
		}
		self.resolve(raw)
	}

	pub fn resolve(&self, raw: RawConfig) -> Result<NodeConfig, ConfigError> {
		let network = resolve_network(&raw)?;
		let data_dir = self.path(raw.data_dir.as_deref().unwrap_or(DEFAULT_DATA_DIR));
		let execution = self.resolve_execution(&raw)?;

		let genesis = match non_empty(raw.genesis_state.as_deref()) {
			Some(value) => Some(self.resolve_genesis(value)?),
			None => None,
		};
		let checkpoint = self.resolve_checkpoint(&raw)?;

		let storage = StorageConfig {
			blob_path: raw
				.blob_path
				.as_deref()
				.map(|p| self.path(p))
				.unwrap_or_else(|| data_dir.join("blobs")),
			blob_retention_epochs: raw.blob_retention_epochs.unwrap_or(DEFAULT_BLOB_RETENTION_EPOCHS),
			db_pruning: raw.beacon_db_pruning.unwrap_or(false),
			pruner_retention_epochs: raw.pruner_retention_epochs,
		};

		let backfill = BackfillConfig {
			enabled: raw.enable_experimental_backfill.unwrap_or(false),
			batch_size: raw.backfill_batch_size.unwrap_or(DEFAULT_BACKFILL_BATCH_SIZE),
			worker_count: raw.backfill_worker_count.unwrap_or(DEFAULT_BACKFILL_WORKER_COUNT),
			oldest_slot: raw.backfill_oldest_slot,
		};

		let relay_endpoint = match non_empty(raw.http_mev_relay.as_deref()) {
			Some(value) => Some(parse_url("http-mev-relay", value)?),
			None => None,
		};
		let builder = BuilderConfig {
			relay_endpoint,
			max_consecutive_missed_slots: raw
				.max_builder_consecutive_missed_slots
				.unwrap_or(DEFAULT_MAX_BUILDER_CONSECUTIVE_MISSED_SLOTS),
			max_epoch_missed_slots: raw
				.max_builder_epoch_missed_slots
				.unwrap_or(DEFAULT_MAX_BUILDER_EPOCH_MISSED_SLOTS),
			local_block_value_boost: raw
				.local_block_value_boost
				.unwrap_or(DEFAULT_LOCAL_BLOCK_VALUE_BOOST),
			min_bid: raw.min_builder_bid,
		};

		let blockchain = BlockchainConfig {
			suggested_fee_recipient: non_empty(raw.suggested_fee_recipient.as_deref())
				.map(str::to_string),
			weak_subjectivity_checkpoint: non_empty(raw.weak_subjectivity_checkpoint.as_deref())
				.map(str::to_string),
		};

		let consensus_client = ConsensusClientConfig {
			binary: self.program(raw.consensus_binary.as_deref().unwrap_or(DEFAULT_CONSENSUS_BINARY)),
			extra_args: raw.consensus_args.clone().unwrap_or_default(),
		};

		let execution_client = if raw.execution_client.unwrap_or(false) {
			if execution.is_none() {
				return Err(ConfigError::Missing {
					field: "execution-endpoint",
					reason: "when the execution client is launched",
				});
			}
			Some(self.resolve_execution_client(&raw, &data_dir))
		} else {
			None
		};

		let signer = raw
			.signer
			.unwrap_or(false)
			.then(|| self.resolve_signer(&raw, &data_dir));

		Ok(NodeConfig {
			chain_config_file: raw.chain_config_file.as_deref().map(|p| self.path(p)),
			network,
			chain_id: raw.chain_id,
			network_id: raw.network_id,
			execution,
			genesis,
			checkpoint,
			storage,
			backfill,
			builder,
			blockchain,
			consensus_client,
			execution_client,
			signer,
			shutdown_timeout: raw
				.shutdown_timeout_secs
				.map(Duration::from_secs)
				.unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT),
			data_dir,
		})
	}

	fn resolve_execution(&self, raw: &RawConfig) -> Result<Option<ExecutionEngine>, ConfigError> {
		let endpoint = non_empty(raw.execution_endpoint.as_deref());
		let jwt_secret = non_empty(raw.jwt_secret.as_deref());
		let (endpoint, jwt_secret) = match (endpoint, jwt_secret) {
			(Some(endpoint), Some(jwt_secret)) => (endpoint, jwt_secret),
			(Some(_), None) => {
				return Err(ConfigError::ExecutionPairing {
					set: "execution-endpoint",
					missing: "jwt-secret",
				})
			}
			(None, Some(_)) => {
				return Err(ConfigError::ExecutionPairing {
					set: "jwt-secret",
					missing: "execution-endpoint",
				})
			}
			(None, None) => return Ok(None),
		};

		let headers = match non_empty(raw.execution_headers.as_deref()) {
			Some(value) => parse_headers(value)?,
			None => Vec::new(),
		};

		Ok(Some(ExecutionEngine {
			endpoint: self.expand_endpoint(endpoint)?,
			jwt_secret: self.classify_jwt_secret(jwt_secret),
			jwt_id: non_empty(raw.jwt_id.as_deref()).map(str::to_string),
			headers,
		}))
	}

	/// An endpoint naming an existing file is read from that file's first line.
	fn expand_endpoint(&self, value: &str) -> Result<Url, ConfigError> {
		let candidate = self.path(value);
		if !candidate.is_file() {
			return parse_url_with_schemes("execution-endpoint", value, ENDPOINT_SCHEMES);
		}

		let contents = std::fs::read_to_string(&candidate).map_err(|source| {
			ConfigError::ReadFile { field: "execution-endpoint", path: candidate.clone(), source }
		})?;
		let line = contents.lines().next().map(str::trim).unwrap_or_default();
		if line.is_empty() {
			return Err(ConfigError::InvalidValue {
				field: "execution-endpoint",
				reason: format!("{} is empty", candidate.display()),
			});
		}
		debug!("Read execution endpoint from {}", candidate.display());
		parse_url_with_schemes("execution-endpoint", line, ENDPOINT_SCHEMES)
	}

	fn classify_jwt_secret(&self, value: &str) -> JwtSecret {
		let digits = value.strip_prefix("0x").unwrap_or(value);
		if digits.len() == 64 && digits.chars().all(|c| c.is_ascii_hexdigit()) {
			JwtSecret::Inline(digits.to_ascii_lowercase())
		} else {
			JwtSecret::File(self.path(value))
		}
	}

	fn resolve_genesis(&self, value: &str) -> Result<GenesisSource, ConfigError> {
		if value.contains("://") {
			return parse_url_with_schemes("genesis-state", value, HTTP_SCHEMES)
				.map(GenesisSource::Remote)
				.map_err(|e| ConfigError::InvalidGenesisSource {
					value: value.to_string(),
					reason: e.to_string(),
				});
		}

		let path = self.path(value);
		if path.is_file() {
			Ok(GenesisSource::File(path))
		} else {
			Err(ConfigError::InvalidGenesisSource {
				value: value.to_string(),
				reason: format!("{} does not exist", path.display()),
			})
		}
	}

	fn resolve_checkpoint(&self, raw: &RawConfig) -> Result<Option<CheckpointSource>, ConfigError> {
		let url = non_empty(raw.checkpoint_sync_url.as_deref());
		let block = non_empty(raw.checkpoint_block.as_deref()).map(|p| self.path(p));
		let state = non_empty(raw.checkpoint_state.as_deref()).map(|p| self.path(p));

		match (url, block.is_some(), state.is_some()) {
			(Some(_), true, _) => Err(ConfigError::Conflict {
				first: "checkpoint-sync-url",
				second: "checkpoint-block",
			}),
			(Some(_), _, true) => Err(ConfigError::Conflict {
				first: "checkpoint-sync-url",
				second: "checkpoint-state",
			}),
			(Some(url), false, false) => Ok(Some(CheckpointSource::Remote(
				parse_url_with_schemes("checkpoint-sync-url", url, HTTP_SCHEMES)?,
			))),
			(None, false, false) => Ok(None),
			(None, _, _) => Ok(Some(CheckpointSource::Files { block, state })),
		}
	}

	fn resolve_execution_client(&self, raw: &RawConfig, data_dir: &Path) -> ExecutionClientConfig {
		let strings = |values: &[&str]| values.iter().map(|v| v.to_string()).collect::<Vec<_>>();
		ExecutionClientConfig {
			binary: self.program(
				raw.execution_client_binary.as_deref().unwrap_or(DEFAULT_EXECUTION_CLIENT_BINARY),
			),
			data_dir: raw
				.execution_client_datadir
				.as_deref()
				.map(|p| self.path(p))
				.unwrap_or_else(|| data_dir.join("execution")),
			genesis_file: self
				.path(raw.execution_genesis.as_deref().unwrap_or(DEFAULT_EXECUTION_GENESIS)),
			network_id: raw
				.execution_network_id
				.or(raw.network_id)
				.unwrap_or(DEFAULT_EXECUTION_NETWORK_ID),
			p2p_port: raw.execution_p2p_port.unwrap_or(DEFAULT_EXECUTION_P2P_PORT),
			http_addr: raw
				.execution_http_addr
				.clone()
				.unwrap_or_else(|| DEFAULT_EXECUTION_HTTP_ADDR.to_string()),
			http_port: raw.execution_http_port.unwrap_or(DEFAULT_EXECUTION_HTTP_PORT),
			http_cors_domains: strings(&["*"]),
			http_modules: strings(&["eth", "net", "web3"]),
			authrpc_addr: raw
				.execution_authrpc_addr
				.clone()
				.unwrap_or_else(|| DEFAULT_EXECUTION_AUTHRPC_ADDR.to_string()),
			authrpc_port: raw.execution_authrpc_port.unwrap_or(DEFAULT_EXECUTION_AUTHRPC_PORT),
			authrpc_vhosts: strings(&["*"]),
			init_genesis: raw.execution_init_genesis.unwrap_or(true),
		}
	}

	fn resolve_signer(&self, raw: &RawConfig, data_dir: &Path) -> SignerConfig {
		let keystore_dir = raw
			.signer_keystore
			.as_deref()
			.map(|p| self.path(p))
			.unwrap_or_else(|| data_dir.join("keystore"));
		SignerConfig {
			binary: self.program(raw.signer_binary.as_deref().unwrap_or(DEFAULT_SIGNER_BINARY)),
			chain_id: raw.signer_chain_id.or(raw.chain_id).unwrap_or(DEFAULT_SIGNER_CHAIN_ID),
			ipc_path: raw
				.signer_ipc_path
				.as_deref()
				.map(|p| self.path(p))
				.unwrap_or_else(|| data_dir.join("clef.ipc")),
			config_dir: raw
				.signer_config_dir
				.as_deref()
				.map(|p| self.path(p))
				.unwrap_or_else(|| keystore_dir.clone()),
			rules_file: self.path(raw.signer_rules.as_deref().unwrap_or(DEFAULT_SIGNER_RULES)),
			keystore_dir,
		}
	}

	fn path(&self, value: impl AsRef<Path>) -> PathBuf {
		let value = value.as_ref();
		if value.is_absolute() {
			value.to_path_buf()
		} else {
			self.base_dir.join(value)
		}
	}

	/// Executables given as a bare name stay bare so they are looked up on `PATH`.
	fn program(&self, value: &str) -> PathBuf {
		if Path::new(value).components().count() > 1 {
			self.path(value)
		} else {
			PathBuf::from(value)
		}
	}
}

fn resolve_network(raw: &RawConfig) -> Result<Network, ConfigError> {
	let selected: Vec<Network> = [
		(raw.mainnet, Network::Mainnet),
		(raw.sepolia, Network::Sepolia),
		(raw.holesky, Network::Holesky),
	]
	.into_iter()
	.filter_map(|(flag, network)| flag.unwrap_or(false).then_some(network))
	.collect();

	match selected.as_slice() {
		[] => Ok(Network::default()),
		[network] => Ok(*network),
		_ => Err(ConfigError::ConflictingNetworks(
			selected.iter().map(Network::flag_name).collect(),
		)),
	}
}

fn non_empty(value: Option<&str>) -> Option<&str> {
	value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
	Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
		field,
		value: value.to_string(),
		reason: e.to_string(),
	})
}

fn parse_url_with_schemes(
	field: &'static str,
	value: &str,
	schemes: &[&str],
) -> Result<Url, ConfigError> {
	let url = parse_url(field, value)?;
	if !schemes.contains(&url.scheme()) {
		return Err(ConfigError::InvalidUrl {
			field,
			value: value.to_string(),
			reason: format!("scheme must be one of {}", schemes.join(", ")),
		});
	}
	Ok(url)
}

/// Parses `key=value,key2=value2`.
fn parse_headers(value: &str) -> Result<Vec<(String, String)>, ConfigError> {
	value
		.split(',')
		.filter(|pair| !pair.trim().is_empty())
		.map(|pair| match pair.split_once('=') {
			Some((key, value)) if !key.trim().is_empty() => {
				Ok((key.trim().to_string(), value.trim().to_string()))
			}
			_ => Err(ConfigError::InvalidValue {
				field: "execution-headers",
				reason: format!("expected key=value, got {pair:?}"),
			}),
		})
		.collect()
}

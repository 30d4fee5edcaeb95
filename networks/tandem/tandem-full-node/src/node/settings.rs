use std::path::PathBuf;
use tandem_config::Network;
use url::Url;

/// Settings of the consensus client, as built up by a [`crate::node::options::ComposedPlan`].
///
/// Unset values are left to the client's own defaults and are not rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeSettings {
	pub data_dir: Option<PathBuf>,
	pub network: Option<Network>,
	pub chain_config_file: Option<PathBuf>,
	pub chain_id: Option<u64>,
	pub network_id: Option<u64>,
	pub suggested_fee_recipient: Option<String>,
	pub weak_subjectivity_checkpoint: Option<String>,

	pub execution_endpoint: Option<Url>,
	/// Decoded Engine API secret.
	pub jwt_secret: Option<[u8; 32]>,
	/// File the secret is handed to the clients through.
	pub jwt_secret_file: Option<PathBuf>,
	pub jwt_id: Option<String>,
	pub execution_headers: Vec<(String, String)>,

	pub builder_relay: Option<Url>,
	pub max_builder_consecutive_missed_slots: Option<u64>,
	pub max_builder_epoch_missed_slots: Option<u64>,
	pub local_block_value_boost: Option<u64>,
	pub min_builder_bid: Option<u64>,

	pub genesis_state: Option<PathBuf>,
	pub genesis_beacon_api_url: Option<Url>,

	pub checkpoint_sync_url: Option<Url>,
	pub checkpoint_block: Option<PathBuf>,
	pub checkpoint_state: Option<PathBuf>,

	pub blob_path: Option<PathBuf>,
	pub blob_retention_epochs: Option<u64>,
	pub db_pruning: bool,
	pub pruner_retention_epochs: Option<u64>,

	pub backfill: bool,
	pub backfill_batch_size: Option<u64>,
	pub backfill_worker_count: Option<u64>,
	pub backfill_oldest_slot: Option<u64>,
}

impl NodeSettings {
	/// Renders the settings as consensus client flags.
	pub fn to_args(&self) -> Vec<String> {
		let mut args = Args::default();

		args.value("--datadir", self.data_dir.as_ref().map(|p| p.display()));
		if let Some(network) = self.network {
			args.flag(&format!("--{}", network.flag_name()), true);
		}
		args.value("--chain-config-file", self.chain_config_file.as_ref().map(|p| p.display()));
		args.value("--chain-id", self.chain_id);
		args.value("--network-id", self.network_id);
		args.value("--suggested-fee-recipient", self.suggested_fee_recipient.as_ref());
		args.value("--weak-subjectivity-checkpoint", self.weak_subjectivity_checkpoint.as_ref());

		args.value("--execution-endpoint", self.execution_endpoint.as_ref());
		args.value("--jwt-secret", self.jwt_secret_file.as_ref().map(|p| p.display()));
		args.value("--jwt-id", self.jwt_id.as_ref());
		if !self.execution_headers.is_empty() {
			let headers = self
				.execution_headers
				.iter()
				.map(|(key, value)| format!("{key}={value}"))
				.collect::<Vec<_>>()
				.join(",");
			args.value("--execution-headers", Some(headers));
		}

		args.value("--http-mev-relay", self.builder_relay.as_ref());
		args.value(
			"--max-builder-consecutive-missed-slots",
			self.max_builder_consecutive_missed_slots,
		);
		args.value("--max-builder-epoch-missed-slots", self.max_builder_epoch_missed_slots);
		args.value("--local-block-value-boost", self.local_block_value_boost);
		args.value("--min-builder-bid", self.min_builder_bid);

		args.value("--genesis-state", self.genesis_state.as_ref().map(|p| p.display()));
		args.value("--genesis-beacon-api-url", self.genesis_beacon_api_url.as_ref());

		args.value("--checkpoint-sync-url", self.checkpoint_sync_url.as_ref());
		args.value("--checkpoint-block", self.checkpoint_block.as_ref().map(|p| p.display()));
		args.value("--checkpoint-state", self.checkpoint_state.as_ref().map(|p| p.display()));

		args.value("--blob-path", self.blob_path.as_ref().map(|p| p.display()));
		args.value("--blob-retention-epochs", self.blob_retention_epochs);
		args.flag("--beacon-db-pruning", self.db_pruning);
		args.value("--pruner-retention-epochs", self.pruner_retention_epochs);

		args.flag("--enable-experimental-backfill", self.backfill);
		args.value("--backfill-batch-size", self.backfill_batch_size);
		args.value("--backfill-worker-count", self.backfill_worker_count);
		args.value("--backfill-oldest-slot", self.backfill_oldest_slot);

		args.0
	}
}

#[derive(Default)]
struct Args(Vec<String>);

impl Args {
	fn flag(&mut self, name: &str, enabled: bool) {
		if enabled {
			self.0.push(name.to_string());
		}
	}

	fn value(&mut self, name: &str, value: Option<impl ToString>) {
		if let Some(value) = value {
			self.0.push(name.to_string());
			self.0.push(value.to_string());
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_empty_settings_render_nothing() {
		assert!(NodeSettings::default().to_args().is_empty());
	}

	#[test]
	fn test_render_flags() -> Result<(), anyhow::Error> {
		let settings = NodeSettings {
			data_dir: Some(PathBuf::from("/srv/tandem/data")),
			network: Some(Network::Holesky),
			execution_endpoint: Some(Url::parse("http://127.0.0.1:8551")?),
			jwt_secret_file: Some(PathBuf::from("/srv/tandem/jwtsecret")),
			execution_headers: vec![
				("X-A".to_string(), "1".to_string()),
				("X-B".to_string(), "2".to_string()),
			],
			db_pruning: true,
			pruner_retention_epochs: Some(8192),
			..Default::default()
		};

		assert_eq!(
			settings.to_args(),
			vec![
				"--datadir",
				"/srv/tandem/data",
				"--holesky",
				"--execution-endpoint",
				"http://127.0.0.1:8551/",
				"--jwt-secret",
				"/srv/tandem/jwtsecret",
				"--execution-headers",
				"X-A=1,X-B=2",
				"--beacon-db-pruning",
				"--pruner-retention-epochs",
				"8192",
			]
		);
		Ok(())
	}
}

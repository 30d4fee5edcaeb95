use super::{OptionProducer, OptionSet};
use anyhow::ensure;
use tandem_config::NodeConfig;

/// Blobs must be served for at least this many epochs.
pub const MIN_EPOCHS_FOR_BLOB_SIDECARS_REQUESTS: u64 = 4096;

/// Blob storage and database pruning.
pub struct Storage;

impl OptionProducer for Storage {
	fn name(&self) -> &'static str {
		"storage"
	}

	fn produce(&self, config: &NodeConfig) -> Result<OptionSet, anyhow::Error> {
		let storage = &config.storage;
		ensure!(
			storage.blob_retention_epochs >= MIN_EPOCHS_FOR_BLOB_SIDECARS_REQUESTS,
			"blob-retention-epochs {} is below the minimum of {MIN_EPOCHS_FOR_BLOB_SIDECARS_REQUESTS}",
			storage.blob_retention_epochs
		);
		if storage.db_pruning {
			ensure!(
				storage.pruner_retention_epochs != Some(0),
				"pruner-retention-epochs must be positive when beacon-db-pruning is enabled"
			);
		}

		let blob_path = storage.blob_path.clone();
		let retention = storage.blob_retention_epochs;
		let mut set = OptionSet::new(self.name())
			.with("blob-path", move |settings| settings.blob_path = Some(blob_path.clone()))
			.with("blob-retention-epochs", move |settings| {
				settings.blob_retention_epochs = Some(retention)
			});

		if storage.db_pruning {
			set = set.with("beacon-db-pruning", |settings| settings.db_pruning = true);
			if let Some(epochs) = storage.pruner_retention_epochs {
				set = set.with("pruner-retention-epochs", move |settings| {
					settings.pruner_retention_epochs = Some(epochs)
				});
			}
		}

		Ok(set)
	}
}

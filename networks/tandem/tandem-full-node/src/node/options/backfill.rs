use super::{OptionProducer, OptionSet};
use anyhow::ensure;
use tandem_config::NodeConfig;

/// Historical block backfill after checkpoint sync. Produces nothing when disabled.
pub struct Backfill;

impl OptionProducer for Backfill {
	fn name(&self) -> &'static str {
		"backfill"
	}

	fn produce(&self, config: &NodeConfig) -> Result<OptionSet, anyhow::Error> {
		let backfill = &config.backfill;
		let set = OptionSet::new(self.name());
		if !backfill.enabled {
			return Ok(set);
		}

		ensure!(backfill.batch_size > 0, "backfill-batch-size must be positive");
		ensure!(backfill.worker_count > 0, "backfill-worker-count must be positive");

		let (batch_size, worker_count) = (backfill.batch_size, backfill.worker_count);
		let mut set = set
			.with("enable-experimental-backfill", |settings| settings.backfill = true)
			.with("backfill-batch-size", move |settings| {
				settings.backfill_batch_size = Some(batch_size)
			})
			.with("backfill-worker-count", move |settings| {
				settings.backfill_worker_count = Some(worker_count)
			});
		if let Some(slot) = backfill.oldest_slot {
			set = set.with("backfill-oldest-slot", move |settings| {
				settings.backfill_oldest_slot = Some(slot)
			});
		}

		Ok(set)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::node::options::test_support::default_config;

	#[test]
	fn test_disabled_produces_nothing() -> Result<(), anyhow::Error> {
		let mut config = default_config();
		config.backfill.worker_count = 0;
		assert!(Backfill.produce(&config)?.is_empty());
		Ok(())
	}

	#[test]
	fn test_enabled() -> Result<(), anyhow::Error> {
		let mut config = default_config();
		config.backfill.enabled = true;
		config.backfill.oldest_slot = Some(1_000);
		assert_eq!(Backfill.produce(&config)?.options().len(), 4);

		config.backfill.batch_size = 0;
		assert!(Backfill.produce(&config).is_err());
		Ok(())
	}
}

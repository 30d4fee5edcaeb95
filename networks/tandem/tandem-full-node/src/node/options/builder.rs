use super::{OptionProducer, OptionSet};
use anyhow::ensure;
use tandem_config::NodeConfig;

/// External block builder relay and the limits after which the node falls back to local
/// block production.
pub struct Builder;

impl OptionProducer for Builder {
	fn name(&self) -> &'static str {
		"builder"
	}

	fn produce(&self, config: &NodeConfig) -> Result<OptionSet, anyhow::Error> {
		let builder = &config.builder;
		ensure!(
			builder.max_consecutive_missed_slots > 0,
			"max-builder-consecutive-missed-slots must be positive"
		);
		ensure!(builder.max_epoch_missed_slots > 0, "max-builder-epoch-missed-slots must be positive");
		ensure!(
			builder.max_consecutive_missed_slots <= builder.max_epoch_missed_slots,
			"max-builder-consecutive-missed-slots ({}) exceeds max-builder-epoch-missed-slots ({})",
			builder.max_consecutive_missed_slots,
			builder.max_epoch_missed_slots
		);

		let mut set = OptionSet::new(self.name());
		if let Some(relay) = builder.relay_endpoint.clone() {
			ensure!(
				matches!(relay.scheme(), "http" | "https"),
				"builder relay {relay} must use http or https"
			);
			set = set.with("http-mev-relay", move |settings| settings.builder_relay = Some(relay.clone()));
		}

		let (consecutive, epoch, boost) = (
			builder.max_consecutive_missed_slots,
			builder.max_epoch_missed_slots,
			builder.local_block_value_boost,
		);
		set = set
			.with("max-builder-consecutive-missed-slots", move |settings| {
				settings.max_builder_consecutive_missed_slots = Some(consecutive)
			})
			.with("max-builder-epoch-missed-slots", move |settings| {
				settings.max_builder_epoch_missed_slots = Some(epoch)
			})
			.with("local-block-value-boost", move |settings| {
				settings.local_block_value_boost = Some(boost)
			});
		if let Some(min_bid) = builder.min_bid {
			set = set.with("min-builder-bid", move |settings| settings.min_builder_bid = Some(min_bid));
		}

		Ok(set)
	}
}

use super::{OptionProducer, OptionSet};
use anyhow::{bail, ensure};
use tandem_config::{CheckpointSource, NodeConfig};

/// Checkpoint sync, from a beacon API or from a block and state file pair.
pub struct Checkpoint;

impl OptionProducer for Checkpoint {
	fn name(&self) -> &'static str {
		"checkpoint"
	}

	fn produce(&self, config: &NodeConfig) -> Result<OptionSet, anyhow::Error> {
		let set = OptionSet::new(self.name());
		let source = match config.checkpoint.clone() {
			None => return Ok(set),
			Some(source) => source,
		};

		match source {
			CheckpointSource::Remote(url) => Ok(set.with("checkpoint-sync-url", move |settings| {
				settings.checkpoint_sync_url = Some(url.clone())
			})),
			CheckpointSource::Files { block: Some(block), state: Some(state) } => {
				ensure!(block.is_file(), "checkpoint block {} does not exist", block.display());
				ensure!(state.is_file(), "checkpoint state {} does not exist", state.display());
				Ok(set
					.with("checkpoint-block", move |settings| {
						settings.checkpoint_block = Some(block.clone())
					})
					.with("checkpoint-state", move |settings| {
						settings.checkpoint_state = Some(state.clone())
					}))
			}
			CheckpointSource::Files { block: Some(_), state: None } => {
				bail!("checkpoint-block requires checkpoint-state")
			}
			CheckpointSource::Files { block: None, state: Some(_) } => {
				bail!("checkpoint-state requires checkpoint-block")
			}
			CheckpointSource::Files { block: None, state: None } => Ok(set),
		}
	}
}

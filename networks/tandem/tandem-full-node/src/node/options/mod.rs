//! Option producers and the composer that runs them.
//!
//! Each subsystem contributes an [`OptionSet`] computed from the [`NodeConfig`] alone. The
//! [`OptionComposer`] runs the producers in a fixed order and concatenates their sets into a
//! [`ComposedPlan`], stopping at the first failure.

pub mod backfill;
pub mod blockchain;
pub mod builder;
pub mod checkpoint;
pub mod execution;
pub mod genesis;
pub mod storage;

use crate::node::error::CompositionError;
use crate::node::settings::NodeSettings;
use std::fmt;
use tandem_config::NodeConfig;
use tracing::{debug, info};

type Mutation = Box<dyn Fn(&mut NodeSettings) + Send + Sync>;

/// A named change to the consensus client's settings.
pub struct NodeOption {
	name: &'static str,
	mutation: Mutation,
}

impl NodeOption {
	pub fn new(name: &'static str, mutation: impl Fn(&mut NodeSettings) + Send + Sync + 'static) -> Self {
		Self { name, mutation: Box::new(mutation) }
	}

	pub fn name(&self) -> &'static str {
		self.name
	}

	pub fn apply(&self, settings: &mut NodeSettings) {
		(self.mutation)(settings)
	}
}

impl fmt::Debug for NodeOption {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("NodeOption").field(&self.name).finish()
	}
}

/// The options one producer contributed, in the order they apply.
#[derive(Debug)]
pub struct OptionSet {
	name: &'static str,
	options: Vec<NodeOption>,
}

impl OptionSet {
	pub fn new(name: &'static str) -> Self {
		Self { name, options: Vec::new() }
	}

	pub fn with(
		mut self,
		name: &'static str,
		mutation: impl Fn(&mut NodeSettings) + Send + Sync + 'static,
	) -> Self {
		self.options.push(NodeOption::new(name, mutation));
		self
	}

	pub fn name(&self) -> &'static str {
		self.name
	}

	pub fn options(&self) -> &[NodeOption] {
		&self.options
	}

	pub fn is_empty(&self) -> bool {
		self.options.is_empty()
	}
}

/// Every option set, in producer order.
#[derive(Debug, Default)]
pub struct ComposedPlan {
	sets: Vec<OptionSet>,
}

impl ComposedPlan {
	pub fn sets(&self) -> &[OptionSet] {
		&self.sets
	}

	/// Option names in application order.
	pub fn option_names(&self) -> Vec<&'static str> {
		self.options().map(NodeOption::name).collect()
	}

	pub fn options(&self) -> impl Iterator<Item = &NodeOption> {
		self.sets.iter().flat_map(|set| set.options.iter())
	}

	pub fn apply(&self, mut settings: NodeSettings) -> NodeSettings {
		for option in self.options() {
			option.apply(&mut settings);
		}
		settings
	}

	/// The plan applied to default settings.
	pub fn settings(&self) -> NodeSettings {
		self.apply(NodeSettings::default())
	}
}

impl FromIterator<OptionSet> for ComposedPlan {
	fn from_iter<I: IntoIterator<Item = OptionSet>>(iter: I) -> Self {
		Self { sets: iter.into_iter().collect() }
	}
}

/// A subsystem that turns configuration into options.
pub trait OptionProducer: Send + Sync {
	fn name(&self) -> &'static str;

	fn produce(&self, config: &NodeConfig) -> Result<OptionSet, anyhow::Error>;
}

pub struct OptionComposer {
	producers: Vec<Box<dyn OptionProducer>>,
}

impl OptionComposer {
	pub fn new(producers: Vec<Box<dyn OptionProducer>>) -> Self {
		Self { producers }
	}

	/// The node's producers: blockchain, execution, builder, genesis, checkpoint, storage,
	/// backfill. Later producers may rely on options set by earlier ones, so the order is fixed.
	pub fn standard() -> Self {
		Self::new(vec![
			Box::new(blockchain::Blockchain),
			Box::new(execution::Execution),
			Box::new(builder::Builder),
			Box::new(genesis::Genesis),
			Box::new(checkpoint::Checkpoint),
			Box::new(storage::Storage),
			Box::new(backfill::Backfill),
		])
	}

	pub fn producer_names(&self) -> Vec<&'static str> {
		self.producers.iter().map(|producer| producer.name()).collect()
	}

	/// Runs the producers in order. The first failure is returned and no later producer runs.
	pub fn compose(&self, config: &NodeConfig) -> Result<ComposedPlan, CompositionError> {
		let mut sets = Vec::with_capacity(self.producers.len());
		for producer in &self.producers {
			let set = producer
				.produce(config)
				.map_err(|source| CompositionError { collaborator: producer.name(), source })?;
			debug!("{} produced {} options", producer.name(), set.options.len());
			sets.push(set);
		}

		let plan: ComposedPlan = sets.into_iter().collect();
		info!("Composed {} node options", plan.options().count());
		Ok(plan)
	}
}

impl Default for OptionComposer {
	fn default() -> Self {
		Self::standard()
	}
}

#[cfg(test)]
pub(crate) mod test_support {
	use std::path::PathBuf;
	use tandem_config::{ConfigResolver, NodeConfig, RawConfig};

	/// A config with nothing but defaults, rooted at `/srv/tandem`.
	pub fn default_config() -> NodeConfig {
		ConfigResolver::new(PathBuf::from("/srv/tandem"))
			.resolve(RawConfig::default())
			.expect("default config resolves")
	}
}

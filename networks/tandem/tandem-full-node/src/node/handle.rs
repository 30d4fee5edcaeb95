use crate::node::options::ComposedPlan;
use commander::Cancellation;
use tandem_config::NodeConfig;

/// Builds the node a run drives.
pub trait NodeFactory {
	type Node: NodeHandle;

	/// Constructs the node without starting anything. `cancel` is the node's own shutdown
	/// trigger: once it fires the node stops and [`NodeHandle::wait`] returns.
	fn build(
		&self,
		config: &NodeConfig,
		plan: ComposedPlan,
		cancel: Cancellation,
	) -> Result<Self::Node, anyhow::Error>;
}

/// A constructed node, owned by the orchestrator.
pub trait NodeHandle: Send {
	/// Starts the node's services.
	async fn start(&mut self) -> Result<(), anyhow::Error>;

	/// Resolves when the node's cancellation fires (`Ok`) or when the node stops on its own
	/// (an error). Tears nothing down.
	///
	/// Must be cancel-safe, the orchestrator polls it alongside other events.
	async fn wait(&mut self) -> Result<(), anyhow::Error>;

	/// Stops everything the node started. Called once the node's cancellation has fired and
	/// always awaited to completion.
	async fn stop(&mut self) -> Result<(), anyhow::Error>;

	/// Releases whatever a failed [`Self::start`] left behind.
	async fn release(&mut self);
}

use crate::node::error::{OrchestratorError, StartupStage};
use crate::node::handle::{NodeFactory, NodeHandle};
use crate::node::options::OptionComposer;
use crate::node::process_node::ProcessNodeFactory;
use crate::signer;
use commander::{Cancellation, ManagedProcess, ProcessState, SupervisorError};
use std::time::Duration;
use tandem_config::{ConfigResolver, NodeArgs, NodeConfig};
use tracing::{error, info, warn};

/// What a run does when the signer exits while the node is up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SignerCrashPolicy {
	/// Shut the node down and fail the run.
	#[default]
	ShutdownNode,
	/// Keep the node running. The crash still fails the run once it ends.
	KeepNode,
}

/// Composes the node's options, starts the node and then the signer.
pub struct NodeOrchestrator<F> {
	composer: OptionComposer,
	factory: F,
	crash_policy: SignerCrashPolicy,
	cancel: Cancellation,
}

impl NodeOrchestrator<ProcessNodeFactory> {
	/// The standard producers driving external client processes.
	pub fn standard() -> Self {
		Self::new(OptionComposer::standard(), ProcessNodeFactory)
	}
}

impl<F> NodeOrchestrator<F>
where
	F: NodeFactory,
{
	pub fn new(composer: OptionComposer, factory: F) -> Self {
		Self { composer, factory, crash_policy: SignerCrashPolicy::default(), cancel: Cancellation::new() }
	}

	pub fn with_crash_policy(mut self, crash_policy: SignerCrashPolicy) -> Self {
		self.crash_policy = crash_policy;
		self
	}

	/// The run's cancellation. Firing it, from a signal listener or anywhere else, shuts the
	/// run down.
	pub fn cancellation(&self) -> Cancellation {
		self.cancel.clone()
	}

	/// Resolves `args` and runs with the result. Positional arguments are checked by
	/// [`Self::run`], so a configuration error is reported before a usage error.
	pub async fn resolve_and_run(
		self,
		resolver: &ConfigResolver,
		args: &NodeArgs,
		positional_args: &[String],
	) -> Result<RunningNode<F::Node>, OrchestratorError> {
		let config = resolver.resolve_args(args)?;
		self.run(config, positional_args).await
	}

	/// Starts the node and, if configured, the signer.
	///
	/// Every failure is final. A node that fails to start is released before the error is
	/// returned, and so is a started node whose signer fails to launch.
	pub async fn run(
		self,
		config: NodeConfig,
		positional_args: &[String],
	) -> Result<RunningNode<F::Node>, OrchestratorError> {
		if !positional_args.is_empty() {
			return Err(OrchestratorError::Usage(positional_args.to_vec()));
		}

		let plan = self.composer.compose(&config)?;

		let node_cancel = Cancellation::new();
		let mut node = self
			.factory
			.build(&config, plan, node_cancel.clone())
			.map_err(|source| OrchestratorError::Startup { stage: StartupStage::Node, source })?;

		info!("Starting node");
		if let Err(source) = node.start().await {
			error!("Node failed to start, releasing it: {source:#}");
			node.release().await;
			return Err(OrchestratorError::Startup { stage: StartupStage::Node, source });
		}

		let signer = match &config.signer {
			Some(signer_config) => match ManagedProcess::launch(signer::process_spec(signer_config)) {
				Ok(process) => Some(process),
				Err(e) => {
					error!("Signer failed to start, releasing the node: {e}");
					node_cancel.cancel();
					node.release().await;
					return Err(OrchestratorError::Startup {
						stage: StartupStage::Signer,
						source: e.into(),
					});
				}
			},
			None => None,
		};

		info!("Node is running");
		Ok(RunningNode {
			node,
			signer,
			cancel: self.cancel,
			node_cancel,
			crash_policy: self.crash_policy,
			shutdown_timeout: config.shutdown_timeout,
		})
	}
}

/// A started node and its signer.
pub struct RunningNode<N> {
	node: N,
	signer: Option<ManagedProcess>,
	cancel: Cancellation,
	node_cancel: Cancellation,
	crash_policy: SignerCrashPolicy,
	shutdown_timeout: Duration,
}

impl<N> RunningNode<N>
where
	N: NodeHandle,
{
	pub fn cancellation(&self) -> Cancellation {
		self.cancel.clone()
	}

	pub fn signer(&self) -> Option<&ManagedProcess> {
		self.signer.as_ref()
	}

	/// Blocks until the run is cancelled, the node stops on its own, or the signer crashes
	/// (subject to the crash policy), then tears down: the signer first, then the node.
	///
	/// Teardown runs outside the race above, so it always completes.
	pub async fn wait(self) -> Result<(), OrchestratorError> {
		let RunningNode { mut node, mut signer, cancel, node_cancel, crash_policy, shutdown_timeout } =
			self;

		let mut crashed: Option<SupervisorError> = None;
		let stopped_on_its_own = loop {
			let signer_running =
				signer.as_ref().is_some_and(|process| process.state() == ProcessState::Running);
			tokio::select! {
				biased;
				_ = cancel.cancelled() => break None,
				result = node.wait() => break Some(result),
				result = supervise_signer(signer.as_mut(), &cancel), if signer_running => {
					let Err(e) = result else { continue };
					error!("Signer crashed: {e}");
					crashed = Some(e);
					match crash_policy {
						SignerCrashPolicy::ShutdownNode => break None,
						SignerCrashPolicy::KeepNode => warn!("Keeping the node running without a signer"),
					}
				}
			}
		};
		info!("Shutting down");
		cancel.cancel();

		let mut shutdown_error: Option<anyhow::Error> = None;
		if let Some(process) = signer.as_mut() {
			if let Err(e) = process.shutdown(shutdown_timeout).await {
				error!("Failed to shut down the signer: {e}");
				shutdown_error = Some(e.into());
			}
		}

		node_cancel.cancel();
		let node_error = match stopped_on_its_own {
			Some(Ok(())) => Some(anyhow::anyhow!("node stopped without being cancelled")),
			Some(Err(e)) => Some(e),
			None => None,
		};
		if let Err(e) = node.stop().await {
			error!("Failed to shut down the node: {e:#}");
			shutdown_error.get_or_insert(e);
		}

		if let Some(e) = node_error {
			return Err(OrchestratorError::Node(e));
		}
		if let Some(e) = crashed {
			return Err(OrchestratorError::ServiceCrashed(e));
		}
		if let Some(e) = shutdown_error {
			return Err(OrchestratorError::Shutdown(e));
		}
		info!("Shut down cleanly");
		Ok(())
	}
}

async fn supervise_signer(
	signer: Option<&mut ManagedProcess>,
	cancel: &Cancellation,
) -> Result<(), SupervisorError> {
	match signer {
		Some(process) => process.supervise(cancel).await,
		None => std::future::pending().await,
	}
}

pub mod error;
pub mod execution_client;
pub mod handle;
pub mod options;
pub mod orchestrator;
pub mod process_node;
pub mod settings;

pub use error::{CompositionError, OrchestratorError, StartupStage};
pub use handle::{NodeFactory, NodeHandle};
pub use options::{ComposedPlan, NodeOption, OptionComposer, OptionProducer, OptionSet};
pub use orchestrator::{NodeOrchestrator, RunningNode, SignerCrashPolicy};
pub use process_node::{ProcessNode, ProcessNodeFactory};
pub use settings::NodeSettings;

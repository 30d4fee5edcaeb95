//! Configuration for a Tandem node.
//!
//! Flags ([`NodeArgs`]) and config files are merged into a [`RawConfig`], which the
//! [`ConfigResolver`] validates into the immutable [`NodeConfig`] shared by every subsystem.

mod args;
pub mod config;
mod error;
mod raw;
mod resolver;

pub use args::NodeArgs;
pub use config::{
	BackfillConfig, BlockchainConfig, BuilderConfig, CheckpointSource, ConsensusClientConfig,
	ExecutionClientConfig, ExecutionEngine, GenesisSource, JwtSecret, Network, NodeConfig,
	SignerConfig, StorageConfig,
};
pub use error::ConfigError;
pub use raw::RawConfig;
pub use resolver::ConfigResolver;

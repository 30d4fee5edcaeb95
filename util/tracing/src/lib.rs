//! Tracing setup for Tandem services.
//!
//! Events go to standard output as text or JSON and can additionally be
//! persisted to a log file written by a background worker.

mod config;
mod subscriber;

pub use config::{Config, LogFormat};
pub use subscriber::{init_tracing_subscriber, ScopeGuard};

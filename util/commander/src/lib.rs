//! Process plumbing for the Tandem services.
//!
//! [`ManagedProcess`] owns a long-lived child process (the signer, the
//! consensus and execution clients), [`Cancellation`] is the single token a
//! run unwinds on, and [`listen_for_shutdown`] connects OS signals to it.

mod cancel;
mod command;
mod error;
mod process;
mod signal;

pub use cancel::Cancellation;
pub use command::run_command;
pub use error::SupervisorError;
pub use process::{ManagedProcess, ProcessSpec, ProcessState, StdioMode};
pub use signal::listen_for_shutdown;

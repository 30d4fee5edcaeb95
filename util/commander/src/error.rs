use crate::process::ProcessState;
use std::process::ExitStatus;
use std::time::Duration;

/// Errors raised while supervising an external process.
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
	#[error("failed to launch {name} ({program}): {source}")]
	Launch {
		name: String,
		program: String,
		#[source]
		source: std::io::Error,
	},

	#[error("{name} cannot be started from state {state:?}")]
	AlreadyStarted { name: String, state: ProcessState },

	#[error("{name} exited unexpectedly with {status}")]
	Crashed { name: String, status: ExitStatus },

	#[error("{name} did not exit within {timeout:?} of the termination request and was killed")]
	ShutdownTimedOut { name: String, timeout: Duration },

	#[error("i/o error while supervising {name}: {source}")]
	Io {
		name: String,
		#[source]
		source: std::io::Error,
	},
}

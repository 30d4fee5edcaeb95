use crate::{Cancellation, SupervisorError};
use itertools::Itertools;
use tokio::process::{Child, Command};
use tracing::{debug, error, info, warn};

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

/// Where a supervised process' standard streams go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StdioMode {
	/// Share the parent's stdin, stdout and stderr, so the child's logs show up inline.
	#[default]
	Inherit,
	/// Detach all three streams.
	Null,
}

impl StdioMode {
	fn stdio(self) -> Stdio {
		match self {
			Self::Inherit => Stdio::inherit(),
			Self::Null => Stdio::null(),
		}
	}
}

/// Launch description of an external process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
	/// Name used in logs and errors.
	pub name: String,
	pub program: PathBuf,
	pub args: Vec<String>,
	pub stdio: StdioMode,
}

impl ProcessSpec {
	pub fn new(name: impl Into<String>, program: impl Into<PathBuf>) -> Self {
		Self { name: name.into(), program: program.into(), args: Vec::new(), stdio: StdioMode::default() }
	}

	pub fn arg(mut self, arg: impl Into<String>) -> Self {
		self.args.push(arg.into());
		self
	}

	pub fn args<I, S>(mut self, args: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.args.extend(args.into_iter().map(Into::into));
		self
	}

	pub fn stdio(mut self, stdio: StdioMode) -> Self {
		self.stdio = stdio;
		self
	}

	/// The program and its arguments joined by spaces, for display.
	pub fn command_line(&self) -> String {
		std::iter::once(self.program.to_string_lossy().into_owned())
			.chain(self.args.iter().cloned())
			.join(" ")
	}
}

/// Lifecycle of a [`ManagedProcess`].
///
/// `NotStarted -> Starting -> Running -> Stopping -> Stopped`, with `Failed` reachable from
/// `Starting` (launch error) and `Running` (the process exited on its own).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
	NotStarted,
	Starting,
	Running,
	Stopping,
	Stopped,
	Failed,
}

/// An external process owned by exactly one supervisor.
///
/// The child is killed if the handle is dropped while it is still running.
#[derive(Debug)]
pub struct ManagedProcess {
	spec: ProcessSpec,
	state: ProcessState,
	child: Option<Child>,
	pid: Option<u32>,
}

impl ManagedProcess {
	pub fn new(spec: ProcessSpec) -> Self {
		Self { spec, state: ProcessState::NotStarted, child: None, pid: None }
	}

	/// Creates and starts a process in one step.
	pub fn launch(spec: ProcessSpec) -> Result<Self, SupervisorError> {
		let mut process = Self::new(spec);
		process.start()?;
		Ok(process)
	}

	pub fn name(&self) -> &str {
		&self.spec.name
	}

	pub fn state(&self) -> ProcessState {
		self.state
	}

	/// The OS process identifier, once the process has been started.
	pub fn pid(&self) -> Option<u32> {
		self.pid
	}

	/// Spawns the process. The state becomes `Running` only once the OS reported a pid.
	pub fn start(&mut self) -> Result<u32, SupervisorError> {
		if self.state != ProcessState::NotStarted {
			return Err(SupervisorError::AlreadyStarted {
				name: self.spec.name.clone(),
				state: self.state,
			});
		}
		self.state = ProcessState::Starting;
		info!("Starting {}: {}", self.spec.name, self.spec.command_line());

		let spawned = Command::new(&self.spec.program)
			.args(&self.spec.args)
			.stdin(self.spec.stdio.stdio())
			.stdout(self.spec.stdio.stdio())
			.stderr(self.spec.stdio.stdio())
			.kill_on_drop(true)
			.spawn();

		let launch_error = |source| SupervisorError::Launch {
			name: self.spec.name.clone(),
			program: self.spec.program.display().to_string(),
			source,
		};

		let child = match spawned {
			Ok(child) => child,
			Err(source) => {
				let err = launch_error(source);
				error!("{err}");
				self.state = ProcessState::Failed;
				return Err(err);
			}
		};

		let Some(pid) = child.id() else {
			let err = launch_error(std::io::Error::new(
				std::io::ErrorKind::Other,
				"process exited before reporting a pid",
			));
			error!("{err}");
			self.state = ProcessState::Failed;
			return Err(err);
		};

		info!("{} started with PID {pid}", self.spec.name);
		self.child = Some(child);
		self.pid = Some(pid);
		self.state = ProcessState::Running;
		Ok(pid)
	}

	/// Waits passively for whichever comes first: `cancel` firing or the process exiting.
	///
	/// Returns `Ok(())` on cancellation, leaving the process running for [`Self::shutdown`]. An
	/// exit is reported as [`SupervisorError::Crashed`]; what to do about it is the caller's call.
	pub async fn supervise(&mut self, cancel: &Cancellation) -> Result<(), SupervisorError> {
		let Some(child) = self.child.as_mut() else {
			return Ok(());
		};

		let exited = tokio::select! {
			biased;
			_ = cancel.cancelled() => None,
			status = child.wait() => Some(status),
		};

		let Some(status) = exited else {
			debug!("{} supervision ended by cancellation", self.spec.name);
			return Ok(());
		};

		self.child = None;
		self.state = ProcessState::Failed;
		let name = self.spec.name.clone();
		match status {
			Ok(status) => {
				error!("{name} exited unexpectedly with {status}");
				Err(SupervisorError::Crashed { name, status })
			}
			Err(source) => Err(SupervisorError::Io { name, source }),
		}
	}

	/// Asks the process to terminate and waits up to `timeout` for it to exit, killing it if it
	/// does not. Once this returns the process is gone.
	///
	/// Calling this on a process that is not running is a no-op.
	pub async fn shutdown(&mut self, timeout: Duration) -> Result<(), SupervisorError> {
		let Some(mut child) = self.child.take() else {
			debug!("{} is {:?}, nothing to shut down", self.spec.name, self.state);
			return Ok(());
		};
		let name = self.spec.name.clone();

		match child.try_wait() {
			Ok(Some(status)) => {
				warn!("{name} had already exited with {status}");
				self.state = ProcessState::Stopped;
				return Ok(());
			}
			Ok(None) => {}
			Err(source) => {
				self.force_kill(&mut child).await?;
				return Err(SupervisorError::Io { name, source });
			}
		}

		self.state = ProcessState::Stopping;
		info!("Shutting down {name}...");
		if let Err(e) = request_termination(&mut child) {
			warn!("Failed to request termination of {name}: {e}");
		}

		match tokio::time::timeout(timeout, child.wait()).await {
			Ok(Ok(status)) => {
				info!("{name} stopped with {status}");
				self.state = ProcessState::Stopped;
				Ok(())
			}
			Ok(Err(source)) => {
				self.force_kill(&mut child).await?;
				Err(SupervisorError::Io { name, source })
			}
			Err(_) => {
				warn!("{name} did not stop within {timeout:?}, killing it");
				self.force_kill(&mut child).await?;
				Err(SupervisorError::ShutdownTimedOut { name, timeout })
			}
		}
	}

	async fn force_kill(&mut self, child: &mut Child) -> Result<(), SupervisorError> {
		let name = self.spec.name.clone();
		if let Err(source) = child.kill().await {
			error!("Failed to kill {name}: {source}");
			self.state = ProcessState::Failed;
			return Err(SupervisorError::Io { name, source });
		}
		let status = child.wait().await.map_err(|source| SupervisorError::Io {
			name: name.clone(),
			source,
		})?;
		info!("{name} killed ({status})");
		self.state = ProcessState::Stopped;
		Ok(())
	}
}

#[cfg(unix)]
fn request_termination(child: &mut Child) -> Result<(), anyhow::Error> {
	use nix::sys::signal::{kill, Signal};
	use nix::unistd::Pid;

	let pid = child.id().ok_or_else(|| anyhow::anyhow!("process has already been reaped"))?;
	let pid = i32::try_from(pid)?;
	kill(Pid::from_raw(pid), Signal::SIGTERM)?;
	Ok(())
}

#[cfg(not(unix))]
fn request_termination(child: &mut Child) -> Result<(), anyhow::Error> {
	child.start_kill()?;
	Ok(())
}

#[cfg(all(test, unix))]
mod tests {
	use super::*;
	use nix::sys::signal::kill;
	use nix::unistd::Pid;

	fn sleeper(name: &str) -> ProcessSpec {
		ProcessSpec::new(name, "sleep").arg("30").stdio(StdioMode::Null)
	}

	#[test]
	fn test_command_line() {
		let spec = ProcessSpec::new("signer", "clef").args(["--keystore", "data/keystore"]);
		assert_eq!(spec.command_line(), "clef --keystore data/keystore");
		assert_eq!(spec.stdio, StdioMode::Inherit);
	}

	#[tokio::test]
	async fn test_launch_and_shutdown() -> Result<(), anyhow::Error> {
		let mut process = ManagedProcess::launch(sleeper("sleeper"))?;
		assert_eq!(process.state(), ProcessState::Running);
		assert!(process.pid().is_some());

		process.shutdown(Duration::from_secs(5)).await?;
		assert_eq!(process.state(), ProcessState::Stopped);
		Ok(())
	}

	#[tokio::test]
	async fn test_shutdown_sends_sigterm() -> Result<(), anyhow::Error> {
		let dir = tempfile::tempdir()?;
		let marker = dir.path().join("terminated");
		let spec = ProcessSpec::new("graceful", "sh")
			.args([
				"-c".to_string(),
				format!("trap 'touch {}; exit 0' TERM; while :; do sleep 0.1; done", marker.display()),
			])
			.stdio(StdioMode::Null);
		let mut process = ManagedProcess::launch(spec)?;
		tokio::time::sleep(Duration::from_millis(300)).await;

		process.shutdown(Duration::from_secs(5)).await?;
		assert_eq!(process.state(), ProcessState::Stopped);
		assert!(marker.exists());
		Ok(())
	}

	#[tokio::test]
	async fn test_shutdown_twice_is_noop() -> Result<(), anyhow::Error> {
		let mut process = ManagedProcess::launch(sleeper("sleeper"))?;
		process.shutdown(Duration::from_secs(5)).await?;
		process.shutdown(Duration::from_secs(5)).await?;
		assert_eq!(process.state(), ProcessState::Stopped);
		Ok(())
	}

	#[tokio::test]
	async fn test_shutdown_before_start_is_noop() -> Result<(), anyhow::Error> {
		let mut process = ManagedProcess::new(sleeper("sleeper"));
		process.shutdown(Duration::from_secs(1)).await?;
		assert_eq!(process.state(), ProcessState::NotStarted);
		Ok(())
	}

	#[tokio::test]
	async fn test_launch_invalid_program_fails() {
		let spec = ProcessSpec::new("signer", "/nonexistent/tandem-signer").stdio(StdioMode::Null);
		let mut process = ManagedProcess::new(spec);

		let err = process.start().unwrap_err();
		assert!(matches!(err, SupervisorError::Launch { .. }), "{err}");
		assert_eq!(process.state(), ProcessState::Failed);
		assert!(process.pid().is_none());
	}

	#[tokio::test]
	async fn test_start_twice_is_rejected() -> Result<(), anyhow::Error> {
		let mut process = ManagedProcess::launch(sleeper("sleeper"))?;
		let err = process.start().unwrap_err();
		assert!(matches!(err, SupervisorError::AlreadyStarted { state: ProcessState::Running, .. }));
		process.shutdown(Duration::from_secs(5)).await?;
		Ok(())
	}

	#[tokio::test]
	async fn test_timeout_forces_termination() -> Result<(), anyhow::Error> {
		let spec = ProcessSpec::new("stubborn", "sh")
			.args(["-c", "trap '' TERM; exec sleep 30"])
			.stdio(StdioMode::Null);
		let mut process = ManagedProcess::launch(spec)?;
		let pid = process.pid().expect("running process has a pid");
		// let the shell install its trap before asking it to stop
		tokio::time::sleep(Duration::from_millis(300)).await;

		let err = process.shutdown(Duration::from_millis(300)).await.unwrap_err();
		assert!(matches!(err, SupervisorError::ShutdownTimedOut { .. }), "{err}");
		assert_eq!(process.state(), ProcessState::Stopped);

		// the pid no longer names a live process
		assert!(kill(Pid::from_raw(pid as i32), None).is_err());

		process.shutdown(Duration::from_millis(300)).await?;
		Ok(())
	}

	#[tokio::test]
	async fn test_supervise_returns_on_cancel() -> Result<(), anyhow::Error> {
		let mut process = ManagedProcess::launch(sleeper("sleeper"))?;
		let cancel = Cancellation::new();
		cancel.cancel();

		process.supervise(&cancel).await?;
		assert_eq!(process.state(), ProcessState::Running);

		process.shutdown(Duration::from_secs(5)).await?;
		Ok(())
	}

	#[tokio::test]
	async fn test_supervise_reports_crash() -> Result<(), anyhow::Error> {
		let spec = ProcessSpec::new("crasher", "sh").args(["-c", "exit 3"]).stdio(StdioMode::Null);
		let mut process = ManagedProcess::launch(spec)?;

		let err = process.supervise(&Cancellation::new()).await.unwrap_err();
		match err {
			SupervisorError::Crashed { name, status } => {
				assert_eq!(name, "crasher");
				assert_eq!(status.code(), Some(3));
			}
			other => panic!("unexpected error: {other}"),
		}
		assert_eq!(process.state(), ProcessState::Failed);

		// nothing left to stop
		process.shutdown(Duration::from_secs(1)).await?;
		assert_eq!(process.state(), ProcessState::Failed);
		Ok(())
	}
}

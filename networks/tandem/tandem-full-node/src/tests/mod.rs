//! In-process stand-ins for the node and the option producers.


use crate::node::{ComposedPlan, NodeFactory, NodeHandle, OptionProducer, OptionSet};
use commander::Cancellation;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tandem_config::NodeConfig;

pub const SECRET: &str = "f1d2d2f924e986ac86fdf7b36c94bcdf32beec15a3a1d9f1d9f3b8f9e3c3b2a1";

/// Ordered record of what the fake node saw.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
	pub fn record(&self, entry: impl Into<String>) {
		self.0.lock().unwrap().push(entry.into());
	}

	pub fn entries(&self) -> Vec<String> {
		self.0.lock().unwrap().clone()
	}
}

#[derive(Debug, Clone, Default)]
pub struct FakeFactory {
	pub journal: Journal,
	pub fail_start: bool,
	/// The node stops on its own after this long.
	pub exit_after: Option<Duration>,
	/// Process the node checks on when it is cancelled.
	pub watched_pid: Arc<Mutex<Option<u32>>>,
}

impl NodeFactory for FakeFactory {
	type Node = FakeNode;

	fn build(
		&self,
		_config: &NodeConfig,
		plan: ComposedPlan,
		cancel: Cancellation,
	) -> Result<FakeNode, anyhow::Error> {
		self.journal.record(format!("build {}", plan.option_names().join(",")));
		Ok(FakeNode { factory: self.clone(), cancel })
	}
}

pub struct FakeNode {
	factory: FakeFactory,
	cancel: Cancellation,
}

impl NodeHandle for FakeNode {
	async fn start(&mut self) -> Result<(), anyhow::Error> {
		self.factory.journal.record("start");
		if self.factory.fail_start {
			anyhow::bail!("database is locked");
		}
		Ok(())
	}

	async fn wait(&mut self) -> Result<(), anyhow::Error> {
		let exit_after = self.factory.exit_after;
		let exited = async move {
			match exit_after {
				Some(delay) => tokio::time::sleep(delay).await,
				None => std::future::pending().await,
			}
		};
		tokio::select! {
			_ = self.cancel.cancelled() => Ok(()),
			_ = exited => {
				self.factory.journal.record("exit");
				anyhow::bail!("consensus client exited");
			}
		}
	}

	async fn stop(&mut self) -> Result<(), anyhow::Error> {
		anyhow::ensure!(self.cancel.is_cancelled(), "stopped before the node was cancelled");
		let watched = *self.factory.watched_pid.lock().unwrap();
		match watched {
			Some(pid) => {
				self.factory.journal.record(format!("stop, signer alive: {}", process_alive(pid)))
			}
			None => self.factory.journal.record("stop"),
		}
		Ok(())
	}

	async fn release(&mut self) {
		self.factory.journal.record("release");
	}
}

/// Counts its invocations and optionally fails.
pub struct CountingProducer {
	pub name: &'static str,
	pub calls: Arc<AtomicUsize>,
	pub fail: bool,
}

impl CountingProducer {
	pub fn new(name: &'static str, fail: bool) -> (Self, Arc<AtomicUsize>) {
		let calls = Arc::new(AtomicUsize::new(0));
		(Self { name, calls: calls.clone(), fail }, calls)
	}
}

impl OptionProducer for CountingProducer {
	fn name(&self) -> &'static str {
		self.name
	}

	fn produce(&self, _config: &NodeConfig) -> Result<OptionSet, anyhow::Error> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		if self.fail {
			anyhow::bail!("{} is misconfigured", self.name);
		}
		Ok(OptionSet::new(self.name).with(self.name, |_| {}))
	}
}

#[cfg(unix)]
pub fn process_alive(pid: u32) -> bool {
	use nix::sys::signal::kill;
	use nix::unistd::Pid;

	kill(Pid::from_raw(pid as i32), None).is_ok()
}

#[cfg(not(unix))]
pub fn process_alive(_pid: u32) -> bool {
	false
}

/// An executable shell script that ignores its arguments.
#[cfg(unix)]
pub fn script(dir: &Path, name: &str, body: &str) -> Result<PathBuf, anyhow::Error> {
	use std::os::unix::fs::PermissionsExt;

	let path = dir.join(name);
	std::fs::write(&path, format!("#!/bin/sh\n{body}\n"))?;
	std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))?;
	Ok(path)
}

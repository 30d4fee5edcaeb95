use anyhow::Result;
use futures::future::try_join;
use itertools::Itertools;
use tokio::io::{self, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::info;

use std::ffi::OsStr;
use std::process::Stdio;

async fn pipe_output<R, W>(reader: R, mut writer: W) -> Result<String>
where
	R: AsyncRead + Unpin,
	W: AsyncWrite + Unpin,
{
	let mut output = String::new();
	let mut reader = BufReader::new(reader).lines();
	while let Some(line) = reader.next_line().await? {
		writer.write_all(line.as_bytes()).await?;
		writer.write_all(b"\n").await?;
		output.push_str(&line);
		output.push('\n');
	}
	writer.flush().await?;
	Ok(output)
}

/// Runs a command to completion, piping its output to stdout and stderr, and returns the stdout
/// output if successful.
///
/// Meant for short one-shot commands (client `init` steps, signal delivery). Long-lived services
/// go through [`crate::ManagedProcess`].
pub async fn run_command<C, I, S>(command: C, args: I) -> Result<String>
where
	C: AsRef<OsStr>,
	I: IntoIterator<Item = S>,
	S: AsRef<OsStr>,
{
	let mut command = Command::new(command);
	command.args(args);

	let cmd_display = command.as_std().get_program().to_string_lossy().into_owned();
	let args_display = command.as_std().get_args().map(|s| s.to_string_lossy()).join(" ");

	info!("Running command: {cmd_display} {args_display}");

	let mut child = command
		.stdin(Stdio::null())
		.stdout(Stdio::piped())
		.stderr(Stdio::piped())
		.kill_on_drop(true)
		.spawn()
		.map_err(|e| anyhow::anyhow!("Failed to spawn command {cmd_display}: {e}"))?;

	let stdout = child.stdout.take().ok_or_else(|| {
		anyhow::anyhow!("Failed to capture standard output from command {cmd_display}")
	})?;
	let stderr = child.stderr.take().ok_or_else(|| {
		anyhow::anyhow!("Failed to capture standard error from command {cmd_display}")
	})?;

	let (stdout_output, stderr_output) =
		try_join(pipe_output(stdout, io::stdout()), pipe_output(stderr, io::stderr())).await?;

	let status = child.wait().await?;
	if !status.success() {
		return Err(anyhow::anyhow!(
			"Command {cmd_display} failed with args {args_display}\nError Output: {}",
			stderr_output
		));
	}

	Ok(stdout_output)
}

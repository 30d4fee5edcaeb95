use crate::Cancellation;
use tokio::task::JoinHandle;
use tracing::info;

/// Cancels `cancel` on the first SIGTERM, SIGINT or SIGQUIT delivered to this process.
///
/// Handlers are registered before this returns, so a signal sent right after the call is not
/// lost. The spawned task also ends when the token is cancelled from somewhere else.
#[cfg(unix)]
pub fn listen_for_shutdown(cancel: Cancellation) -> std::io::Result<JoinHandle<()>> {
	use tokio::signal::unix::{signal, SignalKind};

	let mut sigterm = signal(SignalKind::terminate())?;
	let mut sigint = signal(SignalKind::interrupt())?;
	let mut sigquit = signal(SignalKind::quit())?;

	Ok(tokio::spawn(async move {
		let received = tokio::select! {
			_ = sigterm.recv() => "SIGTERM",
			_ = sigint.recv() => "SIGINT",
			_ = sigquit.recv() => "SIGQUIT",
			_ = cancel.cancelled() => return,
		};
		info!("Received {received}, shutting down");
		cancel.cancel();
	}))
}

#[cfg(not(unix))]
pub fn listen_for_shutdown(cancel: Cancellation) -> std::io::Result<JoinHandle<()>> {
	Ok(tokio::spawn(async move {
		tokio::select! {
			result = tokio::signal::ctrl_c() => {
				if let Err(e) = result {
					tracing::error!("Failed to listen for Ctrl+C: {e}");
				} else {
					info!("Received Ctrl+C, shutting down");
				}
			}
			_ = cancel.cancelled() => return,
		}
		cancel.cancel();
	}))
}

use std::sync::Arc;
use tokio::sync::watch;

/// A cloneable cancellation token.
///
/// Every clone observes the same state. Cancelling is idempotent and can be
/// done from any task: the signal listener, a fatal error path or a test.
#[derive(Debug, Clone)]
pub struct Cancellation {
	sender: Arc<watch::Sender<bool>>,
	receiver: watch::Receiver<bool>,
}

impl Cancellation {
	pub fn new() -> Self {
		let (sender, receiver) = watch::channel(false);
		Self { sender: Arc::new(sender), receiver }
	}

	/// Cancels the token. Returns `true` if this call did the cancelling.
	pub fn cancel(&self) -> bool {
		!self.sender.send_replace(true)
	}

	pub fn is_cancelled(&self) -> bool {
		*self.receiver.borrow()
	}

	/// Resolves once the token is cancelled.
	pub async fn cancelled(&self) {
		let mut receiver = self.receiver.clone();
		// The sender lives as long as `self`, so this can only return once cancelled.
		let _ = receiver.wait_for(|cancelled| *cancelled).await;
	}
}

impl Default for Cancellation {
	fn default() -> Self {
		Self::new()
	}
}

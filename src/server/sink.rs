//! Destinations for accepted notification batches.

// crates.io
use tokio::sync::mpsc::{self, error::TrySendError};
// self
use crate::{_prelude::*, server::Notification};

/// Failure to hand a batch off; the webhook answers `503` so Fitbit retries later.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum SinkError {
	/// The consumer stopped.
	#[error("Notification consumer is closed.")]
	Closed,
	/// The consumer is not keeping up.
	#[error("Notification queue is full.")]
	Full,
}

/// Receives batches accepted by the webhook.
///
/// `deliver` runs inside the request handler and must not block: Fitbit disables subscribers
/// that take longer than five seconds to answer.
pub trait NotificationSink: Send + Sync {
	/// Takes ownership of one batch.
	fn deliver(&self, batch: Vec<Notification>) -> Result<(), SinkError>;
}

/// Keeps every notification in memory; useful for tests and small tools.
#[derive(Clone, Debug, Default)]
pub struct MemorySink(Arc<Mutex<Vec<Notification>>>);
impl MemorySink {
	/// Copies out everything received so far.
	pub fn snapshot(&self) -> Vec<Notification> {
		self.0.lock().clone()
	}

	/// Removes and returns everything received so far.
	pub fn drain(&self) -> Vec<Notification> {
		std::mem::take(&mut *self.0.lock())
	}
}
impl NotificationSink for MemorySink {
	fn deliver(&self, batch: Vec<Notification>) -> Result<(), SinkError> {
		self.0.lock().extend(batch);

		Ok(())
	}
}

/// Forwards batches over a bounded tokio channel to a background consumer.
#[derive(Clone, Debug)]
pub struct ChannelSink(mpsc::Sender<Vec<Notification>>);
impl ChannelSink {
	/// Creates a sink and the receiver the consumer should drain.
	pub fn bounded(capacity: usize) -> (Self, mpsc::Receiver<Vec<Notification>>) {
		let (tx, rx) = mpsc::channel(capacity.max(1));

		(Self(tx), rx)
	}
}
impl NotificationSink for ChannelSink {
	fn deliver(&self, batch: Vec<Notification>) -> Result<(), SinkError> {
		self.0.try_send(batch).map_err(|e| match e {
			TrySendError::Full(_) => SinkError::Full,
			TrySendError::Closed(_) => SinkError::Closed,
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn batch() -> Vec<Notification> {
		serde_json::from_str(
			r#"[{"collectionType":"sleep","date":"2025-01-02","ownerId":"22ABCD","ownerType":"user","subscriptionId":"1"}]"#,
		)
		.expect("Notification fixture should parse.")
	}

	#[test]
	fn memory_sink_accumulates_and_drains() {
		let sink = MemorySink::default();

		sink.deliver(batch()).expect("Memory sink should accept batches.");
		sink.deliver(batch()).expect("Memory sink should accept batches.");

		assert_eq!(sink.snapshot().len(), 2);
		assert_eq!(sink.drain().len(), 2);
		assert!(sink.snapshot().is_empty());
	}

	#[tokio::test]
	async fn channel_sink_reports_backpressure_and_closure() {
		let (sink, mut rx) = ChannelSink::bounded(1);

		sink.deliver(batch()).expect("First batch should fit.");

		assert_eq!(sink.deliver(batch()), Err(SinkError::Full));
		assert_eq!(rx.recv().await.map(|batch| batch.len()), Some(1));

		drop(rx);

		assert_eq!(sink.deliver(batch()), Err(SinkError::Closed));
	}
}

// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for refresh attempts.
#[derive(Debug, Default)]
pub struct RefreshMetrics {
	attempts: AtomicU64,
	reused: AtomicU64,
	rotated: AtomicU64,
	refresh_kept: AtomicU64,
	failures: AtomicU64,
}
impl RefreshMetrics {
	/// Total calls into the refresh flow.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Calls answered from the cached record.
	pub fn reused(&self) -> u64 {
		self.reused.load(Ordering::Relaxed)
	}

	/// Calls that hit the token endpoint and stored a new record.
	pub fn rotated(&self) -> u64 {
		self.rotated.load(Ordering::Relaxed)
	}

	/// Token endpoint calls where Fitbit answered without a new refresh token.
	pub fn refresh_kept(&self) -> u64 {
		self.refresh_kept.load(Ordering::Relaxed)
	}

	/// Successful calls (cache reuse plus rotations).
	pub fn successes(&self) -> u64 {
		self.reused() + self.rotated()
	}

	/// Failed calls.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_reuse(&self) {
		self.reused.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_rotation(&self, issued_new_refresh: bool) {
		self.rotated.fetch_add(1, Ordering::Relaxed);

		if !issued_new_refresh {
			self.refresh_kept.fetch_add(1, Ordering::Relaxed);
		}
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn successes_sum_reuse_and_rotation() {
		let metrics = RefreshMetrics::default();

		metrics.record_attempt();
		metrics.record_reuse();
		metrics.record_attempt();
		metrics.record_rotation(true);
		metrics.record_attempt();
		metrics.record_rotation(false);
		metrics.record_attempt();
		metrics.record_failure();

		assert_eq!(metrics.attempts(), 4);
		assert_eq!(metrics.successes(), 3);
		assert_eq!(metrics.refresh_kept(), 1);
		assert_eq!(metrics.failures(), 1);
	}
}

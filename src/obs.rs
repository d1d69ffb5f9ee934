//! Optional observability helpers for OAuth flows, resource requests, and notifications.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (on by default) to emit structured spans named `fitbit_link.flow` with the
//!   `flow` and `stage` (call site) fields.
//! - Enable `metrics` to increment `fitbit_link_flow_total` for every attempt and outcome and
//!   to record `fitbit_link_flow_duration_seconds`, both labeled by `flow` and `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// std
use std::time::Instant;
// self
use crate::_prelude::*;

/// Operation kinds observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Authorization Code + PKCE start and exchange.
	AuthorizationCode,
	/// Refresh token flow.
	Refresh,
	/// Token revocation.
	Revoke,
	/// Authenticated resource request.
	ApiRequest,
	/// Inbound webhook verification or notification batch.
	Notification,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::AuthorizationCode => "authorization_code",
			FlowKind::Refresh => "refresh",
			FlowKind::Revoke => "revoke",
			FlowKind::ApiRequest => "api_request",
			FlowKind::Notification => "notification",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs `fut` inside a flow span, recording the attempt, the outcome, and the elapsed time.
pub async fn observe<T, E, Fut>(kind: FlowKind, stage: &'static str, fut: Fut) -> Result<T, E>
where
	Fut: Future<Output = Result<T, E>>,
{
	let span = FlowSpan::new(kind, stage);
	let started = Instant::now();

	record_flow_outcome(kind, FlowOutcome::Attempt);

	let result = span.instrument(fut).await;

	finish(&span, kind, started, result.is_ok());

	result
}

/// Synchronous counterpart of [`observe`].
pub fn observe_sync<T, E, F>(kind: FlowKind, stage: &'static str, f: F) -> Result<T, E>
where
	F: FnOnce() -> Result<T, E>,
{
	let span = FlowSpan::new(kind, stage);
	let started = Instant::now();

	record_flow_outcome(kind, FlowOutcome::Attempt);

	let result = span.in_scope(f);

	finish(&span, kind, started, result.is_ok());

	result
}

fn finish(span: &FlowSpan, kind: FlowKind, started: Instant, ok: bool) {
	let outcome = if ok { FlowOutcome::Success } else { FlowOutcome::Failure };

	span.record_outcome(outcome);
	record_flow_outcome(kind, outcome);
	record_flow_duration(kind, outcome, started.elapsed());
}

// std
use std::time::Duration as StdDuration;
// self
use crate::obs::{FlowKind, FlowOutcome};

/// Counter incremented for every attempt and every terminal outcome.
pub const FLOW_TOTAL: &str = "fitbit_link_flow_total";
/// Histogram of wall-clock time per finished flow stage, in seconds.
pub const FLOW_DURATION: &str = "fitbit_link_flow_duration_seconds";

/// Increments [`FLOW_TOTAL`] when the `metrics` feature is enabled.
pub fn record_flow_outcome(kind: FlowKind, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(FLOW_TOTAL, "flow" => kind.as_str(), "outcome" => outcome.as_str()).increment(1);
	}
	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Records how long a flow stage took before reaching `outcome`.
pub fn record_flow_duration(kind: FlowKind, outcome: FlowOutcome, elapsed: StdDuration) {
	#[cfg(feature = "metrics")]
	{
		metrics::histogram!(FLOW_DURATION, "flow" => kind.as_str(), "outcome" => outcome.as_str())
			.record(elapsed.as_secs_f64());
	}
	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome, elapsed);
	}
}

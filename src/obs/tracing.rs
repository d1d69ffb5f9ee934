// self
use crate::{
	_prelude::*,
	obs::{FlowKind, FlowOutcome},
};

/// Future returned by [`FlowSpan::instrument`].
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Future returned by [`FlowSpan::instrument`]; a no-op wrapper without the `tracing` feature.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// `fitbit_link.flow` span carrying `flow`, `stage`, and a late-bound `outcome` field.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Opens a span for one stage of a flow.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			Self {
				span: tracing::info_span!(
					"fitbit_link.flow",
					flow = kind.as_str(),
					stage,
					outcome = tracing::field::Empty,
				),
			}
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Runs a synchronous section with the span entered.
	pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
		#[cfg(feature = "tracing")]
		{
			self.span.in_scope(f)
		}
		#[cfg(not(feature = "tracing"))]
		{
			f()
		}
	}

	/// Attaches the span to `fut` so it is entered on every poll.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			tracing::Instrument::instrument(fut, self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}

	/// Fills the `outcome` field once the stage has finished.
	pub fn record_outcome(&self, outcome: FlowOutcome) {
		#[cfg(feature = "tracing")]
		{
			self.span.record("outcome", outcome.as_str());
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = outcome;
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn sync_sections_return_their_value() {
		let span = FlowSpan::new(FlowKind::AuthorizationCode, "start_authorization");
		let value = span.in_scope(|| "authorize-url");

		span.record_outcome(FlowOutcome::Success);

		assert_eq!(value, "authorize-url");
	}

	#[tokio::test]
	async fn instrumented_futures_resolve() {
		let span = FlowSpan::new(FlowKind::ApiRequest, "profile");

		assert_eq!(span.instrument(async { 204_u16 }).await, 204);
	}
}

// self
use crate::{_prelude::*, call::Method, obs::SessionEvent};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// A span wrapping one logical call, renewal and retry included.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Creates a new span tagged with the call's method + path.
	pub fn new(method: Method, path: &str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::debug_span!("session_api_client.call", method = method.as_str(), path);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (method, path);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a structured event for `event`; failures log at `warn`, everything else at `debug`.
pub fn trace_session_event(event: SessionEvent, detail: &str) {
	#[cfg(feature = "tracing")]
	{
		match event {
			SessionEvent::RenewalFailed => {
				tracing::warn!(event = event.as_str(), detail, "session renewal failed")
			},
			SessionEvent::RedirectNavigated => {
				tracing::info!(event = event.as_str(), detail, "redirecting to login")
			},
			_ => tracing::debug!(event = event.as_str(), detail),
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (event, detail);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn trace_session_event_without_subscriber() {
		trace_session_event(SessionEvent::Retry, "/jobs");
	}

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = CallSpan::new(Method::Get, "/jobs");
		let value = span.instrument(async { 42 }).await;

		assert_eq!(value, 42);
	}
}

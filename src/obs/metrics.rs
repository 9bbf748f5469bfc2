// self
use crate::obs::SessionEvent;

/// Records a session event via the global metrics recorder (when enabled).
pub fn record_session_event(event: SessionEvent) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("session_api_client_event_total", "event" => event.as_str())
			.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = event;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn record_session_event_noop_without_recorder() {
		record_session_event(SessionEvent::RenewalFailed);
	}
}

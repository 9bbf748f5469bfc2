//! Observability helpers for session-aware calls.
//!
//! # Feature Flags
//!
//! - `tracing` (default) emits spans named `session_api_client.call` with `method` and `path`
//!   fields, plus one event per [`SessionEvent`].
//! - `metrics` increments the `session_api_client_event_total` counter labeled by `event`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Lifecycle events observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SessionEvent {
	/// A caller entered the client.
	Call,
	/// This caller created the renewal ticket and issued the renewal call.
	RenewalStarted,
	/// This caller attached to a renewal already in flight.
	RenewalJoined,
	/// This caller's 401 predates a renewal that already settled; its outcome was reused.
	RenewalReused,
	/// The renewal endpoint issued fresh credentials.
	RenewalSucceeded,
	/// The renewal endpoint failed, timed out, or was unreachable.
	RenewalFailed,
	/// A descriptor was resubmitted after a renewal.
	Retry,
	/// The redirect gate navigated to the login route.
	RedirectNavigated,
	/// The redirect gate stayed put because the route is already unauthenticated.
	RedirectSuppressed,
}
impl SessionEvent {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			SessionEvent::Call => "call",
			SessionEvent::RenewalStarted => "renewal_started",
			SessionEvent::RenewalJoined => "renewal_joined",
			SessionEvent::RenewalReused => "renewal_reused",
			SessionEvent::RenewalSucceeded => "renewal_succeeded",
			SessionEvent::RenewalFailed => "renewal_failed",
			SessionEvent::Retry => "retry",
			SessionEvent::RedirectNavigated => "redirect_navigated",
			SessionEvent::RedirectSuppressed => "redirect_suppressed",
		}
	}
}
impl Display for SessionEvent {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records `event` on every enabled sink.
pub fn observe(event: SessionEvent, detail: &str) {
	record_session_event(event);
	trace_session_event(event, detail);
}

// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for calls, renewals, retries, and redirects.
#[derive(Debug, Default)]
pub struct SessionMetrics {
	calls: AtomicU64,
	retries: AtomicU64,
	renewal_attempts: AtomicU64,
	renewal_successes: AtomicU64,
	renewal_failures: AtomicU64,
	redirects: AtomicU64,
}
impl SessionMetrics {
	/// Returns the number of calls that entered the client.
	pub fn calls(&self) -> u64 {
		self.calls.load(Ordering::Relaxed)
	}

	/// Returns the number of descriptors resubmitted after a renewal.
	pub fn retries(&self) -> u64 {
		self.retries.load(Ordering::Relaxed)
	}

	/// Returns the number of renewal calls actually issued.
	pub fn renewal_attempts(&self) -> u64 {
		self.renewal_attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of renewal calls that succeeded.
	pub fn renewal_successes(&self) -> u64 {
		self.renewal_successes.load(Ordering::Relaxed)
	}

	/// Returns the number of renewal calls that failed.
	pub fn renewal_failures(&self) -> u64 {
		self.renewal_failures.load(Ordering::Relaxed)
	}

	/// Returns the number of forced navigations to the login route.
	pub fn redirects(&self) -> u64 {
		self.redirects.load(Ordering::Relaxed)
	}

	pub(crate) fn record_call(&self) {
		self.calls.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_retry(&self) {
		self.retries.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_renewal_attempt(&self) {
		self.renewal_attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_renewal_success(&self) {
		self.renewal_successes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_renewal_failure(&self) {
		self.renewal_failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_redirect(&self) {
		self.redirects.fetch_add(1, Ordering::Relaxed);
	}
}

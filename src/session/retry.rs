//! Single-retry policy applied after a successful renewal.

// self
use crate::{
	_prelude::*,
	call::CallDescriptor,
	http::{ApiResponse, ApiTransport},
	obs::{self, SessionEvent},
};

/// Decides whether a failed call may renew and resubmits it at most once.
#[derive(Clone, Copy, Debug, Default)]
pub struct RetryPolicy;
impl RetryPolicy {
	/// Only authorization failures on descriptors that have not been retried yet may renew.
	pub fn should_renew(&self, call: &CallDescriptor, err: &Error) -> bool {
		err.is_unauthorized() && !call.retried()
	}

	/// Marks `call` as retried and resubmits it once; any failure, 401 included, is final.
	pub async fn resubmit<T>(&self, transport: &T, call: &mut CallDescriptor) -> Result<ApiResponse>
	where
		T: ?Sized + ApiTransport,
	{
		call.mark_retried();
		obs::observe(SessionEvent::Retry, &call.path);

		transport.execute(call).await
	}
}

//! Session-aware client facade.
//!
//! [`SessionClient`] is the entry point every call site shares. Each call goes through the
//! transport once; an authorization failure hands control to the [`RenewalCoordinator`], a
//! successful renewal hands it back through the [`RetryPolicy`] for one resubmission, and a
//! failed renewal runs the redirect gate and surfaces the caller's original 401.

mod metrics;
mod renewal;
mod retry;

pub use metrics::SessionMetrics;
pub use renewal::{AuthState, RenewalCoordinator, RenewalOutcome};
pub use retry::RetryPolicy;

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	call::CallDescriptor,
	config::ClientConfig,
	http::{ApiResponse, ApiTransport},
	obs::{self, CallSpan, SessionEvent},
	redirect::{Navigator, RedirectGate, RouteSource},
};
#[cfg(feature = "reqwest")] use crate::{error::ConfigError, http::ReqwestTransport};

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestSessionClient = SessionClient<ReqwestTransport>;

/// Process-wide API client that keeps a cookie-carried session alive.
///
/// Construct one per process (or per signed-in session) and clone it freely: clones share the
/// transport, the renewal coordinator, and the metrics, so concurrent 401s across every clone
/// still collapse into one renewal call.
pub struct SessionClient<T>
where
	T: ?Sized + ApiTransport,
{
	config: Arc<ClientConfig>,
	transport: Arc<T>,
	coordinator: Arc<RenewalCoordinator<T>>,
	retry: RetryPolicy,
	metrics: Arc<SessionMetrics>,
}
impl<T> SessionClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Creates a client over a caller-provided transport.
	pub fn with_transport(
		config: ClientConfig,
		transport: impl Into<Arc<T>>,
		navigator: Arc<dyn Navigator>,
		routes: Arc<dyn RouteSource>,
	) -> Self {
		let transport = transport.into();
		let metrics = Arc::new(SessionMetrics::default());
		let gate = RedirectGate::new(&config, navigator, routes);
		let coordinator = Arc::new(RenewalCoordinator::new(
			transport.clone(),
			gate,
			config.renewal_path.clone(),
			metrics.clone(),
		));

		Self { config: Arc::new(config), transport, coordinator, retry: RetryPolicy, metrics }
	}

	/// Runs `call` to its terminal outcome, renewing and retrying once when the session expired.
	pub async fn execute(&self, call: CallDescriptor) -> Result<ApiResponse> {
		let span = CallSpan::new(call.method, &call.path);

		span.instrument(self.drive(call)).await
	}

	/// Runs `call` and decodes the JSON body into `R`.
	pub async fn send<R>(&self, call: CallDescriptor) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.execute(call).await?.json()
	}

	/// `GET <base><path>`.
	pub async fn get<R>(&self, path: &str) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.send(CallDescriptor::get(path)).await
	}

	/// `POST <base><path>` with a JSON body.
	pub async fn post<R, B>(&self, path: &str, body: &B) -> Result<R>
	where
		R: DeserializeOwned,
		B: ?Sized + Serialize,
	{
		self.send(CallDescriptor::post(path).with_body(body)?).await
	}

	/// `PUT <base><path>` with a JSON body.
	pub async fn put<R, B>(&self, path: &str, body: &B) -> Result<R>
	where
		R: DeserializeOwned,
		B: ?Sized + Serialize,
	{
		self.send(CallDescriptor::put(path).with_body(body)?).await
	}

	/// `DELETE <base><path>`.
	pub async fn delete<R>(&self, path: &str) -> Result<R>
	where
		R: DeserializeOwned,
	{
		self.send(CallDescriptor::delete(path)).await
	}

	/// Renews the session explicitly, sharing any renewal already in flight.
	pub async fn renew_session(&self) -> Result<()> {
		match self.coordinator.renew().await {
			RenewalOutcome::Renewed => Ok(()),
			RenewalOutcome::Failed { reason } => Err(Error::RenewalFailed { reason }),
		}
	}

	/// Last known authentication signal.
	pub fn auth_state(&self) -> AuthState {
		self.coordinator.auth_state()
	}

	/// Counters shared by every clone of this client.
	pub fn metrics(&self) -> &SessionMetrics {
		&self.metrics
	}

	/// Configuration the client was built with.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Transport shared by every clone of this client.
	pub fn transport(&self) -> &Arc<T> {
		&self.transport
	}

	pub(crate) fn set_auth_state(&self, state: AuthState) {
		self.coordinator.set_auth_state(state);
	}

	async fn drive(&self, mut call: CallDescriptor) -> Result<ApiResponse> {
		obs::observe(SessionEvent::Call, &call.path);
		self.metrics.record_call();

		let generation = self.coordinator.generation();
		let err = match self.transport.execute(&call).await {
			Ok(response) => return Ok(response),
			Err(err) => err,
		};

		if !self.retry.should_renew(&call, &err) {
			return Err(err);
		}

		match self.coordinator.renew_since(generation).await {
			RenewalOutcome::Renewed => {
				self.metrics.record_retry();

				self.retry.resubmit(self.transport.as_ref(), &mut call).await
			},
			RenewalOutcome::Failed { .. } => Err(err),
		}
	}
}
#[cfg(feature = "reqwest")]
impl SessionClient<ReqwestTransport> {
	/// Creates a client with its own cookie-carrying reqwest transport.
	pub fn new(
		config: ClientConfig,
		navigator: Arc<dyn Navigator>,
		routes: Arc<dyn RouteSource>,
	) -> Result<Self, ConfigError> {
		let transport = ReqwestTransport::new(&config)?;

		Ok(Self::with_transport(config, transport, navigator, routes))
	}
}
impl<T> Clone for SessionClient<T>
where
	T: ?Sized + ApiTransport,
{
	fn clone(&self) -> Self {
		Self {
			config: self.config.clone(),
			transport: self.transport.clone(),
			coordinator: self.coordinator.clone(),
			retry: self.retry,
			metrics: self.metrics.clone(),
		}
	}
}
impl<T> Debug for SessionClient<T>
where
	T: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionClient")
			.field("base_url", &self.config.base_url.as_str())
			.field("coordinator", &self.coordinator)
			.finish()
	}
}

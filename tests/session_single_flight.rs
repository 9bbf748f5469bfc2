// std
use std::{
	sync::{
		Arc, Mutex,
		atomic::{AtomicBool, AtomicU32, Ordering},
	},
	time::Duration,
};
// crates.io
use color_eyre::eyre::Result as EyreResult;
// self
use session_api_client::{
	ApiResponse, ApiTransport, AuthState, CallDescriptor, ClientConfig, Error, RecordingNavigator,
	SessionClient, SharedRoute,
	config::DEFAULT_RENEWAL_PATH,
	error::TransportError,
	http::TransportFuture,
};

const EXPIRED: &str = r#"{"message":"Access token expired"}"#;

/// Scripted backend: data calls answer 401 until a renewal succeeds.
#[derive(Default)]
struct FakeBackend {
	session_valid: AtomicBool,
	renewal_fails: bool,
	renewal_unreachable: bool,
	keeps_rejecting: bool,
	data_status: Option<u16>,
	data_unreachable: bool,
	slow_path: Option<&'static str>,
	renewal_calls: AtomicU32,
	seen: Mutex<Vec<(String, bool)>>,
}
impl FakeBackend {
	fn renewal_calls(&self) -> u32 {
		self.renewal_calls.load(Ordering::SeqCst)
	}

	fn seen(&self) -> Vec<(String, bool)> {
		self.seen.lock().expect("Seen log should not be poisoned.").clone()
	}
}
impl ApiTransport for FakeBackend {
	fn execute<'a>(&'a self, call: &'a CallDescriptor) -> TransportFuture<'a> {
		Box::pin(async move {
			if call.path == DEFAULT_RENEWAL_PATH {
				self.renewal_calls.fetch_add(1, Ordering::SeqCst);
				// Keeps the ticket outstanding while the other callers hit their 401s.
				tokio::time::sleep(Duration::from_millis(50)).await;

				if self.renewal_unreachable {
					return Err(Error::from(TransportError::Timeout { path: call.path.clone() }));
				}
				if self.renewal_fails {
					return ApiResponse::new(401, r#"{"message":"Refresh token expired"}"#)
						.into_result();
				}

				self.session_valid.store(true, Ordering::SeqCst);

				return ApiResponse::new(200, "{}").into_result();
			}

			self.seen
				.lock()
				.expect("Seen log should not be poisoned.")
				.push((call.path.clone(), call.retried()));

			let result = if self.data_unreachable {
				Err(Error::from(TransportError::Timeout { path: call.path.clone() }))
			} else if let Some(status) = self.data_status {
				ApiResponse::new(status, r#"{"message":"Upstream exploded"}"#).into_result()
			} else if self.keeps_rejecting || !self.session_valid.load(Ordering::SeqCst) {
				ApiResponse::new(401, EXPIRED).into_result()
			} else {
				ApiResponse::new(200, r#"{"data":[1,2,3]}"#).into_result()
			};

			// The answer is decided on arrival; only its delivery is late.
			if self.slow_path == Some(call.path.as_str()) && !call.retried() {
				tokio::time::sleep(Duration::from_millis(80)).await;
			}

			result
		})
	}
}

struct Harness {
	client: SessionClient<FakeBackend>,
	backend: Arc<FakeBackend>,
	navigator: RecordingNavigator,
	route: SharedRoute,
}

fn harness(backend: FakeBackend, route: &str) -> Harness {
	let backend = Arc::new(backend);
	let navigator = RecordingNavigator::default();
	let route = SharedRoute::new(route);
	let config = ClientConfig::builder().build().expect("Default config should validate.");
	let client = SessionClient::with_transport(
		config,
		backend.clone(),
		Arc::new(navigator.clone()),
		Arc::new(route.clone()),
	);

	Harness { client, backend, navigator, route }
}

#[derive(Debug, serde::Deserialize, PartialEq)]
struct Jobs {
	data: Vec<u32>,
}

#[tokio::test]
async fn success_passes_through_without_renewal() -> EyreResult<()> {
	let h = harness(FakeBackend { session_valid: AtomicBool::new(true), ..Default::default() }, "/");
	let jobs: Jobs = h.client.get("/jobs").await?;

	assert_eq!(jobs, Jobs { data: vec![1, 2, 3] });
	assert_eq!(h.backend.renewal_calls(), 0);
	assert_eq!(h.backend.seen(), vec![("/jobs".to_string(), false)]);
	assert_eq!(h.client.auth_state(), AuthState::Unknown);

	Ok(())
}

#[tokio::test]
async fn expired_session_renews_then_retries_once() -> EyreResult<()> {
	let h = harness(FakeBackend::default(), "/dashboard");
	let jobs: Jobs = h.client.get("/jobs").await?;

	assert_eq!(jobs.data.len(), 3);
	assert_eq!(h.backend.renewal_calls(), 1);
	assert_eq!(
		h.backend.seen(),
		vec![("/jobs".to_string(), false), ("/jobs".to_string(), true)],
		"The resubmitted descriptor must carry the retried flag."
	);
	assert_eq!(h.client.auth_state(), AuthState::Authenticated);
	assert_eq!(h.client.metrics().retries(), 1);
	assert!(h.navigator.navigations().is_empty());

	Ok(())
}

#[tokio::test]
async fn concurrent_unauthorized_calls_share_one_renewal() -> EyreResult<()> {
	let h = harness(FakeBackend::default(), "/dashboard");
	let other = h.client.clone();
	let (a, b, c) = tokio::join!(
		h.client.get::<Jobs>("/jobs"),
		other.get::<Jobs>("/profile/jobs"),
		h.client.get::<Jobs>("/applications"),
	);

	a?;
	b?;
	c?;

	assert_eq!(h.backend.renewal_calls(), 1);
	assert_eq!(h.client.metrics().renewal_attempts(), 1);
	assert_eq!(h.client.metrics().retries(), 3);

	let retried = h.backend.seen().into_iter().filter(|(_, retried)| *retried).count();

	assert_eq!(retried, 3);

	Ok(())
}

#[tokio::test]
async fn retry_rejected_again_does_not_renew_twice() {
	let h = harness(FakeBackend { keeps_rejecting: true, ..Default::default() }, "/dashboard");
	let err = h.client.get::<Jobs>("/jobs").await.expect_err("Second 401 should be final.");

	assert!(err.is_unauthorized());
	assert_eq!(err.to_string(), "Access token expired");
	assert_eq!(h.backend.renewal_calls(), 1);
	assert_eq!(h.backend.seen().len(), 2);
	assert!(h.navigator.navigations().is_empty());
}

#[tokio::test]
async fn failed_renewal_redirects_once_and_returns_original_error() {
	let h = harness(FakeBackend { renewal_fails: true, ..Default::default() }, "/settings");
	let (a, b, c) = tokio::join!(
		h.client.get::<Jobs>("/profile"),
		h.client.get::<Jobs>("/jobs"),
		h.client.get::<Jobs>("/notifications"),
	);

	for result in [a, b, c] {
		let err = result.expect_err("Unrenewable sessions should fail.");

		assert!(err.is_unauthorized());
		assert_eq!(err.to_string(), "Access token expired");
	}

	assert_eq!(h.backend.renewal_calls(), 1);
	assert_eq!(h.navigator.navigations(), vec!["/auth/login".to_string()]);
	assert_eq!(h.client.metrics().redirects(), 1);
	assert_eq!(h.client.metrics().retries(), 0);
	assert_eq!(h.client.auth_state(), AuthState::Unauthenticated);
}

#[tokio::test]
async fn failed_renewal_on_auth_screens_stays_put() {
	let h = harness(FakeBackend { renewal_fails: true, ..Default::default() }, "/auth/register");
	let err = h
		.client
		.post::<serde_json::Value, _>("/auth-service/api/auth/verify", &serde_json::json!({}))
		.await
		.expect_err("Unrenewable sessions should fail.");

	assert!(err.is_unauthorized());
	assert!(h.navigator.navigations().is_empty());

	h.route.set("/auth/login");

	let _ = h.client.get::<Jobs>("/jobs").await;

	assert!(h.navigator.navigations().is_empty());
	assert_eq!(h.backend.renewal_calls(), 2);
}

#[tokio::test]
async fn unreachable_renewal_counts_as_failure() {
	let h = harness(FakeBackend { renewal_unreachable: true, ..Default::default() }, "/dashboard");
	let err = h.client.get::<Jobs>("/jobs").await.expect_err("Renewal timeout should fail.");

	assert!(err.is_unauthorized());
	assert_eq!(h.navigator.navigations().len(), 1);

	let err = h.client.renew_session().await.expect_err("Explicit renewal should fail too.");

	assert!(matches!(err, Error::RenewalFailed { .. }));
}

#[tokio::test]
async fn server_errors_bypass_renewal() {
	let h = harness(FakeBackend { data_status: Some(500), ..Default::default() }, "/dashboard");
	let err = h.client.get::<Jobs>("/jobs").await.expect_err("500 should be final.");

	assert_eq!(err.status(), Some(500));
	assert_eq!(err.to_string(), "Upstream exploded");
	assert_eq!(h.backend.renewal_calls(), 0);
}

#[tokio::test]
async fn network_errors_bypass_renewal() {
	let h = harness(FakeBackend { data_unreachable: true, ..Default::default() }, "/dashboard");
	let err = h.client.get::<Jobs>("/jobs").await.expect_err("Network failure should be final.");

	assert!(err.is_network());
	assert_eq!(h.backend.renewal_calls(), 0);
}

#[tokio::test]
async fn explicit_renewal_joins_in_flight_ticket() -> EyreResult<()> {
	let h = harness(FakeBackend::default(), "/dashboard");
	let (jobs, renewed) = tokio::join!(h.client.get::<Jobs>("/jobs"), h.client.renew_session());

	jobs?;
	renewed?;

	assert_eq!(h.backend.renewal_calls(), 1);

	// The ticket is gone once everyone has observed it; the next expiry renews again.
	h.client.renew_session().await?;

	assert_eq!(h.backend.renewal_calls(), 2);

	Ok(())
}

#[tokio::test]
async fn late_unauthorized_reuses_failed_renewal() {
	let h = harness(
		FakeBackend { renewal_fails: true, slow_path: Some("/slow"), ..Default::default() },
		"/dashboard",
	);
	let (fast, slow) = tokio::join!(h.client.get::<Jobs>("/fast"), h.client.get::<Jobs>("/slow"));

	for result in [fast, slow] {
		let err = result.expect_err("Unrenewable sessions should fail.");

		assert!(err.is_unauthorized());
		assert_eq!(err.to_string(), "Access token expired");
	}

	assert_eq!(h.backend.renewal_calls(), 1, "A 401 that predates the verdict must not renew.");
	assert_eq!(h.navigator.navigations(), vec!["/auth/login".to_string()]);
	assert_eq!(h.client.metrics().redirects(), 1);
	assert_eq!(h.client.metrics().retries(), 0);
}

#[tokio::test]
async fn late_unauthorized_retries_on_settled_renewal() -> EyreResult<()> {
	let h = harness(FakeBackend { slow_path: Some("/slow"), ..Default::default() }, "/dashboard");
	let (fast, slow) = tokio::join!(h.client.get::<Jobs>("/fast"), h.client.get::<Jobs>("/slow"));

	fast?;
	slow?;

	assert_eq!(h.backend.renewal_calls(), 1);
	assert_eq!(h.client.metrics().retries(), 2);
	assert!(h.backend.seen().contains(&("/slow".to_string(), true)));

	// Requests sent after the renewal settled renew again on their own 401.
	h.backend.session_valid.store(false, Ordering::SeqCst);

	let _: Jobs = h.client.get("/fast").await?;

	assert_eq!(h.backend.renewal_calls(), 2);

	Ok(())
}

//! Transport primitives for session-aware API calls.
//!
//! The module exposes [`ApiTransport`] alongside [`ApiResponse`] so hosts can plug in a custom
//! HTTP stack without losing the client's error normalization. Every implementation must:
//!
//! - issue exactly one network call per [`ApiTransport::execute`] invocation;
//! - attach the session credential ambiently (cookie jar, connection state), never through the
//!   descriptor;
//! - hand non-2xx responses to [`ApiResponse::into_result`] so failures share one shape;
//! - report calls that never produced a response as
//!   [`TransportError`](crate::error::TransportError).

// crates.io
use serde::de::DeserializeOwned;
use time::format_description::well_known::Rfc2822;
#[cfg(feature = "reqwest")]
use reqwest::{
	StatusCode,
	header::{ACCEPT, HeaderMap, HeaderName, HeaderValue},
};
// self
use crate::{_prelude::*, call::CallDescriptor};
#[cfg(feature = "reqwest")]
use crate::{
	call::Method,
	config::ClientConfig,
	error::{ConfigError, TransportError},
};

#[cfg(feature = "reqwest")]
const X_TIMESTAMP: HeaderName = HeaderName::from_static("x-timestamp");

/// Boxed future returned by [`ApiTransport::execute`].
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<ApiResponse>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing a single API call.
///
/// The trait is the client's only dependency on an HTTP implementation. Implementations must be
/// `Send + Sync + 'static` so one instance can be shared by every clone of a
/// [`SessionClient`](crate::session::SessionClient).
pub trait ApiTransport
where
	Self: 'static + Send + Sync,
{
	/// Issues one call described by `call` and normalizes the outcome.
	fn execute<'a>(&'a self, call: &'a CallDescriptor) -> TransportFuture<'a>;
}

/// Raw 2xx response handed back to callers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers keyed by lower-case name; repeated headers keep the last value.
	pub headers: BTreeMap<String, String>,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Creates a response without headers.
	pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
		Self { status, headers: BTreeMap::new(), body: body.into() }
	}

	/// Adds a header (name is lower-cased).
	pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
		self.headers.insert(name.to_ascii_lowercase(), value.into());

		self
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Passes 2xx responses through and converts everything else into the uniform error shape.
	pub fn into_result(self) -> Result<Self> {
		if self.is_success() {
			return Ok(self);
		}

		let message = extract_message(&self.body)
			.unwrap_or_else(|| format!("HTTP {}: {}", self.status, status_text(self.status)));

		if self.status == 401 {
			return Err(Error::Unauthorized { message });
		}

		Err(Error::Http {
			status: self.status,
			message,
			retry_after: self
				.headers
				.get("retry-after")
				.map(String::as_str)
				.and_then(parse_retry_after),
		})
	}

	/// Decodes the body as JSON; an empty body decodes as `null`.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let body: &[u8] = if self.body.iter().all(u8::is_ascii_whitespace) {
			b"null"
		} else {
			&self.body
		};
		let mut de = serde_json::Deserializer::from_slice(body);

		serde_path_to_error::deserialize(&mut de)
			.map_err(|source| Error::Decode { status: self.status, source })
	}

	/// Returns the body as UTF-8 text, replacing invalid sequences.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}

/// Pulls a human-readable `message` out of an error body, if the body carries one.
///
/// The backend's error shape is not guaranteed, so anything other than a JSON object with a
/// non-empty string `message` yields `None`.
pub fn extract_message(body: &[u8]) -> Option<String> {
	let value = serde_json::from_slice::<serde_json::Value>(body).ok()?;
	let message = value.get("message")?.as_str()?.trim();

	if message.is_empty() { None } else { Some(message.to_owned()) }
}

#[cfg(feature = "reqwest")]
fn status_text(status: u16) -> &'static str {
	StatusCode::from_u16(status)
		.ok()
		.and_then(|status| status.canonical_reason())
		.unwrap_or("Unknown Status")
}
#[cfg(not(feature = "reqwest"))]
fn status_text(status: u16) -> &'static str {
	match status {
		400 => "Bad Request",
		401 => "Unauthorized",
		403 => "Forbidden",
		404 => "Not Found",
		409 => "Conflict",
		422 => "Unprocessable Entity",
		429 => "Too Many Requests",
		500 => "Internal Server Error",
		502 => "Bad Gateway",
		503 => "Service Unavailable",
		504 => "Gateway Timeout",
		_ => "Unknown Status",
	}
}

fn parse_retry_after(raw: &str) -> Option<Duration> {
	let raw = raw.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

/// Default transport backed by a cookie-carrying [`ReqwestClient`].
///
/// The cookie jar is the ambient credential mechanism: `Set-Cookie` headers issued by the
/// renewal endpoint are replayed on every later call without the caller touching them.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
	client: ReqwestClient,
	config: ClientConfig,
}
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds a transport with its own cookie jar.
	pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder()
			.cookie_store(true)
			.build()
			.map_err(ConfigError::http_client_build)?;

		Ok(Self::with_client(client, config))
	}

	/// Wraps an existing [`ReqwestClient`].
	///
	/// The client must keep cookies (`cookie_store(true)` or a provider) for renewals to take
	/// effect on later calls.
	pub fn with_client(client: ReqwestClient, config: &ClientConfig) -> Self {
		Self { client, config: config.clone() }
	}

	/// Default headers followed by the descriptor's own; a descriptor header replaces a default
	/// of the same name.
	fn request_headers(&self, call: &CallDescriptor) -> Result<HeaderMap, ConfigError> {
		let mut headers = HeaderMap::new();

		headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

		if self.config.cache_buster {
			let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;

			headers.insert(X_TIMESTAMP, HeaderValue::from(millis as i64));
		}
		for (name, value) in &call.headers {
			let invalid = || ConfigError::InvalidHeader { name: name.clone() };
			let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
			let header_value = HeaderValue::from_str(value).map_err(|_| invalid())?;

			headers.insert(header_name, header_value);
		}

		Ok(headers)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.client
	}
}
#[cfg(feature = "reqwest")]
impl ApiTransport for ReqwestTransport {
	fn execute<'a>(&'a self, call: &'a CallDescriptor) -> TransportFuture<'a> {
		Box::pin(async move {
			let url = self.config.endpoint(&call.path)?;
			let mut request = self
				.client
				.request(reqwest_method(call.method), url)
				.timeout(call.timeout.unwrap_or(self.config.default_timeout))
				.headers(self.request_headers(call)?);

			if let Some(body) = &call.body {
				request = request.json(body);
			}

			let response = request.send().await.map_err(|e| map_reqwest_error(&call.path, e))?;
			let status = response.status().as_u16();
			let headers = collect_headers(response.headers());
			let body = response.bytes().await.map_err(|e| map_reqwest_error(&call.path, e))?;

			ApiResponse { status, headers, body: body.to_vec() }.into_result()
		})
	}
}

#[cfg(feature = "reqwest")]
fn reqwest_method(method: Method) -> reqwest::Method {
	match method {
		Method::Get => reqwest::Method::GET,
		Method::Post => reqwest::Method::POST,
		Method::Put => reqwest::Method::PUT,
		Method::Delete => reqwest::Method::DELETE,
	}
}

#[cfg(feature = "reqwest")]
fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
	headers
		.iter()
		.filter_map(|(name, value)| {
			value.to_str().ok().map(|value| (name.as_str().to_owned(), value.to_owned()))
		})
		.collect()
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(path: &str, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::http_client_build(err).into();
	}
	if err.is_timeout() {
		return TransportError::Timeout { path: path.to_owned() }.into();
	}

	TransportError::network(path, err).into()
}

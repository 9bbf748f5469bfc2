//! Client-level error types shared by the transport, the renewal coordinator, and callers.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
///
/// Callers only ever see the terminal outcome of a call: renewal and the single retry happen
/// inside the client.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// No response reached the caller (DNS, TCP, TLS, deadline).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// The backend answered 401; the session credential is missing or expired.
	#[error("{message}")]
	Unauthorized {
		/// Message extracted from the response body, or the generic status line.
		message: String,
	},
	/// The backend answered with any other non-2xx status.
	#[error("{message}")]
	Http {
		/// HTTP status code.
		status: u16,
		/// Message extracted from the response body, or the generic status line.
		message: String,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// The renewal endpoint itself failed.
	///
	/// Only surfaced by an explicit
	/// [`SessionClient::renew_session`](crate::session::SessionClient::renew_session); calls that
	/// triggered a renewal receive their original [`Error::Unauthorized`] instead.
	#[error("Session renewal failed: {reason}.")]
	RenewalFailed {
		/// Human-readable summary of the renewal failure.
		reason: String,
	},
	/// A 2xx response body could not be decoded into the requested type.
	#[error("Response body could not be decoded.")]
	Decode {
		/// HTTP status code of the response.
		status: u16,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl Error {
	/// Returns the HTTP status associated with the failure, when a response was received.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Unauthorized { .. } => Some(401),
			Self::Http { status, .. } | Self::Decode { status, .. } => Some(*status),
			_ => None,
		}
	}

	/// Returns `true` for authorization failures that may trigger a session renewal.
	pub fn is_unauthorized(&self) -> bool {
		matches!(self, Self::Unauthorized { .. })
	}

	/// Returns `true` when no response reached the client.
	pub fn is_network(&self) -> bool {
		matches!(self, Self::Transport(_))
	}
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Base URL cannot be parsed.
	#[error("Base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URL uses a scheme other than HTTP(S).
	#[error("Base URL must use http or https: {url}.")]
	UnsupportedScheme {
		/// URL that failed validation.
		url: String,
	},
	/// Base URL carries a query string or fragment.
	#[error("Base URL must not carry a query or fragment: {url}.")]
	BaseUrlNotAPrefix {
		/// URL that failed validation.
		url: String,
	},
	/// A route or endpoint path does not start with `/`.
	#[error("The {field} value must start with '/': {value}.")]
	RelativePath {
		/// Which configuration field failed validation.
		field: &'static str,
		/// Offending value.
		value: String,
	},
	/// Timeout must be strictly positive.
	#[error("The default timeout must be greater than zero.")]
	ZeroTimeout,
	/// Timeout environment override is not a number of milliseconds.
	#[error("The timeout override `{value}` is not a whole number of milliseconds.")]
	InvalidTimeout {
		/// Raw environment value.
		value: String,
	},
	/// A per-call header name or value is not valid HTTP.
	#[error("Header `{name}` is not a valid HTTP header.")]
	InvalidHeader {
		/// Header name as supplied by the caller.
		name: String,
	},
	/// Request body cannot be serialized to JSON.
	#[error("Request body cannot be serialized.")]
	Body(#[from] serde_json::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Transport-level failures where no HTTP response was received.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {path}.")]
	Network {
		/// Request path that failed.
		path: String,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The call exceeded its deadline.
	#[error("Request to {path} timed out.")]
	Timeout {
		/// Request path that timed out.
		path: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		path: impl Into<String>,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { path: path.into(), source: Box::new(src) }
	}
}

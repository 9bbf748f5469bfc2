//! Client configuration with validated builder helpers.
//!
//! [`ClientConfig`] is plain data: it can be deserialized from a host's configuration file,
//! assembled with [`ClientConfigBuilder`], or read from the environment with
//! [`ClientConfig::from_env`]. Every constructor funnels through the same validation.

// std
use std::env;
// self
use crate::{_prelude::*, error::ConfigError};

/// Environment variable holding the API base URL.
pub const BASE_URL_ENV: &str = "API_BASE_URL";
/// Environment variable holding the default timeout in milliseconds.
pub const TIMEOUT_ENV: &str = "API_TIMEOUT_MS";
/// Base URL used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8088";
/// Renewal endpoint path relative to the base URL.
pub const DEFAULT_RENEWAL_PATH: &str = "/auth-service/api/auth/refresh-token";
/// Login entry point used by the redirect gate.
pub const DEFAULT_LOGIN_ROUTE: &str = "/auth/login";
/// Routes that belong to the unauthenticated flow.
pub const DEFAULT_UNAUTHENTICATED_ROUTES: [&str; 4] =
	["/auth/login", "/auth/register", "/auth/forgot-password", "/auth/otp-verification"];
/// Deadline applied to calls that do not override it.
pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(10);

/// Immutable, validated client configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawClientConfig", into = "RawClientConfig")]
pub struct ClientConfig {
	/// Prefix every request path is appended to.
	pub base_url: Url,
	/// Deadline for calls without a per-call override, including the renewal call.
	pub default_timeout: StdDuration,
	/// Renewal endpoint path.
	pub renewal_path: String,
	/// Route the redirect gate navigates to.
	pub login_route: String,
	/// Route prefixes exempt from forced redirects.
	pub unauthenticated_routes: Vec<String>,
	/// Sends `X-Timestamp` on every call to defeat intermediary caches.
	pub cache_buster: bool,
}
impl ClientConfig {
	/// Creates a new builder seeded with the defaults.
	pub fn builder() -> ClientConfigBuilder {
		ClientConfigBuilder::default()
	}

	/// Builds a configuration from `API_BASE_URL` and `API_TIMEOUT_MS`.
	///
	/// Unset or empty variables fall back to the defaults.
	pub fn from_env() -> Result<Self, ConfigError> {
		let mut builder = Self::builder();

		if let Some(base) = env::var(BASE_URL_ENV).ok().filter(|v| !v.trim().is_empty()) {
			builder = builder.base_url(base.trim());
		}
		if let Some(raw) = env::var(TIMEOUT_ENV).ok().filter(|v| !v.trim().is_empty()) {
			let millis = raw
				.trim()
				.parse::<u64>()
				.map_err(|_| ConfigError::InvalidTimeout { value: raw.clone() })?;

			builder = builder.default_timeout(StdDuration::from_millis(millis));
		}

		builder.build()
	}

	/// Joins `path` onto the base URL with exactly one `/` at the seam.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		let base = self.base_url.as_str().trim_end_matches('/');
		let path = path.trim_start_matches('/');

		Url::parse(&format!("{base}/{path}"))
			.map_err(|source| ConfigError::InvalidBaseUrl { source })
	}

	/// Full URL of the renewal endpoint.
	pub fn renewal_url(&self) -> Result<Url, ConfigError> {
		self.endpoint(&self.renewal_path)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		match self.base_url.scheme() {
			"http" | "https" => {},
			_ => return Err(ConfigError::UnsupportedScheme { url: self.base_url.to_string() }),
		}
		if self.base_url.query().is_some() || self.base_url.fragment().is_some() {
			return Err(ConfigError::BaseUrlNotAPrefix { url: self.base_url.to_string() });
		}
		if self.default_timeout.is_zero() {
			return Err(ConfigError::ZeroTimeout);
		}

		validate_path("renewal_path", &self.renewal_path)?;
		validate_path("login_route", &self.login_route)?;

		for route in &self.unauthenticated_routes {
			validate_path("unauthenticated_routes", route)?;
		}

		Ok(())
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
	base_url: Option<String>,
	default_timeout: Option<StdDuration>,
	renewal_path: Option<String>,
	login_route: Option<String>,
	unauthenticated_routes: Option<Vec<String>>,
	cache_buster: Option<bool>,
}
impl ClientConfigBuilder {
	/// Sets the base URL.
	pub fn base_url(mut self, url: impl Into<String>) -> Self {
		self.base_url = Some(url.into());

		self
	}

	/// Sets the default per-call deadline.
	pub fn default_timeout(mut self, timeout: StdDuration) -> Self {
		self.default_timeout = Some(timeout);

		self
	}

	/// Overrides the renewal endpoint path.
	pub fn renewal_path(mut self, path: impl Into<String>) -> Self {
		self.renewal_path = Some(path.into());

		self
	}

	/// Overrides the login route.
	pub fn login_route(mut self, route: impl Into<String>) -> Self {
		self.login_route = Some(route.into());

		self
	}

	/// Replaces the unauthenticated route prefixes.
	pub fn unauthenticated_routes<I, S>(mut self, routes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.unauthenticated_routes = Some(routes.into_iter().map(Into::into).collect());

		self
	}

	/// Toggles the `X-Timestamp` header.
	pub fn cache_buster(mut self, enabled: bool) -> Self {
		self.cache_buster = Some(enabled);

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let base_url = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
		let base_url =
			Url::parse(base_url).map_err(|source| ConfigError::InvalidBaseUrl { source })?;
		let config = ClientConfig {
			base_url,
			default_timeout: self.default_timeout.unwrap_or(DEFAULT_TIMEOUT),
			renewal_path: self.renewal_path.unwrap_or_else(|| DEFAULT_RENEWAL_PATH.into()),
			login_route: self.login_route.unwrap_or_else(|| DEFAULT_LOGIN_ROUTE.into()),
			unauthenticated_routes: self.unauthenticated_routes.unwrap_or_else(|| {
				DEFAULT_UNAUTHENTICATED_ROUTES.iter().map(|route| route.to_string()).collect()
			}),
			cache_buster: self.cache_buster.unwrap_or(true),
		};

		config.validate()?;

		Ok(config)
	}
}

#[derive(Deserialize, Serialize)]
struct RawClientConfig {
	#[serde(default)]
	base_url: Option<String>,
	#[serde(default)]
	default_timeout_ms: Option<u64>,
	#[serde(default)]
	renewal_path: Option<String>,
	#[serde(default)]
	login_route: Option<String>,
	#[serde(default)]
	unauthenticated_routes: Option<Vec<String>>,
	#[serde(default)]
	cache_buster: Option<bool>,
}
impl TryFrom<RawClientConfig> for ClientConfig {
	type Error = ConfigError;

	fn try_from(raw: RawClientConfig) -> Result<Self, Self::Error> {
		ClientConfigBuilder {
			base_url: raw.base_url,
			default_timeout: raw.default_timeout_ms.map(StdDuration::from_millis),
			renewal_path: raw.renewal_path,
			login_route: raw.login_route,
			unauthenticated_routes: raw.unauthenticated_routes,
			cache_buster: raw.cache_buster,
		}
		.build()
	}
}
impl From<ClientConfig> for RawClientConfig {
	fn from(config: ClientConfig) -> Self {
		Self {
			base_url: Some(config.base_url.into()),
			default_timeout_ms: Some(
				u64::try_from(config.default_timeout.as_millis()).unwrap_or(u64::MAX),
			),
			renewal_path: Some(config.renewal_path),
			login_route: Some(config.login_route),
			unauthenticated_routes: Some(config.unauthenticated_routes),
			cache_buster: Some(config.cache_buster),
		}
	}
}

fn validate_path(field: &'static str, value: &str) -> Result<(), ConfigError> {
	if value.starts_with('/') {
		Ok(())
	} else {
		Err(ConfigError::RelativePath { field, value: value.to_owned() })
	}
}

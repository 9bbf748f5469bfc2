//! Auth-service endpoints the front end talks to directly.
//!
//! These helpers only shape requests and read the session signal; credential checks, password
//! rules, and OAuth provider flows all live in the backend.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	call::CallDescriptor,
	http::ApiTransport,
	session::{AuthState, SessionClient},
};

/// Login endpoint.
pub const LOGIN_PATH: &str = "/auth-service/api/auth/login";
/// Developer registration endpoint.
pub const REGISTER_DEVELOPER_PATH: &str = "/auth-service/api/auth/register/developer";
/// Recruiter registration endpoint.
pub const REGISTER_RECRUITER_PATH: &str = "/auth-service/api/auth/register/recruiter";
/// Current-user endpoint.
pub const ME_PATH: &str = "/auth-service/api/auth/me";
/// Logout endpoint.
pub const LOGOUT_PATH: &str = "/auth-service/api/auth/logout";
/// Liveness endpoint.
pub const HEALTH_PATH: &str = "/health";

const HEALTH_TIMEOUT: StdDuration = StdDuration::from_secs(5);

/// Username/password pair submitted to the login endpoint.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginCredentials {
	/// Account username.
	pub username: String,
	/// Account password.
	pub password: String,
}
impl LoginCredentials {
	/// Creates a credential pair.
	pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
		Self { username: username.into(), password: password.into() }
	}
}
impl Debug for LoginCredentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LoginCredentials")
			.field("username", &self.username)
			.field("password", &"<redacted>")
			.finish()
	}
}

/// Account role chosen at registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
	/// Developer accounts.
	Developer,
	/// Recruiter accounts, optionally tied to a company.
	Recruiter,
}
impl Role {
	/// Registration endpoint for this role.
	pub const fn register_path(self) -> &'static str {
		match self {
			Role::Developer => REGISTER_DEVELOPER_PATH,
			Role::Recruiter => REGISTER_RECRUITER_PATH,
		}
	}
}

/// Registration form.
#[derive(Clone, Debug)]
pub struct RegisterData {
	/// Explicit username; defaults to the local part of `email`.
	pub username: Option<String>,
	/// Display name.
	pub name: String,
	/// Email address.
	pub email: String,
	/// Phone number.
	pub phone: String,
	/// Date of birth as sent by the form (`YYYY-MM-DD`).
	pub date_of_birth: Option<String>,
	/// Account password.
	pub password: String,
	/// Account role.
	pub role: Role,
	/// Company identifier; only sent for recruiters.
	pub company_id: Option<String>,
}
impl RegisterData {
	fn payload(&self) -> RegisterPayload<'_> {
		let username = match self.username.as_deref().filter(|name| !name.is_empty()) {
			Some(name) => name,
			None => self.email.split('@').next().unwrap_or_default(),
		};
		let company_id = match self.role {
			Role::Recruiter => self.company_id.as_deref(),
			Role::Developer => None,
		};

		RegisterPayload {
			username,
			name: &self.name,
			email: &self.email,
			phone: &self.phone,
			date_of_birth: self.date_of_birth.as_deref(),
			password: &self.password,
			company_id,
		}
	}
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterPayload<'a> {
	username: &'a str,
	name: &'a str,
	email: &'a str,
	phone: &'a str,
	#[serde(skip_serializing_if = "Option::is_none")]
	date_of_birth: Option<&'a str>,
	password: &'a str,
	#[serde(skip_serializing_if = "Option::is_none")]
	company_id: Option<&'a str>,
}

/// Body returned by login and registration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
	/// Human-readable status message.
	#[serde(default)]
	pub message: Option<String>,
	/// User record as returned by the backend.
	#[serde(default)]
	pub user: Option<serde_json::Value>,
}

impl<T> SessionClient<T>
where
	T: ?Sized + ApiTransport,
{
	/// Submits credentials; the backend answers with session cookies.
	pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthResponse> {
		let response: AuthResponse = self.post(LOGIN_PATH, credentials).await?;

		self.set_auth_state(AuthState::Authenticated);

		Ok(response)
	}

	/// Registers a developer or recruiter account.
	pub async fn register(&self, data: &RegisterData) -> Result<AuthResponse> {
		self.post(data.role.register_path(), &data.payload()).await
	}

	/// Fetches the signed-in user, or `None` when the session is gone.
	///
	/// A 401 still goes through renewal first; only the terminal 401 maps to `None`.
	pub async fn current_user<U>(&self) -> Result<Option<U>>
	where
		U: DeserializeOwned,
	{
		match self.get::<U>(ME_PATH).await {
			Ok(user) => {
				self.set_auth_state(AuthState::Authenticated);

				Ok(Some(user))
			},
			Err(err) if err.is_unauthorized() => {
				self.set_auth_state(AuthState::Unauthenticated);

				Ok(None)
			},
			Err(err) => Err(err),
		}
	}

	/// Ends the session; backend failures are logged and otherwise ignored.
	pub async fn logout(&self) {
		if let Err(err) = self.execute(CallDescriptor::post(LOGOUT_PATH)).await {
			#[cfg(feature = "tracing")]
			tracing::warn!(error = %err, "logout call failed");
			#[cfg(not(feature = "tracing"))]
			let _ = err;
		}

		self.set_auth_state(AuthState::Unauthenticated);
	}

	/// Probes backend liveness with a short deadline; never renews and never errors.
	pub async fn health_check(&self) -> bool {
		let call = CallDescriptor::get(HEALTH_PATH).with_timeout(HEALTH_TIMEOUT);

		self.transport().execute(&call).await.is_ok_and(|response| response.status == 200)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn form(role: Role) -> RegisterData {
		RegisterData {
			username: None,
			name: "Ada".into(),
			email: "ada@example.com".into(),
			phone: "+1 555 0100".into(),
			date_of_birth: None,
			password: "hunter22".into(),
			role,
			company_id: Some("acme".into()),
		}
	}

	#[test]
	fn username_defaults_to_email_local_part() {
		let data = form(Role::Developer);
		let payload = serde_json::to_value(data.payload()).expect("Payload should serialize.");

		assert_eq!(payload["username"], "ada");
		assert!(payload.get("dateOfBirth").is_none());
		assert!(payload.get("companyId").is_none());
		assert_eq!(data.role.register_path(), REGISTER_DEVELOPER_PATH);
	}

	#[test]
	fn recruiters_carry_company_id() {
		let mut data = form(Role::Recruiter);

		data.username = Some("ada-hr".into());
		data.date_of_birth = Some("1990-12-10".into());

		let payload = serde_json::to_value(data.payload()).expect("Payload should serialize.");

		assert_eq!(payload["username"], "ada-hr");
		assert_eq!(payload["companyId"], "acme");
		assert_eq!(payload["dateOfBirth"], "1990-12-10");
	}

	#[test]
	fn credentials_debug_redacts_password() {
		let rendered = format!("{:?}", LoginCredentials::new("ada", "hunter22"));

		assert!(rendered.contains("ada"));
		assert!(!rendered.contains("hunter22"));
	}
}

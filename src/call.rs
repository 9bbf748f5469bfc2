//! Per-invocation call descriptors.
//!
//! A [`CallDescriptor`] lives for exactly one logical call. Its `retried` flag flips at most once,
//! when the client resubmits it after a successful session renewal.

// self
use crate::{_prelude::*, error::ConfigError};

/// HTTP verbs supported by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `DELETE`
	Delete,
}
impl Method {
	/// Returns the canonical verb label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Delete => "DELETE",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Everything the transport needs to issue one call.
#[derive(Clone, Debug, PartialEq)]
pub struct CallDescriptor {
	/// HTTP verb.
	pub method: Method,
	/// Path appended to the configured base URL.
	pub path: String,
	/// Optional JSON body.
	pub body: Option<serde_json::Value>,
	/// Extra headers for this call only.
	pub headers: BTreeMap<String, String>,
	/// Per-call deadline overriding the configured default.
	pub timeout: Option<StdDuration>,
	retried: bool,
}
impl CallDescriptor {
	/// Creates a descriptor without a body.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			body: None,
			headers: BTreeMap::new(),
			timeout: None,
			retried: false,
		}
	}

	/// Shorthand for a `GET` descriptor.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::Get, path)
	}

	/// Shorthand for a `POST` descriptor.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::Post, path)
	}

	/// Shorthand for a `PUT` descriptor.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::Put, path)
	}

	/// Shorthand for a `DELETE` descriptor.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::Delete, path)
	}

	/// Attaches an already-encoded JSON body.
	pub fn with_json(mut self, body: serde_json::Value) -> Self {
		self.body = Some(body);

		self
	}

	/// Serializes `body` and attaches it.
	pub fn with_body<B>(self, body: &B) -> Result<Self, ConfigError>
	where
		B: ?Sized + Serialize,
	{
		Ok(self.with_json(serde_json::to_value(body)?))
	}

	/// Adds or replaces a header for this call, overriding any default of the same name.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());

		self
	}

	/// Overrides the deadline for this call.
	pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Whether this descriptor has already been resubmitted after a renewal.
	pub fn retried(&self) -> bool {
		self.retried
	}

	/// Marks the descriptor as retried; only the first call has an effect.
	pub(crate) fn mark_retried(&mut self) {
		self.retried = true;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn descriptor_starts_unretried_and_flips_once() {
		let mut call = CallDescriptor::get("/jobs").with_header("x-trace", "1");

		assert!(!call.retried());

		call.mark_retried();
		call.mark_retried();

		assert!(call.retried());
		assert_eq!(call.headers.get("x-trace").map(String::as_str), Some("1"));
	}

	#[test]
	fn body_serialization_keeps_field_names() {
		#[derive(Serialize)]
		#[serde(rename_all = "camelCase")]
		struct Payload {
			date_of_birth: &'static str,
		}

		let call = CallDescriptor::post("/users")
			.with_body(&Payload { date_of_birth: "1990-01-01" })
			.expect("Payload should serialize.");

		assert_eq!(call.body, Some(serde_json::json!({ "dateOfBirth": "1990-01-01" })));
		assert_eq!(call.method.to_string(), "POST");
	}
}

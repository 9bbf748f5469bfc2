//! Redirect gate invoked when a session cannot be renewed.
//!
//! The gate reads the host's current route and navigates to the login entry point unless the
//! route already belongs to the unauthenticated flow. It never fails: both host capabilities are
//! infallible and a misbehaving host can at worst skip a navigation.

// self
use crate::{
	_prelude::*,
	config::ClientConfig,
	obs::{self, SessionEvent},
};

/// Host capability that performs a full navigation.
pub trait Navigator
where
	Self: Send + Sync,
{
	/// Navigates to `route`.
	fn navigate(&self, route: &str);
}
impl<F> Navigator for F
where
	F: Fn(&str) + Send + Sync,
{
	fn navigate(&self, route: &str) {
		self(route)
	}
}

/// Host capability that reports the route currently displayed.
pub trait RouteSource
where
	Self: Send + Sync,
{
	/// Returns the current route path (e.g. `/dashboard`).
	fn current_route(&self) -> String;
}
impl<F> RouteSource for F
where
	F: Fn() -> String + Send + Sync,
{
	fn current_route(&self) -> String {
		self()
	}
}

/// What the gate did for one renewal failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RedirectDecision {
	/// Navigation to the login route was triggered.
	Navigated {
		/// Route the user was on.
		from: String,
	},
	/// Route already belongs to the unauthenticated flow.
	Suppressed {
		/// Route the user was on.
		from: String,
	},
}

/// Decides whether a renewal failure forces navigation to the login route.
#[derive(Clone)]
pub struct RedirectGate {
	login_route: String,
	unauthenticated_routes: Vec<String>,
	navigator: Arc<dyn Navigator>,
	routes: Arc<dyn RouteSource>,
}
impl RedirectGate {
	/// Creates a gate from the configured routes and the host's capabilities.
	pub fn new(
		config: &ClientConfig,
		navigator: Arc<dyn Navigator>,
		routes: Arc<dyn RouteSource>,
	) -> Self {
		Self {
			login_route: config.login_route.clone(),
			unauthenticated_routes: config.unauthenticated_routes.clone(),
			navigator,
			routes,
		}
	}

	/// Whether `route` starts with any unauthenticated prefix.
	pub fn is_unauthenticated_route(&self, route: &str) -> bool {
		self.unauthenticated_routes.iter().any(|prefix| route.starts_with(prefix.as_str()))
	}

	/// Runs the gate for one failed renewal.
	pub fn on_renewal_failure(&self) -> RedirectDecision {
		let from = self.routes.current_route();

		if self.is_unauthenticated_route(&from) {
			obs::observe(SessionEvent::RedirectSuppressed, &from);

			return RedirectDecision::Suppressed { from };
		}

		obs::observe(SessionEvent::RedirectNavigated, &from);
		self.navigator.navigate(&self.login_route);

		RedirectDecision::Navigated { from }
	}
}
impl Debug for RedirectGate {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RedirectGate")
			.field("login_route", &self.login_route)
			.field("unauthenticated_routes", &self.unauthenticated_routes)
			.finish()
	}
}

/// Navigator that records every navigation instead of performing it.
///
/// Useful for headless hosts (CLIs, workers) that surface "please log in" themselves.
#[derive(Clone, Debug, Default)]
pub struct RecordingNavigator(Arc<Mutex<Vec<String>>>);
impl RecordingNavigator {
	/// Routes navigated to so far, oldest first.
	pub fn navigations(&self) -> Vec<String> {
		self.0.lock().clone()
	}
}
impl Navigator for RecordingNavigator {
	fn navigate(&self, route: &str) {
		self.0.lock().push(route.to_owned());
	}
}

/// Route holder shared between the host and the client.
#[derive(Clone, Debug)]
pub struct SharedRoute(Arc<RwLock<String>>);
impl SharedRoute {
	/// Starts at `route`.
	pub fn new(route: impl Into<String>) -> Self {
		Self(Arc::new(RwLock::new(route.into())))
	}

	/// Replaces the current route.
	pub fn set(&self, route: impl Into<String>) {
		*self.0.write() = route.into();
	}
}
impl RouteSource for SharedRoute {
	fn current_route(&self) -> String {
		self.0.read().clone()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn gate(route: &SharedRoute, navigator: &RecordingNavigator) -> RedirectGate {
		let config = ClientConfig::builder().build().expect("Defaults should validate.");

		RedirectGate::new(&config, Arc::new(navigator.clone()), Arc::new(route.clone()))
	}

	#[test]
	fn protected_route_navigates_to_login() {
		let route = SharedRoute::new("/dashboard");
		let navigator = RecordingNavigator::default();
		let decision = gate(&route, &navigator).on_renewal_failure();

		assert_eq!(decision, RedirectDecision::Navigated { from: "/dashboard".into() });
		assert_eq!(navigator.navigations(), vec!["/auth/login".to_string()]);
	}

	#[test]
	fn unauthenticated_routes_suppress_navigation() {
		let route = SharedRoute::new("/auth/login");
		let navigator = RecordingNavigator::default();
		let gate = gate(&route, &navigator);

		for current in ["/auth/login", "/auth/register?ref=x", "/auth/otp-verification/step-2"] {
			route.set(current);

			assert!(matches!(gate.on_renewal_failure(), RedirectDecision::Suppressed { .. }));
		}

		assert!(navigator.navigations().is_empty());
	}

	#[test]
	fn prefix_match_is_literal() {
		let route = SharedRoute::new("/");
		let navigator = RecordingNavigator::default();
		let gate = gate(&route, &navigator);

		assert!(gate.is_unauthenticated_route("/auth/forgot-password"));
		assert!(!gate.is_unauthenticated_route("/settings/auth/login"));
		assert!(!gate.is_unauthenticated_route("/auth"));
	}

	#[test]
	fn closures_serve_as_host_capabilities() {
		let hits = Arc::new(Mutex::new(0_u32));
		let counter = hits.clone();
		let config = ClientConfig::builder()
			.login_route("/signin")
			.build()
			.expect("Custom login route should validate.");
		let gate = RedirectGate::new(
			&config,
			Arc::new(move |route: &str| {
				assert_eq!(route, "/signin");

				*counter.lock() += 1;
			}),
			Arc::new(|| "/settings".to_string()),
		);

		gate.on_renewal_failure();

		assert_eq!(*hits.lock(), 1);
	}
}

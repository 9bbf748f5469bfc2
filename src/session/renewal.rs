//! Single-flight session renewal.
//!
//! The coordinator owns the only shared mutable state in the client: the renewal ticket. A
//! ticket is an `Arc<OnceCell<RenewalOutcome>>`; the first caller that sees a 401 with no ticket
//! outstanding creates it, and every caller that arrives while it is outstanding attaches to the
//! same cell. The renewal call runs inside `OnceCell::get_or_init`, so it executes once per
//! ticket and all attached waiters wake together with the same outcome.
//!
//! Settling a ticket clears the slot, bumps the renewal generation, and records the outcome. A
//! caller that snapshots the generation before sending its request and sees a 401 only after a
//! renewal settled reuses that outcome instead of opening a new ticket, so a late 401 never
//! repeats a renewal the backend just answered or runs the redirect gate a second time.

// crates.io
use async_lock::OnceCell;
// self
use crate::{
	_prelude::*,
	call::CallDescriptor,
	http::ApiTransport,
	obs::{self, SessionEvent},
	redirect::{RedirectDecision, RedirectGate},
	session::SessionMetrics,
};

type Ticket = Arc<OnceCell<RenewalOutcome>>;

#[derive(Default)]
struct RenewalSlot {
	ticket: Option<Ticket>,
	generation: u64,
	last: Option<RenewalOutcome>,
}

enum Attachment {
	Settled(RenewalOutcome),
	Waiting(Ticket),
}

/// Result of one renewal ticket, shared by every waiter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenewalOutcome {
	/// The backend issued fresh credentials through the ambient mechanism.
	Renewed,
	/// The renewal call failed, timed out, or never reached the backend.
	Failed {
		/// Human-readable failure summary.
		reason: String,
	},
}

/// Coarse authentication signal exposed to the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AuthState {
	/// Nothing has been learned about the session yet.
	#[default]
	Unknown,
	/// The session was renewed or confirmed.
	Authenticated,
	/// The session could not be renewed or was closed.
	Unauthenticated,
}

/// Guarantees at most one renewal call in flight and fans its outcome out to every waiter.
pub struct RenewalCoordinator<T>
where
	T: ?Sized + ApiTransport,
{
	transport: Arc<T>,
	gate: RedirectGate,
	renewal_path: String,
	metrics: Arc<SessionMetrics>,
	slot: Mutex<RenewalSlot>,
	state: RwLock<AuthState>,
}
impl<T> RenewalCoordinator<T>
where
	T: ?Sized + ApiTransport,
{
	/// Creates a coordinator that renews through `transport` at `renewal_path`.
	pub fn new(
		transport: Arc<T>,
		gate: RedirectGate,
		renewal_path: impl Into<String>,
		metrics: Arc<SessionMetrics>,
	) -> Self {
		Self {
			transport,
			gate,
			renewal_path: renewal_path.into(),
			metrics,
			slot: Mutex::new(RenewalSlot::default()),
			state: RwLock::new(AuthState::Unknown),
		}
	}

	/// Waits for the outstanding renewal, starting one when none is in flight.
	///
	/// The redirect gate runs at most once per ticket regardless of how many callers wait on it.
	pub async fn renew(&self) -> RenewalOutcome {
		self.wait(self.attach(None)).await
	}

	/// Like [`renew`](Self::renew), for a call whose request went out at `generation`.
	///
	/// When a renewal settled after that snapshot, its outcome is returned as is: the call's
	/// 401 predates the fresh credentials (or the rejection), so no new renewal is started.
	pub async fn renew_since(&self, generation: u64) -> RenewalOutcome {
		self.wait(self.attach(Some(generation))).await
	}

	/// Number of renewals settled so far.
	pub fn generation(&self) -> u64 {
		self.slot.lock().generation
	}

	/// Returns `true` while a renewal ticket is outstanding.
	pub fn in_flight(&self) -> bool {
		self.slot.lock().ticket.is_some()
	}

	/// Last known authentication signal.
	pub fn auth_state(&self) -> AuthState {
		*self.state.read()
	}

	pub(crate) fn set_auth_state(&self, state: AuthState) {
		*self.state.write() = state;
	}

	fn attach(&self, seen: Option<u64>) -> Attachment {
		let mut slot = self.slot.lock();

		if let Some(ticket) = slot.ticket.as_ref() {
			obs::observe(SessionEvent::RenewalJoined, &self.renewal_path);

			return Attachment::Waiting(ticket.clone());
		}

		let settled_since = seen.is_some_and(|seen| slot.generation > seen);

		if let Some(last) = slot.last.as_ref().filter(|_| settled_since) {
			obs::observe(SessionEvent::RenewalReused, &self.renewal_path);

			return Attachment::Settled(last.clone());
		}

		let ticket = Arc::new(OnceCell::new());

		slot.ticket = Some(ticket.clone());

		Attachment::Waiting(ticket)
	}

	async fn wait(&self, attachment: Attachment) -> RenewalOutcome {
		match attachment {
			Attachment::Settled(outcome) => outcome,
			Attachment::Waiting(ticket) => {
				ticket.get_or_init(|| self.perform_renewal()).await.clone()
			},
		}
	}

	// Runs inside the ticket's init, so the slot still holds that ticket.
	fn settle(&self, outcome: &RenewalOutcome) {
		let mut slot = self.slot.lock();

		slot.ticket = None;
		slot.generation += 1;
		slot.last = Some(outcome.clone());
	}

	async fn perform_renewal(&self) -> RenewalOutcome {
		obs::observe(SessionEvent::RenewalStarted, &self.renewal_path);
		self.metrics.record_renewal_attempt();

		let call = CallDescriptor::post(self.renewal_path.as_str());

		let outcome = match self.transport.execute(&call).await {
			Ok(_) => {
				obs::observe(SessionEvent::RenewalSucceeded, &self.renewal_path);
				self.metrics.record_renewal_success();
				self.set_auth_state(AuthState::Authenticated);

				RenewalOutcome::Renewed
			},
			Err(err) => {
				let reason = err.to_string();

				obs::observe(SessionEvent::RenewalFailed, &reason);
				self.metrics.record_renewal_failure();
				self.set_auth_state(AuthState::Unauthenticated);

				if let RedirectDecision::Navigated { .. } = self.gate.on_renewal_failure() {
					self.metrics.record_redirect();
				}

				RenewalOutcome::Failed { reason }
			},
		};

		self.settle(&outcome);

		outcome
	}
}
impl<T> Debug for RenewalCoordinator<T>
where
	T: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RenewalCoordinator")
			.field("renewal_path", &self.renewal_path)
			.field("in_flight", &self.in_flight())
			.field("generation", &self.generation())
			.field("auth_state", &self.auth_state())
			.finish()
	}
}

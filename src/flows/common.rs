//! Shared helpers for flow implementations (scope formatting, cached-request state, guards).

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenRecord, UserId},
	error::ConfigError,
	flows::Broker,
	http::TokenHttpClient,
	oauth::{BasicFacade, TransportErrorMapper},
	provider::GrantType,
	store::BrokerStore,
};

/// Request parameters for flows that evaluate cached records before contacting Fitbit.
#[derive(Clone, Debug)]
pub struct CachedTokenRequest {
	/// User whose token is requested; `-` resolves to the only stored user.
	pub user: UserId,
	/// Forces cache bypass when true.
	pub force: bool,
	/// Jittered preemptive window used when refreshing early.
	pub preemptive_window: Duration,
}
impl CachedTokenRequest {
	const DEFAULT_PREEMPTIVE_WINDOW: Duration = Duration::seconds(60);

	/// Creates a new request for the provided user.
	pub fn new(user: UserId) -> Self {
		Self { user, force: false, preemptive_window: Self::DEFAULT_PREEMPTIVE_WINDOW }
	}

	/// Forces the broker to bypass cache checks.
	pub fn force_refresh(mut self) -> Self {
		self.force = true;

		self
	}

	/// Overrides the force flag.
	pub fn with_force(mut self, force: bool) -> Self {
		self.force = force;

		self
	}

	/// Overrides the jittered preemptive window (defaults to 60 seconds).
	pub fn with_preemptive_window(mut self, window: Duration) -> Self {
		self.preemptive_window = if window.is_negative() { Duration::ZERO } else { window };

		self
	}

	/// Determines whether the cached record should be refreshed.
	pub fn should_refresh(&self, record: &TokenRecord, now: OffsetDateTime) -> bool {
		if self.force || record.is_revoked() || record.is_expired_at(now) {
			return true;
		}

		let effective_window = self.effective_preemptive_window();

		if effective_window.is_zero() {
			return false;
		}

		record.remaining_at(now) <= effective_window
	}

	fn effective_preemptive_window(&self) -> Duration {
		self.preemptive_window.checked_sub(self.preemptive_jitter()).unwrap_or(Duration::ZERO)
	}

	fn preemptive_jitter(&self) -> Duration {
		let window_secs = self.preemptive_window.whole_seconds();

		if window_secs <= 1 {
			return Duration::ZERO;
		}

		let modulus = u64::try_from(window_secs).unwrap_or(u64::MAX);
		let jitter_secs = self.jitter_seed() % modulus;

		Duration::seconds(i64::try_from(jitter_secs).unwrap_or(i64::MAX))
	}

	fn jitter_seed(&self) -> u64 {
		let mut hasher = DefaultHasher::new();

		self.user.hash(&mut hasher);

		hasher.finish()
	}
}

/// Joins normalized scopes with the configured delimiter when building requests.
pub(crate) fn format_scope(scope: &ScopeSet, delimiter: char) -> Option<String> {
	if scope.is_empty() {
		return None;
	}

	Some(scope.iter().map(|value| value.as_str()).collect::<Vec<_>>().join(&delimiter.to_string()))
}

/// Returns (and creates on demand) the singleflight guard for a user.
pub(crate) fn flow_guard<C, M>(broker: &Broker<C, M>, user: &UserId) -> Arc<AsyncMutex<()>>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	let mut guards = broker.flow_guards.lock();

	guards.entry(user.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
}

/// Builds the OAuth facade for one flow invocation.
pub(crate) fn facade<C, M>(broker: &Broker<C, M>) -> Result<BasicFacade<C, M>>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	BasicFacade::from_descriptor(
		&broker.descriptor,
		&broker.client_id,
		broker.client_secret.as_deref(),
		broker.http_client.clone(),
		broker.transport_mapper.clone(),
	)
}

/// Fails with [`ConfigError::UnsupportedGrant`] when the descriptor disables `grant`.
pub(crate) fn ensure_grant<C, M>(broker: &Broker<C, M>, grant: GrantType) -> Result<()>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	if broker.descriptor.supports(grant) {
		Ok(())
	} else {
		Err(ConfigError::UnsupportedGrant { grant: grant.as_str() }.into())
	}
}

/// Maps `-` to the stored user's id so both spellings share one singleflight guard.
///
/// Returns `None` when `-` is used but nothing is stored yet.
pub(crate) async fn resolve_user(store: &dyn BrokerStore, user: &UserId) -> Result<Option<UserId>> {
	if !user.is_current() {
		return Ok(Some(user.clone()));
	}

	Ok(store.fetch_default().await?.map(|record| record.user_id))
}

pub(crate) fn missing_record(user: &UserId) -> Error {
	Error::InvalidGrant { reason: format!("No cached token record is available for user {user}") }
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn record(expires_at: OffsetDateTime) -> TokenRecord {
		TokenRecord::builder(UserId::new("22ABCD").expect("User should be valid."), ScopeSet::all())
			.access_token("a")
			.issued_at(macros::datetime!(2025-01-01 00:00 UTC))
			.expires_at(expires_at)
			.build()
			.expect("Record should build.")
	}

	#[test]
	fn scope_formatting_handles_custom_delimiters() {
		let scope = ScopeSet::new(["sleep", "activity"]).expect("Failed to build test scope.");

		assert_eq!(format_scope(&scope, ' '), Some("activity sleep".into()));
		assert_eq!(format_scope(&scope, ','), Some("activity,sleep".into()));
		assert_eq!(format_scope(&ScopeSet::default(), ' '), None);
	}

	#[test]
	fn refresh_decision_honors_window_force_and_expiry() {
		let now = macros::datetime!(2025-01-01 07:00 UTC);
		let user = UserId::new("22ABCD").expect("User should be valid.");
		let lazy = CachedTokenRequest::new(user.clone()).with_preemptive_window(Duration::ZERO);

		assert!(!lazy.should_refresh(&record(macros::datetime!(2025-01-01 08:00 UTC)), now));
		assert!(lazy.should_refresh(&record(now), now));
		assert!(
			lazy.clone()
				.force_refresh()
				.should_refresh(&record(macros::datetime!(2025-01-01 08:00 UTC)), now)
		);

		let eager = CachedTokenRequest::new(user).with_preemptive_window(Duration::hours(2));

		assert!(eager.should_refresh(&record(macros::datetime!(2025-01-01 07:00:01 UTC)), now));
		assert_eq!(
			CachedTokenRequest::new(UserId::current())
				.with_preemptive_window(Duration::seconds(-5))
				.preemptive_window,
			Duration::ZERO
		);
	}
}

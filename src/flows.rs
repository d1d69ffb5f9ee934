//! High-level flow orchestrators powered by the OAuth facade.

pub mod auth_code_pkce;
pub mod common;
pub mod refresh;
pub mod revoke;

pub use auth_code_pkce::*;
pub use common::*;
pub use refresh::*;

// self
use crate::{
	_prelude::*,
	auth::{TokenRecord, UserId},
	http::{ReqwestHttpClient, TokenHttpClient},
	oauth::{ReqwestTransportErrorMapper, TransportErrorMapper},
	provider::{ProviderDescriptor, ProviderStrategy},
	store::BrokerStore,
};

/// Boxed future returned by [`TokenSource`].
pub type TokenFuture<'a> = Pin<Box<dyn Future<Output = Result<TokenRecord>> + 'a + Send>>;

/// Broker specialized for the crate's default reqwest transport stack.
pub type ReqwestBroker = Broker<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Anything that can hand out a usable access token for a Fitbit user.
///
/// The resource client depends on this seam rather than on a concrete broker so callers can
/// swap in their own token plumbing.
pub trait TokenSource: Send + Sync {
	/// Returns a record whose access token is valid now; `force` skips the cache.
	fn token<'a>(&'a self, user: &'a UserId, force: bool) -> TokenFuture<'a>;
}

/// Coordinates OAuth 2.0 flows against the Fitbit authorization server.
///
/// The broker owns the HTTP client, token store, provider descriptor, and strategy references
/// so individual flows can focus on grant-specific logic (state + PKCE generation, code
/// exchanges, refresh rotations, revocation). Client credentials are stored alongside the
/// descriptor so client-auth methods are applied consistently across endpoints.
#[derive(Clone)]
pub struct Broker<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every outbound token request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Token store implementation that persists issued secrets.
	pub store: Arc<dyn BrokerStore>,
	/// Provider descriptor that defines OAuth endpoints and quirks.
	pub descriptor: ProviderDescriptor,
	/// Strategy responsible for classifying token endpoint failures.
	pub strategy: Arc<dyn ProviderStrategy>,
	/// OAuth 2.0 client identifier (the Fitbit app's client id).
	pub client_id: String,
	/// Optional client secret for confidential authentication methods.
	pub client_secret: Option<String>,
	/// Shared counters for refresh flow outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	flow_guards: Arc<Mutex<HashMap<UserId, Arc<AsyncMutex<()>>>>>,
}
impl<C, M> Broker<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a broker that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		store: Arc<dyn BrokerStore>,
		descriptor: ProviderDescriptor,
		strategy: Arc<dyn ProviderStrategy>,
		client_id: impl Into<String>,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			store,
			descriptor,
			strategy,
			client_id: client_id.into(),
			client_secret: None,
			flow_guards: Default::default(),
			refresh_metrics: Default::default(),
		}
	}

	/// Sets or replaces the client secret used for confidential client auth modes.
	pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(secret.into());

		self
	}
}
impl Broker<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a new broker for the provided descriptor and client identifier.
	///
	/// The broker provisions its own reqwest-backed transport. Use
	/// [`Broker::with_client_secret`] to attach the client secret when the descriptor prefers
	/// `client_secret_basic` or `client_secret_post`.
	pub fn new(
		store: Arc<dyn BrokerStore>,
		descriptor: ProviderDescriptor,
		strategy: Arc<dyn ProviderStrategy>,
		client_id: impl Into<String>,
	) -> Self {
		Self::with_http_client(
			store,
			descriptor,
			strategy,
			client_id,
			ReqwestHttpClient::default(),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}
}
impl<C, M> Debug for Broker<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Broker")
			.field("descriptor", &self.descriptor)
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.finish()
	}
}
impl<C, M> TokenSource for Broker<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn token<'a>(&'a self, user: &'a UserId, force: bool) -> TokenFuture<'a> {
		Box::pin(self.refresh_access_token(CachedTokenRequest::new(user.clone()).with_force(force)))
	}
}

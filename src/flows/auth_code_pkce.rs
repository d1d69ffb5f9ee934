//! Authorization Code + PKCE: build the authorize URL, then trade the returned code for
//! tokens keyed by the Fitbit user who granted access.

mod session;

pub use session::{AuthorizationSession, AuthorizeHints, PkceCodeChallengeMethod, Prompt};

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenRecord},
	flows::{Broker, common},
	http::TokenHttpClient,
	oauth::{OAuth2Facade, TransportErrorMapper},
	obs::{self, FlowKind},
	provider::GrantType,
};

impl<C, M> Broker<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Starts an authorization session with a fresh `state` and S256 PKCE pair.
	pub fn start_authorization(&self, scope: ScopeSet, redirect_uri: Url) -> Result<AuthorizationSession> {
		self.start_authorization_with_hints(scope, redirect_uri, AuthorizeHints::default())
	}

	/// Same as [`Broker::start_authorization`] with `prompt`/`expires_in` hints.
	pub fn start_authorization_with_hints(
		&self,
		scope: ScopeSet,
		redirect_uri: Url,
		hints: AuthorizeHints,
	) -> Result<AuthorizationSession> {
		obs::observe_sync(FlowKind::AuthorizationCode, "start_authorization", || {
			common::ensure_grant(self, GrantType::AuthorizationCode)?;

			Ok(session::build_session(&self.descriptor, &self.client_id, scope, redirect_uri, hints))
		})
	}

	/// Exchanges the code delivered to the redirect URI and persists the resulting record.
	pub async fn exchange_code(
		&self,
		session: AuthorizationSession,
		code: &str,
	) -> Result<TokenRecord> {
		obs::observe(FlowKind::AuthorizationCode, "exchange_code", async move {
			common::ensure_grant(self, GrantType::AuthorizationCode)?;

			if code.trim().is_empty() {
				return Err(Error::invalid_argument("authorization code must not be empty"));
			}

			let (scope, redirect_uri, pkce) = session.into_exchange_parts();
			let facade = common::facade(self)?;
			let record = facade
				.exchange_authorization_code(
					self.strategy.as_ref(),
					code,
					Some(pkce.verifier.as_str()),
					&scope,
					&redirect_uri,
				)
				.await?;

			self.store.save(record.clone()).await?;

			Ok(record)
		})
		.await
	}

	/// Validates the returned `state` and then exchanges `code`.
	pub async fn complete_authorization(
		&self,
		session: AuthorizationSession,
		returned_state: &str,
		code: &str,
	) -> Result<TokenRecord> {
		session.validate_state(returned_state)?;

		self.exchange_code(session, code).await
	}
}

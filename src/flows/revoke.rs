//! Token revocation against the descriptor's revocation endpoint.

// self
use crate::{
	_prelude::*,
	auth::{TokenRecord, UserId},
	error::ConfigError,
	flows::{Broker, common},
	http::TokenHttpClient,
	oauth::{OAuth2Facade, TokenTypeHint, TransportErrorMapper},
	obs::{self, FlowKind},
};

impl<C, M> Broker<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Revokes the user's grant and marks the stored record revoked.
	///
	/// The refresh token is sent when present since revoking it also kills every access
	/// token minted from it. A grant Fitbit already considers invalid is treated as revoked.
	pub async fn revoke(&self, user: &UserId) -> Result<TokenRecord> {
		obs::observe(FlowKind::Revoke, "revoke", async move {
			let endpoint = self
				.descriptor
				.endpoints
				.revocation
				.clone()
				.ok_or(ConfigError::MissingRevocationEndpoint)?;
			let resolved = common::resolve_user(self.store.as_ref(), user)
				.await?
				.ok_or_else(|| common::missing_record(user))?;
			let guard = common::flow_guard(self, &resolved);
			let _singleflight = guard.lock().await;
			let record =
				self.store.fetch(&resolved).await?.ok_or_else(|| common::missing_record(user))?;
			let (token, hint) = match record.refresh_token.as_ref() {
				Some(refresh) => (refresh.expose(), TokenTypeHint::RefreshToken),
				None => (record.access_token.expose(), TokenTypeHint::AccessToken),
			};
			let facade = common::facade(self)?;

			match facade.revoke_token(self.strategy.as_ref(), endpoint, token, hint).await {
				Ok(()) | Err(Error::InvalidGrant { .. }) => {},
				Err(err) => return Err(err),
			}

			let revoked = self
				.store
				.revoke(&record.user_id, OffsetDateTime::now_utc())
				.await?
				.unwrap_or(record);

			Ok(revoked)
		})
		.await
	}
}

//! Refresh token orchestration with singleflight guards, CAS rotation, and metrics.
//!
//! [`Broker::refresh_access_token`] hands out a usable access token for a Fitbit user without
//! letting concurrent callers burn the same refresh token twice (Fitbit refresh tokens are
//! single-use). Each request acquires a per-user guard, evaluates a jittered preemptive window,
//! and either reuses the cached record or performs a `grant_type=refresh_token` call.
//! Successful refreshes rotate secrets via `BrokerStore::compare_and_swap_refresh`, while
//! invalid_grant/revoked responses revoke the cached record.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::{TokenRecord, UserId},
	error::ConfigError,
	flows::{Broker, CachedTokenRequest, common},
	http::TokenHttpClient,
	oauth::{OAuth2Facade, TransportErrorMapper},
	obs::{self, FlowKind},
	provider::GrantType,
	store::CompareAndSwapOutcome,
};

impl<C, M> Broker<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Returns a cached or freshly rotated record for `request.user`.
	pub async fn refresh_access_token(&self, request: CachedTokenRequest) -> Result<TokenRecord> {
		obs::observe(FlowKind::Refresh, "refresh_access_token", async move {
			self.refresh_metrics.record_attempt();

			let result = self.refresh_guarded(request).await;

			if result.is_err() {
				self.refresh_metrics.record_failure();
			}

			result
		})
		.await
	}

	/// Convenience wrapper returning a record whose access token is usable now.
	pub async fn access_token(&self, user: &UserId) -> Result<TokenRecord> {
		self.refresh_access_token(CachedTokenRequest::new(user.clone())).await
	}

	async fn refresh_guarded(&self, request: CachedTokenRequest) -> Result<TokenRecord> {
		common::ensure_grant(self, GrantType::RefreshToken)?;

		let user = common::resolve_user(self.store.as_ref(), &request.user)
			.await?
			.ok_or_else(|| common::missing_record(&request.user))?;
		let guard = common::flow_guard(self, &user);
		let _singleflight = guard.lock().await;
		// Re-read under the guard; a concurrent caller may have rotated the record meanwhile.
		let current =
			self.store.fetch(&user).await?.ok_or_else(|| common::missing_record(&user))?;
		let now = OffsetDateTime::now_utc();

		if current.is_revoked() {
			return Err(Error::Revoked);
		}
		if !request.should_refresh(&current, now) {
			self.refresh_metrics.record_reuse();

			return Ok(current);
		}

		let expected_refresh = current
			.refresh_token
			.as_ref()
			.map(|secret| secret.expose().to_owned())
			.ok_or(ConfigError::MissingRefreshToken)?;
		let facade = common::facade(self)?;
		let (updated, new_refresh) = match facade
			.refresh_token(self.strategy.as_ref(), user.clone(), &expected_refresh, &current.scope)
			.await
		{
			Ok(result) => result,
			Err(err) => {
				if matches!(err, Error::InvalidGrant { .. } | Error::Revoked) {
					self.store.revoke(&user, now).await?;
				}

				return Err(err);
			},
		};
		let outcome = self
			.store
			.compare_and_swap_refresh(&user, Some(expected_refresh.as_str()), updated.clone())
			.await?;
		let result = match outcome {
			CompareAndSwapOutcome::Updated => updated,
			CompareAndSwapOutcome::Missing => {
				self.store.save(updated.clone()).await?;

				updated
			},
			// Another writer rotated first; its record is the live one.
			CompareAndSwapOutcome::RefreshMismatch => match self.store.fetch(&user).await? {
				Some(existing) => existing,
				None => {
					self.store.save(updated.clone()).await?;

					updated
				},
			},
		};

		self.refresh_metrics.record_rotation(new_refresh.is_some());

		#[cfg(feature = "tracing")]
		tracing::debug!(
			user = %user,
			refresh = ?result.refresh_token,
			rotated = new_refresh.is_some(),
			"refresh completed"
		);

		Ok(result)
	}
}

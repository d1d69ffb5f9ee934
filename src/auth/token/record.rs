//! Immutable token record structs, lifecycle helpers, and builders.

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, UserId, token::secret::TokenSecret},
};

/// Current lifecycle status for a token record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
	/// Token is not yet valid because the issued-at instant is in the future.
	Pending,
	/// Token is currently valid.
	Active,
	/// Token exceeded its expiry instant.
	Expired,
	/// Token has been revoked locally or by Fitbit.
	Revoked,
}

/// Errors produced by [`TokenRecordBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum TokenRecordBuilderError {
	/// Issued when no access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// Issued when no expiry (absolute or relative) was configured.
	#[error("Expiry must be supplied via expires_at or expires_in.")]
	MissingExpiry,
	/// Issued when issued_at plus expires_in leaves the representable date range.
	#[error("Relative expiry overflows the supported date range.")]
	ExpiryOutOfRange,
}

/// Immutable record describing the tokens issued for one Fitbit user.
#[derive(Serialize, Deserialize, Clone)]
pub struct TokenRecord {
	/// Encoded Fitbit user the tokens were issued for.
	pub user_id: UserId,
	/// Normalized scopes granted to this record.
	pub scope: ScopeSet,
	/// Token type reported by the token endpoint (always `Bearer` for Fitbit).
	#[serde(default = "default_token_type")]
	pub token_type: String,
	/// Access token secret; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Refresh token secret, if one was issued.
	pub refresh_token: Option<TokenSecret>,
	/// Issued-at instant recorded when the response arrived.
	#[serde(with = "time::serde::rfc3339")]
	pub issued_at: OffsetDateTime,
	/// Expiry instant derived from issued_at plus expires_in or absolute expiry.
	#[serde(with = "time::serde::rfc3339")]
	pub expires_at: OffsetDateTime,
	/// Revocation instant if the record has been revoked.
	#[serde(default, with = "time::serde::rfc3339::option")]
	pub revoked_at: Option<OffsetDateTime>,
}
impl TokenRecord {
	/// Returns a builder for constructing rotation-friendly records.
	pub fn builder(user_id: UserId, scope: ScopeSet) -> TokenRecordBuilder {
		TokenRecordBuilder::new(user_id, scope)
	}

	/// Lifecycle status at `instant`; revocation wins over the time window.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		if self.is_revoked() {
			TokenStatus::Revoked
		} else if instant < self.issued_at {
			TokenStatus::Pending
		} else if self.is_expired_at(instant) {
			TokenStatus::Expired
		} else {
			TokenStatus::Active
		}
	}

	/// Returns `true` once `instant` reaches the expiry instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}

	/// Returns `true` if the record has been revoked.
	pub fn is_revoked(&self) -> bool {
		self.revoked_at.is_some()
	}

	/// Remaining lifetime at `instant`; negative once expired.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		self.expires_at - instant
	}

	/// Value for the `Authorization` header.
	pub fn bearer(&self) -> String {
		format!("Bearer {}", self.access_token.expose())
	}

	/// Marks the record as revoked.
	pub fn revoke(&mut self, instant: OffsetDateTime) {
		self.revoked_at = Some(instant);
	}
}
impl Debug for TokenRecord {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRecord")
			.field("user_id", &self.user_id)
			.field("scope", &self.scope)
			.field("token_type", &self.token_type)
			.field("access_token", &self.access_token)
			.field("refresh_token", &self.refresh_token)
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.field("revoked_at", &self.revoked_at)
			.finish()
	}
}

/// Builder for [`TokenRecord`].
#[derive(Clone, Debug)]
pub struct TokenRecordBuilder {
	user_id: UserId,
	scope: ScopeSet,
	token_type: Option<String>,
	access_token: Option<TokenSecret>,
	refresh_token: Option<TokenSecret>,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
}
impl TokenRecordBuilder {
	fn new(user_id: UserId, scope: ScopeSet) -> Self {
		Self {
			user_id,
			scope,
			token_type: None,
			access_token: None,
			refresh_token: None,
			issued_at: None,
			expires_at: None,
			expires_in: None,
		}
	}

	/// Sets the issued-at instant.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Convenience helper that stamps `issued_at` with the current clock.
	pub fn issued_now(self) -> Self {
		self.issued_at(OffsetDateTime::now_utc())
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative expiry duration from the issued instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Overrides the token type (defaults to `Bearer`).
	pub fn token_type(mut self, token_type: impl Into<String>) -> Self {
		self.token_type = Some(token_type.into());

		self
	}

	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Provides the refresh token value.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Consumes the builder and produces a [`TokenRecord`].
	pub fn build(self) -> Result<TokenRecord, TokenRecordBuilderError> {
		let access_token = self.access_token.ok_or(TokenRecordBuilderError::MissingAccessToken)?;
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => instant,
			(None, Some(delta)) =>
				issued_at.checked_add(delta).ok_or(TokenRecordBuilderError::ExpiryOutOfRange)?,
			(None, None) => return Err(TokenRecordBuilderError::MissingExpiry),
		};

		Ok(TokenRecord {
			user_id: self.user_id,
			scope: self.scope,
			token_type: self.token_type.unwrap_or_else(default_token_type),
			access_token,
			refresh_token: self.refresh_token,
			issued_at,
			expires_at,
			revoked_at: None,
		})
	}
}

fn default_token_type() -> String {
	"Bearer".into()
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn user() -> UserId {
		UserId::new("22ABCD").expect("User fixture should be valid.")
	}

	#[test]
	fn status_transitions_cover_all_states() {
		let scope =
			ScopeSet::new(["activity", "sleep"]).expect("Scope fixture should be valid for token record tests.");
		let issued = macros::datetime!(2025-01-01 00:00 UTC);
		let expires = macros::datetime!(2025-01-01 08:00 UTC);
		let mut record = TokenRecord::builder(user(), scope)
			.access_token("access")
			.refresh_token("refresh")
			.issued_at(issued)
			.expires_at(expires)
			.build()
			.expect("Token record builder should succeed for status transitions.");

		assert_eq!(record.status_at(macros::datetime!(2024-12-31 23:59 UTC)), TokenStatus::Pending);
		assert_eq!(record.status_at(macros::datetime!(2025-01-01 04:00 UTC)), TokenStatus::Active);
		assert_eq!(record.status_at(macros::datetime!(2025-01-01 08:00 UTC)), TokenStatus::Expired);

		record.revoke(macros::datetime!(2025-01-01 00:10 UTC));

		assert_eq!(record.status_at(macros::datetime!(2025-01-01 04:00 UTC)), TokenStatus::Revoked);
	}

	#[test]
	fn builder_handles_relative_expiry_and_defaults() {
		let record = TokenRecord::builder(user(), ScopeSet::all())
			.access_token("secret")
			.issued_at(macros::datetime!(2025-01-01 00:00 UTC))
			.expires_in(Duration::seconds(28_800))
			.build()
			.expect("Token record builder should support relative expiry calculations.");

		assert_eq!(record.expires_at, macros::datetime!(2025-01-01 08:00 UTC));
		assert_eq!(record.token_type, "Bearer");
		assert_eq!(record.bearer(), "Bearer secret");
		assert_eq!(
			record.remaining_at(macros::datetime!(2025-01-01 07:00 UTC)),
			Duration::hours(1)
		);
		assert!(matches!(
			TokenRecord::builder(user(), ScopeSet::all()).access_token("x").build(),
			Err(TokenRecordBuilderError::MissingExpiry)
		));
		assert!(matches!(
			TokenRecord::builder(user(), ScopeSet::all())
				.access_token("x")
				.issued_at(macros::datetime!(2025-01-01 00:00 UTC))
				.expires_in(Duration::seconds(i64::MAX))
				.build(),
			Err(TokenRecordBuilderError::ExpiryOutOfRange)
		));
	}

	#[test]
	fn serde_and_debug_keep_file_layout_and_redaction() {
		let record = TokenRecord::builder(user(), ScopeSet::new(["weight"]).expect("Scope should parse."))
			.access_token("access-secret")
			.refresh_token("refresh-secret")
			.issued_at(macros::datetime!(2025-01-01 00:00 UTC))
			.expires_in(Duration::hours(8))
			.build()
			.expect("Record should build.");
		let json = serde_json::to_value(&record).expect("Record should serialize.");

		assert_eq!(json["user_id"], "22ABCD");
		assert_eq!(json["scope"], "weight");
		assert_eq!(json["expires_at"], "2025-01-01T08:00:00Z");
		assert!(json["revoked_at"].is_null());

		let debug = format!("{record:?}");

		assert!(!debug.contains("access-secret"));
		assert!(!debug.contains("refresh-secret"));

		let back: TokenRecord = serde_json::from_value(json).expect("Record should deserialize.");

		assert_eq!(back.refresh_token.as_ref().map(TokenSecret::expose), Some("refresh-secret"));
	}
}

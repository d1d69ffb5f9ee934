//! Storage contracts and built-in store implementations for Fitbit token records.
//!
//! Records are keyed by the encoded Fitbit user id returned by the token endpoint.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// std
use std::collections::btree_map::Entry;
// self
use crate::{
	_prelude::*,
	auth::{TokenRecord, TokenSecret, UserId},
};

/// Boxed future returned by [`BrokerStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract implemented by token stores.
pub trait BrokerStore
where
	Self: Send + Sync,
{
	/// Persists or replaces the record for `record.user_id`.
	fn save(&self, record: TokenRecord) -> StoreFuture<'_, ()>;

	/// Fetches the record associated with the user, if present.
	fn fetch<'a>(&'a self, user: &'a UserId) -> StoreFuture<'a, Option<TokenRecord>>;

	/// Fetches the only stored record; fails when several users are stored.
	fn fetch_default(&self) -> StoreFuture<'_, Option<TokenRecord>>;

	/// Atomically rotates a refresh token if the expected secret matches.
	fn compare_and_swap_refresh<'a>(
		&'a self,
		user: &'a UserId,
		expected_refresh: Option<&'a str>,
		replacement: TokenRecord,
	) -> StoreFuture<'a, CompareAndSwapOutcome>;

	/// Marks a record as revoked at the provided instant.
	fn revoke<'a>(
		&'a self,
		user: &'a UserId,
		instant: OffsetDateTime,
	) -> StoreFuture<'a, Option<TokenRecord>>;
}

/// Result of a refresh-token compare-and-swap attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareAndSwapOutcome {
	/// The refresh secret matched the expected value and the record was updated.
	Updated,
	/// The record exists but the expected refresh secret did not match.
	RefreshMismatch,
	/// No record exists for the user.
	Missing,
}

/// Error type produced by [`BrokerStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
	/// A default record was requested but several users are stored.
	#[error("Store holds {count} users; pick one explicitly.")]
	AmbiguousDefault {
		/// Number of stored users.
		count: usize,
	},
}

type RecordMap = BTreeMap<UserId, TokenRecord>;

fn default_record(map: &RecordMap) -> Result<Option<TokenRecord>, StoreError> {
	match map.len() {
		0 => Ok(None),
		1 => Ok(map.values().next().cloned()),
		count => Err(StoreError::AmbiguousDefault { count }),
	}
}

fn swap_refresh(
	map: &mut RecordMap,
	user: &UserId,
	expected_refresh: Option<&str>,
	replacement: TokenRecord,
) -> CompareAndSwapOutcome {
	match map.entry(user.clone()) {
		Entry::Occupied(mut entry) =>
			if refresh_matches(entry.get().refresh_token.as_ref(), expected_refresh) {
				entry.insert(replacement);

				CompareAndSwapOutcome::Updated
			} else {
				CompareAndSwapOutcome::RefreshMismatch
			},
		Entry::Vacant(_) => CompareAndSwapOutcome::Missing,
	}
}

fn revoke_record(map: &mut RecordMap, user: &UserId, instant: OffsetDateTime) -> Option<TokenRecord> {
	map.get_mut(user).map(|record| {
		record.revoke(instant);

		record.clone()
	})
}

fn refresh_matches(current: Option<&TokenSecret>, expected: Option<&str>) -> bool {
	match (current.map(TokenSecret::expose), expected) {
		(None, None) => true,
		(Some(cur), Some(exp)) => cur == exp,
		_ => false,
	}
}

//! Thread-safe in-memory [`BrokerStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{TokenRecord, UserId},
	store::{self, BrokerStore, CompareAndSwapOutcome, RecordMap, StoreFuture},
};

/// Thread-safe storage backend that keeps records in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<RwLock<RecordMap>>);
impl MemoryStore {
	/// Number of stored users.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns true when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl BrokerStore for MemoryStore {
	fn save(&self, record: TokenRecord) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().insert(record.user_id.clone(), record);

			Ok(())
		})
	}

	fn fetch<'a>(&'a self, user: &'a UserId) -> StoreFuture<'a, Option<TokenRecord>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().get(user).cloned()) })
	}

	fn fetch_default(&self) -> StoreFuture<'_, Option<TokenRecord>> {
		let map = self.0.clone();

		Box::pin(async move { store::default_record(&map.read()) })
	}

	fn compare_and_swap_refresh<'a>(
		&'a self,
		user: &'a UserId,
		expected_refresh: Option<&'a str>,
		replacement: TokenRecord,
	) -> StoreFuture<'a, CompareAndSwapOutcome> {
		let map = self.0.clone();

		Box::pin(async move {
			Ok(store::swap_refresh(&mut map.write(), user, expected_refresh, replacement))
		})
	}

	fn revoke<'a>(
		&'a self,
		user: &'a UserId,
		instant: OffsetDateTime,
	) -> StoreFuture<'a, Option<TokenRecord>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(store::revoke_record(&mut map.write(), user, instant)) })
	}
}

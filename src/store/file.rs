//! File-backed [`BrokerStore`] that keeps the authorized users' tokens in one JSON document.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::{TokenRecord, UserId},
	store::{self, BrokerStore, CompareAndSwapOutcome, RecordMap, StoreError, StoreFuture},
};

/// Persists records to a JSON object keyed by user id after each mutation.
///
/// Writes go to a sibling `.tmp` file which is synced and renamed over the target, so a crash
/// never leaves a half-written token file behind.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<RecordMap>>,
}
impl FileStore {
	/// File name used when no path is configured.
	pub const DEFAULT_PATH: &'static str = "token.json";

	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<RecordMap, StoreError> {
		if !path.exists() {
			return Ok(RecordMap::new());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		if bytes.iter().all(u8::is_ascii_whitespace) {
			return Ok(RecordMap::new());
		}

		let mut de = serde_json::Deserializer::from_slice(&bytes);

		serde_path_to_error::deserialize(&mut de).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {} at {}: {}", path.display(), e.path(), e.inner()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, contents: &RecordMap) -> Result<(), StoreError> {
		let serialized = serde_json::to_vec_pretty(contents).map_err(|e| StoreError::Serialization {
			message: format!("Failed to serialize store snapshot: {e}"),
		})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}
}
impl BrokerStore for FileStore {
	fn save(&self, record: TokenRecord) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			guard.insert(record.user_id.clone(), record);
			self.persist_locked(&guard)
		})
	}

	fn fetch<'a>(&'a self, user: &'a UserId) -> StoreFuture<'a, Option<TokenRecord>> {
		Box::pin(async move { Ok(self.inner.read().get(user).cloned()) })
	}

	fn fetch_default(&self) -> StoreFuture<'_, Option<TokenRecord>> {
		Box::pin(async move { store::default_record(&self.inner.read()) })
	}

	fn compare_and_swap_refresh<'a>(
		&'a self,
		user: &'a UserId,
		expected_refresh: Option<&'a str>,
		replacement: TokenRecord,
	) -> StoreFuture<'a, CompareAndSwapOutcome> {
		Box::pin(async move {
			let mut guard = self.inner.write();
			let outcome = store::swap_refresh(&mut guard, user, expected_refresh, replacement);

			if matches!(outcome, CompareAndSwapOutcome::Updated) {
				self.persist_locked(&guard)?;
			}

			Ok(outcome)
		})
	}

	fn revoke<'a>(
		&'a self,
		user: &'a UserId,
		instant: OffsetDateTime,
	) -> StoreFuture<'a, Option<TokenRecord>> {
		Box::pin(async move {
			let mut guard = self.inner.write();
			let revoked = store::revoke_record(&mut guard, user, instant);

			if revoked.is_some() {
				self.persist_locked(&guard)?;
			}

			Ok(revoked)
		})
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// crates.io
	use tokio::runtime::Runtime;
	// self
	use super::*;
	use crate::auth::ScopeSet;

	fn temp_path() -> PathBuf {
		let unique = format!(
			"fitbit_link_file_store_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	fn build_record() -> TokenRecord {
		let user = UserId::new("22ABCD").expect("Failed to build user fixture.");
		let scope = ScopeSet::new(["heartrate", "sleep"]).expect("Failed to build scope fixture.");

		TokenRecord::builder(user, scope)
			.access_token("access-token")
			.refresh_token("refresh-token")
			.expires_in(Duration::hours(8))
			.build()
			.expect("Failed to build file-store test record.")
	}

	#[test]
	fn save_reload_and_revoke_round_trip() {
		let path = temp_path();
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let record = build_record();
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		rt.block_on(store.save(record.clone())).expect("Failed to save fixture record to file store.");
		drop(store);

		let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");
		let fetched = rt
			.block_on(reopened.fetch_default())
			.expect("Failed to fetch fixture record from file store.")
			.expect("File store lost record after reopen.");

		assert_eq!(fetched.access_token.expose(), record.access_token.expose());
		assert_eq!(fetched.user_id, record.user_id);

		rt.block_on(reopened.revoke(&record.user_id, OffsetDateTime::now_utc()))
			.expect("Revoke should persist.")
			.expect("Revoke should find the stored record.");

		let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");
		let fetched = rt
			.block_on(reopened.fetch(&record.user_id))
			.expect("Fetch should succeed.")
			.expect("Record should still exist after revocation.");

		assert!(fetched.is_revoked());

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn malformed_file_reports_json_path() {
		let path = temp_path();

		fs::write(&path, br#"{"22ABCD":{"user_id":"22ABCD","scope":"bogus"}}"#)
			.expect("Fixture file should be written.");

		let err = FileStore::open(&path).expect_err("Malformed token file should be rejected.");

		assert!(matches!(err, StoreError::Serialization { ref message } if message.contains("22ABCD")));

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}
}

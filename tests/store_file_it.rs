// std
use std::{env, fs, path::PathBuf, process};
// crates.io
use httpmock::prelude::*;
// self
use fitbit_link::{
	_preludet::*,
	auth::{ScopeSet, TokenRecord, UserId},
	flows::{Broker, CachedTokenRequest},
	http::ReqwestHttpClient,
	oauth::ReqwestTransportErrorMapper,
	provider::FitbitStrategy,
	store::{BrokerStore, FileStore},
};

fn temp_path(label: &str) -> PathBuf {
	env::temp_dir().join(format!(
		"fitbit_link_{label}_{}_{}.json",
		process::id(),
		OffsetDateTime::now_utc().unix_timestamp_nanos(),
	))
}

fn remove(path: &PathBuf) {
	fs::remove_file(path).unwrap_or_else(|e| {
		panic!("Failed to remove temporary token file {}: {e}", path.display())
	});
}

fn stale_record(user: &UserId) -> TokenRecord {
	let issued = OffsetDateTime::now_utc() - Duration::hours(9);

	TokenRecord::builder(user.clone(), ScopeSet::all())
		.access_token("access-on-disk")
		.refresh_token("refresh-on-disk")
		.issued_at(issued)
		.expires_at(issued + Duration::hours(8))
		.build()
		.expect("Token record fixture should build successfully.")
}

#[tokio::test]
async fn rotated_tokens_survive_a_reopen() {
	let server = MockServer::start_async().await;
	let path = temp_path("rotation");
	let fran = UserId::new("FRAN66").expect("User fixture should be valid.");
	let store =
		Arc::new(FileStore::open(&path).expect("Opening a fresh token file should succeed."));

	store.save(stale_record(&fran)).await.expect("Seeding the token file should succeed.");

	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token").body_includes("refresh_token=refresh-on-disk");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-rotated\",\"refresh_token\":\"refresh-rotated\",\
				 \"token_type\":\"Bearer\",\"expires_in\":28800,\"user_id\":\"FRAN66\"}",
			);
		})
		.await;
	let broker: ReqwestTestBroker = Broker::with_http_client(
		store.clone(),
		mock_descriptor(&server.base_url()),
		Arc::new(FitbitStrategy),
		"23ABCD",
		ReqwestHttpClient::with_client(test_reqwest_client()),
		Arc::new(ReqwestTransportErrorMapper),
	)
	.with_client_secret("secret-file");

	broker
		.refresh_access_token(CachedTokenRequest::new(UserId::current()))
		.await
		.expect("Refreshing through the file store should succeed.");

	mock.assert_async().await;
	drop(broker);
	drop(store);

	let reopened = FileStore::open(&path).expect("Reopening the token file should succeed.");
	let stored = reopened
		.fetch_default()
		.await
		.expect("Default lookup should succeed.")
		.expect("Rotated record should be persisted.");

	assert_eq!(stored.user_id, fran);
	assert_eq!(stored.access_token.expose(), "access-rotated");
	assert_eq!(
		stored.refresh_token.as_ref().map(|secret| secret.expose()),
		Some("refresh-rotated")
	);

	remove(&path);
}

#[tokio::test]
async fn revocation_is_persisted_and_other_users_are_kept() {
	let path = temp_path("revocation");
	let fran = UserId::new("FRAN66").expect("User fixture should be valid.");
	let gus = UserId::new("GUS777").expect("User fixture should be valid.");
	let store = FileStore::open(&path).expect("Opening a fresh token file should succeed.");

	store.save(stale_record(&fran)).await.expect("Saving the first user should succeed.");
	store.save(stale_record(&gus)).await.expect("Saving the second user should succeed.");
	store
		.revoke(&fran, OffsetDateTime::now_utc())
		.await
		.expect("Revocation should persist.")
		.expect("Revocation should find the stored record.");
	drop(store);

	let reopened = FileStore::open(&path).expect("Reopening the token file should succeed.");
	let revoked = reopened
		.fetch(&fran)
		.await
		.expect("Fetch should succeed.")
		.expect("Revoked record should still be stored.");
	let kept = reopened
		.fetch(&gus)
		.await
		.expect("Fetch should succeed.")
		.expect("Untouched record should still be stored.");

	assert!(revoked.is_revoked());
	assert!(!kept.is_revoked());
	assert!(reopened.fetch_default().await.is_err());

	remove(&path);
}

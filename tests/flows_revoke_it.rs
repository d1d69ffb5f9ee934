// crates.io
use httpmock::prelude::*;
// self
use fitbit_link::{
	_preludet::*,
	auth::{ScopeSet, TokenRecord, UserId},
	error::ConfigError,
	provider::{GrantType, ProviderDescriptor},
	store::{BrokerStore, MemoryStore},
};

const CLIENT_ID: &str = "23ABCD";
const CLIENT_SECRET: &str = "secret-revoke";

async fn seed(store: &MemoryStore, refresh: Option<&str>) -> UserId {
	let user = UserId::new("DAVE44").expect("User fixture should be valid.");
	let mut builder = TokenRecord::builder(user.clone(), ScopeSet::all())
		.access_token("access-revoke")
		.issued_now()
		.expires_in(Duration::hours(8));

	if let Some(refresh) = refresh {
		builder = builder.refresh_token(refresh);
	}

	store.save(builder.build().expect("Record should build.")).await.expect("Seeding should succeed.");

	user
}

#[tokio::test]
async fn revoke_sends_the_refresh_token_and_marks_the_record() {
	let server = MockServer::start_async().await;
	let (broker, store) =
		build_reqwest_test_broker(mock_descriptor(&server.base_url()), CLIENT_ID, CLIENT_SECRET);
	let user = seed(&store, Some("refresh-revoke")).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth2/revoke")
				.header_exists("authorization")
				.body_includes("token=refresh-revoke")
				.body_includes("token_type_hint=refresh_token");
			then.status(200).body("{}");
		})
		.await;
	let record = broker.revoke(&user).await.expect("Revocation should succeed.");

	mock.assert_async().await;

	assert!(record.is_revoked());
	assert!(
		store
			.fetch(&user)
			.await
			.expect("Lookup should succeed.")
			.expect("Record should remain for inspection.")
			.is_revoked()
	);
}

#[tokio::test]
async fn revoke_falls_back_to_the_access_token_and_tolerates_invalid_grants() {
	let server = MockServer::start_async().await;
	let (broker, store) =
		build_reqwest_test_broker(mock_descriptor(&server.base_url()), CLIENT_ID, CLIENT_SECRET);
	let user = seed(&store, None).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth2/revoke")
				.body_includes("token=access-revoke")
				.body_includes("token_type_hint=access_token");
			then.status(400).header("content-type", "application/json").body(
				"{\"errors\":[{\"errorType\":\"invalid_token\",\"message\":\"Access token invalid\"}],\"success\":false}",
			);
		})
		.await;
	let record = broker
		.revoke(&UserId::current())
		.await
		.expect("An already-invalid grant should count as revoked.");

	mock.assert_async().await;

	assert_eq!(record.user_id, user);
	assert!(record.is_revoked());
}

#[tokio::test]
async fn revoke_surfaces_transient_failures_without_touching_the_store() {
	let server = MockServer::start_async().await;
	let (broker, store) =
		build_reqwest_test_broker(mock_descriptor(&server.base_url()), CLIENT_ID, CLIENT_SECRET);
	let user = seed(&store, Some("refresh-keep")).await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/revoke");
			then.status(503).body("temporarily_unavailable");
		})
		.await;
	let err = broker.revoke(&user).await.expect_err("Provider outages should surface.");

	assert!(matches!(err, Error::Transient(_)));
	assert!(
		!store
			.fetch(&user)
			.await
			.expect("Lookup should succeed.")
			.expect("Record should remain.")
			.is_revoked()
	);
}

#[tokio::test]
async fn revoke_requires_an_endpoint_and_a_record() {
	let server = MockServer::start_async().await;
	let base = server.base_url();
	let join = |path: &str| Url::parse(&format!("{base}{path}")).expect("Mock URL should parse.");
	let descriptor = ProviderDescriptor::builder()
		.authorization_endpoint(join("/oauth2/authorize"))
		.token_endpoint(join("/oauth2/token"))
		.support_grants([GrantType::AuthorizationCode, GrantType::RefreshToken])
		.build()
		.expect("Descriptor without revocation should build.");
	let (broker, store) = build_reqwest_test_broker(descriptor, CLIENT_ID, CLIENT_SECRET);
	let user = seed(&store, Some("refresh")).await;
	let err = broker.revoke(&user).await.expect_err("Missing endpoint should be a config error.");

	assert!(matches!(err, Error::Config(ConfigError::MissingRevocationEndpoint)));

	let (broker, _store) =
		build_reqwest_test_broker(mock_descriptor(&base), CLIENT_ID, CLIENT_SECRET);
	let err = broker.revoke(&user).await.expect_err("Unknown users have nothing to revoke.");

	assert!(matches!(err, Error::InvalidGrant { .. }));
}

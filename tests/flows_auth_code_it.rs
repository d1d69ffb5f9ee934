// crates.io
use httpmock::prelude::*;
// self
use fitbit_link::{
	_preludet::*,
	auth::{FitbitScope, ScopeSet},
	error::ConfigError,
	flows::{AuthorizeHints, PkceCodeChallengeMethod, Prompt},
	store::BrokerStore,
};

const CLIENT_ID: &str = "23QWER";
const CLIENT_SECRET: &str = "secret-it";

fn redirect_uri() -> Url {
	Url::parse("http://127.0.0.1:8080/").expect("Redirect URI should parse successfully.")
}

#[tokio::test]
async fn start_authorization_and_exchange_save_tokens_for_the_granting_user() {
	let server = MockServer::start_async().await;
	let (broker, store) =
		build_reqwest_test_broker(mock_descriptor(&server.base_url()), CLIENT_ID, CLIENT_SECRET);
	let requested = ScopeSet::new(["activity", "heartrate", "sleep"])
		.expect("Scope set should be valid for auth code test.");
	let session = broker
		.start_authorization_with_hints(
			requested.clone(),
			redirect_uri(),
			AuthorizeHints::default().prompt(Prompt::Consent).expires_in(Duration::days(1)),
		)
		.expect("Authorization session should start successfully.");

	assert_eq!(&session.scope, &requested);
	assert_eq!(session.code_challenge_method(), PkceCodeChallengeMethod::S256);
	assert_eq!(session.state.len(), 32);

	let authorize_pairs: HashMap<_, _> = session.authorize_url.query_pairs().into_owned().collect();

	assert_eq!(authorize_pairs.get("response_type"), Some(&"code".into()));
	assert_eq!(authorize_pairs.get("client_id"), Some(&CLIENT_ID.into()));
	assert_eq!(authorize_pairs.get("redirect_uri"), Some(&redirect_uri().as_str().into()));
	assert_eq!(authorize_pairs.get("scope"), Some(&"activity heartrate sleep".into()));
	assert_eq!(authorize_pairs.get("state"), Some(&session.state));
	assert_eq!(authorize_pairs.get("code_challenge"), Some(&session.code_challenge().into()));
	assert_eq!(authorize_pairs.get("code_challenge_method"), Some(&"S256".into()));
	assert_eq!(authorize_pairs.get("prompt"), Some(&"consent".into()));
	assert_eq!(authorize_pairs.get("expires_in"), Some(&"86400".into()));

	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth2/token")
				.header("content-type", "application/x-www-form-urlencoded")
				.header_exists("authorization")
				.body_includes("grant_type=authorization_code")
				.body_includes("code=valid-code")
				.body_includes("code_verifier=")
				.body_includes(format!("client_id={CLIENT_ID}"));
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-success\",\"refresh_token\":\"refresh-success\",\
				 \"token_type\":\"Bearer\",\"expires_in\":28800,\"scope\":\"sleep activity\",\
				 \"user_id\":\"7QX9ZK\"}",
			);
		})
		.await;
	let state = session.state.clone();
	let record = broker
		.complete_authorization(session, &state, "valid-code")
		.await
		.expect("Authorization code exchange should succeed.");

	mock.assert_async().await;

	assert_eq!(record.user_id.as_ref(), "7QX9ZK");
	assert_eq!(record.access_token.expose(), "access-success");
	assert_eq!(record.refresh_token.as_ref().map(|secret| secret.expose()), Some("refresh-success"));
	// The user unticked heartrate on the consent page.
	assert_eq!(record.scope, ScopeSet::from_scopes([FitbitScope::Activity, FitbitScope::Sleep]));
	assert_eq!(record.expires_at - record.issued_at, Duration::hours(8));

	let stored = store
		.fetch(&record.user_id)
		.await
		.expect("Token store fetch should succeed.")
		.expect("Stored record should remain present.");

	assert_eq!(stored.access_token.expose(), "access-success");
}

#[tokio::test]
async fn state_mismatch_never_reaches_the_token_endpoint() {
	let server = MockServer::start_async().await;
	let (broker, store) =
		build_reqwest_test_broker(mock_descriptor(&server.base_url()), CLIENT_ID, CLIENT_SECRET);
	let session = broker
		.start_authorization(ScopeSet::all(), redirect_uri())
		.expect("Authorization session should start successfully.");
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(500);
		})
		.await;
	let err = broker
		.complete_authorization(session, "forged-state", "code")
		.await
		.expect_err("State mismatch should be rejected.");

	assert!(matches!(err, Error::InvalidGrant { .. }));

	mock.assert_calls_async(0).await;

	assert!(store.is_empty());
}

#[tokio::test]
async fn exchange_code_classifies_invalid_grant_errors() {
	let server = MockServer::start_async().await;
	let (broker, store) =
		build_reqwest_test_broker(mock_descriptor(&server.base_url()), CLIENT_ID, CLIENT_SECRET);
	let session = broker
		.start_authorization(ScopeSet::all(), redirect_uri())
		.expect("Authorization session should start successfully.");
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\",\"error_description\":\"Authorization code invalid\"}");
		})
		.await;
	let err = broker
		.exchange_code(session, "stale-code")
		.await
		.expect_err("Invalid grant errors should be classified correctly.");

	assert!(matches!(err, Error::InvalidGrant { .. }));

	mock.assert_async().await;

	assert!(store.is_empty(), "Store must not retain records when the exchange fails.");
}

#[tokio::test]
async fn exchange_requires_the_fitbit_user_id() {
	let server = MockServer::start_async().await;
	let (broker, store) =
		build_reqwest_test_broker(mock_descriptor(&server.base_url()), CLIENT_ID, CLIENT_SECRET);
	let session = broker
		.start_authorization(ScopeSet::all(), redirect_uri())
		.expect("Authorization session should start successfully.");
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth2/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"a\",\"token_type\":\"Bearer\",\"expires_in\":3600}");
		})
		.await;
	let err = broker
		.exchange_code(session, "code")
		.await
		.expect_err("Token responses without user_id cannot be keyed.");

	assert!(matches!(err, Error::Config(ConfigError::MissingUserId)));
	assert!(store.is_empty());
}

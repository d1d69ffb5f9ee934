//! Fitbit Web API client: OAuth 2.0 authorization (code + PKCE, refresh rotation, revocation),
//! typed resource endpoints, and a webhook receiver for subscription notifications.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod provider;
#[cfg(feature = "server")] pub mod server;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		api::FitbitClient,
		auth::UserId,
		flows::Broker,
		http::ReqwestHttpClient,
		oauth::ReqwestTransportErrorMapper,
		provider::{ClientAuthMethod, FitbitStrategy, GrantType, ProviderDescriptor, ProviderStrategy},
		store::{BrokerStore, MemoryStore},
	};

	/// Broker type alias used by reqwest-backed integration tests.
	pub type ReqwestTestBroker = Broker<ReqwestHttpClient, ReqwestTransportErrorMapper>;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_client() -> ReqwestClient {
		ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.expect("Failed to build insecure Reqwest client for tests.")
	}

	/// Builds a Fitbit-shaped descriptor whose endpoints all live under `base` (typically an
	/// `httpmock` server URL).
	pub fn mock_descriptor(base: &str) -> ProviderDescriptor {
		let join = |path: &str| {
			Url::parse(&format!("{}{path}", base.trim_end_matches('/')))
				.expect("Mock endpoint should parse successfully.")
		};

		ProviderDescriptor::builder()
			.authorization_endpoint(join("/oauth2/authorize"))
			.token_endpoint(join("/oauth2/token"))
			.revocation_endpoint(join("/oauth2/revoke"))
			.api_base(join("/"))
			.support_grants([GrantType::AuthorizationCode, GrantType::RefreshToken])
			.preferred_client_auth_method(ClientAuthMethod::ClientSecretBasic)
			.build()
			.expect("Mock descriptor should build successfully.")
	}

	/// Constructs a [`Broker`] backed by an in-memory store, the Fitbit strategy, and the
	/// reqwest transport used across integration tests.
	pub fn build_reqwest_test_broker(
		descriptor: ProviderDescriptor,
		client_id: &str,
		client_secret: &str,
	) -> (ReqwestTestBroker, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn BrokerStore> = store_backend.clone();
		let strategy: Arc<dyn ProviderStrategy> = Arc::new(FitbitStrategy);
		let http_client = ReqwestHttpClient::with_client(test_reqwest_client());
		let mapper = Arc::new(ReqwestTransportErrorMapper);
		let broker =
			Broker::with_http_client(store, descriptor, strategy, client_id, http_client, mapper)
				.with_client_secret(client_secret);

		(broker, store_backend)
	}

	/// Wraps a test broker in a [`FitbitClient`] acting for `user`.
	pub fn build_test_client(broker: ReqwestTestBroker, user: &str) -> FitbitClient {
		let user = UserId::new(user).expect("Test user identifier should be valid.");

		FitbitClient::with_api_client(Arc::new(broker), user, test_reqwest_client())
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap, hash_map::DefaultHasher},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		hash::{Hash, Hasher},
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value as JsonValue;
	pub use thiserror::Error as ThisError;
	pub use time::{Date, Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tower as _};
#[cfg(feature = "cli")] use {clap as _, color_eyre as _, tracing_subscriber as _};

//! Environment-driven configuration for the client, the authorize helper, and the webhook.
//!
//! [`FitbitConfig::from_env`] loads a `.env` file when one exists and then reads the
//! `FITBIT_*` variables. [`FitbitConfig::from_lookup`] accepts any lookup closure so callers and
//! tests can supply values without touching the process environment.

// std
use std::{env, io::ErrorKind, net::SocketAddr, path::PathBuf};
// self
use crate::{
	_prelude::*,
	auth::ScopeSet,
	error::ConfigError,
	flows::{Broker, ReqwestBroker},
	provider::{
		ClientAuthMethod, FITBIT_API_BASE, FITBIT_AUTHORIZATION_URL, FITBIT_REVOCATION_URL,
		FITBIT_TOKEN_URL, FitbitStrategy, GrantType, ProviderDescriptor, ProviderQuirks,
	},
	store::{BrokerStore, FileStore},
};

/// OAuth client identifier issued for the Fitbit app.
pub const CLIENT_ID: &str = "FITBIT_CLIENT_ID";
/// Client secret; absent for public (PKCE-only) client apps.
pub const CLIENT_SECRET: &str = "FITBIT_CLIENT_SECRET";
/// Redirect URI registered for the app.
pub const REDIRECT_URI: &str = "FITBIT_REDIRECT_URI";
/// Token endpoint override.
pub const TOKEN_URL: &str = "FITBIT_TOKEN_URL";
/// Space-delimited scopes to request.
pub const SCOPES: &str = "FITBIT_SCOPES";
/// Location of the JSON token file.
pub const TOKEN_PATH: &str = "FITBIT_TOKEN_PATH";
/// Subscriber verification code shown in the app settings.
pub const VERIFY_CODE: &str = "FITBIT_VERIFY_CODE";
/// Listen address of the webhook receiver.
pub const WEBHOOK_ADDR: &str = "FITBIT_WEBHOOK_ADDR";
/// Route of the webhook receiver.
pub const WEBHOOK_PATH: &str = "FITBIT_WEBHOOK_PATH";
/// Set to any value to skip loading `.env`.
pub const SKIP_DOTENV: &str = "FITBIT_SKIP_DOTENV";

const DEFAULT_REDIRECT_URI: &str = "http://127.0.0.1:8080/";
const DEFAULT_WEBHOOK_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_WEBHOOK_PATH: &str = "/fitbit-notifications";

/// Settings shared by the library entry points and the binaries.
#[derive(Clone)]
pub struct FitbitConfig {
	/// OAuth client identifier.
	pub client_id: String,
	/// Client secret; `None` selects PKCE-only public client authentication.
	pub client_secret: Option<String>,
	/// Redirect URI registered for the app.
	pub redirect_uri: Url,
	/// Token endpoint override (defaults to the production endpoint).
	pub token_url: Option<Url>,
	/// Scopes requested during authorization.
	pub scope: ScopeSet,
	/// JSON token file.
	pub token_path: PathBuf,
	/// Subscriber verification code, required by the webhook receiver.
	pub verify_code: Option<String>,
	/// Webhook listen address.
	pub webhook_addr: SocketAddr,
	/// Webhook route.
	pub webhook_path: String,
}
impl FitbitConfig {
	/// Loads `.env` (a missing file is fine) and reads the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		hydrate_env_file()?;

		Self::from_lookup(|key| env::var(key).ok())
	}

	/// Reads settings through `lookup`; blank values count as unset.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |key: &str| {
			lookup(key).and_then(|value| {
				let trimmed = value.trim();

				if trimmed.is_empty() { None } else { Some(trimmed.to_owned()) }
			})
		};
		let client_id = get(CLIENT_ID).ok_or(ConfigError::MissingVar { key: CLIENT_ID })?;
		let redirect_uri =
			parse_url(REDIRECT_URI, get(REDIRECT_URI).as_deref().unwrap_or(DEFAULT_REDIRECT_URI))?;
		let token_url = get(TOKEN_URL).map(|raw| parse_url(TOKEN_URL, &raw)).transpose()?;
		let scope = match get(SCOPES) {
			Some(raw) => raw
				.parse::<ScopeSet>()
				.map_err(|e| ConfigError::InvalidVar { key: SCOPES, reason: e.to_string() })?,
			None => ScopeSet::all(),
		};
		let webhook_addr = get(WEBHOOK_ADDR)
			.as_deref()
			.unwrap_or(DEFAULT_WEBHOOK_ADDR)
			.parse::<SocketAddr>()
			.map_err(|e| ConfigError::InvalidVar { key: WEBHOOK_ADDR, reason: e.to_string() })?;
		let webhook_path = get(WEBHOOK_PATH).unwrap_or_else(|| DEFAULT_WEBHOOK_PATH.to_owned());

		if !webhook_path.starts_with('/') {
			return Err(ConfigError::InvalidVar {
				key: WEBHOOK_PATH,
				reason: "route must start with `/`".into(),
			});
		}

		Ok(Self {
			client_id,
			client_secret: get(CLIENT_SECRET),
			redirect_uri,
			token_url,
			scope,
			token_path: get(TOKEN_PATH)
				.map(PathBuf::from)
				.unwrap_or_else(|| FileStore::DEFAULT_PATH.into()),
			verify_code: get(VERIFY_CODE),
			webhook_addr,
			webhook_path,
		})
	}

	/// Production descriptor with the token endpoint override applied.
	///
	/// Without a client secret the descriptor switches to PKCE-only public client auth.
	pub fn descriptor(&self) -> Result<ProviderDescriptor, ConfigError> {
		let token = match &self.token_url {
			Some(url) => url.clone(),
			None => constant_url(FITBIT_TOKEN_URL)?,
		};
		let (method, quirks) = match self.client_secret {
			Some(_) => (ClientAuthMethod::ClientSecretBasic, ProviderQuirks::default()),
			None => (ClientAuthMethod::NoneWithPkce, ProviderQuirks::public_client()),
		};
		let descriptor = ProviderDescriptor::builder()
			.authorization_endpoint(constant_url(FITBIT_AUTHORIZATION_URL)?)
			.token_endpoint(token)
			.revocation_endpoint(constant_url(FITBIT_REVOCATION_URL)?)
			.api_base(constant_url(FITBIT_API_BASE)?)
			.support_grants([GrantType::AuthorizationCode, GrantType::RefreshToken])
			.preferred_client_auth_method(method)
			.quirks(quirks)
			.build()?;

		Ok(descriptor)
	}

	/// Opens the JSON token file named by [`FitbitConfig::token_path`].
	pub fn file_store(&self) -> Result<FileStore> {
		Ok(FileStore::open(&self.token_path)?)
	}

	/// Builds a reqwest-backed broker over `store`.
	pub fn broker(&self, store: Arc<dyn BrokerStore>) -> Result<ReqwestBroker> {
		let broker = Broker::new(store, self.descriptor()?, Arc::new(FitbitStrategy), &self.client_id);

		Ok(match &self.client_secret {
			Some(secret) => broker.with_client_secret(secret),
			None => broker,
		})
	}

	/// Verification code, or [`ConfigError::MissingVar`] when the webhook cannot run.
	pub fn require_verify_code(&self) -> Result<&str, ConfigError> {
		self.verify_code.as_deref().ok_or(ConfigError::MissingVar { key: VERIFY_CODE })
	}
}
impl Debug for FitbitConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("FitbitConfig")
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.field("redirect_uri", &self.redirect_uri.as_str())
			.field("token_url", &self.token_url.as_ref().map(Url::as_str))
			.field("scope", &self.scope)
			.field("token_path", &self.token_path)
			.field("verify_code_set", &self.verify_code.is_some())
			.field("webhook_addr", &self.webhook_addr)
			.field("webhook_path", &self.webhook_path)
			.finish()
	}
}

/// Loads `.env` into the process environment unless [`SKIP_DOTENV`] is set.
pub fn hydrate_env_file() -> Result<(), ConfigError> {
	if env::var_os(SKIP_DOTENV).is_some() {
		return Ok(());
	}

	match dotenvy::dotenv() {
		Ok(_) => Ok(()),
		Err(dotenvy::Error::Io(err)) if err.kind() == ErrorKind::NotFound => Ok(()),
		Err(err) => Err(err.into()),
	}
}

fn parse_url(key: &'static str, raw: &str) -> Result<Url, ConfigError> {
	Url::parse(raw).map_err(|e| ConfigError::InvalidVar { key, reason: e.to_string() })
}

fn constant_url(raw: &str) -> Result<Url, ConfigError> {
	Url::parse(raw).map_err(|source| ConfigError::InvalidDescriptor { source })
}

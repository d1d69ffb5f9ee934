// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, auth::ScopeSet, flows::common, provider::ProviderDescriptor};

const STATE_LEN: usize = 32;
const PKCE_VERIFIER_LEN: usize = 64;

/// Supported PKCE challenge methods surfaced via [`AuthorizationSession`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PkceCodeChallengeMethod {
	/// SHA-256 based PKCE (RFC 7636 S256).
	S256,
}
impl PkceCodeChallengeMethod {
	/// Returns the RFC 7636 identifier for the challenge method.
	pub fn as_str(self) -> &'static str {
		match self {
			PkceCodeChallengeMethod::S256 => "S256",
		}
	}
}

/// Values accepted by Fitbit's `prompt` authorize parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Prompt {
	/// Skip the consent page when the user already granted every scope.
	None,
	/// Always show the consent page.
	Consent,
	/// Force the user to sign in again.
	Login,
	/// Force sign-in, then show the consent page.
	LoginConsent,
}
impl Prompt {
	/// Wire value.
	pub fn as_str(self) -> &'static str {
		match self {
			Prompt::None => "none",
			Prompt::Consent => "consent",
			Prompt::Login => "login",
			Prompt::LoginConsent => "login consent",
		}
	}
}

/// Optional authorize-page hints.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AuthorizeHints {
	/// Requested `prompt` behavior.
	pub prompt: Option<Prompt>,
	/// Requested token lifetime (`expires_in`, whole seconds).
	pub expires_in: Option<Duration>,
}
impl AuthorizeHints {
	/// Sets the `prompt` hint.
	pub fn prompt(mut self, prompt: Prompt) -> Self {
		self.prompt = Some(prompt);

		self
	}

	/// Sets the `expires_in` hint.
	pub fn expires_in(mut self, lifetime: Duration) -> Self {
		self.expires_in = Some(lifetime);

		self
	}
}

/// Authorization Code + PKCE handshake metadata returned by
/// [`Broker::start_authorization`](crate::flows::Broker::start_authorization).
///
/// The session holds the PKCE verifier, so keep it server-side until the redirect comes back.
#[derive(Clone)]
pub struct AuthorizationSession {
	/// Requested scope set (the user may grant fewer on the consent page).
	pub scope: ScopeSet,
	/// Opaque state value that must round-trip via the redirect handler.
	pub state: String,
	/// Redirect URI supplied when constructing the authorize URL.
	pub redirect_uri: Url,
	/// Fully-formed authorize URL that end-users should be sent to.
	pub authorize_url: Url,
	pkce: PkcePair,
}
impl AuthorizationSession {
	pub(super) fn new(
		scope: ScopeSet,
		redirect_uri: Url,
		authorize_url: Url,
		state: String,
		pkce: PkcePair,
	) -> Self {
		Self { scope, state, redirect_uri, authorize_url, pkce }
	}

	/// PKCE code challenge derived from the secret verifier.
	pub fn code_challenge(&self) -> &str {
		&self.pkce.challenge
	}

	/// PKCE challenge method (currently always `S256`).
	pub fn code_challenge_method(&self) -> PkceCodeChallengeMethod {
		self.pkce.method
	}

	/// Validates the returned `state` parameter after the authorization redirect.
	pub fn validate_state(&self, returned_state: &str) -> Result<()> {
		if returned_state == self.state {
			Ok(())
		} else {
			Err(Error::InvalidGrant { reason: "Authorization state mismatch".into() })
		}
	}

	pub(super) fn into_exchange_parts(self) -> (ScopeSet, Url, PkcePair) {
		let AuthorizationSession { scope, redirect_uri, pkce, .. } = self;

		(scope, redirect_uri, pkce)
	}
}
impl Debug for AuthorizationSession {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationSession")
			.field("scope", &self.scope)
			.field("state", &self.state)
			.field("redirect_uri", &self.redirect_uri)
			.field("authorize_url", &self.authorize_url)
			.field("code_challenge", &self.pkce.challenge)
			.field("code_challenge_method", &self.pkce.method)
			.finish()
	}
}

#[derive(Clone)]
pub(super) struct PkcePair {
	pub(super) verifier: String,
	challenge: String,
	method: PkceCodeChallengeMethod,
}
impl PkcePair {
	pub(super) fn generate() -> Self {
		let verifier = random_string(PKCE_VERIFIER_LEN);
		let challenge = compute_pkce_challenge(&verifier);

		Self { verifier, challenge, method: PkceCodeChallengeMethod::S256 }
	}
}

pub(super) fn build_session(
	descriptor: &ProviderDescriptor,
	client_id: &str,
	scope: ScopeSet,
	redirect_uri: Url,
	hints: AuthorizeHints,
) -> AuthorizationSession {
	let state = random_string(STATE_LEN);
	let pkce = PkcePair::generate();
	let authorize_url =
		build_authorize_url(descriptor, client_id, &redirect_uri, &scope, &state, &pkce, hints);

	AuthorizationSession::new(scope, redirect_uri, authorize_url, state, pkce)
}

fn build_authorize_url(
	descriptor: &ProviderDescriptor,
	client_id: &str,
	redirect_uri: &Url,
	scope: &ScopeSet,
	state: &str,
	pkce: &PkcePair,
	hints: AuthorizeHints,
) -> Url {
	let mut url = descriptor.endpoints.authorization.clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("response_type", "code");
	pairs.append_pair("client_id", client_id);
	pairs.append_pair("redirect_uri", redirect_uri.as_str());

	if let Some(scope_value) = common::format_scope(scope, descriptor.quirks.scope_delimiter) {
		pairs.append_pair("scope", &scope_value);
	}

	pairs.append_pair("state", state);
	pairs.append_pair("code_challenge", &pkce.challenge);
	pairs.append_pair("code_challenge_method", pkce.method.as_str());

	if let Some(prompt) = hints.prompt {
		pairs.append_pair("prompt", prompt.as_str());
	}
	if let Some(lifetime) = hints.expires_in.filter(|lifetime| lifetime.is_positive()) {
		pairs.append_pair("expires_in", &lifetime.whole_seconds().to_string());
	}

	drop(pairs);

	url
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

fn compute_pkce_challenge(verifier: &str) -> String {
	let digest = Sha256::digest(verifier.as_bytes());

	URL_SAFE_NO_PAD.encode(digest)
}

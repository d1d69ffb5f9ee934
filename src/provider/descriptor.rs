//! Provider descriptor data structures and helpers shared by all flows.
//!
//! The module exposes validated metadata, supporting builder utilities, and
//! grant-specific helpers so the Fitbit endpoints (or a local mock of them) can be
//! described in a transport-agnostic way.

/// Builder API for assembling provider descriptors.
pub mod builder;
/// Grant helpers wired into provider descriptors.
pub mod grant;
/// Provider-specific quirk toggles.
pub mod quirks;

pub use builder::*;
pub use grant::*;
pub use quirks::*;

// self
use crate::_prelude::*;

/// Production authorization endpoint.
pub const FITBIT_AUTHORIZATION_URL: &str = "https://www.fitbit.com/oauth2/authorize";
/// Production token endpoint.
pub const FITBIT_TOKEN_URL: &str = "https://api.fitbit.com/oauth2/token";
/// Production revocation endpoint.
pub const FITBIT_REVOCATION_URL: &str = "https://api.fitbit.com/oauth2/revoke";
/// Production resource API base.
pub const FITBIT_API_BASE: &str = "https://api.fitbit.com";

/// Preferred client authentication modes for token endpoint calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	#[default]
	/// HTTP Basic with `client_id`/`client_secret` (Fitbit server and personal apps).
	ClientSecretBasic,
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
	/// Public clients that prove possession via PKCE (Fitbit client apps).
	NoneWithPkce,
}

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Authorization endpoint used by the Authorization Code flow.
	pub authorization: Url,
	/// Token endpoint used for exchanges and refreshes.
	pub token: Url,
	/// Optional revocation endpoint.
	pub revocation: Option<Url>,
	/// Base URL that versioned resource paths are joined onto.
	pub api_base: Url,
}

/// Immutable provider descriptor consumed by flows and the resource client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Endpoint definitions.
	pub endpoints: ProviderEndpoints,
	/// Supported grant flags.
	pub supported_grants: SupportedGrants,
	/// Preferred client authentication mechanism.
	pub preferred_client_auth_method: ClientAuthMethod,
	/// Provider-specific quirks.
	pub quirks: ProviderQuirks,
}
impl ProviderDescriptor {
	/// Creates a new, empty builder.
	pub fn builder() -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new()
	}

	/// Production Fitbit descriptor.
	pub fn fitbit() -> Result<Self, ProviderDescriptorError> {
		Self::builder()
			.authorization_endpoint(parse_const(FITBIT_AUTHORIZATION_URL)?)
			.token_endpoint(parse_const(FITBIT_TOKEN_URL)?)
			.revocation_endpoint(parse_const(FITBIT_REVOCATION_URL)?)
			.api_base(parse_const(FITBIT_API_BASE)?)
			.support_grants([GrantType::AuthorizationCode, GrantType::RefreshToken])
			.preferred_client_auth_method(ClientAuthMethod::ClientSecretBasic)
			.build()
	}

	/// Checks whether the descriptor supports a given grant.
	pub fn supports(&self, grant: GrantType) -> bool {
		self.supported_grants.supports(grant)
	}

	/// Joins a resource path (for example `1/user/-/profile.json`) onto the API base.
	pub fn resource_url(&self, path: &str) -> Result<Url, url::ParseError> {
		let mut base = self.endpoints.api_base.clone();

		if !base.path().ends_with('/') {
			let with_slash = format!("{}/", base.path());

			base.set_path(&with_slash);
		}

		base.join(path.trim_start_matches('/'))
	}
}

fn parse_const(raw: &str) -> Result<Url, ProviderDescriptorError> {
	Url::parse(raw).map_err(|_| ProviderDescriptorError::InvalidUrl { url: raw.to_owned() })
}

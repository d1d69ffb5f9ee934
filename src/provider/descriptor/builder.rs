// std
use std::{
	iter::IntoIterator,
	net::{Ipv4Addr, Ipv6Addr},
};
// crates.io
use url::Host;
// self
use crate::{
	_prelude::*,
	provider::{
		ClientAuthMethod, FITBIT_API_BASE, GrantType, ProviderDescriptor, ProviderEndpoints,
		ProviderQuirks, SupportedGrants,
	},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ProviderDescriptorError {
	/// Authorization endpoint is required for Authorization Code flows.
	#[error("Missing authorization endpoint.")]
	MissingAuthorizationEndpoint,
	/// Token endpoint is mandatory for all flows.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// At least one grant must be supported.
	#[error("Descriptor must enable at least one grant type.")]
	NoSupportedGrants,
	/// PKCE requirement implies Authorization Code support.
	#[error("The `pkce_required` flag requires enabling the authorization_code grant.")]
	PkceRequiredWithoutAuthorizationCode,
	/// Public clients cannot authenticate without PKCE.
	#[error("The none_with_pkce client auth method requires the `pkce_required` quirk.")]
	PublicClientWithoutPkce,
	/// Endpoints must use HTTPS unless they point at a loopback host.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// A built-in or supplied URL could not be parsed.
	#[error("Invalid endpoint URL: {url}.")]
	InvalidUrl {
		/// Offending URL text.
		url: String,
	},
	/// Reject scope delimiters that are control characters.
	#[error("Scope delimiter must be a printable character.")]
	InvalidScopeDelimiter {
		/// Invalid delimiter that was supplied.
		delimiter: char,
	},
}

/// Builder for [`ProviderDescriptor`] values.
#[derive(Debug, Default)]
pub struct ProviderDescriptorBuilder {
	/// Optional authorization endpoint (required for Authorization Code flows).
	pub authorization_endpoint: Option<Url>,
	/// Token endpoint used for exchanges and refreshes.
	pub token_endpoint: Option<Url>,
	/// Optional revocation endpoint.
	pub revocation_endpoint: Option<Url>,
	/// Resource API base; defaults to the production host.
	pub api_base: Option<Url>,
	/// Grants enabled for the provider.
	pub supported_grants: SupportedGrants,
	/// Preferred client authentication method for the token endpoint.
	pub preferred_client_auth_method: ClientAuthMethod,
	/// Provider-specific quirks.
	pub quirks: ProviderQuirks,
}
impl ProviderDescriptorBuilder {
	/// Creates a new, empty builder.
	pub fn new() -> Self {
		Self::default()
	}

	/// Sets the authorization endpoint.
	pub fn authorization_endpoint(mut self, url: Url) -> Self {
		self.authorization_endpoint = Some(url);

		self
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the optional revocation endpoint.
	pub fn revocation_endpoint(mut self, url: Url) -> Self {
		self.revocation_endpoint = Some(url);

		self
	}

	/// Sets the resource API base.
	pub fn api_base(mut self, url: Url) -> Self {
		self.api_base = Some(url);

		self
	}

	/// Marks a single grant type as supported.
	pub fn support_grant(mut self, grant: GrantType) -> Self {
		self.supported_grants = self.supported_grants.enable(grant);

		self
	}

	/// Marks multiple grants as supported.
	pub fn support_grants<I>(mut self, grants: I) -> Self
	where
		I: IntoIterator<Item = GrantType>,
	{
		self.supported_grants = grants.into_iter().fold(self.supported_grants, SupportedGrants::enable);

		self
	}

	/// Overrides the preferred client authentication method.
	pub fn preferred_client_auth_method(mut self, method: ClientAuthMethod) -> Self {
		self.preferred_client_auth_method = method;

		self
	}

	/// Overrides the provider quirks.
	pub fn quirks(mut self, quirks: ProviderQuirks) -> Self {
		self.quirks = quirks;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let authorization = self
			.authorization_endpoint
			.ok_or(ProviderDescriptorError::MissingAuthorizationEndpoint)?;
		let token = self.token_endpoint.ok_or(ProviderDescriptorError::MissingTokenEndpoint)?;
		let api_base = match self.api_base {
			Some(url) => url,
			None => Url::parse(FITBIT_API_BASE)
				.map_err(|_| ProviderDescriptorError::InvalidUrl { url: FITBIT_API_BASE.into() })?,
		};
		let endpoints = ProviderEndpoints {
			authorization,
			token,
			revocation: self.revocation_endpoint,
			api_base,
		};
		let descriptor = ProviderDescriptor {
			endpoints,
			supported_grants: self.supported_grants,
			preferred_client_auth_method: self.preferred_client_auth_method,
			quirks: self.quirks,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl ProviderDescriptor {
	/// Validates invariants for the descriptor.
	fn validate(&self) -> Result<(), ProviderDescriptorError> {
		if self.supported_grants.is_empty() {
			return Err(ProviderDescriptorError::NoSupportedGrants);
		}
		if self.quirks.pkce_required && !self.supports(GrantType::AuthorizationCode) {
			return Err(ProviderDescriptorError::PkceRequiredWithoutAuthorizationCode);
		}
		if matches!(self.preferred_client_auth_method, ClientAuthMethod::NoneWithPkce)
			&& !self.quirks.pkce_required
		{
			return Err(ProviderDescriptorError::PublicClientWithoutPkce);
		}

		validate_endpoint("authorization", &self.endpoints.authorization)?;
		validate_endpoint("token", &self.endpoints.token)?;

		if let Some(revocation) = self.endpoints.revocation.as_ref() {
			validate_endpoint("revocation", revocation)?;
		}

		validate_endpoint("api", &self.endpoints.api_base)?;
		validate_scope_delimiter(self.quirks.scope_delimiter)?;

		Ok(())
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ProviderDescriptorError> {
	match url.scheme() {
		"https" => Ok(()),
		"http" if is_loopback(url) => Ok(()),
		_ => Err(ProviderDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() }),
	}
}

fn is_loopback(url: &Url) -> bool {
	match url.host() {
		Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(Host::Ipv4(addr)) => addr == Ipv4Addr::LOCALHOST,
		Some(Host::Ipv6(addr)) => addr == Ipv6Addr::LOCALHOST,
		None => false,
	}
}

fn validate_scope_delimiter(delimiter: char) -> Result<(), ProviderDescriptorError> {
	if delimiter.is_control() {
		Err(ProviderDescriptorError::InvalidScopeDelimiter { delimiter })
	} else {
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(raw: &str) -> Url {
		Url::parse(raw).expect("Test URL should parse.")
	}

	fn base() -> ProviderDescriptorBuilder {
		ProviderDescriptor::builder()
			.authorization_endpoint(url("https://www.fitbit.com/oauth2/authorize"))
			.token_endpoint(url("https://api.fitbit.com/oauth2/token"))
			.support_grant(GrantType::AuthorizationCode)
	}

	#[test]
	fn plain_http_is_rejected_for_remote_hosts() {
		let err = base()
			.token_endpoint(url("http://api.fitbit.com/oauth2/token"))
			.build()
			.expect_err("Remote plain-HTTP token endpoint should be rejected.");

		assert!(matches!(err, ProviderDescriptorError::InsecureEndpoint { endpoint: "token", .. }));
	}

	#[test]
	fn plain_http_is_allowed_for_loopback_hosts() {
		for raw in ["http://localhost:8080/t", "http://127.0.0.1:8080/t", "http://[::1]:8080/t"] {
			base()
				.token_endpoint(url(raw))
				.api_base(url(raw))
				.build()
				.expect("Loopback endpoints should be accepted.");
		}
	}

	#[test]
	fn public_clients_require_pkce() {
		let err = base()
			.preferred_client_auth_method(ClientAuthMethod::NoneWithPkce)
			.build()
			.expect_err("Public client without PKCE should be rejected.");

		assert_eq!(err, ProviderDescriptorError::PublicClientWithoutPkce);

		base()
			.preferred_client_auth_method(ClientAuthMethod::NoneWithPkce)
			.quirks(ProviderQuirks::public_client())
			.build()
			.expect("Public client with PKCE should build.");
	}

	#[test]
	fn missing_grants_and_bad_delimiters_fail() {
		let err = ProviderDescriptor::builder()
			.authorization_endpoint(url("https://www.fitbit.com/oauth2/authorize"))
			.token_endpoint(url("https://api.fitbit.com/oauth2/token"))
			.build()
			.expect_err("Descriptor without grants should be rejected.");

		assert_eq!(err, ProviderDescriptorError::NoSupportedGrants);

		let err = base()
			.quirks(ProviderQuirks { scope_delimiter: '\n', ..ProviderQuirks::default() })
			.build()
			.expect_err("Control-character delimiter should be rejected.");

		assert!(matches!(err, ProviderDescriptorError::InvalidScopeDelimiter { .. }));
	}
}

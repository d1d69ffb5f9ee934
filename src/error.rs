//! Crate-level error types shared across flows, stores, and resource requests.

// self
use crate::{_prelude::*, http::RateLimitSnapshot};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary upstream failure; retry with backoff.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Resource endpoint answered with a non-success status.
	#[error(transparent)]
	Api(#[from] ApiError),

	/// Requested scopes exceed what was granted.
	#[error("Token lacks the required scopes: {reason}.")]
	InsufficientScope {
		/// Provider- or client-supplied reason string.
		reason: String,
	},
	/// Provider rejected the grant (e.g., bad code or refresh token).
	#[error("Provider rejected the grant: {reason}.")]
	InvalidGrant {
		/// Provider- or client-supplied reason string.
		reason: String,
	},
	/// Client authentication failed or credentials are malformed.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Provider- or client-supplied reason string.
		reason: String,
	},
	/// Token has been revoked and must not be reused.
	#[error("Token has been revoked.")]
	Revoked,
	/// Caller supplied a value the endpoint does not accept.
	#[error("Invalid argument: {reason}.")]
	InvalidArgument {
		/// Description of the rejected value.
		reason: String,
	},
	/// Resource endpoint throttled the client (HTTP 429).
	#[error("Rate limit exceeded; retry after {retry_after:?}.")]
	RateLimited {
		/// Delay advertised by the provider, when available.
		retry_after: Option<Duration>,
	},
	/// Response body did not have the documented shape.
	#[error("Unexpected response: {reason}.")]
	UnexpectedResponse {
		/// Description of the mismatch.
		reason: String,
	},
}
impl Error {
	pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
		Self::InvalidArgument { reason: reason.into() }
	}

	pub(crate) fn unexpected_response(reason: impl Into<String>) -> Self {
		Self::UnexpectedResponse { reason: reason.into() }
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Provider descriptor contains an invalid URL.
	#[error("Descriptor contains an invalid URL.")]
	InvalidDescriptor {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Descriptor failed builder validation.
	#[error(transparent)]
	Descriptor(#[from] crate::provider::ProviderDescriptorError),
	/// Redirect URI cannot be parsed.
	#[error("Redirect URI is invalid.")]
	InvalidRedirect {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Descriptor does not enable the requested grant.
	#[error("Descriptor does not enable the {grant} grant.")]
	UnsupportedGrant {
		/// Disabled grant label.
		grant: &'static str,
	},
	/// Descriptor has no revocation endpoint.
	#[error("Descriptor does not declare a revocation endpoint.")]
	MissingRevocationEndpoint,
	/// Cached record is missing a refresh secret.
	#[error("Cached token record is missing a refresh token.")]
	MissingRefreshToken,
	/// Token endpoint response omitted the Fitbit `user_id` field.
	#[error("Token endpoint response is missing user_id.")]
	MissingUserId,
	/// Token endpoint returned a malformed `user_id` field.
	#[error("Token endpoint returned an invalid user_id.")]
	InvalidUserId(#[from] crate::auth::IdentifierError),
	/// Request scopes cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// Token record builder validation failed.
	#[error("Unable to build token record.")]
	TokenBuild(#[from] crate::auth::TokenRecordBuilderError),
	/// Token endpoint response omitted `expires_in`.
	#[error("Token endpoint response is missing expires_in.")]
	MissingExpiresIn,
	/// Token endpoint returned an excessively large `expires_in`.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
	/// Token endpoint returned a non-positive duration.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
	/// Required environment variable is absent.
	#[error("Missing required environment variable `{key}`.")]
	MissingVar {
		/// Variable name.
		key: &'static str,
	},
	/// Environment variable is present but unusable.
	#[error("Environment variable `{key}` is invalid: {reason}.")]
	InvalidVar {
		/// Variable name.
		key: &'static str,
		/// Why the value was rejected.
		reason: String,
	},
	/// `.env` file exists but could not be loaded.
	#[error("Failed to load .env file.")]
	Dotenv(#[from] dotenvy::Error),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<reqwest::Error> for ConfigError {
	fn from(e: reqwest::Error) -> Self {
		Self::http_client_build(e)
	}
}

/// Temporary failure variants (safe to retry).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Provider returned an unexpected but non-fatal response.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Provider- or client-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Token endpoint responded with malformed JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {endpoint}.")]
	Network {
		/// Which endpoint was being called (token, revocation, api).
		endpoint: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a token-endpoint network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { endpoint: "the token endpoint", source: Box::new(src) }
	}

	/// Wraps a resource-endpoint network error.
	pub fn api(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { endpoint: "the Fitbit API", source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Single entry of the Fitbit `errors` array.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitbitErrorDetail {
	/// Machine-readable category (`expired_token`, `validation`, `not_found`, ...).
	pub error_type: String,
	/// Offending field, when the provider names one.
	#[serde(default)]
	pub field_name: Option<String>,
	/// Human-readable message.
	#[serde(default)]
	pub message: String,
}

/// Non-success response from a Fitbit resource endpoint.
#[derive(Clone, Debug, ThisError)]
#[error("Fitbit API returned HTTP {status} for {path}{}.", summary(.errors))]
pub struct ApiError {
	/// HTTP status code.
	pub status: u16,
	/// Request path (without host).
	pub path: String,
	/// Parsed `errors` entries; empty when the body was not a Fitbit error envelope.
	pub errors: Vec<FitbitErrorDetail>,
	/// Rate-limit headers observed on the failing response.
	pub rate_limit: Option<RateLimitSnapshot>,
}
impl ApiError {
	/// Returns true when any entry carries the given `errorType`.
	pub fn has_error_type(&self, error_type: &str) -> bool {
		self.errors.iter().any(|detail| detail.error_type.eq_ignore_ascii_case(error_type))
	}
}

fn summary(errors: &[FitbitErrorDetail]) -> String {
	match errors.first() {
		Some(first) => format!(" ({}: {})", first.error_type, first.message),
		None => String::new(),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn api_error_display_includes_first_detail() {
		let err = ApiError {
			status: 401,
			path: "/1/user/-/profile.json".into(),
			errors: vec![FitbitErrorDetail {
				error_type: "expired_token".into(),
				field_name: None,
				message: "Access token expired".into(),
			}],
			rate_limit: None,
		};

		assert_eq!(
			err.to_string(),
			"Fitbit API returned HTTP 401 for /1/user/-/profile.json (expired_token: Access token expired)."
		);
		assert!(err.has_error_type("EXPIRED_TOKEN"));
		assert!(!err.has_error_type("invalid_token"));
	}

	#[test]
	fn error_detail_tolerates_missing_optional_fields() {
		let detail: FitbitErrorDetail =
			serde_json::from_str("{\"errorType\":\"validation\",\"fieldName\":\"date\"}")
				.expect("Error detail should deserialize without a message.");

		assert_eq!(detail.field_name.as_deref(), Some("date"));
		assert!(detail.message.is_empty());
	}
}

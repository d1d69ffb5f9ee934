//! Provider strategy hooks that classify token endpoint failures.
//!
//! Implementations normalize error mapping without tying flows to any particular HTTP
//! client.

// self
use crate::{_prelude::*, error::FitbitErrorDetail, provider::descriptor::GrantType};

/// Strategy hook that maps token endpoint failures into the crate error taxonomy.
///
/// Implementors are required to be `Send + Sync`, and the hook works on crate-owned data
/// types so downstream crates never depend on reqwest-specific structures.
pub trait ProviderStrategy: Send + Sync {
	/// Maps low-level HTTP/JSON errors into the crate taxonomy for a token request.
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind;
}

/// Canonical provider error categories used by strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderErrorKind {
	/// Authorization server rejected the grant (bad code, expired or revoked refresh token).
	InvalidGrant,
	/// Client authentication failed.
	InvalidClient,
	/// Requested scopes exceed what the token covers.
	InsufficientScope,
	/// Failure is temporary and should be retried.
	Transient,
}

/// Context passed to provider strategies when classifying token errors.
///
/// Only primitive data is kept (status codes, OAuth fields, Fitbit error types, body
/// preview). Flows populate the context before invoking
/// [`ProviderStrategy::classify_token_error`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderErrorContext {
	/// Grant type associated with the failing request.
	pub grant_type: GrantType,
	/// HTTP status code returned by the token endpoint, when available.
	pub http_status: Option<u16>,
	/// RFC 6749 `error` field.
	pub oauth_error: Option<String>,
	/// RFC 6749 `error_description` field.
	pub error_description: Option<String>,
	/// `errorType` values from a Fitbit `errors` envelope.
	pub fitbit_error_types: Vec<String>,
	/// Preview of the response body for non-JSON payloads.
	pub body_preview: Option<String>,
	/// Indicates whether the failure originated from the network/transport layer.
	pub network_error: bool,
}
impl ProviderErrorContext {
	const BODY_PREVIEW_LIMIT: usize = 256;

	/// Creates a new context scoped to the provided grant type.
	pub fn new(grant_type: GrantType) -> Self {
		Self {
			grant_type,
			http_status: None,
			oauth_error: None,
			error_description: None,
			fitbit_error_types: Vec::new(),
			body_preview: None,
			network_error: false,
		}
	}

	/// Convenience constructor for transport-level/network failures.
	pub fn network_failure(grant_type: GrantType) -> Self {
		let mut ctx = Self::new(grant_type);

		ctx.network_error = true;

		ctx
	}

	/// Adds an HTTP status code (e.g., 400, 401, 500).
	pub fn with_http_status(mut self, status: u16) -> Self {
		self.http_status = Some(status);

		self
	}

	/// Adds the OAuth error code string.
	pub fn with_oauth_error(mut self, error: impl Into<String>) -> Self {
		self.oauth_error = Some(error.into());

		self
	}

	/// Adds the OAuth `error_description` field.
	pub fn with_error_description(mut self, description: impl Into<String>) -> Self {
		self.error_description = Some(description.into());

		self
	}

	/// Adds the entries of a Fitbit error envelope.
	pub fn with_fitbit_errors(mut self, errors: &[FitbitErrorDetail]) -> Self {
		self.fitbit_error_types.extend(errors.iter().map(|detail| detail.error_type.clone()));

		if self.error_description.is_none() {
			self.error_description = errors.first().map(|detail| detail.message.clone());
		}

		self
	}

	/// Adds a body preview for non-JSON payloads.
	pub fn with_body_preview(mut self, body: impl Into<String>) -> Self {
		self.body_preview = Some(truncate_preview(body.into()));

		self
	}
}

/// Strategy tuned for the Fitbit authorization server.
///
/// Fitbit answers token failures with either RFC 6749 fields or its own
/// `{"errors":[{"errorType":..}],"success":false}` envelope. Envelope types take priority,
/// then OAuth fields, then body hints, and finally the HTTP status. Network failures are
/// always transient.
#[derive(Debug, Default)]
pub struct FitbitStrategy;
impl Display for FitbitStrategy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("fitbit-strategy")
	}
}
impl ProviderStrategy for FitbitStrategy {
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind {
		if ctx.network_error {
			return ProviderErrorKind::Transient;
		}
		if let Some(kind) = ctx.fitbit_error_types.iter().find_map(|value| match_exact_value(value)) {
			return kind;
		}
		if let Some(kind) =
			classify_oauth_error(ctx.oauth_error.as_deref(), ctx.error_description.as_deref())
		{
			return kind;
		}
		if let Some(kind) = classify_body(ctx.body_preview.as_deref()) {
			return kind;
		}

		classify_status(ctx.http_status)
	}
}

fn truncate_preview(body: String) -> String {
	if body.chars().count() <= ProviderErrorContext::BODY_PREVIEW_LIMIT {
		return body;
	}

	let mut buf = body.chars().take(ProviderErrorContext::BODY_PREVIEW_LIMIT).collect::<String>();

	buf.push('…');

	buf
}

fn classify_oauth_error(
	oauth_error: Option<&str>,
	error_description: Option<&str>,
) -> Option<ProviderErrorKind> {
	oauth_error
		.and_then(match_exact_value)
		.or_else(|| error_description.and_then(match_exact_value))
		.or_else(|| classify_body(error_description))
}

fn match_exact_value(value: &str) -> Option<ProviderErrorKind> {
	// Fitbit reports a dead refresh token as `invalid_grant`, or as `invalid_token`/`expired_token`
	// on the revocation endpoint. `invalid_request` means the request itself was malformed and
	// says nothing about the grant.
	const INVALID_GRANT: [&str; 4] = ["invalid_grant", "access_denied", "expired_token", "invalid_token"];
	const INVALID_CLIENT: [&str; 4] =
		["invalid_client", "unauthorized_client", "unauthorized", "invalid_request"];
	const INSUFFICIENT_SCOPE: [&str; 3] =
		["invalid_scope", "insufficient_scope", "insufficient_permissions"];
	const TRANSIENT: [&str; 3] = ["temporarily_unavailable", "server_error", "system"];

	let is = |candidates: &[&str]| candidates.iter().any(|c| value.eq_ignore_ascii_case(c));

	if is(&INVALID_GRANT) {
		Some(ProviderErrorKind::InvalidGrant)
	} else if is(&INVALID_CLIENT) {
		Some(ProviderErrorKind::InvalidClient)
	} else if is(&INSUFFICIENT_SCOPE) {
		Some(ProviderErrorKind::InsufficientScope)
	} else if is(&TRANSIENT) {
		Some(ProviderErrorKind::Transient)
	} else {
		None
	}
}

fn classify_body(body: Option<&str>) -> Option<ProviderErrorKind> {
	let body = body?;
	let lowered = body.to_ascii_lowercase();

	match lowered.as_str() {
		text if text.contains("invalid_grant")
			|| text.contains("refresh token invalid")
			|| text.contains("expired_token") =>
			Some(ProviderErrorKind::InvalidGrant),
		text if text.contains("invalid_client") => Some(ProviderErrorKind::InvalidClient),
		text if text.contains("insufficient_scope") || text.contains("invalid_scope") =>
			Some(ProviderErrorKind::InsufficientScope),
		text if text.contains("temporarily_unavailable") || text.contains("retry") =>
			Some(ProviderErrorKind::Transient),
		_ => None,
	}
}

fn classify_status(status: Option<u16>) -> ProviderErrorKind {
	match status {
		Some(400 | 404 | 410) => ProviderErrorKind::InvalidGrant,
		Some(401) => ProviderErrorKind::InvalidClient,
		Some(403) => ProviderErrorKind::InsufficientScope,
		_ => ProviderErrorKind::Transient,
	}
}

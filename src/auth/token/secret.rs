//! Redacting wrapper for access and refresh tokens.

// crates.io
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Bearer or refresh token whose formatters never print the value.
///
/// `Debug` shows a short SHA-256 fingerprint instead, which is enough to tell two rotations
/// apart in logs without leaking anything usable.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	const FINGERPRINT_BYTES: usize = 4;

	/// Wraps a token value.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the raw token. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Hex prefix of the token's SHA-256 digest.
	pub fn fingerprint(&self) -> String {
		Sha256::digest(self.0.as_bytes())
			.iter()
			.take(Self::FINGERPRINT_BYTES)
			.map(|byte| format!("{byte:02x}"))
			.collect()
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "TokenSecret(sha256:{})", self.fingerprint())
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

// self
use crate::_prelude::*;

/// Per-deployment switches for how flows talk to the Fitbit authorization server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderQuirks {
	/// Code exchanges must carry a PKCE verifier (mandatory for Fitbit "client" apps).
	pub pkce_required: bool,
	/// Separator placed between scopes in the authorize URL. Fitbit accepts a single space.
	pub scope_delimiter: char,
}
impl ProviderQuirks {
	/// Settings for a confidential ("server") Fitbit application.
	pub const CONFIDENTIAL: Self = Self { pkce_required: false, scope_delimiter: ' ' };

	/// Settings for a public ("client") Fitbit application that authenticates with PKCE only.
	pub const fn public_client() -> Self {
		Self { pkce_required: true, ..Self::CONFIDENTIAL }
	}
}
impl Default for ProviderQuirks {
	fn default() -> Self {
		Self::CONFIDENTIAL
	}
}

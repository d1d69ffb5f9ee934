// self
use crate::_prelude::*;

/// Grants the Fitbit token endpoint accepts from this crate.
///
/// Fitbit also issues client-credentials tokens, but only for a handful of partner endpoints,
/// so they are not modeled here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
	/// Authorization code, optionally bound to a PKCE verifier.
	AuthorizationCode,
	/// Refresh token rotation.
	RefreshToken,
}
impl GrantType {
	/// Every grant this crate can drive.
	pub const ALL: [GrantType; 2] = [GrantType::AuthorizationCode, GrantType::RefreshToken];

	/// `grant_type` form value.
	pub const fn as_str(self) -> &'static str {
		match self {
			GrantType::AuthorizationCode => "authorization_code",
			GrantType::RefreshToken => "refresh_token",
		}
	}

	const fn bit(self) -> u8 {
		match self {
			GrantType::AuthorizationCode => 0b01,
			GrantType::RefreshToken => 0b10,
		}
	}
}
impl Display for GrantType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Set of grants enabled on a descriptor.
#[derive(Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<GrantType>", into = "Vec<GrantType>")]
pub struct SupportedGrants(u8);
impl SupportedGrants {
	/// Returns true if `grant` is enabled.
	pub const fn supports(self, grant: GrantType) -> bool {
		self.0 & grant.bit() != 0
	}

	/// Returns a copy with `grant` enabled.
	pub const fn enable(self, grant: GrantType) -> Self {
		Self(self.0 | grant.bit())
	}

	/// Returns true when nothing is enabled.
	pub const fn is_empty(self) -> bool {
		self.0 == 0
	}

	/// Enabled grants in declaration order.
	pub fn iter(self) -> impl Iterator<Item = GrantType> {
		GrantType::ALL.into_iter().filter(move |grant| self.supports(*grant))
	}
}
impl Debug for SupportedGrants {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_set().entries(self.iter()).finish()
	}
}
impl FromIterator<GrantType> for SupportedGrants {
	fn from_iter<I: IntoIterator<Item = GrantType>>(iter: I) -> Self {
		iter.into_iter().fold(Self::default(), Self::enable)
	}
}
impl From<Vec<GrantType>> for SupportedGrants {
	fn from(grants: Vec<GrantType>) -> Self {
		grants.into_iter().collect()
	}
}
impl From<SupportedGrants> for Vec<GrantType> {
	fn from(grants: SupportedGrants) -> Self {
		grants.iter().collect()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn grants_accumulate_and_serialize_as_a_list() {
		let grants = SupportedGrants::default().enable(GrantType::RefreshToken);

		assert!(grants.supports(GrantType::RefreshToken));
		assert!(!grants.supports(GrantType::AuthorizationCode));
		assert_eq!(
			serde_json::to_string(&grants).expect("Grants should serialize."),
			"[\"refresh_token\"]"
		);

		let all: SupportedGrants = GrantType::ALL.into_iter().collect();

		assert_eq!(all.iter().count(), 2);
		assert!(SupportedGrants::default().is_empty());
	}
}

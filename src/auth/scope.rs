//! Fitbit scope modeling.

// std
use std::{cmp::Ordering, collections::BTreeSet, slice::Iter};
// crates.io
use serde::{Deserializer, Serializer, de::Error as DeError};
// self
use crate::_prelude::*;

/// Errors emitted when validating scopes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ScopeValidationError {
	/// Empty scope entries are not allowed.
	#[error("Scope entries cannot be empty.")]
	Empty,
	/// Scopes cannot contain embedded whitespace characters.
	#[error("Scope contains whitespace: {scope}.")]
	ContainsWhitespace {
		/// The offending scope string.
		scope: String,
	},
	/// Scope is not one Fitbit issues.
	#[error("Unknown Fitbit scope: {scope}.")]
	Unknown {
		/// The offending scope string.
		scope: String,
	},
}

/// Scopes understood by the Fitbit authorization server.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FitbitScope {
	/// Activity and exercise logs, AZM, steps.
	Activity,
	/// Cardio fitness score (VO2 max).
	CardioFitness,
	/// ECG readings.
	Electrocardiogram,
	/// Heart rate and HRV.
	Heartrate,
	/// Irregular rhythm notifications.
	IrregularRhythmNotifications,
	/// GPS data (TCX).
	Location,
	/// Food and water logs.
	Nutrition,
	/// SpO2.
	OxygenSaturation,
	/// Basic user profile and badges.
	Profile,
	/// Breathing rate.
	RespiratoryRate,
	/// Devices and alarms.
	Settings,
	/// Sleep logs and goals.
	Sleep,
	/// Friends and leaderboard.
	Social,
	/// Core and skin temperature.
	Temperature,
	/// Body weight, fat, and BMI.
	Weight,
}
impl FitbitScope {
	/// Every scope, in wire-name order.
	pub const ALL: [FitbitScope; 15] = [
		FitbitScope::Activity,
		FitbitScope::CardioFitness,
		FitbitScope::Electrocardiogram,
		FitbitScope::Heartrate,
		FitbitScope::IrregularRhythmNotifications,
		FitbitScope::Location,
		FitbitScope::Nutrition,
		FitbitScope::OxygenSaturation,
		FitbitScope::Profile,
		FitbitScope::RespiratoryRate,
		FitbitScope::Settings,
		FitbitScope::Sleep,
		FitbitScope::Social,
		FitbitScope::Temperature,
		FitbitScope::Weight,
	];

	/// Wire name used in authorize URLs and token responses.
	pub const fn as_str(self) -> &'static str {
		match self {
			FitbitScope::Activity => "activity",
			FitbitScope::CardioFitness => "cardio_fitness",
			FitbitScope::Electrocardiogram => "electrocardiogram",
			FitbitScope::Heartrate => "heartrate",
			FitbitScope::IrregularRhythmNotifications => "irregular_rhythm_notifications",
			FitbitScope::Location => "location",
			FitbitScope::Nutrition => "nutrition",
			FitbitScope::OxygenSaturation => "oxygen_saturation",
			FitbitScope::Profile => "profile",
			FitbitScope::RespiratoryRate => "respiratory_rate",
			FitbitScope::Settings => "settings",
			FitbitScope::Sleep => "sleep",
			FitbitScope::Social => "social",
			FitbitScope::Temperature => "temperature",
			FitbitScope::Weight => "weight",
		}
	}
}
impl Display for FitbitScope {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for FitbitScope {
	type Err = ScopeValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.is_empty() {
			return Err(ScopeValidationError::Empty);
		}
		if s.chars().any(char::is_whitespace) {
			return Err(ScopeValidationError::ContainsWhitespace { scope: s.to_owned() });
		}

		FitbitScope::ALL
			.into_iter()
			.find(|scope| scope.as_str() == s)
			.ok_or_else(|| ScopeValidationError::Unknown { scope: s.to_owned() })
	}
}

/// Normalized set of Fitbit scopes.
///
/// Scopes are deduplicated and sorted so equality and hashing stay stable regardless of the
/// order the authorization server echoes them back in. The set serializes as the
/// space-delimited string Fitbit uses on the wire.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ScopeSet(Arc<[FitbitScope]>);
impl ScopeSet {
	/// Creates a normalized scope set from scope names.
	pub fn new<I, S>(scopes: I) -> Result<Self, ScopeValidationError>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let parsed = scopes
			.into_iter()
			.map(|scope| scope.as_ref().parse::<FitbitScope>())
			.collect::<Result<BTreeSet<_>, _>>()?;

		Ok(Self(Arc::from(parsed.into_iter().collect::<Vec<_>>())))
	}

	/// Creates a normalized scope set from typed scopes.
	pub fn from_scopes<I>(scopes: I) -> Self
	where
		I: IntoIterator<Item = FitbitScope>,
	{
		let set = scopes.into_iter().collect::<BTreeSet<_>>();

		Self(Arc::from(set.into_iter().collect::<Vec<_>>()))
	}

	/// Every scope Fitbit issues.
	pub fn all() -> Self {
		Self::from_scopes(FitbitScope::ALL)
	}

	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if no scopes are defined.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns true if the set contains the provided scope.
	pub fn contains(&self, scope: FitbitScope) -> bool {
		self.0.binary_search(&scope).is_ok()
	}

	/// Returns true if every scope in `other` is also present here.
	pub fn covers(&self, other: &ScopeSet) -> bool {
		other.iter().all(|scope| self.contains(scope))
	}

	/// Iterator over normalized scopes.
	pub fn iter(&self) -> impl Iterator<Item = FitbitScope> + '_ {
		self.0.iter().copied()
	}

	/// Returns the normalized, space-delimited representation.
	pub fn normalized(&self) -> String {
		self.0.iter().map(|scope| scope.as_str()).collect::<Vec<_>>().join(" ")
	}

	/// Returns the underlying slice.
	pub fn as_slice(&self) -> &[FitbitScope] {
		&self.0
	}
}
impl PartialOrd for ScopeSet {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}
impl Ord for ScopeSet {
	fn cmp(&self, other: &Self) -> Ordering {
		self.0.cmp(&other.0)
	}
}
impl Debug for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ScopeSet").field(&self.normalized()).finish()
	}
}
impl Display for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.normalized())
	}
}
impl FromStr for ScopeSet {
	type Err = ScopeValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.is_empty() {
			return Ok(Self::default());
		}
		if s.chars().all(char::is_whitespace) {
			return Err(ScopeValidationError::Empty);
		}

		Self::new(s.split_whitespace())
	}
}
impl FromIterator<FitbitScope> for ScopeSet {
	fn from_iter<T: IntoIterator<Item = FitbitScope>>(iter: T) -> Self {
		Self::from_scopes(iter)
	}
}

/// Iterator over the scopes of a [`ScopeSet`].
pub struct ScopeIter<'a> {
	inner: Iter<'a, FitbitScope>,
}
impl Iterator for ScopeIter<'_> {
	type Item = FitbitScope;

	fn next(&mut self) -> Option<Self::Item> {
		self.inner.next().copied()
	}
}
impl<'a> IntoIterator for &'a ScopeSet {
	type IntoIter = ScopeIter<'a>;
	type Item = FitbitScope;

	fn into_iter(self) -> Self::IntoIter {
		ScopeIter { inner: self.0.iter() }
	}
}
impl Serialize for ScopeSet {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&self.normalized())
	}
}
impl<'de> Deserialize<'de> for ScopeSet {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = String::deserialize(deserializer)?;

		raw.parse().map_err(DeError::custom)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn scopes_normalize_and_compare_stably() {
		let lhs = ScopeSet::new(["sleep", "activity", "activity"])
			.expect("Left-hand scope set should be valid.");
		let rhs = ScopeSet::new(["activity", "sleep"]).expect("Right-hand scope set should be valid.");

		assert_eq!(lhs, rhs);
		assert_eq!(lhs.normalized(), "activity sleep");
	}

	#[test]
	fn scopes_reject_unknown_and_padded_values() {
		assert!(matches!(
			ScopeSet::new([" profile "]),
			Err(ScopeValidationError::ContainsWhitespace { .. })
		));
		assert!(matches!(ScopeSet::new(["openid"]), Err(ScopeValidationError::Unknown { .. })));
		assert!(matches!(ScopeSet::new([""]), Err(ScopeValidationError::Empty)));
		assert!(ScopeSet::from_str("").is_ok(), "Empty string represents an empty scope set.");
		assert!(ScopeSet::from_str("   ").is_err(), "Whitespace-only input must be rejected.");
	}

	#[test]
	fn all_covers_every_subset() {
		let all = ScopeSet::all();
		let subset = ScopeSet::from_str("heartrate weight").expect("Subset should parse.");

		assert_eq!(all.len(), FitbitScope::ALL.len());
		assert!(all.covers(&subset));
		assert!(!subset.covers(&all));
		assert!(subset.contains(FitbitScope::Weight));
		assert_eq!(subset.iter().collect::<Vec<_>>(), vec![
			FitbitScope::Heartrate,
			FitbitScope::Weight
		]);
	}

	#[test]
	fn serde_uses_space_delimited_string() {
		let scope = ScopeSet::from_scopes([FitbitScope::Sleep, FitbitScope::OxygenSaturation]);
		let json = serde_json::to_string(&scope).expect("Scope set should serialize.");

		assert_eq!(json, "\"oxygen_saturation sleep\"");

		let back: ScopeSet = serde_json::from_str(&json).expect("Scope set should deserialize.");

		assert_eq!(back, scope);
		assert!(serde_json::from_str::<ScopeSet>("\"sleep bogus\"").is_err());
	}
}

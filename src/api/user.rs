//! Profile and badges.

// self
use crate::{
	_prelude::*,
	api::{Call, FitbitClient},
};

impl FitbitClient {
	/// The user's profile.
	pub async fn profile(&self) -> Result<JsonValue> {
		self.json(Call::user("profile.json")).await
	}

	/// Earned badges; returns the `badges` array.
	pub async fn badges(&self) -> Result<JsonValue> {
		self.json_field(Call::user("badges.json"), "badges").await
	}
}

//! Friends and leaderboard (API version 1.1).

// self
use crate::{
	_prelude::*,
	api::{ApiVersion, Call, FitbitClient},
};

impl FitbitClient {
	/// The user's friends.
	pub async fn friends(&self) -> Result<JsonValue> {
		self.json(Call::user("friends.json").version(ApiVersion::V1_1)).await
	}

	/// Step leaderboard of the user and their friends.
	pub async fn friends_leaderboard(&self) -> Result<JsonValue> {
		self.json(Call::user("leaderboard/friends.json").version(ApiVersion::V1_1)).await
	}
}

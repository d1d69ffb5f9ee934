//! Irregular rhythm notifications.

// self
use crate::{
	_prelude::*,
	api::{Call, FitbitClient, LogListQuery},
};

const ALERTS_MAX: u32 = 10;

impl FitbitClient {
	/// IRN alerts around the query's anchor date (at most 10 per page).
	pub async fn irn_alerts(&self, query: LogListQuery) -> Result<JsonValue> {
		let pairs = query.to_query(ALERTS_MAX)?;

		self.json(Call::user("irn/alerts/list.json").queries(pairs)).await
	}

	/// Enrollment state of the IRN feature.
	pub async fn irn_profile(&self) -> Result<JsonValue> {
		self.json(Call::user("irn/profile.json")).await
	}
}

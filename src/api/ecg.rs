//! Electrocardiogram readings.

// self
use crate::{
	_prelude::*,
	api::{Call, FitbitClient, LogListQuery},
};

const LOG_LIST_MAX: u32 = 10;

impl FitbitClient {
	/// ECG readings around the query's anchor date (at most 10 per page).
	pub async fn ecg_log_list(&self, query: LogListQuery) -> Result<JsonValue> {
		let pairs = query.to_query(LOG_LIST_MAX)?;

		self.json_field(Call::user("ecg/list.json").queries(pairs), "ecgReadings").await
	}
}

//! Sleep logs and goal (API version 1.2).

// self
use crate::{
	_prelude::*,
	api::{ApiVersion, Call, DateRange, FitbitClient, LogListQuery, format_date},
};

const LOG_LIST_MAX: u32 = 100;
const SLEEP: &str = "sleep";

impl FitbitClient {
	/// Sleep duration goal.
	pub async fn sleep_goal(&self) -> Result<JsonValue> {
		self.json(sleep_call("sleep/goal.json")).await
	}

	/// Sleep logs ending on `date`; returns the `sleep` array.
	pub async fn sleep_log(&self, date: Date) -> Result<JsonValue> {
		self.json_field(sleep_call(format!("sleep/date/{}.json", format_date(date))), SLEEP).await
	}

	/// Sleep logs across `range`; returns the `sleep` array.
	pub async fn sleep_log_by_range(&self, range: DateRange) -> Result<JsonValue> {
		self.json_field(sleep_call(format!("sleep/date/{}.json", range.segment())), SLEEP).await
	}

	/// Paginated sleep logs around the query's anchor date.
	pub async fn sleep_log_list(&self, query: LogListQuery) -> Result<JsonValue> {
		let pairs = query.to_query(LOG_LIST_MAX)?;

		self.json(sleep_call("sleep/list.json").queries(pairs)).await
	}
}

fn sleep_call(path: impl Display) -> Call {
	Call::user(path).version(ApiVersion::V1_2)
}

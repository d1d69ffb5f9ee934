//! Breathing rate.

// self
use crate::{
	_prelude::*,
	api::{Call, DateRange, FitbitClient, format_date},
};

impl FitbitClient {
	/// Nightly breathing rate summary for `date`.
	pub async fn breathing_rate_summary(&self, date: Date) -> Result<JsonValue> {
		self.json(Call::user(format!("br/date/{}.json", format_date(date)))).await
	}

	/// Nightly breathing rate summaries across `range`.
	pub async fn breathing_rate_summary_by_range(&self, range: DateRange) -> Result<JsonValue> {
		self.json(Call::user(format!("br/date/{}.json", range.segment()))).await
	}

	/// Per-sleep-stage breathing rate for `date`.
	pub async fn breathing_rate_intraday(&self, date: Date) -> Result<JsonValue> {
		self.json(Call::user(format!("br/date/{}/all.json", format_date(date)))).await
	}

	/// Per-sleep-stage breathing rate across `range`.
	pub async fn breathing_rate_intraday_by_range(&self, range: DateRange) -> Result<JsonValue> {
		self.json(Call::user(format!("br/date/{}/all.json", range.segment()))).await
	}
}

//! Cardio fitness score (VO2 max).

// self
use crate::{
	_prelude::*,
	api::{Call, DateRange, FitbitClient, format_date},
};

impl FitbitClient {
	/// VO2 max estimate for `date`.
	pub async fn vo2_max_summary(&self, date: Date) -> Result<JsonValue> {
		self.json(Call::user(format!("cardioscore/date/{}.json", format_date(date)))).await
	}

	/// VO2 max estimates across `range`.
	pub async fn vo2_max_summary_by_range(&self, range: DateRange) -> Result<JsonValue> {
		self.json(Call::user(format!("cardioscore/date/{}.json", range.segment()))).await
	}
}

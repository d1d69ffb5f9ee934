//! Active Zone Minutes.

// self
use crate::{
	_prelude::*,
	api::{Call, DateRange, DetailLevel, FitbitClient, Period, format_date},
};

impl FitbitClient {
	/// AZM time series for `period` ending on `date`.
	pub async fn azm_by_period(&self, date: Date, period: Period) -> Result<JsonValue> {
		let period = period.ensure_one_of(&Period::SERIES, "AZM")?;

		self.json(Call::user(format!(
			"activities/active-zone-minutes/date/{}/{period}.json",
			format_date(date)
		)))
		.await
	}

	/// AZM time series for every day in `range`.
	pub async fn azm_by_interval(&self, range: DateRange) -> Result<JsonValue> {
		self.json(Call::user(format!("activities/active-zone-minutes/date/{}.json", range.segment())))
			.await
	}

	/// AZM intraday series for `date`; only minute-based detail levels are accepted.
	pub async fn azm_intraday(&self, date: Date, detail: DetailLevel) -> Result<JsonValue> {
		let detail = detail.ensure_one_of(&DetailLevel::MINUTES, "AZM intraday")?;

		self.json(Call::user(format!(
			"activities/active-zone-minutes/date/{}/1d/{detail}.json",
			format_date(date)
		)))
		.await
	}
}

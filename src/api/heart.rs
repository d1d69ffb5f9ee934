//! Heart rate and heart rate variability.

// self
use crate::{
	_prelude::*,
	api::{Call, DateRange, DetailLevel, FitbitClient, Period, TimeWindow, format_date, intraday_tail},
};

const ACTIVITIES_HEART: &str = "activities-heart";

impl FitbitClient {
	/// Daily heart rate zones for `period` (1d, 1w, or 1m) ending on `date`.
	pub async fn heart_rate_time_series(&self, date: Date, period: Period) -> Result<JsonValue> {
		let period = period.ensure_one_of(&Period::SHORT, "heart rate")?;

		self.json_field(
			Call::user(format!("activities/heart/date/{}/{period}.json", format_date(date))),
			ACTIVITIES_HEART,
		)
		.await
	}

	/// Daily heart rate zones across `range`.
	pub async fn heart_rate_time_series_by_range(&self, range: DateRange) -> Result<JsonValue> {
		self.json_field(
			Call::user(format!("activities/heart/date/{}.json", range.segment())),
			ACTIVITIES_HEART,
		)
		.await
	}

	/// Intraday heart rate on `date`, optionally narrowed to `window`.
	pub async fn heart_rate_intraday(
		&self,
		date: Date,
		detail: DetailLevel,
		window: Option<TimeWindow>,
	) -> Result<JsonValue> {
		self.json(Call::user(format!(
			"activities/heart/date/{}/1d/{}.json",
			format_date(date),
			intraday_tail(detail, window)
		)))
		.await
	}

	/// Intraday heart rate across `range`, optionally narrowed to `window`.
	pub async fn heart_rate_intraday_by_range(
		&self,
		range: DateRange,
		detail: DetailLevel,
		window: Option<TimeWindow>,
	) -> Result<JsonValue> {
		self.json(Call::user(format!(
			"activities/heart/date/{}/{}.json",
			range.segment(),
			intraday_tail(detail, window)
		)))
		.await
	}

	/// Nightly HRV summary for `date`.
	pub async fn hrv_summary(&self, date: Date) -> Result<JsonValue> {
		self.json(Call::user(format!("hrv/date/{}.json", format_date(date)))).await
	}

	/// Nightly HRV summaries across `range`.
	pub async fn hrv_summary_by_range(&self, range: DateRange) -> Result<JsonValue> {
		self.json(Call::user(format!("hrv/date/{}.json", range.segment()))).await
	}

	/// Five-minute HRV samples recorded during sleep on `date`.
	pub async fn hrv_intraday(&self, date: Date) -> Result<JsonValue> {
		self.json(Call::user(format!("hrv/date/{}/all.json", format_date(date)))).await
	}

	/// Five-minute HRV samples across `range`.
	pub async fn hrv_intraday_by_range(&self, range: DateRange) -> Result<JsonValue> {
		self.json(Call::user(format!("hrv/date/{}/all.json", range.segment()))).await
	}
}

//! Body weight, fat, and BMI.

// self
use crate::{
	_prelude::*,
	api::{BodyGoalType, BodyResource, Call, DateRange, FitbitClient, Period, format_date},
};

impl FitbitClient {
	/// Weight or body fat goal.
	pub async fn body_goals(&self, goal: BodyGoalType) -> Result<JsonValue> {
		self.json(Call::user(format!("body/log/{goal}/goal.json"))).await
	}

	/// Body fat log entries for one day.
	pub async fn body_fat_log(&self, date: Date) -> Result<JsonValue> {
		self.json(Call::user(format!("body/log/fat/date/{}.json", format_date(date)))).await
	}

	/// Weight log entries for one day.
	pub async fn body_weight_log(&self, date: Date) -> Result<JsonValue> {
		self.json(Call::user(format!("body/log/weight/date/{}.json", format_date(date)))).await
	}

	/// Daily series of `resource` for `period` ending on `date`; every period including `max` is
	/// accepted.
	pub async fn body_time_series(
		&self,
		resource: BodyResource,
		date: Date,
		period: Period,
	) -> Result<JsonValue> {
		self.json(Call::user(format!("body/{resource}/date/{}/{period}.json", format_date(date)))).await
	}

	/// Daily series of `resource` across `range`.
	pub async fn body_time_series_by_range(
		&self,
		resource: BodyResource,
		range: DateRange,
	) -> Result<JsonValue> {
		self.json(Call::user(format!("body/{resource}/date/{}.json", range.segment()))).await
	}

	/// Body fat log entries for `period` (1d, 1w, or 1m) ending on `date`.
	pub async fn body_fat_time_series(&self, date: Date, period: Period) -> Result<JsonValue> {
		self.body_log_series(BodyGoalType::Fat, date, period).await
	}

	/// Body fat log entries across `range`.
	pub async fn body_fat_time_series_by_range(&self, range: DateRange) -> Result<JsonValue> {
		self.json(Call::user(format!("body/log/fat/date/{}.json", range.segment()))).await
	}

	/// Weight log entries for `period` (1d, 1w, or 1m) ending on `date`.
	pub async fn body_weight_time_series(&self, date: Date, period: Period) -> Result<JsonValue> {
		self.body_log_series(BodyGoalType::Weight, date, period).await
	}

	/// Weight log entries across `range`.
	pub async fn body_weight_time_series_by_range(&self, range: DateRange) -> Result<JsonValue> {
		self.json(Call::user(format!("body/log/weight/date/{}.json", range.segment()))).await
	}

	async fn body_log_series(&self, kind: BodyGoalType, date: Date, period: Period) -> Result<JsonValue> {
		let period = period.ensure_one_of(&Period::SHORT, "body log")?;

		self.json(Call::user(format!("body/log/{kind}/date/{}/{period}.json", format_date(date)))).await
	}
}

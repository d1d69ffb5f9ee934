//! Activity logs, summaries, goals, and time series.

// crates.io
use reqwest::header::{ACCEPT, HeaderValue};
// self
use crate::{
	_prelude::*,
	api::{
		ActivityResource, Call, DateRange, DetailLevel, FitbitClient, GoalPeriod, LogListQuery,
		Period, TimeWindow, format_date, intraday_tail,
	},
};

const TCX_MEDIA_TYPE: &str = "application/vnd.garmin.tcx+xml";
const LOG_LIST_MAX: u32 = 100;

impl FitbitClient {
	/// Daily or weekly activity goals.
	pub async fn activity_goals(&self, period: GoalPeriod) -> Result<JsonValue> {
		self.json(Call::user(format!("activities/goals/{period}.json"))).await
	}

	/// Paginated activity log entries around the query's anchor date.
	pub async fn activity_log_list(&self, query: LogListQuery) -> Result<JsonValue> {
		let pairs = query.to_query(LOG_LIST_MAX)?;

		self.json(Call::user("activities/list.json").queries(pairs)).await
	}

	/// Training Center XML for one logged exercise, returned as raw bytes.
	///
	/// `include_partial` asks Fitbit to return the TCX even when GPS data is incomplete.
	pub async fn activity_tcx(&self, log_id: u64, include_partial: bool) -> Result<Vec<u8>> {
		let call = Call::user(format!("activities/{log_id}.tcx"))
			.query("includePartialTCX", include_partial.to_string())
			.header(ACCEPT, HeaderValue::from_static(TCX_MEDIA_TYPE));

		self.bytes(call).await
	}

	/// Details of one activity type from the public catalogue.
	pub async fn activity_type(&self, activity_id: u64) -> Result<JsonValue> {
		self.json(Call::get(format!("activities/{activity_id}.json"))).await
	}

	/// Every public activity type plus the user's private ones.
	pub async fn all_activity_types(&self) -> Result<JsonValue> {
		self.json(Call::get("activities.json")).await
	}

	/// Summary and goals for one day.
	pub async fn daily_activity_summary(&self, date: Date) -> Result<JsonValue> {
		self.json(Call::user(format!("activities/date/{}.json", format_date(date)))).await
	}

	/// Activities the user marked as favorite.
	pub async fn favorite_activities(&self) -> Result<JsonValue> {
		self.json(Call::user("activities/favorite.json")).await
	}

	/// Activities the user logs most often.
	pub async fn frequent_activities(&self) -> Result<JsonValue> {
		self.json(Call::user("activities/frequent.json")).await
	}

	/// Lifetime totals and best days.
	pub async fn lifetime_activity_stats(&self) -> Result<JsonValue> {
		self.json(Call::user("activities.json")).await
	}

	/// Activities the user logged recently.
	pub async fn recent_activities(&self) -> Result<JsonValue> {
		self.json(Call::user("activities/recent.json")).await
	}

	/// Daily series of `resource` for `period` ending on `date`.
	pub async fn activity_time_series(
		&self,
		resource: ActivityResource,
		date: Date,
		period: Period,
	) -> Result<JsonValue> {
		let period = period.ensure_one_of(&Period::SERIES, "activity time series")?;

		self.json(Call::user(format!("activities/{resource}/date/{}/{period}.json", format_date(date))))
			.await
	}

	/// Daily series of `resource` across `range`.
	pub async fn activity_time_series_by_range(
		&self,
		resource: ActivityResource,
		range: DateRange,
	) -> Result<JsonValue> {
		self.json(Call::user(format!("activities/{resource}/date/{}.json", range.segment()))).await
	}

	/// Intraday samples of `resource` on `date`, optionally narrowed to `window`.
	pub async fn activity_intraday(
		&self,
		resource: ActivityResource,
		date: Date,
		detail: DetailLevel,
		window: Option<TimeWindow>,
	) -> Result<JsonValue> {
		let detail = detail.ensure_one_of(&DetailLevel::MINUTES, "activity intraday")?;

		self.json(Call::user(format!(
			"activities/{resource}/date/{}/1d/{}.json",
			format_date(date),
			intraday_tail(detail, window)
		)))
		.await
	}

	/// Intraday samples of `resource` across `range`, optionally narrowed to `window`.
	pub async fn activity_intraday_by_range(
		&self,
		resource: ActivityResource,
		range: DateRange,
		detail: DetailLevel,
		window: Option<TimeWindow>,
	) -> Result<JsonValue> {
		let detail = detail.ensure_one_of(&DetailLevel::MINUTES, "activity intraday")?;

		self.json(Call::user(format!(
			"activities/{resource}/date/{}/{}.json",
			range.segment(),
			intraday_tail(detail, window)
		)))
		.await
	}
}

//! Typed path and query parameters accepted by the resource endpoints.

// crates.io
use time::Time;
// self
use crate::_prelude::*;

macro_rules! wire_enum {
	(
		$(#[$meta:meta])*
		$name:ident { $($(#[$vmeta:meta])* $variant:ident => $wire:literal),+ $(,)? }
	) => {
		$(#[$meta])*
		#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
		pub enum $name {
			$($(#[$vmeta])* $variant),+
		}
		impl $name {
			/// Value used in request paths and query strings.
			pub const fn as_str(self) -> &'static str {
				match self {
					$($name::$variant => $wire),+
				}
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(self.as_str())
			}
		}
	};
}

wire_enum! {
	/// Time-series period ending at (or starting from) the requested date.
	Period {
		/// One day.
		OneDay => "1d",
		/// Seven days.
		SevenDays => "7d",
		/// Thirty days.
		ThirtyDays => "30d",
		/// One calendar week.
		OneWeek => "1w",
		/// One calendar month.
		OneMonth => "1m",
		/// Three months.
		ThreeMonths => "3m",
		/// Six months.
		SixMonths => "6m",
		/// One year.
		OneYear => "1y",
		/// Everything on record (body series only).
		Max => "max",
	}
}
impl Period {
	/// Periods accepted by the activity, AZM, and nutrition series (everything but `max`).
	pub const SERIES: [Period; 8] = [
		Period::OneDay,
		Period::SevenDays,
		Period::ThirtyDays,
		Period::OneWeek,
		Period::OneMonth,
		Period::ThreeMonths,
		Period::SixMonths,
		Period::OneYear,
	];
	/// Periods accepted by the heart-rate and body-log series.
	pub const SHORT: [Period; 3] = [Period::OneDay, Period::OneWeek, Period::OneMonth];

	/// Fails with [`Error::InvalidArgument`] unless `self` is one of `allowed`.
	pub(crate) fn ensure_one_of(self, allowed: &[Period], what: &str) -> Result<Self> {
		if allowed.contains(&self) {
			return Ok(self);
		}

		let options = allowed.iter().map(|period| period.as_str()).collect::<Vec<_>>().join(", ");

		Err(Error::invalid_argument(format!("{what} period must be one of {options}, got {self}")))
	}
}

wire_enum! {
	/// Activity time-series resources.
	ActivityResource {
		/// Calories burned through activity only.
		ActivityCalories => "activityCalories",
		/// Total calories burned.
		Calories => "calories",
		/// Basal metabolic rate calories.
		CaloriesBmr => "caloriesBMR",
		/// Distance covered.
		Distance => "distance",
		/// Elevation climbed.
		Elevation => "elevation",
		/// Floors climbed.
		Floors => "floors",
		/// Sedentary minutes.
		MinutesSedentary => "minutesSedentary",
		/// Lightly active minutes.
		MinutesLightlyActive => "minutesLightlyActive",
		/// Fairly active minutes.
		MinutesFairlyActive => "minutesFairlyActive",
		/// Very active minutes.
		MinutesVeryActive => "minutesVeryActive",
		/// Steps.
		Steps => "steps",
		/// Swimming strokes.
		SwimmingStrokes => "swimming-strokes",
	}
}

wire_enum! {
	/// Body time-series resources.
	BodyResource {
		/// Body mass index.
		Bmi => "bmi",
		/// Body fat percentage.
		Fat => "fat",
		/// Body weight.
		Weight => "weight",
	}
}

wire_enum! {
	/// Body goal kinds.
	BodyGoalType {
		/// Weight goal.
		Weight => "weight",
		/// Body fat goal.
		Fat => "fat",
	}
}

wire_enum! {
	/// Activity goal cadence.
	GoalPeriod {
		/// Daily goals.
		Daily => "daily",
		/// Weekly goals.
		Weekly => "weekly",
	}
}

wire_enum! {
	/// Intraday sample resolution.
	DetailLevel {
		/// One second (heart rate only).
		OneSecond => "1sec",
		/// One minute.
		OneMinute => "1min",
		/// Five minutes.
		FiveMinutes => "5min",
		/// Fifteen minutes.
		FifteenMinutes => "15min",
	}
}
impl DetailLevel {
	/// Minute-based levels accepted by the activity and AZM intraday endpoints.
	pub const MINUTES: [DetailLevel; 3] =
		[DetailLevel::OneMinute, DetailLevel::FiveMinutes, DetailLevel::FifteenMinutes];

	pub(crate) fn ensure_one_of(self, allowed: &[DetailLevel], what: &str) -> Result<Self> {
		if allowed.contains(&self) {
			return Ok(self);
		}

		let options = allowed.iter().map(|level| level.as_str()).collect::<Vec<_>>().join(", ");

		Err(Error::invalid_argument(format!(
			"{what} detail level must be one of {options}, got {self}"
		)))
	}
}

wire_enum! {
	/// Nutrition time-series resources.
	NutritionResource {
		/// Calories consumed.
		CaloriesIn => "caloriesIn",
		/// Water consumed.
		Water => "water",
	}
}

wire_enum! {
	/// Sort order for paginated log lists.
	Sort {
		/// Oldest first.
		Asc => "asc",
		/// Newest first.
		Desc => "desc",
	}
}

/// Data collection a subscription or notification refers to.
///
/// Collection names Fitbit adds later deserialize as [`CollectionType::Unknown`] so a
/// notification batch never fails on them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CollectionType {
	/// Activity logs and summaries.
	Activities,
	/// Weight and body fat logs.
	Body,
	/// Food and water logs.
	Foods,
	/// Sleep logs.
	Sleep,
	/// Sent when the user revokes the application's access.
	UserRevokedAccess,
	/// Any collection name not listed above; never valid in a subscription path.
	Unknown,
}
impl CollectionType {
	/// Path segment used by the subscription endpoints.
	pub const fn as_str(self) -> &'static str {
		match self {
			CollectionType::Activities => "activities",
			CollectionType::Body => "body",
			CollectionType::Foods => "foods",
			CollectionType::Sleep => "sleep",
			CollectionType::UserRevokedAccess => "userRevokedAccess",
			CollectionType::Unknown => "unknown",
		}
	}
}
impl<'de> Deserialize<'de> for CollectionType {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		let raw = String::deserialize(deserializer)?;
		let known = [
			CollectionType::Activities,
			CollectionType::Body,
			CollectionType::Foods,
			CollectionType::Sleep,
			CollectionType::UserRevokedAccess,
		];

		Ok(known.into_iter().find(|kind| kind.as_str() == raw).unwrap_or(CollectionType::Unknown))
	}
}
impl Display for CollectionType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Inclusive date range; construction fails when `start > end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
	start: Date,
	end: Date,
}
impl DateRange {
	/// Validates and builds a range.
	pub fn new(start: Date, end: Date) -> Result<Self> {
		if start > end {
			return Err(Error::invalid_argument(format!(
				"start date {} is after end date {}",
				format_date(start),
				format_date(end)
			)));
		}

		Ok(Self { start, end })
	}

	/// A single-day range.
	pub fn day(date: Date) -> Self {
		Self { start: date, end: date }
	}

	/// First day of the range.
	pub fn start(&self) -> Date {
		self.start
	}

	/// Last day of the range.
	pub fn end(&self) -> Date {
		self.end
	}

	/// `start/end` path fragment.
	pub(crate) fn segment(&self) -> String {
		format!("{}/{}", format_date(self.start), format_date(self.end))
	}
}

/// Clock window narrowing an intraday request (`HH:mm` on the wire).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeWindow {
	start: Time,
	end: Time,
}
impl TimeWindow {
	/// Builds a window; both bounds are truncated to the minute.
	pub fn new(start: Time, end: Time) -> Self {
		Self { start, end }
	}

	/// `time/HH:mm/HH:mm` path fragment.
	pub(crate) fn segment(&self) -> String {
		format!("time/{}/{}", format_time(self.start), format_time(self.end))
	}
}

/// Which side of the anchor date a log list pages from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogAnchor {
	/// Entries on or before the date.
	Before(Date),
	/// Entries on or after the date.
	After(Date),
}

/// Query for the paginated `list.json` endpoints.
///
/// Fitbit requires `desc` ordering with `beforeDate` and `asc` with `afterDate`; the defaults
/// follow that and [`LogListQuery::sort`] lets callers override it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LogListQuery {
	/// Anchor date and direction.
	pub anchor: LogAnchor,
	/// Result ordering.
	pub sort: Sort,
	/// Page size.
	pub limit: u32,
	/// Page offset; Fitbit only supports `0` and follows `pagination.next` links instead.
	pub offset: u32,
}
impl LogListQuery {
	const DEFAULT_LIMIT: u32 = 10;

	/// Entries on or before `date`, newest first.
	pub fn before(date: Date) -> Self {
		Self {
			anchor: LogAnchor::Before(date),
			sort: Sort::Desc,
			limit: Self::DEFAULT_LIMIT,
			offset: 0,
		}
	}

	/// Entries on or after `date`, oldest first.
	pub fn after(date: Date) -> Self {
		Self { anchor: LogAnchor::After(date), sort: Sort::Asc, limit: Self::DEFAULT_LIMIT, offset: 0 }
	}

	/// Overrides the ordering.
	pub fn sort(mut self, sort: Sort) -> Self {
		self.sort = sort;

		self
	}

	/// Overrides the page size.
	pub fn limit(mut self, limit: u32) -> Self {
		self.limit = limit;

		self
	}

	/// Overrides the page offset.
	pub fn offset(mut self, offset: u32) -> Self {
		self.offset = offset;

		self
	}

	/// Renders query pairs after checking `limit` against the endpoint's maximum.
	pub(crate) fn to_query(self, max_limit: u32) -> Result<Vec<(&'static str, String)>> {
		if self.limit == 0 || self.limit > max_limit {
			return Err(Error::invalid_argument(format!(
				"limit must be between 1 and {max_limit}, got {}",
				self.limit
			)));
		}

		let anchor = match self.anchor {
			LogAnchor::Before(date) => ("beforeDate", format_date(date)),
			LogAnchor::After(date) => ("afterDate", format_date(date)),
		};

		Ok(vec![
			anchor,
			("sort", self.sort.as_str().to_owned()),
			("limit", self.limit.to_string()),
			("offset", self.offset.to_string()),
		])
	}
}

/// Renders a date as `YYYY-MM-DD`.
pub fn format_date(date: Date) -> String {
	format!("{:04}-{:02}-{:02}", date.year(), u8::from(date.month()), date.day())
}

fn format_time(time: Time) -> String {
	format!("{:02}:{:02}", time.hour(), time.minute())
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn wire_names_match_fitbit_paths() {
		assert_eq!(Period::ThirtyDays.to_string(), "30d");
		assert_eq!(ActivityResource::CaloriesBmr.as_str(), "caloriesBMR");
		assert_eq!(ActivityResource::SwimmingStrokes.as_str(), "swimming-strokes");
		assert_eq!(DetailLevel::OneSecond.as_str(), "1sec");
		assert_eq!(CollectionType::UserRevokedAccess.as_str(), "userRevokedAccess");
		assert_eq!(
			serde_json::to_string(&CollectionType::UserRevokedAccess)
				.expect("Collection type should serialize."),
			"\"userRevokedAccess\""
		);
	}

	#[test]
	fn restricted_choices_report_allowed_values() {
		assert_eq!(Period::OneWeek.ensure_one_of(&Period::SHORT, "heart rate").ok(), Some(Period::OneWeek));
		assert!(Period::Max.ensure_one_of(&Period::SERIES, "activity").is_err());

		let err = Period::SevenDays
			.ensure_one_of(&Period::SHORT, "heart rate")
			.expect_err("7d should be rejected for heart rate.");

		assert_eq!(
			err.to_string(),
			"Invalid argument: heart rate period must be one of 1d, 1w, 1m, got 7d."
		);
		assert!(DetailLevel::OneSecond.ensure_one_of(&DetailLevel::MINUTES, "AZM").is_err());
	}

	#[test]
	fn ranges_and_windows_render_path_segments() {
		let range = DateRange::new(macros::date!(2025 - 01 - 01), macros::date!(2025 - 01 - 07))
			.expect("Ordered range should build.");

		assert_eq!(range.segment(), "2025-01-01/2025-01-07");
		assert!(
			DateRange::new(macros::date!(2025 - 02 - 01), macros::date!(2025 - 01 - 01)).is_err()
		);
		assert_eq!(
			TimeWindow::new(macros::time!(8:05), macros::time!(17:30:59)).segment(),
			"time/08:05/17:30"
		);
	}

	#[test]
	fn log_list_query_defaults_and_limits() {
		let query = LogListQuery::before(macros::date!(2025 - 03 - 09))
			.to_query(100)
			.expect("Default query should be valid.");

		assert_eq!(query, vec![
			("beforeDate", "2025-03-09".to_owned()),
			("sort", "desc".to_owned()),
			("limit", "10".to_owned()),
			("offset", "0".to_owned()),
		]);
		assert!(LogListQuery::after(macros::date!(2025 - 03 - 09)).limit(11).to_query(10).is_err());
		assert!(LogListQuery::after(macros::date!(2025 - 03 - 09)).limit(0).to_query(10).is_err());
	}
}

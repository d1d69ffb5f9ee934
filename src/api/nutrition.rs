//! Food, meal, and water logs plus the food database.

// self
use crate::{
	_prelude::*,
	api::{Call, DateRange, FitbitClient, NutritionResource, Period, format_date},
};

impl FitbitClient {
	/// Foods the user marked as favorite.
	pub async fn favorite_foods(&self) -> Result<JsonValue> {
		self.json(Call::user("foods/log/favorite.json")).await
	}

	/// One food from the database.
	pub async fn food(&self, food_id: u64) -> Result<JsonValue> {
		self.json(Call::get(format!("foods/{food_id}.json"))).await
	}

	/// Locales the food database supports.
	pub async fn food_locales(&self) -> Result<JsonValue> {
		self.json(Call::get("foods/locales.json")).await
	}

	/// Daily calorie goal and food plan.
	pub async fn food_goals(&self) -> Result<JsonValue> {
		self.json(Call::user("foods/log/goal.json")).await
	}

	/// Food log for one day.
	pub async fn food_log(&self, date: Date) -> Result<JsonValue> {
		self.json(Call::user(format!("foods/log/date/{}.json", format_date(date)))).await
	}

	/// Measurement units known to the food database.
	pub async fn food_units(&self) -> Result<JsonValue> {
		self.json(Call::get("foods/units.json")).await
	}

	/// Foods the user logs most often.
	pub async fn frequent_foods(&self) -> Result<JsonValue> {
		self.json(Call::user("foods/log/frequent.json")).await
	}

	/// One saved meal.
	pub async fn meal(&self, meal_id: u64) -> Result<JsonValue> {
		self.json(Call::user(format!("meals/{meal_id}.json"))).await
	}

	/// Every saved meal.
	pub async fn meals(&self) -> Result<JsonValue> {
		self.json(Call::user("meals.json")).await
	}

	/// Foods the user logged recently.
	pub async fn recent_foods(&self) -> Result<JsonValue> {
		self.json(Call::user("foods/log/recent.json")).await
	}

	/// Daily water goal.
	pub async fn water_goal(&self) -> Result<JsonValue> {
		self.json(Call::user("foods/log/water/goal.json")).await
	}

	/// Water log for one day.
	pub async fn water_log(&self, date: Date) -> Result<JsonValue> {
		self.json(Call::user(format!("foods/log/water/date/{}.json", format_date(date)))).await
	}

	/// Searches the food database; returns the `foods` array.
	pub async fn search_foods(&self, query: &str) -> Result<JsonValue> {
		let query = query.trim();

		if query.is_empty() {
			return Err(Error::invalid_argument("food search query must not be empty"));
		}

		self.json_field(Call::get("foods/search.json").query("query", query), "foods").await
	}

	/// Daily series of `resource` for `period` ending on `date`.
	pub async fn nutrition_time_series(
		&self,
		resource: NutritionResource,
		date: Date,
		period: Period,
	) -> Result<JsonValue> {
		let period = period.ensure_one_of(&Period::SERIES, "nutrition time series")?;

		self.json(Call::user(format!("foods/log/{resource}/date/{}/{period}.json", format_date(date))))
			.await
	}

	/// Daily series of `resource` across `range`.
	pub async fn nutrition_time_series_by_range(
		&self,
		resource: NutritionResource,
		range: DateRange,
	) -> Result<JsonValue> {
		self.json(Call::user(format!("foods/log/{resource}/date/{}.json", range.segment()))).await
	}
}

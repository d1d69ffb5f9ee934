//! Core and skin temperature.

// self
use crate::{
	_prelude::*,
	api::{Call, DateRange, FitbitClient, format_date},
};

impl FitbitClient {
	/// Manually logged core temperature for `date`.
	pub async fn core_temperature(&self, date: Date) -> Result<JsonValue> {
		self.json(Call::user(format!("temp/core/date/{}.json", format_date(date)))).await
	}

	/// Manually logged core temperature across `range`.
	pub async fn core_temperature_by_range(&self, range: DateRange) -> Result<JsonValue> {
		self.json(Call::user(format!("temp/core/date/{}.json", range.segment()))).await
	}

	/// Nightly skin temperature variation for `date`.
	pub async fn skin_temperature(&self, date: Date) -> Result<JsonValue> {
		self.json(Call::user(format!("temp/skin/date/{}.json", format_date(date)))).await
	}

	/// Nightly skin temperature variation across `range`.
	pub async fn skin_temperature_by_range(&self, range: DateRange) -> Result<JsonValue> {
		self.json(Call::user(format!("temp/skin/date/{}.json", range.segment()))).await
	}
}

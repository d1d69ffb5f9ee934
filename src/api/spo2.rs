//! Blood oxygen saturation.

// self
use crate::{
	_prelude::*,
	api::{Call, DateRange, FitbitClient, format_date},
};

impl FitbitClient {
	/// Nightly SpO2 summary for `date`.
	pub async fn spo2_summary(&self, date: Date) -> Result<JsonValue> {
		self.json(Call::user(format!("spo2/date/{}.json", format_date(date)))).await
	}

	/// Nightly SpO2 summaries across `range`.
	pub async fn spo2_summary_by_range(&self, range: DateRange) -> Result<JsonValue> {
		self.json(Call::user(format!("spo2/date/{}.json", range.segment()))).await
	}

	/// Per-minute SpO2 samples for `date`.
	pub async fn spo2_intraday(&self, date: Date) -> Result<JsonValue> {
		self.json(Call::user(format!("spo2/date/{}/all.json", format_date(date)))).await
	}

	/// Per-minute SpO2 samples across `range`.
	pub async fn spo2_intraday_by_range(&self, range: DateRange) -> Result<JsonValue> {
		self.json(Call::user(format!("spo2/date/{}/all.json", range.segment()))).await
	}
}

//! Paired devices and tracker alarms.

// crates.io
use reqwest::StatusCode;
// self
use crate::{
	_prelude::*,
	api::{Call, FitbitClient},
	error::ApiError,
};

impl FitbitClient {
	/// Devices paired with the account.
	pub async fn devices(&self) -> Result<JsonValue> {
		self.json(Call::user("devices.json")).await
	}

	/// Alarms configured on a tracker.
	///
	/// Without `tracker_id` the first paired device is used, and an account with no devices yields
	/// an empty list. Fitbit answers `400` for devices that do not support alarms; that is also
	/// reported as an empty list.
	pub async fn alarms(&self, tracker_id: Option<&str>) -> Result<JsonValue> {
		let tracker_id = match tracker_id {
			Some(id) => id.to_owned(),
			None => match first_device_id(&self.devices().await?)? {
				Some(id) => id,
				None => return Ok(JsonValue::Array(Vec::new())),
			},
		};

		if tracker_id.is_empty() || tracker_id.contains(['/', '?', '#']) {
			return Err(Error::invalid_argument(format!("tracker id `{tracker_id}` is not a path segment")));
		}

		match self.json(Call::user(format!("devices/tracker/{tracker_id}/alarms.json"))).await {
			Err(Error::Api(ApiError { status, .. })) if status == StatusCode::BAD_REQUEST.as_u16() =>
				Ok(JsonValue::Array(Vec::new())),
			other => other,
		}
	}
}

fn first_device_id(devices: &JsonValue) -> Result<Option<String>> {
	let Some(list) = devices.as_array() else {
		return Err(Error::unexpected_response("device list is not an array"));
	};
	let Some(first) = list.first() else {
		return Ok(None);
	};

	match first.get("id") {
		Some(JsonValue::String(id)) => Ok(Some(id.clone())),
		Some(JsonValue::Number(id)) => Ok(Some(id.to_string())),
		_ => Err(Error::unexpected_response("device entry is missing `id`")),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn first_device_id_accepts_string_and_numeric_ids() {
		assert_eq!(
			first_device_id(&serde_json::json!([{ "id": "816713257" }, { "id": "2" }]))
				.expect("String id should be read."),
			Some("816713257".into())
		);
		assert_eq!(
			first_device_id(&serde_json::json!([{ "id": 42 }])).expect("Numeric id should be read."),
			Some("42".into())
		);
		assert_eq!(first_device_id(&serde_json::json!([])).expect("Empty list is fine."), None);
		assert!(first_device_id(&serde_json::json!({})).is_err());
	}
}

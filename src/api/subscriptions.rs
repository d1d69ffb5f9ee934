//! Subscription management for push notifications.

// crates.io
use reqwest::{
	Method, StatusCode,
	header::{HeaderName, HeaderValue},
};
// self
use crate::{
	_prelude::*,
	api::{ApiVersion, Call, CollectionType, FitbitClient, user_path},
	auth::{SubscriberId, SubscriptionId},
};

const SUBSCRIBER_ID: &str = "x-fitbit-subscriber-id";

/// Outcome of [`FitbitClient::create_subscription`].
#[derive(Clone, Debug, PartialEq)]
pub enum SubscriptionStatus {
	/// Fitbit created the subscription (HTTP 201).
	Created(JsonValue),
	/// The same subscription already existed (HTTP 409).
	AlreadyExists(JsonValue),
}
impl SubscriptionStatus {
	/// Body returned by Fitbit in either case.
	pub fn body(&self) -> &JsonValue {
		match self {
			SubscriptionStatus::Created(body) | SubscriptionStatus::AlreadyExists(body) => body,
		}
	}
}

impl FitbitClient {
	/// Subscribes to `collection` (or every collection when `None`).
	///
	/// `subscriber` selects one of the subscriber endpoints configured for the app; Fitbit uses
	/// the default subscriber otherwise. A `409` for an identical existing subscription counts
	/// as success.
	pub async fn create_subscription(
		&self,
		collection: Option<CollectionType>,
		id: &SubscriptionId,
		subscriber: Option<&SubscriberId>,
	) -> Result<SubscriptionStatus> {
		let call = subscription_call(Method::POST, collection, id, subscriber)?
			.tolerate(StatusCode::CONFLICT);
		let response = self.execute(&call).await?;
		let body = response.json()?;

		if response.status == StatusCode::CONFLICT {
			#[cfg(feature = "tracing")]
			tracing::info!(subscription = %id, "subscription already exists");

			Ok(SubscriptionStatus::AlreadyExists(body))
		} else {
			Ok(SubscriptionStatus::Created(body))
		}
	}

	/// Subscriptions for `collection` (or every collection when `None`).
	pub async fn subscriptions(&self, collection: Option<CollectionType>) -> Result<JsonValue> {
		self.json(Call::get(user_path(format!("{}apiSubscriptions.json", collection_prefix(collection)))))
			.await
	}

	/// Removes a subscription; Fitbit answers `204` on success.
	pub async fn delete_subscription(
		&self,
		collection: Option<CollectionType>,
		id: &SubscriptionId,
		subscriber: Option<&SubscriberId>,
	) -> Result<()> {
		let call = subscription_call(Method::DELETE, collection, id, subscriber)?;

		self.execute(&call).await?;

		Ok(())
	}
}

fn subscription_call(
	method: Method,
	collection: Option<CollectionType>,
	id: &SubscriptionId,
	subscriber: Option<&SubscriberId>,
) -> Result<Call> {
	match collection {
		Some(CollectionType::UserRevokedAccess) =>
			return Err(Error::invalid_argument(
				"userRevokedAccess notifications cannot be subscribed to directly",
			)),
		Some(CollectionType::Unknown) =>
			return Err(Error::invalid_argument("unknown collections cannot be subscribed to")),
		_ => {},
	}

	let path = user_path(format!("{}apiSubscriptions/{id}.json", collection_prefix(collection)));
	let mut call = Call::new(method, ApiVersion::V1, path);

	if let Some(subscriber) = subscriber {
		let value = HeaderValue::from_str(subscriber).map_err(|_| {
			Error::invalid_argument(format!("subscriber id `{subscriber}` is not a valid header value"))
		})?;

		call = call.header(HeaderName::from_static(SUBSCRIBER_ID), value);
	}

	Ok(call)
}

fn collection_prefix(collection: Option<CollectionType>) -> String {
	collection.map(|collection| format!("{collection}/")).unwrap_or_default()
}

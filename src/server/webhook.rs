//! Subscriber endpoint for Fitbit push notifications.
//!
//! - `GET ?verify=<code>` answers `204` when the code matches the one configured for the
//!   subscriber and `404` otherwise; Fitbit sends both a correct and an incorrect code when the
//!   subscriber is registered.
//! - `POST` carries a JSON array of [`Notification`]s. When a signing secret is configured the
//!   `X-Fitbit-Signature` header (base64 HMAC-SHA1 of the body keyed by `<client_secret>&`) must
//!   verify, otherwise the request is answered with `404` as Fitbit recommends.

// std
use std::{io, net::SocketAddr};
// crates.io
use axum::{
	Router,
	body::Bytes,
	extract::{Query, State},
	http::{HeaderMap, StatusCode},
	routing::get,
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use ring::{constant_time, hmac};
use tokio::net::TcpListener;
// self
use crate::{
	_prelude::*,
	api::CollectionType,
	auth::{SubscriptionId, UserId},
	obs::{self, FlowKind},
	server::{NotificationSink, SinkError},
};

/// Header carrying the notification signature.
pub const SIGNATURE_HEADER: &str = "x-fitbit-signature";

time::serde::format_description!(fitbit_date, Date, "[year]-[month]-[day]");

/// One entry of a notification batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
	/// Collection that changed.
	pub collection_type: CollectionType,
	/// Day the change belongs to; absent on `userRevokedAccess`.
	#[serde(default, with = "fitbit_date::option", skip_serializing_if = "Option::is_none")]
	pub date: Option<Date>,
	/// Encoded id of the user whose data changed.
	pub owner_id: UserId,
	/// Owner kind, always `user` today.
	pub owner_type: String,
	/// Subscription the notification was routed through.
	pub subscription_id: SubscriptionId,
}

/// Shared state of the webhook router.
#[derive(Clone)]
pub struct WebhookState {
	path: Arc<str>,
	verify_code: Arc<str>,
	signing_key: Option<Arc<hmac::Key>>,
	sink: Arc<dyn NotificationSink>,
}
impl WebhookState {
	/// Default route registered in the Fitbit app settings.
	pub const DEFAULT_PATH: &'static str = "/fitbit-notifications";

	/// Creates state that verifies `verify_code` and forwards batches to `sink`.
	pub fn new(verify_code: impl Into<String>, sink: Arc<dyn NotificationSink>) -> Self {
		Self {
			path: Arc::from(Self::DEFAULT_PATH),
			verify_code: Arc::from(verify_code.into()),
			signing_key: None,
			sink,
		}
	}

	/// Serves the route at `path` instead of [`WebhookState::DEFAULT_PATH`].
	pub fn with_path(mut self, path: impl Into<String>) -> Self {
		self.path = Arc::from(path.into());

		self
	}

	/// Enables `X-Fitbit-Signature` verification with the app's client secret.
	pub fn with_signing_secret(mut self, client_secret: &str) -> Self {
		let key = format!("{client_secret}&");

		self.signing_key =
			Some(Arc::new(hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, key.as_bytes())));

		self
	}

	/// Route the router is mounted on.
	pub fn path(&self) -> &str {
		&self.path
	}

	fn signature_is_valid(&self, headers: &HeaderMap, body: &[u8]) -> bool {
		let Some(key) = &self.signing_key else {
			return true;
		};
		let Some(signature) = headers
			.get(SIGNATURE_HEADER)
			.and_then(|value| value.to_str().ok())
			.and_then(|raw| STANDARD.decode(raw.trim()).ok())
		else {
			return false;
		};

		hmac::verify(key, body, &signature).is_ok()
	}
}
impl Debug for WebhookState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("WebhookState")
			.field("path", &self.path)
			.field("signed", &self.signing_key.is_some())
			.finish()
	}
}

#[derive(Debug, Deserialize)]
struct VerifyParams {
	verify: Option<String>,
}

/// Builds the single-route router.
pub fn router(state: WebhookState) -> Router {
	let path = state.path.to_string();

	Router::new().route(&path, get(verify).post(receive)).with_state(state)
}

/// Serves the webhook until Ctrl-C.
pub async fn serve(listener: TcpListener, state: WebhookState) -> io::Result<()> {
	serve_with_shutdown(listener, state, async {
		if let Err(e) = tokio::signal::ctrl_c().await {
			tracing::error!(error = %e, "failed to listen for ctrl-c");
		}
	})
	.await
}

/// Serves the webhook until `shutdown` resolves.
pub async fn serve_with_shutdown<F>(
	listener: TcpListener,
	state: WebhookState,
	shutdown: F,
) -> io::Result<()>
where
	F: 'static + Send + Future<Output = ()>,
{
	let addr = listener.local_addr().ok().map(|addr: SocketAddr| addr.to_string());

	tracing::info!(addr = addr.as_deref().unwrap_or("?"), path = state.path(), "webhook listening");

	axum::serve(listener, router(state)).with_graceful_shutdown(shutdown).await
}

async fn verify(State(state): State<WebhookState>, Query(params): Query<VerifyParams>) -> StatusCode {
	let verified = obs::observe_sync(FlowKind::Notification, "verify", || match params.verify {
		Some(code)
			if constant_time::verify_slices_are_equal(code.as_bytes(), state.verify_code.as_bytes())
				.is_ok() =>
		{
			tracing::info!("subscriber verification succeeded");

			Ok(StatusCode::NO_CONTENT)
		},
		_ => {
			tracing::warn!("subscriber verification rejected");

			Err(StatusCode::NOT_FOUND)
		},
	});

	verified.unwrap_or_else(|status| status)
}

async fn receive(State(state): State<WebhookState>, headers: HeaderMap, body: Bytes) -> StatusCode {
	let outcome = obs::observe(FlowKind::Notification, "receive", async move {
		if !state.signature_is_valid(&headers, &body) {
			tracing::warn!("notification signature rejected");

			return Err(StatusCode::NOT_FOUND);
		}

		let entries = serde_json::from_slice::<Vec<JsonValue>>(&body).map_err(|e| {
			tracing::warn!(error = %e, "malformed notification batch");

			StatusCode::BAD_REQUEST
		})?;
		// A single odd entry must not fail the batch; Fitbit disables subscribers that keep erroring.
		let batch = entries
			.into_iter()
			.filter_map(|entry| {
				serde_json::from_value::<Notification>(entry)
					.inspect_err(|e| tracing::warn!(error = %e, "skipping unreadable notification"))
					.ok()
			})
			.collect::<Vec<_>>();
		let count = batch.len();

		if count == 0 {
			return Ok(0);
		}

		state.sink.deliver(batch).map_err(|e| {
			tracing::error!(error = %e, "notification sink refused batch");

			match e {
				SinkError::Closed | SinkError::Full => StatusCode::SERVICE_UNAVAILABLE,
			}
		})?;

		Ok(count)
	})
	.await;

	match outcome {
		Ok(count) => {
			tracing::info!(count, "notification batch accepted");

			StatusCode::NO_CONTENT
		},
		Err(status) => status,
	}
}

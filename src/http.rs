//! Transport primitives for OAuth token exchanges and Fitbit response metadata.
//!
//! The module exposes [`TokenHttpClient`] alongside [`ResponseMetadata`] and
//! [`ResponseMetadataSlot`] so downstream crates can integrate custom HTTP clients
//! without losing the broker's instrumentation hooks. Implementations call
//! [`ResponseMetadataSlot::take`] before dispatching a request and
//! [`ResponseMetadataSlot::store`] once an HTTP status or retry hint is known,
//! enabling the facade to classify failures with consistent metadata.
//!
//! [`RateLimitSnapshot`] reads the `Fitbit-Rate-Limit-*` headers attached to every
//! resource response.

// std
use std::ops::Deref;
// crates.io
use oauth2::{AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse};
use reqwest::header::{HeaderMap, RETRY_AFTER};
use time::format_description::well_known::Rfc2822;
// self
use crate::_prelude::*;

/// Header carrying the hourly request quota.
pub const RATE_LIMIT_LIMIT: &str = "fitbit-rate-limit-limit";
/// Header carrying the remaining request count.
pub const RATE_LIMIT_REMAINING: &str = "fitbit-rate-limit-remaining";
/// Header carrying the seconds until the quota resets.
pub const RATE_LIMIT_RESET: &str = "fitbit-rate-limit-reset";

/// Abstraction over HTTP transports capable of executing OAuth token exchanges while
/// publishing response metadata to the broker's instrumentation pipeline.
///
/// The trait acts as the broker's only dependency on an HTTP stack for token
/// traffic. Callers provide an implementation (typically behind `Arc<T>`) and the
/// broker requests short-lived [`AsyncHttpClient`] handles that each carry a clone of a
/// [`ResponseMetadataSlot`]. Handles must own whatever state they need so their request
/// futures remain `Send` for the lifetime of the in-flight operation.
pub trait TokenHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// [`AsyncHttpClient`] handle tied to a [`ResponseMetadataSlot`].
	type Handle: for<'c> AsyncHttpClient<
			'c,
			Error = HttpClientError<Self::TransportError>,
			Future: 'c + Send,
		>
		+ 'static
		+ Send
		+ Sync;

	/// Builds an [`AsyncHttpClient`] handle that records outcomes in `slot`.
	///
	/// # Metadata Contract
	///
	/// - Call [`ResponseMetadataSlot::take`] before submitting the HTTP request so stale
	///   information never leaks across retries.
	/// - Once an HTTP response (successful or erroneous) provides status headers, save them with
	///   [`ResponseMetadataSlot::store`].
	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle;
}

/// Captures metadata from the most recent HTTP response for downstream error mapping.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadata {
	/// HTTP status code returned by the endpoint, if available.
	pub status: Option<u16>,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
}

/// Thread-safe slot for sharing [`ResponseMetadata`] between transport and error layers.
#[derive(Clone, Debug, Default)]
pub struct ResponseMetadataSlot(Arc<Mutex<Option<ResponseMetadata>>>);
impl ResponseMetadataSlot {
	/// Stores new metadata for the current request.
	pub fn store(&self, meta: ResponseMetadata) {
		*self.0.lock() = Some(meta);
	}

	/// Returns the captured metadata, if any, consuming it from the slot.
	pub fn take(&self) -> Option<ResponseMetadata> {
		self.0.lock().take()
	}
}

/// Per-user quota reported by Fitbit on resource responses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitSnapshot {
	/// Requests allowed in the current window.
	pub limit: Option<u32>,
	/// Requests left in the current window.
	pub remaining: Option<u32>,
	/// Time until the window resets.
	pub reset_after: Option<Duration>,
}
impl RateLimitSnapshot {
	/// Reads the rate-limit headers; returns `None` when none are present.
	pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
		let number = |name: &str| {
			headers.get(name).and_then(|value| value.to_str().ok()).and_then(|raw| raw.trim().parse::<u32>().ok())
		};
		let snapshot = Self {
			limit: number(RATE_LIMIT_LIMIT),
			remaining: number(RATE_LIMIT_REMAINING),
			reset_after: number(RATE_LIMIT_RESET).map(|secs| Duration::seconds(i64::from(secs))),
		};

		if snapshot.limit.is_none() && snapshot.remaining.is_none() && snapshot.reset_after.is_none()
		{
			None
		} else {
			Some(snapshot)
		}
	}

	/// Returns true when the quota is known to be used up.
	pub fn is_exhausted(&self) -> bool {
		self.remaining == Some(0)
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Token requests should not follow redirects, matching OAuth 2.0 guidance that token
/// endpoints return results directly. Configure any custom [`ReqwestClient`] to disable
/// redirect following before passing it in.
#[derive(Clone, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	pub(crate) fn instrumented(&self, slot: ResponseMetadataSlot) -> InstrumentedHandle {
		InstrumentedHandle::new(self.0.clone(), slot)
	}
}
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

pub(crate) struct InstrumentedHttpClient {
	client: ReqwestClient,
	slot: ResponseMetadataSlot,
}
impl InstrumentedHttpClient {
	fn new(client: ReqwestClient, slot: ResponseMetadataSlot) -> Self {
		Self { client, slot }
	}
}

/// Handle returned by [`ReqwestHttpClient`] that satisfies [`TokenHttpClient`].
#[derive(Clone)]
pub struct InstrumentedHandle(Arc<InstrumentedHttpClient>);
impl InstrumentedHandle {
	fn new(client: ReqwestClient, slot: ResponseMetadataSlot) -> Self {
		Self(Arc::new(InstrumentedHttpClient::new(client, slot)))
	}
}
impl<'c> AsyncHttpClient<'c> for InstrumentedHandle {
	type Error = HttpClientError<ReqwestError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		let client = Arc::clone(&self.0);

		Box::pin(async move {
			client.slot.take();

			let response = client
				.client
				.execute(request.try_into().map_err(Box::new)?)
				.await
				.map_err(Box::new)?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let retry_after = parse_retry_after(&headers);

			client.slot.store(ResponseMetadata { status: Some(status.as_u16()), retry_after });

			let mut response_new =
				HttpResponse::new(response.bytes().await.map_err(Box::new)?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}
impl TokenHttpClient for ReqwestHttpClient {
	type Handle = InstrumentedHandle;
	type TransportError = ReqwestError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		self.instrumented(slot)
	}
}

/// Parses `Retry-After` as delta seconds or an HTTP date.
pub(crate) fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<i64>() {
		return Some(Duration::seconds(secs));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// crates.io
	use reqwest::header::HeaderValue;
	// self
	use super::*;

	#[test]
	fn rate_limit_snapshot_reads_fitbit_headers() {
		let mut headers = HeaderMap::new();

		headers.insert("Fitbit-Rate-Limit-Limit", HeaderValue::from_static("150"));
		headers.insert("Fitbit-Rate-Limit-Remaining", HeaderValue::from_static("0"));
		headers.insert("Fitbit-Rate-Limit-Reset", HeaderValue::from_static("1200"));

		let snapshot =
			RateLimitSnapshot::from_headers(&headers).expect("Snapshot should be captured.");

		assert_eq!(snapshot.limit, Some(150));
		assert_eq!(snapshot.reset_after, Some(Duration::minutes(20)));
		assert!(snapshot.is_exhausted());
		assert!(RateLimitSnapshot::from_headers(&HeaderMap::new()).is_none());
	}

	#[test]
	fn retry_after_accepts_delta_seconds() {
		let mut headers = HeaderMap::new();

		headers.insert(RETRY_AFTER, HeaderValue::from_static("30"));

		assert_eq!(parse_retry_after(&headers), Some(Duration::seconds(30)));

		headers.insert(RETRY_AFTER, HeaderValue::from_static("soon"));

		assert_eq!(parse_retry_after(&headers), None);
	}
}

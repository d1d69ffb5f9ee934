//! Authenticated client for the Fitbit Web API resource endpoints.
//!
//! [`FitbitClient`] pulls a usable access token from a [`TokenSource`] (normally the
//! [`Broker`]) before every call, attaches it as a bearer credential, and returns the JSON body
//! unchanged. When Fitbit answers `401 expired_token` the client forces one refresh and retries
//! once; `429` surfaces as [`Error::RateLimited`] and every other non-success status as
//! [`Error::Api`]. Endpoint groups live in submodules and add inherent methods to the client.

pub mod params;

mod activity;
mod azm;
mod body;
mod breathing;
mod cardio;
mod devices;
mod ecg;
mod friends;
mod heart;
mod irn;
mod nutrition;
mod sleep;
mod spo2;
mod subscriptions;
mod temperature;
mod user;

pub use params::*;
pub use subscriptions::SubscriptionStatus;

// crates.io
use reqwest::{
	Method, Response, StatusCode,
	header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderName, HeaderValue},
};
// self
use crate::{
	_prelude::*,
	auth::UserId,
	error::{ApiError, ConfigError, FitbitErrorDetail, TransportError},
	flows::{Broker, TokenSource},
	http::{self, RateLimitSnapshot, TokenHttpClient},
	oauth::{FitbitErrorEnvelope, TransportErrorMapper},
	obs::{self, FlowKind},
	provider::ProviderDescriptor,
};

const ACCEPT_LOCALE: &str = "accept-locale";
const EXPIRED_TOKEN: &str = "expired_token";

/// Path version prefix; most endpoints are `1`, friends use `1.1` and sleep `1.2`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ApiVersion {
	V1,
	V1_1,
	V1_2,
}
impl ApiVersion {
	const fn as_str(self) -> &'static str {
		match self {
			ApiVersion::V1 => "1",
			ApiVersion::V1_1 => "1.1",
			ApiVersion::V1_2 => "1.2",
		}
	}
}

/// One resource request before authentication is attached.
#[derive(Clone, Debug)]
pub(crate) struct Call {
	method: Method,
	version: ApiVersion,
	path: String,
	query: Vec<(&'static str, String)>,
	headers: Vec<(HeaderName, HeaderValue)>,
	tolerated: Vec<StatusCode>,
}
impl Call {
	pub(crate) fn new(method: Method, version: ApiVersion, path: impl Into<String>) -> Self {
		Self {
			method,
			version,
			path: path.into(),
			query: Vec::new(),
			headers: Vec::new(),
			tolerated: Vec::new(),
		}
	}

	/// `GET /1/{path}`.
	pub(crate) fn get(path: impl Into<String>) -> Self {
		Self::new(Method::GET, ApiVersion::V1, path)
	}

	/// `GET` path under the authorized user (`user/-/{path}`).
	pub(crate) fn user(path: impl Display) -> Self {
		Self::get(user_path(path))
	}

	pub(crate) fn version(mut self, version: ApiVersion) -> Self {
		self.version = version;

		self
	}

	pub(crate) fn query(mut self, key: &'static str, value: impl Into<String>) -> Self {
		self.query.push((key, value.into()));

		self
	}

	pub(crate) fn queries(mut self, pairs: impl IntoIterator<Item = (&'static str, String)>) -> Self {
		self.query.extend(pairs);

		self
	}

	pub(crate) fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.push((name, value));

		self
	}

	/// Treats `status` as a successful outcome instead of an [`ApiError`].
	pub(crate) fn tolerate(mut self, status: StatusCode) -> Self {
		self.tolerated.push(status);

		self
	}

	fn relative_url(&self) -> String {
		format!("{}/{}", self.version.as_str(), self.path)
	}
}

/// Status and raw body of a resource response that passed status checks.
#[derive(Clone, Debug)]
pub(crate) struct ApiResponse {
	pub(crate) status: StatusCode,
	pub(crate) body: Vec<u8>,
}
impl ApiResponse {
	fn json(&self) -> Result<JsonValue> {
		if self.body.is_empty() {
			return Ok(JsonValue::Null);
		}

		serde_json::from_slice(&self.body)
			.map_err(|e| Error::unexpected_response(format!("body is not valid JSON: {e}")))
	}
}

/// Fitbit resource client acting for one user.
#[derive(Clone)]
pub struct FitbitClient {
	tokens: Arc<dyn TokenSource>,
	descriptor: ProviderDescriptor,
	user: UserId,
	http: ReqwestClient,
	locale: Option<HeaderValue>,
	language: Option<HeaderValue>,
	rate_limit: Arc<Mutex<Option<RateLimitSnapshot>>>,
}
impl FitbitClient {
	/// Creates a client from any token source and the descriptor holding the API base URL.
	pub fn new(
		tokens: Arc<dyn TokenSource>,
		descriptor: ProviderDescriptor,
		user: UserId,
		http: ReqwestClient,
	) -> Self {
		Self {
			tokens,
			descriptor,
			user,
			http,
			locale: None,
			language: None,
			rate_limit: Default::default(),
		}
	}

	/// Creates a client backed by `broker` with a default reqwest client.
	pub fn from_broker<C, M>(broker: Arc<Broker<C, M>>, user: UserId) -> Self
	where
		C: ?Sized + TokenHttpClient,
		M: ?Sized + TransportErrorMapper<C::TransportError>,
	{
		Self::with_api_client(broker, user, ReqwestClient::default())
	}

	/// Creates a client backed by `broker` that sends resource requests through `http`.
	pub fn with_api_client<C, M>(broker: Arc<Broker<C, M>>, user: UserId, http: ReqwestClient) -> Self
	where
		C: ?Sized + TokenHttpClient,
		M: ?Sized + TransportErrorMapper<C::TransportError>,
	{
		let descriptor = broker.descriptor.clone();

		Self::new(broker, descriptor, user, http)
	}

	/// Sets `Accept-Locale` (food database locale, e.g. `en_US`).
	pub fn with_locale(mut self, locale: &str) -> Result<Self> {
		self.locale = Some(header_value("locale", locale)?);

		Ok(self)
	}

	/// Sets `Accept-Language` (unit system, e.g. `en_GB` for metric stones).
	pub fn with_language(mut self, language: &str) -> Result<Self> {
		self.language = Some(header_value("language", language)?);

		Ok(self)
	}

	/// User whose token is attached to requests.
	pub fn user(&self) -> &UserId {
		&self.user
	}

	/// Rate-limit headers seen on the most recent response that carried them.
	pub fn rate_limit(&self) -> Option<RateLimitSnapshot> {
		*self.rate_limit.lock()
	}

	/// Sends `call` and parses the JSON body.
	pub(crate) async fn json(&self, call: Call) -> Result<JsonValue> {
		self.execute(&call).await?.json()
	}

	/// Sends `call` and returns the value under `key`, which Fitbit uses to wrap some payloads.
	pub(crate) async fn json_field(&self, call: Call, key: &str) -> Result<JsonValue> {
		let mut value = self.json(call).await?;

		value
			.as_object_mut()
			.and_then(|object| object.remove(key))
			.ok_or_else(|| Error::unexpected_response(format!("response is missing the `{key}` field")))
	}

	/// Sends `call` and returns the raw body.
	pub(crate) async fn bytes(&self, call: Call) -> Result<Vec<u8>> {
		Ok(self.execute(&call).await?.body)
	}

	pub(crate) async fn execute(&self, call: &Call) -> Result<ApiResponse> {
		obs::observe(FlowKind::ApiRequest, "execute", async move {
			let url = self
				.descriptor
				.resource_url(&call.relative_url())
				.map_err(|source| ConfigError::InvalidDescriptor { source })?;
			let mut record = self.tokens.token(&self.user, false).await?;
			let mut retried = false;

			loop {
				let response = self.dispatch(call, url.clone(), &record.bearer()).await?;
				let status = response.status();
				let headers = response.headers().clone();
				let rate_limit = RateLimitSnapshot::from_headers(&headers);

				if rate_limit.is_some() {
					*self.rate_limit.lock() = rate_limit;
				}

				let body = response.bytes().await.map_err(TransportError::api)?.to_vec();

				if status.is_success() || call.tolerated.contains(&status) {
					return Ok(ApiResponse { status, body });
				}

				let errors = FitbitErrorEnvelope::parse(&body).unwrap_or_default();

				if status == StatusCode::UNAUTHORIZED
					&& !retried
					&& errors.iter().any(|detail| detail.error_type == EXPIRED_TOKEN)
				{
					#[cfg(feature = "tracing")]
					tracing::debug!(path = %call.path, "access token expired; refreshing once");

					retried = true;
					record = self.tokens.token(&self.user, true).await?;

					continue;
				}

				return Err(failure(status, &call.path, errors, &headers, rate_limit));
			}
		})
		.await
	}

	async fn dispatch(&self, call: &Call, url: Url, bearer: &str) -> Result<Response> {
		let mut request = self
			.http
			.request(call.method.clone(), url)
			.header(reqwest::header::AUTHORIZATION, bearer)
			.query(&call.query);

		if let Some(locale) = &self.locale {
			request = request.header(ACCEPT_LOCALE, locale.clone());
		}
		if let Some(language) = &self.language {
			request = request.header(ACCEPT_LANGUAGE, language.clone());
		}
		if !call.headers.iter().any(|(name, _)| name == ACCEPT) {
			request = request.header(ACCEPT, HeaderValue::from_static("application/json"));
		}
		for (name, value) in &call.headers {
			request = request.header(name.clone(), value.clone());
		}

		Ok(request.send().await.map_err(TransportError::api)?)
	}
}
impl Debug for FitbitClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("FitbitClient")
			.field("user", &self.user)
			.field("api_base", &self.descriptor.endpoints.api_base.as_str())
			.field("locale", &self.locale)
			.field("language", &self.language)
			.finish()
	}
}

/// `user/-/{rest}`; Fitbit resolves `-` to the owner of the access token.
pub(crate) fn user_path(rest: impl Display) -> String {
	format!("user/{}/{rest}", UserId::CURRENT)
}

/// `{detail}` or `{detail}/time/HH:mm/HH:mm` tail of an intraday path.
pub(crate) fn intraday_tail(detail: DetailLevel, window: Option<TimeWindow>) -> String {
	match window {
		Some(window) => format!("{detail}/{}", window.segment()),
		None => detail.to_string(),
	}
}

fn header_value(what: &'static str, raw: &str) -> Result<HeaderValue> {
	HeaderValue::from_str(raw)
		.map_err(|_| Error::invalid_argument(format!("{what} `{raw}` is not a valid header value")))
}

fn failure(
	status: StatusCode,
	path: &str,
	errors: Vec<FitbitErrorDetail>,
	headers: &HeaderMap,
	rate_limit: Option<RateLimitSnapshot>,
) -> Error {
	if status == StatusCode::TOO_MANY_REQUESTS {
		let retry_after = http::parse_retry_after(headers)
			.or_else(|| rate_limit.and_then(|snapshot| snapshot.reset_after));

		return Error::RateLimited { retry_after };
	}

	ApiError { status: status.as_u16(), path: format!("/{path}"), errors, rate_limit }.into()
}

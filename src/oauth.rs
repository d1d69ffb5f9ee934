//! Internal OAuth client facade over the `oauth2` crate, specialized for Fitbit token
//! responses (which carry a `user_id` extra field) and Fitbit error envelopes.

pub use oauth2;

// std
use std::borrow::Cow;
// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use oauth2::{
	AsyncHttpClient, AuthType, AuthUrl, AuthorizationCode, Client, ClientId, ClientSecret,
	EndpointNotSet, EndpointSet, ExtraTokenFields, HttpClientError, PkceCodeVerifier, RedirectUrl,
	RefreshToken, RequestTokenError, StandardRevocableToken, StandardTokenResponse, TokenResponse,
	TokenUrl,
	basic::{
		BasicErrorResponse, BasicRequestTokenError, BasicRevocationErrorResponse,
		BasicTokenIntrospectionResponse, BasicTokenType,
	},
	http::{
		Method, Request,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
	},
};
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::{FitbitScope, ScopeSet, TokenRecord, TokenRecordBuilderError, UserId},
	error::{ConfigError, FitbitErrorDetail, TransientError, TransportError},
	http::{ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
	provider::{
		ClientAuthMethod, GrantType, ProviderDescriptor, ProviderErrorContext, ProviderErrorKind,
		ProviderStrategy,
	},
};

/// Fitbit-specific fields appended to the standard token response.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FitbitTokenFields {
	/// Encoded id of the user who granted access.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub user_id: Option<String>,
}
impl ExtraTokenFields for FitbitTokenFields {}

/// Token response shape returned by the Fitbit token endpoint.
pub type FitbitTokenResponse = StandardTokenResponse<FitbitTokenFields, BasicTokenType>;

type FitbitOAuthClient<HasAuthUrl = EndpointSet, HasTokenUrl = EndpointSet> = Client<
	BasicErrorResponse,
	FitbitTokenResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
	HasAuthUrl,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	HasTokenUrl,
>;
type FacadeFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Fitbit's `{"errors":[..],"success":false}` envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct FitbitErrorEnvelope {
	#[serde(default)]
	pub(crate) errors: Vec<FitbitErrorDetail>,
}
impl FitbitErrorEnvelope {
	pub(crate) fn parse(body: &[u8]) -> Option<Vec<FitbitErrorDetail>> {
		serde_json::from_slice::<Self>(body).ok().map(|envelope| envelope.errors).filter(|errors| !errors.is_empty())
	}
}

/// Which secret a revocation request carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenTypeHint {
	/// Revokes the refresh token and every access token minted from it.
	RefreshToken,
	/// Revokes a single access token.
	AccessToken,
}
impl TokenTypeHint {
	fn as_str(self) -> &'static str {
		match self {
			TokenTypeHint::RefreshToken => "refresh_token",
			TokenTypeHint::AccessToken => "access_token",
		}
	}
}

/// Maps HTTP transport failures into crate [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a crate error.
	fn map_transport_error(
		&self,
		strategy: &dyn ProviderStrategy,
		grant: GrantType,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		_strategy: &dyn ProviderStrategy,
		_grant: GrantType,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(meta, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => map_generic_transport_error(meta, message),
			_ => map_unknown_transport_error(meta),
		}
	}
}

pub(crate) trait OAuth2Facade {
	fn exchange_authorization_code<'a, 'strategy, 'code, 'pkce, 'scope, 'redirect>(
		&'a self,
		strategy: &'strategy dyn ProviderStrategy,
		code: &'code str,
		pkce_verifier: Option<&'pkce str>,
		requested_scope: &'scope ScopeSet,
		redirect_uri: &'redirect Url,
	) -> FacadeFuture<'a, TokenRecord>
	where
		'strategy: 'a,
		'code: 'a,
		'pkce: 'a,
		'scope: 'a,
		'redirect: 'a;

	fn refresh_token<'a, 'strategy, 'refresh, 'scope>(
		&'a self,
		strategy: &'strategy dyn ProviderStrategy,
		user_id: UserId,
		refresh_token: &'refresh str,
		current_scope: &'scope ScopeSet,
	) -> FacadeFuture<'a, (TokenRecord, Option<String>)>
	where
		'strategy: 'a,
		'refresh: 'a,
		'scope: 'a;

	fn revoke_token<'a, 'strategy, 'token>(
		&'a self,
		strategy: &'strategy dyn ProviderStrategy,
		revocation_url: Url,
		token: &'token str,
		hint: TokenTypeHint,
	) -> FacadeFuture<'a, ()>
	where
		'strategy: 'a,
		'token: 'a;
}

pub(crate) struct BasicFacade<C = ReqwestHttpClient, M = ReqwestTransportErrorMapper>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: FitbitOAuthClient,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
	client_id: String,
	client_secret: Option<String>,
	auth_method: ClientAuthMethod,
}
impl<C, M> BasicFacade<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn from_descriptor(
		descriptor: &ProviderDescriptor,
		client_id: &str,
		client_secret: Option<&str>,
		http_client: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		let auth_url = AuthUrl::new(descriptor.endpoints.authorization.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let token_url = TokenUrl::new(descriptor.endpoints.token.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let auth_method = descriptor.preferred_client_auth_method;
		let secret = if matches!(auth_method, ClientAuthMethod::NoneWithPkce) {
			None
		} else {
			client_secret.map(ToOwned::to_owned)
		};
		let mut oauth_client = FitbitOAuthClient::<EndpointNotSet, EndpointNotSet>::new(ClientId::new(client_id.to_owned()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url);

		if let Some(secret) = secret.as_ref() {
			oauth_client = oauth_client.set_client_secret(ClientSecret::new(secret.clone()));
		}
		if matches!(auth_method, ClientAuthMethod::ClientSecretPost) {
			oauth_client = oauth_client.set_auth_type(AuthType::RequestBody);
		}

		Ok(Self {
			oauth_client,
			http_client: http_client.into(),
			error_mapper: error_mapper.into(),
			client_id: client_id.to_owned(),
			client_secret: secret,
			auth_method,
		})
	}

	fn uses_basic_header(&self) -> bool {
		matches!(self.auth_method, ClientAuthMethod::ClientSecretBasic) && self.client_secret.is_some()
	}

	fn revocation_request(&self, url: &Url, token: &str, hint: TokenTypeHint) -> Result<Request<Vec<u8>>> {
		let mut form = form_urlencoded::Serializer::new(String::new());

		form.append_pair("token", token);
		form.append_pair("token_type_hint", hint.as_str());

		let mut builder = Request::builder()
			.method(Method::POST)
			.uri(url.as_str())
			.header(CONTENT_TYPE, "application/x-www-form-urlencoded")
			.header(ACCEPT, "application/json");

		if self.uses_basic_header() {
			builder = builder.header(AUTHORIZATION, self.basic_authorization());
		} else {
			form.append_pair("client_id", &self.client_id);

			if let Some(secret) = self.client_secret.as_deref() {
				form.append_pair("client_secret", secret);
			}
		}

		builder.body(form.finish().into_bytes()).map_err(|err| ConfigError::from(err).into())
	}

	fn basic_authorization(&self) -> String {
		let encode = |value: &str| form_urlencoded::byte_serialize(value.as_bytes()).collect::<String>();
		let credentials = format!(
			"{}:{}",
			encode(&self.client_id),
			encode(self.client_secret.as_deref().unwrap_or_default())
		);

		format!("Basic {}", STANDARD.encode(credentials))
	}
}
impl<C, M> OAuth2Facade for BasicFacade<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn exchange_authorization_code<'a, 'strategy, 'code, 'pkce, 'scope, 'redirect>(
		&'a self,
		strategy: &'strategy dyn ProviderStrategy,
		code: &'code str,
		pkce_verifier: Option<&'pkce str>,
		requested_scope: &'scope ScopeSet,
		redirect_uri: &'redirect Url,
	) -> FacadeFuture<'a, TokenRecord>
	where
		'strategy: 'a,
		'code: 'a,
		'pkce: 'a,
		'scope: 'a,
		'redirect: 'a,
	{
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let mut request = self.oauth_client.exchange_code(AuthorizationCode::new(code.to_owned()));

			if let Some(verifier) = pkce_verifier {
				request = request.set_pkce_verifier(PkceCodeVerifier::new(verifier.to_owned()));
			}
			// Fitbit expects `client_id` in the body even when Basic auth is used.
			if self.uses_basic_header() {
				request = request.add_extra_param("client_id", self.client_id.clone());
			}

			let redirect_url = RedirectUrl::new(redirect_uri.to_string())
				.map_err(|err| ConfigError::InvalidRedirect { source: err })?;

			request = request.set_redirect_uri(Cow::Owned(redirect_url));

			let response = request.request_async(&instrumented).await.map_err(|err| {
				map_request_error(
					strategy,
					GrantType::AuthorizationCode,
					meta.take(),
					err,
					self.error_mapper.as_ref(),
				)
			})?;
			let user_id = response
				.extra_fields()
				.user_id
				.as_deref()
				.ok_or(ConfigError::MissingUserId)
				.and_then(|raw| UserId::new(raw).map_err(ConfigError::from))?;
			let (record, _) = map_token_response(user_id, requested_scope, None, &response)?;

			Ok(record)
		})
	}

	fn refresh_token<'a, 'strategy, 'refresh, 'scope>(
		&'a self,
		strategy: &'strategy dyn ProviderStrategy,
		user_id: UserId,
		refresh_token: &'refresh str,
		current_scope: &'scope ScopeSet,
	) -> FacadeFuture<'a, (TokenRecord, Option<String>)>
	where
		'strategy: 'a,
		'refresh: 'a,
		'scope: 'a,
	{
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let refresh_secret = RefreshToken::new(refresh_token.to_owned());
			let response = self
				.oauth_client
				.exchange_refresh_token(&refresh_secret)
				.request_async(&instrumented)
				.await
				.map_err(|err| {
					map_request_error(
						strategy,
						GrantType::RefreshToken,
						meta.take(),
						err,
						self.error_mapper.as_ref(),
					)
				})?;
			let user_id = match response.extra_fields().user_id.as_deref() {
				Some(raw) => UserId::new(raw).map_err(ConfigError::from)?,
				None => user_id,
			};

			map_token_response(user_id, current_scope, Some(refresh_token), &response)
		})
	}

	fn revoke_token<'a, 'strategy, 'token>(
		&'a self,
		strategy: &'strategy dyn ProviderStrategy,
		revocation_url: Url,
		token: &'token str,
		hint: TokenTypeHint,
	) -> FacadeFuture<'a, ()>
	where
		'strategy: 'a,
		'token: 'a,
	{
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let request = self.revocation_request(&revocation_url, token, hint)?;
			let handle = self.http_client.with_metadata(meta.clone());
			let response = handle.call(request).await.map_err(|err| {
				self.error_mapper.map_transport_error(
					strategy,
					GrantType::RefreshToken,
					meta.take().as_ref(),
					err,
				)
			})?;
			let status = response.status();

			if status.is_success() {
				return Ok(());
			}

			let meta = ResponseMetadata { status: Some(status.as_u16()), retry_after: None };

			Err(map_error_body(strategy, GrantType::RefreshToken, response.body(), Some(&meta)))
		})
	}
}

fn map_token_response(
	user_id: UserId,
	fallback_scope: &ScopeSet,
	previous_refresh: Option<&str>,
	response: &FitbitTokenResponse,
) -> Result<(TokenRecord, Option<String>)> {
	let expires_in = response.expires_in().ok_or(ConfigError::MissingExpiresIn)?.as_secs();
	let expires_in = i64::try_from(expires_in).map_err(|_| ConfigError::ExpiresInOutOfRange)?;

	if expires_in <= 0 {
		return Err(ConfigError::NonPositiveExpiresIn.into());
	}

	// Fitbit lets the user untick scopes on the consent page, so the granted set wins.
	let scope = match response.scopes() {
		Some(scopes) => scopes
			.iter()
			.filter_map(|scope| scope.as_ref().parse::<FitbitScope>().ok())
			.collect::<ScopeSet>(),
		None => fallback_scope.clone(),
	};
	let token_type = match response.token_type() {
		BasicTokenType::Bearer => "Bearer".to_owned(),
		other => other.as_ref().to_owned(),
	};
	let new_refresh = response.refresh_token().map(|token| token.secret().to_owned());
	let mut builder = TokenRecord::builder(user_id, scope)
		.token_type(token_type)
		.access_token(response.access_token().secret().to_owned())
		.issued_at(OffsetDateTime::now_utc())
		.expires_in(Duration::seconds(expires_in));

	if let Some(secret) = new_refresh.as_deref().or(previous_refresh) {
		builder = builder.refresh_token(secret);
	}

	let record = builder.build().map_err(|e| match e {
		TokenRecordBuilderError::ExpiryOutOfRange => ConfigError::ExpiresInOutOfRange,
		other => ConfigError::from(other),
	})?;

	Ok((record, new_refresh))
}

fn map_request_error<E, M>(
	strategy: &dyn ProviderStrategy,
	grant: GrantType,
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
	mapper: &M,
) -> Error
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	let meta_ref = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) =>
			map_server_response_error(strategy, grant, response, meta_ref),
		RequestTokenError::Request(error) => mapper.map_transport_error(strategy, grant, meta_ref, error),
		RequestTokenError::Parse(error, body) => match FitbitErrorEnvelope::parse(&body) {
			Some(errors) => classify(
				strategy,
				ProviderErrorContext::new(grant).with_fitbit_errors(&errors),
				describe(&errors),
				meta_ref,
			),
			None if meta_status(meta_ref).is_some_and(|status| status >= 400) => {
				let ctx = ProviderErrorContext::new(grant)
					.with_body_preview(String::from_utf8_lossy(&body).into_owned());

				classify(strategy, ctx, "Token endpoint returned a non-JSON error body".into(), meta_ref)
			},
			None => TransientError::TokenResponseParse { source: error, status: meta_status(meta_ref) }
				.into(),
		},
		RequestTokenError::Other(message) => TransientError::TokenEndpoint {
			message: format!("Token endpoint returned an unexpected response: {message}"),
			status: meta_status(meta_ref),
			retry_after: meta_retry_after(meta_ref),
		}
		.into(),
	}
}

fn map_server_response_error(
	strategy: &dyn ProviderStrategy,
	grant: GrantType,
	response: BasicErrorResponse,
	meta: Option<&ResponseMetadata>,
) -> Error {
	let mut ctx =
		ProviderErrorContext::new(grant).with_oauth_error(response.error().as_ref().to_string());

	if let Some(description) = response.error_description() {
		ctx = ctx.with_error_description(description.clone());
	}

	let message = match response.error_description() {
		Some(description) => format!("Token endpoint returned an OAuth error: {description}"),
		None => format!("Token endpoint returned an OAuth error: {}", response.error().as_ref()),
	};

	classify(strategy, ctx, message, meta)
}

/// Classifies a non-success token or revocation body that bypassed the `oauth2` parser.
fn map_error_body(
	strategy: &dyn ProviderStrategy,
	grant: GrantType,
	body: &[u8],
	meta: Option<&ResponseMetadata>,
) -> Error {
	if let Some(errors) = FitbitErrorEnvelope::parse(body) {
		return classify(
			strategy,
			ProviderErrorContext::new(grant).with_fitbit_errors(&errors),
			describe(&errors),
			meta,
		);
	}
	if let Ok(response) = serde_json::from_slice::<BasicErrorResponse>(body) {
		return map_server_response_error(strategy, grant, response, meta);
	}

	let ctx = ProviderErrorContext::new(grant).with_body_preview(String::from_utf8_lossy(body).into_owned());

	classify(strategy, ctx, "Endpoint returned an unrecognized error body".into(), meta)
}

fn classify(
	strategy: &dyn ProviderStrategy,
	mut ctx: ProviderErrorContext,
	message: String,
	meta: Option<&ResponseMetadata>,
) -> Error {
	if let Some(status) = meta_status(meta) {
		ctx = ctx.with_http_status(status);
	}

	match strategy.classify_token_error(&ctx) {
		ProviderErrorKind::InvalidGrant => Error::InvalidGrant { reason: message },
		ProviderErrorKind::InvalidClient => Error::InvalidClient { reason: message },
		ProviderErrorKind::InsufficientScope => Error::InsufficientScope { reason: message },
		ProviderErrorKind::Transient => TransientError::TokenEndpoint {
			message,
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		}
		.into(),
	}
}

fn describe(errors: &[FitbitErrorDetail]) -> String {
	errors
		.iter()
		.map(|detail| format!("{}: {}", detail.error_type, detail.message))
		.collect::<Vec<_>>()
		.join("; ")
}

fn map_reqwest_error(meta: Option<&ResponseMetadata>, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransientError::TokenEndpoint {
			message: "Request timed out while calling the token endpoint".into(),
			status: meta_status(meta).or_else(|| err.status().map(|code| code.as_u16())),
			retry_after: meta_retry_after(meta),
		}
		.into();
	}

	TransportError::from(err).into()
}

fn map_generic_transport_error(meta: Option<&ResponseMetadata>, message: impl Display) -> Error {
	TransientError::TokenEndpoint {
		message: format!("HTTP client error occurred while calling the token endpoint: {message}"),
		status: meta_status(meta),
		retry_after: meta_retry_after(meta),
	}
	.into()
}

fn map_unknown_transport_error(meta: Option<&ResponseMetadata>) -> Error {
	TransientError::TokenEndpoint {
		message: "HTTP client error occurred while calling the token endpoint".into(),
		status: meta_status(meta),
		retry_after: meta_retry_after(meta),
	}
	.into()
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

fn meta_retry_after(meta: Option<&ResponseMetadata>) -> Option<Duration> {
	meta.and_then(|value| value.retry_after)
}

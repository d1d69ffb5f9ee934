//! One-shot redirect receiver that completes the authorization-code flow locally.
//!
//! [`receive_authorization`] serves the redirect URI's path on the given listener, waits for
//! Fitbit to send the browser back with `code` and `state` (or `error`), exchanges the code
//! through the broker, shows a short HTML page, and shuts the listener down.

// crates.io
use axum::{
	Router,
	extract::{Query, State},
	response::Html,
	routing::get,
};
use tokio::{
	net::TcpListener,
	sync::{mpsc, oneshot},
};
// self
use crate::{
	_prelude::*,
	auth::TokenRecord,
	error::TransportError,
	flows::{AuthorizationSession, Broker},
	http::TokenHttpClient,
	oauth::TransportErrorMapper,
};

/// Query parameters Fitbit appends to the redirect URI.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct CallbackParams {
	/// Authorization code on success.
	pub code: Option<String>,
	/// State echoed back from the authorize request.
	pub state: Option<String>,
	/// OAuth error code when the user denied access or the request was invalid.
	pub error: Option<String>,
	/// Human-readable error detail.
	pub error_description: Option<String>,
}

struct Redirect {
	params: CallbackParams,
	reply: oneshot::Sender<Html<String>>,
}

/// Waits for the redirect on `listener`, then exchanges the code and persists the record.
pub async fn receive_authorization<C, M>(
	broker: &Broker<C, M>,
	session: AuthorizationSession,
	listener: TcpListener,
) -> Result<TokenRecord>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	let path = match session.redirect_uri.path() {
		"" => "/".to_owned(),
		path => path.to_owned(),
	};
	let (redirect_tx, mut redirect_rx) = mpsc::channel::<Redirect>(1);
	let (stop_tx, stop_rx) = oneshot::channel::<()>();
	let app = Router::new().route(&path, get(on_redirect)).with_state(redirect_tx);
	let server = tokio::spawn(async move {
		axum::serve(listener, app)
			.with_graceful_shutdown(async {
				let _ = stop_rx.await;
			})
			.await
	});

	tracing::info!(path = %path, "waiting for the authorization redirect");

	let Some(redirect) = redirect_rx.recv().await else {
		let err = match server.await {
			Ok(Err(e)) => TransportError::Io(e).into(),
			_ => Error::unexpected_response("callback server stopped before the redirect arrived"),
		};

		return Err(err);
	};
	let result = complete(broker, session, redirect.params).await;
	let page = match &result {
		Ok(record) => success_page(record),
		Err(e) => failure_page(&e.to_string()),
	};

	let _ = redirect.reply.send(page);
	let _ = stop_tx.send(());

	match server.await {
		Ok(Err(e)) => tracing::warn!(error = %e, "callback server stopped with an error"),
		Err(e) => tracing::warn!(error = %e, "callback server task failed"),
		Ok(Ok(())) => {},
	}

	result
}

async fn on_redirect(
	State(redirect_tx): State<mpsc::Sender<Redirect>>,
	Query(params): Query<CallbackParams>,
) -> Html<String> {
	let (reply, page) = oneshot::channel();

	if redirect_tx.send(Redirect { params, reply }).await.is_err() {
		return failure_page("This authorization attempt has already completed");
	}

	page.await.unwrap_or_else(|_| failure_page("Authorization was interrupted"))
}

async fn complete<C, M>(
	broker: &Broker<C, M>,
	session: AuthorizationSession,
	params: CallbackParams,
) -> Result<TokenRecord>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	if let Some(error) = params.error {
		let detail = params.error_description.unwrap_or_default();

		let reason = format!("authorization failed: {error} {detail}").trim_end().to_owned();

		return Err(Error::InvalidGrant { reason });
	}

	let code = params.code.ok_or_else(|| Error::invalid_argument("redirect is missing `code`"))?;
	let state = params.state.unwrap_or_default();

	broker.complete_authorization(session, &state, &code).await
}

fn success_page(record: &TokenRecord) -> Html<String> {
	Html(format!(
		"<!doctype html><title>Fitbit authorized</title>\
		 <h1>You are now authorized to access the Fitbit API.</h1>\
		 <p>User {} granted: {}.</p><h3>You can close this window.</h3>",
		escape(&record.user_id),
		escape(&record.scope.to_string())
	))
}

fn failure_page(message: &str) -> Html<String> {
	Html(format!(
		"<!doctype html><title>Fitbit authorization failed</title>\
		 <h1>ERROR: {}</h1><h3>You can close this window.</h3>",
		escape(message)
	))
}

fn escape(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());

	for c in raw.chars() {
		match c {
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'&' => out.push_str("&amp;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&#39;"),
			c => out.push(c),
		}
	}

	out
}

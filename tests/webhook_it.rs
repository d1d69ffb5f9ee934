// crates.io
use axum::{
	Router,
	body::Body,
	http::{Method, Request, StatusCode},
};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use ring::hmac;
use tokio::{net::TcpListener, sync::oneshot};
use tower::ServiceExt;
// self
use fitbit_link::{
	_preludet::*,
	api::CollectionType,
	server::{self, ChannelSink, MemorySink, SIGNATURE_HEADER, WebhookState},
};

const PATH: &str = "/fitbit-notifications";
const BATCH: &str = r#"[
	{"collectionType":"sleep","date":"2025-03-01","ownerId":"7QX9ZK","ownerType":"user","subscriptionId":"sub-1"},
	{"collectionType":"activities","date":"2025-03-01","ownerId":"7QX9ZK","ownerType":"user","subscriptionId":"sub-1"}
]"#;

async fn send(
	router: Router,
	method: Method,
	uri: &str,
	signature: Option<&str>,
	body: &str,
) -> StatusCode {
	let mut request = Request::builder().method(method).uri(uri);

	if let Some(signature) = signature {
		request = request.header(SIGNATURE_HEADER, signature);
	}

	let request = request
		.header("content-type", "application/json")
		.body(Body::from(body.to_owned()))
		.expect("Test request should build.");

	router.oneshot(request).await.expect("Router should answer.").status()
}

fn sign(secret: &str, body: &str) -> String {
	let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, format!("{secret}&").as_bytes());

	STANDARD.encode(hmac::sign(&key, body.as_bytes()).as_ref())
}

#[tokio::test]
async fn verification_accepts_only_the_configured_code() {
	let router = server::router(WebhookState::new("verify-me", Arc::new(MemorySink::default())));

	assert_eq!(
		send(router.clone(), Method::GET, &format!("{PATH}?verify=verify-me"), None, "").await,
		StatusCode::NO_CONTENT
	);
	assert_eq!(
		send(router.clone(), Method::GET, &format!("{PATH}?verify=wrong"), None, "").await,
		StatusCode::NOT_FOUND
	);
	assert_eq!(send(router, Method::GET, PATH, None, "").await, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn notification_batches_reach_the_sink() {
	let sink = MemorySink::default();
	let router = server::router(WebhookState::new("code", Arc::new(sink.clone())));

	assert_eq!(send(router.clone(), Method::POST, PATH, None, BATCH).await, StatusCode::NO_CONTENT);

	let received = sink.drain();

	assert_eq!(received.len(), 2);
	assert_eq!(received[0].collection_type, CollectionType::Sleep);
	assert_eq!(received[1].collection_type, CollectionType::Activities);
	assert_eq!(received[0].subscription_id.as_ref(), "sub-1");

	assert_eq!(
		send(router, Method::POST, PATH, None, "{\"not\":\"a batch\"}").await,
		StatusCode::BAD_REQUEST
	);
	assert!(sink.snapshot().is_empty());
}

#[tokio::test]
async fn unlisted_collections_do_not_fail_the_batch() {
	let sink = MemorySink::default();
	let router = server::router(WebhookState::new("code", Arc::new(sink.clone())));
	let batch = r#"[
		{"collectionType":"deleteUser","ownerId":"7QX9ZK","ownerType":"user","subscriptionId":"sub-1"},
		{"collectionType":"activities","date":"2025-03-01","ownerId":"7QX9ZK","ownerType":"user","subscriptionId":"sub-1"},
		{"collectionType":"sleep","ownerType":"user"}
	]"#;

	assert_eq!(send(router, Method::POST, PATH, None, batch).await, StatusCode::NO_CONTENT);

	let received = sink.drain();

	assert_eq!(received.len(), 2);
	assert_eq!(received[0].collection_type, CollectionType::Unknown);
	assert_eq!(received[1].collection_type, CollectionType::Activities);
}

#[tokio::test]
async fn signed_webhooks_reject_bad_signatures_with_not_found() {
	let sink = MemorySink::default();
	let state = WebhookState::new("code", Arc::new(sink.clone()))
		.with_path("/hooks/fitbit")
		.with_signing_secret("client-secret");
	let router = server::router(state);
	let good = sign("client-secret", BATCH);
	let bad = sign("someone-else", BATCH);

	assert_eq!(
		send(router.clone(), Method::POST, "/hooks/fitbit", Some(&bad), BATCH).await,
		StatusCode::NOT_FOUND
	);
	assert_eq!(
		send(router.clone(), Method::POST, "/hooks/fitbit", None, BATCH).await,
		StatusCode::NOT_FOUND
	);
	assert!(sink.snapshot().is_empty());
	assert_eq!(
		send(router.clone(), Method::POST, "/hooks/fitbit", Some(&good), BATCH).await,
		StatusCode::NO_CONTENT
	);
	assert_eq!(sink.snapshot().len(), 2);
	assert_eq!(send(router, Method::POST, PATH, Some(&good), BATCH).await, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unavailable_sinks_ask_fitbit_to_retry() {
	let (sink, receiver) = ChannelSink::bounded(1);

	drop(receiver);

	let router = server::router(WebhookState::new("code", Arc::new(sink)));

	assert_eq!(
		send(router, Method::POST, PATH, None, BATCH).await,
		StatusCode::SERVICE_UNAVAILABLE
	);
}

#[tokio::test]
async fn served_webhook_answers_over_tcp_and_shuts_down() {
	let (sink, mut batches) = ChannelSink::bounded(4);
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("Loopback bind should succeed.");
	let addr = listener.local_addr().expect("Bound listener should have an address.");
	let (stop_tx, stop_rx) = oneshot::channel::<()>();
	let server = tokio::spawn(server::serve_with_shutdown(
		listener,
		WebhookState::new("code", Arc::new(sink)),
		async {
			let _ = stop_rx.await;
		},
	));
	let http = ReqwestClient::new();
	let verify = http
		.get(format!("http://{addr}{PATH}?verify=code"))
		.send()
		.await
		.expect("Verification request should reach the server.");

	assert_eq!(verify.status().as_u16(), 204);

	let post = http
		.post(format!("http://{addr}{PATH}"))
		.header("content-type", "application/json")
		.body(BATCH)
		.send()
		.await
		.expect("Notification request should reach the server.");

	assert_eq!(post.status().as_u16(), 204);
	assert_eq!(batches.recv().await.expect("Batch should be forwarded.").len(), 2);

	let _ = stop_tx.send(());

	server
		.await
		.expect("Server task should not panic.")
		.expect("Server should shut down cleanly.");
}

//! Subscriber endpoint for Fitbit subscription notifications.
//!
//! Answers Fitbit's verification requests with `FITBIT_VERIFY_CODE` and logs every notification
//! batch it receives.

// std
use std::sync::Arc;
// crates.io
use clap::Parser;
use color_eyre::{
	Result,
	eyre::{WrapErr, eyre},
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
// self
use fitbit_link::{
	config::{CLIENT_SECRET, FitbitConfig},
	server::{self, ChannelSink, WebhookState},
};

#[derive(Debug, Parser)]
#[command(name = "fitbit-webhook", about = "Receive Fitbit subscription notifications")]
struct Args {
	/// Reject notifications whose `X-Fitbit-Signature` does not match the client secret.
	#[arg(long)]
	verify_signature: bool,
	/// Capacity of the notification queue between the server and the logger.
	#[arg(long, default_value_t = 64)]
	queue: usize,
	/// Enable debug logging.
	#[arg(long, short = 'v')]
	verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let args = Args::parse();

	init_tracing(args.verbose);

	let config = FitbitConfig::from_env().wrap_err("failed to load Fitbit configuration")?;
	let verify_code = config.require_verify_code()?;
	let (sink, mut batches) = ChannelSink::bounded(args.queue.max(1));
	let mut state =
		WebhookState::new(verify_code, Arc::new(sink)).with_path(config.webhook_path.clone());

	if args.verify_signature {
		let secret = config
			.client_secret
			.as_deref()
			.ok_or_else(|| eyre!("--verify-signature requires {CLIENT_SECRET}"))?;

		state = state.with_signing_secret(secret);
	}

	tokio::spawn(async move {
		while let Some(batch) = batches.recv().await {
			for notification in batch {
				tracing::info!(
					collection = %notification.collection_type,
					owner = %notification.owner_id,
					subscription = %notification.subscription_id,
					date = ?notification.date,
					"notification received"
				);
			}
		}
	});

	let listener = TcpListener::bind(config.webhook_addr)
		.await
		.wrap_err_with(|| format!("failed to bind {}", config.webhook_addr))?;

	server::serve(listener, state).await?;

	Ok(())
}

fn init_tracing(verbose: bool) {
	let fallback = if verbose { "fitbit_link=debug,info" } else { "info" };
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

	tracing_subscriber::fmt().with_env_filter(filter).init();
}

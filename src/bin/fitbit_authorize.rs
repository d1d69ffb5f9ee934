//! Interactive authorization helper.
//!
//! Prints the Fitbit consent URL, waits on the configured redirect URI for the browser to come
//! back, and stores the resulting tokens in the JSON token file.
//!
//! ```bash
//! FITBIT_CLIENT_ID=... cargo run --features cli --bin fitbit-authorize
//! ```

// std
use std::{net::SocketAddr, sync::Arc};
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
	auth::ScopeSet,
	config::FitbitConfig,
	flows::{AuthorizeHints, Prompt},
	server,
	store::BrokerStore,
};

#[derive(Debug, Parser)]
#[command(name = "fitbit-authorize", about = "Authorize this app against a Fitbit account")]
struct Args {
	/// Space-delimited scopes overriding `FITBIT_SCOPES`.
	#[arg(long)]
	scopes: Option<String>,
	/// Force the consent page even if the user granted access before.
	#[arg(long)]
	consent: bool,
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
	let scope = match &args.scopes {
		Some(raw) => raw.parse::<ScopeSet>().wrap_err("invalid --scopes")?,
		None => config.scope.clone(),
	};
	let store: Arc<dyn BrokerStore> = Arc::new(config.file_store()?);
	let broker = config.broker(store)?;
	let hints = match args.consent {
		true => AuthorizeHints::default().prompt(Prompt::Consent),
		false => AuthorizeHints::default(),
	};
	let session = broker.start_authorization_with_hints(scope, config.redirect_uri.clone(), hints)?;
	let addr = redirect_addr(&config)?;
	let listener =
		TcpListener::bind(addr).await.wrap_err_with(|| format!("failed to bind {addr}"))?;

	tracing::info!(%addr, "listening for the authorization redirect");
	println!("Open this URL in a browser to authorize access:\n\n{}\n", session.authorize_url);

	let record = server::receive_authorization(&broker, session, listener).await?;

	tracing::info!(user = %record.user_id, expires_at = %record.expires_at, "authorization complete");
	println!(
		"Authorized user {} (scopes: {}). Tokens saved to {}.",
		record.user_id,
		record.scope,
		config.token_path.display()
	);

	Ok(())
}

fn redirect_addr(config: &FitbitConfig) -> Result<SocketAddr> {
	config
		.redirect_uri
		.socket_addrs(|| None)
		.wrap_err("redirect URI does not resolve to a local address")?
		.into_iter()
		.next()
		.ok_or_else(|| eyre!("redirect URI {} has no usable address", config.redirect_uri))
}

fn init_tracing(verbose: bool) {
	let fallback = if verbose { "fitbit_link=debug,info" } else { "info" };
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

	tracing_subscriber::fmt().with_env_filter(filter).init();
}

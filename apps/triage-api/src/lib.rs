pub mod routes;
pub mod state;

use std::{net::SocketAddr, path::PathBuf, time::Duration};

use axum::http::HeaderValue;
use clap::Parser;
use color_eyre::eyre;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;
use triage_service::{PrescriptionScanner, run_scheduler};

#[derive(Debug, Parser)]
#[command(
	version = triage_cli::VERSION,
	rename_all = "kebab",
	styles = triage_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

/// Serves the feedback endpoint and, when enabled, runs the prescription scheduler alongside.
pub async fn run(args: Args) -> color_eyre::Result<()> {
	triage_cli::load_dotenv();

	let config = triage_config::load(&args.config)?;

	triage_cli::init_tracing(&config.service.log_level);

	let http_addr: SocketAddr = config.service.http_bind.parse()?;
	let cors = cors_layer(&config.service.allowed_origin)?;
	let scanner_enabled = config.scanner.enabled;
	let period = Duration::from_secs(config.scanner.interval_seconds);
	let state = AppState::new(config)?;
	let app = routes::router(state.clone()).layer(cors);
	let http_listener = TcpListener::bind(http_addr).await?;

	tracing::info!(%http_addr, "HTTP server listening.");

	let http_server = async {
		axum::serve(http_listener, app).await?;

		Ok::<_, eyre::Report>(())
	};

	if !scanner_enabled {
		tracing::info!("Prescription scanner disabled.");

		return http_server.await;
	}

	let scanner = PrescriptionScanner::from_config(state.service.clone());
	let scheduler = async {
		run_scheduler(scanner, period).await;

		Ok::<_, eyre::Report>(())
	};

	tokio::try_join!(http_server, scheduler)?;

	Ok(())
}

/// `*` allows any origin; anything else is the single allowed frontend origin.
pub fn cors_layer(allowed_origin: &str) -> color_eyre::Result<CorsLayer> {
	let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

	if allowed_origin.trim() == "*" {
		return Ok(layer.allow_origin(Any));
	}

	let origin = HeaderValue::from_str(allowed_origin.trim())
		.map_err(|err| eyre::eyre!("Invalid allowed_origin {allowed_origin:?}: {err}."))?;

	Ok(layer.allow_origin(origin))
}

use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;

use triage_service::{PrescriptionScanner, TriageService, run_scheduler};
use triage_store::StoreClient;

/// Standalone prescription scanner, for deployments that run it apart from the HTTP API.
#[derive(Debug, Parser)]
#[command(
	version = triage_cli::VERSION,
	rename_all = "kebab",
	styles = triage_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Run a single scan and exit instead of scanning on the configured interval.
	#[arg(long)]
	pub once: bool,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	triage_cli::load_dotenv();

	let config = triage_config::load(&args.config)?;

	triage_cli::init_tracing(&config.service.log_level);

	let period = Duration::from_secs(config.scanner.interval_seconds);
	let store = StoreClient::new(&config.store)?;
	let service = Arc::new(TriageService::new(config, Arc::new(store)));
	let mut scanner = PrescriptionScanner::from_config(service);

	if args.once {
		let report = scanner.tick().await;

		tracing::info!(?report, "Single prescription scan finished.");

		return Ok(());
	}

	run_scheduler(scanner, period).await;

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn once_flag_defaults_off() {
		let args = Args::try_parse_from(["triage-worker", "-c", "triage.toml"]).expect("args");

		assert_eq!(args.config, PathBuf::from("triage.toml"));
		assert!(!args.once);

		let args = Args::try_parse_from(["triage-worker", "--config", "triage.toml", "--once"])
			.expect("args");

		assert!(args.once);
	}
}

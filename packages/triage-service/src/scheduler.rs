use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};

use crate::PrescriptionScanner;

/// Runs the scanner every `period`, starting one period from now.
///
/// A tick always runs to completion before the next firing is awaited, so ticks never overlap.
pub async fn run_scheduler(mut scanner: PrescriptionScanner, period: Duration) {
	let mut interval = time::interval_at(Instant::now() + period, period);

	interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

	tracing::info!(period_seconds = period.as_secs(), "Prescription scheduler started.");

	loop {
		interval.tick().await;

		let report = scanner.tick().await;

		tracing::debug!(?report, "Scheduler tick completed.");
	}
}

use std::sync::Arc;

use time::OffsetDateTime;

use crate::{Error, Result, SeverityFlavor, TriageService, judgment::truncate_excerpt};
use triage_store::{
	PATIENT_FEEDBACK, PRESCRIPTION, ScanCursor,
	models::{FeedbackRecord, Prescription},
	timestamp::{self, DEFAULT_CURSOR_TIME},
};

/// Counters for one scanner tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
	pub fetched: usize,
	pub processed: usize,
	pub inserted: usize,
	pub skipped: usize,
}

/// Turns newly issued prescriptions into severity-flagged feedback rows.
///
/// Owns the scan cursor; only prescriptions issued strictly after it are processed, in
/// ascending issue order, and the cursor follows each processed record.
pub struct PrescriptionScanner {
	service: Arc<TriageService>,
	cursor: ScanCursor,
}
impl PrescriptionScanner {
	pub fn new(service: Arc<TriageService>, cursor: ScanCursor) -> Self {
		Self { service, cursor }
	}

	/// Builds a scanner whose cursor is loaded from the configured cursor path.
	pub fn from_config(service: Arc<TriageService>) -> Self {
		let cursor = ScanCursor::load(service.cfg.scanner.cursor_path.clone());

		Self { service, cursor }
	}

	pub fn cursor(&self) -> &ScanCursor {
		&self.cursor
	}

	/// Runs one scan. Errors end the tick early and are logged, never returned.
	pub async fn tick(&mut self) -> ScanReport {
		let mut report = ScanReport::default();

		match self.scan(&mut report).await {
			Ok(()) => tracing::info!(
				fetched = report.fetched,
				processed = report.processed,
				inserted = report.inserted,
				skipped = report.skipped,
				cursor = %self.cursor.as_string(),
				"Prescription scan finished."
			),
			Err(err) if prescriptions_unavailable(&err) => {
				tracing::info!(error = %err, "Prescription scan skipped. Record store unavailable.")
			},
			Err(err) => tracing::error!(
				error = %err,
				processed = report.processed,
				cursor = %self.cursor.as_string(),
				"Prescription scan aborted."
			),
		}

		report
	}

	async fn scan(&mut self, report: &mut ScanReport) -> Result<()> {
		let rows = self.service.store.fetch(PRESCRIPTION, &[]).await?;

		report.fetched = rows.len();

		let mut prescriptions = rows
			.into_iter()
			.map(|row| {
				let prescription: Prescription = serde_json::from_value(row).unwrap_or_default();
				let issued_at = prescription.issued_on().map(timestamp::parse_timestamp);

				(prescription, issued_at)
			})
			.collect::<Vec<_>>();

		prescriptions.sort_by_key(|(_, issued_at)| sort_key(issued_at.as_ref()));

		for (prescription, issued_at) in prescriptions {
			let issued_at = match issued_at {
				Some(Ok(ts)) => ts,
				Some(Err(err)) => {
					tracing::warn!(id = %prescription.id, error = %err, "Skipping prescription.");

					report.skipped += 1;

					continue;
				},
				None => {
					tracing::warn!(id = %prescription.id, "Skipping prescription without issue time.");

					report.skipped += 1;

					continue;
				},
			};

			if !self.cursor.admits(issued_at) {
				tracing::debug!(
					id = %prescription.id,
					cursor = %self.cursor.as_string(),
					"Prescription already scanned."
				);

				report.skipped += 1;

				continue;
			}
			if self.process_prescription(&prescription).await? {
				report.inserted += 1;
			}

			report.processed += 1;

			if let Err(err) = self.cursor.advance(issued_at) {
				tracing::error!(
					path = %self.cursor.path().display(),
					error = %err,
					"Failed to persist scan cursor."
				);
			}
		}

		Ok(())
	}

	/// Judges one prescription and records it when severe. Returns whether a row was written.
	pub async fn process_prescription(&self, prescription: &Prescription) -> Result<bool> {
		let text = prescription.body();

		if text.is_empty() {
			tracing::warn!(id = %prescription.id, "Prescription has no text.");
		}

		let is_severe = self.service.assess_severity(text, SeverityFlavor::Prescription).await;
		let mut summary = self.service.summarize(text).await;

		if summary_needs_fallback(text, &summary) {
			summary = truncate_excerpt(text);
		}

		if !is_severe {
			tracing::info!(
				id = %prescription.id,
				patient_id = %prescription.patient_id,
				"Prescription judged not severe."
			);

			return Ok(false);
		}

		let record = FeedbackRecord::from_prescription(
			prescription,
			summary,
			is_severe,
			timestamp::now_local(),
		);
		let row = serde_json::to_value(&record)?;

		self.service.store.insert(PATIENT_FEEDBACK, &row).await?;

		tracing::info!(
			id = %prescription.id,
			patient_id = %prescription.patient_id,
			"Recorded severe prescription."
		);

		Ok(true)
	}
}

/// True when the model had nothing to summarize and answered with a request for input.
fn summary_needs_fallback(text: &str, summary: &str) -> bool {
	let summary = summary.to_lowercase();

	text.is_empty() || summary.contains("please provide") || summary.contains("no text")
}

/// The tick could not even list prescriptions. Failures after that, such as a rejected insert,
/// abort the tick instead.
fn prescriptions_unavailable(err: &Error) -> bool {
	matches!(err, Error::StoreUnavailable { collection } if collection == PRESCRIPTION)
}

/// Rows whose issue time cannot be read sort as the default cursor.
fn sort_key(issued_at: Option<&triage_store::Result<OffsetDateTime>>) -> OffsetDateTime {
	match issued_at {
		Some(Ok(ts)) => *ts,
		_ => DEFAULT_CURSOR_TIME,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_text_always_falls_back() {
		assert!(summary_needs_fallback("", "A perfectly fine summary."));
	}

	#[test]
	fn placeholder_answers_fall_back() {
		assert!(summary_needs_fallback("x", "Please provide the text to summarize."));
		assert!(summary_needs_fallback("x", "There is NO TEXT to summarize."));
		assert!(!summary_needs_fallback("Take two tablets.", "Two tablets daily."));
	}

	#[test]
	fn only_a_failed_listing_counts_as_skipped() {
		let listing = Error::StoreUnavailable { collection: PRESCRIPTION.to_string() };
		let insert = Error::StoreUnavailable { collection: PATIENT_FEEDBACK.to_string() };

		assert!(prescriptions_unavailable(&listing));
		assert!(!prescriptions_unavailable(&insert));
		assert!(!prescriptions_unavailable(&Error::JudgmentUnavailable {
			message: "down".to_string(),
		}));
	}

	#[test]
	fn unreadable_issue_times_sort_as_default_cursor() {
		let malformed = timestamp::parse_timestamp("not a time");

		assert_eq!(sort_key(None), DEFAULT_CURSOR_TIME);
		assert_eq!(sort_key(Some(&malformed)), DEFAULT_CURSOR_TIME);
	}
}

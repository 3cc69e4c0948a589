use serde_json::json;
use time::OffsetDateTime;

use crate::TriageService;
use triage_store::timestamp;

impl TriageService {
	/// Alerts the care team about a severe case.
	///
	/// Posts to the configured notify URL. Without one, or when the post fails, the alert is
	/// emitted as an error-level `SEVERE` event so it still reaches the operator.
	pub async fn notify_severe_case(&self, patient_id: i64, summary: &str) {
		let Some(url) = self.cfg.notify.url.as_deref() else {
			tracing::error!(patient_id, summary, "SEVERE case reported. No notify target configured.");

			return;
		};
		let sent_at = OffsetDateTime::now_utc();
		let payload = json!({
			"patient_id": patient_id,
			"summary": summary,
			"timestamp": timestamp::format_utc(sent_at).unwrap_or_else(|_| sent_at.to_string()),
		});

		match self.providers.notify.notify(url, self.cfg.notify.timeout_ms, &payload).await {
			Ok(()) => tracing::info!(patient_id, "Severe case notification sent."),
			Err(err) => tracing::error!(
				patient_id,
				summary,
				error = %err,
				"SEVERE case reported. Notification delivery failed."
			),
		}
	}
}

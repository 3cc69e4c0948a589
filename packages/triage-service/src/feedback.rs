use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{FeedbackType, Result, SeverityFlavor, TriageService};
use triage_store::{
	MEDICAL_HISTORY, PATIENT_FEEDBACK,
	models::{FeedbackRecord, severity_flag},
	timestamp,
};

const SEVERE_RESPONSE: &str = "Immediate attention required. Your doctor will be notified.";
const ROUTINE_RESPONSE: &str =
	"There's no urgent concern at this time. Please keep track of how you're feeling.";

#[derive(Debug, Clone, Deserialize)]
pub struct FeedbackRequest {
	pub patient_id: i64,
	pub feedback: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackOutcome {
	pub is_severe: bool,
	pub feedback_type: FeedbackType,
	pub summary: String,
	/// Whether the feedback row reached the store. Never surfaced to the caller.
	pub persisted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackResponse {
	pub success: bool,
	#[serde(with = "severity_flag")]
	pub is_severe: bool,
	pub feedback_type: FeedbackType,
	pub summary: String,
	pub assistant_response: String,
}
impl From<FeedbackOutcome> for FeedbackResponse {
	fn from(outcome: FeedbackOutcome) -> Self {
		let assistant_response =
			if outcome.is_severe { SEVERE_RESPONSE } else { ROUTINE_RESPONSE }.to_string();

		Self {
			success: true,
			is_severe: outcome.is_severe,
			feedback_type: outcome.feedback_type,
			summary: outcome.summary,
			assistant_response,
		}
	}
}

/// Prior records of one patient, used to ground the severity judgment.
#[derive(Debug, Clone, Default)]
pub struct PatientHistory {
	pub feedback: Vec<Value>,
	pub medical_history: Vec<Value>,
}

impl TriageService {
	pub async fn submit_feedback(&self, req: FeedbackRequest) -> Result<FeedbackResponse> {
		let outcome = self.process_feedback(req.patient_id, &req.feedback).await?;

		Ok(outcome.into())
	}

	/// Summarizes, classifies, and triages one piece of feedback, then records it.
	///
	/// Store failures never fail the call: history degrades to the new feedback alone and a
	/// failed write is only logged. Severe cases are notified only once their row is recorded.
	pub async fn process_feedback(&self, patient_id: i64, text: &str) -> Result<FeedbackOutcome> {
		let context = self.compose_patient_context(patient_id, text).await;
		let summary = self.summarize(text).await;
		let feedback_type = self.classify(text).await;
		let is_severe = self.assess_severity(&context, SeverityFlavor::GeneralFeedback).await;
		let record = FeedbackRecord::from_feedback(
			patient_id,
			summary.clone(),
			is_severe,
			feedback_type,
			timestamp::now_local(),
		);
		let row = serde_json::to_value(&record)?;
		let persisted = match self.store.insert(PATIENT_FEEDBACK, &row).await {
			Ok(_) => {
				if is_severe {
					self.notify_severe_case(patient_id, &summary).await;
				}

				true
			},
			Err(err) => {
				tracing::error!(
					patient_id,
					is_severe,
					error = %err,
					"Failed to record patient feedback. No notification sent."
				);

				false
			},
		};

		tracing::info!(
			patient_id,
			is_severe,
			feedback_type = feedback_type.as_str(),
			persisted,
			"Processed patient feedback."
		);

		Ok(FeedbackOutcome { is_severe, feedback_type, summary, persisted })
	}

	/// Patient history plus the new feedback, or the new feedback alone when history is
	/// unavailable.
	pub async fn compose_patient_context(&self, patient_id: i64, text: &str) -> String {
		match self.fetch_patient_history(patient_id).await {
			Ok(history) => render_context(patient_id, &history, text),
			Err(err) => {
				tracing::warn!(patient_id, error = %err, "Patient history unavailable.");

				format!("New feedback:\n{text}")
			},
		}
	}

	pub async fn fetch_patient_history(&self, patient_id: i64) -> Result<PatientHistory> {
		let filter = [("patient_id", patient_id.to_string())];
		let feedback = self.store.fetch(PATIENT_FEEDBACK, &filter).await?;
		let medical_history = self.store.fetch(MEDICAL_HISTORY, &filter).await?;

		Ok(PatientHistory { feedback, medical_history })
	}
}

pub fn render_context(patient_id: i64, history: &PatientHistory, text: &str) -> String {
	let feedback = if history.feedback.is_empty() {
		"No feedback records.".to_string()
	} else {
		history
			.feedback
			.iter()
			.map(|row| format!("{}: {}", field(row, "datetime"), field(row, "feedback")))
			.collect::<Vec<_>>()
			.join("\n")
	};
	let medical_history = if history.medical_history.is_empty() {
		"No medical history.".to_string()
	} else {
		history
			.medical_history
			.iter()
			.map(|row| {
				format!(
					"{}: {} — Notes: {}",
					field(row, "last_updated"),
					field(row, "treatment_given"),
					field(row, "notes")
				)
			})
			.collect::<Vec<_>>()
			.join("\n")
	};

	format!(
		"Patient ID: {patient_id}\n\nHistorical feedback:\n{feedback}\n\nMedical history:\n{medical_history}\n\nNew feedback:\n{text}"
	)
}

fn field(row: &Value, key: &str) -> String {
	match row.get(key) {
		None | Some(Value::Null) => String::new(),
		Some(Value::String(value)) => value.clone(),
		Some(other) => other.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn renders_history_lines_and_placeholders() {
		let history = PatientHistory {
			feedback: vec![json!({ "datetime": "2025-01-01 08:00:00", "feedback": "Headache." })],
			medical_history: Vec::new(),
		};
		let context = render_context(7, &history, "Still dizzy");

		assert_eq!(
			context,
			"Patient ID: 7\n\nHistorical feedback:\n2025-01-01 08:00:00: Headache.\n\n\
			 Medical history:\nNo medical history.\n\nNew feedback:\nStill dizzy"
		);
	}

	#[test]
	fn missing_fields_render_empty() {
		let history = PatientHistory {
			feedback: Vec::new(),
			medical_history: vec![json!({ "treatment_given": "Ibuprofen", "notes": null })],
		};
		let context = render_context(7, &history, "ok");

		assert!(context.contains("Historical feedback:\nNo feedback records."));
		assert!(context.contains("Medical history:\n: Ibuprofen — Notes: \n"));
	}

	#[test]
	fn response_text_follows_severity() {
		let severe = FeedbackResponse::from(FeedbackOutcome {
			is_severe: true,
			feedback_type: FeedbackType::Symptom,
			summary: "Chest pain.".to_string(),
			persisted: false,
		});
		let value = serde_json::to_value(&severe).expect("serialize");

		assert_eq!(value["success"], true);
		assert_eq!(value["is_severe"], "true");
		assert_eq!(value["feedback_type"], "symptom");
		assert_eq!(value["assistant_response"], SEVERE_RESPONSE);

		let routine = FeedbackResponse::from(FeedbackOutcome {
			is_severe: false,
			feedback_type: FeedbackType::General,
			summary: String::new(),
			persisted: true,
		});

		assert_eq!(routine.assistant_response, ROUTINE_RESPONSE);
	}
}

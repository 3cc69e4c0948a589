use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::timestamp;

/// Fixed note carried by rows the prescription scanner writes.
pub const PRESCRIPTION_NOTE: &str = "Auto-scan and analyze prescription";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackType {
	#[serde(rename = "symptom")]
	Symptom,
	#[serde(rename = "treatment")]
	Treatment,
	#[serde(rename = "follow-up")]
	FollowUp,
	#[serde(rename = "general")]
	General,
	/// Marks rows derived from a scanned prescription rather than patient input.
	#[serde(rename = "prescription_update")]
	PrescriptionUpdate,
}
impl FeedbackType {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Symptom => "symptom",
			Self::Treatment => "treatment",
			Self::FollowUp => "follow-up",
			Self::General => "general",
			Self::PrescriptionUpdate => "prescription_update",
		}
	}
}

/// A row of the `prescription` collection. Only the fields the scanner reads are modelled and
/// every field is optional, since the store's schema is not ours.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Prescription {
	#[serde(default)]
	pub id: Value,
	#[serde(default)]
	pub patient_id: Value,
	#[serde(default)]
	pub text: Value,
	#[serde(default)]
	pub prescription: Value,
	#[serde(default)]
	pub notes: Value,
	#[serde(default)]
	pub issued_on: Value,
}
impl Prescription {
	pub fn issued_on(&self) -> Option<&str> {
		self.issued_on.as_str().filter(|raw| !raw.trim().is_empty())
	}

	/// First present and non-empty body among `text`, `prescription`, and `notes`, trimmed.
	pub fn body(&self) -> &str {
		[&self.text, &self.prescription, &self.notes]
			.into_iter()
			.filter_map(Value::as_str)
			.map(str::trim)
			.find(|body| !body.is_empty())
			.unwrap_or_default()
	}
}

/// A row appended to `patient_feedback`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<Value>,
	pub patient_id: Value,
	pub feedback: String,
	pub datetime: String,
	#[serde(with = "severity_flag")]
	pub is_severe: bool,
	pub feedback_type: FeedbackType,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub treatment: Option<String>,
}
impl FeedbackRecord {
	pub fn from_feedback(
		patient_id: i64,
		summary: String,
		is_severe: bool,
		feedback_type: FeedbackType,
		now: OffsetDateTime,
	) -> Self {
		Self {
			id: None,
			patient_id: Value::from(patient_id),
			feedback: summary,
			datetime: timestamp::record_datetime(now),
			is_severe,
			feedback_type,
			treatment: None,
		}
	}

	pub fn from_prescription(
		prescription: &Prescription,
		summary: String,
		is_severe: bool,
		now: OffsetDateTime,
	) -> Self {
		Self {
			id: Some(prescription.id.clone()),
			patient_id: prescription.patient_id.clone(),
			feedback: summary,
			datetime: timestamp::record_datetime(now),
			is_severe,
			feedback_type: FeedbackType::PrescriptionUpdate,
			treatment: Some(PRESCRIPTION_NOTE.to_string()),
		}
	}
}

/// The store keeps severity as the literal strings `"true"` and `"false"`.
pub mod severity_flag {
	use serde::{Deserialize, Deserializer, Serializer};

	pub fn as_str(value: bool) -> &'static str {
		if value { "true" } else { "false" }
	}

	pub fn serialize<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(as_str(*value))
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<bool, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = String::deserialize(deserializer)?;

		match raw.as_str() {
			"true" => Ok(true),
			"false" => Ok(false),
			other => Err(serde::de::Error::custom(format!("invalid severity flag {other:?}"))),
		}
	}
}

#[cfg(test)]
mod tests {
	use time::macros::datetime;

	use super::*;

	#[test]
	fn body_prefers_first_non_empty_field() {
		let prescription: Prescription = serde_json::from_value(serde_json::json!({
			"text": "   ",
			"prescription": null,
			"notes": "  take with food ",
		}))
		.expect("prescription");

		assert_eq!(prescription.body(), "take with food");
	}

	#[test]
	fn body_is_empty_when_no_field_is_present() {
		let prescription: Prescription =
			serde_json::from_value(serde_json::json!({ "id": 3 })).expect("prescription");

		assert_eq!(prescription.body(), "");
		assert_eq!(prescription.issued_on(), None);
	}

	#[test]
	fn prescription_record_wire_shape() {
		let prescription: Prescription = serde_json::from_value(serde_json::json!({
			"id": 1,
			"patient_id": 42,
			"notes": "severe chest pain",
			"issued_on": "2025-11-24T12:00:00Z",
		}))
		.expect("prescription");
		let record = FeedbackRecord::from_prescription(
			&prescription,
			"Chest pain.".to_string(),
			true,
			datetime!(2025-11-24 13:00:00 UTC),
		);

		assert_eq!(
			serde_json::to_value(&record).expect("serialize"),
			serde_json::json!({
				"id": 1,
				"patient_id": 42,
				"feedback": "Chest pain.",
				"datetime": "2025-11-24 13:00:00",
				"is_severe": "true",
				"feedback_type": "prescription_update",
				"treatment": "Auto-scan and analyze prescription",
			})
		);
	}

	#[test]
	fn feedback_record_omits_scanner_fields() {
		let record = FeedbackRecord::from_feedback(
			1,
			"Feeling dizzy.".to_string(),
			false,
			FeedbackType::FollowUp,
			datetime!(2025-11-24 13:00:00 UTC),
		);
		let value = serde_json::to_value(&record).expect("serialize");

		assert_eq!(value["is_severe"], "false");
		assert_eq!(value["feedback_type"], "follow-up");
		assert!(value.get("id").is_none());
		assert!(value.get("treatment").is_none());
	}
}

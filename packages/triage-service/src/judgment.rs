use regex::Regex;
use serde_json::Value;

use crate::{Error, FeedbackType, Result, TriageService};
use triage_providers::chat::{system_message, user_message};

/// Longest excerpt, in characters, kept when a summary falls back to the raw text.
pub const EXCERPT_CHARS: usize = 200;

const PATIENT_ID_PATTERN: &str = r"(?i)\b(?:my\s*)?(?:patient\s*id|id)\s*(?:is|:)?\s*\d+\b";
const SUMMARIZE_SYSTEM_PROMPT: &str = "\
You are a biomedical summarization assistant used in a clinical setting by doctors and patients.
Summarize patient feedback strictly and only from the original text.

Rules:
- Do not add any information that is not present in the original text.
- Do not infer diagnosis, medical causes, severity, or prognosis.
- Do not reinterpret symptoms beyond what the patient explicitly said.
- Keep the wording factual, neutral, and free of assumptions.
- Only condense, paraphrase, or organize the provided content.
- If the input is vague, the summary must remain equally vague.";

/// Which prompt the severity assessment uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeverityFlavor {
	/// Patient feedback, judged together with the patient's history.
	GeneralFeedback,
	/// Prescription text, judged for dosage, contraindication, and acute-symptom risk.
	Prescription,
}

impl TriageService {
	/// One-sentence summary, or the cleaned and truncated text when the model cannot help.
	pub async fn summarize(&self, text: &str) -> String {
		match self.request_summary(text).await {
			Ok(summary) => summary,
			Err(err) => {
				self.log_fallback("summarize", &err);

				truncate_excerpt(&strip_patient_ids(text))
			},
		}
	}

	pub async fn classify(&self, text: &str) -> FeedbackType {
		match self.request_category(text).await {
			Ok(category) => category,
			Err(err) => {
				self.log_fallback("classify", &err);

				FeedbackType::General
			},
		}
	}

	/// Falls back to "not severe" whenever no judgment is available.
	pub async fn assess_severity(&self, text: &str, flavor: SeverityFlavor) -> bool {
		match self.request_severity(text, flavor).await {
			Ok(is_severe) => is_severe,
			Err(err) => {
				self.log_fallback("assess_severity", &err);

				false
			},
		}
	}

	pub async fn request_summary(&self, text: &str) -> Result<String> {
		let prompt = format!("Summarize the following feedback in one sentence: {text}");

		self.ask(vec![system_message(SUMMARIZE_SYSTEM_PROMPT), user_message(&prompt)]).await
	}

	pub async fn request_category(&self, text: &str) -> Result<FeedbackType> {
		let prompt = format!(
			"Classify this feedback into one of: symptom, treatment, follow-up. \
			 Only return the category name. Feedback: {text}"
		);
		let answer = self.ask(vec![user_message(&prompt)]).await?;

		Ok(parse_category(&answer))
	}

	pub async fn request_severity(&self, text: &str, flavor: SeverityFlavor) -> Result<bool> {
		let answer = self.ask(vec![user_message(&severity_prompt(text, flavor))]).await?;

		tracing::debug!(?flavor, raw = %answer, "Severity judgment received.");

		parse_severity(&answer)
	}

	async fn ask(&self, messages: Vec<Value>) -> Result<String> {
		let Some(cfg) = self.cfg.providers.llm.as_ref() else {
			return Err(Error::JudgmentUnavailable {
				message: "No language model is configured.".to_string(),
			});
		};

		Ok(self.providers.completion.complete(cfg, &messages).await?)
	}

	fn log_fallback(&self, operation: &'static str, err: &Error) {
		if self.cfg.providers.llm.is_none() {
			tracing::debug!(operation, "No language model configured. Using fallback.");
		} else {
			tracing::warn!(operation, error = %err, "Judgment unavailable. Using fallback.");
		}
	}
}

/// Removes phrases like "my id is 12" or "patient ID: 12" and trims the result.
pub fn strip_patient_ids(text: &str) -> String {
	match Regex::new(PATIENT_ID_PATTERN) {
		Ok(re) => re.replace_all(text, "").trim().to_string(),
		Err(_) => text.trim().to_string(),
	}
}

pub fn truncate_excerpt(text: &str) -> String {
	if text.chars().count() <= EXCERPT_CHARS {
		return text.to_string();
	}

	let mut excerpt: String = text.chars().take(EXCERPT_CHARS).collect();

	excerpt.push_str("...");

	excerpt
}

fn severity_prompt(text: &str, flavor: SeverityFlavor) -> String {
	match flavor {
		SeverityFlavor::GeneralFeedback => format!(
			"You are a clinical triage assistant. Given the following context, respond with a \
			 single JSON object containing only the field 'is_severe' with value 'true' or \
			 'false'.\n\nContext:\n{text}"
		),
		SeverityFlavor::Prescription => format!(
			"You are a clinical triage assistant assessing prescription-related risk. Given the \
			 prescription text, respond with a single JSON object {{\"is_severe\": \
			 \"true\"|\"false\"}} where 'true' indicates an urgent safety concern (e.g., \
			 dangerous doses, contraindications, acute adverse symptoms).\n\nPrescription:\n{text}"
		),
	}
}

fn parse_category(answer: &str) -> FeedbackType {
	match answer.trim().to_lowercase().as_str() {
		"symptom" => FeedbackType::Symptom,
		"treatment" => FeedbackType::Treatment,
		"follow-up" => FeedbackType::FollowUp,
		_ => FeedbackType::General,
	}
}

fn parse_severity(answer: &str) -> Result<bool> {
	let parsed = serde_json::from_str::<Value>(answer.trim()).ok().or_else(|| {
		embedded_object(answer).and_then(|object| serde_json::from_str::<Value>(object).ok())
	});
	let Some(value) = parsed else {
		return Err(Error::JudgmentUnavailable {
			message: "Severity answer contains no JSON object.".to_string(),
		});
	};

	match value.get("is_severe") {
		Some(Value::String(flag)) => Ok(flag.trim().eq_ignore_ascii_case("true")),
		Some(Value::Bool(flag)) => Ok(*flag),
		_ => Err(Error::JudgmentUnavailable {
			message: "Severity answer has no is_severe field.".to_string(),
		}),
	}
}

/// Substring from the first `{` to the last `}`, if any.
fn embedded_object(answer: &str) -> Option<&str> {
	let start = answer.find('{')?;
	let end = answer.rfind('}')?;

	(end > start).then(|| &answer[start..=end])
}

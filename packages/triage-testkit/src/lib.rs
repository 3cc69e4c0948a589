//! In-memory doubles for the record store, the chat model, and the notification target.

use std::{
	collections::{HashMap, HashSet},
	path::Path,
	sync::{Arc, Mutex, MutexGuard},
};

use serde_json::{Value, json};

use triage_config::{Config, LlmProviderConfig, Notify, Providers, Scanner, Service, Store};
use triage_service::{
	BoxFuture, CompletionProvider, NotifyProvider, Providers as ServiceProviders, RecordStore,
	TriageService,
};

/// Record store backed by in-memory tables.
///
/// Inserted rows are appended to their table and to an ordered write log. Collections marked
/// as failing reject every fetch and insert with `StoreUnavailable`.
#[derive(Default)]
pub struct MemoryStore {
	tables: Mutex<HashMap<String, Vec<Value>>>,
	writes: Mutex<Vec<(String, Value)>>,
	failing: Mutex<HashSet<String>>,
}
impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_rows(self, collection: &str, rows: Vec<Value>) -> Self {
		self.seed(collection, rows);

		self
	}

	pub fn seed(&self, collection: &str, rows: Vec<Value>) {
		lock(&self.tables).entry(collection.to_string()).or_default().extend(rows);
	}

	pub fn fail(&self, collection: &str) {
		lock(&self.failing).insert(collection.to_string());
	}

	pub fn recover(&self, collection: &str) {
		lock(&self.failing).remove(collection);
	}

	pub fn rows(&self, collection: &str) -> Vec<Value> {
		lock(&self.tables).get(collection).cloned().unwrap_or_default()
	}

	/// Rows written through `insert`, in write order.
	pub fn writes(&self, collection: &str) -> Vec<Value> {
		lock(&self.writes)
			.iter()
			.filter(|(target, _)| target == collection)
			.map(|(_, row)| row.clone())
			.collect()
	}

	fn check(&self, collection: &str) -> triage_store::Result<()> {
		if lock(&self.failing).contains(collection) {
			return Err(triage_store::Error::StoreUnavailable { collection: collection.to_string() });
		}

		Ok(())
	}
}

impl RecordStore for MemoryStore {
	fn fetch<'a>(
		&'a self,
		collection: &'a str,
		filter: &'a [(&'a str, String)],
	) -> BoxFuture<'a, triage_store::Result<Vec<Value>>> {
		Box::pin(async move {
			self.check(collection)?;

			Ok(self
				.rows(collection)
				.into_iter()
				.filter(|row| filter.iter().all(|(key, value)| field_matches(row, key, value)))
				.collect())
		})
	}

	fn insert<'a>(
		&'a self,
		collection: &'a str,
		row: &'a Value,
	) -> BoxFuture<'a, triage_store::Result<Value>> {
		Box::pin(async move {
			self.check(collection)?;

			lock(&self.tables).entry(collection.to_string()).or_default().push(row.clone());
			lock(&self.writes).push((collection.to_string(), row.clone()));

			Ok(json!({ "data": [row] }))
		})
	}
}

/// Chat model answering each judgment with a fixed reply.
///
/// Requests are routed by the prompt they carry; a judgment without a scripted reply fails as an
/// invalid response.
#[derive(Default)]
pub struct ScriptedCompletion {
	summary: Option<String>,
	category: Option<String>,
	severity: Option<String>,
	prompts: Mutex<Vec<String>>,
}
impl ScriptedCompletion {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn summary(mut self, answer: impl Into<String>) -> Self {
		self.summary = Some(answer.into());

		self
	}

	pub fn category(mut self, answer: impl Into<String>) -> Self {
		self.category = Some(answer.into());

		self
	}

	pub fn severity(self, is_severe: bool) -> Self {
		self.severity_answer(json!({ "is_severe": is_severe.to_string() }).to_string())
	}

	pub fn severity_answer(mut self, answer: impl Into<String>) -> Self {
		self.severity = Some(answer.into());

		self
	}

	/// User prompts received so far, in call order.
	pub fn prompts(&self) -> Vec<String> {
		lock(&self.prompts).clone()
	}

	fn answer(&self, prompt: &str) -> Option<String> {
		if prompt.starts_with("Summarize") {
			self.summary.clone()
		} else if prompt.starts_with("Classify") {
			self.category.clone()
		} else if prompt.contains("is_severe") {
			self.severity.clone()
		} else {
			None
		}
	}
}

impl CompletionProvider for ScriptedCompletion {
	fn complete<'a>(
		&'a self,
		_: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, triage_providers::Result<String>> {
		Box::pin(async move {
			let prompt = messages
				.iter()
				.rev()
				.find(|message| message["role"] == "user")
				.and_then(|message| message["content"].as_str())
				.unwrap_or_default()
				.to_string();
			let answer = self.answer(&prompt);

			lock(&self.prompts).push(prompt);

			answer.ok_or_else(|| triage_providers::Error::InvalidResponse {
				message: "No scripted answer for this prompt.".to_string(),
			})
		})
	}
}

/// Notification target that records payloads, optionally failing every delivery.
#[derive(Default)]
pub struct RecordingNotifier {
	sent: Mutex<Vec<(String, Value)>>,
	fail: bool,
}
impl RecordingNotifier {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn failing() -> Self {
		Self { fail: true, ..Self::default() }
	}

	/// Every attempted delivery, including failed ones.
	pub fn sent(&self) -> Vec<(String, Value)> {
		lock(&self.sent).clone()
	}
}

impl NotifyProvider for RecordingNotifier {
	fn notify<'a>(
		&'a self,
		url: &'a str,
		_: u64,
		payload: &'a Value,
	) -> BoxFuture<'a, triage_providers::Result<()>> {
		Box::pin(async move {
			lock(&self.sent).push((url.to_string(), payload.clone()));

			if self.fail {
				return Err(triage_providers::Error::InvalidResponse {
					message: "Notification target rejected the payload.".to_string(),
				});
			}

			Ok(())
		})
	}
}

/// Configuration pointing at nothing real, with a model configured and the cursor at `cursor_path`.
pub fn test_config(cursor_path: &Path) -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			log_level: "debug".to_string(),
			allowed_origin: "*".to_string(),
		},
		store: Store { api_base: "http://127.0.0.1:9/table/".to_string(), timeout_ms: 1_000 },
		providers: Providers { llm: Some(LlmProviderConfig::openai("sk-test")) },
		notify: Notify::default(),
		scanner: Scanner {
			enabled: false,
			interval_seconds: 30,
			cursor_path: cursor_path.to_path_buf(),
		},
	}
}

pub fn test_config_without_model(cursor_path: &Path) -> Config {
	let mut cfg = test_config(cursor_path);

	cfg.providers.llm = None;

	cfg
}

/// Wires a service over the given doubles.
pub fn service(
	cfg: Config,
	store: Arc<MemoryStore>,
	completion: Arc<ScriptedCompletion>,
	notifier: Arc<RecordingNotifier>,
) -> Arc<TriageService> {
	Arc::new(TriageService::with_providers(
		cfg,
		store,
		ServiceProviders::new(completion, notifier),
	))
}

fn field_matches(row: &Value, key: &str, expected: &str) -> bool {
	match row.get(key) {
		Some(Value::String(value)) => value == expected,
		Some(Value::Null) | None => false,
		Some(other) => other.to_string() == expected,
	}
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
	mutex.lock().unwrap_or_else(|err| err.into_inner())
}

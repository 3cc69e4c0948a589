use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub store: Store,
	#[serde(default)]
	pub providers: Providers,
	#[serde(default)]
	pub notify: Notify,
	#[serde(default)]
	pub scanner: Scanner,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
	/// Origin allowed by the CORS layer. `*` allows any origin.
	#[serde(default = "default_allowed_origin")]
	pub allowed_origin: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Store {
	/// Base URL of the record-store table API, e.g. `https://records.example/table/`.
	pub api_base: String,
	#[serde(default = "default_store_timeout_ms")]
	pub timeout_ms: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Providers {
	/// Chat-completion model. `None` means no model is configured and every judgment falls back.
	pub llm: Option<LlmProviderConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}
impl LlmProviderConfig {
	pub fn openai(api_key: impl Into<String>) -> Self {
		Self {
			provider_id: "openai".to_string(),
			api_base: "https://api.openai.com".to_string(),
			api_key: api_key.into(),
			path: "/v1/chat/completions".to_string(),
			model: "gpt-4o-mini".to_string(),
			temperature: 0.0,
			timeout_ms: 30_000,
			default_headers: Map::new(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Notify {
	/// Optional endpoint receiving severe-case notifications.
	pub url: Option<String>,
	#[serde(default = "default_notify_timeout_ms")]
	pub timeout_ms: u64,
}
impl Default for Notify {
	fn default() -> Self {
		Self { url: None, timeout_ms: default_notify_timeout_ms() }
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scanner {
	#[serde(default = "default_scanner_enabled")]
	pub enabled: bool,
	#[serde(default = "default_interval_seconds")]
	pub interval_seconds: u64,
	#[serde(default = "default_cursor_path")]
	pub cursor_path: PathBuf,
}
impl Default for Scanner {
	fn default() -> Self {
		Self {
			enabled: default_scanner_enabled(),
			interval_seconds: default_interval_seconds(),
			cursor_path: default_cursor_path(),
		}
	}
}

fn default_allowed_origin() -> String {
	"*".to_string()
}

fn default_store_timeout_ms() -> u64 {
	15_000
}

fn default_notify_timeout_ms() -> u64 {
	10_000
}

fn default_scanner_enabled() -> bool {
	true
}

fn default_interval_seconds() -> u64 {
	30
}

fn default_cursor_path() -> PathBuf {
	PathBuf::from(".last_prescription_scan")
}

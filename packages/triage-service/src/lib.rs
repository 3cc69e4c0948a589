pub mod feedback;
pub mod judgment;
pub mod notify;
pub mod scan;
pub mod scheduler;

mod error;

pub use error::{Error, Result};
pub use feedback::{FeedbackOutcome, FeedbackRequest, FeedbackResponse};
pub use judgment::SeverityFlavor;
pub use scan::{PrescriptionScanner, ScanReport};
pub use scheduler::run_scheduler;
pub use triage_store::models::FeedbackType;

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;

use triage_config::{Config, LlmProviderConfig};
use triage_providers::{chat, notify as notify_provider};
use triage_store::StoreClient;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Row-level access to the external record store.
pub trait RecordStore
where
	Self: Send + Sync,
{
	fn fetch<'a>(
		&'a self,
		collection: &'a str,
		filter: &'a [(&'a str, String)],
	) -> BoxFuture<'a, triage_store::Result<Vec<Value>>>;

	fn insert<'a>(
		&'a self,
		collection: &'a str,
		row: &'a Value,
	) -> BoxFuture<'a, triage_store::Result<Value>>;
}

pub trait CompletionProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, triage_providers::Result<String>>;
}

pub trait NotifyProvider
where
	Self: Send + Sync,
{
	fn notify<'a>(
		&'a self,
		url: &'a str,
		timeout_ms: u64,
		payload: &'a Value,
	) -> BoxFuture<'a, triage_providers::Result<()>>;
}

#[derive(Clone)]
pub struct Providers {
	pub completion: Arc<dyn CompletionProvider>,
	pub notify: Arc<dyn NotifyProvider>,
}
impl Providers {
	pub fn new(completion: Arc<dyn CompletionProvider>, notify: Arc<dyn NotifyProvider>) -> Self {
		Self { completion, notify }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { completion: provider.clone(), notify: provider }
	}
}

/// Shared analysis pipeline used by both the HTTP endpoint and the prescription scanner.
pub struct TriageService {
	pub cfg: Config,
	pub store: Arc<dyn RecordStore>,
	pub providers: Providers,
}
impl TriageService {
	pub fn new(cfg: Config, store: Arc<dyn RecordStore>) -> Self {
		Self { cfg, store, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, store: Arc<dyn RecordStore>, providers: Providers) -> Self {
		Self { cfg, store, providers }
	}
}

struct DefaultProviders;

impl CompletionProvider for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, triage_providers::Result<String>> {
		Box::pin(chat::complete(cfg, messages))
	}
}

impl NotifyProvider for DefaultProviders {
	fn notify<'a>(
		&'a self,
		url: &'a str,
		timeout_ms: u64,
		payload: &'a Value,
	) -> BoxFuture<'a, triage_providers::Result<()>> {
		Box::pin(notify_provider::post(url, timeout_ms, payload))
	}
}

impl RecordStore for StoreClient {
	fn fetch<'a>(
		&'a self,
		collection: &'a str,
		filter: &'a [(&'a str, String)],
	) -> BoxFuture<'a, triage_store::Result<Vec<Value>>> {
		Box::pin(StoreClient::fetch(self, collection, filter))
	}

	fn insert<'a>(
		&'a self,
		collection: &'a str,
		row: &'a Value,
	) -> BoxFuture<'a, triage_store::Result<Value>> {
		Box::pin(StoreClient::insert(self, collection, row))
	}
}

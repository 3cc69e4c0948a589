use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

/// HTTP client for the record-store table API.
///
/// Every failure while talking to a collection collapses into [`Error::StoreUnavailable`]. No
/// retry happens here; callers decide whether to degrade or give up.
#[derive(Clone, Debug)]
pub struct StoreClient {
	client: Client,
	base_url: String,
}
impl StoreClient {
	pub fn new(cfg: &triage_config::Store) -> Result<Self> {
		let client = Client::builder()
			.timeout(Duration::from_millis(cfg.timeout_ms))
			.build()
			.map_err(|err| Error::InvalidConfig {
				message: format!("Failed to build record store client: {err}."),
			})?;

		Ok(Self { client, base_url: cfg.api_base.trim_end_matches('/').to_string() })
	}

	pub fn collection_url(&self, collection: &str) -> String {
		format!("{}/{collection}", self.base_url)
	}

	/// Fetches every row of `collection`, narrowed by `filter` query parameters.
	pub async fn fetch(&self, collection: &str, filter: &[(&str, String)]) -> Result<Vec<Value>> {
		let body = self
			.get_json(&self.collection_url(collection), filter)
			.await
			.map_err(|err| unavailable(collection, "fetch", err))?;

		Ok(rows_from_body(body))
	}

	/// Appends one row to `collection` and returns the store's acknowledgement.
	pub async fn insert(&self, collection: &str, row: &Value) -> Result<Value> {
		self.post_json(&self.collection_url(collection), row)
			.await
			.map_err(|err| unavailable(collection, "insert", err))
	}

	async fn get_json(&self, url: &str, filter: &[(&str, String)]) -> reqwest::Result<Value> {
		let res = self.client.get(url).query(filter).send().await?;

		res.error_for_status()?.json().await
	}

	async fn post_json(&self, url: &str, row: &Value) -> reqwest::Result<Value> {
		let res = self.client.post(url).json(row).send().await?;

		res.error_for_status()?.json().await
	}
}

fn unavailable(collection: &str, operation: &str, err: reqwest::Error) -> Error {
	tracing::error!(collection, operation, error = %err, "Record store request failed.");

	Error::StoreUnavailable { collection: collection.to_string() }
}

fn rows_from_body(body: Value) -> Vec<Value> {
	match body {
		Value::Object(mut map) => match map.remove("data") {
			Some(Value::Array(rows)) => rows,
			_ => Vec::new(),
		},
		_ => Vec::new(),
	}
}

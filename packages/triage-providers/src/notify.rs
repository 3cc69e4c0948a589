use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::Result;

/// Posts a JSON notification and fails on transport errors or non-2xx statuses.
pub async fn post(url: &str, timeout_ms: u64, payload: &Value) -> Result<()> {
	let client = Client::builder().timeout(Duration::from_millis(timeout_ms)).build()?;

	client.post(url).json(payload).send().await?.error_for_status()?;

	Ok(())
}

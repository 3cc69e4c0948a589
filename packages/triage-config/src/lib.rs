mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, LlmProviderConfig, Notify, Providers, Scanner, Service, Store};

use std::{env, fs, path::Path};

pub const ENV_API_BASE_URL: &str = "API_BASE_URL";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_FRONTEND_ORIGIN: &str = "FRONTEND_ORIGIN";
pub const ENV_NOTIFY_URL: &str = "NOTIFY_URL";

pub fn load(path: &Path) -> Result<Config> {
	load_with_env(path, |key| env::var(key).ok())
}

/// Same as [`load`], with environment lookups going through `lookup`.
pub fn load_with_env<F>(path: &Path, lookup: F) -> Result<Config>
where
	F: Fn(&str) -> Option<String>,
{
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	apply_env_overrides(&mut cfg, lookup);

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn apply_env_overrides<F>(cfg: &mut Config, lookup: F)
where
	F: Fn(&str) -> Option<String>,
{
	if let Some(api_base) = lookup(ENV_API_BASE_URL) {
		cfg.store.api_base = api_base;
	}
	if let Some(api_key) = lookup(ENV_OPENAI_API_KEY) {
		match cfg.providers.llm.as_mut() {
			Some(llm) => llm.api_key = api_key,
			None => cfg.providers.llm = Some(LlmProviderConfig::openai(api_key)),
		}
	}
	if let Some(origin) = lookup(ENV_FRONTEND_ORIGIN) {
		cfg.service.allowed_origin = origin;
	}
	if let Some(url) = lookup(ENV_NOTIFY_URL) {
		cfg.notify.url = Some(url);
	}
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.service.allowed_origin.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.allowed_origin must be non-empty.".to_string(),
		});
	}

	let api_base = cfg.store.api_base.trim();

	if api_base.is_empty() {
		return Err(Error::Validation { message: "store.api_base must be non-empty.".to_string() });
	}
	if !(api_base.starts_with("http://") || api_base.starts_with("https://")) {
		return Err(Error::Validation {
			message: "store.api_base must be an http or https URL.".to_string(),
		});
	}
	if cfg.store.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "store.timeout_ms must be greater than zero.".to_string(),
		});
	}

	if let Some(llm) = cfg.providers.llm.as_ref() {
		for (label, value) in [
			("providers.llm.api_base", &llm.api_base),
			("providers.llm.path", &llm.path),
			("providers.llm.model", &llm.model),
		] {
			if value.trim().is_empty() {
				return Err(Error::Validation { message: format!("{label} must be non-empty.") });
			}
		}

		if !llm.temperature.is_finite() {
			return Err(Error::Validation {
				message: "providers.llm.temperature must be a finite number.".to_string(),
			});
		}
		if llm.timeout_ms == 0 {
			return Err(Error::Validation {
				message: "providers.llm.timeout_ms must be greater than zero.".to_string(),
			});
		}
	}

	if cfg.notify.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "notify.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.scanner.interval_seconds == 0 {
		return Err(Error::Validation {
			message: "scanner.interval_seconds must be greater than zero.".to_string(),
		});
	}
	if cfg.scanner.cursor_path.as_os_str().is_empty() {
		return Err(Error::Validation {
			message: "scanner.cursor_path must be non-empty.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	// A blank key means the model is not configured; judgments fall back without calling it.
	if cfg.providers.llm.as_ref().map(|llm| llm.api_key.trim().is_empty()).unwrap_or(false) {
		cfg.providers.llm = None;
	}
	if cfg.notify.url.as_deref().map(|url| url.trim().is_empty()).unwrap_or(false) {
		cfg.notify.url = None;
	}
}

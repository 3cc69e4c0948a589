use std::{
	fs,
	path::{Path, PathBuf},
};

use time::OffsetDateTime;

use crate::{
	Result, durable,
	timestamp::{self, DEFAULT_CURSOR_TIME},
};

/// Durable watermark: the issue time of the newest prescription already processed.
///
/// Only records issued strictly after the watermark are eligible, and the watermark never moves
/// backwards.
#[derive(Debug, Clone)]
pub struct ScanCursor {
	path: PathBuf,
	value: OffsetDateTime,
}
impl ScanCursor {
	/// Reads the persisted watermark, falling back to the default when the file is missing,
	/// unreadable, empty, or corrupt.
	pub fn load(path: impl Into<PathBuf>) -> Self {
		let path = path.into();
		let value = read_value(&path).unwrap_or(DEFAULT_CURSOR_TIME);

		tracing::info!(path = %path.display(), cursor = %display(value), "Loaded scan cursor.");

		Self { path, value }
	}

	pub fn with_value(path: impl Into<PathBuf>, value: OffsetDateTime) -> Self {
		Self { path: path.into(), value }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn value(&self) -> OffsetDateTime {
		self.value
	}

	/// The watermark in its persisted form.
	pub fn as_string(&self) -> String {
		display(self.value)
	}

	pub fn admits(&self, issued_at: OffsetDateTime) -> bool {
		issued_at > self.value
	}

	/// Moves the watermark to `issued_at` and persists it.
	///
	/// The in-memory value moves even when persisting fails, so the current run does not revisit
	/// the record; the next successful advance rewrites the file.
	pub fn advance(&mut self, issued_at: OffsetDateTime) -> Result<()> {
		if issued_at < self.value {
			return Ok(());
		}

		self.value = issued_at;

		let rendered = timestamp::format_utc(issued_at)?;

		durable::write_replace(&self.path, rendered.as_bytes())
	}
}

fn read_value(path: &Path) -> Option<OffsetDateTime> {
	let raw = match fs::read_to_string(path) {
		Ok(raw) => raw,
		Err(err) => {
			tracing::debug!(path = %path.display(), error = %err, "Scan cursor file not readable.");

			return None;
		},
	};

	if raw.trim().is_empty() {
		return None;
	}

	match timestamp::parse_timestamp(&raw) {
		Ok(value) => Some(value),
		Err(err) => {
			tracing::warn!(path = %path.display(), error = %err, "Scan cursor file is corrupt.");

			None
		},
	}
}

fn display(value: OffsetDateTime) -> String {
	timestamp::format_utc(value).unwrap_or_else(|_| value.to_string())
}

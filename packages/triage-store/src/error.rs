use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// Transport failure, non-2xx status, or unparsable body. Never distinguished further.
	#[error("Record store collection {collection} is unavailable.")]
	StoreUnavailable { collection: String },
	#[error("Malformed timestamp {value:?}.")]
	MalformedTimestamp { value: String },
	#[error("Failed to persist {path:?}.")]
	Persist { path: PathBuf, source: std::io::Error },
	#[error("{message}")]
	InvalidConfig { message: String },
}

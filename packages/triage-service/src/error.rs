pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Record store collection {collection} is unavailable.")]
	StoreUnavailable { collection: String },
	#[error("Judgment unavailable: {message}")]
	JudgmentUnavailable { message: String },
	/// Any other record-store failure, kept as reported.
	#[error(transparent)]
	Store(triage_store::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
}
impl From<triage_store::Error> for Error {
	fn from(err: triage_store::Error) -> Self {
		match err {
			triage_store::Error::StoreUnavailable { collection } =>
				Self::StoreUnavailable { collection },
			err => Self::Store(err),
		}
	}
}

impl From<triage_providers::Error> for Error {
	fn from(err: triage_providers::Error) -> Self {
		Self::JudgmentUnavailable { message: err.to_string() }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn unavailable_collections_stay_distinct() {
		let err = Error::from(triage_store::Error::StoreUnavailable {
			collection: "prescription".to_string(),
		});

		assert!(matches!(err, Error::StoreUnavailable { collection } if collection == "prescription"));
	}

	#[test]
	fn other_store_failures_are_wrapped() {
		let err = Error::from(triage_store::Error::MalformedTimestamp { value: "soon".to_string() });

		assert!(matches!(err, Error::Store(triage_store::Error::MalformedTimestamp { .. })));
		assert_eq!(err.to_string(), "Malformed timestamp \"soon\".");
	}
}

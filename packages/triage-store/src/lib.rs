pub mod client;
pub mod cursor;
pub mod durable;
pub mod models;
pub mod timestamp;

mod error;

pub use client::StoreClient;
pub use cursor::ScanCursor;
pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

pub const PATIENT_FEEDBACK: &str = "patient_feedback";
pub const MEDICAL_HISTORY: &str = "medical_history";
pub const PRESCRIPTION: &str = "prescription";

use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use crate::state::AppState;
use triage_service::{Error as ServiceError, FeedbackRequest, FeedbackResponse};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/chatbot", post(chatbot))
		.route("/chatbot/", post(chatbot))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn chatbot(
	State(state): State<AppState>,
	Json(payload): Json<FeedbackRequest>,
) -> Result<Json<FeedbackResponse>, ApiError> {
	let response = state.service.submit_feedback(payload).await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl ApiError {
	fn internal(error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			status: StatusCode::INTERNAL_SERVER_ERROR,
			error_code: error_code.into(),
			message: message.into(),
		}
	}
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		tracing::error!(error = %err, "Feedback request failed.");

		let code = match err {
			ServiceError::StoreUnavailable { .. } => "STORE_UNAVAILABLE",
			ServiceError::JudgmentUnavailable { .. } => "JUDGMENT_UNAVAILABLE",
			ServiceError::Store(_) => "STORE_ERROR",
			ServiceError::SerdeJson(_) => "SERIALIZATION_FAILED",
		};

		Self::internal(code, "Failed to process feedback.")
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}

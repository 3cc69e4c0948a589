use std::sync::Arc;

use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode, header},
};
use serde_json::Value;
use tower::util::ServiceExt;

use triage_api::{cors_layer, routes, state::AppState};
use triage_store::PATIENT_FEEDBACK;
use triage_testkit::{MemoryStore, RecordingNotifier, ScriptedCompletion, service, test_config};

fn app(store: Arc<MemoryStore>, completion: ScriptedCompletion) -> (Router, tempfile::TempDir) {
	let dir = tempfile::tempdir().expect("Failed to create temp dir.");
	let service = service(
		test_config(&dir.path().join("cursor")),
		store,
		Arc::new(completion),
		Arc::new(RecordingNotifier::new()),
	);

	(routes::router(AppState::from_service(service)), dir)
}

fn feedback_request(uri: &str, payload: &Value) -> Request<Body> {
	Request::builder()
		.method("POST")
		.uri(uri)
		.header("content-type", "application/json")
		.body(Body::from(payload.to_string()))
		.expect("Failed to build request.")
}

async fn json_body(response: axum::response::Response) -> Value {
	let body = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");

	serde_json::from_slice(&body).expect("Failed to parse response.")
}

#[tokio::test]
async fn health_ok() {
	let (app, _dir) = app(Arc::new(MemoryStore::new()), ScriptedCompletion::new());
	let response = app
		.oneshot(Request::builder().uri("/health").body(Body::empty()).expect("Failed to build request."))
		.await
		.expect("Failed to call /health.");

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn chatbot_returns_triage_result() {
	let store = Arc::new(MemoryStore::new());
	let (app, _dir) = app(
		store.clone(),
		ScriptedCompletion::new().summary("Sharp chest pain.").category("symptom").severity(true),
	);
	let payload = serde_json::json!({ "patient_id": 42, "feedback": "Sharp chest pain" });
	let response = app
		.oneshot(feedback_request("/chatbot/", &payload))
		.await
		.expect("Failed to call /chatbot/.");

	assert_eq!(response.status(), StatusCode::OK);

	let json = json_body(response).await;

	assert_eq!(json["success"], true);
	assert_eq!(json["is_severe"], "true");
	assert_eq!(json["feedback_type"], "symptom");
	assert_eq!(json["summary"], "Sharp chest pain.");
	assert_eq!(
		json["assistant_response"],
		"Immediate attention required. Your doctor will be notified."
	);
	assert_eq!(store.writes(PATIENT_FEEDBACK).len(), 1);
}

#[tokio::test]
async fn chatbot_without_trailing_slash_is_routed() {
	let (app, _dir) = app(Arc::new(MemoryStore::new()), ScriptedCompletion::new());
	let payload = serde_json::json!({ "patient_id": 1, "feedback": "my id is 1, feeling dizzy" });
	let response = app
		.oneshot(feedback_request("/chatbot", &payload))
		.await
		.expect("Failed to call /chatbot.");

	assert_eq!(response.status(), StatusCode::OK);

	let json = json_body(response).await;

	assert_eq!(json["is_severe"], "false");
	assert_eq!(json["feedback_type"], "general");
}

#[tokio::test]
async fn store_outage_does_not_fail_the_request() {
	let store = Arc::new(MemoryStore::new());

	store.fail(PATIENT_FEEDBACK);

	let (app, _dir) = app(store, ScriptedCompletion::new().severity(false));
	let payload = serde_json::json!({ "patient_id": 3, "feedback": "Tired" });
	let response = app
		.oneshot(feedback_request("/chatbot/", &payload))
		.await
		.expect("Failed to call /chatbot/.");

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn malformed_body_is_rejected() {
	let (app, _dir) = app(Arc::new(MemoryStore::new()), ScriptedCompletion::new());
	let payload = serde_json::json!({ "patient_id": "not a number", "feedback": "x" });
	let response = app
		.oneshot(feedback_request("/chatbot/", &payload))
		.await
		.expect("Failed to call /chatbot/.");

	assert!(response.status().is_client_error());
}

#[tokio::test]
async fn cors_allows_configured_origin() {
	let (app, _dir) = app(Arc::new(MemoryStore::new()), ScriptedCompletion::new());
	let app = app.layer(cors_layer("http://localhost:3000").expect("Failed to build CORS layer."));
	let response = app
		.oneshot(
			Request::builder()
				.uri("/health")
				.header(header::ORIGIN, "http://localhost:3000")
				.body(Body::empty())
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call /health.");

	assert_eq!(
		response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).map(|value| value.as_bytes()),
		Some(b"http://localhost:3000".as_slice())
	);
}

#[test]
fn invalid_origin_is_a_configuration_error() {
	assert!(cors_layer("bad\norigin").is_err());
	assert!(cors_layer("*").is_ok());
}

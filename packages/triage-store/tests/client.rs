use std::sync::{Arc, Mutex};

use axum::{
	Json, Router,
	extract::{Query, State},
	http::StatusCode,
	routing::{get, post},
};
use serde_json::Value;
use tokio::net::TcpListener;

use triage_store::{Error, StoreClient};

type Inserted = Arc<Mutex<Vec<Value>>>;

async fn serve(router: Router) -> String {
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind test listener.");
	let addr = listener.local_addr().expect("Missing local address.");

	tokio::spawn(async move {
		axum::serve(listener, router).await.expect("Test server failed.");
	});

	format!("http://{addr}/table/")
}

fn client(api_base: String) -> StoreClient {
	StoreClient::new(&triage_config::Store { api_base, timeout_ms: 2_000 })
		.expect("Failed to build store client.")
}

fn table_router(inserted: Inserted) -> Router {
	Router::new()
		.route(
			"/table/medical_history",
			get(|Query(params): Query<Vec<(String, String)>>| async move {
				Json(serde_json::json!({
					"data": [{ "treatment_given": "rest", "filter": params }]
				}))
			}),
		)
		.route(
			"/table/patient_feedback",
			post(|State(inserted): State<Inserted>, Json(row): Json<Value>| async move {
				inserted.lock().unwrap_or_else(|err| err.into_inner()).push(row);

				Json(serde_json::json!({ "success": true }))
			}),
		)
		.route("/table/prescription", get(|| async { StatusCode::BAD_GATEWAY }))
		.route("/table/broken", get(|| async { "not json" }))
		.with_state(inserted)
}

#[tokio::test]
async fn fetch_passes_filter_and_returns_rows() {
	let base = serve(table_router(Inserted::default())).await;
	let rows = client(base)
		.fetch("medical_history", &[("patient_id", "42".to_string())])
		.await
		.expect("Fetch failed.");

	assert_eq!(rows.len(), 1);
	assert_eq!(rows[0]["filter"], serde_json::json!([["patient_id", "42"]]));
}

#[tokio::test]
async fn insert_posts_row_and_returns_ack() {
	let inserted = Inserted::default();
	let base = serve(table_router(inserted.clone())).await;
	let row = serde_json::json!({ "patient_id": 1, "feedback": "dizzy" });
	let ack = client(base).insert("patient_feedback", &row).await.expect("Insert failed.");

	assert_eq!(ack["success"], true);
	assert_eq!(inserted.lock().expect("lock").as_slice(), &[row]);
}

#[tokio::test]
async fn failures_collapse_into_store_unavailable() {
	let base = serve(table_router(Inserted::default())).await;
	let client = client(base);

	for collection in ["prescription", "broken", "missing"] {
		let err = client.fetch(collection, &[]).await.expect_err("Expected failure.");

		match err {
			Error::StoreUnavailable { collection: failed } => assert_eq!(failed, collection),
			other => panic!("Unexpected error: {other:?}"),
		}
	}
}

#[tokio::test]
async fn unreachable_store_is_unavailable() {
	let err = client("http://127.0.0.1:1/table".to_string())
		.insert("patient_feedback", &serde_json::json!({}))
		.await
		.expect_err("Expected failure.");

	assert!(matches!(err, Error::StoreUnavailable { .. }));
}

//! Integration tests for the REST API feature.

#![cfg(feature = "api")]

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::util::ServiceExt;

use urban_traffic_sim::api::{AppState, router};
use urban_traffic_sim::runner::run_scenario;

/// Runs the small scenario and wraps its output as API state.
fn build_api_state() -> Arc<AppState> {
    let out = run_scenario(&common::small_config()).expect("small scenario runs");
    Arc::new(AppState::from(out))
}

async fn get(state: Arc<AppState>, uri: &str) -> (StatusCode, serde_json::Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = router(state).oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn state_reports_the_finished_run() {
    let state = build_api_state();
    let ticks = state.records.len();
    let (status, json) = get(state, "/state").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["report"]["total_vehicles"], 40);
    assert_eq!(json["report"]["ticks_run"], ticks);
    assert_eq!(json["latest_tick"]["tick"], ticks - 1);
    assert_eq!(json["config"]["network"]["grid_size"], 3);
}

#[tokio::test]
async fn telemetry_rows_conserve_vehicles() {
    let state = build_api_state();
    let (status, json) = get(state, "/telemetry?from=0&to=99").await;
    assert_eq!(status, StatusCode::OK);
    let rows = json.as_array().expect("array");
    assert_eq!(rows.len(), 100);
    for row in rows {
        let completed = row["completed"].as_u64().unwrap();
        let in_network = row["in_network"].as_u64().unwrap();
        assert_eq!(completed + in_network, 40);
        assert_eq!(row["queue_lengths"].as_array().map(Vec::len), Some(9));
    }
}

#[tokio::test]
async fn telemetry_rejects_inverted_range() {
    let (status, json) = get(build_api_state(), "/telemetry?from=9&to=3").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().is_some());
}

#[tokio::test]
async fn vehicles_round_out_the_demand() {
    let state = build_api_state();
    let (status, json) = get(state.clone(), "/vehicles").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().map(Vec::len), Some(40));

    let (status, json) = get(state.clone(), "/vehicles/0").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["id"], 0);
    assert!(json["hops"].as_u64().unwrap() >= 1);

    let (status, _) = get(state, "/vehicles/40").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

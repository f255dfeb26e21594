use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tableflow_api::router;
use tableflow_api::state::AppState;
use tableflow_bucket::MemoryBucketStore;
use tableflow_core::PipelineRegistry;
use tableflow_core::csv_pipeline::CsvTablePipeline;
use tableflow_orchestrator::{CsvPublisher, StageOrchestrator};
use tower::ServiceExt;

fn test_state() -> Arc<AppState> {
    let mut registry = PipelineRegistry::new();
    registry.register(Arc::new(CsvTablePipeline::new(
        "epidemiology",
        vec!["who".to_string()],
    )));

    let orchestrator = StageOrchestrator::new(
        Arc::new(MemoryBucketStore::new()),
        Arc::new(MemoryBucketStore::new()),
        Arc::new(registry),
        Vec::new(),
        Arc::new(CsvPublisher),
    )
    .expect("orchestrator construction");

    Arc::new(AppState::new(Arc::new(orchestrator)))
}

async fn get(uri: &str) -> (StatusCode, String) {
    let response = router(test_state())
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8_lossy(&body).into_owned())
}

#[tokio::test]
async fn update_table_acknowledges_known_table() {
    let (status, body) = get("/update_table?table=epidemiology").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn update_table_rejects_unknown_table() {
    let (status, _) = get("/update_table?table=mystery").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_table_requires_a_table_parameter() {
    let (status, _) = get("/update_table").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn combine_table_rejects_unknown_table() {
    let (status, _) = get("/combine_table?table=mystery").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cache_pull_with_no_sources_still_succeeds() {
    let (status, body) = get("/cache_pull").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn publish_with_no_tables_still_succeeds() {
    let (status, body) = get("/publish").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

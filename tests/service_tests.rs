mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::Value;
use std::time::Duration;
use tower::ServiceExt;

use async_trait::async_trait;
use common::{single_page_pdf, Harness};
use std::sync::Arc;
use DocDispatch::config::ServerConfig;
use DocDispatch::data_model::{PipelineState, ProcessingContext};
use DocDispatch::error::Result;
use DocDispatch::executor::{PipelineExecutor, ProcessingStep};
use DocDispatch::server::router;
use DocDispatch::utils::prometheus_metrics::DOCUMENTS_FAILED_TOTAL;

const BOUNDARY: &str = "----docdispatch-test-boundary";

fn multipart_body(field: &str, file_name: &str, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            BOUNDARY, field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn upload(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/process_doc")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let app = router(Harness::default().executor(), &ServerConfig::default());
    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn process_doc_returns_success_json() {
    let app = router(Harness::default().executor(), &ServerConfig::default());
    let body = multipart_body(
        "file",
        "order.pdf",
        &single_page_pdf("Please freeze account for National ID 1234567890"),
    );
    let response = app.oneshot(upload(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["result"], "Funds frozen for customer CUST001");
    assert_eq!(json["customer_ref"], "CUST001");
    assert_eq!(json["action"], "freeze_funds");
    assert!(json.get("error").is_none());
}

#[tokio::test]
async fn process_doc_returns_error_json() {
    let app = router(Harness::default().executor(), &ServerConfig::default());
    let body = multipart_body("file", "order.txt", b"freeze National ID 5555555555");
    let response = app.oneshot(upload(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(
        json["error"],
        "National ID 5555555555 not found in bank records. Order discarded."
    );
    assert!(json.get("result").is_none());
}

#[tokio::test]
async fn missing_file_field_is_bad_request() {
    let app = router(Harness::default().executor(), &ServerConfig::default());
    let body = multipart_body("attachment", "order.txt", b"freeze");
    let response = app.oneshot(upload(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "No file uploaded.");
}

#[tokio::test]
async fn metrics_endpoint_follows_config() {
    let enabled = router(Harness::default().executor(), &ServerConfig::default());
    let response = enabled
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let config = ServerConfig {
        enable_metrics: false,
        ..ServerConfig::default()
    };
    let disabled = router(Harness::default().executor(), &config);
    let response = disabled
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

struct Stall;

#[async_trait]
impl ProcessingStep for Stall {
    fn name(&self) -> &'static str {
        "Stall"
    }

    fn state(&self) -> PipelineState {
        PipelineState::Extracting
    }

    async fn process(&self, _context: &mut ProcessingContext) -> Result<()> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }
}

#[tokio::test]
async fn request_deadline_maps_to_decode_failure() {
    let config = ServerConfig {
        request_timeout_secs: 1,
        ..ServerConfig::default()
    };
    let failed = DOCUMENTS_FAILED_TOTAL.with_label_values(&["decode_failure"]);
    let failed_before = failed.get();
    let app = router(Arc::new(PipelineExecutor::new(vec![Box::new(Stall)])), &config);
    let response = app
        .oneshot(upload(multipart_body("file", "slow.txt", b"freeze")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let error = json_body(response).await["error"].as_str().unwrap().to_string();
    assert!(error.starts_with("Failed to extract text from uploaded document"), "got {}", error);
    // Other tests may also bump the counter concurrently.
    assert!(failed.get() >= failed_before + 1.0);
}

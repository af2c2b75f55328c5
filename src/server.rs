use crate::config::ServerConfig;
use crate::data_model::{ProcessingOutcome, RawDocument};
use crate::error::{ErrorKind, PipelineError, Result};
use crate::executor::PipelineExecutor;
use crate::service_logic::execute_processing_pipeline;
use crate::utils::prometheus_metrics::{gather_metrics, DOCUMENTS_FAILED_TOTAL};
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};

const UPLOAD_FIELD: &str = "file";

// The application state, shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<PipelineExecutor>,
    pub request_timeout: Duration,
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

async fn process_doc_handler(
    State(app_state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Response {
    let mut upload = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some(UPLOAD_FIELD) {
                    continue;
                }
                let file_name = field.file_name().unwrap_or_default().to_string();
                match field.bytes().await {
                    Ok(bytes) => {
                        upload = Some(RawDocument::new(file_name, bytes.to_vec()));
                        break;
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to read uploaded file");
                        return bad_request("Could not read uploaded file.");
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "Malformed multipart request");
                return bad_request("Malformed multipart request.");
            }
        }
    }

    let Some(document) = upload else {
        return bad_request("No file uploaded.");
    };

    info!(file_name = %document.file_name, size = document.bytes.len(), "Received document");
    let outcome = match tokio::time::timeout(
        app_state.request_timeout,
        execute_processing_pipeline(document, app_state.executor.clone()),
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(_) => {
            let secs = app_state.request_timeout.as_secs();
            warn!(timeout_secs = secs, "Document processing exceeded the request deadline");
            DOCUMENTS_FAILED_TOTAL
                .with_label_values(&[ErrorKind::DecodeFailure.as_str()])
                .inc();
            ProcessingOutcome::Failure {
                error: PipelineError::decode_failure(
                    "uploaded",
                    format!("processing did not finish within {} seconds", secs),
                )
                .user_message(),
            }
        }
    };

    (StatusCode::OK, Json(outcome)).into_response()
}

async fn metrics_handler() -> Response {
    match gather_metrics() {
        Ok(body) => (StatusCode::OK, body).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e).into_response(),
    }
}

/// Builds the HTTP routes around an already-assembled pipeline.
pub fn router(executor: Arc<PipelineExecutor>, config: &ServerConfig) -> Router {
    let app_state = Arc::new(AppState {
        executor,
        request_timeout: Duration::from_secs(config.request_timeout_secs),
    });

    let mut app = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/process_doc", post(process_doc_handler));
    if config.enable_metrics {
        app = app.route("/metrics", get(metrics_handler));
    }
    app.with_state(app_state)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
}

// The main function to run the server
pub async fn run_server(executor: Arc<PipelineExecutor>, config: &ServerConfig) -> Result<()> {
    let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        PipelineError::ConfigError(format!(
            "Invalid bind address '{}': {}",
            config.bind_address, e
        ))
    })?;
    let app = router(executor, config);

    let listener = TcpListener::bind(addr).await?;
    info!("listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

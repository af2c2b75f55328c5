// src/utils/prometheus_metrics.rs

use once_cell::sync::Lazy;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_histogram, Counter,
    CounterVec, Encoder, Gauge, Histogram, TextEncoder,
};

pub static DOCUMENTS_RECEIVED_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "documents_received_total",
        "Total number of documents submitted to the pipeline."
    )
    .expect("Failed to register DOCUMENTS_RECEIVED_TOTAL counter")
});

pub static DOCUMENTS_SUCCEEDED_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "documents_succeeded_total",
        "Total number of documents whose action was executed."
    )
    .expect("Failed to register DOCUMENTS_SUCCEEDED_TOTAL counter")
});

pub static DOCUMENTS_FAILED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "documents_failed_total",
        "Total number of documents that stopped with an error, by error kind.",
        &["kind"]
    )
    .expect("Failed to register DOCUMENTS_FAILED_TOTAL counter")
});

pub static TRANSLATION_FAILURES_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "translation_failures_total",
        "Total number of translation attempts that degraded to the original text."
    )
    .expect("Failed to register TRANSLATION_FAILURES_TOTAL counter")
});

pub static DOCUMENT_PROCESSING_DURATION_SECONDS: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "document_processing_duration_seconds",
        "Histogram of end-to-end pipeline durations per document."
    )
    .expect("Failed to register DOCUMENT_PROCESSING_DURATION_SECONDS histogram")
});

pub static ACTIVE_PIPELINE_RUNS: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!(
        "active_pipeline_runs",
        "Number of documents currently being processed."
    )
    .expect("Failed to register ACTIVE_PIPELINE_RUNS gauge")
});

/// Renders every registered metric in the Prometheus text format.
pub fn gather_metrics() -> Result<String, String> {
    let encoder = TextEncoder::new();
    let mut buffer = vec![];
    encoder
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|e| format!("Could not encode prometheus metrics: {}", e))?;
    String::from_utf8(buffer).map_err(|e| format!("Prometheus metrics UTF-8 error: {}", e))
}

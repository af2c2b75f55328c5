// src/service_logic.rs

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tracing::{debug, error, info, info_span, instrument, warn, Instrument};

use crate::config::AppConfig;
use crate::data_model::{ProcessingContext, ProcessingOutcome, RawDocument};
use crate::error::{PipelineError, Result};
use crate::executor::{PipelineExecutor, ProcessingStep};
use crate::pipeline::dispatch::{ActionCatalog, HandlerRegistry};
use crate::pipeline::entities::EntityExtractor;
use crate::pipeline::extract::{ContentExtractor, TesseractRecognizer, TextRecognizer};
use crate::pipeline::language::{
    LanguageDetector, LanguageNormalizer, LibreTranslateClient, Translator, WhatlangDetector,
};
use crate::pipeline::matcher::CustomerRegistry;
use crate::pipeline::steps::{ExecuteActionStep, ExtractTextStep, ParseTextStep, ValidateCustomerStep};
use crate::utils::prometheus_metrics::*;

/// Shared, read-only collaborators of every pipeline run.
#[derive(Clone)]
pub struct Services {
    pub content: Arc<ContentExtractor>,
    pub normalizer: Arc<LanguageNormalizer>,
    pub entities: Arc<EntityExtractor>,
    pub registry: Arc<CustomerRegistry>,
    pub catalog: Arc<ActionCatalog>,
}

impl Services {
    /// Loads the reference tables and wires up the configured engines.
    #[instrument(skip(config))]
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let registry = CustomerRegistry::load_csv(&config.registry.customers_path)?;
        if registry.is_empty() {
            warn!("Customer registry is empty; every document will fail validation");
        }
        let catalog = ActionCatalog::load_csv(&config.registry.actions_path, &HandlerRegistry::builtin())?;
        if catalog.is_empty() {
            warn!("Action catalog is empty; every document will fail dispatch");
        }

        let recognizer: Arc<dyn TextRecognizer> = Arc::new(TesseractRecognizer::new(
            config.ocr.tesseract_binary.clone(),
            config.ocr.language.clone(),
        ));

        let translator: Option<Arc<dyn Translator>> = match &config.language.translation_endpoint {
            Some(endpoint) => {
                let client = LibreTranslateClient::new(
                    endpoint.clone(),
                    config.language.translation_api_key.clone(),
                    Duration::from_secs(config.language.translation_timeout_secs),
                )
                .map_err(|e| PipelineError::ConfigError(format!("Failed to build translation client: {}", e)))?;
                info!(endpoint = %endpoint, "Translation enabled");
                Some(Arc::new(client))
            }
            None => {
                info!("No translation endpoint configured; non-target text is used as is");
                None
            }
        };

        Self::with_capabilities(config, registry, catalog, recognizer, Arc::new(WhatlangDetector), translator)
    }

    /// Assembles services from already-built tables and capability providers.
    pub fn with_capabilities(
        config: &AppConfig,
        registry: CustomerRegistry,
        catalog: ActionCatalog,
        recognizer: Arc<dyn TextRecognizer>,
        detector: Arc<dyn LanguageDetector>,
        translator: Option<Arc<dyn Translator>>,
    ) -> Result<Self> {
        Ok(Services {
            content: Arc::new(ContentExtractor::new(recognizer)),
            normalizer: Arc::new(LanguageNormalizer::new(
                detector,
                translator,
                config.language.target_language.clone(),
                config.language.min_confidence,
            )),
            entities: Arc::new(EntityExtractor::new(&config.entities)?),
            registry: Arc::new(registry),
            catalog: Arc::new(catalog),
        })
    }
}

/// Builds the fixed four-step pipeline.
pub fn build_pipeline(services: &Services) -> Vec<Box<dyn ProcessingStep>> {
    let steps: Vec<Box<dyn ProcessingStep>> = vec![
        Box::new(ExtractTextStep::new(services.content.clone())),
        Box::new(ParseTextStep::new(
            services.normalizer.clone(),
            services.entities.clone(),
        )),
        Box::new(ValidateCustomerStep::new(services.registry.clone())),
        Box::new(ExecuteActionStep::new(services.catalog.clone())),
    ];
    debug!(steps = steps.len(), "Pipeline built");
    steps
}

// Keeps ACTIVE_PIPELINE_RUNS balanced even when the caller drops the run at a deadline.
struct ActiveRun;

impl ActiveRun {
    fn start() -> Self {
        ACTIVE_PIPELINE_RUNS.inc();
        ActiveRun
    }
}

impl Drop for ActiveRun {
    fn drop(&mut self) {
        ACTIVE_PIPELINE_RUNS.dec();
    }
}

/// Runs one document through the pipeline and reads out its outcome.
///
/// A panic anywhere inside the run is reported as an internal failure rather
/// than tearing down the caller.
pub async fn execute_processing_pipeline(
    document: RawDocument,
    executor: Arc<PipelineExecutor>,
) -> ProcessingOutcome {
    let _active = ActiveRun::start();
    DOCUMENTS_RECEIVED_TOTAL.inc();
    let processing_timer = DOCUMENT_PROCESSING_DURATION_SECONDS.start_timer();

    let span = info_span!("process_document", file_name = %document.file_name, format = document.format.label());
    let run = async move {
        let context = executor
            .run_single_async(ProcessingContext::new(document))
            .await;
        match context.failure() {
            Some(failure) => {
                info!(step = %failure.step, kind = failure.kind.as_str(), error = %failure.message, "Document rejected");
                DOCUMENTS_FAILED_TOTAL
                    .with_label_values(&[failure.kind.as_str()])
                    .inc();
            }
            None => {
                info!(result = ?context.result(), "Document processed");
                DOCUMENTS_SUCCEEDED_TOTAL.inc();
            }
        }
        context.into_outcome()
    };

    let outcome = match AssertUnwindSafe(run.instrument(span)).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            error!(reason = %reason, "Pipeline run panicked");
            DOCUMENTS_FAILED_TOTAL.with_label_values(&["internal"]).inc();
            ProcessingOutcome::internal_failure()
        }
    };

    processing_timer.observe_duration();
    outcome
}

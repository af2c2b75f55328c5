use crate::data_model::{PipelineState, ProcessingContext};
use crate::error::{PipelineError, Result};
use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, info_span, warn, Instrument};

#[async_trait]
pub trait ProcessingStep: Send + Sync {
    fn name(&self) -> &'static str; // For logging/error reporting

    /// State the context is in while this step runs.
    fn state(&self) -> PipelineState;

    async fn process(&self, context: &mut ProcessingContext) -> Result<()>;
}

/// Runs an ordered list of steps over a context, halting forward progress at
/// the first failure. A failed context is handed through the remaining steps
/// without invoking them.
pub struct PipelineExecutor {
    steps: Vec<Box<dyn ProcessingStep>>,
}

impl PipelineExecutor {
    pub fn new(steps: Vec<Box<dyn ProcessingStep>>) -> Self {
        if steps.is_empty() {
            warn!("Pipeline created with no steps.");
        }
        PipelineExecutor { steps }
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub async fn run_single_async(&self, initial_context: ProcessingContext) -> ProcessingContext {
        let mut context = initial_context;
        let span = info_span!(
            "pipeline_run",
            context_id = %context.id(),
            file_name = %context.document().file_name
        );

        async {
            for step in &self.steps {
                if context.is_failed() {
                    debug!(step = step.name(), "Skipping step after earlier failure");
                    continue;
                }

                context.enter(step.state());
                debug!(step = step.name(), state = ?context.state(), "Running step");

                if let Err(e) = step.process(&mut context).await {
                    let err = PipelineError::StepError {
                        step_name: step.name().to_string(),
                        source: Box::new(e),
                    };
                    warn!(step = step.name(), kind = err.kind().as_str(), error = %err, "Step failed");
                    context.record_failure(&err);
                } else {
                    debug!(step = step.name(), "Step completed");
                }
            }
            context.finish();
            debug!(state = ?context.state(), "Pipeline finished");
        }
        .instrument(span)
        .await;

        context
    }

    // Runs multiple contexts concurrently; each run still owns its context exclusively.
    pub async fn run_batch_parallel_async(
        &self,
        contexts: Vec<ProcessingContext>,
    ) -> Vec<ProcessingContext> {
        contexts
            .into_iter()
            .map(|ctx| self.run_single_async(ctx))
            .collect::<FuturesUnordered<_>>()
            .collect()
            .await
    }
}

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use crate::data_model::{PipelineState, ProcessingContext};
use crate::error::{PipelineError, Result};
use crate::executor::ProcessingStep;
use crate::pipeline::dispatch::ActionCatalog;
use crate::pipeline::entities::EntityExtractor;
use crate::pipeline::extract::ContentExtractor;
use crate::pipeline::language::LanguageNormalizer;
use crate::pipeline::matcher::CustomerRegistry;

/// Decodes the uploaded bytes into text.
pub struct ExtractTextStep {
    extractor: Arc<ContentExtractor>,
}

impl ExtractTextStep {
    pub fn new(extractor: Arc<ContentExtractor>) -> Self {
        Self { extractor }
    }
}

#[async_trait]
impl ProcessingStep for ExtractTextStep {
    fn name(&self) -> &'static str {
        "ExtractText"
    }

    fn state(&self) -> PipelineState {
        PipelineState::Extracting
    }

    async fn process(&self, context: &mut ProcessingContext) -> Result<()> {
        let text = self.extractor.extract(context.document()).await?;
        context.set_text(text);
        Ok(())
    }
}

/// Normalizes the language of the extracted text, then pulls out the
/// identifier and action. Neither half can fail on its own account.
pub struct ParseTextStep {
    normalizer: Arc<LanguageNormalizer>,
    extractor: Arc<EntityExtractor>,
}

impl ParseTextStep {
    pub fn new(normalizer: Arc<LanguageNormalizer>, extractor: Arc<EntityExtractor>) -> Self {
        Self {
            normalizer,
            extractor,
        }
    }
}

#[async_trait]
impl ProcessingStep for ParseTextStep {
    fn name(&self) -> &'static str {
        "ParseText"
    }

    fn state(&self) -> PipelineState {
        PipelineState::Normalizing
    }

    async fn process(&self, context: &mut ProcessingContext) -> Result<()> {
        let text = context
            .text()
            .ok_or_else(|| PipelineError::Unexpected("no text to parse".to_string()))?
            .to_string();
        let normalized = self.normalizer.normalize(&text).await;

        context.enter(PipelineState::Parsing);
        let entities = self.extractor.extract_entities(&normalized);
        context.set_text(normalized);
        context.set_entities(entities.identifier, entities.action);
        Ok(())
    }
}

pub struct ValidateCustomerStep {
    registry: Arc<CustomerRegistry>,
}

impl ValidateCustomerStep {
    pub fn new(registry: Arc<CustomerRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl ProcessingStep for ValidateCustomerStep {
    fn name(&self) -> &'static str {
        "ValidateCustomer"
    }

    fn state(&self) -> PipelineState {
        PipelineState::Validating
    }

    async fn process(&self, context: &mut ProcessingContext) -> Result<()> {
        let customer = self.registry.match_customer(context.identifier())?;
        debug!(customer = %customer, "Customer matched");
        context.set_customer_ref(customer);
        Ok(())
    }
}

pub struct ExecuteActionStep {
    catalog: Arc<ActionCatalog>,
}

impl ExecuteActionStep {
    pub fn new(catalog: Arc<ActionCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl ProcessingStep for ExecuteActionStep {
    fn name(&self) -> &'static str {
        "ExecuteAction"
    }

    fn state(&self) -> PipelineState {
        PipelineState::Executing
    }

    async fn process(&self, context: &mut ProcessingContext) -> Result<()> {
        let customer = context
            .customer_ref()
            .cloned()
            .ok_or_else(|| PipelineError::Unexpected("no customer to act on".to_string()))?;
        let result = self.catalog.dispatch(context.action(), &customer)?;
        info!(result = %result, "Action executed");
        context.set_result(result);
        Ok(())
    }
}

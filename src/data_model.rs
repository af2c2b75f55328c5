use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::{ErrorKind, PipelineError, INTERNAL_FAILURE_MESSAGE};

/// Document format, inferred from the uploaded file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    PlainText,
    Image,
    /// Anything else. Carries the lower-cased suffix (empty when there is none).
    Unsupported(String),
}

impl DocumentFormat {
    pub fn from_file_name(file_name: &str) -> Self {
        let suffix = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match suffix.as_str() {
            "pdf" => DocumentFormat::Pdf,
            "docx" => DocumentFormat::Docx,
            "txt" => DocumentFormat::PlainText,
            "png" | "jpg" | "jpeg" => DocumentFormat::Image,
            _ => DocumentFormat::Unsupported(suffix),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            DocumentFormat::Pdf => "PDF",
            DocumentFormat::Docx => "DOCX",
            DocumentFormat::PlainText => "plain text",
            DocumentFormat::Image => "image",
            DocumentFormat::Unsupported(suffix) => suffix,
        }
    }
}

/// The uploaded document as received: bytes plus the declared (suffix-derived) format.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub file_name: String,
    pub format: DocumentFormat,
    pub bytes: Vec<u8>,
}

impl RawDocument {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let format = DocumentFormat::from_file_name(&file_name);
        RawDocument {
            file_name,
            format,
            bytes,
        }
    }
}

/// Canonical account actions, listed in extraction priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognizedAction {
    FreezeFunds,
    ReleaseFunds,
}

impl RecognizedAction {
    /// Priority order used when a document mentions more than one action.
    pub const PRIORITY: [RecognizedAction; 2] =
        [RecognizedAction::FreezeFunds, RecognizedAction::ReleaseFunds];

    pub fn key(&self) -> &'static str {
        match self {
            RecognizedAction::FreezeFunds => "freeze_funds",
            RecognizedAction::ReleaseFunds => "release_funds",
        }
    }
}

impl fmt::Display for RecognizedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for RecognizedAction {
    type Err = PipelineError;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        match key {
            "freeze_funds" => Ok(RecognizedAction::FreezeFunds),
            "release_funds" => Ok(RecognizedAction::ReleaseFunds),
            other => Err(PipelineError::UnrecognizedAction {
                action: Some(other.to_string()),
            }),
        }
    }
}

/// Opaque handle to a customer matched in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerRef(String);

impl CustomerRef {
    pub fn new(id: impl Into<String>) -> Self {
        CustomerRef(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Success,
    Failure,
}

/// Pipeline state machine. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Extracting,
    Normalizing,
    Parsing,
    Validating,
    Executing,
    Done(Completion),
}

/// First failure recorded in a context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFailure {
    pub step: String,
    pub kind: ErrorKind,
    pub message: String,
}

/// Per-document state threaded through the pipeline.
///
/// Setters are no-ops once a failure has been recorded, so a failed context
/// can only be passed through.
#[derive(Debug)]
pub struct ProcessingContext {
    id: Uuid,
    document: RawDocument,
    state: PipelineState,
    text: Option<String>,
    identifier: Option<String>,
    action: Option<RecognizedAction>,
    customer_ref: Option<CustomerRef>,
    result: Option<String>,
    failure: Option<StageFailure>,
}

impl ProcessingContext {
    pub fn new(document: RawDocument) -> Self {
        ProcessingContext {
            id: Uuid::new_v4(),
            document,
            state: PipelineState::Extracting,
            text: None,
            identifier: None,
            action: None,
            customer_ref: None,
            result: None,
            failure: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn document(&self) -> &RawDocument {
        &self.document
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    pub fn action(&self) -> Option<RecognizedAction> {
        self.action
    }

    pub fn customer_ref(&self) -> Option<&CustomerRef> {
        self.customer_ref.as_ref()
    }

    pub fn result(&self) -> Option<&str> {
        self.result.as_deref()
    }

    pub fn failure(&self) -> Option<&StageFailure> {
        self.failure.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.failure.as_ref().map(|f| f.message.as_str())
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    pub fn enter(&mut self, state: PipelineState) {
        if matches!(self.state, PipelineState::Done(_)) {
            return;
        }
        self.state = state;
    }

    pub fn set_text(&mut self, text: String) {
        if self.guard("text") {
            self.text = Some(text);
        }
    }

    pub fn set_entities(&mut self, identifier: Option<String>, action: Option<RecognizedAction>) {
        if self.guard("entities") {
            self.identifier = identifier;
            self.action = action;
        }
    }

    pub fn set_customer_ref(&mut self, customer_ref: CustomerRef) {
        if self.guard("customer_ref") {
            self.customer_ref = Some(customer_ref);
        }
    }

    pub fn set_result(&mut self, result: String) {
        if self.guard("result") {
            self.result = Some(result);
        }
    }

    /// Records the first failure. Later failures are ignored.
    pub fn record_failure(&mut self, error: &PipelineError) {
        if self.failure.is_some() {
            return;
        }
        let step = match error {
            PipelineError::StepError { step_name, .. } => step_name.clone(),
            _ => String::from("pipeline"),
        };
        self.failure = Some(StageFailure {
            step,
            kind: error.kind(),
            message: error.user_message(),
        });
    }

    pub(crate) fn finish(&mut self) {
        let completion = if self.failure.is_some() || self.result.is_none() {
            Completion::Failure
        } else {
            Completion::Success
        };
        self.state = PipelineState::Done(completion);
    }

    fn guard(&self, field: &'static str) -> bool {
        if self.failure.is_some() {
            warn!(context_id = %self.id, field, "Ignoring write to a failed processing context");
            return false;
        }
        true
    }

    /// Reads out the externally visible outcome. Exactly one of result/error is reported.
    pub fn into_outcome(self) -> ProcessingOutcome {
        if let Some(failure) = self.failure {
            return ProcessingOutcome::Failure {
                error: failure.message,
            };
        }
        match (self.result, self.customer_ref, self.action) {
            (Some(result), Some(customer_ref), Some(action)) => ProcessingOutcome::Success {
                result,
                customer_ref: customer_ref.to_string(),
                action: action.key().to_string(),
            },
            _ => ProcessingOutcome::internal_failure(),
        }
    }
}

/// Outbound response shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProcessingOutcome {
    Success {
        result: String,
        customer_ref: String,
        action: String,
    },
    Failure {
        error: String,
    },
}

impl ProcessingOutcome {
    pub fn internal_failure() -> Self {
        ProcessingOutcome::Failure {
            error: INTERNAL_FAILURE_MESSAGE.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ProcessingOutcome::Success { .. })
    }
}

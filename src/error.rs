use thiserror::Error;

/// Custom Result type for this crate.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Message returned to callers for any failure that is not part of the
/// document-level error taxonomy.
pub const INTERNAL_FAILURE_MESSAGE: &str = "Internal error while processing document.";

/// The Error type for pipeline operations.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Configuration validation error: {0}")]
    ConfigValidationError(String),

    #[error("I/O error: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },

    #[error("Reference table error: {source}")]
    CsvError {
        #[from]
        source: csv::Error,
    },

    #[error("Serialization/Deserialization error: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },

    #[error("Unsupported file format '{suffix}'. Supported formats: pdf, docx, txt, png, jpg, jpeg.")]
    UnsupportedFormat { suffix: String },

    #[error("Failed to extract text from {format} document: {source}")]
    DecodeFailure {
        format: String,
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    #[error("No National ID found in document. Order discarded.")]
    MissingIdentifier,

    #[error("National ID {identifier} not found in bank records. Order discarded.")]
    NotFound { identifier: String },

    #[error("{}", unrecognized_action_message(.action.as_deref()))]
    UnrecognizedAction { action: Option<String> },

    #[error("Error in processing step '{step_name}': {source}")]
    StepError {
        step_name: String,
        source: Box<PipelineError>,
    },

    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

fn unrecognized_action_message(action: Option<&str>) -> String {
    match action {
        Some(action) => format!("Action '{}' is not recognized. Stopping processing.", action),
        None => "No recognizable action found in document. Stopping processing.".to_string(),
    }
}

/// Failure classes surfaced to callers. Everything outside the five
/// document-level kinds collapses into `Internal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnsupportedFormat,
    DecodeFailure,
    MissingIdentifier,
    NotFound,
    UnrecognizedAction,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnsupportedFormat => "unsupported_format",
            ErrorKind::DecodeFailure => "decode_failure",
            ErrorKind::MissingIdentifier => "missing_identifier",
            ErrorKind::NotFound => "not_found",
            ErrorKind::UnrecognizedAction => "unrecognized_action",
            ErrorKind::Internal => "internal",
        }
    }
}

impl PipelineError {
    pub fn decode_failure<E>(format: impl Into<String>, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        PipelineError::DecodeFailure {
            format: format.into(),
            source: source.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            PipelineError::DecodeFailure { .. } => ErrorKind::DecodeFailure,
            PipelineError::MissingIdentifier => ErrorKind::MissingIdentifier,
            PipelineError::NotFound { .. } => ErrorKind::NotFound,
            PipelineError::UnrecognizedAction { .. } => ErrorKind::UnrecognizedAction,
            PipelineError::StepError { source, .. } => source.kind(),
            _ => ErrorKind::Internal,
        }
    }

    /// True for the document-level failures a caller is expected to act on.
    pub fn is_fatal_domain(&self) -> bool {
        self.kind() != ErrorKind::Internal
    }

    /// The message a caller is allowed to see. Step wrappers are peeled off;
    /// internal failures never leak their diagnostic detail.
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::StepError { source, .. } => source.user_message(),
            other if other.kind() == ErrorKind::Internal => INTERNAL_FAILURE_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

/// Failures reported by the pluggable OCR / language detection / translation engines.
#[derive(Error, Debug)]
pub enum CapabilityError {
    #[error("{engine} failed: {message}")]
    Engine {
        engine: &'static str,
        message: String,
    },

    #[error("engine I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Unavailable(String),
}

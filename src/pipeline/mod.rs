// src/pipeline/mod.rs

pub mod dispatch; // Action catalog + handlers
pub mod entities;
pub mod extract; // Format-specific text decoders
pub mod language;
pub mod matcher; // Customer registry lookups
pub mod steps;

pub use dispatch::{ActionCatalog, ActionHandler, HandlerRegistry};
pub use entities::{EntityExtractor, ExtractedEntities};
pub use extract::ContentExtractor;
pub use language::LanguageNormalizer;
pub use matcher::CustomerRegistry;
pub use steps::{ExecuteActionStep, ExtractTextStep, ParseTextStep, ValidateCustomerStep};

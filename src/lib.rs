#![allow(non_snake_case)]

// Library modules shared by the `server` and `process` binaries.
pub mod config;
pub mod data_model;
pub mod error;
pub mod executor;
pub mod pipeline;
pub mod server;
pub mod service_logic;
pub mod utils;

pub use data_model::{ProcessingOutcome, RawDocument};
pub use error::{PipelineError, Result};
pub use executor::{PipelineExecutor, ProcessingStep};

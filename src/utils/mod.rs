// Utils

pub mod common;
pub mod prometheus_metrics;
pub mod text;

pub use text::{canonical_action_key, strip_whitespace};

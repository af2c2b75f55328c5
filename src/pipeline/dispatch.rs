use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use crate::data_model::{CustomerRef, RecognizedAction};
use crate::error::{PipelineError, Result};
use crate::utils::canonical_action_key;

/// Something that can be done to a customer's account. Returns the
/// human-readable confirmation handed back to the caller.
pub trait ActionHandler: Send + Sync {
    fn execute(&self, customer: &CustomerRef) -> String;
}

impl<F> ActionHandler for F
where
    F: Fn(&CustomerRef) -> String + Send + Sync,
{
    fn execute(&self, customer: &CustomerRef) -> String {
        self(customer)
    }
}

pub fn freeze_funds(customer: &CustomerRef) -> String {
    format!("Funds frozen for customer {}", customer)
}

pub fn release_funds(customer: &CustomerRef) -> String {
    format!("Funds released for customer {}", customer)
}

/// Handlers available to the catalog, keyed by canonical action.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<RecognizedAction, Arc<dyn ActionHandler>>,
}

impl HandlerRegistry {
    pub fn builtin() -> Self {
        HandlerRegistry::default()
            .with_handler(RecognizedAction::FreezeFunds, freeze_funds)
            .with_handler(RecognizedAction::ReleaseFunds, release_funds)
    }

    pub fn with_handler<H: ActionHandler + 'static>(
        mut self,
        action: RecognizedAction,
        handler: H,
    ) -> Self {
        self.handlers.insert(action, Arc::new(handler));
        self
    }

    fn get(&self, action: RecognizedAction) -> Option<Arc<dyn ActionHandler>> {
        self.handlers.get(&action).cloned()
    }
}

#[derive(Clone)]
pub struct CatalogEntry {
    pub label: String,
    handler: Arc<dyn ActionHandler>,
}

#[derive(Debug, Deserialize)]
struct ActionRow {
    action_name: String,
}

/// The actions the bank allows, each bound to its handler.
#[derive(Clone, Default)]
pub struct ActionCatalog {
    entries: HashMap<RecognizedAction, CatalogEntry>,
}

impl ActionCatalog {
    /// Builds the catalog from human-readable action names ("Freeze Funds").
    /// Names that do not map to a known action, or that have no handler, are skipped.
    pub fn from_action_names<I, S>(names: I, handlers: &HandlerRegistry) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries = HashMap::new();
        for name in names {
            let label = name.as_ref().trim();
            if label.is_empty() {
                continue;
            }
            let key = canonical_action_key(label);
            let action = match RecognizedAction::from_str(&key) {
                Ok(action) => action,
                Err(_) => {
                    warn!(action_name = label, key = %key, "Skipping catalog entry for unknown action");
                    continue;
                }
            };
            let Some(handler) = handlers.get(action) else {
                warn!(action = %action, "Skipping catalog entry with no registered handler");
                continue;
            };
            entries.entry(action).or_insert_with(|| CatalogEntry {
                label: label.to_string(),
                handler,
            });
        }
        ActionCatalog { entries }
    }

    /// Reads a CSV with an `action_name` header.
    pub fn from_reader<R: Read>(reader: R, handlers: &HandlerRegistry) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut names = Vec::new();
        for record in csv_reader.deserialize::<ActionRow>() {
            names.push(record?.action_name);
        }
        Ok(Self::from_action_names(names, handlers))
    }

    pub fn load_csv<P: AsRef<Path>>(path: P, handlers: &HandlerRegistry) -> Result<Self> {
        let path_ref = path.as_ref();
        let file = File::open(path_ref).map_err(|e| {
            PipelineError::ConfigError(format!(
                "Failed to open action catalog '{}': {}",
                path_ref.display(),
                e
            ))
        })?;
        let catalog = Self::from_reader(file, handlers)?;
        info!(path = %path_ref.display(), actions = catalog.len(), "Loaded action catalog");
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, action: RecognizedAction) -> bool {
        self.entries.contains_key(&action)
    }

    pub fn label(&self, action: RecognizedAction) -> Option<&str> {
        self.entries.get(&action).map(|e| e.label.as_str())
    }

    /// Runs the handler for `action` and returns its output unchanged.
    pub fn dispatch(
        &self,
        action: Option<RecognizedAction>,
        customer: &CustomerRef,
    ) -> Result<String> {
        let action = action.ok_or(PipelineError::UnrecognizedAction { action: None })?;
        let entry = self
            .entries
            .get(&action)
            .ok_or_else(|| PipelineError::UnrecognizedAction {
                action: Some(action.key().to_string()),
            })?;
        info!(action = %action, customer = %customer, label = %entry.label, "Executing action");
        Ok(entry.handler.execute(customer))
    }
}

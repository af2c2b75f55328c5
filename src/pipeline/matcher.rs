use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use crate::data_model::CustomerRef;
use crate::error::{PipelineError, Result};
use crate::utils::strip_whitespace;

#[derive(Debug, Deserialize)]
struct CustomerRow {
    national_id: String,
    customer_id: String,
}

/// Read-only lookup from a normalized national identifier to the customer it
/// belongs to. Built once at startup and shared behind an `Arc`.
#[derive(Debug, Default, Clone)]
pub struct CustomerRegistry {
    customers: HashMap<String, CustomerRef>,
}

impl CustomerRegistry {
    /// Builds the registry from `(national_id, customer_id)` pairs. Identifiers
    /// are stored whitespace-stripped; on duplicates the first row is kept.
    pub fn from_rows<I, K, V>(rows: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut customers = HashMap::new();
        for (national_id, customer_id) in rows {
            let key = strip_whitespace(national_id.as_ref());
            if key.is_empty() {
                warn!("Skipping registry row with empty national_id");
                continue;
            }
            if customers.contains_key(&key) {
                warn!(national_id = %key, "Duplicate national_id in registry, keeping first entry");
                continue;
            }
            customers.insert(key, CustomerRef::new(customer_id));
        }
        CustomerRegistry { customers }
    }

    /// Reads a CSV with a `national_id,customer_id` header.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut rows = Vec::new();
        for record in csv_reader.deserialize::<CustomerRow>() {
            let row = record?;
            rows.push((row.national_id, row.customer_id));
        }
        Ok(Self::from_rows(rows))
    }

    pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let file = File::open(path_ref).map_err(|e| {
            PipelineError::ConfigError(format!(
                "Failed to open customer registry '{}': {}",
                path_ref.display(),
                e
            ))
        })?;
        let registry = Self::from_reader(file)?;
        info!(path = %path_ref.display(), customers = registry.len(), "Loaded customer registry");
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.customers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }

    /// Resolves a parsed identifier. Whitespace inside the identifier is
    /// ignored; the comparison is otherwise exact.
    pub fn match_customer(&self, identifier: Option<&str>) -> Result<CustomerRef> {
        let normalized = identifier.map(strip_whitespace).unwrap_or_default();
        if normalized.is_empty() {
            return Err(PipelineError::MissingIdentifier);
        }
        self.customers
            .get(&normalized)
            .cloned()
            .ok_or(PipelineError::NotFound {
                identifier: normalized,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> CustomerRegistry {
        CustomerRegistry::from_rows([("1234567890", "CUST001"), ("98765432", "CUST002")])
    }

    #[test]
    fn test_exact_match() {
        let customer = registry().match_customer(Some("1234567890")).unwrap();
        assert_eq!(customer.as_str(), "CUST001");
    }

    #[test]
    fn test_whitespace_is_stripped() {
        let customer = registry().match_customer(Some(" 1234 567 890\n")).unwrap();
        assert_eq!(customer.as_str(), "CUST001");
    }

    #[test]
    fn test_missing_identifier() {
        let reg = registry();
        assert!(matches!(reg.match_customer(None), Err(PipelineError::MissingIdentifier)));
        assert!(matches!(
            reg.match_customer(Some("   ")),
            Err(PipelineError::MissingIdentifier)
        ));
    }

    #[test]
    fn test_not_found_message() {
        let err = registry().match_customer(Some("55555555")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "National ID 55555555 not found in bank records. Order discarded."
        );
    }

    #[test]
    fn test_no_prefix_or_fuzzy_matching() {
        let reg = registry();
        assert!(reg.match_customer(Some("123456789")).is_err());
        assert!(reg.match_customer(Some("12345678901")).is_err());
    }

    #[test]
    fn test_csv_round_trip_and_duplicates() {
        let csv = "national_id,customer_id\n 1234 5678 90 , CUST001\n1234567890,CUST999\n11112222,CUST003\n";
        let reg = CustomerRegistry::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.match_customer(Some("1234567890")).unwrap().as_str(), "CUST001");
        assert_eq!(reg.match_customer(Some("11112222")).unwrap().as_str(), "CUST003");
    }

    #[test]
    fn test_csv_missing_column_is_error() {
        let csv = "national_id\n1234567890\n";
        let err = CustomerRegistry::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, PipelineError::CsvError { .. }));
    }

    #[test]
    fn test_load_csv_missing_file() {
        let err = CustomerRegistry::load_csv("/nonexistent/customers.csv").unwrap_err();
        assert!(matches!(err, PipelineError::ConfigError(_)));
    }
}

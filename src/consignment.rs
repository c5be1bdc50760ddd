//! Consignment message types
//!
//! The request and response shapes exchanged by `CreateConsignment`. Every field
//! defaults when missing from a payload, so callers may send partial records.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A shipment submitted for storage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Consignment {
    pub id: String,
    pub description: String,
    pub weight: i32,
    pub containers: Vec<Container>,
    pub vessel_id: String,
}

/// A container carried as part of a consignment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Container {
    pub id: String,
    pub customer_id: String,
    pub origin: String,
    pub user_id: String,
}

/// Confirmation returned for a stored consignment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Response {
    pub created: bool,
    pub consignment: Consignment,
}

impl Consignment {
    /// Create a consignment with only a description and weight set
    pub fn new(description: impl Into<String>, weight: i32) -> Self {
        Self {
            description: description.into(),
            weight,
            ..Default::default()
        }
    }

    /// Load a consignment from a JSON document on disk
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let consignment = serde_json::from_str(&contents)?;
        Ok(consignment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_fields_default() {
        let consignment: Consignment =
            serde_json::from_str(r#"{"description":"electronics","weight":200}"#).unwrap();
        assert_eq!(consignment, Consignment::new("electronics", 200));
        assert!(consignment.containers.is_empty());
        assert_eq!(consignment.vessel_id, "");
    }

    #[test]
    fn test_load_from_json_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "description": "This is a test consignment",
                "weight": 550,
                "containers": [
                    {{ "customer_id": "cust001", "user_id": "user001", "origin": "Manchester, United Kingdom" }}
                ],
                "vessel_id": "vessel001"
            }}"#
        )
        .unwrap();

        let consignment = Consignment::from_json_file(file.path()).unwrap();
        assert_eq!(consignment.weight, 550);
        assert_eq!(consignment.vessel_id, "vessel001");
        assert_eq!(consignment.containers.len(), 1);
        assert_eq!(consignment.containers[0].origin, "Manchester, United Kingdom");
        assert_eq!(consignment.containers[0].id, "");
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        assert!(Consignment::from_json_file(file.path()).is_err());
    }
}

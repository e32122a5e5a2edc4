//! Record store boundary
//!
//! The search engine only ever reads through [`RecordStore`]. Implementations
//! must be safe for concurrent reads; the engine shares one store across
//! every in-flight request.

pub mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::future::Future;
use thiserror::Error;

pub use memory::MemoryStore;

/// A searchable document record.
///
/// Everything except the name, owner and validity flag is opaque payload and
/// is passed through to results untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Set by ingestion when the extracted patient name passed validation
    #[serde(default = "default_name_valid")]
    pub name_valid: bool,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

fn default_name_valid() -> bool {
    true
}

impl Record {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: Some(name.into()),
            owner: None,
            name_valid: true,
            created_at: DateTime::<Utc>::default(),
            payload: Map::new(),
        }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn with_name_valid(mut self, valid: bool) -> Self {
        self.name_valid = valid;
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }

    /// Name attribute, if present and not blank
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }

    /// Whether this record is visible under the given owner scope
    pub fn in_scope(&self, scope: Option<&str>) -> bool {
        match scope {
            None => true,
            Some(owner) => self.owner.as_deref() == Some(owner),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record store unavailable: {0}")]
    Unavailable(String),
    #[error("Record store query failed: {0}")]
    Query(String),
    #[error("Failed to load records from {path}: {reason}")]
    Load { path: String, reason: String },
}

/// Read-only predicate queries the engine needs from a record store.
///
/// Results are most-recent-first and never exceed `limit`. `scope`, when
/// present, restricts results to records owned by that scope. Name
/// predicates compare the normalized form of both sides (see
/// [`crate::search::normalize`]), so stored names need not be canonical.
pub trait RecordStore: Send + Sync {
    /// Records whose normalized name equals `name`
    fn find_by_exact_name(
        &self,
        name: &str,
        scope: Option<&str>,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Record>, StoreError>> + Send;

    /// Records whose normalized name starts with `prefix`
    fn find_by_prefix(
        &self,
        prefix: &str,
        scope: Option<&str>,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Record>, StoreError>> + Send;

    /// Records whose normalized name contains `substring`
    fn find_by_contains(
        &self,
        substring: &str,
        scope: Option<&str>,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Record>, StoreError>> + Send;

    /// Most recent records whose name validity flag equals `name_valid`
    fn find_recent(
        &self,
        name_valid: bool,
        scope: Option<&str>,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Record>, StoreError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_payload_is_flattened() {
        let raw = json!({
            "id": "doc-1",
            "name": "GARCIA, ANA",
            "owner": "clinic-a",
            "created_at": "2024-03-01T10:00:00Z",
            "filename": "lab.pdf",
            "tags": ["lab"]
        });

        let record: Record = serde_json::from_value(raw).unwrap();
        assert_eq!(record.name(), Some("GARCIA, ANA"));
        assert!(record.name_valid);
        assert_eq!(record.payload.get("filename"), Some(&json!("lab.pdf")));

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["filename"], json!("lab.pdf"));
        assert_eq!(back["owner"], json!("clinic-a"));
    }

    #[test]
    fn test_blank_name_is_absent() {
        let record = Record::new("doc-2", "   ");
        assert_eq!(record.name(), None);

        let mut record = Record::new("doc-3", "X");
        record.name = None;
        assert_eq!(record.name(), None);
    }

    #[test]
    fn test_scope() {
        let record = Record::new("doc-1", "LOPEZ, JUAN").with_owner("a");
        assert!(record.in_scope(None));
        assert!(record.in_scope(Some("a")));
        assert!(!record.in_scope(Some("b")));
        assert!(!Record::new("doc-2", "LOPEZ").in_scope(Some("a")));
    }
}

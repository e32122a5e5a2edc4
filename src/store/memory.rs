//! In-process record store over an immutable snapshot of records

use super::{Record, RecordStore, StoreError};
use crate::search::normalize;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Snapshot store kept in most-recent-first order.
///
/// The snapshot is never mutated after construction, so concurrent readers
/// need no locking. Name lookups run against a normalized copy of each name
/// computed once at load time.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    records: Vec<IndexedRecord>,
}

#[derive(Debug, Clone)]
struct IndexedRecord {
    record: Record,
    /// Normalized name, empty when the record has none
    key: String,
}

impl MemoryStore {
    pub fn new(mut records: Vec<Record>) -> Self {
        // Stable: records with equal timestamps keep their input order
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let records = records
            .into_iter()
            .map(|record| {
                let key = record
                    .name()
                    .map(|n| normalize(n).into_string())
                    .unwrap_or_default();
                IndexedRecord { record, key }
            })
            .collect();
        Self { records }
    }

    /// Load records from a JSON array file, or JSON Lines when the file
    /// extension is `.jsonl`
    pub fn from_file(path: &Path) -> Result<Self, StoreError> {
        let load_err = |reason: String| StoreError::Load {
            path: path.display().to_string(),
            reason,
        };

        let raw = fs::read_to_string(path).map_err(|e| load_err(e.to_string()))?;

        let records: Vec<Record> = if path.extension().is_some_and(|ext| ext == "jsonl") {
            raw.lines()
                .enumerate()
                .filter(|(_, line)| !line.trim().is_empty())
                .map(|(idx, line)| {
                    serde_json::from_str(line)
                        .map_err(|e| load_err(format!("line {}: {}", idx + 1, e)))
                })
                .collect::<Result<_, _>>()?
        } else {
            serde_json::from_str(&raw).map_err(|e| load_err(e.to_string()))?
        };

        info!("Loaded {} records from {}", records.len(), path.display());
        Ok(Self::new(records))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn select<F>(&self, scope: Option<&str>, limit: usize, predicate: F) -> Vec<Record>
    where
        F: Fn(&IndexedRecord) -> bool,
    {
        self.records
            .iter()
            .filter(|r| r.record.in_scope(scope))
            .filter(|r| predicate(r))
            .take(limit)
            .map(|r| r.record.clone())
            .collect()
    }

    /// Name lookups that normalize to nothing match nothing
    fn select_by_key<F>(
        &self,
        needle: &str,
        scope: Option<&str>,
        limit: usize,
        matches: F,
    ) -> Vec<Record>
    where
        F: Fn(&str, &str) -> bool,
    {
        let needle = normalize(needle);
        if needle.is_empty() {
            return Vec::new();
        }
        self.select(scope, limit, |r| !r.key.is_empty() && matches(&r.key, needle.as_str()))
    }
}

impl RecordStore for MemoryStore {
    async fn find_by_exact_name(
        &self,
        name: &str,
        scope: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Record>, StoreError> {
        let found = self.select_by_key(name, scope, limit, |key, needle| key == needle);
        debug!(term = name, found = found.len(), "memory store exact lookup");
        Ok(found)
    }

    async fn find_by_prefix(
        &self,
        prefix: &str,
        scope: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Record>, StoreError> {
        let found = self.select_by_key(prefix, scope, limit, |key, needle| {
            key.starts_with(needle)
        });
        debug!(prefix, found = found.len(), "memory store prefix lookup");
        Ok(found)
    }

    async fn find_by_contains(
        &self,
        substring: &str,
        scope: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Record>, StoreError> {
        let found = self.select_by_key(substring, scope, limit, |key, needle| {
            key.contains(needle)
        });
        debug!(substring, found = found.len(), "memory store contains lookup");
        Ok(found)
    }

    async fn find_recent(
        &self,
        name_valid: bool,
        scope: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Record>, StoreError> {
        Ok(self.select(scope, limit, |r| r.record.name_valid == name_valid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::io::Write;

    fn at(day: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap()
    }

    fn store() -> MemoryStore {
        MemoryStore::new(vec![
            Record::new("1", "GARCIA LOPEZ, MARIA").with_owner("a").with_created_at(at(1)),
            Record::new("2", "MARTINEZ, JUAN").with_owner("a").with_created_at(at(3)),
            Record::new("3", "GARCIA, ANA").with_owner("b").with_created_at(at(2)),
            Record::new("4", "Garza, Pedro")
                .with_owner("a")
                .with_created_at(at(4))
                .with_name_valid(false),
        ])
    }

    fn ids(records: &[Record]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_exact_matches_normalized_name() {
        let store = store();
        let found = store.find_by_exact_name("GARCIA, ANA", None, 10).await.unwrap();
        assert_eq!(ids(&found), vec!["3"]);
        let found = store.find_by_exact_name("garcia,  ana", None, 10).await.unwrap();
        assert_eq!(ids(&found), vec!["3"]);
        assert!(store.find_by_exact_name("GARCIA", None, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lookups_see_through_punctuation_and_spacing() {
        let store = MemoryStore::new(vec![
            Record::new("1", "O'Brien,  Ana").with_created_at(at(1)),
            Record::new("2", "de la  Cruz, Pedro").with_created_at(at(2)),
        ]);

        let found = store.find_by_exact_name("OBRIEN, ANA", None, 10).await.unwrap();
        assert_eq!(ids(&found), vec!["1"]);
        let found = store.find_by_prefix("OBR", None, 10).await.unwrap();
        assert_eq!(ids(&found), vec!["1"]);
        let found = store.find_by_contains("LA CRUZ", None, 10).await.unwrap();
        assert_eq!(ids(&found), vec!["2"]);

        assert!(store.find_by_contains("?!", None, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_prefix_ignores_case_and_orders_recent_first() {
        let store = store();
        let found = store.find_by_prefix("gar", None, 10).await.unwrap();
        assert_eq!(ids(&found), vec!["4", "3", "1"]);
    }

    #[tokio::test]
    async fn test_contains_with_scope_and_limit() {
        let store = store();
        let found = store.find_by_contains("MAR", Some("a"), 10).await.unwrap();
        assert_eq!(ids(&found), vec!["2", "1"]);

        let found = store.find_by_contains("MAR", Some("a"), 1).await.unwrap();
        assert_eq!(ids(&found), vec!["2"]);
    }

    #[tokio::test]
    async fn test_recent_filters_on_flag() {
        let store = store();
        let found = store.find_recent(true, None, 10).await.unwrap();
        assert_eq!(ids(&found), vec!["2", "3", "1"]);
        let found = store.find_recent(false, None, 10).await.unwrap();
        assert_eq!(ids(&found), vec!["4"]);
    }

    #[test]
    fn test_load_json_array() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"[{{"id":"a","name":"PEREZ, LUIS","created_at":"2024-02-01T00:00:00Z"}},
               {{"id":"b","name":"RUIZ, ANA","filename":"x.pdf"}}]"#
        )
        .unwrap();

        let store = MemoryStore::from_file(file.path()).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_load_jsonl_reports_line() {
        let mut file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
        writeln!(file, r#"{{"id":"a","name":"PEREZ, LUIS"}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, "not json").unwrap();

        let err = MemoryStore::from_file(file.path()).unwrap_err();
        assert!(matches!(err, StoreError::Load { .. }));
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_missing_file() {
        let err = MemoryStore::from_file(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, StoreError::Load { .. }));
    }
}

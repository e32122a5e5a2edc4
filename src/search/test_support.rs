//! Fake stores for exercising retrieval failure paths

use super::retriever::Strategy;
use crate::store::{MemoryStore, Record, RecordStore, StoreError};

/// Store whose every query fails, as if the connection were gone
pub struct FailingStore;

impl RecordStore for FailingStore {
    async fn find_by_exact_name(
        &self,
        _name: &str,
        _scope: Option<&str>,
        _limit: usize,
    ) -> Result<Vec<Record>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn find_by_prefix(
        &self,
        _prefix: &str,
        _scope: Option<&str>,
        _limit: usize,
    ) -> Result<Vec<Record>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn find_by_contains(
        &self,
        _substring: &str,
        _scope: Option<&str>,
        _limit: usize,
    ) -> Result<Vec<Record>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn find_recent(
        &self,
        _name_valid: bool,
        _scope: Option<&str>,
        _limit: usize,
    ) -> Result<Vec<Record>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

/// Memory store where the listed strategies fail
pub struct FlakyStore {
    inner: MemoryStore,
    failing: Vec<Strategy>,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore, failing: &[Strategy]) -> Self {
        Self {
            inner,
            failing: failing.to_vec(),
        }
    }

    fn check(&self, strategy: Strategy) -> Result<(), StoreError> {
        if self.failing.contains(&strategy) {
            return Err(StoreError::Query(format!("{} timed out", strategy.as_str())));
        }
        Ok(())
    }
}

impl RecordStore for FlakyStore {
    async fn find_by_exact_name(
        &self,
        name: &str,
        scope: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Record>, StoreError> {
        self.check(Strategy::ExactMatch)?;
        self.inner.find_by_exact_name(name, scope, limit).await
    }

    async fn find_by_prefix(
        &self,
        prefix: &str,
        scope: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Record>, StoreError> {
        self.check(Strategy::PrefixMatch)?;
        self.inner.find_by_prefix(prefix, scope, limit).await
    }

    async fn find_by_contains(
        &self,
        substring: &str,
        scope: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Record>, StoreError> {
        self.check(Strategy::SubstringMatch)?;
        self.inner.find_by_contains(substring, scope, limit).await
    }

    async fn find_recent(
        &self,
        name_valid: bool,
        scope: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Record>, StoreError> {
        self.check(Strategy::FuzzyScan)?;
        self.inner.find_recent(name_valid, scope, limit).await
    }
}

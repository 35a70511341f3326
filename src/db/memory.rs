//! In-memory `AddressRepository` for tests

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::db::repository::AddressRepository;
use crate::types::{CleanedAddressRecord, RawAddress};

/// Source rows and appended target rows held in vectors
#[derive(Default)]
pub struct InMemoryRepository {
    source: Vec<RawAddress>,
    target: Mutex<Vec<CleanedAddressRecord>>,
    fail_fetch: AtomicBool,
    fail_inserts: AtomicBool,
}

impl InMemoryRepository {
    pub fn with_source(source: Vec<RawAddress>) -> Self {
        Self {
            source,
            ..Default::default()
        }
    }

    /// Pre-populate the target as if an earlier run had written these records
    pub fn seed_target(&self, records: Vec<CleanedAddressRecord>) {
        self.target.lock().extend(records);
    }

    pub fn fail_fetch(&self) {
        self.fail_fetch.store(true, Ordering::Relaxed);
    }

    pub fn fail_inserts(&self) {
        self.fail_inserts.store(true, Ordering::Relaxed);
    }

    pub fn records(&self) -> Vec<CleanedAddressRecord> {
        self.target.lock().clone()
    }

    pub fn record_for(&self, key: i64) -> Option<CleanedAddressRecord> {
        self.target.lock().iter().find(|r| r.key == key).cloned()
    }
}

#[async_trait]
impl AddressRepository for InMemoryRepository {
    async fn last_processed_key(&self) -> i64 {
        self.target.lock().iter().map(|r| r.key).max().unwrap_or(0)
    }

    async fn fetch_batch(&self, cutoff: i64, batch_size: usize) -> Result<Vec<RawAddress>> {
        if self.fail_fetch.load(Ordering::Relaxed) {
            anyhow::bail!("relation \"dbo.dim_address\" does not exist");
        }

        let mut rows: Vec<RawAddress> = self
            .source
            .iter()
            .filter(|r| r.key > cutoff)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.key);
        rows.truncate(batch_size);
        Ok(rows)
    }

    async fn is_processed(&self, key: i64) -> bool {
        self.target.lock().iter().any(|r| r.key == key)
    }

    async fn append_record(&self, record: &CleanedAddressRecord) -> bool {
        if self.fail_inserts.load(Ordering::Relaxed) {
            return false;
        }
        self.target.lock().push(record.clone());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn raw(key: i64) -> RawAddress {
        RawAddress {
            key,
            address_line_1: format!("{} MAIN ST", key),
            ..Default::default()
        }
    }

    fn failed(key: i64) -> CleanedAddressRecord {
        CleanedAddressRecord::failed(&raw(key), "ZERO_RESULTS", Utc::now())
    }

    #[tokio::test]
    async fn last_processed_key_is_zero_for_empty_target() {
        let repo = InMemoryRepository::default();
        assert_eq!(repo.last_processed_key().await, 0);
    }

    #[tokio::test]
    async fn last_processed_key_is_maximum_key() {
        let repo = InMemoryRepository::default();
        repo.seed_target(vec![failed(3), failed(11), failed(7)]);
        assert_eq!(repo.last_processed_key().await, 11);
    }

    #[tokio::test]
    async fn is_processed_reflects_target_membership() {
        let repo = InMemoryRepository::default();
        repo.seed_target(vec![failed(5)]);
        assert!(repo.is_processed(5).await);
        assert!(!repo.is_processed(6).await);
    }

    #[tokio::test]
    async fn fetch_batch_is_exclusive_ordered_and_bounded() {
        let repo = InMemoryRepository::with_source(vec![raw(4), raw(1), raw(3), raw(2), raw(5)]);
        let batch = repo.fetch_batch(1, 3).await.unwrap();
        let keys: Vec<i64> = batch.iter().map(|r| r.key).collect();
        assert_eq!(keys, vec![2, 3, 4]);
    }

    #[tokio::test]
    async fn failing_fetch_is_reported_as_error() {
        let repo = InMemoryRepository::with_source(vec![raw(1)]);
        repo.fail_fetch();
        assert!(repo.fetch_batch(0, 10).await.is_err());
    }
}

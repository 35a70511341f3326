//! Address repository: the source and target tables behind one seam

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::error;

use crate::config::TableRef;
use crate::db::queries;
use crate::types::{CleanedAddressRecord, RawAddress};

/// Storage operations the pipeline needs.
///
/// Only `fetch_batch` reports failure to the caller. The other operations log
/// query errors and fall back to conservative defaults: cutoff 0,
/// "not processed", "not saved".
#[async_trait]
pub trait AddressRepository: Send + Sync {
    /// Maximum key already present in the target, 0 if none
    async fn last_processed_key(&self) -> i64;

    /// Up to `batch_size` source rows with key above `cutoff`, ascending
    async fn fetch_batch(&self, cutoff: i64, batch_size: usize) -> Result<Vec<RawAddress>>;

    /// True iff the target already holds a row for `key`
    async fn is_processed(&self, key: i64) -> bool;

    /// Append one record; false if it could not be written
    async fn append_record(&self, record: &CleanedAddressRecord) -> bool;
}

/// PostgreSQL-backed repository over two pools
pub struct PgAddressRepository {
    source: PgPool,
    target: PgPool,
    source_table: TableRef,
    target_table: TableRef,
}

/// Cutoff for the next run; a failed query is logged and treated as an empty target
pub async fn last_processed_key_or_zero(pool: &PgPool, table: &TableRef) -> i64 {
    match queries::address::get_last_processed_key(pool, table).await {
        Ok(key) => key,
        Err(e) => {
            error!("An exception occurred while checking latest loaded record: {:#}", e);
            0
        }
    }
}

impl PgAddressRepository {
    pub fn new(source: PgPool, target: PgPool, source_table: TableRef, target_table: TableRef) -> Self {
        Self {
            source,
            target,
            source_table,
            target_table,
        }
    }
}

#[async_trait]
impl AddressRepository for PgAddressRepository {
    async fn last_processed_key(&self) -> i64 {
        last_processed_key_or_zero(&self.target, &self.target_table).await
    }

    async fn fetch_batch(&self, cutoff: i64, batch_size: usize) -> Result<Vec<RawAddress>> {
        queries::address::fetch_batch(&self.source, &self.source_table, cutoff, batch_size).await
    }

    async fn is_processed(&self, key: i64) -> bool {
        match queries::address::count_processed(&self.target, &self.target_table, key).await {
            Ok(count) => count > 0,
            Err(e) => {
                error!("An exception occurred while checking if record exists: {:#}", e);
                false
            }
        }
    }

    async fn append_record(&self, record: &CleanedAddressRecord) -> bool {
        match queries::address::insert_record(&self.target, &self.target_table, record).await {
            Ok(()) => true,
            Err(e) => {
                error!("An exception occurred while saving address {}: {:#}", record.key, e);
                false
            }
        }
    }
}

//! Queries against the source address table and the cleaned-address target table.
//!
//! Table and column names come from configuration and are validated as plain
//! identifiers at load time; values are always bound.

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::config::TableRef;
use crate::types::{CleanedAddressRecord, RawAddress};

fn last_processed_key_sql(target: &TableRef) -> String {
    format!(
        "SELECT CAST(COALESCE(MAX({key}), 0) AS BIGINT) FROM {table}",
        key = target.key_column,
        table = target.qualified_name(),
    )
}

fn fetch_batch_sql(source: &TableRef) -> String {
    // ILIKE keeps the case-insensitive matching of the warehouse collation
    format!(
        r#"
        SELECT
            CAST({key} AS BIGINT) AS address_key,
            COALESCE(ADDRESS_LINE_1, '') AS address_line_1,
            COALESCE(ADDRESS_LINE_2, '') AS address_line_2,
            COALESCE(ATTENTION, '') AS notes,
            COALESCE(CITY, '') AS city,
            COALESCE(STATE, '') AS state,
            COALESCE(ZIP, '') AS zip,
            COALESCE(COUNTY, '') AS county
        FROM {table}
        WHERE dss_record_source ILIKE '%Plandata.dbo%'
          AND dss_current_flag = 'Y'
          AND TRIM(ADDRESS_LINE_1) NOT ILIKE '%PO BOX%'
          AND {key} > $1
        ORDER BY {key}
        LIMIT $2
        "#,
        key = source.key_column,
        table = source.qualified_name(),
    )
}

fn is_processed_sql(target: &TableRef) -> String {
    format!(
        "SELECT COUNT(1) FROM {table} WHERE {key} = $1",
        key = target.key_column,
        table = target.qualified_name(),
    )
}

fn insert_record_sql(target: &TableRef) -> String {
    format!(
        r#"
        INSERT INTO {table} (
            responsedate, responsemessage, responseaccuracy, responsetypes, responsematchcount,
            NOTES, {key},
            SOURCE_SYSTEM_ADDRESS_LINE_1, SOURCE_SYSTEM_ADDRESS_LINE_2,
            SOURCE_SYSTEM_CITY, SOURCE_SYSTEM_STATE, SOURCE_SYSTEM_COUNTY, SOURCE_SYSTEM_ZIP,
            ADDRESS_LINE_1, ADDRESS_LINE_2, CITY, STATE, COUNTY, ZIP, COUNTRY,
            LATITUDE, LONGITUDE
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                $14, $15, $16, $17, $18, $19, $20, $21, $22)
        "#,
        key = target.key_column,
        table = target.qualified_name(),
    )
}

/// Highest key already present in the target table, 0 when empty
pub async fn get_last_processed_key(pool: &PgPool, target: &TableRef) -> Result<i64> {
    let key: i64 = sqlx::query_scalar(&last_processed_key_sql(target))
        .fetch_one(pool)
        .await
        .with_context(|| format!("Failed to read cutoff from {}", target.qualified_name()))?;

    Ok(key)
}

/// Next batch of current, non-PO-box source addresses with key above `cutoff`
pub async fn fetch_batch(
    pool: &PgPool,
    source: &TableRef,
    cutoff: i64,
    batch_size: usize,
) -> Result<Vec<RawAddress>> {
    let limit = i64::try_from(batch_size).unwrap_or(i64::MAX);

    let rows = sqlx::query_as::<_, RawAddress>(&fetch_batch_sql(source))
        .bind(cutoff)
        .bind(limit)
        .fetch_all(pool)
        .await
        .with_context(|| format!("Could not read address list from {}", source.qualified_name()))?;

    Ok(rows)
}

/// Number of target rows carrying `key`
pub async fn count_processed(pool: &PgPool, target: &TableRef, key: i64) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(&is_processed_sql(target))
        .bind(key)
        .fetch_one(pool)
        .await
        .with_context(|| format!("Failed to check key {} in {}", key, target.qualified_name()))?;

    Ok(count)
}

/// Append one cleaned (or failed) address row. Existing rows are never touched.
pub async fn insert_record(
    pool: &PgPool,
    target: &TableRef,
    record: &CleanedAddressRecord,
) -> Result<()> {
    let cleaned = record.cleaned.as_ref();

    sqlx::query(&insert_record_sql(target))
        .bind(record.response_date)
        .bind(&record.response_message)
        .bind(&record.response_accuracy)
        .bind(&record.response_types)
        .bind(record.response_match_count)
        .bind(&record.notes)
        .bind(record.key)
        .bind(&record.source.address_line_1)
        .bind(&record.source.address_line_2)
        .bind(&record.source.city)
        .bind(&record.source.state)
        .bind(&record.source.county)
        .bind(&record.source.zip)
        .bind(cleaned.map(|c| c.address_line_1.as_str()))
        .bind(cleaned.map(|c| c.address_line_2.as_str()))
        .bind(cleaned.map(|c| c.city.as_str()))
        .bind(cleaned.map(|c| c.state.as_str()))
        .bind(cleaned.map(|c| c.county.as_str()))
        .bind(cleaned.map(|c| c.zip.as_str()))
        .bind(cleaned.map(|c| c.country.as_str()))
        .bind(record.latitude)
        .bind(record.longitude)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to insert key {} into {}", record.key, target.qualified_name()))?;

    Ok(())
}

// =============================================================================
// Tests. The live ones need DATABASE_URL pointing at a scratch PostgreSQL.
// =============================================================================

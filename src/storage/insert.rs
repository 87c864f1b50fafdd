//! Database insert operations.
//!
//! All inserts use parameterized queries. Report rows are written in one
//! transaction per run so the store sees a single flush instead of a write
//! per URL.

use sqlx::{Pool, Sqlite};

use crate::error_handling::DatabaseError;

use super::models::{NewBatch, NewReport};

/// Inserts a batch row and returns its id.
pub async fn insert_batch(pool: &Pool<Sqlite>, batch: &NewBatch) -> Result<i64, DatabaseError> {
    let result = sqlx::query(
        "INSERT INTO batches (project_id, user_id, source, created_at) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(batch.project_id)
    .bind(&batch.user_id)
    .bind(batch.source.as_str())
    .bind(batch.created_at)
    .execute(pool)
    .await
    .map_err(DatabaseError::SqlError)?;
    Ok(result.last_insert_rowid())
}

/// Bulk-inserts report rows in a single transaction.
pub async fn insert_reports(
    pool: &Pool<Sqlite>,
    reports: &[NewReport],
) -> Result<(), DatabaseError> {
    if reports.is_empty() {
        return Ok(());
    }

    let mut tx = pool.begin().await.map_err(DatabaseError::SqlError)?;
    for report in reports {
        sqlx::query(
            "INSERT INTO reports (url_id, user_id, batch_id, co2, rating, bytes, green, \
             data_cache_ratio, return_visitor_ratio, green_hosting_factor, grid_intensity, \
             created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )
        .bind(report.url_id)
        .bind(&report.user_id)
        .bind(report.batch_id)
        .bind(report.co2)
        .bind(&report.rating)
        .bind(report.bytes)
        .bind(report.green)
        .bind(report.data_cache_ratio)
        .bind(report.return_visitor_ratio)
        .bind(report.green_hosting_factor)
        .bind(&report.grid_intensity)
        .bind(report.created_at)
        .execute(&mut *tx)
        .await
        .map_err(DatabaseError::SqlError)?;
    }
    tx.commit().await.map_err(DatabaseError::SqlError)?;

    log::debug!("Flushed {} report(s) to database", reports.len());
    Ok(())
}

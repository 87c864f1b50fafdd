//! Read queries.

use sqlx::{Pool, Row, Sqlite};

use crate::error_handling::DatabaseError;
use crate::scheduler::cadence::ReportFrequency;
use crate::scheduler::plan::UrlJob;

/// Reads every URL together with its project's cadence, ordered by project.
///
/// The ordering matters: batch planning folds contiguous project blocks, so
/// the scheduler relies on URLs of one project arriving together.
pub async fn fetch_scheduled_urls(pool: &Pool<Sqlite>) -> Result<Vec<UrlJob>, DatabaseError> {
    let rows = sqlx::query(
        "SELECT u.id, u.url, u.user_id, u.project_id, u.green_hosting_factor, \
         p.report_frequency \
         FROM urls u \
         JOIN projects p ON p.id = u.project_id \
         ORDER BY u.project_id, u.id",
    )
    .fetch_all(pool)
    .await
    .map_err(DatabaseError::SqlError)?;

    let mut jobs = Vec::with_capacity(rows.len());
    for row in rows {
        let frequency_raw: String = row.get("report_frequency");
        let report_frequency = match ReportFrequency::parse(&frequency_raw) {
            Some(frequency) => frequency,
            None => {
                // The schema CHECK should make this unreachable.
                log::warn!(
                    "Unknown report frequency {:?} for project {}, treating as daily",
                    frequency_raw,
                    row.get::<i64, _>("project_id")
                );
                ReportFrequency::Daily
            }
        };
        jobs.push(UrlJob {
            id: row.get("id"),
            url: row.get("url"),
            user_id: row.get("user_id"),
            project_id: row.get("project_id"),
            green_hosting_factor: row.get("green_hosting_factor"),
            report_frequency,
        });
    }
    Ok(jobs)
}

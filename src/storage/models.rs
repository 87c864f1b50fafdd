//! Storage row types.

use crate::estimator::Report;
use crate::scheduler::plan::BatchSource;

/// A batch row awaiting insertion.
#[derive(Debug, Clone)]
pub struct NewBatch {
    pub project_id: i64,
    pub user_id: String,
    pub source: BatchSource,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
}

/// A report row queued for bulk insertion at the end of a run.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub url_id: i64,
    pub user_id: String,
    pub batch_id: Option<i64>,
    pub co2: f64,
    pub rating: Option<String>,
    pub bytes: i64,
    /// Tri-state hosting status; `None` means unreported.
    pub green: Option<bool>,
    pub data_cache_ratio: f64,
    pub return_visitor_ratio: f64,
    pub green_hosting_factor: f64,
    /// JSON echo of the per-segment grid intensity used for the estimate.
    pub grid_intensity: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
}

impl NewReport {
    /// Flattens an estimation [`Report`] into a row.
    pub fn from_report(
        url_id: i64,
        user_id: &str,
        batch_id: Option<i64>,
        report: &Report,
        created_at: i64,
    ) -> Self {
        NewReport {
            url_id,
            user_id: user_id.to_string(),
            batch_id,
            co2: report.co2.total,
            rating: report.co2.rating.clone(),
            bytes: report.variables.bytes as i64,
            green: report.green,
            data_cache_ratio: report.variables.data_cache_ratio,
            return_visitor_ratio: report.variables.return_visitor_ratio,
            green_hosting_factor: report.variables.green_hosting_factor,
            grid_intensity: serde_json::to_string(&report.variables.grid_intensity)
                .unwrap_or_else(|_| "{}".to_string()),
            created_at,
        }
    }
}

//! Batch planning.
//!
//! A pure pre-pass over the ordered URL sequence: select the URLs that
//! qualify for this run and fold them into one planned batch per contiguous
//! project block. Batch rows are created from the plan before estimation
//! starts, so estimation order cannot influence batch assignment.

use chrono::NaiveDate;

use super::cadence::ReportFrequency;

/// One schedulable URL row joined with its project's cadence.
#[derive(Debug, Clone, PartialEq)]
pub struct UrlJob {
    pub id: i64,
    pub url: String,
    pub user_id: String,
    pub project_id: i64,
    /// Per-URL hosting override; skips the registry lookup when set.
    pub green_hosting_factor: Option<f64>,
    pub report_frequency: ReportFrequency,
}

/// How a run was started.
#[derive(Debug, Clone, PartialEq)]
pub enum RunMode {
    /// Cadence-gated run over every URL.
    Scheduled,
    /// Caller-supplied project and user; cadence is ignored.
    Manual { project_id: i64, user_id: String },
}

/// Recorded provenance of a batch row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchSource {
    Auto,
    Manual,
}

impl BatchSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchSource::Auto => "auto",
            BatchSource::Manual => "manual",
        }
    }
}

/// A contiguous block of qualifying URLs sharing one project, to be written
/// as a single batch row.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedBatch {
    pub project_id: i64,
    pub user_id: String,
    pub source: BatchSource,
    pub urls: Vec<UrlJob>,
}

/// Folds the ordered URL sequence into planned batches.
///
/// A new batch starts whenever a qualifying URL's project differs from the
/// immediately preceding qualifying URL's project, so an input ordered by
/// project yields exactly one batch per project.
pub fn plan_batches(urls: Vec<UrlJob>, mode: &RunMode, today: NaiveDate) -> Vec<PlannedBatch> {
    let source = match mode {
        RunMode::Scheduled => BatchSource::Auto,
        RunMode::Manual { .. } => BatchSource::Manual,
    };

    let mut batches: Vec<PlannedBatch> = Vec::new();
    for job in urls {
        let qualifies = match mode {
            RunMode::Scheduled => job.report_frequency.qualifies(today),
            RunMode::Manual {
                project_id,
                user_id,
            } => job.project_id == *project_id && job.user_id == *user_id,
        };
        if !qualifies {
            continue;
        }
        match batches.last_mut() {
            Some(batch) if batch.project_id == job.project_id => batch.urls.push(job),
            _ => batches.push(PlannedBatch {
                project_id: job.project_id,
                user_id: job.user_id.clone(),
                source,
                urls: vec![job],
            }),
        }
    }
    batches
}

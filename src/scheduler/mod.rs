//! Batch scheduling.
//!
//! A run selects the URLs to measure (cadence-gated or manual), creates one
//! batch row per contiguous project block up front, estimates every selected
//! URL with bounded concurrency, and flushes all reports in a single bulk
//! write at the end. Per-URL failures are logged and skipped; they never
//! abort the run.

pub mod cadence;
pub mod plan;

pub use cadence::ReportFrequency;
pub use plan::{plan_batches, BatchSource, PlannedBatch, RunMode, UrlJob};

use std::future::Future;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use log::{info, warn};
use sqlx::{Pool, Sqlite};
use tokio::sync::Semaphore;

use crate::error_handling::{DatabaseError, ErrorType, LoadError, ProcessingStats};
use crate::estimator::{self, EstimationOptions, ModelParams};
use crate::hosting::GreenHostingResolver;
use crate::recorder::{RequestData, ResourceRecorder};
use crate::storage::{self, NewBatch, NewReport};

/// Seam for page measurement, so batch runs are testable without a browser.
pub trait Measure: Send + Sync {
    fn measure<'a>(
        &'a self,
        url: &'a str,
    ) -> impl Future<Output = Result<RequestData, LoadError>> + Send + 'a;
}

impl Measure for ResourceRecorder {
    fn measure<'a>(
        &'a self,
        url: &'a str,
    ) -> impl Future<Output = Result<RequestData, LoadError>> + Send + 'a {
        self.record(url)
    }
}

/// Summary of one scheduler run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// URLs that qualified for this run.
    pub planned_urls: usize,
    /// Reports actually produced and queued.
    pub reported: usize,
    /// URLs skipped because measurement or estimation failed.
    pub skipped: usize,
    /// Batch rows created.
    pub batches: usize,
    pub elapsed_seconds: f64,
}

/// Runs the scheduler once.
///
/// Reads all URLs (ordered by project), plans batches as a pure pre-pass,
/// inserts the batch rows, then estimates with at most `max_concurrency`
/// concurrent browser sessions. Batch ids are fixed before estimation
/// begins, so concurrent completion order cannot affect assignment.
///
/// # Errors
///
/// Only failures that make the run impossible (reading the URL set) are
/// returned. Batch-row and report-write failures are logged, counted in
/// `stats`, and the run continues.
pub async fn run<M>(
    pool: &Pool<Sqlite>,
    measurer: Arc<M>,
    resolver: Arc<GreenHostingResolver>,
    model: Arc<ModelParams>,
    stats: Arc<ProcessingStats>,
    mode: RunMode,
    today: NaiveDate,
    max_concurrency: usize,
) -> Result<RunSummary, DatabaseError>
where
    M: Measure + 'static,
{
    let start = std::time::Instant::now();

    let urls = storage::fetch_scheduled_urls(pool).await?;
    let planned = plan_batches(urls, &mode, today);
    info!(
        "Planned {} batch(es) for {} run on {}",
        planned.len(),
        match &mode {
            RunMode::Scheduled => "scheduled",
            RunMode::Manual { .. } => "manual",
        },
        today
    );

    // Materialize the plan: batch rows first, giving a static url -> batch-id
    // map for the estimation fan-out.
    let mut batches = 0usize;
    let mut jobs: Vec<(UrlJob, i64)> = Vec::new();
    for batch in planned {
        let row = NewBatch {
            project_id: batch.project_id,
            user_id: batch.user_id.clone(),
            source: batch.source,
            created_at: Utc::now().timestamp_millis(),
        };
        let batch_id = match storage::insert_batch(pool, &row).await {
            Ok(id) => id,
            Err(e) => {
                stats.increment(ErrorType::PersistenceError);
                log::error!(
                    "Failed to create batch for project {}: {}; skipping its {} URL(s)",
                    batch.project_id,
                    e,
                    batch.urls.len()
                );
                continue;
            }
        };
        batches += 1;
        for job in batch.urls {
            jobs.push((job, batch_id));
        }
    }
    let planned_urls = jobs.len();

    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut tasks = FuturesUnordered::new();
    for (job, batch_id) in jobs {
        let semaphore = Arc::clone(&semaphore);
        let measurer = Arc::clone(&measurer);
        let resolver = Arc::clone(&resolver);
        let model = Arc::clone(&model);
        let stats = Arc::clone(&stats);
        tasks.push(tokio::spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return None,
            };
            estimate_job(&*measurer, &resolver, &model, &stats, &job, batch_id).await
        }));
    }

    let mut rows: Vec<NewReport> = Vec::new();
    while let Some(task) = tasks.next().await {
        match task {
            Ok(Some(row)) => rows.push(row),
            Ok(None) => {}
            Err(join_error) => warn!("Estimation task panicked: {:?}", join_error),
        }
    }

    let reported = rows.len();
    let skipped = planned_urls - reported;

    // One bulk write at the end of the run bounds round-trips to the store.
    if let Err(e) = storage::insert_reports(pool, &rows).await {
        stats.increment(ErrorType::PersistenceError);
        log::error!("Failed to persist {} report(s): {}", rows.len(), e);
    }

    stats.log_summary();
    let elapsed_seconds = start.elapsed().as_secs_f64();
    info!(
        "Run complete: {} reported, {} skipped across {} batch(es) in {:.1}s",
        reported, skipped, batches, elapsed_seconds
    );

    Ok(RunSummary {
        planned_urls,
        reported,
        skipped,
        batches,
        elapsed_seconds,
    })
}

/// Measures and estimates one URL. Failures are counted and logged; the
/// caller treats `None` as a skipped URL.
async fn estimate_job<M: Measure>(
    measurer: &M,
    resolver: &GreenHostingResolver,
    model: &ModelParams,
    stats: &ProcessingStats,
    job: &UrlJob,
    batch_id: i64,
) -> Option<NewReport> {
    let data = match measurer.measure(&job.url).await {
        Ok(data) => data,
        Err(e) => {
            stats.increment(ErrorType::from(&e));
            warn!("Skipping {}: {}", job.url, e);
            return None;
        }
    };

    let hosting = resolver.resolve(&job.url, job.green_hosting_factor).await;
    if hosting.is_none() {
        stats.increment(ErrorType::HostingLookupFailure);
    }

    let options = EstimationOptions {
        green_hosting_factor: job.green_hosting_factor,
        ..Default::default()
    };
    let report = match estimator::estimate(
        data.total_transfer_size,
        hosting.map(|h| h.green),
        &options,
        model,
    ) {
        Ok(report) => report,
        Err(e) => {
            stats.increment(ErrorType::from(&e));
            warn!("Skipping {}: {}", job.url, e);
            return None;
        }
    };

    Some(NewReport::from_report(
        job.id,
        &job.user_id,
        Some(batch_id),
        &report,
        Utc::now().timestamp_millis(),
    ))
}

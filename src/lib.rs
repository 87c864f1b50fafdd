//! page_carbon library: web page carbon estimation
//!
//! Measures the bytes transferred by a real page load over the DevTools
//! protocol, applies the Sustainable Web Design emission model, caches
//! results, and batches scheduled measurements into per-project report
//! batches stored in SQLite.
//!
//! # Example
//!
//! ```no_run
//! use page_carbon::{run_schedule, Config, RunMode};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let summary = run_schedule(&config, RunMode::Scheduled).await?;
//! println!(
//!     "{} reported, {} skipped across {} batches",
//!     summary.reported, summary.skipped, summary.batches
//! );
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! A Tokio runtime, and a Chromium binary on PATH (or configured via
//! `browser_path`) for actual measurements.

pub mod app;
pub mod cache;
pub mod config;
pub mod error_handling;
pub mod estimator;
pub mod hosting;
pub mod initialization;
pub mod recorder;
pub mod scheduler;
pub mod server;
pub mod storage;

// Re-export public API
pub use config::{Config, LogFormat, LogLevel};
pub use error_handling::{EstimateError, LoadError};
pub use estimator::{EstimationOptions, ModelParams, Report};
pub use run::{estimate_page, run_schedule};
pub use scheduler::{RunMode, RunSummary};
pub use storage::run_migrations;

// Internal run module (wires components into the two entry points)
mod run {
    use std::sync::Arc;

    use anyhow::{Context, Result};
    use chrono::Utc;

    use crate::app::validate_and_normalize_url;
    use crate::cache::{CacheKey, ResultCache};
    use crate::config::Config;
    use crate::error_handling::{EstimateError, ProcessingStats};
    use crate::estimator::{self, EstimationOptions, ModelParams, Report};
    use crate::hosting::GreenHostingResolver;
    use crate::initialization::init_client;
    use crate::recorder::ResourceRecorder;
    use crate::scheduler::{self, RunMode, RunSummary};
    use crate::storage::{init_db_pool_with_path, run_migrations};

    /// Estimates the emissions of loading one page.
    ///
    /// Validates and normalizes the URL, resolves options (rejecting invalid
    /// parameters before any browser is launched), consults the cache when
    /// one is supplied, and otherwise measures, resolves hosting, estimates,
    /// and caches the result.
    ///
    /// # Errors
    ///
    /// [`EstimateError::InvalidParameter`] for a bad URL, out-of-range
    /// ratio, or unknown country code; [`EstimateError::Load`] when the page
    /// could not be measured. Hosting lookup failures are not errors: the
    /// estimate proceeds with hosting status unreported.
    pub async fn estimate_page(
        recorder: &ResourceRecorder,
        resolver: &GreenHostingResolver,
        model: &ModelParams,
        cache: Option<&ResultCache>,
        url: &str,
        options: &EstimationOptions,
    ) -> Result<Report, EstimateError> {
        let url = validate_and_normalize_url(url)
            .ok_or_else(|| EstimateError::InvalidParameter(format!("invalid url: {:?}", url)))?;
        let resolved = estimator::resolve_options(options, model)?;

        let key = CacheKey::new(&url, &resolved);
        if let Some(cache) = cache {
            if let Some(hit) = cache.get(&key) {
                log::debug!("Cache hit for {}", url);
                return Ok(hit);
            }
        }

        let data = recorder.record(&url).await?;
        let hosting = resolver.resolve(&url, options.green_hosting_factor).await;
        let report = estimator::estimate_resolved(
            data.total_transfer_size,
            hosting.map(|h| h.green),
            &resolved,
            model,
        );

        if let Some(cache) = cache {
            cache.put(&key, report.clone());
        }
        Ok(report)
    }

    /// Runs the batch scheduler once against the configured database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated, or if
    /// the URL set cannot be read. Per-URL measurement failures and write
    /// failures are logged and skipped, not returned.
    pub async fn run_schedule(config: &Config, mode: RunMode) -> Result<RunSummary> {
        let pool = init_db_pool_with_path(&config.db_path)
            .await
            .context("Failed to initialize database pool")?;
        run_migrations(&pool)
            .await
            .context("Failed to run database migrations")?;

        let client = init_client().context("Failed to initialize HTTP client")?;
        let recorder = Arc::new(ResourceRecorder::new(config));
        let resolver = Arc::new(GreenHostingResolver::new(client));
        let model = Arc::new(ModelParams::swd_v4());
        let stats = Arc::new(ProcessingStats::new());
        let today = Utc::now().date_naive();

        let summary = scheduler::run(
            pool.as_ref(),
            recorder,
            resolver,
            model,
            stats,
            mode,
            today,
            config.max_concurrency,
        )
        .await
        .context("Scheduler run failed")?;

        Ok(summary)
    }
}

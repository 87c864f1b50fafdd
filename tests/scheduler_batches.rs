// Scheduler integration tests: cadence gating, batch-id assignment, and
// failure isolation, run against an in-memory database with a stubbed page
// measurer.

mod helpers;

use std::future::Future;
use std::sync::Arc;

use chrono::NaiveDate;
use sqlx::{Row, SqlitePool};

use page_carbon::error_handling::{LoadError, ProcessingStats};
use page_carbon::estimator::ModelParams;
use page_carbon::hosting::GreenHostingResolver;
use page_carbon::recorder::{RequestData, Resource};
use page_carbon::scheduler::{self, Measure, RunMode};

/// Measurer returning a fixed transfer size without launching a browser.
struct StubMeasurer {
    bytes: u64,
}

impl Measure for StubMeasurer {
    fn measure<'a>(
        &'a self,
        url: &'a str,
    ) -> impl Future<Output = Result<RequestData, LoadError>> + Send + 'a {
        async move {
            Ok(RequestData {
                resources: vec![Resource {
                    url: url.to_string(),
                    transfer_size: self.bytes,
                    mime_type: "text/html".to_string(),
                }],
                total_transfer_size: self.bytes,
            })
        }
    }
}

/// Measurer that fails every URL the way an unresolvable host would.
struct FailingMeasurer;

impl Measure for FailingMeasurer {
    fn measure<'a>(
        &'a self,
        url: &'a str,
    ) -> impl Future<Output = Result<RequestData, LoadError>> + Send + 'a {
        async move {
            Err(LoadError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            })
        }
    }
}

/// Resolver pointed at an unroutable endpoint: lookups fail fast and yield
/// "unknown hosting"; URLs seeded with an explicit factor never reach it.
fn offline_resolver() -> Arc<GreenHostingResolver> {
    Arc::new(
        GreenHostingResolver::new(reqwest::Client::new())
            .with_endpoint("http://127.0.0.1:1/greencheck"),
    )
}

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 2).unwrap()
}

fn tuesday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 3).unwrap()
}

/// Seeds project A (daily, 2 URLs) and project B (weekly, 2 URLs).
async fn seed_two_projects(pool: &SqlitePool) -> (i64, i64) {
    let project_a = helpers::insert_project(pool, "daily-site", "user-1", "daily").await;
    let project_b = helpers::insert_project(pool, "weekly-site", "user-1", "weekly").await;
    for i in 0..2 {
        helpers::insert_url(
            pool,
            &format!("https://a.example/{i}"),
            "user-1",
            project_a,
            Some(1.0),
        )
        .await;
    }
    for i in 0..2 {
        helpers::insert_url(
            pool,
            &format!("https://b.example/{i}"),
            "user-1",
            project_b,
            Some(0.0),
        )
        .await;
    }
    (project_a, project_b)
}

async fn batch_ids_for_project(pool: &SqlitePool, project_id: i64) -> Vec<i64> {
    sqlx::query(
        "SELECT DISTINCT r.batch_id FROM reports r \
         JOIN urls u ON u.id = r.url_id \
         WHERE u.project_id = ?1",
    )
    .bind(project_id)
    .fetch_all(pool)
    .await
    .expect("Failed to query batch ids")
    .iter()
    .map(|row| row.get::<i64, _>("batch_id"))
    .collect()
}

async fn run_with<M: Measure + 'static>(
    pool: &SqlitePool,
    measurer: M,
    mode: RunMode,
    today: NaiveDate,
) -> scheduler::RunSummary {
    scheduler::run(
        pool,
        Arc::new(measurer),
        offline_resolver(),
        Arc::new(ModelParams::swd_v4()),
        Arc::new(ProcessingStats::new()),
        mode,
        today,
        2,
    )
    .await
    .expect("Scheduler run failed")
}

#[tokio::test]
async fn non_monday_run_reports_only_daily_project() {
    let pool = helpers::create_test_pool().await;
    let (project_a, project_b) = seed_two_projects(&pool).await;

    let summary = run_with(
        &pool,
        StubMeasurer { bytes: 100_000 },
        RunMode::Scheduled,
        tuesday(),
    )
    .await;

    assert_eq!(summary.planned_urls, 2);
    assert_eq!(summary.reported, 2);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.batches, 1);

    assert_eq!(batch_ids_for_project(&pool, project_a).await.len(), 1);
    assert!(batch_ids_for_project(&pool, project_b).await.is_empty());
}

#[tokio::test]
async fn monday_run_reports_both_projects_with_distinct_batches() {
    let pool = helpers::create_test_pool().await;
    let (project_a, project_b) = seed_two_projects(&pool).await;

    let summary = run_with(
        &pool,
        StubMeasurer { bytes: 100_000 },
        RunMode::Scheduled,
        monday(),
    )
    .await;

    assert_eq!(summary.reported, 4);
    assert_eq!(summary.batches, 2);

    let batches_a = batch_ids_for_project(&pool, project_a).await;
    let batches_b = batch_ids_for_project(&pool, project_b).await;
    // All of A's reports share one batch id, all of B's another.
    assert_eq!(batches_a.len(), 1);
    assert_eq!(batches_b.len(), 1);
    assert_ne!(batches_a[0], batches_b[0]);

    let sources: Vec<String> = sqlx::query("SELECT source FROM batches ORDER BY id")
        .fetch_all(&pool)
        .await
        .unwrap()
        .iter()
        .map(|row| row.get::<String, _>("source"))
        .collect();
    assert_eq!(sources, vec!["auto", "auto"]);
}

#[tokio::test]
async fn manual_run_ignores_cadence_and_tags_source() {
    let pool = helpers::create_test_pool().await;
    let (_, project_b) = seed_two_projects(&pool).await;

    // A plain Tuesday: cadence alone would exclude the weekly project.
    let summary = run_with(
        &pool,
        StubMeasurer { bytes: 250_000 },
        RunMode::Manual {
            project_id: project_b,
            user_id: "user-1".to_string(),
        },
        tuesday(),
    )
    .await;

    assert_eq!(summary.reported, 2);
    assert_eq!(summary.batches, 1);

    let source: String = sqlx::query("SELECT source FROM batches")
        .fetch_one(&pool)
        .await
        .unwrap()
        .get("source");
    assert_eq!(source, "manual");
}

#[tokio::test]
async fn failed_urls_are_skipped_without_aborting_the_batch() {
    let pool = helpers::create_test_pool().await;
    let (_, _) = seed_two_projects(&pool).await;

    let summary = run_with(&pool, FailingMeasurer, RunMode::Scheduled, tuesday()).await;

    assert_eq!(summary.planned_urls, 2);
    assert_eq!(summary.reported, 0);
    assert_eq!(summary.skipped, 2);
    // The batch row outlives its failed URLs.
    assert_eq!(summary.batches, 1);
    let batch_count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM batches")
        .fetch_one(&pool)
        .await
        .unwrap()
        .get("n");
    assert_eq!(batch_count, 1);
    let report_count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM reports")
        .fetch_one(&pool)
        .await
        .unwrap()
        .get("n");
    assert_eq!(report_count, 0);
}

#[tokio::test]
async fn report_rows_echo_estimation_variables() {
    let pool = helpers::create_test_pool().await;
    let project = helpers::insert_project(&pool, "site", "user-9", "daily").await;
    let url_id = helpers::insert_url(&pool, "https://green.example", "user-9", project, Some(1.0))
        .await;

    run_with(
        &pool,
        StubMeasurer { bytes: 2_000_000_000 },
        RunMode::Scheduled,
        tuesday(),
    )
    .await;

    let row = sqlx::query("SELECT * FROM reports WHERE url_id = ?1")
        .bind(url_id)
        .fetch_one(&pool)
        .await
        .expect("report row should exist");
    assert_eq!(row.get::<i64, _>("bytes"), 2_000_000_000);
    assert_eq!(row.get::<String, _>("user_id"), "user-9");
    // Factor 1.0 forces green hosting.
    assert_eq!(row.get::<Option<bool>, _>("green"), Some(true));
    assert_eq!(row.get::<f64, _>("green_hosting_factor"), 1.0);
    assert_eq!(row.get::<Option<String>, _>("rating").as_deref(), Some("F"));
    let grid: serde_json::Value =
        serde_json::from_str(&row.get::<String, _>("grid_intensity")).unwrap();
    assert_eq!(grid["dataCenter"]["value"], 494.0);
}

// Shared test helpers for database setup and test data creation.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use page_carbon::run_migrations;

/// Creates a test database pool with migrations applied.
/// Uses an in-memory database for fast test execution. The pool is pinned to
/// one connection: every pooled connection would otherwise open its own
/// private in-memory database.
#[allow(dead_code)] // Used by other test files
pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database pool");
    run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// Inserts a project row and returns its id.
#[allow(dead_code)]
pub async fn insert_project(
    pool: &SqlitePool,
    name: &str,
    user_id: &str,
    report_frequency: &str,
) -> i64 {
    sqlx::query("INSERT INTO projects (name, user_id, report_frequency) VALUES (?1, ?2, ?3)")
        .bind(name)
        .bind(user_id)
        .bind(report_frequency)
        .execute(pool)
        .await
        .expect("Failed to insert project")
        .last_insert_rowid()
}

/// Inserts a URL row and returns its id.
#[allow(dead_code)]
pub async fn insert_url(
    pool: &SqlitePool,
    url: &str,
    user_id: &str,
    project_id: i64,
    green_hosting_factor: Option<f64>,
) -> i64 {
    sqlx::query(
        "INSERT INTO urls (url, user_id, project_id, green_hosting_factor) \
         VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(url)
    .bind(user_id)
    .bind(project_id)
    .bind(green_hosting_factor)
    .execute(pool)
    .await
    .expect("Failed to insert url")
    .last_insert_rowid()
}

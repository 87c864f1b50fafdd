// storage/mod.rs
// Database operations module

pub mod insert;
pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;

// Re-export commonly used items
pub use insert::{insert_batch, insert_reports};
pub use migrations::run_migrations;
pub use models::{NewBatch, NewReport};
pub use pool::init_db_pool_with_path;
pub use queries::fetch_scheduled_urls;

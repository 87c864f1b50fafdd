//! Application-level helpers shared by the CLI and the query endpoint.

pub mod url;

pub use url::validate_and_normalize_url;

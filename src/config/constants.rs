//! Configuration constants.
//!
//! Operational parameters used throughout the application: timeouts, cache
//! TTL, browser settings, and default paths.

use std::time::Duration;

/// Default SQLite database path.
pub const DB_PATH: &str = "./page_carbon.db";

/// TTL for cached estimation reports. Entries older than this are swept on
/// the next cache access.
pub const RESULT_CACHE_TTL: Duration = Duration::from_secs(600);

/// Timeout for the green-hosting registry lookup. On expiry the hosting
/// status is treated as unknown, not as an error.
pub const HOSTING_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Green Web Foundation hostname check endpoint.
pub const GREENCHECK_ENDPOINT: &str = "https://api.thegreenwebfoundation.org/greencheck";

/// Idle window with zero in-flight requests after which a page load is
/// considered network-quiescent.
pub const NETWORK_IDLE_WINDOW: Duration = Duration::from_millis(500);

/// Hard ceiling on the total navigation + quiescence wait. Exceeding it is a
/// `LoadError::QuiescenceTimeout`, never a hang.
pub const NAVIGATION_WAIT_CEILING: Duration = Duration::from_secs(30);

/// How long to wait for a freshly launched browser to publish its DevTools
/// endpoint before giving up.
pub const BROWSER_STARTUP_TIMEOUT: Duration = Duration::from_secs(20);

/// Grace period for `Browser.close` before the process is killed outright.
pub const BROWSER_SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

/// Viewport used for measurements. Matches a common desktop window so lazy
/// loading behaves the way it does for real visitors.
pub const VIEWPORT_WIDTH: u32 = 1900;
/// See [`VIEWPORT_WIDTH`].
pub const VIEWPORT_HEIGHT: u32 = 1000;

/// Default bound on concurrently running browser sessions.
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// Per-request timeout for outbound HTTP (hosting registry) requests.
pub const HTTP_TIMEOUT_SECS: u64 = 10;

/// Maximum URL length accepted from any input source.
pub const MAX_URL_LENGTH: usize = 2048;

/// User-Agent for outbound registry requests.
pub const USER_AGENT: &str = concat!("page_carbon/", env!("CARGO_PKG_VERSION"));

/// Default port for the query endpoint.
pub const DEFAULT_QUERY_PORT: u16 = 3000;

/// Candidate browser binaries probed on PATH when none is configured.
pub const BROWSER_CANDIDATES: &[&str] = &[
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "chrome",
];

//! Result cache with TTL-based lazy eviction.
//!
//! Reports are keyed by the fully normalized query (URL plus every resolved
//! option value), so two requests that differ only in parameter order or in
//! default-filled values share one entry. Expired entries are swept on every
//! access under the same lock acquisition that services the operation; there
//! is no background timer. The TTL sweep is the only eviction policy, so the
//! map is unbounded in size. That is a known scaling risk, not a bug.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use crate::estimator::{Report, ResolvedOptions};

/// Time source for cache aging. Injected so TTL behavior is testable with a
/// simulated clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> SystemTime;
}

/// The real wall clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Normalized query signature for one estimation request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Builds a key from a normalized URL and fully resolved options.
    ///
    /// Resolution has already filled defaults and resolved country codes, so
    /// equivalent queries produce byte-identical keys.
    pub fn new(url: &str, resolved: &ResolvedOptions) -> Self {
        let segment = |country: &Option<String>, value: f64| match country {
            Some(code) => format!("{}:{}", code, value),
            None => format!("{}", value),
        };
        CacheKey(format!(
            "{}|dcr={}|rvr={}|ghf={}|device={}|dataCenter={}|network={}",
            url,
            resolved.data_cache_ratio,
            resolved.return_visitor_ratio,
            resolved
                .green_hosting_factor
                .map(|f| f.to_string())
                .unwrap_or_else(|| "-".to_string()),
            segment(&resolved.grid.device.country, resolved.grid.device.value),
            segment(
                &resolved.grid.data_center.country,
                resolved.grid.data_center.value
            ),
            segment(&resolved.grid.network.country, resolved.grid.network.value),
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

struct CacheEntry {
    report: Report,
    last_updated: SystemTime,
}

/// Key→report store with access-triggered TTL eviction.
pub struct ResultCache {
    ttl: Duration,
    clock: Box<dyn Clock>,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResultCache {
    /// Creates a cache with an explicit clock (tests inject a simulated one).
    pub fn new(ttl: Duration, clock: Box<dyn Clock>) -> Self {
        ResultCache {
            ttl,
            clock,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a cache driven by the system clock.
    pub fn with_system_clock(ttl: Duration) -> Self {
        Self::new(ttl, Box::new(SystemClock))
    }

    /// Returns the cached report for `key`, after sweeping expired entries.
    pub fn get(&self, key: &CacheKey) -> Option<Report> {
        let mut entries = self.lock_entries();
        self.sweep(&mut entries);
        entries.get(key.as_str()).map(|e| e.report.clone())
    }

    /// Stores (or refreshes) the report for `key`, after sweeping expired
    /// entries.
    pub fn put(&self, key: &CacheKey, report: Report) {
        let now = self.clock.now();
        let mut entries = self.lock_entries();
        self.sweep(&mut entries);
        entries.insert(
            key.as_str().to_string(),
            CacheEntry {
                report,
                last_updated: now,
            },
        );
    }

    /// Number of live entries (expired entries are swept first).
    pub fn len(&self) -> usize {
        let mut entries = self.lock_entries();
        self.sweep(&mut entries);
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        // A poisoned lock only means a panic mid-insert; the map is still
        // structurally sound.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn sweep(&self, entries: &mut HashMap<String, CacheEntry>) {
        let now = self.clock.now();
        entries.retain(|_, entry| match now.duration_since(entry.last_updated) {
            Ok(age) => age <= self.ttl,
            // A clock that moved backwards keeps the entry.
            Err(_) => true,
        });
    }
}

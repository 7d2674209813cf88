//! Fetch configuration
//!
//! Every tunable of the data-acquisition layer lives in [`FetchConfig`]; the
//! defaults match the published limits of the Jolpica F1 API.

use chrono::Duration;
use std::path::PathBuf;
use std::time::Duration as StdDuration;

use crate::cache::CacheManager;

/// Base URL for the Jolpica F1 API (Ergast-compatible)
pub const DEFAULT_BASE_URL: &str = "https://api.jolpi.ca/ergast/f1";

/// Time-to-live per resource
#[derive(Debug, Clone, PartialEq)]
pub struct CacheTtls {
    pub next_race: Duration,
    pub season_results: Duration,
    pub standings: Duration,
    pub qualifying: Duration,
    pub circuit_history: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            next_race: Duration::hours(1),
            season_results: Duration::hours(24),
            standings: Duration::hours(6),
            qualifying: Duration::hours(1),
            circuit_history: Duration::days(7),
        }
    }
}

/// Configuration consumed by [`crate::data::F1DataFetcher`]
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// API root, without trailing slash
    pub base_url: String,
    /// Directory holding cache entries
    pub cache_dir: PathBuf,
    /// Whether responses are read from and written to the cache
    pub cache_enabled: bool,
    pub ttls: CacheTtls,
    /// Total attempts per request, including the first
    pub max_attempts: u32,
    /// Bound on a single attempt
    pub request_timeout: StdDuration,
    /// Minimum spacing between outbound requests
    pub min_request_interval: StdDuration,
    /// Backoff before retry `n` is `backoff_unit * 2^n`
    pub backoff_unit: StdDuration,
    /// Seasons of circuit history requested by the engine
    pub circuit_history_years: u32,
    /// Over-fetch factor for circuit history (results requested per season)
    pub results_per_season_hint: u32,
    /// `limit` parameter for season results
    pub season_results_limit: u32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            cache_dir: CacheManager::default_dir(),
            cache_enabled: true,
            ttls: CacheTtls::default(),
            max_attempts: 3,
            request_timeout: StdDuration::from_secs(10),
            min_request_interval: StdDuration::from_millis(100),
            backoff_unit: StdDuration::from_secs(1),
            circuit_history_years: 5,
            results_per_season_hint: 30,
            season_results_limit: 1000,
        }
    }
}

impl FetchConfig {
    /// Upper bound on the latency of one logical fetch in the retry path:
    /// every attempt times out and every backoff is slept.
    pub fn worst_case_latency(&self) -> StdDuration {
        let backoff: StdDuration = (1..self.max_attempts)
            .map(|attempt| self.backoff_unit * 2u32.saturating_pow(attempt))
            .sum();
        self.request_timeout * self.max_attempts + backoff
    }
}

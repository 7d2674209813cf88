//! Cached access to the Jolpica F1 resources
//!
//! Every operation goes cache-first, falls through to the rate-limited
//! [`ApiClient`], writes successful responses through, and falls back to an
//! expired cache entry when the API is unavailable.

use chrono::{Datelike, Duration, Utc};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::client::{ApiClient, FetchError, QueryParams, ReqwestTransport, RetryPolicy, Transport};
use super::parse::{self, ParseError};
use super::rate_limit::RateLimiter;
use super::{ConstructorStanding, DriverStanding, QualifyingResult, Race, RaceResult};
use crate::cache::CacheManager;
use crate::config::FetchConfig;

/// Season selector used in resource paths and cache keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    /// The season in progress, as the API defines it
    Current,
    Year(i32),
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Season::Current => write!(f, "current"),
            Season::Year(year) => write!(f, "{}", year),
        }
    }
}

impl From<i32> for Season {
    fn from(year: i32) -> Self {
        Season::Year(year)
    }
}

/// Errors for the one resource whose absence stops a prediction
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to fetch next race: {0}")]
    Fetch(#[from] FetchError),

    #[error("no upcoming race found in API response")]
    NoUpcomingRace,

    #[error("invalid race data: {0}")]
    InvalidRace(#[from] ParseError),
}

/// Fetches Formula 1 data from the Jolpica API with local caching
#[derive(Debug, Clone)]
pub struct F1DataFetcher {
    client: ApiClient,
    /// `None` when caching is turned off or the cache directory is unusable
    cache: Option<CacheManager>,
    config: FetchConfig,
}

impl F1DataFetcher {
    /// Creates a fetcher talking to the network through `reqwest`
    pub fn new(config: FetchConfig) -> Self {
        Self::with_transport(config, Arc::new(ReqwestTransport::new()))
    }

    /// Creates a fetcher over a custom transport
    pub fn with_transport(config: FetchConfig, transport: Arc<dyn Transport>) -> Self {
        let limiter = Arc::new(RateLimiter::new(config.min_request_interval));
        let policy = RetryPolicy {
            max_attempts: config.max_attempts,
            timeout: config.request_timeout,
            backoff_unit: config.backoff_unit,
        };

        let cache = if config.cache_enabled {
            Some(CacheManager::new(config.cache_dir.clone())).filter(CacheManager::is_enabled)
        } else {
            None
        };

        Self {
            client: ApiClient::new(transport, limiter, policy),
            cache,
            config,
        }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Whether responses are being cached
    pub fn cache_enabled(&self) -> bool {
        self.cache.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Returns the response for `key`, from cache if fresh, else from `url`
    ///
    /// # Behavior
    /// - A fresh cache entry is returned without touching the network
    /// - Otherwise the API is queried and a successful response is cached
    ///   for `ttl`
    /// - If the API fails, an expired cache entry is returned when present;
    ///   otherwise the API error is returned
    pub async fn get_or_fetch(
        &self,
        key: &str,
        url: &str,
        ttl: Duration,
        params: &QueryParams,
    ) -> Result<Value, FetchError> {
        if let Some(ref cache) = self.cache {
            if let Some(cached) = cache.get(key, false) {
                debug!(key, "cache hit");
                return Ok(cached.data);
            }
        }

        match self.client.request(url, params).await {
            Ok(data) => {
                if let Some(ref cache) = self.cache {
                    cache.set(key, &data, ttl);
                }
                Ok(data)
            }
            Err(e) => {
                if let Some(cached) = self.cache.as_ref().and_then(|c| c.get(key, true)) {
                    warn!(
                        key,
                        cached_at = %cached.cached_at,
                        error = %e,
                        "API unavailable, using stale cache"
                    );
                    return Ok(cached.data);
                }
                Err(e)
            }
        }
    }

    /// Fetches the next scheduled race
    ///
    /// Unlike the other operations this fails hard: without a race there is
    /// nothing to predict.
    pub async fn next_race(&self) -> Result<Race, DataError> {
        let url = self.url("current/next.json");
        let body = self
            .get_or_fetch("next_race", &url, self.config.ttls.next_race, &[])
            .await?;

        let race = parse::races(&body)
            .first()
            .ok_or(DataError::NoUpcomingRace)?;
        let race = parse::parse_race(race)?;
        info!(race = %race.race_name, round = race.round, "next race");
        Ok(race)
    }

    /// Fetches every race result of a season
    pub async fn season_results(&self, season: Season) -> Vec<RaceResult> {
        let url = self.url(&format!("{}/results.json", season));
        let key = format!("season_results_{}", season);
        let params = [("limit", self.config.season_results_limit.to_string())];

        match self
            .get_or_fetch(&key, &url, self.config.ttls.season_results, &params)
            .await
        {
            Ok(body) => parse::race_results(&body, |_| true),
            Err(e) => {
                warn!(%season, error = %e, "failed to fetch season results");
                Vec::new()
            }
        }
    }

    /// Fetches the drivers' championship standings
    pub async fn driver_standings(&self, season: Season) -> Vec<DriverStanding> {
        let url = self.url(&format!("{}/driverStandings.json", season));
        let key = format!("driver_standings_{}", season);

        match self
            .get_or_fetch(&key, &url, self.config.ttls.standings, &[])
            .await
        {
            Ok(body) => {
                if !parse::has_standings(&body) {
                    warn!(%season, "no driver standings data available");
                }
                parse::parse_each(
                    parse::standings(&body, "DriverStandings"),
                    "driver standing",
                    parse::parse_driver_standing,
                )
            }
            Err(e) => {
                warn!(%season, error = %e, "failed to fetch driver standings");
                Vec::new()
            }
        }
    }

    /// Fetches the constructors' championship standings
    pub async fn constructor_standings(&self, season: Season) -> Vec<ConstructorStanding> {
        let url = self.url(&format!("{}/constructorStandings.json", season));
        let key = format!("constructor_standings_{}", season);

        match self
            .get_or_fetch(&key, &url, self.config.ttls.standings, &[])
            .await
        {
            Ok(body) => {
                if !parse::has_standings(&body) {
                    warn!(%season, "no constructor standings data available");
                }
                parse::parse_each(
                    parse::standings(&body, "ConstructorStandings"),
                    "constructor standing",
                    parse::parse_constructor_standing,
                )
            }
            Err(e) => {
                warn!(%season, error = %e, "failed to fetch constructor standings");
                Vec::new()
            }
        }
    }

    /// Fetches qualifying for one race; empty before the session has run
    pub async fn qualifying_results(&self, season: i32, round: u32) -> Vec<QualifyingResult> {
        let url = self.url(&format!("{}/{}/qualifying.json", season, round));
        let key = format!("qualifying_{}_{}", season, round);

        match self
            .get_or_fetch(&key, &url, self.config.ttls.qualifying, &[])
            .await
        {
            Ok(body) => parse::qualifying_results(&body),
            Err(e) => {
                info!(season, round, error = %e, "qualifying results not available");
                Vec::new()
            }
        }
    }

    /// Fetches results at a circuit over the last `years` seasons
    pub async fn circuit_history(&self, circuit_id: &str, years: u32) -> Vec<RaceResult> {
        let url = self.url(&format!("circuits/{}/results.json", circuit_id));
        let key = format!("circuit_history_{}_{}", circuit_id, years);
        let limit = years.saturating_mul(self.config.results_per_season_hint);
        let params = [("limit", limit.to_string())];

        match self
            .get_or_fetch(&key, &url, self.config.ttls.circuit_history, &params)
            .await
        {
            Ok(body) => {
                let current_year = Utc::now().year();
                parse::race_results(&body, |race| {
                    within_recent_seasons(race.season, current_year, years)
                })
            }
            Err(e) => {
                info!(circuit = circuit_id, error = %e, "circuit history not available");
                Vec::new()
            }
        }
    }

    /// Removes every cached response
    ///
    /// Works when caching is disabled too, as long as the directory exists.
    pub fn clear_cache(&self) {
        match self.cache {
            Some(ref cache) => {
                cache.clear();
                info!(dir = %cache.dir().display(), "cache cleared");
            }
            None if self.config.cache_dir.is_dir() => {
                let cache = CacheManager::new(self.config.cache_dir.clone());
                cache.clear();
                info!(dir = %cache.dir().display(), "cache cleared");
            }
            None => debug!(dir = %self.config.cache_dir.display(), "no cache directory to clear"),
        }
    }
}

/// Whether `season` falls inside the `years`-season window ending at `current_year`
pub fn within_recent_seasons(season: i32, current_year: i32, years: u32) -> bool {
    let years = i32::try_from(years).unwrap_or(i32::MAX);
    season >= current_year.saturating_sub(years)
}

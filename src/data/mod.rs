//! Core data models for f1cast
//!
//! This module contains the typed records built from Jolpica F1 API responses,
//! along with the client, parsers and fetcher that produce them.

pub mod client;
pub mod fetcher;
pub mod parse;
pub mod rate_limit;

pub use client::{
    ApiClient, FetchError, RawResponse, ReqwestTransport, RetryPolicy, Transport, TransportError,
    TransportFailure,
};
pub use fetcher::{DataError, F1DataFetcher, Season};
pub use parse::ParseError;
pub use rate_limit::RateLimiter;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A Formula 1 circuit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    /// API identifier (e.g., "monaco", "silverstone")
    pub circuit_id: String,
    pub circuit_name: String,
    /// City or area the circuit is in
    pub locality: String,
    pub country: String,
}

/// A driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub driver_id: String,
    /// Three-letter code (e.g., "VER"); "???" when the API has none
    pub code: String,
    pub given_name: String,
    pub family_name: String,
    pub nationality: String,
}

/// A constructor (team)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constructor {
    pub constructor_id: String,
    pub name: String,
    pub nationality: String,
}

/// A scheduled or completed race
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Race {
    pub season: i32,
    pub round: u32,
    pub race_name: String,
    pub circuit: Circuit,
    /// Race start; midnight UTC when the API gives no time
    pub date: DateTime<Utc>,
}

/// A driver's classified result in a race
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceResult {
    pub race: Race,
    pub driver: Driver,
    pub constructor: Constructor,
    pub position: u32,
    pub points: f64,
    /// Starting grid slot; 0 means pit lane start
    pub grid: u32,
    pub laps: u32,
    /// "Finished", "+1 Lap", "Engine", ...
    pub status: String,
}

/// A driver's qualifying result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualifyingResult {
    pub race: Race,
    pub driver: Driver,
    pub constructor: Constructor,
    pub position: u32,
    /// Session lap times as reported (e.g., "1:23.456")
    pub q1: Option<String>,
    pub q2: Option<String>,
    pub q3: Option<String>,
}

/// A driver's championship standing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverStanding {
    pub driver: Driver,
    /// Current constructor (the first one listed by the API)
    pub constructor: Constructor,
    pub position: u32,
    pub points: f64,
    pub wins: u32,
}

/// A constructor's championship standing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructorStanding {
    pub constructor: Constructor,
    pub position: u32,
    pub points: f64,
    pub wins: u32,
}

impl Driver {
    /// "Given Family"
    pub fn full_name(&self) -> String {
        format!("{} {}", self.given_name, self.family_name)
    }
}

impl RaceResult {
    /// Whether the driver was running at the flag (including lapped cars)
    pub fn is_classified_finish(&self) -> bool {
        self.status == "Finished" || self.status.starts_with('+')
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn sample_circuit() -> Circuit {
        Circuit {
            circuit_id: "monaco".to_string(),
            circuit_name: "Circuit de Monaco".to_string(),
            locality: "Monte-Carlo".to_string(),
            country: "Monaco".to_string(),
        }
    }

    pub(crate) fn sample_race(round: u32) -> Race {
        Race {
            season: 2024,
            round,
            race_name: format!("Round {} Grand Prix", round),
            circuit: sample_circuit(),
            date: Utc.with_ymd_and_hms(2024, 3, 1, 15, 0, 0).unwrap()
                + chrono::Duration::weeks(round as i64),
        }
    }

    pub(crate) fn sample_driver(id: &str) -> Driver {
        Driver {
            driver_id: id.to_string(),
            code: id[..3.min(id.len())].to_uppercase(),
            given_name: "Test".to_string(),
            family_name: id.to_string(),
            nationality: "Dutch".to_string(),
        }
    }

    pub(crate) fn sample_constructor(id: &str) -> Constructor {
        Constructor {
            constructor_id: id.to_string(),
            name: id.to_string(),
            nationality: "Austrian".to_string(),
        }
    }

    #[test]
    fn test_full_name() {
        let driver = sample_driver("verstappen");
        assert_eq!(driver.full_name(), "Test verstappen");
    }

    #[test]
    fn test_classified_finish() {
        let mut result = RaceResult {
            race: sample_race(1),
            driver: sample_driver("norris"),
            constructor: sample_constructor("mclaren"),
            position: 12,
            points: 0.0,
            grid: 5,
            laps: 56,
            status: "+1 Lap".to_string(),
        };
        assert!(result.is_classified_finish());

        result.status = "Finished".to_string();
        assert!(result.is_classified_finish());

        result.status = "Engine".to_string();
        assert!(!result.is_classified_finish());
    }

    #[test]
    fn test_race_serialization_roundtrip() {
        let race = sample_race(7);

        let json = serde_json::to_string(&race).expect("Failed to serialize Race");
        let deserialized: Race = serde_json::from_str(&json).expect("Failed to deserialize Race");

        assert_eq!(deserialized, race);
    }
}

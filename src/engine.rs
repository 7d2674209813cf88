//! Prediction pipeline
//!
//! Gathers the next race and the data around it, then hands it to a
//! [`ScoringStrategy`]. Only the next race and the drivers' standings are
//! required; every other source degrades to empty.

use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::data::{DataError, F1DataFetcher, Race, Season};
use crate::scoring::{DriverPrediction, PredictionInputs, ScoringStrategy};

/// Attribution attached to every result
pub const DATA_SOURCE: &str = "Jolpica F1 API";

/// Why no prediction could be produced
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("failed to retrieve next race information: {0}")]
    NextRace(#[from] DataError),

    #[error("cannot generate predictions without driver standings data")]
    MissingStandings,

    #[error("failed to generate predictions from available data")]
    NoPredictions,
}

impl PredictionError {
    /// Things the user can try
    pub fn suggestions(&self) -> &'static [&'static str] {
        match self {
            PredictionError::NextRace(DataError::Fetch(_)) => &[
                "Check your internet connection",
                "Verify the API is accessible",
                "Try again later",
                "Use --no-cache to bypass the cache",
            ],
            PredictionError::NextRace(_) => &[
                "Check if the F1 season is currently active",
                "Check if there are any scheduled races",
                "Try again later",
            ],
            PredictionError::MissingStandings => &[
                "Check if the F1 season has started",
                "Verify API connectivity",
                "Try again later",
            ],
            PredictionError::NoPredictions => &[
                "Check data quality",
                "Verify sufficient historical data exists",
                "Try again later",
            ],
        }
    }

    /// Whether retrying later may succeed
    pub fn recoverable(&self) -> bool {
        matches!(self, PredictionError::NextRace(_))
    }
}

/// Ranked predictions for one race
#[derive(Debug, Clone, Serialize)]
pub struct PredictionResult {
    pub race: Race,
    pub predictions: Vec<DriverPrediction>,
    pub generated_at: DateTime<Utc>,
    pub data_sources: Vec<String>,
    /// 0-1
    pub data_completeness: f64,
    /// Name of the strategy that produced the ranking
    pub strategy: String,
}

/// Runs fetch then score for the next race
pub struct PredictionEngine {
    fetcher: F1DataFetcher,
    strategy: Box<dyn ScoringStrategy>,
}

impl PredictionEngine {
    pub fn new(fetcher: F1DataFetcher, strategy: Box<dyn ScoringStrategy>) -> Self {
        Self { fetcher, strategy }
    }

    pub fn fetcher(&self) -> &F1DataFetcher {
        &self.fetcher
    }

    /// Fetches everything needed and returns the best `top_n` drivers
    pub async fn predict_next_race(&self, top_n: usize) -> Result<PredictionResult, PredictionError> {
        let inputs = self.gather_inputs().await?;
        for warning in data_quality_warnings(&inputs) {
            warn!(%warning, "data quality issue");
        }

        let predictions = self.strategy.predict(&inputs, top_n);
        if predictions.is_empty() {
            return Err(PredictionError::NoPredictions);
        }
        info!(count = predictions.len(), strategy = self.strategy.name(), "predictions generated");

        Ok(PredictionResult {
            data_completeness: inputs.data_completeness(),
            race: inputs.race,
            predictions,
            generated_at: Utc::now(),
            data_sources: vec![DATA_SOURCE.to_string()],
            strategy: self.strategy.name().to_string(),
        })
    }

    /// Fetches the next race and the data around it, one request at a time
    pub async fn gather_inputs(&self) -> Result<PredictionInputs, PredictionError> {
        let race = self.fetcher.next_race().await?;
        info!(
            race = %race.race_name,
            circuit = %race.circuit.circuit_name,
            date = %race.date.date_naive(),
            "predicting"
        );
        let season = Season::Year(race.season);

        let driver_standings = self.fetcher.driver_standings(season).await;
        if driver_standings.is_empty() {
            return Err(PredictionError::MissingStandings);
        }
        let constructor_standings = self.fetcher.constructor_standings(season).await;
        let season_results = self.fetcher.season_results(season).await;
        let qualifying = self.fetcher.qualifying_results(race.season, race.round).await;
        let circuit_history = self
            .fetcher
            .circuit_history(
                &race.circuit.circuit_id,
                self.fetcher.config().circuit_history_years,
            )
            .await;

        info!(
            drivers = driver_standings.len(),
            constructors = constructor_standings.len(),
            results = season_results.len(),
            qualifying = qualifying.len(),
            history = circuit_history.len(),
            "data loaded"
        );

        Ok(PredictionInputs {
            race,
            driver_standings,
            constructor_standings,
            season_results,
            qualifying,
            circuit_history,
        })
    }
}

/// Non-fatal gaps in the gathered data
pub fn data_quality_warnings(inputs: &PredictionInputs) -> Vec<String> {
    let mut warnings = Vec::new();

    let next_year = Utc::now().year() + 1;
    if inputs.race.season < 1950 || inputs.race.season > next_year {
        warnings.push(format!("Race season {} seems invalid", inputs.race.season));
    }

    match inputs.driver_standings.len() {
        0 => warnings.push("No driver standings data available".to_string()),
        n if n < 10 => warnings.push(format!("Limited driver standings data ({} drivers)", n)),
        _ => {}
    }
    match inputs.constructor_standings.len() {
        0 => warnings.push("No constructor standings data available".to_string()),
        n if n < 5 => warnings.push(format!("Limited constructor standings data ({} teams)", n)),
        _ => {}
    }
    match inputs.season_results.len() {
        0 => warnings.push("No race results data available".to_string()),
        n if n < 20 => warnings.push(format!("Limited race results data ({} results)", n)),
        _ => {}
    }

    warnings
}

//! Scoring with a trained logistic classifier
//!
//! The model is a JSON file holding one coefficient per factor (in
//! [`FactorScores::features`] order) and an intercept:
//!
//! ```json
//! { "coefficients": [0.04, 0.03, 0.02, 0.03, 0.01], "intercept": -9.5 }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use super::{rank, reasoning, DriverPrediction, FactorScores, PredictionInputs, ScoringStrategy};

/// Where the CLI looks for a model when none is given
pub const DEFAULT_MODEL_PATH: &str = "models/f1_predictor.json";

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to read model {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid model file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Binary win/no-win logistic regression over the five factor scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub coefficients: [f64; 5],
    pub intercept: f64,
}

impl LogisticModel {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let contents = fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Probability of a win, 0-1
    pub fn win_probability(&self, features: &[f64; 5]) -> f64 {
        let logit: f64 = self
            .coefficients
            .iter()
            .zip(features)
            .map(|(c, x)| c * x)
            .sum::<f64>()
            + self.intercept;
        1.0 / (1.0 + (-logit).exp())
    }
}

/// Ranks drivers by the classifier's win probability
#[derive(Debug, Clone)]
pub struct ClassifierStrategy {
    model: LogisticModel,
}

impl ClassifierStrategy {
    pub fn new(model: LogisticModel) -> Self {
        Self { model }
    }

    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let model = LogisticModel::load(path)?;
        info!(path = %path.display(), "classifier model loaded");
        Ok(Self::new(model))
    }
}

impl ScoringStrategy for ClassifierStrategy {
    fn name(&self) -> &'static str {
        "classifier"
    }

    fn predict(&self, inputs: &PredictionInputs, top_n: usize) -> Vec<DriverPrediction> {
        let completeness = inputs.data_completeness();

        let predictions = inputs
            .driver_standings
            .iter()
            .map(|standing| {
                let scores = FactorScores::for_driver(inputs, standing);
                let probability = self.model.win_probability(&scores.features());
                let confidence = (probability * 100.0 * completeness).clamp(0.0, 100.0);
                debug!(driver = %standing.driver.driver_id, probability, "driver classified");

                let mut lines = vec![format!("Model Confidence: {:.1}%", confidence)];
                lines.extend(reasoning(inputs, standing, &scores));

                DriverPrediction {
                    driver: standing.driver.clone(),
                    constructor: standing.constructor.clone(),
                    confidence,
                    factors: scores,
                    reasoning: lines,
                }
            })
            .collect();

        rank(predictions, top_n)
    }
}

//! Fixed-weight scoring

use tracing::{debug, info};

use super::factors::NEUTRAL_SCORE;
use super::{rank, reasoning, DriverPrediction, FactorScores, PredictionInputs, ScoringStrategy};

/// Relative weight of each factor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactorWeights {
    pub championship: f64,
    pub form: f64,
    pub team: f64,
    pub qualifying: f64,
    pub circuit: f64,
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self {
            championship: 0.25,
            form: 0.20,
            team: 0.20,
            qualifying: 0.20,
            circuit: 0.15,
        }
    }
}

impl FactorWeights {
    /// Weighted average over the factors that are present, 0-100
    pub fn combine(&self, scores: &FactorScores) -> f64 {
        let present = [
            Some((scores.championship, self.championship)),
            Some((scores.form, self.form)),
            Some((scores.team, self.team)),
            scores.qualifying.map(|s| (s, self.qualifying)),
            scores.circuit.map(|s| (s, self.circuit)),
        ];

        let (total, weight) = present
            .iter()
            .flatten()
            .fold((0.0, 0.0), |(total, weight), (score, w)| {
                (total + score * w, weight + w)
            });

        if weight > 0.0 {
            (total / weight).clamp(0.0, 100.0)
        } else {
            NEUTRAL_SCORE
        }
    }
}

/// Combines factor scores with fixed weights, scaled by data completeness
#[derive(Debug, Clone, Default)]
pub struct WeightedStrategy {
    weights: FactorWeights,
}

impl WeightedStrategy {
    pub fn new(weights: FactorWeights) -> Self {
        Self { weights }
    }
}

impl ScoringStrategy for WeightedStrategy {
    fn name(&self) -> &'static str {
        "weighted"
    }

    fn predict(&self, inputs: &PredictionInputs, top_n: usize) -> Vec<DriverPrediction> {
        let completeness = inputs.data_completeness();
        info!(
            race = %inputs.race.race_name,
            completeness = %format!("{:.0}%", completeness * 100.0),
            "scoring drivers"
        );

        let predictions = inputs
            .driver_standings
            .iter()
            .map(|standing| {
                let scores = FactorScores::for_driver(inputs, standing);
                let combined = self.weights.combine(&scores);
                let confidence = (combined * completeness).clamp(0.0, 100.0);
                debug!(
                    driver = %standing.driver.driver_id,
                    combined,
                    confidence,
                    "driver scored"
                );

                DriverPrediction {
                    driver: standing.driver.clone(),
                    constructor: standing.constructor.clone(),
                    confidence,
                    reasoning: reasoning(inputs, standing, &scores),
                    factors: scores,
                }
            })
            .collect();

        rank(predictions, top_n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::tests::{qualifying, result, sample_inputs};

    fn scores(qualifying: Option<f64>, circuit: Option<f64>) -> FactorScores {
        FactorScores {
            championship: 80.0,
            form: 60.0,
            team: 40.0,
            qualifying,
            circuit,
        }
    }

    #[test]
    fn test_combine_all_factors() {
        let combined = FactorWeights::default().combine(&scores(Some(100.0), Some(20.0)));
        // 0.25*80 + 0.2*60 + 0.2*40 + 0.2*100 + 0.15*20 = 63
        assert!((combined - 63.0).abs() < 1e-9);
    }

    #[test]
    fn test_combine_renormalizes_missing_factors() {
        let combined = FactorWeights::default().combine(&scores(None, None));
        // (0.25*80 + 0.2*60 + 0.2*40) / 0.65
        assert!((combined - 40.0 / 0.65).abs() < 1e-9);
    }

    #[test]
    fn test_combine_zero_weights_is_neutral() {
        let weights = FactorWeights {
            championship: 0.0,
            form: 0.0,
            team: 0.0,
            qualifying: 0.0,
            circuit: 0.0,
        };
        assert_eq!(weights.combine(&scores(None, None)), NEUTRAL_SCORE);
    }

    #[test]
    fn test_predict_ranks_leader_first() {
        let inputs = sample_inputs();
        let predictions = WeightedStrategy::default().predict(&inputs, 3);

        assert_eq!(predictions.len(), 3);
        assert_eq!(predictions[0].driver.driver_id, "leader");
        assert_eq!(predictions[2].driver.driver_id, "backmarker");
        assert!(predictions
            .windows(2)
            .all(|pair| pair[0].confidence >= pair[1].confidence));
    }

    #[test]
    fn test_predict_respects_top_n() {
        let predictions = WeightedStrategy::default().predict(&sample_inputs(), 1);
        assert_eq!(predictions.len(), 1);
    }

    #[test]
    fn test_confidence_scaled_by_completeness() {
        let partial = sample_inputs();
        let mut full = sample_inputs();
        full.qualifying.push(qualifying("leader", 1));
        full.circuit_history.push(result("leader", 2, 1));

        let strategy = WeightedStrategy::default();
        let partial_ranked = strategy.predict(&partial, 1);
        let full_ranked = strategy.predict(&full, 1);
        let partial_leader = &partial_ranked[0];
        let full_leader = &full_ranked[0];

        let partial_combined = FactorWeights::default().combine(&partial_leader.factors);
        assert!((partial_leader.confidence - partial_combined * 0.6).abs() < 1e-9);
        assert!(full_leader.confidence > partial_leader.confidence);
        assert!(full_leader.confidence <= 100.0);
    }
}

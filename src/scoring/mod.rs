//! Driver scoring strategies
//!
//! A strategy turns the gathered [`PredictionInputs`] into a ranked list of
//! [`DriverPrediction`]s. Both strategies share the factor scores of
//! [`factors`]; they differ in how the factors are combined.

pub mod classifier;
pub mod factors;
pub mod weighted;

pub use classifier::{ClassifierStrategy, LogisticModel, ModelError, DEFAULT_MODEL_PATH};
pub use weighted::{FactorWeights, WeightedStrategy};

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::path::Path;
use tracing::warn;

use crate::data::{
    Constructor, ConstructorStanding, Driver, DriverStanding, QualifyingResult, Race, RaceResult,
};
use factors::NEUTRAL_SCORE;

/// Number of data sources a prediction can draw on
pub const TOTAL_SOURCES: u32 = 5;

/// Sources counted as present whether or not they returned data
const ALWAYS_AVAILABLE_SOURCES: u32 = 3;

/// Everything a strategy needs to rank the field for one race
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionInputs {
    pub race: Race,
    pub driver_standings: Vec<DriverStanding>,
    /// May be empty
    pub constructor_standings: Vec<ConstructorStanding>,
    pub season_results: Vec<RaceResult>,
    /// Empty until qualifying has run
    pub qualifying: Vec<QualifyingResult>,
    /// May be empty
    pub circuit_history: Vec<RaceResult>,
}

impl PredictionInputs {
    /// Fraction of [`TOTAL_SOURCES`] that contributed data
    ///
    /// Standings and season results always count; qualifying and circuit
    /// history count only when non-empty.
    pub fn data_completeness(&self) -> f64 {
        let mut available = ALWAYS_AVAILABLE_SOURCES;
        if !self.qualifying.is_empty() {
            available += 1;
        }
        if !self.circuit_history.is_empty() {
            available += 1;
        }
        f64::from(available) / f64::from(TOTAL_SOURCES)
    }

    /// The driver's qualifying position for this race, if known
    pub fn qualifying_position(&self, driver_id: &str) -> Option<u32> {
        self.qualifying
            .iter()
            .find(|q| q.driver.driver_id == driver_id)
            .map(|q| q.position)
    }
}

/// Factor scores for one driver; optional factors are `None` when their
/// source returned no data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorScores {
    pub championship: f64,
    pub form: f64,
    pub team: f64,
    pub qualifying: Option<f64>,
    pub circuit: Option<f64>,
}

impl FactorScores {
    /// Computes every factor for `standing`'s driver
    pub fn for_driver(inputs: &PredictionInputs, standing: &DriverStanding) -> Self {
        let driver_id = standing.driver.driver_id.as_str();

        let qualifying = (!inputs.qualifying.is_empty()).then(|| {
            inputs
                .qualifying_position(driver_id)
                .map_or(NEUTRAL_SCORE, factors::qualifying_impact)
        });
        let circuit = (!inputs.circuit_history.is_empty())
            .then(|| factors::circuit_advantage(driver_id, &inputs.circuit_history));

        Self {
            championship: factors::championship(driver_id, &inputs.driver_standings),
            form: factors::driver_form(driver_id, &inputs.season_results),
            team: factors::team_performance(
                &standing.constructor.constructor_id,
                &inputs.constructor_standings,
            ),
            qualifying,
            circuit,
        }
    }

    /// `[championship, form, team, qualifying, circuit]`, missing factors neutral
    pub fn features(&self) -> [f64; 5] {
        [
            self.championship,
            self.form,
            self.team,
            self.qualifying.unwrap_or(NEUTRAL_SCORE),
            self.circuit.unwrap_or(NEUTRAL_SCORE),
        ]
    }
}

/// A driver's predicted chance of winning, with supporting detail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverPrediction {
    pub driver: Driver,
    pub constructor: Constructor,
    /// 0-100
    pub confidence: f64,
    pub factors: FactorScores,
    /// Human-readable explanation lines
    pub reasoning: Vec<String>,
}

/// Ranks drivers for a race
pub trait ScoringStrategy: Send + Sync {
    /// Short name shown in output
    fn name(&self) -> &'static str;

    /// Scores every driver in the standings and returns the best `top_n`,
    /// highest confidence first
    fn predict(&self, inputs: &PredictionInputs, top_n: usize) -> Vec<DriverPrediction>;
}

/// Selectable strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyKind {
    #[default]
    Weighted,
    Classifier,
}

impl StrategyKind {
    /// Parses a strategy name (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "weighted" | "statistical" => Some(StrategyKind::Weighted),
            "classifier" | "ml" => Some(StrategyKind::Classifier),
            _ => None,
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Weighted => write!(f, "weighted"),
            StrategyKind::Classifier => write!(f, "classifier"),
        }
    }
}

/// Builds the strategy for `kind`
///
/// A classifier whose model cannot be loaded is replaced by the weighted
/// strategy.
pub fn build_strategy(kind: StrategyKind, model_path: &Path) -> Box<dyn ScoringStrategy> {
    match kind {
        StrategyKind::Weighted => Box::new(WeightedStrategy::default()),
        StrategyKind::Classifier => match ClassifierStrategy::load(model_path) {
            Ok(strategy) => Box::new(strategy),
            Err(e) => {
                warn!(
                    path = %model_path.display(),
                    error = %e,
                    "classifier model unavailable, using weighted strategy"
                );
                Box::new(WeightedStrategy::default())
            }
        },
    }
}

/// Sorts by confidence (highest first) and keeps the best `top_n`
pub fn rank(mut predictions: Vec<DriverPrediction>, top_n: usize) -> Vec<DriverPrediction> {
    predictions.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });
    predictions.truncate(top_n);
    predictions
}

/// Explanation lines for a driver's factor scores
pub fn reasoning(
    inputs: &PredictionInputs,
    standing: &DriverStanding,
    scores: &FactorScores,
) -> Vec<String> {
    let driver_id = standing.driver.driver_id.as_str();
    let mut lines = vec![format!(
        "Championship Position: #{} ({} pts, {} wins) [Score: {:.1}]",
        standing.position, standing.points, standing.wins, scores.championship
    )];

    let recent = factors::recent_results(driver_id, &inputs.season_results, factors::RECENT_RACES);
    if !recent.is_empty() {
        let wins = recent.iter().filter(|r| r.position == 1).count();
        let podiums = recent.iter().filter(|r| r.position <= 3).count();
        let summary = if wins > 0 {
            format!("{} win(s)", wins)
        } else if podiums > 0 {
            format!("{} podium(s)", podiums)
        } else {
            let average =
                recent.iter().map(|r| f64::from(r.position)).sum::<f64>() / recent.len() as f64;
            format!("Avg position {:.1}", average)
        };
        lines.push(format!(
            "Recent Form: {} in last {} races [Score: {:.1}]",
            summary,
            recent.len(),
            scores.form
        ));
    }

    lines.push(format!(
        "Team Performance: {} [Score: {:.1}]",
        standing.constructor.name, scores.team
    ));

    if let (Some(position), Some(score)) = (inputs.qualifying_position(driver_id), scores.qualifying)
    {
        let label = if position == 1 {
            "Pole position".to_string()
        } else {
            format!("P{}", position)
        };
        lines.push(format!("Qualifying: {} [Score: {:.1}]", label, score));
    }

    if let Some(score) = scores.circuit {
        let history: Vec<&RaceResult> = inputs
            .circuit_history
            .iter()
            .filter(|r| r.driver.driver_id == driver_id)
            .collect();
        if !history.is_empty() {
            let wins = history.iter().filter(|r| r.position == 1).count();
            let podiums = history.iter().filter(|r| r.position <= 3).count();
            let summary = if wins > 0 {
                format!("{} win(s)", wins)
            } else if podiums > 0 {
                format!("{} podium(s)", podiums)
            } else {
                format!("{} race(s)", history.len())
            };
            lines.push(format!(
                "Circuit History: {} at this circuit [Score: {:.1}]",
                summary, score
            ));
        }
    }

    lines
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::data::tests::{sample_constructor, sample_driver, sample_race};

    pub(crate) fn standing(driver: &str, team: &str, position: u32, points: f64) -> DriverStanding {
        DriverStanding {
            driver: sample_driver(driver),
            constructor: sample_constructor(team),
            position,
            points,
            wins: 0,
        }
    }

    pub(crate) fn result(driver: &str, round: u32, position: u32) -> RaceResult {
        RaceResult {
            race: sample_race(round),
            driver: sample_driver(driver),
            constructor: sample_constructor("team"),
            position,
            points: 0.0,
            grid: position,
            laps: 50,
            status: "Finished".to_string(),
        }
    }

    pub(crate) fn qualifying(driver: &str, position: u32) -> QualifyingResult {
        QualifyingResult {
            race: sample_race(10),
            driver: sample_driver(driver),
            constructor: sample_constructor("team"),
            position,
            q1: None,
            q2: None,
            q3: None,
        }
    }

    /// Three drivers; "leader" is ahead on every factor
    pub(crate) fn sample_inputs() -> PredictionInputs {
        PredictionInputs {
            race: sample_race(10),
            driver_standings: vec![
                standing("leader", "red_bull", 1, 200.0),
                standing("chaser", "ferrari", 2, 150.0),
                standing("backmarker", "haas", 3, 10.0),
            ],
            constructor_standings: Vec::new(),
            season_results: vec![
                result("leader", 1, 1),
                result("chaser", 1, 2),
                result("backmarker", 1, 15),
            ],
            qualifying: Vec::new(),
            circuit_history: Vec::new(),
        }
    }

    #[test]
    fn test_data_completeness() {
        let mut inputs = sample_inputs();
        assert!((inputs.data_completeness() - 0.6).abs() < 1e-9);

        inputs.qualifying.push(qualifying("leader", 1));
        assert!((inputs.data_completeness() - 0.8).abs() < 1e-9);

        inputs.circuit_history.push(result("leader", 2, 1));
        assert!((inputs.data_completeness() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_optional_factors_absent_without_data() {
        let inputs = sample_inputs();
        let scores = FactorScores::for_driver(&inputs, &inputs.driver_standings[0]);

        assert!(scores.qualifying.is_none());
        assert!(scores.circuit.is_none());
        assert_eq!(scores.team, NEUTRAL_SCORE);
        assert_eq!(scores.features()[3], NEUTRAL_SCORE);
    }

    #[test]
    fn test_driver_missing_from_qualifying_is_neutral() {
        let mut inputs = sample_inputs();
        inputs.qualifying.push(qualifying("leader", 1));

        let leader = FactorScores::for_driver(&inputs, &inputs.driver_standings[0]);
        let chaser = FactorScores::for_driver(&inputs, &inputs.driver_standings[1]);

        assert_eq!(leader.qualifying, Some(100.0));
        assert_eq!(chaser.qualifying, Some(NEUTRAL_SCORE));
    }

    #[test]
    fn test_rank_orders_and_truncates() {
        let make = |id: &str, confidence: f64| DriverPrediction {
            driver: sample_driver(id),
            constructor: sample_constructor("team"),
            confidence,
            factors: FactorScores {
                championship: 0.0,
                form: 0.0,
                team: 0.0,
                qualifying: None,
                circuit: None,
            },
            reasoning: Vec::new(),
        };

        let ranked = rank(vec![make("a", 10.0), make("b", 30.0), make("c", 20.0)], 2);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].driver.driver_id, "b");
        assert_eq!(ranked[1].driver.driver_id, "c");
    }

    #[test]
    fn test_reasoning_lines() {
        let mut inputs = sample_inputs();
        inputs.qualifying.push(qualifying("leader", 1));
        inputs.circuit_history.push(result("leader", 2, 1));
        let standing = &inputs.driver_standings[0];
        let scores = FactorScores::for_driver(&inputs, standing);

        let lines = reasoning(&inputs, standing, &scores);

        assert!(lines[0].starts_with("Championship Position: #1"));
        assert!(lines.iter().any(|l| l.starts_with("Recent Form: 1 win(s) in last 1 races")));
        assert!(lines.iter().any(|l| l.starts_with("Team Performance: red_bull")));
        assert!(lines.iter().any(|l| l.starts_with("Qualifying: Pole position")));
        assert!(lines.iter().any(|l| l.starts_with("Circuit History: 1 win(s)")));
    }

    #[test]
    fn test_strategy_kind_from_str() {
        assert_eq!(StrategyKind::from_str("weighted"), Some(StrategyKind::Weighted));
        assert_eq!(StrategyKind::from_str("Classifier"), Some(StrategyKind::Classifier));
        assert_eq!(StrategyKind::from_str("ml"), Some(StrategyKind::Classifier));
        assert_eq!(StrategyKind::from_str("coinflip"), None);
    }

    #[test]
    fn test_build_strategy_falls_back_without_model() {
        let strategy = build_strategy(
            StrategyKind::Classifier,
            Path::new("/nonexistent/f1cast/model.json"),
        );
        assert_eq!(strategy.name(), "weighted");
    }
}

//! Individual factor scores, each on a 0-100 scale
//!
//! A factor with no data to work from scores [`NEUTRAL_SCORE`].

use crate::data::{ConstructorStanding, DriverStanding, RaceResult};

/// Score used when a factor has nothing to go on
pub const NEUTRAL_SCORE: f64 = 50.0;

/// Number of most recent races counted towards form
pub const RECENT_RACES: usize = 5;

/// Form points for P1..P10
const FORM_POINTS: [f64; 10] = [25.0, 18.0, 15.0, 12.0, 10.0, 8.0, 6.0, 4.0, 2.0, 1.0];

/// Form penalty for a retirement outside the points
const DNF_PENALTY: f64 = -2.0;

/// The driver's results, most recent first, capped at `limit`
pub fn recent_results<'a>(
    driver_id: &str,
    results: &'a [RaceResult],
    limit: usize,
) -> Vec<&'a RaceResult> {
    let mut driver_results: Vec<&RaceResult> = results
        .iter()
        .filter(|r| r.driver.driver_id == driver_id)
        .collect();
    driver_results.sort_by(|a, b| b.race.date.cmp(&a.race.date));
    driver_results.truncate(limit);
    driver_results
}

/// Recent form over the last [`RECENT_RACES`] races
///
/// Each race earns championship-style points (25 for a win down to 1 for
/// tenth) or a penalty for a non-finish outside the top ten; the total is
/// rescaled from `[-2, 25] * RECENT_RACES` onto 0-100.
pub fn driver_form(driver_id: &str, results: &[RaceResult]) -> f64 {
    let recent = recent_results(driver_id, results, RECENT_RACES);
    if recent.is_empty() {
        return NEUTRAL_SCORE;
    }

    let total: f64 = recent
        .iter()
        .map(|r| {
            if r.status != "Finished" && r.position > 10 {
                DNF_PENALTY
            } else {
                (r.position as usize)
                    .checked_sub(1)
                    .and_then(|i| FORM_POINTS.get(i))
                    .copied()
                    .unwrap_or(0.0)
            }
        })
        .sum();

    let max = FORM_POINTS[0] * RECENT_RACES as f64;
    let min = DNF_PENALTY * RECENT_RACES as f64;
    ((total - min) / (max - min) * 100.0).clamp(0.0, 100.0)
}

/// Constructor championship position, plus up to 10 for share of wins
pub fn team_performance(constructor_id: &str, standings: &[ConstructorStanding]) -> f64 {
    let Some(standing) = standings
        .iter()
        .find(|s| s.constructor.constructor_id == constructor_id)
    else {
        return NEUTRAL_SCORE;
    };

    let position_score = position_score(standing.position, standings.len());
    let total_wins: u32 = standings.iter().map(|s| s.wins).sum();
    let win_bonus = if total_wins > 0 {
        f64::from(standing.wins) / f64::from(total_wins) * 10.0
    } else {
        0.0
    };

    (position_score + win_bonus).min(100.0)
}

/// Average result at the circuit: 30 per win, 15 per podium, 5 per points finish
pub fn circuit_advantage(driver_id: &str, history: &[RaceResult]) -> f64 {
    let driver_history: Vec<&RaceResult> = history
        .iter()
        .filter(|r| r.driver.driver_id == driver_id)
        .collect();
    if driver_history.is_empty() {
        return NEUTRAL_SCORE;
    }

    let total: f64 = driver_history
        .iter()
        .map(|r| match r.position {
            1 => 30.0,
            2..=3 => 15.0,
            4..=10 => 5.0,
            _ => 0.0,
        })
        .sum();
    let average = total / driver_history.len() as f64;

    (average / 30.0 * 100.0).clamp(0.0, 100.0)
}

/// Grid position impact; position 0 means unknown
pub fn qualifying_impact(position: u32) -> f64 {
    match position {
        0 => NEUTRAL_SCORE,
        1 => 100.0,
        2 => 90.0,
        3 => 80.0,
        4..=5 => 70.0,
        6..=10 => 50.0,
        p => (50.0 - f64::from(p - 10) * 5.0).max(0.0),
    }
}

/// Drivers' championship position, scaled by points relative to the leader
pub fn championship(driver_id: &str, standings: &[DriverStanding]) -> f64 {
    let Some(standing) = standings.iter().find(|s| s.driver.driver_id == driver_id) else {
        return NEUTRAL_SCORE;
    };

    let mut score = position_score(standing.position, standings.len());
    let leader_points = standings.iter().map(|s| s.points).fold(0.0, f64::max);
    if leader_points > 0.0 {
        score *= 0.5 + 0.5 * (standing.points / leader_points);
    }

    score.clamp(0.0, 100.0)
}

/// 100 for first, falling linearly by `100 / field_size` per place
fn position_score(position: u32, field_size: usize) -> f64 {
    if field_size == 0 {
        return NEUTRAL_SCORE;
    }
    let step = 100.0 / field_size as f64;
    (100.0 - f64::from(position.saturating_sub(1)) * step).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::tests::{sample_constructor, sample_driver, sample_race};

    fn result(driver: &str, round: u32, position: u32, status: &str) -> RaceResult {
        RaceResult {
            race: sample_race(round),
            driver: sample_driver(driver),
            constructor: sample_constructor("red_bull"),
            position,
            points: 0.0,
            grid: position,
            laps: 50,
            status: status.to_string(),
        }
    }

    fn driver_standing(driver: &str, position: u32, points: f64) -> DriverStanding {
        DriverStanding {
            driver: sample_driver(driver),
            constructor: sample_constructor("red_bull"),
            position,
            points,
            wins: 0,
        }
    }

    fn constructor_standing(id: &str, position: u32, wins: u32) -> ConstructorStanding {
        ConstructorStanding {
            constructor: sample_constructor(id),
            position,
            points: 0.0,
            wins,
        }
    }

    #[test]
    fn test_form_neutral_without_results() {
        assert_eq!(driver_form("verstappen", &[]), NEUTRAL_SCORE);
        let others = vec![result("norris", 1, 1, "Finished")];
        assert_eq!(driver_form("verstappen", &others), NEUTRAL_SCORE);
    }

    #[test]
    fn test_form_perfect_run() {
        let results: Vec<RaceResult> = (1..=5)
            .map(|round| result("verstappen", round, 1, "Finished"))
            .collect();
        assert!((driver_form("verstappen", &results) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_form_all_retirements() {
        let results: Vec<RaceResult> = (1..=5)
            .map(|round| result("sargeant", round, 18, "Engine"))
            .collect();
        assert!(driver_form("sargeant", &results).abs() < 1e-9);
    }

    #[test]
    fn test_form_uses_most_recent_races() {
        // Five recent wins outweigh an older retirement
        let mut results: Vec<RaceResult> = (2..=6)
            .map(|round| result("verstappen", round, 1, "Finished"))
            .collect();
        results.push(result("verstappen", 1, 20, "Gearbox"));

        assert!((driver_form("verstappen", &results) - 100.0).abs() < 1e-9);
        let recent = recent_results("verstappen", &results, RECENT_RACES);
        assert_eq!(recent.len(), 5);
        assert_eq!(recent[0].race.round, 6);
    }

    #[test]
    fn test_form_single_win() {
        let results = vec![result("leclerc", 1, 1, "Finished")];
        // (25 + 10) / 135 * 100
        let expected = 35.0 / 135.0 * 100.0;
        assert!((driver_form("leclerc", &results) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_team_performance() {
        let standings = vec![
            constructor_standing("red_bull", 1, 6),
            constructor_standing("ferrari", 2, 2),
            constructor_standing("mclaren", 3, 2),
            constructor_standing("mercedes", 4, 0),
        ];

        // Leader: 100 + 6/10 * 10, capped
        assert_eq!(team_performance("red_bull", &standings), 100.0);
        // Second of four: 75 + 2
        assert!((team_performance("ferrari", &standings) - 77.0).abs() < 1e-9);
        assert!((team_performance("mercedes", &standings) - 25.0).abs() < 1e-9);
        assert_eq!(team_performance("williams", &standings), NEUTRAL_SCORE);
        assert_eq!(team_performance("red_bull", &[]), NEUTRAL_SCORE);
    }

    #[test]
    fn test_circuit_advantage() {
        let history = vec![
            result("hamilton", 1, 1, "Finished"),
            result("hamilton", 2, 3, "Finished"),
            result("hamilton", 3, 12, "Finished"),
        ];
        // (30 + 15 + 0) / 3 = 15 -> 50
        assert!((circuit_advantage("hamilton", &history) - 50.0).abs() < 1e-9);
        assert_eq!(circuit_advantage("piastri", &history), NEUTRAL_SCORE);

        let wins = vec![result("senna", 1, 1, "Finished")];
        assert!((circuit_advantage("senna", &wins) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_qualifying_impact() {
        assert_eq!(qualifying_impact(0), NEUTRAL_SCORE);
        assert_eq!(qualifying_impact(1), 100.0);
        assert_eq!(qualifying_impact(2), 90.0);
        assert_eq!(qualifying_impact(3), 80.0);
        assert_eq!(qualifying_impact(5), 70.0);
        assert_eq!(qualifying_impact(10), 50.0);
        assert_eq!(qualifying_impact(12), 40.0);
        assert_eq!(qualifying_impact(20), 0.0);
    }

    #[test]
    fn test_championship_scales_by_points_gap() {
        let standings = vec![
            driver_standing("verstappen", 1, 200.0),
            driver_standing("norris", 2, 100.0),
        ];

        assert!((championship("verstappen", &standings) - 100.0).abs() < 1e-9);
        // 50 * (0.5 + 0.5 * 0.5)
        assert!((championship("norris", &standings) - 37.5).abs() < 1e-9);
        assert_eq!(championship("alonso", &standings), NEUTRAL_SCORE);
    }

    #[test]
    fn test_championship_before_any_points() {
        let standings = vec![
            driver_standing("verstappen", 1, 0.0),
            driver_standing("norris", 2, 0.0),
        ];
        assert!((championship("norris", &standings) - 50.0).abs() < 1e-9);
    }
}

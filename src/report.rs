//! Plain-text rendering of prediction results

use std::fmt::Write;

use crate::engine::{PredictionError, PredictionResult};

/// Race header followed by a numbered list of drivers
pub fn render(result: &PredictionResult, verbose: bool) -> String {
    let race = &result.race;
    let mut out = String::new();

    let _ = writeln!(out, "{} (Round {}, {})", race.race_name, race.round, race.season);
    let _ = writeln!(
        out,
        "{}, {}, {}",
        race.circuit.circuit_name, race.circuit.locality, race.circuit.country
    );
    let _ = writeln!(out, "{}", race.date.format("%Y-%m-%d %H:%M UTC"));
    out.push('\n');

    for (rank, prediction) in result.predictions.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. {} ({}) - {:.1}%",
            rank + 1,
            prediction.driver.full_name(),
            prediction.constructor.name,
            prediction.confidence
        );
        if verbose {
            for line in &prediction.reasoning {
                let _ = writeln!(out, "   - {}", line);
            }
        }
    }

    out.push('\n');
    let _ = writeln!(
        out,
        "Data completeness: {:.0}% | Strategy: {} | Source: {}",
        result.data_completeness * 100.0,
        result.strategy,
        result.data_sources.join(", ")
    );
    out
}

/// Error message with suggestions
pub fn render_error(error: &PredictionError) -> String {
    let mut out = format!("Error: {}\n", error);
    let suggestions = error.suggestions();
    if !suggestions.is_empty() {
        out.push_str("\nSuggestions:\n");
        for suggestion in suggestions {
            let _ = writeln!(out, "  - {}", suggestion);
        }
    }
    out
}

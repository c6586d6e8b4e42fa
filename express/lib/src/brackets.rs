//! The bracket parsing policy: whether simultaneous-note groups are attempted as single-foot
//! brackets or forced into two-footed jumps.
//!
//! The policy is configuration-driven.  Under dynamic determination, a fast pre-pass counts
//! the brackets a `Balanced` expression would imply and switches to `Aggressive` or
//! `NoBrackets` according to per-minute thresholds.

use itertools::Itertools;
use padframe::{Foot, PadData};
use serde::Deserialize;

use crate::chart::{Chart, Rows};

/// How eagerly simultaneous notes are parsed as brackets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum BracketParsingMethod {
    /// Brackets compete with jumps on cost alone.
    Aggressive,
    /// Brackets are admitted but charged when a jump could cover the row.
    Balanced,
    /// Links containing any bracket cell are rejected outright.
    NoBrackets,
}

/// Whether to use [`ExpressConfig::default_bracket_parsing_method`] as-is or to pre-scan the
/// chart and pick a method per expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum BracketParsingDetermination {
    UseDefault,
    ChooseMethodDynamically,
}

/// The recognised expression options.  Field names deserialize from the exact configuration
/// keys, so a `serde_json`/`toml` value with keys like `"MinLevelForBrackets"` maps directly.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "PascalCase", default)]
pub struct ExpressConfig {
    pub default_bracket_parsing_method: BracketParsingMethod,
    pub bracket_parsing_determination: BracketParsingDetermination,
    /// Charts rated below this level never bracket.
    pub min_level_for_brackets: u32,
    #[serde(
        rename = "UseAggressiveBracketsWhenMoreSimultaneousNotesThanCanBeCoveredWithoutBrackets"
    )]
    pub use_aggressive_brackets_when_infeasible_otherwise: bool,
    /// At or above this many implied brackets per minute, parse aggressively.
    pub balanced_brackets_per_minute_for_aggressive_brackets: f64,
    /// At or below this many implied brackets per minute, don't bracket at all.
    pub balanced_brackets_per_minute_for_no_brackets: f64,
}

impl Default for ExpressConfig {
    fn default() -> Self {
        ExpressConfig {
            default_bracket_parsing_method: BracketParsingMethod::Balanced,
            bracket_parsing_determination: BracketParsingDetermination::ChooseMethodDynamically,
            min_level_for_brackets: 7,
            use_aggressive_brackets_when_infeasible_otherwise: true,
            balanced_brackets_per_minute_for_aggressive_brackets: 3.0,
            balanced_brackets_per_minute_for_no_brackets: 0.571,
        }
    }
}

impl ExpressConfig {
    /// Picks the bracket parsing method for one chart.
    pub fn method_for(&self, chart: &Chart, rows: &Rows, pad: &PadData) -> BracketParsingMethod {
        if chart.rating < self.min_level_for_brackets {
            return BracketParsingMethod::NoBrackets;
        }
        // More simultaneous notes than feet can only be covered with brackets
        if self.use_aggressive_brackets_when_infeasible_otherwise
            && rows.iter().any(|row| row.claimed().count() > 2)
        {
            return BracketParsingMethod::Aggressive;
        }
        match self.bracket_parsing_determination {
            BracketParsingDetermination::UseDefault => self.default_bracket_parsing_method,
            BracketParsingDetermination::ChooseMethodDynamically => {
                let per_minute = implied_brackets_per_minute(chart, rows, pad);
                if per_minute >= self.balanced_brackets_per_minute_for_aggressive_brackets {
                    BracketParsingMethod::Aggressive
                } else if per_minute <= self.balanced_brackets_per_minute_for_no_brackets {
                    BracketParsingMethod::NoBrackets
                } else {
                    BracketParsingMethod::Balanced
                }
            }
        }
    }
}

/// Estimates how many brackets per minute a `Balanced` expression of this chart would imply:
/// multi-note rows whose lanes contain a bracketable pairing for some foot.
fn implied_brackets_per_minute(chart: &Chart, rows: &Rows, pad: &PadData) -> f64 {
    let implied = rows
        .iter()
        .filter(|row| {
            row.claimed().count() >= 2
                && row
                    .claimed()
                    .iter()
                    .tuple_combinations()
                    .any(|(a, b)| {
                        Foot::BOTH.into_iter().any(|foot| {
                            pad.bracketable_heel(a, foot, b) || pad.bracketable_heel(b, foot, a)
                        })
                    })
        })
        .count();
    if implied == 0 {
        return 0.0;
    }
    let first = rows.iter().map(|r| r.tick).next().unwrap_or(0);
    let last = rows.iter().map(|r| r.tick).last().unwrap_or(0);
    let minutes = (last.saturating_sub(first)) as f64 / chart.ticks_per_minute;
    if minutes <= f64::EPSILON {
        // A burst shorter than the tick resolution: treat as one dense minute
        return implied as f64;
    }
    implied as f64 / minutes
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::chart::{ChartType, Note, NoteKind};
    use padframe::Lane;

    fn dance_single() -> PadData {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../data/dance-single.json");
        PadData::read_from_file(Path::new(path)).unwrap()
    }

    fn tap(tick: u64, lane: usize) -> Note {
        Note {
            tick,
            lane: Lane::from_index(lane),
            kind: NoteKind::Tap,
        }
    }

    fn chart(rating: u32, ticks_per_minute: f64, notes: Vec<Note>) -> Chart {
        Chart {
            chart_type: ChartType::DanceSingle,
            rating,
            ticks_per_minute,
            notes,
        }
    }

    #[test]
    fn low_rated_charts_never_bracket() {
        let pad = dance_single();
        let config = ExpressConfig::default();
        let chart = chart(3, 60.0, vec![tap(0, 0), tap(0, 2)]);
        let rows = Rows::normalise(&chart, 4).unwrap();
        assert_eq!(
            config.method_for(&chart, &rows, &pad),
            BracketParsingMethod::NoBrackets
        );
    }

    #[test]
    fn infeasible_rows_force_aggressive() {
        let pad = dance_single();
        let config = ExpressConfig::default();
        let chart = chart(10, 60.0, vec![tap(0, 0), tap(0, 1), tap(0, 2)]);
        let rows = Rows::normalise(&chart, 4).unwrap();
        assert_eq!(
            config.method_for(&chart, &rows, &pad),
            BracketParsingMethod::Aggressive
        );
    }

    #[test]
    fn dense_bracketable_rows_go_aggressive() {
        let pad = dance_single();
        let config = ExpressConfig::default();
        // Four bracketable two-note rows within one minute of ticks
        let notes = (0..4)
            .flat_map(|i| [tap(i * 10, 0), tap(i * 10, 2)])
            .collect();
        let chart = chart(10, 60.0, notes); // 30 ticks span = half a minute
        let rows = Rows::normalise(&chart, 4).unwrap();
        assert_eq!(
            config.method_for(&chart, &rows, &pad),
            BracketParsingMethod::Aggressive
        );
    }

    #[test]
    fn sparse_bracketable_rows_forbid_brackets() {
        let pad = dance_single();
        let config = ExpressConfig::default();
        // One bracketable row across a ten-minute chart is below the no-brackets threshold
        let notes = vec![tap(0, 0), tap(0, 2), tap(600, 3)];
        let chart = chart(10, 60.0, notes);
        let rows = Rows::normalise(&chart, 4).unwrap();
        assert_eq!(
            config.method_for(&chart, &rows, &pad),
            BracketParsingMethod::NoBrackets
        );
    }

    #[test]
    fn taps_only_charts_forbid_brackets_dynamically() {
        let pad = dance_single();
        let config = ExpressConfig::default();
        let chart = chart(10, 60.0, vec![tap(0, 0), tap(10, 3)]);
        let rows = Rows::normalise(&chart, 4).unwrap();
        assert_eq!(
            config.method_for(&chart, &rows, &pad),
            BracketParsingMethod::NoBrackets
        );
    }

    #[test]
    fn use_default_skips_the_prepass() {
        let pad = dance_single();
        let config = ExpressConfig {
            bracket_parsing_determination: BracketParsingDetermination::UseDefault,
            default_bracket_parsing_method: BracketParsingMethod::Balanced,
            ..ExpressConfig::default()
        };
        let chart = chart(10, 60.0, vec![tap(0, 0), tap(10, 3)]);
        let rows = Rows::normalise(&chart, 4).unwrap();
        assert_eq!(
            config.method_for(&chart, &rows, &pad),
            BracketParsingMethod::Balanced
        );
    }

    #[test]
    fn config_deserializes_from_documented_keys() {
        let json = r#"{
            "DefaultBracketParsingMethod": "Aggressive",
            "BracketParsingDetermination": "UseDefault",
            "MinLevelForBrackets": 9,
            "UseAggressiveBracketsWhenMoreSimultaneousNotesThanCanBeCoveredWithoutBrackets": false,
            "BalancedBracketsPerMinuteForAggressiveBrackets": 4.5,
            "BalancedBracketsPerMinuteForNoBrackets": 1.0
        }"#;
        let config: ExpressConfig = serde_json::from_str(json).unwrap();
        assert_eq!(
            config.default_bracket_parsing_method,
            BracketParsingMethod::Aggressive
        );
        assert_eq!(config.min_level_for_brackets, 9);
        assert!(!config.use_aggressive_brackets_when_infeasible_otherwise);
        assert_eq!(
            config.balanced_brackets_per_minute_for_aggressive_brackets,
            4.5
        );
    }
}

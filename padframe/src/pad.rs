//! Static description of one pad variant: lane positions and the relational tables that say
//! which stances are physically meaningful.
//!
//! A [`PadData`] is built once (usually from a JSON file) and then shared read-only between any
//! number of chart expressions.  All tables are indexed from the point of view of a foot
//! *resting* on the lane that owns the table; the second index is the lane the query is about.

use std::{
    error::Error,
    fmt::{Display, Formatter},
    io::Read,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::{Foot, Lane};

/// A 2-D integer position of a lane on the pad.  `x` grows to the player's right, `y` grows
/// towards the back of the pad (so a smaller `y` is bodily in front).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

/// The relational tables for one lane.  Each table is `[foot] -> Vec<bool>` over the other lane
/// index, except `valid_next` which is foot-independent.
#[derive(Debug, Clone)]
pub struct LaneData {
    /// `valid_next[a2]`: can any foot step to `a2` next, starting from this lane.
    pub valid_next: Vec<bool>,
    /// `bracketable_heel[f][a2]`: foot `f` with heel on this lane and toe on `a2` is a
    /// physically possible bracket.
    pub bracketable_heel: [Vec<bool>; 2],
    /// `bracketable_toe[f][a2]`: foot `f` with toe on this lane and heel on `a2`.
    pub bracketable_toe: [Vec<bool>; 2],
    /// `other_foot_pairings[f][a2]`: foot `f` on this lane, other foot on `a2`, normal stance.
    pub other_foot_pairings: [Vec<bool>; 2],
    /// Other foot on `a2` is crossed over behind the body.
    pub crossover_behind: [Vec<bool>; 2],
    /// Other foot on `a2` is crossed over in front of the body.
    pub crossover_front: [Vec<bool>; 2],
    /// The stance with the other foot on `a2` is fully inverted.
    pub inverted: [Vec<bool>; 2],
    /// Normal-stance pairings which require a stretch.
    pub pairings_stretch: [Vec<bool>; 2],
    /// Crossed-behind pairings which require a stretch.
    pub crossover_behind_stretch: [Vec<bool>; 2],
}

/// Static data for one pad variant (e.g. `dance-single`).
#[derive(Debug, Clone)]
pub struct PadData {
    chart_type_tag: String,
    num_lanes: usize,
    positions: Vec<Position>,
    starting_lanes: [Lane; 2],
    lanes: Vec<LaneData>,
}

impl PadData {
    /// Reads a `PadData` from a JSON file, validating the §-invariants before returning.
    pub fn read_from_file(path: &Path) -> Result<Self, PadDataError> {
        let mut file_contents = String::new();
        std::fs::File::open(path)
            .and_then(|mut f| f.read_to_string(&mut file_contents))
            .map_err(|e| PadDataError::Io(path.to_owned(), e))?;
        Self::parse(&file_contents).map_err(|e| match e {
            PadDataError::Json(_, inner) => PadDataError::Json(path.to_owned(), inner),
            other => other,
        })
    }

    /// Parses a `PadData` from a JSON string.
    pub fn parse(json: &str) -> Result<Self, PadDataError> {
        let file: file::PadFile =
            serde_json::from_str(json).map_err(|e| PadDataError::Json(PathBuf::new(), e))?;
        let pad = file.into_pad_data()?;
        pad.validate()?;
        log::debug!(
            "loaded pad {:?} with {} lanes",
            pad.chart_type_tag,
            pad.num_lanes
        );
        Ok(pad)
    }

    /// Builds a `PadData` directly from its parts, validating it.  Mostly useful for synthetic
    /// pads in tests and tooling.
    pub fn new(
        chart_type_tag: String,
        positions: Vec<Position>,
        starting_lanes: [Lane; 2],
        lanes: Vec<LaneData>,
    ) -> Result<Self, PadDataError> {
        let pad = Self {
            chart_type_tag,
            num_lanes: positions.len(),
            positions,
            starting_lanes,
            lanes,
        };
        pad.validate()?;
        Ok(pad)
    }

    pub fn chart_type_tag(&self) -> &str {
        &self.chart_type_tag
    }

    pub fn num_lanes(&self) -> usize {
        self.num_lanes
    }

    pub fn position(&self, lane: Lane) -> Position {
        self.positions[lane.index()]
    }

    /// The neutral lane for each foot, where expressions start.
    pub fn starting_lane(&self, foot: Foot) -> Lane {
        self.starting_lanes[foot.index()]
    }

    pub fn lane_data(&self, lane: Lane) -> &LaneData {
        &self.lanes[lane.index()]
    }

    /* Table accessors.  `resting` is the lane owning the table; `foot` is the foot on it. */

    pub fn valid_next(&self, from: Lane, to: Lane) -> bool {
        self.lanes[from.index()].valid_next[to.index()]
    }

    pub fn bracketable_heel(&self, heel: Lane, foot: Foot, toe: Lane) -> bool {
        self.lanes[heel.index()].bracketable_heel[foot.index()][toe.index()]
    }

    pub fn bracketable_toe(&self, toe: Lane, foot: Foot, heel: Lane) -> bool {
        self.lanes[toe.index()].bracketable_toe[foot.index()][heel.index()]
    }

    pub fn normal_pairing(&self, resting: Lane, foot: Foot, other: Lane) -> bool {
        self.lanes[resting.index()].other_foot_pairings[foot.index()][other.index()]
    }

    pub fn crossover_behind(&self, resting: Lane, foot: Foot, other: Lane) -> bool {
        self.lanes[resting.index()].crossover_behind[foot.index()][other.index()]
    }

    pub fn crossover_front(&self, resting: Lane, foot: Foot, other: Lane) -> bool {
        self.lanes[resting.index()].crossover_front[foot.index()][other.index()]
    }

    pub fn inverted(&self, resting: Lane, foot: Foot, other: Lane) -> bool {
        self.lanes[resting.index()].inverted[foot.index()][other.index()]
    }

    pub fn stretch_pairing(&self, resting: Lane, foot: Foot, other: Lane) -> bool {
        self.lanes[resting.index()].pairings_stretch[foot.index()][other.index()]
    }

    pub fn crossover_behind_stretch(&self, resting: Lane, foot: Foot, other: Lane) -> bool {
        self.lanes[resting.index()].crossover_behind_stretch[foot.index()][other.index()]
    }

    /// `true` if `lane` takes part in *any* bracketable pairing for `foot`.
    pub fn is_bracketable_lane(&self, lane: Lane, foot: Foot) -> bool {
        let data = &self.lanes[lane.index()];
        data.bracketable_heel[foot.index()].iter().any(|&b| b)
            || data.bracketable_toe[foot.index()].iter().any(|&b| b)
    }

    /// Checks the structural, symmetry and coverage invariants, returning the first violation.
    fn validate(&self) -> Result<(), PadDataError> {
        let n = self.num_lanes;
        if n == 0 {
            return Err(PadDataError::Malformed("pad has no lanes".to_owned()));
        }
        if self.positions.len() != n || self.lanes.len() != n {
            return Err(PadDataError::Malformed(format!(
                "expected {} lanes of data, got {} positions and {} tables",
                n,
                self.positions.len(),
                self.lanes.len()
            )));
        }
        for foot in Foot::BOTH {
            if self.starting_lane(foot).index() >= n {
                return Err(PadDataError::Malformed(format!(
                    "starting lane for {} foot is out of range",
                    foot
                )));
            }
        }
        for (idx, lane) in self.lanes.iter().enumerate() {
            for (name, table) in lane.tables() {
                if table.len() != n {
                    return Err(PadDataError::Malformed(format!(
                        "table {} of lane {} has length {}, expected {}",
                        name,
                        idx,
                        table.len(),
                        n
                    )));
                }
            }
        }

        // Symmetry: mirroring both lanes and the foot must map each table onto its
        // front<->behind / heel<->toe counterpart.
        let check = |name: &'static str,
                     get: &dyn Fn(&Self, Lane, Foot, Lane) -> bool,
                     counterpart: &dyn Fn(&Self, Lane, Foot, Lane) -> bool|
         -> Result<(), PadDataError> {
            for a in Lane::all(n) {
                for a2 in Lane::all(n) {
                    for f in Foot::BOTH {
                        if get(self, a, f, a2)
                            != counterpart(self, a.mirror(n), f.other(), a2.mirror(n))
                        {
                            return Err(PadDataError::Asymmetric {
                                table: name,
                                lane: a,
                                foot: f,
                                other: a2,
                            });
                        }
                    }
                }
            }
            Ok(())
        };
        check(
            "ValidNextArrows",
            &|p, a, _, a2| p.valid_next(a, a2),
            &|p, a, _, a2| p.valid_next(a, a2),
        )?;
        check(
            "BracketablePairingsOtherHeel",
            &Self::bracketable_heel_by_foot,
            &Self::bracketable_toe_by_foot,
        )?;
        check(
            "BracketablePairingsOtherToe",
            &Self::bracketable_toe_by_foot,
            &Self::bracketable_heel_by_foot,
        )?;
        check("OtherFootPairings", &Self::normal_pairing, &Self::normal_pairing)?;
        check(
            "OtherFootPairingsOtherFootCrossoverBehind",
            &Self::crossover_behind,
            &Self::crossover_front,
        )?;
        check(
            "OtherFootPairingsOtherFootCrossoverFront",
            &Self::crossover_front,
            &Self::crossover_behind,
        )?;
        check("OtherFootPairingsInverted", &Self::inverted, &Self::inverted)?;
        check(
            "OtherFootPairingsStretch",
            &Self::stretch_pairing,
            &Self::stretch_pairing,
        )?;
        check(
            "OtherFootPairingsOtherFootCrossoverBehindStretch",
            &Self::crossover_behind_stretch,
            &Self::crossover_behind_stretch,
        )?;

        // Coverage: any true pairing entry implies `valid_next`.
        for a in Lane::all(n) {
            for a2 in Lane::all(n) {
                for f in Foot::BOTH {
                    let any_pairing = self.bracketable_heel(a, f, a2)
                        || self.bracketable_toe(a, f, a2)
                        || self.normal_pairing(a, f, a2)
                        || self.crossover_behind(a, f, a2)
                        || self.crossover_front(a, f, a2)
                        || self.inverted(a, f, a2)
                        || self.stretch_pairing(a, f, a2)
                        || self.crossover_behind_stretch(a, f, a2);
                    if any_pairing && !self.valid_next(a, a2) {
                        return Err(PadDataError::Malformed(format!(
                            "lane {} pairs with lane {} for the {} foot but ValidNextArrows \
                             doesn't cover it",
                            a, a2, f
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    // Thin wrappers with the `(lane, foot, lane)` shape that `validate`'s closures expect
    fn bracketable_heel_by_foot(&self, a: Lane, f: Foot, a2: Lane) -> bool {
        self.bracketable_heel(a, f, a2)
    }
    fn bracketable_toe_by_foot(&self, a: Lane, f: Foot, a2: Lane) -> bool {
        self.bracketable_toe(a, f, a2)
    }
}

impl LaneData {
    fn tables(&self) -> impl Iterator<Item = (&'static str, &Vec<bool>)> {
        [
            ("ValidNextArrows", &self.valid_next),
            ("BracketablePairingsOtherHeel[L]", &self.bracketable_heel[0]),
            ("BracketablePairingsOtherHeel[R]", &self.bracketable_heel[1]),
            ("BracketablePairingsOtherToe[L]", &self.bracketable_toe[0]),
            ("BracketablePairingsOtherToe[R]", &self.bracketable_toe[1]),
            ("OtherFootPairings[L]", &self.other_foot_pairings[0]),
            ("OtherFootPairings[R]", &self.other_foot_pairings[1]),
            ("CrossoverBehind[L]", &self.crossover_behind[0]),
            ("CrossoverBehind[R]", &self.crossover_behind[1]),
            ("CrossoverFront[L]", &self.crossover_front[0]),
            ("CrossoverFront[R]", &self.crossover_front[1]),
            ("Inverted[L]", &self.inverted[0]),
            ("Inverted[R]", &self.inverted[1]),
            ("Stretch[L]", &self.pairings_stretch[0]),
            ("Stretch[R]", &self.pairings_stretch[1]),
            ("CrossoverBehindStretch[L]", &self.crossover_behind_stretch[0]),
            ("CrossoverBehindStretch[R]", &self.crossover_behind_stretch[1]),
        ]
        .into_iter()
    }
}

/// Error generated when loading or validating [`PadData`].
#[derive(Debug)]
pub enum PadDataError {
    Io(PathBuf, std::io::Error),
    Json(PathBuf, serde_json::Error),
    /// A structural problem: wrong table lengths, out-of-range lanes, broken coverage.
    Malformed(String),
    /// The left-right symmetry invariant is broken for `table` at `(lane, foot, other)`.
    Asymmetric {
        table: &'static str,
        lane: Lane,
        foot: Foot,
        other: Lane,
    },
}

impl Display for PadDataError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PadDataError::Io(path, e) => write!(f, "can't read {:?}: {}", path, e),
            PadDataError::Json(path, e) => write!(f, "can't parse {:?}: {}", path, e),
            PadDataError::Malformed(reason) => write!(f, "malformed pad data: {}", reason),
            PadDataError::Asymmetric {
                table,
                lane,
                foot,
                other,
            } => write!(
                f,
                "pad data is asymmetric: {}[{}][{}] at lane {} has no mirror counterpart",
                table, foot, other, lane
            ),
        }
    }
}

impl Error for PadDataError {}

/// The serde-facing JSON schema.  Kept separate from [`PadData`] so the file layout can evolve
/// without leaking into the rest of the crate.
mod file {
    use serde::Deserialize;

    use super::{LaneData, PadData, PadDataError, Position};
    use crate::Lane;

    #[derive(Debug, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub(super) struct PadFile {
        #[serde(rename = "ChartType")]
        chart_type: String,
        #[serde(rename = "NumArrows")]
        num_arrows: usize,
        #[serde(rename = "StartingPositions")]
        starting_positions: [usize; 2],
        #[serde(rename = "Arrows")]
        arrows: Vec<ArrowFile>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub(super) struct ArrowFile {
        #[serde(rename = "Position")]
        position: [i32; 2],
        #[serde(rename = "ValidNextArrows")]
        valid_next: Vec<bool>,
        #[serde(rename = "BracketablePairingsOtherHeel")]
        bracketable_heel: [Vec<bool>; 2],
        #[serde(rename = "BracketablePairingsOtherToe")]
        bracketable_toe: [Vec<bool>; 2],
        #[serde(rename = "OtherFootPairings")]
        other_foot_pairings: [Vec<bool>; 2],
        #[serde(rename = "OtherFootPairingsOtherFootCrossoverBehind")]
        crossover_behind: [Vec<bool>; 2],
        #[serde(rename = "OtherFootPairingsOtherFootCrossoverFront")]
        crossover_front: [Vec<bool>; 2],
        #[serde(rename = "OtherFootPairingsInverted")]
        inverted: [Vec<bool>; 2],
        #[serde(rename = "OtherFootPairingsStretch", default)]
        pairings_stretch: Option<[Vec<bool>; 2]>,
        #[serde(rename = "OtherFootPairingsOtherFootCrossoverBehindStretch", default)]
        crossover_behind_stretch: Option<[Vec<bool>; 2]>,
    }

    impl PadFile {
        pub(super) fn into_pad_data(self) -> Result<PadData, PadDataError> {
            let n = self.num_arrows;
            if self.arrows.len() != n {
                return Err(PadDataError::Malformed(format!(
                    "NumArrows is {} but {} arrows are listed",
                    n,
                    self.arrows.len()
                )));
            }
            if self.starting_positions.iter().any(|&l| l >= n) {
                return Err(PadDataError::Malformed(
                    "StartingPositions index out of range".to_owned(),
                ));
            }
            let empty = || [vec![false; n], vec![false; n]];
            let positions = self
                .arrows
                .iter()
                .map(|a| Position {
                    x: a.position[0],
                    y: a.position[1],
                })
                .collect();
            let lanes = self
                .arrows
                .into_iter()
                .map(|a| LaneData {
                    valid_next: a.valid_next,
                    bracketable_heel: a.bracketable_heel,
                    bracketable_toe: a.bracketable_toe,
                    other_foot_pairings: a.other_foot_pairings,
                    crossover_behind: a.crossover_behind,
                    crossover_front: a.crossover_front,
                    inverted: a.inverted,
                    pairings_stretch: a.pairings_stretch.unwrap_or_else(empty),
                    crossover_behind_stretch: a.crossover_behind_stretch.unwrap_or_else(empty),
                })
                .collect();
            Ok(PadData {
                chart_type_tag: self.chart_type,
                num_lanes: n,
                positions,
                starting_lanes: [
                    Lane::from_index(self.starting_positions[0]),
                    Lane::from_index(self.starting_positions[1]),
                ],
                lanes,
            })
        }
    }
}

//! Chart input and the row normaliser.
//!
//! The parser boundary hands the engine a flat, timed list of [`Note`]s.  Before searching we
//! convert that into [`Rows`]: one entry per tick that steps, with simultaneous events merged,
//! hold/roll starts paired with their releases, and mines segregated onto their own stream.

use std::{
    collections::HashMap,
    fmt::{Display, Formatter},
    str::FromStr,
};

use itertools::Itertools;
use padframe::{FootAction, InstanceStepType, Lane, LaneMask};

use crate::{Error, Result, RowIdx, RowVec};

/// The pad variants the engine knows how to express.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartType {
    DanceSingle,
    DanceDouble,
}

impl ChartType {
    pub fn as_str(self) -> &'static str {
        match self {
            ChartType::DanceSingle => "dance-single",
            ChartType::DanceDouble => "dance-double",
        }
    }

    /// The conventional file name of this chart type's pad description.
    pub fn pad_file_name(self) -> String {
        format!("{}.json", self.as_str())
    }

    /// The conventional file name of this chart type's precomputed step graph.
    pub fn graph_file_name(self) -> String {
        format!("{}.fsg", self.as_str())
    }
}

impl Display for ChartType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ChartType {
    type Err = UnknownChartType;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "dance-single" => Ok(ChartType::DanceSingle),
            "dance-double" => Ok(ChartType::DanceDouble),
            _ => Err(UnknownChartType(s.to_owned())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UnknownChartType(pub String);

impl Display for UnknownChartType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown chart type {:?}", self.0)
    }
}

impl std::error::Error for UnknownChartType {}

/// One raw chart event, as delivered by the parser boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Note {
    pub tick: u64,
    pub lane: Lane,
    pub kind: NoteKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteKind {
    Tap,
    HoldStart,
    RollStart,
    /// Ends the open hold or roll on the same lane.
    Release,
    Mine,
    Lift,
    Fake,
}

/// A chart ready for expression: its timed events plus the metadata the engine consults.
#[derive(Debug, Clone)]
pub struct Chart {
    pub chart_type: ChartType,
    /// The chart's difficulty rating (block count).
    pub rating: u32,
    /// Converts tick distances into wall-clock time; used only by the bracket pre-pass.
    pub ticks_per_minute: f64,
    pub notes: Vec<Note>,
}

/// What a single lane does on one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RowStepKind {
    Tap,
    HoldStart,
    RollStart,
    Fake,
    Lift,
    HoldRelease,
    RollRelease,
}

impl RowStepKind {
    /// `true` if this step claims its lane (i.e. a foot must press it on this row).
    pub fn claims(self) -> bool {
        !self.releases()
    }

    pub fn releases(self) -> bool {
        matches!(self, RowStepKind::HoldRelease | RowStepKind::RollRelease)
    }

    /// The [`FootAction`] a graph-link cell must carry to cover this step.
    pub fn action(self) -> FootAction {
        match self {
            RowStepKind::Tap | RowStepKind::Fake | RowStepKind::Lift => FootAction::Tap,
            RowStepKind::HoldStart | RowStepKind::RollStart => FootAction::Hold,
            RowStepKind::HoldRelease | RowStepKind::RollRelease => FootAction::Release,
        }
    }

    /// The per-instance flavour recorded on the emitted step event.
    pub fn instance(self) -> InstanceStepType {
        match self {
            RowStepKind::RollStart | RowStepKind::RollRelease => InstanceStepType::Roll,
            RowStepKind::Fake => InstanceStepType::Fake,
            RowStepKind::Lift => InstanceStepType::Lift,
            _ => InstanceStepType::Default,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct RowStep {
    pub lane: Lane,
    pub kind: RowStepKind,
}

/// All the lane actions occurring at exactly one tick.
#[derive(Debug, Clone)]
pub struct Row {
    pub tick: u64,
    pub(crate) steps: Vec<RowStep>,
    /// Lanes which a foot must press on this row.
    pub(crate) claimed: LaneMask,
    /// Lanes whose hold/roll ends on this row.
    pub(crate) released: LaneMask,
    /// Lanes whose hold/roll started strictly before and releases strictly after this row.
    pub(crate) holds_through: LaneMask,
}

impl Row {
    pub fn claimed(&self) -> &LaneMask {
        &self.claimed
    }

    pub(crate) fn step_on(&self, lane: Lane) -> Option<RowStepKind> {
        self.steps.iter().find(|s| s.lane == lane).map(|s| s.kind)
    }
}

/// A mine, kept off the stepped rows.  Mines never participate in the search; they influence it
/// through tie-breaks and are classified afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MineNote {
    pub tick: u64,
    pub lane: Lane,
}

/// The normalised form of one chart.
#[derive(Debug, Clone)]
pub struct Rows {
    rows: RowVec<Row>,
    mines: Vec<MineNote>,
    num_lanes: usize,
}

impl Rows {
    /// Normalises a raw chart into per-tick rows, failing with
    /// [`MalformedChart`](Error::MalformedChart) on inconsistent hold pairing.
    pub fn normalise(chart: &Chart, num_lanes: usize) -> Result<Rows> {
        let mut notes = chart.notes.clone();
        notes.sort_by_key(|n| (n.tick, n.lane));

        // Pair hold/roll starts with their releases, checking as we go.  `open` maps a lane to
        // the tick its hold started on and whether it was a roll.
        let mut open: HashMap<Lane, (u64, bool)> = HashMap::new();
        // Completed `(lane, start, end)` hold spans, used for `holds_through` below.
        let mut spans: Vec<(Lane, u64, u64)> = Vec::new();
        let mut mines = Vec::new();
        let mut rows = RowVec::new();

        let malformed = |tick: u64, lane: Lane, reason: &str| Error::MalformedChart {
            tick,
            lane: Some(lane),
            reason: reason.to_owned(),
        };

        for (tick, group) in &notes.iter().group_by(|n| n.tick) {
            let mut steps = Vec::<RowStep>::new();
            for note in group {
                if note.lane.index() >= num_lanes {
                    return Err(malformed(tick, note.lane, "lane out of range for this pad"));
                }
                if note.kind != NoteKind::Mine && steps.iter().any(|s| s.lane == note.lane) {
                    return Err(malformed(tick, note.lane, "two events share a tick and lane"));
                }

                let held = open.contains_key(&note.lane);
                let kind = match note.kind {
                    NoteKind::Mine => {
                        mines.push(MineNote {
                            tick,
                            lane: note.lane,
                        });
                        continue;
                    }
                    NoteKind::Release => {
                        let (start, is_roll) = open.remove(&note.lane).ok_or_else(|| {
                            malformed(tick, note.lane, "release has no matching hold or roll")
                        })?;
                        spans.push((note.lane, start, tick));
                        if is_roll {
                            RowStepKind::RollRelease
                        } else {
                            RowStepKind::HoldRelease
                        }
                    }
                    _ if held => {
                        return Err(malformed(tick, note.lane, "note during an open hold"));
                    }
                    NoteKind::Tap => RowStepKind::Tap,
                    NoteKind::Fake => RowStepKind::Fake,
                    NoteKind::Lift => RowStepKind::Lift,
                    NoteKind::HoldStart => {
                        open.insert(note.lane, (tick, false));
                        RowStepKind::HoldStart
                    }
                    NoteKind::RollStart => {
                        open.insert(note.lane, (tick, true));
                        RowStepKind::RollStart
                    }
                };
                steps.push(RowStep {
                    lane: note.lane,
                    kind,
                });
            }

            if steps.is_empty() {
                continue; // Mine-only ticks don't make a row
            }
            let claimed = LaneMask::from_lanes(
                num_lanes,
                steps.iter().filter(|s| s.kind.claims()).map(|s| s.lane),
            );
            let released = LaneMask::from_lanes(
                num_lanes,
                steps.iter().filter(|s| s.kind.releases()).map(|s| s.lane),
            );
            rows.push(Row {
                tick,
                steps,
                claimed,
                released,
                holds_through: LaneMask::empty(num_lanes), // filled in below
            });
        }

        if let Some((&lane, &(start, _))) = open.iter().min_by_key(|(l, _)| **l) {
            return Err(Error::MalformedChart {
                tick: start,
                lane: Some(lane),
                reason: "hold or roll is never released".to_owned(),
            });
        }

        for row in rows.iter_mut() {
            for &(lane, start, end) in &spans {
                if start < row.tick && row.tick < end {
                    row.holds_through.insert(lane);
                }
            }
        }

        Ok(Rows {
            rows,
            mines,
            num_lanes,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, idx: RowIdx) -> &Row {
        &self.rows[idx]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    pub fn mines(&self) -> &[MineNote] {
        &self.mines
    }

    pub fn num_lanes(&self) -> usize {
        self.num_lanes
    }
}

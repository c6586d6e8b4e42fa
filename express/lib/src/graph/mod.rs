//! The step graph: every body configuration reachable on a pad, and the labelled links between
//! them.
//!
//! The graph is cyclic (any state can return to itself by a same-arrow tap), so it is stored as
//! an arena of [`BodyState`]s plus an arena of deduplicated [`GraphLink`]s; edges are
//! `(from, link, to)` index triples.  A graph is built once per pad (or loaded from a
//! precomputed file) and shared read-only across expressions.

mod build;
mod file;

use std::{
    fmt::{Debug, Display, Formatter},
    path::Path,
    sync::Arc,
};

use padframe::{Foot, FootAction, FootPortion, Lane, LaneMask, PadData, StepType};

use crate::{LinkIdx, LinkVec, Result, StateIdx, StateVec};

/// One node of the step graph: where each portion of each foot currently rests, plus which foot
/// is bodily in front while the stance is crossed or inverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyState {
    /// `placements[foot][portion]` is the lane that portion rests on.  A single-lane stance
    /// occupies only [`FootPortion::DEFAULT`].
    placements: [[Option<Lane>; 2]; 2],
    /// `Some(f)` iff the stance is crossed or inverted and foot `f` passes in front.
    front_foot: Option<Foot>,
}

impl BodyState {
    /// The neutral stance: each foot heel-only on its starting lane.
    pub fn starting(pad: &PadData) -> Self {
        let mut placements = [[None; 2]; 2];
        for foot in Foot::BOTH {
            placements[foot.index()][FootPortion::DEFAULT.index()] =
                Some(pad.starting_lane(foot));
        }
        BodyState {
            placements,
            front_foot: None,
        }
    }

    pub(crate) fn new(placements: [[Option<Lane>; 2]; 2], front_foot: Option<Foot>) -> Self {
        BodyState {
            placements,
            front_foot,
        }
    }

    pub fn lane(&self, foot: Foot, portion: FootPortion) -> Option<Lane> {
        self.placements[foot.index()][portion.index()]
    }

    pub(crate) fn foot_placement(&self, foot: Foot) -> [Option<Lane>; 2] {
        self.placements[foot.index()]
    }

    /// The lanes occupied by `foot`, heel first.
    pub fn occupied_lanes(&self, foot: Foot) -> impl Iterator<Item = Lane> + '_ {
        self.placements[foot.index()].iter().filter_map(|&l| l)
    }

    pub fn occupies(&self, foot: Foot, lane: Lane) -> bool {
        self.occupied_lanes(foot).any(|l| l == lane)
    }

    /// `true` iff both portions of `foot` are placed (the foot is in a bracket stance).
    pub fn is_bracketing(&self, foot: Foot) -> bool {
        self.placements[foot.index()].iter().all(|l| l.is_some())
    }

    pub fn front_foot(&self) -> Option<Foot> {
        self.front_foot
    }
}

impl Display for BodyState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for foot in Foot::BOTH {
            if foot == Foot::Right {
                write!(f, "|")?;
            }
            for portion in FootPortion::BOTH {
                match self.lane(foot, portion) {
                    Some(lane) => write!(f, "{}", lane)?,
                    None => write!(f, "-")?,
                }
            }
        }
        if let Some(front) = self.front_foot {
            write!(f, "({})", front)?;
        }
        Ok(())
    }
}

/// One cell of a [`GraphLink`]: what a single foot portion does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkCell {
    pub step: StepType,
    pub action: FootAction,
}

/// One edge label of the step graph: a combined action for both feet, each foot with up to two
/// portions.  A link is valid iff at least one cell is populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphLink {
    cells: [[Option<LinkCell>; 2]; 2],
}

impl GraphLink {
    pub(crate) fn new(cells: [[Option<LinkCell>; 2]; 2]) -> Self {
        debug_assert!(
            cells.iter().flatten().any(|c| c.is_some()),
            "links must have at least one valid cell"
        );
        GraphLink { cells }
    }

    pub fn cell(&self, foot: Foot, portion: FootPortion) -> Option<LinkCell> {
        self.cells[foot.index()][portion.index()]
    }

    /// All populated cells, left foot before right, heel before toe.
    pub fn cells(&self) -> impl Iterator<Item = (Foot, FootPortion, LinkCell)> + '_ {
        Foot::BOTH.into_iter().flat_map(move |foot| {
            FootPortion::BOTH.into_iter().filter_map(move |portion| {
                self.cell(foot, portion).map(|cell| (foot, portion, cell))
            })
        })
    }

    /// The cells which press a lane on this row (actions `Tap` or `Hold`).
    pub fn step_cells(&self) -> impl Iterator<Item = (Foot, FootPortion, LinkCell)> + '_ {
        self.cells()
            .filter(|(_, _, cell)| cell.action != FootAction::Release)
    }

    pub fn release_cells(&self) -> impl Iterator<Item = (Foot, FootPortion, LinkCell)> + '_ {
        self.cells()
            .filter(|(_, _, cell)| cell.action == FootAction::Release)
    }

    pub fn is_release_only(&self) -> bool {
        self.cells()
            .all(|(_, _, cell)| cell.action == FootAction::Release)
    }

    /// The feet with at least one stepping cell.
    pub fn stepping_feet(&self) -> impl Iterator<Item = Foot> + '_ {
        Foot::BOTH.into_iter().filter(move |&foot| {
            FootPortion::BOTH.into_iter().any(|portion| {
                self.cell(foot, portion)
                    .is_some_and(|c| c.action != FootAction::Release)
            })
        })
    }

    pub fn has_two_lane_bracket(&self) -> bool {
        self.cells()
            .any(|(_, _, cell)| cell.step.is_two_lane_bracket())
    }

    pub fn has_bracket(&self) -> bool {
        self.cells().any(|(_, _, cell)| cell.step.is_bracket())
    }
}

/// An edge of the step graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Edge {
    pub link: LinkIdx,
    pub to: StateIdx,
}

/// The full, immutable step graph for one pad.
#[derive(Debug, Clone)]
pub struct StepGraph {
    pad: Arc<PadData>,
    states: StateVec<BodyState>,
    links: LinkVec<GraphLink>,
    successors: StateVec<Vec<Edge>>,
    start: StateIdx,
}

impl StepGraph {
    /// Builds the graph from pad data alone.  This is the slow path; prefer
    /// [`read_from`](Self::read_from) when a precomputed file is available.
    pub fn build(pad: Arc<PadData>, size_limit: usize) -> Result<Self> {
        build::build(pad, size_limit)
    }

    /// Loads a precomputed graph from a `.fsg` file, checking it pairs with `pad`.
    pub fn read_from(path: &Path, pad: Arc<PadData>) -> Result<Self> {
        file::read(path, pad)
    }

    /// Writes the graph in the precomputed binary format.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        file::write(self, path)
    }

    pub fn pad(&self) -> &Arc<PadData> {
        &self.pad
    }

    pub fn start(&self) -> StateIdx {
        self.start
    }

    pub fn state(&self, idx: StateIdx) -> &BodyState {
        &self.states[idx]
    }

    pub fn link(&self, idx: LinkIdx) -> &GraphLink {
        &self.links[idx]
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn num_links(&self) -> usize {
        self.links.len()
    }

    pub fn num_edges(&self) -> usize {
        self.successors.iter().map(Vec::len).sum()
    }

    pub(crate) fn successors(&self, idx: StateIdx) -> &[Edge] {
        &self.successors[idx]
    }

    /// The lanes pressed when `link` is applied, arriving at `to`.
    pub(crate) fn claimed_lanes(&self, link: LinkIdx, to: StateIdx) -> LaneMask {
        let mut mask = LaneMask::empty(self.pad.num_lanes());
        for (foot, portion, _) in self.links[link].step_cells() {
            let lane = self.states[to]
                .lane(foot, portion)
                .expect("stepping cells always have a placement");
            mask.insert(lane);
        }
        mask
    }

    /// The lanes released when `link` is applied from `from`.
    pub(crate) fn released_lanes(&self, link: LinkIdx, from: StateIdx) -> LaneMask {
        let mut mask = LaneMask::empty(self.pad.num_lanes());
        for (foot, portion, _) in self.links[link].release_cells() {
            let lane = self.states[from]
                .lane(foot, portion)
                .expect("releasing cells always have a placement");
            mask.insert(lane);
        }
        mask
    }

    /// The lane a single cell acts on: the destination placement for steps, the current
    /// placement for releases.
    pub(crate) fn cell_lane(
        &self,
        from: StateIdx,
        to: StateIdx,
        foot: Foot,
        portion: FootPortion,
        cell: LinkCell,
    ) -> Lane {
        let state = if cell.action == FootAction::Release {
            &self.states[from]
        } else {
            &self.states[to]
        };
        state
            .lane(foot, portion)
            .expect("acting cells always have a placement")
    }
}

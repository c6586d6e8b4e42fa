//! Representation of an expressed chart: the ordered step and mine event streams.

use padframe::{Foot, FootPortion, InstanceStepType, Lane};

use crate::{
    chart::Rows,
    graph::{GraphLink, StepGraph},
    mines,
    search::Applied,
    RowIdx,
};

/// The rank stored on [`MineEvent`]s whose lane is never stepped.
pub const INVALID_LANE_RANK: u32 = u32::MAX;

/// One expressed row: the applied graph link, the lane each acting cell pressed, and the
/// per-instance flavour of each press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepEvent {
    pub tick: u64,
    pub row: RowIdx,
    pub link: GraphLink,
    /// `lanes[foot][portion]` for each populated cell of `link`.
    pub lanes: [[Option<Lane>; 2]; 2],
    /// `Default`, or `Roll`/`Fake`/`Lift` as carried by the source notes.  Never stored in the
    /// shared graph.
    pub instance_types: [[InstanceStepType; 2]; 2],
}

impl StepEvent {
    pub fn instance_type(&self, foot: Foot, portion: FootPortion) -> InstanceStepType {
        self.instance_types[foot.index()][portion.index()]
    }
}

/// How one mine relates to the arrows around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MineEventKind {
    /// The mine's lane is never stepped anywhere in the chart.
    NoArrow,
    /// The mine precedes the referenced arrow.
    BeforeArrow,
    /// The mine follows the referenced arrow.
    AfterArrow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MineEvent {
    pub tick: u64,
    pub lane: Lane,
    pub kind: MineEventKind,
    /// 0-based rank of the referenced arrow's distance among all arrows on the same side of
    /// the mine, over every lane; equal distances share a rank.  [`INVALID_LANE_RANK`] for
    /// [`NoArrow`](MineEventKind::NoArrow).
    pub nth_closest: u32,
    /// The foot that played the referenced arrow, or `None` when the arrow was part of a jump.
    pub foot: Option<Foot>,
}

/// An expressed chart: both event lists, in chart time order, stable under re-execution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpressedChart {
    pub steps: Vec<StepEvent>,
    pub mines: Vec<MineEvent>,
}

/// Builds the final event streams from the search result.
pub(crate) fn assemble(graph: &StepGraph, rows: &Rows, applied: &[Applied]) -> ExpressedChart {
    let steps: Vec<StepEvent> = applied
        .iter()
        .map(|app| {
            let link = *graph.link(app.link);
            let row = rows.get(app.row);
            let mut lanes = [[None; 2]; 2];
            let mut instance_types = [[InstanceStepType::Default; 2]; 2];
            for (foot, portion, cell) in link.cells() {
                let lane = graph.cell_lane(app.from, app.to, foot, portion, cell);
                lanes[foot.index()][portion.index()] = Some(lane);
                instance_types[foot.index()][portion.index()] = row
                    .step_on(lane)
                    .map(|kind| kind.instance())
                    .unwrap_or_default();
            }
            StepEvent {
                tick: row.tick,
                row: app.row,
                link,
                lanes,
                instance_types,
            }
        })
        .collect();

    let mines = mines::assign(rows, &steps);
    ExpressedChart { steps, mines }
}

//! The cost model which resolves ambiguity between admissible links.
//!
//! Costs are a true lexicographic vector, not a weighted sum: a path with fewer double steps
//! always beats a path with fewer crossovers, and so on down the list.  The field order of
//! [`Cost`] *is* the comparison order (the derived `Ord` compares fields top to bottom).

use padframe::{Foot, FootAction, Lane};

use crate::{
    brackets::BracketParsingMethod,
    chart::{Row, Rows},
    graph::StepGraph,
    LinkIdx, RowIdx, StateIdx,
};

/// The accumulated badness of a search path, from most to least important dimension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Cost {
    /// Crossed stances which the pad tables disallow.  Always zero unless the step graph is
    /// buggy.
    pub illegal: u32,
    /// Avoidable double steps: the same foot stepping two different lanes in succession while
    /// the other foot was free.
    pub double_steps: u32,
    /// Three or more successive moving steps by the same foot while the other foot was free.
    pub triple_steps: u32,
    /// Crossed stances, inverts weighing double.
    pub crossovers: u32,
    /// Brackets used where plainer footing was available (under a sustained hold, or under the
    /// `Balanced` parsing method on rows a jump could cover).
    pub bracket_over_hold: u32,
    pub foot_swaps: u32,
    /// Single steps out of a jump onto a lane the stepping foot can't bracket.
    pub jump_exit: u32,
    /// Steps taken with the foot that mine placement or hold-release order argued against.
    pub indication: u32,
    /// Stretched stances where an unstretched option existed.
    pub stretch: u32,
    /// Sum of [`StepType::rank`](padframe::StepType::rank) over all stepping cells.
    pub step_ranks: u32,
    /// Deterministic final tiebreak: earliest-lexicographic foot assignment, lane by lane.
    pub lane_order: u64,
}

impl Cost {
    pub fn plus(self, rhs: Cost) -> Cost {
        Cost {
            illegal: self.illegal + rhs.illegal,
            double_steps: self.double_steps + rhs.double_steps,
            triple_steps: self.triple_steps + rhs.triple_steps,
            crossovers: self.crossovers + rhs.crossovers,
            bracket_over_hold: self.bracket_over_hold + rhs.bracket_over_hold,
            foot_swaps: self.foot_swaps + rhs.foot_swaps,
            jump_exit: self.jump_exit + rhs.jump_exit,
            indication: self.indication + rhs.indication,
            stretch: self.stretch + rhs.stretch,
            step_ranks: self.step_ranks + rhs.step_ranks,
            lane_order: self.lane_order + rhs.lane_order,
        }
    }
}

/// The per-path step history needed to price a transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct History {
    pub last_foot: Option<Foot>,
    /// Consecutive steps (jacks included) by `last_foot`.
    pub consec: u8,
    /// Consecutive *moving* steps by `last_foot`; jacks neither extend nor break the run.
    pub moving_run: u8,
    pub last_was_jump: bool,
    /// The row on which each foot last released a hold.
    pub last_release_row: [Option<u32>; 2],
}

/// Mine lookahead used by the indication tiebreak: for each row, the lanes with a mine falling
/// between this row and the next.
pub(crate) struct MineHints {
    per_row: Vec<Vec<Lane>>,
}

impl MineHints {
    pub fn new(rows: &Rows) -> Self {
        let per_row = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let until = rows
                    .iter()
                    .nth(i + 1)
                    .map_or(u64::MAX, |next| next.tick);
                rows.mines()
                    .iter()
                    .filter(|m| m.tick > row.tick && m.tick <= until)
                    .map(|m| m.lane)
                    .collect()
            })
            .collect();
        MineHints { per_row }
    }

    fn imminent(&self, row: RowIdx, lane: Lane) -> bool {
        self.per_row[row.index()].contains(&lane)
    }
}

pub(crate) fn foot_portion_bit(foot: Foot, portion: padframe::FootPortion) -> u8 {
    1 << (foot.index() * 2 + portion.index())
}

pub(crate) fn foot_bits(foot: Foot) -> u8 {
    0b11 << (foot.index() * 2)
}

/// Prices applying `link` at `row`, returning the cost delta and the successor history.
#[allow(clippy::too_many_arguments)]
pub(crate) fn transition(
    graph: &StepGraph,
    row_idx: RowIdx,
    row: &Row,
    from: StateIdx,
    link_idx: LinkIdx,
    to: StateIdx,
    hist: &History,
    holds: u8,
    method: BracketParsingMethod,
    mine_hints: &MineHints,
) -> (Cost, History) {
    let link = graph.link(link_idx);
    let mut cost = Cost::default();
    let mut hist = *hist;

    for (foot, _portion, cell) in link.cells() {
        match cell.action {
            FootAction::Release => {
                hist.last_release_row[foot.index()] = Some(row_idx.index() as u32);
            }
            _ => {
                let step = cell.step;
                if step.is_crossover() {
                    cost.crossovers += 1;
                }
                if step.is_invert() {
                    cost.crossovers += 2;
                }
                if step.is_swap() {
                    cost.foot_swaps += 1;
                }
                if step.is_stretch() {
                    cost.stretch += 1;
                }
                cost.step_ranks += step.rank();
            }
        }
    }

    let stepping: Vec<Foot> = link.stepping_feet().collect();
    match stepping.len() {
        0 => {} // A pure release leaves the step history alone
        1 => {
            let foot = stepping[0];
            let moving = link
                .step_cells()
                .any(|(f, _, c)| f == foot && !c.step.is_same_lane());
            let consec = if hist.last_foot == Some(foot) {
                hist.consec.saturating_add(1)
            } else {
                1
            };
            let moving_run = match (hist.last_foot == Some(foot), moving) {
                (true, true) => hist.moving_run.saturating_add(1),
                (true, false) => hist.moving_run,
                (false, moved) => moved as u8,
            };

            let other = foot.other();
            let other_holding = holds & foot_bits(other) != 0;
            if moving && !other_holding {
                if consec >= 2 {
                    cost.double_steps += 1;
                }
                if moving_run >= 3 {
                    cost.triple_steps += 1;
                }
            }

            let uses_bracket = link
                .step_cells()
                .any(|(f, _, c)| f == foot && c.step.is_bracket());
            if uses_bracket && other_holding {
                cost.bracket_over_hold += 1;
            }

            if hist.last_was_jump && moving && !uses_bracket {
                let landing = link
                    .step_cells()
                    .map(|(f, p, c)| graph.cell_lane(from, to, f, p, c))
                    .next()
                    .expect("a moving foot has a stepping cell");
                if !graph.pad().is_bracketable_lane(landing, foot) {
                    cost.jump_exit += 1;
                }
            }

            if moving {
                let mine_says_other = graph
                    .state(from)
                    .occupied_lanes(other)
                    .any(|l| mine_hints.imminent(row_idx, l));
                if mine_says_other {
                    // A mine is imminent under the resting foot: it, not us, should have moved
                    cost.indication += 2;
                } else if let (Some(ours), Some(theirs)) = (
                    hist.last_release_row[foot.index()],
                    hist.last_release_row[other.index()],
                ) {
                    if theirs < ours {
                        cost.indication += 1;
                    }
                }
            }

            hist.last_foot = Some(foot);
            hist.consec = consec;
            hist.moving_run = moving_run;
            hist.last_was_jump = false;
        }
        _ => {
            hist.last_foot = None;
            hist.consec = 0;
            hist.moving_run = 0;
            hist.last_was_jump = true;
        }
    }

    if method == BracketParsingMethod::Balanced
        && link.has_two_lane_bracket()
        && row.claimed().count() <= 2
    {
        cost.bracket_over_hold += 1;
    }

    cost.illegal += illegal_count(graph, link_idx, to);
    cost.lane_order = lane_order(graph, link_idx, from, to);

    (cost, hist)
}

/// Recomputes crossed-ness of every stepping foot from the pad tables and counts cells whose
/// step type disagrees.  The builder derives both from the same tables, so any non-zero count
/// is a graph bug; pricing it first makes such bugs lose to every legal path.
fn illegal_count(graph: &StepGraph, link_idx: LinkIdx, to: StateIdx) -> u32 {
    let pad = graph.pad();
    let state = graph.state(to);
    let link = graph.link(link_idx);
    let mut count = 0;
    for foot in Foot::BOTH {
        let cells: Vec<_> = link
            .step_cells()
            .filter(|&(f, _, _)| f == foot)
            .collect();
        if cells.is_empty() {
            continue;
        }
        let other = foot.other();
        let stance_crossed = state.occupied_lanes(foot).any(|fl| {
            state.occupied_lanes(other).any(|ol| {
                fl != ol
                    && (pad.crossover_front(ol, other, fl)
                        || pad.crossover_behind(ol, other, fl)
                        || pad.crossover_behind_stretch(ol, other, fl)
                        || pad.inverted(ol, other, fl))
            })
        });
        let cells_crossed = cells.iter().any(|(_, _, c)| {
            c.step.is_crossover() || c.step.is_invert() || c.step == padframe::StepType::Swing
        });
        // Brackets and same-lane cells never carry crossed step types, so only flag the
        // direction that indicates a real mismatch: a crossed claim in an uncrossed stance.
        if cells_crossed && !stance_crossed {
            count += 1;
        }
    }
    count
}

/// A single base-5 numeral per row: one digit per lane (lane 0 most significant), each digit
/// encoding which foot and portion claimed the lane.  Lower reads as "leftmost feet first",
/// which is the deterministic preference for otherwise equal paths.
fn lane_order(graph: &StepGraph, link_idx: LinkIdx, from: StateIdx, to: StateIdx) -> u64 {
    let num_lanes = graph.pad().num_lanes();
    let mut digits = vec![0u64; num_lanes];
    for (foot, portion, cell) in graph.link(link_idx).step_cells() {
        let lane = graph.cell_lane(from, to, foot, portion, cell);
        digits[lane.index()] = 1 + foot.index() as u64 * 2 + portion.index() as u64;
    }
    digits.into_iter().fold(0, |acc, d| acc * 5 + d)
}

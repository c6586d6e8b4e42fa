use std::{
    cmp::Ordering,
    collections::{BinaryHeap, HashMap},
};

use datasize::DataSize;
use padframe::{FootAction, FootPortion};

use crate::{
    brackets::BracketParsingMethod,
    chart::{Row, Rows},
    graph::StepGraph,
    Error, Result, RowIdx, StateIdx,
};

use super::{
    cost::{foot_portion_bit, transition, Cost, History, MineHints},
    path::{Applied, PathEntry, PathIdx, Paths},
    Config,
};

const ITERS_BETWEEN_MEM_CHECKS: usize = 10_000;

/// One entry of the search frontier: a partial expression covering every row before `row`.
#[derive(Debug, Clone, Copy)]
struct FrontierNode {
    cost: Cost,
    /// The next row this path needs to cover.
    row: RowIdx,
    state: StateIdx,
    /// Bit per `(foot, portion)`: currently sustaining a hold or roll.
    holds: u8,
    hist: History,
    path: Option<PathIdx>,
    /// Allocation order; breaks cost ties deterministically (earliest wins).
    seq: u64,
}

impl PartialEq for FrontierNode {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost && self.seq == other.seq
    }
}

impl Eq for FrontierNode {}

impl PartialOrd for FrontierNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FrontierNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // `BinaryHeap` pops the maximum, so "greater" must mean "better": lower cost first,
        // then earlier allocation.
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Searches `graph` for the cheapest link sequence reproducing `rows`.
pub(super) fn search(
    graph: &StepGraph,
    rows: &Rows,
    method: BracketParsingMethod,
    config: &Config,
) -> Result<Vec<Applied>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let mine_hints = MineHints::new(rows);
    let mut paths = Paths::new();
    let mut frontier = BinaryHeap::<FrontierNode>::new();
    let mut seq = 0u64;
    frontier.push(FrontierNode {
        cost: Cost::default(),
        row: RowIdx::new(0),
        state: graph.start(),
        holds: 0,
        hist: History::default(),
        path: None,
        seq,
    });

    // Dedup: the best known cost per `(row, state, holds)`.  On ties the earlier node wins.
    let mut best: HashMap<(RowIdx, StateIdx, u8), Cost> = HashMap::new();
    best.insert((RowIdx::new(0), graph.start(), 0), Cost::default());

    let mut furthest_row = RowIdx::new(0);
    let mut iter_count = 0usize;

    while let Some(node) = frontier.pop() {
        // Skip entries superseded by a cheaper path to the same key
        if best
            .get(&(node.row, node.state, node.holds))
            .is_some_and(|&c| c < node.cost)
        {
            continue;
        }
        if node.row.index() == rows.len() {
            log::debug!(
                "search finished after {} iterations, {} frontier entries left",
                iter_count,
                frontier.len()
            );
            return Ok(paths.unwind(node.path));
        }
        furthest_row = furthest_row.max(node.row);
        let row = rows.get(node.row);

        for edge in graph.successors(node.state) {
            let new_holds = match admit(graph, row, &node, edge.link, edge.to, method) {
                Some(h) => h,
                None => continue,
            };
            let (delta, hist) = transition(
                graph, node.row, row, node.state, edge.link, edge.to, &node.hist, node.holds,
                method, &mine_hints,
            );
            let cost = node.cost.plus(delta);
            let next_row = RowIdx::new(node.row.index() + 1);
            let key = (next_row, edge.to, new_holds);
            if best.get(&key).is_some_and(|&c| c <= cost) {
                continue;
            }
            best.insert(key, cost);
            let path = paths.add(PathEntry {
                prev: node.path,
                row: node.row,
                link: edge.link,
                from: node.state,
                to: edge.to,
            });
            seq += 1;
            frontier.push(FrontierNode {
                cost,
                row: next_row,
                state: edge.to,
                holds: new_holds,
                hist,
                path: Some(path),
                seq,
            });
        }

        iter_count += 1;
        if iter_count % ITERS_BETWEEN_MEM_CHECKS == 0 {
            let mem_usage = frontier.len() * std::mem::size_of::<FrontierNode>()
                + paths.estimate_heap_size();
            if mem_usage >= config.mem_limit {
                log::warn!(
                    "search exceeds its memory limit ({} bytes); truncating the frontier",
                    config.mem_limit
                );
                truncate_queue(frontier.len() / 2, &mut frontier);
            }
        }
    }

    Err(Error::Unreachable {
        row: furthest_row,
        lanes: rows.get(furthest_row).claimed().clone(),
    })
}

/// Checks a link against a row and the path's hold bookkeeping.  Returns the successor hold
/// bitmap, or `None` if the link isn't admissible here.
fn admit(
    graph: &StepGraph,
    row: &Row,
    node: &FrontierNode,
    link_idx: crate::LinkIdx,
    to: StateIdx,
    method: BracketParsingMethod,
) -> Option<u8> {
    let link = graph.link(link_idx);
    if method == BracketParsingMethod::NoBrackets && link.has_bracket() {
        return None;
    }
    if graph.claimed_lanes(link_idx, to) != *row.claimed() {
        return None;
    }
    if graph.released_lanes(link_idx, node.state) != row.released {
        return None;
    }

    let from_state = graph.state(node.state);
    let to_state = graph.state(to);
    let mut holds = node.holds;
    for (foot, portion, cell) in link.cells() {
        let bit = foot_portion_bit(foot, portion);
        match cell.action {
            FootAction::Release => {
                // Only a held portion can release, and only on its own lane (which the
                // released-lanes equality above already pins).
                if node.holds & bit == 0 {
                    return None;
                }
                holds &= !bit;
            }
            action => {
                if node.holds & bit != 0 {
                    return None; // A holding portion can't step elsewhere
                }
                let lane = to_state
                    .lane(foot, portion)
                    .expect("stepping cells always have a placement");
                let kind = row.step_on(lane)?;
                if kind.action() != action {
                    return None;
                }
                if action == FootAction::Hold {
                    holds |= bit;
                }
            }
        }
    }

    // Portions still holding must not have moved
    for foot in padframe::Foot::BOTH {
        for portion in FootPortion::BOTH {
            let bit = foot_portion_bit(foot, portion);
            if holds & bit != 0
                && node.holds & bit != 0
                && from_state.lane(foot, portion) != to_state.lane(foot, portion)
            {
                return None;
            }
        }
    }

    // Lanes whose hold spans this row keep their occupant in place, whichever portion is
    // pressing them
    for lane in row.holds_through.iter() {
        for foot in padframe::Foot::BOTH {
            for portion in FootPortion::BOTH {
                if from_state.lane(foot, portion) == Some(lane)
                    && to_state.lane(foot, portion) != Some(lane)
                {
                    return None;
                }
            }
        }
    }

    Some(holds)
}

fn truncate_queue<T: Ord>(len: usize, queue: &mut BinaryHeap<T>) {
    let heap = std::mem::take(queue);
    let mut nodes = heap.into_vec();
    nodes.sort_by(|a, b| b.cmp(a)); // Sort best first
    if len < nodes.len() {
        nodes.drain(len..);
    }
    *queue = BinaryHeap::from(nodes);
}

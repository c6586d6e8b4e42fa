//! Building a [`StepGraph`] from pad data.
//!
//! The builder runs a breadth-first closure from the neutral starting stance.  For every state
//! it enumerates the candidate moves of each foot (re-steps, single steps, bracket placements,
//! one-lane bracket steps), combines them into single-foot links, jumps and release links, and
//! classifies each moving foot against the other foot's resulting lanes using the pad tables.
//! States and links are deduplicated by value, so the result is a compact cyclic graph.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::Arc,
};

use itertools::Itertools;
use padframe::{Foot, FootAction, FootPortion, Lane, PadData, StepType};

use super::{BodyState, Edge, GraphLink, LinkCell, StepGraph};
use crate::{Error, LinkIdx, Result, StateIdx, StateVec};

pub(super) fn build(pad: Arc<PadData>, size_limit: usize) -> Result<StepGraph> {
    let mut builder = Builder {
        pad: &pad,
        states: StateVec::new(),
        state_ids: HashMap::new(),
        links: index_vec::IndexVec::new(),
        link_ids: HashMap::new(),
        successors: StateVec::new(),
    };

    let start = builder.intern_state(BodyState::starting(&pad));
    let mut queue = VecDeque::from([start]);
    while let Some(idx) = queue.pop_front() {
        if builder.states.len() > size_limit {
            return Err(Error::Internal(format!(
                "step graph for {} exceeds the size limit of {} states",
                pad.chart_type_tag(),
                size_limit
            )));
        }
        let mut edges = Vec::new();
        let mut seen = HashSet::new();
        for (link, to_state) in builder.expand(idx) {
            let is_new = !builder.state_ids.contains_key(&to_state);
            let to = builder.intern_state(to_state);
            if is_new {
                queue.push_back(to);
            }
            let link = builder.intern_link(link);
            if seen.insert((link, to)) {
                edges.push(Edge { link, to });
            }
        }
        builder.successors[idx] = edges;
    }

    let Builder {
        states,
        links,
        successors,
        ..
    } = builder;
    log::debug!(
        "built step graph for {}: {} states, {} unique links, {} edges",
        pad.chart_type_tag(),
        states.len(),
        links.len(),
        successors.iter().map(Vec::len).sum::<usize>(),
    );

    Ok(StepGraph {
        pad,
        states,
        links,
        successors,
        start,
    })
}

/// How the stepping foot's lanes relate to the resting foot's lanes, from least to most
/// contorted.  Combining several lane pairs takes the worst class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum PairClass {
    Normal,
    Stretch,
    CrossFront,
    CrossBehind,
    CrossBehindStretch,
    Invert,
}

/// What one portion does in a candidate move, before classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PortionMove {
    /// The portion doesn't act on this link.
    Rest,
    /// The portion re-steps a lane its foot already occupies.
    Same,
    /// The portion lands on a lane; resolves to `New` or `FootSwap` once the other foot's
    /// resulting lanes are known.
    Land,
}

/// A candidate placement change for one foot, before classification against the other foot.
#[derive(Debug, Clone, Copy)]
struct ProtoMove {
    placement: [Option<Lane>; 2],
    moves: [PortionMove; 2],
    bracket: BracketKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BracketKind {
    No,
    OneLane,
    TwoLane,
}

struct Builder<'p> {
    pad: &'p PadData,
    states: StateVec<BodyState>,
    state_ids: HashMap<BodyState, StateIdx>,
    links: crate::LinkVec<GraphLink>,
    link_ids: HashMap<GraphLink, LinkIdx>,
    successors: StateVec<Vec<Edge>>,
}

impl Builder<'_> {
    fn intern_state(&mut self, state: BodyState) -> StateIdx {
        if let Some(&idx) = self.state_ids.get(&state) {
            return idx;
        }
        let idx = self.states.push(state);
        self.successors.push(Vec::new());
        self.state_ids.insert(state, idx);
        idx
    }

    fn intern_link(&mut self, link: GraphLink) -> LinkIdx {
        if let Some(&idx) = self.link_ids.get(&link) {
            return idx;
        }
        let idx = self.links.push(link);
        self.link_ids.insert(link, idx);
        idx
    }

    /// All `(link, to_state)` pairs leaving one state.
    fn expand(&self, idx: StateIdx) -> Vec<(GraphLink, BodyState)> {
        let state = self.states[idx];
        let mut out = Vec::new();

        let moves = [
            self.proto_moves(&state, Foot::Left),
            self.proto_moves(&state, Foot::Right),
        ];

        // Single-foot links: one foot acts, the other rests.
        for foot in Foot::BOTH {
            for proto in &moves[foot.index()] {
                self.apply(&state, [Some((foot, *proto)), None], &mut out);
            }
        }
        // Jumps: both feet act at once.  Swaps can't happen here, so any lane sharing between
        // the resulting placements is a collision.
        for left in &moves[0] {
            for right in &moves[1] {
                let shares_lane = left
                    .placement
                    .iter()
                    .flatten()
                    .any(|l| right.placement.iter().flatten().any(|r| r == l));
                if shares_lane {
                    continue;
                }
                self.apply(
                    &state,
                    [Some((Foot::Left, *left)), Some((Foot::Right, *right))],
                    &mut out,
                );
            }
        }
        // Pure release links: any non-empty subset of occupied portions lets go, the stance is
        // unchanged.
        let occupied = self.occupied_portions(&state);
        for subset in occupied.iter().copied().powerset().skip(1) {
            let mut cells = [[None; 2]; 2];
            for (foot, portion) in subset {
                cells[foot.index()][portion.index()] = Some(LinkCell {
                    step: release_step_type(&state, foot, portion),
                    action: FootAction::Release,
                });
            }
            out.push((GraphLink::new(cells), state));
        }

        out
    }

    /// Applies one or two proto-moves to `state`, classifying them and emitting every action
    /// variant (tap/hold per stepping cell, plus optional simultaneous releases of untouched
    /// portions).
    fn apply(
        &self,
        state: &BodyState,
        protos: [Option<(Foot, ProtoMove)>; 2],
        out: &mut Vec<(GraphLink, BodyState)>,
    ) {
        // Resulting placements
        let mut placements = [
            state.foot_placement(Foot::Left),
            state.foot_placement(Foot::Right),
        ];
        for (foot, proto) in protos.iter().flatten() {
            placements[foot.index()] = proto.placement;
        }

        let front = match self.front_foot_after(state, placements) {
            Some(front) => front,
            None => return, // The resulting stance isn't expressible on this pad
        };
        let to_state = BodyState::new(placements, front);

        // Classify each moving foot against the other foot's *final* lanes
        let mut steps: [[Option<StepType>; 2]; 2] = [[None; 2]; 2];
        for (foot, proto) in protos.iter().flatten() {
            let other_final = placements[foot.other().index()];
            match self.resolve(state, *foot, proto, other_final, front) {
                Some(resolved) => steps[foot.index()] = resolved,
                None => return,
            }
        }

        let acted: Vec<(Foot, FootPortion, StepType)> = Foot::BOTH
            .into_iter()
            .flat_map(|f| {
                FootPortion::BOTH
                    .into_iter()
                    .filter_map(move |p| steps[f.index()][p.index()].map(|s| (f, p, s)))
            })
            .collect();
        if acted.is_empty() {
            return;
        }

        // Portions which may release simultaneously: occupied, untouched by the move, and
        // resting on the same lane afterwards.
        let releasable: Vec<(Foot, FootPortion)> = self
            .occupied_portions(state)
            .into_iter()
            .filter(|&(f, p)| {
                steps[f.index()][p.index()].is_none()
                    && state.lane(f, p) == to_state.lane(f, p)
            })
            .collect();

        for action_bits in 0..(1u32 << acted.len()) {
            let mut cells = [[None; 2]; 2];
            for (i, &(f, p, step)) in acted.iter().enumerate() {
                let action = if action_bits & (1 << i) != 0 {
                    FootAction::Hold
                } else {
                    FootAction::Tap
                };
                cells[f.index()][p.index()] = Some(LinkCell { step, action });
            }
            out.push((GraphLink::new(cells), to_state));

            for subset in releasable.iter().copied().powerset().skip(1) {
                let mut with_releases = cells;
                for (f, p) in subset {
                    with_releases[f.index()][p.index()] = Some(LinkCell {
                        step: release_step_type(state, f, p),
                        action: FootAction::Release,
                    });
                }
                out.push((GraphLink::new(with_releases), to_state));
            }
        }
    }

    /// Resolves the per-portion step types of one foot's proto-move, or `None` if the move
    /// isn't legal against the other foot's resulting lanes.
    fn resolve(
        &self,
        state: &BodyState,
        foot: Foot,
        proto: &ProtoMove,
        other_final: [Option<Lane>; 2],
        front_after: Option<Foot>,
    ) -> Option<[Option<StepType>; 2]> {
        let other_lanes: Vec<Lane> = other_final.iter().flatten().copied().collect();
        let old_lanes: Vec<Lane> = state.occupied_lanes(foot).collect();
        let final_lanes: Vec<Lane> = proto.placement.iter().flatten().copied().collect();

        // Resolve each acted portion's lane relationship
        #[derive(Clone, Copy, PartialEq)]
        enum Resolved {
            Same,
            New,
            Swap,
        }
        let mut resolved = [None; 2];
        for portion in FootPortion::BOTH {
            resolved[portion.index()] = match proto.moves[portion.index()] {
                PortionMove::Rest => None,
                PortionMove::Same => Some(Resolved::Same),
                PortionMove::Land => {
                    let lane = proto.placement[portion.index()]
                        .expect("landing portions always have a placement");
                    if other_lanes.contains(&lane) {
                        // A swap must land on the other foot's *matching* portion
                        if other_final[portion.index()] != Some(lane) {
                            return None;
                        }
                        Some(Resolved::Swap)
                    } else {
                        Some(Resolved::New)
                    }
                }
            };
        }

        let class = self.pair_class(foot, &final_lanes, &other_lanes)?;

        let steps = match proto.bracket {
            BracketKind::TwoLane => {
                let step = match (resolved[0]?, resolved[1]?) {
                    (Resolved::New, Resolved::New) => StepType::BracketHeelNewToeNew,
                    (Resolved::New, Resolved::Same) => StepType::BracketHeelNewToeSame,
                    (Resolved::Same, Resolved::New) => StepType::BracketHeelSameToeNew,
                    (Resolved::Same, Resolved::Same) => StepType::BracketHeelSameToeSame,
                    (Resolved::Swap, Resolved::Same) => StepType::BracketHeelSwapToeSame,
                    (Resolved::Same, Resolved::Swap) => StepType::BracketHeelSameToeSwap,
                    _ => return None,
                };
                if step != StepType::BracketHeelSameToeSame
                    && !matches!(class, PairClass::Normal | PairClass::Stretch)
                {
                    return None; // No crossed-bracket vocabulary
                }
                [Some(step), Some(step)]
            }
            BracketKind::OneLane => {
                let (portion, res) = FootPortion::BOTH
                    .into_iter()
                    .find_map(|p| resolved[p.index()].map(|r| (p, r)))
                    .expect("one-lane brackets act exactly one portion");
                let step = match (portion, res) {
                    (FootPortion::Heel, Resolved::Same) => StepType::BracketOneArrowHeelSame,
                    (FootPortion::Toe, Resolved::Same) => StepType::BracketOneArrowToeSame,
                    (FootPortion::Heel, Resolved::New) => {
                        if !matches!(class, PairClass::Normal | PairClass::Stretch) {
                            return None;
                        }
                        if class == PairClass::Stretch {
                            StepType::BracketStretchOneArrowHeelNew
                        } else {
                            StepType::BracketOneArrowHeelNew
                        }
                    }
                    (FootPortion::Toe, Resolved::New) => {
                        if !matches!(class, PairClass::Normal | PairClass::Stretch) {
                            return None;
                        }
                        if class == PairClass::Stretch {
                            StepType::BracketStretchOneArrowToeNew
                        } else {
                            StepType::BracketOneArrowToeNew
                        }
                    }
                    (_, Resolved::Swap) => return None,
                };
                let mut steps = [None, None];
                steps[portion.index()] = Some(step);
                steps
            }
            BracketKind::No => {
                let step = match resolved[FootPortion::Heel.index()]? {
                    Resolved::Same => StepType::SameArrow,
                    Resolved::Swap => StepType::FootSwap,
                    Resolved::New => {
                        // Swing compares the *pre-move* stance of both feet: in a jump the
                        // other foot has already been applied to `other_lanes`, so look it up
                        // from the old state instead.
                        let other_old: Vec<Lane> =
                            state.occupied_lanes(foot.other()).collect();
                        let old_class = self.pair_class(foot, &old_lanes, &other_old);
                        let crossed_front = |c: PairClass| c == PairClass::CrossFront;
                        let crossed_behind = |c: PairClass| {
                            matches!(c, PairClass::CrossBehind | PairClass::CrossBehindStretch)
                        };
                        let swings = match old_class {
                            Some(old) => {
                                (crossed_front(old) && crossed_behind(class))
                                    || (crossed_behind(old) && crossed_front(class))
                            }
                            None => false,
                        };
                        if swings {
                            StepType::Swing
                        } else {
                            match class {
                                PairClass::Normal => StepType::NewArrow,
                                PairClass::Stretch => StepType::NewArrowStretch,
                                PairClass::CrossFront => StepType::CrossoverFront,
                                PairClass::CrossBehind => StepType::CrossoverBehind,
                                PairClass::CrossBehindStretch => {
                                    StepType::CrossoverBehindStretch
                                }
                                PairClass::Invert => {
                                    if front_after == Some(foot) {
                                        StepType::InvertFront
                                    } else {
                                        StepType::InvertBehind
                                    }
                                }
                            }
                        }
                    }
                };
                [Some(step), None]
            }
        };
        Some(steps)
    }

    /// The candidate placement changes for one foot, independent of the other foot.
    fn proto_moves(&self, state: &BodyState, foot: Foot) -> Vec<ProtoMove> {
        let pad = self.pad;
        let n = pad.num_lanes();
        let placement = state.foot_placement(foot);
        let lanes: Vec<Lane> = state.occupied_lanes(foot).collect();
        let reachable = |to: Lane| lanes.iter().any(|&cur| pad.valid_next(cur, to));

        let mut moves = Vec::new();
        match placement {
            [Some(h), None] => {
                // Jack / re-step in place
                moves.push(ProtoMove {
                    placement,
                    moves: [PortionMove::Same, PortionMove::Rest],
                    bracket: BracketKind::No,
                });
                // Plain single steps
                for lane in Lane::all(n) {
                    if !lanes.contains(&lane) && reachable(lane) {
                        moves.push(ProtoMove {
                            placement: [Some(lane), None],
                            moves: [PortionMove::Land, PortionMove::Rest],
                            bracket: BracketKind::No,
                        });
                    }
                }
                // Enter a bracket stance by adding the toe next to the planted heel...
                for toe in Lane::all(n) {
                    if toe != h
                        && !lanes.contains(&toe)
                        && pad.bracketable_heel(h, foot, toe)
                        && reachable(toe)
                    {
                        moves.push(ProtoMove {
                            placement: [Some(h), Some(toe)],
                            moves: [PortionMove::Rest, PortionMove::Land],
                            bracket: BracketKind::OneLane,
                        });
                    }
                }
                // ...or by adding the heel, the planted lane becoming the toe
                for heel in Lane::all(n) {
                    if heel != h
                        && !lanes.contains(&heel)
                        && pad.bracketable_toe(h, foot, heel)
                        && reachable(heel)
                    {
                        moves.push(ProtoMove {
                            placement: [Some(heel), Some(h)],
                            moves: [PortionMove::Land, PortionMove::Rest],
                            bracket: BracketKind::OneLane,
                        });
                    }
                }
            }
            [Some(h), Some(t)] => {
                // One-portion re-taps and the full bracket re-step
                moves.push(ProtoMove {
                    placement,
                    moves: [PortionMove::Same, PortionMove::Rest],
                    bracket: BracketKind::OneLane,
                });
                moves.push(ProtoMove {
                    placement,
                    moves: [PortionMove::Rest, PortionMove::Same],
                    bracket: BracketKind::OneLane,
                });
                moves.push(ProtoMove {
                    placement,
                    moves: [PortionMove::Same, PortionMove::Same],
                    bracket: BracketKind::TwoLane,
                });
                // One-lane moves which keep the bracket legal
                for heel in Lane::all(n) {
                    if heel != h
                        && heel != t
                        && pad.bracketable_heel(heel, foot, t)
                        && reachable(heel)
                    {
                        moves.push(ProtoMove {
                            placement: [Some(heel), Some(t)],
                            moves: [PortionMove::Land, PortionMove::Rest],
                            bracket: BracketKind::OneLane,
                        });
                    }
                }
                for toe in Lane::all(n) {
                    if toe != h && toe != t && pad.bracketable_heel(h, foot, toe) && reachable(toe)
                    {
                        moves.push(ProtoMove {
                            placement: [Some(h), Some(toe)],
                            moves: [PortionMove::Rest, PortionMove::Land],
                            bracket: BracketKind::OneLane,
                        });
                    }
                }
                // Collapse back to a single-lane stance on a fresh lane
                for lane in Lane::all(n) {
                    if !lanes.contains(&lane) && reachable(lane) {
                        moves.push(ProtoMove {
                            placement: [Some(lane), None],
                            moves: [PortionMove::Land, PortionMove::Rest],
                            bracket: BracketKind::No,
                        });
                    }
                }
            }
            _ => unreachable!("feet always occupy at least one lane"),
        }

        // Full two-lane bracket placements, from any stance
        for heel in Lane::all(n) {
            for toe in Lane::all(n) {
                if heel == toe || !pad.bracketable_heel(heel, foot, toe) {
                    continue;
                }
                let heel_move = if lanes.contains(&heel) {
                    PortionMove::Same
                } else if reachable(heel) {
                    PortionMove::Land
                } else {
                    continue;
                };
                let toe_move = if lanes.contains(&toe) {
                    PortionMove::Same
                } else if reachable(toe) {
                    PortionMove::Land
                } else {
                    continue;
                };
                let target = [Some(heel), Some(toe)];
                if target == placement {
                    continue; // covered by the re-step above
                }
                moves.push(ProtoMove {
                    placement: target,
                    moves: [heel_move, toe_move],
                    bracket: BracketKind::TwoLane,
                });
            }
        }

        moves
    }

    /// Classifies the stance of `foot` on `f_lanes` against the other foot on `o_lanes`,
    /// taking the most contorted class over all lane pairs.  `None` means some pair has no
    /// entry in any pad table, i.e. the stance isn't expressible.
    fn pair_class(&self, foot: Foot, f_lanes: &[Lane], o_lanes: &[Lane]) -> Option<PairClass> {
        let pad = self.pad;
        let other = foot.other();
        let mut class = PairClass::Normal;
        for &fl in f_lanes {
            for &ol in o_lanes {
                if fl == ol {
                    continue; // Shared lanes (mid-swap) don't pair
                }
                let pair = if pad.inverted(ol, other, fl) {
                    PairClass::Invert
                } else if pad.crossover_behind_stretch(ol, other, fl) {
                    PairClass::CrossBehindStretch
                } else if pad.crossover_behind(ol, other, fl) {
                    PairClass::CrossBehind
                } else if pad.crossover_front(ol, other, fl) {
                    PairClass::CrossFront
                } else if pad.stretch_pairing(ol, other, fl) {
                    PairClass::Stretch
                } else if pad.normal_pairing(ol, other, fl) {
                    PairClass::Normal
                } else {
                    return None;
                };
                class = class.max(pair);
            }
        }
        Some(class)
    }

    /// The front foot of the stance described by `placements`, or `None` (outer) when the
    /// stance isn't expressible at all.
    #[allow(clippy::option_option)]
    fn front_foot_after(
        &self,
        old: &BodyState,
        placements: [[Option<Lane>; 2]; 2],
    ) -> Option<Option<Foot>> {
        let left: Vec<Lane> = placements[0].iter().flatten().copied().collect();
        let right: Vec<Lane> = placements[1].iter().flatten().copied().collect();
        let class = self.pair_class(Foot::Left, &left, &right)?;
        let front = match class {
            PairClass::Normal | PairClass::Stretch => None,
            PairClass::CrossFront => Some(Foot::Left),
            PairClass::CrossBehind | PairClass::CrossBehindStretch => Some(Foot::Right),
            PairClass::Invert => match old.front_foot() {
                Some(front) => Some(front),
                // Entering an inverted stance from a neutral one: the pad's Y positions
                // decide, the right foot winning ties.
                None => {
                    let min_y = |lanes: &[Lane]| {
                        lanes
                            .iter()
                            .map(|&l| self.pad.position(l).y)
                            .min()
                            .expect("feet always occupy at least one lane")
                    };
                    if min_y(&left) < min_y(&right) {
                        Some(Foot::Left)
                    } else {
                        Some(Foot::Right)
                    }
                }
            },
        };
        Some(front)
    }

    fn occupied_portions(&self, state: &BodyState) -> Vec<(Foot, FootPortion)> {
        Foot::BOTH
            .into_iter()
            .cartesian_product(FootPortion::BOTH)
            .filter(|&(f, p)| state.lane(f, p).is_some())
            .collect()
    }
}

/// Releasing a portion re-uses the same-lane vocabulary: `SameArrow` for a single-lane stance,
/// the matching one-lane bracket type when the foot is bracketed.
fn release_step_type(state: &BodyState, foot: Foot, portion: FootPortion) -> StepType {
    if state.is_bracketing(foot) {
        match portion {
            FootPortion::Heel => StepType::BracketOneArrowHeelSame,
            FootPortion::Toe => StepType::BracketOneArrowToeSame,
        }
    } else {
        StepType::SameArrow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use padframe::{LaneData, Position};
    use std::path::Path;

    fn dance_single() -> Arc<PadData> {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../data/dance-single.json");
        Arc::new(PadData::read_from_file(Path::new(path)).unwrap())
    }

    fn lane(i: usize) -> Lane {
        Lane::from_index(i)
    }

    #[test]
    fn size_limit_aborts_the_build() {
        let err = StepGraph::build(dance_single(), 3).unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[test]
    fn swing_is_reachable_on_a_single_pad() {
        // With the right foot on the left lane and the left foot crossed over in front on the
        // up lane, stepping the left foot to the down lane swings it around the body.
        let graph = StepGraph::build(dance_single(), 100_000).unwrap();
        let mut found = false;
        for idx in (0..graph.num_states()).map(StateIdx::new) {
            let state = graph.state(idx);
            let crossed_front = state.lane(Foot::Right, FootPortion::Heel) == Some(lane(0))
                && state.lane(Foot::Left, FootPortion::Heel) == Some(lane(2))
                && state.front_foot() == Some(Foot::Left);
            if !crossed_front {
                continue;
            }
            for edge in graph.successors(idx) {
                let to = graph.state(edge.to);
                if to.lane(Foot::Left, FootPortion::Heel) == Some(lane(1)) {
                    if let Some(cell) = graph.link(edge.link).cell(Foot::Left, FootPortion::Heel)
                    {
                        found |= cell.step == StepType::Swing;
                    }
                }
            }
        }
        assert!(found, "no swing link from the crossed-in-front stance");
    }

    #[test]
    fn jump_landings_judge_swing_from_the_premove_stance() {
        // From an uncrossed stance (left foot up, right foot right), jumping to down+left
        // crosses the left foot behind and the right foot in front.  Neither foot swings:
        // swing needs the *pre-move* stance to be crossed the other way, and pairing the old
        // foot against the other foot's landing lane would misread this jump.
        let graph = StepGraph::build(dance_single(), 100_000).unwrap();
        let mut checked = false;
        for idx in (0..graph.num_states()).map(StateIdx::new) {
            let state = graph.state(idx);
            let uncrossed_split = state.lane(Foot::Left, FootPortion::Heel) == Some(lane(2))
                && state.lane(Foot::Left, FootPortion::Toe).is_none()
                && state.lane(Foot::Right, FootPortion::Heel) == Some(lane(3))
                && state.lane(Foot::Right, FootPortion::Toe).is_none()
                && state.front_foot().is_none();
            if !uncrossed_split {
                continue;
            }
            for edge in graph.successors(idx) {
                let to = graph.state(edge.to);
                let crossing_jump = to.lane(Foot::Left, FootPortion::Heel) == Some(lane(1))
                    && to.lane(Foot::Left, FootPortion::Toe).is_none()
                    && to.lane(Foot::Right, FootPortion::Heel) == Some(lane(0))
                    && to.lane(Foot::Right, FootPortion::Toe).is_none();
                if !crossing_jump {
                    continue;
                }
                let link = graph.link(edge.link);
                let left = link.cell(Foot::Left, FootPortion::Heel).unwrap();
                let right = link.cell(Foot::Right, FootPortion::Heel).unwrap();
                assert_eq!(left.step, StepType::CrossoverBehind);
                assert_eq!(right.step, StepType::CrossoverFront);
                checked = true;
            }
        }
        assert!(checked, "the crossing jump never appears in the graph");
    }

    /// A synthetic 4-lane row pad where the outermost pairing is flagged as a stretch.
    fn stretch_pad() -> Arc<PadData> {
        let n = 4;
        let truth =
            |f: &dyn Fn(usize, usize, usize) -> bool, a: usize| -> [Vec<bool>; 2] {
                [
                    (0..n).map(|a2| f(a, 0, a2)).collect(),
                    (0..n).map(|a2| f(a, 1, a2)).collect(),
                ]
            };
        // Foot `f` on lane `a`, other foot on `a2`: normal when the feet stay on their own
        // sides and within two columns; a full-width split is a stretch.
        let normal = |a: usize, f: usize, a2: usize| {
            a != a2
                && (a2 as i32 - a as i32).unsigned_abs() <= 2
                && if f == 0 { a2 > a } else { a2 < a }
        };
        let stretch = |a: usize, f: usize, a2: usize| {
            (a2 as i32 - a as i32).unsigned_abs() == 3 && if f == 0 { a2 > a } else { a2 < a }
        };
        let never = |_: usize, _: usize, _: usize| false;
        let lanes = (0..n)
            .map(|a| LaneData {
                valid_next: vec![true; n],
                bracketable_heel: truth(&never, a),
                bracketable_toe: truth(&never, a),
                other_foot_pairings: truth(&normal, a),
                crossover_behind: truth(&never, a),
                crossover_front: truth(&never, a),
                inverted: truth(&never, a),
                pairings_stretch: truth(&stretch, a),
                crossover_behind_stretch: truth(&never, a),
            })
            .collect();
        let positions = (0..n)
            .map(|x| Position { x: x as i32, y: 1 })
            .collect();
        Arc::new(
            PadData::new(
                "stretch-row".to_owned(),
                positions,
                [lane(1), lane(2)],
                lanes,
            )
            .unwrap(),
        )
    }

    #[test]
    fn stretch_pairings_classify_as_stretch_steps() {
        let graph = StepGraph::build(stretch_pad(), 100_000).unwrap();
        let mut seen_stretch = false;
        for idx in (0..graph.num_states()).map(StateIdx::new) {
            for edge in graph.successors(idx) {
                for (_, _, cell) in graph.link(edge.link).cells() {
                    seen_stretch |= cell.step == StepType::NewArrowStretch;
                }
            }
        }
        assert!(seen_stretch, "the full-width split never classifies as a stretch");
    }
}

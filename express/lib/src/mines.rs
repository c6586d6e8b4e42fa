//! Classification of mines against the expressed steps.
//!
//! Mines never participate in the search.  Afterwards, each mine is described relative to the
//! arrows in its own lane: following one (`AfterArrow`), preceding one (`BeforeArrow`), or on a
//! lane that is never stepped at all (`NoArrow`).

use std::collections::BTreeSet;

use padframe::{Foot, Lane};

use crate::{
    chart::Rows,
    expressed::{MineEvent, MineEventKind, StepEvent, INVALID_LANE_RANK},
};

/// One pressed lane of the expressed chart, as seen by the mine assigner.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Claim {
    pub tick: u64,
    pub lane: Lane,
    pub foot: Foot,
    /// `true` if the claiming row was a two-footed jump, where which foot "owns" the lane is
    /// ambiguous to downstream consumers.
    pub jump: bool,
}

pub(crate) fn assign(rows: &Rows, steps: &[StepEvent]) -> Vec<MineEvent> {
    let mut claims = Vec::new();
    for event in steps {
        let stepping_feet = event.link.stepping_feet().count();
        for (foot, portion, _) in event.link.step_cells() {
            let lane = event.lanes[foot.index()][portion.index()]
                .expect("stepping cells always have a lane");
            claims.push(Claim {
                tick: event.tick,
                lane,
                foot,
                jump: stepping_feet == 2,
            });
        }
    }
    classify(rows, &claims)
}

fn classify(rows: &Rows, claims: &[Claim]) -> Vec<MineEvent> {
    let mut events: Vec<MineEvent> = rows
        .mines()
        .iter()
        .map(|mine| {
            // The nearest claim on the mine's own lane, looking backwards then forwards
            let after_arrow = claims
                .iter()
                .filter(|c| c.lane == mine.lane && c.tick <= mine.tick)
                .max_by_key(|c| c.tick);
            let before_arrow = claims
                .iter()
                .filter(|c| c.lane == mine.lane && c.tick > mine.tick)
                .min_by_key(|c| c.tick);

            let (kind, chosen, dist) = if let Some(chosen) = after_arrow {
                (MineEventKind::AfterArrow, chosen, mine.tick - chosen.tick)
            } else if let Some(chosen) = before_arrow {
                (MineEventKind::BeforeArrow, chosen, chosen.tick - mine.tick)
            } else {
                return MineEvent {
                    tick: mine.tick,
                    lane: mine.lane,
                    kind: MineEventKind::NoArrow,
                    nth_closest: INVALID_LANE_RANK,
                    foot: None,
                };
            };

            // Rank the chosen arrow's distance among all arrows in the same direction across
            // every lane.  Arrows at equal distance share a rank.
            let closer: BTreeSet<u64> = claims
                .iter()
                .filter_map(|c| match kind {
                    MineEventKind::AfterArrow if c.tick <= mine.tick => {
                        Some(mine.tick - c.tick)
                    }
                    MineEventKind::BeforeArrow if c.tick > mine.tick => {
                        Some(c.tick - mine.tick)
                    }
                    _ => None,
                })
                .filter(|&d| d < dist)
                .collect();

            MineEvent {
                tick: mine.tick,
                lane: mine.lane,
                kind,
                nth_closest: closer.len() as u32,
                foot: if chosen.jump { None } else { Some(chosen.foot) },
            }
        })
        .collect();
    events.sort_by_key(|e| (e.tick, e.lane));
    events
}

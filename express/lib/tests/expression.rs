//! End-to-end expression scenarios on the shipped `dance-single` pad.

use std::{
    path::Path,
    sync::{Arc, OnceLock},
};

use express::{
    express_chart, Chart, ChartType, Config, Error, ExpressConfig, ExpressedChart, MineEventKind,
    Note, NoteKind, StepGraph, INVALID_LANE_RANK,
};
use padframe::{Foot, FootAction, FootPortion, InstanceStepType, Lane, PadData, StepType};

fn graph() -> Arc<StepGraph> {
    static GRAPH: OnceLock<Arc<StepGraph>> = OnceLock::new();
    GRAPH
        .get_or_init(|| {
            let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../data/dance-single.json");
            let pad = Arc::new(PadData::read_from_file(Path::new(path)).unwrap());
            Arc::new(StepGraph::build(pad, 100_000).unwrap())
        })
        .clone()
}

fn note(tick: u64, lane: usize, kind: NoteKind) -> Note {
    Note {
        tick,
        lane: Lane::from_index(lane),
        kind,
    }
}

/// Taps on the given lanes, 10 ticks apart.
fn taps(lanes: &[usize]) -> Vec<Note> {
    lanes
        .iter()
        .enumerate()
        .map(|(i, &lane)| note(i as u64 * 10, lane, NoteKind::Tap))
        .collect()
}

fn express(notes: Vec<Note>, rating: u32) -> ExpressedChart {
    try_express(notes, rating).unwrap()
}

fn try_express(notes: Vec<Note>, rating: u32) -> Result<ExpressedChart, Error> {
    let chart = Chart {
        chart_type: ChartType::DanceSingle,
        rating,
        ticks_per_minute: 600.0,
        notes,
    };
    express_chart(&chart, graph(), &ExpressConfig::default(), &Config::default())
}

/// Flattens each step event into its populated cells, left before right, heel before toe.
fn cells(
    expressed: &ExpressedChart,
) -> Vec<Vec<(Foot, FootPortion, StepType, FootAction, usize)>> {
    expressed
        .steps
        .iter()
        .map(|event| {
            event
                .link
                .cells()
                .map(|(foot, portion, cell)| {
                    let lane = event.lanes[foot.index()][portion.index()].unwrap();
                    (foot, portion, cell.step, cell.action, lane.index())
                })
                .collect()
        })
        .collect()
}

/// For charts of plain single steps: each event's `(foot, step type)`.
fn single_steps(expressed: &ExpressedChart) -> Vec<(Foot, StepType)> {
    cells(expressed)
        .into_iter()
        .map(|event_cells| {
            assert_eq!(event_cells.len(), 1, "expected single-cell events");
            let (foot, _, step, _, _) = event_cells[0];
            (foot, step)
        })
        .collect()
}

/// Counts double steps in the output: the same foot stepping twice in succession where the
/// second press moves to a new lane.  Also returns the longest run of successive moving steps
/// by one foot.
fn double_steps_and_longest_run(expressed: &ExpressedChart) -> (usize, usize) {
    let mut doubles = 0;
    let mut longest_run = 0;
    let mut run = 0;
    let mut last_foot: Option<Foot> = None;
    for event in &expressed.steps {
        let feet: Vec<Foot> = event.link.stepping_feet().collect();
        match feet.as_slice() {
            [] => {} // Releases don't step
            [foot] => {
                let moving = event
                    .link
                    .step_cells()
                    .any(|(_, _, cell)| !cell.step.is_same_lane());
                if moving {
                    if last_foot == Some(*foot) {
                        doubles += 1;
                        run += 1;
                    } else {
                        run = 1;
                    }
                    longest_run = longest_run.max(run);
                } else if last_foot != Some(*foot) {
                    run = 0;
                }
                last_foot = Some(*foot);
            }
            _ => {
                last_foot = None;
                run = 0;
            }
        }
    }
    (doubles, longest_run)
}

////////////////////////////
// LITERAL §8 SCENARIOS  //
////////////////////////////

#[test]
fn empty_chart_expresses_to_nothing() {
    let expressed = express(vec![], 10);
    assert!(expressed.steps.is_empty());
    assert!(expressed.mines.is_empty());
}

#[test]
fn alternating_jacks_on_the_home_lanes() {
    // L0 R3 L0 R3 ... : eight taps, all on the lanes the feet start on
    let expressed = express(taps(&[0, 3, 0, 3, 0, 3, 0, 3]), 10);
    let expected: Vec<(Foot, StepType)> = (0..8)
        .map(|i| {
            let foot = if i % 2 == 0 { Foot::Left } else { Foot::Right };
            (foot, StepType::SameArrow)
        })
        .collect();
    assert_eq!(single_steps(&expressed), expected);
}

#[test]
fn jack_runs_alternate_cleanly() {
    // R3 R3 R3 L0 L0 L0 R2 R2 R2 L1 L1 L1
    let expressed = express(taps(&[3, 3, 3, 0, 0, 0, 2, 2, 2, 1, 1, 1]), 10);
    use Foot::{Left as L, Right as R};
    use StepType::{NewArrow, SameArrow};
    assert_eq!(
        single_steps(&expressed),
        vec![
            (R, SameArrow),
            (R, SameArrow),
            (R, SameArrow),
            (L, SameArrow),
            (L, SameArrow),
            (L, SameArrow),
            (R, NewArrow),
            (R, SameArrow),
            (R, SameArrow),
            (L, NewArrow),
            (L, SameArrow),
            (L, SameArrow),
        ]
    );
}

#[test]
fn holds_force_a_crossover_and_an_inversion() {
    // Holding up with the right foot forces the left foot across; holding right with the left
    // foot then forces the right foot all the way over to the left lane.
    let notes = vec![
        note(0, 1, NoteKind::Tap),
        note(10, 2, NoteKind::HoldStart),
        note(20, 3, NoteKind::HoldStart),
        note(30, 2, NoteKind::Release),
        note(40, 0, NoteKind::Tap),
        note(50, 3, NoteKind::Release),
    ];
    let expressed = express(notes, 10);
    let all = cells(&expressed);
    assert_eq!(
        all[0],
        vec![(Foot::Left, FootPortion::Heel, StepType::NewArrow, FootAction::Tap, 1)]
    );
    assert_eq!(
        all[1],
        vec![(Foot::Right, FootPortion::Heel, StepType::NewArrow, FootAction::Hold, 2)]
    );
    assert_eq!(
        all[2],
        vec![(
            Foot::Left,
            FootPortion::Heel,
            StepType::CrossoverBehind,
            FootAction::Hold,
            3
        )]
    );
    assert_eq!(
        all[3],
        vec![(Foot::Right, FootPortion::Heel, StepType::SameArrow, FootAction::Release, 2)]
    );
    assert_eq!(
        all[4],
        vec![(Foot::Right, FootPortion::Heel, StepType::InvertFront, FootAction::Tap, 0)]
    );
    assert_eq!(
        all[5],
        vec![(Foot::Left, FootPortion::Heel, StepType::SameArrow, FootAction::Release, 3)]
    );
}

#[test]
fn quad_brackets_with_rolls_on_the_heels() {
    // A quad with long holds on the toe lanes and short rolls on the heel lanes
    let notes = vec![
        note(0, 0, NoteKind::RollStart),
        note(0, 1, NoteKind::RollStart),
        note(0, 2, NoteKind::HoldStart),
        note(0, 3, NoteKind::HoldStart),
        note(10, 0, NoteKind::Release),
        note(10, 1, NoteKind::Release),
        note(40, 2, NoteKind::Release),
        note(40, 3, NoteKind::Release),
    ];
    let expressed = express(notes, 10);
    let all = cells(&expressed);
    assert_eq!(all.len(), 3);

    // The quad itself: left foot brackets left+up, right foot brackets down+right
    assert_eq!(
        all[0],
        vec![
            (
                Foot::Left,
                FootPortion::Heel,
                StepType::BracketHeelSameToeNew,
                FootAction::Hold,
                0
            ),
            (
                Foot::Left,
                FootPortion::Toe,
                StepType::BracketHeelSameToeNew,
                FootAction::Hold,
                2
            ),
            (
                Foot::Right,
                FootPortion::Heel,
                StepType::BracketHeelNewToeSame,
                FootAction::Hold,
                1
            ),
            (
                Foot::Right,
                FootPortion::Toe,
                StepType::BracketHeelNewToeSame,
                FootAction::Hold,
                3
            ),
        ]
    );
    // Rolls land on the heels, holds on the toes
    let quad = &expressed.steps[0];
    assert_eq!(quad.instance_type(Foot::Left, FootPortion::Heel), InstanceStepType::Roll);
    assert_eq!(quad.instance_type(Foot::Right, FootPortion::Heel), InstanceStepType::Roll);
    assert_eq!(
        quad.instance_type(Foot::Left, FootPortion::Toe),
        InstanceStepType::Default
    );
    assert_eq!(
        quad.instance_type(Foot::Right, FootPortion::Toe),
        InstanceStepType::Default
    );

    // The rolls release first, as one-lane bracket releases
    assert_eq!(
        all[1],
        vec![
            (
                Foot::Left,
                FootPortion::Heel,
                StepType::BracketOneArrowHeelSame,
                FootAction::Release,
                0
            ),
            (
                Foot::Right,
                FootPortion::Heel,
                StepType::BracketOneArrowHeelSame,
                FootAction::Release,
                1
            ),
        ]
    );
    assert_eq!(
        all[2],
        vec![
            (
                Foot::Left,
                FootPortion::Toe,
                StepType::BracketOneArrowToeSame,
                FootAction::Release,
                2
            ),
            (
                Foot::Right,
                FootPortion::Toe,
                StepType::BracketOneArrowToeSame,
                FootAction::Release,
                3
            ),
        ]
    );
}

//////////////////////////
// PREFERENCE ORDERING  //
//////////////////////////

#[test]
fn crossover_beats_double_stepping() {
    // 1 2 3: after L-down R-up, the right lane is best taken by crossing the left foot behind
    // rather than double-stepping the right foot
    let expressed = express(taps(&[1, 2, 3]), 10);
    assert_eq!(
        single_steps(&expressed),
        vec![
            (Foot::Left, StepType::NewArrow),
            (Foot::Right, StepType::NewArrow),
            (Foot::Left, StepType::CrossoverBehind),
        ]
    );
}

#[test]
fn jacks_beat_foot_swaps() {
    // 1 2 2 0 2 3: the repeated up arrows stay on the right foot as jacks; the final right
    // arrow crosses the left foot over
    let expressed = express(taps(&[1, 2, 2, 0, 2, 3]), 10);
    use Foot::{Left as L, Right as R};
    use StepType::{CrossoverBehind, NewArrow, SameArrow};
    assert_eq!(
        single_steps(&expressed),
        vec![
            (L, NewArrow),
            (R, NewArrow),
            (R, SameArrow),
            (L, NewArrow),
            (R, SameArrow),
            (L, CrossoverBehind),
        ]
    );
    let swaps = expressed
        .steps
        .iter()
        .flat_map(|e| e.link.cells())
        .filter(|(_, _, c)| c.step.is_swap())
        .count();
    assert_eq!(swaps, 0);
}

#[test]
fn hold_anchored_runs_double_step_instead_of_bracketing() {
    // Holding left with the left foot while the right foot alternates down and up: every right
    // note is a plain single step, never a bracket
    let mut notes = vec![note(0, 0, NoteKind::HoldStart)];
    for (i, lane) in [1, 2, 1, 2, 1, 2].into_iter().enumerate() {
        notes.push(note(10 + i as u64 * 10, lane, NoteKind::Tap));
    }
    notes.push(note(100, 0, NoteKind::Release));
    let expressed = express(notes, 10);

    for event in &expressed.steps {
        for (foot, _, cell) in event.link.cells() {
            if cell.action != FootAction::Release {
                assert!(!cell.step.is_bracket(), "bracket under a hold: {:?}", cell);
                if event.tick > 0 {
                    assert_eq!(foot, Foot::Right);
                }
            }
        }
    }
}

/// The four double-step charts: a hold anchors one foot while the free foot covers two moving
/// notes, twice over.  The minimum is exactly two double steps and no triple step.
fn double_step_chart(mirrored: bool, inner_swapped: bool) -> Vec<Note> {
    let m = |lane: usize| if mirrored { 3 - lane } else { lane };
    let s = |lane: usize| {
        if inner_swapped && (lane == 1 || lane == 2) {
            3 - lane
        } else {
            lane
        }
    };
    vec![
        note(0, m(s(0)), NoteKind::HoldStart),
        note(10, m(s(1)), NoteKind::Tap),
        note(20, m(s(2)), NoteKind::Tap),
        note(30, m(s(0)), NoteKind::Release),
        note(40, m(s(1)), NoteKind::Tap),
        note(50, m(s(3)), NoteKind::HoldStart),
        note(60, m(s(2)), NoteKind::Tap),
        note(70, m(s(1)), NoteKind::Tap),
        note(80, m(s(3)), NoteKind::Release),
    ]
}

#[test]
fn double_steps_are_minimal() {
    for (mirrored, inner_swapped) in
        [(false, false), (true, false), (false, true), (true, true)]
    {
        let expressed = express(double_step_chart(mirrored, inner_swapped), 10);
        let (doubles, longest_run) = double_steps_and_longest_run(&expressed);
        assert_eq!(
            doubles, 2,
            "chart variant ({}, {}) should express exactly two double steps",
            mirrored, inner_swapped
        );
        assert!(
            longest_run < 3,
            "chart variant ({}, {}) contains a triple step",
            mirrored,
            inner_swapped
        );
    }
}

///////////////////
// INDICATIONS   //
///////////////////

#[test]
fn an_imminent_mine_steers_the_foot_choice() {
    // Without the mine, the down arrow defaults to the left foot; a mine about to fall on the
    // right foot's lane pushes the step onto the right foot instead
    let without = express(taps(&[1]), 10);
    assert_eq!(single_steps(&without), vec![(Foot::Left, StepType::NewArrow)]);

    let with_mine = express(
        vec![note(0, 1, NoteKind::Tap), note(2, 3, NoteKind::Mine)],
        10,
    );
    assert_eq!(
        single_steps(&with_mine),
        vec![(Foot::Right, StepType::NewArrow)]
    );
}

#[test]
fn the_earliest_released_foot_steps_next() {
    // Both feet hold their home lanes; the right foot releases first, so it takes the next
    // note even though the left foot would win the default tiebreak
    let notes = vec![
        note(0, 0, NoteKind::HoldStart),
        note(0, 3, NoteKind::HoldStart),
        note(10, 3, NoteKind::Release),
        note(20, 0, NoteKind::Release),
        note(30, 1, NoteKind::Tap),
    ];
    let expressed = express(notes, 10);
    let last = cells(&expressed).pop().unwrap();
    assert_eq!(
        last,
        vec![(Foot::Right, FootPortion::Heel, StepType::NewArrow, FootAction::Tap, 1)]
    );
}

///////////////
// MINES     //
///////////////

#[test]
fn mines_on_untouched_lanes_classify_no_arrow() {
    let notes = vec![
        note(0, 0, NoteKind::Tap),
        note(10, 3, NoteKind::Tap),
        note(5, 2, NoteKind::Mine),
    ];
    let expressed = express(notes, 10);
    assert_eq!(expressed.mines.len(), 1);
    let mine = &expressed.mines[0];
    assert_eq!(mine.kind, MineEventKind::NoArrow);
    assert_eq!(mine.nth_closest, INVALID_LANE_RANK);
    assert_eq!(mine.foot, None);
}

#[test]
fn mines_between_arrows_prefer_after_arrow() {
    // Arrows at t=0 and t=20 on the down lane; the mine at t=5 reads as "after" the first,
    // carrying the foot that played it
    let notes = vec![
        note(0, 1, NoteKind::Tap),
        note(5, 1, NoteKind::Mine),
        note(20, 1, NoteKind::Tap),
    ];
    let expressed = express(notes, 10);
    assert_eq!(expressed.mines.len(), 1);
    let mine = &expressed.mines[0];
    assert_eq!(mine.kind, MineEventKind::AfterArrow);
    assert_eq!(mine.nth_closest, 0);
    assert_eq!(mine.foot, Some(Foot::Left));
}

#[test]
fn equidistant_mines_share_ranks_and_jumps_blur_the_foot() {
    // A two-lane jump, then mines at the same distance on both of its lanes
    let notes = vec![
        note(0, 1, NoteKind::Tap),
        note(0, 2, NoteKind::Tap),
        note(15, 1, NoteKind::Mine),
        note(15, 2, NoteKind::Mine),
    ];
    let expressed = express(notes, 10);
    assert_eq!(expressed.mines.len(), 2);
    for mine in &expressed.mines {
        assert_eq!(mine.kind, MineEventKind::AfterArrow);
        assert_eq!(mine.nth_closest, 0, "equal distances must share rank 0");
        assert_eq!(mine.foot, None, "jump lanes have no unambiguous foot");
    }
}

/////////////////////////
// POLICY & RECOVERY   //
/////////////////////////

#[test]
fn bracketless_charts_retry_with_brackets_when_stuck() {
    // Rated below MinLevelForBrackets, so the first attempt runs bracketless and can't cover a
    // three-lane row; the automatic retry brackets it
    let notes = vec![
        note(0, 0, NoteKind::Tap),
        note(0, 1, NoteKind::Tap),
        note(0, 2, NoteKind::Tap),
    ];
    let expressed = express(notes, 3);
    assert_eq!(expressed.steps.len(), 1);
    assert!(expressed.steps[0].link.has_two_lane_bracket());
}

#[test]
fn rows_no_stance_can_cover_are_unreachable() {
    // With both heels committed to holds on the left and up lanes, no stance can press the
    // down and right lanes together
    let notes = vec![
        note(0, 0, NoteKind::HoldStart),
        note(10, 2, NoteKind::HoldStart),
        note(20, 1, NoteKind::Tap),
        note(20, 3, NoteKind::Tap),
        note(30, 0, NoteKind::Release),
        note(30, 2, NoteKind::Release),
    ];
    match try_express(notes, 10) {
        Err(Error::Unreachable { row, .. }) => assert_eq!(row.index(), 2),
        other => panic!("expected Unreachable, got {:?}", other.map(|e| e.steps.len())),
    }
}

#[test]
fn expression_is_stable_under_re_execution() {
    let notes = taps(&[1, 2, 3, 0, 1, 2]);
    let first = express(notes.clone(), 10);
    let second = express(notes, 10);
    assert_eq!(first, second);
}

#[test]
fn precomputed_graphs_express_identically() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dance-single.fsg");
    let built = graph();
    built.write_to(&path).unwrap();
    let loaded = Arc::new(StepGraph::read_from(&path, built.pad().clone()).unwrap());

    let chart = Chart {
        chart_type: ChartType::DanceSingle,
        rating: 10,
        ticks_per_minute: 600.0,
        notes: taps(&[1, 2, 3, 2, 1, 0]),
    };
    let config = ExpressConfig::default();
    let from_built =
        express_chart(&chart, built, &config, &Config::default()).unwrap();
    let from_loaded = express_chart(&chart, loaded, &config, &Config::default()).unwrap();
    assert_eq!(from_built, from_loaded);
}

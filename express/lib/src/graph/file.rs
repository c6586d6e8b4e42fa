//! The precomputed step graph format (`<chart-type>.fsg`).
//!
//! Layout (all integers little-endian): a header (magic, version, chart-type tag, lane count,
//! start state), a pool of unique links, a pool of body states, and an edge list of
//! `(from, link, to)` triples indexing into both pools.

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::Path,
    sync::Arc,
};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use padframe::{Foot, FootAction, FootPortion, Lane, PadData, StepType};

use super::{BodyState, Edge, GraphLink, LinkCell, StepGraph};
use crate::{Error, Result, StateIdx, StateVec};

const MAGIC: [u8; 4] = *b"FSG\0";
const VERSION: u32 = 1;

pub(super) fn write(graph: &StepGraph, path: &Path) -> Result<()> {
    let io_err = |e: io::Error| Error::StepGraphLoad {
        path: path.to_owned(),
        reason: format!("write failed: {}", e),
    };
    let file = File::create(path).map_err(io_err)?;
    let mut w = BufWriter::new(file);
    write_inner(graph, &mut w).map_err(io_err)
}

fn write_inner(graph: &StepGraph, w: &mut impl Write) -> io::Result<()> {
    w.write_all(&MAGIC)?;
    w.write_u32::<LittleEndian>(VERSION)?;
    let tag = graph.pad.chart_type_tag().as_bytes();
    w.write_u16::<LittleEndian>(tag.len() as u16)?;
    w.write_all(tag)?;
    w.write_u32::<LittleEndian>(graph.pad.num_lanes() as u32)?;
    w.write_u32::<LittleEndian>(graph.start.index() as u32)?;

    w.write_u32::<LittleEndian>(graph.links.len() as u32)?;
    for link in &graph.links {
        for foot in Foot::BOTH {
            for portion in FootPortion::BOTH {
                match link.cell(foot, portion) {
                    Some(cell) => {
                        w.write_u8(1)?;
                        w.write_u8(step_to_byte(cell.step))?;
                        w.write_u8(action_to_byte(cell.action))?;
                    }
                    None => {
                        w.write_all(&[0, 0, 0])?;
                    }
                }
            }
        }
    }

    w.write_u32::<LittleEndian>(graph.states.len() as u32)?;
    for state in &graph.states {
        for foot in Foot::BOTH {
            for portion in FootPortion::BOTH {
                match state.lane(foot, portion) {
                    Some(lane) => w.write_all(&[1, lane.index() as u8])?,
                    None => w.write_all(&[0, 0])?,
                }
            }
        }
        w.write_u8(match state.front_foot() {
            None => 0,
            Some(Foot::Left) => 1,
            Some(Foot::Right) => 2,
        })?;
    }

    w.write_u32::<LittleEndian>(graph.num_edges() as u32)?;
    for (from, edges) in graph.successors.iter_enumerated() {
        for edge in edges {
            w.write_u32::<LittleEndian>(from.index() as u32)?;
            w.write_u32::<LittleEndian>(edge.link.index() as u32)?;
            w.write_u32::<LittleEndian>(edge.to.index() as u32)?;
        }
    }
    w.flush()
}

pub(super) fn read(path: &Path, pad: Arc<PadData>) -> Result<StepGraph> {
    let fail = |reason: String| Error::StepGraphLoad {
        path: path.to_owned(),
        reason,
    };
    let file = File::open(path).map_err(|e| fail(format!("open failed: {}", e)))?;
    let mut r = BufReader::new(file);
    read_inner(&mut r, pad).map_err(|e| match e {
        ReadError::Io(e) => fail(format!("read failed: {}", e)),
        ReadError::Bad(reason) => fail(reason),
    })
}

enum ReadError {
    Io(io::Error),
    Bad(String),
}

impl From<io::Error> for ReadError {
    fn from(e: io::Error) -> Self {
        ReadError::Io(e)
    }
}

fn bad(reason: impl Into<String>) -> ReadError {
    ReadError::Bad(reason.into())
}

fn read_inner(r: &mut impl Read, pad: Arc<PadData>) -> std::result::Result<StepGraph, ReadError> {
    let mut magic = [0u8; 4];
    r.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(bad("not a step graph file"));
    }
    let version = r.read_u32::<LittleEndian>()?;
    if version != VERSION {
        return Err(bad(format!("unsupported version {}", version)));
    }
    let tag_len = r.read_u16::<LittleEndian>()? as usize;
    let mut tag = vec![0u8; tag_len];
    r.read_exact(&mut tag)?;
    let tag = String::from_utf8(tag).map_err(|_| bad("chart-type tag isn't UTF-8"))?;
    if tag != pad.chart_type_tag() {
        return Err(bad(format!(
            "chart-type tag {:?} doesn't match the pad's {:?}",
            tag,
            pad.chart_type_tag()
        )));
    }
    let num_lanes = r.read_u32::<LittleEndian>()? as usize;
    if num_lanes != pad.num_lanes() {
        return Err(bad(format!(
            "graph has {} lanes but the pad has {}",
            num_lanes,
            pad.num_lanes()
        )));
    }
    let start = r.read_u32::<LittleEndian>()? as usize;

    let num_links = r.read_u32::<LittleEndian>()? as usize;
    let mut links = crate::LinkVec::with_capacity(num_links);
    for _ in 0..num_links {
        let mut cells = [[None; 2]; 2];
        let mut any = false;
        for cell in cells.iter_mut().flatten() {
            let mut buf = [0u8; 3];
            r.read_exact(&mut buf)?;
            if buf[0] != 0 {
                *cell = Some(LinkCell {
                    step: byte_to_step(buf[1]).ok_or_else(|| bad("unknown step type"))?,
                    action: byte_to_action(buf[2]).ok_or_else(|| bad("unknown foot action"))?,
                });
                any = true;
            }
        }
        if !any {
            return Err(bad("link with no valid cells"));
        }
        links.push(GraphLink::new(cells));
    }

    let num_states = r.read_u32::<LittleEndian>()? as usize;
    let mut states = StateVec::with_capacity(num_states);
    for _ in 0..num_states {
        let mut placements = [[None; 2]; 2];
        for placement in placements.iter_mut().flatten() {
            let mut buf = [0u8; 2];
            r.read_exact(&mut buf)?;
            if buf[0] != 0 {
                if buf[1] as usize >= num_lanes {
                    return Err(bad("placement lane out of range"));
                }
                *placement = Some(Lane::from_index(buf[1] as usize));
            }
        }
        let front = match r.read_u8()? {
            0 => None,
            1 => Some(Foot::Left),
            2 => Some(Foot::Right),
            _ => return Err(bad("unknown front foot marker")),
        };
        states.push(BodyState::new(placements, front));
    }
    if start >= num_states {
        return Err(bad("start state out of range"));
    }

    let num_edges = r.read_u32::<LittleEndian>()? as usize;
    let mut successors: StateVec<Vec<Edge>> = StateVec::from(vec![Vec::new(); num_states]);
    for _ in 0..num_edges {
        let from = r.read_u32::<LittleEndian>()? as usize;
        let link = r.read_u32::<LittleEndian>()? as usize;
        let to = r.read_u32::<LittleEndian>()? as usize;
        if from >= num_states || to >= num_states || link >= num_links {
            return Err(bad("edge indexes out of range"));
        }
        // Every acting cell must rest on a placed lane, or later lane lookups would panic
        for (foot, portion, cell) in links[crate::LinkIdx::new(link)].cells() {
            let state = if cell.action == FootAction::Release {
                &states[StateIdx::new(from)]
            } else {
                &states[StateIdx::new(to)]
            };
            if state.lane(foot, portion).is_none() {
                return Err(bad("edge pairs a link cell with an empty placement"));
            }
        }
        successors[StateIdx::new(from)].push(Edge {
            link: crate::LinkIdx::new(link),
            to: StateIdx::new(to),
        });
    }

    Ok(StepGraph {
        pad,
        states,
        links,
        successors,
        start: StateIdx::new(start),
    })
}

fn step_to_byte(step: StepType) -> u8 {
    use StepType::*;
    match step {
        SameArrow => 0,
        NewArrow => 1,
        CrossoverFront => 2,
        CrossoverBehind => 3,
        InvertFront => 4,
        InvertBehind => 5,
        FootSwap => 6,
        NewArrowStretch => 7,
        CrossoverBehindStretch => 8,
        Swing => 9,
        BracketHeelNewToeNew => 10,
        BracketHeelNewToeSame => 11,
        BracketHeelSameToeNew => 12,
        BracketHeelSameToeSame => 13,
        BracketHeelSwapToeSame => 14,
        BracketHeelSameToeSwap => 15,
        BracketOneArrowHeelNew => 16,
        BracketOneArrowHeelSame => 17,
        BracketOneArrowToeNew => 18,
        BracketOneArrowToeSame => 19,
        BracketStretchOneArrowHeelNew => 20,
        BracketStretchOneArrowToeNew => 21,
    }
}

fn byte_to_step(byte: u8) -> Option<StepType> {
    use StepType::*;
    Some(match byte {
        0 => SameArrow,
        1 => NewArrow,
        2 => CrossoverFront,
        3 => CrossoverBehind,
        4 => InvertFront,
        5 => InvertBehind,
        6 => FootSwap,
        7 => NewArrowStretch,
        8 => CrossoverBehindStretch,
        9 => Swing,
        10 => BracketHeelNewToeNew,
        11 => BracketHeelNewToeSame,
        12 => BracketHeelSameToeNew,
        13 => BracketHeelSameToeSame,
        14 => BracketHeelSwapToeSame,
        15 => BracketHeelSameToeSwap,
        16 => BracketOneArrowHeelNew,
        17 => BracketOneArrowHeelSame,
        18 => BracketOneArrowToeNew,
        19 => BracketOneArrowToeSame,
        20 => BracketStretchOneArrowHeelNew,
        21 => BracketStretchOneArrowToeNew,
        _ => return None,
    })
}

fn action_to_byte(action: FootAction) -> u8 {
    match action {
        FootAction::Tap => 0,
        FootAction::Hold => 1,
        FootAction::Release => 2,
    }
}

fn byte_to_action(byte: u8) -> Option<FootAction> {
    Some(match byte {
        0 => FootAction::Tap,
        1 => FootAction::Hold,
        2 => FootAction::Release,
        _ => return None,
    })
}

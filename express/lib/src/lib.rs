//! Expression engine for step charts: a heuristic graph search which infers, for every note of
//! a chart, which foot and which part of the foot most plausibly executes it, together with the
//! step semantics (jacks, crossovers, inversions, foot-swaps, brackets, ...) and how mines
//! relate to nearby arrows.
//!
//! The engine is organised leaves-first:
//! - [`padframe`] supplies the pad description and the step vocabulary;
//! - [`graph`] holds the precomputed state graph of reachable body configurations;
//! - [`chart`] normalises raw chart events into per-tick rows;
//! - the search core finds the cheapest sequence of graph links reproducing the rows;
//! - a post-pass classifies mines against the expressed steps;
//! - the result is an [`ExpressedChart`]: two immutable event lists.

#![deny(clippy::all)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod brackets;
pub mod cache;
pub mod chart;
mod expressed;
pub mod graph;
mod mines;
mod search;

use std::{
    error::Error as StdError,
    fmt::{Display, Formatter},
    path::PathBuf,
    sync::Arc,
};

use padframe::{Lane, LaneMask, PadDataError};

pub use brackets::{BracketParsingDetermination, BracketParsingMethod, ExpressConfig};
pub use chart::{Chart, ChartType, Note, NoteKind, Rows};
pub use expressed::{ExpressedChart, MineEvent, MineEventKind, StepEvent, INVALID_LANE_RANK};
pub use graph::{BodyState, GraphLink, LinkCell, StepGraph};
pub use search::Config;

index_vec::define_index_type! {
    /// The index of a row within a normalised chart.
    pub struct RowIdx = u32;
}
index_vec::define_index_type! {
    /// The index of a [`BodyState`] within a [`StepGraph`].
    pub struct StateIdx = u32;
}
index_vec::define_index_type! {
    /// The index of a [`GraphLink`] within a [`StepGraph`].
    pub struct LinkIdx = u32;
}

pub type RowVec<T> = index_vec::IndexVec<RowIdx, T>;
pub type StateVec<T> = index_vec::IndexVec<StateIdx, T>;
pub type LinkVec<T> = index_vec::IndexVec<LinkIdx, T>;

/// Expresses one chart against a loaded [`StepGraph`].
///
/// This runs the full pipeline: row normalisation, bracket method selection, the link-sequence
/// search (retrying once with brackets enabled if a bracketless first attempt proved
/// unreachable), mine classification and result assembly.
pub fn express_chart(
    chart: &Chart,
    graph: Arc<StepGraph>,
    config: &ExpressConfig,
    search_config: &Config,
) -> Result<ExpressedChart> {
    let rows = Rows::normalise(chart, graph.pad().num_lanes())?;
    let method = config.method_for(chart, &rows, graph.pad());
    log::debug!(
        "expressing {} rows of {} with {:?} brackets",
        rows.len(),
        chart.chart_type,
        method
    );

    let applied = match search::run(&graph, &rows, method, search_config) {
        // One automatic retry with relaxed bracket parsing (spec'd recovery for charts which
        // can't be covered two-footed).
        Err(Error::Unreachable { row, .. }) if method == BracketParsingMethod::NoBrackets => {
            log::info!(
                "row {} unreachable without brackets; retrying aggressively",
                row.index()
            );
            search::run(&graph, &rows, BracketParsingMethod::Aggressive, search_config)?
        }
        other => other?,
    };

    Ok(expressed::assemble(&graph, &rows, &applied))
}

/// The different ways that expressing a chart can fail.
#[derive(Debug)]
pub enum Error {
    /// The pad description failed to load or validate.
    PadData(PadDataError),
    /// A precomputed step graph file failed to load.
    StepGraphLoad { path: PathBuf, reason: String },
    /// The chart's own event stream is inconsistent (e.g. a release with no matching hold).
    MalformedChart {
        tick: u64,
        lane: Option<Lane>,
        reason: String,
    },
    /// The search found no admissible link for a row.
    Unreachable { row: RowIdx, lanes: LaneMask },
    /// An internal invariant was violated; this is always a bug.
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::PadData(e) => write!(f, "{}", e),
            Error::StepGraphLoad { path, reason } => {
                write!(f, "can't load step graph {:?}: {}", path, reason)
            }
            Error::MalformedChart { tick, lane, reason } => {
                write!(f, "malformed chart at tick {}", tick)?;
                if let Some(lane) = lane {
                    write!(f, ", lane {}", lane)?;
                }
                write!(f, ": {}", reason)
            }
            Error::Unreachable { row, lanes } => {
                write!(
                    f,
                    "no admissible link for row {} (lanes {})",
                    row.index(),
                    lanes
                )
            }
            Error::Internal(msg) => write!(f, "internal invariant violated: {}", msg),
        }
    }
}

impl StdError for Error {}

impl From<PadDataError> for Error {
    fn from(e: PadDataError) -> Self {
        Error::PadData(e)
    }
}

//! The search core: a best-first search over sequences of graph-link applications which, when
//! replayed from the neutral stance, exactly reproduce the lanes demanded by every row.

mod best_first;
mod cost;
mod path;

use std::convert::TryInto;

use sysinfo::SystemExt;

use crate::{brackets::BracketParsingMethod, chart::Rows, graph::StepGraph, Result};

pub(crate) use path::Applied;

/// Runs the search, producing the cheapest admissible link sequence under the lexicographic
/// cost comparator.
pub(crate) fn run(
    graph: &StepGraph,
    rows: &Rows,
    method: BracketParsingMethod,
    config: &Config,
) -> Result<Vec<Applied>> {
    best_first::search(graph, rows, method, config)
}

/// Configuration options for the expression machinery.
///
/// `Config` *won't* change which expression is produced, only how much work the engine is
/// allowed to do finding it.
#[derive(Debug, Clone)]
pub struct Config {
    /// The maximum number of body states in a built step graph.  Guards against a buggy or
    /// hostile pad description producing an unbounded closure.
    pub graph_size_limit: usize,
    /// The maximum number of bytes of heap memory which the search routine is allowed to use.
    /// Defaults to 80% of available memory.
    pub mem_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        // Use as a memory limit either 80% of available memory or 5GB if we can't access
        // availability
        let ideal_mem_limit = if sysinfo::System::IS_SUPPORTED {
            (sysinfo::System::new_all().available_memory() as f32 * 0.8) as u64
        } else {
            5_000_000_000u64
        };
        // Cap below what's addressable so 32-bit environments don't overflow `usize`
        let pointer_size_limit = (usize::MAX as u64).saturating_sub(500_000_000);
        let mem_limit: usize = ideal_mem_limit
            .min(pointer_size_limit)
            .try_into()
            .expect("Memory limit should fit into `usize`");

        Self {
            graph_size_limit: 100_000,
            mem_limit,
        }
    }
}

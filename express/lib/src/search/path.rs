//! Shared storage for the search's partial paths.
//!
//! Frontier nodes don't own their histories; they point into this arena.  Paths are only ever
//! appended, so a node's chain stays valid for the whole search.

use datasize::DataSize;
use index_vec::IndexVec;

use crate::{LinkIdx, RowIdx, StateIdx};

index_vec::define_index_type! {
    pub(crate) struct PathIdx = u32;
}

/// One applied link on a search path.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PathEntry {
    pub prev: Option<PathIdx>,
    pub row: RowIdx,
    pub link: LinkIdx,
    pub from: StateIdx,
    pub to: StateIdx,
}

/// One link application in the final, winning sequence.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Applied {
    pub row: RowIdx,
    pub link: LinkIdx,
    pub from: StateIdx,
    pub to: StateIdx,
}

#[derive(Debug, Default)]
pub(crate) struct Paths {
    entries: IndexVec<PathIdx, PathEntry>,
}

impl Paths {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entry: PathEntry) -> PathIdx {
        self.entries.push(entry)
    }

    /// Walks a path chain back to the start and returns it in chart order.
    pub fn unwind(&self, head: Option<PathIdx>) -> Vec<Applied> {
        let mut out = Vec::new();
        let mut next = head;
        while let Some(idx) = next {
            let entry = &self.entries[idx];
            out.push(Applied {
                row: entry.row,
                link: entry.link,
                from: entry.from,
                to: entry.to,
            });
            next = entry.prev;
        }
        out.reverse();
        out
    }
}

impl DataSize for Paths {
    const IS_DYNAMIC: bool = true;
    const STATIC_HEAP_SIZE: usize = 0;

    fn estimate_heap_size(&self) -> usize {
        self.entries.len() * std::mem::size_of::<PathEntry>()
    }
}

use std::fmt::{Debug, Display, Formatter};

use serde::{Deserialize, Serialize};

/// A single steppable lane (arrow) on a pad, identified by its 0-based index.
///
/// `Lane`s are just indices; everything a lane *means* (its position, which other lanes it pairs
/// with, etc.) lives in [`PadData`](crate::PadData).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Lane(u8);

impl Lane {
    /// Creates a `Lane` from a 0-based index.
    pub fn from_index(index: usize) -> Self {
        assert!(index < u8::MAX as usize, "lane index out of range");
        Lane(index as u8)
    }

    /// The 0-based index of this `Lane`.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// The lane that this `Lane` maps to when the pad is mirrored, i.e. `num_lanes - 1 - self`.
    pub fn mirror(self, num_lanes: usize) -> Self {
        debug_assert!(self.index() < num_lanes);
        Lane((num_lanes - 1 - self.index()) as u8)
    }

    /// An [`Iterator`] over every `Lane` of a pad with `num_lanes` lanes.
    pub fn all(num_lanes: usize) -> impl Iterator<Item = Lane> {
        (0..num_lanes).map(Lane::from_index)
    }
}

impl Display for Lane {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Debug for Lane {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Lane({})", self.0)
    }
}

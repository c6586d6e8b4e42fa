//! [`LaneMask`]: a fixed-width set of [`Lane`]s.

use std::fmt::{Debug, Display, Formatter};

use bit_vec::BitVec;
use itertools::Itertools;

use crate::Lane;

/// A set of [`Lane`]s on one pad.  The width is fixed at construction to the pad's lane count,
/// so masks from the same pad always compare and combine cleanly.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LaneMask {
    lanes: BitVec,
}

impl LaneMask {
    /// Creates a mask containing no lanes.
    pub fn empty(num_lanes: usize) -> Self {
        Self {
            lanes: BitVec::from_elem(num_lanes, false),
        }
    }

    /// Creates a mask containing exactly one lane.
    pub fn single(num_lanes: usize, lane: Lane) -> Self {
        let mut mask = Self::empty(num_lanes);
        mask.insert(lane);
        mask
    }

    /// Creates a mask from any iterator of lanes.
    pub fn from_lanes(num_lanes: usize, lanes: impl IntoIterator<Item = Lane>) -> Self {
        let mut mask = Self::empty(num_lanes);
        for l in lanes {
            mask.insert(l);
        }
        mask
    }

    pub fn num_lanes(&self) -> usize {
        self.lanes.len()
    }

    pub fn insert(&mut self, lane: Lane) {
        self.lanes.set(lane.index(), true);
    }

    pub fn remove(&mut self, lane: Lane) {
        self.lanes.set(lane.index(), false);
    }

    pub fn contains(&self, lane: Lane) -> bool {
        self.lanes.get(lane.index()).unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.none()
    }

    /// The number of lanes in the set.
    pub fn count(&self) -> usize {
        self.lanes.iter().filter(|&b| b).count()
    }

    /// An [`Iterator`] over the contained lanes, in index order.
    pub fn iter(&self) -> impl Iterator<Item = Lane> + Clone + '_ {
        self.lanes
            .iter()
            .enumerate()
            .filter(|&(_, b)| b)
            .map(|(i, _)| Lane::from_index(i))
    }

    /// `true` if `self` and `other` share no lanes.
    pub fn is_disjoint(&self, other: &Self) -> bool {
        debug_assert_eq!(self.num_lanes(), other.num_lanes());
        self.iter().all(|l| !other.contains(l))
    }

    pub fn union(&self, other: &Self) -> Self {
        debug_assert_eq!(self.num_lanes(), other.num_lanes());
        let mut lanes = self.lanes.clone();
        lanes.or(&other.lanes);
        Self { lanes }
    }

    /// The number of bytes this mask occupies on the heap.
    pub fn heap_size(&self) -> usize {
        self.lanes.capacity() / 8
    }
}

impl Display for LaneMask {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", self.iter().map(|l| l.to_string()).join(","))
    }
}

impl Debug for LaneMask {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "LaneMask({})", self)
    }
}

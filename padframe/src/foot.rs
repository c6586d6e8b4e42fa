use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// One of the player's two feet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Foot {
    Left = 0,
    Right = 1,
}

impl Foot {
    /// Both feet, in index order.  Useful for iterating over `[_; 2]` tables.
    pub const BOTH: [Foot; 2] = [Foot::Left, Foot::Right];

    /// The other foot: `Left <-> Right`.
    pub fn other(self) -> Self {
        match self {
            Foot::Left => Foot::Right,
            Foot::Right => Foot::Left,
        }
    }

    /// The index of this foot into `[_; 2]` tables.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Foot::Left,
            1 => Foot::Right,
            _ => panic!("foot index must be 0 or 1"),
        }
    }
}

impl Display for Foot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Foot::Left => write!(f, "L"),
            Foot::Right => write!(f, "R"),
        }
    }
}

/// A part of one foot.  A bracket occupies both portions of one foot; a plain single-lane step
/// occupies only [`FootPortion::DEFAULT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FootPortion {
    Heel = 0,
    Toe = 1,
}

impl FootPortion {
    /// Both portions, in index order.
    pub const BOTH: [FootPortion; 2] = [FootPortion::Heel, FootPortion::Toe];

    /// The portion used to represent a single-lane step.
    pub const DEFAULT: FootPortion = FootPortion::Heel;

    pub fn other(self) -> Self {
        match self {
            FootPortion::Heel => FootPortion::Toe,
            FootPortion::Toe => FootPortion::Heel,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl Display for FootPortion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FootPortion::Heel => write!(f, "heel"),
            FootPortion::Toe => write!(f, "toe"),
        }
    }
}

//! The closed vocabularies of step semantics: what a foot *did* ([`StepType`]), how it pressed
//! the panel ([`FootAction`]), and the per-application flavour of a note
//! ([`InstanceStepType`]).

use serde::{Deserialize, Serialize};

/// How a foot (or one portion of a foot) relates to the lane it steps on.
///
/// This is a closed set: the expression search only ever emits these variants, and downstream
/// consumers match on them exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StepType {
    /// The foot re-steps the lane it already occupies (a jack when repeated).
    SameArrow,
    /// The foot steps a lane it didn't occupy, in a normal stance.
    NewArrow,
    /// The foot crosses over the other foot, passing in front of it.
    CrossoverFront,
    /// The foot crosses over the other foot, passing behind it.
    CrossoverBehind,
    /// The feet are fully inverted; the stepping foot is bodily in front.
    InvertFront,
    /// The feet are fully inverted; the stepping foot is bodily behind.
    InvertBehind,
    /// The foot steps onto a lane currently occupied by the other foot's matching portion.
    FootSwap,
    /// A [`NewArrow`](Self::NewArrow) whose resulting stance is a stretch pairing.
    NewArrowStretch,
    /// A [`CrossoverBehind`](Self::CrossoverBehind) whose resulting stance is a stretch pairing.
    CrossoverBehindStretch,
    /// The foot swings from crossed-in-front to crossed-behind (or back) in a single step.
    Swing,

    /* Bracket family: one foot, both portions placed on two lanes */
    BracketHeelNewToeNew,
    BracketHeelNewToeSame,
    BracketHeelSameToeNew,
    BracketHeelSameToeSame,
    BracketHeelSwapToeSame,
    BracketHeelSameToeSwap,
    /// A bracketed foot acting with its heel only.
    BracketOneArrowHeelNew,
    BracketOneArrowHeelSame,
    /// A bracketed foot acting with its toe only.
    BracketOneArrowToeNew,
    BracketOneArrowToeSame,
    BracketStretchOneArrowHeelNew,
    BracketStretchOneArrowToeNew,
}

impl StepType {
    /// `true` for the two-lane bracket variants, where one foot claims two lanes at once.
    pub fn is_two_lane_bracket(self) -> bool {
        use StepType::*;
        matches!(
            self,
            BracketHeelNewToeNew
                | BracketHeelNewToeSame
                | BracketHeelSameToeNew
                | BracketHeelSameToeSame
                | BracketHeelSwapToeSame
                | BracketHeelSameToeSwap
        )
    }

    /// `true` for the one-lane bracket variants, where a bracketed foot acts with one portion.
    pub fn is_one_lane_bracket(self) -> bool {
        use StepType::*;
        matches!(
            self,
            BracketOneArrowHeelNew
                | BracketOneArrowHeelSame
                | BracketOneArrowToeNew
                | BracketOneArrowToeSame
                | BracketStretchOneArrowHeelNew
                | BracketStretchOneArrowToeNew
        )
    }

    pub fn is_bracket(self) -> bool {
        self.is_two_lane_bracket() || self.is_one_lane_bracket()
    }

    pub fn is_crossover(self) -> bool {
        use StepType::*;
        matches!(self, CrossoverFront | CrossoverBehind | CrossoverBehindStretch)
    }

    pub fn is_invert(self) -> bool {
        matches!(self, StepType::InvertFront | StepType::InvertBehind)
    }

    pub fn is_stretch(self) -> bool {
        use StepType::*;
        matches!(
            self,
            NewArrowStretch
                | CrossoverBehindStretch
                | BracketStretchOneArrowHeelNew
                | BracketStretchOneArrowToeNew
        )
    }

    /// `true` if the stepping portion stays on a lane the foot already occupies.  Jacks and
    /// same-lane bracket re-steps don't count as foot movement for the cost model.
    pub fn is_same_lane(self) -> bool {
        use StepType::*;
        matches!(
            self,
            SameArrow | BracketHeelSameToeSame | BracketOneArrowHeelSame | BracketOneArrowToeSame
        )
    }

    pub fn is_swap(self) -> bool {
        use StepType::*;
        matches!(self, FootSwap | BracketHeelSwapToeSame | BracketHeelSameToeSwap)
    }

    /// The position of this step type in the least-significant tiebreak ordering: cheaper
    /// (more ordinary) steps rank lower.
    pub fn rank(self) -> u32 {
        use StepType::*;
        match self {
            SameArrow => 0,
            BracketOneArrowHeelSame | BracketOneArrowToeSame => 1,
            NewArrow => 2,
            BracketOneArrowHeelNew | BracketOneArrowToeNew => 3,
            NewArrowStretch => 4,
            BracketStretchOneArrowHeelNew | BracketStretchOneArrowToeNew => 5,
            BracketHeelSameToeSame => 6,
            BracketHeelNewToeSame | BracketHeelSameToeNew => 7,
            BracketHeelNewToeNew => 8,
            FootSwap => 9,
            BracketHeelSwapToeSame | BracketHeelSameToeSwap => 10,
            CrossoverFront => 11,
            CrossoverBehind => 12,
            CrossoverBehindStretch => 13,
            InvertFront => 14,
            InvertBehind => 15,
            Swing => 16,
        }
    }
}

/// How a panel is pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FootAction {
    Tap,
    /// The start of a hold or roll; the portion stays planted until a matching
    /// [`Release`](Self::Release).
    Hold,
    Release,
}

/// Per-application flavour of a step.  Attached when a graph link is applied to a chart; never
/// stored in the shared step graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstanceStepType {
    #[default]
    Default,
    Roll,
    Fake,
    Lift,
}

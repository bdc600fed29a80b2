use core::fmt;
use serde::{Deserialize, Serialize};

/// A single step of a plan.
///
/// `card` is the index of the played card within its pile at the time of the
/// play. It has no bearing on legality or scoring; the automation layer uses
/// it to find the card on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Move {
    Play { pile: usize, card: usize },
    /// Clears the hand ("next stack"). Only legal when no play is.
    Reset,
}

impl Move {
    pub const fn play(pile: usize, card: usize) -> Self {
        Move::Play { pile, card }
    }

    pub const fn is_reset(self) -> bool {
        matches!(self, Move::Reset)
    }

    pub const fn pile(self) -> Option<usize> {
        match self {
            Move::Play { pile, .. } => Some(pile),
            Move::Reset => None,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Play { pile, card } => write!(f, "pile {} card {}", pile + 1, card),
            Move::Reset => f.write_str("next stack"),
        }
    }
}

use super::state::{GameState, ReplayError, replay};
use crate::model::layout::Layout;
use crate::model::moves::Move;
use crate::model::score::WIN_SCORE;
use core::fmt;
use serde::{Deserialize, Serialize};

/// A finished plan as written to disk: the dealt layout plus the moves that
/// were (or will be) clicked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanSnapshot {
    pub layout: Layout,
    pub moves: Vec<Move>,
    pub final_score: u32,
    pub won: bool,
    #[serde(default = "default_target")]
    pub target: u32,
}

fn default_target() -> u32 {
    WIN_SCORE
}

impl PlanSnapshot {
    pub fn capture(layout: &Layout, final_state: &GameState) -> Self {
        PlanSnapshot {
            layout: layout.clone(),
            moves: final_state.history().to_vec(),
            final_score: final_state.score(),
            won: final_state.is_won(),
            target: final_state.target(),
        }
    }

    /// Replays the moves from the layout and checks the recorded outcome.
    pub fn verify(&self) -> Result<GameState, SnapshotError> {
        let end = replay(
            &GameState::new(&self.layout).with_target(self.target),
            &self.moves,
        )?;
        if end.score() != self.final_score || end.is_won() != self.won {
            return Err(SnapshotError::OutcomeMismatch {
                recorded: self.final_score,
                replayed: end.score(),
            });
        }
        Ok(end)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    Replay(ReplayError),
    OutcomeMismatch { recorded: u32, replayed: u32 },
}

impl From<ReplayError> for SnapshotError {
    fn from(err: ReplayError) -> Self {
        SnapshotError::Replay(err)
    }
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::Replay(err) => write!(f, "plan does not replay: {err}"),
            SnapshotError::OutcomeMismatch { recorded, replayed } => write!(
                f,
                "plan records score {recorded} but replays to {replayed}"
            ),
        }
    }
}

impl std::error::Error for SnapshotError {}

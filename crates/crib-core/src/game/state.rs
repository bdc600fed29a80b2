use crate::model::hand::Hand;
use crate::model::layout::{Layout, PILE_COUNT};
use crate::model::moves::Move;
use crate::model::pile::Pile;
use crate::model::score::{COUNT_LIMIT, WIN_SCORE, score_latest_card};
use core::fmt;

/// Identity of a position for duplicate detection: piles, hand and score.
/// Move history is deliberately left out.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateKey {
    piles: [Pile; PILE_COUNT],
    hand: Hand,
    score: u32,
}

/// Immutable game position. Every transition returns a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    piles: [Pile; PILE_COUNT],
    hand: Hand,
    score: u32,
    history: Vec<Move>,
    target: u32,
}

impl GameState {
    pub fn new(layout: &Layout) -> Self {
        Self::from_piles(layout.to_piles())
    }

    pub fn from_piles(piles: [Pile; PILE_COUNT]) -> Self {
        Self::from_parts(piles, Hand::new(), 0)
    }

    /// Mid-game position with an empty history.
    pub fn from_parts(piles: [Pile; PILE_COUNT], hand: Hand, score: u32) -> Self {
        Self {
            piles,
            hand,
            score,
            history: Vec::new(),
            target: WIN_SCORE,
        }
    }

    /// Overrides the winning score (61 unless configured otherwise).
    pub fn with_target(mut self, target: u32) -> Self {
        self.target = target;
        self
    }

    pub fn piles(&self) -> &[Pile; PILE_COUNT] {
        &self.piles
    }

    pub fn pile(&self, index: usize) -> Option<&Pile> {
        self.piles.get(index)
    }

    pub fn hand(&self) -> &Hand {
        &self.hand
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn target(&self) -> u32 {
        self.target
    }

    pub fn history(&self) -> &[Move] {
        &self.history
    }

    pub fn remaining_cards(&self) -> usize {
        self.piles.iter().map(Pile::len).sum()
    }

    pub fn key(&self) -> StateKey {
        StateKey {
            piles: self.piles.clone(),
            hand: self.hand.clone(),
            score: self.score,
        }
    }

    pub fn is_won(&self) -> bool {
        self.score >= self.target
    }

    pub fn is_lost(&self) -> bool {
        self.piles.iter().all(Pile::is_empty) && self.score < self.target
    }

    pub fn is_terminal(&self) -> bool {
        self.is_won() || self.is_lost()
    }

    /// Plays in ascending pile order, or a lone reset when nothing fits
    /// under the count limit. Never empty.
    pub fn legal_moves(&self) -> Vec<Move> {
        let count = self.hand.capped_sum();
        let mut moves: Vec<Move> = self
            .piles
            .iter()
            .enumerate()
            .filter_map(|(index, pile)| {
                let top = pile.top()?;
                let card = pile.top_index()?;
                (count + u32::from(top.capped_value()) <= COUNT_LIMIT)
                    .then_some(Move::play(index, card))
            })
            .collect();

        if moves.is_empty() {
            moves.push(Move::Reset);
        }
        moves
    }

    pub fn is_legal(&self, mv: Move) -> bool {
        self.check(mv).is_ok()
    }

    /// Applies a move that is known to be legal.
    ///
    /// # Panics
    ///
    /// Panics when the move is not in [`GameState::legal_moves`]; callers
    /// holding untrusted moves should use [`GameState::try_apply`].
    pub fn apply_move(&self, mv: Move) -> GameState {
        self.try_apply(mv)
            .unwrap_or_else(|err| panic!("illegal transition {mv}: {err}"))
    }

    pub fn try_apply(&self, mv: Move) -> Result<GameState, MoveError> {
        self.check(mv)?;

        let mut next = self.clone();
        next.history.push(mv);
        match mv {
            Move::Reset => {
                next.hand = Hand::new();
            }
            Move::Play { pile, .. } => {
                let rank = next.piles[pile].pop().ok_or(MoveError::EmptyPile { pile })?;
                next.hand.add(rank);
                next.score += score_latest_card(next.hand.cards());
            }
        }
        Ok(next)
    }

    fn check(&self, mv: Move) -> Result<(), MoveError> {
        match mv {
            Move::Reset => {
                let playable = self.legal_moves().into_iter().any(|m| !m.is_reset());
                if playable {
                    Err(MoveError::ResetWhilePlayable)
                } else {
                    Ok(())
                }
            }
            Move::Play { pile, card } => {
                let stack = self.piles.get(pile).ok_or(MoveError::UnknownPile { pile })?;
                let (top, expected) = stack
                    .top()
                    .zip(stack.top_index())
                    .ok_or(MoveError::EmptyPile { pile })?;
                if card != expected {
                    return Err(MoveError::CardMismatch {
                        pile,
                        expected,
                        found: card,
                    });
                }
                let count = self.hand.capped_sum() + u32::from(top.capped_value());
                if count > COUNT_LIMIT {
                    return Err(MoveError::OverCount { pile, count });
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Piles:")?;
        for pile in &self.piles {
            let cards = pile
                .cards()
                .iter()
                .map(|rank| rank.symbol())
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(f, "  {cards}")?;
        }
        let hand = self
            .hand
            .cards()
            .iter()
            .map(|rank| rank.symbol())
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(f, "Hand: [{hand}] (count {})", self.hand.capped_sum())?;
        write!(f, "Score: {}", self.score)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    UnknownPile { pile: usize },
    EmptyPile { pile: usize },
    CardMismatch {
        pile: usize,
        expected: usize,
        found: usize,
    },
    OverCount { pile: usize, count: u32 },
    ResetWhilePlayable,
}

impl fmt::Display for MoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveError::UnknownPile { pile } => write!(f, "pile {pile} does not exist"),
            MoveError::EmptyPile { pile } => write!(f, "pile {pile} is empty"),
            MoveError::CardMismatch {
                pile,
                expected,
                found,
            } => write!(
                f,
                "pile {pile} top card is at index {expected}, move names index {found}"
            ),
            MoveError::OverCount { pile, count } => {
                write!(f, "playing pile {pile} would bring the count to {count}")
            }
            MoveError::ResetWhilePlayable => f.write_str("reset offered while a play is legal"),
        }
    }
}

impl std::error::Error for MoveError {}

/// Failure to replay a recorded move list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayError {
    pub index: usize,
    pub mv: Move,
    pub source: MoveError,
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "move #{} ({}) is illegal: {}", self.index, self.mv, self.source)
    }
}

impl std::error::Error for ReplayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

pub fn replay(initial: &GameState, moves: &[Move]) -> Result<GameState, ReplayError> {
    let mut state = initial.clone();
    for (index, mv) in moves.iter().copied().enumerate() {
        state = state.try_apply(mv).map_err(|source| ReplayError { index, mv, source })?;
    }
    Ok(state)
}

use crate::model::rank::Rank;

/// Cards played since the last "next stack". Order matters for runs and sets,
/// so the hand is never sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Hand {
    cards: Vec<Rank>,
}

impl Hand {
    pub fn new() -> Self {
        Self { cards: Vec::new() }
    }

    pub fn with_cards(cards: Vec<Rank>) -> Self {
        Self { cards }
    }

    pub fn add(&mut self, rank: Rank) {
        self.cards.push(rank);
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Rank] {
        &self.cards
    }

    /// The most recent `n` cards, or the whole hand when it is shorter.
    pub fn last(&self, n: usize) -> &[Rank] {
        &self.cards[self.cards.len().saturating_sub(n)..]
    }

    /// Sum of capped values; this is the running count checked against 31.
    pub fn capped_sum(&self) -> u32 {
        crate::model::score::capped_sum(&self.cards)
    }
}

use crate::model::layout::{Layout, PILE_COUNT};
use crate::model::rank::Rank;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::array;

/// Suits play no part in scoring, so a deck is four copies of each rank.
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Rank>,
}

impl Deck {
    pub fn standard() -> Self {
        let mut cards = Vec::with_capacity(52);
        for _ in 0..4 {
            cards.extend(Rank::ORDERED.iter().copied());
        }
        Self { cards }
    }

    pub fn shuffled<R: rand::Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Self::standard();
        deck.shuffle_in_place(rng);
        deck
    }

    pub fn shuffled_with_seed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::shuffled(&mut rng)
    }

    pub fn shuffle_in_place<R: rand::Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    pub fn cards(&self) -> &[Rank] {
        &self.cards
    }

    /// Deals round-robin into four piles of thirteen.
    pub fn deal(&self) -> Layout {
        let mut piles: [Vec<Rank>; PILE_COUNT] = array::from_fn(|_| Vec::with_capacity(13));
        for (index, rank) in self.cards.iter().enumerate() {
            piles[index % PILE_COUNT].push(*rank);
        }
        Layout::new(piles)
    }
}

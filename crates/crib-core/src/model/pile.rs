use crate::model::rank::Rank;

/// One of the four face-up stacks. The last card is the only playable one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Pile {
    cards: Vec<Rank>,
}

impl Pile {
    pub fn new() -> Self {
        Self { cards: Vec::new() }
    }

    pub fn with_cards(cards: Vec<Rank>) -> Self {
        Self { cards }
    }

    pub fn top(&self) -> Option<Rank> {
        self.cards.last().copied()
    }

    /// Position of the top card counted from the bottom of the stack.
    pub fn top_index(&self) -> Option<usize> {
        self.cards.len().checked_sub(1)
    }

    pub fn pop(&mut self) -> Option<Rank> {
        self.cards.pop()
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
}

impl From<Vec<Rank>> for Pile {
    fn from(cards: Vec<Rank>) -> Self {
        Self::with_cards(cards)
    }
}

#[cfg(test)]
mod tests {
    use super::Pile;
    use crate::model::rank::Rank;

    #[test]
    fn top_is_last_card() {
        let pile = Pile::with_cards(vec![Rank::Ace, Rank::Nine, Rank::Queen]);
        assert_eq!(pile.top(), Some(Rank::Queen));
        assert_eq!(pile.top_index(), Some(2));
    }

    #[test]
    fn pop_removes_top_only() {
        let mut pile = Pile::with_cards(vec![Rank::Two, Rank::Three]);
        assert_eq!(pile.pop(), Some(Rank::Three));
        assert_eq!(pile.cards(), &[Rank::Two]);
        assert_eq!(pile.pop(), Some(Rank::Two));
        assert!(pile.is_empty());
        assert_eq!(pile.top_index(), None);
        assert_eq!(pile.pop(), None);
    }
}

use crate::model::pile::Pile;
use crate::model::rank::Rank;
use core::fmt;
use serde::{Deserialize, Serialize};
use std::array;

pub const PILE_COUNT: usize = 4;

/// The four piles as dealt, bottom card first. This is what the perception
/// layer hands to the planner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<String>>", into = "Vec<Vec<String>>")]
pub struct Layout {
    piles: [Vec<Rank>; PILE_COUNT],
}

impl Layout {
    pub fn new(piles: [Vec<Rank>; PILE_COUNT]) -> Self {
        Self { piles }
    }

    /// Builds a layout from textual card tokens (`a`, `2`..`10`, `j`, `q`, `k`).
    pub fn from_tokens<S: AsRef<str>>(piles: &[Vec<S>]) -> Result<Self, LayoutError> {
        if piles.len() != PILE_COUNT {
            return Err(LayoutError::WrongPileCount { found: piles.len() });
        }

        let mut parsed: [Vec<Rank>; PILE_COUNT] = array::from_fn(|_| Vec::new());
        for (pile_index, tokens) in piles.iter().enumerate() {
            for (card_index, token) in tokens.iter().enumerate() {
                let rank = token
                    .as_ref()
                    .parse::<Rank>()
                    .map_err(|err| LayoutError::UnknownToken {
                        pile: pile_index,
                        card: card_index,
                        token: err.token().to_string(),
                    })?;
                parsed[pile_index].push(rank);
            }
        }
        Ok(Self::new(parsed))
    }

    /// Fixed deal used when no live capture is available.
    pub fn sample() -> Self {
        const SAMPLE: [[&str; 13]; PILE_COUNT] = [
            ["a", "2", "9", "j", "6", "a", "5", "5", "9", "3", "8", "k", "4"],
            ["7", "8", "2", "3", "j", "a", "10", "q", "5", "7", "q", "8", "7"],
            ["j", "9", "a", "10", "2", "6", "7", "4", "6", "k", "q", "4", "6"],
            ["q", "10", "k", "k", "3", "2", "4", "j", "9", "10", "5", "8", "3"],
        ];
        let tokens: Vec<Vec<&str>> = SAMPLE.iter().map(|pile| pile.to_vec()).collect();
        Self::from_tokens(&tokens).expect("sample layout uses valid tokens")
    }

    pub fn piles(&self) -> &[Vec<Rank>; PILE_COUNT] {
        &self.piles
    }

    pub fn card_count(&self) -> usize {
        self.piles.iter().map(Vec::len).sum()
    }

    pub fn to_piles(&self) -> [Pile; PILE_COUNT] {
        array::from_fn(|index| Pile::with_cards(self.piles[index].clone()))
    }

    pub fn to_tokens(&self) -> Vec<Vec<String>> {
        self.piles
            .iter()
            .map(|pile| pile.iter().map(|rank| rank.symbol().to_string()).collect())
            .collect()
    }
}

impl TryFrom<Vec<Vec<String>>> for Layout {
    type Error = LayoutError;

    fn try_from(value: Vec<Vec<String>>) -> Result<Self, Self::Error> {
        Layout::from_tokens(&value)
    }
}

impl From<Layout> for Vec<Vec<String>> {
    fn from(layout: Layout) -> Self {
        layout.to_tokens()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    WrongPileCount { found: usize },
    UnknownToken {
        pile: usize,
        card: usize,
        token: String,
    },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::WrongPileCount { found } => {
                write!(f, "expected {PILE_COUNT} piles but found {found}")
            }
            LayoutError::UnknownToken { pile, card, token } => {
                write!(f, "unknown card '{token}' at pile {pile}, card {card}")
            }
        }
    }
}

impl std::error::Error for LayoutError {}

#[cfg(test)]
mod tests {
    use super::{Layout, LayoutError};
    use crate::model::rank::Rank;

    #[test]
    fn sample_layout_is_a_full_deal() {
        let layout = Layout::sample();
        assert_eq!(layout.card_count(), 52);
        assert_eq!(layout.piles()[0][0], Rank::Ace);
        assert_eq!(layout.piles()[3].last(), Some(&Rank::Three));
    }

    #[test]
    fn rejects_wrong_pile_count() {
        let err = Layout::from_tokens(&[vec!["a"], vec!["2"]]).unwrap_err();
        assert_eq!(err, LayoutError::WrongPileCount { found: 2 });
    }

    #[test]
    fn reports_position_of_unknown_token() {
        let piles = vec![vec!["a"], vec!["2", "zz"], vec![], vec![]];
        let err = Layout::from_tokens(&piles).unwrap_err();
        assert_eq!(
            err,
            LayoutError::UnknownToken {
                pile: 1,
                card: 1,
                token: "zz".to_string()
            }
        );
    }

    #[test]
    fn json_uses_card_tokens() {
        let json = r#"[["a","10"],["k"],[],["q","j"]]"#;
        let layout: Layout = serde_json::from_str(json).unwrap();
        assert_eq!(layout.piles()[0], vec![Rank::Ace, Rank::Ten]);
        assert_eq!(serde_json::to_string(&layout).unwrap(), json);
    }

    #[test]
    fn json_with_bad_token_fails() {
        let json = r#"[["a"],["x"],[],[]]"#;
        assert!(serde_json::from_str::<Layout>(json).is_err());
    }
}

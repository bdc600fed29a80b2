use crate::model::rank::Rank;

/// Score at which a game is won.
pub const WIN_SCORE: u32 = 61;
/// Highest running count a hand may reach.
pub const COUNT_LIMIT: u32 = 31;
pub const FIFTEEN: u32 = 15;

const JACK_OPENER: u32 = 2;
const COUNT_BONUS: u32 = 2;
const PAIR: u32 = 2;
const THREE_OF_A_KIND: u32 = 6;
const FOUR_OF_A_KIND: u32 = 12;

pub fn capped_sum(cards: &[Rank]) -> u32 {
    cards.iter().map(|rank| u32::from(rank.capped_value())).sum()
}

/// Points earned by the most recently played card. `hand` already contains
/// that card as its last element.
///
/// Runs and sets are checked longest first and the first match wins, so a
/// pair inside a longer run or set is not scored on its own. The 15/31 bonus
/// is added on top of whatever matched.
pub fn score_latest_card(hand: &[Rank]) -> u32 {
    match hand {
        [] => return 0,
        [only] => {
            return if *only == Rank::Jack { JACK_OPENER } else { 0 };
        }
        _ => {}
    }

    let total = capped_sum(hand);
    let base = if total == FIFTEEN || total == COUNT_LIMIT {
        COUNT_BONUS
    } else {
        0
    };

    for length in (5..=7).rev() {
        if hand.len() >= length && is_run(tail(hand, length)) {
            return base + length as u32;
        }
    }

    if hand.len() >= 4 {
        let last = tail(hand, 4);
        if all_equal(last) {
            return base + FOUR_OF_A_KIND;
        }
        if is_run(last) {
            return base + 4;
        }
    }

    if hand.len() >= 3 {
        let last = tail(hand, 3);
        if all_equal(last) {
            return base + THREE_OF_A_KIND;
        }
        if is_run(last) {
            return base + 3;
        }
    }

    if all_equal(tail(hand, 2)) {
        base + PAIR
    } else {
        base
    }
}

/// True when the ranks are pairwise distinct and consecutive in any order.
pub fn is_run(cards: &[Rank]) -> bool {
    if cards.is_empty() {
        return false;
    }

    let mut seen = [false; 14];
    for rank in cards {
        let slot = usize::from(rank.value());
        if seen[slot] {
            return false;
        }
        seen[slot] = true;
    }

    let count = cards.len() as u32;
    let min = cards
        .iter()
        .map(|rank| u32::from(rank.value()))
        .min()
        .unwrap_or(0);
    let sum: u32 = cards.iter().map(|rank| u32::from(rank.value())).sum();
    sum == count * (count + 1) / 2 + (min - 1) * count
}

fn tail(hand: &[Rank], length: usize) -> &[Rank] {
    &hand[hand.len() - length..]
}

fn all_equal(cards: &[Rank]) -> bool {
    cards.windows(2).all(|pair| pair[0] == pair[1])
}

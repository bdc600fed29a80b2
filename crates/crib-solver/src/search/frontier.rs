use crib_core::game::state::GameState;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Max-score priority queue of pending states. Among equal scores the state
/// pushed first is popped first, which keeps searches reproducible.
#[derive(Debug, Default)]
pub struct Frontier {
    heap: BinaryHeap<Entry>,
    next_seq: u64,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, state: GameState) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry {
            score: state.score(),
            seq,
            state,
        });
    }

    pub fn pop(&mut self) -> Option<GameState> {
        self.heap.pop().map(|entry| entry.state)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[derive(Debug)]
struct Entry {
    score: u32,
    seq: u64,
    state: GameState,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .cmp(&other.score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

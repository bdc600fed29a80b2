use crib_core::game::state::{GameState, replay};
use crib_core::model::deck::Deck;
use crib_core::model::layout::Layout;
use crib_core::model::moves::Move;
use crib_solver::{PlanError, Planner, SearchBudgets};

fn layout(piles: [&[&str]; 4]) -> Layout {
    let tokens: Vec<Vec<&str>> = piles.iter().map(|pile| pile.to_vec()).collect();
    Layout::from_tokens(&tokens).expect("valid layout")
}

fn planner(win: usize, loss: usize) -> Planner {
    Planner::new(SearchBudgets { win, loss })
}

#[test]
fn winnable_layout_plans_a_win_without_fallback() {
    let start = GameState::new(&layout([&["5"; 12], &[], &[], &[]]));
    let plan = planner(1_000, 100).plan(&start).expect("plan");
    assert!(plan.won);
    assert!(plan.loss_stats.is_none());
    assert!(plan.score() >= 61);
    assert_eq!(plan.moves().iter().filter(|m| m.is_reset()).count(), 1);
}

#[test]
fn unwinnable_layout_falls_back_to_a_losing_line() {
    let start = GameState::new(&layout([&["5", "k"], &["10"], &["9", "2"], &[]]));
    let plan = planner(10_000, 100).plan(&start).expect("plan");
    assert!(!plan.won);
    assert!(plan.final_state.is_lost());
    assert!(plan.loss_stats.is_some());

    let replayed = replay(&start, plan.moves()).expect("plan replays");
    assert_eq!(replayed.key(), plan.final_state.key());
    assert!(replayed.is_lost());
}

#[test]
fn fallback_continues_from_best_state_history() {
    let start = GameState::new(&layout([&["5"], &["5"], &["9"], &[]]));
    let plan = planner(1_000, 100).plan(&start).expect("plan");
    // best state was 5,5 (pair); the fallback only had to add the nine
    assert_eq!(
        plan.moves(),
        &[Move::play(0, 0), Move::play(1, 0), Move::play(2, 0)]
    );
    assert_eq!(plan.score(), 2);
}

#[test]
fn starved_fallback_is_fatal() {
    let start = GameState::new(&Layout::sample());
    let err = planner(2, 2).plan(&start).expect_err("no terminal within two expansions");
    let PlanError::NoResetLine { expanded, .. } = err;
    assert_eq!(expanded, 4);
}

#[test]
fn seeded_deals_produce_replayable_plans() {
    for seed in [3u64, 11, 29] {
        let layout = Deck::shuffled_with_seed(seed).deal();
        let start = GameState::new(&layout);
        match planner(3_000, 20_000).plan(&start) {
            Ok(plan) => {
                assert!(plan.final_state.is_terminal());
                assert_eq!(plan.won, plan.final_state.is_won());
                let replayed = replay(&start, plan.moves()).expect("plan replays");
                assert_eq!(replayed.score(), plan.score());
            }
            Err(PlanError::NoResetLine { best_score, .. }) => {
                assert!(best_score < 61);
            }
        }
    }
}

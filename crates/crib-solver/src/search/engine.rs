use super::frontier::Frontier;
use crib_core::game::state::{GameState, StateKey};
use std::collections::HashSet;
use tracing::{Level, event};

const PROGRESS_INTERVAL: usize = 10_000;

/// What counts as success for a search run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchGoal {
    /// Stop at the first won state; otherwise report the best state seen.
    Win,
    /// Stop at the first terminal state, won or lost. Used to find a line
    /// that ends the game so the table can be reset.
    AcceptLoss,
}

impl SearchGoal {
    pub const fn label(self) -> &'static str {
        match self {
            SearchGoal::Win => "win",
            SearchGoal::AcceptLoss => "accept_loss",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// States dequeued and counted against the budget.
    pub expanded: usize,
    pub enqueued: usize,
    /// Children or dequeued states dropped because their position was
    /// already expanded.
    pub duplicates: usize,
    pub budget_exhausted: bool,
    pub best_score: u32,
}

#[derive(Debug, Clone)]
pub struct Solution {
    pub state: GameState,
    pub stats: SearchStats,
}

#[derive(Debug, Clone)]
pub enum SearchOutcome {
    Won(Solution),
    AcceptedLoss(Solution),
    /// Win-seeking run that ran out of budget or states; carries the highest
    /// scoring state expanded.
    BestEffort(Solution),
    /// Loss-seeking run that found no terminal state.
    Exhausted(SearchStats),
}

impl SearchOutcome {
    pub fn stats(&self) -> &SearchStats {
        match self {
            SearchOutcome::Won(solution)
            | SearchOutcome::AcceptedLoss(solution)
            | SearchOutcome::BestEffort(solution) => &solution.stats,
            SearchOutcome::Exhausted(stats) => stats,
        }
    }

    pub fn state(&self) -> Option<&GameState> {
        match self {
            SearchOutcome::Won(solution)
            | SearchOutcome::AcceptedLoss(solution)
            | SearchOutcome::BestEffort(solution) => Some(&solution.state),
            SearchOutcome::Exhausted(_) => None,
        }
    }

    pub fn is_won(&self) -> bool {
        matches!(self, SearchOutcome::Won(_))
    }

    pub const fn label(&self) -> &'static str {
        match self {
            SearchOutcome::Won(_) => "won",
            SearchOutcome::AcceptedLoss(_) => "accepted_loss",
            SearchOutcome::BestEffort(_) => "best_effort",
            SearchOutcome::Exhausted(_) => "exhausted",
        }
    }
}

/// Best-first search over game states from a fixed starting position.
///
/// States are expanded in descending score order. A position (piles, hand,
/// score) is expanded at most once no matter how many move orders reach it;
/// the move history kept is that of the first path to get there.
#[derive(Debug, Clone)]
pub struct Solver {
    initial: GameState,
}

impl Solver {
    pub fn new(initial: GameState) -> Self {
        Self { initial }
    }

    /// Runs until the goal is met, the frontier empties, or `budget` states
    /// have been dequeued. The dequeue that reaches the budget stops the run
    /// without expanding that state.
    pub fn run(&self, goal: SearchGoal, budget: usize) -> SearchOutcome {
        let mut stats = SearchStats {
            best_score: self.initial.score(),
            ..SearchStats::default()
        };

        if self.initial.is_won() {
            return finish(goal, SearchOutcome::Won(solution(self.initial.clone(), stats)));
        }
        if self.initial.is_lost() {
            let outcome = match goal {
                SearchGoal::AcceptLoss => {
                    SearchOutcome::AcceptedLoss(solution(self.initial.clone(), stats))
                }
                SearchGoal::Win => SearchOutcome::BestEffort(solution(self.initial.clone(), stats)),
            };
            return finish(goal, outcome);
        }

        let mut frontier = Frontier::new();
        let mut visited: HashSet<StateKey> = HashSet::new();
        let mut best = self.initial.clone();

        frontier.push(self.initial.clone());
        stats.enqueued = 1;

        while let Some(state) = frontier.pop() {
            if !visited.insert(state.key()) {
                stats.duplicates += 1;
                continue;
            }

            stats.expanded += 1;
            if stats.expanded >= budget {
                stats.budget_exhausted = true;
                event!(
                    target: "crib_solver::search",
                    Level::WARN,
                    goal = goal.label(),
                    budget,
                    best_score = best.score(),
                    "search budget exhausted"
                );
                break;
            }

            if state.score() > best.score() {
                best = state.clone();
                stats.best_score = best.score();
            }

            if stats.expanded % PROGRESS_INTERVAL == 0 {
                event!(
                    target: "crib_solver::search",
                    Level::DEBUG,
                    goal = goal.label(),
                    expanded = stats.expanded,
                    frontier = frontier.len(),
                    score = state.score(),
                    best_score = best.score(),
                    "search progress"
                );
            }

            for mv in state.legal_moves() {
                debug_assert!(state.is_legal(mv), "generated illegal move {mv}");
                let next = state.apply_move(mv);

                if next.is_won() {
                    stats.best_score = next.score();
                    return finish(goal, SearchOutcome::Won(solution(next, stats)));
                }

                if next.is_lost() {
                    match goal {
                        SearchGoal::AcceptLoss => {
                            return finish(goal, SearchOutcome::AcceptedLoss(solution(next, stats)));
                        }
                        SearchGoal::Win => continue,
                    }
                }

                if visited.contains(&next.key()) {
                    stats.duplicates += 1;
                    continue;
                }

                frontier.push(next);
                stats.enqueued += 1;
            }
        }

        let outcome = match goal {
            SearchGoal::Win => SearchOutcome::BestEffort(solution(best, stats)),
            SearchGoal::AcceptLoss => SearchOutcome::Exhausted(stats),
        };
        finish(goal, outcome)
    }
}

fn solution(state: GameState, stats: SearchStats) -> Solution {
    Solution { state, stats }
}

fn finish(goal: SearchGoal, outcome: SearchOutcome) -> SearchOutcome {
    if tracing::enabled!(Level::INFO) {
        let stats = outcome.stats();
        event!(
            target: "crib_solver::search",
            Level::INFO,
            goal = goal.label(),
            outcome = outcome.label(),
            expanded = stats.expanded,
            enqueued = stats.enqueued,
            duplicates = stats.duplicates,
            budget_exhausted = stats.budget_exhausted,
            best_score = stats.best_score,
            moves = outcome.state().map(|state| state.history().len()).unwrap_or(0),
            "search finished"
        );
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crib_core::game::state::replay;
    use crib_core::model::layout::Layout;
    use crib_core::model::moves::Move;

    fn layout(piles: [&[&str]; 4]) -> Layout {
        let tokens: Vec<Vec<&str>> = piles.iter().map(|pile| pile.to_vec()).collect();
        Layout::from_tokens(&tokens).expect("valid layout")
    }

    fn twelve_fives() -> Layout {
        layout([&["5"; 12], &[], &[], &[]])
    }

    fn converging() -> GameState {
        GameState::new(&layout([&["5"], &["5"], &["9"], &[]]))
    }

    #[test]
    fn finds_forced_win_and_history_replays() {
        let start = GameState::new(&twelve_fives());
        let outcome = Solver::new(start.clone()).run(SearchGoal::Win, 1_000);
        let SearchOutcome::Won(solution) = outcome else {
            panic!("expected a win");
        };

        assert_eq!(solution.state.score(), 68);
        assert_eq!(solution.state.history().len(), 11);
        assert_eq!(solution.state.history()[6], Move::Reset);
        assert_eq!(solution.state.history()[0], Move::play(0, 11));

        let replayed = replay(&start, solution.state.history()).expect("history replays");
        assert_eq!(replayed.key(), solution.state.key());
    }

    #[test]
    fn equivalent_positions_expand_once() {
        let outcome = Solver::new(converging()).run(SearchGoal::Win, 1_000);
        let SearchOutcome::BestEffort(solution) = outcome else {
            panic!("no win is reachable");
        };

        assert_eq!(solution.stats.expanded, 9);
        assert_eq!(solution.stats.duplicates, 1);
        assert_eq!(solution.stats.enqueued, 9);
        assert!(!solution.stats.budget_exhausted);
        assert_eq!(solution.state.score(), 2);
        assert_eq!(
            solution.state.history(),
            &[Move::play(0, 0), Move::play(1, 0)]
        );
    }

    #[test]
    fn loss_goal_accepts_first_terminal() {
        let outcome = Solver::new(converging()).run(SearchGoal::AcceptLoss, 1_000);
        let SearchOutcome::AcceptedLoss(solution) = outcome else {
            panic!("expected a losing line");
        };
        assert!(solution.state.is_lost());
        assert_eq!(
            solution.state.history(),
            &[Move::play(0, 0), Move::play(1, 0), Move::play(2, 0)]
        );
        assert_eq!(solution.stats.expanded, 3);
    }

    #[test]
    fn loss_goal_still_takes_a_win() {
        let outcome =
            Solver::new(GameState::new(&twelve_fives())).run(SearchGoal::AcceptLoss, 1_000);
        assert!(outcome.is_won());
    }

    #[test]
    fn budget_of_one_returns_start() {
        let start = GameState::new(&Layout::sample());
        let outcome = Solver::new(start.clone()).run(SearchGoal::Win, 1);
        let SearchOutcome::BestEffort(solution) = outcome else {
            panic!("budget should stop the search");
        };
        assert!(solution.stats.budget_exhausted);
        assert_eq!(solution.stats.expanded, 1);
        assert_eq!(solution.state, start);
    }

    #[test]
    fn loss_goal_out_of_budget_is_exhausted() {
        let outcome = Solver::new(GameState::new(&Layout::sample())).run(SearchGoal::AcceptLoss, 2);
        match outcome {
            SearchOutcome::Exhausted(stats) => {
                assert!(stats.budget_exhausted);
                assert_eq!(stats.expanded, 2);
            }
            other => panic!("expected exhaustion, got {}", other.label()),
        }
    }

    #[test]
    fn lost_start_is_accepted_without_moves() {
        let start = GameState::new(&layout([&[], &[], &[], &[]]));
        let outcome = Solver::new(start).run(SearchGoal::AcceptLoss, 10);
        let SearchOutcome::AcceptedLoss(solution) = outcome else {
            panic!("empty table is already lost");
        };
        assert!(solution.state.history().is_empty());
        assert_eq!(solution.stats.expanded, 0);
    }

    #[test]
    fn search_is_deterministic() {
        let start = GameState::new(&Layout::sample());
        let first = Solver::new(start.clone()).run(SearchGoal::Win, 2_000);
        let second = Solver::new(start).run(SearchGoal::Win, 2_000);
        assert_eq!(first.stats(), second.stats());
        assert_eq!(
            first.state().map(|s| s.history().to_vec()),
            second.state().map(|s| s.history().to_vec())
        );
    }
}

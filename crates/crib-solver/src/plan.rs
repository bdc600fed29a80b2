use crate::search::{SearchGoal, SearchOutcome, SearchStats, Solver};
use crib_core::game::state::GameState;
use crib_core::model::moves::Move;
use core::fmt;
use tracing::{Level, event};

pub const DEFAULT_WIN_BUDGET: usize = 1_000_000;
/// The best state of a failed win search is usually close to the end of the
/// game, so the fallback only needs a short local search.
pub const DEFAULT_LOSS_BUDGET: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBudgets {
    pub win: usize,
    pub loss: usize,
}

impl Default for SearchBudgets {
    fn default() -> Self {
        Self {
            win: DEFAULT_WIN_BUDGET,
            loss: DEFAULT_LOSS_BUDGET,
        }
    }
}

impl SearchBudgets {
    /// Reads `CRIB_WIN_BUDGET` and `CRIB_LOSS_BUDGET`; missing or invalid
    /// values keep their defaults.
    pub fn from_env() -> Self {
        Self::from_reader(|key| std::env::var(key).ok())
    }

    fn from_reader<F>(mut read: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let parse = |raw: Option<String>| {
            raw.and_then(|value| value.trim().parse::<usize>().ok())
                .filter(|value| *value > 0)
        };
        Self {
            win: parse(read("CRIB_WIN_BUDGET")).unwrap_or(defaults.win),
            loss: parse(read("CRIB_LOSS_BUDGET")).unwrap_or(defaults.loss),
        }
    }
}

/// Result of planning one game: the state the moves lead to, and whether
/// that state is a win.
#[derive(Debug, Clone)]
pub struct Plan {
    pub final_state: GameState,
    pub won: bool,
    pub win_stats: SearchStats,
    /// Present when the loss-seeking fallback ran.
    pub loss_stats: Option<SearchStats>,
}

impl Plan {
    pub fn moves(&self) -> &[Move] {
        self.final_state.history()
    }

    pub fn score(&self) -> u32 {
        self.final_state.score()
    }

    pub fn expanded(&self) -> usize {
        self.win_stats.expanded + self.loss_stats.map(|stats| stats.expanded).unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    /// Neither a win nor any finished game was found, so there is no safe
    /// way to get the table back to a new deal.
    NoResetLine { best_score: u32, expanded: usize },
}

impl fmt::Display for PlanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanError::NoResetLine {
                best_score,
                expanded,
            } => write!(
                f,
                "no losing line found to reset the game \
                 (best score {best_score}, {expanded} states expanded)"
            ),
        }
    }
}

impl std::error::Error for PlanError {}

/// Win-seeking search with a loss-seeking fallback from the best state found.
#[derive(Debug, Clone, Copy, Default)]
pub struct Planner {
    budgets: SearchBudgets,
}

impl Planner {
    pub fn new(budgets: SearchBudgets) -> Self {
        Self { budgets }
    }

    pub fn budgets(&self) -> SearchBudgets {
        self.budgets
    }

    pub fn plan(&self, initial: &GameState) -> Result<Plan, PlanError> {
        let outcome = Solver::new(initial.clone()).run(SearchGoal::Win, self.budgets.win);
        let win_stats = *outcome.stats();

        let best = match outcome {
            SearchOutcome::Won(solution) => {
                return Ok(Plan {
                    final_state: solution.state,
                    won: true,
                    win_stats,
                    loss_stats: None,
                });
            }
            SearchOutcome::AcceptedLoss(solution) => {
                return Ok(Plan {
                    final_state: solution.state,
                    won: false,
                    win_stats,
                    loss_stats: None,
                });
            }
            SearchOutcome::BestEffort(solution) => solution.state,
            SearchOutcome::Exhausted(stats) => {
                return Err(PlanError::NoResetLine {
                    best_score: stats.best_score,
                    expanded: stats.expanded,
                });
            }
        };

        event!(
            target: "crib_solver::plan",
            Level::INFO,
            best_score = best.score(),
            remaining = best.remaining_cards(),
            budget = self.budgets.loss,
            state = %best,
            "no win found; searching for a line that ends the game"
        );

        let fallback = Solver::new(best).run(SearchGoal::AcceptLoss, self.budgets.loss);
        let loss_stats = Some(*fallback.stats());
        match fallback {
            SearchOutcome::Won(solution) => Ok(Plan {
                final_state: solution.state,
                won: true,
                win_stats,
                loss_stats,
            }),
            SearchOutcome::AcceptedLoss(solution) | SearchOutcome::BestEffort(solution) => {
                Ok(Plan {
                    won: solution.state.is_won(),
                    final_state: solution.state,
                    win_stats,
                    loss_stats,
                })
            }
            SearchOutcome::Exhausted(stats) => Err(PlanError::NoResetLine {
                best_score: win_stats.best_score,
                expanded: win_stats.expanded + stats.expanded,
            }),
        }
    }
}

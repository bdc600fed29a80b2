pub mod plan;
pub mod search;

pub use plan::{Plan, PlanError, Planner, SearchBudgets};
pub use search::{Frontier, SearchGoal, SearchOutcome, SearchStats, Solution, Solver};

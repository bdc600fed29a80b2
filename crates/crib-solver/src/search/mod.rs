mod engine;
mod frontier;

pub use engine::{SearchGoal, SearchOutcome, SearchStats, Solution, Solver};
pub use frontier::Frontier;

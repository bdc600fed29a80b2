use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crib_core::game::serialization::PlanSnapshot;
use crib_core::game::state::GameState;
use crib_core::model::layout::Layout;
use crib_solver::{Plan, PlanError, Planner};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

use crate::automation::{self, Automation, AutomationError};
use crate::config::{ResolvedOutputs, RunConfig};
use crate::perception::{self, LayoutSource, PerceptionError};

/// Plays the configured number of games: perceive, plan, click, log.
pub struct GameRunner {
    config: RunConfig,
    outputs: ResolvedOutputs,
    planner: Planner,
}

/// Summary details returned after a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub games_played: usize,
    pub games_won: usize,
    pub games_lost: usize,
    pub jsonl_path: PathBuf,
    pub plans_dir: Option<PathBuf>,
}

/// One JSONL row per game played.
#[derive(Debug, Clone, Serialize)]
pub struct GameLogRow {
    pub run_id: String,
    pub game_id: String,
    pub slot: usize,
    pub retry: usize,
    pub won: bool,
    pub score: u32,
    pub moves: usize,
    pub resets: usize,
    pub remaining_cards: usize,
    pub win_expanded: usize,
    pub loss_expanded: Option<usize>,
    pub elapsed_ms: u64,
}

impl GameRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: RunConfig, outputs: ResolvedOutputs) -> Self {
        let planner = Planner::new(config.search.budgets());
        Self {
            config,
            outputs,
            planner,
        }
    }

    /// Runs against the collaborators the configuration names.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        let mut source = perception::source_from_config(&self.config.layout);
        let mut driver = automation::driver_from_config(&self.config.automation);
        self.run_with(source.as_mut(), driver.as_mut())
    }

    /// Execute every game slot, streaming JSONL rows to disk.
    pub fn run_with(
        &self,
        source: &mut dyn LayoutSource,
        automation: &mut dyn Automation,
    ) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        if let Some(dir) = &self.outputs.plans_dir {
            fs::create_dir_all(dir)?;
        }

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let games = &self.config.games;
        let budgets = self.planner.budgets();

        event!(
            target: "crib_runner::runner",
            Level::INFO,
            run_id = %self.config.run_id,
            source = source.name(),
            attempts = games.attempts,
            until_won = games.until_won,
            win_budget = budgets.win,
            loss_budget = budgets.loss,
            "run started"
        );

        let mut played = 0usize;
        let mut won = 0usize;

        for slot in 0..games.attempts {
            let mut retry = 0usize;
            loop {
                // the window already shows a fresh deal for the first game
                if played > 0 {
                    automation.new_game()?;
                }

                let game_id = format!("G{slot:04}_R{retry:02}");
                let layout = source.next_layout(played)?;
                let start = Instant::now();
                let plan = self.play_game(&game_id, &layout, automation)?;
                let elapsed_ms = start.elapsed().as_millis() as u64;

                self.write_row(&mut writer, &game_id, slot, retry, &plan, elapsed_ms)?;
                if let Some(dir) = &self.outputs.plans_dir {
                    write_snapshot(dir, &game_id, &layout, &plan.final_state)?;
                }

                played += 1;
                if plan.won {
                    won += 1;
                }

                event!(
                    target: "crib_runner::runner",
                    Level::INFO,
                    game_id = %game_id,
                    won = plan.won,
                    score = plan.score(),
                    moves = plan.moves().len(),
                    elapsed_ms,
                    "game finished"
                );

                retry += 1;
                if plan.won || !games.until_won || retry >= games.max_retries {
                    break;
                }
            }
        }

        writer.flush()?;

        let summary = RunSummary {
            games_played: played,
            games_won: won,
            games_lost: played - won,
            jsonl_path: self.outputs.jsonl.clone(),
            plans_dir: self.outputs.plans_dir.clone(),
        };
        event!(
            target: "crib_runner::runner",
            Level::INFO,
            run_id = %self.config.run_id,
            played = summary.games_played,
            won = summary.games_won,
            lost = summary.games_lost,
            "run complete"
        );
        Ok(summary)
    }

    fn play_game(
        &self,
        game_id: &str,
        layout: &Layout,
        automation: &mut dyn Automation,
    ) -> Result<Plan, RunnerError> {
        let initial = GameState::new(layout).with_target(self.config.search.win_threshold);
        event!(
            target: "crib_runner::runner",
            Level::DEBUG,
            game_id,
            state = %initial,
            "initial state"
        );
        let plan = self
            .planner
            .plan(&initial)
            .map_err(|source| RunnerError::NoResetLine {
                game_id: game_id.to_string(),
                source,
            })?;
        automation::execute_plan(automation, plan.moves())?;
        Ok(plan)
    }

    fn write_row(
        &self,
        writer: &mut BufWriter<File>,
        game_id: &str,
        slot: usize,
        retry: usize,
        plan: &Plan,
        elapsed_ms: u64,
    ) -> Result<(), RunnerError> {
        let row = GameLogRow {
            run_id: self.config.run_id.clone(),
            game_id: game_id.to_string(),
            slot,
            retry,
            won: plan.won,
            score: plan.score(),
            moves: plan.moves().len(),
            resets: plan.moves().iter().filter(|mv| mv.is_reset()).count(),
            remaining_cards: plan.final_state.remaining_cards(),
            win_expanded: plan.win_stats.expanded,
            loss_expanded: plan.loss_stats.map(|stats| stats.expanded),
            elapsed_ms,
        };
        serde_json::to_writer(&mut *writer, &row)?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn write_snapshot(
    dir: &Path,
    game_id: &str,
    layout: &Layout,
    final_state: &GameState,
) -> Result<(), RunnerError> {
    let snapshot = PlanSnapshot::capture(layout, final_state);
    fs::write(dir.join(format!("{game_id}.json")), snapshot.to_json()?)?;
    Ok(())
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("perception failed: {0}")]
    Perception(#[from] PerceptionError),
    #[error("automation failed: {0}")]
    Automation(#[from] AutomationError),
    #[error("game {game_id}: {source}")]
    NoResetLine {
        game_id: String,
        #[source]
        source: PlanError,
    },
}

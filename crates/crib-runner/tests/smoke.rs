use std::fs;
use std::path::Path;

use crib_core::game::serialization::PlanSnapshot;
use crib_core::model::layout::Layout;
use crib_runner::automation::DryRunAutomation;
use crib_runner::config::RunConfig;
use crib_runner::perception::{FixedLayout, LayoutSource, PerceptionError};
use crib_runner::runner::{GameRunner, RunnerError};
use tempfile::tempdir;

const WINNABLE: &str = r#"[["5","5","5","5","5","5","5","5","5","5","5","5"],[],[],[]]"#;
const UNWINNABLE: &str = r#"[["5","k"],["10"],["9","2"],[]]"#;

fn load_config(output_dir: &Path, layout_json: &str, extra: &str) -> RunConfig {
    let layout_path = output_dir.join("layout.json");
    fs::write(&layout_path, layout_json).expect("write layout");

    let yaml = format!(
        r#"
run_id: "test_smoke"
search:
  win_budget: 10000
  loss_budget: 100
layout:
  source: "file"
  path: "{layout}"
outputs:
  jsonl: "{jsonl}"
  plans_dir: "{plans}"
{extra}
"#,
        layout = layout_path.display(),
        jsonl = output_dir.join("games.jsonl").display(),
        plans = output_dir.join("plans").display(),
    );

    let mut cfg: RunConfig = serde_yaml::from_str(&yaml).expect("valid yaml");
    cfg.validate().expect("config validates");
    cfg
}

fn read_rows(path: &Path) -> Vec<serde_json::Value> {
    fs::read_to_string(path)
        .expect("jsonl readable")
        .lines()
        .map(|line| serde_json::from_str(line).expect("row decodes to JSON"))
        .collect()
}

fn parse(json: &str) -> Layout {
    serde_json::from_str(json).expect("layout json")
}

#[test]
fn winning_games_are_logged_and_snapshotted() {
    let dir = tempdir().expect("temp dir");
    let config = load_config(dir.path(), WINNABLE, "games:\n  attempts: 3");
    let outputs = config.resolved_outputs();

    let runner = GameRunner::new(config, outputs);
    let summary = runner.run().expect("run completes");

    assert_eq!(summary.games_played, 3);
    assert_eq!(summary.games_won, 3);
    assert_eq!(summary.games_lost, 0);

    let rows = read_rows(&summary.jsonl_path);
    assert_eq!(rows.len(), 3);
    for (slot, row) in rows.iter().enumerate() {
        assert_eq!(row["run_id"], "test_smoke");
        assert_eq!(row["game_id"], format!("G{slot:04}_R00"));
        assert_eq!(row["won"], true);
        assert_eq!(row["resets"], 1);
        assert!(row["score"].as_u64().expect("score") >= 61);
        assert!(row["loss_expanded"].is_null());
    }

    let plans_dir = summary.plans_dir.expect("plans dir configured");
    let snapshot_json = fs::read_to_string(plans_dir.join("G0001_R00.json")).expect("snapshot");
    let snapshot = PlanSnapshot::from_json(&snapshot_json).expect("snapshot decodes");
    assert!(snapshot.won);
    let replayed = snapshot.verify().expect("snapshot replays");
    assert_eq!(replayed.score(), snapshot.final_score);
}

#[test]
fn new_game_is_clicked_between_games_only() {
    let dir = tempdir().expect("temp dir");
    let config = load_config(dir.path(), WINNABLE, "games:\n  attempts: 3");
    let outputs = config.resolved_outputs();
    let runner = GameRunner::new(config, outputs);

    let mut source = FixedLayout::new(parse(WINNABLE));
    let mut automation = DryRunAutomation::default();
    runner
        .run_with(&mut source, &mut automation)
        .expect("run completes");

    assert_eq!(automation.new_game_count(), 2);
    assert!(!matches!(
        automation.actions().last(),
        Some(crib_runner::automation::Action::NewGame)
    ));
}

#[test]
fn losing_slot_is_retried_until_max_retries() {
    let dir = tempdir().expect("temp dir");
    let config = load_config(
        dir.path(),
        UNWINNABLE,
        "games:\n  attempts: 2\n  until_won: true\n  max_retries: 2",
    );
    let outputs = config.resolved_outputs();

    let summary = GameRunner::new(config, outputs)
        .run()
        .expect("run completes");
    assert_eq!(summary.games_played, 4);
    assert_eq!(summary.games_lost, 4);

    let ids: Vec<String> = read_rows(&summary.jsonl_path)
        .iter()
        .map(|row| row["game_id"].as_str().expect("game id").to_string())
        .collect();
    assert_eq!(ids, ["G0000_R00", "G0000_R01", "G0001_R00", "G0001_R01"]);
}

/// Deals a losing layout first and a winning one afterwards.
struct LoseThenWin {
    calls: Vec<usize>,
}

impl LayoutSource for LoseThenWin {
    fn name(&self) -> &str {
        "lose-then-win"
    }

    fn next_layout(&mut self, attempt: usize) -> Result<Layout, PerceptionError> {
        self.calls.push(attempt);
        Ok(parse(if attempt == 0 { UNWINNABLE } else { WINNABLE }))
    }
}

#[test]
fn until_won_stops_retrying_after_a_win() {
    let dir = tempdir().expect("temp dir");
    let config = load_config(
        dir.path(),
        WINNABLE,
        "games:\n  attempts: 1\n  until_won: true\n  max_retries: 5",
    );
    let outputs = config.resolved_outputs();
    let runner = GameRunner::new(config, outputs);

    let mut source = LoseThenWin { calls: Vec::new() };
    let mut automation = DryRunAutomation::default();
    let summary = runner
        .run_with(&mut source, &mut automation)
        .expect("run completes");

    assert_eq!(source.calls, vec![0, 1]);
    assert_eq!(summary.games_won, 1);
    assert_eq!(summary.games_lost, 1);
    assert_eq!(automation.new_game_count(), 1);
}

#[test]
fn starved_planner_aborts_the_run() {
    let dir = tempdir().expect("temp dir");
    let mut config = load_config(dir.path(), WINNABLE, "");
    config.search.win_budget = Some(2);
    config.search.loss_budget = Some(2);
    let outputs = config.resolved_outputs();

    let mut source = FixedLayout::sample();
    let mut automation = DryRunAutomation::default();
    let err = GameRunner::new(config, outputs)
        .run_with(&mut source, &mut automation)
        .expect_err("no reset line within budget");

    match err {
        RunnerError::NoResetLine { game_id, .. } => assert_eq!(game_id, "G0000_R00"),
        other => panic!("unexpected error {other}"),
    }
    assert!(automation.actions().is_empty());
}

#[test]
fn perception_failure_aborts_the_run() {
    let dir = tempdir().expect("temp dir");
    let config = load_config(dir.path(), WINNABLE, "");
    fs::remove_file(dir.path().join("layout.json")).expect("remove layout");
    let outputs = config.resolved_outputs();

    let err = GameRunner::new(config, outputs)
        .run()
        .expect_err("layout file missing");
    assert!(matches!(err, RunnerError::Perception(PerceptionError::Read { .. })));
}

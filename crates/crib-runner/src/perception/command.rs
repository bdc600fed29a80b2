use std::process::{Command, Stdio};
use std::time::Instant;

use crib_core::model::layout::Layout;
use tracing::{Level, event};

use super::{LayoutSource, PerceptionError};

/// Runs an external screen recogniser and reads one JSON layout (four lists
/// of card tokens) from its stdout. The game index is passed in
/// `CRIB_ATTEMPT`.
#[derive(Debug, Clone)]
pub struct CommandLayout {
    program: String,
    args: Vec<String>,
}

impl CommandLayout {
    pub fn new(program: String, args: Vec<String>) -> Self {
        Self { program, args }
    }
}

impl LayoutSource for CommandLayout {
    fn name(&self) -> &str {
        "command"
    }

    fn next_layout(&mut self, attempt: usize) -> Result<Layout, PerceptionError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .env("CRIB_ATTEMPT", attempt.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let start = Instant::now();
        let output = cmd.output().map_err(|err| PerceptionError::Spawn {
            program: self.program.clone(),
            message: err.to_string(),
        })?;

        if !output.status.success() {
            return Err(PerceptionError::Status {
                program: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let layout: Layout =
            serde_json::from_slice(&output.stdout).map_err(|err| PerceptionError::Malformed {
                source_name: self.program.clone(),
                message: err.to_string(),
            })?;

        event!(
            target: "crib_runner::perception",
            Level::DEBUG,
            program = %self.program,
            attempt,
            cards = layout.card_count(),
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "layout recognised"
        );
        Ok(layout)
    }
}

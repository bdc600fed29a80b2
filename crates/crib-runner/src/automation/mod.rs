mod command;
mod dry_run;

pub use command::CommandAutomation;
pub use dry_run::DryRunAutomation;

use std::thread;
use std::time::Duration;

use crib_core::model::moves::Move;
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

use crate::config::{AutomationConfig, DriverKind, GeometryConfig, RetryConfig};

/// One user-interface action performed against the game window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    ClickCard { pile: usize, card: usize },
    NextStack,
    NewGame,
}

/// Drives the game window.
pub trait Automation {
    fn click_card(&mut self, pile: usize, card: usize) -> Result<(), AutomationError>;
    fn click_next_stack(&mut self) -> Result<(), AutomationError>;
    fn new_game(&mut self) -> Result<(), AutomationError>;
}

/// Maps pile/card indices and the two controls onto screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenGeometry {
    pub origin: (i32, i32),
    pub card_width: i32,
    pub card_height: i32,
    pub next_stack: (i32, i32),
    pub new_game: (i32, i32),
}

impl ScreenGeometry {
    pub fn card_position(&self, pile: usize, card: usize) -> (i32, i32) {
        (
            self.origin.0 + pile as i32 * self.card_width,
            self.origin.1 + card as i32 * self.card_height,
        )
    }

    pub fn position(&self, action: Action) -> (i32, i32) {
        match action {
            Action::ClickCard { pile, card } => self.card_position(pile, card),
            Action::NextStack => self.next_stack,
            Action::NewGame => self.new_game,
        }
    }
}

impl Default for ScreenGeometry {
    fn default() -> Self {
        Self::from(&GeometryConfig::default())
    }
}

impl From<&GeometryConfig> for ScreenGeometry {
    fn from(config: &GeometryConfig) -> Self {
        Self {
            origin: (config.origin_x, config.origin_y),
            card_width: config.card_width,
            card_height: config.card_height,
            next_stack: config.next_stack,
            new_game: config.new_game,
        }
    }
}

/// Repeats an action that can fail transiently, e.g. a control that is not
/// on screen yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub tries: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            tries: config.tries.max(1),
            delay: Duration::from_millis(config.delay_ms),
        }
    }
}

impl RetryPolicy {
    pub fn run<T, F>(&self, what: &str, mut attempt: F) -> Result<T, AutomationError>
    where
        F: FnMut() -> Result<T, AutomationError>,
    {
        let tries = self.tries.max(1);
        let mut last_err = None;
        for index in 1..=tries {
            match attempt() {
                Ok(value) => return Ok(value),
                Err(err) => {
                    event!(
                        target: "crib_runner::automation",
                        Level::WARN,
                        what,
                        attempt = index,
                        tries,
                        error = %err,
                        "automation step failed"
                    );
                    last_err = Some(err);
                    if index < tries && !self.delay.is_zero() {
                        thread::sleep(self.delay);
                    }
                }
            }
        }
        Err(AutomationError::RetriesExhausted {
            what: what.to_string(),
            tries,
            last: Box::new(last_err.unwrap_or(AutomationError::Unavailable)),
        })
    }
}

#[derive(Debug, Error)]
pub enum AutomationError {
    #[error("failed to launch click command '{program}': {message}")]
    Spawn { program: String, message: String },
    #[error("click command '{program}' exited with {status}")]
    Status { program: String, status: String },
    #[error("no click command configured")]
    Unavailable,
    #[error("{what} failed after {tries} tries: {last}")]
    RetriesExhausted {
        what: String,
        tries: u32,
        #[source]
        last: Box<AutomationError>,
    },
}

/// Performs every move of a plan in order and returns the number of actions
/// issued.
pub fn execute_plan(
    automation: &mut dyn Automation,
    moves: &[Move],
) -> Result<usize, AutomationError> {
    for (step, mv) in moves.iter().enumerate() {
        event!(
            target: "crib_runner::automation",
            Level::DEBUG,
            step,
            mv = %mv,
            "executing move"
        );
        match *mv {
            Move::Play { pile, card } => automation.click_card(pile, card)?,
            Move::Reset => automation.click_next_stack()?,
        }
    }
    Ok(moves.len())
}

/// Builds the driver a validated configuration asks for.
pub fn driver_from_config(config: &AutomationConfig) -> Box<dyn Automation> {
    match config.driver {
        DriverKind::DryRun => Box::new(DryRunAutomation::new(ScreenGeometry::from(
            &config.geometry,
        ))),
        DriverKind::Command => Box::new(CommandAutomation::from_config(config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn card_positions_follow_the_grid() {
        let geometry = ScreenGeometry::default();
        assert_eq!(geometry.card_position(0, 0), (1250, 95));
        assert_eq!(geometry.card_position(2, 3), (1250 + 2 * 362, 95 + 3 * 72));
        assert_eq!(geometry.position(Action::NewGame), geometry.new_game);
    }

    #[test]
    fn retry_succeeds_after_transient_failures() {
        let policy = RetryPolicy {
            tries: 3,
            delay: Duration::ZERO,
        };
        let calls = Cell::new(0);
        let result = policy.run("next stack", || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(AutomationError::Unavailable)
            } else {
                Ok(calls.get())
            }
        });
        assert_eq!(result.expect("third try succeeds"), 3);
    }

    #[test]
    fn retry_gives_up_after_configured_tries() {
        let policy = RetryPolicy {
            tries: 2,
            delay: Duration::ZERO,
        };
        let calls = Cell::new(0);
        let err = policy
            .run::<(), _>("new game", || {
                calls.set(calls.get() + 1);
                Err(AutomationError::Unavailable)
            })
            .expect_err("always fails");
        assert_eq!(calls.get(), 2);
        assert!(matches!(err, AutomationError::RetriesExhausted { tries: 2, .. }));
    }

    #[test]
    fn execute_plan_translates_moves() {
        let mut automation = DryRunAutomation::default();
        let moves = [Move::play(1, 4), Move::Reset, Move::play(3, 0)];
        let issued = execute_plan(&mut automation, &moves).expect("dry run");
        assert_eq!(issued, 3);
        assert_eq!(
            automation.actions(),
            &[
                Action::ClickCard { pile: 1, card: 4 },
                Action::NextStack,
                Action::ClickCard { pile: 3, card: 0 },
            ]
        );
    }

    #[test]
    fn action_serializes_with_tag() {
        let json = serde_json::to_string(&Action::ClickCard { pile: 0, card: 2 }).expect("json");
        assert_eq!(json, r#"{"action":"click_card","pile":0,"card":2}"#);
    }
}

use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

use tracing::{Level, event};

use super::{Action, Automation, AutomationError, RetryPolicy, ScreenGeometry};
use crate::config::AutomationConfig;

/// Clicks by running an external command, e.g.
/// `xdotool mousemove {x} {y} click 1`.
#[derive(Debug, Clone)]
pub struct CommandAutomation {
    template: Vec<String>,
    geometry: ScreenGeometry,
    retry: RetryPolicy,
    card_delay: Duration,
    new_game_delay: Duration,
}

impl CommandAutomation {
    pub fn new(
        template: Vec<String>,
        geometry: ScreenGeometry,
        retry: RetryPolicy,
        card_delay: Duration,
        new_game_delay: Duration,
    ) -> Self {
        Self {
            template,
            geometry,
            retry,
            card_delay,
            new_game_delay,
        }
    }

    pub fn from_config(config: &AutomationConfig) -> Self {
        Self::new(
            config.click_command.clone(),
            ScreenGeometry::from(&config.geometry),
            RetryPolicy::from(&config.retry),
            Duration::from_millis(config.card_delay_ms),
            Duration::from_millis(config.new_game_delay_ms),
        )
    }

    fn click(&self, action: Action) -> Result<(), AutomationError> {
        let (x, y) = self.geometry.position(action);
        let argv = render(&self.template, x, y);
        let Some((program, args)) = argv.split_first() else {
            return Err(AutomationError::Unavailable);
        };

        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status()
            .map_err(|err| AutomationError::Spawn {
                program: program.clone(),
                message: err.to_string(),
            })?;
        if !status.success() {
            return Err(AutomationError::Status {
                program: program.clone(),
                status: status.to_string(),
            });
        }

        event!(
            target: "crib_runner::automation",
            Level::TRACE,
            action = ?action,
            x,
            y,
            "clicked"
        );
        Ok(())
    }
}

fn render(template: &[String], x: i32, y: i32) -> Vec<String> {
    let (x, y) = (x.to_string(), y.to_string());
    template
        .iter()
        .map(|arg| arg.replace("{x}", &x).replace("{y}", &y))
        .collect()
}

fn settle(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}

impl Automation for CommandAutomation {
    fn click_card(&mut self, pile: usize, card: usize) -> Result<(), AutomationError> {
        self.click(Action::ClickCard { pile, card })?;
        settle(self.card_delay);
        Ok(())
    }

    fn click_next_stack(&mut self) -> Result<(), AutomationError> {
        let retry = self.retry;
        retry.run("next stack", || self.click(Action::NextStack))
    }

    fn new_game(&mut self) -> Result<(), AutomationError> {
        let retry = self.retry;
        retry.run("new game", || self.click(Action::NewGame))?;
        settle(self.new_game_delay);
        Ok(())
    }
}

use tracing::{Level, event};

use super::{Action, Automation, AutomationError, ScreenGeometry};

/// Records actions instead of clicking. Used offline and in tests.
#[derive(Debug, Default)]
pub struct DryRunAutomation {
    geometry: ScreenGeometry,
    actions: Vec<Action>,
}

impl DryRunAutomation {
    pub fn new(geometry: ScreenGeometry) -> Self {
        Self {
            geometry,
            actions: Vec::new(),
        }
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn new_game_count(&self) -> usize {
        self.actions
            .iter()
            .filter(|action| matches!(action, Action::NewGame))
            .count()
    }

    fn record(&mut self, action: Action) {
        let (x, y) = self.geometry.position(action);
        event!(
            target: "crib_runner::automation",
            Level::DEBUG,
            action = ?action,
            x,
            y,
            "dry-run action"
        );
        self.actions.push(action);
    }
}

impl Automation for DryRunAutomation {
    fn click_card(&mut self, pile: usize, card: usize) -> Result<(), AutomationError> {
        self.record(Action::ClickCard { pile, card });
        Ok(())
    }

    fn click_next_stack(&mut self) -> Result<(), AutomationError> {
        self.record(Action::NextStack);
        Ok(())
    }

    fn new_game(&mut self) -> Result<(), AutomationError> {
        self.record(Action::NewGame);
        Ok(())
    }
}

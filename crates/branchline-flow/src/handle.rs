//! Input side of a running dialogue.
//!
//! A [`DialogueHandle`] is what the input layer holds: it forwards player
//! signals to the controller task and exposes the controller's status.

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use branchline_core::error::DialogueError;

use crate::controller::FlowOutcome;
use crate::navigator::Direction;

/// A player signal delivered to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "input", content = "direction", rename_all = "snake_case")]
pub enum DialogueInput {
    /// Reveal the current line in full.
    Skip,
    /// Move on from a one-way line; also skips a reveal in progress.
    Advance,
    /// Move the choice highlight.
    Navigate(Direction),
    /// Confirm the highlighted choice.
    Confirm,
}

/// Where the controller is in a node's life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowPhase {
    /// Not started.
    Idle,
    /// Revealing the node's line; skip is accepted.
    Revealing,
    /// Anti-spam wait; inputs are discarded.
    Cooldown,
    /// Revealing choice labels; inputs are discarded.
    RevealingChoices,
    /// Navigation and confirmation are accepted.
    AwaitingChoice,
    /// Waiting for the player to advance.
    AwaitingAdvance,
    /// The dialogue is over.
    Ended,
}

/// Snapshot of controller progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowStatus {
    /// 1-based index of the node being played; 0 before the first node.
    pub step: usize,
    /// Current phase of that node.
    pub phase: FlowPhase,
}

impl FlowStatus {
    /// Status before the first node.
    #[must_use]
    pub fn idle() -> Self {
        Self {
            step: 0,
            phase: FlowPhase::Idle,
        }
    }

    /// Returns whether choice navigation inputs are currently accepted.
    #[must_use]
    pub fn is_awaiting_choice(&self) -> bool {
        self.phase == FlowPhase::AwaitingChoice
    }
}

/// Handle to a dialogue running on its own task.
#[derive(Debug)]
pub struct DialogueHandle {
    inputs: mpsc::UnboundedSender<DialogueInput>,
    status: watch::Receiver<FlowStatus>,
    task: JoinHandle<FlowOutcome>,
}

impl DialogueHandle {
    pub(crate) fn new(
        inputs: mpsc::UnboundedSender<DialogueInput>,
        status: watch::Receiver<FlowStatus>,
        task: JoinHandle<FlowOutcome>,
    ) -> Self {
        Self {
            inputs,
            status,
            task,
        }
    }

    /// Sends a raw input.
    ///
    /// # Errors
    ///
    /// Returns `DialogueError::SessionClosed` if the dialogue has finished.
    pub fn send(&self, input: DialogueInput) -> Result<(), DialogueError> {
        self.inputs
            .send(input)
            .map_err(|_| DialogueError::SessionClosed)
    }

    /// Skips the reveal of the current line.
    ///
    /// # Errors
    ///
    /// Returns `DialogueError::SessionClosed` if the dialogue has finished.
    pub fn trigger_skip(&self) -> Result<(), DialogueError> {
        self.send(DialogueInput::Skip)
    }

    /// Advances past the current one-way line.
    ///
    /// # Errors
    ///
    /// Returns `DialogueError::SessionClosed` if the dialogue has finished.
    pub fn trigger_advance(&self) -> Result<(), DialogueError> {
        self.send(DialogueInput::Advance)
    }

    /// Moves the highlight in `direction`.
    ///
    /// # Errors
    ///
    /// Returns `DialogueError::SessionClosed` if the dialogue has finished.
    pub fn navigate(&self, direction: Direction) -> Result<(), DialogueError> {
        self.send(DialogueInput::Navigate(direction))
    }

    /// Moves the highlight one row up.
    ///
    /// # Errors
    ///
    /// Returns `DialogueError::SessionClosed` if the dialogue has finished.
    pub fn navigate_up(&self) -> Result<(), DialogueError> {
        self.navigate(Direction::Up)
    }

    /// Moves the highlight one row down.
    ///
    /// # Errors
    ///
    /// Returns `DialogueError::SessionClosed` if the dialogue has finished.
    pub fn navigate_down(&self) -> Result<(), DialogueError> {
        self.navigate(Direction::Down)
    }

    /// Moves the highlight one column left.
    ///
    /// # Errors
    ///
    /// Returns `DialogueError::SessionClosed` if the dialogue has finished.
    pub fn navigate_left(&self) -> Result<(), DialogueError> {
        self.navigate(Direction::Left)
    }

    /// Moves the highlight one column right.
    ///
    /// # Errors
    ///
    /// Returns `DialogueError::SessionClosed` if the dialogue has finished.
    pub fn navigate_right(&self) -> Result<(), DialogueError> {
        self.navigate(Direction::Right)
    }

    /// Confirms the highlighted choice.
    ///
    /// # Errors
    ///
    /// Returns `DialogueError::SessionClosed` if the dialogue has finished.
    pub fn confirm_choice(&self) -> Result<(), DialogueError> {
        self.send(DialogueInput::Confirm)
    }

    /// Latest controller status.
    #[must_use]
    pub fn status(&self) -> FlowStatus {
        *self.status.borrow()
    }

    /// Returns whether the dialogue is waiting on a choice.
    #[must_use]
    pub fn is_awaiting_choice(&self) -> bool {
        self.status().is_awaiting_choice()
    }

    /// Returns whether the controller task has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits until the status satisfies `predicate` and returns it.
    ///
    /// If the controller finishes first, returns its final status.
    pub async fn wait_for(&mut self, predicate: impl FnMut(&FlowStatus) -> bool) -> FlowStatus {
        let reached = self.status.wait_for(predicate).await.map(|status| *status);
        reached.unwrap_or_else(|_| *self.status.borrow())
    }

    /// Waits for the controller to finish.
    ///
    /// # Errors
    ///
    /// Returns `DialogueError::SessionClosed` if the controller task was
    /// aborted or panicked.
    pub async fn join(self) -> Result<FlowOutcome, DialogueError> {
        self.task.await.map_err(|_| DialogueError::SessionClosed)
    }

    /// Stops the controller task without waiting for the dialogue to end.
    pub fn abort(&self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_serializes_with_direction_payload() {
        let navigate = serde_json::to_value(DialogueInput::Navigate(Direction::Left)).unwrap();
        let advance = serde_json::to_value(DialogueInput::Advance).unwrap();

        assert_eq!(navigate, serde_json::json!({ "input": "navigate", "direction": "left" }));
        assert_eq!(advance, serde_json::json!({ "input": "advance" }));
    }

    #[test]
    fn test_only_choice_phase_accepts_navigation() {
        let waiting = FlowStatus {
            step: 2,
            phase: FlowPhase::AwaitingChoice,
        };

        assert!(waiting.is_awaiting_choice());
        assert!(!FlowStatus::idle().is_awaiting_choice());
    }
}

//! Grid navigation over a node's choices.
//!
//! Choices are laid out row-major in a grid with a fixed number of columns.
//! Up and down move a whole row and wrap around the full list; left and right
//! rotate within the row and clamp to the last choice when the final row is
//! short.

use std::sync::Arc;

use branchline_core::event::DialogueObserver;
use branchline_core::signal::{Completer, Completion, completion};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A directional navigation input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// One row up.
    Up,
    /// One row down.
    Down,
    /// One column left.
    Left,
    /// One column right.
    Right,
}

/// Tracks the highlighted choice and resolves once the player confirms.
pub struct ChoiceNavigator {
    columns: usize,
    total: usize,
    current: usize,
    completer: Option<Completer<u8>>,
    observer: Arc<dyn DialogueObserver>,
}

impl std::fmt::Debug for ChoiceNavigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChoiceNavigator")
            .field("columns", &self.columns)
            .field("total", &self.total)
            .field("current", &self.current)
            .field("awaiting", &self.is_awaiting_choice())
            .finish_non_exhaustive()
    }
}

impl ChoiceNavigator {
    /// Creates an idle navigator for a grid of `columns` columns.
    #[must_use]
    pub fn new(columns: usize, observer: Arc<dyn DialogueObserver>) -> Self {
        Self {
            columns: columns.max(1),
            total: 0,
            current: 0,
            completer: None,
            observer,
        }
    }

    /// Starts a selection over `choice_count` choices: highlights the first
    /// one and arms a fresh confirmation signal.
    ///
    /// With zero choices there is nothing to select and the navigator stays
    /// idle.
    pub fn initialize(&mut self, choice_count: usize) {
        self.total = choice_count;
        self.current = 0;
        if choice_count == 0 {
            debug!("no choices to navigate");
            self.completer = None;
            return;
        }
        let (completer, _) = completion();
        self.completer = Some(completer);
        debug!(choice_count, columns = self.columns, "choice navigation started");
        self.highlight();
    }

    /// Returns whether a selection is armed and not yet confirmed.
    #[must_use]
    pub fn is_awaiting_choice(&self) -> bool {
        self.completer
            .as_ref()
            .is_some_and(|completer| !completer.is_completed())
    }

    /// The highlighted choice.
    #[must_use]
    pub fn current_index(&self) -> u8 {
        to_slot(self.current)
    }

    /// Applies a directional input.
    pub fn navigate(&mut self, direction: Direction) {
        match direction {
            Direction::Up => self.move_up(),
            Direction::Down => self.move_down(),
            Direction::Left => self.move_left(),
            Direction::Right => self.move_right(),
        }
    }

    /// Moves one row up, wrapping around the whole list.
    pub fn move_up(&mut self) {
        if !self.accepts_input("up") {
            return;
        }
        self.current = (self.current + self.total - self.columns % self.total) % self.total;
        self.highlight();
    }

    /// Moves one row down, wrapping around the whole list.
    pub fn move_down(&mut self) {
        if !self.accepts_input("down") {
            return;
        }
        self.current = (self.current + self.columns) % self.total;
        self.highlight();
    }

    /// Moves one column left within the row.
    pub fn move_left(&mut self) {
        if !self.accepts_input("left") {
            return;
        }
        let column = self.current % self.columns;
        self.shift_column((column + self.columns - 1) % self.columns);
    }

    /// Moves one column right within the row.
    pub fn move_right(&mut self) {
        if !self.accepts_input("right") {
            return;
        }
        let column = self.current % self.columns;
        self.shift_column((column + 1) % self.columns);
    }

    /// Confirms the highlighted choice. Only the first confirmation of a
    /// selection counts.
    pub fn confirm(&mut self) {
        if !self.accepts_input("confirm") {
            return;
        }
        let selected = to_slot(self.current);
        let settled = self
            .completer
            .as_ref()
            .is_some_and(|completer| completer.complete(selected));
        if settled {
            debug!(selected, "choice confirmed");
            self.observer.on_choice_confirmed(selected);
        }
    }

    /// Returns a waiter for the current selection, or `None` before the
    /// first [`initialize`](Self::initialize).
    #[must_use]
    pub fn selection(&self) -> Option<Completion<u8>> {
        self.completer.as_ref().map(Completer::subscribe)
    }

    /// Waits until the current selection is confirmed and returns the chosen
    /// index. Returns immediately with the same index once confirmed.
    pub async fn await_selection(&self) -> Option<u8> {
        let mut selection = self.selection()?;
        selection.wait().await
    }

    fn accepts_input(&self, input: &'static str) -> bool {
        let awaiting = self.is_awaiting_choice();
        if !awaiting {
            debug!(input, "navigation input ignored outside choice selection");
        }
        awaiting
    }

    fn shift_column(&mut self, column: usize) {
        let row = self.current / self.columns;
        self.current = (row * self.columns + column).min(self.total - 1);
        self.highlight();
    }

    fn highlight(&self) {
        let index = to_slot(self.current);
        debug!(index, "choice highlighted");
        self.observer.on_choice_highlighted(index);
    }
}

fn to_slot(index: usize) -> u8 {
    u8::try_from(index).unwrap_or(u8::MAX)
}

#[cfg(test)]
mod tests {
    use branchline_core::event::DialogueEvent;
    use branchline_test_support::RecordingObserver;

    use super::*;

    fn navigator(total: usize) -> (ChoiceNavigator, Arc<RecordingObserver>) {
        let observer = Arc::new(RecordingObserver::new());
        let mut navigator = ChoiceNavigator::new(2, observer.clone());
        navigator.initialize(total);
        (navigator, observer)
    }

    fn highlights(observer: &RecordingObserver) -> Vec<u8> {
        observer
            .events()
            .into_iter()
            .filter_map(|event| match event {
                DialogueEvent::ChoiceHighlighted { index } => Some(index),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_initialize_highlights_first_choice() {
        let (navigator, observer) = navigator(4);

        assert!(navigator.is_awaiting_choice());
        assert_eq!(navigator.current_index(), 0);
        assert_eq!(highlights(&observer), vec![0]);
    }

    #[test]
    fn test_vertical_moves_wrap_across_whole_list() {
        // Arrange
        let (mut navigator, observer) = navigator(4);

        // Act
        navigator.move_up();
        navigator.move_up();
        navigator.move_down();
        navigator.move_down();
        navigator.move_down();

        // Assert
        assert_eq!(highlights(&observer), vec![0, 2, 0, 2, 0, 2]);
    }

    #[test]
    fn test_horizontal_moves_rotate_within_row() {
        // Arrange
        let (mut navigator, observer) = navigator(4);

        // Act
        navigator.move_right();
        navigator.move_right();
        navigator.move_down();
        navigator.move_left();
        navigator.move_left();

        // Assert
        assert_eq!(highlights(&observer), vec![0, 1, 0, 2, 3, 2]);
    }

    #[test]
    fn test_horizontal_moves_clamp_on_short_last_row() {
        // Arrange: three choices, the last row holds only index 2.
        let (mut navigator, observer) = navigator(3);
        navigator.move_down();

        // Act
        navigator.move_right();
        navigator.move_left();

        // Assert
        assert_eq!(highlights(&observer), vec![0, 2, 2, 2]);
    }

    #[test]
    fn test_up_then_down_round_trips_from_every_index() {
        for total in [2usize, 3, 4, 5, 6, 7] {
            for start in 0..total {
                let (mut navigator, _) = navigator(total);
                navigator.current = start;

                navigator.move_up();
                navigator.move_down();

                assert_eq!(
                    usize::from(navigator.current_index()),
                    start,
                    "total {total}, start {start}"
                );
            }
        }
    }

    #[test]
    fn test_index_stays_in_range_for_any_move_sequence() {
        let moves = [
            Direction::Up,
            Direction::Left,
            Direction::Down,
            Direction::Down,
            Direction::Right,
            Direction::Up,
            Direction::Right,
            Direction::Left,
        ];
        for total in 1..=9usize {
            let (mut navigator, _) = navigator(total);
            for step in 0..64 {
                navigator.navigate(moves[(step * 7 + total) % moves.len()]);
                assert!(
                    usize::from(navigator.current_index()) < total,
                    "total {total}, step {step}"
                );
            }
        }
    }

    #[test]
    fn test_single_choice_with_wider_grid_stays_put() {
        let observer = Arc::new(RecordingObserver::new());
        let mut navigator = ChoiceNavigator::new(3, observer.clone());
        navigator.initialize(1);

        navigator.move_up();
        navigator.move_down();
        navigator.move_right();

        assert_eq!(highlights(&observer), vec![0, 0, 0, 0]);
    }

    #[tokio::test]
    async fn test_second_confirm_keeps_first_selection() {
        // Arrange
        let (mut navigator, observer) = navigator(4);

        // Act
        navigator.move_right();
        navigator.confirm();
        navigator.move_down();
        navigator.confirm();

        // Assert
        assert_eq!(navigator.await_selection().await, Some(1));
        assert_eq!(navigator.await_selection().await, Some(1));
        assert!(!navigator.is_awaiting_choice());
        let confirmations: Vec<_> = observer
            .events()
            .into_iter()
            .filter(|event| matches!(event, DialogueEvent::ChoiceConfirmed { .. }))
            .collect();
        assert_eq!(confirmations, vec![DialogueEvent::ChoiceConfirmed { index: 1 }]);
        assert_eq!(highlights(&observer), vec![0, 1]);
    }

    #[test]
    fn test_inputs_before_initialize_are_ignored() {
        let observer = Arc::new(RecordingObserver::new());
        let mut navigator = ChoiceNavigator::new(2, observer.clone());

        navigator.move_down();
        navigator.confirm();

        assert!(!navigator.is_awaiting_choice());
        assert!(navigator.selection().is_none());
        assert!(observer.events().is_empty());
    }

    #[test]
    fn test_initialize_with_no_choices_stays_idle() {
        let (mut navigator, observer) = navigator(0);

        navigator.move_left();

        assert!(!navigator.is_awaiting_choice());
        assert!(observer.events().is_empty());
    }

    #[tokio::test]
    async fn test_reinitialize_arms_fresh_selection() {
        // Arrange
        let (mut navigator, _) = navigator(2);
        navigator.move_right();
        navigator.confirm();

        // Act
        navigator.initialize(2);

        // Assert
        assert!(navigator.is_awaiting_choice());
        assert_eq!(navigator.selection().unwrap().peek(), None);
        navigator.confirm();
        assert_eq!(navigator.await_selection().await, Some(0));
    }
}

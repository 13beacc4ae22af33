//! Presentation state for a hosted dialogue.
//!
//! [`SessionView`] plays the role of a dialogue box: it keeps the current
//! speaker and line, the choice labels revealed so far, and which choice is
//! highlighted, so clients can poll it instead of rendering events themselves.

use std::sync::{Mutex, MutexGuard, PoisonError};

use branchline_core::event::{DialogueObserver, TextRole};
use serde::Serialize;

/// What the dialogue box currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewSnapshot {
    /// Whether the dialogue box is open.
    pub visible: bool,
    /// Speaker of the current line.
    pub speaker: Option<String>,
    /// Revealed part of the current line.
    pub dialogue_text: String,
    /// Revealed part of each choice label, by slot.
    pub choices: Vec<String>,
    /// Highlighted choice, once navigation has started.
    pub highlighted: Option<u8>,
    /// Confirmed choice of the current line.
    pub confirmed: Option<u8>,
    /// Whether the dialogue has finished.
    pub ended: bool,
}

/// Observer that folds dialogue notifications into a [`ViewSnapshot`].
#[derive(Debug, Default)]
pub struct SessionView {
    state: Mutex<ViewSnapshot>,
}

impl SessionView {
    /// Creates an empty, hidden view.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the current view.
    #[must_use]
    pub fn snapshot(&self) -> ViewSnapshot {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, ViewSnapshot> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DialogueObserver for SessionView {
    fn on_dialogue_started(&self) {
        let mut view = self.lock();
        view.visible = true;
        view.ended = false;
    }

    fn on_line_started(&self, speaker: Option<&str>, _text: &str) {
        let mut view = self.lock();
        view.speaker = speaker.map(str::to_owned);
        view.dialogue_text.clear();
        view.choices.clear();
        view.highlighted = None;
        view.confirmed = None;
    }

    fn on_reveal_progress(&self, role: TextRole, text: &str, choice_slot: u8) {
        let mut view = self.lock();
        match role {
            TextRole::DialogueText => text.clone_into(&mut view.dialogue_text),
            TextRole::ChoiceText => {
                let slot = usize::from(choice_slot);
                if view.choices.len() <= slot {
                    view.choices.resize(slot + 1, String::new());
                }
                text.clone_into(&mut view.choices[slot]);
            }
        }
    }

    fn on_choice_highlighted(&self, index: u8) {
        self.lock().highlighted = Some(index);
    }

    fn on_choice_confirmed(&self, index: u8) {
        self.lock().confirmed = Some(index);
    }

    fn on_dialogue_ended(&self) {
        let mut view = self.lock();
        view.visible = false;
        view.ended = true;
    }
}

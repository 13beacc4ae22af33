//! Observer that records every dialogue notification.

use std::sync::Mutex;

use branchline_core::event::{DialogueEvent, DialogueObserver, TextRole};
use tokio::time::Instant;

/// An observer that records each notification together with the (possibly
/// paused) Tokio time at which it arrived.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<(Instant, DialogueEvent)>>,
}

impl RecordingObserver {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all recorded events in arrival order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn events(&self) -> Vec<DialogueEvent> {
        self.timed_events()
            .into_iter()
            .map(|(_, event)| event)
            .collect()
    }

    /// Returns a snapshot of all recorded events with their arrival times.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn timed_events(&self) -> Vec<(Instant, DialogueEvent)> {
        self.events.lock().unwrap().clone()
    }

    /// Texts of every line started, in order.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                DialogueEvent::LineStarted { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Texts of every reveal emission for `role`, in order.
    #[must_use]
    pub fn reveals(&self, role: TextRole) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                DialogueEvent::RevealProgress {
                    role: emitted, text, ..
                } if emitted == role => Some(text),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: DialogueEvent) {
        self.events.lock().unwrap().push((Instant::now(), event));
    }
}

impl DialogueObserver for RecordingObserver {
    fn on_dialogue_started(&self) {
        self.record(DialogueEvent::DialogueStarted);
    }

    fn on_line_started(&self, speaker: Option<&str>, text: &str) {
        self.record(DialogueEvent::LineStarted {
            speaker: speaker.map(str::to_owned),
            text: text.to_owned(),
        });
    }

    fn on_reveal_progress(&self, role: TextRole, text: &str, choice_slot: u8) {
        self.record(DialogueEvent::RevealProgress {
            role,
            text: text.to_owned(),
            choice_slot,
        });
    }

    fn on_choice_highlighted(&self, index: u8) {
        self.record(DialogueEvent::ChoiceHighlighted { index });
    }

    fn on_choice_confirmed(&self, index: u8) {
        self.record(DialogueEvent::ChoiceConfirmed { index });
    }

    fn on_dialogue_ended(&self) {
        self.record(DialogueEvent::DialogueEnded);
    }
}

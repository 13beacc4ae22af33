//! Dialogue events and the observer interface.
//!
//! The flow publishes notifications to a [`DialogueObserver`]; it never
//! expects anything back. [`DialogueEvent`] is the owned record of one such
//! notification, for observers that queue or replay them.

use serde::{Deserialize, Serialize};

/// Which piece of text a reveal emission belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextRole {
    /// The node's main line.
    DialogueText,
    /// One of the node's choice labels.
    ChoiceText,
}

/// Receives notifications from the dialogue flow.
///
/// Every method defaults to a no-op so presenters implement only what they
/// render.
pub trait DialogueObserver: Send + Sync {
    /// A traversal from the root has begun.
    fn on_dialogue_started(&self) {}

    /// A new node is about to be revealed.
    fn on_line_started(&self, _speaker: Option<&str>, _text: &str) {}

    /// A reveal tick or a skip-completion. `choice_slot` is 0 for dialogue text.
    fn on_reveal_progress(&self, _role: TextRole, _text: &str, _choice_slot: u8) {}

    /// The highlighted choice changed (or was set by initialisation).
    fn on_choice_highlighted(&self, _index: u8) {}

    /// The player confirmed a choice.
    fn on_choice_confirmed(&self, _index: u8) {}

    /// The traversal reached a terminal node or was abandoned.
    fn on_dialogue_ended(&self) {}
}

/// Owned record of a single observer notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DialogueEvent {
    /// See [`DialogueObserver::on_dialogue_started`].
    DialogueStarted,
    /// See [`DialogueObserver::on_line_started`].
    LineStarted {
        /// Optional speaker label of the node.
        speaker: Option<String>,
        /// Full text of the node.
        text: String,
    },
    /// See [`DialogueObserver::on_reveal_progress`].
    RevealProgress {
        /// Dialogue or choice text.
        role: TextRole,
        /// The revealed prefix, or the whole text on skip.
        text: String,
        /// Choice slot the text belongs to.
        choice_slot: u8,
    },
    /// See [`DialogueObserver::on_choice_highlighted`].
    ChoiceHighlighted {
        /// Highlighted choice index.
        index: u8,
    },
    /// See [`DialogueObserver::on_choice_confirmed`].
    ChoiceConfirmed {
        /// Confirmed choice index.
        index: u8,
    },
    /// See [`DialogueObserver::on_dialogue_ended`].
    DialogueEnded,
}

impl DialogueEvent {
    /// Delivers this event to `observer` as the matching callback.
    pub fn dispatch(&self, observer: &dyn DialogueObserver) {
        match self {
            Self::DialogueStarted => observer.on_dialogue_started(),
            Self::LineStarted { speaker, text } => {
                observer.on_line_started(speaker.as_deref(), text);
            }
            Self::RevealProgress {
                role,
                text,
                choice_slot,
            } => observer.on_reveal_progress(*role, text, *choice_slot),
            Self::ChoiceHighlighted { index } => observer.on_choice_highlighted(*index),
            Self::ChoiceConfirmed { index } => observer.on_choice_confirmed(*index),
            Self::DialogueEnded => observer.on_dialogue_ended(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Highlights(Mutex<Vec<u8>>);

    impl DialogueObserver for Highlights {
        fn on_choice_highlighted(&self, index: u8) {
            self.0.lock().unwrap().push(index);
        }
    }

    #[test]
    fn test_dispatch_routes_to_matching_callback() {
        // Arrange
        let observer = Highlights::default();
        let events = [
            DialogueEvent::DialogueStarted,
            DialogueEvent::ChoiceHighlighted { index: 3 },
            DialogueEvent::ChoiceConfirmed { index: 3 },
            DialogueEvent::ChoiceHighlighted { index: 1 },
        ];

        // Act
        for event in &events {
            event.dispatch(&observer);
        }

        // Assert
        assert_eq!(*observer.0.lock().unwrap(), vec![3, 1]);
    }

    #[test]
    fn test_reveal_progress_serializes_with_snake_case_tags() {
        let event = DialogueEvent::RevealProgress {
            role: TextRole::ChoiceText,
            text: "Ye".to_owned(),
            choice_slot: 1,
        };

        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "reveal_progress");
        assert_eq!(json["role"], "choice_text");
        assert_eq!(json["choice_slot"], 1);
    }
}

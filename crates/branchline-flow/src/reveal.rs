//! Typewriter-style text reveal.
//!
//! A reveal emits a growing prefix of the target text once per interval. A
//! skip does not abort it: the full text is emitted at once and the reveal
//! returns.

use std::sync::Arc;
use std::time::Duration;

use branchline_core::event::{DialogueObserver, TextRole};
use branchline_core::signal::SkipToken;
use tokio::time::sleep;
use tracing::trace;

/// How a reveal finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    /// Every character was revealed at the regular pace.
    Completed,
    /// The reveal was skipped and the full text emitted at once.
    Skipped,
}

/// Reveals text to an observer one character at a time.
pub struct TextRevealer {
    interval: Duration,
    choice_cooldown: Duration,
    buffer: String,
    observer: Arc<dyn DialogueObserver>,
}

impl std::fmt::Debug for TextRevealer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRevealer")
            .field("interval", &self.interval)
            .field("choice_cooldown", &self.choice_cooldown)
            .field("buffer", &self.buffer)
            .finish_non_exhaustive()
    }
}

impl TextRevealer {
    /// Creates a revealer emitting to `observer`.
    #[must_use]
    pub fn new(
        interval: Duration,
        choice_cooldown: Duration,
        observer: Arc<dyn DialogueObserver>,
    ) -> Self {
        Self {
            interval,
            choice_cooldown,
            buffer: String::new(),
            observer,
        }
    }

    /// The characters emitted so far by the reveal in progress. Empty between
    /// reveals.
    #[must_use]
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// Reveals `text` one character per interval until done or until `skip`
    /// fires, in which case `text` is emitted whole.
    ///
    /// Every character is followed by one interval, the last one included; a
    /// skip landing in that final interval still emits `text` once more.
    pub async fn reveal(
        &mut self,
        role: TextRole,
        text: &str,
        choice_slot: u8,
        skip: &mut SkipToken,
    ) -> RevealOutcome {
        self.buffer.clear();
        let mut outcome = RevealOutcome::Completed;

        for ch in text.chars() {
            self.buffer.push(ch);
            self.observer
                .on_reveal_progress(role, &self.buffer, choice_slot);

            tokio::select! {
                biased;
                () = skip.cancelled() => {
                    trace!(?role, choice_slot, revealed = self.buffer.len(), "reveal skipped");
                    self.buffer.clear();
                    self.observer.on_reveal_progress(role, text, choice_slot);
                    outcome = RevealOutcome::Skipped;
                    break;
                }
                () = sleep(self.interval) => {}
            }
        }

        self.buffer.clear();
        outcome
    }

    /// Reveals a choice label, then waits out the choice cooldown. Neither
    /// part can be skipped.
    pub async fn reveal_choice(&mut self, text: &str, choice_slot: u8) {
        self.reveal(
            TextRole::ChoiceText,
            text,
            choice_slot,
            &mut SkipToken::never(),
        )
        .await;
        sleep(self.choice_cooldown).await;
    }
}

//! Single-shot signals used to suspend the dialogue flow.
//!
//! [`completion`] creates a resolve-once value: the first `complete` wins,
//! later ones are ignored, and waiting after resolution returns the cached
//! value immediately. [`SkipScope`] is a cancellation handle that lives for a
//! single reveal and is dropped afterwards.

use std::future;

use tokio::sync::watch;

/// Creates a linked completer and completion pair.
#[must_use]
pub fn completion<T: Clone>() -> (Completer<T>, Completion<T>) {
    let (tx, rx) = watch::channel(None);
    (Completer { tx }, Completion { rx })
}

/// The settling side of a single-shot signal.
#[derive(Debug)]
pub struct Completer<T> {
    tx: watch::Sender<Option<T>>,
}

impl<T: Clone> Completer<T> {
    /// Settles the signal with `value`.
    ///
    /// Returns `false` and leaves the stored value untouched if the signal
    /// was already settled.
    pub fn complete(&self, value: T) -> bool {
        let mut pending = Some(value);
        self.tx.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = pending.take();
            true
        })
    }

    /// Returns whether the signal has been settled.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Returns another waiter for this signal.
    #[must_use]
    pub fn subscribe(&self) -> Completion<T> {
        Completion {
            rx: self.tx.subscribe(),
        }
    }
}

/// The waiting side of a single-shot signal.
#[derive(Debug, Clone)]
pub struct Completion<T> {
    rx: watch::Receiver<Option<T>>,
}

impl<T: Clone> Completion<T> {
    /// Waits until the signal is settled and returns its value.
    ///
    /// Returns `None` if the completer was dropped without settling.
    pub async fn wait(&mut self) -> Option<T> {
        self.rx
            .wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|value| (*value).clone())
    }

    /// Returns the settled value without waiting.
    #[must_use]
    pub fn peek(&self) -> Option<T> {
        self.rx.borrow().clone()
    }
}

/// Cancellation handle for one reveal.
///
/// Create one per step and drop it when the step ends; tokens taken from it
/// never observe a later scope's cancellation.
#[derive(Debug)]
pub struct SkipScope {
    tx: watch::Sender<bool>,
}

impl Default for SkipScope {
    fn default() -> Self {
        Self::new()
    }
}

impl SkipScope {
    /// Creates an uncancelled scope.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Returns a token that resolves once this scope is cancelled.
    #[must_use]
    pub fn token(&self) -> SkipToken {
        SkipToken {
            rx: Some(self.tx.subscribe()),
        }
    }

    /// Cancels the scope. Repeated calls have no further effect.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Returns whether the scope has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Waiting side of a [`SkipScope`].
#[derive(Debug)]
pub struct SkipToken {
    rx: Option<watch::Receiver<bool>>,
}

impl SkipToken {
    /// A token that is never cancelled.
    #[must_use]
    pub fn never() -> Self {
        Self { rx: None }
    }

    /// Resolves when the owning scope is cancelled; pends forever otherwise,
    /// including after the scope is dropped uncancelled.
    pub async fn cancelled(&mut self) {
        let Some(rx) = self.rx.as_mut() else {
            return future::pending().await;
        };
        let fired = rx.wait_for(|cancelled| *cancelled).await.is_ok();
        if !fired {
            future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;

    #[tokio::test]
    async fn test_completion_keeps_first_value() {
        // Arrange
        let (completer, mut waiter) = completion::<u8>();

        // Act
        let first = completer.complete(1);
        let second = completer.complete(0);

        // Assert
        assert!(first);
        assert!(!second);
        assert_eq!(waiter.wait().await, Some(1));
        assert_eq!(waiter.wait().await, Some(1));
        assert_eq!(completer.subscribe().peek(), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_wait_suspends_until_completed() {
        // Arrange
        let (completer, mut waiter) = completion::<&'static str>();

        // Act
        let early = timeout(Duration::from_secs(5), waiter.wait()).await;
        completer.complete("done");
        let late = waiter.wait().await;

        // Assert
        assert!(early.is_err());
        assert!(completer.is_completed());
        assert_eq!(late, Some("done"));
    }

    #[tokio::test]
    async fn test_completion_returns_none_when_completer_dropped() {
        let (completer, mut waiter) = completion::<u8>();
        drop(completer);

        assert_eq!(waiter.wait().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_skip_token_resolves_after_cancel() {
        // Arrange
        let scope = SkipScope::new();
        let mut token = scope.token();

        // Act
        let before = timeout(Duration::from_secs(1), token.cancelled()).await;
        scope.cancel();
        let after = timeout(Duration::from_secs(1), token.cancelled()).await;

        // Assert
        assert!(before.is_err());
        assert!(after.is_ok());
        assert!(scope.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_scope_is_unaffected_by_previous_cancel() {
        // Arrange
        let first = SkipScope::new();
        first.cancel();
        drop(first);

        // Act
        let second = SkipScope::new();
        let mut token = second.token();
        let waited = timeout(Duration::from_secs(1), token.cancelled()).await;

        // Assert
        assert!(waited.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_scope_and_never_token_stay_pending() {
        let scope = SkipScope::new();
        let mut orphan = scope.token();
        drop(scope);
        let mut never = SkipToken::never();

        assert!(
            timeout(Duration::from_secs(1), orphan.cancelled())
                .await
                .is_err()
        );
        assert!(
            timeout(Duration::from_secs(1), never.cancelled())
                .await
                .is_err()
        );
    }
}

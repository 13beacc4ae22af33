//! Flow configuration, fixed at controller construction.

use std::time::Duration;

use crate::error::DialogueError;

/// Timing and layout parameters for a dialogue flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowConfig {
    /// Delay between revealed characters.
    pub reveal_interval: Duration,
    /// Number of columns in the choice grid.
    pub grid_columns: usize,
    /// Anti-spam wait after each line is revealed.
    pub advance_cooldown: Duration,
    /// Wait after each choice label is revealed.
    pub choice_cooldown: Duration,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            reveal_interval: Duration::from_millis(10),
            grid_columns: 2,
            advance_cooldown: Duration::from_millis(1500),
            choice_cooldown: Duration::from_secs(1),
        }
    }
}

impl FlowConfig {
    /// Checks the configuration for values the flow cannot run with.
    ///
    /// # Errors
    ///
    /// Returns `DialogueError::Config` if `grid_columns` is zero.
    pub fn validate(self) -> Result<Self, DialogueError> {
        if self.grid_columns == 0 {
            return Err(DialogueError::Config(
                "grid_columns must be at least 1".to_owned(),
            ));
        }
        Ok(self)
    }
}

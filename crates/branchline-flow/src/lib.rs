//! Branchline — dialogue flow.
//!
//! Drives a dialogue graph node by node: reveals each line character by
//! character, waits out the anti-spam cooldown, then either waits for the
//! player to advance or lets them pick a choice on a grid.

pub mod controller;
pub mod handle;
pub mod navigator;
pub mod reveal;

pub use controller::{FlowController, FlowOutcome};
pub use handle::{DialogueHandle, DialogueInput, FlowPhase, FlowStatus};
pub use navigator::{ChoiceNavigator, Direction};
pub use reveal::{RevealOutcome, TextRevealer};

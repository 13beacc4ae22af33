//! Shared test observers, fixtures and utilities for Branchline.

mod clock;
mod fixtures;
mod observer;

pub use clock::FixedClock;
pub use fixtures::{linear_chain, two_way_choice};
pub use observer::RecordingObserver;

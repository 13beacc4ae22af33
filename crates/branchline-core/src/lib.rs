//! Branchline Core — shared dialogue abstractions.
//!
//! This crate defines the error taxonomy, configuration, observer interface
//! and the signalling primitives that the graph and flow crates depend on.
//! It contains no presentation or input code.

pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod signal;

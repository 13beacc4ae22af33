//! Domain model for dialogue graphs.

pub mod node;

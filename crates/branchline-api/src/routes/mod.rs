//! Route modules.

pub mod dialogue;
pub mod health;

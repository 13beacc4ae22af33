//! Branchline — dialogue graph.
//!
//! Responsible for the immutable node model, its traversal rule, and building
//! node graphs from authored dialogue scripts.

pub mod application;
pub mod domain;

pub use domain::node::{Choice, DialogueNode, NodeKind, NodeRef};

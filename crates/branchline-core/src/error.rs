//! Dialogue error types.

use thiserror::Error;

/// Raised when a dialogue graph cannot be built as described.
///
/// These surface to whoever authors the content and are never repaired
/// silently.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphConstructionError {
    /// A multi-way node was given a different number of labels and successors.
    #[error("choice labels and successors must match: {choices} labels, {successors} successors")]
    ChoiceCountMismatch {
        /// Number of choice labels supplied.
        choices: usize,
        /// Number of successor slots supplied.
        successors: usize,
    },

    /// Choice slots are addressed by a byte.
    #[error("a node may offer at most 256 choices, got {0}")]
    TooManyChoices(usize),

    /// Two script nodes share an id.
    #[error("duplicate node id: {0}")]
    DuplicateNode(String),

    /// A script node links to an id that was never declared.
    #[error("node {from} links to unknown node {to}")]
    UnknownNode {
        /// The node holding the dangling link.
        from: String,
        /// The missing target id.
        to: String,
    },

    /// The script's root id is not among its nodes.
    #[error("root node {0} is not declared")]
    MissingRoot(String),

    /// A script node declares both a single successor and choices.
    #[error("node {0} declares both next and choices")]
    AmbiguousSuccessor(String),

    /// Following successors from this node leads back to it.
    #[error("node {0} is part of a cycle")]
    Cycle(String),
}

/// Top-level error type for the dialogue engine.
#[derive(Debug, Error)]
pub enum DialogueError {
    /// The dialogue graph is malformed.
    #[error("graph construction error: {0}")]
    Graph(#[from] GraphConstructionError),

    /// A dialogue script could not be parsed.
    #[error("script parse error: {0}")]
    ScriptParse(String),

    /// A configuration value is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The session's controller has already finished.
    #[error("dialogue session is closed")]
    SessionClosed,
}

//! Dialogue nodes and their traversal rule.

use std::sync::Arc;

use branchline_core::error::GraphConstructionError;

/// Shared reference to a node. Several nodes may point at the same successor.
pub type NodeRef = Arc<DialogueNode>;

/// Highest number of choices a node may offer; slots are addressed by a byte.
pub const MAX_CHOICES: usize = 256;

/// A single line of dialogue. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogueNode {
    text: String,
    speaker: Option<String>,
    kind: NodeKind,
}

/// How a node continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// At most one successor; `None` ends the dialogue.
    OneWay {
        /// The following node.
        next: Option<NodeRef>,
    },
    /// An ordered list of choices, each with its own successor.
    MultiWay {
        /// The offered choices.
        choices: Vec<Choice>,
    },
}

/// One option of a multi-way node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    /// Label shown to the player.
    pub text: String,
    /// Where the dialogue goes when this choice is confirmed; `None` ends it.
    pub next: Option<NodeRef>,
}

impl DialogueNode {
    /// Creates a one-way node.
    #[must_use]
    pub fn one_way(text: impl Into<String>, next: Option<NodeRef>) -> Self {
        Self {
            text: text.into(),
            speaker: None,
            kind: NodeKind::OneWay { next },
        }
    }

    /// Creates a one-way node with no successor.
    #[must_use]
    pub fn terminal(text: impl Into<String>) -> Self {
        Self::one_way(text, None)
    }

    /// Creates a multi-way node pairing each label with the successor at the
    /// same position.
    ///
    /// # Errors
    ///
    /// Returns `GraphConstructionError::ChoiceCountMismatch` if the two lists
    /// differ in length, and `GraphConstructionError::TooManyChoices` if more
    /// than [`MAX_CHOICES`] are given.
    pub fn multi_way<S: Into<String>>(
        text: impl Into<String>,
        choice_texts: Vec<S>,
        next_nodes: Vec<Option<NodeRef>>,
    ) -> Result<Self, GraphConstructionError> {
        if choice_texts.len() != next_nodes.len() {
            return Err(GraphConstructionError::ChoiceCountMismatch {
                choices: choice_texts.len(),
                successors: next_nodes.len(),
            });
        }
        if choice_texts.len() > MAX_CHOICES {
            return Err(GraphConstructionError::TooManyChoices(choice_texts.len()));
        }

        let choices = choice_texts
            .into_iter()
            .zip(next_nodes)
            .map(|(label, next)| Choice {
                text: label.into(),
                next,
            })
            .collect();

        Ok(Self {
            text: text.into(),
            speaker: None,
            kind: NodeKind::MultiWay { choices },
        })
    }

    /// Attaches a speaker label.
    #[must_use]
    pub fn with_speaker(mut self, speaker: impl Into<String>) -> Self {
        self.speaker = Some(speaker.into());
        self
    }

    /// Wraps the node in a shareable reference.
    #[must_use]
    pub fn into_ref(self) -> NodeRef {
        Arc::new(self)
    }

    /// The display text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The speaker label, if any.
    #[must_use]
    pub fn speaker(&self) -> Option<&str> {
        self.speaker.as_deref()
    }

    /// The node's variant.
    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Returns whether this node offers choices.
    #[must_use]
    pub fn is_multi_way(&self) -> bool {
        matches!(self.kind, NodeKind::MultiWay { .. })
    }

    /// Number of choices offered; zero for one-way nodes.
    #[must_use]
    pub fn choice_count(&self) -> usize {
        match &self.kind {
            NodeKind::OneWay { .. } => 0,
            NodeKind::MultiWay { choices } => choices.len(),
        }
    }

    /// Choice labels in order. Empty for one-way nodes and for multi-way
    /// nodes built without choices.
    #[must_use]
    pub fn choices_text(&self) -> Vec<&str> {
        match &self.kind {
            NodeKind::OneWay { .. } => Vec::new(),
            NodeKind::MultiWay { choices } => {
                choices.iter().map(|choice| choice.text.as_str()).collect()
            }
        }
    }

    /// Follows the link for `choice_index`.
    ///
    /// One-way nodes ignore the index. Multi-way nodes return `None` when the
    /// index is out of range or the chosen slot has no successor; `None` means
    /// the dialogue ends here.
    #[must_use]
    pub fn next(&self, choice_index: u8) -> Option<NodeRef> {
        match &self.kind {
            NodeKind::OneWay { next } => next.clone(),
            NodeKind::MultiWay { choices } => choices
                .get(usize::from(choice_index))
                .and_then(|choice| choice.next.clone()),
        }
    }
}

impl Drop for DialogueNode {
    // Unlinks successors with a work list so a long chain is not released
    // one nested drop per node.
    fn drop(&mut self) {
        let mut pending = self.kind.take_successors();
        while let Some(next) = pending.pop() {
            if let Some(mut node) = Arc::into_inner(next) {
                pending.append(&mut node.kind.take_successors());
            }
        }
    }
}

impl NodeKind {
    fn take_successors(&mut self) -> Vec<NodeRef> {
        match self {
            Self::OneWay { next } => next.take().into_iter().collect(),
            Self::MultiWay { choices } => choices
                .iter_mut()
                .filter_map(|choice| choice.next.take())
                .collect(),
        }
    }
}

//! Dialogue scripts: authored node lists built into a node graph.
//!
//! A script names every node by id and links them by id. Building validates
//! the links and produces the root [`NodeRef`]. Successors may be shared, but
//! a node can never lead back to itself.

use std::collections::{HashMap, HashSet};

use branchline_core::error::{DialogueError, GraphConstructionError};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::node::{DialogueNode, NodeRef};

/// A whole dialogue as authored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueScript {
    /// Id of the node the dialogue starts at.
    pub root: String,
    /// Every node of the dialogue.
    pub nodes: Vec<NodeSpec>,
}

/// One authored node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Unique id within the script.
    pub id: String,
    /// Optional speaker label.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker: Option<String>,
    /// The line to reveal.
    pub text: String,
    /// Successor of a one-way node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
    /// Choices of a multi-way node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<ChoiceSpec>>,
}

/// One authored choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceSpec {
    /// Label shown to the player.
    pub text: String,
    /// Id of the node this choice leads to; absent ends the dialogue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

impl DialogueScript {
    /// Parses a script from YAML.
    ///
    /// # Errors
    ///
    /// Returns `DialogueError::ScriptParse` if the document is not a valid script.
    pub fn from_yaml_str(source: &str) -> Result<Self, DialogueError> {
        serde_yaml::from_str(source).map_err(|e| DialogueError::ScriptParse(e.to_string()))
    }

    /// Parses a script from JSON.
    ///
    /// # Errors
    ///
    /// Returns `DialogueError::ScriptParse` if the document is not a valid script.
    pub fn from_json_str(source: &str) -> Result<Self, DialogueError> {
        serde_json::from_str(source).map_err(|e| DialogueError::ScriptParse(e.to_string()))
    }

    /// Validates the script and builds its node graph.
    ///
    /// # Errors
    ///
    /// Returns `DialogueError::Graph` for duplicate ids, a missing root,
    /// dangling links, nodes that declare both `next` and `choices`, cycles,
    /// or a node with more choices than a byte can address.
    pub fn build(&self) -> Result<NodeRef, DialogueError> {
        let specs = self.index()?;
        let built = build_graph(&self.root, &specs)?;

        let unreachable = specs.len() - built.len();
        if unreachable > 0 {
            warn!(unreachable, "script declares nodes unreachable from the root");
        }
        debug!(root = %self.root, nodes = built.len(), "built dialogue graph");

        built
            .get(self.root.as_str())
            .cloned()
            .ok_or_else(|| GraphConstructionError::MissingRoot(self.root.clone()).into())
    }

    fn index(&self) -> Result<HashMap<&str, &NodeSpec>, GraphConstructionError> {
        let mut specs = HashMap::with_capacity(self.nodes.len());
        for spec in &self.nodes {
            if specs.insert(spec.id.as_str(), spec).is_some() {
                return Err(GraphConstructionError::DuplicateNode(spec.id.clone()));
            }
        }

        if !specs.contains_key(self.root.as_str()) {
            return Err(GraphConstructionError::MissingRoot(self.root.clone()));
        }

        for spec in &self.nodes {
            if spec.next.is_some() && spec.choices.is_some() {
                return Err(GraphConstructionError::AmbiguousSuccessor(spec.id.clone()));
            }
            for target in spec.links() {
                if !specs.contains_key(target) {
                    return Err(GraphConstructionError::UnknownNode {
                        from: spec.id.clone(),
                        to: target.to_owned(),
                    });
                }
            }
        }

        Ok(specs)
    }
}

impl NodeSpec {
    fn links(&self) -> impl Iterator<Item = &str> {
        let choice_links = self
            .choices
            .iter()
            .flatten()
            .filter_map(|choice| choice.next.as_deref());
        self.next.as_deref().into_iter().chain(choice_links)
    }
}

/// Builds every node reachable from `root`, successors before the nodes that
/// link to them. Uses an explicit work stack so script depth is bounded only
/// by memory.
fn build_graph<'a>(
    root: &'a str,
    specs: &HashMap<&'a str, &'a NodeSpec>,
) -> Result<HashMap<&'a str, NodeRef>, GraphConstructionError> {
    let mut built: HashMap<&str, NodeRef> = HashMap::new();
    let mut in_progress = HashSet::new();
    // (id, successors already scheduled)
    let mut stack = vec![(root, false)];

    while let Some((id, expanded)) = stack.pop() {
        if built.contains_key(id) {
            continue;
        }
        let spec = specs
            .get(id)
            .copied()
            .ok_or_else(|| GraphConstructionError::MissingRoot(id.to_owned()))?;

        if expanded {
            let node = assemble(spec, &built)?;
            in_progress.remove(id);
            built.insert(id, node);
            continue;
        }

        // An unbuilt node popped while still in progress was scheduled by one
        // of its own descendants.
        if !in_progress.insert(id) {
            return Err(GraphConstructionError::Cycle(id.to_owned()));
        }
        stack.push((id, true));
        stack.extend(
            spec.links()
                .filter(|target| !built.contains_key(target))
                .map(|target| (target, false)),
        );
    }

    Ok(built)
}

/// Creates the node for `spec` once all of its successors are built.
fn assemble(
    spec: &NodeSpec,
    built: &HashMap<&str, NodeRef>,
) -> Result<NodeRef, GraphConstructionError> {
    let successor = |target: Option<&str>| -> Result<Option<NodeRef>, GraphConstructionError> {
        target
            .map(|to| {
                built.get(to).cloned().ok_or_else(|| GraphConstructionError::UnknownNode {
                    from: spec.id.clone(),
                    to: to.to_owned(),
                })
            })
            .transpose()
    };

    let node = if let Some(choices) = &spec.choices {
        if choices.is_empty() {
            warn!(node = %spec.id, "multi-way node declares no choices");
        }
        let labels: Vec<&str> = choices.iter().map(|choice| choice.text.as_str()).collect();
        let successors = choices
            .iter()
            .map(|choice| successor(choice.next.as_deref()))
            .collect::<Result<Vec<_>, _>>()?;
        DialogueNode::multi_way(spec.text.as_str(), labels, successors)?
    } else {
        DialogueNode::one_way(spec.text.as_str(), successor(spec.next.as_deref())?)
    };

    Ok(match &spec.speaker {
        Some(speaker) => node.with_speaker(speaker.as_str()),
        None => node,
    }
    .into_ref())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::node::NodeKind;

    const FIRST_DIALOGUE: &str = r#"
root: opening
nodes:
  - id: opening
    speaker: Narrator
    text: What do you do when you are bored?
    next: pick
  - id: pick
    text: Choose from
    choices:
      - text: "1"
        next: finale
      - text: "2"
        next: second
  - id: finale
    text: Hello this is finale
  - id: second
    text: Choice 2
"#;

    #[test]
    fn test_yaml_script_builds_linked_graph() {
        // Arrange
        let script = DialogueScript::from_yaml_str(FIRST_DIALOGUE).unwrap();

        // Act
        let root = script.build().unwrap();

        // Assert
        assert_eq!(root.speaker(), Some("Narrator"));
        let pick = root.next(0).unwrap();
        assert_eq!(pick.choices_text(), vec!["1", "2"]);
        assert_eq!(pick.next(0).unwrap().text(), "Hello this is finale");
        assert_eq!(pick.next(1).unwrap().text(), "Choice 2");
        assert!(pick.next(1).unwrap().next(0).is_none());
    }

    #[test]
    fn test_json_script_with_terminal_choice() {
        let source = r#"{
            "root": "ask",
            "nodes": [
                { "id": "ask", "text": "Stay?", "choices": [
                    { "text": "yes", "next": "stay" },
                    { "text": "no" }
                ]},
                { "id": "stay", "text": "Good." }
            ]
        }"#;

        let root = DialogueScript::from_json_str(source).unwrap().build().unwrap();

        assert_eq!(root.next(0).unwrap().text(), "Good.");
        assert!(root.next(1).is_none());
    }

    #[test]
    fn test_shared_successor_is_built_once() {
        let source = r"
root: a
nodes:
  - id: a
    text: A
    choices:
      - text: left
        next: end
      - text: right
        next: end
  - id: end
    text: End
";

        let root = DialogueScript::from_yaml_str(source).unwrap().build().unwrap();

        assert!(Arc::ptr_eq(&root.next(0).unwrap(), &root.next(1).unwrap()));
    }

    #[test]
    fn test_empty_choice_list_builds_multi_way_node() {
        let source = r"
root: a
nodes:
  - id: a
    text: Nothing to pick
    choices: []
";

        let root = DialogueScript::from_yaml_str(source).unwrap().build().unwrap();

        assert!(matches!(root.kind(), NodeKind::MultiWay { choices } if choices.is_empty()));
    }

    #[test]
    fn test_deep_linear_script_builds_without_recursion() {
        // Arrange
        let length = 50_000;
        let nodes = (0..length)
            .map(|i| NodeSpec {
                id: format!("n{i}"),
                speaker: None,
                text: format!("line {i}"),
                next: (i + 1 < length).then(|| format!("n{}", i + 1)),
                choices: None,
            })
            .collect();
        let script = DialogueScript {
            root: "n0".to_owned(),
            nodes,
        };

        // Act
        let root = script.build().unwrap();

        // Assert
        let mut visited = 1;
        let mut current = root.clone();
        while let Some(next) = current.next(0) {
            current = next;
            visited += 1;
        }
        assert_eq!(visited, length);
        assert_eq!(current.text(), format!("line {}", length - 1));
        drop(current);
        drop(root);
    }

    #[test]
    fn test_rejects_cycle_reached_through_a_choice() {
        let source = r"
root: a
nodes:
  - id: a
    text: A
    choices:
      - text: stay
        next: b
      - text: leave
  - id: b
    text: B
    next: a
";

        let result = DialogueScript::from_yaml_str(source).unwrap().build();

        assert!(matches!(
            result,
            Err(DialogueError::Graph(GraphConstructionError::Cycle(_)))
        ));
    }

    #[test]
    fn test_rejects_cycle() {
        let source = r"
root: a
nodes:
  - id: a
    text: A
    next: b
  - id: b
    text: B
    next: a
";

        let result = DialogueScript::from_yaml_str(source).unwrap().build();

        assert!(matches!(
            result,
            Err(DialogueError::Graph(GraphConstructionError::Cycle(id))) if id == "a"
        ));
    }

    #[test]
    fn test_rejects_unknown_link() {
        let source = r"
root: a
nodes:
  - id: a
    text: A
    next: ghost
";

        let result = DialogueScript::from_yaml_str(source).unwrap().build();

        assert!(matches!(
            result,
            Err(DialogueError::Graph(GraphConstructionError::UnknownNode { from, to }))
                if from == "a" && to == "ghost"
        ));
    }

    #[test]
    fn test_rejects_duplicate_ids_and_missing_root() {
        let duplicate = DialogueScript {
            root: "a".to_owned(),
            nodes: vec![
                NodeSpec {
                    id: "a".to_owned(),
                    speaker: None,
                    text: "one".to_owned(),
                    next: None,
                    choices: None,
                },
                NodeSpec {
                    id: "a".to_owned(),
                    speaker: None,
                    text: "two".to_owned(),
                    next: None,
                    choices: None,
                },
            ],
        };
        let rootless = DialogueScript {
            root: "missing".to_owned(),
            nodes: Vec::new(),
        };

        assert!(matches!(
            duplicate.build(),
            Err(DialogueError::Graph(GraphConstructionError::DuplicateNode(_)))
        ));
        assert!(matches!(
            rootless.build(),
            Err(DialogueError::Graph(GraphConstructionError::MissingRoot(_)))
        ));
    }

    #[test]
    fn test_rejects_node_with_next_and_choices() {
        let source = r"
root: a
nodes:
  - id: a
    text: A
    next: a
    choices:
      - text: x
";

        let result = DialogueScript::from_yaml_str(source).unwrap().build();

        assert!(matches!(
            result,
            Err(DialogueError::Graph(GraphConstructionError::AmbiguousSuccessor(_)))
        ));
    }

    #[test]
    fn test_malformed_yaml_is_a_parse_error() {
        let result = DialogueScript::from_yaml_str("root: [unterminated");

        assert!(matches!(result, Err(DialogueError::ScriptParse(_))));
    }
}

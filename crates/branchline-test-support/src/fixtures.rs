//! Ready-made dialogue graphs.

use branchline_graph::domain::node::{DialogueNode, NodeRef};

/// Builds one-way nodes linked in order, the last one terminal.
///
/// # Panics
///
/// Panics if `texts` is empty.
#[must_use]
pub fn linear_chain(texts: &[&str]) -> NodeRef {
    let (last, rest) = texts
        .split_last()
        .expect("linear_chain needs at least one line");
    rest.iter()
        .rev()
        .fold(DialogueNode::terminal(*last).into_ref(), |next, text| {
            DialogueNode::one_way(*text, Some(next)).into_ref()
        })
}

/// "Choose from" with choices `"1"` and `"2"`, leading to the terminal lines
/// "Hello this is finale" and "Choice 2".
///
/// # Panics
///
/// Never in practice; the choice lists are built with matching lengths.
#[must_use]
pub fn two_way_choice() -> NodeRef {
    let finale = DialogueNode::terminal("Hello this is finale").into_ref();
    let second = DialogueNode::terminal("Choice 2").into_ref();
    DialogueNode::multi_way("Choose from", vec!["1", "2"], vec![Some(finale), Some(second)])
        .expect("two labels and two successors")
        .into_ref()
}

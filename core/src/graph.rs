//! Transition graph.
//!
//! Graphs go through two phases. A [`GraphBuilder`] is an arena of nodes
//! addressed by [`NodeId`]; the compiler and the combinator append nodes and
//! edges to it, including shortcut (epsilon) edges and cycles. Once every
//! shortcut has been eliminated it is frozen into a [`Graph`], which the
//! matcher only ever reads.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::token::Token;
use crate::transition::{Predicate, Reducer};

/// Index of a node inside a graph.
pub type NodeId = usize;

/// Entry point of every graph.
pub const INITIAL_NODE: NodeId = 0;
/// Terminal node reached by accepted input.
pub const SUCCESS_NODE: NodeId = 1;
/// Terminal node reached by rejected input.
pub const ERROR_NODE: NodeId = 2;
/// First id handed out by [`GraphBuilder::inject_node`].
pub const FIRST_CUSTOM_NODE: NodeId = 3;

/// Returns `true` for [`SUCCESS_NODE`] and [`ERROR_NODE`].
pub fn is_terminal_node(node: NodeId) -> bool {
    node == SUCCESS_NODE || node == ERROR_NODE
}

/// Edge target plus the reducer run when the edge is taken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub to: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reducer: Option<Reducer>,
}

impl Transition {
    pub fn new(to: NodeId, reducer: Option<Reducer>) -> Self {
        Self { to, reducer }
    }
}

/// A graph node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Exact-token transitions.
    #[serde(with = "static_table")]
    pub statics: BTreeMap<Token, Vec<Transition>>,
    /// Guarded transitions, evaluated in order.
    pub dynamics: Vec<(Predicate, Transition)>,
    /// Unconditional edges. Always empty in a frozen [`Graph`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub shortcuts: Vec<NodeId>,
}

impl Node {
    /// Returns `true` when the node has no outgoing edge of any kind.
    pub fn is_empty(&self) -> bool {
        self.statics.is_empty() && self.dynamics.is_empty() && self.shortcuts.is_empty()
    }
}

// Token keys are not strings, so tables serialize as lists of entries.
mod static_table {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer, Serializer};

    use super::Transition;
    use crate::token::Token;

    pub fn serialize<S: Serializer>(
        table: &BTreeMap<Token, Vec<Transition>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(table.iter())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<Token, Vec<Transition>>, D::Error> {
        let entries: Vec<(Token, Vec<Transition>)> = Vec::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}

/// Mutable node arena used while compiling and combining.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphBuilder {
    nodes: Vec<Node>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    /// Creates a graph holding only the three reserved nodes.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default(); FIRST_CUSTOM_NODE],
        }
    }

    /// Appends an empty node and returns its id.
    pub fn inject_node(&mut self) -> NodeId {
        self.push_node(Node::default())
    }

    pub(crate) fn push_node(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn register_static(
        &mut self,
        from: NodeId,
        key: Token,
        to: NodeId,
        reducer: Option<Reducer>,
    ) {
        self.nodes[from]
            .statics
            .entry(key)
            .or_default()
            .push(Transition::new(to, reducer));
    }

    pub fn register_dynamic(
        &mut self,
        from: NodeId,
        predicate: Predicate,
        to: NodeId,
        reducer: Option<Reducer>,
    ) {
        self.nodes[from]
            .dynamics
            .push((predicate, Transition::new(to, reducer)));
    }

    pub fn register_shortcut(&mut self, from: NodeId, to: NodeId) {
        self.nodes[from].shortcuts.push(to);
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= FIRST_CUSTOM_NODE
    }

    /// Number of shortcut edges still present.
    pub fn shortcut_count(&self) -> usize {
        self.nodes.iter().map(|node| node.shortcuts.len()).sum()
    }

    /// Converts the arena into a read-only graph.
    ///
    /// Callers must eliminate shortcuts first; see
    /// [`eliminate_shortcuts`](crate::eliminate_shortcuts).
    pub(crate) fn freeze(self) -> Graph {
        debug_assert_eq!(self.shortcut_count(), 0, "frozen graphs cannot hold shortcuts");
        Graph { nodes: self.nodes }
    }
}

/// Immutable, shortcut-free transition graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    nodes: Vec<Node>,
}

impl Graph {
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= FIRST_CUSTOM_NODE
    }

    /// Total number of static and dynamic edges.
    pub fn transition_count(&self) -> usize {
        self.nodes
            .iter()
            .map(|node| {
                node.statics.values().map(Vec::len).sum::<usize>() + node.dynamics.len()
            })
            .sum()
    }
}

fn node_label(id: NodeId) -> String {
    match id {
        INITIAL_NODE => "initial".to_string(),
        SUCCESS_NODE => "success".to_string(),
        ERROR_NODE => "error".to_string(),
        _ => id.to_string(),
    }
}

fn reducer_label(reducer: &Option<Reducer>) -> String {
    match reducer {
        Some(reducer) => format!(" {reducer:?}"),
        None => String::new(),
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, node) in self.nodes.iter().enumerate() {
            if node.is_empty() {
                continue;
            }
            writeln!(f, "node {}:", node_label(id))?;
            for (key, transitions) in &node.statics {
                for transition in transitions {
                    writeln!(
                        f,
                        "  {key} -> {}{}",
                        node_label(transition.to),
                        reducer_label(&transition.reducer)
                    )?;
                }
            }
            for (predicate, transition) in &node.dynamics {
                writeln!(
                    f,
                    "  {predicate:?} -> {}{}",
                    node_label(transition.to),
                    reducer_label(&transition.reducer)
                )?;
            }
        }
        Ok(())
    }
}

//! Graph combination with shortcut elimination.
//!
//! Each command compiles into its own subgraph. [`merge_graphs`] lays them
//! out side by side in one arena, sharing the reserved success and error
//! nodes, and links the combined initial node to every subgraph entry with a
//! shortcut. [`eliminate_shortcuts`] then folds every shortcut into plain
//! transitions so the matcher never has to follow epsilon edges.
//!
//! # Example
//!
//! ```
//! use command_grammar_core::*;
//!
//! let mut install = CommandBuilder::new(0);
//! install.add_path(["install"])?;
//! let mut add = CommandBuilder::new(1);
//! add.add_path(["add"])?.add_rest("packages", 1)?;
//!
//! let graph = combine(&[install.compile("yarn"), add.compile("yarn")]);
//! assert!(graph.nodes().iter().all(|node| node.shortcuts.is_empty()));
//! assert_eq!(graph.node(INITIAL_NODE).statics[&Token::StartOfInput].len(), 2);
//! # Ok::<(), GrammarError>(())
//! ```

use std::collections::{HashSet, VecDeque};

use tracing::debug;

use crate::graph::{FIRST_CUSTOM_NODE, Graph, GraphBuilder, INITIAL_NODE, Node, NodeId, Transition};

/// Places every subgraph in one arena.
///
/// A subgraph's initial node lands at the first free id and its custom nodes
/// follow in order; terminal ids are left untouched.
pub fn merge_graphs(subgraphs: &[GraphBuilder]) -> GraphBuilder {
    let mut merged = GraphBuilder::new();

    for subgraph in subgraphs {
        let offset = merged.len();
        let remap = |id: NodeId| -> NodeId {
            match id {
                INITIAL_NODE => offset,
                id if id >= FIRST_CUSTOM_NODE => offset + id - (FIRST_CUSTOM_NODE - 1),
                terminal => terminal,
            }
        };

        let ids = std::iter::once(INITIAL_NODE).chain(FIRST_CUSTOM_NODE..subgraph.len());
        for id in ids {
            merged.push_node(renumber(subgraph.node(id), remap));
        }

        merged.register_shortcut(INITIAL_NODE, offset);
    }

    debug!(
        subgraphs = subgraphs.len(),
        nodes = merged.len(),
        "Merged command subgraphs"
    );

    merged
}

fn renumber(node: &Node, remap: impl Fn(NodeId) -> NodeId) -> Node {
    let retarget = |transition: &Transition| Transition::new(remap(transition.to), transition.reducer.clone());

    Node {
        statics: node
            .statics
            .iter()
            .map(|(key, transitions)| (key.clone(), transitions.iter().map(retarget).collect()))
            .collect(),
        dynamics: node
            .dynamics
            .iter()
            .map(|(predicate, transition)| (predicate.clone(), retarget(transition)))
            .collect(),
        shortcuts: node.shortcuts.iter().map(|&id| remap(id)).collect(),
    }
}

/// Replaces every shortcut with copies of the transitions it leads to.
///
/// Each node receives the transitions of every node reachable through one or
/// more shortcuts, skipping exact duplicates (same key or predicate, same
/// target). Shortcut cycles are handled; the result does not depend on the
/// order nodes are visited in.
pub fn eliminate_shortcuts(graph: &mut GraphBuilder) {
    let originals = graph.nodes().to_vec();
    let mut folded = 0usize;

    for (id, original) in originals.iter().enumerate() {
        if original.shortcuts.is_empty() {
            continue;
        }

        let reachable = shortcut_closure(&originals, id);
        let node = graph.node_mut(id);
        for target in reachable {
            absorb(node, &originals[target]);
        }
        folded += node.shortcuts.len();
        node.shortcuts.clear();
    }

    debug!(folded, nodes = originals.len(), "Eliminated shortcuts");
}

/// Merges, eliminates shortcuts and freezes in one step.
pub fn combine(subgraphs: &[GraphBuilder]) -> Graph {
    let mut merged = merge_graphs(subgraphs);
    eliminate_shortcuts(&mut merged);
    merged.freeze()
}

/// Nodes reachable from `start` through shortcuts only, breadth-first.
fn shortcut_closure(nodes: &[Node], start: NodeId) -> Vec<NodeId> {
    let mut seen = HashSet::from([start]);
    let mut queue: VecDeque<NodeId> = nodes[start].shortcuts.iter().copied().collect();
    let mut reachable = Vec::new();

    while let Some(id) = queue.pop_front() {
        if !seen.insert(id) {
            continue;
        }
        reachable.push(id);
        queue.extend(nodes[id].shortcuts.iter().copied());
    }

    reachable
}

fn absorb(node: &mut Node, source: &Node) {
    for (key, transitions) in &source.statics {
        let store = node.statics.entry(key.clone()).or_default();
        for transition in transitions {
            if !store.iter().any(|existing| existing.to == transition.to) {
                store.push(transition.clone());
            }
        }
    }

    for (predicate, transition) in &source.dynamics {
        let duplicate = node
            .dynamics
            .iter()
            .any(|(existing, to)| existing == predicate && to.to == transition.to);
        if !duplicate {
            node.dynamics.push((predicate.clone(), transition.clone()));
        }
    }
}

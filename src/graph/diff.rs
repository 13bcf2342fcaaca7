//! Snapshot-to-snapshot change detection.
//!
//! [`diff_graphs`] classifies what changed between the last-compiled graph
//! and the current one so the engine can pick a compile strategy. It is a
//! pure function over two snapshots; the `revision` counter provides the
//! no-edit fast path without a field-by-field comparison.

use ahash::{AHashMap, AHashSet};
use itertools::Itertools;

use super::{Graph, Node};

/// What changed between two graph snapshots.
#[derive(Debug, Clone, Default)]
pub struct GraphDelta {
    /// Node ids present only in the current graph.
    pub added_nodes: AHashSet<String>,
    /// Node ids present only in the previous graph.
    pub removed_nodes: AHashSet<String>,
    /// Node ids present in both whose kind, parameter values, or mode
    /// overrides differ.
    pub changed_nodes: AHashSet<String>,
    /// Some shared node changed its kind.
    pub kind_changed: bool,
    /// The connection route set differs.
    pub connections_changed: bool,
}

impl GraphDelta {
    /// Nodes added or removed, or any node's kind changed.
    pub fn structure_changed(&self) -> bool {
        !self.added_nodes.is_empty() || !self.removed_nodes.is_empty() || self.kind_changed
    }

    /// The conservative recompilation frontier: changed plus added nodes.
    pub fn affected_nodes(&self) -> AHashSet<String> {
        self.changed_nodes
            .union(&self.added_nodes)
            .cloned()
            .collect()
    }

    pub fn is_clean(&self) -> bool {
        self.added_nodes.is_empty()
            && self.removed_nodes.is_empty()
            && self.changed_nodes.is_empty()
            && !self.connections_changed
    }
}

/// Compares two snapshots and categorizes every difference.
///
/// With no previous graph, every node counts as added. When both snapshots
/// carry the same revision no edit occurred and an empty delta is returned
/// without comparing anything.
pub fn diff_graphs(previous: Option<&Graph>, current: &Graph) -> GraphDelta {
    let Some(previous) = previous else {
        return GraphDelta {
            added_nodes: current.nodes.iter().map(|n| n.id.clone()).collect(),
            connections_changed: !current.connections.is_empty(),
            ..GraphDelta::default()
        };
    };

    if previous.revision == current.revision {
        return GraphDelta::default();
    }

    let previous_nodes: AHashMap<&str, &Node> =
        previous.nodes.iter().map(|n| (n.id.as_str(), n)).collect();
    let current_nodes: AHashMap<&str, &Node> =
        current.nodes.iter().map(|n| (n.id.as_str(), n)).collect();

    let mut delta = GraphDelta::default();

    for (id, node) in &current_nodes {
        match previous_nodes.get(id) {
            None => {
                delta.added_nodes.insert((*id).to_string());
            }
            Some(old) => {
                if !old.same_content(node) {
                    delta.changed_nodes.insert((*id).to_string());
                    if old.kind != node.kind {
                        delta.kind_changed = true;
                    }
                }
            }
        }
    }
    for id in previous_nodes.keys() {
        if !current_nodes.contains_key(id) {
            delta.removed_nodes.insert((*id).to_string());
        }
    }

    delta.connections_changed = route_set(previous) != route_set(current);
    delta
}

/// True iff the two snapshots differ only in node position or other view
/// metadata: equal node-id sets, equal kind and parameters on every shared
/// node, and an equal connection route set. The engine skips recompilation
/// and resource cleanup entirely for such edits.
pub fn is_cosmetic_change(previous: &Graph, current: &Graph) -> bool {
    if previous.nodes.len() != current.nodes.len() {
        return false;
    }
    let previous_nodes: AHashMap<&str, &Node> =
        previous.nodes.iter().map(|n| (n.id.as_str(), n)).collect();
    for node in &current.nodes {
        match previous_nodes.get(node.id.as_str()) {
            Some(old) if old.same_content(node) => {}
            _ => return false,
        }
    }
    route_set(previous) == route_set(current)
}

/// Sorted route tuples, duplicates preserved, so the comparison treats the
/// connection set as a multiset.
fn route_set(graph: &Graph) -> Vec<String> {
    graph
        .connections
        .iter()
        .map(|c| c.route())
        .sorted()
        .collect()
}

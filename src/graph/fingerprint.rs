//! Structural graph fingerprinting.
//!
//! The fingerprint is a cheap equality oracle: two graphs with equal
//! fingerprints are structurally equivalent for recompilation purposes.
//! Position and other view metadata are excluded. The string is never
//! persisted or parsed, only compared.

use itertools::Itertools;

use super::Graph;

/// Derives the structural fingerprint of a graph.
///
/// Format: the sorted node-id list, the sorted connection-id list, and the
/// sorted route-tuple list (`"sourceId:sourceSlot->targetId:targetSlot"`),
/// each segment comma-joined, the three segments joined with `|`.
pub fn structural_fingerprint(graph: &Graph) -> String {
    let nodes = graph.nodes.iter().map(|n| n.id.as_str()).sorted().join(",");
    let connections = graph
        .connections
        .iter()
        .map(|c| c.id.as_str())
        .sorted()
        .join(",");
    let routes = graph
        .connections
        .iter()
        .map(|c| c.route())
        .sorted()
        .join(",");
    format!("{}|{}|{}", nodes, connections, routes)
}

//! The editor's wire format.
//!
//! The visual editor ships patch documents as camelCase JSON. These types
//! mirror that format verbatim; [`IntoGraph`] converts a document (or any
//! custom format) into the canonical [`Graph`], validating the structural
//! invariants on the way in.

use ahash::AHashMap;
use serde::Deserialize;

use super::{
    CombinationMode, Connection, Graph, GraphValidationError, Node, NodeKind, ParamValue, PortRef,
};

/// A complete patch document as produced by the editor.
#[derive(Debug, Deserialize)]
pub struct PatchDocument {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<DocNode>,
    #[serde(default)]
    pub connections: Vec<DocConnection>,
}

/// One node as serialized by the editor.
#[derive(Debug, Deserialize)]
pub struct DocNode {
    pub id: String,
    #[serde(alias = "type")]
    pub kind: String,
    #[serde(default)]
    pub position: [f64; 2],
    #[serde(default)]
    pub params: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    #[serde(alias = "combinationModes")]
    pub modes: AHashMap<String, String>,
}

/// One connection as serialized by the editor. Exactly one of `target_slot`
/// and `target_param` is set.
#[derive(Debug, Deserialize)]
pub struct DocConnection {
    pub id: String,
    pub source: String,
    #[serde(alias = "sourceSlot", alias = "sourceHandle")]
    pub source_slot: String,
    pub target: String,
    #[serde(default)]
    #[serde(alias = "targetSlot", alias = "targetHandle")]
    pub target_slot: Option<String>,
    #[serde(default)]
    #[serde(alias = "targetParam")]
    pub target_param: Option<String>,
}

impl PatchDocument {
    /// Parses a document from the editor's JSON form.
    pub fn from_json(json: &str) -> Result<Self, GraphValidationError> {
        serde_json::from_str(json).map_err(|e| GraphValidationError::Malformed(e.to_string()))
    }
}

/// Conversion from a custom patch format into the canonical [`Graph`].
///
/// Implement this on your own document types to feed the engine from any
/// source; [`PatchDocument`] implements it for the editor's JSON format.
pub trait IntoGraph {
    fn into_graph(self) -> Result<Graph, GraphValidationError>;
}

impl IntoGraph for PatchDocument {
    fn into_graph(self) -> Result<Graph, GraphValidationError> {
        let mut graph = Graph::new(self.id, self.name);

        for doc_node in self.nodes {
            let kind = NodeKind::from_tag(&doc_node.kind).ok_or_else(|| {
                GraphValidationError::UnknownNodeKind {
                    node_id: doc_node.id.clone(),
                    tag: doc_node.kind.clone(),
                }
            })?;

            let mut node = Node::new(doc_node.id.clone(), kind);
            node.position = (doc_node.position[0], doc_node.position[1]);
            for (name, value) in &doc_node.params {
                if let Some(value) = param_value_from_json(value) {
                    node.params.insert(name.clone(), value);
                }
            }
            for (param, tag) in &doc_node.modes {
                if let Some(mode) = CombinationMode::from_tag(tag) {
                    node.mode_overrides.insert(param.clone(), mode);
                }
            }
            graph.nodes.push(node);
        }

        for doc_connection in self.connections {
            let target_port = match (doc_connection.target_slot, doc_connection.target_param) {
                (Some(slot), None) => PortRef::Slot(slot),
                (None, Some(param)) => PortRef::Param(param),
                _ => {
                    return Err(GraphValidationError::AmbiguousTargetPort {
                        connection_id: doc_connection.id,
                    });
                }
            };
            graph.connections.push(Connection {
                id: doc_connection.id,
                source: doc_connection.source,
                source_slot: doc_connection.source_slot,
                target: doc_connection.target,
                target_port,
            });
        }

        graph.validate()?;
        Ok(graph)
    }
}

/// Maps an editor JSON value onto a [`ParamValue`].
///
/// Four-element numeric arrays are vectors (the editor emits colors and
/// 2D ranges that way); any other numeric array is a series. Values that
/// fit no variant (objects, null) are dropped.
fn param_value_from_json(value: &serde_json::Value) -> Option<ParamValue> {
    match value {
        serde_json::Value::Number(n) => n.as_f64().map(ParamValue::Scalar),
        serde_json::Value::Bool(b) => Some(ParamValue::Scalar(if *b { 1.0 } else { 0.0 })),
        serde_json::Value::String(s) => Some(ParamValue::Text(s.clone())),
        serde_json::Value::Array(items) => {
            if items.iter().all(|i| i.is_number()) {
                let numbers: Vec<f64> = items.iter().filter_map(|i| i.as_f64()).collect();
                if numbers.len() == 4 {
                    Some(ParamValue::Vec4([
                        numbers[0], numbers[1], numbers[2], numbers[3],
                    ]))
                } else {
                    Some(ParamValue::Series(numbers))
                }
            } else if items.iter().all(|i| i.is_array()) {
                let rows: Vec<Vec<f64>> = items
                    .iter()
                    .filter_map(|row| row.as_array())
                    .map(|row| row.iter().filter_map(|i| i.as_f64()).collect())
                    .collect();
                Some(ParamValue::Grid(rows))
            } else {
                None
            }
        }
        _ => None,
    }
}

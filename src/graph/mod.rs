//! The canonical patch graph model.
//!
//! A [`Graph`] is the editable document driving compilation: a set of nodes,
//! a set of connections, and per-node parameter values. The engine treats
//! every accepted graph as an immutable snapshot; the `revision` counter
//! stands in for reference identity so the change detector can skip
//! comparison work when no edit occurred.

use ahash::AHashMap;

pub use crate::error::GraphValidationError;

pub mod diff;
pub mod document;
pub mod fingerprint;

/// Composite key identifying one parameter on one node.
///
/// Used everywhere a `(node, parameter)` pair keys a map, instead of a
/// concatenated string, so ids containing separator characters cannot
/// collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParamKey {
    pub node: String,
    pub param: String,
}

impl ParamKey {
    pub fn new(node: impl Into<String>, param: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            param: param.into(),
        }
    }
}

/// A parameter's configured value.
///
/// Only `Scalar` values participate in program binding; the other variants
/// are configuration consumed during code generation (lookup tables, labels,
/// color ramps).
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Scalar(f64),
    Text(String),
    Vec4([f64; 4]),
    Series(Vec<f64>),
    Grid(Vec<Vec<f64>>),
}

impl ParamValue {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            ParamValue::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, ParamValue::Scalar(_))
    }
}

/// How a connected live signal and a static configuration value merge into
/// a parameter's effective value.
///
/// With no connection the effective value is always the configuration value,
/// regardless of mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CombinationMode {
    #[default]
    Override,
    Add,
    Subtract,
    Multiply,
}

impl CombinationMode {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "override" => Some(CombinationMode::Override),
            "add" => Some(CombinationMode::Add),
            "subtract" => Some(CombinationMode::Subtract),
            "multiply" => Some(CombinationMode::Multiply),
            _ => None,
        }
    }

    /// The effective value for a connected parameter.
    pub fn combine(self, config: f64, signal: f64) -> f64 {
        match self {
            CombinationMode::Override => signal,
            CombinationMode::Add => config + signal,
            CombinationMode::Subtract => config - signal,
            CombinationMode::Multiply => config * signal,
        }
    }
}

/// The closed set of node kinds the editor can place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Source,
    Oscillator,
    Noise,
    Gradient,
    Warp,
    Blur,
    Mix,
    Feedback,
    Display,
}

impl NodeKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "source" => Some(NodeKind::Source),
            "oscillator" => Some(NodeKind::Oscillator),
            "noise" => Some(NodeKind::Noise),
            "gradient" => Some(NodeKind::Gradient),
            "warp" => Some(NodeKind::Warp),
            "blur" => Some(NodeKind::Blur),
            "mix" => Some(NodeKind::Mix),
            "feedback" => Some(NodeKind::Feedback),
            "display" => Some(NodeKind::Display),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            NodeKind::Source => "source",
            NodeKind::Oscillator => "oscillator",
            NodeKind::Noise => "noise",
            NodeKind::Gradient => "gradient",
            NodeKind::Warp => "warp",
            NodeKind::Blur => "blur",
            NodeKind::Mix => "mix",
            NodeKind::Feedback => "feedback",
            NodeKind::Display => "display",
        }
    }

    /// Parameters consumed by the host runtime rather than the compiled
    /// program. Editing one never schedules a recompile and never touches
    /// a program slot.
    pub fn runtime_only_params(self) -> &'static [&'static str] {
        match self {
            NodeKind::Source => &["path", "speed", "loop"],
            NodeKind::Display => &["fit"],
            _ => &[],
        }
    }

    pub fn is_runtime_only(self, param: &str) -> bool {
        self.runtime_only_params().contains(&param)
    }

    /// The declared default combination mode for a parameter of this kind,
    /// applied when the node carries no explicit override.
    pub fn default_mode(self, param: &str) -> CombinationMode {
        match (self, param) {
            (NodeKind::Oscillator, "amplitude")
            | (NodeKind::Warp, "strength")
            | (NodeKind::Blur, "radius")
            | (NodeKind::Feedback, "decay") => CombinationMode::Add,
            (NodeKind::Mix, "amount") | (NodeKind::Noise, "scale") => CombinationMode::Multiply,
            _ => CombinationMode::Override,
        }
    }
}

/// Where a connection terminates on its target node: a wired input slot or
/// a named parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PortRef {
    Slot(String),
    Param(String),
}

impl PortRef {
    /// Stable textual form used in route tuples and fingerprints.
    pub fn label(&self) -> String {
        match self {
            PortRef::Slot(slot) => slot.clone(),
            PortRef::Param(param) => format!("param:{}", param),
        }
    }
}

/// A directed connection from one node's output slot to another node's
/// input slot or parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub id: String,
    pub source: String,
    pub source_slot: String,
    pub target: String,
    pub target_port: PortRef,
}

impl Connection {
    /// The parameter name this connection drives, if it targets one.
    pub fn target_param(&self) -> Option<&str> {
        match &self.target_port {
            PortRef::Param(param) => Some(param),
            PortRef::Slot(_) => None,
        }
    }

    /// `"sourceId:sourceSlot->targetId:targetSlot"`, the route tuple shared
    /// with the fingerprint format.
    pub fn route(&self) -> String {
        format!(
            "{}:{}->{}:{}",
            self.source,
            self.source_slot,
            self.target,
            self.target_port.label()
        )
    }
}

/// A single node in the patch.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub position: (f64, f64),
    pub params: AHashMap<String, ParamValue>,
    pub mode_overrides: AHashMap<String, CombinationMode>,
}

impl Node {
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            position: (0.0, 0.0),
            params: AHashMap::new(),
            mode_overrides: AHashMap::new(),
        }
    }

    /// True when two nodes differ only in position.
    pub fn same_content(&self, other: &Node) -> bool {
        self.kind == other.kind
            && self.params == other.params
            && self.mode_overrides == other.mode_overrides
    }
}

/// The editable patch document driving compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    pub id: String,
    pub name: String,
    /// Monotonically increasing snapshot generation, assigned by the engine
    /// when a snapshot is accepted. Equal revisions mean "the same snapshot,
    /// no edit occurred".
    pub revision: u64,
    pub nodes: Vec<Node>,
    pub connections: Vec<Connection>,
}

impl Graph {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            revision: 0,
            nodes: Vec::new(),
            connections: Vec::new(),
        }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// The connection driving `param` on `node_id`, if any. A valid graph
    /// has at most one.
    pub fn connection_to_param(&self, node_id: &str, param: &str) -> Option<&Connection> {
        self.connections
            .iter()
            .find(|c| c.target == node_id && c.target_param() == Some(param))
    }

    /// Resolves the combination mode for a parameter: explicit node override,
    /// else the kind's declared default, else `Override`.
    pub fn resolve_mode(&self, node_id: &str, param: &str) -> CombinationMode {
        match self.node(node_id) {
            Some(node) => node
                .mode_overrides
                .get(param)
                .copied()
                .unwrap_or_else(|| node.kind.default_mode(param)),
            None => CombinationMode::Override,
        }
    }

    /// True when a live signal exclusively drives this parameter: it is
    /// connected and resolves to `Override` mode. Static writes to such a
    /// parameter are skipped; the signal path refreshes the slot instead.
    pub fn is_signal_driven(&self, node_id: &str, param: &str) -> bool {
        self.connection_to_param(node_id, param).is_some()
            && self.resolve_mode(node_id, param) == CombinationMode::Override
    }

    /// The value a parameter resolves to given the current signal sample:
    /// the configured value combined with the signal when connected, the
    /// configured value alone otherwise.
    pub fn effective_value(&self, node_id: &str, param: &str, signal: f64) -> Option<f64> {
        let config = self.node(node_id)?.params.get(param)?.as_scalar()?;
        if self.connection_to_param(node_id, param).is_some() {
            Some(self.resolve_mode(node_id, param).combine(config, signal))
        } else {
            Some(config)
        }
    }

    /// Checks the structural invariants: unique node ids, unique connection
    /// ids, endpoints that exist, and at most one connection per parameter.
    pub fn validate(&self) -> Result<(), GraphValidationError> {
        let mut node_ids = ahash::AHashSet::with_capacity(self.nodes.len());
        for node in &self.nodes {
            if !node_ids.insert(node.id.as_str()) {
                return Err(GraphValidationError::DuplicateNodeId(node.id.clone()));
            }
        }

        let mut connection_ids = ahash::AHashSet::with_capacity(self.connections.len());
        let mut param_targets = ahash::AHashSet::new();
        for connection in &self.connections {
            if !connection_ids.insert(connection.id.as_str()) {
                return Err(GraphValidationError::DuplicateConnectionId(
                    connection.id.clone(),
                ));
            }
            for endpoint in [&connection.source, &connection.target] {
                if !node_ids.contains(endpoint.as_str()) {
                    return Err(GraphValidationError::DanglingConnection {
                        connection_id: connection.id.clone(),
                        node_id: endpoint.clone(),
                    });
                }
            }
            if let Some(param) = connection.target_param()
                && !param_targets.insert((connection.target.as_str(), param))
            {
                return Err(GraphValidationError::ParamDoublyConnected {
                    node_id: connection.target.clone(),
                    param: param.to_string(),
                });
            }
        }

        Ok(())
    }
}

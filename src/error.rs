use thiserror::Error;

/// Errors produced when a graph snapshot violates its structural invariants
/// or a patch document cannot be understood.
#[derive(Error, Debug, Clone)]
pub enum GraphValidationError {
    #[error("failed to parse patch document: {0}")]
    Malformed(String),

    #[error("duplicate node id '{0}'")]
    DuplicateNodeId(String),

    #[error("duplicate connection id '{0}'")]
    DuplicateConnectionId(String),

    #[error("connection '{connection_id}' references missing node '{node_id}'")]
    DanglingConnection {
        connection_id: String,
        node_id: String,
    },

    #[error("parameter '{param}' on node '{node_id}' has more than one incoming connection")]
    ParamDoublyConnected { node_id: String, param: String },

    #[error("node '{node_id}' has unknown kind tag '{tag}'")]
    UnknownNodeKind { node_id: String, tag: String },

    #[error("node '{0}' not found")]
    UnknownNode(String),

    #[error("connection '{connection_id}' must target exactly one of an input slot or a parameter")]
    AmbiguousTargetPort { connection_id: String },
}

/// The compiler reported one or more errors instead of a program.
#[derive(Error, Debug, Clone)]
#[error("compilation failed with {} error(s)", .messages.len())]
pub struct CompileFailure {
    pub messages: Vec<String>,
}

impl CompileFailure {
    pub fn new(messages: Vec<String>) -> Self {
        Self { messages }
    }
}

/// The program failed to build or link from generated code.
#[derive(Error, Debug, Clone)]
#[error("program link failed: {diagnostic}")]
pub struct LinkFailure {
    /// Raw diagnostic from the underlying surface, forwarded verbatim.
    pub diagnostic: String,
}

//! Prelude module for convenient imports
//!
//! Re-exports the types most hosts touch: the graph model, the engine and
//! its scheduling/issue types, and the change-detection entry points.

// Engine and scheduling
pub use crate::engine::{
    DEBOUNCE_WINDOW, EngineIssue, IssueKind, IssueSink, LoggingSink, PatchEngine,
    PatchEngineBuilder, ScheduleState,
};

// Graph model
pub use crate::graph::{
    CombinationMode, Connection, Graph, Node, NodeKind, ParamKey, ParamValue, PortRef,
};

// Editor documents
pub use crate::graph::document::{IntoGraph, PatchDocument};

// Change detection and fingerprinting
pub use crate::graph::diff::{GraphDelta, diff_graphs, is_cosmetic_change};
pub use crate::graph::fingerprint::structural_fingerprint;

// Program binding
pub use crate::program::binding::ProgramBinding;
pub use crate::program::{CompiledProgram, SlotDecl, SlotType};

// Error types
pub use crate::error::{CompileFailure, GraphValidationError, LinkFailure};

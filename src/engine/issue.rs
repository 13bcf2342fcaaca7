//! Structured failure reporting.
//!
//! Every failure inside the engine is classified into an [`EngineIssue`]
//! and handed to the injected [`IssueSink`]; nothing escapes as a panic and
//! no failure tears down the active program. The sink is supplied at
//! construction; there is no ambient global handler.

use crate::backend::LinkFailure;
use crate::compile::CompileFailure;
use crate::graph::GraphValidationError;

/// Failure classification, mirroring where in the pipeline it arose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    /// A malformed graph was handed to the engine; the edit was ignored.
    InvalidGraph,
    /// The compiler returned errors; the previous program keeps rendering.
    CompileFailed,
    /// The generated code failed to build or link; same recovery.
    LinkFailed,
}

/// A structured error delivered to the host.
#[derive(Debug, Clone)]
pub struct EngineIssue {
    pub kind: IssueKind,
    pub message: String,
    pub details: Vec<String>,
}

impl EngineIssue {
    pub fn invalid_graph(error: &GraphValidationError) -> Self {
        Self {
            kind: IssueKind::InvalidGraph,
            message: error.to_string(),
            details: Vec::new(),
        }
    }

    pub fn compile_failed(failure: &CompileFailure) -> Self {
        Self {
            kind: IssueKind::CompileFailed,
            message: failure.to_string(),
            details: failure.messages.clone(),
        }
    }

    pub fn link_failed(failure: &LinkFailure) -> Self {
        Self {
            kind: IssueKind::LinkFailed,
            message: "program link failed".to_string(),
            details: vec![failure.diagnostic.clone()],
        }
    }
}

/// Receives engine failures. Implementations must not call back into the
/// engine.
pub trait IssueSink {
    fn report(&self, issue: EngineIssue);
}

/// Default sink: forwards issues to the `tracing` log stream.
#[derive(Debug, Default)]
pub struct LoggingSink;

impl IssueSink for LoggingSink {
    fn report(&self, issue: EngineIssue) {
        tracing::warn!(kind = ?issue.kind, message = %issue.message, "engine issue");
        for detail in &issue.details {
            tracing::warn!(detail = %detail, "engine issue detail");
        }
    }
}

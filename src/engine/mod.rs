//! The compilation scheduler.
//!
//! [`PatchEngine`] owns the live graph and turns edit events into the
//! cheapest sufficient reaction: a direct uniform write, an immediate
//! recompile on the next pump, or a debounced recompile that coalesces a
//! burst of structural edits into one compiler invocation. On success the
//! active program is swapped atomically and parameter state carries over;
//! on any failure the previous program keeps rendering and the failure is
//! routed to the injected [`IssueSink`].
//!
//! The engine is single-threaded and cooperatively scheduled: the host
//! passes the current time into the edit entry points, calls [`pump`] to
//! run a due compile job, and calls [`begin_frame`] once per frame to drain
//! the coalesced render request.
//!
//! [`pump`]: PatchEngine::pump
//! [`begin_frame`]: PatchEngine::begin_frame

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::backend::RenderBackend;
use crate::compile::{CompileFailure, PatchCompiler};
use crate::graph::diff::{diff_graphs, is_cosmetic_change};
use crate::graph::fingerprint::structural_fingerprint;
use crate::graph::{Graph, GraphValidationError, ParamKey, ParamValue};
use crate::program::CompiledProgram;
use crate::program::binding::ProgramBinding;
use crate::program::transfer::carry_over_parameters;

mod issue;

pub use issue::{EngineIssue, IssueKind, IssueSink, LoggingSink};

/// How long a burst of structural edits coalesces before compiling.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(100);

/// The scheduler's externally observable state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleState {
    Idle,
    PendingDebounced,
    PendingImmediate,
    Compiling,
}

struct PendingJob {
    due: Instant,
    immediate: bool,
}

/// Configures and constructs a [`PatchEngine`].
pub struct PatchEngineBuilder<C, B> {
    compiler: C,
    backend: B,
    sink: Box<dyn IssueSink>,
    debounce_window: Duration,
}

impl<C: PatchCompiler, B: RenderBackend> PatchEngineBuilder<C, B> {
    pub fn new(compiler: C, backend: B) -> Self {
        Self {
            compiler,
            backend,
            sink: Box::new(LoggingSink),
            debounce_window: DEBOUNCE_WINDOW,
        }
    }

    /// Replaces the default logging sink with an externally supplied handler.
    pub fn with_sink(mut self, sink: Box<dyn IssueSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_debounce_window(mut self, window: Duration) -> Self {
        self.debounce_window = window;
        self
    }

    /// Validates the initial graph and builds the engine with an immediate
    /// compile job armed; the first [`PatchEngine::pump`] produces the
    /// first program.
    pub fn build(
        self,
        mut graph: Graph,
        now: Instant,
    ) -> Result<PatchEngine<C, B>, GraphValidationError> {
        graph.validate()?;
        graph.revision = 1;
        let mut engine = PatchEngine {
            graph,
            next_revision: 2,
            compiler: self.compiler,
            backend: self.backend,
            sink: self.sink,
            debounce_window: self.debounce_window,
            pending: None,
            compiling: false,
            active: None,
            last_compiled_graph: None,
            last_fingerprint: None,
            last_program: None,
            render_wanted: false,
            disposed: false,
        };
        engine.arm(now, true);
        Ok(engine)
    }
}

/// The incremental compilation and parameter-continuity pipeline.
pub struct PatchEngine<C: PatchCompiler, B: RenderBackend> {
    graph: Graph,
    next_revision: u64,
    compiler: C,
    backend: B,
    sink: Box<dyn IssueSink>,
    debounce_window: Duration,
    pending: Option<PendingJob>,
    compiling: bool,
    active: Option<ProgramBinding<B::Program>>,
    last_compiled_graph: Option<Graph>,
    last_fingerprint: Option<String>,
    last_program: Option<CompiledProgram>,
    render_wanted: bool,
    disposed: bool,
}

impl<C: PatchCompiler, B: RenderBackend> PatchEngine<C, B> {
    pub fn builder(compiler: C, backend: B) -> PatchEngineBuilder<C, B> {
        PatchEngineBuilder::new(compiler, backend)
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn state(&self) -> ScheduleState {
        if self.compiling {
            return ScheduleState::Compiling;
        }
        match &self.pending {
            None => ScheduleState::Idle,
            Some(job) if job.immediate => ScheduleState::PendingImmediate,
            Some(_) => ScheduleState::PendingDebounced,
        }
    }

    /// The active program binding, if a compilation has succeeded.
    pub fn active_binding(&self) -> Option<&ProgramBinding<B::Program>> {
        self.active.as_ref()
    }

    /// The fingerprint of the last successfully compiled graph.
    pub fn compiled_fingerprint(&self) -> Option<&str> {
        self.last_fingerprint.as_deref()
    }

    /// Handles one parameter edit.
    ///
    /// Runtime-only parameters update the graph and stop. A scalar edit
    /// that leaves the structural fingerprint untouched writes straight
    /// through to the active program and coalesces its render into the
    /// next frame; anything else schedules a debounced recompile.
    pub fn set_parameter(&mut self, node_id: &str, param: &str, value: ParamValue, now: Instant) {
        if self.disposed {
            return;
        }
        let Some(kind) = self.graph.node(node_id).map(|n| n.kind) else {
            self.sink.report(EngineIssue::invalid_graph(
                &GraphValidationError::UnknownNode(node_id.to_string()),
            ));
            return;
        };

        let scalar = value.as_scalar();
        if let Some(node) = self.graph.node_mut(node_id) {
            node.params.insert(param.to_string(), value);
        }
        self.graph.revision = self.bump_revision();

        if kind.is_runtime_only(param) {
            trace!(node = node_id, param, "runtime-only parameter, nothing to schedule");
            return;
        }

        let fingerprint = structural_fingerprint(&self.graph);
        if self.last_fingerprint.as_deref() != Some(fingerprint.as_str()) {
            debug!(node = node_id, param, "fingerprint moved under a value edit");
            self.arm(now, false);
            return;
        }

        let Some(scalar) = scalar else {
            self.arm(now, false);
            return;
        };
        if self.active.is_none() {
            self.arm(now, false);
            return;
        }

        let driven = self.graph.is_signal_driven(node_id, param);
        if !driven && let Some(binding) = self.active.as_mut() {
            binding.set_parameter(node_id, param, scalar);
        }
        self.render_wanted = true;
    }

    /// Accepts a new graph snapshot from the editor.
    ///
    /// Invalid snapshots are rejected whole: the issue is reported and the
    /// previous graph stays current. Cosmetic edits (position only) replace
    /// the snapshot without scheduling anything. Connection-only rewiring
    /// compiles on the next pump so it lands before the next frame; node
    /// addition, removal, or retyping waits out the debounce window.
    pub fn replace_graph(&mut self, mut graph: Graph, now: Instant) {
        if self.disposed {
            return;
        }
        if let Err(error) = graph.validate() {
            self.sink.report(EngineIssue::invalid_graph(&error));
            return;
        }

        // Assign the fresh revision before diffing: an editor snapshot may
        // arrive carrying any revision, and the detector's fast path must
        // only fire for snapshots this engine accepted.
        graph.revision = self.bump_revision();
        let cosmetic = is_cosmetic_change(&self.graph, &graph);
        let delta = diff_graphs(Some(&self.graph), &graph);
        self.graph = graph;

        if cosmetic || delta.is_clean() {
            trace!("cosmetic graph edit, no recompilation");
            return;
        }
        let connections_only = delta.connections_changed && !delta.structure_changed();
        self.arm(now, connections_only);
    }

    /// Runs the pending compile job if its due time has passed.
    pub fn pump(&mut self, now: Instant) {
        if self.disposed {
            return;
        }
        if !self.pending.as_ref().is_some_and(|job| now >= job.due) {
            return;
        }
        self.pending = None;
        self.compiling = true;
        let swapped = self.recompile();
        self.compiling = false;
        if swapped {
            self.render_wanted = true;
        }
    }

    /// Drains the coalesced render request. Returns true at most once per
    /// frame no matter how many edits arrived since the last call.
    pub fn begin_frame(&mut self) -> bool {
        std::mem::take(&mut self.render_wanted)
    }

    /// Batch-applies live signal samples through the active program and
    /// requests a render. This is the path that refreshes signal-driven
    /// slots after a swap.
    pub fn apply_signal(&mut self, updates: &[(ParamKey, f64)]) {
        if self.disposed {
            return;
        }
        if let Some(binding) = self.active.as_mut() {
            binding.set_parameters(updates);
            self.render_wanted = true;
        }
    }

    /// Cancels any pending job and releases the active program. Idempotent
    /// and safe to call from any state; subsequent edits are ignored.
    pub fn dispose(&mut self) {
        self.pending = None;
        if let Some(mut binding) = self.active.take() {
            binding.dispose();
        }
        self.disposed = true;
    }

    fn bump_revision(&mut self) -> u64 {
        let revision = self.next_revision;
        self.next_revision += 1;
        revision
    }

    /// Arms the single pending-job slot, cancelling whatever was armed
    /// before. An immediate job is due at `now` and runs on the next pump.
    fn arm(&mut self, now: Instant, immediate: bool) {
        let due = if immediate {
            now
        } else {
            now + self.debounce_window
        };
        self.pending = Some(PendingJob { due, immediate });
        debug!(immediate, "recompile armed");
    }

    /// Compiles the current graph and, on success, swaps the active program
    /// and carries parameter state over. Every failure is classified, sent
    /// to the sink, and leaves the active program untouched.
    fn recompile(&mut self) -> bool {
        let delta = diff_graphs(self.last_compiled_graph.as_ref(), &self.graph);
        let affected = delta.affected_nodes();

        let mut incremental_result = None;
        if !delta.connections_changed
            && affected.len() * 2 < self.graph.nodes.len()
            && let Some(previous) = self.last_program.as_ref()
        {
            incremental_result =
                self.compiler
                    .compile_incremental(&self.graph, previous, &affected);
        }
        let incremental = incremental_result.is_some();
        let result: Result<CompiledProgram, CompileFailure> = match incremental_result {
            Some(result) => result,
            None => self.compiler.compile(&self.graph),
        };

        let compiled = match result {
            Ok(compiled) => compiled,
            Err(failure) => {
                self.sink.report(EngineIssue::compile_failed(&failure));
                return false;
            }
        };

        let native = match self.backend.link(&compiled) {
            Ok(native) => native,
            Err(failure) => {
                self.sink.report(EngineIssue::link_failed(&failure));
                return false;
            }
        };

        let mut binding = ProgramBinding::new(native, &compiled);
        let old_values = self.active.as_ref().map(|b| b.stored_values());
        carry_over_parameters(old_values.as_ref(), &self.graph, &mut binding);

        if let Some(mut old) = self.active.replace(binding) {
            old.dispose();
        }

        self.last_fingerprint = Some(structural_fingerprint(&self.graph));
        self.last_compiled_graph = Some(self.graph.clone());
        self.last_program = Some(compiled);
        debug!(
            incremental,
            affected = affected.len(),
            nodes = self.graph.nodes.len(),
            "program swapped"
        );
        true
    }
}

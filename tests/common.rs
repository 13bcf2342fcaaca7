//! Common test utilities: patch builders and recording collaborators.
use std::cell::RefCell;
use std::rc::Rc;

use ahash::AHashSet;
use repatch::backend::{NativeProgram, RenderBackend, SlotLocation};
use repatch::compile::PatchCompiler;
use repatch::prelude::*;
use repatch::program::{SlotDecl, slot_name};

/// Creates a node with the given scalar parameters.
#[allow(dead_code)]
pub fn node(id: &str, kind: NodeKind, params: &[(&str, f64)]) -> Node {
    let mut node = Node::new(id, kind);
    for (name, value) in params {
        node.params
            .insert((*name).to_string(), ParamValue::Scalar(*value));
    }
    node
}

/// Creates a connection into a named parameter (a signal wire).
#[allow(dead_code)]
pub fn connect_param(id: &str, source: &str, target: &str, param: &str) -> Connection {
    Connection {
        id: id.to_string(),
        source: source.to_string(),
        source_slot: "out".to_string(),
        target: target.to_string(),
        target_port: PortRef::Param(param.to_string()),
    }
}

/// Creates a connection into a wired input slot.
#[allow(dead_code)]
pub fn connect_slot(id: &str, source: &str, target: &str, slot: &str) -> Connection {
    Connection {
        id: id.to_string(),
        source: source.to_string(),
        source_slot: "out".to_string(),
        target: target.to_string(),
        target_port: PortRef::Slot(slot.to_string()),
    }
}

/// Assembles a graph from parts.
#[allow(dead_code)]
pub fn patch(nodes: Vec<Node>, connections: Vec<Connection>) -> Graph {
    let mut graph = Graph::new("patch-test", "test");
    graph.nodes = nodes;
    graph.connections = connections;
    graph
}

/// A small patch: an envelope source feeding an oscillator's `frequency`
/// parameter, the oscillator wired into a display.
#[allow(dead_code)]
pub fn signal_patch() -> Graph {
    patch(
        vec![
            node("env", NodeKind::Source, &[]),
            node(
                "osc",
                NodeKind::Oscillator,
                &[("frequency", 2.0), ("phase", 0.25)],
            ),
            node("disp", NodeKind::Display, &[("gamma", 1.0)]),
        ],
        vec![
            connect_param("c-env", "env", "osc", "frequency"),
            connect_slot("c-out", "osc", "disp", "in"),
        ],
    )
}

/// Counts of compiler invocations, by strategy.
#[derive(Default)]
pub struct CompileLog {
    pub full: usize,
    pub incremental: usize,
    pub last_affected: Vec<String>,
}

/// A compiler that declares one float slot per non-runtime scalar parameter
/// and records how it was invoked. Failures are injected through the
/// `fail_next` handle.
pub struct ScriptedCompiler {
    pub log: Rc<RefCell<CompileLog>>,
    pub fail_next: Rc<RefCell<Option<Vec<String>>>>,
    pub support_incremental: bool,
}

impl ScriptedCompiler {
    #[allow(dead_code)]
    pub fn new(support_incremental: bool) -> Self {
        Self {
            log: Rc::new(RefCell::new(CompileLog::default())),
            fail_next: Rc::new(RefCell::new(None)),
            support_incremental,
        }
    }

    fn generate(graph: &Graph) -> CompiledProgram {
        let mut program = CompiledProgram {
            source: format!("// generated for {}", graph.id),
            slots: Vec::new(),
        };
        for node in &graph.nodes {
            let mut names: Vec<&String> = node.params.keys().collect();
            names.sort();
            for param in names {
                let Some(default) = node.params[param].as_scalar() else {
                    continue;
                };
                if node.kind.is_runtime_only(param) {
                    continue;
                }
                program.slots.push(SlotDecl {
                    name: slot_name(&node.id, param),
                    node: node.id.clone(),
                    param: param.clone(),
                    ty: SlotType::Float,
                    default,
                });
            }
        }
        program
    }

    fn take_failure(&self) -> Option<CompileFailure> {
        self.fail_next.borrow_mut().take().map(CompileFailure::new)
    }
}

impl PatchCompiler for ScriptedCompiler {
    fn compile(&mut self, graph: &Graph) -> Result<CompiledProgram, CompileFailure> {
        if let Some(failure) = self.take_failure() {
            return Err(failure);
        }
        self.log.borrow_mut().full += 1;
        Ok(Self::generate(graph))
    }

    fn compile_incremental(
        &mut self,
        graph: &Graph,
        _previous: &CompiledProgram,
        affected_nodes: &AHashSet<String>,
    ) -> Option<Result<CompiledProgram, CompileFailure>> {
        if !self.support_incremental {
            return None;
        }
        if let Some(failure) = self.take_failure() {
            return Some(Err(failure));
        }
        let mut log = self.log.borrow_mut();
        log.incremental += 1;
        log.last_affected = affected_nodes.iter().cloned().collect();
        log.last_affected.sort();
        Some(Ok(Self::generate(graph)))
    }
}

/// Everything one linked program saw.
#[derive(Default)]
pub struct ProgramLog {
    pub activations: usize,
    pub float_writes: Vec<(String, f64)>,
    pub int_writes: Vec<(String, i64)>,
    pub bool_writes: Vec<(String, bool)>,
    pub released: usize,
}

impl ProgramLog {
    /// The last float written to a slot, by slot name.
    #[allow(dead_code)]
    pub fn last_float(&self, name: &str) -> Option<f64> {
        self.float_writes
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }
}

/// The native program handed out by [`TestBackend`]: resolves every slot the
/// backend did not eliminate and records all writes.
pub struct TestProgram {
    names: Vec<String>,
    pub log: Rc<RefCell<ProgramLog>>,
}

impl NativeProgram for TestProgram {
    fn slot_location(&mut self, name: &str) -> Option<SlotLocation> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| SlotLocation(i as u32))
    }

    fn activate(&mut self) {
        self.log.borrow_mut().activations += 1;
    }

    fn write_float(&mut self, location: SlotLocation, value: f64) {
        let name = self.names[location.0 as usize].clone();
        self.log.borrow_mut().float_writes.push((name, value));
    }

    fn write_int(&mut self, location: SlotLocation, value: i64) {
        let name = self.names[location.0 as usize].clone();
        self.log.borrow_mut().int_writes.push((name, value));
    }

    fn write_bool(&mut self, location: SlotLocation, value: bool) {
        let name = self.names[location.0 as usize].clone();
        self.log.borrow_mut().bool_writes.push((name, value));
    }

    fn release(&mut self) {
        self.log.borrow_mut().released += 1;
    }
}

/// A backend that links every program unless told to fail, optionally
/// reporting some slots as eliminated, and keeps a log per linked program.
pub struct TestBackend {
    pub eliminate: Rc<RefCell<AHashSet<String>>>,
    pub fail_next: Rc<RefCell<Option<String>>>,
    pub programs: Rc<RefCell<Vec<Rc<RefCell<ProgramLog>>>>>,
}

impl TestBackend {
    #[allow(dead_code)]
    pub fn new() -> Self {
        Self {
            eliminate: Rc::new(RefCell::new(AHashSet::new())),
            fail_next: Rc::new(RefCell::new(None)),
            programs: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// The log of the most recently linked program.
    #[allow(dead_code)]
    pub fn latest_log(&self) -> Rc<RefCell<ProgramLog>> {
        self.programs
            .borrow()
            .last()
            .expect("no program linked yet")
            .clone()
    }
}

impl RenderBackend for TestBackend {
    type Program = TestProgram;

    fn link(&mut self, program: &CompiledProgram) -> Result<TestProgram, LinkFailure> {
        if let Some(diagnostic) = self.fail_next.borrow_mut().take() {
            return Err(LinkFailure { diagnostic });
        }
        let eliminate = self.eliminate.borrow();
        let names = program
            .slots
            .iter()
            .map(|s| s.name.clone())
            .filter(|name| !eliminate.contains(name))
            .collect();
        let log = Rc::new(RefCell::new(ProgramLog::default()));
        self.programs.borrow_mut().push(log.clone());
        Ok(TestProgram { names, log })
    }
}

/// Collects every issue the engine reports.
#[derive(Default, Clone)]
pub struct RecordingSink(pub Rc<RefCell<Vec<EngineIssue>>>);

impl IssueSink for RecordingSink {
    fn report(&self, issue: EngineIssue) {
        self.0.borrow_mut().push(issue);
    }
}

/// Handles into an engine's collaborators, kept alive alongside it.
#[allow(dead_code)]
pub struct Handles {
    pub compiles: Rc<RefCell<CompileLog>>,
    pub fail_compile: Rc<RefCell<Option<Vec<String>>>>,
    pub eliminate: Rc<RefCell<AHashSet<String>>>,
    pub fail_link: Rc<RefCell<Option<String>>>,
    pub programs: Rc<RefCell<Vec<Rc<RefCell<ProgramLog>>>>>,
    pub issues: Rc<RefCell<Vec<EngineIssue>>>,
}

impl Handles {
    /// The log of the most recently linked program.
    #[allow(dead_code)]
    pub fn latest_log(&self) -> Rc<RefCell<ProgramLog>> {
        self.programs
            .borrow()
            .last()
            .expect("no program linked yet")
            .clone()
    }

    #[allow(dead_code)]
    pub fn total_compiles(&self) -> usize {
        let log = self.compiles.borrow();
        log.full + log.incremental
    }
}

/// Builds an engine over the scripted compiler, recording backend, and
/// recording sink, returning the handles tests assert against.
#[allow(dead_code)]
pub fn build_engine(
    graph: Graph,
    support_incremental: bool,
    now: std::time::Instant,
) -> (PatchEngine<ScriptedCompiler, TestBackend>, Handles) {
    let compiler = ScriptedCompiler::new(support_incremental);
    let backend = TestBackend::new();
    let sink = RecordingSink::default();
    let handles = Handles {
        compiles: compiler.log.clone(),
        fail_compile: compiler.fail_next.clone(),
        eliminate: backend.eliminate.clone(),
        fail_link: backend.fail_next.clone(),
        programs: backend.programs.clone(),
        issues: sink.0.clone(),
    };
    let engine = PatchEngine::builder(compiler, backend)
        .with_sink(Box::new(sink))
        .build(graph, now)
        .expect("initial graph must validate");
    (engine, handles)
}

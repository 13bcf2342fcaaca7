//! # Repatch - Incremental Recompilation Engine for Live Node Patches
//!
//! **Repatch** keeps a user-edited visual patch graph running as a compiled
//! program. It diffs successive graph snapshots to decide whether and how
//! much to recompile, schedules that work so interactive editing never
//! blocks, swaps the compiled program atomically, and carries every
//! parameter's effective value across the swap: zero visible discontinuity,
//! at most one in-flight compile job.
//!
//! ## Core Workflow
//!
//! The engine is deliberately thin at its edges. Code generation and the
//! render surface stay outside, behind two traits:
//!
//! 1.  **Load Your Patch**: Parse the editor's JSON with
//!     [`PatchDocument`](graph::document::PatchDocument), or implement
//!     [`IntoGraph`](graph::document::IntoGraph) for your own format.
//! 2.  **Plug In Collaborators**: Implement [`PatchCompiler`](compile::PatchCompiler)
//!     (graph in, generated program out) and [`RenderBackend`](backend::RenderBackend)
//!     (generated program in, linked native program out).
//! 3.  **Build the Engine**: `PatchEngine::builder(compiler, backend).build(graph, now)`.
//! 4.  **Drive It**: Feed edits in (`set_parameter`, `replace_graph`), call
//!     `pump` when idle, and `begin_frame` once per frame to learn whether
//!     a render is due.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::time::Instant;
//!
//! use repatch::prelude::*;
//! use repatch::backend::{NativeProgram, RenderBackend, SlotLocation};
//! use repatch::compile::PatchCompiler;
//! use repatch::error::{CompileFailure, LinkFailure};
//! use repatch::program::{CompiledProgram, SlotDecl, SlotType, slot_name};
//!
//! // A compiler that declares one uniform slot per scalar parameter.
//! struct SlotPerParam;
//!
//! impl PatchCompiler for SlotPerParam {
//!     fn compile(&mut self, graph: &Graph) -> Result<CompiledProgram, CompileFailure> {
//!         let mut program = CompiledProgram::default();
//!         for node in &graph.nodes {
//!             for (param, value) in &node.params {
//!                 if let Some(default) = value.as_scalar() {
//!                     program.slots.push(SlotDecl {
//!                         name: slot_name(&node.id, param),
//!                         node: node.id.clone(),
//!                         param: param.clone(),
//!                         ty: SlotType::Float,
//!                         default,
//!                     });
//!                 }
//!             }
//!         }
//!         Ok(program)
//!     }
//! }
//!
//! // A backend whose "native program" just numbers its slots.
//! struct Linker;
//! struct Linked(Vec<String>);
//!
//! impl NativeProgram for Linked {
//!     fn slot_location(&mut self, name: &str) -> Option<SlotLocation> {
//!         self.0.iter().position(|n| n == name).map(|i| SlotLocation(i as u32))
//!     }
//!     fn activate(&mut self) {}
//!     fn write_float(&mut self, _location: SlotLocation, _value: f64) {}
//!     fn write_int(&mut self, _location: SlotLocation, _value: i64) {}
//!     fn write_bool(&mut self, _location: SlotLocation, _value: bool) {}
//!     fn release(&mut self) {}
//! }
//!
//! impl RenderBackend for Linker {
//!     type Program = Linked;
//!     fn link(&mut self, program: &CompiledProgram) -> Result<Linked, LinkFailure> {
//!         Ok(Linked(program.slots.iter().map(|s| s.name.clone()).collect()))
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut graph = Graph::new("patch-1", "demo");
//!     let mut node = Node::new("osc", NodeKind::Oscillator);
//!     node.params.insert("frequency".into(), ParamValue::Scalar(2.0));
//!     graph.nodes.push(node);
//!
//!     let now = Instant::now();
//!     let mut engine = PatchEngine::builder(SlotPerParam, Linker).build(graph, now)?;
//!
//!     // First pump compiles; the frame after it renders.
//!     engine.pump(now);
//!     assert!(engine.begin_frame());
//!
//!     // A scalar edit takes the uniform-only path: no recompilation,
//!     // one coalesced render.
//!     engine.set_parameter("osc", "frequency", ParamValue::Scalar(3.5), now);
//!     assert!(engine.begin_frame());
//!     assert!(!engine.begin_frame());
//!
//!     engine.dispose();
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod compile;
pub mod engine;
pub mod error;
pub mod graph;
pub mod prelude;
pub mod program;

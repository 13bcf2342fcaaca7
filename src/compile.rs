//! The graph-to-program compiler seam.
//!
//! Code generation lives outside this crate. The engine only decides when
//! to invoke it and whether an incremental pass is worth asking for; a
//! compiler with no incremental path simply inherits the default
//! [`PatchCompiler::compile_incremental`] and the engine falls back to full
//! compilation transparently.

use ahash::AHashSet;

use crate::graph::Graph;
use crate::program::CompiledProgram;

pub use crate::error::CompileFailure;

/// Generates programs from graphs.
pub trait PatchCompiler {
    /// Full compilation of the whole graph. Always available.
    fn compile(&mut self, graph: &Graph) -> Result<CompiledProgram, CompileFailure>;

    /// Recompiles only the part of the program affected by `affected_nodes`,
    /// given the previous artifact. Returning `None` declines, and the
    /// engine performs a full compilation instead.
    fn compile_incremental(
        &mut self,
        _graph: &Graph,
        _previous: &CompiledProgram,
        _affected_nodes: &AHashSet<String>,
    ) -> Option<Result<CompiledProgram, CompileFailure>> {
        None
    }
}

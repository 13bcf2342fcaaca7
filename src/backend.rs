//! The render-surface seam.
//!
//! The engine never talks to a graphics API directly. A [`RenderBackend`]
//! links a [`CompiledProgram`] into a [`NativeProgram`]; the binding layer
//! then resolves slot locations once and writes values through the typed
//! calls. Swapping backends (GPU, offline export, test recorder) is a type
//! parameter on the engine.

use crate::program::CompiledProgram;

pub use crate::error::LinkFailure;

/// An opaque native handle for one resolved uniform slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotLocation(pub u32);

/// A linked, runnable program owned by the render surface.
///
/// `slot_location` returning `None` is an expected condition: the surface
/// may have eliminated a declared slot as dead code. Writes to such a slot
/// are silently dropped by the binding layer.
pub trait NativeProgram {
    fn slot_location(&mut self, name: &str) -> Option<SlotLocation>;

    /// Makes this program current so subsequent writes land in it.
    fn activate(&mut self);

    fn write_float(&mut self, location: SlotLocation, value: f64);
    fn write_int(&mut self, location: SlotLocation, value: i64);
    fn write_bool(&mut self, location: SlotLocation, value: bool);

    /// Releases the native program object. Called exactly once.
    fn release(&mut self);
}

/// Links compiled programs into native ones.
pub trait RenderBackend {
    type Program: NativeProgram;

    fn link(&mut self, program: &CompiledProgram) -> Result<Self::Program, LinkFailure>;
}

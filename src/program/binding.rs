//! One compiled program bound to its native slots.
//!
//! A [`ProgramBinding`] owns a linked [`NativeProgram`], the cached slot
//! locations and types resolved once at construction, and the raw value
//! store used for continuity transfer across a swap. Values are stored for
//! every write, whether or not the underlying slot survived dead-code
//! elimination.

use ahash::AHashMap;
use tracing::debug;

use crate::backend::{NativeProgram, SlotLocation};
use crate::graph::ParamKey;
use crate::program::{CompiledProgram, SlotType, slot_name};

struct SlotBinding {
    /// `None` when the surface eliminated the slot; writes become no-ops.
    location: Option<SlotLocation>,
    ty: SlotType,
}

/// A compiled program instance with resolved slots and live parameter state.
pub struct ProgramBinding<P: NativeProgram> {
    program: P,
    slots: AHashMap<String, SlotBinding>,
    values: AHashMap<ParamKey, f64>,
    disposed: bool,
}

impl<P: NativeProgram> ProgramBinding<P> {
    /// Binds a linked program: resolves every declared slot's location once
    /// and initializes present slots from their compiler-provided defaults.
    pub fn new(mut program: P, compiled: &CompiledProgram) -> Self {
        let mut slots = AHashMap::with_capacity(compiled.slots.len());

        program.activate();
        for decl in &compiled.slots {
            let location = program.slot_location(&decl.name);
            if location.is_none() {
                debug!(slot = %decl.name, "declared slot absent, writes will be dropped");
            }
            if let Some(location) = location {
                write_typed(&mut program, location, decl.ty, decl.default);
            }
            slots.insert(
                decl.name.clone(),
                SlotBinding {
                    location,
                    ty: decl.ty,
                },
            );
        }

        Self {
            program,
            slots,
            values: AHashMap::new(),
            disposed: false,
        }
    }

    /// Writes one parameter value.
    ///
    /// The raw value is always recorded for later continuity transfer; the
    /// native write happens only when the slot exists in the program.
    pub fn set_parameter(&mut self, node: &str, param: &str, value: f64) {
        self.program.activate();
        self.write_one(node, param, value);
    }

    /// Writes a batch of parameter values under a single program activation.
    pub fn set_parameters(&mut self, updates: &[(ParamKey, f64)]) {
        if updates.is_empty() {
            return;
        }
        self.program.activate();
        for (key, value) in updates {
            self.write_one(&key.node, &key.param, *value);
        }
    }

    fn write_one(&mut self, node: &str, param: &str, value: f64) {
        let name = slot_name(node, param);
        if let Some(slot) = self.slots.get(&name)
            && let Some(location) = slot.location
        {
            write_typed(&mut self.program, location, slot.ty, value);
        }
        self.values.insert(ParamKey::new(node, param), value);
    }

    /// A snapshot copy of every value written so far, keyed by
    /// `(node, parameter)`. Input to the continuity transfer.
    pub fn stored_values(&self) -> AHashMap<ParamKey, f64> {
        self.values.clone()
    }

    pub fn value_of(&self, key: &ParamKey) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn has_value(&self, key: &ParamKey) -> bool {
        self.values.contains_key(key)
    }

    /// True when the declared slot resolved to a live native location.
    pub fn slot_present(&self, node: &str, param: &str) -> bool {
        self.slots
            .get(&slot_name(node, param))
            .is_some_and(|s| s.location.is_some())
    }

    /// Releases the native program and slot caches. Idempotent.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.slots.clear();
        self.program.release();
    }
}

impl<P: NativeProgram> Drop for ProgramBinding<P> {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn write_typed<P: NativeProgram>(program: &mut P, location: SlotLocation, ty: SlotType, value: f64) {
    match ty {
        SlotType::Float => program.write_float(location, value),
        SlotType::Int => program.write_int(location, value.round() as i64),
        SlotType::Bool => program.write_bool(location, value != 0.0),
    }
}

//! Compiled program artifacts and slot naming.
//!
//! A [`CompiledProgram`] is what the external compiler hands back: generated
//! source plus the table of uniform slots it declared. Slot names are a pure
//! function of `(node id, parameter name)`: both the compiler and the
//! binding side derive them with [`slot_name`], so neither needs a separate
//! name index.

pub mod binding;
pub mod transfer;

/// The scalar type a slot was declared with, selecting the native write call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotType {
    Float,
    Int,
    Bool,
}

/// One uniform slot declared by the compiler.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotDecl {
    pub name: String,
    /// The node this slot belongs to.
    pub node: String,
    /// The parameter this slot carries.
    pub param: String,
    pub ty: SlotType,
    /// Initial value until the first parameter write.
    pub default: f64,
}

/// A generated program artifact plus its declared uniform-slot table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledProgram {
    pub source: String,
    pub slots: Vec<SlotDecl>,
}

impl CompiledProgram {
    pub fn slot_for(&self, node: &str, param: &str) -> Option<&SlotDecl> {
        let name = slot_name(node, param);
        self.slots.iter().find(|s| s.name == name)
    }
}

/// Derives the uniform slot name for a `(node id, parameter name)` pair.
///
/// The node id keeps every alphanumeric character and replaces the rest
/// with `_`, prefixed with a letter if it would start with a digit; the
/// parameter name drops non-alphanumerics and upper-cases its first
/// character; the result is `"u" + node + param`. The compiler derives
/// names the same way; any divergence makes uniform binding silently
/// fail.
pub fn slot_name(node_id: &str, param: &str) -> String {
    let mut node: String = node_id
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    if node.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        node.insert(0, 'n');
    }

    let mut param_part = String::with_capacity(param.len());
    for c in param.chars().filter(|c| c.is_alphanumeric()) {
        if param_part.is_empty() {
            param_part.extend(c.to_uppercase());
        } else {
            param_part.push(c);
        }
    }

    format!("u{}{}", node, param_part)
}

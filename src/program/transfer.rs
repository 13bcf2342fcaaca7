//! Parameter continuity across a program swap.
//!
//! After a recompilation the fresh binding starts from compiler defaults.
//! [`carry_over_parameters`] repopulates it so every bound parameter holds
//! the value it would hold had no swap occurred, honoring the *current*
//! graph's connection and combination-mode state, which may differ from the
//! graph the old values were written under.

use ahash::{AHashMap, AHashSet};
use tracing::debug;

use crate::backend::NativeProgram;
use crate::graph::{Graph, ParamKey};
use crate::program::binding::ProgramBinding;

/// Repopulates `binding` from the old binding's value snapshot and the
/// current graph. All writes land in one batch under a single program
/// activation.
///
/// Two passes, in order:
///
/// 1. Every value from the old snapshot carries over unless its node is
///    gone or a live signal exclusively drives the parameter (connected
///    with `Override` mode; the signal path refreshes that slot before
///    the next render, and carrying a stale static value would risk a
///    one-frame flash). Parameters connected with any other mode keep
///    their static value: the program combines it with the signal.
/// 2. Every scalar parameter in the current graph fills the remaining
///    gaps from its configured value, under the same skip rule. This pass
///    never overwrites pass 1; it is authoritative only for parameters
///    the old binding did not cover (newly added ones, ones whose
///    connection state changed, and the entire first compilation).
pub fn carry_over_parameters<P: NativeProgram>(
    old_values: Option<&AHashMap<ParamKey, f64>>,
    graph: &Graph,
    binding: &mut ProgramBinding<P>,
) {
    let mut updates: Vec<(ParamKey, f64)> = Vec::new();
    let mut carried: AHashSet<ParamKey> = AHashSet::new();

    if let Some(old_values) = old_values {
        for (key, value) in old_values {
            if graph.node(&key.node).is_none() {
                continue;
            }
            if graph.is_signal_driven(&key.node, &key.param) {
                continue;
            }
            carried.insert(key.clone());
            updates.push((key.clone(), *value));
        }
    }

    for node in &graph.nodes {
        for (param, value) in &node.params {
            let Some(value) = value.as_scalar() else {
                continue;
            };
            let key = ParamKey::new(node.id.as_str(), param.as_str());
            if carried.contains(&key) {
                continue;
            }
            if graph.is_signal_driven(&node.id, param) {
                continue;
            }
            updates.push((key, value));
        }
    }

    debug!(
        carried = carried.len(),
        filled = updates.len() - carried.len(),
        "transferred parameter state into new program"
    );
    binding.set_parameters(&updates);
}

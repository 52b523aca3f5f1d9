//! Loop-carried slot lifecycle.
//!
//! A While node with inputs `[v0 .. v(k-1), cond, body]` owns `k` slots
//! keyed `(while_id, e)`. Slots are created and seeded from the external
//! inputs the first time the loop runs. Seeding copies the input tensor, so
//! later writes to a slot never alias the input. A slot that already holds a
//! tensor is left alone, which keeps the values a previous run of the same
//! While node left behind. A slot that exists but is still empty is filled
//! as soon as its input has a value.

use scopeflow_core::id::VarKey;
use scopeflow_core::node::Node;
use scopeflow_core::store::VariableStore;

/// Keys of the first `loop_vars` slots of `node`.
pub fn slot_keys(node: &Node, loop_vars: usize) -> impl Iterator<Item = VarKey> + '_ {
    (0..loop_vars as u32).map(move |e| VarKey::slot(node.id, e))
}

/// Creates the missing slots of While `node` and seeds every empty one from
/// its input among the first `loop_vars`. Returns the number of slots that
/// received a tensor.
///
/// When the input has no tensor yet the slot is created (or left) empty.
pub fn seed_loop_slots(store: &mut VariableStore, node: &Node, loop_vars: usize) -> usize {
    let mut seeded = 0;
    for (input, key) in node.inputs().iter().zip(slot_keys(node, loop_vars)) {
        if store.tensor(key).is_some() {
            continue;
        }
        let seed = store.tensor(input.key()).map(|tensor| tensor.dup());
        let slot = store.get_or_create(key);
        if let Some(tensor) = seed {
            slot.set_tensor(tensor);
            seeded += 1;
        }
    }
    if seeded > 0 {
        tracing::debug!("while {}: seeded {} loop slot(s)", node.id, seeded);
    }
    seeded
}

//! Return handling: committing a body's results into the loop slots.
//!
//! A Return node targets a While node. Its `e`-th input becomes the new
//! value of slot `(target, e)`. All values are read before any slot is
//! written, so a body that swaps two slots sees the old values on both
//! sides.

use scopeflow_core::id::{NodeId, VarKey};
use scopeflow_core::node::Node;
use scopeflow_core::ops::Op;
use scopeflow_core::tensor::Tensor;
use scopeflow_core::validate::loop_slot_count;

use super::error::ExecError;
use super::executor::NodeExecutor;
use super::state::Interpreter;

impl<'g, E: NodeExecutor> Interpreter<'g, E> {
    /// Commits the values of Return node `id` into its target's slots.
    pub fn commit_return(&mut self, id: NodeId) -> Result<(), ExecError> {
        let node = self.resolve(id)?;
        self.commit_return_node(node)
    }

    pub(crate) fn commit_return_node(&mut self, node: &'g Node) -> Result<(), ExecError> {
        let Op::Return { target } = node.op else {
            return Err(ExecError::Kernel {
                node: node.id,
                message: format!("{} is not a return", node.op.name()),
            });
        };

        let expected = self
            .graph
            .node(target)
            .and_then(loop_slot_count)
            .ok_or(ExecError::ReturnTargetNotWhile {
                node: node.id,
                target,
            })?;
        if node.inputs.len() != expected {
            return Err(ExecError::ReturnArityMismatch {
                node: node.id,
                expected,
                got: node.inputs.len(),
            });
        }

        let values = node
            .inputs()
            .iter()
            .map(|input| {
                self.store
                    .tensor(input.key())
                    .map(Tensor::dup)
                    .ok_or(ExecError::MissingValue {
                        node: node.id,
                        input: *input,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        for (e, value) in values.into_iter().enumerate() {
            self.store.set_tensor(VarKey::slot(target, e as u32), value);
        }
        tracing::trace!("return {}: committed {} value(s) into while {}", node.id, expected, target);
        Ok(())
    }
}

//! Node executors: the seam between the control-flow interpreter and the
//! numeric kernels.
//!
//! The interpreter hands every plain node to a [`NodeExecutor`] and only
//! looks at the returned result. On success the executor must have written the
//! node's output into the store under `VarKey::from(node.id)`. A failing
//! executor picks the status through the error variant:
//! [`ExecError::BadKernelInput`] for a malformed node, [`ExecError::Kernel`]
//! for anything else. The interpreter propagates either one unchanged.

use scopeflow_core::graph::Graph;
use scopeflow_core::node::Node;
use scopeflow_core::ops::Op;
use scopeflow_core::store::VariableStore;
use scopeflow_core::tensor::Tensor;

use super::error::ExecError;
use super::eval::eval_kernel;

/// Executes one plain node against the variable store.
pub trait NodeExecutor {
    fn execute(&mut self, graph: &Graph, node: &Node, store: &mut VariableStore) -> Result<(), ExecError>;
}

impl<F> NodeExecutor for F
where
    F: FnMut(&Graph, &Node, &mut VariableStore) -> Result<(), ExecError>,
{
    fn execute(&mut self, graph: &Graph, node: &Node, store: &mut VariableStore) -> Result<(), ExecError> {
        self(graph, node, store)
    }
}

/// Executor for the builtin [`KernelOp`](scopeflow_core::ops::KernelOp)
/// vocabulary.
#[derive(Debug, Clone, Copy, Default)]
pub struct KernelExecutor;

impl NodeExecutor for KernelExecutor {
    fn execute(&mut self, _graph: &Graph, node: &Node, store: &mut VariableStore) -> Result<(), ExecError> {
        let Op::Kernel(op) = &node.op else {
            return Err(ExecError::Kernel {
                node: node.id,
                message: format!("{} is a control op and has no kernel", node.op.name()),
            });
        };

        let inputs = gather_inputs(node, store)?;
        let output = eval_kernel(op, &inputs, node.id)?;
        store.set_tensor(node.id, output);
        Ok(())
    }
}

/// Resolves every input of `node` to the tensor currently in the store.
pub fn gather_inputs<'s>(node: &Node, store: &'s VariableStore) -> Result<Vec<&'s Tensor>, ExecError> {
    node.inputs()
        .iter()
        .map(|input| {
            store.tensor(input.key()).ok_or(ExecError::MissingValue {
                node: node.id,
                input: *input,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scopeflow_core::id::{InputRef, NodeId};
    use scopeflow_core::ops::{BinaryOp, KernelOp};

    #[test]
    fn kernel_executor_writes_output_under_node_id() {
        let mut graph = Graph::new("main");
        let root = graph.root();
        let x = graph.add_input("x");
        let double = graph
            .add_kernel(
                root,
                "double",
                KernelOp::Binary { op: BinaryOp::Add },
                &[InputRef::node(x), InputRef::node(x)],
            )
            .unwrap();

        let mut store = VariableStore::new();
        store.feed(x, Tensor::scalar_i32(21));
        KernelExecutor
            .execute(&graph, graph.node(double).unwrap(), &mut store)
            .unwrap();
        assert_eq!(store.tensor(double), Some(&Tensor::scalar_i32(42)));
    }

    #[test]
    fn missing_input_is_reported() {
        let mut graph = Graph::new("main");
        let root = graph.root();
        let x = graph.add_input("x");
        let id = graph
            .add_kernel(root, "id", KernelOp::Identity, &[InputRef::node(x)])
            .unwrap();

        let mut store = VariableStore::new();
        let err = KernelExecutor
            .execute(&graph, graph.node(id).unwrap(), &mut store)
            .unwrap_err();
        assert_eq!(
            err,
            ExecError::MissingValue {
                node: id,
                input: InputRef::node(x),
            }
        );
        assert!(!store.has(id));
    }

    #[test]
    fn control_ops_have_no_kernel() {
        let node = Node::new(NodeId(3), "ret", Op::Return { target: NodeId(1) }, &[]);
        let graph = Graph::new("main");
        let mut store = VariableStore::new();
        assert!(matches!(
            KernelExecutor.execute(&graph, &node, &mut store),
            Err(ExecError::Kernel { .. })
        ));
    }

    #[test]
    fn closures_are_executors() {
        let graph = Graph::new("main");
        let node = Node::new(NodeId(1), "c", Op::Kernel(KernelOp::Identity), &[]);
        let mut store = VariableStore::new();
        let mut calls = 0;
        let mut exec = |_: &Graph, node: &Node, store: &mut VariableStore| -> Result<(), ExecError> {
            calls += 1;
            store.set_tensor(node.id, Tensor::scalar_i32(1));
            Ok(())
        };
        exec.execute(&graph, &node, &mut store).unwrap();
        assert_eq!(calls, 1);
        assert!(store.has(NodeId(1)));
    }
}

//! Control-flow dispatch.
//!
//! Routes each node by its [`ControlKind`]: While nodes run the loop
//! controller, Return nodes commit into their loop's slots, and everything
//! else goes to the plain-node executor. The interpreter never inspects a
//! plain node's op beyond this.

use scopeflow_core::id::NodeId;
use scopeflow_core::node::Node;
use scopeflow_core::ops::ControlKind;

use super::error::ExecError;
use super::executor::NodeExecutor;
use super::state::Interpreter;

impl<'g, E: NodeExecutor> Interpreter<'g, E> {
    /// Executes the node `id` through the handler for its control kind.
    pub fn dispatch(&mut self, id: NodeId) -> Result<(), ExecError> {
        let node = self.resolve(id)?;
        self.dispatch_node(node)
    }

    pub(crate) fn dispatch_node(&mut self, node: &'g Node) -> Result<(), ExecError> {
        match node.control_kind() {
            ControlKind::While => self.run_while_node(node),
            ControlKind::Return => self.commit_return_node(node),
            ControlKind::Plain => {
                tracing::debug!("op [{}] node {}", node.op.name(), node.id);
                self.executor.execute(self.graph, node, &mut self.store)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::state::ExecConfig;
    use scopeflow_core::graph::Graph;
    use scopeflow_core::id::InputRef;
    use scopeflow_core::ops::{KernelOp, Op};
    use scopeflow_core::status::Status;
    use scopeflow_core::store::VariableStore;
    use scopeflow_core::tensor::Tensor;

    #[test]
    fn plain_nodes_go_to_the_executor() {
        let mut graph = Graph::new("main");
        let root = graph.root();
        let c = graph.add_const(root, "c", Tensor::scalar_i32(3)).unwrap();

        let mut seen = Vec::new();
        let exec = |_: &Graph, node: &Node, store: &mut VariableStore| -> Result<(), ExecError> {
            seen.push(node.id);
            store.set_tensor(node.id, Tensor::scalar_i32(9));
            Ok(())
        };
        let mut interp = Interpreter::with_executor(&graph, exec, ExecConfig::default());
        interp.dispatch(c).unwrap();
        assert_eq!(interp.output(c), Some(&Tensor::scalar_i32(9)));
        drop(interp);
        assert_eq!(seen, vec![c]);
    }

    #[test]
    fn while_nodes_never_reach_the_executor() {
        let mut graph = Graph::new("main");
        let root = graph.root();
        let x = graph.add_input("x");
        let cond = graph.add_scope("cond");
        let body = graph.add_scope("body");
        let w = graph
            .add_while(root, "loop", &[InputRef::node(x)], cond, body)
            .unwrap();
        graph.add_const(cond, "false", Tensor::scalar_bool(false)).unwrap();
        graph
            .add_return(body, "ret", w, &[InputRef::slot(w, 0)])
            .unwrap();

        let mut plain_calls = 0;
        let exec = |graph: &Graph, node: &Node, store: &mut VariableStore| -> Result<(), ExecError> {
            plain_calls += 1;
            crate::interpreter::KernelExecutor.execute(graph, node, store)
        };
        let mut interp = Interpreter::with_executor(&graph, exec, ExecConfig::default());
        interp.feed(x, Tensor::scalar_i32(1));
        interp.dispatch(w).unwrap();
        assert_eq!(interp.slot(w, 0), Some(&Tensor::scalar_i32(1)));
        drop(interp);
        // Only the condition's constant ran.
        assert_eq!(plain_calls, 1);
    }

    #[test]
    fn executor_errors_propagate_unchanged() {
        let mut graph = Graph::new("main");
        let root = graph.root();
        let n = graph
            .add_node(root, "boom", Op::Kernel(KernelOp::Identity), &[])
            .unwrap();

        let exec = |_: &Graph, node: &Node, _: &mut VariableStore| -> Result<(), ExecError> {
            Err(ExecError::Kernel {
                node: node.id,
                message: "boom".into(),
            })
        };
        let mut interp = Interpreter::with_executor(&graph, exec, ExecConfig::default());
        let err = interp.dispatch(n).unwrap_err();
        assert_eq!(err.status(), Status::KernelFailure);
        assert_eq!(err.node(), Some(n));
    }

    #[test]
    fn unknown_node() {
        let graph = Graph::new("main");
        let mut interp = Interpreter::new(&graph, ExecConfig::default());
        assert_eq!(
            interp.dispatch(NodeId(77)),
            Err(ExecError::NodeNotFound { id: NodeId(77) })
        );
    }
}

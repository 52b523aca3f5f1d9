//! Structural validation of a [`Graph`].
//!
//! [`validate`] scans the whole graph and reports every structural problem at
//! once. It is pure: it reads the graph but never executes anything. The
//! interpreter performs its own checks at run time regardless; validation is
//! for catching malformed graphs before they run.

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use serde::{Deserialize, Serialize};

use crate::graph::Graph;
use crate::id::{InputRef, NodeId, ScopeId};
use crate::node::{Node, Scope};
use crate::ops::{ControlKind, Op};

/// A structural problem found by [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum ValidationIssue {
    #[error("node {node}: input {input} references an unknown producer")]
    UnknownProducer { node: NodeId, input: InputRef },

    #[error("node {node}: input {input} reads an output its producer does not have")]
    UnknownOutput { node: NodeId, input: InputRef },

    #[error("while {node}: expected at least 3 inputs, got {count}")]
    WhileTooFewInputs { node: NodeId, count: usize },

    #[error("while {node}: scope {scope} does not exist")]
    WhileScopeMissing { node: NodeId, scope: ScopeId },

    #[error("while {node}: body scope {scope} is empty")]
    EmptyBody { node: NodeId, scope: ScopeId },

    #[error("while {node}: body scope {scope} does not end in a return node")]
    BodyMissingReturn { node: NodeId, scope: ScopeId },

    #[error("return {node}: target {target} is not a while node")]
    ReturnTargetNotWhile { node: NodeId, target: NodeId },

    #[error("return {node}: supplies {got} values for {expected} loop-carried slots of {target}")]
    ReturnArity {
        node: NodeId,
        target: NodeId,
        expected: usize,
        got: usize,
    },

    #[error("scope {scope}: node {node} reads node {producer}, which runs later")]
    ForwardReference {
        scope: ScopeId,
        node: NodeId,
        producer: NodeId,
    },

    #[error("scope {scope}: dependency cycle through node {node}")]
    DependencyCycle { scope: ScopeId, node: NodeId },
}

/// Number of loop-carried slots of a While node (`inputs - 2`), or `None` if
/// the node is not a well-formed While.
pub fn loop_slot_count(node: &Node) -> Option<usize> {
    if node.control_kind() != ControlKind::While || node.inputs.len() < 3 {
        return None;
    }
    Some(node.inputs.len() - 2)
}

/// Scans `graph` and returns every structural issue found.
pub fn validate(graph: &Graph) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for node in graph.nodes() {
        match &node.op {
            Op::While => check_while(graph, node, &mut issues),
            Op::Return { target } => check_return(graph, node, *target, &mut issues),
            Op::Kernel(_) => check_inputs(graph, node, node.inputs(), &mut issues),
        }
    }

    for scope in graph.scopes() {
        check_scope_order(graph, scope, &mut issues);
    }

    issues
}

fn check_inputs(graph: &Graph, node: &Node, inputs: &[InputRef], issues: &mut Vec<ValidationIssue>) {
    for &input in inputs {
        if graph.is_external_input(input.producer) {
            if input.output != 0 {
                issues.push(ValidationIssue::UnknownOutput { node: node.id, input });
            }
            continue;
        }
        match graph.node(input.producer) {
            None => issues.push(ValidationIssue::UnknownProducer { node: node.id, input }),
            Some(producer) => {
                let outputs = loop_slot_count(producer).unwrap_or(1);
                if input.output as usize >= outputs {
                    issues.push(ValidationIssue::UnknownOutput { node: node.id, input });
                }
            }
        }
    }
}

fn check_while(graph: &Graph, node: &Node, issues: &mut Vec<ValidationIssue>) {
    let count = node.inputs.len();
    if count < 3 {
        issues.push(ValidationIssue::WhileTooFewInputs { node: node.id, count });
        return;
    }
    check_inputs(graph, node, &node.inputs[..count - 2], issues);

    let condition = ScopeId::from(node.inputs[count - 2].producer);
    if graph.scope(condition).is_none() {
        issues.push(ValidationIssue::WhileScopeMissing {
            node: node.id,
            scope: condition,
        });
    }

    let body_id = ScopeId::from(node.inputs[count - 1].producer);
    let Some(body) = graph.scope(body_id) else {
        issues.push(ValidationIssue::WhileScopeMissing {
            node: node.id,
            scope: body_id,
        });
        return;
    };
    match body.last().and_then(|id| graph.node(id)) {
        None => issues.push(ValidationIssue::EmptyBody {
            node: node.id,
            scope: body_id,
        }),
        Some(last) if last.control_kind() != ControlKind::Return => {
            issues.push(ValidationIssue::BodyMissingReturn {
                node: node.id,
                scope: body_id,
            })
        }
        Some(_) => {}
    }
}

fn check_return(graph: &Graph, node: &Node, target: NodeId, issues: &mut Vec<ValidationIssue>) {
    check_inputs(graph, node, node.inputs(), issues);

    let expected = match graph.node(target).and_then(loop_slot_count) {
        Some(count) => count,
        None => {
            issues.push(ValidationIssue::ReturnTargetNotWhile {
                node: node.id,
                target,
            });
            return;
        }
    };
    if node.inputs.len() != expected {
        issues.push(ValidationIssue::ReturnArity {
            node: node.id,
            target,
            expected,
            got: node.inputs.len(),
        });
    }
}

/// Checks that every same-scope dependency points backwards and that the
/// dependency graph of the scope is acyclic.
fn check_scope_order(graph: &Graph, scope: &Scope, issues: &mut Vec<ValidationIssue>) {
    let position = |id: NodeId| scope.nodes().iter().position(|&n| n == id);

    let mut deps = DiGraphMap::<NodeId, ()>::new();
    for &id in scope.nodes() {
        deps.add_node(id);
    }

    for (index, &id) in scope.nodes().iter().enumerate() {
        let Some(node) = graph.node(id) else { continue };
        // The trailing scope references of a While are not data inputs.
        let data_inputs = match loop_slot_count(node) {
            Some(k) => &node.inputs[..k],
            None => node.inputs(),
        };
        for input in data_inputs {
            // A slot read of a While in this same scope reads the loop's
            // result, so it is an ordinary edge. Reads from inside the loop's
            // own scopes never reach here: the While is not a member of them.
            let Some(producer_index) = position(input.producer) else { continue };
            deps.add_edge(input.producer, id, ());
            if producer_index >= index {
                issues.push(ValidationIssue::ForwardReference {
                    scope: scope.id,
                    node: id,
                    producer: input.producer,
                });
            }
        }
    }

    if let Err(cycle) = toposort(&deps, None) {
        issues.push(ValidationIssue::DependencyCycle {
            scope: scope.id,
            node: cycle.node_id(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{BinaryOp, CmpOp, KernelOp};
    use crate::tensor::Tensor;

    /// Builds `x = 0; while x < 5 { x = x + 1 }` and returns the graph plus
    /// the while node id.
    fn counter_graph() -> (Graph, NodeId) {
        let mut graph = Graph::new("main");
        let root = graph.root();
        let x = graph.add_input("x");
        let cond = graph.add_scope("cond");
        let body = graph.add_scope("body");
        let w = graph
            .add_while(root, "loop", &[InputRef::node(x)], cond, body)
            .unwrap();

        let limit = graph.add_const(cond, "limit", Tensor::scalar_i32(5)).unwrap();
        graph
            .add_kernel(
                cond,
                "lt",
                KernelOp::Compare { op: CmpOp::Lt },
                &[InputRef::slot(w, 0), InputRef::node(limit)],
            )
            .unwrap();

        let one = graph.add_const(body, "one", Tensor::scalar_i32(1)).unwrap();
        let next = graph
            .add_kernel(
                body,
                "next",
                KernelOp::Binary { op: BinaryOp::Add },
                &[InputRef::slot(w, 0), InputRef::node(one)],
            )
            .unwrap();
        graph
            .add_return(body, "ret", w, &[InputRef::node(next)])
            .unwrap();

        (graph, w)
    }

    #[test]
    fn well_formed_loop_has_no_issues() {
        let (graph, _) = counter_graph();
        assert_eq!(validate(&graph), vec![]);
    }

    #[test]
    fn loop_slot_count_of_while() {
        let (graph, w) = counter_graph();
        assert_eq!(loop_slot_count(graph.node(w).unwrap()), Some(1));
    }

    #[test]
    fn short_while_is_reported() {
        let mut graph = Graph::new("main");
        let root = graph.root();
        let x = graph.add_input("x");
        let w = graph
            .add_node(root, "loop", Op::While, &[InputRef::node(x)])
            .unwrap();
        assert_eq!(
            validate(&graph),
            vec![ValidationIssue::WhileTooFewInputs { node: w, count: 1 }]
        );
    }

    #[test]
    fn empty_body_and_missing_return_are_reported() {
        let mut graph = Graph::new("main");
        let root = graph.root();
        let x = graph.add_input("x");
        let cond = graph.add_scope("cond");
        let body = graph.add_scope("body");
        let w = graph
            .add_while(root, "loop", &[InputRef::node(x)], cond, body)
            .unwrap();
        graph.add_const(cond, "c", Tensor::scalar_i32(0)).unwrap();

        assert!(validate(&graph).contains(&ValidationIssue::EmptyBody { node: w, scope: body }));

        graph.add_const(body, "c", Tensor::scalar_i32(0)).unwrap();
        assert!(validate(&graph)
            .contains(&ValidationIssue::BodyMissingReturn { node: w, scope: body }));
    }

    #[test]
    fn return_arity_is_reported() {
        let (mut graph, w) = counter_graph();
        let extra = graph.add_scope("extra");
        let ret = graph
            .add_node(
                extra,
                "bad_ret",
                Op::Return { target: w },
                &[InputRef::slot(w, 0), InputRef::slot(w, 0)],
            )
            .unwrap();
        assert!(validate(&graph).contains(&ValidationIssue::ReturnArity {
            node: ret,
            target: w,
            expected: 1,
            got: 2,
        }));
    }

    #[test]
    fn unknown_producer_and_output() {
        let mut graph = Graph::new("main");
        let root = graph.root();
        let c = graph.add_const(root, "c", Tensor::scalar_i32(1)).unwrap();
        let bad = graph
            .add_kernel(
                root,
                "neg",
                KernelOp::Neg,
                &[InputRef::node(NodeId(-9))],
            )
            .unwrap();
        let bad_output = graph
            .add_kernel(root, "id", KernelOp::Identity, &[InputRef::new(c, 1)])
            .unwrap();

        let issues = validate(&graph);
        assert!(issues.contains(&ValidationIssue::UnknownProducer {
            node: bad,
            input: InputRef::node(NodeId(-9)),
        }));
        assert!(issues.contains(&ValidationIssue::UnknownOutput {
            node: bad_output,
            input: InputRef::new(c, 1),
        }));
    }

    #[test]
    fn forward_reference_and_cycle() {
        let mut graph = Graph::new("main");
        let root = graph.root();
        // a reads b, b reads a: both forward and cyclic.
        let a = graph
            .add_kernel(root, "a", KernelOp::Identity, &[InputRef::node(NodeId(2))])
            .unwrap();
        let b = graph
            .add_kernel(root, "b", KernelOp::Identity, &[InputRef::node(a)])
            .unwrap();
        assert_eq!(b, NodeId(2));

        let issues = validate(&graph);
        assert!(issues.contains(&ValidationIssue::ForwardReference {
            scope: root,
            node: a,
            producer: b,
        }));
        assert!(issues
            .iter()
            .any(|i| matches!(i, ValidationIssue::DependencyCycle { scope, .. } if *scope == root)));
    }

    #[test]
    fn slot_reads_inside_the_loop_add_no_edges() {
        // Both loop scopes read slot 0 of a While that lives in root.
        let (graph, w) = counter_graph();
        let issues = validate(&graph);
        assert!(!issues
            .iter()
            .any(|i| matches!(i, ValidationIssue::DependencyCycle { .. })));
        assert_eq!(loop_slot_count(graph.node(w).unwrap()), Some(1));
    }

    #[test]
    fn same_scope_slot_read_is_ordered_like_any_input() {
        let (mut graph, w) = counter_graph();
        let root = graph.root();
        let after = graph
            .add_kernel(root, "after", KernelOp::Identity, &[InputRef::slot(w, 0)])
            .unwrap();
        assert_eq!(validate(&graph), vec![]);
        assert_eq!(graph.scope(root).unwrap().nodes().last(), Some(&after));

        // The same read placed before the While is a forward reference.
        let mut graph = Graph::new("main");
        let root = graph.root();
        let x = graph.add_input("x");
        let cond = graph.add_scope("cond");
        let body = graph.add_scope("body");
        let w = NodeId(body.0 + 2);
        let early = graph
            .add_kernel(root, "early", KernelOp::Identity, &[InputRef::slot(w, 0)])
            .unwrap();
        assert_eq!(
            graph.add_while(root, "loop", &[InputRef::node(x)], cond, body).unwrap(),
            w
        );
        graph.add_const(cond, "false", Tensor::scalar_i32(0)).unwrap();
        graph.add_return(body, "ret", w, &[InputRef::slot(w, 0)]).unwrap();

        assert_eq!(
            validate(&graph),
            vec![ValidationIssue::ForwardReference {
                scope: root,
                node: early,
                producer: w,
            }]
        );
    }
}

//! Nodes and scopes.
//!
//! A [`Node`] is one operation instance with ordered input references. A
//! [`Scope`] is an ordered list of node ids; list order is execution order.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::id::{InputRef, NodeId, ScopeId};
use crate::ops::{ControlKind, Op};

/// Ordered input list of a node.
pub type Inputs = SmallVec<[InputRef; 4]>;

/// A single operation instance in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Human-readable label used in logs.
    pub name: String,
    pub op: Op,
    pub inputs: Inputs,
}

impl Node {
    pub fn new(id: NodeId, name: impl Into<String>, op: Op, inputs: &[InputRef]) -> Self {
        Node {
            id,
            name: name.into(),
            op,
            inputs: SmallVec::from_slice(inputs),
        }
    }

    pub fn control_kind(&self) -> ControlKind {
        self.op.control_kind()
    }

    /// Returns `true` for nodes that must go through the control-flow
    /// dispatcher rather than a kernel.
    pub fn is_control(&self) -> bool {
        self.control_kind() != ControlKind::Plain
    }

    pub fn inputs(&self) -> &[InputRef] {
        &self.inputs
    }
}

/// A named, ordered sub-sequence of nodes usable as a callable sub-graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    pub id: ScopeId,
    pub name: String,
    nodes: Vec<NodeId>,
}

impl Scope {
    pub fn new(id: ScopeId, name: impl Into<String>) -> Self {
        Scope {
            id,
            name: name.into(),
            nodes: Vec::new(),
        }
    }

    /// Node ids in execution order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn last(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }

    pub(crate) fn push(&mut self, node: NodeId) {
        self.nodes.push(node);
    }
}

//! Graph: the container owning every node and scope of a computation.
//!
//! [`Graph`] is the single entry point for constructing and querying a
//! dataflow program. Nodes live in one flat table; scopes are ordered lists of
//! node ids into that table. A graph always has a root scope, which the
//! outer interpreter walks.
//!
//! Node ids and scope ids are allocated from one shared positive counter.
//! External inputs are allocated from a separate negative counter.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::id::{InputRef, NodeId, ScopeId};
use crate::node::{Node, Scope};
use crate::ops::{KernelOp, Op};
use crate::tensor::Tensor;

/// The graph container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Graph {
    /// Nodes indexed by id, in creation order.
    nodes: IndexMap<NodeId, Node>,
    /// Scopes indexed by id, in creation order.
    scopes: IndexMap<ScopeId, Scope>,
    /// Declared external inputs and their names.
    inputs: IndexMap<NodeId, String>,
    root: ScopeId,
    next_id: i32,
    next_input_id: i32,
}

impl Graph {
    /// Creates a graph with an empty root scope.
    pub fn new(root_name: &str) -> Self {
        let root = ScopeId(0);
        let mut scopes = IndexMap::new();
        scopes.insert(root, Scope::new(root, root_name));

        Graph {
            nodes: IndexMap::new(),
            scopes,
            inputs: IndexMap::new(),
            root,
            next_id: 1,
            next_input_id: -1,
        }
    }

    // -----------------------------------------------------------------------
    // Read-only accessors
    // -----------------------------------------------------------------------

    /// Id of the root scope.
    pub fn root(&self) -> ScopeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn scope(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(&id)
    }

    /// Looks up a node, failing with [`CoreError::NodeNotFound`].
    pub fn try_node(&self, id: NodeId) -> Result<&Node, CoreError> {
        self.node(id).ok_or(CoreError::NodeNotFound { id })
    }

    /// Looks up a scope, failing with [`CoreError::ScopeNotFound`].
    pub fn try_scope(&self, id: ScopeId) -> Result<&Scope, CoreError> {
        self.scope(id).ok_or(CoreError::ScopeNotFound { id })
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn scopes(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.values()
    }

    /// Declared external inputs, in declaration order.
    pub fn external_inputs(&self) -> impl Iterator<Item = (NodeId, &str)> {
        self.inputs.iter().map(|(id, name)| (*id, name.as_str()))
    }

    pub fn is_external_input(&self, id: NodeId) -> bool {
        self.inputs.contains_key(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn scope_count(&self) -> usize {
        self.scopes.len()
    }

    // -----------------------------------------------------------------------
    // Builder methods
    // -----------------------------------------------------------------------

    /// Adds an empty scope and returns its id.
    pub fn add_scope(&mut self, name: &str) -> ScopeId {
        let id = ScopeId(self.allocate_id());
        self.scopes.insert(id, Scope::new(id, name));
        id
    }

    /// Declares an external graph input. Its value is fed into the variable
    /// store under the returned (negative) id.
    pub fn add_input(&mut self, name: &str) -> NodeId {
        let id = NodeId(self.next_input_id);
        self.next_input_id -= 1;
        self.inputs.insert(id, name.to_string());
        id
    }

    /// Appends a node to `scope`. The op and inputs are taken as given; use
    /// [`validate`](crate::validate::validate) to check structure.
    pub fn add_node(
        &mut self,
        scope: ScopeId,
        name: &str,
        op: Op,
        inputs: &[InputRef],
    ) -> Result<NodeId, CoreError> {
        if !self.scopes.contains_key(&scope) {
            return Err(CoreError::ScopeNotFound { id: scope });
        }
        let id = NodeId(self.allocate_id());
        self.nodes.insert(id, Node::new(id, name, op, inputs));
        if let Some(s) = self.scopes.get_mut(&scope) {
            s.push(id);
        }
        Ok(id)
    }

    /// Convenience: appends a kernel node.
    pub fn add_kernel(
        &mut self,
        scope: ScopeId,
        name: &str,
        op: KernelOp,
        inputs: &[InputRef],
    ) -> Result<NodeId, CoreError> {
        self.add_node(scope, name, Op::Kernel(op), inputs)
    }

    /// Convenience: appends a constant node.
    pub fn add_const(&mut self, scope: ScopeId, name: &str, value: Tensor) -> Result<NodeId, CoreError> {
        self.add_kernel(scope, name, KernelOp::Const { value }, &[])
    }

    /// Appends a While node carrying `loop_inputs` through `condition` and
    /// `body`.
    ///
    /// Both scopes must already exist and at least one loop-carried input is
    /// required.
    pub fn add_while(
        &mut self,
        scope: ScopeId,
        name: &str,
        loop_inputs: &[InputRef],
        condition: ScopeId,
        body: ScopeId,
    ) -> Result<NodeId, CoreError> {
        if loop_inputs.is_empty() {
            return Err(CoreError::InvalidNode {
                reason: format!("while '{name}' needs at least one loop-carried input"),
            });
        }
        for id in [condition, body] {
            if !self.scopes.contains_key(&id) {
                return Err(CoreError::ScopeNotFound { id });
            }
        }

        let mut inputs = loop_inputs.to_vec();
        inputs.push(InputRef::scope(condition));
        inputs.push(InputRef::scope(body));
        self.add_node(scope, name, Op::While, &inputs)
    }

    /// Appends a Return node committing `values` into the slots of `target`.
    ///
    /// `target` must be an existing While node.
    pub fn add_return(
        &mut self,
        scope: ScopeId,
        name: &str,
        target: NodeId,
        values: &[InputRef],
    ) -> Result<NodeId, CoreError> {
        match self.nodes.get(&target) {
            Some(node) if node.op == Op::While => {}
            Some(_) => {
                return Err(CoreError::InvalidNode {
                    reason: format!("return '{name}' targets node {target}, which is not a while"),
                })
            }
            None => return Err(CoreError::NodeNotFound { id: target }),
        }
        self.add_node(scope, name, Op::Return { target }, values)
    }

    fn allocate_id(&mut self) -> i32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

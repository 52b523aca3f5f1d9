//! Stable ID newtypes for graph entities.
//!
//! [`NodeId`] and [`ScopeId`] are distinct newtype wrappers over `i32` drawn
//! from one shared counter, so a scope id can travel in the producer field of
//! an [`InputRef`] without colliding with any node id. Negative node ids are
//! reserved for external graph inputs.
//!
//! [`VarKey`] is the composite key of the variable store.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable node identifier. Negative values denote external graph inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub i32);

/// Scope identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeId(pub i32);

impl NodeId {
    /// Returns `true` if this id names an external graph input.
    pub fn is_external(self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// A While node names its condition and body scopes through the producer
// field of its trailing inputs.

impl From<NodeId> for ScopeId {
    fn from(id: NodeId) -> Self {
        ScopeId(id.0)
    }
}

impl From<ScopeId> for NodeId {
    fn from(id: ScopeId) -> Self {
        NodeId(id.0)
    }
}

/// One ordered input of a node: output `output` of node `producer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputRef {
    pub producer: NodeId,
    pub output: u32,
}

impl InputRef {
    pub fn new(producer: NodeId, output: u32) -> Self {
        InputRef { producer, output }
    }

    /// References output 0 of `producer`.
    pub fn node(producer: NodeId) -> Self {
        InputRef::new(producer, 0)
    }

    /// References a scope by id (the trailing inputs of a While node).
    pub fn scope(scope: ScopeId) -> Self {
        InputRef::new(scope.into(), 0)
    }

    /// References loop-carried slot `index` of the While node `owner`.
    pub fn slot(owner: NodeId, index: u32) -> Self {
        InputRef::new(owner, index)
    }

    /// The variable-store key this input reads from.
    pub fn key(&self) -> VarKey {
        VarKey::new(self.producer, self.output)
    }
}

impl fmt::Display for InputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.producer, self.output)
    }
}

/// Composite key of the variable store: `(owner node, output/slot index)`.
///
/// A plain node key is `(id, 0)`, so the value a node produces and slot 0 of
/// that node are the same entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VarKey {
    pub node: NodeId,
    pub index: u32,
}

impl VarKey {
    pub fn new(node: NodeId, index: u32) -> Self {
        VarKey { node, index }
    }

    /// Key of loop-carried slot `index` owned by `owner`.
    pub fn slot(owner: NodeId, index: u32) -> Self {
        VarKey::new(owner, index)
    }
}

impl From<NodeId> for VarKey {
    fn from(id: NodeId) -> Self {
        VarKey::new(id, 0)
    }
}

impl fmt::Display for VarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.node, self.index)
    }
}

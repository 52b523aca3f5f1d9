//! Core error types for scopeflow-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering the
//! failure modes of graph construction and tensor manipulation.

use crate::id::{NodeId, ScopeId};
use thiserror::Error;

/// Core errors produced by the scopeflow-core crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// A node id was not found in the graph.
    #[error("node not found: NodeId({id})")]
    NodeNotFound { id: NodeId },

    /// A scope id was not found in the graph.
    #[error("scope not found: ScopeId({id})")]
    ScopeNotFound { id: ScopeId },

    /// The element count of a buffer does not match its shape.
    #[error("shape {shape:?} does not match buffer of {len} elements")]
    ShapeMismatch { shape: Vec<usize>, len: usize },

    /// Element access past the end of a tensor.
    #[error("index {index} out of bounds for tensor of {len} elements")]
    IndexOutOfBounds { index: usize, len: usize },

    /// A builder call was given arguments that cannot form a valid node.
    #[error("invalid node: {reason}")]
    InvalidNode { reason: String },
}

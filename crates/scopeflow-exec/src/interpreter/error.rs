//! Runtime error types for the graph interpreter.
//!
//! Every runtime error names the node that caused it. Each variant maps onto
//! one of the engine-wide [`Status`] codes through [`ExecError::status`]; the
//! variant itself carries the context that distinguishes, for example, a
//! runaway loop from an ordinary kernel failure.

use scopeflow_core::id::{InputRef, NodeId, ScopeId};
use scopeflow_core::status::Status;
use serde::{Deserialize, Serialize};

/// Runtime errors produced by the interpreter.
///
/// Each variant halts execution of the enclosing graph. There is no recovery
/// and no rollback: the variable store keeps whatever was written before the
/// failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum ExecError {
    #[error("while {node}: loop needs at least 1 external variable plus 2 scopes, got {count} inputs")]
    TooFewLoopInputs { node: NodeId, count: usize },

    #[error("while {node}: body scope {scope} is empty")]
    EmptyBodyScope { node: NodeId, scope: ScopeId },

    #[error("while {node}: body scope {scope} ends in node {last}, which is not a return")]
    BodyMissingReturn {
        node: NodeId,
        scope: ScopeId,
        last: NodeId,
    },

    #[error("while {node}: condition scope {scope} produced no result")]
    ConditionProducedNoResult { node: NodeId, scope: ScopeId },

    #[error("while {node}: condition value of node {producer} has {len} elements, expected exactly 1")]
    ConditionNotScalar {
        node: NodeId,
        producer: NodeId,
        len: usize,
    },

    #[error("while {node}: loop condition never terminates (gave up after {limit} iterations)")]
    IterationLimitExceeded { node: NodeId, limit: usize },

    #[error("while {node}: loop nesting depth limit ({limit}) exceeded")]
    LoopDepthExceeded { node: NodeId, limit: usize },

    #[error("return {node}: target {target} is not a while node")]
    ReturnTargetNotWhile { node: NodeId, target: NodeId },

    #[error("return {node}: commits into while {target} but ends the body of while {expected}")]
    ReturnTargetMismatch {
        node: NodeId,
        target: NodeId,
        expected: NodeId,
    },

    #[error("return {node}: supplies {got} values for {expected} loop-carried slots")]
    ReturnArityMismatch {
        node: NodeId,
        expected: usize,
        got: usize,
    },

    #[error("missing value: node {node} input {input} has no tensor")]
    MissingValue { node: NodeId, input: InputRef },

    /// `node` is the node that referenced the scope, if any.
    #[error("scope {scope} not found")]
    ScopeNotFound { node: Option<NodeId>, scope: ScopeId },

    #[error("node not found: {id}")]
    NodeNotFound { id: NodeId },

    #[error("kernel failure at node {node}: {message}")]
    Kernel { node: NodeId, message: String },

    /// The kernel rejected the node itself (operand count, attributes).
    #[error("bad kernel input at node {node}: {message}")]
    BadKernelInput { node: NodeId, message: String },
}

impl ExecError {
    /// The status class of this error.
    pub fn status(&self) -> Status {
        match self {
            ExecError::TooFewLoopInputs { .. }
            | ExecError::EmptyBodyScope { .. }
            | ExecError::BodyMissingReturn { .. }
            | ExecError::ConditionNotScalar { .. }
            | ExecError::ReturnTargetNotWhile { .. }
            | ExecError::ReturnTargetMismatch { .. }
            | ExecError::ReturnArityMismatch { .. }
            | ExecError::BadKernelInput { .. } => Status::BadInput,

            ExecError::ConditionProducedNoResult { .. }
            | ExecError::IterationLimitExceeded { .. }
            | ExecError::LoopDepthExceeded { .. }
            | ExecError::MissingValue { .. }
            | ExecError::ScopeNotFound { .. }
            | ExecError::NodeNotFound { .. }
            | ExecError::Kernel { .. } => Status::KernelFailure,
        }
    }

    /// The node the error is attributed to, if any.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            ExecError::TooFewLoopInputs { node, .. }
            | ExecError::EmptyBodyScope { node, .. }
            | ExecError::BodyMissingReturn { node, .. }
            | ExecError::ConditionProducedNoResult { node, .. }
            | ExecError::ConditionNotScalar { node, .. }
            | ExecError::IterationLimitExceeded { node, .. }
            | ExecError::LoopDepthExceeded { node, .. }
            | ExecError::ReturnTargetNotWhile { node, .. }
            | ExecError::ReturnTargetMismatch { node, .. }
            | ExecError::ReturnArityMismatch { node, .. }
            | ExecError::MissingValue { node, .. }
            | ExecError::Kernel { node, .. }
            | ExecError::BadKernelInput { node, .. } => Some(*node),
            ExecError::NodeNotFound { id } => Some(*id),
            ExecError::ScopeNotFound { node, .. } => *node,
        }
    }
}

/// Collapses an execution result into its [`Status`].
pub fn status_of<T>(result: &Result<T, ExecError>) -> Status {
    match result {
        Ok(_) => Status::Ok,
        Err(error) => error.status(),
    }
}

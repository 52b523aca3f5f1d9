//! Op enums for graph nodes.
//!
//! Defines the operation vocabulary in two tiers:
//! - **Kernel ops ([`KernelOp`])**: numeric operations executed by a node
//!   executor against the variable store.
//! - **Control ops**: [`Op::While`] and [`Op::Return`], executed by the
//!   control-flow interpreter. They never reach a kernel.
//!
//! The control-kind tag of a node is derived from its op via
//! [`Op::control_kind`], so a node cannot carry a tag that disagrees with
//! what it does.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::NodeId;
use crate::tensor::Tensor;

/// Elementwise binary arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    /// Integer division truncates toward zero; division by zero is a kernel
    /// failure for integer types.
    Div,
    Max,
    Min,
}

/// Elementwise comparison. The result is always a `Bool` tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Operations dispatched to a numeric kernel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KernelOp {
    /// Produces a copy of `value`; takes no inputs.
    Const { value: Tensor },
    /// Copies input 0.
    Identity,
    /// Inputs 0 and 1; a single-element operand broadcasts.
    Binary { op: BinaryOp },
    /// Inputs 0 and 1; a single-element operand broadcasts.
    Compare { op: CmpOp },
    /// Negates input 0.
    Neg,
}

/// The control-kind tag of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlKind {
    Plain,
    While,
    Return,
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ControlKind::Plain => "plain",
            ControlKind::While => "while",
            ControlKind::Return => "return",
        };
        f.write_str(name)
    }
}

/// What a node does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Op {
    Kernel(KernelOp),
    /// Bounded while-loop. Inputs: `[v0, .., v(k-1), condition scope, body scope]`.
    While,
    /// Commits its inputs into the loop-carried slots of `target`, in order.
    Return { target: NodeId },
}

impl Op {
    pub fn control_kind(&self) -> ControlKind {
        match self {
            Op::Kernel(_) => ControlKind::Plain,
            Op::While => ControlKind::While,
            Op::Return { .. } => ControlKind::Return,
        }
    }

    /// Short operation name used in logs and traces.
    pub fn name(&self) -> &'static str {
        match self {
            Op::Kernel(KernelOp::Const { .. }) => "const",
            Op::Kernel(KernelOp::Identity) => "identity",
            Op::Kernel(KernelOp::Binary { op }) => match op {
                BinaryOp::Add => "add",
                BinaryOp::Sub => "sub",
                BinaryOp::Mul => "mul",
                BinaryOp::Div => "div",
                BinaryOp::Max => "max",
                BinaryOp::Min => "min",
            },
            Op::Kernel(KernelOp::Compare { op }) => match op {
                CmpOp::Eq => "eq",
                CmpOp::Ne => "ne",
                CmpOp::Lt => "lt",
                CmpOp::Le => "le",
                CmpOp::Gt => "gt",
                CmpOp::Ge => "ge",
            },
            Op::Kernel(KernelOp::Neg) => "neg",
            Op::While => "while",
            Op::Return { .. } => "return",
        }
    }
}

impl From<KernelOp> for Op {
    fn from(op: KernelOp) -> Self {
        Op::Kernel(op)
    }
}

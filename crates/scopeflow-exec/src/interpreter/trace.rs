//! Execution trace recording for the graph interpreter.
//!
//! When tracing is enabled via [`ExecConfig::trace_enabled`](super::ExecConfig),
//! the interpreter records a [`TraceEntry`] for every node it executes,
//! including control nodes, in execution order.

use std::fmt;

use scopeflow_core::id::{NodeId, ScopeId};
use scopeflow_core::ops::ControlKind;

/// A single entry in the execution trace, recording one node execution.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceEntry {
    /// The node that was executed.
    pub node: NodeId,
    /// Short op name ("add", "while", "return", ...).
    pub op: &'static str,
    pub control_kind: ControlKind,
    /// Scope the node was executed from.
    pub scope: ScopeId,
    /// Iteration of the innermost running loop, `None` outside any loop.
    pub iteration: Option<usize>,
}

impl fmt::Display for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.iteration {
            Some(i) => write!(f, "[{i}] ")?,
            None => write!(f, "[-] ")?,
        }
        write!(f, "scope {} node {} {}", self.scope, self.node, self.op)
    }
}

/// Renders a trace one entry per line.
pub fn render_trace(trace: &[TraceEntry]) -> String {
    trace
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

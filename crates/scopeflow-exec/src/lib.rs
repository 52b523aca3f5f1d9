//! Execution engine for scopeflow graphs.
//!
//! Provides the control-flow [`interpreter`]: While loops over condition and
//! body scopes, Return commits into loop-carried slots, and dispatch of plain
//! nodes to pluggable kernels.

pub mod interpreter;

pub use interpreter::{ExecConfig, ExecError, Interpreter, KernelExecutor, NodeExecutor};

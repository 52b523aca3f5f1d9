//! Control-flow interpreter for scoped dataflow graphs.
//!
//! Walks a [`Graph`](scopeflow_core::graph::Graph) scope by scope, in node
//! order, against a [`VariableStore`](scopeflow_core::store::VariableStore).
//!
//! # Architecture
//!
//! - [`Interpreter`] owns the variable store for one run, the loop stack
//!   and the optional execution trace.
//! - The dispatcher (`dispatch`) routes each node by control kind: While
//!   nodes to the loop controller (`while_loop`), Return nodes to the
//!   scope-return handler (`scope_return`), and plain nodes to a
//!   [`NodeExecutor`].
//! - [`KernelExecutor`] evaluates the builtin kernel ops; any closure of the
//!   right shape can stand in for it.
//! - [`ExecError`] carries the failing node and maps onto a
//!   [`Status`](scopeflow_core::status::Status).
//! - [`TraceEntry`] records each node execution when tracing is enabled.
//!
//! # Usage
//!
//! ```ignore
//! let mut interp = Interpreter::new(&graph, ExecConfig::default());
//! interp.feed(x, Tensor::scalar_i32(0));
//! interp.run()?;
//! let result = interp.slot(while_id, 0);
//! ```

pub mod dispatch;
pub mod error;
pub mod eval;
pub mod executor;
pub mod scope_return;
pub mod slots;
pub mod state;
pub mod trace;
pub mod while_loop;

pub use error::{status_of, ExecError};
pub use eval::eval_kernel;
pub use executor::{gather_inputs, KernelExecutor, NodeExecutor};
pub use slots::{seed_loop_slots, slot_keys};
pub use state::{ExecConfig, Interpreter, LoopFrame, LoopState, DEFAULT_MAX_ITERATIONS};
pub use trace::{render_trace, TraceEntry};

//! Interpreter state: configuration, loop frames, and the [`Interpreter`]
//! itself.
//!
//! The interpreter owns the [`VariableStore`] for one run of a graph. Plain
//! nodes go to a pluggable [`NodeExecutor`]; control nodes (While, Return)
//! are handled by the interpreter itself, see the `dispatch`, `while_loop`
//! and `scope_return` modules.
//!
//! Every running While pushes a [`LoopFrame`] on the loop stack. The stack
//! replaces recursion bookkeeping: its depth is bounded by
//! [`ExecConfig::max_loop_depth`] and the innermost frame supplies the
//! iteration number recorded in trace entries.

use std::fmt;

use scopeflow_core::graph::Graph;
use scopeflow_core::id::{NodeId, ScopeId, VarKey};
use scopeflow_core::node::Node;
use scopeflow_core::store::VariableStore;
use scopeflow_core::tensor::Tensor;

use super::error::ExecError;
use super::executor::{KernelExecutor, NodeExecutor};
use super::trace::TraceEntry;

/// Default cap on body executions of a single While node run.
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000_000;

/// Configuration for the interpreter.
#[derive(Debug, Clone)]
pub struct ExecConfig {
    /// Body executions allowed per While run before it fails as runaway.
    /// Default: 10,000,000.
    pub max_iterations: usize,
    /// Maximum number of While loops running at once. Default: 256.
    pub max_loop_depth: usize,
    /// Whether to record execution traces.
    pub trace_enabled: bool,
}

impl Default for ExecConfig {
    fn default() -> Self {
        ExecConfig {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_loop_depth: 256,
            trace_enabled: false,
        }
    }
}

impl ExecConfig {
    /// Sets the iteration cap. A cap of zero is raised to one.
    pub fn with_max_iterations(mut self, limit: usize) -> Self {
        self.max_iterations = limit.max(1);
        self
    }

    pub fn with_max_loop_depth(mut self, depth: usize) -> Self {
        self.max_loop_depth = depth;
        self
    }

    pub fn with_trace(mut self, enabled: bool) -> Self {
        self.trace_enabled = enabled;
        self
    }
}

/// Phase of one While node run.
///
/// `Init -> EvalCondition -> (Done | RunBody -> EvalCondition ...)`. Any
/// error moves the loop to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Init,
    EvalCondition,
    RunBody,
    Done,
    Failed,
}

impl LoopState {
    /// True for `Done` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, LoopState::Done | LoopState::Failed)
    }
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoopState::Init => "init",
            LoopState::EvalCondition => "eval-condition",
            LoopState::RunBody => "run-body",
            LoopState::Done => "done",
            LoopState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A While loop currently running on the loop stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopFrame {
    /// The While node being run.
    pub node: NodeId,
    /// Completed body executions.
    pub iteration: usize,
    pub state: LoopState,
}

impl LoopFrame {
    pub fn new(node: NodeId) -> Self {
        LoopFrame {
            node,
            iteration: 0,
            state: LoopState::Init,
        }
    }
}

/// The control-flow interpreter.
///
/// Holds a reference to the [`Graph`] and the variable store for one run.
/// `E` executes plain nodes; the default is the builtin [`KernelExecutor`].
pub struct Interpreter<'g, E = KernelExecutor> {
    pub(crate) graph: &'g Graph,
    pub(crate) store: VariableStore,
    pub(crate) executor: E,
    pub(crate) config: ExecConfig,
    /// Running loops, innermost last.
    pub(crate) frames: Vec<LoopFrame>,
    trace: Option<Vec<TraceEntry>>,
}

impl<'g> Interpreter<'g> {
    /// Creates an interpreter using the builtin kernels.
    pub fn new(graph: &'g Graph, config: ExecConfig) -> Self {
        Interpreter::with_executor(graph, KernelExecutor, config)
    }
}

impl<'g, E: NodeExecutor> Interpreter<'g, E> {
    /// Creates an interpreter with a custom plain-node executor.
    pub fn with_executor(graph: &'g Graph, executor: E, config: ExecConfig) -> Self {
        let trace = if config.trace_enabled {
            Some(Vec::new())
        } else {
            None
        };

        Interpreter {
            graph,
            store: VariableStore::new(),
            executor,
            config,
            frames: Vec::new(),
            trace,
        }
    }

    /// Replaces the variable store, e.g. to resume from earlier results.
    pub fn with_store(mut self, store: VariableStore) -> Self {
        self.store = store;
        self
    }

    /// Binds a tensor to an external input.
    pub fn feed(&mut self, input: NodeId, tensor: Tensor) {
        self.store.feed(input, tensor);
    }

    // ---- Execution ----

    /// Runs every node of the root scope in order.
    pub fn run(&mut self) -> Result<(), ExecError> {
        self.run_scope(self.graph.root())
    }

    /// Runs every node of `scope` in order, stopping at the first error.
    pub fn run_scope(&mut self, scope: ScopeId) -> Result<(), ExecError> {
        let graph = self.graph;
        let nodes = graph
            .scope(scope)
            .ok_or(ExecError::ScopeNotFound { node: None, scope })?
            .nodes();

        tracing::debug!("running scope {} ({} nodes)", scope, nodes.len());
        for &id in nodes {
            let node = self.resolve(id)?;
            self.execute_node(node, scope)?;
        }
        Ok(())
    }

    /// Records `node` in the trace and dispatches it.
    pub(crate) fn execute_node(&mut self, node: &'g Node, scope: ScopeId) -> Result<(), ExecError> {
        if let Some(trace) = &mut self.trace {
            trace.push(TraceEntry {
                node: node.id,
                op: node.op.name(),
                control_kind: node.control_kind(),
                scope,
                iteration: self.frames.last().map(|frame| frame.iteration),
            });
        }
        self.dispatch_node(node)
    }

    pub(crate) fn resolve(&self, id: NodeId) -> Result<&'g Node, ExecError> {
        self.graph.node(id).ok_or(ExecError::NodeNotFound { id })
    }

    // ---- State accessors ----

    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    pub fn config(&self) -> &ExecConfig {
        &self.config
    }

    pub fn store(&self) -> &VariableStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut VariableStore {
        &mut self.store
    }

    pub fn into_store(self) -> VariableStore {
        self.store
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Output tensor of a plain node, if it has run.
    pub fn output(&self, node: NodeId) -> Option<&Tensor> {
        self.store.tensor(node)
    }

    /// Current value of loop-carried slot `index` of While node `node`.
    pub fn slot(&self, node: NodeId, index: u32) -> Option<&Tensor> {
        self.store.tensor(VarKey::slot(node, index))
    }

    /// Returns the execution trace (if tracing was enabled).
    pub fn trace(&self) -> Option<&[TraceEntry]> {
        self.trace.as_deref()
    }

    /// Loops currently running, innermost last.
    pub fn frames(&self) -> &[LoopFrame] {
        &self.frames
    }

    pub fn loop_depth(&self) -> usize {
        self.frames.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scopeflow_core::id::InputRef;
    use scopeflow_core::ops::{BinaryOp, KernelOp};

    #[test]
    fn default_config() {
        let config = ExecConfig::default();
        assert_eq!(config.max_iterations, 10_000_000);
        assert_eq!(config.max_loop_depth, 256);
        assert!(!config.trace_enabled);
    }

    #[test]
    fn zero_iteration_cap_is_raised_to_one() {
        assert_eq!(ExecConfig::default().with_max_iterations(0).max_iterations, 1);
        assert_eq!(ExecConfig::default().with_max_iterations(7).max_iterations, 7);
    }

    #[test]
    fn loop_state_terminal() {
        assert!(LoopState::Done.is_terminal());
        assert!(LoopState::Failed.is_terminal());
        assert!(!LoopState::Init.is_terminal());
        assert!(!LoopState::RunBody.is_terminal());
        assert_eq!(LoopState::EvalCondition.to_string(), "eval-condition");
    }

    #[test]
    fn runs_root_scope_in_order() {
        let mut graph = Graph::new("main");
        let root = graph.root();
        let a = graph.add_const(root, "a", Tensor::scalar_i32(2)).unwrap();
        let b = graph
            .add_kernel(
                root,
                "b",
                KernelOp::Binary { op: BinaryOp::Mul },
                &[InputRef::node(a), InputRef::node(a)],
            )
            .unwrap();

        let mut interp = Interpreter::new(&graph, ExecConfig::default().with_trace(true));
        interp.run().unwrap();
        assert_eq!(interp.output(b), Some(&Tensor::scalar_i32(4)));
        assert_eq!(interp.trace().map(|t| t.len()), Some(2));
        assert_eq!(interp.loop_depth(), 0);
    }

    #[test]
    fn unknown_scope_fails() {
        let graph = Graph::new("main");
        let mut interp = Interpreter::new(&graph, ExecConfig::default());
        let err = interp.run_scope(ScopeId(42)).unwrap_err();
        assert_eq!(
            err,
            ExecError::ScopeNotFound {
                node: None,
                scope: ScopeId(42),
            }
        );
    }

    #[test]
    fn trace_disabled_by_default() {
        let graph = Graph::new("main");
        let mut interp = Interpreter::new(&graph, ExecConfig::default());
        interp.run().unwrap();
        assert!(interp.trace().is_none());
    }
}

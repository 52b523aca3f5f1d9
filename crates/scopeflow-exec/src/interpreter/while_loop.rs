//! The While loop controller.
//!
//! A While node has inputs `[v0 .. v(k-1), cond, body]`: `k >= 1` external
//! values followed by the condition scope and the body scope. Running it
//!
//! 1. seeds the `k` loop-carried slots `(while_id, e)` from the external
//!    values (see [`seed_loop_slots`]),
//! 2. runs the condition scope and reads the last node's value,
//! 3. while that value is nonzero, runs the body scope, whose final Return
//!    node commits the next slot values, and goes back to step 2.
//!
//! Each run is a small state machine over [`LoopState`], tracked in the
//! [`LoopFrame`] on top of the interpreter's loop stack. The number of body
//! executions is capped by [`ExecConfig::max_iterations`]; hitting the cap is
//! a failure, not a silent exit.
//!
//! [`ExecConfig::max_iterations`]: super::state::ExecConfig::max_iterations

use scopeflow_core::id::{NodeId, ScopeId};
use scopeflow_core::node::{Node, Scope};
use scopeflow_core::ops::Op;

use super::error::ExecError;
use super::executor::NodeExecutor;
use super::slots::seed_loop_slots;
use super::state::{Interpreter, LoopFrame, LoopState};

impl<'g, E: NodeExecutor> Interpreter<'g, E> {
    /// Runs While node `id` to completion.
    pub fn run_while(&mut self, id: NodeId) -> Result<(), ExecError> {
        let node = self.resolve(id)?;
        self.run_while_node(node)
    }

    pub(crate) fn run_while_node(&mut self, node: &'g Node) -> Result<(), ExecError> {
        tracing::debug!("starting while loop {}", node.id);

        let count = node.inputs.len();
        if count < 3 {
            tracing::warn!(
                "while {}: loop needs at least 1 external variable, got {} inputs",
                node.id,
                count
            );
            return Err(ExecError::TooFewLoopInputs { node: node.id, count });
        }
        if self.frames.len() >= self.config.max_loop_depth {
            return Err(ExecError::LoopDepthExceeded {
                node: node.id,
                limit: self.config.max_loop_depth,
            });
        }

        let loop_vars = count - 2;
        seed_loop_slots(&mut self.store, node, loop_vars);

        // The body scope is only resolved once a pass actually runs.
        let condition = self.loop_scope(node, count - 2)?;
        let body = ScopeId::from(node.inputs[count - 1].producer);
        tracing::debug!(
            "while {}: {} loop var(s), condition scope {}, body scope {}",
            node.id,
            loop_vars,
            condition.id,
            body
        );

        self.frames.push(LoopFrame::new(node.id));
        let result = self.drive(node, condition, body);
        self.frames.pop();
        result
    }

    /// Steps the loop state machine until it reaches `Done` or `Failed`.
    fn drive(&mut self, node: &'g Node, condition: &'g Scope, body: ScopeId) -> Result<(), ExecError> {
        let limit = self.config.max_iterations.max(1);
        let mut iteration = 0;
        let mut state = LoopState::Init;
        let mut failure = None;

        while !state.is_terminal() {
            self.update_frame(state, iteration);
            let step = match state {
                LoopState::Init => Ok(LoopState::EvalCondition),
                LoopState::EvalCondition => self.eval_condition(node, condition).map(|holds| {
                    if holds {
                        LoopState::RunBody
                    } else {
                        LoopState::Done
                    }
                }),
                LoopState::RunBody => self.run_body(node, body).and_then(|()| {
                    iteration += 1;
                    if iteration >= limit {
                        tracing::warn!(
                            "while {}: condition seems to be never ending, aborting after {} iterations",
                            node.id,
                            iteration
                        );
                        Err(ExecError::IterationLimitExceeded { node: node.id, limit })
                    } else {
                        Ok(LoopState::EvalCondition)
                    }
                }),
                LoopState::Done | LoopState::Failed => Ok(state),
            };

            state = match step {
                Ok(next) => next,
                Err(error) => {
                    failure = Some(error);
                    LoopState::Failed
                }
            };
        }
        self.update_frame(state, iteration);

        match failure {
            Some(error) => Err(error),
            None => {
                tracing::debug!("while {}: finished after {} iteration(s)", node.id, iteration);
                Ok(())
            }
        }
    }

    /// Runs the condition scope and reads its verdict from the last node.
    fn eval_condition(&mut self, node: &'g Node, scope: &'g Scope) -> Result<bool, ExecError> {
        tracing::debug!(
            "while {}: {} op(s) in condition scope {}",
            node.id,
            scope.len(),
            scope.id
        );
        let mut last = None;
        for &id in scope.nodes() {
            let child = self.resolve(id)?;
            self.execute_node(child, scope.id)?;
            last = Some(id);
        }

        let no_result = ExecError::ConditionProducedNoResult {
            node: node.id,
            scope: scope.id,
        };
        let Some(producer) = last else {
            return Err(no_result);
        };
        let Some(value) = self.store.tensor(producer) else {
            return Err(no_result);
        };

        match (value.len(), value.element_as_i64(0)) {
            (1, Some(flag)) => Ok(flag != 0),
            (len, _) => Err(ExecError::ConditionNotScalar {
                node: node.id,
                producer,
                len,
            }),
        }
    }

    /// Runs one pass of the body scope, ending in its Return node.
    fn run_body(&mut self, node: &'g Node, body: ScopeId) -> Result<(), ExecError> {
        let graph = self.graph;
        let scope = graph.scope(body).ok_or(ExecError::ScopeNotFound {
            node: Some(node.id),
            scope: body,
        })?;
        tracing::debug!("while {}: {} op(s) in body scope {}", node.id, scope.len(), body);

        let Some((&last, rest)) = scope.nodes().split_last() else {
            return Err(ExecError::EmptyBodyScope {
                node: node.id,
                scope: scope.id,
            });
        };

        let ret = self.resolve(last)?;
        match ret.op {
            Op::Return { target } if target == node.id => {}
            Op::Return { target } => {
                return Err(ExecError::ReturnTargetMismatch {
                    node: ret.id,
                    target,
                    expected: node.id,
                })
            }
            _ => {
                return Err(ExecError::BodyMissingReturn {
                    node: node.id,
                    scope: scope.id,
                    last,
                })
            }
        }

        for &id in rest {
            let child = self.resolve(id)?;
            self.execute_node(child, scope.id)?;
        }
        self.execute_node(ret, scope.id)
    }

    /// Resolves the scope referenced by input `index` of While `node`.
    fn loop_scope(&self, node: &'g Node, index: usize) -> Result<&'g Scope, ExecError> {
        let scope = ScopeId::from(node.inputs[index].producer);
        self.graph.scope(scope).ok_or(ExecError::ScopeNotFound {
            node: Some(node.id),
            scope,
        })
    }

    fn update_frame(&mut self, state: LoopState, iteration: usize) {
        if let Some(frame) = self.frames.last_mut() {
            frame.state = state;
            frame.iteration = iteration;
        }
    }
}

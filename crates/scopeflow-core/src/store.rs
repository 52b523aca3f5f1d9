//! Variable store: the mutable key → tensor-holder map a graph runs against.
//!
//! Every entry is a [`Variable`] that holds at most one tensor. Entries are
//! created lazily; an entry may exist without a tensor (an empty loop slot
//! waiting for its first value).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::id::{NodeId, VarKey};
use crate::tensor::Tensor;

/// A tensor holder in the variable store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Variable {
    tensor: Option<Tensor>,
}

impl Variable {
    /// Creates a holder with no tensor.
    pub fn empty() -> Self {
        Variable { tensor: None }
    }

    pub fn with_tensor(tensor: Tensor) -> Self {
        Variable {
            tensor: Some(tensor),
        }
    }

    pub fn has_tensor(&self) -> bool {
        self.tensor.is_some()
    }

    pub fn tensor(&self) -> Option<&Tensor> {
        self.tensor.as_ref()
    }

    pub fn tensor_mut(&mut self) -> Option<&mut Tensor> {
        self.tensor.as_mut()
    }

    /// Replaces the held tensor.
    pub fn set_tensor(&mut self, tensor: Tensor) {
        self.tensor = Some(tensor);
    }
}

/// Map from [`VarKey`] to [`Variable`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VariableStore {
    vars: HashMap<VarKey, Variable>,
}

impl VariableStore {
    pub fn new() -> Self {
        VariableStore {
            vars: HashMap::new(),
        }
    }

    pub fn has(&self, key: impl Into<VarKey>) -> bool {
        self.vars.contains_key(&key.into())
    }

    pub fn get(&self, key: impl Into<VarKey>) -> Option<&Variable> {
        self.vars.get(&key.into())
    }

    pub fn get_mut(&mut self, key: impl Into<VarKey>) -> Option<&mut Variable> {
        self.vars.get_mut(&key.into())
    }

    /// Inserts or replaces the variable at `key`.
    pub fn put(&mut self, key: impl Into<VarKey>, var: Variable) {
        self.vars.insert(key.into(), var);
    }

    /// Returns the variable at `key`, creating an empty one if absent.
    pub fn get_or_create(&mut self, key: impl Into<VarKey>) -> &mut Variable {
        self.vars.entry(key.into()).or_default()
    }

    /// The tensor held at `key`, if the entry exists and is populated.
    pub fn tensor(&self, key: impl Into<VarKey>) -> Option<&Tensor> {
        self.get(key).and_then(Variable::tensor)
    }

    /// Stores `tensor` at `key`, creating the entry if needed.
    pub fn set_tensor(&mut self, key: impl Into<VarKey>, tensor: Tensor) {
        self.get_or_create(key).set_tensor(tensor);
    }

    /// Feeds an external input.
    pub fn feed(&mut self, input: NodeId, tensor: Tensor) {
        self.set_tensor(input, tensor);
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// All keys, sorted for deterministic iteration.
    pub fn keys(&self) -> Vec<VarKey> {
        let mut keys: Vec<VarKey> = self.vars.keys().copied().collect();
        keys.sort();
        keys
    }
}

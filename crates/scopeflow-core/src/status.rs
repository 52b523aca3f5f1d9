//! Execution status codes shared by every fallible graph operation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome class of executing a node or a control construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Ok,
    /// The node or construct was malformed.
    BadInput,
    /// A kernel or a nested construct failed while running.
    KernelFailure,
}

impl Status {
    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Ok => "OK",
            Status::BadInput => "BAD_INPUT",
            Status::KernelFailure => "KERNEL_FAILURE",
        };
        f.write_str(name)
    }
}

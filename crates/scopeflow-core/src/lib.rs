pub mod error;
pub mod graph;
pub mod id;
pub mod node;
pub mod ops;
pub mod status;
pub mod store;
pub mod tensor;
pub mod validate;

// Re-export commonly used types
pub use error::CoreError;
pub use graph::Graph;
pub use id::{InputRef, NodeId, ScopeId, VarKey};
pub use node::{Node, Scope};
pub use ops::{BinaryOp, CmpOp, ControlKind, KernelOp, Op};
pub use status::Status;
pub use store::{Variable, VariableStore};
pub use tensor::{DataType, Order, Tensor, TensorData};
pub use validate::{loop_slot_count, validate, ValidationIssue};

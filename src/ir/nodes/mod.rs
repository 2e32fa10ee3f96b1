//! Concrete node kinds.
//!
//! Each kind is a small operator type implementing [`NodeOp`](super::NodeOp)
//! plus whichever capabilities it supports. Construction helpers are added
//! to [`Graph`](super::Graph) next to the kind they build.

mod array_copy;
mod calc;
mod control;
mod invoke;
mod phi;
mod values;

pub use array_copy::ArrayCopyNode;
pub use calc::{AddNode, AndNode, BinaryArithmetic, OrNode, XorNode};
pub use control::{MergeNode, ReturnNode, StartNode};
pub use invoke::{InvokeNode, MethodCallTargetNode};
pub use phi::ValuePhiNode;
pub use values::{ConstantNode, ParameterNode};

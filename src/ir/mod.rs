// This module is the graph intermediate representation: stamps (abstract value facts),
// the node operator model, the arena-backed graph with automatic usage maintenance and
// value numbering, the capability interfaces phases use to canonicalize and lower nodes,
// and the concrete node kinds.

//! Graph IR.
//!
//! # Key Components
//!
//! ## Stamps (`stamp`)
//! - Known-bits integer stamps, object stamps, meet and join
//!
//! ## Graph (`graph`, `node`)
//! - `NodeId` handles into an arena, input and usage edges
//! - `Graph::unique` for value numbering
//!
//! ## Capabilities (`spi`)
//! - `Canonicalizable`, `Lowerable`, `CanonicalizerTool`
//!
//! ## Node kinds (`nodes`)
//! - Control: `Start`, `Merge`, `Return`, `Invoke`, `ArrayCopy`
//! - Values: `Parameter`, `Constant`, `Or`, `And`, `Xor`, `Add`, `ValuePhi`

pub mod graph;
pub mod node;
pub mod nodes;
pub mod spi;
pub mod stamp;

pub use graph::Graph;
pub use node::{Node, NodeId, NodeOp};
pub use nodes::*;
pub use spi::{apply_canonical, Canonicalizable, CanonicalizerTool, Lowerable};
pub use stamp::{IntegerStamp, ObjectStamp, Stamp};

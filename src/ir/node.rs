// This module defines the identity and operator model of graph nodes. A NodeId is a stable
// index into the owning graph's arena; it stays valid until the node is deleted and is never
// reused within one graph. Every node carries an operator object implementing NodeOp, which
// advertises what the node is (name, value-numbering payload, control and side-effect
// flags) and which capabilities it supports: stamp inference, canonicalization and
// lowering. Capabilities are looked up through the operator rather than a central match, so
// a new node kind plugs into every phase by implementing the relevant traits.

//! Node identities and operators.

use super::{
    graph::Graph,
    spi::{Canonicalizable, Lowerable},
    stamp::Stamp,
};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Stable handle of a node inside one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Operator of a node: what it computes and which capabilities it offers.
///
/// Operators are immutable and shared; per-node state lives in [`Node`].
pub trait NodeOp: fmt::Debug + Send + Sync + 'static {
    /// Short operator name used in dumps, statistics and errors.
    fn name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    /// Rendering of the operator including its payload.
    fn describe(&self) -> String {
        self.name().to_string()
    }

    /// Part of the control chain (can be a control predecessor).
    fn is_fixed(&self) -> bool {
        false
    }

    /// Whether input `slot` is a control edge rather than a value edge.
    fn is_control_slot(&self, _slot: usize) -> bool {
        false
    }

    /// Observable effects beyond the produced value; never removed as dead.
    fn has_side_effect(&self) -> bool {
        false
    }

    /// Entry or exit anchor of the graph.
    fn is_anchor(&self) -> bool {
        false
    }

    /// Terminates a control path; scheduled after every other node.
    fn is_block_end(&self) -> bool {
        false
    }

    /// Produces a value, so must carry a value stamp.
    fn is_value_node(&self) -> bool {
        false
    }

    /// Payload for global value numbering. `None` opts the operator out.
    fn value_key(&self) -> Option<u64> {
        None
    }

    /// Operand order does not affect the value; value numbering ignores it.
    fn is_commutative(&self) -> bool {
        false
    }

    /// Stamp derived purely from the input stamps, if the operator knows one.
    fn infer_stamp(&self, _graph: &Graph, _node: NodeId) -> Option<Stamp> {
        None
    }

    fn canonicalizable(&self) -> Option<&dyn Canonicalizable> {
        None
    }

    fn lowerable(&self) -> Option<&dyn Lowerable> {
        None
    }
}

/// A node's per-instance state: operator, input edges, usage back-edges and stamp.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) op: Arc<dyn NodeOp>,
    pub(crate) inputs: Vec<NodeId>,
    /// One entry per input edge pointing at this node.
    pub(crate) usages: Vec<NodeId>,
    pub(crate) stamp: Stamp,
}

impl Node {
    pub fn op(&self) -> &Arc<dyn NodeOp> {
        &self.op
    }

    pub fn name(&self) -> &'static str {
        self.op.name()
    }

    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    pub fn usages(&self) -> &[NodeId] {
        &self.usages
    }

    pub fn stamp(&self) -> Stamp {
        self.stamp
    }

    pub fn has_usages(&self) -> bool {
        !self.usages.is_empty()
    }

    /// Removable once unused.
    pub fn is_killable(&self) -> bool {
        !self.op.is_fixed() && !self.op.has_side_effect() && !self.op.is_anchor()
    }
}

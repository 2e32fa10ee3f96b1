// This module defines the capability interfaces node operators implement to take part in
// the optimization and lowering phases. Canonicalizable operators reduce a node to a
// simpler equivalent using only local facts; they receive a CanonicalizerTool that wraps
// the graph and routes every node creation through value numbering. Lowerable operators
// translate a node into LIR through a NodeLirBuilder. The phases discover these
// capabilities through NodeOp, so neither phase holds a list of node kinds.

//! Capability interfaces for node operators.

use super::{
    graph::Graph,
    node::{NodeId, NodeOp},
    nodes::ConstantNode,
    stamp::Stamp,
};
use crate::core::CompileResult;
use crate::lir::NodeLirBuilder;
use std::sync::Arc;

/// Local rewrite of a node to an equivalent, simpler one.
pub trait Canonicalizable {
    /// Return the node that should replace `node` graph-wide, or `node`
    /// itself when no rule applies. Apart from reordering the operands of a
    /// commutative `node` through the tool, `node` is left untouched.
    fn canonical(&self, node: NodeId, tool: &mut CanonicalizerTool<'_>) -> NodeId;
}

/// Translation of a node into LIR.
pub trait Lowerable {
    /// Emit instructions for `node`, reading input operands from and
    /// registering the result with `builder`.
    fn generate(&self, node: NodeId, graph: &Graph, builder: &mut NodeLirBuilder<'_>) -> CompileResult<()>;
}

/// Graph access handed to canonicalization rules.
pub struct CanonicalizerTool<'g> {
    graph: &'g mut Graph,
    created: Vec<NodeId>,
    commuted: bool,
}

impl<'g> CanonicalizerTool<'g> {
    pub fn new(graph: &'g mut Graph) -> Self {
        Self {
            graph,
            created: Vec::new(),
            commuted: false,
        }
    }

    pub fn graph(&self) -> &Graph {
        &*self.graph
    }

    pub fn stamp(&self, node: NodeId) -> Stamp {
        self.graph.stamp(node)
    }

    pub fn input(&self, node: NodeId, slot: usize) -> NodeId {
        self.graph.input(node, slot)
    }

    /// Payload of an integer constant node.
    pub fn as_int_constant(&self, node: NodeId) -> Option<u64> {
        self.graph.op_as::<ConstantNode>(node).map(ConstantNode::value)
    }

    pub fn is_constant(&self, node: NodeId) -> bool {
        self.graph.is_a::<ConstantNode>(node)
    }

    /// Value-numbered node creation.
    pub fn unique(&mut self, op: Arc<dyn NodeOp>, inputs: &[NodeId], stamp: Stamp) -> NodeId {
        let (id, created) = self.graph.unique_with_status(op, inputs, stamp);
        if created {
            self.created.push(id);
        }
        id
    }

    pub fn int_constant(&mut self, bits: u32, value: u64) -> NodeId {
        let stamp = Stamp::int_constant(bits, value);
        let raw = stamp.as_integer().map_or(value, |s| s.down_mask());
        self.unique(Arc::new(ConstantNode::new(raw)), &[], stamp)
    }

    /// Move a lone constant operand of a commutative `node` into the second
    /// slot. Returns the operands in their resulting order.
    pub fn constant_right(&mut self, node: NodeId) -> (NodeId, NodeId) {
        let x = self.input(node, 0);
        let y = self.input(node, 1);
        if self.is_constant(x) && !self.is_constant(y) {
            self.graph.commute_inputs(node);
            self.commuted = true;
            return (y, x);
        }
        (x, y)
    }

    /// Whether a rule reordered operands in place.
    pub fn commuted(&self) -> bool {
        self.commuted
    }

    /// Nodes created since the tool was made.
    pub fn take_created(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.created)
    }
}

/// Apply the canonicalization rule of `node` once without replacing it.
///
/// Nodes created by the rule stay in the graph; the caller decides whether
/// to splice the result in.
pub fn apply_canonical(graph: &mut Graph, node: NodeId) -> NodeId {
    let op = graph.op(node).clone();
    match op.canonicalizable() {
        Some(rule) => {
            let mut tool = CanonicalizerTool::new(graph);
            rule.canonical(node, &mut tool)
        }
        None => node,
    }
}

//! Leaf value nodes: constants and incoming parameters.

use crate::core::CompileResult;
use crate::ir::{
    graph::Graph,
    node::{NodeId, NodeOp},
    spi::Lowerable,
    stamp::Stamp,
};
use crate::lir::NodeLirBuilder;
use std::any::Any;
use std::sync::Arc;

/// Integer literal. The width comes from the node's stamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantNode {
    value: u64,
}

impl ConstantNode {
    pub fn new(value: u64) -> Self {
        Self { value }
    }

    pub fn value(&self) -> u64 {
        self.value
    }
}

impl NodeOp for ConstantNode {
    fn name(&self) -> &'static str {
        "Constant"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn describe(&self) -> String {
        format!("Constant({:#x})", self.value)
    }

    fn is_value_node(&self) -> bool {
        true
    }

    fn value_key(&self) -> Option<u64> {
        Some(self.value)
    }

    fn lowerable(&self) -> Option<&dyn Lowerable> {
        Some(self)
    }
}

impl Lowerable for ConstantNode {
    fn generate(&self, node: NodeId, graph: &Graph, builder: &mut NodeLirBuilder<'_>) -> CompileResult<()> {
        let kind = graph.stamp(node).kind();
        let value = builder.tool().emit_constant(self.value, kind);
        builder.set_result(node, value);
        Ok(())
    }
}

/// Incoming argument `index` of the compilation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterNode {
    index: usize,
}

impl ParameterNode {
    pub fn new(index: usize) -> Self {
        Self { index }
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl NodeOp for ParameterNode {
    fn name(&self) -> &'static str {
        "Parameter"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn describe(&self) -> String {
        format!("Parameter({})", self.index)
    }

    fn is_value_node(&self) -> bool {
        true
    }

    fn lowerable(&self) -> Option<&dyn Lowerable> {
        Some(self)
    }
}

impl Lowerable for ParameterNode {
    fn generate(&self, node: NodeId, graph: &Graph, builder: &mut NodeLirBuilder<'_>) -> CompileResult<()> {
        let kind = graph.stamp(node).kind();
        let value = builder.tool().emit_incoming_parameter(self.index, kind);
        builder.set_result(node, value);
        Ok(())
    }
}

impl Graph {
    /// Parameter node for argument `index`, created on first request with
    /// the unrestricted stamp of the declared kind.
    pub fn parameter(&mut self, index: usize) -> NodeId {
        assert!(
            index < self.signature().len(),
            "parameter {} out of range for graph {}",
            index,
            self.name()
        );
        let existing = self
            .nodes_of::<ParameterNode>()
            .into_iter()
            .find(|&id| self.op_as::<ParameterNode>(id).is_some_and(|p| p.index() == index));
        match existing {
            Some(id) => id,
            None => {
                let stamp = Stamp::for_kind(self.signature()[index]);
                self.add(Arc::new(ParameterNode::new(index)), &[], stamp)
            }
        }
    }

    /// Parameter node narrowed to `stamp`.
    pub fn parameter_with_stamp(&mut self, index: usize, stamp: Stamp) -> NodeId {
        let id = self.parameter(index);
        self.improve_stamp(id, stamp);
        id
    }

    /// Value-numbered integer constant of the given width.
    pub fn int_constant(&mut self, bits: u32, value: u64) -> NodeId {
        let stamp = Stamp::int_constant(bits, value);
        let raw = stamp.as_integer().map_or(value, |s| s.down_mask());
        self.unique(Arc::new(ConstantNode::new(raw)), &[], stamp)
    }
}

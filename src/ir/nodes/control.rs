//! Control-chain nodes: the entry anchor, control joins and method exits.

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

/// Entry anchor; the first control predecessor of every path.
#[derive(Debug, Clone, Copy, Default)]
pub struct StartNode;

impl NodeOp for StartNode {
    fn name(&self) -> &'static str {
        "Start"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn is_fixed(&self) -> bool {
        true
    }

    fn is_anchor(&self) -> bool {
        true
    }

    fn lowerable(&self) -> Option<&dyn Lowerable> {
        Some(self)
    }
}

impl Lowerable for StartNode {
    // Frame setup belongs to the frame context at emission time.
    fn generate(&self, _node: NodeId, _graph: &Graph, _builder: &mut NodeLirBuilder<'_>) -> CompileResult<()> {
        Ok(())
    }
}

/// Control join of N predecessors. Every input is a control edge.
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeNode;

impl NodeOp for MergeNode {
    fn name(&self) -> &'static str {
        "Merge"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn is_fixed(&self) -> bool {
        true
    }

    fn is_control_slot(&self, _slot: usize) -> bool {
        true
    }

    fn lowerable(&self) -> Option<&dyn Lowerable> {
        Some(self)
    }
}

impl Lowerable for MergeNode {
    fn generate(&self, node: NodeId, _graph: &Graph, builder: &mut NodeLirBuilder<'_>) -> CompileResult<()> {
        builder.tool().emit_label(&format!("merge_{}", node.index()));
        Ok(())
    }
}

/// Method exit: `[control]` or `[control, value]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReturnNode;

impl ReturnNode {
    /// Returned value, if any.
    pub fn result(graph: &Graph, node: NodeId) -> Option<NodeId> {
        graph.inputs(node).get(1).copied()
    }
}

impl NodeOp for ReturnNode {
    fn name(&self) -> &'static str {
        "Return"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn is_fixed(&self) -> bool {
        true
    }

    fn is_control_slot(&self, slot: usize) -> bool {
        slot == 0
    }

    fn has_side_effect(&self) -> bool {
        true
    }

    fn is_anchor(&self) -> bool {
        true
    }

    fn is_block_end(&self) -> bool {
        true
    }

    fn lowerable(&self) -> Option<&dyn Lowerable> {
        Some(self)
    }
}

impl Lowerable for ReturnNode {
    fn generate(&self, node: NodeId, graph: &Graph, builder: &mut NodeLirBuilder<'_>) -> CompileResult<()> {
        let value = match ReturnNode::result(graph, node) {
            Some(result) => Some(builder.operand(result)?),
            None => None,
        };
        builder.tool().emit_return(value);
        Ok(())
    }
}

impl Graph {
    /// Exit after `control`, optionally returning `value`.
    pub fn add_return(&mut self, control: NodeId, value: Option<NodeId>) -> NodeId {
        let mut inputs = vec![control];
        inputs.extend(value);
        self.add(Arc::new(ReturnNode), &inputs, Stamp::Void)
    }

    /// Control join of `ends`.
    pub fn add_merge(&mut self, ends: &[NodeId]) -> NodeId {
        assert!(!ends.is_empty(), "merge needs at least one predecessor");
        self.add(Arc::new(MergeNode), ends, Stamp::Void)
    }

    /// All exits of the graph.
    pub fn returns(&self) -> Vec<NodeId> {
        self.nodes_of::<ReturnNode>()
    }
}

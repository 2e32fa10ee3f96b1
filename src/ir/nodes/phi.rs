//! Value phis at control merges.

use crate::core::CompileResult;
use crate::ir::{
    graph::Graph,
    node::{NodeId, NodeOp},
    nodes::MergeNode,
    spi::{Canonicalizable, CanonicalizerTool, Lowerable},
    stamp::Stamp,
};
use crate::lir::NodeLirBuilder;
use std::any::Any;
use std::sync::Arc;

/// Selects one value per merge predecessor: inputs are `[merge, v1..vn]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValuePhiNode;

impl ValuePhiNode {
    pub fn merge(graph: &Graph, node: NodeId) -> NodeId {
        graph.input(node, 0)
    }

    pub fn values(graph: &Graph, node: NodeId) -> &[NodeId] {
        &graph.inputs(node)[1..]
    }
}

impl NodeOp for ValuePhiNode {
    fn name(&self) -> &'static str {
        "ValuePhi"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn is_control_slot(&self, slot: usize) -> bool {
        slot == 0
    }

    fn is_value_node(&self) -> bool {
        true
    }

    fn infer_stamp(&self, graph: &Graph, node: NodeId) -> Option<Stamp> {
        let stamps: Vec<Stamp> = ValuePhiNode::values(graph, node)
            .iter()
            .map(|&value| graph.stamp(value))
            .collect();
        let stamp = Stamp::meet_all(&stamps);
        assert!(!matches!(stamp, Stamp::Void), "phi {} merges void values", node);
        Some(stamp)
    }

    fn canonicalizable(&self) -> Option<&dyn Canonicalizable> {
        Some(self)
    }

    fn lowerable(&self) -> Option<&dyn Lowerable> {
        Some(self)
    }
}

impl Canonicalizable for ValuePhiNode {
    fn canonical(&self, node: NodeId, tool: &mut CanonicalizerTool<'_>) -> NodeId {
        let values = ValuePhiNode::values(tool.graph(), node);
        let mut distinct = values.iter().copied().filter(|&v| v != node);
        match distinct.next() {
            Some(first) if distinct.all(|v| v == first) => first,
            _ => node,
        }
    }
}

impl Lowerable for ValuePhiNode {
    fn generate(&self, node: NodeId, graph: &Graph, builder: &mut NodeLirBuilder<'_>) -> CompileResult<()> {
        let mut inputs = Vec::new();
        for &value in ValuePhiNode::values(graph, node) {
            inputs.push(builder.operand(value)?);
        }
        let kind = graph.stamp(node).kind();
        let result = builder.tool().emit_phi(&inputs, kind);
        builder.set_result(node, result);
        Ok(())
    }
}

impl Graph {
    /// Phi over `values` at `merge`, stamped with the meet of the values.
    pub fn add_phi(&mut self, merge: NodeId, values: &[NodeId]) -> NodeId {
        assert!(self.is_a::<MergeNode>(merge), "{} is not a merge", merge);
        assert_eq!(
            values.len(),
            self.inputs(merge).len(),
            "phi arity must match the predecessors of {}",
            merge
        );
        let stamps: Vec<Stamp> = values.iter().map(|&v| self.stamp(v)).collect();
        let stamp = Stamp::meet_all(&stamps);
        let mut inputs = Vec::with_capacity(values.len() + 1);
        inputs.push(merge);
        inputs.extend_from_slice(values);
        self.add(Arc::new(ValuePhiNode), &inputs, stamp)
    }
}

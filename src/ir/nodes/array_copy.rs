//! Kind-specialized array copy, the building block of the copy snippets.

use crate::core::CompileResult;
use crate::ir::{
    graph::Graph,
    node::{NodeId, NodeOp},
    spi::Lowerable,
    stamp::Stamp,
};
use crate::lir::NodeLirBuilder;
use crate::meta::Kind;
use std::any::Any;
use std::sync::Arc;

/// Copies `length` elements of `kind`.
///
/// Inputs are `[control, src, src_pos, dest, dest_pos, length]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayCopyNode {
    kind: Kind,
}

impl ArrayCopyNode {
    pub fn new(kind: Kind) -> Self {
        Self { kind }
    }

    pub fn element_kind(&self) -> Kind {
        self.kind
    }
}

impl NodeOp for ArrayCopyNode {
    fn name(&self) -> &'static str {
        "ArrayCopy"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn describe(&self) -> String {
        format!("ArrayCopy({})", self.kind)
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

    fn lowerable(&self) -> Option<&dyn Lowerable> {
        Some(self)
    }
}

impl Lowerable for ArrayCopyNode {
    fn generate(&self, node: NodeId, graph: &Graph, builder: &mut NodeLirBuilder<'_>) -> CompileResult<()> {
        let inputs = graph.inputs(node);
        let src = builder.operand(inputs[1])?;
        let src_pos = builder.operand(inputs[2])?;
        let dest = builder.operand(inputs[3])?;
        let dest_pos = builder.operand(inputs[4])?;
        let length = builder.operand(inputs[5])?;
        builder
            .tool()
            .emit_array_copy(self.kind, [src, src_pos, dest, dest_pos, length]);
        Ok(())
    }
}

impl Graph {
    /// Copy of `[src, src_pos, dest, dest_pos, length]` after `control`.
    pub fn add_array_copy(&mut self, control: NodeId, kind: Kind, args: [NodeId; 5]) -> NodeId {
        let mut inputs = Vec::with_capacity(6);
        inputs.push(control);
        inputs.extend_from_slice(&args);
        self.add(Arc::new(ArrayCopyNode::new(kind)), &inputs, Stamp::Void)
    }
}

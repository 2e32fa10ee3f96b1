//! Call sites: the call target (callee plus arguments) and the invoke that
//! executes it on the control chain.

use crate::core::{CompileError, CompileResult};
use crate::ir::{
    graph::Graph,
    node::{NodeId, NodeOp},
    spi::Lowerable,
    stamp::Stamp,
};
use crate::lir::NodeLirBuilder;
use crate::meta::{Kind, MethodId};
use std::any::Any;
use std::sync::Arc;

/// Resolved callee and its ordered arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodCallTargetNode {
    target: MethodId,
}

impl MethodCallTargetNode {
    pub fn new(target: MethodId) -> Self {
        Self { target }
    }

    pub fn target(&self) -> MethodId {
        self.target
    }

    pub fn arguments(graph: &Graph, node: NodeId) -> &[NodeId] {
        graph.inputs(node)
    }
}

impl NodeOp for MethodCallTargetNode {
    fn name(&self) -> &'static str {
        "MethodCallTarget"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn describe(&self) -> String {
        format!("MethodCallTarget({})", self.target)
    }

    fn lowerable(&self) -> Option<&dyn Lowerable> {
        Some(self)
    }
}

impl Lowerable for MethodCallTargetNode {
    // Arguments are consumed by the invoke.
    fn generate(&self, _node: NodeId, _graph: &Graph, _builder: &mut NodeLirBuilder<'_>) -> CompileResult<()> {
        Ok(())
    }
}

/// Executes a call target: inputs are `[control, call_target]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvokeNode {
    result: Kind,
}

impl InvokeNode {
    pub fn new(result: Kind) -> Self {
        Self { result }
    }

    pub fn result_kind(&self) -> Kind {
        self.result
    }

    pub fn control(graph: &Graph, node: NodeId) -> NodeId {
        graph.input(node, 0)
    }

    pub fn call_target(graph: &Graph, node: NodeId) -> NodeId {
        graph.input(node, 1)
    }
}

impl NodeOp for InvokeNode {
    fn name(&self) -> &'static str {
        "Invoke"
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

    fn is_value_node(&self) -> bool {
        self.result != Kind::Void
    }

    fn lowerable(&self) -> Option<&dyn Lowerable> {
        Some(self)
    }
}

impl Lowerable for InvokeNode {
    fn generate(&self, node: NodeId, graph: &Graph, builder: &mut NodeLirBuilder<'_>) -> CompileResult<()> {
        let call_target = InvokeNode::call_target(graph, node);
        let Some(target) = graph.op_as::<MethodCallTargetNode>(call_target) else {
            return Err(CompileError::malformed(format!(
                "invoke {} has no call target",
                node
            )));
        };
        let mut args = Vec::new();
        for &arg in MethodCallTargetNode::arguments(graph, call_target) {
            args.push(builder.operand(arg)?);
        }
        let result = builder.tool().emit_call(target.target(), &args, self.result);
        if self.result != Kind::Void {
            builder.set_result(node, result);
        }
        Ok(())
    }
}

impl Graph {
    /// Call `target` with `args` after `control`. Returns the invoke.
    pub fn add_invoke(&mut self, control: NodeId, target: MethodId, args: &[NodeId], result: Kind) -> NodeId {
        let call_target = self.add(Arc::new(MethodCallTargetNode::new(target)), args, Stamp::Void);
        self.add(
            Arc::new(InvokeNode::new(result)),
            &[control, call_target],
            Stamp::for_kind(result),
        )
    }
}

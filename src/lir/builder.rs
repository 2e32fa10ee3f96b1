//! Node-to-operand bookkeeping during lowering.

use super::{LirGenerator, Value};
use crate::core::{CompileError, CompileResult};
use crate::ir::NodeId;
use hashbrown::HashMap;

/// Maps lowered nodes to their result operands and gives lowering rules
/// access to the backend generator.
pub struct NodeLirBuilder<'a> {
    tool: &'a mut dyn LirGenerator,
    results: HashMap<NodeId, Value>,
}

impl<'a> NodeLirBuilder<'a> {
    pub fn new(tool: &'a mut dyn LirGenerator) -> Self {
        Self {
            tool,
            results: HashMap::new(),
        }
    }

    pub fn tool(&mut self) -> &mut dyn LirGenerator {
        &mut *self.tool
    }

    /// Operand of an already lowered node.
    pub fn operand(&self, node: NodeId) -> CompileResult<Value> {
        self.results
            .get(&node)
            .copied()
            .ok_or(CompileError::MissingOperand { node })
    }

    /// Register the result operand of `node`. A node has at most one.
    pub fn set_result(&mut self, node: NodeId, value: Value) {
        let previous = self.results.insert(node, value);
        assert!(previous.is_none(), "{} lowered twice", node);
    }
}

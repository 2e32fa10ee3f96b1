// This module holds the commutative, associative integer operators: Or, And, Xor and Add.
// They share one canonical shape. Identical operands reduce by the operator's self law, a
// lone constant is swapped into the second slot in place, two constants fold at the stamp's
// width, and a constant second operand is checked against the operator's identity and
// absorbing elements. When nothing else applies, OP(OP(a, c1), c2) is re-associated into
// OP(a, c1 OP c2) so the two constants fold; the inner constant may sit in either slot.
// Every rewrite creates nodes through the canonicalizer tool, so results are value-numbered.

//! Commutative integer arithmetic and logic nodes.

use crate::core::CompileResult;
use crate::ir::{
    graph::Graph,
    node::{NodeId, NodeOp},
    spi::{Canonicalizable, CanonicalizerTool, Lowerable},
    stamp::{IntegerStamp, Stamp},
};
use crate::lir::{LirGenerator, NodeLirBuilder, Value};
use std::any::Any;
use std::sync::Arc;

/// Evaluation and lowering hooks of a binary commutative operator.
pub trait BinaryArithmetic: NodeOp + Default {
    /// Evaluate over raw bit patterns. The caller masks to the width.
    fn fold(&self, x: u64, y: u64) -> u64;

    fn fold_stamp(&self, x: &IntegerStamp, y: &IntegerStamp) -> IntegerStamp;

    fn emit(&self, tool: &mut dyn LirGenerator, x: Value, y: Value) -> Value;
}

fn binary_stamp<T: BinaryArithmetic>(op: &T, x: Stamp, y: Stamp) -> Option<Stamp> {
    match (x.as_integer(), y.as_integer()) {
        (Some(x), Some(y)) => Some(Stamp::Integer(op.fold_stamp(x, y))),
        _ => None,
    }
}

/// Value-numbered `T(x, y)` created on behalf of a rewrite.
fn create_binary<T: BinaryArithmetic>(tool: &mut CanonicalizerTool<'_>, x: NodeId, y: NodeId) -> NodeId {
    let op = T::default();
    let stamp = binary_stamp(&op, tool.stamp(x), tool.stamp(y)).unwrap_or_else(|| tool.stamp(x));
    tool.unique(Arc::new(op), &[x, y], stamp)
}

/// Fold two constant operands. `None` unless both are constants.
fn fold_constants<T: BinaryArithmetic>(
    op: &T,
    (x, y): (NodeId, NodeId),
    bits: u32,
    tool: &mut CanonicalizerTool<'_>,
) -> Option<NodeId> {
    let a = tool.as_int_constant(x)?;
    let b = tool.as_int_constant(y)?;
    Some(tool.int_constant(bits, op.fold(a, b)))
}

/// `OP(OP(a, c1), c2)` and `OP(OP(c1, a), c2)` become `OP(a, c1 OP c2)`.
fn reassociate<T: BinaryArithmetic>(
    op: &T,
    node: NodeId,
    (x, y): (NodeId, NodeId),
    bits: u32,
    tool: &mut CanonicalizerTool<'_>,
) -> NodeId {
    let Some(c2) = tool.as_int_constant(y) else {
        return node;
    };
    if !tool.graph().is_a::<T>(x) {
        return node;
    }
    let (inner_x, inner_y) = (tool.input(x, 0), tool.input(x, 1));
    let (a, c1) = match (tool.as_int_constant(inner_x), tool.as_int_constant(inner_y)) {
        (None, Some(c1)) => (inner_x, c1),
        (Some(c1), None) => (inner_y, c1),
        _ => return node,
    };
    let folded = tool.int_constant(bits, op.fold(c1, c2));
    create_binary::<T>(tool, a, folded)
}

fn int_width(tool: &CanonicalizerTool<'_>, node: NodeId) -> Option<u32> {
    tool.stamp(node).as_integer().map(IntegerStamp::bits)
}

fn lower_binary<T: BinaryArithmetic>(
    op: &T,
    node: NodeId,
    graph: &Graph,
    builder: &mut NodeLirBuilder<'_>,
) -> CompileResult<()> {
    let x = builder.operand(graph.input(node, 0))?;
    let y = builder.operand(graph.input(node, 1))?;
    let result = op.emit(builder.tool(), x, y);
    builder.set_result(node, result);
    Ok(())
}

macro_rules! binary_node_op {
    ($ty:ident, $name:literal) => {
        impl NodeOp for $ty {
            fn name(&self) -> &'static str {
                $name
            }

            fn as_any(&self) -> &dyn Any {
                self
            }

            fn is_value_node(&self) -> bool {
                true
            }

            fn value_key(&self) -> Option<u64> {
                Some(0)
            }

            fn is_commutative(&self) -> bool {
                true
            }

            fn infer_stamp(&self, graph: &Graph, node: NodeId) -> Option<Stamp> {
                let inputs = graph.inputs(node);
                binary_stamp(self, graph.stamp(inputs[0]), graph.stamp(inputs[1]))
            }

            fn canonicalizable(&self) -> Option<&dyn Canonicalizable> {
                Some(self)
            }

            fn lowerable(&self) -> Option<&dyn Lowerable> {
                Some(self)
            }
        }

        impl Lowerable for $ty {
            fn generate(&self, node: NodeId, graph: &Graph, builder: &mut NodeLirBuilder<'_>) -> CompileResult<()> {
                lower_binary(self, node, graph, builder)
            }
        }
    };
}

/// Bitwise inclusive or.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrNode;

binary_node_op!(OrNode, "Or");

impl BinaryArithmetic for OrNode {
    fn fold(&self, x: u64, y: u64) -> u64 {
        x | y
    }

    fn fold_stamp(&self, x: &IntegerStamp, y: &IntegerStamp) -> IntegerStamp {
        x.or(y)
    }

    fn emit(&self, tool: &mut dyn LirGenerator, x: Value, y: Value) -> Value {
        tool.emit_or(x, y)
    }
}

impl Canonicalizable for OrNode {
    fn canonical(&self, node: NodeId, tool: &mut CanonicalizerTool<'_>) -> NodeId {
        let (x, y) = tool.constant_right(node);
        if x == y {
            return x;
        }
        let Some(bits) = int_width(tool, node) else {
            return node;
        };
        if let Some(result) = fold_constants(self, (x, y), bits, tool) {
            return result;
        }
        if let Some(c) = tool.as_int_constant(y) {
            let mask = IntegerStamp::default_mask(bits);
            let raw = c & mask;
            if raw == mask {
                return tool.int_constant(bits, mask);
            }
            if raw == 0 {
                return x;
            }
        }
        reassociate(self, node, (x, y), bits, tool)
    }
}

/// Bitwise and.
#[derive(Debug, Clone, Copy, Default)]
pub struct AndNode;

binary_node_op!(AndNode, "And");

impl BinaryArithmetic for AndNode {
    fn fold(&self, x: u64, y: u64) -> u64 {
        x & y
    }

    fn fold_stamp(&self, x: &IntegerStamp, y: &IntegerStamp) -> IntegerStamp {
        x.and(y)
    }

    fn emit(&self, tool: &mut dyn LirGenerator, x: Value, y: Value) -> Value {
        tool.emit_and(x, y)
    }
}

impl Canonicalizable for AndNode {
    fn canonical(&self, node: NodeId, tool: &mut CanonicalizerTool<'_>) -> NodeId {
        let (x, y) = tool.constant_right(node);
        if x == y {
            return x;
        }
        let Some(bits) = int_width(tool, node) else {
            return node;
        };
        if let Some(result) = fold_constants(self, (x, y), bits, tool) {
            return result;
        }
        if let Some(c) = tool.as_int_constant(y) {
            let mask = IntegerStamp::default_mask(bits);
            let raw = c & mask;
            if raw == mask {
                return x;
            }
            if raw == 0 {
                return tool.int_constant(bits, 0);
            }
        }
        reassociate(self, node, (x, y), bits, tool)
    }
}

/// Bitwise exclusive or.
#[derive(Debug, Clone, Copy, Default)]
pub struct XorNode;

binary_node_op!(XorNode, "Xor");

impl BinaryArithmetic for XorNode {
    fn fold(&self, x: u64, y: u64) -> u64 {
        x ^ y
    }

    fn fold_stamp(&self, x: &IntegerStamp, y: &IntegerStamp) -> IntegerStamp {
        x.xor(y)
    }

    fn emit(&self, tool: &mut dyn LirGenerator, x: Value, y: Value) -> Value {
        tool.emit_xor(x, y)
    }
}

impl Canonicalizable for XorNode {
    fn canonical(&self, node: NodeId, tool: &mut CanonicalizerTool<'_>) -> NodeId {
        let (x, y) = tool.constant_right(node);
        let Some(bits) = int_width(tool, node) else {
            return node;
        };
        if x == y {
            return tool.int_constant(bits, 0);
        }
        if let Some(result) = fold_constants(self, (x, y), bits, tool) {
            return result;
        }
        if let Some(c) = tool.as_int_constant(y) {
            if c & IntegerStamp::default_mask(bits) == 0 {
                return x;
            }
        }
        reassociate(self, node, (x, y), bits, tool)
    }
}

/// Wrapping integer addition.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddNode;

binary_node_op!(AddNode, "Add");

impl BinaryArithmetic for AddNode {
    fn fold(&self, x: u64, y: u64) -> u64 {
        x.wrapping_add(y)
    }

    fn fold_stamp(&self, x: &IntegerStamp, y: &IntegerStamp) -> IntegerStamp {
        x.add(y)
    }

    fn emit(&self, tool: &mut dyn LirGenerator, x: Value, y: Value) -> Value {
        tool.emit_add(x, y)
    }
}

impl Canonicalizable for AddNode {
    fn canonical(&self, node: NodeId, tool: &mut CanonicalizerTool<'_>) -> NodeId {
        let (x, y) = tool.constant_right(node);
        let Some(bits) = int_width(tool, node) else {
            return node;
        };
        if let Some(result) = fold_constants(self, (x, y), bits, tool) {
            return result;
        }
        if let Some(c) = tool.as_int_constant(y) {
            if c & IntegerStamp::default_mask(bits) == 0 {
                return x;
            }
        }
        reassociate(self, node, (x, y), bits, tool)
    }
}

impl Graph {
    /// Value-numbered binary node over `x` and `y`.
    pub fn binary<T: BinaryArithmetic>(&mut self, x: NodeId, y: NodeId) -> NodeId {
        let op = T::default();
        let stamp = binary_stamp(&op, self.stamp(x), self.stamp(y)).unwrap_or_else(|| self.stamp(x));
        self.unique(Arc::new(op), &[x, y], stamp)
    }

    pub fn or(&mut self, x: NodeId, y: NodeId) -> NodeId {
        self.binary::<OrNode>(x, y)
    }

    pub fn and(&mut self, x: NodeId, y: NodeId) -> NodeId {
        self.binary::<AndNode>(x, y)
    }

    pub fn xor(&mut self, x: NodeId, y: NodeId) -> NodeId {
        self.binary::<XorNode>(x, y)
    }

    pub fn int_add(&mut self, x: NodeId, y: NodeId) -> NodeId {
        self.binary::<AddNode>(x, y)
    }
}

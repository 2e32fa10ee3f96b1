//! Node-to-LIR lowering driver.

use super::{schedule, Lir, LirGenerator, NodeLirBuilder};
use crate::core::{CompileError, CompileResult};
use crate::ir::Graph;
use log::{debug, trace};

/// Lower every live node of `graph` through `tool`.
///
/// Nodes are visited in [`schedule`] order, so each node's inputs already
/// have operands when it is lowered. A node whose operator offers no
/// lowering capability aborts the unit.
pub fn lower_graph(graph: &Graph, tool: &mut dyn LirGenerator) -> CompileResult<Lir> {
    let order = schedule(graph)?;
    debug!(
        "lowering {} ({} nodes) for {}",
        graph.name(),
        order.len(),
        tool.arch()
    );

    let mut builder = NodeLirBuilder::new(tool);
    for node in order {
        let op = graph.op(node);
        let Some(lowerable) = op.lowerable() else {
            return Err(CompileError::NoLoweringCapability { node, op: op.name() });
        };
        trace!("lower {} {}", node, op.describe());
        lowerable.generate(node, graph, &mut builder)?;
    }

    let lir = builder.tool().take_lir();
    lir.verify()?;
    Ok(lir)
}

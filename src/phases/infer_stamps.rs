//! Stamp re-inference to a fixpoint.

use super::{Phase, PhaseContext};
use crate::core::CompileResult;
use crate::ir::{Graph, NodeId};
use log::{trace, warn};

/// Re-derives every stamp from its inputs until nothing narrows further.
///
/// Stamps only ever narrow, so each node can change a bounded number of
/// times; the round cap is a backstop against a non-monotone transfer
/// function.
#[derive(Debug, Default, Clone, Copy)]
pub struct InferStampsPhase;

impl InferStampsPhase {
    pub fn new() -> Self {
        Self
    }
}

impl Phase for InferStampsPhase {
    fn name(&self) -> &'static str {
        "InferStamps"
    }

    fn run(&self, graph: &mut Graph, _context: &PhaseContext<'_, '_>) -> CompileResult<bool> {
        let max_rounds = graph.id_bound().max(1);
        let mut changed = false;
        for round in 0..max_rounds {
            let nodes: Vec<NodeId> = graph.live_nodes().collect();
            let mut round_changed = false;
            for node in nodes {
                if graph.infer_stamp(node) {
                    trace!("round {}: {} narrowed to {}", round, node, graph.stamp(node));
                    round_changed = true;
                }
            }
            if !round_changed {
                return Ok(changed);
            }
            changed = true;
        }
        warn!("stamp inference on {} did not settle in {} rounds", graph.name(), max_rounds);
        Ok(changed)
    }
}

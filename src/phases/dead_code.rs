//! Dead code elimination.
//!
//! A node survives if it is an anchor, has a side effect, or is an input
//! (transitively) of one that does. Everything else is detached and removed.

use super::{Phase, PhaseContext};
use crate::core::CompileResult;
use crate::ir::{Graph, NodeId};
use hashbrown::HashSet;
use log::trace;

#[derive(Debug, Default, Clone, Copy)]
pub struct DeadCodeEliminationPhase;

impl DeadCodeEliminationPhase {
    pub fn new() -> Self {
        Self
    }

    fn live_set(graph: &Graph) -> HashSet<NodeId> {
        let mut live = HashSet::new();
        let mut worklist: Vec<NodeId> = graph
            .live_nodes()
            .filter(|&id| {
                let op = graph.op(id);
                op.is_anchor() || op.has_side_effect()
            })
            .collect();
        while let Some(id) = worklist.pop() {
            if live.insert(id) {
                worklist.extend(graph.inputs(id).iter().copied());
            }
        }
        live
    }
}

impl Phase for DeadCodeEliminationPhase {
    fn name(&self) -> &'static str {
        "DeadCodeElimination"
    }

    fn run(&self, graph: &mut Graph, context: &PhaseContext<'_, '_>) -> CompileResult<bool> {
        let live = Self::live_set(graph);
        let dead: Vec<NodeId> = graph.live_nodes().filter(|id| !live.contains(id)).collect();
        if dead.is_empty() {
            return Ok(false);
        }

        // Detach first so that deletion never trips over edges among dead nodes.
        for &id in &dead {
            graph.clear_inputs(id);
        }
        for &id in &dead {
            trace!("remove dead {} {}", id, graph.op(id).describe());
            graph.delete(id);
        }
        context.session.record_nodes_removed(dead.len());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{CompilationSession, CompilerOptions};
    use crate::meta::Kind;
    use bumpalo::Bump;

    #[test]
    fn test_unreachable_values_are_removed() {
        let mut graph = Graph::new("dce", &[Kind::Int, Kind::Int]);
        let x = graph.parameter(0);
        let y = graph.parameter(1);
        let unused = graph.or(x, y);
        let _unused_chain = graph.xor(unused, x);
        let ret = graph.add_return(graph.start(), Some(x));

        let arena = Bump::new();
        let session = CompilationSession::new(&arena);
        let options = CompilerOptions::default();
        let context = PhaseContext::new(&options, &session);

        let phase = DeadCodeEliminationPhase::new();
        assert!(phase.apply(&mut graph, &context).unwrap());
        assert_eq!(graph.node_count(), 3);
        assert!(graph.is_alive(ret));
        assert!(graph.is_alive(x));
        assert!(!graph.is_alive(y));
        assert_eq!(session.stats().nodes_removed, 3);

        assert!(!phase.apply(&mut graph, &context).unwrap());
    }
}

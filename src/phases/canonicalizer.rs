// This module implements the canonicalizer, graft's worklist-driven local rewriting
// phase. Every live node starts on the worklist. Processing a node kills it if it is an
// unused floating node, re-infers its stamp (a stamp that narrows to a single integer
// value folds the node to a constant), applies the node's own canonicalization rule,
// which may also swap the operands of a commutative node in place, and finally looks for
// a structurally identical node to merge with. Whenever a node is replaced, its former
// users and the replacement go back on the worklist, so rewrites that enable further
// rewrites are picked up until nothing changes. Worklist pops are capped by the options;
// hitting the cap logs a warning and ends the run early.

//! Canonicalization to a fixpoint.

use super::{Phase, PhaseContext};
use crate::core::CompileResult;
use crate::ir::{CanonicalizerTool, ConstantNode, Graph, NodeId};
use hashbrown::HashSet;
use log::{debug, trace, warn};
use std::collections::VecDeque;

/// Worklist of nodes awaiting another look.
struct Worklist {
    queue: VecDeque<NodeId>,
    queued: HashSet<NodeId>,
}

impl Worklist {
    fn new(nodes: impl IntoIterator<Item = NodeId>) -> Self {
        let mut worklist = Self {
            queue: VecDeque::new(),
            queued: HashSet::new(),
        };
        for node in nodes {
            worklist.push(node);
        }
        worklist
    }

    fn push(&mut self, node: NodeId) {
        if self.queued.insert(node) {
            self.queue.push_back(node);
        }
    }

    fn pop(&mut self) -> Option<NodeId> {
        let node = self.queue.pop_front()?;
        self.queued.remove(&node);
        Some(node)
    }
}

/// Local rewriting, constant folding and value numbering.
#[derive(Debug, Default, Clone, Copy)]
pub struct CanonicalizerPhase;

impl CanonicalizerPhase {
    pub fn new() -> Self {
        Self
    }

    /// Redirect the users of `old` to `new` and drop `old` if it died.
    fn replace(
        graph: &mut Graph,
        old: NodeId,
        new: NodeId,
        worklist: &mut Worklist,
        context: &PhaseContext<'_, '_>,
    ) {
        let users: Vec<NodeId> = graph.usages(old).to_vec();
        graph.replace_at_usages(old, new);
        for user in users {
            worklist.push(user);
        }
        worklist.push(new);
        let removed = graph.kill_if_dead(old);
        context.session.record_nodes_removed(removed);
    }

    /// One visit of `node`. Returns whether the graph changed.
    fn process(
        graph: &mut Graph,
        node: NodeId,
        worklist: &mut Worklist,
        context: &PhaseContext<'_, '_>,
    ) -> bool {
        let (unused, killable) = {
            let n = graph.node(node);
            (!n.has_usages(), n.is_killable())
        };
        if unused && killable {
            let inputs = graph.inputs(node).to_vec();
            let removed = graph.kill_if_dead(node);
            if removed > 0 {
                context.session.record_nodes_removed(removed);
                for input in inputs {
                    if graph.is_alive(input) {
                        worklist.push(input);
                    }
                }
                return true;
            }
        }

        let mut changed = false;
        if graph.infer_stamp(node) {
            trace!("{} narrowed to {}", node, graph.stamp(node));
            for &user in graph.usages(node) {
                worklist.push(user);
            }
            changed = true;
        }

        let op = graph.op(node).clone();
        if let Some(rule) = op.canonicalizable() {
            if op.value_key().is_some() && !graph.is_a::<ConstantNode>(node) {
                let folded = graph
                    .stamp(node)
                    .as_integer()
                    .and_then(|s| s.as_constant().map(|value| (s.bits(), value)));
                if let Some((bits, value)) = folded {
                    let constant = graph.int_constant(bits, value);
                    trace!("{} {} folded to {} by its stamp", node, op.name(), constant);
                    context.session.record_constant_fold();
                    Self::replace(graph, node, constant, worklist, context);
                    return true;
                }
            }

            let (result, created, commuted) = {
                let mut tool = CanonicalizerTool::new(graph);
                let result = rule.canonical(node, &mut tool);
                (result, tool.take_created(), tool.commuted())
            };
            for created in created {
                worklist.push(created);
            }
            if commuted {
                trace!("{} {} operands reordered", node, op.name());
                context.session.record_rewrite();
                changed = true;
            }
            if result != node {
                trace!("{} {} canonicalized to {}", node, op.describe(), result);
                context.session.record_rewrite();
                if graph.is_a::<ConstantNode>(result) {
                    context.session.record_constant_fold();
                }
                Self::replace(graph, node, result, worklist, context);
                return true;
            }
        }

        if let Some(existing) = graph.find_duplicate(node) {
            trace!("{} duplicates {}", node, existing);
            context.session.record_gvn_hit();
            Self::replace(graph, node, existing, worklist, context);
            return true;
        }
        changed
    }
}

impl Phase for CanonicalizerPhase {
    fn name(&self) -> &'static str {
        "Canonicalizer"
    }

    fn run(&self, graph: &mut Graph, context: &PhaseContext<'_, '_>) -> CompileResult<bool> {
        let limit = context.options.max_canonicalizer_iterations;
        let mut worklist = Worklist::new(graph.live_nodes().collect::<Vec<_>>());
        let mut changed = false;
        let mut pops = 0usize;
        let mut rewrites = 0usize;

        while let Some(node) = worklist.pop() {
            if !graph.is_alive(node) {
                continue;
            }
            if pops == limit {
                warn!(
                    "canonicalizer stopped after {} iterations on {} with {} nodes pending",
                    limit,
                    graph.name(),
                    worklist.queue.len() + 1
                );
                break;
            }
            pops += 1;
            if Self::process(graph, node, &mut worklist, context) {
                changed = true;
                rewrites += 1;
            }
        }

        debug!(
            "canonicalized {}: {} visits, {} changes, {} nodes left",
            graph.name(),
            pops,
            rewrites,
            graph.node_count()
        );
        Ok(changed)
    }
}

// This module implements the mutable graph that one compilation job owns. Nodes live in an
// index arena (Vec<Option<Node>>); input and usage lists are vectors of NodeIds, so the
// logically cyclic graph has no ownership cycles. Every edge mutation goes through a small
// set of methods (add, set_input, replace_at_usages, clear_inputs, delete) that keep the
// usage back-references exactly in step with the input edges. Global value numbering is a
// hashbrown map from a structural key (operator name, payload, width, ordered inputs) to
// the node that first claimed it; entries are validated on lookup so mutations never need
// to eagerly invalidate the map.

//! Graph ownership, edge maintenance and value numbering.

use super::{
    node::{Node, NodeId, NodeOp},
    nodes::StartNode,
    stamp::Stamp,
};
use crate::core::{CompileError, CompileResult};
use crate::meta::Kind;
use hashbrown::HashMap;
use log::trace;
use std::fmt;
use std::sync::Arc;

/// Structural fingerprint used for value numbering.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct GvnKey {
    name: &'static str,
    data: u64,
    width: u32,
    inputs: Vec<NodeId>,
}

fn stamp_width(stamp: &Stamp) -> u32 {
    match stamp {
        Stamp::Integer(s) => s.bits(),
        Stamp::Float { bits } => *bits,
        Stamp::Object(_) => 64,
        Stamp::Void | Stamp::Illegal => 0,
    }
}

/// Graph of one compilation unit.
#[derive(Debug, Clone)]
pub struct Graph {
    name: String,
    nodes: Vec<Option<Node>>,
    live: usize,
    start: NodeId,
    signature: Vec<Kind>,
    gvn: HashMap<GvnKey, NodeId>,
}

impl Graph {
    /// Empty graph holding only its start node.
    pub fn new(name: &str, signature: &[Kind]) -> Self {
        let mut graph = Self {
            name: name.to_string(),
            nodes: Vec::new(),
            live: 0,
            start: NodeId::new(0),
            signature: signature.to_vec(),
            gvn: HashMap::new(),
        };
        graph.start = graph.add(Arc::new(StartNode), &[], Stamp::Void);
        graph
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start(&self) -> NodeId {
        self.start
    }

    /// Kinds of the incoming parameters.
    pub fn signature(&self) -> &[Kind] {
        &self.signature
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.live
    }

    /// Upper bound (exclusive) on node indices handed out so far.
    pub fn id_bound(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_alive(&self, id: NodeId) -> bool {
        matches!(self.nodes.get(id.index()), Some(Some(_)))
    }

    pub fn try_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).and_then(|slot| slot.as_ref())
    }

    /// Access a live node. Accessing a deleted node is a contract violation.
    pub fn node(&self, id: NodeId) -> &Node {
        match self.try_node(id) {
            Some(node) => node,
            None => panic!("{} is not a live node of graph {}", id, self.name),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        match self.nodes.get_mut(id.index()).and_then(|slot| slot.as_mut()) {
            Some(node) => node,
            None => panic!("{} is not a live node", id),
        }
    }

    pub fn op(&self, id: NodeId) -> &Arc<dyn NodeOp> {
        self.node(id).op()
    }

    pub fn inputs(&self, id: NodeId) -> &[NodeId] {
        self.node(id).inputs()
    }

    pub fn input(&self, id: NodeId, slot: usize) -> NodeId {
        self.node(id).inputs[slot]
    }

    pub fn usages(&self, id: NodeId) -> &[NodeId] {
        self.node(id).usages()
    }

    pub fn stamp(&self, id: NodeId) -> Stamp {
        self.node(id).stamp
    }

    /// Downcast a node's operator.
    pub fn op_as<T: NodeOp>(&self, id: NodeId) -> Option<&T> {
        self.try_node(id)?.op.as_any().downcast_ref::<T>()
    }

    pub fn is_a<T: NodeOp>(&self, id: NodeId) -> bool {
        self.op_as::<T>(id).is_some()
    }

    /// Live node ids in ascending order.
    pub fn live_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(index, _)| NodeId::new(index as u32))
    }

    /// Live nodes whose operator is a `T`.
    pub fn nodes_of<T: NodeOp>(&self) -> Vec<NodeId> {
        self.live_nodes().filter(|&id| self.is_a::<T>(id)).collect()
    }

    /// Insert a new node. Value-producing operators require a value stamp.
    pub fn add(&mut self, op: Arc<dyn NodeOp>, inputs: &[NodeId], stamp: Stamp) -> NodeId {
        assert!(
            !op.is_value_node() || stamp.is_value(),
            "value node {} constructed with non-value stamp {}",
            op.name(),
            stamp
        );
        for &input in inputs {
            assert!(self.is_alive(input), "input {} of new {} is not live", input, op.name());
        }

        let id = NodeId::new(self.nodes.len() as u32);
        for &input in inputs {
            self.node_mut(input).usages.push(id);
        }
        self.nodes.push(Some(Node {
            op,
            inputs: inputs.to_vec(),
            usages: Vec::new(),
            stamp,
        }));
        self.live += 1;
        id
    }

    fn gvn_key(op: &dyn NodeOp, inputs: &[NodeId], stamp: &Stamp) -> Option<GvnKey> {
        if op.has_side_effect() || op.is_fixed() {
            return None;
        }
        let data = op.value_key()?;
        let mut inputs = inputs.to_vec();
        if op.is_commutative() {
            inputs.sort_unstable();
        }
        Some(GvnKey {
            name: op.name(),
            data,
            width: stamp_width(stamp),
            inputs,
        })
    }

    fn key_of(&self, id: NodeId) -> Option<GvnKey> {
        let node = self.node(id);
        Self::gvn_key(node.op.as_ref(), &node.inputs, &node.stamp)
    }

    /// Look up a live node matching `key`, dropping a stale entry.
    fn lookup(&mut self, key: &GvnKey) -> Option<NodeId> {
        let candidate = *self.gvn.get(key)?;
        if self.is_alive(candidate) && self.key_of(candidate).as_ref() == Some(key) {
            return Some(candidate);
        }
        self.gvn.remove(key);
        None
    }

    /// Value-numbering constructor: an existing structurally identical node,
    /// or the newly inserted candidate.
    pub fn unique(&mut self, op: Arc<dyn NodeOp>, inputs: &[NodeId], stamp: Stamp) -> NodeId {
        self.unique_with_status(op, inputs, stamp).0
    }

    /// Like [`Graph::unique`], also reporting whether a node was created.
    pub fn unique_with_status(
        &mut self,
        op: Arc<dyn NodeOp>,
        inputs: &[NodeId],
        stamp: Stamp,
    ) -> (NodeId, bool) {
        let Some(key) = Self::gvn_key(op.as_ref(), inputs, &stamp) else {
            return (self.add(op, inputs, stamp), true);
        };
        if let Some(existing) = self.lookup(&key) {
            trace!("unique: reusing {} for {}", existing, op.name());
            return (existing, false);
        }
        let id = self.add(op, inputs, stamp);
        self.gvn.insert(key, id);
        (id, true)
    }

    /// Another live node structurally identical to `id`. Registers `id` if
    /// it is the first of its shape.
    pub fn find_duplicate(&mut self, id: NodeId) -> Option<NodeId> {
        let key = self.key_of(id)?;
        match self.lookup(&key) {
            Some(existing) if existing != id => Some(existing),
            Some(_) => None,
            None => {
                self.gvn.insert(key, id);
                None
            }
        }
    }

    /// Swap the two operands of a commutative `node`. Usage back-edges are
    /// unaffected since both operands keep exactly one edge from `node`.
    pub fn commute_inputs(&mut self, node: NodeId) {
        let n = self.node_mut(node);
        assert!(
            n.op.is_commutative() && n.inputs.len() == 2,
            "cannot commute inputs of {}",
            n.op.name()
        );
        n.inputs.swap(0, 1);
    }

    /// Point input `slot` of `node` at `new`, moving the usage back-edge.
    pub fn set_input(&mut self, node: NodeId, slot: usize, new: NodeId) {
        assert!(self.is_alive(new), "new input {} of {} is not live", new, node);
        let old = self.node(node).inputs[slot];
        if old == new {
            return;
        }
        self.remove_usage(old, node);
        self.node_mut(node).inputs[slot] = new;
        self.node_mut(new).usages.push(node);
    }

    fn remove_usage(&mut self, of: NodeId, user: NodeId) {
        let usages = &mut self.node_mut(of).usages;
        match usages.iter().position(|&u| u == user) {
            Some(pos) => {
                usages.swap_remove(pos);
            }
            None => panic!("usage {} missing on {}", user, of),
        }
    }

    /// Every `(user, slot)` edge that points at `id`.
    pub fn usage_edges(&self, id: NodeId) -> Vec<(NodeId, usize)> {
        let mut users: Vec<NodeId> = self.node(id).usages.clone();
        users.sort_unstable();
        users.dedup();
        let mut edges = Vec::new();
        for user in users {
            for (slot, &input) in self.node(user).inputs.iter().enumerate() {
                if input == id {
                    edges.push((user, slot));
                }
            }
        }
        edges
    }

    /// Redirect every usage of `old` to `new`.
    pub fn replace_at_usages(&mut self, old: NodeId, new: NodeId) {
        assert_ne!(old, new, "cannot replace {} with itself", old);
        for (user, slot) in self.usage_edges(old) {
            self.set_input(user, slot, new);
        }
    }

    /// Detach every input edge of `id`.
    pub fn clear_inputs(&mut self, id: NodeId) {
        let inputs = std::mem::take(&mut self.node_mut(id).inputs);
        for input in inputs {
            self.remove_usage(input, id);
        }
    }

    /// Remove a node that nothing uses any more.
    pub fn delete(&mut self, id: NodeId) {
        assert!(
            !self.node(id).has_usages(),
            "cannot delete {} ({}) while it still has usages",
            id,
            self.node(id).name()
        );
        self.clear_inputs(id);
        self.nodes[id.index()] = None;
        self.live -= 1;
    }

    /// Delete `id` if it is an unused, effect-free floating node, then its
    /// inputs that become dead as a result. Returns the number removed.
    pub fn kill_if_dead(&mut self, id: NodeId) -> usize {
        let mut removed = 0;
        let mut worklist = vec![id];
        while let Some(current) = worklist.pop() {
            let Some(node) = self.try_node(current) else {
                continue;
            };
            if node.has_usages() || !node.is_killable() {
                continue;
            }
            let inputs = node.inputs.clone();
            self.delete(current);
            removed += 1;
            worklist.extend(inputs);
        }
        removed
    }

    /// Narrow the stamp of `id`. Returns whether it changed.
    pub fn improve_stamp(&mut self, id: NodeId, stamp: Stamp) -> bool {
        let current = self.node(id).stamp;
        match current.try_improve(&stamp) {
            Some(improved) => {
                self.node_mut(id).stamp = improved;
                true
            }
            None => false,
        }
    }

    /// Re-derive the stamp of `id` from its inputs, narrowing only.
    pub fn infer_stamp(&mut self, id: NodeId) -> bool {
        let op = self.node(id).op.clone();
        match op.infer_stamp(self, id) {
            Some(inferred) => self.improve_stamp(id, inferred),
            None => false,
        }
    }

    /// Check edge and stamp consistency.
    pub fn verify(&self) -> CompileResult<()> {
        let mut counted: HashMap<NodeId, usize> = HashMap::new();
        for id in self.live_nodes() {
            let node = self.node(id);
            if node.op.is_value_node() && !node.stamp.is_value() {
                return Err(CompileError::malformed(format!(
                    "value node {} ({}) has stamp {}",
                    id,
                    node.name(),
                    node.stamp
                )));
            }
            for (slot, &input) in node.inputs.iter().enumerate() {
                let Some(target) = self.try_node(input) else {
                    return Err(CompileError::malformed(format!(
                        "{} ({}) slot {} refers to deleted node {}",
                        id,
                        node.name(),
                        slot,
                        input
                    )));
                };
                if node.op.is_control_slot(slot) && !target.op.is_fixed() {
                    return Err(CompileError::malformed(format!(
                        "control slot {} of {} refers to floating node {}",
                        slot, id, input
                    )));
                }
                *counted.entry(input).or_insert(0) += 1;
            }
        }
        for id in self.live_nodes() {
            let node = self.node(id);
            let expected = counted.get(&id).copied().unwrap_or(0);
            if node.usages.len() != expected {
                return Err(CompileError::malformed(format!(
                    "{} has {} usage entries but {} incoming edges",
                    id,
                    node.usages.len(),
                    expected
                )));
            }
            for &user in &node.usages {
                if !self.try_node(user).is_some_and(|u| u.inputs.contains(&id)) {
                    return Err(CompileError::malformed(format!(
                        "{} lists {} as a usage without a matching edge",
                        id, user
                    )));
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "graph {} ({} nodes)", self.name, self.live)?;
        for id in self.live_nodes() {
            let node = self.node(id);
            write!(f, "  {} = {}", id, node.op.describe())?;
            if !node.inputs.is_empty() {
                let inputs: Vec<String> = node.inputs.iter().map(|i| i.to_string()).collect();
                write!(f, "({})", inputs.join(", "))?;
            }
            if node.stamp.is_value() {
                write!(f, " : {}", node.stamp)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::nodes::{ConstantNode, OrNode, ParameterNode, ReturnNode};

    fn or_op() -> Arc<dyn NodeOp> {
        Arc::new(OrNode)
    }

    #[test]
    fn test_new_graph_has_start() {
        let graph = Graph::new("empty", &[]);
        assert_eq!(graph.node_count(), 1);
        assert!(graph.is_a::<StartNode>(graph.start()));
        graph.verify().unwrap();
    }

    #[test]
    fn test_usages_follow_inputs() {
        let mut graph = Graph::new("edges", &[Kind::Int, Kind::Int]);
        let x = graph.parameter(0);
        let y = graph.parameter(1);
        let or = graph.add(or_op(), &[x, y], Stamp::int(32));

        assert_eq!(graph.usages(x), &[or]);
        graph.set_input(or, 1, x);
        assert_eq!(graph.usages(x).len(), 2);
        assert!(graph.usages(y).is_empty());
        assert_eq!(graph.usage_edges(x), vec![(or, 0), (or, 1)]);
        graph.verify().unwrap();
    }

    #[test]
    fn test_unique_deduplicates() {
        let mut graph = Graph::new("gvn", &[Kind::Int, Kind::Int]);
        let x = graph.parameter(0);
        let y = graph.parameter(1);
        let (a, created_a) = graph.unique_with_status(or_op(), &[x, y], Stamp::int(32));
        let (b, created_b) = graph.unique_with_status(or_op(), &[x, y], Stamp::int(32));
        assert!(created_a);
        assert!(!created_b);
        assert_eq!(a, b);

        // Operand order is irrelevant for a commutative operator.
        let c = graph.unique(or_op(), &[y, x], Stamp::int(32));
        assert_eq!(a, c);
    }

    #[test]
    fn test_commute_inputs_keeps_edges() {
        let mut graph = Graph::new("commute", &[Kind::Int, Kind::Int]);
        let x = graph.parameter(0);
        let y = graph.parameter(1);
        let or = graph.or(y, x);
        graph.commute_inputs(or);
        assert_eq!(graph.inputs(or), &[x, y]);
        assert_eq!(graph.usage_edges(x), vec![(or, 0)]);
        assert_eq!(graph.usage_edges(y), vec![(or, 1)]);
        assert_eq!(graph.find_duplicate(or), None);
        assert_eq!(graph.or(x, y), or);
        graph.verify().unwrap();
    }

    #[test]
    fn test_unique_ignores_stale_entries() {
        let mut graph = Graph::new("stale", &[Kind::Int]);
        let x = graph.parameter(0);
        let c1 = graph.int_constant(32, 1);
        let a = graph.unique(or_op(), &[x, c1], Stamp::int(32));
        graph.delete(a);
        let b = graph.unique(or_op(), &[x, c1], Stamp::int(32));
        assert_ne!(a, b);
        assert!(graph.is_alive(b));
    }

    #[test]
    fn test_constants_of_different_width_stay_distinct() {
        let mut graph = Graph::new("widths", &[]);
        let a = graph.int_constant(32, 5);
        let b = graph.int_constant(64, 5);
        let c = graph.int_constant(32, 5);
        assert_ne!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_kill_if_dead_is_transitive() {
        let mut graph = Graph::new("kill", &[Kind::Int]);
        let x = graph.parameter(0);
        let c = graph.int_constant(32, 3);
        let or = graph.unique(or_op(), &[x, c], Stamp::int(32));
        let outer = graph.unique(or_op(), &[or, c], Stamp::int(32));

        let removed = graph.kill_if_dead(outer);
        assert_eq!(removed, 4);
        assert!(!graph.is_alive(or));
        assert!(!graph.is_alive(x));
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn test_kill_if_dead_keeps_anchors() {
        let mut graph = Graph::new("anchored", &[Kind::Int]);
        let x = graph.parameter(0);
        let ret = graph.add_return(graph.start(), Some(x));
        assert_eq!(graph.kill_if_dead(ret), 0);
        assert_eq!(graph.kill_if_dead(x), 0);
        assert!(graph.is_a::<ReturnNode>(ret));
    }

    #[test]
    fn test_replace_at_usages() {
        let mut graph = Graph::new("replace", &[Kind::Int]);
        let x = graph.parameter(0);
        let c = graph.int_constant(32, 0);
        let or = graph.unique(or_op(), &[x, c], Stamp::int(32));
        let ret = graph.add_return(graph.start(), Some(or));

        graph.replace_at_usages(or, x);
        assert_eq!(graph.input(ret, 1), x);
        assert!(!graph.node(or).has_usages());
        graph.verify().unwrap();
    }

    #[test]
    #[should_panic]
    fn test_value_node_requires_value_stamp() {
        let mut graph = Graph::new("bad", &[]);
        graph.add(Arc::new(ConstantNode::new(1)), &[], Stamp::Void);
    }

    #[test]
    #[should_panic]
    fn test_delete_with_usages_panics() {
        let mut graph = Graph::new("bad", &[Kind::Int]);
        let x = graph.parameter(0);
        graph.add_return(graph.start(), Some(x));
        graph.delete(x);
    }

    #[test]
    fn test_improve_stamp_is_narrow_only() {
        let mut graph = Graph::new("stamps", &[Kind::Int]);
        let x = graph.parameter(0);
        assert!(graph.improve_stamp(x, Stamp::int_constant(32, 4)));
        assert!(!graph.improve_stamp(x, Stamp::int(32)));
        assert_eq!(graph.stamp(x), Stamp::int_constant(32, 4));
        assert!(graph.is_a::<ParameterNode>(x));
    }

    #[test]
    fn test_dump_lists_nodes() {
        let mut graph = Graph::new("dump", &[Kind::Int]);
        let x = graph.parameter(0);
        graph.add_return(graph.start(), Some(x));
        let text = graph.to_string();
        assert!(text.contains("graph dump (3 nodes)"));
        assert!(text.contains("Parameter(0)"));
        assert!(text.contains("Return(n0, n1)"));
    }
}

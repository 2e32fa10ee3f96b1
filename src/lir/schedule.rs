//! Lowering order.
//!
//! A topological order over input edges: every node comes after all of its
//! inputs. Ties are broken by ascending node id so the order is
//! deterministic, and block-ending nodes (method exits) are held back until
//! everything else is placed.

use crate::core::{CompileError, CompileResult};
use crate::ir::{Graph, NodeId};
use hashbrown::HashMap;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Order the live nodes of `graph` for lowering.
pub fn schedule(graph: &Graph) -> CompileResult<Vec<NodeId>> {
    let mut pending: HashMap<NodeId, usize> = HashMap::new();
    let mut ready = BinaryHeap::new();
    let mut deferred = Vec::new();

    for id in graph.live_nodes() {
        let inputs = graph.inputs(id).len();
        if inputs == 0 {
            ready.push(Reverse(id));
        } else {
            pending.insert(id, inputs);
        }
    }

    let mut order = Vec::with_capacity(graph.node_count());
    while let Some(Reverse(id)) = ready.pop() {
        order.push(id);
        for &user in graph.usages(id) {
            let Some(remaining) = pending.get_mut(&user) else {
                continue;
            };
            *remaining -= 1;
            if *remaining == 0 {
                pending.remove(&user);
                if graph.op(user).is_block_end() {
                    deferred.push(user);
                } else {
                    ready.push(Reverse(user));
                }
            }
        }
    }

    if !pending.is_empty() {
        let mut stuck: Vec<NodeId> = pending.keys().copied().collect();
        stuck.sort_unstable();
        return Err(CompileError::Scheduling {
            reason: format!("dependency cycle through {} nodes starting at {}", stuck.len(), stuck[0]),
        });
    }

    deferred.sort_unstable();
    order.extend(deferred);
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::Kind;

    #[test]
    fn test_inputs_come_first() {
        let mut graph = Graph::new("order", &[Kind::Int, Kind::Int]);
        let x = graph.parameter(0);
        let y = graph.parameter(1);
        let or = graph.or(x, y);
        let ret = graph.add_return(graph.start(), Some(or));

        let order = schedule(&graph).unwrap();
        let pos = |n: NodeId| order.iter().position(|&o| o == n).unwrap();
        assert_eq!(order.len(), graph.node_count());
        assert!(pos(x) < pos(or));
        assert!(pos(y) < pos(or));
        assert_eq!(*order.last().unwrap(), ret);
    }

    #[test]
    fn test_returns_are_deferred() {
        let mut graph = Graph::new("early", &[Kind::Int]);
        let ret = graph.add_return(graph.start(), None);
        let x = graph.parameter(0);
        let c = graph.int_constant(32, 1);
        graph.or(x, c);

        let order = schedule(&graph).unwrap();
        assert_eq!(*order.last().unwrap(), ret);
    }

    #[test]
    fn test_cycle_is_reported() {
        let mut graph = Graph::new("cycle", &[Kind::Int]);
        let x = graph.parameter(0);
        let c = graph.int_constant(32, 1);
        let a = graph.or(x, c);
        let b = graph.or(a, c);
        graph.set_input(a, 0, b);

        assert!(matches!(schedule(&graph), Err(CompileError::Scheduling { .. })));
    }
}

// This module splices a callee graph into a call site. The callee is copied node by node
// in dependency order with a remapping table: its start node stands for the invoke's
// control predecessor and each parameter stands for the matching actual argument, so the
// copies hang directly off the caller's values. Returns are not copied. A single return
// supplies the exit control node and the result value directly; several returns are
// joined by a new merge, with a value phi over the returned values whose stamp is their
// meet. Finally every use of the invoke is retargeted (control uses to the exit, value
// uses to the result), the invoke is deleted and its call target is dropped if nothing
// else needs it. All preconditions are checked before the caller graph is touched.

//! Graph inlining.

use crate::core::{CompileError, CompileResult};
use crate::ir::{Graph, InvokeNode, MethodCallTargetNode, NodeId, ParameterNode, ReturnNode};
use crate::lir::schedule;
use crate::meta::Kind;
use hashbrown::HashMap;
use log::debug;

/// Where the inlined body ended up in the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineResult {
    /// Value replacing the invoke's result, if it had one.
    pub result: Option<NodeId>,
    /// Fixed node control continues from.
    pub exit: NodeId,
    /// Nodes copied out of the callee.
    pub copied: usize,
}

fn inlining_error(reason: impl Into<String>) -> CompileError {
    CompileError::Inlining { reason: reason.into() }
}

fn mapped(map: &HashMap<NodeId, NodeId>, node: NodeId) -> CompileResult<NodeId> {
    map.get(&node)
        .copied()
        .ok_or_else(|| inlining_error(format!("callee node {} used before it was copied", node)))
}

/// Replace `invoke` in `graph` by a copy of `callee`.
pub fn inline(graph: &mut Graph, invoke: NodeId, callee: &Graph) -> CompileResult<InlineResult> {
    let Some(result_kind) = graph.op_as::<InvokeNode>(invoke).map(InvokeNode::result_kind) else {
        return Err(inlining_error(format!("{} is not an invoke", invoke)));
    };
    let call_target = InvokeNode::call_target(graph, invoke);
    let args = MethodCallTargetNode::arguments(graph, call_target).to_vec();
    let predecessor = InvokeNode::control(graph, invoke);

    if args.len() != callee.signature().len() {
        return Err(inlining_error(format!(
            "{} passes {} arguments but {} takes {}",
            invoke,
            args.len(),
            callee.name(),
            callee.signature().len()
        )));
    }
    let returns = callee.returns();
    if returns.is_empty() {
        return Err(inlining_error(format!("{} has no exit", callee.name())));
    }
    let needs_value = result_kind != Kind::Void;
    if needs_value && returns.iter().any(|&ret| ReturnNode::result(callee, ret).is_none()) {
        return Err(inlining_error(format!(
            "{} returns no value for {} invoke {}",
            callee.name(),
            result_kind,
            invoke
        )));
    }
    let usage_edges = graph.usage_edges(invoke);
    if !needs_value {
        if let Some((user, _)) = usage_edges
            .iter()
            .find(|&&(user, slot)| !graph.op(user).is_control_slot(slot))
        {
            return Err(inlining_error(format!(
                "{} uses the value of void invoke {}",
                user, invoke
            )));
        }
    }
    let order = schedule(callee)?;

    let mut map: HashMap<NodeId, NodeId> = HashMap::new();
    map.insert(callee.start(), predecessor);
    let mut copied = 0;
    for node in order {
        if node == callee.start() || callee.is_a::<ReturnNode>(node) {
            continue;
        }
        if let Some(param) = callee.op_as::<ParameterNode>(node) {
            map.insert(node, args[param.index()]);
            continue;
        }
        let inputs = callee
            .inputs(node)
            .iter()
            .map(|&input| mapped(&map, input))
            .collect::<CompileResult<Vec<_>>>()?;
        let copy = graph.unique(callee.op(node).clone(), &inputs, callee.stamp(node));
        map.insert(node, copy);
        copied += 1;
    }

    let mut exits = Vec::with_capacity(returns.len());
    for &ret in &returns {
        let control = mapped(&map, callee.input(ret, 0))?;
        let value = match ReturnNode::result(callee, ret) {
            Some(value) => Some(mapped(&map, value)?),
            None => None,
        };
        exits.push((control, value));
    }

    let (exit, result) = match exits.as_slice() {
        [(control, value)] => (*control, (*value).filter(|_| needs_value)),
        _ => {
            let ends: Vec<NodeId> = exits.iter().map(|(control, _)| *control).collect();
            let merge = graph.add_merge(&ends);
            let result = if needs_value {
                let values: Vec<NodeId> = exits.iter().filter_map(|(_, value)| *value).collect();
                Some(graph.add_phi(merge, &values))
            } else {
                None
            };
            (merge, result)
        }
    };

    for (user, slot) in usage_edges {
        match result {
            Some(value) if !graph.op(user).is_control_slot(slot) => graph.set_input(user, slot, value),
            _ => graph.set_input(user, slot, exit),
        }
    }
    graph.delete(invoke);
    graph.kill_if_dead(call_target);

    debug!(
        "inlined {} into {} at {}: {} nodes, {} exits",
        callee.name(),
        graph.name(),
        invoke,
        copied,
        returns.len()
    );
    Ok(InlineResult { result, exit, copied })
}

// Integration tests for canonicalization and value numbering. They build small graphs
// through the public Graph API, run the canonicalizer and stamp inference phases and
// check the observable result: what the method exit returns, which nodes survive, and
// which stamps the surviving nodes carry. Covered here are the or-node laws (constant
// folding at the stamp width, identity, absorbing and self operands, constant placement
// and re-association), value-numbered construction that ignores operand order, fixpoint idempotence, phi stamps as
// the meet of their inputs, and the rule that stamps never widen once narrowed.

//! Canonicalizer and stamp tests.

mod common;

use common::{apply_phase, init_logger, or_chain_graph};
use graft::ir::{ConstantNode, Graph, IntegerStamp, NodeId, OrNode, ReturnNode, ValuePhiNode};
use graft::meta::{Kind, Universe};
use graft::phases::{CanonicalizerPhase, InferStampsPhase};
use graft::{CompilerOptions, Stamp};
use std::sync::Arc;

fn canonicalize(graph: &mut Graph) -> bool {
    apply_phase(&CanonicalizerPhase::new(), graph, &CompilerOptions::default()).0
}

fn returned(graph: &Graph) -> NodeId {
    let ret = graph.returns()[0];
    ReturnNode::result(graph, ret).expect("exit returns a value")
}

fn constant_value(graph: &Graph, node: NodeId) -> Option<u64> {
    graph.op_as::<ConstantNode>(node).map(ConstantNode::value)
}

/// `f(x, y) { return op(x, y); }` where the operands come from `build`.
fn single_or(bits: u32, build: impl FnOnce(&mut Graph, NodeId) -> (NodeId, NodeId)) -> Graph {
    let kind = if bits > 32 { Kind::Long } else { Kind::Int };
    let mut graph = Graph::new("Test.single", &[kind]);
    let x = graph.parameter(0);
    let (a, b) = build(&mut graph, x);
    let or = graph.or(a, b);
    graph.add_return(graph.start(), Some(or));
    graph
}

#[test]
fn test_or_chain_reassociates_constants() {
    init_logger();
    let mut graph = or_chain_graph(0x0f, 0xf0);
    assert!(canonicalize(&mut graph));

    let result = returned(&graph);
    assert!(graph.is_a::<OrNode>(result));
    assert_eq!(graph.input(result, 0), graph.parameter(0));
    assert_eq!(constant_value(&graph, graph.input(result, 1)), Some(0xff));
    assert_eq!(graph.nodes_of::<OrNode>().len(), 1);
    graph.verify().unwrap();
}

#[test]
fn test_constant_operands_fold_at_width() {
    init_logger();
    let cases: [(u32, u64, u64); 4] = [
        (32, 0x0f, 0xf0),
        (32, 0x8000_0000, 0x1),
        (16, 0xf0f0, 0x0f0f),
        (64, 0x8000_0000_0000_0000, 0x7fff_ffff_0000_0000),
    ];
    for (bits, a, b) in cases {
        let mut graph = single_or(bits, |graph, _| {
            (graph.int_constant(bits, a), graph.int_constant(bits, b))
        });
        assert!(canonicalize(&mut graph));

        let mask = if bits == 64 { u64::MAX } else { (1u64 << bits) - 1 };
        let result = returned(&graph);
        assert_eq!(constant_value(&graph, result), Some((a | b) & mask), "{bits}-bit {a:#x} | {b:#x}");
        assert_eq!(
            graph.stamp(result).as_integer().and_then(|s| s.as_constant()),
            Some((a | b) & mask)
        );
        assert!(graph.nodes_of::<OrNode>().is_empty());
    }
}

#[test]
fn test_or_with_zero_is_identity() {
    init_logger();
    let mut graph = single_or(32, |graph, x| (x, graph.int_constant(32, 0)));
    assert!(canonicalize(&mut graph));
    assert_eq!(returned(&graph), graph.parameter(0));
    assert!(graph.nodes_of::<OrNode>().is_empty());
}

#[test]
fn test_or_with_all_ones_absorbs() {
    init_logger();
    let mut graph = single_or(32, |graph, x| (x, graph.int_constant(32, 0xffff_ffff)));
    assert!(canonicalize(&mut graph));
    assert_eq!(constant_value(&graph, returned(&graph)), Some(0xffff_ffff));

    let mut graph = single_or(64, |graph, x| (x, graph.int_constant(64, u64::MAX)));
    assert!(canonicalize(&mut graph));
    assert_eq!(constant_value(&graph, returned(&graph)), Some(u64::MAX));
}

#[test]
fn test_or_with_itself_is_the_operand() {
    init_logger();
    let mut graph = single_or(32, |_, x| (x, x));
    assert!(canonicalize(&mut graph));
    assert_eq!(returned(&graph), graph.parameter(0));
}

#[test]
fn test_lone_constant_moves_to_second_operand() {
    init_logger();
    let mut graph = single_or(32, |graph, x| (graph.int_constant(32, 0x10), x));
    assert!(canonicalize(&mut graph));

    let result = returned(&graph);
    assert!(graph.is_a::<OrNode>(result));
    assert_eq!(graph.input(result, 0), graph.parameter(0));
    assert_eq!(constant_value(&graph, graph.input(result, 1)), Some(0x10));
}

#[test]
fn test_mirrored_chain_reassociates_constants() {
    init_logger();
    let mut graph = Graph::new("Test.mirrored", &[Kind::Int]);
    let x = graph.parameter(0);
    let c1 = graph.int_constant(32, 0x0f);
    let c2 = graph.int_constant(32, 0xf0);
    let inner = graph.or(c1, x);
    let outer = graph.or(c2, inner);
    graph.add_return(graph.start(), Some(outer));
    assert!(canonicalize(&mut graph));

    let result = returned(&graph);
    assert!(graph.is_a::<OrNode>(result));
    assert_eq!(graph.input(result, 0), x);
    assert_eq!(constant_value(&graph, graph.input(result, 1)), Some(0xff));
    assert_eq!(graph.nodes_of::<OrNode>().len(), 1);
    graph.verify().unwrap();
}

#[test]
fn test_non_constant_operands_are_left_alone() {
    init_logger();
    let mut graph = Graph::new("Test.plain", &[Kind::Int, Kind::Int]);
    let x = graph.parameter(0);
    let y = graph.parameter(1);
    let or = graph.or(x, y);
    graph.add_return(graph.start(), Some(or));

    let before = graph.to_string();
    assert!(!canonicalize(&mut graph));
    assert_eq!(graph.to_string(), before);
}

#[test]
fn test_unique_returns_existing_node() {
    let mut graph = Graph::new("Test.gvn", &[Kind::Int, Kind::Int]);
    let x = graph.parameter(0);
    let y = graph.parameter(1);
    let first = graph.or(x, y);
    let count = graph.node_count();
    let second = graph.or(x, y);
    assert_eq!(first, second);
    assert_eq!(graph.node_count(), count);

    let c1 = graph.int_constant(32, 7);
    let c2 = graph.int_constant(32, 7);
    assert_eq!(c1, c2);
    // Width is part of a constant's identity.
    assert_ne!(graph.int_constant(64, 7), c1);
}

#[test]
fn test_swapped_operands_share_one_node() {
    init_logger();
    let mut graph = Graph::new("Test.swapped", &[Kind::Int, Kind::Int]);
    let x = graph.parameter(0);
    let y = graph.parameter(1);
    assert_eq!(graph.or(x, y), graph.or(y, x));

    // Built without value numbering, the two orders still collapse.
    let left = graph.add(Arc::new(OrNode), &[x, y], Stamp::int(32));
    let right = graph.add(Arc::new(OrNode), &[y, x], Stamp::int(32));
    let sum = graph.int_add(left, right);
    graph.add_return(graph.start(), Some(sum));
    assert!(canonicalize(&mut graph));

    assert_eq!(graph.nodes_of::<OrNode>().len(), 1);
    let sum = returned(&graph);
    assert_eq!(graph.input(sum, 0), graph.input(sum, 1));
    graph.verify().unwrap();
}

#[test]
fn test_canonicalization_is_idempotent() {
    init_logger();
    let mut graph = Graph::new("Test.idem", &[Kind::Int, Kind::Int]);
    let x = graph.parameter(0);
    let y = graph.parameter(1);
    let zero = graph.int_constant(32, 0);
    let three = graph.int_constant(32, 3);
    let four = graph.int_constant(32, 4);
    let a = graph.or(zero, x);
    let b = graph.or(three, four);
    let c = graph.or(a, b);
    let d = graph.or(c, y);
    graph.add_return(graph.start(), Some(d));

    assert!(canonicalize(&mut graph));
    let first = graph.to_string();
    let count = graph.node_count();

    assert!(!canonicalize(&mut graph));
    assert_eq!(graph.to_string(), first);
    assert_eq!(graph.node_count(), count);
}

/// Two calls joined at a merge with a phi over `values`.
fn phi_graph(values: impl FnOnce(&mut Graph) -> (NodeId, NodeId)) -> (Graph, NodeId) {
    let mut universe = Universe::with_java_core();
    let holder = universe.add_class("LTest;", None);
    let left_target = universe.add_method(holder, "left", "()V");
    let right_target = universe.add_method(holder, "right", "()V");

    let mut graph = Graph::new("Test.phi", &[Kind::Int]);
    let left = graph.add_invoke(graph.start(), left_target, &[], Kind::Void);
    let right = graph.add_invoke(graph.start(), right_target, &[], Kind::Void);
    let merge = graph.add_merge(&[left, right]);
    let (a, b) = values(&mut graph);
    let phi = graph.add_phi(merge, &[a, b]);
    graph.add_return(merge, Some(phi));
    (graph, phi)
}

#[test]
fn test_phi_stamp_is_meet_of_inputs() {
    let (graph, phi) = phi_graph(|graph| (graph.int_constant(32, 0x0f), graph.int_constant(32, 0x3c)));
    let stamp = *graph.stamp(phi).as_integer().unwrap();
    assert_eq!(stamp.down_mask(), 0x0f & 0x3c);
    assert_eq!(stamp.up_mask(), 0x0f | 0x3c);
    assert_eq!(
        graph.stamp(phi),
        graph.stamp(ValuePhiNode::values(&graph, phi)[0]).meet(&graph.stamp(ValuePhiNode::values(&graph, phi)[1]))
    );
    graph.verify().unwrap();
}

#[test]
fn test_phi_of_equal_values_canonicalizes_to_value() {
    init_logger();
    let (mut graph, _) = phi_graph(|graph| {
        let x = graph.parameter(0);
        (x, x)
    });
    assert!(canonicalize(&mut graph));
    assert_eq!(returned(&graph), graph.parameter(0));
    assert!(graph.nodes_of::<ValuePhiNode>().is_empty());
}

#[test]
fn test_stamps_never_widen_after_narrowing() {
    init_logger();
    let (mut graph, phi) = phi_graph(|graph| {
        let x = graph.parameter_with_stamp(0, Stamp::Integer(IntegerStamp::with_masks(32, 0, 0xff)));
        (x, graph.int_constant(32, 0x0f))
    });
    let narrowed = graph.stamp(phi);
    assert_eq!(narrowed.as_integer().unwrap().up_mask(), 0xff);

    // Neither an unrestricted stamp nor re-inference may widen it.
    assert!(!graph.improve_stamp(phi, Stamp::int(32)));
    let (changed, _) = apply_phase(&InferStampsPhase::new(), &mut graph, &CompilerOptions::default());
    assert!(!changed);
    assert_eq!(graph.stamp(phi), narrowed);

    // Narrowing still works.
    assert!(graph.improve_stamp(phi, Stamp::Integer(IntegerStamp::with_masks(32, 0x01, 0x7f))));
    assert_eq!(graph.stamp(phi).as_integer().unwrap().up_mask(), 0x7f);
    assert_eq!(graph.stamp(phi).as_integer().unwrap().down_mask(), 0x01);
}

#[test]
fn test_stamp_inference_feeds_folding() {
    init_logger();
    // x | 0xffffff00 with every bit of the low byte of x known to be set
    // folds to the all-ones constant through stamps alone.
    let mut graph = Graph::new("Test.stamps", &[Kind::Int]);
    let x = graph.parameter_with_stamp(0, Stamp::Integer(IntegerStamp::with_masks(32, 0xff, 0xffff_ffff)));
    let high = graph.int_constant(32, 0xffff_ff00);
    let or = graph.or(x, high);
    graph.add_return(graph.start(), Some(or));

    assert!(canonicalize(&mut graph));
    assert_eq!(constant_value(&graph, returned(&graph)), Some(0xffff_ffff));
}

// Integration tests for lowering and emission. Graphs are lowered through the compiler's
// x86-64 generator and rendered with both frame contexts. The tests check lowering order
// (inputs before users, merges after their predecessors, exits last), the error raised
// for a node that offers no lowering capability, that every method exit tears the frame
// down through the frame context right before `ret`, and that the frame layout follows
// from the LIR: spill slots for values live across calls, preserved callee-saved
// registers and the outgoing argument area of calls with stack arguments.

//! Lowering and epilogue emission tests.

mod common;

use bumpalo::Bump;
use common::{init_logger, or_chain_graph};
use graft::ir::{Graph, NodeId, NodeOp};
use graft::lir::schedule;
use graft::meta::{Kind, MethodId, Universe};
use graft::lir::Value;
use graft::snippets::SnippetLibrary;
use graft::x64::registers::{RAX, RBX};
use graft::x64::{X64MoveOp, X64ReturnOp};
use graft::{CompilationSession, CompileError, Compiler, CompilerOptions, FrameStyle, Lir, Stamp};
use std::any::Any;
use std::sync::Arc;

fn compiler(options: CompilerOptions) -> Compiler {
    let mut universe = Universe::with_java_core();
    let snippets = SnippetLibrary::install_array_copy(&mut universe);
    Compiler::new(options, Arc::new(universe), &snippets)
}

fn callees() -> (MethodId, MethodId) {
    let mut universe = Universe::with_java_core();
    let holder = universe.add_class("LTest;", None);
    (
        universe.add_method(holder, "left", "()V"),
        universe.add_method(holder, "right", "()V"),
    )
}

/// Two calls off the entry, joined at a merge that selects a parameter.
fn diamond() -> (Graph, [NodeId; 5]) {
    let (left_target, right_target) = callees();
    let mut graph = Graph::new("Test.diamond", &[Kind::Int, Kind::Int]);
    let x = graph.parameter(0);
    let y = graph.parameter(1);
    let left = graph.add_invoke(graph.start(), left_target, &[], Kind::Void);
    let right = graph.add_invoke(graph.start(), right_target, &[], Kind::Void);
    let merge = graph.add_merge(&[left, right]);
    let phi = graph.add_phi(merge, &[x, y]);
    let ret = graph.add_return(merge, Some(phi));
    (graph, [left, right, merge, phi, ret])
}

fn body(lines: &[String]) -> Vec<&str> {
    lines.iter().map(|line| line.trim()).collect()
}

#[test]
fn test_diamond_schedule_respects_dependencies() {
    let (graph, [left, right, merge, phi, ret]) = diamond();
    let order = schedule(&graph).unwrap();
    assert_eq!(order.len(), graph.node_count());

    let pos = |node: NodeId| order.iter().position(|&n| n == node).unwrap();
    assert_eq!(pos(graph.start()), 0);
    assert!(pos(left) < pos(merge));
    assert!(pos(right) < pos(merge));
    assert!(pos(merge) < pos(phi));
    assert_eq!(*order.last().unwrap(), ret);
    for id in graph.live_nodes() {
        for &input in graph.inputs(id) {
            assert!(pos(input) < pos(id), "{input} must precede {id}");
        }
    }
}

#[test]
fn test_diamond_lowers_calls_before_merge() {
    init_logger();
    let (graph, _) = diamond();
    let arena = Bump::new();
    let session = CompilationSession::new(&arena);
    let lir = compiler(CompilerOptions::default()).lower(&graph, &session).unwrap();

    let names = lir.names();
    let calls: Vec<usize> = names
        .iter()
        .enumerate()
        .filter(|(_, name)| **name == "call")
        .map(|(index, _)| index)
        .collect();
    let label = names.iter().position(|&name| name == "label").unwrap();
    let phi = names.iter().position(|&name| name == "phi").unwrap();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|&call| call < label));
    assert!(label < phi);
    assert_eq!(names.last(), Some(&"return"));
    assert_eq!(lir.epilogue_count(), 1);
}

#[derive(Debug)]
struct OpaqueNode;

impl NodeOp for OpaqueNode {
    fn name(&self) -> &'static str {
        "Opaque"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn is_value_node(&self) -> bool {
        true
    }
}

#[test]
fn test_node_without_lowering_aborts_unit() {
    init_logger();
    let mut graph = Graph::new("Test.opaque", &[Kind::Int]);
    let x = graph.parameter(0);
    let opaque = graph.add(Arc::new(OpaqueNode), &[x], Stamp::int(32));
    graph.add_return(graph.start(), Some(opaque));

    let arena = Bump::new();
    let session = CompilationSession::new(&arena);
    let err = compiler(CompilerOptions::default())
        .compile(&mut graph, &session, FrameStyle::SysV)
        .unwrap_err();
    assert_eq!(
        err,
        CompileError::NoLoweringCapability {
            node: opaque,
            op: "Opaque"
        }
    );
    assert!(err.to_string().contains("Opaque"));
}

#[test]
fn test_sysv_epilogue_precedes_ret() {
    init_logger();
    let mut graph = or_chain_graph(0x0f, 0xf0);
    let arena = Bump::new();
    let session = CompilationSession::new(&arena);
    let unit = compiler(CompilerOptions::default())
        .compile(&mut graph, &session, FrameStyle::SysV)
        .unwrap();

    let lines = body(&unit.code.lines);
    assert_eq!(&lines[..2], ["push rbp", "mov rbp, rsp"]);
    assert!(lines.contains(&"or v1, 0xff"));
    assert_eq!(&lines[lines.len() - 3..], ["mov eax, v1", "pop rbp", "ret"]);
    assert_eq!(unit.code.epilogues, 1);
    assert_eq!(session.stats().epilogues_emitted, 1);
}

#[test]
fn test_leaf_frame_has_no_frame_pointer() {
    init_logger();
    let mut graph = or_chain_graph(0x0f, 0xf0);
    let arena = Bump::new();
    let session = CompilationSession::new(&arena);
    let unit = compiler(CompilerOptions::default())
        .compile(&mut graph, &session, FrameStyle::Leaf)
        .unwrap();

    let lines = body(&unit.code.lines);
    assert!(!lines.iter().any(|line| line.contains("rbp")));
    assert_eq!(&lines[lines.len() - 2..], ["mov eax, v1", "ret"]);
    assert_eq!(unit.code.epilogues, 1);
}

#[test]
fn test_every_exit_leaves_the_frame() {
    init_logger();
    let (left_target, right_target) = callees();
    let mut graph = Graph::new("Test.exits", &[Kind::Int]);
    let x = graph.parameter(0);
    let left = graph.add_invoke(graph.start(), left_target, &[], Kind::Void);
    let right = graph.add_invoke(graph.start(), right_target, &[], Kind::Void);
    graph.add_return(left, Some(x));
    graph.add_return(right, None);

    let arena = Bump::new();
    let session = CompilationSession::new(&arena);
    let compiler = compiler(CompilerOptions::default());
    let lir = compiler.lower(&graph, &session).unwrap();
    assert_eq!(lir.epilogue_count(), 2);

    for style in [FrameStyle::SysV, FrameStyle::Leaf] {
        let code = compiler.emit(&lir, style, &session).unwrap();
        let lines = body(&code.lines);
        assert_eq!(code.epilogues, 2);
        let rets: Vec<usize> = lines
            .iter()
            .enumerate()
            .filter(|(_, line)| **line == "ret")
            .map(|(index, _)| index)
            .collect();
        assert_eq!(rets.len(), 2);
        assert_eq!(rets[1], lines.len() - 1);
        if style == FrameStyle::SysV {
            for ret in rets {
                assert_eq!(lines[ret - 1], "pop rbp");
            }
        }
        assert!(lines.contains(&"exit_1:"));
    }
    assert_eq!(session.stats().epilogues_emitted, 4);
}

#[test]
fn test_incoming_parameters_use_argument_registers() {
    init_logger();
    let mut graph = Graph::new("Test.params", &[Kind::Int, Kind::Long]);
    let x = graph.parameter(0);
    graph.parameter(1);
    let or = graph.or(x, x);
    graph.add_return(graph.start(), Some(or));

    let arena = Bump::new();
    let session = CompilationSession::new(&arena);
    let lir = compiler(CompilerOptions::unoptimized())
        .lower(&graph, &session)
        .unwrap();
    let text = lir.to_string();
    assert!(text.contains("edi"), "{text}");
    assert!(text.contains("rsi"), "{text}");
}

#[test]
fn test_values_live_across_calls_get_spill_slots() {
    init_logger();
    let (graph, _) = diamond();
    let arena = Bump::new();
    let session = CompilationSession::new(&arena);
    let compiler = compiler(CompilerOptions::default());
    let lir = compiler.lower(&graph, &session).unwrap();

    // Both parameters are read by the phi after the two calls.
    let code = compiler.emit(&lir, FrameStyle::SysV, &session).unwrap();
    let lines = body(&code.lines);
    assert_eq!(&lines[..3], ["push rbp", "mov rbp, rsp", "sub rsp, 16"]);
    assert_eq!(&lines[lines.len() - 3..], ["add rsp, 16", "pop rbp", "ret"]);

    let code = compiler.emit(&lir, FrameStyle::Leaf, &session).unwrap();
    let lines = body(&code.lines);
    assert_eq!(lines[0], "sub rsp, 16");
    assert_eq!(&lines[lines.len() - 2..], ["add rsp, 16", "ret"]);
}

#[test]
fn test_callee_saved_registers_are_restored_at_exit() {
    init_logger();
    let long = |reg| Value::Register { reg, kind: Kind::Long };
    let mut lir = Lir::new();
    lir.push(Box::new(X64MoveOp {
        dst: long(RBX),
        src: Value::Variable { index: 0, kind: Kind::Long },
    }));
    lir.push(Box::new(X64MoveOp { dst: long(RAX), src: long(RBX) }));
    lir.push(Box::new(X64ReturnOp { value: Some(long(RAX)) }));

    let arena = Bump::new();
    let session = CompilationSession::new(&arena);
    let compiler = compiler(CompilerOptions::default());

    let code = compiler.emit(&lir, FrameStyle::SysV, &session).unwrap();
    assert_eq!(
        body(&code.lines),
        [
            "push rbp",
            "mov rbp, rsp",
            "push rbx",
            "sub rsp, 8",
            "mov rbx, v0",
            "mov rax, rbx",
            "add rsp, 8",
            "pop rbx",
            "pop rbp",
            "ret",
        ]
    );

    let code = compiler.emit(&lir, FrameStyle::Leaf, &session).unwrap();
    let lines = body(&code.lines);
    assert_eq!(lines[0], "push rbx");
    assert_eq!(&lines[lines.len() - 3..], ["add rsp, 8", "pop rbx", "ret"]);
}

#[test]
fn test_stack_arguments_use_the_outgoing_area() {
    init_logger();
    let mut universe = Universe::with_java_core();
    let holder = universe.add_class("LTest;", None);
    let wide = universe.add_method(holder, "wide", "(IIIIIIII)V");

    let mut graph = Graph::new("Test.wide", &[Kind::Int; 8]);
    let args: Vec<NodeId> = (0..8).map(|index| graph.parameter(index)).collect();
    let call = graph.add_invoke(graph.start(), wide, &args, Kind::Void);
    graph.add_return(call, None);

    let arena = Bump::new();
    let session = CompilationSession::new(&arena);
    let unit = compiler(CompilerOptions::unoptimized())
        .compile(&mut graph, &session, FrameStyle::Leaf)
        .unwrap();
    let lines = body(&unit.code.lines);
    let call = lines.iter().position(|line| line.starts_with("call ")).unwrap();
    assert_eq!(&lines[call - 2..call], ["push v7", "push v6"]);
    assert_eq!(lines[call + 1], "add rsp, 16");
    assert_eq!(&lines[lines.len() - 1..], ["ret"]);
}

#[test]
fn test_sub_word_values_keep_their_width() {
    init_logger();
    let mut graph = Graph::new("Test.short", &[]);
    let a = graph.int_constant(16, 0xf0f0);
    let b = graph.int_constant(16, 0x0f0f);
    let or = graph.or(a, b);
    graph.add_return(graph.start(), Some(or));

    let arena = Bump::new();
    let session = CompilationSession::new(&arena);
    let lir = compiler(CompilerOptions::unoptimized())
        .lower(&graph, &session)
        .unwrap();
    let kinds: Vec<Kind> = lir
        .ops()
        .iter()
        .flat_map(|op| op.defs())
        .map(|value| value.kind())
        .collect();
    assert!(!kinds.is_empty());
    assert!(kinds.iter().all(|&kind| kind == Kind::Short), "{kinds:?}");

    let code = compiler(CompilerOptions::unoptimized())
        .emit(&lir, FrameStyle::Leaf, &session)
        .unwrap();
    assert_eq!(
        body(&code.lines),
        ["mov v0, 0xf0f0", "or v0, 0xf0f", "mov eax, v0", "ret"]
    );
}

// Shared fixtures for the integration suites: logger setup, a universe with the array copy
// snippets installed, and builders for the graph shapes the suites exercise (array copy
// call sites and or-chains).

#![allow(dead_code)]

use bumpalo::Bump;
use graft::ir::Graph;
use graft::meta::{Kind, MethodDescriptor, MethodId, ResolutionOracle, TypeId, Universe};
use graft::phases::intrinsify::{ARRAY_COPY_SIGNATURE, SYSTEM_CLASS};
use graft::phases::{Phase, PhaseContext};
use graft::snippets::SnippetLibrary;
use graft::{CompilationSession, CompilerOptions, SessionStats, Stamp};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Universe with `java.lang` basics plus the array copy snippets.
pub fn universe_with_snippets() -> (Universe, SnippetLibrary) {
    let mut universe = Universe::with_java_core();
    let snippets = SnippetLibrary::install_array_copy(&mut universe);
    (universe, snippets)
}

pub fn system_arraycopy(universe: &Universe) -> MethodId {
    let descriptor = MethodDescriptor::new(SYSTEM_CLASS, "arraycopy", ARRAY_COPY_SIGNATURE);
    universe
        .resolve_method(&descriptor, None)
        .expect("System.arraycopy is part of the core universe")
}

pub fn array_type(universe: &Universe, name: &str) -> TypeId {
    universe
        .lookup(name)
        .unwrap_or_else(|| panic!("{} is not registered", name))
}

/// `copy(src, srcPos, dest, destPos, length) { System.arraycopy(...); }`
/// with the array parameters narrowed to the given types.
pub fn array_copy_call_graph(universe: &Universe, src: Option<TypeId>, dest: Option<TypeId>) -> Graph {
    let target = system_arraycopy(universe);
    let mut graph = Graph::new(
        "Test.copy",
        &[Kind::Object, Kind::Int, Kind::Object, Kind::Int, Kind::Int],
    );
    let src = graph.parameter_with_stamp(0, Stamp::object(src, false, true));
    let src_pos = graph.parameter(1);
    let dest = graph.parameter_with_stamp(2, Stamp::object(dest, false, true));
    let dest_pos = graph.parameter(3);
    let length = graph.parameter(4);
    let invoke = graph.add_invoke(
        graph.start(),
        target,
        &[src, src_pos, dest, dest_pos, length],
        Kind::Void,
    );
    graph.add_return(invoke, None);
    graph
}

/// `mask(x) { return (x | c1) | c2; }` at 32 bits.
pub fn or_chain_graph(c1: u64, c2: u64) -> Graph {
    let mut graph = Graph::new("Test.mask", &[Kind::Int]);
    let x = graph.parameter(0);
    let c1 = graph.int_constant(32, c1);
    let c2 = graph.int_constant(32, c2);
    let inner = graph.or(x, c1);
    let outer = graph.or(inner, c2);
    graph.add_return(graph.start(), Some(outer));
    graph
}

/// Apply one phase in a fresh session and return its statistics.
pub fn apply_phase(phase: &dyn Phase, graph: &mut Graph, options: &CompilerOptions) -> (bool, SessionStats) {
    let arena = Bump::new();
    let session = CompilationSession::new(&arena);
    let context = PhaseContext::new(options, &session);
    let changed = phase.apply(graph, &context).expect("phase failed");
    (changed, session.stats())
}

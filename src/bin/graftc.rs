//! graftc - run the graft pipeline over a demonstration unit.
//!
//! Builds either a `System.arraycopy` call between arrays of the chosen
//! element kinds or a chain of foldable `or` operations, compiles it and
//! prints the graph, the LIR and the emitted assembly.

use bumpalo::Bump;
use clap::{Parser, ValueEnum};
use graft::ir::Graph;
use graft::meta::{Kind, ResolutionOracle, Universe};
use graft::phases::intrinsify::{ARRAY_COPY_SIGNATURE, SYSTEM_CLASS};
use graft::snippets::SnippetLibrary;
use graft::{CompilationSession, Compiler, CompilerOptions, FrameStyle, Stamp};
use log::debug;
use std::process;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Demo {
    /// `System.arraycopy(src, 0, dst, 0, n)`
    Arraycopy,
    /// `((x | 0x0f) | 0xf0) | (3 | 4)`
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Frame {
    Sysv,
    Leaf,
}

#[derive(Debug, Parser)]
#[command(name = "graftc", version, about = "Compile a demonstration unit with graft")]
struct Args {
    /// Unit to build
    #[arg(long, value_enum, default_value = "arraycopy")]
    demo: Demo,

    /// Element kind of the source array
    #[arg(long, default_value = "int", value_parser = parse_kind)]
    src_kind: Kind,

    /// Element kind of the destination array
    #[arg(long, default_value = "int", value_parser = parse_kind)]
    dst_kind: Kind,

    /// Frame layout used for prologue and epilogues
    #[arg(long, value_enum, default_value = "sysv")]
    frame: Frame,

    /// Skip canonicalization
    #[arg(long)]
    no_canonicalizer: bool,

    /// Keep System.arraycopy calls as calls
    #[arg(long)]
    no_intrinsify: bool,

    /// Print session statistics
    #[arg(long)]
    stats: bool,
}

fn parse_kind(name: &str) -> Result<Kind, String> {
    match Kind::from_name(name) {
        Some(kind) if kind != Kind::Void => Ok(kind),
        _ => Err(format!("unknown element kind '{}'", name)),
    }
}

fn array_copy_graph(universe: &Universe, src_kind: Kind, dst_kind: Kind) -> Result<Graph, String> {
    let descriptor = graft::meta::MethodDescriptor::new(SYSTEM_CLASS, "arraycopy", ARRAY_COPY_SIGNATURE);
    let target = universe
        .resolve_method(&descriptor, None)
        .ok_or_else(|| format!("cannot resolve {}", descriptor))?;
    let array = |kind: Kind| {
        universe
            .array_for_kind(kind)
            .ok_or_else(|| format!("no array type for {}", kind))
    };
    let src_array = array(src_kind)?;
    let dst_array = array(dst_kind)?;

    let mut graph = Graph::new(
        "Demo.copy",
        &[Kind::Object, Kind::Int, Kind::Object, Kind::Int, Kind::Int],
    );
    let src = graph.parameter_with_stamp(0, Stamp::object(Some(src_array), false, true));
    let src_pos = graph.parameter(1);
    let dst = graph.parameter_with_stamp(2, Stamp::object(Some(dst_array), false, true));
    let dst_pos = graph.parameter(3);
    let length = graph.parameter(4);
    let invoke = graph.add_invoke(
        graph.start(),
        target,
        &[src, src_pos, dst, dst_pos, length],
        Kind::Void,
    );
    graph.add_return(invoke, None);
    Ok(graph)
}

fn or_graph() -> Graph {
    let mut graph = Graph::new("Demo.mask", &[Kind::Int]);
    let x = graph.parameter(0);
    let low = graph.int_constant(32, 0x0f);
    let high = graph.int_constant(32, 0xf0);
    let three = graph.int_constant(32, 3);
    let four = graph.int_constant(32, 4);
    let inner = graph.or(x, low);
    let outer = graph.or(inner, high);
    let folded = graph.or(three, four);
    let result = graph.or(outer, folded);
    graph.add_return(graph.start(), Some(result));
    graph
}

fn run(args: &Args) -> Result<(), String> {
    let options = CompilerOptions::default()
        .with_canonicalizer(!args.no_canonicalizer)
        .with_array_copy_intrinsics(!args.no_intrinsify);

    let mut universe = Universe::with_java_core();
    let snippets = SnippetLibrary::install_array_copy(&mut universe);
    debug!("universe holds {} types", universe.type_count());

    let mut graph = match args.demo {
        Demo::Arraycopy => array_copy_graph(&universe, args.src_kind, args.dst_kind)?,
        Demo::Or => or_graph(),
    };
    let compiler = Compiler::new(options, Arc::new(universe), &snippets);

    println!("; input {}", graph);
    let arena = Bump::new();
    let session = CompilationSession::new(&arena);
    let style = match args.frame {
        Frame::Sysv => FrameStyle::SysV,
        Frame::Leaf => FrameStyle::Leaf,
    };
    let unit = compiler
        .compile(&mut graph, &session, style)
        .map_err(|err| err.to_string())?;

    println!("; optimized {}", graph);
    println!("; lir");
    print!("{}", unit.lir);
    println!("; assembly ({} frame)", style);
    print!("{}", unit.code.assembly());

    if args.stats {
        println!();
        print!("{}", session.stats());
    }
    Ok(())
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(err) = run(&args) {
        eprintln!("graftc: {}", err);
        process::exit(1);
    }
}

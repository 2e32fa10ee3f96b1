//! graft - an optimizing JIT middle/back-end.
//!
//! graft takes the graph of a single compilation unit, rewrites it through an
//! ordered phase suite and lowers it to a symbolic x86-64 instruction list
//! whose method exits tear down the frame through a pluggable frame context.
//!
//! # Primary Usage
//!
//! ```ignore
//! use graft::{Compiler, CompilerOptions, CompilationSession, FrameStyle};
//! use graft::meta::{Kind, Universe};
//! use graft::snippets::SnippetLibrary;
//! use bumpalo::Bump;
//! use std::sync::Arc;
//!
//! let mut universe = Universe::with_java_core();
//! let snippets = SnippetLibrary::install_array_copy(&mut universe);
//! let compiler = Compiler::new(CompilerOptions::default(), Arc::new(universe), &snippets);
//!
//! let arena = Bump::new();
//! let session = CompilationSession::new(&arena);
//! let mut graph = build_graph();
//! let unit = compiler.compile(&mut graph, &session, FrameStyle::SysV)?;
//! println!("{}", unit.code.assembly());
//! ```
//!
//! # Architecture
//!
//! - [`core`] - Shared infrastructure (errors, options, session)
//! - [`meta`] - Resolution oracle boundary and an in-memory universe
//! - [`ir`] - Stamps, nodes, the graph and its capability interfaces
//! - [`phases`] - Phase pipeline, canonicalizer, intrinsification
//! - [`snippets`] - Prebuilt snippet graphs
//! - [`lir`] - Low-level IR, scheduling, lowering and emission
//! - [`x64`] - x86-64 specific code (calling convention, frames, LIR ops)

pub mod compiler;
pub mod core;
pub mod ir;
pub mod lir;
pub mod meta;
pub mod phases;
pub mod snippets;
pub mod x64;

pub use compiler::{CompiledUnit, Compiler};
pub use core::{CompilationSession, CompileError, CompileResult, CompilerOptions, SessionStats};
pub use ir::{Graph, NodeId, Stamp};
pub use lir::Lir;
pub use x64::FrameStyle;

// This module is the hub for graft's shared infrastructure: the job-level error type,
// the compiler options every phase reads, and the arena-backed compilation session that
// collects per-job statistics. Nothing in here knows about specific node kinds or target
// architectures; the graph model, phases and backends all build on top of it.

//! Core graft infrastructure.
//!
//! # Key Components
//!
//! ## Errors (`error`)
//! - `CompileError`, the failure type that abandons a compilation job
//!
//! ## Options (`options`)
//! - `CompilerOptions`, read by phases through the phase context
//!
//! ## Session Management (`session`)
//! - Arena-based allocation using `bumpalo`
//! - Per-job statistics (phases, rewrites, lowered instructions)

pub mod error;
pub mod options;
pub mod session;

pub use error::{CompileError, CompileResult};
pub use options::CompilerOptions;
pub use session::{CompilationSession, PhaseStat, SessionStats};

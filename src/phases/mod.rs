// This module hosts graft's whole-graph transformations. A Phase is a named pass that
// mutates one graph in place and reports whether it changed anything; PhaseSuite runs an
// ordered list of them. Every application goes through Phase::apply, which times the run
// when the options ask for it, records it in the job's session statistics and, when graph
// verification is enabled, re-checks edge consistency before the next phase sees the
// graph. Phases hold no per-job state: one suite is built per compiler and shared by every
// job, so phases must be Send + Sync and take the per-job context by reference.

//! Phase pipeline.
//!
//! # Key Components
//!
//! ## Pipeline (`suite`)
//! - `PhaseSuite`, the ordered list run over each graph
//!
//! ## Phases
//! - `CanonicalizerPhase`: local rewrites, folding and value numbering to a fixpoint
//! - `InferStampsPhase`: narrow-only stamp re-inference
//! - `DeadCodeEliminationPhase`: removal of nodes unreachable from the anchors
//! - `IntrinsifyArrayCopyPhase`: snippet substitution for `System.arraycopy`
//!
//! ## Utilities (`inlining`)
//! - Graph inlining used to splice snippets into call sites

pub mod canonicalizer;
pub mod dead_code;
pub mod infer_stamps;
pub mod inlining;
pub mod intrinsify;
pub mod suite;

pub use canonicalizer::CanonicalizerPhase;
pub use dead_code::DeadCodeEliminationPhase;
pub use infer_stamps::InferStampsPhase;
pub use inlining::{inline, InlineResult};
pub use intrinsify::IntrinsifyArrayCopyPhase;
pub use suite::PhaseSuite;

use crate::core::{CompilationSession, CompileResult, CompilerOptions};
use crate::ir::Graph;
use log::debug;
use std::time::Instant;

/// Per-job context handed to every phase.
pub struct PhaseContext<'a, 'arena> {
    pub options: &'a CompilerOptions,
    pub session: &'a CompilationSession<'arena>,
}

impl<'a, 'arena> PhaseContext<'a, 'arena> {
    pub fn new(options: &'a CompilerOptions, session: &'a CompilationSession<'arena>) -> Self {
        Self { options, session }
    }
}

/// A named transformation over one graph.
pub trait Phase: Send + Sync {
    fn name(&self) -> &'static str;

    /// Transform `graph` in place. Returns whether the graph changed.
    fn run(&self, graph: &mut Graph, context: &PhaseContext<'_, '_>) -> CompileResult<bool>;

    /// Run with timing, statistics and optional verification.
    fn apply(&self, graph: &mut Graph, context: &PhaseContext<'_, '_>) -> CompileResult<bool> {
        let start = context.options.collect_timing.then(Instant::now);
        let changed = self.run(graph, context)?;
        let elapsed = start.map(|start| start.elapsed());

        debug!(
            "{} on {}: {} ({} nodes)",
            self.name(),
            graph.name(),
            if changed { "changed" } else { "unchanged" },
            graph.node_count()
        );
        context.session.record_phase(self.name(), changed, elapsed);

        if context.options.verify_graphs {
            graph.verify()?;
        }
        Ok(changed)
    }
}

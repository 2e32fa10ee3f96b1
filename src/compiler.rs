// This module ties graft together into a compilation job. A Compiler is built once from
// the options, the shared resolution oracle and the snippet provider; it owns the default
// phase suite (stamp inference, canonicalization, array copy intrinsification and dead
// code elimination, with the optional phases gated by the options) and can be shared by
// any number of worker threads. Each job brings its own graph and session: optimize runs
// the suite, lower schedules the graph and drives the x86-64 LIR generator, and emit
// derives the frame layout from the LIR and renders it with the requested frame context. Any CompileError abandons
// that job only.

//! Compilation job driver.

use crate::core::{CompilationSession, CompileResult, CompilerOptions};
use crate::ir::Graph;
use crate::lir::{emit_code, lower_graph, CompilationResult, Lir};
use crate::meta::ResolutionOracle;
use crate::phases::{
    CanonicalizerPhase, DeadCodeEliminationPhase, InferStampsPhase, IntrinsifyArrayCopyPhase, PhaseContext,
    PhaseSuite,
};
use crate::snippets::GraphProvider;
use crate::x64::{FrameStyle, FunctionFrame, LeafFrameContext, SysVFrameContext, X64LirGenerator};
use log::info;
use std::sync::Arc;

/// Output of one compilation job.
#[derive(Debug)]
pub struct CompiledUnit {
    pub lir: Lir,
    pub code: CompilationResult,
}

/// Optimizing compiler shared by compilation jobs.
pub struct Compiler {
    options: CompilerOptions,
    suite: PhaseSuite,
}

impl Compiler {
    /// Compiler with the default phase suite.
    pub fn new(
        options: CompilerOptions,
        oracle: Arc<dyn ResolutionOracle>,
        provider: &dyn GraphProvider,
    ) -> Self {
        let mut suite = PhaseSuite::new();
        suite.append(InferStampsPhase::new());
        if options.opt_canonicalizer {
            suite.append(CanonicalizerPhase::new());
        }
        if options.intrinsify_array_copy {
            suite.append(IntrinsifyArrayCopyPhase::new(oracle, provider));
        }
        suite.append(DeadCodeEliminationPhase::new());
        Self::with_suite(options, suite)
    }

    /// Compiler running a custom phase suite.
    pub fn with_suite(options: CompilerOptions, suite: PhaseSuite) -> Self {
        Self { options, suite }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn suite(&self) -> &PhaseSuite {
        &self.suite
    }

    /// Run the phase suite over `graph`.
    pub fn optimize(&self, graph: &mut Graph, session: &CompilationSession<'_>) -> CompileResult<bool> {
        let context = PhaseContext::new(&self.options, session);
        self.suite.run(graph, &context)
    }

    /// Lower a finished graph to x86-64 LIR.
    pub fn lower(&self, graph: &Graph, session: &CompilationSession<'_>) -> CompileResult<Lir> {
        let mut tool = X64LirGenerator::new(graph.signature());
        let lir = lower_graph(graph, &mut tool)?;
        for name in lir.names() {
            session.record_instruction(name);
        }
        Ok(lir)
    }

    /// Render `lir` with a frame of the given style.
    pub fn emit(
        &self,
        lir: &Lir,
        style: FrameStyle,
        session: &CompilationSession<'_>,
    ) -> CompileResult<CompilationResult> {
        let frame = FunctionFrame::for_lir(session.arena(), lir);
        let code = match style {
            FrameStyle::Leaf => emit_code(lir, &LeafFrameContext::for_frame(&frame))?,
            FrameStyle::SysV => emit_code(lir, &SysVFrameContext::new(frame))?,
        };
        for _ in 0..code.epilogues {
            session.record_epilogue();
        }
        Ok(code)
    }

    /// Optimize, lower and emit one unit.
    pub fn compile(
        &self,
        graph: &mut Graph,
        session: &CompilationSession<'_>,
        style: FrameStyle,
    ) -> CompileResult<CompiledUnit> {
        self.optimize(graph, session)?;
        let lir = self.lower(graph, session)?;
        let code = self.emit(&lir, style, session)?;
        info!(
            "compiled {}: {} nodes, {} instructions, {} frame",
            graph.name(),
            graph.node_count(),
            lir.len(),
            style
        );
        Ok(CompiledUnit { lir, code })
    }
}

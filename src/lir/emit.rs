//! Rendering LIR into symbolic assembly.
//!
//! The result builder collects assembly lines and owns the frame context
//! that epilogue operations delegate frame teardown to.

use super::Lir;
use crate::core::CompileResult;
use log::debug;

/// Emits the frame setup and teardown sequences of one compiled unit.
///
/// Implementations encapsulate the frame layout; LIR operations never look
/// inside it.
pub trait FrameContext {
    fn name(&self) -> &'static str;

    /// Frame setup at method entry.
    fn enter(&self, crb: &mut CompilationResultBuilder<'_>);

    /// Frame teardown before a method exit.
    fn leave(&self, crb: &mut CompilationResultBuilder<'_>);
}

/// Accumulates emitted assembly for one unit.
pub struct CompilationResultBuilder<'a> {
    frame: &'a dyn FrameContext,
    lines: Vec<String>,
    epilogues: usize,
}

impl<'a> CompilationResultBuilder<'a> {
    pub fn new(frame: &'a dyn FrameContext) -> Self {
        Self {
            frame,
            lines: Vec::new(),
            epilogues: 0,
        }
    }

    pub fn frame_context(&self) -> &'a dyn FrameContext {
        self.frame
    }

    /// Emit one instruction line.
    pub fn emit(&mut self, line: &str) {
        self.lines.push(format!("    {}", line));
    }

    pub fn bind_label(&mut self, name: &str) {
        self.lines.push(format!("{}:", name));
    }

    pub fn comment(&mut self, text: &str) {
        self.lines.push(format!("    ; {}", text));
    }

    pub fn note_epilogue(&mut self) {
        self.epilogues += 1;
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn finish(self) -> CompilationResult {
        CompilationResult {
            lines: self.lines,
            epilogues: self.epilogues,
        }
    }
}

/// Emitted code of one unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilationResult {
    pub lines: Vec<String>,
    /// Frame teardowns emitted.
    pub epilogues: usize,
}

impl CompilationResult {
    pub fn assembly(&self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}

/// Verify and render `lir` with `frame` supplying prologue and epilogues.
pub fn emit_code(lir: &Lir, frame: &dyn FrameContext) -> CompileResult<CompilationResult> {
    lir.verify()?;
    let mut crb = CompilationResultBuilder::new(frame);
    frame.enter(&mut crb);
    for op in lir.ops() {
        op.emit(&mut crb)?;
    }
    let result = crb.finish();
    debug!(
        "emitted {} lines with {} frame ({} epilogues)",
        result.lines.len(),
        frame.name(),
        result.epilogues
    );
    Ok(result)
}

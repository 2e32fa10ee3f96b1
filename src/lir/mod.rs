// This module is the low-level intermediate representation produced by lowering. An LIR
// program is a flat list of operations over symbolic operands (virtual registers,
// immediates, and the few fixed registers or stack slots a calling convention pins). Each
// operation knows its defined and used operands and how to render itself into a
// CompilationResultBuilder. Epilogue operations end a compiled method's frame; they never
// encode the frame layout themselves but ask the builder's FrameContext to emit the
// teardown, so the same operations work for every frame shape. Lir::verify enforces that
// nothing but a label or another epilogue follows an epilogue, and that the list ends
// with one.

//! Low-level IR.
//!
//! # Key Components
//!
//! ## Operands (`value`, `registers`)
//! - `Value`: variables, immediates, fixed registers, stack slots
//!
//! ## Lowering (`schedule`, `builder`, `generator`, `lowering`)
//! - Deterministic dependency-respecting node order
//! - `NodeLirBuilder` and the `LirGenerator` capability interface
//!
//! ## Emission (`emit`)
//! - `CompilationResultBuilder`, `FrameContext`

pub mod builder;
pub mod emit;
pub mod generator;
pub mod lowering;
pub mod ops;
pub mod registers;
pub mod schedule;
pub mod value;

pub use builder::NodeLirBuilder;
pub use emit::{emit_code, CompilationResult, CompilationResultBuilder, FrameContext};
pub use generator::LirGenerator;
pub use lowering::lower_graph;
pub use ops::{LabelOp, PhiOp};
pub use registers::AsmReg;
pub use schedule::schedule;
pub use value::Value;

use crate::core::{CompileError, CompileResult};
use std::fmt;

/// One low-level operation.
pub trait LirOp: fmt::Debug + fmt::Display + Send {
    fn name(&self) -> &'static str;

    /// Operands written by this operation.
    fn defs(&self) -> Vec<Value> {
        Vec::new()
    }

    /// Operands read by this operation.
    fn uses(&self) -> Vec<Value> {
        Vec::new()
    }

    fn is_label(&self) -> bool {
        false
    }

    /// Transfers control to another method; caller-saved registers do not
    /// survive it.
    fn is_call(&self) -> bool {
        false
    }

    fn as_epilogue(&self) -> Option<&dyn EpilogueOp> {
        None
    }

    fn is_epilogue(&self) -> bool {
        self.as_epilogue().is_some()
    }

    /// Render into the result builder.
    fn emit(&self, crb: &mut CompilationResultBuilder<'_>) -> CompileResult<()>;
}

/// Operation that tears down the method frame.
pub trait EpilogueOp: LirOp {
    /// Emit the frame teardown through the builder's frame context.
    fn leave_frame(&self, crb: &mut CompilationResultBuilder<'_>) {
        let frame = crb.frame_context();
        frame.leave(crb);
        crb.note_epilogue();
    }
}

/// Ordered instruction list of one compilation unit.
#[derive(Debug, Default)]
pub struct Lir {
    ops: Vec<Box<dyn LirOp>>,
}

impl Lir {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: Box<dyn LirOp>) {
        self.ops.push(op);
    }

    pub fn ops(&self) -> &[Box<dyn LirOp>] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn last(&self) -> Option<&dyn LirOp> {
        self.ops.last().map(|op| op.as_ref())
    }

    pub fn epilogue_count(&self) -> usize {
        self.ops.iter().filter(|op| op.is_epilogue()).count()
    }

    /// Operation names in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.ops.iter().map(|op| op.name()).collect()
    }

    /// Check epilogue placement: only labels or further epilogues may follow
    /// an epilogue, and the list must end with one.
    pub fn verify(&self) -> CompileResult<()> {
        let mut after_epilogue = false;
        for (index, op) in self.ops.iter().enumerate() {
            if op.is_label() {
                after_epilogue = false;
            } else if op.is_epilogue() {
                after_epilogue = true;
            } else if after_epilogue {
                return Err(CompileError::InvalidLir {
                    reason: format!("{} at {} follows an epilogue", op.name(), index),
                });
            }
        }
        match self.ops.last() {
            Some(op) if op.is_epilogue() => Ok(()),
            Some(op) => Err(CompileError::InvalidLir {
                reason: format!("control falls off the end after {}", op.name()),
            }),
            None => Err(CompileError::InvalidLir {
                reason: "empty instruction list".to_string(),
            }),
        }
    }
}

impl fmt::Display for Lir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, op) in self.ops.iter().enumerate() {
            if op.is_label() {
                writeln!(f, "{}", op)?;
            } else {
                writeln!(f, "  {:>3}: {}", index, op)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::Kind;

    #[derive(Debug)]
    struct Nop;

    impl fmt::Display for Nop {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("nop")
        }
    }

    impl LirOp for Nop {
        fn name(&self) -> &'static str {
            "nop"
        }

        fn emit(&self, crb: &mut CompilationResultBuilder<'_>) -> CompileResult<()> {
            crb.emit("nop");
            Ok(())
        }
    }

    #[derive(Debug)]
    struct Exit;

    impl fmt::Display for Exit {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("exit")
        }
    }

    impl LirOp for Exit {
        fn name(&self) -> &'static str {
            "exit"
        }

        fn as_epilogue(&self) -> Option<&dyn EpilogueOp> {
            Some(self)
        }

        fn emit(&self, crb: &mut CompilationResultBuilder<'_>) -> CompileResult<()> {
            self.leave_frame(crb);
            crb.emit("ret");
            Ok(())
        }
    }

    impl EpilogueOp for Exit {}

    struct CountingFrame;

    impl FrameContext for CountingFrame {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn enter(&self, crb: &mut CompilationResultBuilder<'_>) {
            crb.emit("enter");
        }

        fn leave(&self, crb: &mut CompilationResultBuilder<'_>) {
            crb.emit("leave");
        }
    }

    #[test]
    fn test_verify_accepts_trailing_epilogue() {
        let mut lir = Lir::new();
        lir.push(Box::new(Nop));
        lir.push(Box::new(Exit));
        lir.push(Box::new(LabelOp::new("second")));
        lir.push(Box::new(Exit));
        lir.verify().unwrap();
        assert_eq!(lir.epilogue_count(), 2);
    }

    #[test]
    fn test_verify_rejects_code_after_epilogue() {
        let mut lir = Lir::new();
        lir.push(Box::new(Exit));
        lir.push(Box::new(Nop));
        lir.push(Box::new(Exit));
        assert!(matches!(lir.verify(), Err(CompileError::InvalidLir { .. })));
    }

    #[test]
    fn test_verify_rejects_missing_epilogue() {
        let mut lir = Lir::new();
        lir.push(Box::new(Nop));
        assert!(lir.verify().is_err());
        assert!(Lir::new().verify().is_err());
    }

    #[test]
    fn test_epilogue_delegates_to_frame_context() {
        let mut lir = Lir::new();
        lir.push(Box::new(PhiOp::new(
            Value::Variable { index: 0, kind: Kind::Int },
            vec![Value::Constant { value: 1, kind: Kind::Int }],
        )));
        lir.push(Box::new(Exit));

        let result = emit_code(&lir, &CountingFrame).unwrap();
        assert_eq!(result.epilogues, 1);
        let text = result.assembly();
        let leave = text.find("leave").unwrap();
        let ret = text.find("ret").unwrap();
        assert!(text.find("enter").unwrap() < leave);
        assert!(leave < ret);
    }
}

//! x86-64 LIR operations.
//!
//! Operands stay symbolic until register allocation; emission renders them
//! as Intel-syntax text with variables printed by name.

use super::registers::operand;
use crate::core::{CompileError, CompileResult};
use crate::lir::{CompilationResultBuilder, EpilogueOp, LirOp, Value};
use crate::meta::{Kind, MethodId};
use std::fmt;

/// Register-to-register or immediate move.
#[derive(Debug, Clone)]
pub struct X64MoveOp {
    pub dst: Value,
    pub src: Value,
}

impl fmt::Display for X64MoveOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mov {}, {}", operand(&self.dst), operand(&self.src))
    }
}

impl LirOp for X64MoveOp {
    fn name(&self) -> &'static str {
        "mov"
    }

    fn defs(&self) -> Vec<Value> {
        vec![self.dst]
    }

    fn uses(&self) -> Vec<Value> {
        vec![self.src]
    }

    fn emit(&self, crb: &mut CompilationResultBuilder<'_>) -> CompileResult<()> {
        if self.dst.is_constant() || self.dst.is_illegal() {
            return Err(CompileError::InvalidLir {
                reason: format!("cannot move into {}", self.dst),
            });
        }
        if self.dst != self.src {
            crb.emit(&self.to_string());
        }
        Ok(())
    }
}

/// Two-operand ALU opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOpcode {
    Or,
    And,
    Xor,
    Add,
}

impl BinaryOpcode {
    pub fn mnemonic(self) -> &'static str {
        match self {
            BinaryOpcode::Or => "or",
            BinaryOpcode::And => "and",
            BinaryOpcode::Xor => "xor",
            BinaryOpcode::Add => "add",
        }
    }
}

/// `dst = x OP y`, emitted as a move plus a two-address ALU instruction.
#[derive(Debug, Clone)]
pub struct X64BinaryOp {
    pub opcode: BinaryOpcode,
    pub dst: Value,
    pub x: Value,
    pub y: Value,
}

impl fmt::Display for X64BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} = {} {}, {}",
            operand(&self.dst),
            self.opcode.mnemonic(),
            operand(&self.x),
            operand(&self.y)
        )
    }
}

impl LirOp for X64BinaryOp {
    fn name(&self) -> &'static str {
        self.opcode.mnemonic()
    }

    fn defs(&self) -> Vec<Value> {
        vec![self.dst]
    }

    fn uses(&self) -> Vec<Value> {
        vec![self.x, self.y]
    }

    fn emit(&self, crb: &mut CompilationResultBuilder<'_>) -> CompileResult<()> {
        if self.dst != self.x {
            crb.emit(&format!("mov {}, {}", operand(&self.dst), operand(&self.x)));
        }
        crb.emit(&format!(
            "{} {}, {}",
            self.opcode.mnemonic(),
            operand(&self.dst),
            operand(&self.y)
        ));
        Ok(())
    }
}

/// What a call transfers control to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallTarget {
    Method(MethodId),
    /// Runtime stub, e.g. the kind-specialized array copy.
    Stub(String),
}

impl fmt::Display for CallTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallTarget::Method(method) => write!(f, "{}", method),
            CallTarget::Stub(name) => f.write_str(name),
        }
    }
}

/// Direct call. Register arguments are moved into place beforehand.
#[derive(Debug, Clone)]
pub struct X64CallOp {
    pub target: CallTarget,
    /// Argument registers the callee reads.
    pub arg_regs: Vec<Value>,
    /// Arguments passed on the stack, in order.
    pub stack_args: Vec<Value>,
    /// Return register, if the callee produces a value.
    pub result: Option<Value>,
    /// Outgoing argument area, 16-byte aligned.
    pub stack_size: u32,
}

impl fmt::Display for X64CallOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let args: Vec<String> = self
            .arg_regs
            .iter()
            .chain(self.stack_args.iter())
            .map(operand)
            .collect();
        if let Some(result) = &self.result {
            write!(f, "{} = ", operand(result))?;
        }
        write!(f, "call {}({})", self.target, args.join(", "))
    }
}

impl LirOp for X64CallOp {
    fn name(&self) -> &'static str {
        match self.target {
            CallTarget::Method(_) => "call",
            CallTarget::Stub(_) => "call_stub",
        }
    }

    fn defs(&self) -> Vec<Value> {
        self.result.into_iter().collect()
    }

    fn uses(&self) -> Vec<Value> {
        self.arg_regs.iter().chain(self.stack_args.iter()).copied().collect()
    }

    fn is_call(&self) -> bool {
        true
    }

    fn emit(&self, crb: &mut CompilationResultBuilder<'_>) -> CompileResult<()> {
        let pushed = self.stack_args.len() as u32 * 8;
        if pushed > self.stack_size {
            return Err(CompileError::InvalidLir {
                reason: format!("{} stack arguments exceed {} bytes", self.stack_args.len(), self.stack_size),
            });
        }
        // Pad so rsp stays 16-byte aligned at the call.
        let padding = self.stack_size - pushed;
        if padding > 0 {
            crb.emit(&format!("sub rsp, {}", padding));
        }
        for arg in self.stack_args.iter().rev() {
            crb.emit(&format!("push {}", operand(arg)));
        }
        crb.emit(&format!("call {}", self.target));
        if self.stack_size > 0 {
            crb.emit(&format!("add rsp, {}", self.stack_size));
        }
        Ok(())
    }
}

/// Method exit. Tears down the frame through the frame context, then returns.
#[derive(Debug, Clone)]
pub struct X64ReturnOp {
    /// Return register holding the result, if any.
    pub value: Option<Value>,
}

impl fmt::Display for X64ReturnOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "return {}", operand(value)),
            None => f.write_str("return"),
        }
    }
}

impl LirOp for X64ReturnOp {
    fn name(&self) -> &'static str {
        "return"
    }

    fn uses(&self) -> Vec<Value> {
        self.value.into_iter().collect()
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

impl EpilogueOp for X64ReturnOp {}

/// Name of the runtime stub copying elements of `kind`.
pub fn array_copy_stub(kind: Kind) -> String {
    format!("graft_arraycopy_{}", kind.java_name().to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::x64::{frame::LeafFrameContext, registers::RAX};

    fn var(index: u32) -> Value {
        Value::Variable { index, kind: Kind::Int }
    }

    #[test]
    fn test_binary_emits_two_address_form() {
        let op = X64BinaryOp {
            opcode: BinaryOpcode::Or,
            dst: var(2),
            x: var(0),
            y: Value::Constant { value: 0xf0, kind: Kind::Int },
        };
        let frame = LeafFrameContext::new(0);
        let mut crb = CompilationResultBuilder::new(&frame);
        op.emit(&mut crb).unwrap();
        let lines: Vec<&str> = crb.lines().iter().map(|l| l.trim()).collect();
        assert_eq!(lines, vec!["mov v2, v0", "or v2, 0xf0"]);
        assert_eq!(op.to_string(), "v2 = or v0, 0xf0");
    }

    #[test]
    fn test_call_with_stack_arguments_keeps_alignment() {
        let op = X64CallOp {
            target: CallTarget::Stub(array_copy_stub(Kind::Int)),
            arg_regs: vec![],
            stack_args: vec![var(7)],
            result: None,
            stack_size: 16,
        };
        let frame = LeafFrameContext::new(0);
        let mut crb = CompilationResultBuilder::new(&frame);
        op.emit(&mut crb).unwrap();
        let lines: Vec<&str> = crb.lines().iter().map(|l| l.trim()).collect();
        assert_eq!(
            lines,
            vec!["sub rsp, 8", "push v7", "call graft_arraycopy_int", "add rsp, 16"]
        );
        assert!(op.is_call());
    }

    #[test]
    fn test_call_rejects_undersized_argument_area() {
        let op = X64CallOp {
            target: CallTarget::Stub(array_copy_stub(Kind::Long)),
            arg_regs: vec![],
            stack_args: vec![var(1), var(2), var(3)],
            result: None,
            stack_size: 16,
        };
        let frame = LeafFrameContext::new(0);
        let mut crb = CompilationResultBuilder::new(&frame);
        assert!(matches!(op.emit(&mut crb), Err(CompileError::InvalidLir { .. })));
    }

    #[test]
    fn test_return_is_epilogue() {
        let op = X64ReturnOp {
            value: Some(Value::Register { reg: RAX, kind: Kind::Int }),
        };
        assert!(op.is_epilogue());
        assert_eq!(op.to_string(), "return eax");
    }

    #[test]
    fn test_move_into_constant_is_rejected() {
        let op = X64MoveOp {
            dst: Value::Constant { value: 1, kind: Kind::Int },
            src: var(0),
        };
        let frame = LeafFrameContext::new(0);
        let mut crb = CompilationResultBuilder::new(&frame);
        assert!(op.emit(&mut crb).is_err());
    }
}

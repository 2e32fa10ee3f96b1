//! x86-64 implementation of the lowering capability interface.

use super::calling_convention::{CCAssigner, CCAssignment, SysVAssigner};
use super::lir_ops::{array_copy_stub, BinaryOpcode, CallTarget, X64BinaryOp, X64CallOp, X64MoveOp, X64ReturnOp};
use crate::lir::{LabelOp, Lir, LirGenerator, PhiOp, Value};
use crate::meta::{Kind, MethodId};
use log::trace;

/// Emits x86-64 LIR with virtual registers and System V argument locations.
pub struct X64LirGenerator {
    lir: Lir,
    incoming: Vec<CCAssignment>,
    next_variable: u32,
    exits: u32,
}

impl X64LirGenerator {
    /// Generator for a unit with the given parameter kinds.
    pub fn new(signature: &[Kind]) -> Self {
        let incoming = SysVAssigner::new().assign_signature(signature);
        Self {
            lir: Lir::new(),
            incoming,
            next_variable: 0,
            exits: 0,
        }
    }

    fn binary(&mut self, opcode: BinaryOpcode, x: Value, y: Value) -> Value {
        let kind = if x.is_constant() { y.kind() } else { x.kind() };
        let dst = self.new_variable(kind);
        self.lir.push(Box::new(X64BinaryOp { opcode, dst, x, y }));
        dst
    }

    /// Move `args` into their outgoing locations and emit the call.
    fn call(&mut self, target: CallTarget, args: &[Value], result: Kind) -> Value {
        let mut assigner = SysVAssigner::new();
        let mut arg_regs = Vec::new();
        let mut stack_args = Vec::new();
        for &arg in args {
            let mut assignment = CCAssignment::for_kind(arg.kind());
            assigner.assign_arg(&mut assignment);
            match assignment.reg {
                Some(reg) => {
                    let location = Value::Register { reg, kind: arg.kind() };
                    self.emit_move(location, arg);
                    arg_regs.push(location);
                }
                None => stack_args.push(arg),
            }
        }

        let result_reg = if result == Kind::Void {
            None
        } else {
            let mut ret = CCAssignment::for_kind(result);
            assigner.assign_ret(&mut ret);
            ret.reg.map(|reg| Value::Register { reg, kind: result })
        };
        trace!("call {} with {} register args", target, arg_regs.len());
        self.lir.push(Box::new(X64CallOp {
            target,
            arg_regs,
            stack_args,
            result: result_reg,
            stack_size: assigner.stack_size(),
        }));

        match result_reg {
            Some(reg) => {
                let dst = self.new_variable(result);
                self.emit_move(dst, reg);
                dst
            }
            None => Value::Illegal,
        }
    }
}

impl LirGenerator for X64LirGenerator {
    fn arch(&self) -> &'static str {
        "x86-64"
    }

    fn new_variable(&mut self, kind: Kind) -> Value {
        let index = self.next_variable;
        self.next_variable += 1;
        Value::Variable { index, kind }
    }

    fn emit_incoming_parameter(&mut self, index: usize, kind: Kind) -> Value {
        assert!(
            index < self.incoming.len(),
            "parameter {} outside signature of {}",
            index,
            self.incoming.len()
        );
        let location = self.incoming[index].incoming_location();
        let dst = self.new_variable(kind);
        self.emit_move(dst, location);
        dst
    }

    fn emit_or(&mut self, x: Value, y: Value) -> Value {
        self.binary(BinaryOpcode::Or, x, y)
    }

    fn emit_and(&mut self, x: Value, y: Value) -> Value {
        self.binary(BinaryOpcode::And, x, y)
    }

    fn emit_xor(&mut self, x: Value, y: Value) -> Value {
        self.binary(BinaryOpcode::Xor, x, y)
    }

    fn emit_add(&mut self, x: Value, y: Value) -> Value {
        self.binary(BinaryOpcode::Add, x, y)
    }

    fn emit_move(&mut self, dst: Value, src: Value) {
        self.lir.push(Box::new(X64MoveOp { dst, src }));
    }

    fn emit_array_copy(&mut self, kind: Kind, args: [Value; 5]) {
        self.call(CallTarget::Stub(array_copy_stub(kind)), &args, Kind::Void);
    }

    fn emit_call(&mut self, target: MethodId, args: &[Value], result: Kind) -> Value {
        self.call(CallTarget::Method(target), args, result)
    }

    fn emit_label(&mut self, name: &str) {
        self.lir.push(Box::new(LabelOp::new(name)));
    }

    fn emit_phi(&mut self, inputs: &[Value], kind: Kind) -> Value {
        let dst = self.new_variable(kind);
        self.lir.push(Box::new(PhiOp::new(dst, inputs.to_vec())));
        dst
    }

    fn emit_return(&mut self, value: Option<Value>) {
        // Each exit after the first starts its own path.
        if self.lir.last().is_some_and(|op| op.is_epilogue()) {
            let label = format!("exit_{}", self.exits);
            self.emit_label(&label);
        }
        self.exits += 1;

        let value = value.map(|value| {
            let kind = value.kind();
            let mut ret = CCAssignment::for_kind(kind);
            SysVAssigner::new().assign_ret(&mut ret);
            match ret.reg {
                Some(reg) => {
                    let location = Value::Register { reg, kind };
                    self.emit_move(location, value);
                    location
                }
                None => value,
            }
        });
        self.lir.push(Box::new(X64ReturnOp { value }));
    }

    fn lir(&self) -> &Lir {
        &self.lir
    }

    fn take_lir(&mut self) -> Lir {
        std::mem::take(&mut self.lir)
    }
}

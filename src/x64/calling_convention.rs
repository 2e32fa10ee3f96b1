// This module implements the System V AMD64 ABI argument and return assignment for lowered
// compilation units. CCAssigner is the convention interface and SysVAssigner its System V
// implementation: GP-class values (int, long and references) pass in RDI, RSI, RDX, RCX, R8,
// R9, float and double values in XMM0-XMM7, everything beyond that on the stack in 8-byte
// slots. Return values use RAX/RDX or XMM0/XMM1. The LIR generator runs one assigner over
// the unit's signature to locate incoming parameters and a fresh one per call site to place
// outgoing arguments.

//! System V x86-64 calling convention implementation.

use super::registers::{bank_for, GP, RAX, RCX, RDI, RDX, RSI, R8, R9, XMM, XMM0, XMM1};
use crate::lir::{AsmReg, Value};
use crate::meta::Kind;

/// Argument assignment result from calling convention analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CCAssignment {
    /// Kind of the value being passed.
    pub kind: Kind,
    /// Register bank this argument belongs to.
    pub bank: u8,
    /// Size of the argument in bytes.
    pub size: u32,
    /// Assigned register (if any).
    pub reg: Option<AsmReg>,
    /// Stack offset (if assigned to stack).
    pub stack_off: Option<i32>,
}

impl CCAssignment {
    /// Unassigned slot for a value of `kind`.
    pub fn for_kind(kind: Kind) -> Self {
        Self {
            kind,
            bank: bank_for(kind),
            size: kind.stack_kind().bits().max(8) / 8,
            reg: None,
            stack_off: None,
        }
    }

    /// Operand for the assigned location, as seen by the callee.
    ///
    /// Stack arguments live above the saved frame pointer and return address.
    pub fn incoming_location(&self) -> Value {
        match (self.reg, self.stack_off) {
            (Some(reg), _) => Value::Register { reg, kind: self.kind },
            (None, Some(offset)) => Value::StackSlot { offset: 16 + offset, kind: self.kind },
            (None, None) => Value::Illegal,
        }
    }
}

/// Trait for calling convention argument assignment.
pub trait CCAssigner {
    /// Assign an argument according to the calling convention.
    fn assign_arg(&mut self, arg: &mut CCAssignment);

    /// Assign a return value according to the calling convention.
    fn assign_ret(&mut self, arg: &mut CCAssignment);

    /// Reset state for a new signature.
    fn reset(&mut self);

    /// Get the total stack space needed for arguments.
    fn stack_size(&self) -> u32;
}

/// System V x86-64 calling convention assigner.
///
/// - First 6 GP-class args in RDI, RSI, RDX, RCX, R8, R9
/// - First 8 floating-point args in XMM0-XMM7
/// - Remaining args on stack
/// - Return values in RAX/RDX (int) or XMM0/XMM1 (float)
#[derive(Debug, Default)]
pub struct SysVAssigner {
    gp_cnt: usize,
    xmm_cnt: usize,
    stack: u32,
    ret_gp_cnt: usize,
    ret_xmm_cnt: usize,
}

impl SysVAssigner {
    /// System V x86-64 GP argument registers.
    pub const GP_ARG_REGS: [AsmReg; 6] = [RDI, RSI, RDX, RCX, R8, R9];

    /// System V x86-64 XMM argument registers.
    pub const XMM_ARG_REGS: [AsmReg; 8] = [
        AsmReg::new(XMM, 0),
        AsmReg::new(XMM, 1),
        AsmReg::new(XMM, 2),
        AsmReg::new(XMM, 3),
        AsmReg::new(XMM, 4),
        AsmReg::new(XMM, 5),
        AsmReg::new(XMM, 6),
        AsmReg::new(XMM, 7),
    ];

    const RET_GP_REGS: [AsmReg; 2] = [RAX, RDX];

    const RET_XMM_REGS: [AsmReg; 2] = [XMM0, XMM1];

    pub fn new() -> Self {
        Self::default()
    }

    /// Assign every kind of `signature` in order.
    pub fn assign_signature(&mut self, signature: &[Kind]) -> Vec<CCAssignment> {
        self.reset();
        signature
            .iter()
            .map(|&kind| {
                let mut arg = CCAssignment::for_kind(kind);
                self.assign_arg(&mut arg);
                arg
            })
            .collect()
    }

    /// Align a value up to the specified alignment.
    fn align_up(value: u32, align: u32) -> u32 {
        (value + align - 1) & !(align - 1)
    }
}

impl CCAssigner for SysVAssigner {
    fn assign_arg(&mut self, arg: &mut CCAssignment) {
        let regs: &[AsmReg] = if arg.bank == GP {
            &Self::GP_ARG_REGS
        } else {
            &Self::XMM_ARG_REGS
        };
        let used = if arg.bank == GP { &mut self.gp_cnt } else { &mut self.xmm_cnt };

        if *used < regs.len() {
            arg.reg = Some(regs[*used]);
            *used += 1;
        } else {
            // Each stack slot is 8 bytes in System V
            self.stack = Self::align_up(self.stack, 8);
            arg.stack_off = Some(self.stack as i32);
            self.stack += 8;
        }
    }

    fn assign_ret(&mut self, arg: &mut CCAssignment) {
        if arg.bank == GP {
            if self.ret_gp_cnt < Self::RET_GP_REGS.len() {
                arg.reg = Some(Self::RET_GP_REGS[self.ret_gp_cnt]);
                self.ret_gp_cnt += 1;
            }
        } else if self.ret_xmm_cnt < Self::RET_XMM_REGS.len() {
            arg.reg = Some(Self::RET_XMM_REGS[self.ret_xmm_cnt]);
            self.ret_xmm_cnt += 1;
        }
    }

    fn reset(&mut self) {
        self.gp_cnt = 0;
        self.xmm_cnt = 0;
        self.stack = 0;
        self.ret_gp_cnt = 0;
        self.ret_xmm_cnt = 0;
    }

    fn stack_size(&self) -> u32 {
        // Align stack to 16-byte boundary as required by System V ABI
        Self::align_up(self.stack, 16)
    }
}

//! x86-64 register names and operand rendering.

use crate::lir::{AsmReg, Value};
use crate::meta::Kind;

/// General purpose bank.
pub const GP: u8 = 0;
/// SSE bank.
pub const XMM: u8 = 1;

pub const RAX: AsmReg = AsmReg::new(GP, 0);
pub const RCX: AsmReg = AsmReg::new(GP, 1);
pub const RDX: AsmReg = AsmReg::new(GP, 2);
pub const RBX: AsmReg = AsmReg::new(GP, 3);
pub const RSP: AsmReg = AsmReg::new(GP, 4);
pub const RBP: AsmReg = AsmReg::new(GP, 5);
pub const RSI: AsmReg = AsmReg::new(GP, 6);
pub const RDI: AsmReg = AsmReg::new(GP, 7);
pub const R8: AsmReg = AsmReg::new(GP, 8);
pub const R9: AsmReg = AsmReg::new(GP, 9);
pub const R12: AsmReg = AsmReg::new(GP, 12);
pub const R13: AsmReg = AsmReg::new(GP, 13);
pub const R14: AsmReg = AsmReg::new(GP, 14);
pub const R15: AsmReg = AsmReg::new(GP, 15);

/// Registers a System V callee must preserve, besides rbp.
pub const CALLEE_SAVED: [AsmReg; 5] = [RBX, R12, R13, R14, R15];

pub const XMM0: AsmReg = AsmReg::new(XMM, 0);
pub const XMM1: AsmReg = AsmReg::new(XMM, 1);

const GP_NAMES: [&str; 16] = [
    "rax", "rcx", "rdx", "rbx", "rsp", "rbp", "rsi", "rdi", "r8", "r9", "r10", "r11", "r12", "r13",
    "r14", "r15",
];

const GP_NAMES_32: [&str; 16] = [
    "eax", "ecx", "edx", "ebx", "esp", "ebp", "esi", "edi", "r8d", "r9d", "r10d", "r11d", "r12d",
    "r13d", "r14d", "r15d",
];

/// Register bank holding values of `kind`.
pub fn bank_for(kind: Kind) -> u8 {
    if kind.is_float() {
        XMM
    } else {
        GP
    }
}

/// Assembly name of `reg` when holding a value of `kind`.
pub fn reg_name(reg: AsmReg, kind: Kind) -> String {
    match reg.bank {
        GP if (reg.id as usize) < GP_NAMES.len() => {
            let names = if kind.stack_kind() == Kind::Int { &GP_NAMES_32 } else { &GP_NAMES };
            names[reg.id as usize].to_string()
        }
        XMM => format!("xmm{}", reg.id),
        bank => format!("r{}.{}", bank, reg.id),
    }
}

/// Render an operand in Intel syntax. Variables stay symbolic.
pub fn operand(value: &Value) -> String {
    match value {
        Value::Illegal => "<illegal>".to_string(),
        Value::Variable { index, .. } => format!("v{}", index),
        Value::Constant { value, kind } => {
            let mask = if kind.bits() == 0 || kind.bits() >= 64 {
                u64::MAX
            } else {
                (1u64 << kind.bits()) - 1
            };
            format!("{:#x}", value & mask)
        }
        Value::Register { reg, kind } => reg_name(*reg, *kind),
        Value::StackSlot { offset, kind } => {
            let width = if kind.bits() > 32 { "qword" } else { "dword" };
            format!("{} ptr [rbp{:+}]", width, offset)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_names() {
        assert_eq!(reg_name(RAX, Kind::Long), "rax");
        assert_eq!(reg_name(RAX, Kind::Int), "eax");
        assert_eq!(reg_name(R8, Kind::Int), "r8d");
        assert_eq!(reg_name(RDI, Kind::Object), "rdi");
        assert_eq!(reg_name(XMM1, Kind::Double), "xmm1");
    }

    #[test]
    fn test_operand_rendering() {
        let slot = Value::StackSlot { offset: 16, kind: Kind::Long };
        assert_eq!(operand(&slot), "qword ptr [rbp+16]");
        let imm = Value::Constant { value: u64::MAX, kind: Kind::Int };
        assert_eq!(operand(&imm), "0xffffffff");
        let var = Value::Variable { index: 4, kind: Kind::Int };
        assert_eq!(operand(&var), "v4");
    }
}

//! LIR operands.

use super::registers::AsmReg;
use crate::meta::Kind;
use std::fmt;

/// Operand location of a lowered value.
///
/// Lowering produces mostly `Variable`s; fixed `Register` and `StackSlot`
/// operands appear where the calling convention pins a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Value {
    /// No value (result of a void operation).
    Illegal,
    /// Virtual register awaiting allocation.
    Variable { index: u32, kind: Kind },
    /// Immediate.
    Constant { value: u64, kind: Kind },
    /// Fixed physical register.
    Register { reg: AsmReg, kind: Kind },
    /// Frame slot relative to the frame pointer.
    StackSlot { offset: i32, kind: Kind },
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Illegal => Kind::Void,
            Value::Variable { kind, .. }
            | Value::Constant { kind, .. }
            | Value::Register { kind, .. }
            | Value::StackSlot { kind, .. } => *kind,
        }
    }

    pub fn is_illegal(&self) -> bool {
        matches!(self, Value::Illegal)
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Value::Variable { .. })
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Value::Constant { .. })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Illegal => f.write_str("-"),
            Value::Variable { index, kind } => write!(f, "v{}|{}", index, kind.type_char()),
            Value::Constant { value, .. } => write!(f, "{:#x}", value),
            Value::Register { reg, .. } => write!(f, "%{}.{}", reg.bank, reg.id),
            Value::StackSlot { offset, .. } => write!(f, "[fp{:+}]", offset),
        }
    }
}

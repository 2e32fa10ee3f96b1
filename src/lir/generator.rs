//! The backend capability interface used by node lowering.

use super::{Lir, Value};
use crate::meta::{Kind, MethodId};

/// Emits architecture-level operations into an instruction list.
///
/// Node lowering only talks to this trait, so one set of `Lowerable`
/// implementations serves every backend.
pub trait LirGenerator {
    /// Target architecture name.
    fn arch(&self) -> &'static str;

    /// Fresh virtual register.
    fn new_variable(&mut self, kind: Kind) -> Value;

    /// Copy incoming argument `index` out of its calling-convention location.
    fn emit_incoming_parameter(&mut self, index: usize, kind: Kind) -> Value;

    /// Operand for a literal. Immediates need no instruction by default.
    fn emit_constant(&mut self, value: u64, kind: Kind) -> Value {
        Value::Constant { value, kind }
    }

    fn emit_or(&mut self, x: Value, y: Value) -> Value;

    fn emit_and(&mut self, x: Value, y: Value) -> Value;

    fn emit_xor(&mut self, x: Value, y: Value) -> Value;

    fn emit_add(&mut self, x: Value, y: Value) -> Value;

    fn emit_move(&mut self, dst: Value, src: Value);

    /// Copy `[src, src_pos, dest, dest_pos, length]` elements of `kind`.
    fn emit_array_copy(&mut self, kind: Kind, args: [Value; 5]);

    /// Call `target`; returns [`Value::Illegal`] for void calls.
    fn emit_call(&mut self, target: MethodId, args: &[Value], result: Kind) -> Value;

    fn emit_label(&mut self, name: &str);

    /// Value selected by control-flow predecessor.
    fn emit_phi(&mut self, inputs: &[Value], kind: Kind) -> Value;

    /// Method exit, ending with an epilogue operation.
    fn emit_return(&mut self, value: Option<Value>);

    /// Instructions emitted so far.
    fn lir(&self) -> &Lir;

    /// Hand over the instruction list, leaving an empty one behind.
    fn take_lir(&mut self) -> Lir;
}

// This module provides the x86-64 frame contexts that epilogue operations delegate to.
// FunctionFrame describes the stack layout of one unit (callee-saved registers to preserve,
// spill slots, total frame size) and keeps its lists in the session's bumpalo arena. The
// layout is derived from the finished LIR: every callee-saved register an operation names
// is preserved, and every variable whose live range in instruction order spans a call gets
// a spill slot. SysVFrameContext emits the standard rbp-based prologue and its matching
// teardown: push rbp, mov rbp rsp, push the saved registers, reserve the 16-byte aligned
// frame, and the reverse on exit. LeafFrameContext serves units that need no frame pointer
// and only pushes the saved registers and adjusts rsp. Neither context looks at the LIR
// once the layout is built.

//! x86-64 frame layouts and frame contexts.

use super::registers::{reg_name, CALLEE_SAVED, RBP, RSP};
use crate::lir::{AsmReg, CompilationResultBuilder, FrameContext, Lir, Value};
use crate::meta::Kind;
use bumpalo::{collections::Vec as BumpVec, Bump};
use hashbrown::HashMap;
use log::debug;
use std::fmt;

/// Which frame shape a unit is emitted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameStyle {
    /// rbp-based frame with callee-saved register preservation.
    #[default]
    SysV,
    /// No frame pointer; stack pointer adjustment only.
    Leaf,
}

impl fmt::Display for FrameStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameStyle::SysV => f.write_str("sysv"),
            FrameStyle::Leaf => f.write_str("leaf"),
        }
    }
}

/// Stack frame layout of one unit.
#[derive(Debug)]
pub struct FunctionFrame<'a> {
    /// Callee-saved registers that need to be preserved.
    pub saved_registers: BumpVec<'a, AsmReg>,
    /// Total size of the stack frame.
    pub frame_size: u32,
    /// Stack slot assignments for spilled values.
    pub spill_slots: BumpVec<'a, i32>,
    /// Current spill slot offset.
    spill_offset: i32,
}

impl<'a> FunctionFrame<'a> {
    /// Create a new function frame using the provided arena.
    pub fn new(arena: &'a Bump) -> Self {
        Self {
            saved_registers: BumpVec::new_in(arena),
            frame_size: 0,
            spill_slots: BumpVec::new_in(arena),
            spill_offset: 0,
        }
    }

    /// Layout required by `lir`.
    pub fn for_lir(arena: &'a Bump, lir: &Lir) -> Self {
        let mut frame = Self::new(arena);
        // Live range of each variable as (first, last) instruction index.
        let mut ranges: HashMap<u32, (usize, usize, Kind)> = HashMap::new();
        let mut calls = Vec::new();
        for (position, op) in lir.ops().iter().enumerate() {
            if op.is_call() {
                calls.push(position);
            }
            for value in op.defs().into_iter().chain(op.uses()) {
                match value {
                    Value::Register { reg, .. } if CALLEE_SAVED.contains(&reg) => {
                        frame.add_saved_register(reg);
                    }
                    Value::Variable { index, kind } => {
                        ranges.entry(index).or_insert((position, position, kind)).1 = position;
                    }
                    _ => {}
                }
            }
        }

        let mut spilled: Vec<(u32, Kind)> = ranges
            .into_iter()
            .filter(|(_, (first, last, _))| calls.iter().any(|&call| *first < call && call < *last))
            .map(|(index, (_, _, kind))| (index, kind))
            .collect();
        spilled.sort_unstable_by_key(|&(index, _)| index);
        for (index, kind) in spilled {
            let offset = frame.allocate_spill_slot(kind.stack_kind().bits().max(8) / 8);
            debug!("v{} is live across a call, spill slot [rbp{:+}]", index, offset);
        }
        frame.calculate_frame_size();
        frame
    }

    /// Add a callee-saved register that needs preservation.
    pub fn add_saved_register(&mut self, reg: AsmReg) {
        if !self.saved_registers.contains(&reg) {
            self.saved_registers.push(reg);
        }
    }

    /// Allocate a new spill slot below the saved registers and return its
    /// rbp-relative offset.
    pub fn allocate_spill_slot(&mut self, size: u32) -> i32 {
        let aligned_size = size.div_ceil(8) * 8;
        self.spill_offset -= aligned_size as i32;
        let offset = self.spill_offset - 8 * self.saved_registers.len() as i32;
        self.spill_slots.push(offset);
        offset
    }

    /// Calculate the final frame size. Saved registers are pushed, so only
    /// the spill area is reserved, rounded to keep rsp 16-byte aligned.
    pub fn calculate_frame_size(&mut self) {
        let spill_size = (-self.spill_offset) as u32;
        let pushed = self.saved_registers.len() as u32 * 8;
        self.frame_size = (spill_size + pushed).div_ceil(16) * 16 - pushed;
    }
}

/// Standard System V frame: rbp chain plus callee-saved registers.
pub struct SysVFrameContext<'a> {
    frame: FunctionFrame<'a>,
}

impl<'a> SysVFrameContext<'a> {
    pub fn new(mut frame: FunctionFrame<'a>) -> Self {
        frame.calculate_frame_size();
        Self { frame }
    }

    pub fn frame(&self) -> &FunctionFrame<'a> {
        &self.frame
    }
}

impl FrameContext for SysVFrameContext<'_> {
    fn name(&self) -> &'static str {
        "sysv"
    }

    fn enter(&self, crb: &mut CompilationResultBuilder<'_>) {
        crb.emit(&format!("push {}", reg_name(RBP, Kind::Long)));
        crb.emit(&format!("mov {}, {}", reg_name(RBP, Kind::Long), reg_name(RSP, Kind::Long)));
        for &reg in self.frame.saved_registers.iter() {
            crb.emit(&format!("push {}", reg_name(reg, Kind::Long)));
        }
        if self.frame.frame_size > 0 {
            crb.emit(&format!("sub rsp, {}", self.frame.frame_size));
        }
    }

    fn leave(&self, crb: &mut CompilationResultBuilder<'_>) {
        if self.frame.frame_size > 0 {
            crb.emit(&format!("add rsp, {}", self.frame.frame_size));
        }
        for &reg in self.frame.saved_registers.iter().rev() {
            crb.emit(&format!("pop {}", reg_name(reg, Kind::Long)));
        }
        crb.emit(&format!("pop {}", reg_name(RBP, Kind::Long)));
    }
}

/// Frameless unit: no frame pointer, only saved registers and an rsp adjust.
#[derive(Debug, Clone, Default)]
pub struct LeafFrameContext {
    saved_registers: Vec<AsmReg>,
    stack_size: u32,
}

impl LeafFrameContext {
    pub fn new(stack_size: u32) -> Self {
        Self {
            saved_registers: Vec::new(),
            stack_size: stack_size.div_ceil(16) * 16,
        }
    }

    /// Leaf context preserving the registers of `frame` and reserving its
    /// spill area.
    pub fn for_frame(frame: &FunctionFrame<'_>) -> Self {
        Self {
            saved_registers: frame.saved_registers.iter().copied().collect(),
            stack_size: frame.frame_size,
        }
    }
}

impl FrameContext for LeafFrameContext {
    fn name(&self) -> &'static str {
        "leaf"
    }

    fn enter(&self, crb: &mut CompilationResultBuilder<'_>) {
        for &reg in &self.saved_registers {
            crb.emit(&format!("push {}", reg_name(reg, Kind::Long)));
        }
        if self.stack_size > 0 {
            crb.emit(&format!("sub rsp, {}", self.stack_size));
        }
    }

    fn leave(&self, crb: &mut CompilationResultBuilder<'_>) {
        if self.stack_size > 0 {
            crb.emit(&format!("add rsp, {}", self.stack_size));
        }
        for &reg in self.saved_registers.iter().rev() {
            crb.emit(&format!("pop {}", reg_name(reg, Kind::Long)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::x64::registers::{R12, RBX};

    #[test]
    fn test_function_frame_spill_allocation() {
        let arena = Bump::new();
        let mut frame = FunctionFrame::new(&arena);

        let slot1 = frame.allocate_spill_slot(8);
        let slot2 = frame.allocate_spill_slot(4);
        let slot3 = frame.allocate_spill_slot(16);

        assert!(slot1 > slot2);
        assert!(slot2 > slot3);
        assert_eq!(slot1 % 8, 0);
        assert_eq!(slot3, -32);

        frame.calculate_frame_size();
        assert_eq!(frame.frame_size, 32);
    }

    #[test]
    fn test_saved_registers_keep_alignment() {
        let arena = Bump::new();
        let mut frame = FunctionFrame::new(&arena);

        frame.add_saved_register(RBX);
        frame.add_saved_register(R12);
        frame.add_saved_register(RBX);
        frame.add_saved_register(crate::x64::registers::R13);
        assert_eq!(frame.saved_registers.len(), 3);

        frame.allocate_spill_slot(8);
        frame.calculate_frame_size();
        // 24 bytes pushed + 8 spill = 32
        assert_eq!(frame.frame_size, 8);
    }

    #[test]
    fn test_sysv_enter_leave_mirror() {
        let arena = Bump::new();
        let mut frame = FunctionFrame::new(&arena);
        frame.add_saved_register(RBX);
        frame.add_saved_register(R12);
        let context = SysVFrameContext::new(frame);

        let mut crb = CompilationResultBuilder::new(&context);
        context.enter(&mut crb);
        context.leave(&mut crb);
        let lines: Vec<&str> = crb.lines().iter().map(|l| l.trim()).collect();
        assert_eq!(
            lines,
            vec!["push rbp", "mov rbp, rsp", "push rbx", "push r12", "pop r12", "pop rbx", "pop rbp"]
        );
    }

    #[test]
    fn test_leaf_frame() {
        let context = LeafFrameContext::new(20);
        let mut crb = CompilationResultBuilder::new(&context);
        context.enter(&mut crb);
        context.leave(&mut crb);
        let lines: Vec<&str> = crb.lines().iter().map(|l| l.trim()).collect();
        assert_eq!(lines, vec!["sub rsp, 32", "add rsp, 32"]);
    }
}

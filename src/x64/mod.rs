//! x86-64 architecture-specific components.
//!
//! This module contains all x86-64 specific code:
//! - Register names and Intel-syntax operand rendering
//! - System V calling convention implementation
//! - Frame layout and the frame contexts epilogues tear down through
//! - LIR operations and the `LirGenerator` implementation

pub mod calling_convention;
pub mod frame;
pub mod generator;
pub mod lir_ops;
pub mod registers;

pub use calling_convention::{CCAssigner, CCAssignment, SysVAssigner};
pub use frame::{FrameStyle, FunctionFrame, LeafFrameContext, SysVFrameContext};
pub use generator::X64LirGenerator;
pub use lir_ops::{BinaryOpcode, CallTarget, X64BinaryOp, X64CallOp, X64MoveOp, X64ReturnOp};

//! Architecture-neutral LIR operations.

use super::{CompilationResultBuilder, LirOp, Value};
use crate::core::CompileResult;
use std::fmt;

/// Block label.
#[derive(Debug, Clone)]
pub struct LabelOp {
    name: String,
}

impl LabelOp {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }

    pub fn label(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for LabelOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.name)
    }
}

impl LirOp for LabelOp {
    fn name(&self) -> &'static str {
        "label"
    }

    fn is_label(&self) -> bool {
        true
    }

    fn emit(&self, crb: &mut CompilationResultBuilder<'_>) -> CompileResult<()> {
        crb.bind_label(&self.name);
        Ok(())
    }
}

/// Value selected by predecessor. Resolved into moves by the allocator.
#[derive(Debug, Clone)]
pub struct PhiOp {
    result: Value,
    inputs: Vec<Value>,
}

impl PhiOp {
    pub fn new(result: Value, inputs: Vec<Value>) -> Self {
        Self { result, inputs }
    }
}

impl fmt::Display for PhiOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inputs: Vec<String> = self.inputs.iter().map(|v| v.to_string()).collect();
        write!(f, "{} = phi [{}]", self.result, inputs.join(", "))
    }
}

impl LirOp for PhiOp {
    fn name(&self) -> &'static str {
        "phi"
    }

    fn defs(&self) -> Vec<Value> {
        vec![self.result]
    }

    fn uses(&self) -> Vec<Value> {
        self.inputs.clone()
    }

    // Phis produce no code of their own.
    fn emit(&self, crb: &mut CompilationResultBuilder<'_>) -> CompileResult<()> {
        crb.comment(&self.to_string());
        Ok(())
    }
}

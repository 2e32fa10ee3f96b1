// This module defines the job-level error type for graft using the thiserror crate.
// CompileError covers the conditions that abandon a compilation job: a node kind the
// backend cannot lower, a graph whose edges or anchors are inconsistent, an inlining
// request that cannot be satisfied, a schedule that cannot be built, and instruction
// streams that break the epilogue placement rule. Recoverable "nothing to do" outcomes
// (no canonicalization rule applies, no intrinsic matches) are never errors; they are
// ordinary return values. Contract violations inside the graph model are assertions.

//! Error types for the graft compiler.
//!
//! Using thiserror for more idiomatic error handling.

use crate::ir::NodeId;
use thiserror::Error;

/// Main error type for a compilation job.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("No lowering capability for {op} node {node}")]
    NoLoweringCapability {
        node: NodeId,
        op: &'static str,
    },

    #[error("Malformed graph: {reason}")]
    MalformedGraph {
        reason: String,
    },

    #[error("Inlining failed: {reason}")]
    Inlining {
        reason: String,
    },

    #[error("Scheduling failed: {reason}")]
    Scheduling {
        reason: String,
    },

    #[error("Invalid instruction stream: {reason}")]
    InvalidLir {
        reason: String,
    },

    #[error("Operand for node {node} requested before it was lowered")]
    MissingOperand {
        node: NodeId,
    },
}

impl CompileError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedGraph { reason: reason.into() }
    }
}

/// Result type alias for compile operations.
pub type CompileResult<T> = Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CompileError::NoLoweringCapability {
            node: NodeId::new(7),
            op: "Mystery",
        };
        assert_eq!(err.to_string(), "No lowering capability for Mystery node n7");

        let err = CompileError::malformed("dangling edge");
        assert_eq!(err.to_string(), "Malformed graph: dangling edge");
    }
}

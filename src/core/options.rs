//! Compiler configuration.
//!
//! A plain options struct handed to every phase through the
//! [`PhaseContext`](crate::phases::PhaseContext). The `graftc` binary maps its
//! command line flags onto these fields.

/// Knobs controlling a compilation job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Global gate for canonicalization, including the re-run after
    /// intrinsification.
    pub opt_canonicalizer: bool,
    /// Replace `System.arraycopy` calls with kind-specialized snippets.
    pub intrinsify_array_copy: bool,
    /// Upper bound on canonicalizer worklist pops per run.
    pub max_canonicalizer_iterations: usize,
    /// Check edge and usage consistency after every phase.
    pub verify_graphs: bool,
    /// Collect per-phase timing in the session statistics.
    pub collect_timing: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            opt_canonicalizer: true,
            intrinsify_array_copy: true,
            max_canonicalizer_iterations: 10_000,
            verify_graphs: cfg!(debug_assertions),
            collect_timing: true,
        }
    }
}

impl CompilerOptions {
    /// Options with every optimization switched off.
    pub fn unoptimized() -> Self {
        Self {
            opt_canonicalizer: false,
            intrinsify_array_copy: false,
            ..Default::default()
        }
    }

    pub fn with_canonicalizer(mut self, enabled: bool) -> Self {
        self.opt_canonicalizer = enabled;
        self
    }

    pub fn with_array_copy_intrinsics(mut self, enabled: bool) -> Self {
        self.intrinsify_array_copy = enabled;
        self
    }

    pub fn with_max_canonicalizer_iterations(mut self, limit: usize) -> Self {
        self.max_canonicalizer_iterations = limit;
        self
    }

    pub fn with_verification(mut self, enabled: bool) -> Self {
        self.verify_graphs = enabled;
        self
    }

    pub fn with_timing(mut self, enabled: bool) -> Self {
        self.collect_timing = enabled;
        self
    }
}

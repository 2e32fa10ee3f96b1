//! Snippets: precompiled graphs substituted for generic operations.
//!
//! A snippet is an ordinary [`Graph`] built once, ahead of any compilation
//! job, and handed out by resolved method identity through a
//! [`GraphProvider`]. Providers are read-only after construction and shared
//! by every job.

pub mod array_copy;

pub use array_copy::{array_copy_snippet_descriptor, SnippetLibrary, ARRAY_COPY_KINDS, ARRAY_COPY_SNIPPETS};

use crate::ir::Graph;
use crate::meta::MethodId;
use std::sync::Arc;

/// Source of prebuilt graphs for resolved methods.
pub trait GraphProvider: Send + Sync {
    /// The graph implementing `method`, if one was built.
    fn graph_for(&self, method: MethodId) -> Option<Arc<Graph>>;
}

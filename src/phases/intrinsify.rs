// This module implements the array copy intrinsification phase. At construction it asks
// the resolution oracle for System.arraycopy and for the array copy snippet of every
// element kind, and fetches each snippet's graph from the provider. Anything that fails to
// resolve is logged as an error and left out of the table; the phase then simply finds no
// match for that kind. Per run it looks at every invoke of System.arraycopy, reads the
// static array types of the source and destination arguments from their stamps, and picks
// a snippet: equal component types select that component's kind, and a reference
// component that is a subtype of the destination's reference component selects the
// reference snippet. Anything else leaves the call alone. Selected calls are replaced by
// inlining the snippet graph. A run with at least one hit re-runs the canonicalizer when
// canonicalization is enabled; a run without hits never touches the graph.

//! Snippet-based `System.arraycopy` intrinsification.

use super::{inline, CanonicalizerPhase, Phase, PhaseContext};
use crate::core::CompileResult;
use crate::ir::{Graph, InvokeNode, MethodCallTargetNode, NodeId};
use crate::meta::{Kind, MethodDescriptor, MethodId, ResolutionOracle, TypeId};
use crate::snippets::{array_copy_snippet_descriptor, GraphProvider, ARRAY_COPY_KINDS};
use hashbrown::HashMap;
use log::{debug, error, info};
use std::sync::Arc;

/// Declaring class of the intrinsified operation.
pub const SYSTEM_CLASS: &str = "Ljava/lang/System;";
/// Signature of `System.arraycopy(Object, int, Object, int, int)`.
pub const ARRAY_COPY_SIGNATURE: &str = "(Ljava/lang/Object;ILjava/lang/Object;II)V";

/// Replaces `System.arraycopy` calls with kind-specialized snippets.
pub struct IntrinsifyArrayCopyPhase {
    oracle: Arc<dyn ResolutionOracle>,
    target: Option<MethodId>,
    snippets: HashMap<Kind, Arc<Graph>>,
}

impl IntrinsifyArrayCopyPhase {
    /// Resolve the intrinsified method and every snippet up front.
    pub fn new(oracle: Arc<dyn ResolutionOracle>, provider: &dyn GraphProvider) -> Self {
        let descriptor = MethodDescriptor::new(SYSTEM_CLASS, "arraycopy", ARRAY_COPY_SIGNATURE);
        let target = oracle.resolve_method(&descriptor, None);
        if target.is_none() {
            error!("could not resolve {}; array copy intrinsification disabled", descriptor);
        }

        let mut snippets = HashMap::new();
        for kind in ARRAY_COPY_KINDS {
            let descriptor = array_copy_snippet_descriptor(kind);
            let Some(method) = oracle.resolve_method(&descriptor, None) else {
                error!("could not resolve array copy snippet {}", descriptor);
                continue;
            };
            match provider.graph_for(method) {
                Some(graph) => {
                    snippets.insert(kind, graph);
                }
                None => error!("no graph for array copy snippet {}", oracle.method_name(method)),
            }
        }
        debug!(
            "array copy intrinsics: {} of {} snippets available",
            snippets.len(),
            ARRAY_COPY_KINDS.len()
        );

        Self { oracle, target, snippets }
    }

    /// Whether the intrinsified method resolved.
    pub fn is_enabled(&self) -> bool {
        self.target.is_some()
    }

    /// Kinds with a snippet in the table.
    pub fn available_kinds(&self) -> Vec<Kind> {
        let mut kinds: Vec<Kind> = self.snippets.keys().copied().collect();
        kinds.sort();
        kinds
    }

    fn array_type(graph: &Graph, node: NodeId) -> Option<TypeId> {
        graph.stamp(node).as_object().and_then(|stamp| stamp.ty)
    }

    /// Snippet kind for copying from `src` arrays into `dest` arrays.
    pub fn select_kind(&self, src: TypeId, dest: TypeId) -> Option<Kind> {
        let src_component = self.oracle.component_type(src)?;
        let dest_component = self.oracle.component_type(dest)?;
        if src_component == dest_component {
            return Some(self.oracle.kind(src_component));
        }
        let references = self.oracle.kind(src_component) == Kind::Object
            && self.oracle.kind(dest_component) == Kind::Object;
        if references && self.oracle.is_subtype_of(src_component, dest_component) {
            return Some(Kind::Object);
        }
        None
    }

    /// Snippet replacing `invoke`, if it is an intrinsifiable copy.
    fn snippet_for(&self, graph: &Graph, invoke: NodeId, target: MethodId) -> Option<(Kind, Arc<Graph>)> {
        let call_target = InvokeNode::call_target(graph, invoke);
        let method = graph.op_as::<MethodCallTargetNode>(call_target)?;
        if method.target() != target {
            return None;
        }
        let args = MethodCallTargetNode::arguments(graph, call_target);
        if args.len() != 5 {
            return None;
        }
        let src = Self::array_type(graph, args[0])?;
        let dest = Self::array_type(graph, args[2])?;
        let kind = self.select_kind(src, dest)?;
        let snippet = self.snippets.get(&kind)?;
        Some((kind, snippet.clone()))
    }
}

impl Phase for IntrinsifyArrayCopyPhase {
    fn name(&self) -> &'static str {
        "IntrinsifyArrayCopy"
    }

    fn run(&self, graph: &mut Graph, context: &PhaseContext<'_, '_>) -> CompileResult<bool> {
        let Some(target) = self.target else {
            return Ok(false);
        };

        let candidates: Vec<(NodeId, Kind, Arc<Graph>)> = graph
            .nodes_of::<InvokeNode>()
            .into_iter()
            .filter_map(|invoke| {
                self.snippet_for(graph, invoke, target)
                    .map(|(kind, snippet)| (invoke, kind, snippet))
            })
            .collect();
        if candidates.is_empty() {
            return Ok(false);
        }

        for (invoke, kind, snippet) in &candidates {
            inline(graph, *invoke, snippet)?;
            info!("intrinsify arraycopy ({})", kind);
            context.session.record_snippet_inlined();
        }

        if context.options.opt_canonicalizer {
            CanonicalizerPhase::new().apply(graph, context)?;
        }
        Ok(true)
    }
}

// This module builds the kind-specialized array copy snippets. For each of the eight
// element kinds (the seven non-boolean primitives and references) it declares a static
// method on the snippet holder class with the `(T[] src, int srcPos, T[] dest, int
// destPos, int length)` shape, registers it with the in-memory universe so the oracle can
// resolve it, and builds its graph: five parameters, with the two array parameters
// narrowed to the kind's array type, feeding one ArrayCopy node of that kind followed by
// a void return. The library maps each resolved method to its graph.

//! Array copy snippets.

use super::GraphProvider;
use crate::ir::{Graph, Stamp};
use crate::meta::{array_descriptor, Kind, MethodDescriptor, MethodId, TypeId, Universe};
use hashbrown::HashMap;
use log::debug;
use std::sync::Arc;

/// Holder class declaring the array copy snippets.
pub const ARRAY_COPY_SNIPPETS: &str = "Lgraft/snippets/ArrayCopySnippets;";

/// Element kinds with a specialized snippet.
pub const ARRAY_COPY_KINDS: [Kind; 8] = [
    Kind::Byte,
    Kind::Char,
    Kind::Short,
    Kind::Int,
    Kind::Long,
    Kind::Float,
    Kind::Double,
    Kind::Object,
];

const ARRAY_COPY_SIGNATURE: [Kind; 5] = [Kind::Object, Kind::Int, Kind::Object, Kind::Int, Kind::Int];

/// Declared descriptor of the snippet copying `kind` elements.
pub fn array_copy_snippet_descriptor(kind: Kind) -> MethodDescriptor {
    let array = array_descriptor(kind);
    MethodDescriptor::new(
        ARRAY_COPY_SNIPPETS,
        "arraycopy",
        &format!("({}I{}II)V", array, array),
    )
}

fn build_array_copy_snippet(kind: Kind, array: Option<TypeId>) -> Graph {
    let name = format!("ArrayCopySnippets.arraycopy_{}", kind.java_name().to_ascii_lowercase());
    let mut graph = Graph::new(&name, &ARRAY_COPY_SIGNATURE);
    let array_stamp = Stamp::object(array, false, false);
    let src = graph.parameter_with_stamp(0, array_stamp);
    let src_pos = graph.parameter(1);
    let dest = graph.parameter_with_stamp(2, array_stamp);
    let dest_pos = graph.parameter(3);
    let length = graph.parameter(4);
    let copy = graph.add_array_copy(graph.start(), kind, [src, src_pos, dest, dest_pos, length]);
    graph.add_return(copy, None);
    graph
}

/// Prebuilt snippet graphs keyed by resolved method.
#[derive(Debug, Default, Clone)]
pub struct SnippetLibrary {
    graphs: HashMap<MethodId, Arc<Graph>>,
    array_copy: HashMap<Kind, MethodId>,
}

impl SnippetLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the array copy snippets in `universe` and build their graphs.
    pub fn install_array_copy(universe: &mut Universe) -> Self {
        let holder = universe.add_class(ARRAY_COPY_SNIPPETS, None);
        let mut library = Self::new();
        for kind in ARRAY_COPY_KINDS {
            let descriptor = array_copy_snippet_descriptor(kind);
            let method = universe.add_method(holder, &descriptor.name, &descriptor.signature);
            let graph = build_array_copy_snippet(kind, universe.array_for_kind(kind));
            library.register(method, graph);
            library.array_copy.insert(kind, method);
        }
        debug!("built {} array copy snippets", library.array_copy.len());
        library
    }

    /// Make `graph` the implementation of `method`.
    pub fn register(&mut self, method: MethodId, graph: Graph) {
        self.graphs.insert(method, Arc::new(graph));
    }

    /// Method of the array copy snippet for `kind`.
    pub fn array_copy_method(&self, kind: Kind) -> Option<MethodId> {
        self.array_copy.get(&kind).copied()
    }

    pub fn len(&self) -> usize {
        self.graphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.is_empty()
    }
}

impl GraphProvider for SnippetLibrary {
    fn graph_for(&self, method: MethodId) -> Option<Arc<Graph>> {
        self.graphs.get(&method).cloned()
    }
}

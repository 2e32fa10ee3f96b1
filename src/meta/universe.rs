//! In-memory resolution oracle.
//!
//! `Universe` is populated once up front (types, array types, methods) and is
//! immutable afterwards, which makes it trivially safe to share between
//! compilation jobs behind an `Arc`.

use super::{oracle::ResolutionOracle, Kind, MethodDescriptor, MethodId, TypeId};
use std::collections::HashMap;

const OBJECT: &str = "Ljava/lang/Object;";

#[derive(Debug, Clone)]
struct TypeEntry {
    name: String,
    kind: Kind,
    superclass: Option<TypeId>,
    component: Option<TypeId>,
    array: Option<TypeId>,
}

#[derive(Debug, Clone)]
struct MethodEntry {
    holder: TypeId,
    name: String,
    signature: String,
}

/// A small, closed world of resolved types and methods.
#[derive(Debug, Clone, Default)]
pub struct Universe {
    types: Vec<TypeEntry>,
    by_name: HashMap<String, TypeId>,
    methods: Vec<MethodEntry>,
    method_index: HashMap<(TypeId, String, String), MethodId>,
}

impl Universe {
    /// Create an empty universe.
    pub fn new() -> Self {
        Self::default()
    }

    /// Universe holding the primitive types, a handful of `java.lang`
    /// classes, their one-dimensional array types and
    /// `System.arraycopy(Object, int, Object, int, int)`.
    pub fn with_java_core() -> Self {
        let mut universe = Self::new();
        for kind in Kind::ELEMENT_KINDS.iter().copied().filter(|k| k.is_primitive()) {
            let ty = universe.add_type(&kind.type_char().to_string(), kind, None);
            universe.array_of(ty);
        }
        universe.add_type("V", Kind::Void, None);

        let object = universe.add_class(OBJECT, None);
        universe.array_of(object);
        let number = universe.add_class("Ljava/lang/Number;", Some(object));
        universe.array_of(number);
        let integer = universe.add_class("Ljava/lang/Integer;", Some(number));
        universe.array_of(integer);
        let string = universe.add_class("Ljava/lang/String;", Some(object));
        universe.array_of(string);

        let system = universe.add_class("Ljava/lang/System;", Some(object));
        universe.add_method(system, "arraycopy", "(Ljava/lang/Object;ILjava/lang/Object;II)V");
        universe
    }

    fn add_type(&mut self, name: &str, kind: Kind, superclass: Option<TypeId>) -> TypeId {
        if let Some(&existing) = self.by_name.get(name) {
            return existing;
        }
        let id = TypeId::new(self.types.len() as u32);
        self.types.push(TypeEntry {
            name: name.to_string(),
            kind,
            superclass,
            component: None,
            array: None,
        });
        self.by_name.insert(name.to_string(), id);
        id
    }

    /// Register a class. Registering an existing name returns its handle.
    pub fn add_class(&mut self, name: &str, superclass: Option<TypeId>) -> TypeId {
        let superclass = superclass.or_else(|| {
            if name == OBJECT {
                None
            } else {
                self.by_name.get(OBJECT).copied()
            }
        });
        self.add_type(name, Kind::Object, superclass)
    }

    /// Array type with `component` elements, created on first request.
    pub fn array_of(&mut self, component: TypeId) -> TypeId {
        if let Some(array) = self.types[component.index()].array {
            return array;
        }
        let name = format!("[{}", self.types[component.index()].name);
        let object = self.by_name.get(OBJECT).copied();
        let array = self.add_type(&name, Kind::Object, object);
        self.types[array.index()].component = Some(component);
        self.types[component.index()].array = Some(array);
        array
    }

    /// Register a method on `holder`.
    pub fn add_method(&mut self, holder: TypeId, name: &str, signature: &str) -> MethodId {
        let key = (holder, name.to_string(), signature.to_string());
        if let Some(&existing) = self.method_index.get(&key) {
            return existing;
        }
        let id = MethodId::new(self.methods.len() as u32);
        self.methods.push(MethodEntry {
            holder,
            name: name.to_string(),
            signature: signature.to_string(),
        });
        self.method_index.insert(key, id);
        id
    }

    /// Convenience lookup without an accessing context.
    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    /// Array type for elements of a primitive `kind`, or `Object[]`.
    pub fn array_for_kind(&self, kind: Kind) -> Option<TypeId> {
        let element = match kind {
            Kind::Object => OBJECT.to_string(),
            other => other.type_char().to_string(),
        };
        self.lookup(&element).and_then(|ty| self.types[ty.index()].array)
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }
}

impl ResolutionOracle for Universe {
    fn resolve_type(&self, name: &str, _accessing: Option<TypeId>) -> Option<TypeId> {
        self.lookup(name)
    }

    fn resolve_method(&self, descriptor: &MethodDescriptor, accessing: Option<TypeId>) -> Option<MethodId> {
        let holder = self.resolve_type(&descriptor.holder, accessing)?;
        let key = (holder, descriptor.name.clone(), descriptor.signature.clone());
        self.method_index.get(&key).copied()
    }

    fn type_name(&self, ty: TypeId) -> &str {
        &self.types[ty.index()].name
    }

    fn component_type(&self, ty: TypeId) -> Option<TypeId> {
        self.types[ty.index()].component
    }

    fn array_type(&self, ty: TypeId) -> Option<TypeId> {
        self.types[ty.index()].array
    }

    fn kind(&self, ty: TypeId) -> Kind {
        self.types[ty.index()].kind
    }

    fn is_subtype_of(&self, sub: TypeId, sup: TypeId) -> bool {
        if sub == sup {
            return true;
        }
        if self.kind(sub).is_primitive() || self.kind(sup).is_primitive() {
            return false;
        }
        match (self.component_type(sub), self.component_type(sup)) {
            (Some(sub_elem), Some(sup_elem)) => {
                !self.kind(sub_elem).is_primitive()
                    && !self.kind(sup_elem).is_primitive()
                    && self.is_subtype_of(sub_elem, sup_elem)
            }
            (Some(_), None) => self.types[sup.index()].name == OBJECT,
            (None, Some(_)) => false,
            (None, None) => {
                let mut current = self.types[sub.index()].superclass;
                while let Some(ty) = current {
                    if ty == sup {
                        return true;
                    }
                    current = self.types[ty.index()].superclass;
                }
                false
            }
        }
    }

    fn method_name(&self, method: MethodId) -> String {
        let entry = &self.methods[method.index()];
        format!(
            "{}.{}{}",
            self.unqualified_name(entry.holder),
            entry.name,
            entry.signature
        )
    }
}

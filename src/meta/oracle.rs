// This module defines the ResolutionOracle trait, the bridge between graft and whatever
// runtime owns symbolic type and method information. The compiler only ever asks
// questions: resolve a declared type or method relative to an accessing type, and query
// a resolved type for its internal name, component type, array type, kind and subtype
// relation. Implementations must tolerate concurrent readers because one oracle is
// shared by every compilation job; graft never mutates it.

//! Resolution oracle responsibilities.
//!
//! The oracle plays the role of a runtime's metadata layer. It hands out
//! [`TypeId`] and [`MethodId`] handles that are stable for the lifetime of
//! the oracle, so the compiler can use them as map keys.

use super::{Kind, MethodDescriptor, MethodId, TypeId};

/// Read-only view of the runtime's resolved types and methods.
pub trait ResolutionOracle: Send + Sync {
    /// Resolve a type by internal name (`I`, `[J`, `Ljava/lang/Object;`).
    fn resolve_type(&self, name: &str, accessing: Option<TypeId>) -> Option<TypeId>;

    /// Resolve a declared method. `None` means unresolved.
    fn resolve_method(&self, descriptor: &MethodDescriptor, accessing: Option<TypeId>) -> Option<MethodId>;

    /// Internal name of a resolved type.
    fn type_name(&self, ty: TypeId) -> &str;

    /// Component type for arrays, `None` otherwise.
    fn component_type(&self, ty: TypeId) -> Option<TypeId>;

    /// Array type whose components are `ty`, if the oracle knows it.
    fn array_type(&self, ty: TypeId) -> Option<TypeId>;

    /// Kind classification of a type.
    fn kind(&self, ty: TypeId) -> Kind;

    /// Whether `sub` is assignable to `sup`.
    fn is_subtype_of(&self, sub: TypeId, sup: TypeId) -> bool;

    /// Human readable name of a method, for diagnostics.
    fn method_name(&self, method: MethodId) -> String;

    fn is_array(&self, ty: TypeId) -> bool {
        self.component_type(ty).is_some()
    }

    /// Unqualified name: `Ljava/lang/Object;` becomes `Object`.
    fn unqualified_name(&self, ty: TypeId) -> String {
        let name = self.type_name(ty);
        let name = match name.rfind('/') {
            Some(pos) => &name[pos + 1..],
            None => name,
        };
        name.strip_suffix(';').unwrap_or(name).to_string()
    }
}

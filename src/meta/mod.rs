//! Resolved type and method identities.
//!
//! The compiler never owns type information. It asks a
//! [`ResolutionOracle`] for stable identities and treats them as opaque,
//! hashable handles. [`Universe`] is an in-memory oracle used by the driver
//! binary and by tests.

pub mod oracle;
pub mod universe;

pub use oracle::ResolutionOracle;
pub use universe::Universe;

use std::fmt;

/// Classification of a type as seen by the compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
    Object,
    Void,
}

impl Kind {
    /// Every kind an array element can have.
    pub const ELEMENT_KINDS: [Kind; 9] = [
        Kind::Boolean,
        Kind::Byte,
        Kind::Short,
        Kind::Char,
        Kind::Int,
        Kind::Long,
        Kind::Float,
        Kind::Double,
        Kind::Object,
    ];

    pub fn is_primitive(self) -> bool {
        !matches!(self, Kind::Object | Kind::Void)
    }

    pub fn is_numeric_integer(self) -> bool {
        matches!(self, Kind::Byte | Kind::Short | Kind::Char | Kind::Int | Kind::Long)
    }

    pub fn is_float(self) -> bool {
        matches!(self, Kind::Float | Kind::Double)
    }

    /// Storage width in bits. References are 64-bit.
    pub fn bits(self) -> u32 {
        match self {
            Kind::Boolean | Kind::Byte => 8,
            Kind::Short | Kind::Char => 16,
            Kind::Int | Kind::Float => 32,
            Kind::Long | Kind::Double | Kind::Object => 64,
            Kind::Void => 0,
        }
    }

    /// Kind used for a value of this kind once loaded into an operand.
    /// Sub-word integers widen to `Int`.
    pub fn stack_kind(self) -> Kind {
        match self {
            Kind::Boolean | Kind::Byte | Kind::Short | Kind::Char => Kind::Int,
            other => other,
        }
    }

    /// Descriptor character (`I`, `J`, `L`, ...).
    pub fn type_char(self) -> char {
        match self {
            Kind::Boolean => 'Z',
            Kind::Byte => 'B',
            Kind::Short => 'S',
            Kind::Char => 'C',
            Kind::Int => 'I',
            Kind::Long => 'J',
            Kind::Float => 'F',
            Kind::Double => 'D',
            Kind::Object => 'L',
            Kind::Void => 'V',
        }
    }

    pub fn java_name(self) -> &'static str {
        match self {
            Kind::Boolean => "boolean",
            Kind::Byte => "byte",
            Kind::Short => "short",
            Kind::Char => "char",
            Kind::Int => "int",
            Kind::Long => "long",
            Kind::Float => "float",
            Kind::Double => "double",
            Kind::Object => "Object",
            Kind::Void => "void",
        }
    }

    /// Parse a user-facing kind name (`int`, `object`, ...).
    pub fn from_name(name: &str) -> Option<Kind> {
        let kind = match name.to_ascii_lowercase().as_str() {
            "boolean" => Kind::Boolean,
            "byte" => Kind::Byte,
            "short" => Kind::Short,
            "char" => Kind::Char,
            "int" => Kind::Int,
            "long" => Kind::Long,
            "float" => Kind::Float,
            "double" => Kind::Double,
            "object" | "reference" => Kind::Object,
            "void" => Kind::Void,
            _ => return None,
        };
        Some(kind)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.java_name())
    }
}

/// Resolved type handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Resolved method handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodId(u32);

impl MethodId {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// Declared method signature, in internal descriptor form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    /// Holder type, e.g. `Ljava/lang/System;`.
    pub holder: String,
    pub name: String,
    /// Parameter and return descriptor, e.g. `(Ljava/lang/Object;I)V`.
    pub signature: String,
}

impl MethodDescriptor {
    pub fn new(holder: &str, name: &str, signature: &str) -> Self {
        Self {
            holder: holder.to_string(),
            name: name.to_string(),
            signature: signature.to_string(),
        }
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}{}", self.holder, self.name, self.signature)
    }
}

/// Descriptor of a one-dimensional array whose elements have `kind`.
///
/// Reference arrays use `Object` as their element type.
pub fn array_descriptor(kind: Kind) -> String {
    match kind {
        Kind::Object => "[Ljava/lang/Object;".to_string(),
        other => format!("[{}", other.type_char()),
    }
}

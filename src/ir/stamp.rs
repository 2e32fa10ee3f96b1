//! Stamps: abstract descriptions of the values a node can produce.
//!
//! Integer stamps track known bits with a pair of masks: `down_mask` holds
//! bits that are definitely set, `up_mask` bits that may be set. A stamp is
//! constant when both masks agree. Object stamps carry an optional resolved
//! type plus exactness and nullness facts.
//!
//! Two lattice operations are provided:
//! - [`Stamp::meet`] describes every value either input may hold (used by
//!   phis, always at least as general as both inputs).
//! - [`Stamp::join`] describes values satisfying both inputs (used when a
//!   re-inferred stamp is folded into the current one, so stamps only narrow).

use crate::meta::{Kind, TypeId};
use std::fmt;

/// Known-bits description of an integer value of a fixed width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntegerStamp {
    bits: u32,
    down_mask: u64,
    up_mask: u64,
}

impl IntegerStamp {
    /// All-ones mask for a bit width.
    pub fn default_mask(bits: u32) -> u64 {
        assert!(bits > 0 && bits <= 64, "invalid integer width {bits}");
        if bits == 64 {
            u64::MAX
        } else {
            (1u64 << bits) - 1
        }
    }

    /// Stamp that admits every value of the width.
    pub fn unrestricted(bits: u32) -> Self {
        Self {
            bits,
            down_mask: 0,
            up_mask: Self::default_mask(bits),
        }
    }

    /// Stamp for exactly one value. Bits above the width are dropped.
    pub fn for_constant(bits: u32, raw: u64) -> Self {
        let value = raw & Self::default_mask(bits);
        Self {
            bits,
            down_mask: value,
            up_mask: value,
        }
    }

    pub fn with_masks(bits: u32, down_mask: u64, up_mask: u64) -> Self {
        let mask = Self::default_mask(bits);
        assert!(down_mask & !up_mask & mask == 0, "down mask must be a subset of up mask");
        Self {
            bits,
            down_mask: down_mask & mask,
            up_mask: up_mask & mask,
        }
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn down_mask(&self) -> u64 {
        self.down_mask
    }

    pub fn up_mask(&self) -> u64 {
        self.up_mask
    }

    pub fn mask(&self) -> u64 {
        Self::default_mask(self.bits)
    }

    pub fn is_constant(&self) -> bool {
        self.down_mask == self.up_mask
    }

    pub fn as_constant(&self) -> Option<u64> {
        self.is_constant().then_some(self.down_mask)
    }

    /// Bits whose value is known either way.
    fn known_bits(&self) -> u64 {
        (self.down_mask | !self.up_mask) & self.mask()
    }

    fn check_width(&self, other: &IntegerStamp) {
        assert_eq!(
            self.bits, other.bits,
            "integer stamps of different widths combined"
        );
    }

    pub fn or(&self, other: &IntegerStamp) -> IntegerStamp {
        self.check_width(other);
        Self {
            bits: self.bits,
            down_mask: self.down_mask | other.down_mask,
            up_mask: self.up_mask | other.up_mask,
        }
    }

    pub fn and(&self, other: &IntegerStamp) -> IntegerStamp {
        self.check_width(other);
        Self {
            bits: self.bits,
            down_mask: self.down_mask & other.down_mask,
            up_mask: self.up_mask & other.up_mask,
        }
    }

    pub fn xor(&self, other: &IntegerStamp) -> IntegerStamp {
        self.check_width(other);
        let known = self.known_bits() & other.known_bits();
        let value = (self.down_mask ^ other.down_mask) & known;
        Self {
            bits: self.bits,
            down_mask: value,
            up_mask: (value | !known) & self.mask(),
        }
    }

    pub fn add(&self, other: &IntegerStamp) -> IntegerStamp {
        self.check_width(other);
        match (self.as_constant(), other.as_constant()) {
            (Some(a), Some(b)) => Self::for_constant(self.bits, a.wrapping_add(b)),
            _ => Self::unrestricted(self.bits),
        }
    }

    /// Most precise stamp covering both inputs.
    pub fn meet(&self, other: &IntegerStamp) -> IntegerStamp {
        self.check_width(other);
        Self {
            bits: self.bits,
            down_mask: self.down_mask & other.down_mask,
            up_mask: self.up_mask | other.up_mask,
        }
    }

    /// Values described by both stamps, `None` when no value qualifies.
    pub fn join(&self, other: &IntegerStamp) -> Option<IntegerStamp> {
        self.check_width(other);
        let down_mask = self.down_mask | other.down_mask;
        let up_mask = self.up_mask & other.up_mask;
        if down_mask & !up_mask != 0 {
            return None;
        }
        Some(Self {
            bits: self.bits,
            down_mask,
            up_mask,
        })
    }
}

/// Type-hierarchy facts about a reference value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectStamp {
    /// Statically known type; `None` means `Object`.
    pub ty: Option<TypeId>,
    /// The value's type is exactly `ty`, not a subtype.
    pub exact: bool,
    pub non_null: bool,
}

impl ObjectStamp {
    pub fn unrestricted() -> Self {
        Self { ty: None, exact: false, non_null: false }
    }

    pub fn meet(&self, other: &ObjectStamp) -> ObjectStamp {
        let ty = if self.ty == other.ty { self.ty } else { None };
        ObjectStamp {
            ty,
            exact: ty.is_some() && self.exact && other.exact,
            non_null: self.non_null && other.non_null,
        }
    }

    /// Narrowing combination. Unrelated types cannot be proven without the
    /// oracle, so the current type wins.
    pub fn join(&self, other: &ObjectStamp) -> ObjectStamp {
        let (ty, exact) = match (self.ty, other.ty) {
            (None, _) => (other.ty, other.exact),
            (Some(_), None) => (self.ty, self.exact),
            (Some(a), Some(b)) if a == b => (self.ty, self.exact || other.exact),
            (Some(_), Some(_)) => (self.ty, self.exact),
        };
        ObjectStamp {
            ty,
            exact,
            non_null: self.non_null || other.non_null,
        }
    }
}

/// Abstract value domain attached to every node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stamp {
    /// No value (control and effect nodes).
    Void,
    /// Empty set of values; identity of `meet`.
    Illegal,
    Integer(IntegerStamp),
    Float { bits: u32 },
    Object(ObjectStamp),
}

impl Stamp {
    /// Unrestricted stamp for a value of `kind`.
    pub fn for_kind(kind: Kind) -> Stamp {
        match kind.stack_kind() {
            Kind::Int => Stamp::Integer(IntegerStamp::unrestricted(32)),
            Kind::Long => Stamp::Integer(IntegerStamp::unrestricted(64)),
            Kind::Float => Stamp::Float { bits: 32 },
            Kind::Double => Stamp::Float { bits: 64 },
            Kind::Object => Stamp::Object(ObjectStamp::unrestricted()),
            _ => Stamp::Void,
        }
    }

    pub fn int(bits: u32) -> Stamp {
        Stamp::Integer(IntegerStamp::unrestricted(bits))
    }

    pub fn int_constant(bits: u32, raw: u64) -> Stamp {
        Stamp::Integer(IntegerStamp::for_constant(bits, raw))
    }

    pub fn object(ty: Option<TypeId>, exact: bool, non_null: bool) -> Stamp {
        Stamp::Object(ObjectStamp { ty, exact, non_null })
    }

    /// Whether this stamp may describe a value-producing node.
    pub fn is_value(&self) -> bool {
        !matches!(self, Stamp::Void)
    }

    pub fn is_illegal(&self) -> bool {
        matches!(self, Stamp::Illegal)
    }

    pub fn as_integer(&self) -> Option<&IntegerStamp> {
        match self {
            Stamp::Integer(stamp) => Some(stamp),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectStamp> {
        match self {
            Stamp::Object(stamp) => Some(stamp),
            _ => None,
        }
    }

    /// Operand kind of a value with this stamp. Sub-word integer stamps keep
    /// their width as `Byte` or `Short`.
    pub fn kind(&self) -> Kind {
        match self {
            Stamp::Integer(s) if s.bits() > 32 => Kind::Long,
            Stamp::Integer(s) if s.bits() > 16 => Kind::Int,
            Stamp::Integer(s) if s.bits() > 8 => Kind::Short,
            Stamp::Integer(_) => Kind::Byte,
            Stamp::Float { bits: 64 } => Kind::Double,
            Stamp::Float { .. } => Kind::Float,
            Stamp::Object(_) => Kind::Object,
            Stamp::Void | Stamp::Illegal => Kind::Void,
        }
    }

    /// Least upper bound of two stamps.
    pub fn meet(&self, other: &Stamp) -> Stamp {
        match (self, other) {
            (Stamp::Illegal, s) | (s, Stamp::Illegal) => *s,
            (Stamp::Integer(a), Stamp::Integer(b)) => Stamp::Integer(a.meet(b)),
            (Stamp::Object(a), Stamp::Object(b)) => Stamp::Object(a.meet(b)),
            (Stamp::Float { bits: a }, Stamp::Float { bits: b }) if a == b => *self,
            (a, b) => panic!("cannot meet incompatible stamps {a} and {b}"),
        }
    }

    /// Meet over any number of stamps; `Illegal` for none.
    pub fn meet_all<'a>(stamps: impl IntoIterator<Item = &'a Stamp>) -> Stamp {
        stamps
            .into_iter()
            .fold(Stamp::Illegal, |acc, stamp| acc.meet(stamp))
    }

    /// Greatest lower bound of two stamps.
    pub fn join(&self, other: &Stamp) -> Stamp {
        match (self, other) {
            (Stamp::Illegal, _) | (_, Stamp::Illegal) => Stamp::Illegal,
            (Stamp::Integer(a), Stamp::Integer(b)) => {
                a.join(b).map(Stamp::Integer).unwrap_or(Stamp::Illegal)
            }
            (Stamp::Object(a), Stamp::Object(b)) => Stamp::Object(a.join(b)),
            (Stamp::Float { bits: a }, Stamp::Float { bits: b }) if a == b => *self,
            (Stamp::Void, Stamp::Void) => Stamp::Void,
            (a, b) => panic!("cannot join incompatible stamps {a} and {b}"),
        }
    }

    /// Narrow-only update: the joined stamp if it differs from `self`.
    pub fn try_improve(&self, inferred: &Stamp) -> Option<Stamp> {
        let joined = self.join(inferred);
        (joined != *self).then_some(joined)
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stamp::Void => f.write_str("void"),
            Stamp::Illegal => f.write_str("illegal"),
            Stamp::Integer(s) => match s.as_constant() {
                Some(value) => write!(f, "i{}[{:#x}]", s.bits(), value),
                None => write!(f, "i{}[{:#x}..{:#x}]", s.bits(), s.down_mask(), s.up_mask()),
            },
            Stamp::Float { bits } => write!(f, "f{}", bits),
            Stamp::Object(s) => {
                let ty = match s.ty {
                    Some(ty) => format!("t{}", ty.index()),
                    None => "Object".to_string(),
                };
                write!(
                    f,
                    "a{}{}{}",
                    if s.exact { "#" } else { "" },
                    ty,
                    if s.non_null { "!" } else { "" }
                )
            }
        }
    }
}

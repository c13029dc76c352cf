//! Coarse shape classification of runtime values.

use std::fmt;

/// Value kind - runtime classification of values.
///
/// Every [`crate::Value`] has exactly one kind, derived from its type.
/// `Invalid` is only reported for a named type that was declared but never defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Invalid,
    // === Primitives ===
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    // === Composites ===
    Pointer,
    Interface,
    Array,
    Slice,
    Map,
    Struct,
    // === Opaque references ===
    Func,
    Chan,
}

impl Kind {
    pub fn name(self) -> &'static str {
        match self {
            Kind::Invalid => "invalid",
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Int8 => "int8",
            Kind::Int16 => "int16",
            Kind::Int32 => "int32",
            Kind::Int64 => "int64",
            Kind::Uint => "uint",
            Kind::Uint8 => "uint8",
            Kind::Uint16 => "uint16",
            Kind::Uint32 => "uint32",
            Kind::Uint64 => "uint64",
            Kind::Float32 => "float32",
            Kind::Float64 => "float64",
            Kind::Complex64 => "complex64",
            Kind::Complex128 => "complex128",
            Kind::String => "string",
            Kind::Pointer => "ptr",
            Kind::Interface => "interface",
            Kind::Array => "array",
            Kind::Slice => "slice",
            Kind::Map => "map",
            Kind::Struct => "struct",
            Kind::Func => "func",
            Kind::Chan => "chan",
        }
    }

    #[inline]
    pub fn is_signed_int(self) -> bool {
        matches!(
            self,
            Kind::Int | Kind::Int8 | Kind::Int16 | Kind::Int32 | Kind::Int64
        )
    }

    #[inline]
    pub fn is_unsigned_int(self) -> bool {
        matches!(
            self,
            Kind::Uint | Kind::Uint8 | Kind::Uint16 | Kind::Uint32 | Kind::Uint64
        )
    }

    #[inline]
    pub fn is_float(self) -> bool {
        matches!(self, Kind::Float32 | Kind::Float64)
    }

    #[inline]
    pub fn is_complex(self) -> bool {
        matches!(self, Kind::Complex64 | Kind::Complex128)
    }

    /// Bool, numeric and string kinds: copying them by value already yields an
    /// independent result.
    #[inline]
    pub fn is_primitive(self) -> bool {
        self == Kind::Bool
            || self == Kind::String
            || self.is_signed_int()
            || self.is_unsigned_int()
            || self.is_float()
            || self.is_complex()
    }

    /// Kinds whose zero value is `nil`.
    #[inline]
    pub fn is_nilable(self) -> bool {
        matches!(
            self,
            Kind::Pointer | Kind::Interface | Kind::Slice | Kind::Map | Kind::Func | Kind::Chan
        )
    }

    /// Bit width of sized numeric kinds; `int`/`uint` are 64-bit.
    pub fn bits(self) -> Option<u32> {
        match self {
            Kind::Int8 | Kind::Uint8 => Some(8),
            Kind::Int16 | Kind::Uint16 => Some(16),
            Kind::Int32 | Kind::Uint32 | Kind::Float32 => Some(32),
            Kind::Int | Kind::Int64 | Kind::Uint | Kind::Uint64 | Kind::Float64 | Kind::Complex64 => {
                Some(64)
            }
            Kind::Complex128 => Some(128),
            _ => None,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

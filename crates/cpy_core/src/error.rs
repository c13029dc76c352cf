//! Errors raised while building types and values.

use crate::kind::Kind;
use std::fmt;

pub mod codes {
    pub const TYPE_MISMATCH: &str = "V0001";
    pub const REPR_MISMATCH: &str = "V0002";
    pub const FIELD_COUNT: &str = "V0003";
    pub const UNKNOWN_FIELD: &str = "V0004";
    pub const NOT_A_STRUCT: &str = "V0005";
    pub const NOT_COMPARABLE: &str = "V0006";
    pub const NOT_IMPLEMENTED: &str = "V0007";
    pub const NOT_AN_INTERFACE: &str = "V0008";
    pub const ARRAY_LENGTH: &str = "V0009";
    pub const UNDEFINED: &str = "V0010";
    pub const REDEFINED: &str = "V0011";
    pub const METHODS_ON_INTERFACE: &str = "V0012";
}

/// Ill-typed construction of a type or value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ValueError {
    TypeMismatch { expected: String, found: String },
    /// The representation does not fit the kind of the type.
    ReprMismatch { ty: String, kind: Kind },
    FieldCount { ty: String, expected: usize, found: usize },
    UnknownField { ty: String, field: String },
    NotAStruct { ty: String },
    NotComparable { ty: String },
    NotImplemented { ty: String, iface: String },
    NotAnInterface { ty: String },
    ArrayLength { ty: String, expected: usize, found: usize },
    Undefined { ty: String },
    Redefined { ty: String },
    MethodsOnInterface { ty: String },
}

impl ValueError {
    pub fn code(&self) -> &'static str {
        match self {
            ValueError::TypeMismatch { .. } => codes::TYPE_MISMATCH,
            ValueError::ReprMismatch { .. } => codes::REPR_MISMATCH,
            ValueError::FieldCount { .. } => codes::FIELD_COUNT,
            ValueError::UnknownField { .. } => codes::UNKNOWN_FIELD,
            ValueError::NotAStruct { .. } => codes::NOT_A_STRUCT,
            ValueError::NotComparable { .. } => codes::NOT_COMPARABLE,
            ValueError::NotImplemented { .. } => codes::NOT_IMPLEMENTED,
            ValueError::NotAnInterface { .. } => codes::NOT_AN_INTERFACE,
            ValueError::ArrayLength { .. } => codes::ARRAY_LENGTH,
            ValueError::Undefined { .. } => codes::UNDEFINED,
            ValueError::Redefined { .. } => codes::REDEFINED,
            ValueError::MethodsOnInterface { .. } => codes::METHODS_ON_INTERFACE,
        }
    }
}

impl fmt::Display for ValueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.code())?;
        match self {
            ValueError::TypeMismatch { expected, found } => {
                write!(f, "Type mismatch: expected {expected}, found {found}")
            }
            ValueError::ReprMismatch { ty, kind } => {
                write!(f, "Representation of kind {kind} does not fit type {ty}")
            }
            ValueError::FieldCount {
                ty,
                expected,
                found,
            } => write!(f, "Struct {ty} has {expected} fields, got {found}"),
            ValueError::UnknownField { ty, field } => {
                write!(f, "Struct {ty} has no field {field}")
            }
            ValueError::NotAStruct { ty } => write!(f, "Not a struct: {ty}"),
            ValueError::NotComparable { ty } => {
                write!(f, "Type {ty} is not comparable and cannot be a map key")
            }
            ValueError::NotImplemented { ty, iface } => {
                write!(f, "Type {ty} does not implement {iface}")
            }
            ValueError::NotAnInterface { ty } => write!(f, "Not an interface type: {ty}"),
            ValueError::ArrayLength {
                ty,
                expected,
                found,
            } => write!(f, "Array {ty} has length {expected}, got {found} elements"),
            ValueError::Undefined { ty } => write!(f, "Type {ty} is declared but not defined"),
            ValueError::Redefined { ty } => write!(f, "Type {ty} is already defined"),
            ValueError::MethodsOnInterface { ty } => {
                write!(f, "Interface type {ty} cannot declare receiver methods")
            }
        }
    }
}

impl std::error::Error for ValueError {}

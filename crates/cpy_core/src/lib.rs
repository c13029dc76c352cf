//! Core types for the cpy deep-copy engine.
//!
//! This crate contains the value model the copier operates on:
//! - `Kind` - Coarse shape classification of values
//! - `Type` - Type descriptors with nominal or structural identity and method sets
//! - `Value` - Typed runtime value with shared reference storage
//! - `MapKey` - Comparable value used as a map key
//! - `deep_equal` - Structural equality of values

pub mod equal;
pub mod error;
pub mod key;
pub mod kind;
pub mod types;
pub mod value;

pub use equal::{EqualOptions, deep_equal};
pub use error::ValueError;
pub use key::MapKey;
pub use kind::Kind;
pub use types::{Field, MethodSet, Named, Type, TypeDef};
pub use value::{ChanRef, Complex, FuncRef, MapRef, Ptr, Repr, SliceRef, Value};

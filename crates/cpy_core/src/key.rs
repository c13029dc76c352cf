//! Map keys.
//!
//! A key is any comparable value. Comparison follows value semantics for
//! primitives, arrays and structs, and identity for pointers and channels.
//! The hash is computed once when the key is built.

use crate::error::ValueError;
use crate::types::{Type, TypeDef};
use crate::value::{Repr, Value};
use std::fmt;
use std::hash::{Hash, Hasher};

#[derive(Clone)]
pub struct MapKey {
    hash: u64,
    value: Value,
}

impl MapKey {
    pub fn new(value: Value) -> Result<Self, ValueError> {
        if !is_comparable(&value) {
            return Err(ValueError::NotComparable {
                ty: comparable_culprit(&value).to_string(),
            });
        }
        let mut hasher = ahash::AHasher::default();
        hash_value(&value, &mut hasher);
        Ok(Self {
            hash: hasher.finish(),
            value,
        })
    }

    #[inline]
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    #[inline]
    pub fn get_hash(&self) -> u64 {
        self.hash
    }
}

/// Whether values of `ty` can be compared with `==`. Interface types are
/// comparable statically; the dynamic value is checked per key.
pub fn type_is_comparable(ty: &Type) -> bool {
    match ty.def() {
        TypeDef::Basic(_) | TypeDef::Pointer(_) | TypeDef::Chan(_) | TypeDef::Interface(_) => {
            true
        }
        TypeDef::Array(elem, _) => type_is_comparable(elem),
        TypeDef::Struct(fields) => fields.iter().all(|f| type_is_comparable(f.ty())),
        TypeDef::Undefined | TypeDef::Slice(_) | TypeDef::Map(..) | TypeDef::Func { .. } => false,
    }
}

fn is_comparable(v: &Value) -> bool {
    if !type_is_comparable(v.ty()) {
        return false;
    }
    match v.repr() {
        Repr::Interface(Some(inner)) => is_comparable(inner),
        Repr::Array(elems) | Repr::Struct(elems) => elems.iter().all(is_comparable),
        _ => true,
    }
}

fn comparable_culprit(v: &Value) -> &Type {
    match v.repr() {
        Repr::Interface(Some(inner)) if type_is_comparable(v.ty()) => comparable_culprit(inner),
        _ => v.ty(),
    }
}

fn hash_f64<H: Hasher>(f: f64, state: &mut H) {
    // -0.0 == 0.0
    let f = if f == 0.0 { 0.0 } else { f };
    state.write_u64(f.to_bits());
}

fn hash_value<H: Hasher>(v: &Value, state: &mut H) {
    match v.repr() {
        Repr::Invalid => state.write_u8(0),
        Repr::Bool(b) => state.write_u8(*b as u8 + 1),
        Repr::Int(i) => state.write_i64(*i),
        Repr::Uint(u) => state.write_u64(*u),
        Repr::Float(f) => hash_f64(*f, state),
        Repr::Complex(c) => {
            hash_f64(c.re, state);
            hash_f64(c.im, state);
        }
        Repr::Str(s) => s.as_bytes().hash(state),
        Repr::Pointer(p) => state.write_usize(p.as_ref().map_or(0, |p| p.addr())),
        Repr::Chan(c) => state.write_usize(c.as_ref().map_or(0, |c| c.addr())),
        Repr::Interface(None) => state.write_u8(0),
        Repr::Interface(Some(inner)) => {
            inner.ty().hash(state);
            hash_value(inner, state);
        }
        Repr::Array(elems) | Repr::Struct(elems) => {
            for e in elems.iter() {
                hash_value(e, state);
            }
        }
        // Not comparable; rejected by `MapKey::new`.
        Repr::Slice(_) | Repr::Map(_) | Repr::Func(_) => {}
    }
}

fn key_eq(a: &Value, b: &Value) -> bool {
    if a.ty() != b.ty() {
        return false;
    }
    match (a.repr(), b.repr()) {
        (Repr::Invalid, Repr::Invalid) => true,
        (Repr::Bool(x), Repr::Bool(y)) => x == y,
        (Repr::Int(x), Repr::Int(y)) => x == y,
        (Repr::Uint(x), Repr::Uint(y)) => x == y,
        (Repr::Float(x), Repr::Float(y)) => x == y,
        (Repr::Complex(x), Repr::Complex(y)) => x == y,
        (Repr::Str(x), Repr::Str(y)) => x == y,
        (Repr::Pointer(x), Repr::Pointer(y)) => match (x, y) {
            (None, None) => true,
            (Some(x), Some(y)) => x.ptr_eq(y),
            _ => false,
        },
        (Repr::Chan(x), Repr::Chan(y)) => match (x, y) {
            (None, None) => true,
            (Some(x), Some(y)) => x.ptr_eq(y),
            _ => false,
        },
        (Repr::Interface(x), Repr::Interface(y)) => match (x, y) {
            (None, None) => true,
            (Some(x), Some(y)) => key_eq(x, y),
            _ => false,
        },
        (Repr::Array(x), Repr::Array(y)) | (Repr::Struct(x), Repr::Struct(y)) => {
            x.len() == y.len() && x.iter().zip(y.iter()).all(|(x, y)| key_eq(x, y))
        }
        _ => false,
    }
}

impl PartialEq for MapKey {
    fn eq(&self, other: &Self) -> bool {
        // Fast path: different hash means different key
        if self.hash != other.hash {
            return false;
        }
        key_eq(&self.value, &other.value)
    }
}

// NaN keys never compare equal, so each NaN insert adds a new entry.
impl Eq for MapKey {}

impl Hash for MapKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl fmt::Debug for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MapKey({:?})", self.value)
    }
}

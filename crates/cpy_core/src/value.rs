//! Runtime value representation.
//!
//! A [`Value`] pairs a [`Type`] with a [`Repr`]. Reference kinds (pointers,
//! slices, maps, funcs, chans) point at shared storage with an observable
//! address, so `Value::clone` behaves like plain assignment: the clone shares
//! every reference cell with the original.

use crate::error::ValueError;
use crate::key::MapKey;
use crate::kind::Kind;
use crate::types::{Type, TypeDef};
use ahash::RandomState;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use indexmap::IndexMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub type FastIndexMap<K, V> = IndexMap<K, V, RandomState>;

pub fn fast_hasher() -> RandomState {
    RandomState::with_seeds(0, 0, 0, 0)
}

pub fn fast_map_with_capacity<K: Eq + Hash, V>(cap: usize) -> FastIndexMap<K, V> {
    IndexMap::with_capacity_and_hasher(cap, fast_hasher())
}

// ============================================================================
// Reference cells
// ============================================================================

/// Storage cell behind a non-nil pointer.
#[derive(Clone)]
pub struct Ptr(Arc<RwLock<Value>>);

impl Ptr {
    pub fn new(v: Value) -> Self {
        Self(Arc::new(RwLock::new(v)))
    }

    fn read(&self) -> RwLockReadGuard<'_, Value> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Value> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Plain copy of the pointee.
    pub fn load(&self) -> Value {
        self.read().clone()
    }

    /// Overwrite the pointee. The caller keeps `v`'s type identical to the
    /// pointer's element type; [`Value::set_elem`] is the checked variant.
    pub fn store(&self, v: Value) {
        *self.write() = v;
    }

    #[inline]
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Ptr) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Backing storage of a non-nil slice.
#[derive(Clone)]
pub struct SliceRef(Arc<RwLock<Vec<Value>>>);

impl SliceRef {
    pub fn new(elems: Vec<Value>) -> Self {
        Self(Arc::new(RwLock::new(elems)))
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Value>> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Value>> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn get(&self, i: usize) -> Option<Value> {
        self.read().get(i).cloned()
    }

    /// Plain copy of every element, in order.
    pub fn snapshot(&self) -> Vec<Value> {
        self.read().clone()
    }

    /// Replace every element. The caller keeps element types identical to the
    /// slice's element type.
    pub fn store(&self, elems: Vec<Value>) {
        *self.write() = elems;
    }

    pub(crate) fn set(&self, i: usize, v: Value) -> bool {
        match self.write().get_mut(i) {
            Some(slot) => {
                *slot = v;
                true
            }
            None => false,
        }
    }

    #[inline]
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    #[inline]
    pub fn ptr_eq(&self, other: &SliceRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

pub type MapStore = FastIndexMap<MapKey, Value>;

/// Backing storage of a non-nil map. Iteration follows insertion order.
#[derive(Clone)]
pub struct MapRef(Arc<RwLock<MapStore>>);

impl MapRef {
    pub fn new(store: MapStore) -> Self {
        Self(Arc::new(RwLock::new(store)))
    }

    fn read(&self) -> RwLockReadGuard<'_, MapStore> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, MapStore> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn get(&self, key: &MapKey) -> Option<Value> {
        self.read().get(key).cloned()
    }

    pub fn contains_key(&self, key: &MapKey) -> bool {
        self.read().contains_key(key)
    }

    pub fn keys(&self) -> Vec<MapKey> {
        self.read().keys().cloned().collect()
    }

    /// Plain copy of every entry, in iteration order.
    pub fn snapshot(&self) -> Vec<(MapKey, Value)> {
        self.read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Insert without type checks; [`Value::map_insert`] is the checked variant.
    pub fn insert(&self, key: MapKey, v: Value) -> Option<Value> {
        self.write().insert(key, v)
    }

    #[inline]
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    #[inline]
    pub fn ptr_eq(&self, other: &MapRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

pub type NativeFn = dyn Fn(&[Value]) -> Vec<Value> + Send + Sync;

/// Callable value. Never decomposed; clones share the same callable.
#[derive(Clone)]
pub struct FuncRef(Arc<NativeFn>);

impl FuncRef {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Vec<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, args: &[Value]) -> Vec<Value> {
        (self.0)(args)
    }

    #[inline]
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    #[inline]
    pub fn ptr_eq(&self, other: &FuncRef) -> bool {
        self.addr() == other.addr()
    }
}

struct Channel {
    tx: Sender<Value>,
    rx: Receiver<Value>,
    cap: usize,
}

/// Communication channel. Never decomposed; clones share the same queue.
#[derive(Clone)]
pub struct ChanRef(Arc<Channel>);

impl ChanRef {
    /// `cap == 0` is a rendezvous channel.
    pub fn new(cap: usize) -> Self {
        let (tx, rx) = crossbeam_channel::bounded(cap);
        Self(Arc::new(Channel { tx, rx, cap }))
    }

    pub fn capacity(&self) -> usize {
        self.0.cap
    }

    pub fn len(&self) -> usize {
        self.0.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.rx.is_empty()
    }

    /// Non-blocking send; hands the value back when the buffer is full.
    pub fn try_send(&self, v: Value) -> Result<(), Value> {
        self.0.tx.try_send(v).map_err(|e| e.into_inner())
    }

    pub fn try_recv(&self) -> Option<Value> {
        match self.0.rx.try_recv() {
            Ok(v) => Some(v),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    #[inline]
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }

    #[inline]
    pub fn ptr_eq(&self, other: &ChanRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

// ============================================================================
// Values
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub fn new(re: f64, im: f64) -> Self {
        Self { re, im }
    }
}

/// Payload of a value. Which variant is valid is decided by the kind of the
/// value's type; `None` payloads are `nil`.
#[derive(Clone)]
pub enum Repr {
    /// Value of a declared-but-undefined type.
    Invalid,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Complex(Complex),
    Str(Arc<str>),
    Pointer(Option<Ptr>),
    /// Dynamic value; never itself of interface kind.
    Interface(Option<Box<Value>>),
    Array(Box<[Value]>),
    Slice(Option<SliceRef>),
    Map(Option<MapRef>),
    Struct(Box<[Value]>),
    Func(Option<FuncRef>),
    Chan(Option<ChanRef>),
}

#[derive(Clone)]
pub struct Value {
    ty: Type,
    repr: Repr,
}

fn truncate_signed(kind: Kind, i: i64) -> i64 {
    match kind {
        Kind::Int8 => i as i8 as i64,
        Kind::Int16 => i as i16 as i64,
        Kind::Int32 => i as i32 as i64,
        _ => i,
    }
}

fn truncate_unsigned(kind: Kind, u: u64) -> u64 {
    match kind {
        Kind::Uint8 => u as u8 as u64,
        Kind::Uint16 => u as u16 as u64,
        Kind::Uint32 => u as u32 as u64,
        _ => u,
    }
}

fn round_float(kind: Kind, f: f64) -> f64 {
    match kind {
        Kind::Float32 | Kind::Complex64 => f as f32 as f64,
        _ => f,
    }
}

fn mismatch(expected: &Type, found: &Type) -> ValueError {
    ValueError::TypeMismatch {
        expected: expected.to_string(),
        found: found.to_string(),
    }
}

fn check_type(expected: &Type, v: &Value) -> Result<(), ValueError> {
    if v.ty() == expected {
        Ok(())
    } else {
        Err(mismatch(expected, v.ty()))
    }
}

impl Value {
    /// Assemble a value, checking that `repr` fits `ty`.
    pub fn from_parts(ty: Type, repr: Repr) -> Result<Value, ValueError> {
        let kind = ty.kind();
        let fits = match (&repr, ty.def()) {
            (Repr::Invalid, TypeDef::Undefined) => true,
            (Repr::Bool(_), _) => kind == Kind::Bool,
            (Repr::Int(_), _) => kind.is_signed_int(),
            (Repr::Uint(_), _) => kind.is_unsigned_int(),
            (Repr::Float(_), _) => kind.is_float(),
            (Repr::Complex(_), _) => kind.is_complex(),
            (Repr::Str(_), _) => kind == Kind::String,
            (Repr::Pointer(p), TypeDef::Pointer(elem)) => {
                if let Some(p) = p {
                    check_type(elem, &p.load())?;
                }
                true
            }
            (Repr::Interface(inner), TypeDef::Interface(_)) => {
                if let Some(inner) = inner {
                    if inner.ty().is_interface() {
                        return Err(ValueError::ReprMismatch {
                            ty: ty.to_string(),
                            kind: Kind::Interface,
                        });
                    }
                    if !inner.ty().implements(&ty) {
                        return Err(ValueError::NotImplemented {
                            ty: inner.ty().to_string(),
                            iface: ty.to_string(),
                        });
                    }
                }
                true
            }
            (Repr::Array(elems), TypeDef::Array(elem, len)) => {
                if elems.len() != *len {
                    return Err(ValueError::ArrayLength {
                        ty: ty.to_string(),
                        expected: *len,
                        found: elems.len(),
                    });
                }
                for e in elems.iter() {
                    check_type(elem, e)?;
                }
                true
            }
            (Repr::Slice(s), TypeDef::Slice(elem)) => {
                if let Some(s) = s {
                    for e in s.read().iter() {
                        check_type(elem, e)?;
                    }
                }
                true
            }
            (Repr::Map(m), TypeDef::Map(k, v)) => {
                if let Some(m) = m {
                    for (key, val) in m.read().iter() {
                        check_type(k, key.value())?;
                        check_type(v, val)?;
                    }
                }
                true
            }
            (Repr::Struct(values), TypeDef::Struct(fields)) => {
                if values.len() != fields.len() {
                    return Err(ValueError::FieldCount {
                        ty: ty.to_string(),
                        expected: fields.len(),
                        found: values.len(),
                    });
                }
                for (f, v) in fields.iter().zip(values.iter()) {
                    check_type(f.ty(), v)?;
                }
                true
            }
            (Repr::Func(_), TypeDef::Func { .. }) => true,
            (Repr::Chan(_), TypeDef::Chan(_)) => true,
            _ => false,
        };
        if !fits {
            return Err(ValueError::ReprMismatch {
                ty: ty.to_string(),
                kind: repr_kind(&repr),
            });
        }
        let repr = match repr {
            Repr::Int(i) => Repr::Int(truncate_signed(kind, i)),
            Repr::Uint(u) => Repr::Uint(truncate_unsigned(kind, u)),
            Repr::Float(f) => Repr::Float(round_float(kind, f)),
            Repr::Complex(c) => Repr::Complex(Complex::new(
                round_float(kind, c.re),
                round_float(kind, c.im),
            )),
            other => other,
        };
        Ok(Value { ty, repr })
    }

    /// Zero value of `ty`: false, 0, "", nil, or a composite of zero values.
    pub fn zero(ty: &Type) -> Value {
        let repr = match ty.def() {
            TypeDef::Undefined => Repr::Invalid,
            TypeDef::Basic(k) => match k {
                Kind::Bool => Repr::Bool(false),
                Kind::String => Repr::Str(Arc::from("")),
                k if k.is_signed_int() => Repr::Int(0),
                k if k.is_unsigned_int() => Repr::Uint(0),
                k if k.is_float() => Repr::Float(0.0),
                k if k.is_complex() => Repr::Complex(Complex::default()),
                _ => Repr::Invalid,
            },
            TypeDef::Pointer(_) => Repr::Pointer(None),
            TypeDef::Interface(_) => Repr::Interface(None),
            TypeDef::Array(elem, n) => {
                Repr::Array((0..*n).map(|_| Value::zero(elem)).collect())
            }
            TypeDef::Slice(_) => Repr::Slice(None),
            TypeDef::Map(..) => Repr::Map(None),
            TypeDef::Struct(fields) => {
                Repr::Struct(fields.iter().map(|f| Value::zero(f.ty())).collect())
            }
            TypeDef::Func { .. } => Repr::Func(None),
            TypeDef::Chan(_) => Repr::Chan(None),
        };
        Value {
            ty: ty.clone(),
            repr,
        }
    }

    /// `nil` of a pointer, interface, slice, map, func or chan type.
    pub fn nil(ty: &Type) -> Result<Value, ValueError> {
        if !ty.kind().is_nilable() {
            return Err(ValueError::ReprMismatch {
                ty: ty.to_string(),
                kind: Kind::Pointer,
            });
        }
        Ok(Value::zero(ty))
    }

    pub fn bool(b: bool) -> Value {
        Value {
            ty: Type::bool(),
            repr: Repr::Bool(b),
        }
    }

    pub fn int(i: i64) -> Value {
        Value {
            ty: Type::int(),
            repr: Repr::Int(i),
        }
    }

    pub fn uint(u: u64) -> Value {
        Value {
            ty: Type::uint(),
            repr: Repr::Uint(u),
        }
    }

    pub fn float64(f: f64) -> Value {
        Value {
            ty: Type::float64(),
            repr: Repr::Float(f),
        }
    }

    pub fn string(s: &str) -> Value {
        Value {
            ty: Type::string(),
            repr: Repr::Str(Arc::from(s)),
        }
    }

    /// Allocate a new cell holding `v` and point at it.
    pub fn pointer_to(v: Value) -> Value {
        Value {
            ty: Type::pointer_to(v.ty()),
            repr: Repr::Pointer(Some(Ptr::new(v))),
        }
    }

    /// Wrap `v` into the capability type `iface`. Interface-typed `v` is
    /// unwrapped first; a nil `v` yields a nil `iface`.
    pub fn interface(iface: &Type, v: Value) -> Result<Value, ValueError> {
        if !iface.is_interface() {
            return Err(ValueError::NotAnInterface {
                ty: iface.to_string(),
            });
        }
        let dynamic = match v.repr {
            Repr::Interface(None) => return Ok(Value::zero(iface)),
            Repr::Interface(Some(inner)) => *inner,
            _ => v,
        };
        Value::from_parts(iface.clone(), Repr::Interface(Some(Box::new(dynamic))))
    }

    pub fn array(ty: &Type, elems: Vec<Value>) -> Result<Value, ValueError> {
        Value::from_parts(ty.clone(), Repr::Array(elems.into_boxed_slice()))
    }

    pub fn slice(ty: &Type, elems: Vec<Value>) -> Result<Value, ValueError> {
        Value::from_parts(ty.clone(), Repr::Slice(Some(SliceRef::new(elems))))
    }

    pub fn map(ty: &Type, entries: Vec<(Value, Value)>) -> Result<Value, ValueError> {
        let mut store = fast_map_with_capacity(entries.len());
        for (k, v) in entries {
            store.insert(MapKey::new(k)?, v);
        }
        Value::from_parts(ty.clone(), Repr::Map(Some(MapRef::new(store))))
    }

    /// Struct value from field values in declaration order.
    pub fn structure(ty: &Type, fields: Vec<Value>) -> Result<Value, ValueError> {
        if ty.kind() != Kind::Struct {
            return Err(ValueError::NotAStruct { ty: ty.to_string() });
        }
        Value::from_parts(ty.clone(), Repr::Struct(fields.into_boxed_slice()))
    }

    pub fn func<F>(ty: &Type, f: F) -> Result<Value, ValueError>
    where
        F: Fn(&[Value]) -> Vec<Value> + Send + Sync + 'static,
    {
        Value::from_parts(ty.clone(), Repr::Func(Some(FuncRef::new(f))))
    }

    pub fn chan(ty: &Type, cap: usize) -> Result<Value, ValueError> {
        Value::from_parts(ty.clone(), Repr::Chan(Some(ChanRef::new(cap))))
    }

    /// Copy of this struct with field `name` replaced.
    pub fn with_field(mut self, name: &str, v: Value) -> Result<Value, ValueError> {
        let idx = self
            .ty
            .field_index(name)
            .ok_or_else(|| ValueError::UnknownField {
                ty: self.ty.to_string(),
                field: name.to_string(),
            })?;
        check_type(self.ty.fields()[idx].ty(), &v)?;
        match &mut self.repr {
            Repr::Struct(fields) => {
                fields[idx] = v;
                Ok(self)
            }
            _ => Err(ValueError::NotAStruct {
                ty: self.ty.to_string(),
            }),
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    #[inline]
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    #[inline]
    pub fn kind(&self) -> Kind {
        self.ty.kind()
    }

    #[inline]
    pub fn repr(&self) -> &Repr {
        &self.repr
    }

    pub fn into_parts(self) -> (Type, Repr) {
        (self.ty, self.repr)
    }

    pub fn is_nil(&self) -> bool {
        matches!(
            self.repr,
            Repr::Pointer(None)
                | Repr::Interface(None)
                | Repr::Slice(None)
                | Repr::Map(None)
                | Repr::Func(None)
                | Repr::Chan(None)
        )
    }

    /// Whether this is the zero value of its type. `-0.0` is not zero.
    pub fn is_zero(&self) -> bool {
        match &self.repr {
            Repr::Invalid => true,
            Repr::Bool(b) => !b,
            Repr::Int(i) => *i == 0,
            Repr::Uint(u) => *u == 0,
            Repr::Float(f) => f.to_bits() == 0,
            Repr::Complex(c) => c.re.to_bits() == 0 && c.im.to_bits() == 0,
            Repr::Str(s) => s.is_empty(),
            Repr::Array(elems) | Repr::Struct(elems) => elems.iter().all(Value::is_zero),
            _ => self.is_nil(),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.repr {
            Repr::Bool(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.repr {
            Repr::Int(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u64> {
        match self.repr {
            Repr::Uint(u) => Some(u),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self.repr {
            Repr::Float(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_complex(&self) -> Option<Complex> {
        match self.repr {
            Repr::Complex(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.repr {
            Repr::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_ptr(&self) -> Option<&Ptr> {
        match &self.repr {
            Repr::Pointer(p) => p.as_ref(),
            _ => None,
        }
    }

    pub fn as_slice(&self) -> Option<&SliceRef> {
        match &self.repr {
            Repr::Slice(s) => s.as_ref(),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapRef> {
        match &self.repr {
            Repr::Map(m) => m.as_ref(),
            _ => None,
        }
    }

    pub fn as_func(&self) -> Option<&FuncRef> {
        match &self.repr {
            Repr::Func(f) => f.as_ref(),
            _ => None,
        }
    }

    pub fn as_chan(&self) -> Option<&ChanRef> {
        match &self.repr {
            Repr::Chan(c) => c.as_ref(),
            _ => None,
        }
    }

    /// Address of the reference storage this value points at, if any.
    pub fn storage_addr(&self) -> Option<usize> {
        match &self.repr {
            Repr::Pointer(Some(p)) => Some(p.addr()),
            Repr::Slice(Some(s)) => Some(s.addr()),
            Repr::Map(Some(m)) => Some(m.addr()),
            Repr::Func(Some(f)) => Some(f.addr()),
            Repr::Chan(Some(c)) => Some(c.addr()),
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        let idx = self.ty.field_index(name)?;
        self.field_at(idx)
    }

    pub fn field_at(&self, idx: usize) -> Option<&Value> {
        match &self.repr {
            Repr::Struct(fields) => fields.get(idx),
            _ => None,
        }
    }

    /// Pointee of a pointer, or dynamic value of an interface.
    pub fn elem(&self) -> Option<Value> {
        match &self.repr {
            Repr::Pointer(Some(p)) => Some(p.load()),
            Repr::Interface(Some(inner)) => Some((**inner).clone()),
            _ => None,
        }
    }

    /// Element `i` of an array or slice.
    pub fn index(&self, i: usize) -> Option<Value> {
        match &self.repr {
            Repr::Array(elems) => elems.get(i).cloned(),
            Repr::Slice(Some(s)) => s.get(i),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        match &self.repr {
            Repr::Str(s) => s.len(),
            Repr::Array(elems) => elems.len(),
            Repr::Slice(Some(s)) => s.len(),
            Repr::Map(Some(m)) => m.len(),
            Repr::Chan(Some(c)) => c.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn map_get(&self, key: &Value) -> Option<Value> {
        let m = self.as_map()?;
        let key = MapKey::new(key.clone()).ok()?;
        m.get(&key)
    }

    // ------------------------------------------------------------------------
    // Checked mutation through reference storage
    // ------------------------------------------------------------------------

    /// Store `v` into the cell this pointer references.
    pub fn set_elem(&self, v: Value) -> Result<(), ValueError> {
        let (Repr::Pointer(Some(p)), TypeDef::Pointer(elem)) = (&self.repr, self.ty.def()) else {
            return Err(ValueError::ReprMismatch {
                ty: self.ty.to_string(),
                kind: self.kind(),
            });
        };
        check_type(elem, &v)?;
        p.store(v);
        Ok(())
    }

    pub fn set_index(&self, i: usize, v: Value) -> Result<(), ValueError> {
        let (Repr::Slice(Some(s)), TypeDef::Slice(elem)) = (&self.repr, self.ty.def()) else {
            return Err(ValueError::ReprMismatch {
                ty: self.ty.to_string(),
                kind: self.kind(),
            });
        };
        check_type(elem, &v)?;
        if !s.set(i, v) {
            return Err(ValueError::ArrayLength {
                ty: self.ty.to_string(),
                expected: s.len(),
                found: i + 1,
            });
        }
        Ok(())
    }

    pub fn map_insert(&self, key: Value, v: Value) -> Result<Option<Value>, ValueError> {
        let (Repr::Map(Some(m)), TypeDef::Map(kt, vt)) = (&self.repr, self.ty.def()) else {
            return Err(ValueError::ReprMismatch {
                ty: self.ty.to_string(),
                kind: self.kind(),
            });
        };
        check_type(kt, &key)?;
        check_type(vt, &v)?;
        Ok(m.insert(MapKey::new(key)?, v))
    }
}

fn repr_kind(repr: &Repr) -> Kind {
    match repr {
        Repr::Invalid => Kind::Invalid,
        Repr::Bool(_) => Kind::Bool,
        Repr::Int(_) => Kind::Int,
        Repr::Uint(_) => Kind::Uint,
        Repr::Float(_) => Kind::Float64,
        Repr::Complex(_) => Kind::Complex128,
        Repr::Str(_) => Kind::String,
        Repr::Pointer(_) => Kind::Pointer,
        Repr::Interface(_) => Kind::Interface,
        Repr::Array(_) => Kind::Array,
        Repr::Slice(_) => Kind::Slice,
        Repr::Map(_) => Kind::Map,
        Repr::Struct(_) => Kind::Struct,
        Repr::Func(_) => Kind::Func,
        Repr::Chan(_) => Kind::Chan,
    }
}

// Nested composites past this depth print as `...`; pointers print as addresses.
const DEBUG_MAX_DEPTH: usize = 8;

fn fmt_value(v: &Value, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    if depth > DEBUG_MAX_DEPTH {
        return f.write_str("...");
    }
    match &v.repr {
        Repr::Invalid => f.write_str("<invalid>"),
        Repr::Bool(b) => write!(f, "{b}"),
        Repr::Int(i) => write!(f, "{i}"),
        Repr::Uint(u) => write!(f, "{u}"),
        Repr::Float(x) => write!(f, "{x}"),
        Repr::Complex(c) => write!(f, "({}{:+}i)", c.re, c.im),
        Repr::Str(s) => write!(f, "{s:?}"),
        Repr::Pointer(None)
        | Repr::Interface(None)
        | Repr::Slice(None)
        | Repr::Map(None)
        | Repr::Func(None)
        | Repr::Chan(None) => f.write_str("<nil>"),
        Repr::Pointer(Some(p)) => write!(f, "({})({:#x})", v.ty, p.addr()),
        Repr::Func(Some(func)) => write!(f, "({})({:#x})", v.ty, func.addr()),
        Repr::Chan(Some(c)) => write!(f, "({})({:#x})", v.ty, c.addr()),
        Repr::Interface(Some(inner)) => fmt_value(inner, f, depth + 1),
        Repr::Array(elems) => fmt_list(&elems[..], f, depth),
        Repr::Slice(Some(s)) => fmt_list(&s.snapshot(), f, depth),
        Repr::Map(Some(m)) => {
            f.write_str("map[")?;
            for (i, (k, val)) in m.snapshot().iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                fmt_value(k.value(), f, depth + 1)?;
                f.write_str(":")?;
                fmt_value(val, f, depth + 1)?;
            }
            f.write_str("]")
        }
        Repr::Struct(values) => {
            if let Some(name) = v.ty.name() {
                f.write_str(name)?;
            }
            f.write_str("{")?;
            for (i, (field, val)) in v.ty.fields().iter().zip(values.iter()).enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}: ", field.name())?;
                fmt_value(val, f, depth + 1)?;
            }
            f.write_str("}")
        }
    }
}

fn fmt_list(elems: &[Value], f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    f.write_str("[")?;
    for (i, e) in elems.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        fmt_value(e, f, depth + 1)?;
    }
    f.write_str("]")
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_value(self, f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Field;

    fn point() -> Type {
        Type::named("Point")
            .define(&Type::struct_of(vec![
                Field::exported("X", Type::int()),
                Field::unexported("y", Type::int()),
            ]))
            .unwrap()
    }

    #[test]
    fn zero_values() {
        let p = point();
        let z = Value::zero(&p);
        assert_eq!(z.field("X").and_then(Value::as_int), Some(0));
        assert!(Value::zero(&Type::pointer_to(&p)).is_nil());
        assert!(Value::zero(&Type::slice_of(&p)).is_nil());
        let arr = Value::zero(&Type::array_of(&Type::string(), 3));
        assert_eq!(arr.len(), 3);
        assert_eq!(arr.index(2).unwrap().as_str(), Some(""));
    }

    #[test]
    fn zero_detection() {
        let p = point();
        assert!(Value::zero(&p).is_zero());
        assert!(!Value::zero(&p).with_field("y", Value::int(1)).unwrap().is_zero());
        assert!(!Value::float64(-0.0).is_zero());
        assert!(!Value::slice(&Type::slice_of(&Type::int()), vec![]).unwrap().is_zero());
        assert!(!Value::pointer_to(Value::zero(&p)).is_zero());
    }

    #[test]
    fn sized_ints_truncate() {
        let i8t = Type::basic(Kind::Int8);
        let v = Value::from_parts(i8t, Repr::Int(300)).unwrap();
        assert_eq!(v.as_int(), Some(44));
        let u16t = Type::basic(Kind::Uint16);
        let v = Value::from_parts(u16t, Repr::Uint(65537)).unwrap();
        assert_eq!(v.as_uint(), Some(1));
    }

    #[test]
    fn from_parts_rejects_wrong_repr() {
        let err = Value::from_parts(Type::string(), Repr::Int(1)).unwrap_err();
        assert!(matches!(err, ValueError::ReprMismatch { .. }), "{err}");
        let err = Value::structure(&point(), vec![Value::int(1)]).unwrap_err();
        assert!(matches!(err, ValueError::FieldCount { .. }), "{err}");
        let err = Value::array(&Type::array_of(&Type::int(), 2), vec![Value::int(1)]).unwrap_err();
        assert!(matches!(err, ValueError::ArrayLength { .. }), "{err}");
    }

    #[test]
    fn with_field_checks_types() {
        let p = Value::zero(&point()).with_field("X", Value::int(3)).unwrap();
        assert_eq!(p.field("X").and_then(Value::as_int), Some(3));
        assert!(p.clone().with_field("X", Value::string("no")).is_err());
        assert!(p.with_field("Z", Value::int(1)).is_err());
    }

    #[test]
    fn clone_shares_reference_storage() {
        let ptr = Value::pointer_to(Value::int(1));
        let alias = ptr.clone();
        alias.set_elem(Value::int(2)).unwrap();
        assert_eq!(ptr.elem().unwrap().as_int(), Some(2));
        assert_eq!(ptr.storage_addr(), alias.storage_addr());
    }

    #[test]
    fn interface_wrapping() {
        let stringer = Type::interface_of(["String"]);
        let named = Type::named("Name").method("String").define(&Type::string()).unwrap();
        let v = Value::from_parts(named.clone(), Repr::Str(Arc::from("bob"))).unwrap();
        let i = Value::interface(&stringer, v).unwrap();
        assert_eq!(i.elem().unwrap().ty(), &named);
        let any = Value::interface(&Type::any(), i).unwrap();
        assert_eq!(any.elem().unwrap().ty(), &named);
        assert!(Value::interface(&stringer, Value::int(1)).is_err());
        assert!(Value::interface(&stringer, Value::zero(&Type::any())).unwrap().is_nil());
    }

    #[test]
    fn maps_and_channels() {
        let mt = Type::map_of(&Type::string(), &Type::int());
        let m = Value::map(&mt, vec![(Value::string("a"), Value::int(1))]).unwrap();
        assert_eq!(m.map_get(&Value::string("a")).unwrap().as_int(), Some(1));
        m.map_insert(Value::string("b"), Value::int(2)).unwrap();
        assert_eq!(m.len(), 2);
        assert!(m.map_insert(Value::int(1), Value::int(2)).is_err());

        let ct = Type::chan_of(&Type::int());
        let c = Value::chan(&ct, 1).unwrap();
        let chan = c.as_chan().unwrap();
        assert!(chan.try_send(Value::int(7)).is_ok());
        assert!(chan.try_send(Value::int(8)).is_err());
        assert_eq!(chan.try_recv().and_then(|v| v.as_int()), Some(7));
    }
}

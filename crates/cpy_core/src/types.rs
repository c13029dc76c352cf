//! Type descriptors and the type-identity rules the copier resolves against.
//!
//! A [`Type`] is a cheap, shareable handle. Named types are identical only to
//! themselves; unnamed composite types (`*T`, `[]T`, `map[K]V`, ...) are
//! identical whenever their structure is. Named types carry two method sets:
//! methods declared on the value receiver and methods declared on the pointer
//! receiver. `T` has only the former, `*T` has both.

use crate::error::ValueError;
use crate::kind::Kind;
use smallvec::SmallVec;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};

static NEXT_TYPE_ID: AtomicU32 = AtomicU32::new(1);

fn next_type_id() -> u32 {
    NEXT_TYPE_ID.fetch_add(1, Ordering::Relaxed)
}

// ============================================================================
// Method sets
// ============================================================================

/// Sorted, de-duplicated set of method names.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct MethodSet(SmallVec<[Arc<str>; 4]>);

impl MethodSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set: SmallVec<[Arc<str>; 4]> =
            names.into_iter().map(|n| Arc::from(n.as_ref())).collect();
        set.sort();
        set.dedup();
        Self(set)
    }

    pub fn empty() -> Self {
        Self(SmallVec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.0.binary_search_by(|m| m.as_ref().cmp(name)).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|m| m.as_ref())
    }

    fn insert(&mut self, name: &str) {
        if let Err(pos) = self.0.binary_search_by(|m| m.as_ref().cmp(name)) {
            self.0.insert(pos, Arc::from(name));
        }
    }
}

// ============================================================================
// Struct fields
// ============================================================================

/// Struct field metadata.
///
/// Visibility cannot be recovered from a name, so every field states it
/// explicitly when the struct type is built.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Field {
    name: Arc<str>,
    ty: Type,
    exported: bool,
}

impl Field {
    pub fn exported(name: &str, ty: Type) -> Self {
        Self {
            name: Arc::from(name),
            ty,
            exported: true,
        }
    }

    pub fn unexported(name: &str, ty: Type) -> Self {
        Self {
            name: Arc::from(name),
            ty,
            exported: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn is_exported(&self) -> bool {
        self.exported
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.ty)
    }
}

// ============================================================================
// Type definitions
// ============================================================================

/// Structure of a type. For named types this is the underlying structure.
#[derive(Clone, Debug)]
pub enum TypeDef {
    /// Declared with [`Type::named`] but not yet defined.
    Undefined,
    Basic(Kind),
    Pointer(Type),
    Interface(MethodSet),
    Array(Type, usize),
    Slice(Type),
    Map(Type, Type),
    Struct(Arc<[Field]>),
    Func {
        params: Arc<[Type]>,
        results: Arc<[Type]>,
    },
    Chan(Type),
}

impl TypeDef {
    pub fn kind(&self) -> Kind {
        match self {
            TypeDef::Undefined => Kind::Invalid,
            TypeDef::Basic(k) => *k,
            TypeDef::Pointer(_) => Kind::Pointer,
            TypeDef::Interface(_) => Kind::Interface,
            TypeDef::Array(..) => Kind::Array,
            TypeDef::Slice(_) => Kind::Slice,
            TypeDef::Map(..) => Kind::Map,
            TypeDef::Struct(_) => Kind::Struct,
            TypeDef::Func { .. } => Kind::Func,
            TypeDef::Chan(_) => Kind::Chan,
        }
    }

    fn identical(&self, other: &TypeDef) -> bool {
        match (self, other) {
            (TypeDef::Basic(a), TypeDef::Basic(b)) => a == b,
            (TypeDef::Pointer(a), TypeDef::Pointer(b)) => a == b,
            (TypeDef::Interface(a), TypeDef::Interface(b)) => a == b,
            (TypeDef::Array(a, n), TypeDef::Array(b, m)) => n == m && a == b,
            (TypeDef::Slice(a), TypeDef::Slice(b)) => a == b,
            (TypeDef::Map(ka, va), TypeDef::Map(kb, vb)) => ka == kb && va == vb,
            (TypeDef::Struct(a), TypeDef::Struct(b)) => a == b,
            (
                TypeDef::Func {
                    params: pa,
                    results: ra,
                },
                TypeDef::Func {
                    params: pb,
                    results: rb,
                },
            ) => pa == pb && ra == rb,
            (TypeDef::Chan(a), TypeDef::Chan(b)) => a == b,
            _ => false,
        }
    }

    fn hash_structure<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        match self {
            TypeDef::Undefined | TypeDef::Basic(_) => {}
            TypeDef::Pointer(t) | TypeDef::Slice(t) | TypeDef::Chan(t) => t.hash(state),
            TypeDef::Interface(m) => m.hash(state),
            TypeDef::Array(t, n) => {
                t.hash(state);
                n.hash(state);
            }
            TypeDef::Map(k, v) => {
                k.hash(state);
                v.hash(state);
            }
            TypeDef::Struct(fields) => fields.hash(state),
            TypeDef::Func { params, results } => {
                params.hash(state);
                results.hash(state);
            }
        }
    }
}

static UNDEFINED: TypeDef = TypeDef::Undefined;

struct Definition {
    def: TypeDef,
    methods: MethodSet,
    ptr_methods: MethodSet,
}

struct TypeInner {
    id: u32,
    name: Option<Arc<str>>,
    definition: OnceLock<Definition>,
}

/// Handle to a type descriptor.
#[derive(Clone)]
pub struct Type(Arc<TypeInner>);

impl Type {
    fn unnamed(def: TypeDef) -> Self {
        let definition = OnceLock::new();
        let _ = definition.set(Definition {
            def,
            methods: MethodSet::empty(),
            ptr_methods: MethodSet::empty(),
        });
        Type(Arc::new(TypeInner {
            id: next_type_id(),
            name: None,
            definition,
        }))
    }

    pub fn basic(kind: Kind) -> Self {
        Self::unnamed(TypeDef::Basic(kind))
    }

    pub fn bool() -> Self {
        Self::basic(Kind::Bool)
    }

    pub fn int() -> Self {
        Self::basic(Kind::Int)
    }

    pub fn uint() -> Self {
        Self::basic(Kind::Uint)
    }

    pub fn float64() -> Self {
        Self::basic(Kind::Float64)
    }

    pub fn string() -> Self {
        Self::basic(Kind::String)
    }

    pub fn pointer_to(elem: &Type) -> Self {
        Self::unnamed(TypeDef::Pointer(elem.clone()))
    }

    pub fn slice_of(elem: &Type) -> Self {
        Self::unnamed(TypeDef::Slice(elem.clone()))
    }

    pub fn array_of(elem: &Type, len: usize) -> Self {
        Self::unnamed(TypeDef::Array(elem.clone(), len))
    }

    pub fn map_of(key: &Type, value: &Type) -> Self {
        Self::unnamed(TypeDef::Map(key.clone(), value.clone()))
    }

    pub fn chan_of(elem: &Type) -> Self {
        Self::unnamed(TypeDef::Chan(elem.clone()))
    }

    pub fn func_of(params: &[Type], results: &[Type]) -> Self {
        Self::unnamed(TypeDef::Func {
            params: params.into(),
            results: results.into(),
        })
    }

    pub fn struct_of(fields: Vec<Field>) -> Self {
        Self::unnamed(TypeDef::Struct(fields.into()))
    }

    pub fn interface_of<I, S>(methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::unnamed(TypeDef::Interface(MethodSet::new(methods)))
    }

    /// The empty interface; every type satisfies it.
    pub fn any() -> Self {
        Self::unnamed(TypeDef::Interface(MethodSet::empty()))
    }

    /// Declare a named type. The handle returned by [`Named::ty`] may be used
    /// inside its own definition (e.g. `type S struct { Next *S }`).
    pub fn named(name: &str) -> Named {
        Named {
            ty: Type(Arc::new(TypeInner {
                id: next_type_id(),
                name: Some(Arc::from(name)),
                definition: OnceLock::new(),
            })),
            methods: MethodSet::empty(),
            ptr_methods: MethodSet::empty(),
        }
    }

    /// Process-unique id of this descriptor.
    ///
    /// Structurally identical unnamed types may have different ids; use `==`
    /// for type identity.
    #[inline]
    pub fn id(&self) -> u32 {
        self.0.id
    }

    pub fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    #[inline]
    pub fn is_named(&self) -> bool {
        self.0.name.is_some()
    }

    #[inline]
    pub fn def(&self) -> &TypeDef {
        match self.0.definition.get() {
            Some(d) => &d.def,
            None => &UNDEFINED,
        }
    }

    #[inline]
    pub fn kind(&self) -> Kind {
        self.def().kind()
    }

    #[inline]
    pub fn is_interface(&self) -> bool {
        matches!(self.def(), TypeDef::Interface(_))
    }

    /// Element type of pointers, arrays, slices and channels; value type of maps.
    pub fn elem(&self) -> Option<&Type> {
        match self.def() {
            TypeDef::Pointer(t) | TypeDef::Slice(t) | TypeDef::Chan(t) | TypeDef::Array(t, _) => {
                Some(t)
            }
            TypeDef::Map(_, v) => Some(v),
            _ => None,
        }
    }

    pub fn key(&self) -> Option<&Type> {
        match self.def() {
            TypeDef::Map(k, _) => Some(k),
            _ => None,
        }
    }

    pub fn array_len(&self) -> Option<usize> {
        match self.def() {
            TypeDef::Array(_, n) => Some(*n),
            _ => None,
        }
    }

    pub fn fields(&self) -> &[Field] {
        match self.def() {
            TypeDef::Struct(fields) => fields,
            _ => &[],
        }
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields().iter().position(|f| f.name() == name)
    }

    /// Whether `name` is in the method set of this type.
    pub fn has_method(&self, name: &str) -> bool {
        match self.def() {
            TypeDef::Interface(required) => required.contains(name),
            TypeDef::Pointer(elem) if !self.is_named() && !elem.is_interface() => {
                match elem.0.definition.get() {
                    Some(d) => d.methods.contains(name) || d.ptr_methods.contains(name),
                    None => false,
                }
            }
            _ => match self.0.definition.get() {
                Some(d) => d.methods.contains(name),
                None => false,
            },
        }
    }

    /// Full method set of this type.
    pub fn method_set(&self) -> MethodSet {
        match self.def() {
            TypeDef::Interface(required) => required.clone(),
            TypeDef::Pointer(elem) if !self.is_named() && !elem.is_interface() => {
                match elem.0.definition.get() {
                    Some(d) => {
                        let mut set = d.methods.clone();
                        for m in d.ptr_methods.iter() {
                            set.insert(m);
                        }
                        set
                    }
                    None => MethodSet::empty(),
                }
            }
            _ => match self.0.definition.get() {
                Some(d) => d.methods.clone(),
                None => MethodSet::empty(),
            },
        }
    }

    /// Whether this type satisfies the capability `iface`. Always false when
    /// `iface` is not an interface type.
    pub fn implements(&self, iface: &Type) -> bool {
        match iface.def() {
            TypeDef::Interface(required) => required.iter().all(|m| self.has_method(m)),
            _ => false,
        }
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        if self.is_named() || other.is_named() {
            return false;
        }
        self.def().identical(other.def())
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.0.name {
            Some(_) => {
                state.write_u8(0);
                self.0.id.hash(state);
            }
            None => {
                state.write_u8(1);
                self.def().hash_structure(state);
            }
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.0.name {
            return f.write_str(name);
        }
        match self.def() {
            TypeDef::Undefined => f.write_str("<undefined>"),
            TypeDef::Basic(k) => f.write_str(k.name()),
            TypeDef::Pointer(t) => write!(f, "*{t}"),
            TypeDef::Interface(m) if m.is_empty() => f.write_str("interface {}"),
            TypeDef::Interface(m) => {
                f.write_str("interface { ")?;
                for (i, name) in m.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{name}()")?;
                }
                f.write_str(" }")
            }
            TypeDef::Array(t, n) => write!(f, "[{n}]{t}"),
            TypeDef::Slice(t) => write!(f, "[]{t}"),
            TypeDef::Map(k, v) => write!(f, "map[{k}]{v}"),
            TypeDef::Struct(fields) if fields.is_empty() => f.write_str("struct {}"),
            TypeDef::Struct(fields) => {
                f.write_str("struct { ")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{field:?}")?;
                }
                f.write_str(" }")
            }
            TypeDef::Func { params, results } => {
                f.write_str("func(")?;
                write_type_list(f, params)?;
                f.write_str(")")?;
                match results.len() {
                    0 => Ok(()),
                    1 => write!(f, " {}", results[0]),
                    _ => {
                        f.write_str(" (")?;
                        write_type_list(f, results)?;
                        f.write_str(")")
                    }
                }
            }
            TypeDef::Chan(t) => write!(f, "chan {t}"),
        }
    }
}

fn write_type_list(f: &mut fmt::Formatter<'_>, types: &[Type]) -> fmt::Result {
    for (i, t) in types.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{t}")?;
    }
    Ok(())
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({self})")
    }
}

// ============================================================================
// Named type builder
// ============================================================================

/// A declared named type awaiting its definition.
pub struct Named {
    ty: Type,
    methods: MethodSet,
    ptr_methods: MethodSet,
}

impl Named {
    /// Forward reference to the type being declared.
    pub fn ty(&self) -> Type {
        self.ty.clone()
    }

    /// Declare a method with a value receiver.
    pub fn method(mut self, name: &str) -> Self {
        self.methods.insert(name);
        self
    }

    /// Declare a method with a pointer receiver.
    pub fn ptr_method(mut self, name: &str) -> Self {
        self.ptr_methods.insert(name);
        self
    }

    /// Give the type the structure of `underlying`. Methods are not inherited
    /// from a named `underlying`.
    pub fn define(self, underlying: &Type) -> Result<Type, ValueError> {
        let def = underlying.def().clone();
        if matches!(def, TypeDef::Undefined) {
            return Err(ValueError::Undefined {
                ty: underlying.to_string(),
            });
        }
        if matches!(def, TypeDef::Interface(_))
            && (!self.methods.is_empty() || !self.ptr_methods.is_empty())
        {
            return Err(ValueError::MethodsOnInterface {
                ty: self.ty.to_string(),
            });
        }
        let definition = Definition {
            def,
            methods: self.methods,
            ptr_methods: self.ptr_methods,
        };
        if self.ty.0.definition.set(definition).is_err() {
            return Err(ValueError::Redefined {
                ty: self.ty.to_string(),
            });
        }
        Ok(self.ty)
    }
}

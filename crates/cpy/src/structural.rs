//! Default per-kind copying.
//!
//! Every nested value goes back through [`Context::copy`], so copy functions
//! and shallow markers apply at any depth.

use crate::errors::CopyError;
use crate::registry::OptionRegistry;
use crate::resolver::Resolution;
use ahash::RandomState;
use cpy_core::value::{fast_hasher, fast_map_with_capacity};
use cpy_core::{MapRef, Ptr, Repr, SliceRef, Type, Value};
use hashbrown::HashMap;

type FastHashMap<K, V> = HashMap<K, V, RandomState>;

/// State of a single copy call.
pub(crate) struct Context<'r> {
    registry: &'r OptionRegistry,
    /// Resolution depends only on the type.
    cache: FastHashMap<Type, Resolution>,
    /// Source storage address -> clone; only with alias preservation.
    visited: Option<FastHashMap<usize, Value>>,
    depth: usize,
}

impl<'r> Context<'r> {
    pub(crate) fn new(registry: &'r OptionRegistry) -> Self {
        let visited = registry
            .config
            .preserve_aliases
            .then(|| HashMap::with_hasher(fast_hasher()));
        Self {
            registry,
            cache: HashMap::with_hasher(fast_hasher()),
            visited,
            depth: 0,
        }
    }

    pub(crate) fn copy(&mut self, v: &Value) -> Result<Value, CopyError> {
        // The copy of a zero value is the zero value; no function is consulted.
        // Inline composites are only walked for zeroness when a function would
        // receive them; a structural copy of a zero composite is zero anyway.
        let inline = matches!(v.repr(), Repr::Array(_) | Repr::Struct(_));
        if !inline && v.is_zero() {
            return Ok(v.clone());
        }
        let resolution = self.resolve(v.ty());
        if inline
            && matches!(resolution, Resolution::Custom(_) | Resolution::CustomAddr(_))
            && v.is_zero()
        {
            return Ok(v.clone());
        }
        if let Some(limit) = self.registry.config.max_depth {
            if self.depth >= limit {
                return Err(CopyError::DepthExceeded { limit });
            }
        }
        self.depth += 1;
        let out = match resolution {
            Resolution::Custom(idx) => self.registry.apply(idx, v.clone()),
            Resolution::CustomAddr(idx) => self.registry.apply_addr(idx, v.clone()),
            Resolution::Shallow => Ok(v.clone()),
            Resolution::Structural => self.copy_structural(v),
        };
        self.depth -= 1;
        out
    }

    fn resolve(&mut self, ty: &Type) -> Resolution {
        if let Some(r) = self.cache.get(ty) {
            return *r;
        }
        let r = self.registry.resolve(ty);
        if r != Resolution::Structural {
            tracing::trace!(ty = %ty, resolution = ?r, "copy strategy resolved");
        }
        self.cache.insert(ty.clone(), r);
        r
    }

    fn copy_structural(&mut self, v: &Value) -> Result<Value, CopyError> {
        let ty = v.ty();
        let repr = match v.repr() {
            Repr::Pointer(Some(p)) => return self.copy_pointer(ty, p),
            Repr::Slice(Some(s)) => return self.copy_slice(ty, s),
            Repr::Map(Some(m)) => return self.copy_map(ty, m),
            Repr::Interface(Some(inner)) => Repr::Interface(Some(Box::new(self.copy(inner)?))),
            Repr::Array(elems) => Repr::Array(self.copy_all(elems)?.into_boxed_slice()),
            Repr::Struct(fields) => Repr::Struct(self.copy_fields(ty, fields)?),
            // Primitives are independent by construction; funcs and chans
            // are never decomposed; nil stays nil.
            _ => return Ok(v.clone()),
        };
        Ok(Value::from_parts(ty.clone(), repr)?)
    }

    fn seen(&self, ty: &Type, addr: usize) -> Option<Value> {
        let clone = self.visited.as_ref()?.get(&addr)?;
        if clone.ty() == ty {
            return Some(clone.clone());
        }
        // Same storage reached through another type: share the cloned storage
        // under this type, or copy it independently if the types disagree.
        Value::from_parts(ty.clone(), clone.repr().clone()).ok()
    }

    fn remember(&mut self, addr: usize, clone: &Value) {
        if let Some(visited) = self.visited.as_mut() {
            visited.insert(addr, clone.clone());
        }
    }

    fn copy_pointer(&mut self, ty: &Type, src: &Ptr) -> Result<Value, CopyError> {
        if let Some(clone) = self.seen(ty, src.addr()) {
            return Ok(clone);
        }
        let pointee = src.load();
        // The new cell starts as a plain copy so back-references resolve to it.
        let cell = Ptr::new(pointee.clone());
        let out = Value::from_parts(ty.clone(), Repr::Pointer(Some(cell.clone())))?;
        self.remember(src.addr(), &out);
        cell.store(self.copy(&pointee)?);
        Ok(out)
    }

    fn copy_slice(&mut self, ty: &Type, src: &SliceRef) -> Result<Value, CopyError> {
        if let Some(clone) = self.seen(ty, src.addr()) {
            return Ok(clone);
        }
        let elems = src.snapshot();
        let backing = SliceRef::new(Vec::new());
        let out = Value::from_parts(ty.clone(), Repr::Slice(Some(backing.clone())))?;
        self.remember(src.addr(), &out);
        backing.store(self.copy_all(&elems)?);
        Ok(out)
    }

    fn copy_map(&mut self, ty: &Type, src: &MapRef) -> Result<Value, CopyError> {
        if let Some(clone) = self.seen(ty, src.addr()) {
            return Ok(clone);
        }
        let entries = src.snapshot();
        let backing = MapRef::new(fast_map_with_capacity(entries.len()));
        let out = Value::from_parts(ty.clone(), Repr::Map(Some(backing.clone())))?;
        self.remember(src.addr(), &out);
        for (key, val) in entries {
            // Keys are assigned, not copied.
            backing.insert(key, self.copy(&val)?);
        }
        Ok(out)
    }

    fn copy_all(&mut self, elems: &[Value]) -> Result<Vec<Value>, CopyError> {
        elems.iter().map(|e| self.copy(e)).collect()
    }

    fn copy_fields(&mut self, ty: &Type, values: &[Value]) -> Result<Box<[Value]>, CopyError> {
        let ignore_unexported = self.registry.config.ignore_unexported;
        let mut out = Vec::with_capacity(values.len());
        for (field, value) in ty.fields().iter().zip(values.iter()) {
            // A copy function or shallow marker on the field's type overrides
            // the unexported-field policy.
            if ignore_unexported
                && !field.is_exported()
                && self.resolve(field.ty()) == Resolution::Structural
            {
                out.push(Value::zero(field.ty()));
                continue;
            }
            out.push(self.copy(value)?);
        }
        Ok(out.into_boxed_slice())
    }
}

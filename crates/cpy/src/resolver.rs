//! Copy-strategy resolution.
//!
//! Copy functions are scanned newest first; the first one whose accepted type
//! is the value's type, or a capability the value's type satisfies, wins.
//! Exact and capability matches are not ranked against each other. A value of
//! a non-pointer type `T` that no function accepts may still be handed, through
//! a temporary cell, to the newest function accepting `*T`. Only when no
//! function matches is the shallow set consulted.

use crate::errors::CopyError;
use crate::options::Binding;
use crate::registry::OptionRegistry;
use cpy_core::{Repr, Type, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Index into the registry's bindings.
    Custom(usize),
    /// Binding accepting `*T`, applied to a `T` value through a new cell.
    CustomAddr(usize),
    Shallow,
    Structural,
}

impl OptionRegistry {
    pub fn resolve(&self, ty: &Type) -> Resolution {
        if let Some(idx) = self.bindings.iter().rposition(|b| b.accepts(ty)) {
            return Resolution::Custom(idx);
        }
        if !ty.is_interface() && !self.bindings.is_empty() {
            let ptr = Type::pointer_to(ty);
            if let Some(idx) = self.bindings.iter().rposition(|b| b.accepts(&ptr)) {
                return Resolution::CustomAddr(idx);
            }
        }
        if self.shallow.contains(ty) {
            return Resolution::Shallow;
        }
        Resolution::Structural
    }

    /// Run binding `idx` on the non-nil value `v`.
    pub(crate) fn apply(&self, idx: usize, v: Value) -> Result<Value, CopyError> {
        let binding = &self.bindings[idx];
        let ty = v.ty().clone();
        if binding.input == ty {
            let out = call(binding, &ty, v)?;
            if out.ty() != &ty {
                return Err(result_mismatch(&ty, out.ty()));
            }
            return Ok(out);
        }

        // Capability match: hand the function an interface value.
        let arg = Value::interface(&binding.input, v)?;
        let out = call(binding, &ty, arg)?;
        if ty.is_interface() {
            let found = dynamic_type(&out);
            return Value::interface(&ty, out).map_err(|_| result_mismatch(&ty, &found));
        }
        let found = dynamic_type(&out);
        let dynamic = match out.into_parts() {
            (_, Repr::Interface(Some(inner))) => *inner,
            (out_ty, repr) => Value::from_parts(out_ty, repr)?,
        };
        if dynamic.ty() != &ty {
            return Err(result_mismatch(&ty, &found));
        }
        Ok(dynamic)
    }
}

impl OptionRegistry {
    /// Run binding `idx`, which accepts `*T`, on the non-nil `T` value `v`.
    pub(crate) fn apply_addr(&self, idx: usize, v: Value) -> Result<Value, CopyError> {
        let ty = v.ty().clone();
        let out = self.apply(idx, Value::pointer_to(v))?;
        out.elem().ok_or_else(|| result_mismatch(&ty, out.ty()))
    }
}

fn call(binding: &Binding, ty: &Type, arg: Value) -> Result<Value, CopyError> {
    (binding.func)(arg).map_err(|abort| {
        tracing::debug!(ty = %ty, reason = %abort, "copy function aborted");
        CopyError::Aborted {
            ty: ty.to_string(),
            message: abort.message().to_string(),
        }
    })
}

/// Type of the value inside an interface, or the value's own type.
fn dynamic_type(v: &Value) -> Type {
    match v.repr() {
        Repr::Interface(Some(inner)) => inner.ty().clone(),
        _ => v.ty().clone(),
    }
}

fn result_mismatch(expected: &Type, found: &Type) -> CopyError {
    let found = if found.is_interface() {
        format!("nil {found}")
    } else {
        found.to_string()
    };
    CopyError::BindingResult {
        expected: expected.to_string(),
        found,
    }
}

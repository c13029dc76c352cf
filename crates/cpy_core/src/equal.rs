//! Structural equality of values.

use crate::types::Type;
use crate::value::{Repr, Value};
use ahash::RandomState;
use hashbrown::HashSet;

#[derive(Clone, Debug, Default)]
pub struct EqualOptions {
    /// Treat unexported struct fields as always equal.
    pub ignore_unexported: bool,
    /// Treat values of these types as always equal.
    pub ignore_types: Vec<Type>,
}

impl EqualOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ignore_unexported(mut self) -> Self {
        self.ignore_unexported = true;
        self
    }

    pub fn ignore_type(mut self, ty: Type) -> Self {
        self.ignore_types.push(ty);
        self
    }
}

/// Deep equality: pointers and slices are compared through their contents,
/// funcs and chans by identity, nil only equals nil. Pointer cycles terminate.
pub fn deep_equal(a: &Value, b: &Value, opts: &EqualOptions) -> bool {
    let mut cmp = Comparer {
        opts,
        visited: HashSet::with_hasher(RandomState::new()),
    };
    cmp.equal(a, b)
}

struct Comparer<'a> {
    opts: &'a EqualOptions,
    visited: HashSet<(usize, usize), RandomState>,
}

impl Comparer<'_> {
    fn equal(&mut self, a: &Value, b: &Value) -> bool {
        if a.ty() != b.ty() {
            return false;
        }
        if self.opts.ignore_types.iter().any(|t| t == a.ty()) {
            return true;
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
                (Some(x), Some(y)) => {
                    if x.ptr_eq(y) || !self.visited.insert((x.addr(), y.addr())) {
                        return true;
                    }
                    self.equal(&x.load(), &y.load())
                }
                _ => false,
            },
            (Repr::Interface(x), Repr::Interface(y)) => match (x, y) {
                (None, None) => true,
                (Some(x), Some(y)) => self.equal(x, y),
                _ => false,
            },
            (Repr::Array(x), Repr::Array(y)) => self.equal_list(x, y),
            (Repr::Slice(x), Repr::Slice(y)) => match (x, y) {
                (None, None) => true,
                (Some(x), Some(y)) => {
                    if x.ptr_eq(y) || !self.visited.insert((x.addr(), y.addr())) {
                        return true;
                    }
                    self.equal_list(&x.snapshot(), &y.snapshot())
                }
                _ => false,
            },
            (Repr::Map(x), Repr::Map(y)) => match (x, y) {
                (None, None) => true,
                (Some(x), Some(y)) => {
                    if x.ptr_eq(y) || !self.visited.insert((x.addr(), y.addr())) {
                        return true;
                    }
                    if x.len() != y.len() {
                        return false;
                    }
                    for (k, xv) in x.snapshot() {
                        match y.get(&k) {
                            Some(yv) if self.equal(&xv, &yv) => {}
                            _ => return false,
                        }
                    }
                    true
                }
                _ => false,
            },
            (Repr::Struct(x), Repr::Struct(y)) => {
                let fields = a.ty().fields();
                for (i, (xf, yf)) in x.iter().zip(y.iter()).enumerate() {
                    let exported = fields.get(i).is_none_or(|f| f.is_exported());
                    if !exported && self.opts.ignore_unexported {
                        continue;
                    }
                    if !self.equal(xf, yf) {
                        return false;
                    }
                }
                true
            }
            (Repr::Func(x), Repr::Func(y)) => match (x, y) {
                (None, None) => true,
                (Some(x), Some(y)) => x.ptr_eq(y),
                _ => false,
            },
            (Repr::Chan(x), Repr::Chan(y)) => match (x, y) {
                (None, None) => true,
                (Some(x), Some(y)) => x.ptr_eq(y),
                _ => false,
            },
            _ => false,
        }
    }

    fn equal_list(&mut self, x: &[Value], y: &[Value]) -> bool {
        x.len() == y.len() && x.iter().zip(y.iter()).all(|(x, y)| self.equal(x, y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Field;

    fn pair() -> Type {
        Type::named("Pair")
            .define(&Type::struct_of(vec![
                Field::exported("A", Type::int()),
                Field::unexported("b", Type::int()),
            ]))
            .unwrap()
    }

    #[test]
    fn unexported_fields_can_be_ignored() {
        let t = pair();
        let x = Value::structure(&t, vec![Value::int(1), Value::int(2)]).unwrap();
        let y = Value::structure(&t, vec![Value::int(1), Value::int(3)]).unwrap();
        assert!(!deep_equal(&x, &y, &EqualOptions::new()));
        assert!(deep_equal(&x, &y, &EqualOptions::new().ignore_unexported()));
    }

    #[test]
    fn pointers_compare_through_pointees() {
        let x = Value::pointer_to(Value::int(5));
        let y = Value::pointer_to(Value::int(5));
        assert!(deep_equal(&x, &y, &EqualOptions::new()));
        y.set_elem(Value::int(6)).unwrap();
        assert!(!deep_equal(&x, &y, &EqualOptions::new()));
    }

    #[test]
    fn nil_slice_differs_from_empty() {
        let st = Type::slice_of(&Type::int());
        let empty = Value::slice(&st, vec![]).unwrap();
        let nil = Value::nil(&st).unwrap();
        assert!(!deep_equal(&empty, &nil, &EqualOptions::new()));
    }

    #[test]
    fn cyclic_pointers_terminate() {
        let decl = Type::named("Node");
        let node_ptr = Type::pointer_to(&decl.ty());
        let node = decl
            .define(&Type::struct_of(vec![Field::exported("Next", node_ptr)]))
            .unwrap();
        let make = || {
            let p = Value::pointer_to(Value::zero(&node));
            let n = Value::zero(&node).with_field("Next", p.clone()).unwrap();
            p.set_elem(n).unwrap();
            p
        };
        assert!(deep_equal(&make(), &make(), &EqualOptions::new()));
    }

    #[test]
    fn ignored_types_always_match() {
        let t = pair();
        let x = Value::structure(&t, vec![Value::int(1), Value::int(2)]).unwrap();
        let y = Value::structure(&t, vec![Value::int(9), Value::int(3)]).unwrap();
        assert!(deep_equal(&x, &y, &EqualOptions::new().ignore_type(t)));
    }
}

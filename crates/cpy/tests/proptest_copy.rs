mod common;

use common::*;
use cpy::Copier;
use cpy::cpy_core::{Repr, Type, Value};
use proptest::prelude::*;
use std::collections::{BTreeMap, HashSet};

#[derive(Clone, Debug)]
enum Tree {
    Int(i64),
    Str(String),
    List(Vec<Tree>),
    Dict(BTreeMap<String, Tree>),
    Ptr(Box<Tree>),
}

fn tree() -> impl Strategy<Value = Tree> {
    let leaf = prop_oneof![
        any::<i64>().prop_map(Tree::Int),
        "[a-z]{0,8}".prop_map(Tree::Str),
    ];
    leaf.prop_recursive(4, 48, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Tree::List),
            prop::collection::btree_map("[a-z]{1,4}", inner.clone(), 0..4).prop_map(Tree::Dict),
            inner.prop_map(|t| Tree::Ptr(Box::new(t))),
        ]
    })
}

/// Build an `interface {}` value from `t`.
fn build(t: &Tree) -> Value {
    let any = Type::any();
    let dynamic = match t {
        Tree::Int(i) => Value::int(*i),
        Tree::Str(s) => Value::string(s),
        Tree::List(items) => {
            Value::slice(&Type::slice_of(&any), items.iter().map(build).collect()).unwrap()
        }
        Tree::Dict(entries) => Value::map(
            &Type::map_of(&Type::string(), &any),
            entries
                .iter()
                .map(|(k, v)| (Value::string(k), build(v)))
                .collect(),
        )
        .unwrap(),
        Tree::Ptr(inner) => Value::pointer_to(build(inner)),
    };
    Value::interface(&any, dynamic).unwrap()
}

/// Storage addresses of every pointer, slice and map reachable from `v`.
fn storage(v: &Value, out: &mut HashSet<usize>) {
    if let Some(addr) = v.storage_addr() {
        if !out.insert(addr) {
            return;
        }
    }
    match v.repr() {
        Repr::Interface(Some(inner)) => storage(inner, out),
        Repr::Pointer(Some(p)) => storage(&p.load(), out),
        Repr::Slice(Some(s)) => s.snapshot().iter().for_each(|e| storage(e, out)),
        Repr::Map(Some(m)) => m.snapshot().iter().for_each(|(_, e)| storage(e, out)),
        Repr::Array(elems) | Repr::Struct(elems) => elems.iter().for_each(|e| storage(e, out)),
        _ => {}
    }
}

proptest! {
    #[test]
    fn copy_is_equal_and_disjoint(t in tree()) {
        let src = build(&t);
        let dst = Copier::new([]).unwrap().copy(&src).unwrap();
        prop_assert!(cpy::cpy_core::deep_equal(&dst, &src, &Default::default()));

        let mut src_addrs = HashSet::new();
        let mut dst_addrs = HashSet::new();
        storage(&src, &mut src_addrs);
        storage(&dst, &mut dst_addrs);
        prop_assert_eq!(src_addrs.len(), dst_addrs.len());
        prop_assert!(src_addrs.is_disjoint(&dst_addrs));
    }
}

proptest! {
    #[test]
    fn alias_preservation_does_not_change_tree_copies(t in tree()) {
        let src = build(&t);
        let plain = Copier::new([]).unwrap().copy(&src).unwrap();
        let preserving = Copier::new([cpy::Opt::preserve_aliases()]).unwrap().copy(&src).unwrap();
        prop_assert!(cpy::cpy_core::deep_equal(&plain, &preserving, &Default::default()));
    }
}

proptest! {
    #[test]
    fn unexported_policy_applies_to_any_pair(a in any::<i64>(), hidden in any::<i64>()) {
        let fx = fx();
        let src = fx.pair(&fx.m2, a, hidden);
        let dst = Copier::new([]).unwrap().copy(&src).unwrap();
        prop_assert_eq!(fx.pair_fields(&dst), (a, hidden));
        let ignored = copier_ignoring_unexported(vec![]).copy(&src).unwrap();
        prop_assert_eq!(fx.pair_fields(&ignored), (a, 0));
    }
}

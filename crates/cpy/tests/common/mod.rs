#![allow(dead_code)]

use cpy::cpy_core::{
    Complex, EqualOptions, Field, Kind, Repr, Type, Value, deep_equal,
};
use cpy::{Abort, Copier, Opt};
use std::sync::OnceLock;

/// Named types shared by every test in a binary. Named types are nominal, so
/// they must be declared once.
pub struct Fixtures {
    pub proto: Type,
    pub proto_m1: Type,
    pub proto_m2: Type,
    /// `Proto` through a pointer receiver.
    pub m: Type,
    /// `Proto` and `ProtoM1` through value receivers.
    pub m1: Type,
    /// `Proto` and `ProtoM2` through pointer receivers.
    pub m2: Type,
    pub location: Type,
    /// Only unexported fields.
    pub time: Type,
    pub header: Type,
    pub s: Type,
}

pub fn fx() -> &'static Fixtures {
    static FIXTURES: OnceLock<Fixtures> = OnceLock::new();
    FIXTURES.get_or_init(build)
}

fn pair_struct() -> Type {
    Type::struct_of(vec![
        Field::exported("A", Type::int()),
        Field::unexported("a", Type::int()),
    ])
}

fn build() -> Fixtures {
    let proto = Type::named("Proto")
        .define(&Type::interface_of(["Proto"]))
        .unwrap();
    let proto_m1 = Type::named("ProtoM1")
        .define(&Type::interface_of(["ProtoM1"]))
        .unwrap();
    let proto_m2 = Type::named("ProtoM2")
        .define(&Type::interface_of(["ProtoM2"]))
        .unwrap();
    let m = Type::named("M")
        .ptr_method("Proto")
        .define(&pair_struct())
        .unwrap();
    let m1 = Type::named("M1")
        .method("Proto")
        .method("ProtoM1")
        .define(&pair_struct())
        .unwrap();
    let m2 = Type::named("M2")
        .ptr_method("Proto")
        .ptr_method("ProtoM2")
        .define(&pair_struct())
        .unwrap();

    let location = Type::named("Location")
        .define(&Type::struct_of(vec![Field::unexported("name", Type::string())]))
        .unwrap();
    let time = Type::named("Time")
        .define(&Type::struct_of(vec![
            Field::unexported("wall", Type::basic(Kind::Uint64)),
            Field::unexported("ext", Type::basic(Kind::Int64)),
            Field::unexported("loc", Type::pointer_to(&location)),
        ]))
        .unwrap();
    let header = Type::named("Header")
        .define(&Type::struct_of(vec![
            Field::exported("Name", Type::string()),
            Field::exported("Size", Type::basic(Kind::Int64)),
            Field::exported(
                "PAXRecords",
                Type::map_of(&Type::string(), &Type::string()),
            ),
            Field::unexported("format", Type::int()),
        ]))
        .unwrap();

    let decl = Type::named("S");
    let fields = vec![
        Field::exported("B", Type::bool()),
        Field::exported("I", Type::int()),
        Field::exported("I8", Type::basic(Kind::Int8)),
        Field::exported("I16", Type::basic(Kind::Int16)),
        Field::exported("I32", Type::basic(Kind::Int32)),
        Field::exported("I64", Type::basic(Kind::Int64)),
        Field::exported("U", Type::uint()),
        Field::exported("U8", Type::basic(Kind::Uint8)),
        Field::exported("U16", Type::basic(Kind::Uint16)),
        Field::exported("U32", Type::basic(Kind::Uint32)),
        Field::exported("U64", Type::basic(Kind::Uint64)),
        Field::exported("F32", Type::basic(Kind::Float32)),
        Field::exported("F64", Type::float64()),
        Field::exported("C64", Type::basic(Kind::Complex64)),
        Field::exported("C128", Type::basic(Kind::Complex128)),
        Field::exported("S", Type::string()),
        Field::exported("Pt", Type::pointer_to(&decl.ty())),
        Field::exported("If", proto.clone()),
        Field::exported("Ar", Type::array_of(&Type::pointer_to(&m1), 32)),
        Field::exported("Sl", Type::slice_of(&m1)),
        Field::exported("Ma1", Type::map_of(&Type::string(), &m1)),
        Field::exported("Ma2", Type::map_of(&Type::pointer_to(&m1), &m1)),
        Field::exported("St", header.clone()),
        Field::exported("Ch", Type::chan_of(&Type::int())),
        Field::exported("Fn", Type::func_of(&[], &[Type::string()])),
        Field::exported("Ma", m.clone()),
        Field::exported("Mb", Type::pointer_to(&m)),
        Field::exported("M1a", m1.clone()),
        Field::exported("M1b", Type::pointer_to(&m1)),
        Field::exported("M2a", m2.clone()),
        Field::exported("M2b", Type::pointer_to(&m2)),
        Field::exported("Ti", time.clone()),
        Field::exported("PTi", Type::pointer_to(&time)),
    ];
    let s = decl.define(&Type::struct_of(fields)).unwrap();

    Fixtures {
        proto,
        proto_m1,
        proto_m2,
        m,
        m1,
        m2,
        location,
        time,
        header,
        s,
    }
}

impl Fixtures {
    /// Value of `M`, `M1` or `M2` with exported `A` and unexported `a`.
    pub fn pair(&self, ty: &Type, a: i64, hidden: i64) -> Value {
        Value::structure(ty, vec![Value::int(a), Value::int(hidden)]).unwrap()
    }

    pub fn ptr_pair(&self, ty: &Type, a: i64, hidden: i64) -> Value {
        Value::pointer_to(self.pair(ty, a, hidden))
    }

    /// `S` with the given fields set and every other field zero.
    pub fn s_with(&self, fields: Vec<(&str, Value)>) -> Value {
        fields
            .into_iter()
            .try_fold(Value::zero(&self.s), |acc, (name, v)| acc.with_field(name, v))
            .unwrap()
    }

    pub fn now(&self) -> Value {
        let loc = Value::structure(&self.location, vec![Value::string("Local")]).unwrap();
        Value::structure(
            &self.time,
            vec![
                prim(Kind::Uint64, Repr::Uint(13_944_124_000_123_456_789)),
                prim(Kind::Int64, Repr::Int(1_234_567)),
                Value::pointer_to(loc),
            ],
        )
        .unwrap()
    }

    pub fn proto_of(&self, v: Value) -> Value {
        Value::interface(&self.proto, v).unwrap()
    }

    /// Exported `A` and unexported `a` of an `M`-like struct.
    pub fn pair_fields(&self, v: &Value) -> (i64, i64) {
        let a = v.field("A").and_then(Value::as_int).unwrap();
        let hidden = v.field("a").and_then(Value::as_int).unwrap();
        (a, hidden)
    }
}

/// Copier with `opts` followed by the unexported-field policy.
pub fn copier_ignoring_unexported(mut opts: Vec<Opt>) -> Copier {
    opts.push(Opt::ignore_unexported_fields());
    Copier::new(opts).unwrap()
}

/// Field-by-field rebuild of a struct, or of the struct behind a pointer.
pub fn rebuild(v: &Value) -> Result<Value, Abort> {
    match v.repr() {
        Repr::Pointer(Some(p)) => Ok(Value::pointer_to(rebuild(&p.load())?)),
        Repr::Struct(fields) => {
            Value::structure(v.ty(), fields.to_vec()).map_err(|e| Abort::new(e.to_string()))
        }
        _ => Err(Abort::new(format!("unexpected {}", v.ty()))),
    }
}

/// Rebuild the dynamic value of a capability value and wrap it back into `iface`.
pub fn rebuild_dynamic(iface: &Type, v: &Value) -> Result<Value, Abort> {
    let inner = v.elem().ok_or("nil capability value")?;
    Value::interface(iface, rebuild(&inner)?).map_err(|e| Abort::new(e.to_string()))
}

pub fn prim(kind: Kind, repr: Repr) -> Value {
    Value::from_parts(Type::basic(kind), repr).unwrap()
}

pub fn complex(kind: Kind, re: f64, im: f64) -> Value {
    prim(kind, Repr::Complex(Complex::new(re, im)))
}

pub fn assert_deep_eq(got: &Value, want: &Value) {
    assert_deep_eq_with(got, want, &EqualOptions::new());
}

pub fn assert_deep_eq_with(got: &Value, want: &Value, opts: &EqualOptions) {
    assert!(
        deep_equal(got, want, opts),
        "copy mismatch:\n got: {got:?}\nwant: {want:?}"
    );
}

/// Storage address of the reference in field `name`.
pub fn field_addr(v: &Value, name: &str) -> Option<usize> {
    v.field(name).and_then(Value::storage_addr)
}

pub fn init_tracing() {
    if std::env::var_os("RUST_LOG").is_none() {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

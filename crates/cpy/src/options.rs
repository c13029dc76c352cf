//! Copier directives.

use cpy_core::{Type, Value};
use std::fmt;
use std::sync::Arc;

/// Failure reported by a copy function. Aborts the whole copy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Abort {
    message: String,
}

impl Abort {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Abort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Abort {}

impl From<&str> for Abort {
    fn from(message: &str) -> Self {
        Abort::new(message)
    }
}

impl From<String> for Abort {
    fn from(message: String) -> Self {
        Abort::new(message)
    }
}

pub type CopyFn = dyn Fn(Value) -> Result<Value, Abort> + Send + Sync;

/// A user copy function together with its declared signature.
#[derive(Clone)]
pub struct Binding {
    pub(crate) input: Type,
    pub(crate) output: Type,
    pub(crate) func: Arc<CopyFn>,
}

impl Binding {
    /// The type this function copies.
    pub fn accepted_type(&self) -> &Type {
        &self.input
    }

    /// Exact type match, or `ty` satisfies the accepted capability type.
    pub(crate) fn accepts(&self, ty: &Type) -> bool {
        self.input == *ty || ty.implements(&self.input)
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Binding(func({}) {})", self.input, self.output)
    }
}

/// A configuration directive passed to [`crate::Copier::new`].
#[derive(Clone, Debug)]
pub enum Opt {
    Func(Binding),
    Shallow(Vec<Type>),
    IgnoreUnexportedFields,
    PreserveAliases,
    MaxDepth(usize),
}

impl Opt {
    /// Register a copy function with the declared signature `func(input) output`.
    /// Input and output must be the same type; this is checked when the
    /// copier is built. Later registrations take precedence.
    pub fn func<F>(input: &Type, output: &Type, f: F) -> Opt
    where
        F: Fn(Value) -> Result<Value, Abort> + Send + Sync + 'static,
    {
        Opt::Func(Binding {
            input: input.clone(),
            output: output.clone(),
            func: Arc::new(f),
        })
    }

    /// Register a copy function mapping `ty` to itself.
    pub fn func_on<F>(ty: &Type, f: F) -> Opt
    where
        F: Fn(Value) -> Result<Value, Abort> + Send + Sync + 'static,
    {
        Opt::func(ty, ty, f)
    }

    /// Copy values of these concrete types by plain assignment, including
    /// their unexported state.
    pub fn shallow<I>(types: I) -> Opt
    where
        I: IntoIterator<Item = Type>,
    {
        Opt::Shallow(types.into_iter().collect())
    }

    /// Leave unexported struct fields at their zero value.
    pub fn ignore_unexported_fields() -> Opt {
        Opt::IgnoreUnexportedFields
    }

    /// Map repeated references to one clone within a single copy, which also
    /// makes cyclic graphs terminate.
    pub fn preserve_aliases() -> Opt {
        Opt::PreserveAliases
    }

    /// Abort instead of recursing deeper than `depth` nested values.
    pub fn max_depth(depth: usize) -> Opt {
        Opt::MaxDepth(depth)
    }
}

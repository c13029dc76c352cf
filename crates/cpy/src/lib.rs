//! Deep copies of arbitrary values.
//!
//! A [`Copier`] is configured once from [`Opt`] directives and then applied to
//! any number of values. For each value reached during a copy:
//! 1. a zero value (nil, 0, "", or a composite of zero values) is kept;
//! 2. the newest copy function accepting the value's type is called;
//! 3. otherwise the newest copy function accepting a pointer to the value's
//!    type is called on a fresh pointer;
//! 4. otherwise a shallow-marked type is copied by plain assignment;
//! 5. otherwise the value is copied according to its kind, recursing into
//!    pointees, elements, map values and struct fields.
//!
//! Map keys, funcs and chans are never copied; the clone shares them.

pub mod copier;
pub mod errors;
pub mod options;
pub mod registry;
pub mod resolver;
mod structural;

pub use copier::Copier;
pub use errors::{ConfigError, CopyError};
pub use options::{Abort, Binding, CopyFn, Opt};
pub use registry::{CopierConfig, OptionRegistry};
pub use resolver::Resolution;

pub use cpy_core;

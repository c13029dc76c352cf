//! Configuration and execution errors.

use cpy_core::ValueError;
use std::fmt;

pub mod messages {
    pub const MALFORMED_FUNC: &str = "Copy function must map a type to itself";
    pub const SHALLOW_INTERFACE: &str = "Only concrete types can be copied shallowly";
    pub const ZERO_DEPTH: &str = "Depth limit must be at least 1";
    pub const ABORTED: &str = "Copy function aborted";
    pub const BINDING_RESULT: &str = "Copy function returned a value of the wrong type";
    pub const DEPTH_EXCEEDED: &str = "Value nesting exceeds depth limit";
}

pub mod codes {
    pub const MALFORMED_FUNC: &str = "C0001";
    pub const SHALLOW_INTERFACE: &str = "C0002";
    pub const ZERO_DEPTH: &str = "C0003";
    pub const ABORTED: &str = "C0101";
    pub const BINDING_RESULT: &str = "C0102";
    pub const DEPTH_EXCEEDED: &str = "C0103";
}

/// Rejected directive; no copier is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    MalformedFunc { input: String, output: String },
    ShallowInterface { ty: String },
    ZeroDepth,
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::MalformedFunc { .. } => codes::MALFORMED_FUNC,
            ConfigError::ShallowInterface { .. } => codes::SHALLOW_INTERFACE,
            ConfigError::ZeroDepth => codes::ZERO_DEPTH,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.code())?;
        match self {
            ConfigError::MalformedFunc { input, output } => {
                write!(f, "{}: func({input}) {output}", messages::MALFORMED_FUNC)
            }
            ConfigError::ShallowInterface { ty } => {
                write!(f, "{}: {ty}", messages::SHALLOW_INTERFACE)
            }
            ConfigError::ZeroDepth => f.write_str(messages::ZERO_DEPTH),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Failed copy. The partial clone is dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CopyError {
    /// A copy function returned `Err`.
    Aborted { ty: String, message: String },
    BindingResult { expected: String, found: String },
    DepthExceeded { limit: usize },
    Value(ValueError),
}

impl CopyError {
    pub fn code(&self) -> &'static str {
        match self {
            CopyError::Aborted { .. } => codes::ABORTED,
            CopyError::BindingResult { .. } => codes::BINDING_RESULT,
            CopyError::DepthExceeded { .. } => codes::DEPTH_EXCEEDED,
            CopyError::Value(e) => e.code(),
        }
    }
}

impl fmt::Display for CopyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CopyError::Aborted { ty, message } => {
                write!(f, "[{}] {} for {ty}: {message}", self.code(), messages::ABORTED)
            }
            CopyError::BindingResult { expected, found } => write!(
                f,
                "[{}] {}: expected {expected}, found {found}",
                self.code(),
                messages::BINDING_RESULT
            ),
            CopyError::DepthExceeded { limit } => {
                write!(f, "[{}] {} ({limit})", self.code(), messages::DEPTH_EXCEEDED)
            }
            CopyError::Value(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CopyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CopyError::Value(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValueError> for CopyError {
    fn from(e: ValueError) -> Self {
        CopyError::Value(e)
    }
}

//! Public entry point.

use crate::errors::{ConfigError, CopyError};
use crate::options::Opt;
use crate::registry::{CopierConfig, OptionRegistry};
use crate::structural::Context;
use cpy_core::Value;
use std::fmt;
use std::sync::Arc;

/// Deep copier built once from directives and reused for any number of
/// copies, from any number of threads.
#[derive(Clone)]
pub struct Copier {
    registry: Arc<OptionRegistry>,
}

impl Copier {
    pub fn new<I>(opts: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = Opt>,
    {
        Self::with_config(CopierConfig::default(), opts)
    }

    /// Start from `config`; directives in `opts` are applied on top of it.
    pub fn with_config<I>(config: CopierConfig, opts: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = Opt>,
    {
        let registry = OptionRegistry::build(config, opts)?;
        Ok(Self {
            registry: Arc::new(registry),
        })
    }

    /// Independent clone of `v` with the same type. `v` is not modified.
    pub fn copy(&self, v: &Value) -> Result<Value, CopyError> {
        Context::new(&self.registry).copy(v)
    }

    pub fn config(&self) -> &CopierConfig {
        self.registry.config()
    }

    pub fn registry(&self) -> &OptionRegistry {
        &self.registry
    }
}

impl fmt::Debug for Copier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Copier")
            .field("bindings", &self.registry.bindings())
            .field("shallow", &self.registry.shallow.len())
            .field("config", self.registry.config())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn copier_is_shareable() {
        assert_send_sync::<Copier>();
        assert_send_sync::<Value>();
    }

    #[test]
    fn config_merges_directives() {
        let base = CopierConfig {
            max_depth: Some(64),
            ..CopierConfig::default()
        };
        let c = Copier::with_config(base, [Opt::ignore_unexported_fields(), Opt::max_depth(128)])
            .unwrap();
        assert!(c.config().ignore_unexported);
        assert!(!c.config().preserve_aliases);
        assert_eq!(c.config().max_depth, Some(64));
    }

    #[test]
    fn zero_depth_is_rejected() {
        assert_eq!(
            Copier::new([Opt::max_depth(0)]).unwrap_err(),
            ConfigError::ZeroDepth
        );
    }
}

//! Validated, immutable copier configuration.

use crate::errors::ConfigError;
use crate::options::{Binding, Opt};
use ahash::RandomState;
use cpy_core::Type;
use cpy_core::value::fast_hasher;
use hashbrown::HashSet;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CopierConfig {
    /// Leave unexported struct fields at their zero value.
    pub ignore_unexported: bool,
    /// Map repeated references within one copy to one clone.
    pub preserve_aliases: bool,
    pub max_depth: Option<usize>,
}

/// Copy functions in registration order, shallow-marked types, and policy flags.
pub struct OptionRegistry {
    pub(crate) bindings: Vec<Binding>,
    pub(crate) shallow: HashSet<Type, RandomState>,
    pub(crate) config: CopierConfig,
}

impl OptionRegistry {
    pub fn build<I>(config: CopierConfig, opts: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = Opt>,
    {
        let mut registry = OptionRegistry {
            bindings: Vec::new(),
            shallow: HashSet::with_hasher(fast_hasher()),
            config,
        };
        for opt in opts {
            registry.apply_opt(opt)?;
        }
        if registry.config.max_depth == Some(0) {
            return Err(ConfigError::ZeroDepth);
        }
        tracing::debug!(
            bindings = registry.bindings.len(),
            shallow = registry.shallow.len(),
            ignore_unexported = registry.config.ignore_unexported,
            preserve_aliases = registry.config.preserve_aliases,
            max_depth = ?registry.config.max_depth,
            "copier configured"
        );
        Ok(registry)
    }

    fn apply_opt(&mut self, opt: Opt) -> Result<(), ConfigError> {
        match opt {
            Opt::Func(binding) => {
                if binding.input != binding.output {
                    return Err(ConfigError::MalformedFunc {
                        input: binding.input.to_string(),
                        output: binding.output.to_string(),
                    });
                }
                self.bindings.push(binding);
            }
            Opt::Shallow(types) => {
                for ty in types {
                    if ty.is_interface() {
                        return Err(ConfigError::ShallowInterface { ty: ty.to_string() });
                    }
                    self.shallow.insert(ty);
                }
            }
            Opt::IgnoreUnexportedFields => self.config.ignore_unexported = true,
            Opt::PreserveAliases => self.config.preserve_aliases = true,
            Opt::MaxDepth(depth) => {
                self.config.max_depth = Some(match self.config.max_depth {
                    Some(current) => current.min(depth),
                    None => depth,
                });
            }
        }
        Ok(())
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn is_shallow(&self, ty: &Type) -> bool {
        self.shallow.contains(ty)
    }

    pub fn config(&self) -> &CopierConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpy_core::Value;

    #[test]
    fn directives_are_applied_in_order() {
        let t = Type::named("T").define(&Type::int()).unwrap();
        let reg = OptionRegistry::build(
            CopierConfig::default(),
            [
                Opt::func_on(&t, Ok),
                Opt::shallow([Type::string()]),
                Opt::func_on(&Type::string(), |v: Value| Ok(v)),
                Opt::ignore_unexported_fields(),
                Opt::max_depth(8),
            ],
        )
        .unwrap();
        let accepted: Vec<&Type> = reg.bindings().iter().map(Binding::accepted_type).collect();
        assert_eq!(accepted, [&t, &Type::string()]);
        assert!(reg.is_shallow(&Type::string()));
        assert!(reg.config().ignore_unexported);
        assert_eq!(reg.config().max_depth, Some(8));
    }

    #[test]
    fn first_invalid_directive_stops_the_build() {
        let err = OptionRegistry::build(
            CopierConfig::default(),
            [
                Opt::shallow([Type::any()]),
                Opt::func(&Type::int(), &Type::string(), Ok),
            ],
        )
        .err();
        assert_eq!(
            err,
            Some(ConfigError::ShallowInterface {
                ty: "interface {}".to_string()
            })
        );
    }
}

//! Per-run context.
//!
//! One [`Environment`] is built at the start of a run, passed explicitly to
//! every consumer call, and dropped when the run ends. It owns the option map,
//! the logger and the run memo, so nothing memoised in a run can leak into the
//! next one.

use std::{cell::RefCell, collections::HashMap, rc::Rc};

use indexmap::IndexMap;

use crate::{
    error::Result,
    logger::{GuardedLogger, Logger, TracingLogger},
    types::TypeRef,
    utils::toml_value_to_string,
};

/// Run-scoped lookup memo, keyed by host-chosen strings.
#[derive(Debug, Default)]
pub struct RunMemo {
    types: RefCell<HashMap<String, Result<TypeRef>>>,
}

impl RunMemo {
    /// Return the memoised type for `key`, computing it with `resolve` on first
    /// use. `resolve` may itself consult the memo.
    pub fn type_ref(&self, key: &str, resolve: impl FnOnce() -> Result<TypeRef>) -> Result<TypeRef> {
        if let Some(hit) = self.types.borrow().get(key) {
            return hit.clone();
        }
        let value = resolve();
        self.types
            .borrow_mut()
            .insert(key.to_string(), value.clone());
        value
    }

    pub fn len(&self) -> usize {
        self.types.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.borrow().is_empty()
    }
}

/// The per-run environment handed to every consumer.
pub struct Environment {
    options: IndexMap<String, String>,
    logger: GuardedLogger,
    memo: RunMemo,
}

impl Environment {
    /// An environment with no options, logging through `tracing`.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> EnvironmentBuilder {
        EnvironmentBuilder::default()
    }

    /// The option for `key`, or `default` when it is not set.
    pub fn option<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.options.get(key).map(String::as_str).unwrap_or(default)
    }

    /// Parse an option; `default` when unset or unparsable.
    pub fn option_parsed<T: std::str::FromStr>(&self, key: &str, default: T) -> T {
        self.options
            .get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// All options, in the order they were supplied.
    pub fn options(&self) -> impl Iterator<Item = (&str, &str)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The run's logger. Never fails and never panics.
    pub fn logger(&self) -> &dyn Logger {
        &self.logger
    }

    pub fn memo(&self) -> &RunMemo {
        &self.memo
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("options", &self.options)
            .field("memo_entries", &self.memo.len())
            .finish_non_exhaustive()
    }
}

/// Builds an [`Environment`] from host configuration.
#[derive(Default)]
pub struct EnvironmentBuilder {
    options: IndexMap<String, String>,
    logger: Option<Rc<dyn Logger>>,
}

impl EnvironmentBuilder {
    /// Set one option. Later values replace earlier ones.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn options<K, V>(mut self, options: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in options {
            self.options.insert(key.into(), value.into());
        }
        self
    }

    /// Merge options from TOML text. Nested tables become dotted keys:
    /// `[table] prefix = "sys_"` sets `table.prefix`.
    pub fn toml(mut self, text: &str) -> std::result::Result<Self, toml::de::Error> {
        let table: toml::Table = toml::from_str(text)?;
        flatten_table("", &table, &mut self.options);
        Ok(self)
    }

    /// Merge options from an already parsed TOML table.
    pub fn toml_table(mut self, table: &toml::Table) -> Self {
        flatten_table("", table, &mut self.options);
        self
    }

    /// Merge variables starting with `prefix`. The remainder is lower-cased
    /// and `_` becomes `.`: with prefix `LSI_`, `LSI_TABLE_PREFIX` sets
    /// `table.prefix`.
    pub fn env_prefixed<K, V>(mut self, prefix: &str, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in vars {
            if let Some(rest) = key.as_ref().strip_prefix(prefix) {
                if rest.is_empty() {
                    continue;
                }
                let key = rest.to_lowercase().replace('_', ".");
                self.options.insert(key, value.into());
            }
        }
        self
    }

    pub fn logger(mut self, logger: Rc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn build(self) -> Environment {
        let logger = self
            .logger
            .unwrap_or_else(|| Rc::new(TracingLogger) as Rc<dyn Logger>);
        Environment {
            options: self.options,
            logger: GuardedLogger::new(logger),
            memo: RunMemo::default(),
        }
    }
}

fn flatten_table(prefix: &str, table: &toml::Table, out: &mut IndexMap<String, String>) {
    for (key, value) in table {
        let full = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            toml::Value::Table(inner) => flatten_table(&full, inner, out),
            other => {
                out.insert(full, toml_value_to_string(other));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::{Error, UnresolvedReason},
        logger::DiagnosticLogger,
    };

    #[test]
    fn test_option_defaults() {
        let env = Environment::builder().option("table.prefix", "sys_").build();
        assert_eq!(env.option("table.prefix", ""), "sys_");
        assert_eq!(env.option("missing", "fallback"), "fallback");
        assert_eq!(env.option_parsed("missing", 7u32), 7);
    }

    #[test]
    fn test_toml_options() {
        let env = Environment::builder()
            .toml(
                r#"
                dialect = "postgres"
                [table]
                prefix = "sys_"
                comments = true
                "#,
            )
            .expect("valid toml")
            .build();

        assert_eq!(env.option("dialect", ""), "postgres");
        assert_eq!(env.option("table.prefix", ""), "sys_");
        assert!(env.option_parsed("table.comments", false));
        assert_eq!(env.options().count(), 3);
    }

    #[test]
    fn test_env_prefixed_options() {
        let env = Environment::builder()
            .env_prefixed(
                "LSI_",
                vec![
                    ("LSI_TABLE_PREFIX", "t_"),
                    ("PATH", "/usr/bin"),
                    ("LSI_", "ignored"),
                ],
            )
            .build();
        assert_eq!(env.option("table.prefix", ""), "t_");
        assert_eq!(env.options().count(), 1);
    }

    #[test]
    fn test_logger_is_injected() {
        let sink = Rc::new(DiagnosticLogger::new());
        let env = Environment::builder().logger(sink.clone()).build();
        env.logger().warn("advisory");
        env.logger().error("failure");
        assert_eq!(sink.warning_count(), 1);
        assert_eq!(sink.error_count(), 1);
    }

    #[test]
    fn test_memo_computes_once() {
        let env = Environment::new();
        let mut calls = 0;
        for _ in 0..3 {
            let ty = env.memo().type_ref("crate::User#String", || {
                calls += 1;
                Ok(TypeRef::named("std::string::String"))
            });
            assert_eq!(ty.unwrap(), TypeRef::named("std::string::String"));
        }
        assert_eq!(calls, 1);

        let missing = env.memo().type_ref("crate::User#Role", || {
            Err(Error::unresolved(
                "crate::User.role",
                UnresolvedReason::UnknownType("Role".into()),
            ))
        });
        assert!(missing.unwrap_err().is_unresolved());
        assert_eq!(env.memo().len(), 2);
    }
}

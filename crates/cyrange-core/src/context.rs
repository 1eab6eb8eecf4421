//! Variable bindings for range descriptor templates.

use std::collections::HashMap;

use crate::session::RangeId;

/// Template variable holding the allocated range id.
pub const CLONE_RANGE_ID: &str = "clone_range_id";
/// Template variable holding the requested instance count.
pub const CLONE_INSTANCE_NUMBER: &str = "clone_instance_number";

/// Per-invocation name to value map used by the template engine.
///
/// Built fresh for every instantiation and discarded afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateContext {
    vars: HashMap<String, String>,
}

impl TemplateContext {
    /// Create an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context from existing bindings.
    #[must_use]
    pub fn with_vars(vars: HashMap<String, String>) -> Self {
        Self { vars }
    }

    /// Bind the computed per-call variables.
    #[must_use]
    pub fn with_range(mut self, range_id: RangeId, instance_count: u32) -> Self {
        self.set(CLONE_RANGE_ID, range_id.to_string());
        self.set(CLONE_INSTANCE_NUMBER, instance_count.to_string());
        self
    }

    /// Get a bound value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Bind a value, replacing any previous binding.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }
}

impl<K, V> FromIterator<(K, V)> for TemplateContext
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

//! Environment lookup collaborators.

use std::collections::HashMap;
use std::fmt;

/// Resolves an environment variable name to its value.
pub trait EnvLookup: fmt::Debug {
    fn get(&self, name: &str) -> Option<String>;
}

/// Reads from the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// In-memory environment, useful for tests and for sandboxed evaluation.
///
/// # Examples
///
/// ```
/// use argrules_core::{EnvLookup, MapEnv};
///
/// let env = MapEnv::new().with("POWER_LEVEL", "10");
/// assert_eq!(env.get("POWER_LEVEL").as_deref(), Some("10"));
/// assert_eq!(env.get("MISSING"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a variable.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl EnvLookup for MapEnv {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

impl<K, V> FromIterator<(K, V)> for MapEnv
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

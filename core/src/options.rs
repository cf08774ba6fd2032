//! Immutable result set of a parse or document merge.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::value::Value;

static EMPTY_MAP: BTreeMap<String, String> = BTreeMap::new();
static EMPTY_OPTIONS: Options = Options {
    values: BTreeMap::new(),
    groups: BTreeMap::new(),
    extra: Vec::new(),
};

/// Resolved values keyed by rule name, with nested group views.
///
/// Accessors return the type's zero value for unset keys, so callers can
/// read optional settings without unwrapping. Use [`get`](Self::get) or
/// [`is_set`](Self::is_set) to tell "unset" from "zero".
///
/// A snapshot is never changed after it is returned; a later parse or
/// [`Parser::apply`](crate::Parser::apply) produces a new one.
///
/// # Examples
///
/// ```
/// use argrules_core::Parser;
///
/// let mut parser = Parser::new();
/// parser.add_option("--power-level").count();
/// parser.in_group("database").add_option("--hostname");
///
/// let opts = parser
///     .parse_args(&["--power-level", "--hostname", "mysql.com"])
///     .unwrap();
/// assert_eq!(opts.int("power-level"), 1);
/// assert_eq!(opts.group("database").string("hostname"), "mysql.com");
/// assert_eq!(opts.group("missing").string("hostname"), "");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Options {
    #[serde(flatten)]
    values: BTreeMap<String, Value>,
    #[serde(flatten)]
    groups: BTreeMap<String, Options>,
    #[serde(skip)]
    extra: Vec<String>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, group: Option<&str>, name: &str, value: Value) {
        let target = match group {
            Some(group) => self.group_mut(group),
            None => self,
        };
        target.values.insert(name.to_string(), value);
    }

    pub(crate) fn group_mut(&mut self, group: &str) -> &mut Options {
        self.groups.entry(group.to_string()).or_default()
    }

    pub(crate) fn set_extra(&mut self, extra: Vec<String>) {
        self.extra = extra;
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Integer or counter value, `0` when unset.
    pub fn int(&self, name: &str) -> i64 {
        self.get(name).and_then(Value::as_int).unwrap_or(0)
    }

    /// String value, `""` when unset.
    pub fn string(&self, name: &str) -> &str {
        self.get(name).and_then(Value::as_str).unwrap_or("")
    }

    /// Boolean value, `false` when unset.
    pub fn bool(&self, name: &str) -> bool {
        self.get(name).and_then(Value::as_bool).unwrap_or(false)
    }

    /// String slice value, empty when unset.
    pub fn string_slice(&self, name: &str) -> &[String] {
        self.get(name).and_then(Value::as_list).unwrap_or(&[])
    }

    /// String map value, empty when unset.
    pub fn string_map(&self, name: &str) -> &BTreeMap<String, String> {
        self.get(name).and_then(Value::as_map).unwrap_or(&EMPTY_MAP)
    }

    /// Sub-view for a group, empty when the group does not exist.
    pub fn group(&self, name: &str) -> &Options {
        self.groups.get(name).unwrap_or(&EMPTY_OPTIONS)
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.groups.contains_key(name)
    }

    /// Names of the nested groups.
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Values of this view, without nested groups.
    pub fn to_map(&self) -> &BTreeMap<String, Value> {
        &self.values
    }

    /// Tokens left over after every declared positional was filled.
    pub fn extra(&self) -> &[String] {
        &self.extra
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.groups.is_empty()
    }
}

//! Typed values stored in an [`Options`](crate::Options) snapshot.

use std::collections::BTreeMap;

use serde::Serialize;

/// Generic nested key/value tree produced by a document loader (INI, JSON,
/// YAML). Nested objects map 1:1 to rule groups.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// A resolved, typed rule value.
///
/// Serializes untagged, so a snapshot renders as plain JSON/YAML scalars,
/// lists and mappings.
///
/// # Examples
///
/// ```
/// use argrules_core::Value;
///
/// let v = Value::List(vec!["a".into(), "b".into()]);
/// assert_eq!(serde_json::to_string(&v).unwrap(), r#"["a","b"]"#);
/// assert_eq!(Value::Int(3).as_int(), Some(3));
/// assert_eq!(Value::Bool(true).as_int(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Integer (also used for counters).
    Int(i64),
    /// Plain string.
    Str(String),
    /// Boolean flag.
    Bool(bool),
    /// String slice.
    List(Vec<String>),
    /// String map.
    Map(BTreeMap<String, String>),
}

impl Value {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }
}

/// Conversion from a resolved [`Value`] into a caller-owned type.
///
/// Used by store bindings; a mismatched variant converts to the type's
/// zero value.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Self;
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Self {
        value.as_int().unwrap_or_default()
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Self {
        value.as_str().map(String::from).unwrap_or_default()
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Self {
        value.as_bool().unwrap_or_default()
    }
}

impl FromValue for Vec<String> {
    fn from_value(value: &Value) -> Self {
        value.as_list().map(<[String]>::to_vec).unwrap_or_default()
    }
}

impl FromValue for BTreeMap<String, String> {
    fn from_value(value: &Value) -> Self {
        value.as_map().cloned().unwrap_or_default()
    }
}

//! Value accumulation per cast type.
//!
//! Every [`CastType`] implements the same contract so the matching engine
//! never branches on type:
//!
//! - [`CastType::accepts_argument`]: whether an occurrence consumes the next
//!   token.
//! - [`CastType::consume`]: fold one CLI occurrence into the accumulated
//!   value.
//! - [`CastType::cast`] / [`CastType::cast_document`]: convert a fallback
//!   source (environment, default, document) in one step.
//! - [`CastType::finalize`]: value for a rule nothing resolved.

use std::collections::BTreeMap;

use serde_json::Value as Json;

use crate::rule::CastType;
use crate::value::Value;

/// A raw value that failed its cast. The caller attaches the origin name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CastFailure {
    pub value: String,
    pub expected: &'static str,
}

impl CastFailure {
    fn new(value: impl Into<String>, expected: &'static str) -> Self {
        Self {
            value: value.into(),
            expected,
        }
    }
}

type CastResult = std::result::Result<Value, CastFailure>;

impl CastType {
    /// `false` only for `count` and `bool`.
    pub fn accepts_argument(self) -> bool {
        !matches!(self, Self::Count | Self::Bool)
    }

    /// Noun phrase used in cast error messages.
    pub fn expected(self) -> &'static str {
        match self {
            Self::Count | Self::Int => "an Integer",
            Self::String => "a String",
            Self::Bool => "a Boolean",
            Self::StringSlice => "a String Slice",
            Self::StringMap => "a String Map",
        }
    }

    /// Folds one command-line occurrence into `existing`.
    ///
    /// `raw` is the consumed argument; it is `None` for types that take no
    /// argument.
    ///
    /// # Examples
    ///
    /// ```
    /// use argrules_core::{CastType, Value};
    ///
    /// let once = CastType::StringSlice.consume(None, Some("a,b")).unwrap();
    /// assert_eq!(once, Value::List(vec!["a".into(), "b".into()]));
    ///
    /// // A repeated occurrence appends the token as a single element.
    /// let twice = CastType::StringSlice.consume(Some(once), Some("c,d")).unwrap();
    /// assert_eq!(twice.as_list().unwrap(), ["a", "b", "c,d"]);
    ///
    /// let count = CastType::Count.consume(Some(Value::Int(2)), None).unwrap();
    /// assert_eq!(count, Value::Int(3));
    /// ```
    pub fn consume(self, existing: Option<Value>, raw: Option<&str>) -> CastResult {
        let raw = raw.unwrap_or_default();
        match self {
            Self::Count => {
                let n = existing.and_then(|v| v.as_int()).unwrap_or(0);
                Ok(Value::Int(n + 1))
            }
            Self::Bool => Ok(Value::Bool(true)),
            Self::Int => parse_int(raw),
            Self::String => Ok(Value::Str(raw.to_string())),
            Self::StringSlice => match existing {
                Some(Value::List(mut items)) => {
                    items.push(raw.to_string());
                    Ok(Value::List(items))
                }
                _ => Ok(Value::List(split_list(raw))),
            },
            Self::StringMap => {
                let mut map = match existing {
                    Some(Value::Map(map)) => map,
                    _ => BTreeMap::new(),
                };
                map.extend(parse_map(raw)?);
                Ok(Value::Map(map))
            }
        }
    }

    /// Casts a raw environment or default string in one step.
    ///
    /// Unlike [`consume`](Self::consume), `count` and `bool` parse the
    /// string rather than recording an occurrence.
    pub fn cast(self, raw: &str) -> CastResult {
        match self {
            Self::Count | Self::Int => parse_int(raw),
            Self::Bool => parse_bool(raw),
            Self::String | Self::StringSlice | Self::StringMap => self.consume(None, Some(raw)),
        }
    }

    /// Casts a value taken from a loaded document.
    ///
    /// Strings go through [`cast`](Self::cast); native numbers, booleans,
    /// arrays and objects are accepted where they fit the type.
    pub fn cast_document(self, value: &Json) -> CastResult {
        if let Json::String(s) = value {
            return self.cast(s);
        }
        match (self, value) {
            (Self::Count | Self::Int, Json::Number(n)) => n
                .as_i64()
                .map(Value::Int)
                .ok_or_else(|| CastFailure::new(n.to_string(), self.expected())),
            (Self::Bool, Json::Bool(b)) => Ok(Value::Bool(*b)),
            (Self::String, Json::Number(_) | Json::Bool(_)) => Ok(Value::Str(value.to_string())),
            (Self::StringSlice, Json::Array(items)) => items
                .iter()
                .map(|item| scalar_to_string(item).ok_or_else(|| self.fail_json(value)))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(Value::List),
            (Self::StringMap, Json::Object(_)) => json_object_to_map(value)
                .map(Value::Map)
                .ok_or_else(|| self.fail_json(value)),
            _ => Err(self.fail_json(value)),
        }
    }

    /// Value for a rule that nothing resolved: `0` for counters, `false`
    /// for booleans, unset for everything else.
    pub fn finalize(self, existing: Option<Value>) -> Option<Value> {
        match (self, existing) {
            (_, Some(value)) => Some(value),
            (Self::Count, None) => Some(Value::Int(0)),
            (Self::Bool, None) => Some(Value::Bool(false)),
            _ => None,
        }
    }

    fn fail_json(self, value: &Json) -> CastFailure {
        CastFailure::new(value.to_string(), self.expected())
    }
}

fn parse_int(raw: &str) -> CastResult {
    raw.trim()
        .parse::<i64>()
        .map(Value::Int)
        .map_err(|_| CastFailure::new(raw, CastType::Int.expected()))
}

fn parse_bool(raw: &str) -> CastResult {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "yes" | "y" | "on" => Ok(Value::Bool(true)),
        "0" | "f" | "false" | "no" | "n" | "off" | "" => Ok(Value::Bool(false)),
        _ => Err(CastFailure::new(raw, CastType::Bool.expected())),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(',').map(|item| item.trim().to_string()).collect()
}

/// Parses `k=v,k2=v2` or a JSON object literal.
fn parse_map(raw: &str) -> std::result::Result<BTreeMap<String, String>, CastFailure> {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') {
        let json: Json = serde_json::from_str(trimmed)
            .map_err(|_| CastFailure::new(raw, CastType::StringMap.expected()))?;
        return json_object_to_map(&json)
            .ok_or_else(|| CastFailure::new(raw, CastType::StringMap.expected()));
    }

    let mut map = BTreeMap::new();
    for pair in trimmed.split(',').filter(|pair| !pair.trim().is_empty()) {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(CastFailure::new(raw, CastType::StringMap.expected()));
        };
        map.insert(key.trim().to_string(), value.trim().to_string());
    }
    Ok(map)
}

fn scalar_to_string(value: &Json) -> Option<String> {
    match value {
        Json::String(s) => Some(s.clone()),
        Json::Number(_) | Json::Bool(_) => Some(value.to_string()),
        Json::Null | Json::Array(_) | Json::Object(_) => None,
    }
}

/// Flattens a JSON object of scalars into a string map.
pub(crate) fn json_object_to_map(value: &Json) -> Option<BTreeMap<String, String>> {
    value
        .as_object()?
        .iter()
        .map(|(key, value)| scalar_to_string(value).map(|value| (key.clone(), value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn map(pairs: &[(&str, &str)]) -> Value {
        Value::Map(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_accepts_argument() {
        assert!(!CastType::Count.accepts_argument());
        assert!(!CastType::Bool.accepts_argument());
        assert!(CastType::Int.accepts_argument());
        assert!(CastType::StringMap.accepts_argument());
    }

    #[test]
    fn test_int_rejects_non_numeric() {
        let err = CastType::Int
            .consume(None, Some("over-ten-thousand"))
            .unwrap_err();
        assert_eq!(err.value, "over-ten-thousand");
        assert_eq!(err.expected, "an Integer");
    }

    #[test]
    fn test_slice_split_and_repeat_agree() {
        let split = CastType::StringSlice.consume(None, Some("a,b,c")).unwrap();

        let mut repeated = None;
        for token in ["a", "b", "c"] {
            repeated = Some(CastType::StringSlice.consume(repeated, Some(token)).unwrap());
        }
        assert_eq!(Some(split), repeated);
    }

    #[test]
    fn test_map_merges_and_later_wins() {
        let first = CastType::StringMap
            .consume(None, Some("blue=bell,cat=dog"))
            .unwrap();
        let second = CastType::StringMap
            .consume(Some(first), Some(r#"{"cat":"mouse","dad":"boy"}"#))
            .unwrap();
        assert_eq!(
            second,
            map(&[("blue", "bell"), ("cat", "mouse"), ("dad", "boy")])
        );
    }

    #[test]
    fn test_map_rejects_malformed_json() {
        let err = CastType::StringMap
            .consume(None, Some(r#"{"belt":"car""#))
            .unwrap_err();
        assert_eq!(err.expected, "a String Map");
    }

    #[test]
    fn test_map_rejects_pair_without_equals() {
        assert!(CastType::StringMap.consume(None, Some("a=b,c")).is_err());
    }

    #[test]
    fn test_cast_parses_count_and_bool() {
        assert_eq!(CastType::Count.cast("3").unwrap(), Value::Int(3));
        assert_eq!(CastType::Bool.cast("TRUE").unwrap(), Value::Bool(true));
        assert_eq!(CastType::Bool.cast("off").unwrap(), Value::Bool(false));
        assert!(CastType::Bool.cast("maybe").is_err());
    }

    #[test]
    fn test_cast_document_native_values() {
        assert_eq!(
            CastType::Count.cast_document(&json!(3)).unwrap(),
            Value::Int(3)
        );
        assert_eq!(
            CastType::StringSlice
                .cast_document(&json!(["a", 1, true]))
                .unwrap(),
            Value::List(vec!["a".into(), "1".into(), "true".into()])
        );
        assert_eq!(
            CastType::StringMap
                .cast_document(&json!({"k": "v", "n": 2}))
                .unwrap(),
            map(&[("k", "v"), ("n", "2")])
        );
        assert!(CastType::Int.cast_document(&json!([1])).is_err());
        assert!(CastType::Bool.cast_document(&json!(1.5)).is_err());
    }

    #[test]
    fn test_finalize_zero_values() {
        assert_eq!(CastType::Count.finalize(None), Some(Value::Int(0)));
        assert_eq!(CastType::Bool.finalize(None), Some(Value::Bool(false)));
        assert_eq!(CastType::Int.finalize(None), None);
        assert_eq!(
            CastType::Int.finalize(Some(Value::Int(5))),
            Some(Value::Int(5))
        );
    }
}

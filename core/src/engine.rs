//! The matching engine.
//!
//! A pass runs in three steps:
//!
//! 1. [`scan`] walks the tokens left to right, once, and classifies each
//!    one as an escaped literal, an option, a command or a positional.
//! 2. [`resolve`] fills every rule the scan did not see from the fallback
//!    chain: environment, then document, then declared default.
//! 3. [`check_required`], [`build_options`] and [`write_bindings`] turn the
//!    resolved values into a snapshot.

use serde_json::Value as Json;
use tracing::{debug, trace};

use crate::accumulate::CastFailure;
use crate::command::Command;
use crate::env::EnvLookup;
use crate::error::{ParseError, Result};
use crate::options::Options;
use crate::registry::Registry;
use crate::rule::{Flags, Rule, is_escaped, unescape};
use crate::value::{Document, Value};

/// Command found during a scan, with the tokens that follow it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Dispatch {
    pub index: usize,
    pub rest: Vec<String>,
}

/// Raw result of a token scan, one slot per rule.
#[derive(Debug)]
pub(crate) struct Scan {
    pub values: Vec<Option<Value>>,
    pub extra: Vec<String>,
    pub dispatch: Option<Dispatch>,
}

/// Fallback sources consulted for rules the scan did not see.
pub(crate) struct Sources<'a> {
    pub env: &'a dyn EnvLookup,
    pub document: Option<&'a Document>,
}

fn invalid(origin: &str, failure: CastFailure) -> ParseError {
    ParseError::InvalidValue {
        origin: origin.to_string(),
        value: failure.value,
        expected: failure.expected,
    }
}

/// Classifies every token against the registry.
///
/// Clears the `SEEN` flag on every rule first, so a registry can be scanned
/// again on a later pass.
pub(crate) fn scan(registry: &mut Registry, tokens: &[String], commands: &[Command]) -> Result<Scan> {
    registry.clear_flags(Flags::SEEN);

    let positionals: Vec<usize> = registry.positionals_in_order().collect();
    let mut positionals = positionals.into_iter();
    let mut values: Vec<Option<Value>> = vec![None; registry.len()];
    let mut extra = Vec::new();
    let mut positional_consumed = false;

    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        i += 1;

        if is_escaped(token) {
            positional_consumed = true;
            assign_positional(registry, &mut values, positionals.next(), unescape(token), &mut extra)?;
            continue;
        }

        if let Some(idx) = registry.lookup(token) {
            let rule = &registry.rules()[idx];
            trace!(token = %token, rule = %rule.name, "Matched option");
            if rule.is_help() {
                debug!(token = %token, "Help requested");
                return Err(ParseError::HelpRequested);
            }

            let cast = rule.cast;
            let arg = if cast.accepts_argument() {
                match tokens.get(i) {
                    Some(next) if registry.lookup(next).is_none() => {
                        i += 1;
                        Some(next.as_str())
                    }
                    _ => {
                        return Err(ParseError::MissingArgument {
                            option: token.clone(),
                        });
                    }
                }
            } else {
                None
            };

            let value = cast
                .consume(values[idx].take(), arg)
                .map_err(|failure| invalid(token, failure))?;
            values[idx] = Some(value);
            registry.rule_mut(idx).flags.set(Flags::SEEN);
            continue;
        }

        if !positional_consumed {
            if let Some(index) = commands.iter().position(|command| command.name == *token) {
                debug!(command = %token, remaining = tokens.len() - i, "Matched command");
                return Ok(Scan {
                    values,
                    extra,
                    dispatch: Some(Dispatch {
                        index,
                        rest: tokens[i..].to_vec(),
                    }),
                });
            }
        }

        positional_consumed = true;
        assign_positional(registry, &mut values, positionals.next(), token.clone(), &mut extra)?;
    }

    Ok(Scan {
        values,
        extra,
        dispatch: None,
    })
}

fn assign_positional(
    registry: &mut Registry,
    values: &mut [Option<Value>],
    slot: Option<usize>,
    token: String,
    extra: &mut Vec<String>,
) -> Result<()> {
    let Some(idx) = slot else {
        trace!(token = %token, "No positional left, keeping as extra");
        extra.push(token);
        return Ok(());
    };

    let rule = &registry.rules()[idx];
    let value = rule
        .cast
        .consume(None, Some(&token))
        .map_err(|failure| invalid(&rule.name, failure))?;
    trace!(token = %token, rule = %rule.name, "Assigned positional");
    values[idx] = Some(value);
    registry.rule_mut(idx).flags.set(Flags::SEEN);
    Ok(())
}

/// Applies the fallback chain to every rule not seen on the command line,
/// then finalizes each slot.
pub(crate) fn resolve(
    registry: &Registry,
    mut values: Vec<Option<Value>>,
    sources: &Sources<'_>,
) -> Result<Vec<Option<Value>>> {
    for (idx, rule) in registry.rules().iter().enumerate() {
        if !rule.flags.contains(Flags::SEEN) {
            values[idx] = fallback(rule, sources)?;
        }
        values[idx] = rule.cast.finalize(values[idx].take());
    }
    Ok(values)
}

fn fallback(rule: &Rule, sources: &Sources<'_>) -> Result<Option<Value>> {
    if let Some(var) = &rule.env {
        if let Some(raw) = sources.env.get(var) {
            debug!(rule = %rule.name, env = %var, "Resolved from environment");
            return rule
                .cast
                .cast(&raw)
                .map(Some)
                .map_err(|failure| invalid(var, failure));
        }
    }

    if let Some(document) = sources.document {
        if let Some(value) = document_value(document, rule) {
            let key = match &rule.group {
                Some(group) => format!("{group}.{}", rule.name),
                None => rule.name.clone(),
            };
            debug!(rule = %rule.name, key = %key, "Resolved from document");
            return rule
                .cast
                .cast_document(value)
                .map(Some)
                .map_err(|failure| invalid(&key, failure));
        }
    }

    if let Some(raw) = &rule.default {
        trace!(rule = %rule.name, "Resolved from default");
        return rule
            .cast
            .cast(raw)
            .map(Some)
            .map_err(|failure| ParseError::BadDefault {
                option: rule.display_name().to_string(),
                value: failure.value,
                expected: failure.expected,
            });
    }

    Ok(None)
}

/// Finds a rule's entry in a document; grouped rules live one level down.
fn document_value<'a>(document: &'a Document, rule: &Rule) -> Option<&'a Json> {
    let scope = match &rule.group {
        Some(group) => document.get(group)?.as_object()?,
        None => document,
    };
    scope.get(&rule.name).filter(|value| !value.is_null())
}

/// Fails on the first required rule left without a value.
pub(crate) fn check_required(registry: &Registry, values: &[Option<Value>]) -> Result<()> {
    for (rule, value) in registry.rules().iter().zip(values) {
        if rule.required && value.is_none() {
            return Err(ParseError::Required {
                kind: rule.kind.label(),
                name: rule.display_name().to_string(),
            });
        }
    }
    Ok(())
}

/// Builds the snapshot. Config groups expand into their own sub-view.
pub(crate) fn build_options(registry: &Registry, values: &[Option<Value>], extra: Vec<String>) -> Options {
    let mut options = Options::new();
    for (rule, value) in registry.rules().iter().zip(values) {
        let Some(value) = value else {
            continue;
        };
        match value {
            Value::Map(entries) if rule.is_config_group() => {
                let group = options.group_mut(&rule.name);
                for (key, entry) in entries {
                    group.insert(None, key, Value::Str(entry.clone()));
                }
            }
            _ => options.insert(rule.group.as_deref(), &rule.name, value.clone()),
        }
    }
    options.set_extra(extra);
    options
}

/// Writes resolved values through to bound caller variables. Unset rules
/// reset their binding so it matches the snapshot's zero value.
pub(crate) fn write_bindings(registry: &Registry, values: &[Option<Value>]) {
    for (rule, value) in registry.rules().iter().zip(values) {
        let Some(sink) = &rule.sink else {
            continue;
        };
        match value {
            Some(value) => sink.write(value),
            None => sink.reset(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::env::MapEnv;
    use crate::rule::{CastType, RuleKind};

    fn tokens(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn option(registry: &mut Registry, spelling: &str, cast: CastType) -> usize {
        registry.register(Rule::new(spelling, RuleKind::Optional)).cast = cast;
        registry.len() - 1
    }

    #[test]
    fn test_scan_counts_repeated_option() {
        let mut registry = Registry::new();
        let idx = option(&mut registry, "--verbose", CastType::Count);

        let scan = scan(&mut registry, &tokens(&["--verbose", "-verbose", "+verbose"]), &[]).unwrap();
        assert_eq!(scan.values[idx], Some(Value::Int(3)));
        assert!(registry.rules()[idx].flags.contains(Flags::SEEN));
    }

    #[test]
    fn test_scan_missing_argument_when_next_is_option() {
        let mut registry = Registry::new();
        option(&mut registry, "--name", CastType::String);
        option(&mut registry, "--verbose", CastType::Bool);

        let err = scan(&mut registry, &tokens(&["-name", "--verbose"]), &[]).unwrap_err();
        assert_eq!(err.to_string(), "Expected '-name' to have an argument");
    }

    #[test]
    fn test_scan_unknown_dash_token_is_an_argument() {
        let mut registry = Registry::new();
        let idx = option(&mut registry, "--offset", CastType::Int);

        let scan = scan(&mut registry, &tokens(&["--offset", "-5"]), &[]).unwrap();
        assert_eq!(scan.values[idx], Some(Value::Int(-5)));
    }

    #[test]
    fn test_scan_keeps_excess_positionals() {
        let mut registry = Registry::new();
        registry.register(Rule::new("first", RuleKind::Positional));

        let scan = scan(&mut registry, &tokens(&["one", "two", "three"]), &[]).unwrap();
        assert_eq!(scan.values[0], Some(Value::Str("one".into())));
        assert_eq!(scan.extra, tokens(&["two", "three"]));
    }

    #[test]
    fn test_scan_clears_seen_between_passes() {
        let mut registry = Registry::new();
        let idx = option(&mut registry, "--debug", CastType::Bool);

        scan(&mut registry, &tokens(&["--debug"]), &[]).unwrap();
        assert!(registry.rules()[idx].flags.contains(Flags::SEEN));
        scan(&mut registry, &[], &[]).unwrap();
        assert!(!registry.rules()[idx].flags.contains(Flags::SEEN));
    }

    #[test]
    fn test_resolve_env_then_document_then_default() {
        let mut registry = Registry::new();
        let idx = option(&mut registry, "--level", CastType::Int);
        {
            let rule = registry.rule_mut(idx);
            rule.env = Some("LEVEL".into());
            rule.default = Some("1".into());
        }
        let document: Document = json!({"level": 2}).as_object().cloned().unwrap();
        let env = MapEnv::new().with("LEVEL", "3");
        let empty_env = MapEnv::new();

        let resolved = |env: &MapEnv, document: Option<&Document>| {
            resolve(&registry, vec![None], &Sources { env, document }).unwrap()
        };
        assert_eq!(resolved(&env, Some(&document))[0], Some(Value::Int(3)));
        assert_eq!(resolved(&empty_env, Some(&document))[0], Some(Value::Int(2)));
        assert_eq!(resolved(&empty_env, None)[0], Some(Value::Int(1)));
    }

    #[test]
    fn test_resolve_document_error_names_key_path() {
        let mut registry = Registry::new();
        let idx = option(&mut registry, "--port", CastType::Int);
        registry.rule_mut(idx).group = Some("database".into());
        let document: Document = json!({"database": {"port": "high"}})
            .as_object()
            .cloned()
            .unwrap();

        let err = resolve(
            &registry,
            vec![None],
            &Sources {
                env: &MapEnv::new(),
                document: Some(&document),
            },
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid value for 'database.port' - 'high' is not an Integer"
        );
    }

    #[test]
    fn test_build_options_expands_config_group() {
        let mut registry = Registry::new();
        let rule = registry.register(Rule::new("endpoints", RuleKind::Config));
        rule.cast = CastType::StringMap;
        rule.flags.set(Flags::CONFIG_GROUP);

        let value = Value::Map([("one".to_string(), "http://a".to_string())].into_iter().collect());
        let options = build_options(&registry, &[Some(value)], Vec::new());
        assert_eq!(options.group("endpoints").string("one"), "http://a");
        assert!(!options.is_set("endpoints"));
    }
}

//! Declarative rule sets, deserializable from JSON or YAML.
//!
//! A [`RuleSet`] describes a whole parser; a [`RuleDecl`] describes one rule
//! independently of any parser, and is registered with
//! [`Parser::add_decl`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as Json;
use tracing::debug;

use crate::env::EnvLookup;
use crate::parser::{DEFAULT_WRAP_LEN, Parser, ParserBuilder};
use crate::rule::{CastType, Flags, Rule, RuleKind, RuleModifier};

/// One rule declaration.
///
/// `name` is the spelling for options (`--power-level`) and the bare name
/// for positionals and config rules. `default` accepts any scalar; it is
/// kept as a string and validated when a parse resolves it.
///
/// # Examples
///
/// ```
/// use argrules_core::{CastType, RuleDecl, RuleKind};
///
/// let decl: RuleDecl = serde_json::from_str(
///     r#"{"name": "--port", "aliases": ["-p"], "type": "int", "default": 8080}"#,
/// )
/// .unwrap();
/// assert_eq!(decl.kind, RuleKind::Optional);
/// assert_eq!(decl.cast, CastType::Int);
/// assert_eq!(decl.default.as_deref(), Some("8080"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RuleDecl {
    pub name: String,
    #[serde(default = "default_kind")]
    pub kind: RuleKind,
    #[serde(default, rename = "type")]
    pub cast: CastType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Config rule holding a whole nested mapping.
    #[serde(default)]
    pub config_group: bool,
}

fn default_kind() -> RuleKind {
    RuleKind::Optional
}

fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Json>::deserialize(deserializer)?;
    match value {
        None | Some(Json::Null) => Ok(None),
        Some(Json::String(s)) => Ok(Some(s)),
        Some(Json::Number(n)) => Ok(Some(n.to_string())),
        Some(Json::Bool(b)) => Ok(Some(b.to_string())),
        Some(other @ (Json::Array(_) | Json::Object(_))) => Ok(Some(other.to_string())),
    }
}

impl RuleDecl {
    /// Declaration of an option with the default cast.
    pub fn option(spelling: impl Into<String>) -> Self {
        Self::new(spelling, RuleKind::Optional)
    }

    pub fn positional(name: impl Into<String>) -> Self {
        Self::new(name, RuleKind::Positional)
    }

    pub fn config(name: impl Into<String>) -> Self {
        Self::new(name, RuleKind::Config)
    }

    fn new(name: impl Into<String>, kind: RuleKind) -> Self {
        Self {
            name: name.into(),
            kind,
            cast: CastType::default(),
            aliases: Vec::new(),
            help: None,
            default: None,
            env: None,
            required: false,
            group: None,
            config_group: false,
        }
    }

    pub fn with_cast(mut self, cast: CastType) -> Self {
        self.cast = cast;
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_env(mut self, env: impl Into<String>) -> Self {
        self.env = Some(env.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn into_rule(self) -> Rule {
        let mut rule = Rule::new(&self.name, self.kind);
        rule.cast = self.cast;
        rule.aliases = self.aliases;
        rule.help = self.help;
        rule.default = self.default;
        rule.env = self.env;
        rule.required = self.required;
        rule.group = self.group;
        if self.config_group {
            rule.cast = CastType::StringMap;
            rule.flags.set(Flags::CONFIG_GROUP);
        }
        rule
    }
}

/// A whole parser described as data.
///
/// # Examples
///
/// ```
/// use argrules_core::{Parser, RuleSet};
///
/// let yaml = r#"
/// name: deploy
/// description: Ship a release
/// rules:
///   - name: --dry-run
///     type: bool
///   - name: target
///     kind: positional
///     required: true
/// "#;
/// let set: RuleSet = serde_yaml::from_str(yaml).unwrap();
/// let mut parser = Parser::from_rule_set(&set);
///
/// let opts = parser.parse_args(&["prod", "--dry-run"]).unwrap();
/// assert_eq!(opts.string("target"), "prod");
/// assert!(opts.bool("dry-run"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RuleSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub no_help: bool,
    #[serde(default = "default_wrap_len")]
    pub wrap_len: usize,
    #[serde(default)]
    pub rules: Vec<RuleDecl>,
}

fn default_wrap_len() -> usize {
    DEFAULT_WRAP_LEN
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            name: None,
            description: None,
            no_help: false,
            wrap_len: DEFAULT_WRAP_LEN,
            rules: Vec::new(),
        }
    }
}

impl Parser {
    /// Builds a parser from a rule set, using the process environment.
    pub fn from_rule_set(set: &RuleSet) -> Self {
        Self::from_builder(set, Parser::builder())
    }

    /// Builds a parser from a rule set that resolves environment fallbacks
    /// through `env`.
    pub fn from_rule_set_with_env(set: &RuleSet, env: impl EnvLookup + 'static) -> Self {
        Self::from_builder(set, Parser::builder().env(env))
    }

    fn from_builder(set: &RuleSet, builder: ParserBuilder) -> Self {
        let mut builder = builder.wrap_len(set.wrap_len);
        if set.no_help {
            builder = builder.no_help();
        }
        let mut parser = builder.build();
        parser.configure(set);
        parser
    }

    /// Applies a rule set's name, description and rules to an existing
    /// parser, keeping its environment lookup.
    pub fn configure(&mut self, set: &RuleSet) {
        if set.name.is_some() {
            self.set_name(set.name.clone());
        }
        if set.description.is_some() {
            self.set_description(set.description.clone());
        }
        for decl in &set.rules {
            self.add_decl(decl.clone());
        }
        debug!(rules = set.rules.len(), "Loaded rule set");
    }

    /// Registers a detached declaration and returns its modifier for
    /// further chaining.
    pub fn add_decl(&mut self, decl: RuleDecl) -> RuleModifier<'_> {
        self.register(decl.into_rule())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnv;

    #[test]
    fn test_decl_defaults() {
        let decl: RuleDecl = serde_json::from_str(r#"{"name": "--host"}"#).unwrap();
        assert_eq!(decl, RuleDecl::option("--host"));
    }

    #[test]
    fn test_scalar_defaults_are_stringified() {
        let decl: RuleDecl =
            serde_json::from_str(r#"{"name": "--verbose", "type": "bool", "default": true}"#)
                .unwrap();
        assert_eq!(decl.default.as_deref(), Some("true"));

        let decl: RuleDecl =
            serde_json::from_str(r#"{"name": "--level", "default": null}"#).unwrap();
        assert_eq!(decl.default, None);
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let err = serde_json::from_str::<RuleDecl>(r#"{"name": "--x", "type": "float"}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_config_group_decl() {
        let decl: RuleDecl =
            serde_json::from_str(r#"{"name": "endpoints", "kind": "config", "config-group": true}"#)
                .unwrap();
        let rule = decl.into_rule();
        assert!(rule.is_config_group());
        assert_eq!(rule.cast, CastType::StringMap);
    }

    #[test]
    fn test_add_decl_chains_modifier() {
        let mut parser = Parser::new();
        parser
            .add_decl(RuleDecl::option("--power-level").with_cast(CastType::Int))
            .alias("-p")
            .default("10000");

        let opts = parser.parse_args(&["-p", "9001"]).unwrap();
        assert_eq!(opts.int("power-level"), 9001);
    }

    #[test]
    fn test_rule_set_wrap_and_no_help() {
        let set: RuleSet =
            serde_json::from_str(r#"{"no-help": true, "wrap-len": 60, "rules": [{"name": "--a"}]}"#)
                .unwrap();
        let parser = Parser::from_rule_set(&set);
        assert!(!parser.help_enabled());
        assert_eq!(parser.wrap_len(), 60);
    }

    #[test]
    fn test_rule_set_with_env_keeps_settings() {
        let set: RuleSet = serde_json::from_str(
            r#"{"no-help": true, "wrap-len": 40, "rules": [{"name": "--level", "type": "int", "env": "LEVEL"}]}"#,
        )
        .unwrap();
        let mut parser = Parser::from_rule_set_with_env(&set, MapEnv::new().with("LEVEL", "7"));
        assert!(!parser.help_enabled());
        assert_eq!(parser.wrap_len(), 40);

        let opts = parser.parse().unwrap();
        assert_eq!(opts.int("level"), 7);
    }
}

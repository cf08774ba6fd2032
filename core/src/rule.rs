//! Rule definitions and the modifier chain used to declare them.
//!
//! A [`Rule`] describes one matchable name: an option (`--name`), a
//! positional, or a config-only entry that is only ever filled from a
//! document. Rules are created through [`Parser`](crate::Parser) methods,
//! which hand back a [`RuleModifier`] for chaining.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::BitOr;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::sink::{Binding, Sink};

/// Option prefix families, longest first so `--x` is not read as `-` + `-x`.
pub const PREFIXES: [&str; 4] = ["--", "++", "-", "+"];

/// Strips a recognised option prefix.
///
/// Returns `None` when `token` has no prefix or nothing follows it.
///
/// # Examples
///
/// ```
/// use argrules_core::strip_prefix;
///
/// assert_eq!(strip_prefix("--power-level"), Some("power-level"));
/// assert_eq!(strip_prefix("++three"), Some("three"));
/// assert_eq!(strip_prefix("+four"), Some("four"));
/// assert_eq!(strip_prefix("plain"), None);
/// assert_eq!(strip_prefix("--"), None);
/// ```
pub fn strip_prefix(token: &str) -> Option<&str> {
    PREFIXES
        .iter()
        .find_map(|prefix| token.strip_prefix(prefix))
        .filter(|rest| !rest.is_empty())
}

/// Returns `true` if `token` starts with a backslash-escaped prefix
/// character (`\-` or `\+`).
pub fn is_escaped(token: &str) -> bool {
    token.starts_with("\\-") || token.starts_with("\\+")
}

/// Removes one level of backslash escaping.
///
/// # Examples
///
/// ```
/// use argrules_core::unescape;
///
/// assert_eq!(unescape("\\-\\-help"), "--help");
/// assert_eq!(unescape("--help"), "--help");
/// assert_eq!(unescape("\\\\-x"), "\\-x");
/// ```
pub fn unescape(token: &str) -> String {
    if !token.starts_with('\\') {
        return token.to_string();
    }
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// How a rule is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleKind {
    /// Matched by a prefixed token anywhere on the command line.
    #[serde(rename = "option")]
    Optional,
    /// Matched by position among non-option tokens.
    Positional,
    /// Only filled from an external document, environment or default.
    Config,
}

impl RuleKind {
    /// Label used in `is required` messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Optional => "option",
            Self::Positional => "positional",
            Self::Config => "config",
        }
    }
}

/// Declared value type of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CastType {
    /// Counts occurrences; takes no argument.
    Count,
    /// Signed integer.
    Int,
    /// Plain string (the default).
    #[default]
    String,
    /// True when seen; takes no argument.
    Bool,
    /// Comma-split or repeated list of strings.
    StringSlice,
    /// `key=value` list or JSON object.
    StringMap,
}

/// Per-rule state bits.
///
/// # Examples
///
/// ```
/// use argrules_core::Flags;
///
/// let mut flags = Flags::default();
/// flags.set(Flags::SEEN);
/// assert!(flags.contains(Flags::SEEN));
/// flags.clear(Flags::SEEN);
/// flags.clear(Flags::SEEN);
/// assert!(!flags.contains(Flags::SEEN));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags(u8);

impl Flags {
    /// Matched on the command line during the current pass.
    pub const SEEN: Self = Self(1);
    /// The auto-registered help option.
    pub const HELP: Self = Self(1 << 1);
    /// Config rule holding a whole nested mapping.
    pub const CONFIG_GROUP: Self = Self(1 << 2);

    /// Turns on every bit in `other`.
    pub fn set(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Turns off every bit in `other`.
    pub fn clear(&mut self, other: Self) {
        self.0 &= !other.0;
    }

    /// Whether every bit in `other` is on.
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Flags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// One matchable declaration.
///
/// Fields are readable through [`Parser::rules`](crate::Parser::rules);
/// they are only changed through [`RuleModifier`] while the rule is being
/// declared.
#[derive(Clone)]
pub struct Rule {
    /// Canonical name, prefix stripped (e.g. `power-level`).
    pub name: String,
    /// Spelling as declared (e.g. `--power-level`).
    pub spelling: String,
    /// Alternate spellings as declared (e.g. `-p`).
    pub aliases: Vec<String>,
    pub kind: RuleKind,
    /// 1-based declaration order for positionals, `0` otherwise.
    pub order: usize,
    pub cast: CastType,
    /// Raw default, validated against `cast` when a parse resolves it.
    pub default: Option<String>,
    /// Environment variable consulted when no CLI value is present.
    pub env: Option<String>,
    pub required: bool,
    /// Namespace the resolved value is stored under.
    pub group: Option<String>,
    pub flags: Flags,
    pub help: Option<String>,
    pub(crate) sink: Option<Rc<dyn Sink>>,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("spelling", &self.spelling)
            .field("aliases", &self.aliases)
            .field("kind", &self.kind)
            .field("order", &self.order)
            .field("cast", &self.cast)
            .field("default", &self.default)
            .field("env", &self.env)
            .field("required", &self.required)
            .field("group", &self.group)
            .field("flags", &self.flags)
            .field("bound", &self.sink.is_some())
            .finish()
    }
}

impl Rule {
    /// Creates a rule from its declared spelling.
    ///
    /// # Examples
    ///
    /// ```
    /// use argrules_core::{CastType, Rule, RuleKind};
    ///
    /// let rule = Rule::new("--power-level", RuleKind::Optional);
    /// assert_eq!(rule.name, "power-level");
    /// assert_eq!(rule.cast, CastType::String);
    /// assert!(rule.matches("power-level"));
    /// ```
    pub fn new(spelling: &str, kind: RuleKind) -> Self {
        let name = strip_prefix(spelling).unwrap_or(spelling).to_string();
        Self {
            name,
            spelling: spelling.to_string(),
            aliases: Vec::new(),
            kind,
            order: 0,
            cast: CastType::default(),
            default: None,
            env: None,
            required: false,
            group: None,
            flags: Flags::default(),
            help: None,
            sink: None,
        }
    }

    /// The auto-registered `--help`/`-h` option.
    pub fn help_option() -> Self {
        let mut rule = Self::new("--help", RuleKind::Optional);
        rule.aliases.push("-h".to_string());
        rule.cast = CastType::Bool;
        rule.help = Some("Display a help message and exit".to_string());
        rule.flags.set(Flags::HELP);
        rule
    }

    /// Alias names with their prefixes stripped.
    pub fn alias_names(&self) -> impl Iterator<Item = &str> {
        self.aliases
            .iter()
            .map(|alias| strip_prefix(alias).unwrap_or(alias))
    }

    /// Checks a prefix-stripped name against the rule's name and aliases.
    pub fn matches(&self, stripped: &str) -> bool {
        self.name == stripped || self.alias_names().any(|alias| alias == stripped)
    }

    /// Name shown in messages: the declared spelling for options, the bare
    /// name otherwise.
    pub fn display_name(&self) -> &str {
        match self.kind {
            RuleKind::Optional => &self.spelling,
            RuleKind::Positional | RuleKind::Config => &self.name,
        }
    }

    /// Whether this is the auto-registered help option.
    pub fn is_help(&self) -> bool {
        self.flags.contains(Flags::HELP)
    }

    /// Whether this is a config group holding a nested mapping.
    pub fn is_config_group(&self) -> bool {
        self.flags.contains(Flags::CONFIG_GROUP)
    }

    pub fn is_bound(&self) -> bool {
        self.sink.is_some()
    }
}

/// Chainable modifier returned when a rule is declared.
///
/// # Examples
///
/// ```
/// use argrules_core::Parser;
///
/// let mut parser = Parser::new();
/// parser
///     .add_option("--power-level")
///     .alias("-p")
///     .is_int()
///     .default("10")
///     .env("POWER_LEVEL")
///     .help("Specify our power level");
///
/// let rule = parser.rules().iter().find(|r| r.name == "power-level").unwrap();
/// assert_eq!(rule.aliases, vec!["-p".to_string()]);
/// assert_eq!(rule.default.as_deref(), Some("10"));
/// ```
#[derive(Debug)]
pub struct RuleModifier<'a> {
    rule: &'a mut Rule,
}

impl<'a> RuleModifier<'a> {
    pub(crate) fn new(rule: &'a mut Rule) -> Self {
        Self { rule }
    }

    /// Adds an alternate spelling, such as `-p` for `--power-level`.
    pub fn alias(self, alias: &str) -> Self {
        self.rule.aliases.push(alias.to_string());
        self
    }

    /// Text shown by the help renderer.
    pub fn help(self, help: &str) -> Self {
        self.rule.help = Some(help.to_string());
        self
    }

    /// Sets the raw default. It is not validated until a parse resolves it.
    pub fn default(self, value: &str) -> Self {
        self.rule.default = Some(value.to_string());
        self
    }

    /// Environment variable consulted when the command line has no value.
    pub fn env(self, name: &str) -> Self {
        self.rule.env = Some(name.to_string());
        self
    }

    /// Fails the parse when no source provides a value.
    pub fn required(self) -> Self {
        self.rule.required = true;
        self
    }

    /// Stores the value under `group` in the snapshot.
    pub fn in_group(self, group: &str) -> Self {
        self.rule.group = Some(group.to_string());
        self
    }

    /// Sets the cast type directly.
    pub fn cast(self, cast: CastType) -> Self {
        self.rule.cast = cast;
        self
    }

    /// Counts occurrences; takes no argument.
    pub fn count(self) -> Self {
        self.cast(CastType::Count)
    }

    pub fn is_int(self) -> Self {
        self.cast(CastType::Int)
    }

    pub fn is_string(self) -> Self {
        self.cast(CastType::String)
    }

    /// Boolean that becomes `true` when seen.
    pub fn is_true(self) -> Self {
        self.cast(CastType::Bool)
    }

    /// Boolean, typically for config-only rules.
    pub fn is_bool(self) -> Self {
        self.cast(CastType::Bool)
    }

    /// Comma-split on first use, appended on repeats.
    pub fn is_string_slice(self) -> Self {
        self.cast(CastType::StringSlice)
    }

    /// `key=value` pairs or a JSON object, merged across repeats.
    pub fn is_string_map(self) -> Self {
        self.cast(CastType::StringMap)
    }

    /// Integer rule that also writes its value into `target`. The other
    /// `store_*` methods do the same for their cast type.
    pub fn store_int(self, target: &Binding<i64>) -> Self {
        self.rule.sink = Some(target.clone());
        self.is_int()
    }

    pub fn store_string(self, target: &Binding<String>) -> Self {
        self.rule.sink = Some(target.clone());
        self.is_string()
    }

    pub fn store_true(self, target: &Binding<bool>) -> Self {
        self.rule.sink = Some(target.clone());
        self.is_true()
    }

    pub fn store_string_slice(self, target: &Binding<Vec<String>>) -> Self {
        self.rule.sink = Some(target.clone());
        self.is_string_slice()
    }

    pub fn store_string_map(self, target: &Binding<BTreeMap<String, String>>) -> Self {
        self.rule.sink = Some(target.clone());
        self.is_string_map()
    }
}

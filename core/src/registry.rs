//! Ordered rule storage for one parser scope.
//!
//! Registration never validates. Name collisions are only reported by
//! [`Registry::validate`], which the parser runs at the start of every pass,
//! so a registry may be assembled from several call sites before use.

use std::collections::{HashMap, HashSet};

use crate::error::{ParseError, Result};
use crate::rule::{Flags, Rule, RuleKind, strip_prefix};

/// Ordered sequence of rules plus a name/alias index.
///
/// # Examples
///
/// ```
/// use argrules_core::{Registry, Rule, RuleKind};
///
/// let mut registry = Registry::new();
/// registry.register(Rule::new("--first", RuleKind::Optional));
/// registry.register(Rule::new("first", RuleKind::Positional));
///
/// // Registration succeeded; the collision shows up on validation.
/// assert_eq!(registry.len(), 2);
/// assert_eq!(
///     registry.validate().unwrap_err().to_string(),
///     "Duplicate option 'first' defined"
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct Registry {
    rules: Vec<Rule>,
    index: HashMap<String, usize>,
    positionals: usize,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a rule, assigning the next positional order when needed.
    pub fn register(&mut self, mut rule: Rule) -> &mut Rule {
        if rule.kind == RuleKind::Positional {
            self.positionals += 1;
            rule.order = self.positionals;
        }
        let idx = self.rules.len();
        self.index.entry(rule.name.clone()).or_insert(idx);
        self.rules.push(rule);
        &mut self.rules[idx]
    }

    /// Inserts a rule ahead of all others (listing order only).
    pub(crate) fn register_first(&mut self, rule: Rule) {
        self.rules.insert(0, rule);
        self.reindex();
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (idx, rule) in self.rules.iter().enumerate() {
            self.index.entry(rule.name.clone()).or_insert(idx);
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub(crate) fn rule_mut(&mut self, idx: usize) -> &mut Rule {
        &mut self.rules[idx]
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether any rule uses `name` as its canonical name.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Resolves a command-line token to an optional rule.
    ///
    /// The token must carry one of the recognised prefixes; the remainder is
    /// matched against rule names and aliases. Positional and config rules
    /// never match.
    pub fn lookup(&self, token: &str) -> Option<usize> {
        let stripped = strip_prefix(token)?;
        if let Some(&idx) = self.index.get(stripped) {
            if self.rules[idx].kind == RuleKind::Optional {
                return Some(idx);
            }
        }
        self.rules
            .iter()
            .position(|rule| rule.kind == RuleKind::Optional && rule.matches(stripped))
    }

    /// Checks that no name or alias is used twice in this scope, and that
    /// no ungrouped rule shares its name with a group, since both would
    /// occupy the same key of the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::DuplicateName`] naming the first repeated
    /// identifier.
    pub fn validate(&self) -> Result<()> {
        let mut seen: HashSet<&str> = HashSet::new();
        for rule in &self.rules {
            if !seen.insert(rule.name.as_str()) {
                return Err(ParseError::DuplicateName(rule.name.clone()));
            }
            for alias in rule.alias_names() {
                if alias != rule.name && !seen.insert(alias) {
                    return Err(ParseError::DuplicateName(alias.to_string()));
                }
            }
        }

        let groups: HashSet<&str> = self
            .rules
            .iter()
            .filter_map(|rule| match &rule.group {
                Some(group) => Some(group.as_str()),
                None if rule.is_config_group() => Some(rule.name.as_str()),
                None => None,
            })
            .collect();
        for rule in &self.rules {
            if rule.group.is_none() && !rule.is_config_group() && groups.contains(rule.name.as_str()) {
                return Err(ParseError::DuplicateName(rule.name.clone()));
            }
        }
        Ok(())
    }

    /// Positional rule indices in ascending declaration order.
    ///
    /// Each call returns a fresh iterator.
    pub fn positionals_in_order(&self) -> impl Iterator<Item = usize> + '_ {
        let mut positionals: Vec<(usize, usize)> = self
            .rules
            .iter()
            .enumerate()
            .filter(|(_, rule)| rule.kind == RuleKind::Positional)
            .map(|(idx, rule)| (rule.order, idx))
            .collect();
        positionals.sort_unstable();
        positionals.into_iter().map(|(_, idx)| idx)
    }

    /// Clears `flags` on every rule.
    pub(crate) fn clear_flags(&mut self, flags: Flags) {
        for rule in &mut self.rules {
            rule.flags.clear(flags);
        }
    }
}

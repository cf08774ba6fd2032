//! Minimal INI reader producing a [`Document`].
//!
//! Keys before the first `[section]` land at the top level; keys inside a
//! section land in a nested mapping named after it. Every value is kept as a
//! string and cast later by the rule that reads it.

use std::sync::LazyLock;

use argrules_core::Document;
use regex::Regex;
use serde_json::Value as Json;

use crate::error::{ConfigError, Result};

static SECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[\s*([^\]]*?)\s*\]$").expect("static regex must compile"));
static PAIR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^=:]+?)\s*[=:]\s*(.*)$").expect("static regex must compile"));

/// Parses INI text.
///
/// Blank lines and lines starting with `#` or `;` are skipped. Surrounding
/// double quotes are stripped from values.
///
/// # Errors
///
/// Returns [`ConfigError::IniError`] with the 1-based line number for a
/// line that is neither a section header nor a `key = value` pair, or for
/// an empty section name.
///
/// # Examples
///
/// ```
/// use argrules_config::parse_ini;
///
/// let doc = parse_ini("power-level=20000\n\n[endpoints]\nendpoint1 = http://a/1\n").unwrap();
/// assert_eq!(doc["power-level"], "20000");
/// assert_eq!(doc["endpoints"]["endpoint1"], "http://a/1");
/// ```
pub fn parse_ini(text: &str) -> Result<Document> {
    let mut document = Document::new();
    let mut section: Option<String> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(caps) = SECTION_RE.captures(line) {
            let name = caps[1].to_string();
            if name.is_empty() {
                return Err(ConfigError::IniError {
                    line: idx + 1,
                    message: "empty section name".to_string(),
                });
            }
            document
                .entry(name.clone())
                .or_insert_with(|| Json::Object(Document::new()));
            section = Some(name);
            continue;
        }

        let Some(caps) = PAIR_RE.captures(line) else {
            return Err(ConfigError::IniError {
                line: idx + 1,
                message: format!("expected 'key = value', found '{line}'"),
            });
        };
        let key = caps[1].trim().to_string();
        let value = Json::String(unquote(&caps[2]).to_string());

        let target = match &section {
            Some(name) => section_mut(&mut document, name, idx + 1)?,
            None => &mut document,
        };
        target.insert(key, value);
    }

    Ok(document)
}

fn section_mut<'a>(document: &'a mut Document, name: &str, line: usize) -> Result<&'a mut Document> {
    match document.get_mut(name) {
        Some(Json::Object(map)) => Ok(map),
        _ => Err(ConfigError::IniError {
            line,
            message: format!("section '{name}' collides with a top-level key"),
        }),
    }
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(value)
}

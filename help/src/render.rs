//! Help text rendering.
//!
//! Every section is a two-column table: the left column lists a rule's
//! aliases and spelling, the right column its help text, word-wrapped with a
//! hanging indent so continuation lines start under the text column.

use std::sync::LazyLock;

use argrules_core::{Command, Parser, Rule, RuleKind};
use regex::Regex;

/// Narrowest text column used when the labels leave little room.
pub const MIN_TEXT_WIDTH: usize = 20;

/// Program name used in the usage line when the parser has none.
const DEFAULT_PROGRAM: &str = "program";

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static regex must compile"));

/// Collapses whitespace runs (including newlines and tabs) to single spaces.
///
/// # Examples
///
/// ```
/// use argrules_help::collapse_whitespace;
///
/// assert_eq!(collapse_whitespace("  Lorem ipsum,\n\t\tdolor  "), "Lorem ipsum, dolor");
/// ```
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").into_owned()
}

/// Greedy word wrap. Words longer than `width` get a line of their own.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.len() + 1 + word.len() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Left-column label: aliases first, then the declared spelling.
///
/// # Examples
///
/// ```
/// use argrules_core::{Rule, RuleKind};
/// use argrules_help::rule_label;
///
/// let mut rule = Rule::new("--power-level", RuleKind::Optional);
/// rule.aliases.push("-p".into());
/// assert_eq!(rule_label(&rule), "-p, --power-level");
/// ```
pub fn rule_label(rule: &Rule) -> String {
    rule.aliases
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(rule.spelling.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_rows(rows: &[(String, String)], wrap: usize) -> String {
    let label_width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    let column = 2 + label_width + 2;
    let text_width = wrap.saturating_sub(column).max(MIN_TEXT_WIDTH);
    let indent = " ".repeat(column);

    let mut out = String::new();
    for (label, text) in rows {
        let lines = wrap_text(&collapse_whitespace(text), text_width);
        let first = lines.first().map(String::as_str).unwrap_or("");
        let row = format!("  {label:<label_width$}  {first}");
        out.push_str(row.trim_end());
        out.push('\n');
        for line in lines.iter().skip(1) {
            out.push_str(&indent);
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

/// Renders one row per rule of `kind`, in listing order.
///
/// Returns an empty string when no rule has that kind.
///
/// # Examples
///
/// ```
/// use argrules_core::{Parser, RuleKind};
/// use argrules_help::render_section;
///
/// let mut parser = Parser::new();
/// parser.add_option("--power-level").alias("-p").help("Specify our power level");
/// parser.add_option("--cat-level").alias("-c").help("Specify our   cat level");
///
/// assert_eq!(
///     render_section(parser.rules(), RuleKind::Optional, 80),
///     "  -p, --power-level  Specify our power level\n  \
///      -c, --cat-level    Specify our cat level\n"
/// );
/// ```
pub fn render_section(rules: &[Rule], kind: RuleKind, wrap: usize) -> String {
    let rows: Vec<(String, String)> = rules
        .iter()
        .filter(|rule| rule.kind == kind)
        .map(|rule| (rule_label(rule), rule.help.clone().unwrap_or_default()))
        .collect();
    render_rows(&rows, wrap)
}

/// Renders one row per command.
pub fn render_commands(commands: &[Command], wrap: usize) -> String {
    let rows: Vec<(String, String)> = commands
        .iter()
        .map(|command| (command.name.clone(), command.help.clone().unwrap_or_default()))
        .collect();
    render_rows(&rows, wrap)
}

/// The rules help output lists: the parser's rules, plus the auto help
/// option when it is enabled but not yet registered.
fn listed_rules(parser: &Parser) -> Vec<Rule> {
    let mut rules = Vec::with_capacity(parser.rules().len() + 1);
    let registered = parser.rules().iter().any(|rule| rule.name == "help");
    if parser.help_enabled() && !registered {
        rules.push(Rule::help_option());
    }
    rules.extend(parser.rules().iter().cloned());
    rules
}

fn usage_line(parser: &Parser, rules: &[Rule]) -> String {
    let mut out = format!("Usage: {}", parser.name().unwrap_or(DEFAULT_PROGRAM));
    if rules.iter().any(|rule| rule.kind == RuleKind::Optional) {
        out.push_str(" [OPTIONS]");
    }

    let mut positionals: Vec<&Rule> = rules
        .iter()
        .filter(|rule| rule.kind == RuleKind::Positional)
        .collect();
    positionals.sort_by_key(|rule| rule.order);
    for rule in positionals {
        if rule.required {
            out.push_str(&format!(" <{}>", rule.name));
        } else {
            out.push_str(&format!(" [{}]", rule.name));
        }
    }

    if !parser.commands().is_empty() {
        out.push_str(" [COMMAND]");
    }
    out
}

/// Renders the usage line.
pub fn render_usage(parser: &Parser) -> String {
    usage_line(parser, &listed_rules(parser))
}

/// Renders the full help text: usage, description, then the positional,
/// option and command sections that have entries.
///
/// # Examples
///
/// ```
/// use argrules_core::Parser;
/// use argrules_help::render_help;
///
/// let mut parser = Parser::builder().name("dragon-ball").description("Track power levels").build();
/// parser.add_option("--power-level").alias("-p").help("Specify our power level");
/// parser.add_positional("fighter").required().help("Who to measure");
///
/// let help = render_help(&parser);
/// assert_eq!(
///     help,
///     "Usage: dragon-ball [OPTIONS] <fighter>\n\
///      \n\
///      Track power levels\n\
///      \n\
///      Positionals:\n  \
///      fighter  Who to measure\n\
///      \n\
///      Options:\n  \
///      -h, --help         Display a help message and exit\n  \
///      -p, --power-level  Specify our power level\n"
/// );
/// ```
pub fn render_help(parser: &Parser) -> String {
    let rules = listed_rules(parser);
    let wrap = parser.wrap_len();

    let mut out = usage_line(parser, &rules);
    out.push('\n');

    if let Some(description) = parser.description() {
        out.push('\n');
        out.push_str(&collapse_whitespace(description));
        out.push('\n');
    }

    let sections = [
        ("Positionals", render_section(&rules, RuleKind::Positional, wrap)),
        ("Options", render_section(&rules, RuleKind::Optional, wrap)),
        ("Commands", render_commands(parser.commands(), wrap)),
    ];
    for (title, body) in sections {
        if !body.is_empty() {
            out.push_str(&format!("\n{title}:\n{body}"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_text_greedy() {
        assert_eq!(
            wrap_text("Lorem ipsum dolor sit amet, consectetur adipiscing elit", 20),
            vec!["Lorem ipsum dolor", "sit amet,", "consectetur", "adipiscing elit"]
        );
        assert_eq!(wrap_text("supercalifragilistic is long", 5), vec![
            "supercalifragilistic",
            "is",
            "long"
        ]);
        assert!(wrap_text("", 10).is_empty());
    }

    #[test]
    fn test_hanging_indent() {
        let mut power = Rule::new("--power-level", RuleKind::Optional);
        power.aliases.push("-p".into());
        power.help = Some("Specify our power level".into());
        let mut cat = Rule::new("--cat-level", RuleKind::Optional);
        cat.aliases.push("-c".into());
        cat.help = Some("Lorem ipsum dolor sit amet, consectetur\n\t\t\tadipiscing elit".into());

        let section = render_section(&[power, cat], RuleKind::Optional, 40);
        assert_eq!(
            section,
            concat!(
                "  -p, --power-level  Specify our power\n",
                "                     level\n",
                "  -c, --cat-level    Lorem ipsum dolor\n",
                "                     sit amet,\n",
                "                     consectetur\n",
                "                     adipiscing elit\n",
            )
        );
    }

    #[test]
    fn test_row_without_help_has_no_trailing_space() {
        let rule = Rule::new("target", RuleKind::Positional);
        assert_eq!(
            render_section(&[rule], RuleKind::Positional, 80),
            "  target\n"
        );
    }

    #[test]
    fn test_section_filters_by_kind() {
        let rules = [
            Rule::new("--debug", RuleKind::Optional),
            Rule::new("debug-file", RuleKind::Config),
        ];
        assert_eq!(render_section(&rules, RuleKind::Positional, 80), "");
        assert_eq!(render_section(&rules, RuleKind::Config, 80), "  debug-file\n");
    }
}

//! Output formatting for resolved snapshots.

use argrules_core::{Options, Value};

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    Json,
    Yaml,
    Table,
}

/// Formats a snapshot in the requested output format.
///
/// JSON and YAML nest groups as mappings; the table flattens them into
/// `group.key` rows. Excess positionals only appear in the table.
pub fn format_options(options: &Options, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(options)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(options).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Table => Ok(options_to_table(options)),
    }
}

/// Single-line rendering of a value, as it would be typed on a command line.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
///
/// use argrules_core::Value;
/// use argrules_help::value_to_string;
///
/// assert_eq!(value_to_string(&Value::List(vec!["a".into(), "b".into()])), "a,b");
/// let map: BTreeMap<_, _> = [("k".to_string(), "v".to_string())].into_iter().collect();
/// assert_eq!(value_to_string(&Value::Map(map)), "k=v");
/// ```
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::Int(n) => n.to_string(),
        Value::Str(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::List(items) => items.join(","),
        Value::Map(map) => map
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join(","),
    }
}

fn collect_rows(options: &Options, prefix: &str, rows: &mut Vec<(String, String)>) {
    for (key, value) in options.to_map() {
        rows.push((format!("{prefix}{key}"), value_to_string(value)));
    }
    for group in options.group_names() {
        collect_rows(options.group(group), &format!("{prefix}{group}."), rows);
    }
}

fn options_to_table(options: &Options) -> String {
    let mut rows = Vec::new();
    collect_rows(options, "", &mut rows);

    let mut out = String::new();
    let max_name = rows.iter().map(|(name, _)| name.len()).max().unwrap_or(4);
    for (name, value) in &rows {
        let row = format!("{:<width$}  {value}", name, width = max_name);
        out.push_str(row.trim_end());
        out.push('\n');
    }

    if !options.extra().is_empty() {
        out.push_str(&format!("\nExtra: {}\n", options.extra().join(" ")));
    }
    out
}

#[cfg(test)]
mod tests {
    use argrules_core::Parser;

    use super::*;

    fn sample() -> Options {
        let mut parser = Parser::new();
        parser.add_option("--power-level").is_int();
        parser.add_option("--tags").is_string_slice();
        parser.in_group("database").add_option("--host");
        parser
            .parse_args(&["--power-level", "9001", "--tags", "a,b", "--host", "db", "left"])
            .unwrap()
    }

    #[test]
    fn test_table_flattens_groups() {
        let table = format_options(&sample(), OutputFormat::Table).unwrap();
        assert_eq!(
            table,
            "help           false\n\
             power-level    9001\n\
             tags           a,b\n\
             database.host  db\n\
             \n\
             Extra: left\n"
        );
    }

    #[test]
    fn test_json_nests_groups() {
        let json = format_options(&sample(), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "help": false,
                "power-level": 9001,
                "tags": ["a", "b"],
                "database": {"host": "db"},
            })
        );
    }

    #[test]
    fn test_yaml_output() {
        let yaml = format_options(&sample(), OutputFormat::Yaml).unwrap();
        assert!(yaml.contains("power-level: 9001"));
        assert!(yaml.contains("database:\n  host: db"));
    }
}

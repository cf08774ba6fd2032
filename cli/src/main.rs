use std::fs;
use std::path::{Path, PathBuf};

use argrules_config::DocumentBuilder;
use argrules_core::{MapEnv, ParseError, Parser, RuleSet};
use argrules_help::{OutputFormat, format_options, render_help};
use clap::{Args, Subcommand};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "ARGRULES_LOG";

#[derive(Debug, clap::Parser)]
#[command(name = "argrules")]
#[command(disable_help_subcommand = true)]
#[command(about = "Check declarative argument rule sets against tokens and config files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse tokens with a rule set and print the resolved options.
    Parse(ParseArgs),
    /// Print the help text generated for a rule set.
    Help(HelpArgs),
    /// Check rule sets for duplicate names and malformed defaults.
    Validate(ValidateArgs),
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Rule set file (JSON or YAML).
    #[arg(long)]
    rules: PathBuf,
    /// Config documents (INI, JSON or YAML) applied in order; later files win.
    #[arg(long = "config")]
    configs: Vec<PathBuf>,
    /// Config documents that are skipped when missing.
    #[arg(long = "optional-config")]
    optional_configs: Vec<PathBuf>,
    /// Environment entries (KEY=VALUE). When given, they replace the process
    /// environment.
    #[arg(long = "env", value_parser = parse_env_pair)]
    env: Vec<(String, String)>,
    /// Output format.
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,
    /// Tokens to parse (put them after `--`).
    #[arg(last = true, allow_hyphen_values = true)]
    tokens: Vec<String>,
}

#[derive(Debug, Args)]
struct HelpArgs {
    /// Rule set file (JSON or YAML).
    #[arg(long)]
    rules: PathBuf,
    /// Wrap width, overriding the rule set's.
    #[arg(long)]
    wrap: Option<usize>,
}

#[derive(Debug, Args)]
struct ValidateArgs {
    /// Rule set files (JSON or YAML).
    #[arg(long, required = true, num_args = 1..)]
    rules: Vec<PathBuf>,
}

fn main() {
    let cli = <Cli as clap::Parser>::parse();
    init_tracing();

    let result = match cli.command {
        Command::Parse(args) => run_parse(args),
        Command::Help(args) => run_help(args),
        Command::Validate(args) => run_validate(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn parse_env_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, found '{raw}'"))
}

fn load_rule_set(path: &Path) -> Result<RuleSet, String> {
    let text =
        fs::read_to_string(path).map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    let set: RuleSet = match ext.as_deref() {
        Some("json") => serde_json::from_str(&text).map_err(|e| e.to_string()),
        Some("yaml" | "yml") => serde_yaml::from_str(&text).map_err(|e| e.to_string()),
        _ => Err("rule sets must be .json, .yaml or .yml files".to_string()),
    }
    .map_err(|e| format!("{}: {e}", path.display()))?;
    debug!(path = %path.display(), "Loaded rule set");
    Ok(set)
}

fn build_parser(set: &RuleSet, env: Option<MapEnv>) -> Parser {
    match env {
        Some(env) => Parser::from_rule_set_with_env(set, env),
        None => Parser::from_rule_set(set),
    }
}

fn run_parse(args: ParseArgs) -> Result<(), String> {
    let set = load_rule_set(&args.rules)?;
    let env = (!args.env.is_empty()).then(|| args.env.into_iter().collect::<MapEnv>());
    let mut parser = build_parser(&set, env);

    let options = match parser.parse_args(&args.tokens) {
        Ok(options) => options,
        Err(err) if err.is_help_requested() => {
            print!("{}", render_help(&parser));
            return Ok(());
        }
        Err(err) => return Err(err.to_string()),
    };

    let options = if args.configs.is_empty() && args.optional_configs.is_empty() {
        options
    } else {
        let mut builder = DocumentBuilder::new();
        for path in args.configs {
            builder = builder.file(path);
        }
        for path in args.optional_configs {
            builder = builder.optional_file(path);
        }
        let document = builder.build().map_err(|e| e.to_string())?;
        parser.apply(&document).map_err(|e| e.to_string())?
    };

    let output = format_options(&options, args.format)?;
    if output.ends_with('\n') {
        print!("{output}");
    } else {
        println!("{output}");
    }
    Ok(())
}

fn run_help(args: HelpArgs) -> Result<(), String> {
    let mut set = load_rule_set(&args.rules)?;
    if let Some(wrap) = args.wrap {
        set.wrap_len = wrap;
    }
    let parser = Parser::from_rule_set(&set);
    print!("{}", render_help(&parser));
    Ok(())
}

fn run_validate(args: ValidateArgs) -> Result<(), String> {
    let mut rules = 0;
    for path in &args.rules {
        let set = load_rule_set(path)?;
        let mut parser = build_parser(&set, Some(MapEnv::new()));

        match parser.parse() {
            Ok(_) => {}
            Err(err) if err.is_help_requested() => {}
            // Required rules are expected to be unset in an empty parse.
            Err(ParseError::Required { .. }) => {}
            Err(err) => return Err(format!("{}: {err}", path.display())),
        }
        rules += set.rules.len();
    }
    println!(
        "Validated {} rule set file(s) with {} rule(s).",
        args.rules.len(),
        rules
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_help_is_a_rule_set_subcommand() {
        let cli = <Cli as clap::Parser>::try_parse_from([
            "argrules", "help", "--rules", "rules.yaml", "--wrap", "60",
        ])
        .unwrap();
        match cli.command {
            Command::Help(args) => {
                assert_eq!(args.rules, PathBuf::from("rules.yaml"));
                assert_eq!(args.wrap, Some(60));
            }
            other => panic!("expected help subcommand, got {other:?}"),
        }
    }
}

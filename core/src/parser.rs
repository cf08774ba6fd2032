//! The parser scope: rule declaration, parse passes and command dispatch.

use std::any::Any;
use std::rc::Rc;

use tracing::debug;

use crate::command::{Command, CommandModifier, ParentScope};
use crate::engine::{self, Dispatch, Sources};
use crate::env::{EnvLookup, ProcessEnv};
use crate::error::{ParseError, Result};
use crate::options::Options;
use crate::registry::Registry;
use crate::rule::{CastType, Flags, Rule, RuleKind, RuleModifier};
use crate::value::Document;

/// Default wrap width for rendered help.
pub const DEFAULT_WRAP_LEN: usize = 80;

/// Configures a [`Parser`] before rules are added.
///
/// # Examples
///
/// ```
/// use argrules_core::{MapEnv, Parser};
///
/// let parser = Parser::builder()
///     .name("dragon-ball")
///     .description("Power level tracker")
///     .wrap_len(100)
///     .env(MapEnv::new().with("POWER_LEVEL", "9001"))
///     .build();
/// assert_eq!(parser.name(), Some("dragon-ball"));
/// assert_eq!(parser.wrap_len(), 100);
/// assert!(parser.help_enabled());
/// ```
#[derive(Debug)]
pub struct ParserBuilder {
    name: Option<String>,
    description: Option<String>,
    help: bool,
    wrap_len: usize,
    env: Rc<dyn EnvLookup>,
}

impl Default for ParserBuilder {
    fn default() -> Self {
        Self {
            name: None,
            description: None,
            help: true,
            wrap_len: DEFAULT_WRAP_LEN,
            env: Rc::new(ProcessEnv),
        }
    }
}

impl ParserBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Program name shown in usage lines.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Disables the auto-registered `--help`/`-h` option.
    pub fn no_help(mut self) -> Self {
        self.help = false;
        self
    }

    pub fn wrap_len(mut self, wrap_len: usize) -> Self {
        self.wrap_len = wrap_len;
        self
    }

    /// Replaces the process environment as the source for `env` fallbacks.
    pub fn env(mut self, env: impl EnvLookup + 'static) -> Self {
        self.env = Rc::new(env);
        self
    }

    pub fn build(self) -> Parser {
        Parser {
            name: self.name,
            description: self.description,
            help: self.help,
            wrap_len: self.wrap_len,
            env: self.env,
            registry: Registry::new(),
            commands: Vec::new(),
            args: Vec::new(),
            parent: None,
        }
    }
}

/// A parser scope: a rule registry, its commands and the tokens it parses.
///
/// The root scope is built with [`Parser::new`] or [`Parser::builder`].
/// Command handlers receive a child scope holding the tokens after the
/// command, a fresh registry, and a [`ParentScope`].
///
/// # Examples
///
/// ```
/// use argrules_core::Parser;
///
/// let mut parser = Parser::new();
/// parser.add_option("--verbose").is_true();
/// parser.add_option("--first").is_string();
/// parser.add_positional("second");
/// parser.add_positional("third");
///
/// let opts = parser.parse_args(&["--first", "one", "two", "--verbose"]).unwrap();
/// assert_eq!(opts.string("first"), "one");
/// assert_eq!(opts.string("second"), "two");
/// assert_eq!(opts.string("third"), "");
/// assert!(opts.bool("verbose"));
/// ```
#[derive(Debug)]
pub struct Parser {
    name: Option<String>,
    description: Option<String>,
    help: bool,
    wrap_len: usize,
    env: Rc<dyn EnvLookup>,
    registry: Registry,
    commands: Vec<Command>,
    args: Vec<String>,
    parent: Option<ParentScope>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Creates a root parser with auto help and the process environment.
    pub fn new() -> Self {
        ParserBuilder::default().build()
    }

    pub fn builder() -> ParserBuilder {
        ParserBuilder::new()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn help_enabled(&self) -> bool {
        self.help
    }

    pub fn wrap_len(&self) -> usize {
        self.wrap_len
    }

    /// Rules in listing order.
    pub fn rules(&self) -> &[Rule] {
        self.registry.rules()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Tokens this scope parses when no new tokens are supplied.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The dispatching scope, for command scopes.
    pub fn parent(&self) -> Option<&ParentScope> {
        self.parent.as_ref()
    }

    pub(crate) fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    pub(crate) fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    pub(crate) fn register(&mut self, rule: Rule) -> RuleModifier<'_> {
        RuleModifier::new(self.registry.register(rule))
    }

    /// Declares an option matched by `--name`, `++name`, `-name` or `+name`.
    pub fn add_option(&mut self, spelling: &str) -> RuleModifier<'_> {
        self.register(Rule::new(spelling, RuleKind::Optional))
    }

    /// Declares the next positional.
    pub fn add_positional(&mut self, name: &str) -> RuleModifier<'_> {
        self.register(Rule::new(name, RuleKind::Positional))
    }

    /// Declares a rule filled only from documents, environment or default.
    pub fn add_config(&mut self, name: &str) -> RuleModifier<'_> {
        self.register(Rule::new(name, RuleKind::Config))
    }

    /// Declares a config rule whose document value is a whole mapping,
    /// exposed as the group view `name`.
    pub fn add_config_group(&mut self, name: &str) -> RuleModifier<'_> {
        let mut rule = Rule::new(name, RuleKind::Config);
        rule.cast = CastType::StringMap;
        rule.flags.set(Flags::CONFIG_GROUP);
        self.register(rule)
    }

    /// Returns a scope whose declarations land in `group`.
    pub fn in_group(&mut self, group: &str) -> Group<'_> {
        Group {
            parser: self,
            group: group.to_string(),
        }
    }

    /// Registers a command. The handler runs with a child scope holding the
    /// tokens after the command name.
    pub fn add_command<F>(&mut self, name: &str, handler: F) -> CommandModifier<'_>
    where
        F: FnMut(&mut Parser, &mut dyn Any) -> i32 + 'static,
    {
        self.commands.push(Command {
            name: name.to_string(),
            help: None,
            handler: Box::new(handler),
        });
        let idx = self.commands.len() - 1;
        CommandModifier::new(&mut self.commands[idx])
    }

    /// Stores `tokens` and parses them.
    ///
    /// # Errors
    ///
    /// Any [`ParseError`]; see [`parse`](Self::parse).
    pub fn parse_args<S: AsRef<str>>(&mut self, tokens: &[S]) -> Result<Options> {
        self.set_args(tokens);
        self.parse()
    }

    /// Parses the scope's stored tokens: none for a new root parser, the
    /// remaining tokens for a command scope, otherwise the last tokens given
    /// to [`parse_args`](Self::parse_args).
    ///
    /// # Errors
    ///
    /// - [`ParseError::NoRules`] if nothing is registered (auto help counts).
    /// - [`ParseError::DuplicateName`] if two rules share a name or alias.
    /// - [`ParseError::MissingArgument`] / [`ParseError::InvalidValue`] /
    ///   [`ParseError::BadDefault`] for bad values.
    /// - [`ParseError::Required`] for unresolved required rules.
    /// - [`ParseError::HelpRequested`] when the auto help option is given.
    pub fn parse(&mut self) -> Result<Options> {
        self.execute(None).map(|(options, _)| options)
    }

    /// Re-parses the stored tokens with `document` as an extra fallback
    /// layer and returns a new snapshot.
    ///
    /// Precedence is command line, environment, document, default.
    /// Previously returned snapshots are not affected.
    ///
    /// # Examples
    ///
    /// ```
    /// use argrules_core::Parser;
    /// use serde_json::json;
    ///
    /// let mut parser = Parser::new();
    /// parser.add_config("power-level").count();
    ///
    /// let before = parser.parse_args(&["--power-level"]).unwrap();
    /// let doc = json!({"power-level": 3}).as_object().cloned().unwrap();
    /// let after = parser.apply(&doc).unwrap();
    ///
    /// assert_eq!(before.int("power-level"), 0);
    /// assert_eq!(after.int("power-level"), 3);
    /// ```
    ///
    /// # Errors
    ///
    /// Same as [`parse`](Self::parse); document cast failures name the
    /// document key.
    pub fn apply(&mut self, document: &Document) -> Result<Options> {
        self.execute(Some(document)).map(|(options, _)| options)
    }

    /// Stores `tokens`, parses them and dispatches the command found.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run).
    pub fn parse_and_run<S: AsRef<str>>(&mut self, tokens: &[S], ctx: &mut dyn Any) -> Result<i32> {
        self.set_args(tokens);
        self.run(ctx)
    }

    /// Parses the stored tokens and dispatches the command found, returning
    /// the handler's status unchanged.
    ///
    /// # Errors
    ///
    /// Any error from [`parse`](Self::parse), or
    /// [`ParseError::MissingCommand`] when no command token was found.
    pub fn run(&mut self, ctx: &mut dyn Any) -> Result<i32> {
        let (options, dispatch) = self.execute(None)?;
        let Some(Dispatch { index, rest }) = dispatch else {
            return Err(ParseError::MissingCommand);
        };

        let mut child = self.child_scope(index, rest, options);
        let command = &mut self.commands[index];
        debug!(command = %command.name, tokens = child.args.len(), "Dispatching command");
        let status = (command.handler)(&mut child, ctx);
        debug!(command = %command.name, status, "Command finished");
        Ok(status)
    }

    fn set_args<S: AsRef<str>>(&mut self, tokens: &[S]) {
        self.args = tokens.iter().map(|t| t.as_ref().to_string()).collect();
    }

    /// Inserts auto help, then runs the checks that precede scanning.
    fn prepare(&mut self) -> Result<()> {
        if self.help && !self.registry.contains("help") {
            self.registry.register_first(Rule::help_option());
        }
        if self.registry.is_empty() {
            return Err(ParseError::NoRules);
        }
        self.registry.validate()
    }

    fn execute(&mut self, document: Option<&Document>) -> Result<(Options, Option<Dispatch>)> {
        self.prepare()?;
        debug!(
            scope = self.name.as_deref().unwrap_or("<root>"),
            tokens = self.args.len(),
            rules = self.registry.len(),
            document = document.is_some(),
            "Starting parse pass"
        );

        let scan = engine::scan(&mut self.registry, &self.args, &self.commands)?;
        let sources = Sources {
            env: self.env.as_ref(),
            document,
        };
        let values = engine::resolve(&self.registry, scan.values, &sources)?;
        engine::check_required(&self.registry, &values)?;

        let options = engine::build_options(&self.registry, &values, scan.extra);
        engine::write_bindings(&self.registry, &values);
        Ok((options, scan.dispatch))
    }

    fn child_scope(&self, index: usize, rest: Vec<String>, options: Options) -> Parser {
        let command = &self.commands[index];
        let mut path = self
            .parent
            .as_ref()
            .map(|parent| parent.path.clone())
            .unwrap_or_default();
        path.push(command.name.clone());

        let name = match &self.name {
            Some(name) => format!("{name} {}", command.name),
            None => command.name.clone(),
        };

        Parser {
            name: Some(name),
            description: command.help.clone(),
            help: self.help,
            wrap_len: self.wrap_len,
            env: Rc::clone(&self.env),
            registry: Registry::new(),
            commands: Vec::new(),
            args: rest,
            parent: Some(ParentScope { path, options }),
        }
    }
}

/// Declaration scope returned by [`Parser::in_group`].
///
/// # Examples
///
/// ```
/// use argrules_core::Parser;
///
/// let mut parser = Parser::new();
/// let mut db = parser.in_group("database");
/// db.add_option("--host").alias("-dH").default("localhost");
/// db.add_config("debug").is_true();
///
/// let opts = parser.parse().unwrap();
/// assert_eq!(opts.group("database").string("host"), "localhost");
/// assert!(!opts.group("database").bool("debug"));
/// ```
#[derive(Debug)]
pub struct Group<'a> {
    parser: &'a mut Parser,
    group: String,
}

impl Group<'_> {
    pub fn add_option(&mut self, spelling: &str) -> RuleModifier<'_> {
        let group = self.group.clone();
        self.parser.add_option(spelling).in_group(&group)
    }

    pub fn add_positional(&mut self, name: &str) -> RuleModifier<'_> {
        let group = self.group.clone();
        self.parser.add_positional(name).in_group(&group)
    }

    pub fn add_config(&mut self, name: &str) -> RuleModifier<'_> {
        let group = self.group.clone();
        self.parser.add_config(name).in_group(&group)
    }
}

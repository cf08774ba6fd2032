//! Sub-command registration and child scopes.

use std::any::Any;
use std::fmt;

use crate::options::Options;
use crate::parser::Parser;

/// Handler invoked with the child scope and the caller's context value.
/// The returned status is propagated unchanged.
pub type Handler = Box<dyn FnMut(&mut Parser, &mut dyn Any) -> i32>;

/// A named command that hands the remaining tokens to a child scope.
pub struct Command {
    pub name: String,
    pub help: Option<String>,
    pub(crate) handler: Handler,
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("help", &self.help)
            .finish_non_exhaustive()
    }
}

/// Chainable modifier returned by [`Parser::add_command`].
#[derive(Debug)]
pub struct CommandModifier<'a> {
    command: &'a mut Command,
}

impl<'a> CommandModifier<'a> {
    pub(crate) fn new(command: &'a mut Command) -> Self {
        Self { command }
    }

    pub fn help(self, help: &str) -> Self {
        self.command.help = Some(help.to_string());
        self
    }
}

/// What a child scope knows about the scope that dispatched it.
///
/// The parent's snapshot is handed over by value, so nothing registered in
/// the child can reach back into the parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentScope {
    /// Command names from the root scope down to this one.
    pub path: Vec<String>,
    /// Snapshot the parent resolved before dispatching.
    pub options: Options,
}

impl ParentScope {
    /// Space-joined command path (e.g. `volume create`).
    pub fn command_path(&self) -> String {
        self.path.join(" ")
    }
}

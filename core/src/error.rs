//! Error types for rule matching and resolution.
//!
//! Message wording is part of the public contract: callers (and tests) match
//! on the `Display` output, so every variant renders a fixed sentence.

use thiserror::Error;

/// Errors produced while parsing tokens or merging a document.
///
/// [`ParseError::HelpRequested`] is not a real failure. It renders as an
/// empty string and is detected with [`ParseError::is_help_requested`].
///
/// # Examples
///
/// ```
/// use argrules_core::ParseError;
///
/// let err = ParseError::MissingArgument { option: "--power-level".into() };
/// assert_eq!(err.to_string(), "Expected '--power-level' to have an argument");
/// assert_eq!(err.exit_code(), 1);
///
/// assert!(ParseError::HelpRequested.is_help_requested());
/// assert_eq!(ParseError::HelpRequested.to_string(), "");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A parse was attempted before any rule was registered.
    #[error("Must create some options to match with add_option() before calling parse()")]
    NoRules,

    /// An option that takes a value was the last token, or was followed by
    /// another recognised option.
    #[error("Expected '{option}' to have an argument")]
    MissingArgument {
        /// Option spelling exactly as given on the command line.
        option: String,
    },

    /// A raw value failed the rule's cast. `origin` is the CLI spelling, the
    /// environment variable name, or the document key.
    #[error("Invalid value for '{origin}' - '{value}' is not {expected}")]
    InvalidValue {
        origin: String,
        value: String,
        expected: &'static str,
    },

    /// A declared default does not satisfy its own rule's cast.
    #[error("Bad default value for '{option}' - '{value}' is not {expected}")]
    BadDefault {
        option: String,
        value: String,
        expected: &'static str,
    },

    /// A required rule has no value after every fallback was tried.
    #[error("{kind} '{name}' is required")]
    Required {
        /// `option`, `positional` or `config`.
        kind: &'static str,
        name: String,
    },

    /// Two rules in the same scope share a name or alias.
    #[error("Duplicate option '{0}' defined")]
    DuplicateName(String),

    /// The auto-registered help option was matched.
    #[error("")]
    HelpRequested,

    /// A command dispatch was requested but no command token was found.
    #[error("No command was provided")]
    MissingCommand,
}

impl ParseError {
    /// Returns `true` when the user asked for help rather than hitting an
    /// actual error.
    pub fn is_help_requested(&self) -> bool {
        matches!(self, Self::HelpRequested)
    }

    /// Process exit status appropriate for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::HelpRequested => 0,
            _ => 1,
        }
    }
}

/// Convenience alias for results with [`ParseError`].
pub type Result<T> = std::result::Result<T, ParseError>;

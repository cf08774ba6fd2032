//! Declarative argument and configuration parsing.
//!
//! Rules are declared on a [`Parser`], each with a name, a value type and a
//! fallback chain. A parse pass walks the command-line tokens once, then
//! fills every rule it did not see from the environment, an optional
//! loaded document, and finally the declared default:
//!
//! - [`Rule`] / [`RuleModifier`]: one matchable declaration and its builder
//!   chain.
//! - [`Registry`]: the ordered rule list of one parser scope, with lookup by
//!   prefixed token and duplicate-name validation.
//! - [`CastType`]: value types and their accumulation rules (counters,
//!   integers, strings, booleans, string slices, string maps).
//! - [`Options`]: the immutable snapshot a pass produces.
//! - [`Command`] / [`ParentScope`]: sub-commands that hand the remaining
//!   tokens to a child scope.
//! - [`RuleSet`] / [`RuleDecl`]: the same declarations as JSON or YAML data.
//!
//! # Example
//!
//! ```
//! use argrules_core::{MapEnv, Parser, binding};
//!
//! let debug = binding::<bool>();
//! let mut parser = Parser::builder()
//!     .env(MapEnv::new().with("APP_USER", "root"))
//!     .build();
//! parser.add_option("--verbose").alias("-v").count();
//! parser.add_option("--debug").store_true(&debug);
//! parser.add_option("--user").env("APP_USER");
//! parser.add_positional("file").required();
//!
//! let opts = parser
//!     .parse_args(&["-v", "--verbose", "notes.txt", "--debug"])
//!     .unwrap();
//! assert_eq!(opts.int("verbose"), 2);
//! assert_eq!(opts.string("user"), "root");
//! assert_eq!(opts.string("file"), "notes.txt");
//! assert!(*debug.borrow());
//!
//! let err = parser.parse_args(&["-h"]).unwrap_err();
//! assert!(err.is_help_requested());
//! ```

mod accumulate;
mod command;
mod decl;
mod engine;
mod env;
mod error;
mod options;
mod parser;
mod registry;
mod rule;
mod sink;
mod value;

pub use accumulate::CastFailure;
pub use command::{Command, CommandModifier, Handler, ParentScope};
pub use decl::{RuleDecl, RuleSet};
pub use env::{EnvLookup, MapEnv, ProcessEnv};
pub use error::{ParseError, Result};
pub use options::Options;
pub use parser::{DEFAULT_WRAP_LEN, Group, Parser, ParserBuilder};
pub use registry::Registry;
pub use rule::{CastType, Flags, PREFIXES, Rule, RuleKind, RuleModifier, is_escaped, strip_prefix, unescape};
pub use sink::{Binding, Sink, binding};
pub use value::{Document, FromValue, Value};

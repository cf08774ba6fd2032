//! Help rendering and snapshot output for `argrules` parsers.
//!
//! The core parser never prints. When a parse returns
//! [`ParseError::HelpRequested`](argrules_core::ParseError::HelpRequested),
//! callers render [`render_help`] and exit:
//!
//! ```
//! use argrules_core::Parser;
//! use argrules_help::render_help;
//!
//! let mut parser = Parser::builder().name("deploy").build();
//! parser.add_option("--dry-run").is_true().help("Print actions only");
//!
//! match parser.parse_args(&["--help"]) {
//!     Err(err) if err.is_help_requested() => {
//!         assert!(render_help(&parser).starts_with("Usage: deploy [OPTIONS]\n"));
//!     }
//!     other => panic!("expected help, got {other:?}"),
//! }
//! ```

mod output;
mod render;

pub use output::{OutputFormat, format_options, value_to_string};
pub use render::{
    MIN_TEXT_WIDTH, collapse_whitespace, render_commands, render_help, render_section,
    render_usage, rule_label, wrap_text,
};

//! Document loading for `argrules` parsers.
//!
//! Reads INI, JSON and YAML files into the generic [`Document`] tree that
//! [`Parser::apply`](argrules_core::Parser::apply) consumes:
//!
//! - [`load_document`] / [`parse_document`]: one file or text, format chosen
//!   by [`DocumentFormat`].
//! - [`DocumentBuilder`]: several layers deep-merged in order.
//! - [`apply_file`] / [`apply_str`]: load and apply in one call.
//!
//! [`Document`]: argrules_core::Document

mod error;
mod ini;
mod loader;

pub use error::{ConfigError, Result};
pub use ini::parse_ini;
pub use loader::{
    DocumentBuilder, DocumentFormat, DocumentSource, apply_file, apply_str, load_document,
    merge_documents, parse_document,
};

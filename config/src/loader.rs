//! Document loading and layering.
//!
//! Provides [`load_document`] for a single file, [`DocumentBuilder`] for
//! stacking several sources, and [`apply_file`] / [`apply_str`] to re-run a
//! parser with a loaded document as its fallback layer.
//!
//! # Layering
//!
//! ```no_run
//! use argrules_config::DocumentBuilder;
//!
//! // Later layers override earlier ones, key by key.
//! let doc = DocumentBuilder::new()
//!     .file("/etc/app/app.ini")
//!     .optional_file("/home/user/.config/app.yaml")
//!     .build()
//!     .unwrap();
//! ```

use std::path::{Path, PathBuf};

use argrules_core::{Document, Options, Parser};
use serde_json::Value as Json;
use tracing::debug;

use crate::error::{ConfigError, Result};
use crate::ini::parse_ini;

/// Serialization format of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Ini,
    Json,
    Yaml,
}

impl DocumentFormat {
    /// Picks a format from a file extension (case-insensitive).
    ///
    /// # Examples
    ///
    /// ```
    /// use argrules_config::DocumentFormat;
    ///
    /// assert_eq!(DocumentFormat::from_path("app.conf"), Some(DocumentFormat::Ini));
    /// assert_eq!(DocumentFormat::from_path("app.YML"), Some(DocumentFormat::Yaml));
    /// assert_eq!(DocumentFormat::from_path("app.toml"), None);
    /// ```
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "ini" | "conf" | "cfg" => Some(Self::Ini),
            "json" => Some(Self::Json),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Ini => "ini",
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

/// Parses document text in the given format.
///
/// # Errors
///
/// Returns the format's syntax error, or [`ConfigError::NotAMapping`] when
/// a JSON/YAML root is not an object. An empty YAML text is an empty
/// document.
pub fn parse_document(text: &str, format: DocumentFormat) -> Result<Document> {
    let root: Json = match format {
        DocumentFormat::Ini => return parse_ini(text),
        DocumentFormat::Yaml if text.trim().is_empty() => return Ok(Document::new()),
        DocumentFormat::Json => serde_json::from_str(text)?,
        DocumentFormat::Yaml => serde_yaml::from_str(text)?,
    };
    match root {
        Json::Object(map) => Ok(map),
        Json::Null => Ok(Document::new()),
        Json::Bool(_) => Err(ConfigError::NotAMapping("a boolean")),
        Json::Number(_) => Err(ConfigError::NotAMapping("a number")),
        Json::String(_) => Err(ConfigError::NotAMapping("a string")),
        Json::Array(_) => Err(ConfigError::NotAMapping("a sequence")),
    }
}

/// Loads a document file, choosing the format by extension.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownFormat`] for an unrecognised extension,
/// [`ConfigError::IoError`] if the file cannot be read, or the format's
/// syntax error.
pub fn load_document(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref();
    let format =
        DocumentFormat::from_path(path).ok_or_else(|| ConfigError::UnknownFormat(path.to_path_buf()))?;
    let text = std::fs::read_to_string(path)?;
    let document = parse_document(&text, format)?;
    debug!(path = %path.display(), format = format.name(), keys = document.len(), "Loaded document");
    Ok(document)
}

/// Deep-merges `overlay` into `base`. Nested mappings merge key by key;
/// any other value replaces what was there.
///
/// # Examples
///
/// ```
/// use argrules_config::merge_documents;
/// use serde_json::json;
///
/// let mut base = json!({"db": {"user": "a", "pass": "b"}}).as_object().cloned().unwrap();
/// let overlay = json!({"db": {"pass": "c"}, "debug": true}).as_object().cloned().unwrap();
/// merge_documents(&mut base, overlay);
///
/// assert_eq!(base["db"], json!({"user": "a", "pass": "c"}));
/// assert_eq!(base["debug"], json!(true));
/// ```
pub fn merge_documents(base: &mut Document, overlay: Document) {
    for (key, value) in overlay {
        match value {
            Json::Object(nested) => {
                if let Some(Json::Object(existing)) = base.get_mut(&key) {
                    merge_documents(existing, nested);
                } else {
                    base.insert(key, Json::Object(nested));
                }
            }
            value => {
                base.insert(key, value);
            }
        }
    }
}

/// One layer of a [`DocumentBuilder`].
#[derive(Debug, Clone)]
pub enum DocumentSource {
    /// A file that must exist.
    File(PathBuf),
    /// A file that is skipped when missing.
    OptionalFile(PathBuf),
    /// Inline text in a known format.
    Text { format: DocumentFormat, text: String },
    /// An already-built document.
    Document(Document),
}

/// Builds one document from several layered sources.
///
/// Sources are merged in the order they are added; later layers override
/// earlier ones key by key.
///
/// # Example
///
/// ```
/// use argrules_config::{DocumentBuilder, DocumentFormat};
///
/// let doc = DocumentBuilder::new()
///     .text(DocumentFormat::Ini, "host=localhost\nport=80\n")
///     .text(DocumentFormat::Json, r#"{"port": 8080}"#)
///     .optional_file("/nonexistent/app.yaml")
///     .build()
///     .unwrap();
/// assert_eq!(doc["host"], "localhost");
/// assert_eq!(doc["port"], 8080);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DocumentBuilder {
    sources: Vec<DocumentSource>,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(DocumentSource::File(path.into()));
        self
    }

    pub fn optional_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sources.push(DocumentSource::OptionalFile(path.into()));
        self
    }

    pub fn text(mut self, format: DocumentFormat, text: impl Into<String>) -> Self {
        self.sources.push(DocumentSource::Text {
            format,
            text: text.into(),
        });
        self
    }

    pub fn document(mut self, document: Document) -> Self {
        self.sources.push(DocumentSource::Document(document));
        self
    }

    pub fn sources(&self) -> &[DocumentSource] {
        &self.sources
    }

    /// Loads and merges every layer.
    ///
    /// # Errors
    ///
    /// Fails on the first layer that cannot be loaded. A missing
    /// [`optional_file`](Self::optional_file) is skipped.
    pub fn build(self) -> Result<Document> {
        let mut merged = Document::new();
        for source in self.sources {
            let layer = match source {
                DocumentSource::File(path) => load_document(&path)?,
                DocumentSource::OptionalFile(path) => {
                    if !path.exists() {
                        debug!(path = %path.display(), "Skipping missing optional document");
                        continue;
                    }
                    load_document(&path)?
                }
                DocumentSource::Text { format, text } => parse_document(&text, format)?,
                DocumentSource::Document(document) => document,
            };
            merge_documents(&mut merged, layer);
        }
        Ok(merged)
    }
}

/// Loads a document file and applies it to `parser`.
///
/// # Errors
///
/// Any loading error, or the parser's [`ParseError`](argrules_core::ParseError)
/// wrapped in [`ConfigError::Parse`].
pub fn apply_file(parser: &mut Parser, path: impl AsRef<Path>) -> Result<Options> {
    let document = load_document(path)?;
    Ok(parser.apply(&document)?)
}

/// Parses document text and applies it to `parser`.
///
/// # Examples
///
/// ```
/// use argrules_config::{DocumentFormat, apply_str};
/// use argrules_core::Parser;
///
/// let mut parser = Parser::new();
/// parser.add_option("--power-level").is_int();
/// parser.add_config_group("endpoints");
///
/// let ini = "power-level=20000\n[endpoints]\nendpoint1=http://thrawn01.org/1\n";
/// let opts = apply_str(&mut parser, DocumentFormat::Ini, ini).unwrap();
/// assert_eq!(opts.int("power-level"), 20000);
/// assert_eq!(opts.group("endpoints").string("endpoint1"), "http://thrawn01.org/1");
/// ```
///
/// # Errors
///
/// Same as [`apply_file`], minus I/O.
pub fn apply_str(parser: &mut Parser, format: DocumentFormat, text: &str) -> Result<Options> {
    let document = parse_document(text, format)?;
    Ok(parser.apply(&document)?)
}

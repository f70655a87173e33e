//! Per-document configuration.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── error.rs        # ConfigError, FrontmatterError
//! ├── frontmatter.rs  # `---` fenced YAML block splitting
//! └── mod.rs          # DocumentConfig (this file)
//! ```
//!
//! # Sources
//!
//! | Source             | Priority | Purpose                                  |
//! |--------------------|----------|------------------------------------------|
//! | `config.yml`       | low      | Defaults shared by a directory           |
//! | front matter       | high     | Options of one document                  |
//!
//! Both sources are YAML mappings. They are merged key-wise before any value
//! is decoded, so a front matter key replaces the sibling value wholesale.

pub mod error;
pub mod frontmatter;

pub use error::ConfigError;
pub use frontmatter::extract_lenient;

use crate::{debug, log};
use serde_yaml::{Mapping, Value};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// File name of the directory-level defaults.
pub const SIBLING_CONFIG: &str = "config.yml";

/// Title used when a document configures none.
pub const DEFAULT_TITLE: &str = "Interactive Document";

// ============================================================================
// DocumentConfig
// ============================================================================

/// Options of one render call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentConfig {
    /// Page title (falls back to [`DEFAULT_TITLE`]).
    pub title: Option<String>,
    /// Stylesheet URL, typically a web font.
    pub font: Option<String>,
    /// Raw CSS placed in an inline `<style>` block.
    pub styles: String,
    /// Script URLs, emitted in order.
    pub scripts: Vec<String>,
    /// Raw HTML injected at the end of `<head>`.
    pub head: String,
    /// Raw HTML injected at the start of `<body>`.
    pub body: String,
    /// Wrap every word of the rendered text in `<span class="token">`
    /// (YAML key `tokenizeWords`).
    pub tokenize_words: bool,
}

impl DocumentConfig {
    /// Page title with the default applied.
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(DEFAULT_TITLE)
    }

    /// Decode a mapping key by key.
    ///
    /// A value that cannot be decoded is logged and dropped; the remaining
    /// keys still apply. Unknown keys are ignored.
    pub fn from_mapping(map: &Mapping) -> Self {
        let mut config = Self::default();
        for (key, value) in map {
            let Some(key) = key.as_str() else {
                debug!("config"; "ignoring non-string key {:?}", key);
                continue;
            };
            if let Err(reason) = config.apply(key, value) {
                log!("config"; "ignoring `{}`: {}", key, reason);
            }
        }
        config
    }

    fn apply(&mut self, key: &str, value: &Value) -> Result<(), String> {
        match key {
            "title" => self.title = optional_text(value)?,
            "font" => self.font = optional_text(value)?,
            "styles" => self.styles = optional_text(value)?.unwrap_or_default(),
            "head" => self.head = optional_text(value)?.unwrap_or_default(),
            "body" => self.body = optional_text(value)?.unwrap_or_default(),
            "scripts" => self.scripts = text_list(value)?,
            "tokenizeWords" | "tokenize_words" => {
                self.tokenize_words = match value {
                    Value::Bool(b) => *b,
                    Value::Null => false,
                    other => return Err(format!("expected a boolean, found {}", describe(other))),
                }
            }
            _ => debug!("config"; "unknown key `{}`", key),
        }
        Ok(())
    }
}

/// Scalars render as their text; `null` means unset.
fn optional_text(value: &Value) -> Result<Option<String>, String> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(format!("expected text, found {}", describe(other))),
    }
}

fn text_list(value: &Value) -> Result<Vec<String>, String> {
    match value {
        Value::Sequence(items) => items
            .iter()
            .map(|item| optional_text(item)?.ok_or_else(|| "null entry in list".to_string()))
            .collect(),
        other => Ok(optional_text(other)?.into_iter().collect()),
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Merge `overrides` over `base` (top-level keys only).
pub fn merge(base: Mapping, overrides: Mapping) -> Mapping {
    let mut merged = base;
    for (key, value) in overrides {
        merged.insert(key, value);
    }
    merged
}

/// Path of the sibling config for a source file.
pub fn sibling_path(source: &Path) -> PathBuf {
    source
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(SIBLING_CONFIG)
}

/// Read the sibling `config.yml` of `source`.
///
/// A missing file is not an error and yields an empty mapping.
pub fn load_sibling(source: &Path) -> Result<Mapping, ConfigError> {
    let path = sibling_path(source);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Mapping::new()),
        Err(e) => return Err(ConfigError::Io(path, e)),
    };

    if content.trim().is_empty() {
        return Ok(Mapping::new());
    }
    match serde_yaml::from_str::<Value>(&content) {
        Ok(Value::Mapping(map)) => Ok(map),
        Ok(Value::Null) => Ok(Mapping::new()),
        Ok(_) => Err(ConfigError::InvalidRootType(path)),
        Err(e) => Err(ConfigError::Yaml(path, e)),
    }
}

/// Resolve the configuration of `source` given its own front matter.
///
/// Sibling config problems are logged and treated as an empty mapping.
pub fn resolve(source: &Path, frontmatter: Mapping) -> DocumentConfig {
    let defaults = load_sibling(source).unwrap_or_else(|e| {
        log!("config"; "{:#}", anyhow::Error::from(e));
        Mapping::new()
    });
    DocumentConfig::from_mapping(&merge(defaults, frontmatter))
}

// ============================================================================
// Tests
// ============================================================================

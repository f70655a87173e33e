//! Custom token types layered on top of the CommonMark grammar.
//!
//! An [`Extension`] is tried before the baseline parser's own rendering of
//! the same source. Block extensions are matched against the source of a
//! whole leaf block; inline extensions may start anywhere inside a run of
//! inline content, and the nearest candidate wins.

use super::id::IdGenerator;
use super::tables::{ReferenceTable, RunBlockRegistry};

/// Where an extension is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    /// Matched against the start of a leaf block.
    Block,
    /// Matched anywhere in inline content.
    Inline,
}

/// A recognized span of source text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Token {
    pub kind: &'static str,
    /// Exact source text consumed.
    pub raw: String,
    /// Identifier carried into the output (reference id, run id, slug).
    pub id: String,
    /// Display text or code body.
    pub text: String,
    /// Language hint of a fenced block.
    pub lang: Option<String>,
    /// Parsed `key="value"` attributes, in source order.
    pub attrs: Vec<(String, String)>,
    /// Heading depth (1-6), zero elsewhere.
    pub depth: u8,
}

impl Token {
    pub fn new(kind: &'static str, raw: impl Into<String>) -> Self {
        Self {
            kind,
            raw: raw.into(),
            ..Self::default()
        }
    }
}

/// Mutable state of one processing pass.
pub struct ParseState<'a> {
    pub references: ReferenceTable,
    pub run_blocks: RunBlockRegistry,
    pub ids: &'a dyn IdGenerator,
}

impl<'a> ParseState<'a> {
    pub fn new(ids: &'a dyn IdGenerator) -> Self {
        Self {
            references: ReferenceTable::default(),
            run_blocks: RunBlockRegistry::default(),
            ids,
        }
    }
}

/// A custom token type with its own parse and render contract.
pub trait Extension: Send + Sync {
    fn kind(&self) -> &'static str;

    fn level(&self) -> Level;

    /// Byte offset of the earliest position in `src` where this extension
    /// could match. Only consulted for inline extensions.
    fn start(&self, src: &str) -> Option<usize> {
        let _ = src;
        Some(0)
    }

    /// Match a prefix of `src`. Must not have side effects: a recognized
    /// token can still be rejected by the transformer.
    fn recognize(&self, src: &str) -> Option<Token>;

    /// Called once the token is committed to the output.
    fn accept(&self, token: &mut Token, state: &mut ParseState<'_>) {
        let _ = (token, state);
    }

    /// Whether [`render`](Self::render) receives the block's rendered
    /// inline content.
    fn wraps_children(&self) -> bool {
        false
    }

    fn render(&self, token: &Token, children: &str) -> String;
}

/// Ordered set of extensions. Earlier registrations win ties.
#[derive(Default)]
pub struct ExtensionRegistry {
    extensions: Vec<Box<dyn Extension>>,
}

impl ExtensionRegistry {
    /// Empty registry: plain CommonMark output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cross-reference, executable block and heading extensions.
    pub fn standard() -> Self {
        Self::new()
            .with(super::reference::CrossReference::new())
            .with(super::runcode::RunCode::new())
            .with(super::heading::Heading::new())
    }

    pub fn with(mut self, extension: impl Extension + 'static) -> Self {
        self.register(extension);
        self
    }

    pub fn register(&mut self, extension: impl Extension + 'static) {
        self.extensions.push(Box::new(extension));
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    pub fn kinds(&self) -> Vec<&'static str> {
        self.extensions.iter().map(|e| e.kind()).collect()
    }

    /// Extensions of `level`, in registration order.
    pub fn at_level(&self, level: Level) -> impl Iterator<Item = &dyn Extension> {
        self.extensions
            .iter()
            .map(|e| &**e)
            .filter(move |e| e.level() == level)
    }
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.kinds()).finish()
    }
}

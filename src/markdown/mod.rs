//! Extended Markdown to HTML.
//!
//! - [`Processor`] - runs pulldown-cmark with an [`ExtensionRegistry`]
//! - [`extension`] - the extension contract and registry
//! - [`reference`], [`runcode`], [`heading`] - the standard extensions
//! - [`words`] - optional word tokenizer post-pass

pub mod extension;
pub mod heading;
pub mod id;
pub mod reference;
pub mod runcode;
pub mod tables;
mod transform;
pub mod words;

use std::ops::Range;
use std::sync::Arc;

use pulldown_cmark::{Event, Options, Parser, html};

use crate::config::DocumentConfig;

pub use extension::{ExtensionRegistry, ParseState};
pub use id::{IdGenerator, UuidGenerator};
#[cfg(test)]
pub use id::SequentialIds;
pub use tables::{ReferenceTable, RunBlockRegistry};

/// Baseline grammar options.
#[derive(Debug, Clone)]
pub struct MarkdownOptions {
    /// Enable tables extension
    pub tables: bool,
    /// Enable footnotes extension
    pub footnotes: bool,
    /// Enable strikethrough extension
    pub strikethrough: bool,
    /// Enable task lists extension
    pub task_lists: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            tables: true,
            footnotes: true,
            strikethrough: true,
            task_lists: true,
        }
    }
}

impl MarkdownOptions {
    fn to_pulldown_options(&self) -> Options {
        let mut opts = Options::empty();
        if self.tables {
            opts.insert(Options::ENABLE_TABLES);
        }
        if self.footnotes {
            opts.insert(Options::ENABLE_FOOTNOTES);
        }
        if self.strikethrough {
            opts.insert(Options::ENABLE_STRIKETHROUGH);
        }
        if self.task_lists {
            opts.insert(Options::ENABLE_TASKLISTS);
        }
        opts
    }
}

/// Output of one [`Processor::process`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    /// HTML fragment (no document wrapper).
    pub html: String,
    /// Cross-references seen in this document.
    pub references: ReferenceTable,
    /// Executable blocks of this document, in order.
    pub run_blocks: RunBlockRegistry,
}

/// Extended Markdown renderer.
///
/// Holds no per-document state, so one processor can render any number of
/// documents, from any number of threads.
pub struct Processor {
    registry: ExtensionRegistry,
    options: MarkdownOptions,
    ids: Arc<dyn IdGenerator>,
}

impl Default for Processor {
    fn default() -> Self {
        Self::new(ExtensionRegistry::standard())
    }
}

impl Processor {
    pub fn new(registry: ExtensionRegistry) -> Self {
        Self {
            registry,
            options: MarkdownOptions::default(),
            ids: Arc::new(UuidGenerator),
        }
    }

    /// Replace the identifier source of executable blocks.
    #[cfg(test)]
    pub fn with_ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Render a Markdown body (front matter already removed).
    pub fn process(&self, markdown: &str, config: &DocumentConfig) -> Rendered {
        let events: Vec<(Event<'_>, Range<usize>)> =
            Parser::new_ext(markdown, self.options.to_pulldown_options())
                .into_offset_iter()
                .collect();

        let mut state = ParseState::new(self.ids.as_ref());
        let events = transform::Transformer::new(&self.registry, markdown)
            .rewrite(&events, &mut state);

        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, events.into_iter());

        if config.tokenize_words {
            match words::tokenize_words(&out) {
                Ok(tokenized) => out = tokenized,
                Err(e) => crate::log!("markdown"; "word tokenizer failed, output left as is: {}", e),
            }
        }

        Rendered {
            html: out,
            references: state.references,
            run_blocks: state.run_blocks,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Source document → complete HTML document.
//!
//! ```text
//! source ──split──► front matter ──merge(config.yml)──► DocumentConfig
//!    │                                                       │
//!    └──► body ──Processor──► fragment ──assemble::wrap──────┴──► document
//! ```

pub mod assemble;

use std::path::Path;

use crate::config::{self, DocumentConfig};
use crate::markdown::{Processor, Rendered};

pub use assemble::wrap;

/// A rendered source file.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    /// Complete HTML document.
    pub html: String,
    /// Fragment and side tables of the body.
    pub rendered: Rendered,
    /// Resolved configuration.
    pub config: DocumentConfig,
}

/// Render already-read `source` located at `path`.
///
/// `extra_head` is appended to the configured `head` fragment. Configuration
/// problems are logged and never fail the render.
pub fn render_source(
    source: &str,
    path: &Path,
    processor: &Processor,
    extra_head: &str,
) -> RenderedDocument {
    let extracted = config::extract_lenient(source);
    let mut config = config::resolve(path, extracted.frontmatter);
    config.head.push_str(extra_head);

    let rendered = processor.process(extracted.body, &config);
    let html = wrap(&rendered.html, &config);
    RenderedDocument {
        html,
        rendered,
        config,
    }
}

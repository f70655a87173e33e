//! State of one live document.
//!
//! A [`Session`] is created per watched file and shared (behind an `Arc`) by
//! the HTTP handler, which reads the latest document, and the watch actor,
//! which replaces it.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arc_swap::ArcSwapOption;
use parking_lot::Mutex;

use crate::config;
use crate::embed::serve::{RELOAD_JS, ReloadVars};
use crate::freshness::{ChangeDetector, Freshness};
use crate::markdown::Processor;
use crate::pipeline;

/// Outcome of [`Session::refresh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    /// A new document replaced the previous one.
    Updated,
    /// Source content is identical to the last rendered content.
    Unchanged,
}

pub struct Session {
    source: PathBuf,
    processor: Processor,
    /// Appended to the configured `head` of every render.
    live_head: String,
    detector: Mutex<ChangeDetector>,
    latest: ArcSwapOption<String>,
}

impl Session {
    /// Session whose documents carry the reload agent for `ws_port`.
    pub fn new(source: PathBuf, processor: Processor, ws_port: u16) -> Self {
        let agent = RELOAD_JS.render(&ReloadVars { ws_port });
        Self::with_head(source, processor, format!("<script>\n{agent}</script>"))
    }

    pub fn with_head(source: PathBuf, processor: Processor, live_head: String) -> Self {
        Self {
            source,
            processor,
            live_head,
            detector: Mutex::new(ChangeDetector::new()),
            latest: ArcSwapOption::const_empty(),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Sibling config file whose changes also affect the document.
    pub fn sibling_config(&self) -> PathBuf {
        config::sibling_path(&self.source)
    }

    /// File name shown while the first render is pending.
    pub fn display_name(&self) -> String {
        self.source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string())
    }

    /// Latest rendered document, `None` until the first successful render.
    pub fn latest(&self) -> Option<Arc<String>> {
        self.latest.load_full()
    }

    /// Re-read the source and render it if its content changed.
    ///
    /// On error the previous document stays in place and nothing is
    /// recorded, so the next change event retries.
    pub fn refresh(&self) -> Result<Refresh> {
        let bytes = fs::read(&self.source)
            .with_context(|| format!("failed to read {}", self.source.display()))?;

        let hash = match self.detector.lock().check(&self.source, &bytes) {
            Freshness::Changed(hash) => hash,
            Freshness::Unchanged => return Ok(Refresh::Unchanged),
        };

        let text = String::from_utf8(bytes)
            .with_context(|| format!("{} is not valid UTF-8", self.source.display()))?;
        let doc = pipeline::render_source(&text, &self.source, &self.processor, &self.live_head);

        self.latest.store(Some(Arc::new(doc.html)));
        self.detector.lock().record(&self.source, hash);
        crate::debug!("live"; "rendered {} ({})", self.display_name(), hash);
        Ok(Refresh::Updated)
    }

    /// Forget the last fingerprint so the next refresh renders again.
    ///
    /// Used when the sibling config changed while the source did not.
    pub fn invalidate(&self) {
        self.detector.lock().forget(&self.source);
    }
}

//! Duplicate change suppression.
//!
//! A single logical edit often produces several filesystem events. The
//! detector keeps one fingerprint per path, the fingerprint of the last
//! content that was processed successfully, and rejects identical content.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use super::hash::ContentHash;

/// Outcome of [`ChangeDetector::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Content differs from the last recorded state; carries its hash.
    Changed(ContentHash),
    /// Content is identical to the last successfully processed content.
    Unchanged,
}

impl Freshness {
    pub fn should_process(&self) -> bool {
        matches!(self, Self::Changed(_))
    }
}

#[derive(Debug, Default)]
pub struct ChangeDetector {
    seen: FxHashMap<PathBuf, ContentHash>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare `content` against the last recorded fingerprint of `path`.
    ///
    /// Does not record anything: call [`record`](Self::record) once the
    /// content has been processed successfully.
    pub fn check(&self, path: &Path, content: &[u8]) -> Freshness {
        let hash = ContentHash::of(content);
        match self.seen.get(path) {
            Some(last) if *last == hash => Freshness::Unchanged,
            _ => Freshness::Changed(hash),
        }
    }

    pub fn record(&mut self, path: &Path, hash: ContentHash) {
        self.seen.insert(path.to_path_buf(), hash);
    }

    /// Drop the fingerprint of `path`, so its next content is processed.
    pub fn forget(&mut self, path: &Path) {
        self.seen.remove(path);
    }
}

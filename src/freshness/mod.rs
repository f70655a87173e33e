//! Change detection: blake3 content fingerprints per watched path.

mod detector;
mod hash;

pub use detector::{ChangeDetector, Freshness};
pub use hash::ContentHash;

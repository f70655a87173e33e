//! Content types for static file passthrough.
//!
//! Unknown extensions fall back to plain text.

use std::path::Path;

/// Content types the live server names directly.
pub mod types {
    pub const HTML: &str = "text/html; charset=utf-8";
    pub const PLAIN: &str = "text/plain; charset=utf-8";
    pub const CSS: &str = "text/css; charset=utf-8";
}

/// Extension table, lowercase. First match wins.
const TABLE: &[(&[&str], &str)] = &[
    (&["html", "htm"], types::HTML),
    (&["css"], types::CSS),
    (&["js", "mjs", "cjs"], "text/javascript; charset=utf-8"),
    (&["json", "map"], "application/json"),
    (&["md", "markdown"], "text/markdown; charset=utf-8"),
    (&["yaml", "yml"], "text/yaml; charset=utf-8"),
    (&["csv"], "text/csv; charset=utf-8"),
    (&["xml"], "application/xml"),
    (&["wasm"], "application/wasm"),
    (&["pdf"], "application/pdf"),
    (&["png"], "image/png"),
    (&["jpg", "jpeg"], "image/jpeg"),
    (&["gif"], "image/gif"),
    (&["webp"], "image/webp"),
    (&["avif"], "image/avif"),
    (&["svg"], "image/svg+xml"),
    (&["ico"], "image/x-icon"),
    (&["mp3"], "audio/mpeg"),
    (&["wav"], "audio/wav"),
    (&["mp4", "m4v"], "video/mp4"),
    (&["webm"], "video/webm"),
    (&["woff"], "font/woff"),
    (&["woff2"], "font/woff2"),
    (&["ttf"], "font/ttf"),
    (&["otf"], "font/otf"),
];

/// Content-Type header value for `path`, by extension.
pub fn from_path(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return types::PLAIN;
    };
    let ext = ext.to_ascii_lowercase();
    TABLE
        .iter()
        .find(|(exts, _)| exts.contains(&ext.as_str()))
        .map_or(types::PLAIN, |(_, mime)| mime)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(from_path(Path::new("index.html")), types::HTML);
        assert_eq!(from_path(Path::new("style.css")), types::CSS);
        assert_eq!(from_path(Path::new("app.js")), "text/javascript; charset=utf-8");
        assert_eq!(from_path(Path::new("logo.png")), "image/png");
        assert_eq!(from_path(Path::new("photo.JPG")), "image/jpeg");
    }

    #[test]
    fn test_unknown_falls_back_to_plain_text() {
        assert_eq!(from_path(Path::new("notes.xyz")), types::PLAIN);
        assert_eq!(from_path(Path::new("Makefile")), types::PLAIN);
    }
}

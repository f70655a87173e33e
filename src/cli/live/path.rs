//! URL to filesystem path resolution.

use std::path::{Path, PathBuf};

/// Request path without query, fragment or surrounding slashes, percent-decoded.
pub fn normalize_url(url: &str) -> String {
    use percent_encoding::percent_decode_str;

    let path = url.split(['?', '#']).next().unwrap_or(url);
    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();
    decoded.trim_matches('/').to_string()
}

/// Local file named by `url` under `root`.
///
/// `None` for paths that try to leave `root`. The returned path may not
/// exist: reading it tells not-found apart from other failures.
pub fn resolve_path(url: &str, root: &Path) -> Option<PathBuf> {
    let clean = normalize_url(url);
    if clean.split(['/', '\\']).any(|segment| segment == "..") {
        return None;
    }

    let local = root.join(&clean);

    // Symlinks may still point outside the root.
    if let (Ok(canonical), Ok(root_canonical)) = (local.canonicalize(), root.canonicalize())
        && !canonical.starts_with(&root_canonical)
    {
        return None;
    }
    Some(local)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("/"), "");
        assert_eq!(normalize_url("/?t=1"), "");
        assert_eq!(normalize_url("/img/a%20b.png?x#y"), "img/a b.png");
        assert_eq!(normalize_url("/dir/"), "dir");
    }

    #[test]
    fn test_resolve_rejects_traversal() {
        let root = Path::new("/srv");
        assert_eq!(resolve_path("/../etc/passwd", root), None);
        assert_eq!(resolve_path("/a/%2e%2e/b", root), None);
        assert_eq!(resolve_path("/a..b.txt", root), Some(root.join("a..b.txt")));
    }

    #[test]
    fn test_resolve_missing_file_still_resolves() {
        let dir = tempfile::TempDir::new().unwrap();
        assert_eq!(
            resolve_path("/missing.css", dir.path()),
            Some(dir.path().join("missing.css"))
        );
    }
}

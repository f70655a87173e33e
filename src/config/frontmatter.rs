//! Front matter splitting.
//!
//! A document may open with a `---` line, a YAML mapping, and a closing `---`
//! line. Everything after the closing fence is the Markdown body. A document
//! whose opening fence is never closed has no front matter at all.

use serde_yaml::{Mapping, Value};

use super::error::FrontmatterError;

/// Front matter split off a source document.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted<'a> {
    /// Parsed key/value configuration (empty when absent).
    pub frontmatter: Mapping,
    /// Markdown body following the closing fence.
    pub body: &'a str,
}

/// Split `content` into its raw front matter block and body.
///
/// Returns `None` when the document does not start with a closed front matter
/// block.
pub fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let (first, mut cursor) = next_line(content, 0)?;
    if !is_fence(first) {
        return None;
    }

    let block_start = cursor;
    while let Some((line, next)) = next_line(content, cursor) {
        if is_fence(line) {
            let block = content[block_start..cursor].trim_end_matches(['\r', '\n']);
            return Some((block, &content[next..]));
        }
        cursor = next;
    }
    None
}

/// Extract and parse the front matter of `content`.
///
/// A parse failure is returned as an error; callers that must not abort can
/// fall back to [`extract_lenient`].
pub fn extract_frontmatter(content: &str) -> Result<Extracted<'_>, FrontmatterError> {
    match split_frontmatter(content) {
        Some((block, body)) => Ok(Extracted {
            frontmatter: parse_block(block)?,
            body,
        }),
        None => Ok(Extracted {
            frontmatter: Mapping::new(),
            body: content.strip_prefix('\u{feff}').unwrap_or(content),
        }),
    }
}

/// Like [`extract_frontmatter`], but a malformed block degrades to an empty
/// mapping while the body after the closing fence is still used.
pub fn extract_lenient(content: &str) -> Extracted<'_> {
    match extract_frontmatter(content) {
        Ok(extracted) => extracted,
        Err(e) => {
            crate::log!("config"; "ignoring front matter: {}", e);
            let body = split_frontmatter(content).map_or(content, |(_, body)| body);
            Extracted {
                frontmatter: Mapping::new(),
                body,
            }
        }
    }
}

/// Parse a YAML block into a mapping (`null` and empty blocks are empty mappings).
pub fn parse_block(block: &str) -> Result<Mapping, FrontmatterError> {
    if block.trim().is_empty() {
        return Ok(Mapping::new());
    }
    match serde_yaml::from_str::<Value>(block)? {
        Value::Null => Ok(Mapping::new()),
        Value::Mapping(map) => Ok(map),
        _ => Err(FrontmatterError::InvalidRootType),
    }
}

fn next_line(input: &str, start: usize) -> Option<(&str, usize)> {
    if start >= input.len() {
        return None;
    }
    match input[start..].find('\n') {
        Some(pos) => Some((&input[start..start + pos], start + pos + 1)),
        None => Some((&input[start..], input.len())),
    }
}

fn is_fence(line: &str) -> bool {
    line.trim_end_matches('\r') == "---"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(map: &Mapping, k: &str) -> Option<String> {
        map.get(k).and_then(Value::as_str).map(str::to_string)
    }

    #[test]
    fn test_no_frontmatter_keeps_whole_document() {
        let result = extract_frontmatter("# Title\nBody").unwrap();
        assert!(result.frontmatter.is_empty());
        assert_eq!(result.body, "# Title\nBody");
    }

    #[test]
    fn test_parses_basic_yaml() {
        let input = "---\ntitle: Example\nscripts:\n  - a.js\n---\n# Content\n";
        let result = extract_frontmatter(input).unwrap();
        assert_eq!(key(&result.frontmatter, "title").as_deref(), Some("Example"));
        assert_eq!(result.body, "# Content\n");
    }

    #[test]
    fn test_handles_empty_block_and_crlf() {
        let result = extract_frontmatter("---\r\n---\r\nBody").unwrap();
        assert!(result.frontmatter.is_empty());
        assert_eq!(result.body, "Body");
    }

    #[test]
    fn test_strips_bom() {
        let result = extract_frontmatter("\u{feff}---\nfoo: bar\n---\nBody").unwrap();
        assert_eq!(key(&result.frontmatter, "foo").as_deref(), Some("bar"));
        assert_eq!(result.body, "Body");
    }

    #[test]
    fn test_unterminated_block_is_body() {
        let input = "---\ntitle: test\n# Heading";
        let result = extract_frontmatter(input).unwrap();
        assert!(result.frontmatter.is_empty());
        assert_eq!(result.body, input);
    }

    #[test]
    fn test_fence_must_open_the_document() {
        let input = "Intro\n---\ntitle: x\n---\n";
        assert!(split_frontmatter(input).is_none());
    }

    #[test]
    fn test_errors_on_invalid_yaml() {
        let err = extract_frontmatter("---\ninvalid: [unterminated\n---\n").unwrap_err();
        assert!(matches!(err, FrontmatterError::Parse(_)), "{err:?}");
    }

    #[test]
    fn test_errors_on_non_mapping_root() {
        let err = extract_frontmatter("---\n- a\n- b\n---\nBody").unwrap_err();
        assert!(matches!(err, FrontmatterError::InvalidRootType));
    }

    #[test]
    fn test_lenient_extraction_keeps_body() {
        let result = extract_lenient("---\ntitle: [oops\n---\n# Body\n");
        assert!(result.frontmatter.is_empty());
        assert_eq!(result.body, "# Body\n");
    }

    #[test]
    fn test_split_round_trip_preserves_meaning() {
        let docs = [
            "---\ntitle: Hello\ntokenizeWords: true\nscripts:\n  - a.js\n  - b.js\n---\n# Body\n\ntext\n",
            "---\nstyles: |\n  body { color: red; }\nhead: <meta name=\"x\">\n---\nplain\n",
            "---\n---\nonly body\n",
        ];
        for doc in docs {
            let first = extract_frontmatter(doc).unwrap();
            let yaml = if first.frontmatter.is_empty() {
                String::new()
            } else {
                serde_yaml::to_string(&first.frontmatter).unwrap()
            };
            let rebuilt = format!("---\n{yaml}---\n{}", first.body);
            let second = extract_frontmatter(&rebuilt).unwrap();
            assert_eq!(first.frontmatter, second.frontmatter, "{doc}");
            assert_eq!(first.body, second.body, "{doc}");
        }
    }
}

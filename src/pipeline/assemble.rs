//! Document assembly.
//!
//! Wraps a rendered fragment in the document shell: title, optional font
//! stylesheet, configured scripts in order, inline styles, then the raw
//! `head` and `body` fragments, and finally `<div id="content">`.

use crate::config::DocumentConfig;
use crate::embed::document::{DOCUMENT_HTML, DocumentVars};
use crate::utils::html::{escape, escape_attr};

/// Wrap `fragment` into a complete HTML document.
pub fn wrap(fragment: &str, config: &DocumentConfig) -> String {
    let title = escape(config.title());
    let font = config
        .font
        .as_deref()
        .filter(|url| !url.is_empty())
        .map(|url| format!("  <link href=\"{}\" rel=\"stylesheet\">\n", escape_attr(url)))
        .unwrap_or_default();
    let scripts: String = config
        .scripts
        .iter()
        .map(|src| format!("  <script src=\"{}\"></script>\n", escape_attr(src)))
        .collect();

    DOCUMENT_HTML.render(&DocumentVars {
        title: &title,
        font: &font,
        scripts: &scripts,
        styles: &config.styles,
        head: &config.head,
        body: &config.body,
        content: fragment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_document() {
        let html = wrap("<p>hi</p>\n", &DocumentConfig::default());
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<meta charset=\"UTF-8\">"));
        assert!(html.contains("<title>Interactive Document</title>"));
        assert!(html.contains("<div id=\"content\"><p>hi</p>\n</div>"));
        assert!(!html.contains("<link"));
        assert!(html.contains("window.mdxref"));
    }

    #[test]
    fn test_configured_document() {
        let config = DocumentConfig {
            title: Some("A & B".into()),
            font: Some("https://fonts.example/x.css".into()),
            styles: "p { color: red }".into(),
            scripts: vec!["one.js".into(), "two.js".into()],
            head: "<meta name=\"h\">".into(),
            body: "<nav>top</nav>".into(),
            tokenize_words: false,
        };
        let html = wrap("<p>x</p>", &config);

        assert!(html.contains("<title>A &amp; B</title>"));
        assert!(html.contains("<link href=\"https://fonts.example/x.css\" rel=\"stylesheet\">"));
        let one = html.find("<script src=\"one.js\">").unwrap();
        let two = html.find("<script src=\"two.js\">").unwrap();
        assert!(one < two);
        assert!(html.contains("p { color: red }"));

        let head_end = html.find("</head>").unwrap();
        let meta = html.find("<meta name=\"h\">").unwrap();
        assert!(meta < head_end);

        let body = html.find("<body>").unwrap();
        let nav = html.find("<nav>top</nav>").unwrap();
        let content = html.find("<div id=\"content\">").unwrap();
        assert!(body < nav && nav < content);
    }

    #[test]
    fn test_content_is_not_rescanned() {
        let html = wrap("<p>__TITLE__</p>", &DocumentConfig::default());
        assert!(html.contains("<p>__TITLE__</p>"));
    }
}

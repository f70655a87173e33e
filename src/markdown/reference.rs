//! Cross-references: `?[display text](identifier)`.
//!
//! Renders a span carrying the identifier as `data-id`, so scripts can find
//! it through `mdxref(id)`.

use regex::Regex;
use std::sync::LazyLock;

use super::extension::{Extension, Level, ParseState, Token};
use crate::utils::html::{escape, escape_attr};

pub const KIND: &str = "customReference";

static RE_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\?\[(.*?)\]\((.*?)\)").unwrap());

#[derive(Debug, Default, Clone, Copy)]
pub struct CrossReference;

impl CrossReference {
    pub const fn new() -> Self {
        Self
    }
}

impl Extension for CrossReference {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn level(&self) -> Level {
        Level::Inline
    }

    fn start(&self, src: &str) -> Option<usize> {
        src.find("?[")
    }

    fn recognize(&self, src: &str) -> Option<Token> {
        let caps = RE_REFERENCE.captures(src)?;
        let mut token = Token::new(KIND, &caps[0]);
        token.text = caps[1].to_string();
        token.id = caps[2].to_string();
        Some(token)
    }

    fn accept(&self, token: &mut Token, state: &mut ParseState<'_>) {
        state.references.record(&token.id, &token.text);
    }

    fn render(&self, token: &Token, _children: &str) -> String {
        format!(
            r#"<span class="custom-reference" data-id="{}">{}</span>"#,
            escape_attr(&token.id),
            escape(&token.text)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognizes_prefix() {
        let token = CrossReference.recognize("?[Fig 1](fig1) and more").unwrap();
        assert_eq!(token.raw, "?[Fig 1](fig1)");
        assert_eq!(token.text, "Fig 1");
        assert_eq!(token.id, "fig1");
    }

    #[test]
    fn test_requires_match_at_start() {
        assert!(CrossReference.recognize("see ?[a](b)").is_none());
        assert!(CrossReference.recognize("?[a] (b)").is_none());
        assert!(CrossReference.recognize("?[a\n](b)").is_none());
    }

    #[test]
    fn test_start_finds_earliest_marker() {
        assert_eq!(CrossReference.start("ab ?[x](y)"), Some(3));
        assert_eq!(CrossReference.start("no marker ?"), None);
    }

    #[test]
    fn test_renders_escaped_span() {
        let token = CrossReference.recognize(r#"?[a < b]("q")"#).unwrap();
        assert_eq!(
            CrossReference.render(&token, ""),
            r#"<span class="custom-reference" data-id="&quot;q&quot;">a &lt; b</span>"#
        );
    }
}

//! ATX headings with slug identifiers.
//!
//! `## Hello, World!` renders as `<h2 id="hello-world">Hello, World!</h2>`.

use regex::Regex;
use std::sync::LazyLock;

use super::extension::{Extension, Level, Token};
use crate::utils::html::escape_attr;

pub const KIND: &str = "heading";

static RE_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^ {0,3}(#{1,6})[ \t]+(.+?)(?:[ \t]+#+)?[ \t]*(?:\r?\n|$)").unwrap()
});

static RE_NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w ]").unwrap());

/// Lowercase, drop everything but word characters and spaces, then turn
/// each space into a hyphen.
pub fn slugify(text: &str) -> String {
    RE_NON_WORD
        .replace_all(&text.to_lowercase(), "")
        .replace(' ', "-")
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Heading;

impl Heading {
    pub const fn new() -> Self {
        Self
    }
}

impl Extension for Heading {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn level(&self) -> Level {
        Level::Block
    }

    fn recognize(&self, src: &str) -> Option<Token> {
        let caps = RE_HEADING.captures(src)?;
        let mut token = Token::new(KIND, &caps[0]);
        #[allow(clippy::cast_possible_truncation)]
        let depth = caps[1].len() as u8;
        token.depth = depth;
        token.text = caps[2].to_string();
        token.id = slugify(&token.text);
        Some(token)
    }

    fn wraps_children(&self) -> bool {
        true
    }

    fn render(&self, token: &Token, children: &str) -> String {
        format!(
            "<h{depth} id=\"{id}\">{children}</h{depth}>\n",
            depth = token.depth,
            id = escape_attr(&token.id),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_strips_punctuation() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("A  b"), "a--b");
        assert_eq!(slugify("snake_case 2"), "snake_case-2");
        assert_eq!(slugify("Über Café"), "über-café");
    }

    #[test]
    fn test_recognizes_depth_and_text() {
        let token = Heading.recognize("## Hello, World!\n").unwrap();
        assert_eq!(token.depth, 2);
        assert_eq!(token.text, "Hello, World!");
        assert_eq!(token.id, "hello-world");
        assert_eq!(token.raw, "## Hello, World!\n");
    }

    #[test]
    fn test_strips_closing_sequence() {
        let token = Heading.recognize("# Title ##").unwrap();
        assert_eq!(token.text, "Title");
    }

    #[test]
    fn test_rejects_non_atx() {
        assert!(Heading.recognize("#hashtag").is_none());
        assert!(Heading.recognize("####### seven").is_none());
        assert!(Heading.recognize("Title\n=====").is_none());
        assert!(Heading.recognize("#").is_none());
    }

    #[test]
    fn test_renders_children() {
        let token = Heading.recognize("# A").unwrap();
        assert_eq!(Heading.render(&token, "A"), "<h1 id=\"a\">A</h1>\n");
    }
}

//! Executable fenced blocks.
//!
//! A fenced block whose first line is a run directive
//!
//! ````text
//! ```js
//! // @run type="module"
//! document.title = "hi";
//! ```
//! ````
//!
//! renders as a `<script>` tagged with a fresh `data-run-id`. Blocks tagged
//! `html` are spliced into the document verbatim instead.

use regex::Regex;
use std::sync::LazyLock;

use super::extension::{Extension, Level, ParseState, Token};
use crate::utils::html::escape_attr;

pub const KIND: &str = "runCode";

static RE_RUN_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^```([^\r\n`]*)\r?\n[ \t]*//[ \t]*@run((?: [\w-]+="[^"\r\n]*")*)[ \t]*(?:\r?\n([\s\S]*?))?\r?\n```[ \t]*(?:\r?\n|$)"#,
    )
    .unwrap()
});

static RE_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([\w-]+)="([^"\r\n]*)""#).unwrap());

#[derive(Debug, Default, Clone, Copy)]
pub struct RunCode;

impl RunCode {
    pub const fn new() -> Self {
        Self
    }
}

impl Extension for RunCode {
    fn kind(&self) -> &'static str {
        KIND
    }

    fn level(&self) -> Level {
        Level::Block
    }

    fn recognize(&self, src: &str) -> Option<Token> {
        let caps = RE_RUN_BLOCK.captures(src)?;
        let mut token = Token::new(KIND, &caps[0]);
        token.lang = caps[1].split_whitespace().next().map(str::to_string);
        token.attrs = RE_ATTR
            .captures_iter(&caps[2])
            .map(|attr| (attr[1].to_string(), attr[2].to_string()))
            .collect();
        // CRLF sources store and emit LF-only code.
        token.text = caps.get(3).map_or("", |m| m.as_str()).replace("\r\n", "\n");
        Some(token)
    }

    fn accept(&self, token: &mut Token, state: &mut ParseState<'_>) {
        token.id = state.ids.next_id();
        state.run_blocks.insert(token.id.clone(), token.text.clone());
    }

    fn render(&self, token: &Token, _children: &str) -> String {
        if token.lang.as_deref() == Some("html") {
            return format!("{}\n", token.text);
        }

        let mut html = format!(r#"<script data-run-id="{}""#, escape_attr(&token.id));
        for (key, value) in &token.attrs {
            html.push_str(&format!(r#" {}="{}""#, key, escape_attr(value)));
        }
        html.push_str(">\n");
        html.push_str(&token.text);
        html.push_str("\n</script>\n");
        html
    }
}

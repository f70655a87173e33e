//! Word tokenizer for reading-progress UIs.
//!
//! Wraps every maximal run of non-whitespace characters found in text
//! content in `<span class="token">`. The fragment is streamed through
//! `lol_html`, so markup is copied through untouched; text inside
//! `pre`/`code` and raw-text elements is left byte-exact.

use std::cell::Cell;
use std::rc::Rc;

use lol_html::errors::RewritingError;
use lol_html::html_content::{ContentType, EndTag, TextType};
use lol_html::{RewriteStrSettings, doc_text, element, rewrite_str};

const OPEN: &str = r#"<span class="token">"#;
const CLOSE: &str = "</span>";

type EndTagResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Elements whose text is never tokenized.
const VERBATIM: &str = "pre, code";

/// Tokenize the text of an HTML fragment.
pub fn tokenize_words(html: &str) -> Result<String, RewritingError> {
    // Open `pre`/`code` elements.
    let verbatim = Rc::new(Cell::new(0usize));
    let depth = Rc::clone(&verbatim);
    // A text node may arrive in several chunks; words are cut on whole nodes.
    let mut pending = String::new();

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![element!(VERBATIM, move |el| {
                if let Some(handlers) = el.end_tag_handlers() {
                    depth.set(depth.get() + 1);
                    let depth = Rc::clone(&depth);
                    let handler: lol_html::EndTagHandler<'static> =
                        Box::new(move |_: &mut EndTag<'_>| -> EndTagResult {
                            depth.set(depth.get().saturating_sub(1));
                            Ok(())
                        });
                    handlers.push(handler);
                }
                Ok(())
            })],
            document_content_handlers: vec![doc_text!(|chunk| {
                // script/style/textarea content is raw text, not markup.
                if verbatim.get() > 0 || chunk.text_type() != TextType::Data {
                    return Ok(());
                }
                pending.push_str(chunk.as_str());
                if !chunk.last_in_text_node() {
                    chunk.remove();
                    return Ok(());
                }
                let text = std::mem::take(&mut pending);
                if !text.is_empty() {
                    chunk.replace(&wrap_words(&text), ContentType::Html);
                }
                Ok(())
            })],
            ..RewriteStrSettings::new()
        },
    )
}

fn wrap_words(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 2);
    let mut word_start = None;
    for (idx, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(start) = word_start.take() {
                push_word(&text[start..idx], &mut out);
            }
            out.push(c);
        } else if word_start.is_none() {
            word_start = Some(idx);
        }
    }
    if let Some(start) = word_start {
        push_word(&text[start..], &mut out);
    }
    out
}

fn push_word(word: &str, out: &mut String) {
    out.push_str(OPEN);
    out.push_str(word);
    out.push_str(CLOSE);
}

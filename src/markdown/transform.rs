//! Extension-aware rewriting of the pulldown-cmark event stream.
//!
//! The baseline parser runs once over the whole document with source
//! offsets. Leaf blocks are then offered to block extensions, and runs of
//! inline events are scanned for inline extensions. A recognized token
//! replaces the events covering its source span with a raw HTML event, so a
//! single `push_html` pass renders the result.

use std::ops::Range;

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Tag, TagEnd, html};

use super::extension::{Extension, ExtensionRegistry, Level, ParseState};

type Spanned<'s> = (Event<'s>, Range<usize>);

pub(super) struct Transformer<'r, 's> {
    registry: &'r ExtensionRegistry,
    src: &'s str,
}

impl<'r, 's> Transformer<'r, 's> {
    pub(super) fn new(registry: &'r ExtensionRegistry, src: &'s str) -> Self {
        Self { registry, src }
    }

    /// Rewrite `events`, returning the stream to render.
    pub(super) fn rewrite(
        &self,
        events: &[Spanned<'s>],
        state: &mut ParseState<'_>,
    ) -> Vec<Event<'s>> {
        let mut out = Vec::with_capacity(events.len());
        let mut run: Vec<Spanned<'s>> = Vec::new();
        // Open code blocks: their text is content, not inline markdown.
        let mut verbatim = 0usize;
        let mut i = 0;

        while i < events.len() {
            let (event, range) = &events[i];
            if verbatim == 0 && is_inline(event) {
                run.push((event.clone(), range.clone()));
                i += 1;
                continue;
            }
            self.flush(&mut run, &mut out, state);

            if verbatim == 0
                && let Event::Start(tag) = event
                && is_leaf_block(tag)
                && let Some((end, rendered)) = self.try_block(events, i, state)
            {
                out.push(Event::Html(rendered.into()));
                i = end + 1;
                continue;
            }

            match event {
                Event::Start(Tag::CodeBlock(_)) => verbatim += 1,
                Event::End(TagEnd::CodeBlock) => verbatim = verbatim.saturating_sub(1),
                _ => {}
            }
            out.push(event.clone());
            i += 1;
        }

        self.flush(&mut run, &mut out, state);
        out
    }

    /// Offer the block starting at `events[start]` to the block extensions.
    ///
    /// Returns the index of the block's end event and the rendered HTML.
    fn try_block(
        &self,
        events: &[Spanned<'s>],
        start: usize,
        state: &mut ParseState<'_>,
    ) -> Option<(usize, String)> {
        let block = self.src.get(events[start].1.clone())?;
        let end = matching_end(events, start)?;

        for ext in self.registry.at_level(Level::Block) {
            let Some(mut token) = ext.recognize(block) else {
                continue;
            };
            // The token must account for the whole block.
            let covers = block
                .get(token.raw.len()..)
                .is_some_and(|rest| rest.trim().is_empty());
            if !covers || token.raw.is_empty() {
                continue;
            }

            ext.accept(&mut token, state);
            let children = if ext.wraps_children() {
                let inner = self.rewrite(&events[start + 1..end], state);
                let mut buf = String::new();
                html::push_html(&mut buf, inner.into_iter());
                buf
            } else {
                String::new()
            };
            return Some((end, ext.render(&token, &children)));
        }
        None
    }

    fn flush(
        &self,
        run: &mut Vec<Spanned<'s>>,
        out: &mut Vec<Event<'s>>,
        state: &mut ParseState<'_>,
    ) {
        if run.is_empty() {
            return;
        }
        let run = self.rewrite_inline(std::mem::take(run), state);
        out.extend(run.into_iter().map(|(event, _)| event));
    }

    /// Replace inline extension matches inside one run of inline events.
    fn rewrite_inline(
        &self,
        mut run: Vec<Spanned<'s>>,
        state: &mut ParseState<'_>,
    ) -> Vec<Spanned<'s>> {
        let inline: Vec<&dyn Extension> = self.registry.at_level(Level::Inline).collect();
        if inline.is_empty() {
            return run;
        }
        let Some(lo) = run.iter().map(|(_, r)| r.start).min() else {
            return run;
        };
        let hi = run.iter().map(|(_, r)| r.end).max().unwrap_or(lo);

        let mut pos = lo;
        while pos < hi {
            let region = &self.src[pos..hi];
            let Some(nearest) = inline
                .iter()
                .filter_map(|ext| ext.start(region))
                .min()
                .map(|offset| pos + offset)
            else {
                break;
            };

            let mut consumed = None;
            for ext in inline.iter().filter(|ext| ext.start(region) == Some(nearest - pos)) {
                let Some(mut token) = ext.recognize(&self.src[nearest..hi]) else {
                    continue;
                };
                let span = nearest..nearest + token.raw.len();
                if token.raw.is_empty() || !fits(&run, &span, self.src) {
                    continue;
                }
                ext.accept(&mut token, state);
                let rendered = ext.render(&token, "");
                run = splice(run, &span, self.src, rendered);
                consumed = Some(span.end);
                break;
            }

            pos = consumed.unwrap_or_else(|| {
                nearest + self.src[nearest..].chars().next().map_or(1, char::len_utf8)
            });
        }
        run
    }
}

/// Index of the event closing the element opened at `start`.
fn matching_end(events: &[Spanned<'_>], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, (event, _)) in events[start..].iter().enumerate() {
        match event {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Whether `span` can be replaced without breaking the event structure.
///
/// Every event touching the span must be contained in it (with balanced
/// start/end pairs), enclose it as a container, or be literal source text
/// that can be split. The span must begin inside a text event.
fn fits(run: &[Spanned<'_>], span: &Range<usize>, src: &str) -> bool {
    let mut begins_in_text = false;
    let mut balance = 0isize;

    for (event, range) in run {
        if !overlaps(range, span) {
            continue;
        }
        if matches!(event, Event::Text(_)) && range.start <= span.start && span.start < range.end {
            begins_in_text = true;
        }
        if contains(span, range) {
            match event {
                Event::Start(_) => balance += 1,
                Event::End(_) => balance -= 1,
                _ => {}
            }
            continue;
        }
        match event {
            Event::Start(_) | Event::End(_) if contains(range, span) => {}
            Event::Text(text) if src.get(range.clone()) == Some(text.as_ref()) => {}
            _ => return false,
        }
    }
    begins_in_text && balance == 0
}

/// Replace the events covering `span` with `rendered`. `span` must fit.
fn splice<'s>(
    run: Vec<Spanned<'s>>,
    span: &Range<usize>,
    src: &'s str,
    rendered: String,
) -> Vec<Spanned<'s>> {
    let mut out = Vec::with_capacity(run.len() + 2);
    let mut replacement = Some((Event::InlineHtml(rendered.into()), span.clone()));

    for (event, range) in run {
        if !overlaps(&range, span) {
            if range.start >= span.end
                && let Some(r) = replacement.take()
            {
                out.push(r);
            }
            out.push((event, range));
        } else if contains(span, &range) {
            if let Some(r) = replacement.take() {
                out.push(r);
            }
        } else if matches!(event, Event::Text(_)) {
            if range.start < span.start {
                let left = range.start..span.start;
                out.push((Event::Text(CowStr::Borrowed(&src[left.clone()])), left));
                if let Some(r) = replacement.take() {
                    out.push(r);
                }
            }
            if range.end > span.end {
                if let Some(r) = replacement.take() {
                    out.push(r);
                }
                let right = span.end..range.end;
                out.push((Event::Text(CowStr::Borrowed(&src[right.clone()])), right));
            }
        } else {
            // Enclosing container: its start precedes the match, its end follows.
            if matches!(event, Event::End(_))
                && let Some(r) = replacement.take()
            {
                out.push(r);
            }
            out.push((event, range));
        }
    }

    out.extend(replacement);
    out
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && a.end > b.start
}

fn contains(outer: &Range<usize>, inner: &Range<usize>) -> bool {
    outer.start <= inner.start && inner.end <= outer.end
}

/// Blocks whose source may be claimed by a block extension.
fn is_leaf_block(tag: &Tag<'_>) -> bool {
    matches!(
        tag,
        Tag::Paragraph | Tag::Heading { .. } | Tag::CodeBlock(CodeBlockKind::Fenced(_))
    )
}

fn is_inline(event: &Event<'_>) -> bool {
    match event {
        Event::Text(_)
        | Event::Code(_)
        | Event::InlineHtml(_)
        | Event::InlineMath(_)
        | Event::DisplayMath(_)
        | Event::SoftBreak
        | Event::HardBreak
        | Event::FootnoteReference(_)
        | Event::TaskListMarker(_) => true,
        Event::Start(tag) => matches!(
            tag,
            Tag::Emphasis
                | Tag::Strong
                | Tag::Strikethrough
                | Tag::Superscript
                | Tag::Subscript
                | Tag::Link { .. }
                | Tag::Image { .. }
        ),
        Event::End(tag) => matches!(
            tag,
            TagEnd::Emphasis
                | TagEnd::Strong
                | TagEnd::Strikethrough
                | TagEnd::Superscript
                | TagEnd::Subscript
                | TagEnd::Link
                | TagEnd::Image
        ),
        _ => false,
    }
}

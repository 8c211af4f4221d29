//! Byte-level text splicing.
//!
//! Spans come from a [`DeclarationTree`](archedit_parser::DeclarationTree)
//! built from the same text, so every offset falls on a token boundary.

use archedit_parser::Span;
use log::trace;

/// Replace `span` of `source` with `text`, verbatim.
pub fn splice(source: &str, span: Span, text: &str) -> String {
    let mut out = String::with_capacity(source.len() - span.len() + text.len());
    out.push_str(&source[..span.start()]);
    out.push_str(text);
    out.push_str(&source[span.end()..]);
    out
}

/// Replace `span` of `source` with the declaration `code`.
///
/// `code` is trimmed, then separated from the surrounding text by a line
/// break on each side where the adjacent whitespace has none. Text outside
/// `span` is copied unchanged.
pub fn apply(source: &str, span: Span, code: &str) -> String {
    let code = code.trim();
    let prefix = &source[..span.start()];
    let suffix = &source[span.end()..];

    let needs_break_before = {
        let content = prefix.trim_end();
        !content.is_empty() && !prefix[content.len()..].contains('\n')
    };
    let needs_break_after = {
        let content = suffix.trim_start();
        !content.is_empty() && !suffix[..suffix.len() - content.len()].contains('\n')
    };

    let mut text = String::with_capacity(code.len() + 2);
    if needs_break_before {
        text.push('\n');
    }
    text.push_str(code);
    if needs_break_after {
        text.push('\n');
    }

    trace!(start = span.start(), end = span.end(), inserted = text.len(); "Splicing declaration");
    splice(source, span, &text)
}

//! Output formatting pass.
//!
//! Runs after the rewrite on the already-rewritten buffer, never on the
//! rewrite input. Three modes:
//!
//! - `None`: identity.
//! - `Format`: pretty-print. Tags and attribute names lowercased, attribute
//!   values double-quoted, one space of indentation per nesting level, text
//!   whitespace collapsed. `script`/`style`/`pre`/`textarea` content stays
//!   verbatim.
//! - `Compact`: single-line-ish output. Tags byte-for-byte verbatim,
//!   whitespace-only text dropped, whitespace runs in mixed text collapsed
//!   to one space.
//!
//! Both rewriting modes preserve the number of elements of every kind.

use crate::config::FormatterMode;
use crate::tidy::scan::{Attr, ScanOptions, Token, tokenize};
use crate::utils::html::{is_raw_text_element, is_void_element, preserves_whitespace};

pub fn format(src: &[u8], mode: FormatterMode) -> Vec<u8> {
    match mode {
        FormatterMode::None => src.to_vec(),
        FormatterMode::Format => pretty(src),
        FormatterMode::Compact => compact(src),
    }
}

// ============================================================================
// FORMAT
// ============================================================================

fn pretty(src: &[u8]) -> Vec<u8> {
    let tokens = tokenize(src, &ScanOptions::default());
    let mut out = String::with_capacity(src.len() + src.len() / 8);
    let mut depth: usize = 0;
    // Just emitted a start tag; its first text child stays on the same line.
    let mut pending_inline = false;
    // Just emitted text or raw text; a following end tag stays on the line.
    let mut inline_close = false;
    // Inside <pre>/<textarea>: tag name plus nesting level.
    let mut verbatim: Option<(String, usize)> = None;

    for token in &tokens {
        if let Some((tag, mut level)) = verbatim.take() {
            out.push_str(&String::from_utf8_lossy(&src[token.range().clone()]));
            match token {
                Token::EndTag { name, .. } if *name == tag && level == 0 => {
                    depth = depth.saturating_sub(1);
                    pending_inline = false;
                    inline_close = false;
                }
                Token::EndTag { name, .. } if *name == tag => {
                    level -= 1;
                    verbatim = Some((tag, level));
                }
                Token::StartTag {
                    name, self_closing, ..
                } if *name == tag && !self_closing => {
                    level += 1;
                    verbatim = Some((tag, level));
                }
                _ => verbatim = Some((tag, level)),
            }
            continue;
        }

        match token {
            Token::StartTag {
                name,
                attrs,
                self_closing,
                ..
            } => {
                newline_indent(&mut out, depth);
                write_start_tag(&mut out, name, attrs);
                let childless = *self_closing || is_void_element(name);
                if !childless {
                    depth += 1;
                    if preserves_whitespace(name) && !is_raw_text_element(name) {
                        verbatim = Some((name.clone(), 0));
                    }
                }
                pending_inline = !childless;
                inline_close = false;
            }
            Token::EndTag { name, .. } => {
                depth = depth.saturating_sub(1);
                if !inline_close && !pending_inline {
                    newline_indent(&mut out, depth);
                }
                out.push_str("</");
                out.push_str(name);
                out.push('>');
                pending_inline = false;
                inline_close = false;
            }
            Token::Text { range } => {
                let text = String::from_utf8_lossy(&src[range.clone()]);
                let collapsed = collapse_ws(&text);
                let trimmed = collapsed.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if !pending_inline {
                    newline_indent(&mut out, depth);
                }
                out.push_str(trimmed);
                pending_inline = false;
                inline_close = true;
            }
            Token::RawText { range } => {
                out.push_str(&String::from_utf8_lossy(&src[range.clone()]));
                pending_inline = false;
                inline_close = true;
            }
            Token::Comment { range } | Token::Markup { range } => {
                newline_indent(&mut out, depth);
                out.push_str(&String::from_utf8_lossy(&src[range.clone()]));
                pending_inline = false;
                inline_close = false;
            }
        }
    }

    out.into_bytes()
}

fn newline_indent(out: &mut String, depth: usize) {
    if !out.is_empty() {
        out.push('\n');
    }
    for _ in 0..depth {
        out.push(' ');
    }
}

fn write_start_tag(out: &mut String, name: &str, attrs: &[Attr]) {
    out.push('<');
    out.push_str(name);
    for a in attrs {
        out.push(' ');
        out.push_str(&a.name.to_ascii_lowercase());
        if let Some(v) = &a.value {
            out.push_str("=\"");
            out.push_str(&v.replace('"', "&quot;"));
            out.push('"');
        }
    }
    out.push('>');
}

fn collapse_ws(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_ws = false;
    for c in text.chars() {
        if c.is_ascii_whitespace() {
            if !last_ws {
                out.push(' ');
            }
            last_ws = true;
        } else {
            out.push(c);
            last_ws = false;
        }
    }
    out
}

// ============================================================================
// COMPACT
// ============================================================================

fn compact(src: &[u8]) -> Vec<u8> {
    let tokens = tokenize(src, &ScanOptions::default());
    let mut out = Vec::with_capacity(src.len());
    for token in &tokens {
        match token {
            Token::Text { range } => {
                let text = &src[range.clone()];
                if text.iter().all(u8::is_ascii_whitespace) {
                    continue;
                }
                let mut last_ws = false;
                for &b in text {
                    if b.is_ascii_whitespace() {
                        if !last_ws {
                            out.push(b' ');
                        }
                        last_ws = true;
                    } else {
                        out.push(b);
                        last_ws = false;
                    }
                }
            }
            _ => out.extend_from_slice(&src[token.range().clone()]),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tidy::scan::{Document, ElemKind};

    fn fmt(src: &str, mode: FormatterMode) -> String {
        String::from_utf8(format(src.as_bytes(), mode)).unwrap()
    }

    #[test]
    fn test_none_is_identity() {
        let src = "<HTML>\n  <p>x</p>\n</HTML>";
        assert_eq!(fmt(src, FormatterMode::None), src);
    }

    #[test]
    fn test_compact_drops_interelement_whitespace() {
        let src = "<html>\n  <body>\n    <p>x</p>\n  </body>\n</html>";
        assert_eq!(fmt(src, FormatterMode::Compact), "<html><body><p>x</p></body></html>");
    }

    #[test]
    fn test_compact_keeps_single_space_in_mixed_text() {
        assert_eq!(
            fmt("<div>test   \n</div>", FormatterMode::Compact),
            "<div>test </div>"
        );
    }

    #[test]
    fn test_compact_tags_verbatim() {
        let src = "<DIV Class='a'  >x</DIV>";
        assert_eq!(fmt(src, FormatterMode::Compact), src);
    }

    #[test]
    fn test_compact_raw_text_verbatim() {
        let src = "<script>var a = 1;\n\nvar b = 2;</script>";
        assert_eq!(fmt(src, FormatterMode::Compact), src);
    }

    #[test]
    fn test_format_indents_and_lowercases() {
        let out = fmt("<HTML><BODY><P Class=x>hi</P></BODY></HTML>", FormatterMode::Format);
        assert_eq!(
            out,
            "<html>\n <body>\n  <p class=\"x\">hi</p>\n </body>\n</html>"
        );
    }

    #[test]
    fn test_format_keeps_raw_text_verbatim() {
        let out = fmt(
            "<body><script>var a = 1;\n  var b = 2;</script></body>",
            FormatterMode::Format,
        );
        assert!(out.contains("var a = 1;\n  var b = 2;"));
    }

    #[test]
    fn test_format_keeps_pre_verbatim() {
        let out = fmt("<div><pre>  a\n   b</pre></div>", FormatterMode::Format);
        assert!(out.contains("  a\n   b"));
    }

    #[test]
    fn test_format_void_elements_do_not_nest() {
        let out = fmt("<head><link href=a><meta></head>", FormatterMode::Format);
        assert_eq!(out, "<head>\n <link href=\"a\">\n <meta>\n</head>");
    }

    #[test]
    fn test_modes_preserve_element_counts() {
        let src = "<html><head><style>h1 {}</style><link rel=stylesheet href=a.css></head>\
                   <body>\n  <!-- note -->\n  <script src=b.js></script>\n</body></html>";
        let opts = ScanOptions::default();
        let count = |bytes: &[u8], kind: ElemKind| {
            Document::parse(bytes, &opts).of_kind(kind).count()
        };
        for mode in [FormatterMode::Format, FormatterMode::Compact] {
            let out = format(src.as_bytes(), mode);
            for kind in [
                ElemKind::Style,
                ElemKind::Stylesheet,
                ElemKind::Script,
                ElemKind::Comment,
            ] {
                assert_eq!(
                    count(&out, kind),
                    count(src.as_bytes(), kind),
                    "{mode:?} changed {kind:?} count"
                );
            }
        }
    }
}

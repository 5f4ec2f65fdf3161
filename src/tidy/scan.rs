//! Lexical HTML scanner.
//!
//! Turns a byte buffer into a flat token stream ([`tokenize`]) and, on top
//! of that, the element model consumed by the rewrite passes
//! ([`Document::parse`]). Every token and element carries byte offsets into
//! the *original* buffer, which is what makes position-anchored edits
//! possible (see `tidy::edit`).
//!
//! The scanner never fails: unterminated tags, comments and raw text extend
//! to the end of the buffer and the caller gets best-effort results.

use std::ops::Range;

use crate::utils::html::is_raw_text_element;

// ============================================================================
// Options
// ============================================================================

/// Scanner configuration, fixed at processor construction.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Recognize Microsoft conditional-comment syntax (`<!--[if IE]>`,
    /// `<![endif]-->`, and the bare `<!-->` closer) as markup instead of
    /// comment openers, so comment removal leaves them alone.
    pub conditional_comments: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            conditional_comments: true,
        }
    }
}

// ============================================================================
// Tokens
// ============================================================================

/// A single attribute occurrence. `value` is `None` for bare attributes
/// (`defer`), `Some` otherwise. Names keep their source casing; lookups are
/// case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: String,
    pub value: Option<String>,
}

/// One lexical token. Ranges always index the scanned buffer.
#[derive(Debug, Clone)]
pub enum Token {
    /// `<name attr=...>`; `name` is lowercased.
    StartTag {
        name: String,
        attrs: Vec<Attr>,
        range: Range<usize>,
        self_closing: bool,
    },
    /// `</name>`; `name` is lowercased.
    EndTag { name: String, range: Range<usize> },
    /// Character data between tags.
    Text { range: Range<usize> },
    /// Verbatim content of a raw-text element (script/style).
    RawText { range: Range<usize> },
    /// `<!-- ... -->` including delimiters.
    Comment { range: Range<usize> },
    /// Doctype, processing instructions, conditional-comment markers.
    Markup { range: Range<usize> },
}

impl Token {
    pub fn range(&self) -> &Range<usize> {
        match self {
            Token::StartTag { range, .. }
            | Token::EndTag { range, .. }
            | Token::Text { range }
            | Token::RawText { range }
            | Token::Comment { range }
            | Token::Markup { range } => range,
        }
    }
}

// ============================================================================
// Tokenizer
// ============================================================================

/// Tokenize a byte buffer.
pub fn tokenize(src: &[u8], opts: &ScanOptions) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < src.len() {
        if src[pos] == b'<'
            && let Some((token, next)) = lex_markup(src, pos, opts)
        {
            if let Token::StartTag {
                name, self_closing, ..
            } = &token
                && !self_closing
                && is_raw_text_element(name)
            {
                let name = name.clone();
                tokens.push(token);
                pos = lex_raw_text(src, next, &name, &mut tokens);
                continue;
            }
            tokens.push(token);
            pos = next;
            continue;
        }

        // Text run: everything up to the next '<'. A '<' that failed to lex
        // as markup is consumed as the first text byte.
        let start = pos;
        pos += 1;
        while pos < src.len() && src[pos] != b'<' {
            pos += 1;
        }
        tokens.push(Token::Text { range: start..pos });
    }

    tokens
}

fn lex_markup(src: &[u8], at: usize, opts: &ScanOptions) -> Option<(Token, usize)> {
    match *src.get(at + 1)? {
        b'/' => Some(lex_end_tag(src, at)),
        b'!' => Some(lex_declaration(src, at, opts)),
        b'?' => {
            let end = scan_past_gt(src, at + 2);
            Some((Token::Markup { range: at..end }, end))
        }
        b if b.is_ascii_alphabetic() => Some(lex_start_tag(src, at)),
        _ => None,
    }
}

fn lex_end_tag(src: &[u8], at: usize) -> (Token, usize) {
    let mut pos = at + 2;
    let name_start = pos;
    while pos < src.len() && is_name_byte(src[pos]) {
        pos += 1;
    }
    let name = ascii_lowercase(&src[name_start..pos]);
    let end = scan_past_gt(src, pos);
    (Token::EndTag { name, range: at..end }, end)
}

fn lex_declaration(src: &[u8], at: usize, opts: &ScanOptions) -> (Token, usize) {
    let rest = &src[at..];

    if rest.starts_with(b"<!--") {
        if opts.conditional_comments {
            // `<!-->` is the downlevel-revealed closer; `<!--[` opens a
            // conditional block. Neither is a removable comment.
            if rest.starts_with(b"<!-->") {
                return (Token::Markup { range: at..at + 5 }, at + 5);
            }
            if rest.starts_with(b"<!--[") {
                let end = scan_past_gt(src, at + 5);
                return (Token::Markup { range: at..end }, end);
            }
        }
        let end = match find(src, at + 4, b"-->") {
            Some(idx) => idx + 3,
            None => src.len(),
        };
        return (Token::Comment { range: at..end }, end);
    }

    // `<![endif]-->`, `<![if ...]>`, CDATA: terminated at the first '>'.
    // `<!DOCTYPE ...>` and any other declaration likewise.
    let end = scan_past_gt(src, at + 2);
    (Token::Markup { range: at..end }, end)
}

fn lex_start_tag(src: &[u8], at: usize) -> (Token, usize) {
    let mut pos = at + 1;
    let name_start = pos;
    while pos < src.len() && is_name_byte(src[pos]) {
        pos += 1;
    }
    let name = ascii_lowercase(&src[name_start..pos]);

    let mut attrs = Vec::new();
    let mut self_closing = false;

    loop {
        while pos < src.len() && src[pos].is_ascii_whitespace() {
            pos += 1;
        }
        match src.get(pos) {
            None => break,
            Some(b'>') => {
                pos += 1;
                break;
            }
            Some(b'/') if src.get(pos + 1) == Some(&b'>') => {
                self_closing = true;
                pos += 2;
                break;
            }
            _ => pos = lex_attr(src, pos, &mut attrs),
        }
    }

    (
        Token::StartTag {
            name,
            attrs,
            range: at..pos,
            self_closing,
        },
        pos,
    )
}

fn lex_attr(src: &[u8], mut pos: usize, attrs: &mut Vec<Attr>) -> usize {
    let name_start = pos;
    while pos < src.len()
        && !src[pos].is_ascii_whitespace()
        && !matches!(src[pos], b'=' | b'>' | b'/')
    {
        pos += 1;
    }
    if pos == name_start {
        // Stray byte (lone '/', '='); skip it.
        return pos + 1;
    }
    let name = String::from_utf8_lossy(&src[name_start..pos]).into_owned();

    while pos < src.len() && src[pos].is_ascii_whitespace() {
        pos += 1;
    }

    let value = if src.get(pos) == Some(&b'=') {
        pos += 1;
        while pos < src.len() && src[pos].is_ascii_whitespace() {
            pos += 1;
        }
        match src.get(pos) {
            Some(&q) if q == b'"' || q == b'\'' => {
                pos += 1;
                let value_start = pos;
                while pos < src.len() && src[pos] != q {
                    pos += 1;
                }
                let value = String::from_utf8_lossy(&src[value_start..pos]).into_owned();
                if pos < src.len() {
                    pos += 1; // closing quote
                }
                Some(value)
            }
            _ => {
                let value_start = pos;
                while pos < src.len() && !src[pos].is_ascii_whitespace() && src[pos] != b'>' {
                    pos += 1;
                }
                Some(String::from_utf8_lossy(&src[value_start..pos]).into_owned())
            }
        }
    } else {
        None
    };

    attrs.push(Attr { name, value });
    pos
}

/// Scan raw-text content for the matching end tag (case-insensitive).
/// Returns the resume position.
fn lex_raw_text(src: &[u8], from: usize, name: &str, tokens: &mut Vec<Token>) -> usize {
    let mut i = from;
    while let Some(k) = find(src, i, b"</") {
        let tag_name = &src[k + 2..];
        if tag_name.len() >= name.len()
            && tag_name[..name.len()].eq_ignore_ascii_case(name.as_bytes())
            && matches!(
                tag_name.get(name.len()).copied(),
                None | Some(b'>') | Some(b'/') | Some(b' ' | b'\t' | b'\n' | b'\r')
            )
        {
            if k > from {
                tokens.push(Token::RawText { range: from..k });
            }
            let (end_tag, next) = lex_end_tag(src, k);
            tokens.push(end_tag);
            return next;
        }
        i = k + 2;
    }

    // Unterminated element: content runs to the end of the buffer.
    if from < src.len() {
        tokens.push(Token::RawText {
            range: from..src.len(),
        });
    }
    src.len()
}

#[inline]
fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':')
}

/// Index just past the next '>' (or end of buffer).
fn scan_past_gt(src: &[u8], from: usize) -> usize {
    match memfind_byte(src, from, b'>') {
        Some(idx) => idx + 1,
        None => src.len(),
    }
}

fn memfind_byte(src: &[u8], from: usize, needle: u8) -> Option<usize> {
    src[from.min(src.len())..]
        .iter()
        .position(|&b| b == needle)
        .map(|i| from + i)
}

fn find(src: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from >= src.len() {
        return None;
    }
    src[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| from + i)
}

fn ascii_lowercase(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).to_ascii_lowercase()
}

// ============================================================================
// Element model
// ============================================================================

/// Element kinds the rewrite passes care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElemKind {
    Style,
    /// `<link rel=stylesheet>`
    Stylesheet,
    Script,
    Comment,
}

/// A parsed element occurrence. Immutable; owned by the [`Document`] for the
/// duration of one rewrite pass.
#[derive(Debug, Clone)]
pub struct Element {
    pub kind: ElemKind,
    /// Whole element including inner content and end tag.
    pub range: Range<usize>,
    pub start_tag: Range<usize>,
    /// Inner content; empty for void elements and comments.
    pub content: Range<usize>,
    pub attrs: Vec<Attr>,
    /// 1-based source line, for diagnostics.
    pub line: usize,
}

impl Element {
    /// Case-insensitive attribute lookup. Bare attributes yield `Some("")`.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_deref().unwrap_or(""))
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|a| a.name.eq_ignore_ascii_case(name))
    }

    /// Inner content as text.
    pub fn text<'a>(&self, src: &'a [u8]) -> std::borrow::Cow<'a, str> {
        String::from_utf8_lossy(&src[self.content.clone()])
    }
}

/// Parse result for one rewrite invocation: the elements of interest in
/// document order, plus the relocation anchors.
#[derive(Debug)]
pub struct Document {
    pub elements: Vec<Element>,
    /// Begin offset of the first `</head>` end tag.
    pub head_end: Option<usize>,
    /// Begin offset of the first `</body>` end tag.
    pub body_end: Option<usize>,
}

impl Document {
    pub fn parse(src: &[u8], opts: &ScanOptions) -> Self {
        let tokens = tokenize(src, opts);
        let mut elements = Vec::new();
        let mut head_end = None;
        let mut body_end = None;

        let mut i = 0;
        while i < tokens.len() {
            match &tokens[i] {
                Token::StartTag {
                    name,
                    attrs,
                    range,
                    self_closing,
                } => match name.as_str() {
                    "style" | "script" => {
                        let kind = if name == "style" {
                            ElemKind::Style
                        } else {
                            ElemKind::Script
                        };
                        let mut content = range.end..range.end;
                        let mut end = range.end;
                        let mut j = i + 1;
                        if !self_closing {
                            if let Some(Token::RawText { range: r }) = tokens.get(j) {
                                content = r.clone();
                                end = r.end;
                                j += 1;
                            }
                            if let Some(Token::EndTag { range: r, .. }) = tokens.get(j) {
                                end = r.end;
                                j += 1;
                            }
                        }
                        elements.push(Element {
                            kind,
                            range: range.start..end,
                            start_tag: range.clone(),
                            content,
                            attrs: attrs.clone(),
                            line: line_of(src, range.start),
                        });
                        i = j;
                        continue;
                    }
                    "link" => {
                        let is_stylesheet = attrs.iter().any(|a| {
                            a.name.eq_ignore_ascii_case("rel")
                                && a.value
                                    .as_deref()
                                    .is_some_and(|v| v.eq_ignore_ascii_case("stylesheet"))
                        });
                        if is_stylesheet {
                            elements.push(Element {
                                kind: ElemKind::Stylesheet,
                                range: range.clone(),
                                start_tag: range.clone(),
                                content: range.end..range.end,
                                attrs: attrs.clone(),
                                line: line_of(src, range.start),
                            });
                        }
                    }
                    _ => {}
                },
                Token::EndTag { name, range } => match name.as_str() {
                    "head" if head_end.is_none() => head_end = Some(range.start),
                    "body" if body_end.is_none() => body_end = Some(range.start),
                    _ => {}
                },
                Token::Comment { range } => {
                    elements.push(Element {
                        kind: ElemKind::Comment,
                        range: range.clone(),
                        start_tag: range.clone(),
                        content: range.clone(),
                        attrs: Vec::new(),
                        line: line_of(src, range.start),
                    });
                }
                _ => {}
            }
            i += 1;
        }

        Self {
            elements,
            head_end,
            body_end,
        }
    }

    /// Elements of one kind, in document order.
    pub fn of_kind(&self, kind: ElemKind) -> impl Iterator<Item = &Element> {
        self.elements.iter().filter(move |e| e.kind == kind)
    }
}

fn line_of(src: &[u8], offset: usize) -> usize {
    src[..offset.min(src.len())]
        .iter()
        .filter(|&&b| b == b'\n')
        .count()
        + 1
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(src: &str) -> Document {
        Document::parse(src.as_bytes(), &ScanOptions::default())
    }

    #[test]
    fn test_start_tag_offsets() {
        let src = b"<html><body>x</body></html>";
        let tokens = tokenize(src, &ScanOptions::default());
        let Token::StartTag { name, range, .. } = &tokens[0] else {
            panic!("expected start tag");
        };
        assert_eq!(name, "html");
        assert_eq!(*range, 0..6);
    }

    #[test]
    fn test_attributes_parsed() {
        let src = br#"<link REL="StyleSheet" href='a.css' defer>"#;
        let doc = Document::parse(src, &ScanOptions::default());
        assert_eq!(doc.elements.len(), 1);
        let el = &doc.elements[0];
        assert_eq!(el.kind, ElemKind::Stylesheet);
        assert_eq!(el.attr("href"), Some("a.css"));
        assert_eq!(el.attr("DEFER"), Some(""));
        assert!(!el.has_attr("async"));
    }

    #[test]
    fn test_unquoted_attribute_value() {
        let src = b"<script src=js/app.js></script>";
        let doc = Document::parse(src, &ScanOptions::default());
        assert_eq!(doc.elements[0].attr("src"), Some("js/app.js"));
    }

    #[test]
    fn test_script_raw_text_keeps_lt() {
        let src = b"<script>if (a < b) { go(); }</script><p>after</p>";
        let doc = Document::parse(src, &ScanOptions::default());
        let el = &doc.elements[0];
        assert_eq!(el.kind, ElemKind::Script);
        assert_eq!(el.text(src).as_ref(), "if (a < b) { go(); }");
        assert_eq!(&src[el.range.clone()], b"<script>if (a < b) { go(); }</script>".as_slice());
    }

    #[test]
    fn test_style_element_ranges() {
        let src = b"<head><style>h1 {}</style></head>";
        let doc = Document::parse(src, &ScanOptions::default());
        let el = &doc.elements[0];
        assert_eq!(el.start_tag, 6..13);
        assert_eq!(el.content, 13..18);
        assert_eq!(el.range, 6..26);
        assert_eq!(doc.head_end, Some(26));
    }

    #[test]
    fn test_comment_token() {
        let doc = parse("<p>a</p><!-- note --><p>b</p>");
        let comments: Vec<_> = doc.of_kind(ElemKind::Comment).collect();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].range, 8..21);
    }

    #[test]
    fn test_unterminated_comment_runs_to_eof() {
        let doc = parse("<p>a</p><!-- never closed");
        let comments: Vec<_> = doc.of_kind(ElemKind::Comment).collect();
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].range.end, 25);
    }

    #[test]
    fn test_conditional_comments_are_not_comments() {
        let src = "<!--[if (gt IEMobile 7)|!(IEMobile)]><!--><link href=a.css rel=x><![endif]-->";
        let doc = parse(src);
        assert_eq!(doc.of_kind(ElemKind::Comment).count(), 0);
    }

    #[test]
    fn test_conditional_comments_disabled() {
        let opts = ScanOptions {
            conditional_comments: false,
        };
        // With recognition off, `<!--[if ...]>` opens a plain comment that
        // swallows everything up to the first `-->`.
        let src = b"<!--[if IE]>x<![endif]-->";
        let tokens = tokenize(src, &opts);
        assert!(matches!(&tokens[0], Token::Comment { range } if *range == (0..src.len())));
    }

    #[test]
    fn test_head_and_body_anchors() {
        let doc = parse("<html><head></head><body><p>x</p></body></html>");
        assert_eq!(doc.head_end, Some(12));
        assert_eq!(doc.body_end, Some(33));
    }

    #[test]
    fn test_missing_anchors() {
        let doc = parse("<p>fragment only</p>");
        assert_eq!(doc.head_end, None);
        assert_eq!(doc.body_end, None);
    }

    #[test]
    fn test_plain_link_is_not_stylesheet() {
        let doc = parse(r#"<link rel="icon" href="fav.ico">"#);
        assert!(doc.elements.is_empty());
    }

    #[test]
    fn test_unterminated_script() {
        let src = b"<body><script>var x = 1;";
        let doc = Document::parse(src, &ScanOptions::default());
        let el = &doc.elements[0];
        assert_eq!(el.content, 14..src.len());
        assert_eq!(el.range.end, src.len());
    }

    #[test]
    fn test_stray_lt_is_text() {
        let tokens = tokenize(b"a < b", &ScanOptions::default());
        assert_eq!(tokens.len(), 2); // "a " and "< b"
        assert!(tokens.iter().all(|t| matches!(t, Token::Text { .. })));
    }
}

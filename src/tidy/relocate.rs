//! Style/stylesheet/script relocation and duplicate removal.
//!
//! One shared algorithm parameterized by a per-kind [`Strategy`]:
//!
//! - `<style>` relocates to the end of `<head>`,
//! - `<link rel=stylesheet>` and `<script>` relocate to the end of `<head>`,
//!   or to the end of `<body>` when `async` or `defer` is present,
//! - duplicates (by dedup key, first occurrence wins) are removed outright,
//! - style and stylesheet elements have `async`/`defer` stripped when
//!   rewritten; scripts keep them (the loader semantics are real there).
//!
//! Styles and stylesheets share one pass and one seen-set; scripts get their
//! own. Relocation needs both `</head>` and `</body>` present, otherwise
//! elements stay in place (duplicate removal still runs).

use rustc_hash::FxHashSet;
use std::fmt::Write as _;

use crate::config::{OptionSet, TidyOption};
use crate::debug;
use crate::tidy::edit::EditList;
use crate::tidy::scan::{Attr, Document, ElemKind, Element};
use crate::utils::hash;

/// Where a relocated element lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    EndOfHead,
    EndOfBody,
}

/// Outcome for one element, computed once and consumed once.
#[derive(Debug)]
struct Decision {
    duplicate: bool,
    target: Option<Anchor>,
    strip: bool,
}

/// Per-kind capabilities. Plain data, no dispatch.
struct Strategy {
    relocate_opt: TidyOption,
    dedup_opt: TidyOption,
    /// Strip `async`/`defer` when the element is rewritten.
    strip: bool,
    /// Label for diagnostics.
    label: &'static str,
}

fn strategy(kind: ElemKind) -> Strategy {
    match kind {
        ElemKind::Style => Strategy {
            relocate_opt: TidyOption::RelocateStylesToHead,
            dedup_opt: TidyOption::RemoveDuplicateStyles,
            strip: true,
            label: "style",
        },
        ElemKind::Stylesheet => Strategy {
            relocate_opt: TidyOption::RelocateStylesheets,
            dedup_opt: TidyOption::RemoveDuplicateStyles,
            strip: true,
            label: "stylesheet",
        },
        ElemKind::Script => Strategy {
            relocate_opt: TidyOption::RelocateScripts,
            dedup_opt: TidyOption::RemoveDuplicateScripts,
            strip: false,
            label: "script",
        },
        ElemKind::Comment => unreachable!("comments are not relocatable"),
    }
}

/// Run both relocation passes, recording edits.
pub fn apply(doc: &Document, src: &[u8], options: &OptionSet, edits: &mut EditList) {
    run_pass(
        doc,
        src,
        options,
        edits,
        &[ElemKind::Style, ElemKind::Stylesheet],
    );
    run_pass(doc, src, options, edits, &[ElemKind::Script]);
}

fn run_pass(
    doc: &Document,
    src: &[u8],
    options: &OptionSet,
    edits: &mut EditList,
    kinds: &[ElemKind],
) {
    let mut seen: FxHashSet<u64> = FxHashSet::default();
    // Relocation anchors sit just before the closing tags; without both of
    // them there is nowhere sound to move elements to.
    let anchors = match (doc.head_end, doc.body_end) {
        (Some(h), Some(b)) if h > 0 && b > 0 => Some((h, b)),
        _ => None,
    };

    for el in doc.elements.iter().filter(|e| kinds.contains(&e.kind)) {
        let strat = strategy(el.kind);
        if !options.has(strat.relocate_opt) && !options.has(strat.dedup_opt) {
            continue;
        }

        let key = dedup_key(el, src);
        let first = seen.insert(key);
        let decision = Decision {
            duplicate: options.has(strat.dedup_opt) && !first,
            target: if options.has(strat.relocate_opt) && anchors.is_some() {
                Some(target_anchor(el))
            } else {
                None
            },
            strip: strat.strip && (el.has_attr("async") || el.has_attr("defer")),
        };

        if decision.duplicate {
            debug!("tidy"; "line {}: removing duplicate {}", el.line, strat.label);
            edits.remove(el.range.clone());
            continue;
        }

        match decision.target {
            Some(anchor) => {
                let (head, body) = anchors.unwrap_or((0, 0));
                let at = match anchor {
                    Anchor::EndOfHead => head - 1,
                    Anchor::EndOfBody => body - 1,
                };
                debug!(
                    "tidy";
                    "line {}: relocating {} to end of {}",
                    el.line,
                    strat.label,
                    if anchor == Anchor::EndOfHead { "head" } else { "body" }
                );
                let rendered = if decision.strip {
                    render(el, src, true)
                } else {
                    String::from_utf8_lossy(&src[el.range.clone()]).into_owned()
                };
                edits.insert(at, rendered);
                edits.remove(el.range.clone());
            }
            None if decision.strip => {
                // Element stays put but still loses async/defer.
                edits.replace(el.start_tag.clone(), render_start_tag(el, true));
            }
            None => {}
        }
    }
}

/// Anchor selection: styles always go to the head; stylesheets and scripts
/// marked `async` or `defer` go to the end of the body instead.
fn target_anchor(el: &Element) -> Anchor {
    match el.kind {
        ElemKind::Style => Anchor::EndOfHead,
        _ if el.has_attr("async") || el.has_attr("defer") => Anchor::EndOfBody,
        _ => Anchor::EndOfHead,
    }
}

// ============================================================================
// Dedup keys
// ============================================================================

/// Content identity for duplicate detection.
///
/// - `<style>`: hash of the trimmed inline CSS.
/// - `<link rel=stylesheet>`: hash of `href`; links without an `href` key on
///   their full serialized attribute list so distinct hrefless links never
///   collide.
/// - `<script src=…>`: hash of the non-empty `src`.
/// - inline `<script>`: hash of the trimmed script body.
fn dedup_key(el: &Element, src: &[u8]) -> u64 {
    match el.kind {
        ElemKind::Style => hash::compute(el.text(src).trim()),
        ElemKind::Stylesheet => match el.attr("href") {
            Some(href) if !href.is_empty() => hash::compute(href),
            _ => hash::compute(&serialize_attrs(&el.attrs)),
        },
        ElemKind::Script => match el.attr("src") {
            Some(s) if !s.is_empty() => hash::compute(s),
            _ => hash::compute(el.text(src).trim()),
        },
        ElemKind::Comment => unreachable!("comments have no dedup key"),
    }
}

fn serialize_attrs(attrs: &[Attr]) -> String {
    let mut out = String::new();
    for a in attrs {
        out.push_str(&a.name.to_ascii_lowercase());
        if let Some(v) = &a.value {
            let _ = write!(out, "={v}");
        }
        out.push(' ');
    }
    out
}

// ============================================================================
// Re-serialization
// ============================================================================

fn tag_name(kind: ElemKind) -> &'static str {
    match kind {
        ElemKind::Style => "style",
        ElemKind::Stylesheet => "link",
        ElemKind::Script => "script",
        ElemKind::Comment => unreachable!(),
    }
}

/// Rebuild the start tag, optionally dropping `async`/`defer`. Remaining
/// attributes keep their order; the tag name is normalized to lowercase.
fn render_start_tag(el: &Element, strip_loader_attrs: bool) -> String {
    let name = tag_name(el.kind);
    let mut out = String::with_capacity(el.start_tag.len() + 2);
    out.push('<');
    out.push_str(name);
    for a in &el.attrs {
        if strip_loader_attrs
            && (a.name.eq_ignore_ascii_case("async") || a.name.eq_ignore_ascii_case("defer"))
        {
            continue;
        }
        out.push(' ');
        out.push_str(&a.name);
        if let Some(v) = &a.value {
            let _ = write!(out, "=\"{}\"", v.replace('"', "&quot;"));
        }
    }
    out.push('>');
    out
}

/// Rebuild the whole element text.
fn render(el: &Element, src: &[u8], strip_loader_attrs: bool) -> String {
    let mut out = render_start_tag(el, strip_loader_attrs);
    if el.kind != ElemKind::Stylesheet {
        out.push_str(&String::from_utf8_lossy(&src[el.content.clone()]));
        let _ = write!(out, "</{}>", tag_name(el.kind));
    }
    out
}

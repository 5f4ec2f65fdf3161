//! HTML tidy processor.
//!
//! Pipeline per invocation (all state allocated fresh, input never mutated):
//!
//! 1. `scan` - tokenize and collect the elements of interest with byte
//!    offsets into the original buffer.
//! 2. rewrite - comment removal, relocation/dedup, inline-script
//!    minification, each recording offset-anchored edits.
//! 3. `edit::EditList::apply` - materialize the rewritten buffer.
//! 4. `format` - optional layout pass over the rewritten buffer.

pub mod edit;
pub mod format;
pub mod minify;
pub mod relocate;
pub mod scan;

use crate::config::{FormatterMode, OptionSet, TidyConfig, TidyOption};
use crate::debug;
use edit::EditList;
use scan::{Document, ElemKind, ScanOptions};

/// Immutable processor. Cheap to share; every [`process`](Self::process)
/// call is independent, so one instance serves concurrent requests.
#[derive(Debug, Clone)]
pub struct TidyProcessor {
    options: OptionSet,
    formatter: FormatterMode,
    scan_opts: ScanOptions,
}

impl TidyProcessor {
    pub fn new(config: &TidyConfig) -> Self {
        Self {
            options: config.options.clone(),
            formatter: config.formatter,
            scan_opts: ScanOptions::default(),
        }
    }

    /// True when processing would be a byte-for-byte no-op.
    pub fn is_noop(&self) -> bool {
        self.options.is_empty() && self.formatter == FormatterMode::None
    }

    /// Run the full pipeline over one document.
    pub fn process(&self, src: &[u8]) -> Vec<u8> {
        let rewritten = self.rewrite(src);
        format::format(&rewritten, self.formatter)
    }

    fn rewrite(&self, src: &[u8]) -> Vec<u8> {
        if self.options.is_empty() {
            return src.to_vec();
        }

        let doc = Document::parse(src, &self.scan_opts);
        let mut edits = EditList::new();

        if self.options.has(TidyOption::RemoveComments) {
            for el in doc.of_kind(ElemKind::Comment) {
                edits.remove(el.range.clone());
            }
        }
        relocate::apply(&doc, src, &self.options, &mut edits);
        if self.options.has(TidyOption::MinifyScripts) {
            minify::apply(&doc, src, &mut edits);
        }

        if edits.is_empty() {
            return src.to_vec();
        }
        debug!("tidy"; "applying {} edits", edits.len());
        edits.apply(src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn processor(options: &str, formatter: FormatterMode) -> TidyProcessor {
        let mut config = Config::default();
        config.override_options(options).unwrap();
        config.tidy.formatter = formatter;
        TidyProcessor::new(&config.tidy)
    }

    fn process(options: &str, src: &str) -> String {
        let out = processor(options, FormatterMode::None).process(src.as_bytes());
        String::from_utf8(out).unwrap()
    }

    const PAGE: &str = "<html><head><title>t</title>\n\
                        <script src=\"app.js\"></script>\n\
                        </head><body>\n\
                        <!-- generator: v3 -->\n\
                        <p>hello</p>\n\
                        <style>p { color: red; }</style>\n\
                        <script src=\"app.js\"></script>\n\
                        <script>function test(){ wow = \"aha   \"; }</script>\n\
                        </body></html>";

    #[test]
    fn test_empty_options_are_identity() {
        assert_eq!(process("", PAGE), PAGE);
    }

    #[test]
    fn test_comments_removed() {
        let out = process("REMOVE_COMMENTS", PAGE);
        assert!(!out.contains("<!--"));
        assert!(out.contains("<p>hello</p>"));
    }

    #[test]
    fn test_conditional_comments_survive_comment_removal() {
        let src = "<html><head></head><body>\
                   <!--[if lt IE 9]><script src=\"shim.js\"></script><![endif]-->\
                   <!-- plain --></body></html>";
        let out = process("REMOVE_COMMENTS", src);
        assert!(out.contains("<!--[if lt IE 9]>"));
        assert!(out.contains("<![endif]-->"));
        assert!(!out.contains("plain"));
    }

    #[test]
    fn test_full_option_set() {
        let out = process("all", PAGE);

        assert!(!out.contains("<!--"));
        // The body style moved into the head.
        let head_end = out.find("</head>").unwrap();
        assert!(out.find("p { color: red; }").unwrap() < head_end);
        // The duplicate app.js reference collapsed to the first one.
        assert_eq!(out.matches("app.js").count(), 1);
        // Relocated inline scripts move verbatim; minification only rewrites
        // scripts that stay in place.
        assert!(out.find(r#"wow = "aha   ""#).unwrap() < head_end);
        assert_eq!(out.matches("function test").count(), 1);
    }

    #[test]
    fn test_minified_script_tags_unchanged() {
        let src = "<script>function test(){ wow = \"aha   \"; }</script>";
        let out = process("MINIFY_SCRIPTS", src);
        assert!(out.starts_with("<script>"));
        assert!(out.ends_with("</script>"));
        assert!(out.contains(r#"function test(){wow="aha   ""#), "{out}");
    }

    #[test]
    fn test_formatter_runs_after_rewrite() {
        let src = "<html><head></head><body>\n  <!-- x -->\n  <p>hi</p>\n</body></html>";
        let out = processor("REMOVE_COMMENTS", FormatterMode::Compact).process(src.as_bytes());
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "<html><head></head><body><p>hi</p></body></html>"
        );
    }

    #[test]
    fn test_formatter_alone() {
        let out = processor("", FormatterMode::Compact).process(b"<p>\n  x\n</p>\n");
        assert_eq!(String::from_utf8(out).unwrap(), "<p> x </p>");
    }

    #[test]
    fn test_is_noop() {
        assert!(processor("", FormatterMode::None).is_noop());
        assert!(!processor("REMOVE_COMMENTS", FormatterMode::None).is_noop());
        assert!(!processor("", FormatterMode::Compact).is_noop());
    }
}

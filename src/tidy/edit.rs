//! Position-anchored edits over an immutable source buffer.
//!
//! The rewrite passes never mutate the input. They record [`Edit`]s whose
//! offsets always refer to the *original* buffer, then [`EditList::apply`]
//! materializes the output in a single pass. This keeps every pass's ranges
//! valid no matter how many edits precede them.

use std::ops::Range;

/// A single pending rewrite. All offsets index the original buffer.
#[derive(Debug, Clone)]
pub enum Edit {
    /// Drop the bytes in `range`.
    Remove { range: Range<usize> },
    /// Emit `text` at offset `at`, before the byte at that position.
    Insert { at: usize, text: String },
    /// Substitute `text` for the bytes in `range`.
    Replace { range: Range<usize>, text: String },
}

impl Edit {
    fn start(&self) -> usize {
        match self {
            Edit::Remove { range } | Edit::Replace { range, .. } => range.start,
            Edit::Insert { at, .. } => *at,
        }
    }

    fn span(&self) -> Range<usize> {
        match self {
            Edit::Remove { range } | Edit::Replace { range, .. } => range.clone(),
            Edit::Insert { at, .. } => *at..*at,
        }
    }
}

/// Accumulated edits for one processing run.
#[derive(Debug, Default)]
pub struct EditList {
    edits: Vec<Edit>,
}

impl EditList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn remove(&mut self, range: Range<usize>) {
        self.edits.push(Edit::Remove { range });
    }

    pub fn insert(&mut self, at: usize, text: impl Into<String>) {
        self.edits.push(Edit::Insert {
            at,
            text: text.into(),
        });
    }

    pub fn replace(&mut self, range: Range<usize>, text: impl Into<String>) {
        self.edits.push(Edit::Replace {
            range,
            text: text.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// True if any recorded edit touches `range`. Used by later passes to
    /// avoid rewriting bytes an earlier pass already claimed.
    pub fn overlaps(&self, range: &Range<usize>) -> bool {
        self.edits.iter().any(|e| {
            let span = e.span();
            span.start < range.end && range.start < span.end
        })
    }

    /// Materialize the output. Edits are ordered by start offset; pushes at
    /// the same offset keep their insertion order. An `Insert` anchored
    /// inside a removed span is still emitted, which is what lets an element
    /// relocate onto an anchor it was directly abutting.
    pub fn apply(mut self, src: &[u8]) -> Vec<u8> {
        self.edits.sort_by_key(Edit::start);

        let mut out = Vec::with_capacity(src.len());
        let mut pos = 0;
        for edit in &self.edits {
            let start = edit.start();
            if start > pos {
                out.extend_from_slice(&src[pos..start]);
                pos = start;
            }
            match edit {
                Edit::Insert { text, .. } => out.extend_from_slice(text.as_bytes()),
                Edit::Remove { range } => {
                    debug_assert!(range.start >= pos || range.end <= pos, "overlapping removes");
                    pos = pos.max(range.end);
                }
                Edit::Replace { range, text } => {
                    out.extend_from_slice(text.as_bytes());
                    pos = pos.max(range.end);
                }
            }
        }
        out.extend_from_slice(&src[pos..]);
        out
    }
}

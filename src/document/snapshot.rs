//! Immutable document snapshots.
//!
//! A snapshot captures the full text of a document at one edit version.
//! Content and version never change after construction; the only deferred
//! state is the line table, built on the first line query and cached for the
//! snapshot's lifetime. Snapshots are therefore safe to query from any
//! number of threads.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use crate::error::TextError;
use crate::lsp::{PositionEncoding, PositionMap};

use super::buffer::TextBuffer;
use super::lines::{build_line_table, Line, LineTable};
use super::range::TextRange;
use super::tracking::{TrackingPolicy, TrackingRange};

/// Optional views a snapshot can be adapted to.
///
/// This is a closed set: consumers ask for a capability explicitly and get
/// an explicit "unsupported" error when the snapshot cannot provide it,
/// never a silent default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// LSP position conversion over the snapshot's line table, with the
    /// requested column encoding.
    LspPositions(PositionEncoding),
    /// A host editor's view of the snapshot. Provided by host integrations,
    /// never by this crate.
    EditorView,
}

/// A capability view obtained through [`DocumentSnapshot::try_adapt`].
#[derive(Debug)]
pub enum CapabilityView<'a> {
    /// Byte offset <-> LSP position conversion.
    LspPositions(PositionMap<'a>),
}

/// An immutable view of document text at a fixed version.
#[derive(Debug)]
pub struct DocumentSnapshot {
    /// Non-owning link back to the live buffer; the buffer outlives no
    /// snapshot on its account, and snapshots never keep the buffer alive.
    buffer: Weak<TextBuffer>,
    content: String,
    version: i32,
    lines: OnceLock<LineTable>,
    line_builds: AtomicUsize,
}

impl DocumentSnapshot {
    /// Create a detached snapshot that belongs to no live buffer.
    pub fn new(content: impl Into<String>, version: i32) -> Self {
        Self::for_buffer(Weak::new(), content.into(), version)
    }

    pub(crate) fn for_buffer(buffer: Weak<TextBuffer>, content: String, version: i32) -> Self {
        Self {
            buffer,
            content,
            version,
            lines: OnceLock::new(),
            line_builds: AtomicUsize::new(0),
        }
    }

    /// The edit version this snapshot captures.
    pub fn version(&self) -> i32 {
        self.version
    }

    /// Document length in bytes.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Whether the document is empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// The full document text.
    pub fn text(&self) -> &str {
        &self.content
    }

    /// The live buffer this snapshot was taken from, if it still exists.
    pub fn buffer(&self) -> Option<Arc<TextBuffer>> {
        self.buffer.upgrade()
    }

    /// The character starting at byte offset `position`.
    pub fn char_at(&self, position: usize) -> Result<char, TextError> {
        if position >= self.content.len() {
            return Err(TextError::PositionOutOfRange {
                position,
                length: self.content.len(),
            });
        }
        if !self.content.is_char_boundary(position) {
            return Err(TextError::NotCharBoundary(position));
        }
        self.content[position..]
            .chars()
            .next()
            .ok_or(TextError::PositionOutOfRange {
                position,
                length: self.content.len(),
            })
    }

    /// The slice of text covered by `range`.
    pub fn substring(&self, range: TextRange) -> Result<&str, TextError> {
        if range.end() > self.content.len() {
            return Err(TextError::RangeOutOfBounds {
                start: range.start,
                end: range.end(),
                length: self.content.len(),
            });
        }
        if !self.content.is_char_boundary(range.start) {
            return Err(TextError::NotCharBoundary(range.start));
        }
        if !self.content.is_char_boundary(range.end()) {
            return Err(TextError::NotCharBoundary(range.end()));
        }
        Ok(&self.content[range.start..range.end()])
    }

    /// Byte offset of the first occurrence of `needle` at or after `from`.
    ///
    /// A miss is an expected outcome, not an error, so out-of-range starting
    /// positions also report `None`. Case-insensitive search folds code
    /// points ordinally (no locale tables), keeping results deterministic.
    pub fn find(&self, needle: &str, from: usize, ignore_case: bool) -> Option<usize> {
        let haystack = self.content.get(from..)?;
        let found = if ignore_case {
            find_folded(haystack, needle)
        } else {
            haystack.find(needle)
        };
        found.map(|offset| offset + from)
    }

    /// Like [`find`](Self::find), but the match must lie entirely in `range`.
    pub fn find_in_range(&self, needle: &str, range: TextRange, ignore_case: bool) -> Option<usize> {
        let haystack = self.content.get(range.start..range.end())?;
        let found = if ignore_case {
            find_folded(haystack, needle)
        } else {
            haystack.find(needle)
        };
        found.map(|offset| offset + range.start)
    }

    /// Byte offset of the first occurrence of `ch` at or after `from`.
    pub fn find_char(&self, ch: char, from: usize) -> Option<usize> {
        let haystack = self.content.get(from..)?;
        haystack.find(ch).map(|offset| offset + from)
    }

    /// Like [`find_char`](Self::find_char), but the match must lie in
    /// `range`.
    pub fn find_char_in_range(&self, ch: char, range: TextRange) -> Option<usize> {
        let haystack = self.content.get(range.start..range.end())?;
        haystack.find(ch).map(|offset| offset + range.start)
    }

    /// Compare the region `[position, position + length)` against `other`
    /// without allocating a substring.
    ///
    /// Regions falling outside the document or off a character boundary
    /// compare unequal. Case-insensitive comparison uses the same ordinal
    /// folding as [`find`](Self::find).
    pub fn equals_region(
        &self,
        position: usize,
        length: usize,
        other: &str,
        ignore_case: bool,
    ) -> bool {
        let Some(region) = self.content.get(position..position + length) else {
            return false;
        };
        if ignore_case {
            eq_folded(region, other)
        } else {
            region == other
        }
    }

    /// Number of lines in the document; always at least 1.
    pub fn line_count(&self) -> usize {
        self.line_table().len()
    }

    /// The line containing byte offset `position`.
    ///
    /// A position exactly at the end of the document resolves to the final
    /// line, so a cursor at end-of-document is a valid query.
    pub fn line_at(&self, position: usize) -> Result<Line, TextError> {
        if position > self.content.len() {
            return Err(TextError::PositionOutOfRange {
                position,
                length: self.content.len(),
            });
        }
        let table = self.line_table();
        let index = table
            .containing_index(position)
            .ok_or(TextError::PositionOutOfRange {
                position,
                length: self.content.len(),
            })?;
        table
            .item(index)
            .copied()
            .ok_or(TextError::PositionOutOfRange {
                position,
                length: self.content.len(),
            })
    }

    /// The line with the given zero-based index.
    pub fn line_by_index(&self, index: usize) -> Result<Line, TextError> {
        let table = self.line_table();
        table
            .item(index)
            .copied()
            .ok_or(TextError::LineOutOfRange {
                index,
                line_count: table.len(),
            })
    }

    /// The zero-based index of the line containing `position`.
    ///
    /// Unlike [`line_at`](Self::line_at), the end-of-document position is
    /// out of range here; the valid domain is `[0, len)`.
    pub fn line_index_at(&self, position: usize) -> Result<usize, TextError> {
        if position >= self.content.len() {
            return Err(TextError::PositionOutOfRange {
                position,
                length: self.content.len(),
            });
        }
        self.line_table()
            .containing_index(position)
            .ok_or(TextError::PositionOutOfRange {
                position,
                length: self.content.len(),
            })
    }

    /// The text of `line`, trailing break excluded.
    ///
    /// `line` must come from this snapshot's own line table.
    pub fn line_text(&self, line: &Line) -> &str {
        let content = line.content_range();
        debug_assert!(content.end() <= self.content.len());
        &self.content[content.start..content.end()]
    }

    /// Create a tracking range anchored to this snapshot, using the default
    /// partial-overlap policy.
    pub fn create_tracking_range(&self, range: TextRange) -> Result<TrackingRange, TextError> {
        self.create_tracking_range_with_policy(range, TrackingPolicy::default())
    }

    /// Create a tracking range anchored to this snapshot with an explicit
    /// partial-overlap policy.
    pub fn create_tracking_range_with_policy(
        &self,
        range: TextRange,
        policy: TrackingPolicy,
    ) -> Result<TrackingRange, TextError> {
        if range.end() > self.content.len() {
            return Err(TextError::RangeOutOfBounds {
                start: range.start,
                end: range.end(),
                length: self.content.len(),
            });
        }
        Ok(TrackingRange::new(range, self.version, policy))
    }

    /// Adapt this snapshot to one of the optional capability views.
    pub fn try_adapt(&self, capability: Capability) -> Result<CapabilityView<'_>, TextError> {
        match capability {
            Capability::LspPositions(encoding) => Ok(CapabilityView::LspPositions(
                PositionMap::new(self, encoding),
            )),
            Capability::EditorView => Err(TextError::UnsupportedCapability(capability)),
        }
    }

    /// Number of times the line table builder has run for this snapshot:
    /// 0 before any line query, 1 ever after. Exposed so concurrency tests
    /// can verify the build happens exactly once.
    pub fn line_table_builds(&self) -> usize {
        self.line_builds.load(Ordering::Relaxed)
    }

    pub(crate) fn line_table(&self) -> &LineTable {
        self.lines.get_or_init(|| {
            self.line_builds.fetch_add(1, Ordering::Relaxed);
            build_line_table(&self.content)
        })
    }
}

/// Ordinal case fold: a code point maps to its single-char lowercase form,
/// or to itself when lowercasing would expand it.
fn fold_char(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(folded), None) => folded,
        _ => c,
    }
}

fn eq_folded(a: &str, b: &str) -> bool {
    let mut left = a.chars();
    let mut right = b.chars();
    loop {
        match (left.next(), right.next()) {
            (None, None) => return true,
            (Some(x), Some(y)) if fold_char(x) == fold_char(y) => {}
            _ => return false,
        }
    }
}

fn find_folded(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .char_indices()
        .map(|(offset, _)| offset)
        .find(|&offset| starts_with_folded(&haystack[offset..], needle))
}

fn starts_with_folded(text: &str, prefix: &str) -> bool {
    let mut chars = text.chars();
    prefix.chars().all(|expected| {
        chars
            .next()
            .is_some_and(|actual| fold_char(actual) == fold_char(expected))
    })
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    fn snapshot(text: &str) -> DocumentSnapshot {
        DocumentSnapshot::new(text, 1)
    }

    #[test]
    fn content_queries() {
        let snap = snapshot("hello\nworld");
        assert_eq!(snap.len(), 11);
        assert_eq!(snap.version(), 1);
        assert_eq!(snap.text(), "hello\nworld");
        assert_eq!(snap.char_at(0), Ok('h'));
        assert_eq!(snap.char_at(6), Ok('w'));
        assert_eq!(snap.substring(TextRange::new(6, 5)), Ok("world"));
    }

    #[test]
    fn out_of_range_queries_fail() {
        let snap = snapshot("abc");
        assert_eq!(
            snap.char_at(3),
            Err(TextError::PositionOutOfRange {
                position: 3,
                length: 3
            })
        );
        assert_eq!(
            snap.substring(TextRange::new(1, 5)),
            Err(TextError::RangeOutOfBounds {
                start: 1,
                end: 6,
                length: 3
            })
        );
        assert_eq!(
            snap.line_by_index(1),
            Err(TextError::LineOutOfRange {
                index: 1,
                line_count: 1
            })
        );
        assert_eq!(
            snap.line_at(4),
            Err(TextError::PositionOutOfRange {
                position: 4,
                length: 3
            })
        );
    }

    #[test]
    fn char_boundaries_are_enforced() {
        let snap = snapshot("aé");
        assert_eq!(snap.char_at(1), Ok('é'));
        assert_eq!(snap.char_at(2), Err(TextError::NotCharBoundary(2)));
    }

    #[test]
    fn find_is_case_sensitive_by_default() {
        let snap = snapshot("aB b");
        assert_eq!(snap.find("b", 0, false), Some(3));
        assert_eq!(snap.find("b", 0, true), Some(1));
    }

    #[test]
    fn find_miss_is_none_not_an_error() {
        let snap = snapshot("abc");
        assert_eq!(snap.find("zzz", 0, false), None);
        assert_eq!(snap.find("a", 99, false), None);
    }

    #[test]
    fn find_in_range_bounds_the_match() {
        let snap = snapshot("abcabc");
        assert_eq!(snap.find_in_range("abc", TextRange::new(1, 5), false), Some(3));
        assert_eq!(snap.find_in_range("abc", TextRange::new(1, 4), false), None);
    }

    #[test]
    fn find_char_scans_from_position() {
        let snap = snapshot("a,b,c");
        assert_eq!(snap.find_char(',', 0), Some(1));
        assert_eq!(snap.find_char(',', 2), Some(3));
        assert_eq!(snap.find_char(';', 0), None);
    }

    #[test]
    fn find_char_in_range_bounds_the_match() {
        let snap = snapshot("a,b,c");
        assert_eq!(snap.find_char_in_range(',', TextRange::new(2, 3)), Some(3));
        assert_eq!(snap.find_char_in_range(',', TextRange::new(2, 1)), None);
        assert_eq!(snap.find_char_in_range(',', TextRange::new(4, 9)), None);
    }

    #[test]
    fn equals_region_compares_without_allocating() {
        let snap = snapshot("let value = 42;");
        assert!(snap.equals_region(4, 5, "value", false));
        assert!(!snap.equals_region(4, 5, "value!", false));
        assert!(!snap.equals_region(4, 5, "velue", false));
        assert!(snap.equals_region(4, 5, "VALUE", true));
        assert!(!snap.equals_region(4, 5, "VALUE", false));
        assert!(!snap.equals_region(12, 99, "42;", false));
    }

    #[test]
    fn line_at_end_of_document_is_the_final_line() {
        let snap = snapshot("a\nb");
        let line = snap.line_at(3).unwrap();
        assert_eq!(line.index, 1);
        assert_eq!(snap.line_text(&line), "b");
    }

    #[test]
    fn line_index_at_rejects_end_of_document() {
        let snap = snapshot("a\nb");
        assert_eq!(snap.line_index_at(2), Ok(1));
        assert_eq!(
            snap.line_index_at(3),
            Err(TextError::PositionOutOfRange {
                position: 3,
                length: 3
            })
        );
    }

    #[test]
    fn line_lookups_round_trip() {
        let snap = snapshot("a\r\nb\nc\rd");
        for position in 0..=snap.len() {
            let line = snap.line_at(position).unwrap();
            let by_index = snap.line_by_index(line.index).unwrap();
            assert_eq!(line, by_index);
            if position < snap.len() {
                assert_eq!(snap.line_index_at(position).unwrap(), line.index);
                assert!(line.range().contains(position));
            }
        }
    }

    #[test]
    fn line_table_is_built_lazily_and_once() {
        let snap = snapshot("a\nb\nc");
        assert_eq!(snap.line_table_builds(), 0);
        assert_eq!(snap.line_count(), 3);
        assert_eq!(snap.line_count(), 3);
        let _ = snap.line_at(4).unwrap();
        assert_eq!(snap.line_table_builds(), 1);
    }

    #[test]
    fn concurrent_first_access_builds_once() {
        let snap = Arc::new(snapshot("one\ntwo\nthree\n"));
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let snap = Arc::clone(&snap);
                thread::spawn(move || snap.line_count())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 4);
        }
        assert_eq!(snap.line_table_builds(), 1);
    }

    #[test]
    fn detached_snapshot_has_no_buffer() {
        assert!(snapshot("x").buffer().is_none());
    }

    #[test]
    fn capability_adaptation_is_explicit() {
        let snap = snapshot("a\nb");
        assert!(matches!(
            snap.try_adapt(Capability::LspPositions(PositionEncoding::Utf16)),
            Ok(CapabilityView::LspPositions(_))
        ));
        assert_eq!(
            snap.try_adapt(Capability::EditorView).map(|_| ()),
            Err(TextError::UnsupportedCapability(Capability::EditorView))
        );
    }

    #[test]
    fn capability_adaptation_honors_the_requested_encoding() {
        // 'é' is 2 UTF-8 bytes and 1 UTF-16 unit.
        let snap = snapshot("éa");
        let Ok(CapabilityView::LspPositions(wide)) =
            snap.try_adapt(Capability::LspPositions(PositionEncoding::Utf16))
        else {
            panic!("utf-16 positions should be supported");
        };
        assert_eq!(wide.encoding(), PositionEncoding::Utf16);
        assert_eq!(wide.offset_to_position(2).character, 1);

        let Ok(CapabilityView::LspPositions(narrow)) =
            snap.try_adapt(Capability::LspPositions(PositionEncoding::Utf8))
        else {
            panic!("utf-8 positions should be supported");
        };
        assert_eq!(narrow.encoding(), PositionEncoding::Utf8);
        assert_eq!(narrow.offset_to_position(2).character, 2);
    }

    #[test]
    fn tracking_range_creation_is_bounds_checked() {
        let snap = snapshot("abc");
        assert!(snap.create_tracking_range(TextRange::new(0, 3)).is_ok());
        assert_eq!(
            snap.create_tracking_range(TextRange::new(2, 2)),
            Err(TextError::RangeOutOfBounds {
                start: 2,
                end: 4,
                length: 3
            })
        );
    }
}

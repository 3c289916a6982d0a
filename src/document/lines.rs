//! Line records and the single-pass line table builder.
//!
//! A line's length includes its trailing break. `\n` and `\r` alone are
//! one-byte breaks; `\r\n` and the reversed `\n\r` pair both count as a
//! single two-byte break, so documents with mixed or malformed endings still
//! segment deterministically instead of being rejected.

use super::range::{RangeCollection, Ranged, TextRange};

/// One line of a snapshot, including its trailing break if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    /// Byte offset where the line starts.
    pub start: usize,
    /// Total length in bytes, including the line break.
    pub length: usize,
    /// Length of the trailing break: 0, 1, or 2.
    pub break_length: usize,
    /// Zero-based index of this line within its snapshot.
    pub index: usize,
}

impl Line {
    /// Exclusive end offset, past the line break.
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    /// The full span of the line, break included.
    pub fn range(&self) -> TextRange {
        TextRange::new(self.start, self.length)
    }

    /// The span of the line's content, break excluded.
    pub fn content_range(&self) -> TextRange {
        TextRange::new(self.start, self.length - self.break_length)
    }
}

impl Ranged for Line {
    fn start(&self) -> usize {
        self.start
    }

    fn length(&self) -> usize {
        self.length
    }
}

/// The derived line index of a snapshot: a sorted interval table of `Line`s.
pub type LineTable = RangeCollection<Line>;

/// Partition `text` into its line table in a single left-to-right scan.
///
/// Exactly one trailing break-less line is always emitted: the empty
/// document yields one line of length 0, and text ending in a break yields a
/// trailing empty line. Every downstream offset-to-line conversion depends
/// on that rule.
pub fn build_line_table(text: &str) -> LineTable {
    let bytes = text.as_bytes();
    let mut lines = Vec::new();
    let mut line_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let byte = bytes[i];
        if byte == b'\n' || byte == b'\r' {
            let mut break_length = 1;
            if let Some(&next) = bytes.get(i + 1) {
                if (byte == b'\r' && next == b'\n') || (byte == b'\n' && next == b'\r') {
                    break_length = 2;
                    i += 1;
                }
            }
            lines.push(Line {
                start: line_start,
                length: i + 1 - line_start,
                break_length,
                index: lines.len(),
            });
            line_start = i + 1;
        }
        i += 1;
    }

    lines.push(Line {
        start: line_start,
        length: text.len() - line_start,
        break_length: 0,
        index: lines.len(),
    });

    LineTable::new(lines)
}

//! Byte offset <-> LSP position conversion over a snapshot's line table.
//!
//! LSP positions are line/column pairs whose column unit depends on the
//! negotiated encoding; UTF-16 code units are the protocol default. Line
//! lookup goes through the snapshot's cached line table, so conversion is
//! O(log n) plus a scan of one line.

use serde::Deserialize;
use tower_lsp::lsp_types::{Position, Range};

use crate::document::{DocumentSnapshot, Line, TextRange};

/// Column unit used when converting to and from LSP positions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum PositionEncoding {
    /// Columns in UTF-8 bytes.
    #[serde(rename = "utf-8")]
    Utf8,
    /// Columns in UTF-16 code units, the LSP default.
    #[default]
    #[serde(rename = "utf-16")]
    Utf16,
}

impl PositionEncoding {
    fn width(self, c: char) -> usize {
        match self {
            PositionEncoding::Utf8 => c.len_utf8(),
            PositionEncoding::Utf16 => c.len_utf16(),
        }
    }
}

/// Position converter borrowed from a snapshot.
#[derive(Debug, Clone, Copy)]
pub struct PositionMap<'a> {
    snapshot: &'a DocumentSnapshot,
    encoding: PositionEncoding,
}

impl<'a> PositionMap<'a> {
    /// Create a converter over `snapshot` using the given column encoding.
    pub fn new(snapshot: &'a DocumentSnapshot, encoding: PositionEncoding) -> Self {
        Self { snapshot, encoding }
    }

    /// The column encoding this map converts with.
    pub fn encoding(&self) -> PositionEncoding {
        self.encoding
    }

    /// Convert a byte offset to an LSP position.
    ///
    /// Offsets past the end of the document map to the position after the
    /// last character, mirroring the end-of-document cursor.
    pub fn offset_to_position(&self, offset: usize) -> Position {
        let offset = offset.min(self.snapshot.len());
        let line = self.line_containing(offset);
        let line_slice = &self.snapshot.text()[line.start..line.end()];

        let mut column = 0usize;
        for (i, c) in line_slice.char_indices() {
            if line.start + i >= offset {
                break;
            }
            column += self.encoding.width(c);
        }

        Position::new(line.index as u32, column as u32)
    }

    /// Convert an LSP position to a byte offset.
    ///
    /// Returns `None` when the line does not exist. A column at or past the
    /// end of the line resolves to the end of the line's content, before
    /// its break.
    pub fn position_to_offset(&self, position: Position) -> Option<usize> {
        let line = self
            .snapshot
            .line_by_index(position.line as usize)
            .ok()?;
        let content = line.content_range();
        let line_slice = &self.snapshot.text()[content.start..content.end()];

        let mut units = 0usize;
        for (i, c) in line_slice.char_indices() {
            if units >= position.character as usize {
                return Some(content.start + i);
            }
            units += self.encoding.width(c);
        }

        Some(content.end())
    }

    /// Convert a byte span to an LSP range.
    pub fn span_to_range(&self, span: &std::ops::Range<usize>) -> Range {
        Range::new(
            self.offset_to_position(span.start),
            self.offset_to_position(span.end),
        )
    }

    /// Convert an LSP range to a byte span, when both ends exist.
    pub fn range_to_span(&self, range: Range) -> Option<TextRange> {
        let start = self.position_to_offset(range.start)?;
        let end = self.position_to_offset(range.end)?;
        Some(TextRange::from_bounds(start..end))
    }

    fn line_containing(&self, offset: usize) -> Line {
        let table = self.snapshot.line_table();
        let index = table
            .containing_index(offset)
            .unwrap_or_else(|| table.len() - 1);
        // The table always holds at least one line.
        table.items()[index]
    }
}

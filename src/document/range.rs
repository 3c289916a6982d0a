//! Byte ranges and the sorted interval table behind the line index.
//!
//! `RangeCollection` is generic over anything exposing a start and a length
//! so the line table can reuse its binary-search containment query.

use std::ops::Range;

/// A half-open byte range `[start, start + length)` within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextRange {
    /// Byte offset of the first character in the range.
    pub start: usize,
    /// Length of the range in bytes.
    pub length: usize,
}

impl TextRange {
    /// Create a range from a start offset and a length.
    pub fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    /// Create a range covering `range.start..range.end`.
    pub fn from_bounds(range: Range<usize>) -> Self {
        Self {
            start: range.start,
            length: range.end - range.start,
        }
    }

    /// Exclusive end offset.
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    /// Whether the range has zero length.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Whether `offset` falls inside `[start, end)`.
    pub fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end()
    }
}

impl From<Range<usize>> for TextRange {
    fn from(range: Range<usize>) -> Self {
        Self::from_bounds(range)
    }
}

/// An element that occupies a contiguous byte span.
pub trait Ranged {
    /// Start offset of the element.
    fn start(&self) -> usize;
    /// Length of the element in bytes.
    fn length(&self) -> usize;
    /// Exclusive end offset.
    fn end(&self) -> usize {
        self.start() + self.length()
    }
}

impl Ranged for TextRange {
    fn start(&self) -> usize {
        self.start
    }

    fn length(&self) -> usize {
        self.length
    }
}

/// A position-sorted collection of non-overlapping ranged elements.
///
/// Construction takes elements already sorted by start offset and performs no
/// re-sorting; the builder guarantees order. Containment lookups are
/// `O(log n)` binary searches.
#[derive(Debug, Clone)]
pub struct RangeCollection<T: Ranged> {
    items: Vec<T>,
}

impl<T: Ranged> RangeCollection<T> {
    /// Wrap an already-sorted sequence of elements.
    pub fn new(items: Vec<T>) -> Self {
        debug_assert!(items.windows(2).all(|w| w[0].start() < w[1].start()));
        Self { items }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection holds no elements.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The element at `index`, if any.
    pub fn item(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    /// All elements in order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Index of the element whose span contains `offset`.
    ///
    /// The match is the greatest element whose start is `<= offset` with
    /// `offset` inside `[start, end)`. An offset equal to the collection's
    /// total end maps to the final element, so a cursor sitting at the very
    /// end of a document still resolves. Out-of-bounds offsets and the empty
    /// collection yield `None`.
    pub fn containing_index(&self, offset: usize) -> Option<usize> {
        let last = self.items.last()?;
        let index = match self
            .items
            .binary_search_by(|item| item.start().cmp(&offset))
        {
            Ok(index) => index,
            Err(0) => return None,
            Err(index) => index - 1,
        };
        if offset < self.items[index].end() {
            return Some(index);
        }
        if index == self.items.len() - 1 && offset == last.end() {
            return Some(index);
        }
        None
    }
}

//! Error types for snapshot and buffer queries.
//!
//! Every variant here is a contract violation by the caller: out-of-range
//! offsets, stale tracking anchors, version regressions. None of them is
//! transient, so there is no retry story. Search misses and absent documents
//! are represented with `Option`, not with these errors.

use thiserror::Error;

use crate::document::Capability;

/// Error returned by snapshot and buffer operations on invalid input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextError {
    /// A byte position outside the valid query range.
    #[error("position {position} is out of range for a document of length {length}")]
    PositionOutOfRange { position: usize, length: usize },

    /// A line index outside `[0, line_count)`.
    #[error("line index {index} is out of range for a document with {line_count} lines")]
    LineOutOfRange { index: usize, line_count: usize },

    /// A range extending past the end of the document.
    #[error("range {start}..{end} exceeds a document of length {length}")]
    RangeOutOfBounds {
        start: usize,
        end: usize,
        length: usize,
    },

    /// A byte position that does not fall on a UTF-8 character boundary.
    #[error("position {0} is not a character boundary")]
    NotCharBoundary(usize),

    /// The snapshot does not provide the requested capability view.
    #[error("snapshot does not support the {0:?} capability")]
    UnsupportedCapability(Capability),

    /// A tracking range queried against a snapshot it is not anchored to.
    #[error("tracking range is anchored to version {anchored} but was queried with version {queried}")]
    StaleTrackingRange { anchored: i32, queried: i32 },

    /// An edit carrying a version that does not increase the buffer's version.
    #[error("edit version {proposed} does not advance the buffer version {current}")]
    NonMonotonicVersion { current: i32, proposed: i32 },
}

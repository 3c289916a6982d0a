//! Ranges that stay anchored to logical content across edits.
//!
//! Re-anchoring never mutates in place: [`TrackingRange::advanced`] returns
//! a new value, so readers of an existing range never race with the edit
//! application step that advances it.

use serde::Deserialize;

use crate::error::TextError;

use super::range::TextRange;
use super::snapshot::DocumentSnapshot;

/// The edit delta between two consecutive snapshots of a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChange {
    /// The replaced span, in coordinates of the snapshot before the edit.
    pub old_range: TextRange,
    /// Byte length of the replacement text.
    pub new_length: usize,
    /// Version of the snapshot the edit produced.
    pub version: i32,
}

impl TextChange {
    /// Net change in document length.
    pub fn delta(&self) -> isize {
        self.new_length as isize - self.old_range.length as isize
    }

    /// Exclusive end of the replacement span in post-edit coordinates.
    pub fn new_end(&self) -> usize {
        self.old_range.start + self.new_length
    }
}

/// How a tracking range responds to an edit that partially overlaps it.
///
/// Full consumption of the tracked span always collapses the range to a
/// zero-length range at the edit start, whatever the policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackingPolicy {
    /// Keep the surviving portion of the span. An edit strictly inside the
    /// span resizes it by the edit's delta.
    #[default]
    Truncate,
    /// Treat any partial overlap as destroying the span: collapse it at the
    /// edit start.
    Invalidate,
}

/// A range captured against one snapshot that can be re-anchored across the
/// edits producing later snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackingRange {
    range: TextRange,
    version: i32,
    collapsed: bool,
    policy: TrackingPolicy,
}

impl TrackingRange {
    pub(crate) fn new(range: TextRange, version: i32, policy: TrackingPolicy) -> Self {
        Self {
            range,
            version,
            collapsed: false,
            policy,
        }
    }

    /// The snapshot version this range is currently anchored to.
    pub fn anchored_version(&self) -> i32 {
        self.version
    }

    /// Whether an edit consumed the tracked content, leaving a zero-length
    /// marker at the edit start. Collapse is reported, never silent.
    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    /// The partial-overlap policy this range advances under.
    pub fn policy(&self) -> TrackingPolicy {
        self.policy
    }

    /// The range's bounds in the coordinates of `snapshot`.
    ///
    /// Fails when the range has not been advanced to (or was created after)
    /// the given snapshot's version; a stale anchor would otherwise produce
    /// silently wrong offsets.
    pub fn range_for(&self, snapshot: &DocumentSnapshot) -> Result<TextRange, TextError> {
        if self.version != snapshot.version() {
            return Err(TextError::StaleTrackingRange {
                anchored: self.version,
                queried: snapshot.version(),
            });
        }
        Ok(self.range)
    }

    /// Re-anchor across one edit, producing the range in post-edit
    /// coordinates.
    ///
    /// Content strictly before the edit keeps its offsets; content strictly
    /// after shifts by the edit's delta; a span fully inside the replaced
    /// region collapses to a zero-length range at the edit start; partial
    /// overlap follows the range's [`TrackingPolicy`].
    pub fn advanced(&self, change: &TextChange) -> Self {
        let edit_start = change.old_range.start;
        let edit_end = change.old_range.end();
        let start = self.range.start;
        let end = self.range.end();

        let (range, collapsed) = if end <= edit_start {
            (self.range, self.collapsed)
        } else if start >= edit_end {
            let shifted = TextRange::new(
                shift(start, change.delta()),
                self.range.length,
            );
            (shifted, self.collapsed)
        } else if start >= edit_start && end <= edit_end {
            (TextRange::new(edit_start, 0), true)
        } else {
            match self.policy {
                TrackingPolicy::Truncate => (self.truncated(change), self.collapsed),
                TrackingPolicy::Invalidate => (TextRange::new(edit_start, 0), true),
            }
        };

        Self {
            range,
            version: change.version,
            collapsed,
            policy: self.policy,
        }
    }

    fn truncated(&self, change: &TextChange) -> TextRange {
        let edit_start = change.old_range.start;
        let edit_end = change.old_range.end();
        let start = self.range.start;
        let end = self.range.end();

        if start < edit_start && end > edit_end {
            // Edit strictly inside the span: the span absorbs the delta.
            TextRange::new(start, shift(end, change.delta()) - start)
        } else if start < edit_start {
            // Edit consumed the tail: keep the head.
            TextRange::new(start, edit_start - start)
        } else {
            // Edit consumed the head: keep the tail, shifted past the
            // replacement text.
            let new_start = change.new_end();
            TextRange::new(new_start, end - edit_end)
        }
    }
}

fn shift(offset: usize, delta: isize) -> usize {
    // Shifted offsets stay in bounds: only content at or after the edit end
    // shifts, and such offsets are >= old_range.length past the edit start.
    (offset as isize + delta) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracked(start: usize, length: usize, policy: TrackingPolicy) -> TrackingRange {
        TrackingRange::new(TextRange::new(start, length), 1, policy)
    }

    fn change(start: usize, old_length: usize, new_length: usize) -> TextChange {
        TextChange {
            old_range: TextRange::new(start, old_length),
            new_length,
            version: 2,
        }
    }

    #[test]
    fn span_before_the_edit_is_unaffected() {
        let range = tracked(0, 3, TrackingPolicy::Truncate);
        let advanced = range.advanced(&change(5, 2, 10));
        assert_eq!(advanced.range, TextRange::new(0, 3));
        assert!(!advanced.is_collapsed());
        assert_eq!(advanced.anchored_version(), 2);
    }

    #[test]
    fn span_ending_at_the_edit_start_is_unaffected() {
        let range = tracked(0, 5, TrackingPolicy::Truncate);
        let advanced = range.advanced(&change(5, 2, 0));
        assert_eq!(advanced.range, TextRange::new(0, 5));
    }

    #[test]
    fn span_after_the_edit_shifts_by_the_delta() {
        let range = tracked(10, 4, TrackingPolicy::Truncate);
        let grown = range.advanced(&change(2, 3, 8));
        assert_eq!(grown.range, TextRange::new(15, 4));
        let shrunk = range.advanced(&change(2, 3, 0));
        assert_eq!(shrunk.range, TextRange::new(7, 4));
    }

    #[test]
    fn consumed_span_collapses_at_the_edit_start() {
        let range = tracked(5, 3, TrackingPolicy::Truncate);
        let advanced = range.advanced(&change(4, 6, 1));
        assert_eq!(advanced.range, TextRange::new(4, 0));
        assert!(advanced.is_collapsed());
    }

    #[test]
    fn edit_inside_the_span_resizes_it() {
        let range = tracked(2, 10, TrackingPolicy::Truncate);
        let advanced = range.advanced(&change(4, 2, 7));
        assert_eq!(advanced.range, TextRange::new(2, 15));
        assert!(!advanced.is_collapsed());
    }

    #[test]
    fn truncate_keeps_the_head_when_the_tail_is_edited() {
        let range = tracked(2, 6, TrackingPolicy::Truncate);
        let advanced = range.advanced(&change(5, 10, 3));
        assert_eq!(advanced.range, TextRange::new(2, 3));
    }

    #[test]
    fn truncate_keeps_the_tail_when_the_head_is_edited() {
        let range = tracked(4, 6, TrackingPolicy::Truncate);
        let advanced = range.advanced(&change(2, 4, 1));
        // Surviving tail was [6, 10); it lands right after the replacement.
        assert_eq!(advanced.range, TextRange::new(3, 4));
    }

    #[test]
    fn invalidate_collapses_on_partial_overlap() {
        let range = tracked(4, 6, TrackingPolicy::Invalidate);
        let advanced = range.advanced(&change(2, 4, 1));
        assert_eq!(advanced.range, TextRange::new(2, 0));
        assert!(advanced.is_collapsed());
    }

    #[test]
    fn zero_length_span_at_the_edit_start_stays_put() {
        let range = tracked(5, 0, TrackingPolicy::Truncate);
        let advanced = range.advanced(&change(5, 2, 9));
        assert_eq!(advanced.range, TextRange::new(5, 0));
        assert!(!advanced.is_collapsed());
    }

    #[test]
    fn range_for_rejects_a_mismatched_snapshot() {
        let snap = DocumentSnapshot::new("hello world", 1);
        let range = snap.create_tracking_range(TextRange::new(0, 5)).unwrap();
        assert_eq!(range.range_for(&snap), Ok(TextRange::new(0, 5)));

        let next = DocumentSnapshot::new("hello brave world", 2);
        assert_eq!(
            range.range_for(&next),
            Err(TextError::StaleTrackingRange {
                anchored: 1,
                queried: 2
            })
        );

        let advanced = range.advanced(&TextChange {
            old_range: TextRange::new(6, 0),
            new_length: 6,
            version: 2,
        });
        assert_eq!(advanced.range_for(&next), Ok(TextRange::new(0, 5)));
    }

    #[test]
    fn advancing_across_successive_edits_composes() {
        let range = tracked(10, 5, TrackingPolicy::Truncate);
        let after_insert = range.advanced(&change(0, 0, 4));
        assert_eq!(after_insert.range, TextRange::new(14, 5));
        let after_delete = after_insert.advanced(&TextChange {
            old_range: TextRange::new(2, 6),
            new_length: 0,
            version: 3,
        });
        assert_eq!(after_delete.range, TextRange::new(8, 5));
        assert_eq!(after_delete.anchored_version(), 3);
    }
}

//! Document snapshots, line indexing, and tracking ranges.
//!
//! This module provides:
//! - `TextRange` and the generic `RangeCollection` interval table
//! - `Line` and the single-pass line table builder
//! - `DocumentSnapshot`, an immutable view of a document at one version
//! - `TrackingRange` and `TextChange` for ranges that survive edits
//! - `TextBuffer` and `DocumentStore` for document lifecycle management

mod buffer;
mod lines;
mod range;
mod snapshot;
mod tracking;

pub use buffer::{ChangeHandler, DocumentStore, SubscriptionId, TextBuffer};
pub use lines::{build_line_table, Line, LineTable};
pub use range::{RangeCollection, Ranged, TextRange};
pub use snapshot::{Capability, CapabilityView, DocumentSnapshot};
pub use tracking::{TextChange, TrackingPolicy, TrackingRange};

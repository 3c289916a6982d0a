//! Document snapshot and line-index engine for language-tooling backends.
//!
//! The heart of the crate is [`DocumentSnapshot`]: an immutable capture of
//! document text at one edit version, with a lazily built line table for
//! offset/line conversion and support for [`TrackingRange`]s that stay
//! anchored to logical content as the document changes. [`TextBuffer`] is
//! the live-document side: it produces one snapshot per version and
//! announces each edit to subscribers as a [`TextChange`].
//!
//! Snapshots are safe to query from any number of threads; the line table
//! is built at most once even under concurrent first access. Queries with
//! invalid arguments fail fast with a [`TextError`] rather than clamping,
//! so caller bugs surface at the call site instead of corrupting downstream
//! line math.

mod document;
mod error;
mod lsp;
pub(crate) mod settings;

pub use document::{
    build_line_table, Capability, CapabilityView, ChangeHandler, DocumentSnapshot, DocumentStore,
    Line, LineTable, RangeCollection, Ranged, SubscriptionId, TextBuffer, TextChange, TextRange,
    TrackingPolicy, TrackingRange,
};
pub use error::TextError;
pub use lsp::{PositionEncoding, PositionMap};
pub use settings::{discover_settings, load_settings, PositionSettings, Settings, TrackingSettings};

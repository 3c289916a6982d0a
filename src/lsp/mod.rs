//! LSP-facing conversions.
//!
//! This crate does not speak the wire protocol; it only provides the
//! position mapping a language server needs to translate between its byte
//! offsets and `lsp_types` line/column positions.

mod position;

pub use position::{PositionEncoding, PositionMap};

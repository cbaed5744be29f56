#![forbid(unsafe_code)]

//! Error type shared by every gridweave-layout operation.

use gridweave_core::ItemId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LayoutError>;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("unknown item id: {id}")]
    UnknownItem { id: ItemId },

    #[error("invalid column count {columns} (expected 1..={max_columns})")]
    InvalidColumnCount { columns: u16, max_columns: u16 },

    #[error("duplicate item id: {id}")]
    DuplicateItem { id: ItemId },

    #[error("item {id} does not fit within {columns} columns")]
    OutOfBounds { id: ItemId, columns: u16 },

    #[error("items {first} and {second} overlap")]
    Overlapping { first: ItemId, second: ItemId },

    #[error("position table for {columns} columns is missing item {id}")]
    MissingPosition { id: ItemId, columns: u16 },

    #[error("invalid engine config: {message}")]
    InvalidConfig { message: String },

    #[error("unsupported layout snapshot schema version {found} (expected {expected})")]
    UnsupportedSchemaVersion { found: u16, expected: u16 },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "policy-config")]
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl LayoutError {
    pub(crate) fn unknown(id: &ItemId) -> Self {
        Self::UnknownItem { id: id.clone() }
    }

    /// Whether the error names an item that does not exist.
    #[must_use]
    pub fn is_unknown_item(&self) -> bool {
        matches!(self, Self::UnknownItem { .. })
    }
}
